use super::*;

#[test]
fn image_element_parses_with_defaults() {
    let el: TimelineElement = serde_json::from_str(
        r#"{"filetype":"image","priority":2,"startTime":100,"duration":500,
            "location":{"x":10,"y":20},"width":64,"height":32,"localpath":"a.png"}"#,
    )
    .unwrap();
    assert_eq!(el.kind, ElementKind::Image);
    assert_eq!(el.priority, 2);
    assert_eq!(el.start_time, 100.0);
    assert_eq!(el.location, Location { x: 10.0, y: 20.0 });
    assert_eq!(el.opacity, 100.0);
    assert_eq!(el.speed, 1.0);
    assert!(el.animation.is_empty());
}

#[test]
fn video_element_parses_trim_filter_and_audio_flag() {
    let el: TimelineElement = serde_json::from_str(
        r#"{"filetype":"video","startTime":0,"duration":2000,"speed":2,
            "trim":{"startTime":100,"endTime":900},"isExistAudio":true,
            "filter":{"enable":true,"list":[{"name":"blur","value":"f=3"}]},
            "localpath":"clip.mp4"}"#,
    )
    .unwrap();
    let ElementKind::Video(v) = &el.kind else {
        panic!("expected video");
    };
    assert_eq!(
        v.trim,
        Some(Trim {
            start_time: 100.0,
            end_time: 900.0
        })
    );
    assert!(v.is_exist_audio);
    assert!(v.filter.enable);
    assert_eq!(v.filter.list[0].name, "blur");
    assert!(el.kind.is_dynamic());
    assert!(el.kind.needs_media());
}

#[test]
fn text_element_parses_options_and_string_numbers() {
    let el: TimelineElement = serde_json::from_str(
        r##"{"filetype":"text","text":"hello world","fontname":"Inter","fontsize":"24",
            "textcolor":"#ff0000","letterSpacing":1.5,"parentKey":"clip",
            "options":{"align":"center","isBold":true,"isItalic":false,
                       "outline":{"enable":true,"size":"3","color":"#000000"}},
            "background":{"enable":true,"color":"#222222"}}"##,
    )
    .unwrap();
    let ElementKind::Text(t) = &el.kind else {
        panic!("expected text");
    };
    assert_eq!(t.fontsize, 24.0);
    assert_eq!(t.letter_spacing, 1.5);
    assert_eq!(t.options.align, TextAlign::Center);
    assert!(t.options.is_bold);
    assert_eq!(t.options.outline.size, 3.0);
    assert_eq!(t.parent(), Some("clip"));
    assert!(!el.kind.is_dynamic());
}

#[test]
fn standalone_text_has_no_parent() {
    let t = TextProps::default();
    assert_eq!(t.parent_key, STANDALONE_PARENT);
    assert_eq!(t.parent(), None);
}

#[test]
fn shape_and_animation_parse() {
    let el: TimelineElement = serde_json::from_str(
        r##"{"filetype":"shape","width":50,"oWidth":100,"shape":[[0,0],[100,0],[100,100]],
            "option":{"fillColor":"#00ff00"},
            "animation":{"position":{"isActivate":true,"ax":[[0,1],[100,2]],"ay":[[0,3]]}}}"##,
    )
    .unwrap();
    let ElementKind::Shape(s) = &el.kind else {
        panic!("expected shape");
    };
    assert_eq!(s.o_width, 100.0);
    assert_eq!(s.shape.len(), 3);
    assert_eq!(s.option.fill_color, "#00ff00");
    let pos = &el.animation["position"];
    assert!(pos.is_activate);
    assert_eq!(pos.ax, vec![[0.0, 1.0], [100.0, 2.0]]);
}

#[test]
fn unknown_filetype_is_rejected() {
    let res: Result<TimelineElement, _> = serde_json::from_str(r#"{"filetype":"svg"}"#);
    assert!(res.is_err());
}

#[test]
fn options_default_and_destination_fallback() {
    let opts: RenderOptions = serde_json::from_str(r#"{"videoDuration":2}"#).unwrap();
    assert_eq!(opts.preview_size, PreviewSize { w: 1920, h: 1080 });
    assert_eq!(opts.background_color, "#000000");
    assert_eq!(opts.destination(), None);

    let opts: RenderOptions =
        serde_json::from_str(r#"{"videoDestinationFolder":"/tmp/out"}"#).unwrap();
    assert_eq!(
        opts.destination(),
        Some(std::path::PathBuf::from("/tmp/out/output.mp4"))
    );
}
