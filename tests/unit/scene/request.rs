use super::*;

fn request(json: &str) -> RenderRequest {
    RenderRequest::from_json_str(json).unwrap()
}

#[test]
fn minimal_request_validates_and_counts_frames() {
    let req = request(
        r#"{"timeline":{},"options":{"previewSize":{"w":64,"h":32},"videoDuration":1}}"#,
    );
    req.validate().unwrap();
    assert_eq!(req.canvas(), Canvas { width: 64, height: 32 });
    assert_eq!(req.total_frames(), 60);
}

#[test]
fn zero_canvas_is_rejected() {
    let req = request(r#"{"options":{"previewSize":{"w":0,"h":32}}}"#);
    assert!(matches!(req.validate(), Err(RenderError::Validation(_))));
}

#[test]
fn bad_background_color_is_rejected() {
    let req = request(r#"{"options":{"backgroundColor":"not-a-color"}}"#);
    let err = req.validate().unwrap_err();
    assert!(err.to_string().contains("backgroundColor"));
}

#[test]
fn missing_text_parent_is_rejected() {
    let req = request(
        r#"{"timeline":{"t":{"filetype":"text","text":"a","parentKey":"nope"}},
            "options":{"videoDuration":1}}"#,
    );
    let err = req.validate().unwrap_err();
    assert!(err.to_string().contains("parentKey 'nope'"));
}

#[test]
fn existing_text_parent_is_accepted() {
    let req = request(
        r#"{"timeline":{
              "clip":{"filetype":"video","localpath":"c.mp4","duration":1000},
              "t":{"filetype":"text","text":"a","parentKey":"clip"}},
            "options":{"videoDuration":1}}"#,
    );
    req.validate().unwrap();
}

#[test]
fn media_without_localpath_is_rejected() {
    let req = request(r#"{"timeline":{"img":{"filetype":"image"}}}"#);
    let err = req.validate().unwrap_err();
    assert!(err.to_string().contains("requires localpath"));
}

#[test]
fn non_positive_speed_is_rejected_for_dynamic_kinds() {
    let req = request(
        r#"{"timeline":{"v":{"filetype":"video","localpath":"c.mp4","speed":0}}}"#,
    );
    assert!(req.validate().is_err());

    // Speed is ignored for static kinds.
    let req = request(r#"{"timeline":{"s":{"filetype":"shape","speed":0}}}"#);
    req.validate().unwrap();
}

#[test]
fn shape_with_points_needs_original_width() {
    let req = request(
        r#"{"timeline":{"s":{"filetype":"shape","width":10,"shape":[[0,0],[1,1]]}}}"#,
    );
    assert!(req.validate().is_err());
}

#[test]
fn malformed_json_is_a_serde_error() {
    let err = RenderRequest::from_json_str("{").unwrap_err();
    assert!(matches!(err, RenderError::Serde(_)));
}
