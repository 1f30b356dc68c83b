use std::io::Cursor;

use super::*;
use crate::assets::media::{RgbaFrame, VideoInfo};
use crate::scene::request::RenderRequest;

struct StillVideo(VideoInfo);

impl VideoSource for StillVideo {
    fn info(&self) -> &VideoInfo {
        &self.0
    }

    fn seek_exact(&mut self, _seconds: f64) -> RenderResult<Arc<RgbaFrame>> {
        Ok(Arc::new(RgbaFrame::new(1, 1, vec![0, 0, 0, 255])?))
    }
}

fn scratch_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "offscreen-render-store-{tag}-{}",
        std::process::id()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_png(path: &Path, w: u32, h: u32) {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba([255, 0, 0, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    std::fs::write(path, buf).unwrap();
}

fn timeline(json: &str) -> Timeline {
    RenderRequest::from_json_str(json).unwrap().timeline
}

#[test]
fn loads_relative_images_and_shared_fonts() {
    let dir = scratch_dir("ok");
    write_png(&dir.join("a.png"), 3, 2);
    std::fs::write(dir.join("Body.ttf"), b"not parsed at load time").unwrap();

    let config = RenderConfig {
        assets_root: Some(dir.clone()),
        font_dirs: vec![dir.clone()],
        ..RenderConfig::default()
    };
    let tl = timeline(
        r#"{"timeline":{
            "img":{"filetype":"image","localpath":"a.png","duration":10},
            "t1":{"filetype":"text","text":"a","fontname":"Body"},
            "t2":{"filetype":"text","text":"b","fontname":"Body"},
            "box":{"filetype":"shape","shape":[[0,0],[1,1],[0,1]],"oWidth":1,"width":1}
        }}"#,
    );

    let cache = load_assets(&tl, &config, HashMap::new()).unwrap();
    let img = &cache.images["img"];
    assert_eq!((img.width, img.height), (3.0, 2.0));
    assert_eq!(cache.fonts.len(), 1, "fonts are loaded once per file");
    assert_eq!(cache.text_fonts["t1"], cache.text_fonts["t2"]);
    assert_eq!(cache.len(), 2);
}

#[test]
fn missing_file_is_an_asset_error() {
    let dir = scratch_dir("missing");
    let config = RenderConfig {
        assets_root: Some(dir),
        ..RenderConfig::default()
    };
    let tl = timeline(r#"{"timeline":{"img":{"filetype":"image","localpath":"nope.png"}}}"#);
    let err = load_assets(&tl, &config, HashMap::new()).err().unwrap();
    assert!(matches!(err, RenderError::Asset(_)), "{err}");
}

#[test]
fn text_without_any_font_fails() {
    let tl = timeline(r#"{"timeline":{"t":{"filetype":"text","text":"hi","fontname":"Nope"}}}"#);
    let err = load_assets(&tl, &RenderConfig::default(), HashMap::new())
        .err()
        .unwrap();
    assert!(err.to_string().contains("no font available"));
}

#[test]
fn injected_video_skips_probing() {
    let tl = timeline(r#"{"timeline":{"v":{"filetype":"video","localpath":"/none.mp4","duration":100}}}"#);
    let mut injected: HashMap<String, Box<dyn VideoSource>> = HashMap::new();
    injected.insert(
        "v".to_owned(),
        Box::new(StillVideo(VideoInfo {
            source_path: PathBuf::from("/none.mp4"),
            width: 1,
            height: 1,
            duration_sec: 0.1,
            fps: 10.0,
            has_audio: false,
        })),
    );
    let cache = load_assets(&tl, &RenderConfig::default(), injected).unwrap();
    assert_eq!(cache.videos["v"].info().width, 1);
}
