use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;

use crate::assets::decode::{self, DecodedGif, DecodedImage};
use crate::assets::fonts::resolve_font_path;
use crate::assets::media::{FfmpegTools, FfmpegVideoSource, VideoSource};
use crate::config::RenderConfig;
use crate::foundation::error::{RenderError, RenderResult};
use crate::render::cpu::image_paint_from_premul;
use crate::scene::model::{ElementKind, Timeline};

/// Drawable still image.
#[derive(Clone, Debug)]
pub(crate) struct ImageAsset {
    pub(crate) paint: vello_cpu::Image,
    pub(crate) width: f64,
    pub(crate) height: f64,
}

/// Drawable animated image.
#[derive(Clone, Debug)]
pub(crate) struct GifAsset {
    pub(crate) frames: Vec<vello_cpu::Image>,
    pub(crate) delay_ms: u32,
    pub(crate) width: f64,
    pub(crate) height: f64,
}

/// Assets of one session, keyed by element id.
#[derive(Default)]
pub(crate) struct AssetCache {
    pub(crate) images: HashMap<String, ImageAsset>,
    pub(crate) gifs: HashMap<String, GifAsset>,
    pub(crate) videos: HashMap<String, Box<dyn VideoSource>>,
    /// Font file per text element.
    pub(crate) text_fonts: HashMap<String, PathBuf>,
    /// Font bytes per distinct font file.
    pub(crate) fonts: BTreeMap<PathBuf, Arc<Vec<u8>>>,
}

impl AssetCache {
    pub(crate) fn len(&self) -> usize {
        self.images.len() + self.gifs.len() + self.videos.len() + self.fonts.len()
    }
}

enum LoadJob {
    Image { id: String, path: PathBuf },
    Gif { id: String, path: PathBuf },
    Video { id: String, path: PathBuf },
    Font { path: PathBuf },
}

enum Loaded {
    Image(String, DecodedImage),
    Gif(String, DecodedGif),
    Video(String, Box<dyn VideoSource>),
    Font(PathBuf, Arc<Vec<u8>>),
}

fn read_bytes(path: &Path) -> RenderResult<Vec<u8>> {
    std::fs::read(path)
        .map_err(|e| RenderError::asset(format!("read '{}': {e}", path.display())))
}

impl LoadJob {
    fn run(self, config: &RenderConfig) -> RenderResult<Loaded> {
        match self {
            Self::Image { id, path } => {
                let img = decode::decode_image(&read_bytes(&path)?).map_err(|e| {
                    RenderError::asset(format!("decode image '{}': {e}", path.display()))
                })?;
                Ok(Loaded::Image(id, img))
            }
            Self::Gif { id, path } => {
                let gif = decode::decode_gif(&read_bytes(&path)?).map_err(|e| {
                    RenderError::asset(format!("decode gif '{}': {e}", path.display()))
                })?;
                Ok(Loaded::Gif(id, gif))
            }
            Self::Video { id, path } => {
                let tools = FfmpegTools {
                    ffmpeg: config.ffmpeg_path.clone(),
                    ffprobe: config.ffprobe_path.clone(),
                };
                let source = FfmpegVideoSource::open(&path, tools, config.video_cache_capacity)?;
                Ok(Loaded::Video(id, Box::new(source)))
            }
            Self::Font { path } => {
                let bytes = read_bytes(&path)?;
                Ok(Loaded::Font(path, Arc::new(bytes)))
            }
        }
    }
}

/// Resolve and decode every asset the timeline references.
///
/// Videos already present in `injected` are used as-is. Loading runs in parallel and returns only
/// after every job has finished; the first failure is returned after all failures are logged.
#[tracing::instrument(skip_all, fields(elements = timeline.len()))]
pub(crate) fn load_assets(
    timeline: &Timeline,
    config: &RenderConfig,
    injected: HashMap<String, Box<dyn VideoSource>>,
) -> RenderResult<AssetCache> {
    let mut cache = AssetCache {
        videos: injected,
        ..AssetCache::default()
    };

    let mut jobs = Vec::new();
    let mut font_paths = BTreeSet::new();
    for (id, el) in timeline {
        let source = || {
            el.localpath
                .as_deref()
                .map(|p| config.resolve_asset_path(p))
                .ok_or_else(|| {
                    RenderError::asset(format!("{} element '{id}' has no localpath", el.kind.name()))
                })
        };
        match &el.kind {
            ElementKind::Image => jobs.push(LoadJob::Image {
                id: id.clone(),
                path: source()?,
            }),
            ElementKind::Gif => jobs.push(LoadJob::Gif {
                id: id.clone(),
                path: source()?,
            }),
            ElementKind::Video(_) if !cache.videos.contains_key(id) => {
                jobs.push(LoadJob::Video {
                    id: id.clone(),
                    path: source()?,
                });
            }
            ElementKind::Text(props) => {
                let path = resolve_font_path(props, config).ok_or_else(|| {
                    RenderError::asset(format!(
                        "no font available for text element '{id}' (fontname \"{}\")",
                        props.fontname
                    ))
                })?;
                font_paths.insert(path.clone());
                cache.text_fonts.insert(id.clone(), path);
            }
            ElementKind::Video(_) | ElementKind::Audio(_) | ElementKind::Shape(_) => {}
        }
    }
    jobs.extend(font_paths.into_iter().map(|path| LoadJob::Font { path }));

    tracing::debug!(jobs = jobs.len(), "loading assets");
    let results: Vec<RenderResult<Loaded>> =
        jobs.into_par_iter().map(|job| job.run(config)).collect();

    let mut first_err = None;
    for result in results {
        match result {
            Ok(Loaded::Image(id, img)) => {
                let paint = image_paint_from_premul(&img.rgba8_premul, img.width, img.height)?;
                cache.images.insert(
                    id,
                    ImageAsset {
                        paint,
                        width: f64::from(img.width),
                        height: f64::from(img.height),
                    },
                );
            }
            Ok(Loaded::Gif(id, gif)) => {
                let frames = gif
                    .frames
                    .iter()
                    .map(|f| image_paint_from_premul(f, gif.width, gif.height))
                    .collect::<RenderResult<Vec<_>>>()?;
                cache.gifs.insert(
                    id,
                    GifAsset {
                        frames,
                        delay_ms: gif.frame_delay_ms(),
                        width: f64::from(gif.width),
                        height: f64::from(gif.height),
                    },
                );
            }
            Ok(Loaded::Video(id, source)) => {
                cache.videos.insert(id, source);
            }
            Ok(Loaded::Font(path, bytes)) => {
                cache.fonts.insert(path, bytes);
            }
            Err(e) => {
                tracing::error!(error = %e, "asset load failed");
                first_err.get_or_insert(e);
            }
        }
    }
    if let Some(e) = first_err {
        return Err(e);
    }

    tracing::info!(assets = cache.len(), "assets ready");
    Ok(cache)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/store.rs"]
mod tests;
