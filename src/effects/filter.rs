use crate::scene::model::{FilterEntry, FilterSettings};

/// Chroma-key distance threshold when `f` is not given.
pub(crate) const DEFAULT_CHROMA_THRESHOLD: f32 = 0.5;

/// Taps accumulated per pixel by the radial blur.
pub(crate) const RADIAL_SAMPLES: u32 = 66;

/// A parsed filter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum FilterKind {
    /// Clear pixels whose RGB distance to `key` is below `threshold` (all in `0..=1`).
    ChromaKey { key: [f32; 3], threshold: f32 },
    /// 3x3 box blur with taps `factor` texels apart.
    Blur { factor: f32 },
    /// Rotational blur around the frame center.
    RadialBlur { power: f32 },
}

impl FilterKind {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::ChromaKey { .. } => "chromakey",
            Self::Blur { .. } => "blur",
            Self::RadialBlur { .. } => "radialblur",
        }
    }

    /// Shader parameters: `[p0, p1, p2, p3]` where the meaning depends on the kind.
    pub(crate) fn params(&self) -> [f32; 4] {
        match *self {
            Self::ChromaKey { key, threshold } => [key[0], key[1], key[2], threshold],
            Self::Blur { factor } => [factor, 0.0, 0.0, 0.0],
            Self::RadialBlur { power } => [power, 0.5, 0.5, 0.0],
        }
    }
}

/// Iterate `key=value` pairs of a colon-separated parameter string.
fn params(value: &str) -> impl Iterator<Item = (&str, &str)> {
    value
        .split(':')
        .filter_map(|item| item.split_once('='))
        .map(|(k, v)| (k.trim(), v.trim()))
}

/// Integer parameter, truncating any fractional part.
fn int_param(v: &str) -> Option<f32> {
    v.parse::<f64>()
        .ok()
        .filter(|x| x.is_finite())
        .map(|x| x.trunc() as f32)
}

fn float_param(v: &str) -> Option<f32> {
    v.parse::<f32>().ok().filter(|x| x.is_finite())
}

/// Parse one list entry. Unknown names yield `None`.
pub(crate) fn parse_filter(entry: &FilterEntry) -> Option<FilterKind> {
    match entry.name.trim() {
        "chromakey" => {
            let (mut r, mut g, mut b, mut f) = (0.0, 255.0, 0.0, DEFAULT_CHROMA_THRESHOLD);
            for (k, v) in params(&entry.value) {
                let Some(n) = float_param(v) else { continue };
                match k {
                    "r" => r = n,
                    "g" => g = n,
                    "b" => b = n,
                    "f" => f = n,
                    _ => {}
                }
            }
            Some(FilterKind::ChromaKey {
                key: [r / 255.0, g / 255.0, b / 255.0],
                threshold: f,
            })
        }
        "blur" => {
            let factor = params(&entry.value)
                .filter(|(k, _)| *k == "f")
                .find_map(|(_, v)| int_param(v))
                .unwrap_or(0.0);
            Some(FilterKind::Blur { factor })
        }
        "radialblur" => {
            let power = params(&entry.value)
                .filter(|(k, _)| *k == "f")
                .find_map(|(_, v)| int_param(v))
                .unwrap_or(0.0);
            Some(FilterKind::RadialBlur { power })
        }
        _ => None,
    }
}

/// The filters to run for a video element, in list order.
///
/// Empty when the chain is disabled. Unknown entries are skipped.
pub(crate) fn parse_chain(settings: &FilterSettings) -> Vec<FilterKind> {
    if !settings.enable {
        return Vec::new();
    }
    settings
        .list
        .iter()
        .filter_map(|entry| {
            let parsed = parse_filter(entry);
            if parsed.is_none() {
                tracing::debug!(name = %entry.name, "skipping unknown filter");
            }
            parsed
        })
        .collect()
}
