use std::collections::HashMap;

use crate::assets::media::RgbaFrame;
use crate::config::FilterBackend;
use crate::effects::cpu::CpuFilterState;
use crate::effects::filter::FilterKind;

/// Per-element filter resources, created on first use.
pub(crate) enum ElementResources {
    Cpu(CpuFilterState),
    #[cfg(feature = "gpu")]
    Gpu(crate::effects::gpu::GpuFilterResources),
    /// Resources could not be created; the element draws unfiltered.
    Raw,
}

/// Filter resources keyed by element id. Lives as long as its session.
#[derive(Default)]
pub(crate) struct FilterResourceCache {
    entries: HashMap<String, ElementResources>,
}

impl FilterResourceCache {
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

enum Backend {
    Cpu,
    #[cfg(feature = "gpu")]
    Gpu(crate::effects::gpu::GpuContext),
    Unavailable,
}

/// Runs filter chains over decoded video frames.
pub(crate) struct FilterPipeline {
    backend: Backend,
    cache: FilterResourceCache,
}

impl FilterPipeline {
    pub(crate) fn new(choice: FilterBackend) -> Self {
        let backend = match choice {
            FilterBackend::Cpu => Backend::Cpu,
            FilterBackend::Auto => Self::try_gpu().unwrap_or(Backend::Cpu),
            FilterBackend::Gpu => Self::try_gpu().unwrap_or(Backend::Unavailable),
        };
        Self {
            backend,
            cache: FilterResourceCache::default(),
        }
    }

    #[cfg(feature = "gpu")]
    fn try_gpu() -> Option<Backend> {
        match crate::effects::gpu::GpuContext::new() {
            Ok(ctx) => Some(Backend::Gpu(ctx)),
            Err(e) => {
                tracing::warn!(error = %e, "gpu filter backend unavailable");
                None
            }
        }
    }

    #[cfg(not(feature = "gpu"))]
    fn try_gpu() -> Option<Backend> {
        tracing::debug!("built without the 'gpu' feature, filters run on the cpu");
        None
    }

    pub(crate) fn backend_name(&self) -> &'static str {
        match self.backend {
            Backend::Cpu => "cpu",
            #[cfg(feature = "gpu")]
            Backend::Gpu(_) => "gpu",
            Backend::Unavailable => "unavailable",
        }
    }

    pub(crate) fn cache(&self) -> &FilterResourceCache {
        &self.cache
    }

    /// Drop every element's resources.
    pub(crate) fn clear(&mut self) {
        self.cache.clear();
    }

    fn create_resources(&self, element_id: &str, frame: &RgbaFrame, passes: usize) -> ElementResources {
        match &self.backend {
            Backend::Cpu => ElementResources::Cpu(CpuFilterState::default()),
            #[cfg(feature = "gpu")]
            Backend::Gpu(ctx) => match ctx.create_resources(frame.width, frame.height, passes) {
                Ok(res) => ElementResources::Gpu(res),
                Err(e) => {
                    tracing::warn!(element = element_id, error = %e, "filter init failed, drawing unfiltered");
                    ElementResources::Raw
                }
            },
            Backend::Unavailable => {
                let _ = (frame, passes);
                tracing::warn!(element = element_id, "no filter backend, drawing unfiltered");
                ElementResources::Raw
            }
        }
    }

    /// Run `chain` over `frame` for `element_id` and return straight-alpha RGBA8.
    ///
    /// Never fails: elements without usable resources get the raw frame back.
    pub(crate) fn apply(&mut self, element_id: &str, chain: &[FilterKind], frame: &RgbaFrame) -> Vec<u8> {
        if chain.is_empty() {
            return frame.data.clone();
        }
        if !self.cache.entries.contains_key(element_id) {
            let res = self.create_resources(element_id, frame, chain.len());
            self.cache.entries.insert(element_id.to_owned(), res);
        }
        let Some(res) = self.cache.entries.get_mut(element_id) else {
            return frame.data.clone();
        };

        match res {
            ElementResources::Cpu(state) => state.run(chain, &frame.data, frame.width, frame.height),
            #[cfg(feature = "gpu")]
            ElementResources::Gpu(gpu_res) => {
                let Backend::Gpu(ctx) = &self.backend else {
                    return frame.data.clone();
                };
                match ctx.run(gpu_res, chain, &frame.data) {
                    Ok(out) => out,
                    Err(e) => {
                        tracing::warn!(element = element_id, error = %e, "gpu filter failed, drawing unfiltered");
                        *res = ElementResources::Raw;
                        frame.data.clone()
                    }
                }
            }
            ElementResources::Raw => frame.data.clone(),
        }
    }
}
