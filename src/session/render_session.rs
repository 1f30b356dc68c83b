use std::collections::HashMap;

use crate::assets::media::VideoSource;
use crate::assets::store::{AssetCache, load_assets};
use crate::config::RenderConfig;
use crate::encode::emitter::{FrameEmitter, with_emitter};
use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::{FrameIndex, OUTPUT_FPS, progress_percent};
use crate::foundation::error::{RenderError, RenderResult};
use crate::render::compositor::FrameCompositor;
use crate::render::frame::{FrameRGBA, encode_frame};
use crate::scene::request::RenderRequest;
use crate::session::cancel::CancelToken;

/// Lifecycle of a [`RenderSession`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Created, nothing loaded.
    Idle,
    /// Decoding assets.
    LoadingMedia,
    /// Compositing the given frame.
    Rendering {
        /// Frame being composited.
        frame: u64,
    },
    /// Every frame was delivered and the sink finished.
    Finished,
    /// Stopped on an error.
    Failed,
    /// Stopped by its cancel token.
    Cancelled,
}

impl SessionState {
    /// Whether the session can no longer render.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Failed | Self::Cancelled)
    }
}

struct Loaded {
    assets: AssetCache,
    compositor: FrameCompositor,
}

/// Renders one request: owns its assets, raster surface and filter resources.
///
/// ```no_run
/// use offscreen_render::{CancelToken, InMemorySink, RenderConfig, RenderRequest, RenderSession};
///
/// let request = RenderRequest::from_path("request.json")?;
/// let mut session = RenderSession::new(request, RenderConfig::default())?;
/// let mut sink = InMemorySink::default();
/// session.run(&mut sink, &CancelToken::new())?;
/// # Ok::<(), offscreen_render::RenderError>(())
/// ```
pub struct RenderSession {
    request: RenderRequest,
    config: RenderConfig,
    state: SessionState,
    injected: HashMap<String, Box<dyn VideoSource>>,
    loaded: Option<Loaded>,
}

impl RenderSession {
    /// Validate `request` and `config` and create an idle session.
    pub fn new(request: RenderRequest, config: RenderConfig) -> RenderResult<Self> {
        config.validate()?;
        request.validate()?;
        Ok(Self {
            request,
            config,
            state: SessionState::Idle,
            injected: HashMap::new(),
            loaded: None,
        })
    }

    /// Use `source` for video element `element_id` instead of opening its file.
    pub fn with_video_source(
        mut self,
        element_id: impl Into<String>,
        source: Box<dyn VideoSource>,
    ) -> Self {
        self.injected.insert(element_id.into(), source);
        self
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The request being rendered.
    pub fn request(&self) -> &RenderRequest {
        &self.request
    }

    /// Number of frames `run` emits.
    pub fn total_frames(&self) -> u64 {
        self.request.total_frames()
    }

    /// Number of per-element filter resources currently allocated.
    pub fn filter_resources(&self) -> usize {
        self.loaded
            .as_ref()
            .map_or(0, |l| l.compositor.filters().cache().len())
    }

    /// Load every asset of the timeline. Runs once; later calls are no-ops.
    #[tracing::instrument(skip_all, fields(elements = self.request.timeline.len()))]
    pub fn load_media(&mut self) -> RenderResult<()> {
        if self.loaded.is_some() {
            return Ok(());
        }
        if self.state.is_terminal() {
            return Err(RenderError::validation("session already ended"));
        }
        self.state = SessionState::LoadingMedia;
        tracing::info!("loading media");

        let injected = std::mem::take(&mut self.injected);
        let loaded = load_assets(&self.request.timeline, &self.config, injected).and_then(|assets| {
            let compositor = FrameCompositor::new(
                self.request.canvas(),
                &self.request.options.background_color,
                &assets,
                self.config.filter_backend,
            )?;
            Ok(Loaded { assets, compositor })
        });
        match loaded {
            Ok(loaded) => {
                self.loaded = Some(loaded);
                self.state = SessionState::Rendering { frame: 0 };
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "media loading failed");
                self.state = SessionState::Failed;
                Err(e)
            }
        }
    }

    /// Composite a single frame, loading media first if needed.
    pub fn render_frame(&mut self, frame: FrameIndex) -> RenderResult<FrameRGBA> {
        self.load_media()?;
        let Some(loaded) = self.loaded.as_mut() else {
            return Err(RenderError::validation("media is not loaded"));
        };
        loaded
            .compositor
            .render_frame(&self.request.timeline, &mut loaded.assets, frame)
    }

    /// Render every frame into `sink`.
    ///
    /// The sink gets `begin`, every frame in order, then `end`; on failure or cancellation it
    /// gets `abort` instead and no further frames.
    #[tracing::instrument(skip_all, fields(frames = self.total_frames()))]
    pub fn run(&mut self, sink: &mut dyn FrameSink, cancel: &CancelToken) -> RenderResult<()> {
        if self.state.is_terminal() {
            return Err(RenderError::validation("session already ended"));
        }
        let total = self.total_frames();
        let canvas = self.request.canvas();
        let sink_config = SinkConfig {
            width: canvas.width,
            height: canvas.height,
            fps: OUTPUT_FPS,
            total_frames: total,
            format: self.config.frame_format,
        };
        if let Err(e) = sink.begin(&sink_config) {
            tracing::error!(error = %e, "frame sink failed to start");
            sink.abort(&e);
            self.state = SessionState::Failed;
            return Err(e);
        }
        if let Err(e) = self.load_media() {
            sink.abort(&e);
            return Err(e);
        }

        tracing::info!(total, "rendering");
        let capacity = self.config.channel_capacity;
        let result = with_emitter(sink, capacity, |emitter| {
            self.render_all(emitter, total, cancel)
        });
        self.finish(result)
    }

    fn render_all(
        &mut self,
        emitter: &FrameEmitter,
        total: u64,
        cancel: &CancelToken,
    ) -> RenderResult<()> {
        let format = self.config.frame_format;
        for i in 0..total {
            if cancel.is_cancelled() {
                tracing::info!(frame = i, "cancelled");
                return Err(RenderError::Cancelled);
            }
            self.state = SessionState::Rendering { frame: i };
            let index = FrameIndex(i);
            let frame = self.render_frame(index)?;
            let encoded = encode_frame(index, &frame, format)?;
            emitter.emit(encoded, progress_percent(index, total))?;
        }
        Ok(())
    }

    fn finish(&mut self, result: RenderResult<u64>) -> RenderResult<()> {
        if let Some(loaded) = self.loaded.as_mut() {
            loaded.compositor.clear_filters();
        }
        match result {
            Ok(frames) => {
                self.state = SessionState::Finished;
                tracing::info!(frames, "render finished");
                Ok(())
            }
            Err(e) if e.is_cancelled() => {
                self.state = SessionState::Cancelled;
                Err(e)
            }
            Err(e) => {
                self.state = SessionState::Failed;
                tracing::error!(error = %e, "render failed");
                Err(e)
            }
        }
    }
}
