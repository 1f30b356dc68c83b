//! Hands encoded frames to a sink running on its own thread.

use std::sync::mpsc::{Receiver, SyncSender, sync_channel};
use std::thread;

use crate::encode::sink::FrameSink;
use crate::foundation::error::{RenderError, RenderResult};
use crate::render::frame::EncodedFrame;

/// Producer side of the encoder channel.
pub(crate) struct FrameEmitter {
    tx: SyncSender<(EncodedFrame, f64)>,
}

impl FrameEmitter {
    /// Queue a frame, blocking while the channel is full.
    pub(crate) fn emit(&self, frame: EncodedFrame, progress: f64) -> RenderResult<()> {
        self.tx
            .send((frame, progress))
            .map_err(|_| RenderError::encode("frame sink stopped accepting frames"))
    }
}

fn consume(sink: &mut dyn FrameSink, rx: Receiver<(EncodedFrame, f64)>) -> RenderResult<u64> {
    let mut next = 0u64;
    let mut last_decile = 0u32;
    for (frame, progress) in rx {
        if frame.index.0 != next {
            return Err(RenderError::encode(format!(
                "out-of-order frame {} (expected {next})",
                frame.index.0
            )));
        }
        sink.push_frame(frame, progress)?;
        next += 1;

        let decile = (progress / 10.0).floor() as u32;
        if decile > last_decile {
            last_decile = decile;
            tracing::info!(frames = next, progress, "render progress");
        }
    }
    Ok(next)
}

/// Run `produce` with an emitter feeding `sink` on a scoped encoder thread.
///
/// The channel holds at most `capacity` frames. Once both sides are done the sink receives
/// `end` on success, otherwise `abort` with the first failure. A sink failure takes precedence
/// over the producer error it causes.
pub(crate) fn with_emitter<F>(
    sink: &mut dyn FrameSink,
    capacity: usize,
    produce: F,
) -> RenderResult<u64>
where
    F: FnOnce(&FrameEmitter) -> RenderResult<()>,
{
    let (produced, consumed) = thread::scope(|scope| {
        let (tx, rx) = sync_channel(capacity.max(1));
        let consumer = thread::Builder::new()
            .name("frame-sink".to_owned())
            .spawn_scoped(scope, || consume(&mut *sink, rx));
        let consumer = match consumer {
            Ok(handle) => handle,
            Err(e) => {
                let err = RenderError::encode(format!("spawn frame sink thread: {e}"));
                return (Err(err), Ok(0));
            }
        };

        let produced = produce(&FrameEmitter { tx });
        let consumed = consumer
            .join()
            .unwrap_or_else(|_| Err(RenderError::encode("frame sink thread panicked")));
        (produced, consumed)
    });

    let outcome = match (produced, consumed) {
        (Ok(()), Ok(n)) => Ok(n),
        (_, Err(e)) | (Err(e), Ok(_)) => Err(e),
    };
    match outcome {
        Ok(n) => match sink.end() {
            Ok(()) => Ok(n),
            Err(e) => {
                tracing::error!(error = %e, "frame sink failed to finish");
                sink.abort(&e);
                Err(e)
            }
        },
        Err(e) => {
            sink.abort(&e);
            Err(e)
        }
    }
}
