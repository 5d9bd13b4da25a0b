use crate::{Recorder, recorder::manager::{FrameOutcome, Shared}};

use std::{sync::Weak, time::Duration};

use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};
use tracing::{debug, error, info};

/// The per-frame driver.
///
/// One persistent task per recording attempt. Every frame it asks the
/// recorder to sample and publish; the recorder decides under its own lock
/// whether sampling is permitted, so pausing never stops or restarts the
/// loop. The task exits when shut down, when the recorder is dropped, or
/// when the generation it was started for is no longer current.
pub struct AnimationLoop {
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
    generation: u64,
}

impl AnimationLoop {
    /// Spawn on the current runtime. Returns `None` outside a runtime, in
    /// which case the host calls [`Recorder::frame_tick`] from its own frame
    /// callback.
    pub(crate) fn spawn(shared: Weak<Shared>, generation: u64, period: Duration) -> Option<Self> {
        let runtime = tokio::runtime::Handle::try_current().ok()?;
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let handle = runtime.spawn(async move {
            let mut frames = interval(period);
            frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => {
                        debug!(generation, "Animation loop shut down");
                        break;
                    }
                    _ = frames.tick() => {
                        let Some(shared) = shared.upgrade() else {
                            debug!(generation, "Recorder dropped, animation loop ends");
                            break;
                        };
                        match Recorder::from_shared(shared).frame_tick_for(generation) {
                            Ok(FrameOutcome::Ended) => break,
                            Ok(_) => {}
                            Err(e) => {
                                error!(generation, error = %e, "Frame sampling failed, loop ends");
                                break;
                            }
                        }
                    }
                }
            }
        });

        info!(generation, frame_ms = period.as_millis(), "Animation loop started");

        Some(Self {
            shutdown_tx,
            handle,
            generation,
        })
    }

    /// Generation the loop serves.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether the task is still alive.
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Signal shutdown and abort. The caller holds the recorder lock, so no
    /// frame is mid-publish when this runs.
    pub(crate) fn stop(self) {
        let _ = self.shutdown_tx.send(true);
        self.handle.abort();
        debug!(generation = self.generation, "Animation loop stopped");
    }
}
