use crate::{Recorder, Transition, recorder::manager::Shared};

use std::{sync::Weak, time::Duration};

use tokio::{
    task::JoinHandle,
    time::{Instant, interval_at},
};
use tracing::{debug, warn};

/// Countdown cadence.
pub const COUNTDOWN_PERIOD: Duration = Duration::from_secs(1);

/// Periodic task feeding countdown ticks to the recorder.
///
/// Holds only a weak reference to the recorder. Dropping the handle leaves
/// the task to finish on its own; [`Countdown::cancel`] aborts it at once.
pub(crate) struct Countdown {
    handle: JoinHandle<()>,
    generation: u64,
}

impl Countdown {
    /// Spawn on the current runtime. Returns `None` outside a runtime, in
    /// which case the host drives [`Recorder::tick`] itself.
    pub(crate) fn spawn(shared: Weak<Shared>, generation: u64, period: Duration) -> Option<Self> {
        let runtime = tokio::runtime::Handle::try_current().ok()?;

        let handle = runtime.spawn(async move {
            let mut ticks = interval_at(Instant::now() + period, period);
            loop {
                ticks.tick().await;

                let Some(shared) = shared.upgrade() else {
                    debug!(generation, "Recorder dropped, countdown ends");
                    break;
                };

                match Recorder::from_shared(shared).countdown_tick(generation) {
                    Ok(Transition::Countdown(_)) => continue,
                    Ok(_) => break,
                    Err(e) => {
                        warn!(generation, error = %e, "Recording did not start");
                        break;
                    }
                }
            }
        });

        debug!(generation, "Countdown task spawned");

        Some(Self { handle, generation })
    }

    /// Abort the task. No tick fires afterwards.
    pub(crate) fn cancel(self) {
        self.handle.abort();
        debug!(generation = self.generation, "Countdown cancelled");
    }
}
