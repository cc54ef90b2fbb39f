use std::time::Duration;
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::gql::subscriptions::prune_idle_channels;
use crate::AppState;

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Periodically drops per-user rate-limit buckets that have refilled and
/// subscription channels nobody listens to any more.
pub struct JanitorService {
    state: AppState,
    interval: Interval,
}

/// What a single sweep removed or kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub pruned_channels: usize,
    pub tracked_rate_limit_keys: usize,
}

impl JanitorService {
    pub fn new(state: AppState) -> Self {
        let mut interval = interval(SWEEP_INTERVAL);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        Self { state, interval }
    }

    /// Start the background janitor loop
    pub async fn run(&mut self) {
        info!("Starting janitor service");

        loop {
            self.interval.tick().await;

            let report = self.sweep();
            if report.pruned_channels > 0 {
                info!(
                    pruned_channels = report.pruned_channels,
                    tracked_rate_limit_keys = report.tracked_rate_limit_keys,
                    "Janitor sweep"
                );
            } else {
                debug!(
                    tracked_rate_limit_keys = report.tracked_rate_limit_keys,
                    "Janitor sweep, nothing to prune"
                );
            }
        }
    }

    pub fn sweep(&self) -> SweepReport {
        let limiter = self.state.bet_limiter();
        limiter.retain_recent();

        SweepReport {
            pruned_channels: prune_idle_channels(),
            tracked_rate_limit_keys: limiter.tracked_keys(),
        }
    }
}

/// Spawn the janitor service as a background task
pub fn spawn_janitor_service(state: AppState) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut service = JanitorService::new(state);
        service.run().await;
    })
}
