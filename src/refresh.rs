use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use reqwest::Client;
use tokio::time::{sleep, Instant};
use tracing::{info, warn};

use crate::config::Config;
use crate::fetch;
use crate::process::dataset::preprocess;
use crate::store::{Snapshot, SnapshotStore};

/// Drives the fetch → preprocess → publish cycle. One instance, one writer:
/// the binary runs `run_once` before serving and then parks `run_forever` on
/// a background task.
pub struct Refresher {
    client: Client,
    config: Config,
    store: Arc<SnapshotStore>,
    /// Start of the most recent attempt, successful or not. Anchors the
    /// cadence so a slow cycle shortens the following sleep.
    last_attempt: Mutex<Option<Instant>>,
}

impl Refresher {
    pub fn new(client: Client, config: Config, store: Arc<SnapshotStore>) -> Self {
        Refresher {
            client,
            config,
            store,
            last_attempt: Mutex::new(None),
        }
    }

    /// One full refresh cycle. A failure anywhere leaves the published
    /// snapshot untouched; stale data beats no data.
    pub async fn run_once(&self) {
        *self.last_attempt.lock().unwrap() = Some(Instant::now());
        info!("updating data");

        let (population, emissions) = tokio::join!(
            fetch::fetch_dataset(&self.client, &self.config.population_url),
            fetch::fetch_dataset(&self.client, &self.config.emissions_url),
        );
        let (Some(population), Some(emissions)) = (population, emissions) else {
            warn!("updating data failed; keeping previous snapshot");
            return;
        };

        match preprocess(
            &population,
            &emissions,
            self.config.missing_value_threshold,
        ) {
            Ok((absolute, per_capita, reference_year)) => {
                let countries = absolute.rows.len();
                self.store.publish(Snapshot {
                    absolute,
                    per_capita,
                    reference_year: reference_year.clone(),
                    last_update: Some(Utc::now()),
                });
                info!(%reference_year, countries, "updating data done");
            }
            Err(err) => {
                warn!(error = %err, "preprocessing failed; keeping previous snapshot");
            }
        }
    }

    /// Endless refresh loop; never exits and never aborts on a failed cycle.
    pub async fn run_forever(&self) {
        loop {
            let elapsed = self
                .last_attempt
                .lock()
                .unwrap()
                .map(|started| started.elapsed())
                .unwrap_or(self.config.update_interval());
            sleep(next_sleep(self.config.update_interval(), elapsed)).await;
            self.run_once().await;
        }
    }
}

/// Sleep needed to hold the cadence: `max(0, interval − elapsed)`.
pub fn next_sleep(interval: Duration, elapsed: Duration) -> Duration {
    interval.saturating_sub(elapsed)
}
