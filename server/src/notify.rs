// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use chrono::Utc;
use common::{Job, PaymentStatus, reminders};
use tokio::time::{self, Duration};
use tracing::{debug, error, info};

use crate::store::{DAILY_MARKER, JOBS, Store, StoreError};

/// Spawns the daily-reminder loop: every few minutes it checks whether a
/// new day has started and, once per day, logs the next day's workload
/// and refreshes the `lastDailyNotificationScheduled` marker that a
/// notification consumer watches.
pub fn spawn_daily_reminder(store: Store) {
    tokio::spawn(async move {
        let mut interval = time::interval(Duration::from_secs(5 * 60));

        // The first tick completes immediately. Skip it to wait for the
        // first interval.
        interval.tick().await;

        loop {
            interval.tick().await;
            if let Err(err) = refresh_daily_marker(&store).await {
                error!("Error during the daily reminder check: {:?}", err);
            }
        }
    });
}

/// One reminder pass. A no-op when the marker already carries today's
/// date, so restarts inside the same day do not repeat the reminder.
pub async fn refresh_daily_marker(store: &Store) -> Result<(), StoreError> {
    let today = Utc::now().date_naive();

    if let Some(marker) = store.read_raw(DAILY_MARKER).await? {
        if marker == today.to_string() {
            debug!("Daily reminder already recorded for {}.", today);
            return Ok(());
        }
    }

    let jobs: Vec<Job> = store.load_or_empty(JOBS).await?;
    let Some(tomorrow) = today.succ_opt() else {
        return Ok(());
    };
    let due = reminders::jobs_on(tomorrow, &jobs)
        .into_iter()
        .filter(|job| job.payment_status != PaymentStatus::Cancelled)
        .count();

    info!(
        "New day detected: {}, {} job(s) scheduled for tomorrow.",
        today, due
    );
    store.write_raw(DAILY_MARKER, &today.to_string()).await
}
