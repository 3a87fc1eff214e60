// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::{Job, PaymentStatus};

/// How long before a job's scheduled time its reminder fires.
pub fn reminder_lead() -> Duration {
    Duration::hours(1)
}

/// A reminder entry for a delivery layer to schedule. The backend only
/// derives these; registering and firing notifications stays on the
/// device side.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub job_id: String,
    pub client_name: String,
    pub description: String,
    pub fire_at: DateTime<Utc>,
    pub scheduled_at: DateTime<Utc>,
}

/// One reminder per non-cancelled job whose fire time is still in the
/// future, ordered by fire time.
pub fn upcoming_reminders(now: DateTime<Utc>, jobs: &[Job]) -> Vec<Reminder> {
    let mut reminders: Vec<Reminder> = jobs
        .iter()
        .filter(|job| job.payment_status != PaymentStatus::Cancelled)
        .filter_map(|job| {
            let fire_at = job.scheduled_at - reminder_lead();
            (fire_at > now).then(|| Reminder {
                job_id: job.id.clone(),
                client_name: job.client_name.clone(),
                description: job.description.clone(),
                fire_at,
                scheduled_at: job.scheduled_at,
            })
        })
        .collect();

    reminders.sort_by_key(|reminder| reminder.fire_at);
    reminders
}

/// Jobs scheduled on a given calendar day, used by the daily reminder.
pub fn jobs_on(date: NaiveDate, jobs: &[Job]) -> Vec<&Job> {
    jobs.iter()
        .filter(|job| job.scheduled_at.date_naive() == date)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(id: &str, status: PaymentStatus, when: &str) -> Job {
        Job {
            id: id.to_string(),
            client_id: "1".to_string(),
            client_name: "Ana Perez".to_string(),
            address: "Calle 1".to_string(),
            phone: "+54111".to_string(),
            work_type: "Aire".to_string(),
            description: "service".to_string(),
            materials: Vec::new(),
            materials_cost: 0.0,
            labor_cost: 0.0,
            total: 0.0,
            scheduled_at: when.parse().unwrap(),
            photos: Vec::new(),
            payment_status: status,
            quote_id: None,
        }
    }

    #[test]
    fn test_reminder_fires_one_hour_before() {
        let jobs = vec![job("1", PaymentStatus::Pending, "2024-03-01T10:00:00Z")];
        let now = "2024-03-01T08:00:00Z".parse().unwrap();

        let reminders = upcoming_reminders(now, &jobs);
        assert_eq!(reminders.len(), 1);
        assert_eq!(
            reminders[0].fire_at,
            "2024-03-01T09:00:00Z".parse::<DateTime<Utc>>().unwrap()
        );
    }

    #[test]
    fn test_cancelled_jobs_get_no_reminder() {
        let jobs = vec![job("1", PaymentStatus::Cancelled, "2024-03-01T10:00:00Z")];
        let now = "2024-03-01T08:00:00Z".parse().unwrap();

        assert!(upcoming_reminders(now, &jobs).is_empty());
    }

    #[test]
    fn test_past_fire_times_are_skipped() {
        // 09:30 is past the 09:00 fire time even though the job itself is
        // still ahead.
        let jobs = vec![job("1", PaymentStatus::Pending, "2024-03-01T10:00:00Z")];
        let now = "2024-03-01T09:30:00Z".parse().unwrap();

        assert!(upcoming_reminders(now, &jobs).is_empty());
    }

    #[test]
    fn test_reminders_sorted_by_fire_time() {
        let jobs = vec![
            job("late", PaymentStatus::Pending, "2024-03-02T10:00:00Z"),
            job("soon", PaymentStatus::Paid, "2024-03-01T10:00:00Z"),
        ];
        let now = "2024-03-01T00:00:00Z".parse().unwrap();

        let ids: Vec<String> = upcoming_reminders(now, &jobs)
            .into_iter()
            .map(|reminder| reminder.job_id)
            .collect();
        assert_eq!(ids, vec!["soon".to_string(), "late".to_string()]);
    }

    #[test]
    fn test_jobs_on_matches_the_calendar_day() {
        let jobs = vec![
            job("1", PaymentStatus::Pending, "2024-03-01T23:30:00Z"),
            job("2", PaymentStatus::Pending, "2024-03-02T00:30:00Z"),
        ];

        let day = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        let on_day = jobs_on(day, &jobs);
        assert_eq!(on_day.len(), 1);
        assert_eq!(on_day[0].id, "2");
    }
}
