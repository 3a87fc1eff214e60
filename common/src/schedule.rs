// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use chrono::{DateTime, NaiveDate, Utc, Weekday};
use serde::Serialize;

use crate::Job;

/// Two job timestamps closer than this are treated as colliding. This is
/// a tolerance window, not an exact match.
pub const CONFLICT_WINDOW_MS: i64 = 60_000;

/// Scans `jobs` in collection order and returns the first one whose
/// scheduled time falls inside the conflict window around `candidate`.
///
/// An empty input never conflicts. When re-checking an existing job
/// (edit, reschedule) the caller must exclude that job's own record from
/// the iterator, or the job will collide with itself.
pub fn find_conflict<'a, I>(candidate: DateTime<Utc>, jobs: I) -> Option<&'a Job>
where
    I: IntoIterator<Item = &'a Job>,
{
    jobs.into_iter().find(|job| {
        (candidate - job.scheduled_at).num_milliseconds().abs() < CONFLICT_WINDOW_MS
    })
}

/// One day of the weekly agenda.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgendaDay {
    pub date: NaiveDate,
    pub jobs: Vec<Job>,
}

/// Groups jobs into the Monday-to-Sunday week containing `reference`.
/// Every day of the week is present, jobs within a day sorted by
/// scheduled time ascending. Jobs outside the week are dropped.
pub fn week_agenda(reference: NaiveDate, jobs: &[Job]) -> Vec<AgendaDay> {
    let week = reference.week(Weekday::Mon);
    let mut days: Vec<AgendaDay> = week
        .first_day()
        .iter_days()
        .take(7)
        .map(|date| AgendaDay { date, jobs: Vec::new() })
        .collect();

    for job in jobs {
        let day = job.scheduled_at.date_naive();
        if let Some(slot) = days.iter_mut().find(|slot| slot.date == day) {
            slot.jobs.push(job.clone());
        }
    }

    for slot in &mut days {
        slot.jobs.sort_by_key(|job| job.scheduled_at);
    }

    days
}
