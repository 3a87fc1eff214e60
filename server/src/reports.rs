// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
};
use chrono::{NaiveDate, Utc};
use common::{Job, reminders, schedule, summary};
use serde::Deserialize;
use tracing::info;

use crate::error::AppError;
use crate::store::{JOBS, Store};

#[derive(Deserialize, Debug)]
pub struct AgendaParams {
    /// Any date inside the wanted week; defaults to today.
    pub date: Option<NaiveDate>,
}

/// Handler for the weekly agenda: all jobs of the Monday-to-Sunday week
/// around the requested date, grouped per day. Re-derived from the full
/// job list on every call.
pub async fn week_agenda(
    State(store): State<Store>,
    Query(params): Query<AgendaParams>,
) -> Result<Json<Vec<schedule::AgendaDay>>, AppError> {
    let jobs: Vec<Job> = store.load_or_empty(JOBS).await?;
    let reference = params.date.unwrap_or_else(|| Utc::now().date_naive());

    let agenda = schedule::week_agenda(reference, &jobs);
    info!("Agenda for the week of {} computed.", reference);
    Ok(Json(agenda))
}

/// Handler for the monthly summary.
pub async fn monthly_summary(
    State(store): State<Store>,
    Path((year, month)): Path<(i32, u32)>,
) -> Result<Json<summary::MonthlySummary>, AppError> {
    if !(1..=12).contains(&month) {
        return Err(AppError::new(
            StatusCode::BAD_REQUEST,
            &format!("{month} is not a valid month"),
        ));
    }

    let jobs: Vec<Job> = store.load_or_empty(JOBS).await?;
    Ok(Json(summary::monthly_summary(year, month, &jobs)))
}

/// Handler for the pending reminder entries a delivery layer would
/// schedule: one per future, non-cancelled job.
pub async fn list_reminders(
    State(store): State<Store>,
) -> Result<Json<Vec<reminders::Reminder>>, AppError> {
    let jobs: Vec<Job> = store.load_or_empty(JOBS).await?;
    Ok(Json(reminders::upcoming_reminders(Utc::now(), &jobs)))
}
