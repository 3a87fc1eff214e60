// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::QuoteStatus;

/// Failures the engine can report. Every variant is terminal for the
/// triggering operation and carries what the caller needs to surface it;
/// none of them touch stored state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Required form fields are empty.
    #[error("missing required fields: {}", missing.join(", "))]
    Validation { missing: Vec<&'static str> },

    /// The candidate timestamp falls inside the conflict window of an
    /// existing job.
    #[error("schedule conflict with job {job_id} ({client_name}) at {scheduled_at}")]
    ScheduleConflict {
        job_id: String,
        client_name: String,
        scheduled_at: DateTime<Utc>,
    },

    /// A lifecycle transition the quote's current status does not allow.
    #[error("quote is {from}, cannot {action}")]
    InvalidStatus {
        from: QuoteStatus,
        action: &'static str,
    },

    /// The quote already produced a job.
    #[error("quote was already converted to job {job_id}")]
    AlreadyConverted { job_id: String },
}
