// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

pub mod convert;
pub mod costing;
pub mod error;
pub mod reminders;
pub mod schedule;
pub mod summary;
pub mod validate;

pub use error::EngineError;

/// A registered client.
///
/// Clients are created from the registration form (or a contact import on
/// the device side) and referenced by id from quotes and jobs. Phone and
/// address are the only mutable fields; deletion is always explicit.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub address: String,
}

impl Client {
    /// Display name used on quotes and jobs ("first last").
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// One line item of a bill of materials.
///
/// Quantity and unit price are kept as the free text the operator typed;
/// the costing module parses them leniently (anything unparseable counts
/// as zero). Legacy exports carry bare JSON numbers in these fields, so
/// deserialization accepts both.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MaterialLine {
    pub description: String,
    #[serde(deserialize_with = "de_amount_text")]
    pub quantity: String,
    #[serde(deserialize_with = "de_amount_text")]
    pub unit_price: String,
}

fn de_amount_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(f64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Number(number) => number.to_string(),
    })
}

/// Lifecycle of a quote. `Rejected` is terminal; `Accepted` enables
/// conversion into a job.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteStatus {
    Pending,
    Accepted,
    Rejected,
}

impl fmt::Display for QuoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            QuoteStatus::Pending => "Pending",
            QuoteStatus::Accepted => "Accepted",
            QuoteStatus::Rejected => "Rejected",
        };
        f.write_str(label)
    }
}

/// Payment state of a scheduled job. Transitions are free; rescheduling a
/// job resets it to `Pending`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Pending,
    Paid,
    Cancelled,
}

/// A cost estimate awaiting client acceptance.
///
/// Invariants: `materials_total` is the sum of the line subtotals and
/// `total = materials_total + labor_cost`. Both are overwritten from the
/// costing module on every mutation, never edited in place.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub id: String,
    pub client_id: String,
    pub client_name: String,
    pub phone: String,
    pub address: String,
    pub work_type: String,
    pub description: String,
    pub materials: Vec<MaterialLine>,
    pub labor_cost: f64,
    pub materials_total: f64,
    pub total: f64,
    pub valid_until: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub status: QuoteStatus,
    #[serde(default)]
    pub photos: Vec<String>,
    /// Set once by conversion; a quote carrying this marker can never be
    /// converted again.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub converted_to_job_id: Option<String>,
}

impl Quote {
    /// Whether the quote still belongs on the active (pending) list.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.status == QuoteStatus::Pending && self.valid_until >= now
    }
}

/// Confirmed, scheduled work with payment tracking.
///
/// Same cost law as [`Quote`]: `materials_cost` is the sum of subtotals
/// and `total = materials_cost + labor_cost`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    pub client_id: String,
    pub client_name: String,
    pub address: String,
    pub phone: String,
    pub work_type: String,
    pub description: String,
    pub materials: Vec<MaterialLine>,
    pub materials_cost: f64,
    pub labor_cost: f64,
    pub total: f64,
    pub scheduled_at: DateTime<Utc>,
    #[serde(default)]
    pub photos: Vec<String>,
    pub payment_status: PaymentStatus,
    /// Present only on jobs produced by quote conversion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote_id: Option<String>,
}

/// Operator-chosen date and time, combined into the single absolute
/// timestamp every scheduling operation works with.
#[derive(Deserialize, Debug, Clone, Copy)]
pub struct ScheduleInput {
    pub date: NaiveDate,
    pub time: NaiveTime,
}

impl ScheduleInput {
    pub fn timestamp(self) -> DateTime<Utc> {
        self.date.and_time(self.time).and_utc()
    }
}

/// Structure used to receive client creation data from the API.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NewClientPayload {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
}

/// Structure used to receive quote creation data from the API. The client
/// is referenced by id; name, phone and (unless overridden) address are
/// copied from the client record at build time.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewQuotePayload {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub work_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub materials: Vec<MaterialLine>,
    /// Free-text labor cost; unparseable input counts as zero.
    #[serde(default)]
    pub labor_cost: String,
    pub valid_until: DateTime<Utc>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub photos: Vec<String>,
}

/// Structure used to receive job creation data from the API.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewJobPayload {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub work_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub materials: Vec<MaterialLine>,
    #[serde(default)]
    pub labor_cost: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    #[serde(default)]
    pub photos: Vec<String>,
}

impl NewJobPayload {
    pub fn schedule(&self) -> ScheduleInput {
        ScheduleInput {
            date: self.date,
            time: self.time,
        }
    }
}
