// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::collections::BTreeMap;

use chrono::Datelike;
use serde::Serialize;

use crate::Job;

/// Cost entry for the most/least expensive job of the month. The basis is
/// materials plus labor, recomputed here rather than trusting the stored
/// total.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JobCost {
    pub id: String,
    pub client_name: String,
    pub total: f64,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClientCount {
    pub client_name: String,
    pub jobs: usize,
}

/// Aggregates over all jobs scheduled within one calendar month,
/// re-derived from the full job list on every request.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySummary {
    pub year: i32,
    pub month: u32,
    pub job_count: usize,
    pub materials_total: f64,
    pub labor_total: f64,
    pub month_total: f64,
    pub average_materials: f64,
    pub average_labor: f64,
    pub average_per_job: f64,
    pub most_expensive: Option<JobCost>,
    pub least_expensive: Option<JobCost>,
    pub jobs_by_type: BTreeMap<String, usize>,
    /// Top three clients by job count, descending.
    pub frequent_clients: Vec<ClientCount>,
}

fn job_cost(job: &Job) -> f64 {
    job.materials_cost + job.labor_cost
}

pub fn monthly_summary(year: i32, month: u32, jobs: &[Job]) -> MonthlySummary {
    let in_month: Vec<&Job> = jobs
        .iter()
        .filter(|job| {
            let date = job.scheduled_at.date_naive();
            date.year() == year && date.month() == month
        })
        .collect();

    let job_count = in_month.len();
    let materials_total: f64 = in_month.iter().map(|job| job.materials_cost).sum();
    let labor_total: f64 = in_month.iter().map(|job| job.labor_cost).sum();
    let month_total = materials_total + labor_total;

    let averages = |total: f64| if job_count > 0 { total / job_count as f64 } else { 0.0 };

    let most_expensive = in_month
        .iter()
        .max_by(|a, b| job_cost(a).total_cmp(&job_cost(b)))
        .map(|job| JobCost {
            id: job.id.clone(),
            client_name: job.client_name.clone(),
            total: job_cost(job),
        });
    let least_expensive = in_month
        .iter()
        .min_by(|a, b| job_cost(a).total_cmp(&job_cost(b)))
        .map(|job| JobCost {
            id: job.id.clone(),
            client_name: job.client_name.clone(),
            total: job_cost(job),
        });

    let mut jobs_by_type: BTreeMap<String, usize> = BTreeMap::new();
    for job in &in_month {
        *jobs_by_type.entry(job.work_type.clone()).or_default() += 1;
    }

    let mut per_client: BTreeMap<&str, usize> = BTreeMap::new();
    for job in &in_month {
        *per_client.entry(job.client_name.as_str()).or_default() += 1;
    }
    let mut frequent_clients: Vec<ClientCount> = per_client
        .into_iter()
        .map(|(client_name, jobs)| ClientCount {
            client_name: client_name.to_string(),
            jobs,
        })
        .collect();
    frequent_clients.sort_by(|a, b| b.jobs.cmp(&a.jobs));
    frequent_clients.truncate(3);

    MonthlySummary {
        year,
        month,
        job_count,
        materials_total,
        labor_total,
        month_total,
        average_materials: averages(materials_total),
        average_labor: averages(labor_total),
        average_per_job: averages(month_total),
        most_expensive,
        least_expensive,
        jobs_by_type,
        frequent_clients,
    }
}
