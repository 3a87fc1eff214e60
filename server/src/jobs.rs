// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
};
use chrono::Utc;
use common::{
    Client, EngineError, Job, MaterialLine, NewJobPayload, PaymentStatus, ScheduleInput, costing,
    schedule, validate,
};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::AppError;
use crate::store::{CLIENTS, JOBS, Store, next_record_id};

fn conflict_error(conflict: &Job) -> EngineError {
    EngineError::ScheduleConflict {
        job_id: conflict.id.clone(),
        client_name: conflict.client_name.clone(),
        scheduled_at: conflict.scheduled_at,
    }
}

/// Handler for listing all jobs in collection order.
pub async fn list_jobs(State(store): State<Store>) -> Result<Json<Vec<Job>>, AppError> {
    let jobs: Vec<Job> = store.load_or_empty(JOBS).await?;
    info!("Successfully retrieved {} jobs.", jobs.len());
    Ok(Json(jobs))
}

/// Handler for creating a new job: validate the form, then check the
/// requested slot against every existing job, then persist. A conflict
/// aborts before anything is written.
pub async fn create_job(
    State(store): State<Store>,
    Json(payload): Json<NewJobPayload>,
) -> Result<(StatusCode, Json<Job>), AppError> {
    debug!("Received request to create job for client: {}", payload.client_id);
    validate::validate_new_job(&payload)?;

    let clients: Vec<Client> = store.load(CLIENTS).await?;
    let client = clients
        .iter()
        .find(|client| client.id == payload.client_id)
        .ok_or_else(|| AppError::not_found("client", &payload.client_id))?;

    let materials = validate::filled_materials(&payload.materials);
    let labor_cost = costing::parse_amount(&payload.labor_cost);
    let scheduled_at = payload.schedule().timestamp();

    let _guard = store.lock_writes().await;
    let mut jobs: Vec<Job> = store.load(JOBS).await?;

    if let Some(conflict) = schedule::find_conflict(scheduled_at, &jobs) {
        return Err(conflict_error(conflict).into());
    }

    let job = Job {
        id: next_record_id(
            jobs.iter().map(|job| job.id.as_str()),
            Utc::now().timestamp_millis(),
        ),
        client_id: client.id.clone(),
        client_name: client.full_name(),
        address: payload.address,
        phone: client.phone.clone(),
        work_type: payload.work_type,
        description: payload.description,
        materials_cost: costing::materials_total(&materials),
        total: costing::grand_total(&materials, labor_cost),
        materials,
        labor_cost,
        scheduled_at,
        photos: payload.photos,
        payment_status: PaymentStatus::Pending,
        quote_id: None,
    };

    jobs.push(job.clone());
    store.save_all(JOBS, &jobs).await?;

    info!("Job created successfully with ID: {}", job.id);
    Ok((StatusCode::CREATED, Json(job)))
}

/// Handler for one job's detail.
pub async fn get_job(
    State(store): State<Store>,
    Path(job_id): Path<String>,
) -> Result<Json<Job>, AppError> {
    let jobs: Vec<Job> = store.load_or_empty(JOBS).await?;
    jobs.into_iter()
        .find(|job| job.id == job_id)
        .map(Json)
        .ok_or_else(|| AppError::not_found("job", &job_id))
}

/// Handler for deleting a job by ID.
pub async fn delete_job(
    State(store): State<Store>,
    Path(job_id): Path<String>,
) -> Result<StatusCode, AppError> {
    debug!("Attempting to delete job with ID: {}", job_id);

    let _guard = store.lock_writes().await;
    let mut jobs: Vec<Job> = store.load(JOBS).await?;

    let before = jobs.len();
    jobs.retain(|job| job.id != job_id);
    if jobs.len() == before {
        return Err(AppError::not_found("job", &job_id));
    }

    store.save_all(JOBS, &jobs).await?;
    info!("Job with ID {} deleted successfully.", job_id);
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for rescheduling a job. The new slot is conflict-checked with
/// the job's own record excluded (it must not collide with itself), and a
/// successful reschedule resets the payment status to pending.
pub async fn reschedule_job(
    State(store): State<Store>,
    Path(job_id): Path<String>,
    Json(schedule_input): Json<ScheduleInput>,
) -> Result<Json<Job>, AppError> {
    let candidate = schedule_input.timestamp();

    let _guard = store.lock_writes().await;
    let mut jobs: Vec<Job> = store.load(JOBS).await?;

    let position = jobs
        .iter()
        .position(|job| job.id == job_id)
        .ok_or_else(|| AppError::not_found("job", &job_id))?;

    let others = jobs.iter().filter(|job| job.id != job_id);
    if let Some(conflict) = schedule::find_conflict(candidate, others) {
        return Err(conflict_error(conflict).into());
    }

    jobs[position].scheduled_at = candidate;
    jobs[position].payment_status = PaymentStatus::Pending;
    let updated = jobs[position].clone();

    store.save_all(JOBS, &jobs).await?;
    info!("Job {} rescheduled to {}.", updated.id, updated.scheduled_at);
    Ok(Json(updated))
}

#[derive(Deserialize, Debug)]
pub struct PaymentPayload {
    pub status: PaymentStatus,
}

/// Handler for changing a job's payment status. Transitions are free; the
/// follow-up the UI forces after a cancellation (reschedule or delete) is
/// the caller's flow, not a storage rule.
pub async fn set_payment_status(
    State(store): State<Store>,
    Path(job_id): Path<String>,
    Json(payload): Json<PaymentPayload>,
) -> Result<Json<Job>, AppError> {
    let _guard = store.lock_writes().await;
    let mut jobs: Vec<Job> = store.load(JOBS).await?;

    let job = jobs
        .iter_mut()
        .find(|job| job.id == job_id)
        .ok_or_else(|| AppError::not_found("job", &job_id))?;
    job.payment_status = payload.status;
    let updated = job.clone();

    store.save_all(JOBS, &jobs).await?;
    info!("Job {} payment status changed.", updated.id);
    Ok(Json(updated))
}

/// Handler for adding a material line to a job.
pub async fn add_job_material(
    State(store): State<Store>,
    Path(job_id): Path<String>,
    Json(line): Json<MaterialLine>,
) -> Result<Json<Job>, AppError> {
    validate::validate_material_line(&line)?;

    let _guard = store.lock_writes().await;
    let mut jobs: Vec<Job> = store.load(JOBS).await?;

    let job = jobs
        .iter_mut()
        .find(|job| job.id == job_id)
        .ok_or_else(|| AppError::not_found("job", &job_id))?;
    job.materials.push(line);
    job.materials_cost = costing::materials_total(&job.materials);
    job.total = costing::grand_total(&job.materials, job.labor_cost);
    let updated = job.clone();

    store.save_all(JOBS, &jobs).await?;
    Ok(Json(updated))
}

/// Handler for removing a material line from a job by index.
pub async fn remove_job_material(
    State(store): State<Store>,
    Path((job_id, index)): Path<(String, usize)>,
) -> Result<Json<Job>, AppError> {
    let _guard = store.lock_writes().await;
    let mut jobs: Vec<Job> = store.load(JOBS).await?;

    let job = jobs
        .iter_mut()
        .find(|job| job.id == job_id)
        .ok_or_else(|| AppError::not_found("job", &job_id))?;
    if index >= job.materials.len() {
        return Err(AppError::not_found("material line", &index.to_string()));
    }
    job.materials.remove(index);
    job.materials_cost = costing::materials_total(&job.materials);
    job.total = costing::grand_total(&job.materials, job.labor_cost);
    let updated = job.clone();

    store.save_all(JOBS, &jobs).await?;
    Ok(Json(updated))
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct LaborPayload {
    /// Free-text amount, parsed the same way the creation forms parse it.
    pub labor_cost: String,
}

/// Handler for updating a job's labor cost.
pub async fn update_labor(
    State(store): State<Store>,
    Path(job_id): Path<String>,
    Json(payload): Json<LaborPayload>,
) -> Result<Json<Job>, AppError> {
    let _guard = store.lock_writes().await;
    let mut jobs: Vec<Job> = store.load(JOBS).await?;

    let job = jobs
        .iter_mut()
        .find(|job| job.id == job_id)
        .ok_or_else(|| AppError::not_found("job", &job_id))?;
    job.labor_cost = costing::parse_amount(&payload.labor_cost);
    job.total = costing::grand_total(&job.materials, job.labor_cost);
    let updated = job.clone();

    store.save_all(JOBS, &jobs).await?;
    Ok(Json(updated))
}

#[derive(Deserialize, Debug)]
pub struct AddressPayload {
    pub address: String,
}

/// Handler for updating the address a job is carried out at.
pub async fn update_address(
    State(store): State<Store>,
    Path(job_id): Path<String>,
    Json(payload): Json<AddressPayload>,
) -> Result<Json<Job>, AppError> {
    if payload.address.trim().is_empty() {
        return Err(EngineError::Validation {
            missing: vec!["address"],
        }
        .into());
    }

    let _guard = store.lock_writes().await;
    let mut jobs: Vec<Job> = store.load(JOBS).await?;

    let job = jobs
        .iter_mut()
        .find(|job| job.id == job_id)
        .ok_or_else(|| AppError::not_found("job", &job_id))?;
    job.address = payload.address;
    let updated = job.clone();

    store.save_all(JOBS, &jobs).await?;
    Ok(Json(updated))
}
