// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use common::{
    Client, Job, MaterialLine, NewQuotePayload, Quote, QuoteStatus, ScheduleInput, convert,
    costing, validate,
};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::AppError;
use crate::store::{CLIENTS, JOBS, QUOTES, Store, next_record_id};

#[derive(Deserialize, Debug)]
pub struct QuoteListParams {
    /// `all` includes archived quotes (accepted, rejected, expired).
    pub view: Option<String>,
}

/// Handler for listing quotes. The default view keeps only pending quotes
/// that are still valid; archived quotes stay in storage and show up
/// under `?view=all`.
pub async fn list_quotes(
    State(store): State<Store>,
    Query(params): Query<QuoteListParams>,
) -> Result<Json<Vec<Quote>>, AppError> {
    let mut quotes: Vec<Quote> = store.load_or_empty(QUOTES).await?;

    if params.view.as_deref() != Some("all") {
        let now = Utc::now();
        quotes.retain(|quote| quote.is_active(now));
    }
    quotes.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    info!("Successfully retrieved {} quotes.", quotes.len());
    Ok(Json(quotes))
}

/// Handler for creating a new quote. Client name, phone and (unless the
/// payload overrides it) address are copied from the referenced client;
/// totals are derived from the material lines and labor cost.
pub async fn create_quote(
    State(store): State<Store>,
    Json(payload): Json<NewQuotePayload>,
) -> Result<(StatusCode, Json<Quote>), AppError> {
    debug!("Received request to create quote for client: {}", payload.client_id);
    validate::validate_new_quote(&payload)?;

    let clients: Vec<Client> = store.load(CLIENTS).await?;
    let client = clients
        .iter()
        .find(|client| client.id == payload.client_id)
        .ok_or_else(|| AppError::not_found("client", &payload.client_id))?;

    let materials = validate::filled_materials(&payload.materials);
    let labor_cost = costing::parse_amount(&payload.labor_cost);
    let materials_total = costing::materials_total(&materials);

    let _guard = store.lock_writes().await;
    let mut quotes: Vec<Quote> = store.load(QUOTES).await?;

    let quote = Quote {
        id: next_record_id(
            quotes.iter().map(|q| q.id.as_str()),
            Utc::now().timestamp_millis(),
        ),
        client_id: client.id.clone(),
        client_name: client.full_name(),
        phone: client.phone.clone(),
        address: payload.address.unwrap_or_else(|| client.address.clone()),
        work_type: payload.work_type,
        description: payload.description,
        total: costing::grand_total(&materials, labor_cost),
        materials,
        labor_cost,
        materials_total,
        valid_until: payload.valid_until,
        created_at: Utc::now(),
        status: QuoteStatus::Pending,
        photos: payload.photos,
        converted_to_job_id: None,
    };

    quotes.push(quote.clone());
    store.save_all(QUOTES, &quotes).await?;

    info!("Quote created successfully with ID: {}", quote.id);
    Ok((StatusCode::CREATED, Json(quote)))
}

/// Handler for one quote's detail.
pub async fn get_quote(
    State(store): State<Store>,
    Path(quote_id): Path<String>,
) -> Result<Json<Quote>, AppError> {
    let quotes: Vec<Quote> = store.load_or_empty(QUOTES).await?;
    quotes
        .into_iter()
        .find(|quote| quote.id == quote_id)
        .map(Json)
        .ok_or_else(|| AppError::not_found("quote", &quote_id))
}

#[derive(Deserialize, Debug)]
pub struct QuoteStatusPayload {
    pub status: QuoteStatus,
}

/// Handler for accepting or rejecting a pending quote.
pub async fn set_quote_status(
    State(store): State<Store>,
    Path(quote_id): Path<String>,
    Json(payload): Json<QuoteStatusPayload>,
) -> Result<Json<Quote>, AppError> {
    let _guard = store.lock_writes().await;
    let mut quotes: Vec<Quote> = store.load(QUOTES).await?;

    let quote = quotes
        .iter_mut()
        .find(|quote| quote.id == quote_id)
        .ok_or_else(|| AppError::not_found("quote", &quote_id))?;
    convert::set_quote_status(quote, payload.status)?;
    let updated = quote.clone();

    store.save_all(QUOTES, &quotes).await?;
    info!("Quote {} is now {}.", updated.id, updated.status);
    Ok(Json(updated))
}

/// Handler for adding a material line to a quote. Totals are recomputed
/// from scratch, never patched.
pub async fn add_quote_material(
    State(store): State<Store>,
    Path(quote_id): Path<String>,
    Json(line): Json<MaterialLine>,
) -> Result<Json<Quote>, AppError> {
    validate::validate_material_line(&line)?;

    let _guard = store.lock_writes().await;
    let mut quotes: Vec<Quote> = store.load(QUOTES).await?;

    let quote = quotes
        .iter_mut()
        .find(|quote| quote.id == quote_id)
        .ok_or_else(|| AppError::not_found("quote", &quote_id))?;
    quote.materials.push(line);
    quote.materials_total = costing::materials_total(&quote.materials);
    quote.total = costing::grand_total(&quote.materials, quote.labor_cost);
    let updated = quote.clone();

    store.save_all(QUOTES, &quotes).await?;
    Ok(Json(updated))
}

/// Handler for removing a material line from a quote by index.
pub async fn remove_quote_material(
    State(store): State<Store>,
    Path((quote_id, index)): Path<(String, usize)>,
) -> Result<Json<Quote>, AppError> {
    let _guard = store.lock_writes().await;
    let mut quotes: Vec<Quote> = store.load(QUOTES).await?;

    let quote = quotes
        .iter_mut()
        .find(|quote| quote.id == quote_id)
        .ok_or_else(|| AppError::not_found("quote", &quote_id))?;
    if index >= quote.materials.len() {
        return Err(AppError::not_found("material line", &index.to_string()));
    }
    quote.materials.remove(index);
    quote.materials_total = costing::materials_total(&quote.materials);
    quote.total = costing::grand_total(&quote.materials, quote.labor_cost);
    let updated = quote.clone();

    store.save_all(QUOTES, &quotes).await?;
    Ok(Json(updated))
}

/// Handler for converting an accepted quote into a scheduled job.
///
/// The engine enforces the preconditions (accepted, not yet converted, no
/// schedule conflict); on success the new job and the conversion marker on
/// the quote are persisted together in one transaction.
pub async fn convert_quote(
    State(store): State<Store>,
    Path(quote_id): Path<String>,
    Json(schedule): Json<ScheduleInput>,
) -> Result<(StatusCode, Json<Job>), AppError> {
    debug!("Received request to convert quote {}", quote_id);

    let _guard = store.lock_writes().await;
    let mut quotes: Vec<Quote> = store.load(QUOTES).await?;
    let mut jobs: Vec<Job> = store.load(JOBS).await?;

    let position = quotes
        .iter()
        .position(|quote| quote.id == quote_id)
        .ok_or_else(|| AppError::not_found("quote", &quote_id))?;

    let job_id = next_record_id(
        jobs.iter().map(|job| job.id.as_str()),
        Utc::now().timestamp_millis(),
    );
    let job = convert::convert_to_job(&quotes[position], schedule.timestamp(), &jobs, job_id)?;

    quotes[position].converted_to_job_id = Some(job.id.clone());
    jobs.push(job.clone());
    store.save_pair((QUOTES, &quotes), (JOBS, &jobs)).await?;

    info!(
        "Quote {} converted to job {} scheduled at {}.",
        quote_id, job.id, job.scheduled_at
    );
    Ok((StatusCode::CREATED, Json(job)))
}
