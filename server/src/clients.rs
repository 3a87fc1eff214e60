// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use common::{Client, Job, NewClientPayload, validate};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::AppError;
use crate::store::{CLIENTS, JOBS, Store, next_record_id};

#[derive(Deserialize, Debug)]
pub struct ClientListParams {
    /// Case-insensitive match against first or last name.
    pub q: Option<String>,
}

/// Handler for listing clients, optionally filtered by name.
pub async fn list_clients(
    State(store): State<Store>,
    Query(params): Query<ClientListParams>,
) -> Result<Json<Vec<Client>>, AppError> {
    let clients: Vec<Client> = store.load_or_empty(CLIENTS).await?;

    let clients = match params.q.as_deref().map(str::to_lowercase) {
        Some(needle) if !needle.is_empty() => clients
            .into_iter()
            .filter(|client| {
                client.first_name.to_lowercase().contains(&needle)
                    || client.last_name.to_lowercase().contains(&needle)
            })
            .collect(),
        _ => clients,
    };

    info!("Successfully retrieved {} clients.", clients.len());
    Ok(Json(clients))
}

/// Handler for registering a new client.
pub async fn create_client(
    State(store): State<Store>,
    Json(payload): Json<NewClientPayload>,
) -> Result<(StatusCode, Json<Client>), AppError> {
    debug!("Received request to create client {} {}", payload.first_name, payload.last_name);
    validate::validate_new_client(&payload)?;

    let _guard = store.lock_writes().await;
    let mut clients: Vec<Client> = store.load(CLIENTS).await?;

    let client = Client {
        id: next_record_id(
            clients.iter().map(|c| c.id.as_str()),
            Utc::now().timestamp_millis(),
        ),
        first_name: payload.first_name.trim().to_string(),
        last_name: payload.last_name.trim().to_string(),
        phone: validate::normalize_phone(&payload.phone),
        address: payload.address.trim().to_string(),
    };

    clients.push(client.clone());
    store.save_all(CLIENTS, &clients).await?;

    info!("Client created successfully with ID: {}", client.id);
    Ok((StatusCode::CREATED, Json(client)))
}

#[derive(Deserialize, Debug)]
pub struct UpdateClientPayload {
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Handler for updating a client's phone and/or address in place.
pub async fn update_client(
    State(store): State<Store>,
    Path(client_id): Path<String>,
    Json(payload): Json<UpdateClientPayload>,
) -> Result<Json<Client>, AppError> {
    let _guard = store.lock_writes().await;
    let mut clients: Vec<Client> = store.load(CLIENTS).await?;

    let client = clients
        .iter_mut()
        .find(|client| client.id == client_id)
        .ok_or_else(|| AppError::not_found("client", &client_id))?;

    if let Some(phone) = payload.phone {
        client.phone = phone;
    }
    if let Some(address) = payload.address {
        client.address = address;
    }
    let updated = client.clone();

    store.save_all(CLIENTS, &clients).await?;
    info!("Client {} updated.", updated.id);
    Ok(Json(updated))
}

/// Handler for deleting a client by ID. Deletion is always explicit;
/// nothing expires a client record.
pub async fn delete_client(
    State(store): State<Store>,
    Path(client_id): Path<String>,
) -> Result<StatusCode, AppError> {
    debug!("Attempting to delete client with ID: {}", client_id);

    let _guard = store.lock_writes().await;
    let mut clients: Vec<Client> = store.load(CLIENTS).await?;

    let before = clients.len();
    clients.retain(|client| client.id != client_id);
    if clients.len() == before {
        return Err(AppError::not_found("client", &client_id));
    }

    store.save_all(CLIENTS, &clients).await?;
    info!("Client with ID {} deleted successfully.", client_id);
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for a client's job history, newest first.
pub async fn client_jobs(
    State(store): State<Store>,
    Path(client_id): Path<String>,
) -> Result<Json<Vec<Job>>, AppError> {
    let jobs: Vec<Job> = store.load_or_empty(JOBS).await?;

    let mut history: Vec<Job> = jobs
        .into_iter()
        .filter(|job| job.client_id == client_id)
        .collect();
    history.sort_by(|a, b| b.scheduled_at.cmp(&a.scheduled_at));

    Ok(Json(history))
}
