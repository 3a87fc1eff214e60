// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use axum::{
    Router,
    routing::{delete, get, patch, post},
};

use crate::store::Store;
use crate::{backup, clients, jobs, quotes, reports};

/// Creates and configures the application router.
pub fn create_router(store: Store) -> Router {
    Router::new()
        // Clients
        .route("/api/clients", get(clients::list_clients))
        .route("/api/clients", post(clients::create_client))
        .route("/api/clients/{id}", patch(clients::update_client))
        .route("/api/clients/{id}", delete(clients::delete_client))
        .route("/api/clients/{id}/jobs", get(clients::client_jobs))
        // Quotes
        .route("/api/quotes", get(quotes::list_quotes))
        .route("/api/quotes", post(quotes::create_quote))
        .route("/api/quotes/{id}", get(quotes::get_quote))
        .route("/api/quotes/{id}/status", patch(quotes::set_quote_status))
        .route("/api/quotes/{id}/materials", post(quotes::add_quote_material))
        .route(
            "/api/quotes/{id}/materials/{index}",
            delete(quotes::remove_quote_material),
        )
        .route("/api/quotes/{id}/convert", post(quotes::convert_quote))
        // Jobs
        .route("/api/jobs", get(jobs::list_jobs))
        .route("/api/jobs", post(jobs::create_job))
        .route("/api/jobs/{id}", get(jobs::get_job))
        .route("/api/jobs/{id}", delete(jobs::delete_job))
        .route("/api/jobs/{id}/schedule", patch(jobs::reschedule_job))
        .route("/api/jobs/{id}/payment", patch(jobs::set_payment_status))
        .route("/api/jobs/{id}/materials", post(jobs::add_job_material))
        .route(
            "/api/jobs/{id}/materials/{index}",
            delete(jobs::remove_job_material),
        )
        .route("/api/jobs/{id}/labor", patch(jobs::update_labor))
        .route("/api/jobs/{id}/address", patch(jobs::update_address))
        // Derived views
        .route("/api/agenda/week", get(reports::week_agenda))
        .route("/api/summary/{year}/{month}", get(reports::monthly_summary))
        .route("/api/reminders", get(reports::list_reminders))
        // Backup
        .route("/api/backup", get(backup::export_backup))
        .route("/api/backup", post(backup::import_backup))
        // Adds the record store to the application state
        .with_state(store)
}
