// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::net::SocketAddr;

use axum::http::HeaderName;
use tower_http::cors::{Any, CorsLayer};

use server::store::Store;
use server::{notify, routes};

// Define the DB_URL here for the main application's use.
const MAIN_DB_URL: &str = "sqlite://database/records.db";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting up the server...");

    let store = match Store::connect(MAIN_DB_URL).await {
        Ok(store) => {
            tracing::info!("Record store opened successfully.");
            store
        }
        Err(e) => {
            tracing::error!("Failed to open the record store: {:?}", e);
            std::process::exit(1);
        }
    };

    // Once a day this refreshes the daily-reminder marker and logs the
    // next day's workload.
    notify::spawn_daily_reminder(store.clone());

    let app_routes = routes::create_router(store);

    // Configure CORS here, applying it globally to the router
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers([
            HeaderName::from_static("content-type"),
            HeaderName::from_static("accept"),
        ])
        .allow_origin(Any);

    let app = app_routes.layer(cors); // Apply the CORS layer

    let addr = SocketAddr::from(([0, 0, 0, 0], 3000));
    tracing::info!("The server listens on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
