pub mod error;
pub mod routes;
pub mod state;

use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    http::{header::CONTENT_TYPE, Method},
    routing::{get, post},
    Router,
};
use tokio::{net::TcpListener, signal, sync::broadcast::error::RecvError, task::JoinHandle};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::events::PropertyEvents;

pub use error::AppError;
pub use state::AppState;

/// Files accepted in one multipart request (thumbnail plus gallery)
const MAX_FILES_PER_REQUEST: usize = 12;

pub fn router(state: AppState) -> Router {
    let body_limit = state
        .config
        .max_upload_bytes
        .saturating_mul(MAX_FILES_PER_REQUEST);

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/health", get(routes::health))
        .route(
            "/api/properties",
            get(routes::list_properties).post(routes::create_property),
        )
        .route(
            "/api/properties/:id",
            get(routes::get_property)
                .patch(routes::patch_property)
                .delete(routes::delete_property),
        )
        .route("/api/properties/:id/views", post(routes::record_view))
        .route(
            "/api/properties/:id/images",
            post(routes::upload_property_images),
        )
        .route("/api/admin/properties", get(routes::list_all_properties))
        .route(
            "/api/users",
            get(routes::list_users).post(routes::register_user),
        )
        .route(
            "/api/users/:id",
            get(routes::get_user).put(routes::put_user),
        )
        .route(
            "/api/users/:id/avatar",
            post(routes::upload_avatar).patch(routes::set_avatar),
        )
        .route(
            "/api/agents/:id/properties",
            get(routes::agent_properties),
        )
        .route("/api/auth/login", post(routes::login))
        .route("/api/events/refresh", post(routes::refresh))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Log every property event, standing in for an open listing view
pub fn spawn_event_logger(events: &PropertyEvents) -> JoinHandle<()> {
    let mut receiver = events.subscribe();
    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(event) => info!(?event, "property event"),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "event listener fell behind"),
                Err(RecvError::Closed) => break,
            }
        }
    })
}

pub async fn serve(state: AppState) -> Result<()> {
    let address = format!("0.0.0.0:{}", state.config.port);
    let _listener_task = spawn_event_logger(&state.events);
    let app = router(state);

    info!("Binding to {address}");
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install terminate handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
