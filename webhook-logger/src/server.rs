use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{HeaderMap, HeaderValue, Method, StatusCode, Uri, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use tokio::{net::TcpListener, signal, task};
use tower_http::trace::{DefaultOnFailure, TraceLayer};
use tracing::{Level, error, info, warn};

use crate::{
    dashboard,
    error::ServerError,
    invariants::Timestamp,
    models::DeliveryRecord,
    report::{self, SaveOutcome},
    store::LogStore,
};

const SERVER_NAME: &str = "webhook-test-server";

/// Everything a handler needs, fixed at startup.
#[derive(Clone)]
pub struct AppState {
    store: Arc<LogStore>,
    port: u16,
    dashboard_limit: usize,
}

impl AppState {
    pub fn new(store: Arc<LogStore>, port: u16, dashboard_limit: usize) -> Self {
        Self {
            store,
            port,
            dashboard_limit,
        }
    }
}

#[derive(Debug, Serialize)]
struct Ack {
    status: &'static str,
    message: &'static str,
    timestamp: Timestamp,
}

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    server: &'static str,
    timestamp: Timestamp,
}

pub async fn serve(listener: TcpListener, state: AppState) -> Result<(), ServerError> {
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(show_dashboard).post(receive).fallback(unsupported))
        .route("/health", get(health).post(receive).fallback(unsupported))
        .fallback(fallback)
        .layer(DefaultBodyLimit::disable())
        // 501 for unsupported methods is an answer, not a server fault.
        .layer(TraceLayer::new_for_http().on_failure(DefaultOnFailure::new().level(Level::DEBUG)))
        .with_state(state)
}

/// Any path accepts POST deliveries; other GETs are unknown pages.
async fn fallback(
    state: State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    match method {
        Method::POST => receive(state, method, uri, headers, body)
            .await
            .into_response(),
        Method::GET | Method::HEAD => (StatusCode::NOT_FOUND, "Not Found").into_response(),
        _ => unsupported().await.into_response(),
    }
}

async fn receive(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let record = DeliveryRecord::from_request(Timestamp::now(), &method, &uri, &headers, &body);
    let outcome = persist(&state.store, record.clone()).await;
    println!(
        "{}",
        report::render(&record, body.len(), state.store.path(), &outcome)
    );

    (
        [(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        )],
        Json(Ack {
            status: "received",
            message: "Webhook received successfully",
            timestamp: Timestamp::now(),
        }),
    )
}

// Never fails: the sender is acked whatever happens to the log file.
async fn persist(store: &Arc<LogStore>, record: DeliveryRecord) -> SaveOutcome {
    let store = store.clone();
    match task::spawn_blocking(move || store.append(record)).await {
        Ok(Ok(total)) => SaveOutcome::Saved { total },
        Ok(Err(e)) => {
            warn!(error = %e, "failed to save delivery");
            SaveOutcome::Failed(e.to_string())
        }
        Err(e) => {
            error!(error = %e, "delivery save task failed");
            SaveOutcome::Failed(e.to_string())
        }
    }
}

async fn show_dashboard(State(state): State<AppState>) -> Html<String> {
    let store = state.store.clone();
    let limit = state.dashboard_limit;
    let recent = task::spawn_blocking(move || store.recent(limit))
        .await
        .unwrap_or_else(|e| {
            error!(error = %e, "delivery log read task failed");
            Vec::new()
        });
    Html(dashboard::render(state.port, &recent))
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "ok",
        server: SERVER_NAME,
        timestamp: Timestamp::now(),
    })
}

async fn unsupported() -> (StatusCode, &'static str) {
    (StatusCode::NOT_IMPLEMENTED, "Unsupported method")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
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
    info!("shutdown requested, closing listener");
}
