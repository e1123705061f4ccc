// Venue Partners - Web Server
// REST API over the partners service with Axum

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{delete, get, put},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use venue_partners::config::SummaryConfig;
use venue_partners::{
    AppConfig, FinancialFacts, PartnerInput, PartnersError, PartnersService, Proposal, SqliteStore,
    WithdrawalDraft,
};

/// Shared application state
#[derive(Clone)]
struct AppState {
    service: Arc<Mutex<PartnersService<SqliteStore>>>,
    summary: Arc<SummaryConfig>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Response {
        (
            StatusCode::OK,
            Json(ApiResponse {
                success: true,
                data: Some(data),
                error: None,
            }),
        )
            .into_response()
    }

    fn fail(status: StatusCode, message: String, data: Option<T>) -> Response {
        (
            status,
            Json(ApiResponse {
                success: false,
                data,
                error: Some(message),
            }),
        )
            .into_response()
    }
}

fn error_response(err: PartnersError) -> Response {
    let status = match &err {
        PartnersError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        PartnersError::PartnerNotFound(_) | PartnersError::WithdrawalNotFound(_) => StatusCode::NOT_FOUND,
        PartnersError::PartnerHasWithdrawals { .. } => StatusCode::CONFLICT,
        PartnersError::SettingsMissing => StatusCode::PRECONDITION_FAILED,
        PartnersError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        PartnersError::Store(e) => {
            tracing::error!(error = %e, "store failure");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    ApiResponse::<()>::fail(status, err.to_string(), None)
}

fn respond<T: Serialize>(result: Result<T, PartnersError>) -> Response {
    match result {
        Ok(data) => ApiResponse::ok(data),
        Err(e) => error_response(e),
    }
}

/// Body of POST /api/partners/:id/withdrawals
#[derive(Deserialize)]
struct WithdrawalRequest {
    #[serde(flatten)]
    draft: WithdrawalDraft,
    /// Pre-confirm an over-share withdrawal
    #[serde(default)]
    confirm: bool,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> Response {
    ApiResponse::ok("OK")
}

/// GET /api/partners
async fn list_partners(State(state): State<AppState>) -> Response {
    let service = state.service.lock().await;
    ApiResponse::ok(service.partners())
}

/// POST /api/partners
async fn create_partner(State(state): State<AppState>, Json(input): Json<PartnerInput>) -> Response {
    let service = state.service.lock().await;
    respond(service.create_partner(input))
}

/// PUT /api/partners/:id
async fn update_partner(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<PartnerInput>,
) -> Response {
    let service = state.service.lock().await;
    respond(service.update_partner(&id, input))
}

/// DELETE /api/partners/:id
async fn delete_partner(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let service = state.service.lock().await;
    respond(service.delete_partner(&id))
}

/// GET /api/allocation
async fn get_allocation(State(state): State<AppState>) -> Response {
    let service = state.service.lock().await;
    ApiResponse::ok(service.allocation())
}

/// GET /api/share-check
async fn get_share_check(State(state): State<AppState>) -> Response {
    let service = state.service.lock().await;
    ApiResponse::ok(service.share_check())
}

/// GET /api/statements
async fn get_statements(State(state): State<AppState>) -> Response {
    let service = state.service.lock().await;
    ApiResponse::ok(service.statements())
}

/// GET /api/partners/:id/withdrawals
async fn list_withdrawals(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let service = state.service.lock().await;
    ApiResponse::ok(service.withdrawals_for(&id))
}

/// POST /api/partners/:id/withdrawals
///
/// Over share without `confirm: true` answers 409 with the overdraw details
/// and writes nothing.
async fn create_withdrawal(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<WithdrawalRequest>,
) -> Response {
    let service = state.service.lock().await;

    match service.propose_withdrawal(&id, request.draft) {
        Ok(Proposal::Admitted(withdrawal)) => ApiResponse::ok(withdrawal),
        Ok(Proposal::NeedsConfirmation { pending, details }) => {
            if request.confirm {
                respond(service.confirm_withdrawal(pending))
            } else {
                let message = details.message(&service.currency());
                service.cancel_withdrawal(pending);
                ApiResponse::fail(StatusCode::CONFLICT, message, Some(details))
            }
        }
        Err(e) => error_response(e),
    }
}

/// DELETE /api/withdrawals/:id
async fn delete_withdrawal(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let service = state.service.lock().await;
    respond(service.remove_withdrawal(&id))
}

/// GET /api/orphans
async fn get_orphans(State(state): State<AppState>) -> Response {
    let service = state.service.lock().await;
    ApiResponse::ok(service.orphan_groups())
}

#[derive(Serialize)]
struct SummaryResponse {
    facts: FinancialFacts,
    text: String,
}

/// GET /api/summary
async fn get_summary(State(state): State<AppState>) -> Response {
    let facts = {
        let service = state.service.lock().await;
        FinancialFacts::collect(
            &service.reservations(),
            &service.expenses(),
            &service.partners(),
            &service.currency(),
        )
    };

    let text = generate_summary(&state.summary, &facts).await;
    ApiResponse::ok(SummaryResponse { facts, text })
}

#[cfg(feature = "ai")]
async fn generate_summary(config: &SummaryConfig, facts: &FinancialFacts) -> String {
    venue_partners::summary::GeminiClient::new(config.api_key(), &config.model)
        .generate(facts)
        .await
}

#[cfg(not(feature = "ai"))]
async fn generate_summary(_config: &SummaryConfig, facts: &FinancialFacts) -> String {
    venue_partners::offline_summary(facts)
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("🌐 Venue Partners - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config_path = std::env::args().nth(1).map(std::path::PathBuf::from);
    let config = AppConfig::load_or_default(config_path.as_deref())?;

    let store = SqliteStore::open(&config.storage.database)?;
    println!("✓ Database opened: {}", config.storage.database.display());

    let service = PartnersService::new(store).with_orphan_policy(config.partners.orphan_policy);
    let state = AppState {
        service: Arc::new(Mutex::new(service)),
        summary: Arc::new(config.summary.clone()),
    };

    // Build API routes
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/partners", get(list_partners).post(create_partner))
        .route("/partners/:id", put(update_partner).delete(delete_partner))
        .route("/partners/:id/withdrawals", get(list_withdrawals).post(create_withdrawal))
        .route("/withdrawals/:id", delete(delete_withdrawal))
        .route("/allocation", get(get_allocation))
        .route("/share-check", get(get_share_check))
        .route("/statements", get(get_statements))
        .route("/orphans", get(get_orphans))
        .route("/summary", get(get_summary))
        .with_state(state);

    let app = Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;

    println!("\n🚀 Server running on http://{}", config.server.bind);
    println!("   API: http://{}/api/allocation", config.server.bind);
    println!("\n   Press Ctrl+C to stop\n");

    tracing::info!(bind = %config.server.bind, "server started");
    axum::serve(listener, app).await?;
    Ok(())
}
