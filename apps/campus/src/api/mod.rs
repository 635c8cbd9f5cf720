//! # Campus HTTP Sidecar
//!
//! Resolution endpoints called by the backend, served with axum over a
//! snapshot held in memory.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `POST /term` - Year-level and semester window for an admission year
//! - `POST /resolve/batch` - Batch for a roll number
//! - `POST /resolve/mentor` - Mentor for a batch
//! - `POST /resolve/student` - Mentor for a student
//! - `POST /assignments/check` - Pre-persistence check for a new assignment
//! - `POST /assignments/reset-plan` - Semester reset preview
//! - `POST /users/validate` - User-creation request validation
//! - `GET /snapshot/audit` - Integrity report
//! - `GET /snapshot/fingerprint` - Checksum and BLAKE3 fingerprint
//! - `PUT /snapshot` - Replace the loaded snapshot
//!
//! ## Security Configuration (Environment Variables)
//!
//! - `CAMPUS_CORS_ORIGINS`: Comma-separated list of allowed origins, or "*" for all (default: localhost only)
//! - `CAMPUS_RATE_LIMIT`: Requests per second (default: 100, 0 to disable)
//! - `CAMPUS_API_KEY`: If set, requires Bearer token authentication

mod auth;
mod handlers;
mod middleware;
mod types;

pub use auth::get_api_key_from_env;
pub use handlers::status_for;
pub use middleware::create_rate_limiter;
pub use types::{
    AuditResponse, CheckAssignmentRequest, CheckAssignmentResponse, HealthResponse,
    RawAdmissionYear, ResetPlanRequest, ResetPlanResponse, ResolveMentorRequest,
    ResolveResponse, ResolveRollRequest, RollInput, SnapshotResponse, TermRequest, TermResponse,
    ValidateUserParams, ValidateUserResponse,
};

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post},
};
use campus_core::{CampusError, ResolutionPolicy, Snapshot};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Default request rate when none is configured.
const DEFAULT_RATE_LIMIT: u32 = 100;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state.
#[derive(Clone)]
pub struct AppState {
    /// The snapshot every resolution reads from.
    pub snapshot: Arc<RwLock<Snapshot>>,
    pub policy: ResolutionPolicy,
    /// Requests per second; 0 disables limiting.
    pub rate_limit: u32,
}

impl AppState {
    /// Create state over a snapshot with the default rate limit.
    #[must_use]
    pub fn new(snapshot: Snapshot, policy: ResolutionPolicy) -> Self {
        Self {
            snapshot: Arc::new(RwLock::new(snapshot)),
            policy,
            rate_limit: DEFAULT_RATE_LIMIT,
        }
    }

    /// Builder: set the request rate limit.
    #[must_use]
    pub fn with_rate_limit(mut self, requests_per_second: u32) -> Self {
        self.rate_limit = requests_per_second;
        self
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

const ALLOWED_METHODS: [Method; 4] = [Method::GET, Method::POST, Method::PUT, Method::OPTIONS];

/// Build the CORS layer from `CAMPUS_CORS_ORIGINS`.
///
/// - `*`: all origins
/// - unset or no valid entries: localhost only
/// - otherwise: the comma-separated origins
fn build_cors_layer() -> CorsLayer {
    match std::env::var("CAMPUS_CORS_ORIGINS").ok().as_deref() {
        Some("*") => {
            tracing::warn!(
                "CORS: Allowing ALL origins (CAMPUS_CORS_ORIGINS=*). This is insecure for production!"
            );
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => {
                            tracing::info!("CORS: Allowing origin: {}", trimmed);
                            Some(hv)
                        }
                        Err(e) => {
                            tracing::warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!(
                    "CORS: No valid origins in CAMPUS_CORS_ORIGINS, defaulting to localhost only"
                );
                build_localhost_cors()
            } else {
                CorsLayer::new()
                    .allow_origin(allowed_origins)
                    .allow_methods(ALLOWED_METHODS)
                    .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            }
        }
        None => {
            tracing::info!("CORS: No CAMPUS_CORS_ORIGINS set, defaulting to localhost only");
            build_localhost_cors()
        }
    }
}

fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:5173",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:5173",
    ]
    .into_iter()
    .filter_map(|o| o.parse::<HeaderValue>().ok())
    .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(ALLOWED_METHODS)
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing
/// 2. CORS
/// 3. Body limit (2 MiB)
/// 4. Rate limiting (if enabled)
/// 5. Authentication (if `CAMPUS_API_KEY` is set)
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer();

    let rate_limiter = create_rate_limiter(state.rate_limit);
    match rate_limiter {
        Some(_) => tracing::info!("Rate limiting enabled: {} requests/second", state.rate_limit),
        None => tracing::info!("Rate limiting disabled"),
    }

    let has_auth = get_api_key_from_env().is_some();
    if has_auth {
        tracing::info!("API key authentication enabled");
    } else {
        tracing::warn!(
            "API key authentication DISABLED - all endpoints are publicly accessible! \
             Set CAMPUS_API_KEY to enable authentication."
        );
    }

    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/term", post(handlers::term_handler))
        .route("/resolve/batch", post(handlers::resolve_batch_handler))
        .route("/resolve/mentor", post(handlers::resolve_mentor_handler))
        .route("/resolve/student", post(handlers::resolve_student_handler))
        .route("/assignments/check", post(handlers::check_assignment_handler))
        .route("/assignments/reset-plan", post(handlers::reset_plan_handler))
        .route("/users/validate", post(handlers::validate_user_handler))
        .route("/snapshot/audit", get(handlers::audit_handler))
        .route("/snapshot/fingerprint", get(handlers::fingerprint_handler))
        .route("/snapshot", axum::routing::put(handlers::replace_snapshot_handler));

    if has_auth {
        router = router.layer(axum_middleware::from_fn(auth::api_key_auth_middleware));
    }

    if let Some(limiter) = rate_limiter {
        router = router.layer(axum_middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    }

    router
        .layer(axum::extract::DefaultBodyLimit::max(2 * 1024 * 1024))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Bind `addr` and serve until the process is stopped.
pub async fn run_server(addr: &str, state: AppState) -> Result<(), CampusError> {
    {
        let snapshot = state.snapshot.read().await;
        let report = snapshot.audit(&state.policy);
        if report.is_clean() {
            tracing::info!(
                rules = snapshot.rules.len(),
                assignments = snapshot.assignments.len(),
                "snapshot loaded"
            );
        } else {
            tracing::warn!(
                rules = snapshot.rules.len(),
                assignments = snapshot.assignments.len(),
                faults = report.fault_count(),
                "snapshot loaded with integrity faults; affected lookups will be refused"
            );
        }
    }

    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| CampusError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("Campus sidecar listening on {}", addr);

    axum::serve(listener, router)
        .await
        .map_err(|e| CampusError::IoError(format!("Server error: {}", e)))
}
