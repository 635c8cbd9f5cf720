//! # API Endpoint Handlers
//!
//! Each handler takes the snapshot read lock for the duration of one
//! resolution. Only `PUT /snapshot` takes the write lock.

use super::{
    AppState,
    types::{
        AuditResponse, CheckAssignmentRequest, CheckAssignmentResponse, HealthResponse,
        ResetPlanRequest, ResetPlanResponse, ResolveMentorRequest, ResolveResponse,
        ResolveRollRequest, SnapshotResponse, TermRequest, TermResponse, ValidateUserParams,
        ValidateUserResponse,
    },
};
use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use campus_core::{
    AcademicTermResolver, CampusError, CommitGuard, CreateUserRequest, MentorAssignmentResolver,
    Snapshot, canonical_fingerprint, snapshot_checksum,
};
use chrono::{NaiveDate, Utc};

/// HTTP status for a core error.
///
/// Bad input is the caller's fault; ambiguity and conflicts are refusals the
/// backend must surface; encoding and I/O failures are ours.
pub fn status_for(err: &CampusError) -> StatusCode {
    match err {
        CampusError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        CampusError::AmbiguousRule { .. }
        | CampusError::AmbiguousAssignment { .. }
        | CampusError::Conflict(_) => StatusCode::CONFLICT,
        CampusError::SerializationError(_) | CampusError::IoError(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn log_integrity_fault(err: &CampusError) {
    if err.is_integrity_fault() {
        tracing::warn!(error = %err, kind = err.kind(), "snapshot integrity fault");
    }
}

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// TERM HANDLER
// =============================================================================

/// Resolve year-level and selectable semesters for an admission year.
pub async fn term_handler(Json(request): Json<TermRequest>) -> impl IntoResponse {
    let reference = request.date.unwrap_or_else(today);
    match request.resolve(reference) {
        Ok(window) => {
            let academic_year = AcademicTermResolver::academic_year_for(reference);
            (
                StatusCode::OK,
                Json(TermResponse::success(&window, academic_year)),
            )
        }
        Err(e) => (status_for(&e), Json(TermResponse::error(&e))),
    }
}

// =============================================================================
// RESOLVE HANDLERS
// =============================================================================

/// Resolve the batch a roll number belongs to.
pub async fn resolve_batch_handler(
    State(state): State<AppState>,
    Json(request): Json<ResolveRollRequest>,
) -> impl IntoResponse {
    let roll = match request.scope.validate().and_then(|()| request.roll.roll()) {
        Ok(roll) => roll,
        Err(e) => return (status_for(&e), Json(ResolveResponse::error(&e))),
    };

    let snapshot = state.snapshot.read().await;
    let resolver = MentorAssignmentResolver::with_policy(state.policy);
    match resolver.resolve_batch(&snapshot.rules, &request.scope, roll) {
        Ok(Some(rule)) => {
            let mut response = ResolveResponse::found();
            response.roll_number = Some(roll.value());
            response.batch_name = Some(rule.batch_name.as_str().to_string());
            response.rule_id = Some(rule.id.as_str().to_string());
            (StatusCode::OK, Json(response))
        }
        Ok(None) => (StatusCode::OK, Json(ResolveResponse::not_found())),
        Err(e) => {
            log_integrity_fault(&e);
            (status_for(&e), Json(ResolveResponse::error(&e)))
        }
    }
}

/// Resolve the mentor responsible for a batch.
pub async fn resolve_mentor_handler(
    State(state): State<AppState>,
    Json(request): Json<ResolveMentorRequest>,
) -> impl IntoResponse {
    if let Err(e) = request.scope.validate() {
        return (status_for(&e), Json(ResolveResponse::error(&e)));
    }

    let snapshot = state.snapshot.read().await;
    let resolver = MentorAssignmentResolver::with_policy(state.policy);
    match resolver.resolve_mentor(&snapshot.assignments, &request.scope, &request.batch_name) {
        Ok(Some(assignment)) => {
            let mut response = ResolveResponse::found().with_assignment(assignment);
            response.batch_name = Some(request.batch_name.as_str().to_string());
            (StatusCode::OK, Json(response))
        }
        Ok(None) => (StatusCode::OK, Json(ResolveResponse::not_found())),
        Err(e) => {
            log_integrity_fault(&e);
            (status_for(&e), Json(ResolveResponse::error(&e)))
        }
    }
}

/// Resolve a student's mentor from scope and roll number.
pub async fn resolve_student_handler(
    State(state): State<AppState>,
    Json(request): Json<ResolveRollRequest>,
) -> impl IntoResponse {
    let roll = match request.scope.validate().and_then(|()| request.roll.roll()) {
        Ok(roll) => roll,
        Err(e) => return (status_for(&e), Json(ResolveResponse::error(&e))),
    };

    let snapshot = state.snapshot.read().await;
    let resolver = MentorAssignmentResolver::with_policy(state.policy);
    match resolver.resolve_student_mentor(
        &snapshot.rules,
        &snapshot.assignments,
        &request.scope,
        roll,
    ) {
        Ok(Some(found)) => {
            let mut response = ResolveResponse::found().with_assignment(found.assignment);
            response.roll_number = Some(roll.value());
            response.batch_name = Some(found.batch_name().as_str().to_string());
            response.rule_id = Some(found.rule.id.as_str().to_string());
            (StatusCode::OK, Json(response))
        }
        Ok(None) => (StatusCode::OK, Json(ResolveResponse::not_found())),
        Err(e) => {
            log_integrity_fault(&e);
            (status_for(&e), Json(ResolveResponse::error(&e)))
        }
    }
}

// =============================================================================
// ASSIGNMENT HANDLERS
// =============================================================================

/// Check whether a new assignment may be persisted.
///
/// With `expected_checksum`, runs the full commit guard against the current
/// snapshot; without it, only the creation checks.
pub async fn check_assignment_handler(
    State(state): State<AppState>,
    Json(request): Json<CheckAssignmentRequest>,
) -> impl IntoResponse {
    let snapshot = state.snapshot.read().await;
    let checksum = match snapshot_checksum(&snapshot) {
        Ok(c) => c,
        Err(e) => {
            return (
                status_for(&e),
                Json(CheckAssignmentResponse::rejected(&e, false, 0)),
            );
        }
    };

    let resolver = MentorAssignmentResolver::with_policy(state.policy);
    let can_create = resolver.can_create_assignment(&snapshot.assignments, &request.candidate);
    let outcome = match request.expected_checksum {
        Some(planned) => CommitGuard::new(state.policy).check(planned, &snapshot, &request.candidate),
        None => resolver.validate_new_assignment(&snapshot.assignments, &request.candidate),
    };

    match outcome {
        Ok(()) => (
            StatusCode::OK,
            Json(CheckAssignmentResponse::allowed(can_create, checksum)),
        ),
        Err(e) => {
            tracing::info!(
                assignment_id = request.candidate.id.as_str(),
                error = %e,
                "assignment rejected"
            );
            (
                status_for(&e),
                Json(CheckAssignmentResponse::rejected(&e, can_create, checksum)),
            )
        }
    }
}

/// Preview which assignments a semester reset would remove.
pub async fn reset_plan_handler(
    State(state): State<AppState>,
    Json(request): Json<ResetPlanRequest>,
) -> impl IntoResponse {
    if request.college.trim().is_empty() {
        let e = CampusError::InvalidInput("college is required".to_string());
        return (status_for(&e), Json(ResetPlanResponse::error(&e)));
    }

    let snapshot = state.snapshot.read().await;
    let resolver = MentorAssignmentResolver::with_policy(state.policy);
    let plan = resolver.plan_semester_reset(
        &snapshot.assignments,
        &request.college,
        request.academic_year,
        request.semester,
    );
    (StatusCode::OK, Json(ResetPlanResponse::success(plan)))
}

// =============================================================================
// USER VALIDATION HANDLER
// =============================================================================

/// Validate a user-creation request body.
///
/// The body is taken raw so malformed JSON is reported in the same shape as
/// any other validation failure.
pub async fn validate_user_handler(
    Query(params): Query<ValidateUserParams>,
    body: Bytes,
) -> impl IntoResponse {
    let reference = params.date.unwrap_or_else(today);
    match CreateUserRequest::from_json(&body, reference) {
        Ok(request) => (
            StatusCode::OK,
            Json(ValidateUserResponse::valid(request.role(), request.user_id())),
        ),
        Err(e) => (status_for(&e), Json(ValidateUserResponse::error(&e))),
    }
}

// =============================================================================
// SNAPSHOT HANDLERS
// =============================================================================

/// Audit the loaded snapshot for integrity faults.
pub async fn audit_handler(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.snapshot.read().await;
    let report = snapshot.audit(&state.policy);
    if !report.is_clean() {
        tracing::warn!(faults = report.fault_count(), "snapshot audit found faults");
    }
    (StatusCode::OK, Json(AuditResponse::new(report)))
}

fn describe(snapshot: &Snapshot) -> Result<SnapshotResponse, CampusError> {
    let checksum = snapshot_checksum(snapshot)?;
    let blake3 = canonical_fingerprint(snapshot)?;
    Ok(SnapshotResponse::success(
        snapshot.rules.len(),
        snapshot.assignments.len(),
        checksum,
        blake3,
    ))
}

/// Version token and fingerprint of the loaded snapshot.
pub async fn fingerprint_handler(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.snapshot.read().await;
    match describe(&snapshot) {
        Ok(response) => (StatusCode::OK, Json(response)),
        Err(e) => (status_for(&e), Json(SnapshotResponse::error(&e))),
    }
}

/// Replace the loaded snapshot. The new one is validated before the swap.
pub async fn replace_snapshot_handler(
    State(state): State<AppState>,
    Json(snapshot): Json<Snapshot>,
) -> impl IntoResponse {
    let response = match snapshot.validate().and_then(|()| describe(&snapshot)) {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(error = %e, "rejected snapshot replacement");
            return (status_for(&e), Json(SnapshotResponse::error(&e)));
        }
    };

    let mut current = state.snapshot.write().await;
    *current = snapshot;
    tracing::info!(
        rules = response.rules,
        assignments = response.assignments,
        checksum = ?response.checksum,
        "snapshot replaced"
    );
    (StatusCode::OK, Json(response))
}
