//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API.
//!
//! Every response carries `success` plus, on failure, `error` (the message)
//! and `error_kind` (the stable machine-readable kind).

use campus_core::{
    AcademicTermResolver, AcademicYear, AcademicYearWindow, BatchName, CampusError,
    ConflictReason, IntegrityReport, MentorAssignment, ResetPlan, RollNumber, Scope, Semester,
    roll_from_student_id,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// TERM REQUEST/RESPONSE
// =============================================================================

/// An admission year as a form sends it: a number or a string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAdmissionYear {
    Number(i64),
    Text(String),
}

impl RawAdmissionYear {
    fn as_text(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.clone(),
        }
    }
}

/// Term resolution request. `date` defaults to today.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TermRequest {
    pub admission_year: Option<RawAdmissionYear>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

impl TermRequest {
    /// Resolve the window. A missing admission year is reported, not defaulted.
    pub fn resolve(&self, today: NaiveDate) -> Result<AcademicYearWindow, CampusError> {
        let raw = self
            .admission_year
            .as_ref()
            .map(RawAdmissionYear::as_text)
            .unwrap_or_default();
        AcademicTermResolver::resolve_window_raw(&raw, self.date.unwrap_or(today))
    }
}

/// Term resolution response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TermResponse {
    pub success: bool,
    pub year_level: Option<u8>,
    pub valid_semesters: Vec<u8>,
    pub academic_year: Option<String>,
    pub error: Option<String>,
    pub error_kind: Option<String>,
}

impl TermResponse {
    pub fn success(window: &AcademicYearWindow, academic_year: AcademicYear) -> Self {
        Self {
            success: true,
            year_level: Some(window.year_level.value()),
            valid_semesters: window.valid_semesters.iter().map(|s| s.value()).collect(),
            academic_year: Some(academic_year.to_string()),
            error: None,
            error_kind: None,
        }
    }

    pub fn error(err: &CampusError) -> Self {
        Self {
            success: false,
            year_level: None,
            valid_semesters: vec![],
            academic_year: None,
            error: Some(err.to_string()),
            error_kind: Some(err.kind().to_string()),
        }
    }
}

// =============================================================================
// RESOLVE REQUESTS
// =============================================================================

/// Roll number given directly or through the student id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RollInput {
    #[serde(default)]
    pub roll_number: Option<u32>,
    #[serde(default)]
    pub student_id: Option<String>,
}

impl RollInput {
    /// The roll number to resolve. Both forms must agree when both are given.
    pub fn roll(&self) -> Result<RollNumber, CampusError> {
        let from_id = self
            .student_id
            .as_deref()
            .map(roll_from_student_id)
            .transpose()?;
        match (self.roll_number.map(RollNumber), from_id) {
            (Some(direct), Some(derived)) if direct != derived => {
                Err(CampusError::InvalidInput(format!(
                    "roll_number {} does not match student id (roll {})",
                    direct, derived
                )))
            }
            (Some(roll), _) | (None, Some(roll)) => Ok(roll),
            (None, None) => Err(CampusError::InvalidInput(
                "roll_number or student_id is required".to_string(),
            )),
        }
    }
}

/// Batch (and student) resolution request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveRollRequest {
    #[serde(flatten)]
    pub scope: Scope,
    #[serde(flatten)]
    pub roll: RollInput,
}

/// Mentor resolution request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveMentorRequest {
    #[serde(flatten)]
    pub scope: Scope,
    pub batch_name: BatchName,
}

/// Resolution response shared by batch, mentor and student lookups.
///
/// `found: false` with `success: true` means no mapping exists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolveResponse {
    pub success: bool,
    pub found: bool,
    pub roll_number: Option<u32>,
    pub batch_name: Option<String>,
    pub rule_id: Option<String>,
    pub mentor_id: Option<String>,
    pub assignment_id: Option<String>,
    pub locked: Option<bool>,
    pub error: Option<String>,
    pub error_kind: Option<String>,
}

impl ResolveResponse {
    pub fn not_found() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    pub fn found() -> Self {
        Self {
            success: true,
            found: true,
            ..Self::default()
        }
    }

    /// Fill in the assignment fields.
    #[must_use]
    pub fn with_assignment(mut self, assignment: &MentorAssignment) -> Self {
        self.mentor_id = Some(assignment.mentor_id.as_str().to_string());
        self.assignment_id = Some(assignment.id.as_str().to_string());
        self.locked = Some(assignment.is_locked());
        self
    }

    pub fn error(err: &CampusError) -> Self {
        Self {
            error: Some(err.to_string()),
            error_kind: Some(err.kind().to_string()),
            ..Self::default()
        }
    }
}

// =============================================================================
// ASSIGNMENT CHECK
// =============================================================================

/// Pre-persistence check for a new assignment.
///
/// With `expected_checksum` set, the check also fails if the sidecar's
/// snapshot no longer matches the one the caller planned against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckAssignmentRequest {
    pub candidate: MentorAssignment,
    #[serde(default)]
    pub expected_checksum: Option<u64>,
}

/// Assignment check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckAssignmentResponse {
    pub success: bool,
    pub allowed: bool,
    /// The locking guard alone, without capacity or staleness.
    pub can_create: bool,
    pub conflict: Option<ConflictReason>,
    pub checksum: u64,
    pub error: Option<String>,
    pub error_kind: Option<String>,
}

impl CheckAssignmentResponse {
    pub fn allowed(can_create: bool, checksum: u64) -> Self {
        Self {
            success: true,
            allowed: true,
            can_create,
            conflict: None,
            checksum,
            error: None,
            error_kind: None,
        }
    }

    pub fn rejected(err: &CampusError, can_create: bool, checksum: u64) -> Self {
        let conflict = match err {
            CampusError::Conflict(reason) => Some(reason.clone()),
            _ => None,
        };
        Self {
            success: false,
            allowed: false,
            can_create,
            conflict,
            checksum,
            error: Some(err.to_string()),
            error_kind: Some(err.kind().to_string()),
        }
    }
}

// =============================================================================
// RESET PLAN
// =============================================================================

/// Semester reset preview request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetPlanRequest {
    pub college: String,
    pub academic_year: AcademicYear,
    pub semester: Semester,
}

/// Semester reset preview response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetPlanResponse {
    pub success: bool,
    pub plan: Option<ResetPlan>,
    pub error: Option<String>,
    pub error_kind: Option<String>,
}

impl ResetPlanResponse {
    pub fn success(plan: ResetPlan) -> Self {
        Self {
            success: true,
            plan: Some(plan),
            error: None,
            error_kind: None,
        }
    }

    pub fn error(err: &CampusError) -> Self {
        Self {
            success: false,
            plan: None,
            error: Some(err.to_string()),
            error_kind: Some(err.kind().to_string()),
        }
    }
}

// =============================================================================
// USER VALIDATION
// =============================================================================

/// Query parameters for `POST /users/validate`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidateUserParams {
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

/// User creation request validation response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateUserResponse {
    pub success: bool,
    pub valid: bool,
    pub role: Option<String>,
    pub user_id: Option<String>,
    pub error: Option<String>,
    pub error_kind: Option<String>,
}

impl ValidateUserResponse {
    pub fn valid(role: &str, user_id: &str) -> Self {
        Self {
            success: true,
            valid: true,
            role: Some(role.to_string()),
            user_id: Some(user_id.to_string()),
            error: None,
            error_kind: None,
        }
    }

    pub fn error(err: &CampusError) -> Self {
        Self {
            success: false,
            valid: false,
            role: None,
            user_id: None,
            error: Some(err.to_string()),
            error_kind: Some(err.kind().to_string()),
        }
    }
}

// =============================================================================
// SNAPSHOT RESPONSES
// =============================================================================

/// Integrity audit response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditResponse {
    pub success: bool,
    pub clean: bool,
    pub fault_count: usize,
    pub report: IntegrityReport,
}

impl AuditResponse {
    pub fn new(report: IntegrityReport) -> Self {
        Self {
            success: true,
            clean: report.is_clean(),
            fault_count: report.fault_count(),
            report,
        }
    }
}

/// Snapshot version response, returned by fingerprint and replacement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotResponse {
    pub success: bool,
    pub rules: usize,
    pub assignments: usize,
    pub checksum: Option<u64>,
    pub blake3: Option<String>,
    pub error: Option<String>,
    pub error_kind: Option<String>,
}

impl SnapshotResponse {
    pub fn success(rules: usize, assignments: usize, checksum: u64, blake3: String) -> Self {
        Self {
            success: true,
            rules,
            assignments,
            checksum: Some(checksum),
            blake3: Some(blake3),
            error: None,
            error_kind: None,
        }
    }

    pub fn error(err: &CampusError) -> Self {
        Self {
            success: false,
            rules: 0,
            assignments: 0,
            checksum: None,
            blake3: None,
            error: Some(err.to_string()),
            error_kind: Some(err.kind().to_string()),
        }
    }
}
