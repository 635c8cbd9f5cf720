//! # campus-core
//!
//! The deterministic resolution engine for Campus - THE LOGIC.
//!
//! This crate answers two questions for a role-based academic
//! administration system:
//!
//! - Which year-level is a student in, and which semesters may they select?
//! - Which mentor is responsible for a student in a given section and batch?
//!
//! ## Architectural Constraints
//!
//! - Pure and synchronous: NO async, NO network, NO logging
//! - Read-only: every operation takes a snapshot per call and keeps nothing
//! - Never guesses: each lookup returns a match, `Ok(None)`, or an explicit
//!   integrity error
//! - Deterministic: `BTreeMap` ordering, sorted reports, no floats

// =============================================================================
// MODULES
// =============================================================================

pub mod assignment;
pub mod batch;
pub mod canonical;
pub mod primitives;
pub mod request;
pub mod roll;
pub mod snapshot;
pub mod term;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    AcademicYear, AssignmentId, BatchName, BatchRule, CampusError, ConflictReason,
    MentorAssignment, MentorId, RollNumber, RollRange, RuleId, Scope, Scoped, Semester, YearLevel,
};

// =============================================================================
// RE-EXPORTS: Resolution
// =============================================================================

pub use assignment::{
    CommitGuard, LockedPrecedence, MentorAssignmentResolver, ResetPlan, ResolutionPolicy,
    StudentMentor,
};
pub use batch::{RuleOverlap, overlapping_rules, resolve_batch};
pub use roll::roll_from_student_id;
pub use term::{AcademicTermResolver, AcademicYearWindow};

// =============================================================================
// RE-EXPORTS: Snapshots and Requests
// =============================================================================

#[cfg(feature = "crypto-hash")]
pub use canonical::canonical_fingerprint;
pub use canonical::{
    CanonicalHeader, CanonicalSnapshot, checksum, export_canonical, import_canonical,
    snapshot_checksum,
};
pub use request::{CreateUserRequest, Password};
pub use snapshot::{CapacityBreach, IntegrityReport, MalformedRecord, SlotFault, Snapshot};
