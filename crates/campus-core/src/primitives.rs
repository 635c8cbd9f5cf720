//! # Innate Primitives
//!
//! Hardcoded runtime constants for the Campus CORE.
//!
//! These describe the fixed shape of the academic calendar and the hard
//! input limits. They are compiled into the binary and are immutable at
//! runtime; anything an operator may tune lives in the app's configuration.

/// Month (1-based) in which a new academic year begins.
///
/// Academic years run June through May.
pub const ACADEMIC_YEAR_START_MONTH: u32 = 6;

/// Lowest year-level a student can be in.
pub const MIN_YEAR_LEVEL: u8 = 1;

/// Highest year-level. Older admissions clamp here; there is no "graduated" level.
pub const MAX_YEAR_LEVEL: u8 = 4;

/// Semesters per year-level.
pub const SEMESTERS_PER_YEAR: u8 = 2;

/// First semester number.
pub const MIN_SEMESTER: u8 = 1;

/// Last semester number (`MAX_YEAR_LEVEL * SEMESTERS_PER_YEAR`).
pub const MAX_SEMESTER: u8 = MAX_YEAR_LEVEL * SEMESTERS_PER_YEAR;

/// Number of trailing characters of a student id that encode the roll number.
pub const ROLL_SUFFIX_DIGITS: usize = 2;

/// Latest academic year start accepted, so the label stays four digits.
pub const MAX_ACADEMIC_YEAR_START: i32 = 9998;

/// Default number of active mentors allowed per section and semester.
pub const DEFAULT_MAX_ACTIVE_MENTORS_PER_SECTION: usize = 2;

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum length for identifiers (user ids, record ids, mentor ids).
pub const MAX_ID_LENGTH: usize = 64;

/// Maximum length for free-text names and labels.
pub const MAX_NAME_LENGTH: usize = 128;

/// Minimum number of digits in a phone number.
pub const MIN_PHONE_DIGITS: usize = 10;

/// Maximum number of digits in a phone number (with country code).
pub const MAX_PHONE_DIGITS: usize = 15;

/// Maximum number of records (rules + assignments) accepted in one snapshot.
///
/// Bounds the cost of every resolver call and of the integrity audit,
/// which is quadratic within a scope.
pub const MAX_SNAPSHOT_RECORDS: usize = 100_000;
