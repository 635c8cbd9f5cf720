//! # Academic Term Resolution
//!
//! Derives a student's year-level and selectable semesters from an admission
//! year and a reference date.
//!
//! - Academic years run June through May
//! - Year-levels clamp into `1..=4`; there is no "graduated" level
//! - Missing or malformed admission years are reported, never defaulted

use crate::primitives::ACADEMIC_YEAR_START_MONTH;
use crate::{AcademicYear, CampusError, Semester, YearLevel};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// The year-level of a student and the two semesters valid for it.
///
/// Invariant: `valid_semesters == [2 * year_level - 1, 2 * year_level]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcademicYearWindow {
    pub year_level: YearLevel,
    pub valid_semesters: [Semester; 2],
}

impl AcademicYearWindow {
    /// Build the window for a year-level.
    #[must_use]
    pub const fn for_level(year_level: YearLevel) -> Self {
        Self {
            year_level,
            valid_semesters: year_level.semesters(),
        }
    }

    /// Whether `semester` is selectable in this window.
    #[must_use]
    pub fn contains(&self, semester: Semester) -> bool {
        self.valid_semesters.contains(&semester)
    }
}

/// Stateless resolver for academic terms.
pub struct AcademicTermResolver;

impl AcademicTermResolver {
    /// Resolve the year-level of a student admitted in `admission_year`,
    /// as of `reference`.
    ///
    /// `elapsed = ref_year - admission_year`, reduced by one before June,
    /// then `clamp(elapsed + 1, 1, 4)`.
    ///
    /// Returns `CampusError::InvalidInput` when the admission year is not
    /// positive or lies after the reference year.
    pub fn resolve_year_level(
        admission_year: i32,
        reference: NaiveDate,
    ) -> Result<YearLevel, CampusError> {
        if admission_year <= 0 {
            return Err(CampusError::InvalidInput(format!(
                "admission year {} is not a positive year",
                admission_year
            )));
        }
        if admission_year > reference.year() {
            return Err(CampusError::InvalidInput(format!(
                "admission year {} is after reference year {}",
                admission_year,
                reference.year()
            )));
        }

        let mut elapsed = i64::from(reference.year()) - i64::from(admission_year);
        if reference.month() < ACADEMIC_YEAR_START_MONTH {
            elapsed -= 1;
        }
        Ok(YearLevel::clamped(elapsed + 1))
    }

    /// The fixed semester pair for a year-level: `{1:[1,2], 2:[3,4], 3:[5,6], 4:[7,8]}`.
    #[must_use]
    pub const fn valid_semesters(year_level: YearLevel) -> [Semester; 2] {
        year_level.semesters()
    }

    /// Resolve the full window (year-level plus semesters) in one call.
    pub fn resolve_window(
        admission_year: i32,
        reference: NaiveDate,
    ) -> Result<AcademicYearWindow, CampusError> {
        let level = Self::resolve_year_level(admission_year, reference)?;
        Ok(AcademicYearWindow::for_level(level))
    }

    /// Parse an admission year as typed into a form.
    ///
    /// Blank input is reported as missing; anything that is not a plain
    /// positive integer is rejected rather than coerced.
    pub fn parse_admission_year(raw: &str) -> Result<i32, CampusError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CampusError::InvalidInput(
                "admission year is missing".to_string(),
            ));
        }
        if !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CampusError::InvalidInput(format!(
                "admission year '{}' is not numeric",
                trimmed
            )));
        }
        let year: i32 = trimmed.parse().map_err(|_| {
            CampusError::InvalidInput(format!("admission year '{}' is out of range", trimmed))
        })?;
        if year <= 0 {
            return Err(CampusError::InvalidInput(format!(
                "admission year {} is not a positive year",
                year
            )));
        }
        Ok(year)
    }

    /// Resolve a window straight from raw form input.
    pub fn resolve_window_raw(
        raw_admission_year: &str,
        reference: NaiveDate,
    ) -> Result<AcademicYearWindow, CampusError> {
        let year = Self::parse_admission_year(raw_admission_year)?;
        Self::resolve_window(year, reference)
    }

    /// The academic year label in force on `date`.
    #[must_use]
    pub fn academic_year_for(date: NaiveDate) -> AcademicYear {
        AcademicYear::containing(date)
    }

    /// The year-level a semester belongs to.
    pub fn year_level_for_semester(semester: u8) -> Result<YearLevel, CampusError> {
        Ok(Semester::new(semester)?.year_level())
    }
}

// =============================================================================
// TESTS
// =============================================================================
