//! # User Creation Requests
//!
//! Role-tagged creation payloads. Each role carries exactly the fields it
//! needs, and a request is validated before anyone persists it.
//!
//! ```json
//! { "role": "student", "id": "245522733096", "admission_year": 2024, "current_semester": 3, ... }
//! ```

use crate::primitives::{MAX_ID_LENGTH, MAX_NAME_LENGTH, MAX_PHONE_DIGITS, MIN_PHONE_DIGITS};
use crate::roll::roll_from_student_id;
use crate::term::AcademicTermResolver;
use crate::{CampusError, Semester, YearLevel};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A password as received. Never serialized, never printed.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Password(String);

impl Password {
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

/// A request to create a user, tagged by role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum CreateUserRequest {
    Student {
        id: String,
        name: String,
        phone: String,
        admission_year: i32,
        current_semester: u8,
        course: String,
        section: String,
        college: String,
        #[serde(skip_serializing)]
        password: Password,
        created_by: String,
    },
    Hod {
        id: String,
        name: String,
        phone: String,
        years: Vec<u8>,
        college: String,
        course: String,
        #[serde(skip_serializing)]
        password: Password,
    },
    Mentor {
        id: String,
        name: String,
        phone: String,
        department: String,
        #[serde(skip_serializing)]
        password: Password,
    },
    Guard {
        id: String,
        name: String,
        phone: String,
        college: String,
        #[serde(skip_serializing)]
        password: Password,
    },
    Admin {
        id: String,
        name: String,
        phone: String,
        college: String,
        #[serde(skip_serializing)]
        password: Password,
    },
}

impl CreateUserRequest {
    /// Parse and validate a JSON request in one step.
    ///
    /// Unknown roles and missing fields are `InvalidInput`, like any other
    /// validation failure.
    pub fn from_json(bytes: &[u8], reference: NaiveDate) -> Result<Self, CampusError> {
        let request: Self = serde_json::from_slice(bytes)
            .map_err(|e| CampusError::InvalidInput(format!("malformed request: {}", e)))?;
        request.validate(reference)?;
        Ok(request)
    }

    /// The role tag as it appears on the wire.
    #[must_use]
    pub fn role(&self) -> &'static str {
        match self {
            Self::Student { .. } => "student",
            Self::Hod { .. } => "hod",
            Self::Mentor { .. } => "mentor",
            Self::Guard { .. } => "guard",
            Self::Admin { .. } => "admin",
        }
    }

    #[must_use]
    pub fn user_id(&self) -> &str {
        match self {
            Self::Student { id, .. }
            | Self::Hod { id, .. }
            | Self::Mentor { id, .. }
            | Self::Guard { id, .. }
            | Self::Admin { id, .. } => id,
        }
    }

    /// Validate every field for the request's role.
    ///
    /// `reference` is the date a student's semester is checked against.
    pub fn validate(&self, reference: NaiveDate) -> Result<(), CampusError> {
        match self {
            Self::Student {
                id,
                name,
                phone,
                admission_year,
                current_semester,
                course,
                section,
                college,
                password,
                created_by,
            } => {
                check_common(id, name, phone, password)?;
                check_text("course", course)?;
                check_text("section", section)?;
                check_text("college", college)?;
                check_id("created_by", created_by)?;
                roll_from_student_id(id)?;

                let semester = Semester::new(*current_semester)?;
                let window = AcademicTermResolver::resolve_window(*admission_year, reference)?;
                if !window.contains(semester) {
                    return Err(CampusError::InvalidInput(format!(
                        "semester {} is not valid for year {} (expected {} or {})",
                        semester,
                        window.year_level,
                        window.valid_semesters[0],
                        window.valid_semesters[1]
                    )));
                }
                Ok(())
            }
            Self::Hod {
                id,
                name,
                phone,
                years,
                college,
                course,
                password,
            } => {
                check_common(id, name, phone, password)?;
                check_text("college", college)?;
                check_text("course", course)?;
                if years.is_empty() {
                    return Err(CampusError::InvalidInput(
                        "an HOD must manage at least one year".to_string(),
                    ));
                }
                let mut seen = BTreeSet::new();
                for year in years {
                    YearLevel::new(*year)?;
                    if !seen.insert(*year) {
                        return Err(CampusError::InvalidInput(format!(
                            "year {} listed twice",
                            year
                        )));
                    }
                }
                Ok(())
            }
            Self::Mentor {
                id,
                name,
                phone,
                department,
                password,
            } => {
                check_common(id, name, phone, password)?;
                check_text("department", department)
            }
            Self::Guard {
                id,
                name,
                phone,
                college,
                password,
            }
            | Self::Admin {
                id,
                name,
                phone,
                college,
                password,
            } => {
                check_common(id, name, phone, password)?;
                check_text("college", college)
            }
        }
    }
}

// =============================================================================
// FIELD CHECKS
// =============================================================================

fn check_common(id: &str, name: &str, phone: &str, password: &Password) -> Result<(), CampusError> {
    check_id("id", id)?;
    check_text("name", name)?;
    check_phone(phone)?;
    if password.is_blank() {
        return Err(CampusError::InvalidInput("password is required".to_string()));
    }
    Ok(())
}

fn check_id(field: &str, value: &str) -> Result<(), CampusError> {
    if value.is_empty() || value.len() > MAX_ID_LENGTH {
        return Err(CampusError::InvalidInput(format!(
            "{} must be 1..={} characters",
            field, MAX_ID_LENGTH
        )));
    }
    if value.chars().any(char::is_whitespace) {
        return Err(CampusError::InvalidInput(format!(
            "{} must not contain whitespace",
            field
        )));
    }
    Ok(())
}

fn check_text(field: &str, value: &str) -> Result<(), CampusError> {
    if value.trim().is_empty() {
        return Err(CampusError::InvalidInput(format!("{} is required", field)));
    }
    if value.chars().count() > MAX_NAME_LENGTH {
        return Err(CampusError::InvalidInput(format!(
            "{} exceeds {} characters",
            field, MAX_NAME_LENGTH
        )));
    }
    Ok(())
}

/// Digits with an optional leading `+`.
fn check_phone(phone: &str) -> Result<(), CampusError> {
    let digits = phone.strip_prefix('+').unwrap_or(phone);
    let valid = digits.bytes().all(|b| b.is_ascii_digit())
        && (MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits.len());
    if valid {
        Ok(())
    } else {
        Err(CampusError::InvalidInput(format!(
            "phone must be {}..={} digits",
            MIN_PHONE_DIGITS, MAX_PHONE_DIGITS
        )))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, 1).unwrap()
    }

    fn student(semester: u8) -> serde_json::Value {
        json!({
            "role": "student",
            "id": "245522733096",
            "name": "Asha",
            "phone": "9876543210",
            "admission_year": 2024,
            "current_semester": semester,
            "course": "CSE",
            "section": "A",
            "college": "KMIT",
            "password": "s3cret",
            "created_by": "ADMIN01"
        })
    }

    fn parse(value: &serde_json::Value) -> Result<CreateUserRequest, CampusError> {
        CreateUserRequest::from_json(value.to_string().as_bytes(), today())
    }

    #[test]
    fn student_in_window_is_accepted() {
        let request = parse(&student(3)).unwrap();
        assert_eq!(request.role(), "student");
        assert_eq!(request.user_id(), "245522733096");
    }

    #[test]
    fn student_outside_window_is_rejected() {
        let err = parse(&student(5)).unwrap_err();
        assert!(matches!(err, CampusError::InvalidInput(_)));
    }

    #[test]
    fn student_id_must_carry_a_roll() {
        let mut value = student(3);
        value["id"] = json!("24552273309X");
        assert!(parse(&value).is_err());
    }

    #[test]
    fn hod_years_are_checked() {
        let hod = |years: serde_json::Value| {
            json!({
                "role": "hod",
                "id": "HOD01",
                "name": "Dr. Rao",
                "phone": "+919876543210",
                "years": years,
                "college": "KMIT",
                "course": "CSE",
                "password": "pw"
            })
        };
        assert!(parse(&hod(json!([1, 2]))).is_ok());
        assert!(parse(&hod(json!([]))).is_err());
        assert!(parse(&hod(json!([5]))).is_err());
        assert!(parse(&hod(json!([2, 2]))).is_err());
    }

    #[test]
    fn unknown_role_and_missing_fields_are_invalid_input() {
        let unknown = json!({ "role": "janitor", "id": "J1" });
        assert!(matches!(parse(&unknown), Err(CampusError::InvalidInput(_))));

        let missing = json!({ "role": "mentor", "id": "EMP01", "name": "R" });
        assert!(matches!(parse(&missing), Err(CampusError::InvalidInput(_))));
    }

    #[test]
    fn phone_and_password_rules() {
        let mentor = |phone: &str, password: &str| {
            json!({
                "role": "mentor",
                "id": "EMP01",
                "name": "Ravi",
                "phone": phone,
                "department": "CSE",
                "password": password
            })
        };
        assert!(parse(&mentor("9876543210", "pw")).is_ok());
        assert!(parse(&mentor("98765", "pw")).is_err());
        assert!(parse(&mentor("98765abcde", "pw")).is_err());
        assert!(parse(&mentor("9876543210", "  ")).is_err());
    }

    #[test]
    fn password_is_never_echoed() {
        let request = parse(&student(3)).unwrap();
        let echoed = serde_json::to_string(&request).unwrap();
        assert!(!echoed.contains("s3cret"));
        assert!(echoed.contains("\"role\":\"student\""));
        assert!(!format!("{request:?}").contains("s3cret"));
    }

    #[test]
    fn guard_and_admin_share_checks() {
        let guard = json!({
            "role": "guard",
            "id": "G01",
            "name": "Gate",
            "phone": "9876543210",
            "college": "",
            "password": "pw"
        });
        assert!(parse(&guard).is_err());

        let admin = json!({
            "role": "admin",
            "id": "A01",
            "name": "Office",
            "phone": "9876543210",
            "college": "KMIT",
            "password": "pw"
        });
        assert_eq!(parse(&admin).unwrap().role(), "admin");
    }
}
