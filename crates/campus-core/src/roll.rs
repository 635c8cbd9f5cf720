//! # Roll Numbers
//!
//! Student ids carry the roll number in their trailing digits
//! (`"245522733096"` is roll 96 of its section).

use crate::primitives::{MAX_ID_LENGTH, ROLL_SUFFIX_DIGITS};
use crate::{CampusError, RollNumber};

/// Extract the roll number from a student id.
///
/// Only the last `ROLL_SUFFIX_DIGITS` characters are read, and they must all
/// be ASCII digits.
pub fn roll_from_student_id(student_id: &str) -> Result<RollNumber, CampusError> {
    let id = student_id.trim();
    if id.is_empty() || id.len() > MAX_ID_LENGTH {
        return Err(CampusError::InvalidInput(format!(
            "student id must be 1..={} characters",
            MAX_ID_LENGTH
        )));
    }

    let chars: Vec<char> = id.chars().collect();
    if chars.len() < ROLL_SUFFIX_DIGITS {
        return Err(CampusError::InvalidInput(format!(
            "student id '{}' is too short to carry a roll number",
            id
        )));
    }

    let suffix = &chars[chars.len() - ROLL_SUFFIX_DIGITS..];
    let mut roll: u32 = 0;
    for c in suffix {
        let digit = c.to_digit(10).ok_or_else(|| {
            CampusError::InvalidInput(format!("student id '{}' does not end in digits", id))
        })?;
        roll = roll * 10 + digit;
    }
    Ok(RollNumber(roll))
}
