//! # Canonical Snapshot Encoding
//!
//! Deterministic, bit-exact `postcard` encoding of a [`Snapshot`].
//!
//! Records are sorted by id before encoding, so two snapshots holding the
//! same records in a different order encode identically. The checksum of
//! this encoding is the version token used by
//! [`CommitGuard`](crate::assignment::CommitGuard).

use crate::primitives::MAX_SNAPSHOT_RECORDS;
use crate::{
    AcademicYear, AssignmentId, BatchName, BatchRule, CampusError, MentorAssignment, MentorId,
    RuleId, Scope, Semester, Snapshot,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// CANONICAL FORMAT
// =============================================================================

/// Magic bytes for the canonical snapshot format.
pub const CANONICAL_MAGIC: [u8; 4] = *b"CMPS";

/// Current canonical format version.
pub const CANONICAL_VERSION: u8 = 1;

/// Header written before the canonical body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CanonicalHeader {
    pub magic: [u8; 4],
    pub version: u8,
    pub rule_count: u64,
    pub assignment_count: u64,
    /// FNV-1a checksum of the encoded body.
    pub checksum: u64,
}

impl CanonicalHeader {
    #[must_use]
    pub fn new(rule_count: u64, assignment_count: u64, checksum: u64) -> Self {
        Self {
            magic: CANONICAL_MAGIC,
            version: CANONICAL_VERSION,
            rule_count,
            assignment_count,
            checksum,
        }
    }

    /// Validate magic, version and record limits.
    pub fn validate(&self) -> Result<(), CampusError> {
        if self.magic != CANONICAL_MAGIC {
            return Err(CampusError::SerializationError(
                "Invalid file format".to_string(),
            ));
        }
        if self.version != CANONICAL_VERSION {
            return Err(CampusError::SerializationError(
                "Unsupported file version".to_string(),
            ));
        }
        if self.rule_count.saturating_add(self.assignment_count) > MAX_SNAPSHOT_RECORDS as u64 {
            return Err(CampusError::SerializationError(format!(
                "Record count exceeds maximum allowed {}",
                MAX_SNAPSHOT_RECORDS
            )));
        }
        Ok(())
    }
}

// =============================================================================
// CANONICAL RECORDS (flat, sorted)
// =============================================================================

/// A batch rule in canonical form. Sorted by id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct CanonicalRule {
    pub id: String,
    pub college: String,
    pub course: String,
    pub section: String,
    pub semester: u8,
    pub academic_year_start: i32,
    pub batch_name: String,
    pub roll_start: Option<u32>,
    pub roll_end: Option<u32>,
    pub lateral_entry: bool,
}

impl From<&BatchRule> for CanonicalRule {
    fn from(rule: &BatchRule) -> Self {
        Self {
            id: rule.id.0.clone(),
            college: rule.scope.college.clone(),
            course: rule.scope.course.clone(),
            section: rule.scope.section.clone(),
            semester: rule.scope.semester.value(),
            academic_year_start: rule.scope.academic_year.start_year(),
            batch_name: rule.batch_name.0.clone(),
            roll_start: rule.roll_start,
            roll_end: rule.roll_end,
            lateral_entry: rule.lateral_entry,
        }
    }
}

impl TryFrom<CanonicalRule> for BatchRule {
    type Error = CampusError;

    fn try_from(c: CanonicalRule) -> Result<Self, Self::Error> {
        Ok(Self {
            id: RuleId(c.id),
            scope: Scope::new(
                c.college,
                c.course,
                c.section,
                Semester::new(c.semester)?,
                AcademicYear::starting(c.academic_year_start)?,
            ),
            batch_name: BatchName(c.batch_name),
            roll_start: c.roll_start,
            roll_end: c.roll_end,
            lateral_entry: c.lateral_entry,
        })
    }
}

/// A mentor assignment in canonical form. Sorted by id.
///
/// `locked_at` is stored as (unix seconds, subsecond nanos).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct CanonicalAssignment {
    pub id: String,
    pub mentor_id: String,
    pub college: String,
    pub course: String,
    pub section: String,
    pub semester: u8,
    pub academic_year_start: i32,
    pub batch_name: String,
    pub roll_start: Option<u32>,
    pub roll_end: Option<u32>,
    pub lateral_entry: bool,
    pub active_status: bool,
    pub locked_at: Option<(i64, u32)>,
    pub locked_by: Option<String>,
}

impl From<&MentorAssignment> for CanonicalAssignment {
    fn from(a: &MentorAssignment) -> Self {
        Self {
            id: a.id.0.clone(),
            mentor_id: a.mentor_id.0.clone(),
            college: a.scope.college.clone(),
            course: a.scope.course.clone(),
            section: a.scope.section.clone(),
            semester: a.scope.semester.value(),
            academic_year_start: a.scope.academic_year.start_year(),
            batch_name: a.batch_name.0.clone(),
            roll_start: a.roll_start,
            roll_end: a.roll_end,
            lateral_entry: a.lateral_entry,
            active_status: a.active_status,
            locked_at: a
                .locked_at
                .map(|t| (t.timestamp(), t.timestamp_subsec_nanos())),
            locked_by: a.locked_by.clone(),
        }
    }
}

impl TryFrom<CanonicalAssignment> for MentorAssignment {
    type Error = CampusError;

    fn try_from(c: CanonicalAssignment) -> Result<Self, Self::Error> {
        let locked_at = match c.locked_at {
            Some((secs, nanos)) => Some(DateTime::<Utc>::from_timestamp(secs, nanos).ok_or_else(|| {
                CampusError::SerializationError(format!(
                    "assignment {} has an invalid lock timestamp",
                    c.id
                ))
            })?),
            None => None,
        };
        Ok(Self {
            id: AssignmentId(c.id),
            mentor_id: MentorId(c.mentor_id),
            scope: Scope::new(
                c.college,
                c.course,
                c.section,
                Semester::new(c.semester)?,
                AcademicYear::starting(c.academic_year_start)?,
            ),
            batch_name: BatchName(c.batch_name),
            roll_start: c.roll_start,
            roll_end: c.roll_end,
            lateral_entry: c.lateral_entry,
            active_status: c.active_status,
            locked_at,
            locked_by: c.locked_by,
        })
    }
}

// =============================================================================
// CANONICAL SNAPSHOT
// =============================================================================

/// A snapshot in canonical, order-independent form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CanonicalSnapshot {
    pub rules: Vec<CanonicalRule>,
    pub assignments: Vec<CanonicalAssignment>,
}

impl CanonicalSnapshot {
    #[must_use]
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let mut rules: Vec<CanonicalRule> = snapshot.rules.iter().map(CanonicalRule::from).collect();
        rules.sort();
        let mut assignments: Vec<CanonicalAssignment> = snapshot
            .assignments
            .iter()
            .map(CanonicalAssignment::from)
            .collect();
        assignments.sort();
        Self { rules, assignments }
    }

    /// Convert back into a snapshot (records in id order).
    pub fn to_snapshot(self) -> Result<Snapshot, CampusError> {
        let rules = self
            .rules
            .into_iter()
            .map(BatchRule::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let assignments = self
            .assignments
            .into_iter()
            .map(MentorAssignment::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Snapshot::new(rules, assignments))
    }

    /// The postcard body bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CampusError> {
        postcard::to_allocvec(self)
            .map_err(|e| CampusError::SerializationError(format!("Data: {}", e)))
    }
}

/// 64-bit FNV-1a over a byte slice.
///
/// Detects accidental change only. It is not collision resistant; use
/// [`canonical_fingerprint`] where that matters.
#[must_use]
pub fn checksum(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    bytes.iter().fold(OFFSET, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(PRIME)
    })
}

/// Checksum of a snapshot's canonical body.
pub fn snapshot_checksum(snapshot: &Snapshot) -> Result<u64, CampusError> {
    let body = CanonicalSnapshot::from_snapshot(snapshot).to_bytes()?;
    Ok(checksum(&body))
}

// =============================================================================
// EXPORT / IMPORT
// =============================================================================

/// Export a snapshot to the canonical format.
///
/// ```text
/// [header_len: u32 LE] [CanonicalHeader (postcard)] [CanonicalSnapshot (postcard)]
/// ```
pub fn export_canonical(snapshot: &Snapshot) -> Result<Vec<u8>, CampusError> {
    let canonical = CanonicalSnapshot::from_snapshot(snapshot);
    let body = canonical.to_bytes()?;
    let header = CanonicalHeader::new(
        canonical.rules.len() as u64,
        canonical.assignments.len() as u64,
        checksum(&body),
    );
    let header_bytes = postcard::to_allocvec(&header)
        .map_err(|e| CampusError::SerializationError(format!("Header: {}", e)))?;
    let header_len = u32::try_from(header_bytes.len())
        .map_err(|_| CampusError::SerializationError("Header too large".to_string()))?;

    let mut result = Vec::with_capacity(4 + header_bytes.len() + body.len());
    result.extend_from_slice(&header_len.to_le_bytes());
    result.extend_from_slice(&header_bytes);
    result.extend_from_slice(&body);
    Ok(result)
}

/// Import a snapshot from the canonical format, verifying header and checksum.
pub fn import_canonical(data: &[u8]) -> Result<Snapshot, CampusError> {
    let (len_bytes, rest) = data
        .split_first_chunk::<4>()
        .ok_or_else(|| CampusError::SerializationError("Data too short".to_string()))?;
    let header_len = u32::from_le_bytes(*len_bytes) as usize;
    if rest.len() < header_len {
        return Err(CampusError::SerializationError(
            "Data too short for header".to_string(),
        ));
    }
    let (header_bytes, body) = rest.split_at(header_len);

    let header: CanonicalHeader = postcard::from_bytes(header_bytes)
        .map_err(|e| CampusError::SerializationError(format!("Header: {}", e)))?;
    header.validate()?;

    let computed = checksum(body);
    if computed != header.checksum {
        return Err(CampusError::SerializationError(format!(
            "Checksum mismatch: expected {}, got {}",
            header.checksum, computed
        )));
    }

    let canonical: CanonicalSnapshot = postcard::from_bytes(body)
        .map_err(|e| CampusError::SerializationError(format!("Data: {}", e)))?;
    if canonical.rules.len() as u64 != header.rule_count
        || canonical.assignments.len() as u64 != header.assignment_count
    {
        return Err(CampusError::SerializationError(
            "Record count mismatch".to_string(),
        ));
    }

    canonical.to_snapshot()
}

/// BLAKE3 hash of the canonical export, as 64 hex characters.
#[cfg(feature = "crypto-hash")]
pub fn canonical_fingerprint(snapshot: &Snapshot) -> Result<String, CampusError> {
    let data = export_canonical(snapshot)?;
    Ok(blake3::hash(&data).to_hex().to_string())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn scope() -> Scope {
        Scope::new(
            "KMIT",
            "CSE",
            "A",
            Semester::new(5).unwrap(),
            AcademicYear::starting(2025).unwrap(),
        )
    }

    fn sample() -> Snapshot {
        let mut locked = MentorAssignment::new("a2", "EMP02", scope(), "B2")
            .locked(Utc.with_ymd_and_hms(2025, 7, 1, 10, 30, 0).unwrap());
        locked.locked_by = Some("HOD01".to_string());
        Snapshot::new(
            vec![
                BatchRule::new("r2", scope(), "B2", Some(31), None),
                BatchRule::new("r1", scope(), "B1", Some(1), Some(30)),
            ],
            vec![locked, MentorAssignment::new("a1", "EMP01", scope(), "B1")],
        )
    }

    #[test]
    fn fnv_known_vectors() {
        assert_eq!(checksum(b""), 0xcbf2_9ce4_8422_2325);
        assert_eq!(checksum(b"a"), 0xaf63_dc4c_8601_ec8c);
    }

    #[test]
    fn checksum_ignores_record_order() {
        let snapshot = sample();
        let mut reordered = snapshot.clone();
        reordered.rules.reverse();
        reordered.assignments.reverse();
        assert_eq!(
            snapshot_checksum(&snapshot).unwrap(),
            snapshot_checksum(&reordered).unwrap()
        );
    }

    #[test]
    fn checksum_tracks_content() {
        let snapshot = sample();
        let mut changed = snapshot.clone();
        changed.assignments[1].active_status = false;
        assert_ne!(
            snapshot_checksum(&snapshot).unwrap(),
            snapshot_checksum(&changed).unwrap()
        );
    }

    #[test]
    fn export_import_preserves_records() {
        let snapshot = sample();
        let bytes = export_canonical(&snapshot).unwrap();
        let imported = import_canonical(&bytes).unwrap();

        assert_eq!(imported.rules.len(), 2);
        assert_eq!(imported.rules[0].id.as_str(), "r1");
        assert_eq!(imported.assignments[1], snapshot.assignments[0]);
        assert_eq!(
            snapshot_checksum(&imported).unwrap(),
            snapshot_checksum(&snapshot).unwrap()
        );
    }

    #[test]
    fn import_rejects_corruption() {
        let mut bytes = export_canonical(&sample()).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        assert!(matches!(
            import_canonical(&bytes),
            Err(CampusError::SerializationError(_))
        ));
        assert!(import_canonical(&[1, 2]).is_err());
        assert!(import_canonical(&[200, 0, 0, 0, 1]).is_err());
    }

    #[test]
    fn header_rejects_wrong_magic() {
        let mut header = CanonicalHeader::new(0, 0, 0);
        header.magic = *b"KREX";
        assert!(header.validate().is_err());
    }

    #[cfg(feature = "crypto-hash")]
    #[test]
    fn fingerprint_is_stable_hex() {
        let a = canonical_fingerprint(&sample()).unwrap();
        let mut reordered = sample();
        reordered.rules.reverse();
        let b = canonical_fingerprint(&reordered).unwrap();
        assert_eq!(a.len(), 64);
        assert_eq!(a, b);
    }
}
