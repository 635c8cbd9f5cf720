//! # CLI Command Implementations
//!
//! Each command loads what it needs, runs one core operation and prints
//! either a short human-readable summary or, with `--json-mode`, JSON.

use super::ScopeArgs;
use crate::api::{self, AppState, RollInput};
use crate::config::CampusConfig;
use campus_core::{
    AcademicTermResolver, AcademicYear, BatchName, CampusError, CommitGuard, CreateUserRequest,
    MentorAssignment, MentorAssignmentResolver, RollNumber, Semester, Snapshot,
    canonical_fingerprint, export_canonical, import_canonical, snapshot_checksum,
};
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};

// =============================================================================
// FILE HELPERS
// =============================================================================

/// Maximum snapshot file size (100 MB).
const MAX_SNAPSHOT_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Maximum size for a single request file (1 MB).
const MAX_REQUEST_FILE_SIZE: u64 = 1024 * 1024;

fn validate_file_size(path: &Path, max_size: u64) -> Result<(), CampusError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| CampusError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(CampusError::SerializationError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Canonicalize `path` and require a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, CampusError> {
    let canonical = path.canonicalize().map_err(|e| {
        CampusError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(CampusError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Require an existing parent directory for an output file.
fn validate_output_path(path: &Path) -> Result<PathBuf, CampusError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        CampusError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(CampusError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| CampusError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

fn read_limited(path: &Path, max_size: u64) -> Result<Vec<u8>, CampusError> {
    let path = validate_file_path(path)?;
    validate_file_size(&path, max_size)?;
    std::fs::read(&path)
        .map_err(|e| CampusError::IoError(format!("Cannot read '{}': {}", path.display(), e)))
}

/// Load a snapshot file, trying the canonical format first, then JSON.
pub fn load_snapshot(path: &Path) -> Result<Snapshot, CampusError> {
    let data = read_limited(path, MAX_SNAPSHOT_FILE_SIZE)?;
    match import_canonical(&data) {
        Ok(snapshot) => Ok(snapshot),
        Err(canonical_err) => serde_json::from_slice(&data).map_err(|json_err| {
            CampusError::SerializationError(format!(
                "'{}' is neither a canonical snapshot ({}) nor snapshot JSON ({})",
                path.display(),
                canonical_err,
                json_err
            ))
        }),
    }
}

fn require_snapshot(config: &CampusConfig) -> Result<Snapshot, CampusError> {
    let path = config.snapshot.as_deref().ok_or_else(|| {
        CampusError::InvalidInput(
            "no snapshot given (use --snapshot, CAMPUS_SNAPSHOT or the config file)".to_string(),
        )
    })?;
    load_snapshot(path)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CampusError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| CampusError::SerializationError(format!("Cannot encode output: {}", e)))?;
    println!("{}", json);
    Ok(())
}

/// Same agreement rule as the sidecar: `--roll` and `--student-id` must match.
fn roll_from_args(roll: Option<u32>, student_id: Option<&str>) -> Result<RollNumber, CampusError> {
    RollInput {
        roll_number: roll,
        student_id: student_id.map(str::to_string),
    }
    .roll()
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the resolution sidecar.
pub async fn cmd_server(config: &CampusConfig) -> Result<(), CampusError> {
    let snapshot = match config.snapshot.as_deref() {
        Some(path) => load_snapshot(path)?,
        None => {
            tracing::warn!("no snapshot configured; starting empty until PUT /snapshot");
            Snapshot::default()
        }
    };

    println!("Campus Resolution Sidecar Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:       {}", config.host);
    println!("  Port:       {}", config.port);
    println!(
        "  Snapshot:   {}",
        config
            .snapshot
            .as_deref()
            .map_or_else(|| "(none)".to_string(), |p| p.display().to_string())
    );
    println!("  Precedence: {:?}", config.policy.locked_precedence);
    println!(
        "  Capacity:   {}",
        config
            .policy
            .section_capacity()
            .map_or_else(|| "unlimited".to_string(), |n| n.to_string())
    );
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let state = AppState::new(snapshot, config.policy).with_rate_limit(config.rate_limit);
    api::run_server(&config.bind_address(), state).await
}

// =============================================================================
// TERM COMMAND
// =============================================================================

/// Resolve year-level and semester window.
pub fn cmd_term(
    json_mode: bool,
    admission_year: &str,
    date: Option<NaiveDate>,
) -> Result<(), CampusError> {
    let reference = date.unwrap_or_else(|| Utc::now().date_naive());
    let window = AcademicTermResolver::resolve_window_raw(admission_year, reference)?;
    let academic_year = AcademicTermResolver::academic_year_for(reference);
    let semesters: Vec<u8> = window.valid_semesters.iter().map(|s| s.value()).collect();

    if json_mode {
        print_json(&serde_json::json!({
            "reference_date": reference.to_string(),
            "year_level": window.year_level.value(),
            "valid_semesters": semesters,
            "academic_year": academic_year.to_string(),
        }))?;
        return Ok(());
    }

    println!("Reference date: {}", reference);
    println!("Academic year:  {}", academic_year);
    println!("Year level:     {}", window.year_level);
    println!("Semesters:      {:?}", semesters);
    Ok(())
}

// =============================================================================
// RESOLVE COMMANDS
// =============================================================================

/// Resolve the batch for a roll number.
pub fn cmd_batch(
    config: &CampusConfig,
    json_mode: bool,
    scope: &ScopeArgs,
    roll: Option<u32>,
    student_id: Option<&str>,
) -> Result<(), CampusError> {
    let scope = scope.to_scope()?;
    let roll = roll_from_args(roll, student_id)?;
    let snapshot = require_snapshot(config)?;
    let resolver = MentorAssignmentResolver::with_policy(config.policy);
    let rule = resolver.resolve_batch(&snapshot.rules, &scope, roll)?;

    if json_mode {
        print_json(&serde_json::json!({
            "found": rule.is_some(),
            "roll_number": roll.value(),
            "batch_name": rule.map(|r| r.batch_name.as_str()),
            "rule_id": rule.map(|r| r.id.as_str()),
        }))?;
        return Ok(());
    }

    match rule {
        Some(rule) => println!(
            "Roll {} -> batch {} (rule {})",
            roll,
            rule.batch_name,
            rule.id.as_str()
        ),
        None => println!("Roll {} is not covered by any batch rule in {}", roll, scope),
    }
    Ok(())
}

/// Resolve the mentor for a batch.
pub fn cmd_mentor(
    config: &CampusConfig,
    json_mode: bool,
    scope: &ScopeArgs,
    batch: &str,
) -> Result<(), CampusError> {
    let scope = scope.to_scope()?;
    let batch = BatchName::new(batch);
    let snapshot = require_snapshot(config)?;
    let resolver = MentorAssignmentResolver::with_policy(config.policy);
    let assignment = resolver.resolve_mentor(&snapshot.assignments, &scope, &batch)?;

    if json_mode {
        print_json(&serde_json::json!({
            "found": assignment.is_some(),
            "batch_name": batch.as_str(),
            "mentor_id": assignment.map(|a| a.mentor_id.as_str()),
            "assignment_id": assignment.map(|a| a.id.as_str()),
            "locked": assignment.map(MentorAssignment::is_locked),
        }))?;
        return Ok(());
    }

    match assignment {
        Some(a) => println!(
            "Batch {} -> mentor {} (assignment {}{})",
            batch,
            a.mentor_id.as_str(),
            a.id.as_str(),
            if a.is_locked() { ", locked" } else { "" }
        ),
        None => println!("No active mentor for batch {} in {}", batch, scope),
    }
    Ok(())
}

/// Resolve a student's mentor.
pub fn cmd_student(
    config: &CampusConfig,
    json_mode: bool,
    scope: &ScopeArgs,
    roll: Option<u32>,
    student_id: Option<&str>,
) -> Result<(), CampusError> {
    let scope = scope.to_scope()?;
    let roll = roll_from_args(roll, student_id)?;
    let snapshot = require_snapshot(config)?;
    let resolver = MentorAssignmentResolver::with_policy(config.policy);
    let found =
        resolver.resolve_student_mentor(&snapshot.rules, &snapshot.assignments, &scope, roll)?;

    if json_mode {
        print_json(&serde_json::json!({
            "found": found.is_some(),
            "roll_number": roll.value(),
            "batch_name": found.as_ref().map(|m| m.batch_name().as_str()),
            "mentor_id": found.as_ref().map(|m| m.mentor_id().as_str()),
            "assignment_id": found.as_ref().map(|m| m.assignment.id.as_str()),
        }))?;
        return Ok(());
    }

    match found {
        Some(m) => println!(
            "Roll {} -> batch {} -> mentor {}",
            roll,
            m.batch_name(),
            m.mentor_id().as_str()
        ),
        None => println!("No mentor found for roll {} in {}", roll, scope),
    }
    Ok(())
}

// =============================================================================
// ASSIGNMENT COMMANDS
// =============================================================================

/// Run the creation checks for a candidate assignment.
///
/// A rejection is returned as an error so the exit status reflects it.
pub fn cmd_check_assignment(
    config: &CampusConfig,
    json_mode: bool,
    file: &Path,
    expected_checksum: Option<u64>,
) -> Result<(), CampusError> {
    let data = read_limited(file, MAX_REQUEST_FILE_SIZE)?;
    let candidate: MentorAssignment = serde_json::from_slice(&data)
        .map_err(|e| CampusError::InvalidInput(format!("malformed assignment JSON: {}", e)))?;
    let snapshot = require_snapshot(config)?;
    let checksum = snapshot_checksum(&snapshot)?;

    let outcome = match expected_checksum {
        Some(planned) => CommitGuard::new(config.policy).check(planned, &snapshot, &candidate),
        None => MentorAssignmentResolver::with_policy(config.policy)
            .validate_new_assignment(&snapshot.assignments, &candidate),
    };

    if json_mode {
        print_json(&serde_json::json!({
            "allowed": outcome.is_ok(),
            "checksum": checksum,
            "error": outcome.as_ref().err().map(ToString::to_string),
            "error_kind": outcome.as_ref().err().map(CampusError::kind),
        }))?;
    } else if outcome.is_ok() {
        println!(
            "Assignment {} may be created (snapshot {:016x})",
            candidate.id.as_str(),
            checksum
        );
    }
    outcome
}

/// Preview a semester reset.
pub fn cmd_reset_plan(
    config: &CampusConfig,
    json_mode: bool,
    college: &str,
    academic_year: AcademicYear,
    semester: u8,
) -> Result<(), CampusError> {
    if college.trim().is_empty() {
        return Err(CampusError::InvalidInput("college is required".to_string()));
    }
    let semester = Semester::new(semester)?;
    let snapshot = require_snapshot(config)?;
    let plan = MentorAssignmentResolver::with_policy(config.policy).plan_semester_reset(
        &snapshot.assignments,
        college,
        academic_year,
        semester,
    );

    if json_mode {
        print_json(&plan)?;
        return Ok(());
    }

    println!(
        "Reset of {} {} semester {}",
        college, academic_year, semester
    );
    println!("  Removed:         {}", plan.removed.len());
    for id in &plan.removed {
        println!("    - {}", id.as_str());
    }
    println!("  Retained locked: {}", plan.retained_locked.len());
    for id in &plan.retained_locked {
        println!("    - {}", id.as_str());
    }
    Ok(())
}

// =============================================================================
// SNAPSHOT COMMANDS
// =============================================================================

/// Report integrity faults.
pub fn cmd_audit(config: &CampusConfig, json_mode: bool) -> Result<(), CampusError> {
    let snapshot = require_snapshot(config)?;
    let report = snapshot.audit(&config.policy);

    if json_mode {
        print_json(&serde_json::json!({
            "clean": report.is_clean(),
            "fault_count": report.fault_count(),
            "report": report,
        }))?;
        return Ok(());
    }

    println!("Campus Snapshot Audit");
    println!("=====================");
    println!("Rules:       {}", snapshot.rules.len());
    println!("Assignments: {}", snapshot.assignments.len());
    println!();
    if report.is_clean() {
        println!("No integrity faults found.");
        return Ok(());
    }

    println!("Faults: {}", report.fault_count());
    for overlap in &report.rule_overlaps {
        println!(
            "  overlapping rules {} / {} in {}",
            overlap.first.as_str(),
            overlap.second.as_str(),
            overlap.scope
        );
    }
    for record in report
        .malformed_rules
        .iter()
        .chain(&report.malformed_assignments)
    {
        println!("  malformed {}: {}", record.id, record.reason);
    }
    for (label, faults) in [
        ("several locked", &report.duplicate_locked),
        ("unlocked beside locked", &report.unlocked_beside_locked),
        ("ambiguous unlocked", &report.ambiguous_unlocked),
    ] {
        for fault in faults {
            println!(
                "  {} assignments for {} in {}: {:?}",
                label,
                fault.batch_name,
                fault.scope,
                fault
                    .assignment_ids
                    .iter()
                    .map(|id| id.as_str())
                    .collect::<Vec<_>>()
            );
        }
    }
    for breach in &report.capacity_breaches {
        println!(
            "  {} active mentors in {} (limit {})",
            breach.active, breach.scope, breach.limit
        );
    }
    Ok(())
}

/// Print the snapshot checksum and BLAKE3 fingerprint.
pub fn cmd_fingerprint(config: &CampusConfig, json_mode: bool) -> Result<(), CampusError> {
    let snapshot = require_snapshot(config)?;
    let checksum = snapshot_checksum(&snapshot)?;
    let blake3 = canonical_fingerprint(&snapshot)?;

    if json_mode {
        print_json(&serde_json::json!({
            "rules": snapshot.rules.len(),
            "assignments": snapshot.assignments.len(),
            "checksum": checksum,
            "blake3": blake3,
        }))?;
        return Ok(());
    }

    println!("Checksum: {} ({:016x})", checksum, checksum);
    println!("BLAKE3:   {}", blake3);
    Ok(())
}

/// Write the snapshot as canonical bytes or pretty JSON.
pub fn cmd_export(config: &CampusConfig, output: &Path, format: &str) -> Result<(), CampusError> {
    let output = validate_output_path(output)?;
    let snapshot = require_snapshot(config)?;

    let bytes = match format {
        "canonical" => export_canonical(&snapshot)?,
        "json" => serde_json::to_vec_pretty(&snapshot)
            .map_err(|e| CampusError::SerializationError(e.to_string()))?,
        other => {
            return Err(CampusError::InvalidInput(format!(
                "unknown export format '{}' (expected canonical or json)",
                other
            )));
        }
    };

    std::fs::write(&output, &bytes).map_err(|e| {
        CampusError::IoError(format!("Cannot write '{}': {}", output.display(), e))
    })?;
    tracing::info!(
        path = %output.display(),
        format,
        bytes = bytes.len(),
        "snapshot exported"
    );
    Ok(())
}

// =============================================================================
// USER VALIDATION COMMAND
// =============================================================================

/// Validate a user-creation request file.
pub fn cmd_validate_user(
    json_mode: bool,
    file: &Path,
    date: Option<NaiveDate>,
) -> Result<(), CampusError> {
    let reference = date.unwrap_or_else(|| Utc::now().date_naive());
    let data = read_limited(file, MAX_REQUEST_FILE_SIZE)?;
    let request = CreateUserRequest::from_json(&data, reference)?;

    if json_mode {
        print_json(&serde_json::json!({
            "valid": true,
            "role": request.role(),
            "user_id": request.user_id(),
        }))?;
        return Ok(());
    }

    println!(
        "Valid {} request for {}",
        request.role(),
        request.user_id()
    );
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
