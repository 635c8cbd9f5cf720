//! # Campus CLI Module
//!
//! Command-line access to the resolvers, run against a snapshot file.
//!
//! ## Available Commands
//!
//! - `server` - Start the resolution sidecar
//! - `term` - Resolve year-level and semester window
//! - `batch` - Resolve the batch for a roll number
//! - `mentor` - Resolve the mentor for a batch
//! - `student` - Resolve a student's mentor
//! - `check-assignment` - Run the creation checks for a candidate assignment
//! - `audit` - Integrity report for the snapshot
//! - `fingerprint` - Snapshot checksum and BLAKE3 hash
//! - `reset-plan` - Preview a semester reset
//! - `validate-user` - Validate a user-creation request
//! - `export` - Write the snapshot in canonical or JSON form

mod commands;

use crate::config::CampusConfig;
use campus_core::{AcademicYear, CampusError, Scope, Semester};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Campus - term and mentor resolution
///
/// Deterministic academic-term, batch and mentor resolution for the
/// campus management backend.
#[derive(Parser, Debug)]
#[command(name = "campus")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the TOML config file (default: ./campus.toml if present)
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Snapshot file (JSON or canonical); overrides the config
    #[arg(short = 's', long, global = true)]
    pub snapshot: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// The scope a lookup runs in.
#[derive(Args, Debug, Clone)]
pub struct ScopeArgs {
    #[arg(long)]
    pub college: String,

    #[arg(long)]
    pub course: String,

    #[arg(long)]
    pub section: String,

    /// Semester number (1-8)
    #[arg(long)]
    pub semester: u8,

    /// Academic year, e.g. 2025-2026
    #[arg(long)]
    pub academic_year: AcademicYear,
}

impl ScopeArgs {
    /// Build and validate the scope.
    pub fn to_scope(&self) -> Result<Scope, CampusError> {
        let scope = Scope::new(
            self.college.as_str(),
            self.course.as_str(),
            self.section.as_str(),
            Semester::new(self.semester)?,
            self.academic_year,
        );
        scope.validate()?;
        Ok(scope)
    }
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the resolution sidecar
    Server {
        /// Host to bind to (overrides config)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Resolve year-level and valid semesters for an admission year
    Term {
        /// Admission year as entered (e.g. 2024)
        #[arg(short, long)]
        admission_year: String,

        /// Reference date (YYYY-MM-DD, default: today)
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },

    /// Resolve the batch for a roll number
    Batch {
        #[command(flatten)]
        scope: ScopeArgs,

        /// Roll number within the section
        #[arg(short, long)]
        roll: Option<u32>,

        /// Student id; the roll is its last two digits
        #[arg(long)]
        student_id: Option<String>,
    },

    /// Resolve the mentor responsible for a batch
    Mentor {
        #[command(flatten)]
        scope: ScopeArgs,

        /// Batch name (e.g. B1)
        #[arg(short, long)]
        batch: String,
    },

    /// Resolve a student's mentor
    Student {
        #[command(flatten)]
        scope: ScopeArgs,

        /// Roll number within the section
        #[arg(short, long)]
        roll: Option<u32>,

        /// Student id; the roll is its last two digits
        #[arg(long)]
        student_id: Option<String>,
    },

    /// Check whether a candidate assignment (JSON file) may be created
    CheckAssignment {
        /// Candidate assignment JSON
        #[arg(short, long)]
        file: PathBuf,

        /// Checksum of the snapshot the write was planned against
        #[arg(long)]
        expected_checksum: Option<u64>,
    },

    /// Report integrity faults in the snapshot
    Audit,

    /// Print the snapshot checksum and BLAKE3 fingerprint
    Fingerprint,

    /// Preview which assignments a semester reset would remove
    ResetPlan {
        #[arg(long)]
        college: String,

        /// Academic year, e.g. 2025-2026
        #[arg(long)]
        academic_year: AcademicYear,

        /// Semester number (1-8)
        #[arg(long)]
        semester: u8,
    },

    /// Validate a role-tagged user-creation request (JSON file)
    ValidateUser {
        /// Request JSON
        #[arg(short, long)]
        file: PathBuf,

        /// Reference date for semester checks (default: today)
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },

    /// Write the snapshot to a file
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Export format (canonical, json)
        #[arg(short = 't', long, default_value = "canonical")]
        format: String,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), CampusError> {
    let mut config = CampusConfig::load(cli.config.as_deref())?;
    if let Some(path) = cli.snapshot {
        config.snapshot = Some(path);
    }
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Server { host, port }) => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            cmd_server(&config).await
        }
        Some(Commands::Term {
            admission_year,
            date,
        }) => cmd_term(json_mode, &admission_year, date),
        Some(Commands::Batch {
            scope,
            roll,
            student_id,
        }) => cmd_batch(&config, json_mode, &scope, roll, student_id.as_deref()),
        Some(Commands::Mentor { scope, batch }) => cmd_mentor(&config, json_mode, &scope, &batch),
        Some(Commands::Student {
            scope,
            roll,
            student_id,
        }) => cmd_student(&config, json_mode, &scope, roll, student_id.as_deref()),
        Some(Commands::CheckAssignment {
            file,
            expected_checksum,
        }) => cmd_check_assignment(&config, json_mode, &file, expected_checksum),
        Some(Commands::Audit) | None => cmd_audit(&config, json_mode),
        Some(Commands::Fingerprint) => cmd_fingerprint(&config, json_mode),
        Some(Commands::ResetPlan {
            college,
            academic_year,
            semester,
        }) => cmd_reset_plan(&config, json_mode, &college, academic_year, semester),
        Some(Commands::ValidateUser { file, date }) => cmd_validate_user(json_mode, &file, date),
        Some(Commands::Export { output, format }) => cmd_export(&config, &output, &format),
    }
}

// =============================================================================
// TESTS
// =============================================================================
