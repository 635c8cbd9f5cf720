//! # Campus - Term and Mentor Resolution
//!
//! The main binary wrapping the `campus-core` resolution engine.
//!
//! This application provides:
//! - HTTP sidecar (axum-based) called by the campus backend
//! - CLI interface for lookups and snapshot audits
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │            apps/campus (THE BINARY)          │
//! │                                              │
//! │  ┌─────────────┐        ┌─────────────────┐  │
//! │  │    CLI      │        │  HTTP sidecar   │  │
//! │  │   (clap)    │        │     (axum)      │  │
//! │  └──────┬──────┘        └────────┬────────┘  │
//! │         └───────────┬────────────┘           │
//! │                     ▼                        │
//! │             ┌───────────────┐                │
//! │             │  campus-core  │                │
//! │             │  (THE LOGIC)  │                │
//! │             └───────────────┘                │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the sidecar
//! campus --snapshot snapshot.json server --port 8080
//!
//! # CLI lookups
//! campus term --admission-year 2024
//! campus -s snapshot.json student --college KMIT --course CSE --section A \
//!     --semester 3 --academic-year 2025-2026 --student-id 245522733096
//! campus -s snapshot.json audit
//! ```

use campus::cli;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    // CAMPUS_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("CAMPUS_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let default_filter = if cli.verbose {
        "campus=debug,tower_http=debug"
    } else {
        "campus=info,tower_http=debug"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!(kind = e.kind(), "Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the startup banner.
fn print_banner() {
    println!(
        r#"
   ___ __ _ _ __ ___  _ __  _   _ ___
  / __/ _` | '_ ` _ \| '_ \| | | / __|
 | (_| (_| | | | | | | |_) | |_| \__ \
  \___\__,_|_| |_| |_| .__/ \__,_|___/
                     |_|

  Term & Mentor Resolution v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
