//! CLI driver: the "consumer" referenced in spec.md §1. Thin wiring from
//! `clap`-parsed arguments to library calls; not itself subject to any of
//! spec.md's invariants (SPEC_FULL §A).
//!
//! Grounded on `server/src/cli/mod.rs`'s derive style: a top-level `Cli`
//! with global logging flags and a `Commands` subcommand enum, `RUST_LOG`
//! wired through `env`.

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "qualitygate", version, about = "Software-quality analysis engine")]
pub struct Cli {
    #[arg(long, global = true, env = "RUST_LOG", default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Per-file churn analysis over a commit-history window.
    Churn {
        path: std::path::PathBuf,
        #[arg(long, default_value_t = 30)]
        days: i64,
    },
    /// Two-pass just-in-time change-risk scoring.
    ChangeRisk {
        path: std::path::PathBuf,
        #[arg(long, default_value_t = 30)]
        days: i64,
        #[arg(long)]
        weights: Option<String>,
        #[arg(long, default_value = "")]
        target: String,
    },
    /// Token-level duplicate/clone detection.
    Duplicates {
        path: std::path::PathBuf,
        #[arg(long, default_value_t = 0.70)]
        threshold: f64,
        #[arg(long, default_value_t = 50)]
        min_tokens: usize,
        #[arg(long, default_value_t = 5)]
        shingle_size: usize,
        #[arg(long, default_value_t = 200)]
        hashes: usize,
        #[arg(long, default_value_t = 20)]
        bands: usize,
        #[arg(long, default_value_t = 10)]
        rows_per_band: usize,
        #[arg(long, default_value_t = 0)]
        max_file_size: u64,
    },
    /// Reference-reachability dead-code analysis.
    DeadCode {
        path: std::path::PathBuf,
        #[arg(long, default_value_t = 0.5)]
        confidence: f64,
    },
    /// Aggregated Technical Debt Gradient score.
    Tdg { path: std::path::PathBuf },
    /// CK cohesion metrics (WMC/NOM/NOF/RFC/CBO/LCOM4/DIT/NOC) per class.
    Cohesion {
        path: std::path::PathBuf,
        /// Include files that look like test files (skipped by default).
        #[arg(long)]
        include_test_files: bool,
    },
    /// Project-wide dependency graph: PageRank, betweenness, cycles.
    Graph { path: std::path::PathBuf },
    /// Architectural smells: cycles, hubs, god components, unstable deps.
    Smells { path: std::path::PathBuf },
    /// Per-function cyclomatic/cognitive complexity.
    Complexity { path: std::path::PathBuf },
    /// Per-file defect probability from churn and complexity signals.
    Defect {
        path: std::path::PathBuf,
        #[arg(long, default_value_t = 30)]
        days: i64,
        #[arg(long)]
        weights: Option<String>,
    },
}

/// Exit codes per spec.md §6: 0 success, 1 generic failure, 2 invalid
/// arguments, 3 cancelled/timed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    GenericFailure = 1,
    InvalidArguments = 2,
    Cancelled = 3,
}
