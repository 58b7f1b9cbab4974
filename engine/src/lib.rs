//! Analytical engine for per-commit defect risk, churn, duplication,
//! cohesion, dead-code and technical debt gradient scoring.
//!
//! See `SPEC_FULL.md` for the full component catalog and `DESIGN.md` for
//! the grounding ledger. The fifteen components (A-O) live under
//! `services` (logic) and `models` (data types), mirroring the layout of
//! the toolkit this crate is adapted from.

pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use error::{EngineError, EngineResult};
