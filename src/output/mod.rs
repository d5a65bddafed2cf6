//! Output module for reporting on collected state
//!
//! This module handles:
//! - Reading back the scheduling order and per-term cursors
//! - Summarizing the rate-limit ledger and results list

pub mod stats;

pub use stats::{load_report, print_report, StoreReport, TermReport};
