//! Output module for run reports
//!
//! This module handles:
//! - Summarizing a finished feed harvest
//! - Describing the plan of a dry run

mod report;

pub use report::{format_plan, format_report, print_plan, print_report};
