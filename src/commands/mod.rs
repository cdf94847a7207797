//! CLI command implementations for samfilter.
//!
//! - [`filter`] - Keep the records selected by one filter policy

#![allow(
    clippy::cast_possible_truncation,
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::uninlined_format_args
)]

pub mod command;
pub mod common;
pub mod filter;
