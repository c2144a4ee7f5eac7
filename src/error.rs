// SPDX-License-Identifier: PMPL-1.0-or-later
//! Error types for a11y-audit
//!
//! Only configuration problems and host I/O surface here. A failing rule or
//! an unresolvable style never becomes an error; those are folded into the
//! report instead.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AuditError>;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Unknown rule id: {0}")]
    UnknownRule(String),

    #[error("Invalid audit options: {0}")]
    InvalidOptions(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
