// SPDX-License-Identifier: PMPL-1.0-or-later
//! File front end: reads an HTML file and audits it.

use crate::engine::{AuditOptions, Engine};
use crate::error::Result;
use crate::html::HtmlDocument;
use crate::report::Report;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Audit markup already in memory
pub fn audit_markup(
    engine: &Engine,
    target: &str,
    markup: &str,
    options: &AuditOptions,
) -> Result<Report> {
    let document = HtmlDocument::parse(target, markup);
    engine.run_audit(Arc::new(document), options)
}

/// Audit a single HTML file. The target label defaults to the file path.
pub fn audit_file(
    engine: &Engine,
    path: &Path,
    target: Option<&str>,
    options: &AuditOptions,
) -> Result<Report> {
    info!("Auditing file: {}", path.display());
    let markup = std::fs::read_to_string(path)?;
    let label = target
        .map(str::to_string)
        .unwrap_or_else(|| path.display().to_string());
    audit_markup(engine, &label, &markup, options)
}
