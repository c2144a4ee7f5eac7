// SPDX-License-Identifier: PMPL-1.0-or-later
//! a11y-audit - rule-based accessibility audit engine
//!
//! Walks a rendered markup tree through the [`document::DocumentModel`]
//! interface, asks a style oracle for computed styles, and reports
//! severity-ranked findings. Hosts adapt their own tree; a static HTML
//! adapter ([`html::HtmlDocument`]) is included.
//!
//! ## Rules
//!
//! - **alt-text** (1.1.1): missing, empty, or generic image alternatives
//! - **form-label** (3.3.2): form controls without a label
//! - **color-contrast** (1.4.3): text contrast against its background
//! - **keyboard-navigation** (2.4.3): positive tab order, hidden focusable nodes
//! - **heading-structure** (1.3.1): empty, skipped, or repeated top-level headings
//! - **focus-indicator** (2.4.7): focus outline removed without a substitute
//! - **aria-attributes** (4.1.2): dangling id references and invalid roles
//!
//! ## Example
//!
//! ```no_run
//! use a11y_audit::{AuditOptions, Engine, HtmlDocument};
//! use std::sync::Arc;
//!
//! let doc = HtmlDocument::parse("index.html", "<img src=\"logo.png\">");
//! let report = Engine::with_defaults()
//!     .run_audit(Arc::new(doc), &AuditOptions::default())
//!     .unwrap();
//! assert_eq!(report.summary().high, 1);
//! ```

pub mod cancel;
pub mod color;
pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod finding;
pub mod html;
pub mod report;
pub mod rules;
pub mod scanner;

pub use cancel::CancellationToken;
pub use document::{DocumentModel, MemoryDocument, NodeId, NodeTree, StyleSnapshot};
pub use engine::{AuditOptions, Engine};
pub use error::{AuditError, Result};
pub use finding::{Finding, Severity};
pub use html::HtmlDocument;
pub use report::{Report, StructuredReport, Summary};
