// SPDX-License-Identifier: PMPL-1.0-or-later
//! Audit engine.
//!
//! Runs the selected rules against one document and folds their findings into
//! a [`Report`]. Every rule runs on its own worker thread so a panic or a
//! runaway traversal is contained: the engine waits on a channel with a
//! deadline and records a "rule skipped" finding for whatever did not report
//! back in time. Batches are always emitted in registry order.

use crate::cancel::CancellationToken;
use crate::document::DocumentModel;
use crate::error::{AuditError, Result};
use crate::finding::Finding;
use crate::report::{Report, RuleBatch};
use crate::rules::{AuditContext, Rule, RuleRegistry};
use chrono::{DateTime, Utc};
use std::any::Any;
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Time a single rule may run before it is abandoned
pub const DEFAULT_RULE_TIMEOUT: Duration = Duration::from_millis(5000);

/// Per-run options
#[derive(Debug, Clone)]
pub struct AuditOptions {
    /// Rule ids to run; `None` runs every registered rule
    pub rules: Option<Vec<String>>,
    pub per_rule_timeout: Duration,
    /// Start all rules at once instead of one after another
    pub concurrency: bool,
    pub cancellation: Option<CancellationToken>,
    /// Pin the report timestamp (otherwise the current time)
    pub timestamp: Option<DateTime<Utc>>,
}

impl Default for AuditOptions {
    fn default() -> Self {
        Self {
            rules: None,
            per_rule_timeout: DEFAULT_RULE_TIMEOUT,
            concurrency: true,
            cancellation: None,
            timestamp: None,
        }
    }
}

impl AuditOptions {
    pub fn with_rules<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rules = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.per_rule_timeout = timeout;
        self
    }

    pub fn sequential(mut self) -> Self {
        self.concurrency = false;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

type Outcome = std::result::Result<Vec<Finding>, String>;

/// Stateless rule runner. Holds only the registry, so one engine can serve
/// any number of concurrent audits.
#[derive(Clone)]
pub struct Engine {
    registry: RuleRegistry,
}

impl Engine {
    pub fn new(registry: RuleRegistry) -> Self {
        Self { registry }
    }

    /// Engine with every built-in rule
    pub fn with_defaults() -> Self {
        Self::new(RuleRegistry::with_defaults())
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Audit `document`.
    ///
    /// Fails only when `options` are invalid, before any rule runs. Rule
    /// panics and timeouts end up in the report as skip findings.
    pub fn run_audit(
        &self,
        document: Arc<dyn DocumentModel>,
        options: &AuditOptions,
    ) -> Result<Report> {
        let selected = self.select(options)?;
        let root = options.cancellation.clone().unwrap_or_default();
        let timestamp = options.timestamp.unwrap_or_else(Utc::now);

        debug!(
            "Auditing {} with {} rule(s), {} mode",
            document.target(),
            selected.len(),
            if options.concurrency { "concurrent" } else { "sequential" }
        );

        let outcomes = if root.is_cancelled() {
            vec![Vec::new(); selected.len()]
        } else if options.concurrency {
            run_concurrent(&selected, &document, &root, options.per_rule_timeout)
        } else {
            run_sequential(&selected, &document, &root, options.per_rule_timeout)
        };

        let batches = selected
            .iter()
            .zip(outcomes)
            .map(|(rule, findings)| RuleBatch::new(rule.id(), findings))
            .collect();

        let report = Report::new(document.target(), timestamp, batches, root.is_cancelled());
        let summary = report.summary();
        info!(
            "Audit of {} finished: {} finding(s) ({} high, {} medium, {} low){}",
            report.target(),
            summary.total,
            summary.high,
            summary.medium,
            summary.low,
            if report.is_incomplete() { ", incomplete" } else { "" }
        );
        Ok(report)
    }

    /// Rules to run, in registry order
    fn select(&self, options: &AuditOptions) -> Result<Vec<Arc<dyn Rule>>> {
        if options.per_rule_timeout.is_zero() {
            return Err(AuditError::InvalidOptions(
                "per-rule timeout must be greater than zero".to_string(),
            ));
        }

        let Some(ids) = &options.rules else {
            return Ok(self.registry.iter().cloned().collect());
        };
        if let Some(unknown) = ids.iter().find(|id| !self.registry.contains(id)) {
            return Err(AuditError::UnknownRule(unknown.clone()));
        }
        let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
        Ok(self
            .registry
            .iter()
            .filter(|rule| wanted.contains(rule.id()))
            .cloned()
            .collect())
    }
}

fn run_concurrent(
    rules: &[Arc<dyn Rule>],
    document: &Arc<dyn DocumentModel>,
    root: &CancellationToken,
    timeout: Duration,
) -> Vec<Vec<Finding>> {
    let (tx, rx) = mpsc::channel();
    let mut slots: Vec<Option<Vec<Finding>>> = vec![None; rules.len()];
    let mut tokens = Vec::with_capacity(rules.len());
    let mut pending = 0usize;

    for (index, rule) in rules.iter().enumerate() {
        let token = root.child_token();
        match spawn_rule(index, rule, document, &token, &tx) {
            Ok(()) => pending += 1,
            Err(reason) => slots[index] = Some(vec![Finding::rule_skipped(rule.id(), &reason)]),
        }
        tokens.push(token);
    }
    drop(tx);

    let deadline = Instant::now() + timeout;
    while pending > 0 {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok((index, outcome)) => {
                slots[index] = Some(settle(&rules[index], outcome));
                pending -= 1;
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| {
            slot.unwrap_or_else(|| {
                tokens[index].cancel();
                vec![timed_out(&rules[index], timeout)]
            })
        })
        .collect()
}

fn run_sequential(
    rules: &[Arc<dyn Rule>],
    document: &Arc<dyn DocumentModel>,
    root: &CancellationToken,
    timeout: Duration,
) -> Vec<Vec<Finding>> {
    let mut results = Vec::with_capacity(rules.len());

    for (index, rule) in rules.iter().enumerate() {
        if root.is_cancelled() {
            results.push(Vec::new());
            continue;
        }

        let (tx, rx) = mpsc::channel();
        let token = root.child_token();
        if let Err(reason) = spawn_rule(index, rule, document, &token, &tx) {
            results.push(vec![Finding::rule_skipped(rule.id(), &reason)]);
            continue;
        }
        drop(tx);

        let findings = match rx.recv_timeout(timeout) {
            Ok((_, outcome)) => settle(rule, outcome),
            Err(_) => {
                token.cancel();
                vec![timed_out(rule, timeout)]
            }
        };
        results.push(findings);
    }

    results
}

fn spawn_rule(
    index: usize,
    rule: &Arc<dyn Rule>,
    document: &Arc<dyn DocumentModel>,
    token: &CancellationToken,
    tx: &Sender<(usize, Outcome)>,
) -> std::result::Result<(), String> {
    let rule = Arc::clone(rule);
    let document = Arc::clone(document);
    let token = token.clone();
    let tx = tx.clone();

    thread::Builder::new()
        .name(format!("a11y-rule-{}", rule.id()))
        .spawn(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                let ctx = AuditContext::new(document.as_ref(), &token);
                rule.check(&ctx)
            }))
            .map_err(panic_message);
            // The receiver is gone once the engine has given up on this rule
            let _ = tx.send((index, outcome));
        })
        .map(|_| ())
        .map_err(|e| format!("worker failed to start: {}", e))
}

fn settle(rule: &Arc<dyn Rule>, outcome: Outcome) -> Vec<Finding> {
    match outcome {
        Ok(findings) => {
            debug!("Rule {} produced {} finding(s)", rule.id(), findings.len());
            findings
        }
        Err(message) => {
            warn!("Rule {} panicked: {}", rule.id(), message);
            vec![Finding::rule_skipped(rule.id(), &format!("panicked: {}", message))]
        }
    }
}

fn timed_out(rule: &Arc<dyn Rule>, timeout: Duration) -> Finding {
    warn!("Rule {} exceeded {}ms", rule.id(), timeout.as_millis());
    Finding::rule_skipped(rule.id(), &format!("timed out after {}ms", timeout.as_millis()))
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finding::Severity;
    use crate::html::HtmlDocument;
    use chrono::TimeZone;

    struct PanickingRule;

    impl Rule for PanickingRule {
        fn id(&self) -> &str {
            "always-panics"
        }
        fn category(&self) -> &str {
            "Test"
        }
        fn description(&self) -> &str {
            "Panics on every document"
        }
        fn default_severity(&self) -> Severity {
            Severity::High
        }
        fn check(&self, _ctx: &AuditContext<'_>) -> Vec<Finding> {
            panic!("boom")
        }
    }

    /// Spins until cancelled
    struct SlowRule;

    impl Rule for SlowRule {
        fn id(&self) -> &str {
            "slow"
        }
        fn category(&self) -> &str {
            "Test"
        }
        fn description(&self) -> &str {
            "Never finishes on its own"
        }
        fn default_severity(&self) -> Severity {
            Severity::Low
        }
        fn check(&self, ctx: &AuditContext<'_>) -> Vec<Finding> {
            while !ctx.is_cancelled() {
                thread::sleep(Duration::from_millis(5));
            }
            vec![Finding::new("slow", Severity::Low, "late")]
        }
    }

    /// Cancels the run from inside, then keeps walking
    struct CancellingRule(CancellationToken);

    impl Rule for CancellingRule {
        fn id(&self) -> &str {
            "cancelling"
        }
        fn category(&self) -> &str {
            "Test"
        }
        fn description(&self) -> &str {
            "Cancels the run after the first node"
        }
        fn default_severity(&self) -> Severity {
            Severity::Low
        }
        fn check(&self, ctx: &AuditContext<'_>) -> Vec<Finding> {
            let mut findings = Vec::new();
            for node in ctx.nodes() {
                findings.push(Finding::new("cancelling", Severity::Low, node.tag()));
                self.0.cancel();
            }
            findings
        }
    }

    fn document(html: &str) -> Arc<dyn DocumentModel> {
        Arc::new(HtmlDocument::parse("test.html", html))
    }

    fn pinned() -> AuditOptions {
        AuditOptions::default().with_timestamp(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
    }

    const PAGE: &str = r#"<html><body>
        <h1>Title</h1><h3>Skipped</h3>
        <img src="a.png">
        <input type="text" placeholder="Name">
        <div role="bogus" aria-labelledby="nowhere" tabindex="3">x</div>
    </body></html>"#;

    #[test]
    fn test_default_options() {
        let options = AuditOptions::default();
        assert_eq!(options.per_rule_timeout, Duration::from_millis(5000));
        assert!(options.concurrency);
        assert!(options.rules.is_none());
    }

    #[test]
    fn test_unknown_rule_rejected() {
        let engine = Engine::with_defaults();
        let options = AuditOptions::default().with_rules(["alt-text", "no-such-rule"]);
        match engine.run_audit(document(PAGE), &options) {
            Err(AuditError::UnknownRule(id)) => assert_eq!(id, "no-such-rule"),
            other => panic!("expected UnknownRule, got {:?}", other.map(|r| r.summary())),
        }
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let engine = Engine::with_defaults();
        let options = AuditOptions::default().with_timeout(Duration::ZERO);
        assert!(matches!(
            engine.run_audit(document(PAGE), &options),
            Err(AuditError::InvalidOptions(_))
        ));
    }

    #[test]
    fn test_batches_follow_registry_order() {
        let engine = Engine::with_defaults();
        let options = pinned().with_rules(["aria-attributes", "alt-text"]);
        let report = engine.run_audit(document(PAGE), &options).unwrap();
        let ids: Vec<_> = report.batches().iter().map(|b| b.rule_id.as_str()).collect();
        assert_eq!(ids, ["alt-text", "aria-attributes"]);
    }

    #[test]
    fn test_concurrent_matches_sequential() {
        let engine = Engine::with_defaults();
        let doc = document(PAGE);
        let concurrent = engine.run_audit(Arc::clone(&doc), &pinned()).unwrap();
        let sequential = engine.run_audit(doc, &pinned().sequential()).unwrap();
        assert_eq!(concurrent.to_json().unwrap(), sequential.to_json().unwrap());
        assert!(concurrent.summary().total > 0);
    }

    #[test]
    fn test_panicking_rule_is_contained() {
        let mut registry = RuleRegistry::with_defaults();
        registry.register(Arc::new(PanickingRule));
        let engine = Engine::new(registry);

        for options in [pinned(), pinned().sequential()] {
            let report = engine.run_audit(document(PAGE), &options).unwrap();
            let skipped: Vec<_> = report.findings().filter(|f| f.is_skip_marker()).collect();
            assert_eq!(skipped.len(), 1);
            assert_eq!(skipped[0].rule_id, "always-panics");
            assert_eq!(skipped[0].severity, Severity::Low);
            assert_eq!(skipped[0].message, "rule skipped: panicked: boom");
            assert!(!report.batch("alt-text").unwrap().is_empty());
            assert!(!report.is_incomplete());
        }
    }

    #[test]
    fn test_slow_rule_times_out() {
        let mut registry = RuleRegistry::with_defaults();
        registry.register(Arc::new(SlowRule));
        let engine = Engine::new(registry);

        for options in [pinned(), pinned().sequential()] {
            let options = options.with_timeout(Duration::from_millis(50));
            let report = engine.run_audit(document(PAGE), &options).unwrap();
            let batch = report.batch("slow").unwrap();
            assert_eq!(batch.len(), 1);
            assert_eq!(batch.findings[0].message, "rule skipped: timed out after 50ms");
            assert!(batch.findings[0].is_skip_marker());
            assert!(!report.batch("alt-text").unwrap().is_empty());
            assert!(!report.is_incomplete());
        }
    }

    #[test]
    fn test_pre_cancelled_run_is_incomplete() {
        let engine = Engine::with_defaults();
        let token = CancellationToken::new();
        token.cancel();
        let report = engine
            .run_audit(document(PAGE), &pinned().with_cancellation(token))
            .unwrap();
        assert!(report.is_incomplete());
        assert_eq!(report.summary().total, 0);
        assert_eq!(report.batches().len(), engine.registry().len());
    }

    #[test]
    fn test_cancel_mid_run_returns_partial_results() {
        let token = CancellationToken::new();
        let mut registry = RuleRegistry::empty();
        registry.register(Arc::new(CancellingRule(token.clone())));
        let engine = Engine::new(registry);

        let report = engine
            .run_audit(document(PAGE), &pinned().with_cancellation(token))
            .unwrap();
        assert!(report.is_incomplete());
        assert_eq!(report.summary().total, 1);
        assert_eq!(report.findings().next().unwrap().message, "html");
    }

    #[test]
    fn test_empty_registry_gives_empty_report() {
        let engine = Engine::new(RuleRegistry::empty());
        let report = engine.run_audit(document(PAGE), &pinned()).unwrap();
        assert!(report.batches().is_empty());
        assert_eq!(report.summary().total, 0);
    }
}
