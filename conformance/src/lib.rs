//! OData conformance rules.
//!
//! This crate implements conformance checks that probe a live OData service
//! and report a tri-state verdict per rule, with the request/response
//! evidence that justifies it.
//!
//! # Rules
//!
//! | Rule | Checks |
//! |------|--------|
//! | `metadata/entity-container` | The metadata document declares a usable entity container |
//! | `batch/changeset-response-format` | Change-set responses are wrapped as `application/http` with binary transfer encoding |
//!
//! # Entry Point
//!
//! ```no_run
//! use std::time::Duration;
//! use odata_conformance::context::{RuleContext, ServiceVersion};
//! use odata_conformance::http::ReqwestTransport;
//! use odata_conformance::run_all;
//!
//! let root = url::Url::parse("https://services.example.org/V4/Demo/").expect("valid URL");
//! let transport = ReqwestTransport::new(Duration::from_secs(30)).expect("client");
//! let metadata = odata_edm::edmx::parse("...").expect("metadata");
//! let ctx = RuleContext::new(
//!     root,
//!     String::new(),
//!     ServiceVersion::V4,
//!     metadata,
//!     Box::new(transport),
//! );
//! let report = run_all(&ctx).expect("conformance run");
//! assert!(report.all_passed());
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

pub mod context;
pub mod http;
pub mod report;
pub mod rules;
pub mod synth;

pub use context::{RuleContext, ServiceVersion};
pub use report::{ConformanceReport, HttpExchangeRecord, RuleReport, Verdict};

/// Runs every registered rule that applies to the service's protocol
/// version and aggregates their reports in registry order.
///
/// # Errors
///
/// Returns an error only for host-level programming errors; every protocol
/// outcome — including unreachable services — lands in a rule's report.
pub fn run_all(ctx: &RuleContext) -> anyhow::Result<ConformanceReport> {
    let mut report = ConformanceReport::new();
    for rule in rules::registry() {
        if !rule.applies_to(ctx.version) {
            continue;
        }
        report.push(rule.verify(ctx)?);
    }
    Ok(report)
}

#[cfg(test)]
mod tests_unit {
    use super::*;

    #[test]
    fn registry_is_assembled_in_execution_order() {
        let rules = rules::registry();
        let names: Vec<&str> = rules.iter().map(|r| r.name()).collect();
        assert_eq!(
            names,
            vec!["metadata/entity-container", "batch/changeset-response-format"]
        );
    }

    #[test]
    fn batch_rule_applies_to_v4_only() {
        let rules = rules::registry();
        let batch = &rules[1];
        assert!(batch.applies_to(ServiceVersion::V4));
        assert!(!batch.applies_to(ServiceVersion::V3));
    }
}
