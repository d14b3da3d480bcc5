//! Conformance rules and their static registry.
//!
//! Every rule implements [`Rule`] and is registered explicitly in
//! [`registry`]; the host iterates the list in order and skips rules that do
//! not apply to the service's protocol version.

use anyhow::Result;

use crate::context::{RuleContext, ServiceVersion};
use crate::report::RuleReport;

pub mod batch;
pub mod service_metadata;

/// One conformance rule.
pub trait Rule {
    /// Stable rule identifier (e.g., `"batch/changeset-response-format"`).
    fn name(&self) -> &'static str;

    /// One-line description of the behavior the rule checks.
    fn description(&self) -> &'static str;

    /// Returns true if the rule applies to services of `version`.
    fn applies_to(&self, version: ServiceVersion) -> bool;

    /// Runs the rule against the service described by `ctx`.
    ///
    /// # Errors
    ///
    /// Network and protocol failures are folded into the returned report's
    /// evidence; an `Err` only signals a host-level programming error.
    fn verify(&self, ctx: &RuleContext) -> Result<RuleReport>;
}

/// Returns all registered rules, in execution order.
#[must_use]
pub fn registry() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(service_metadata::EntityContainerDeclared),
        Box::new(batch::ChangeSetResponseFormat),
    ]
}
