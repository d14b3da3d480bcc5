//! Metadata inventory rule.
//!
//! Checks that the service's metadata document declares a usable entity
//! container: at least one entity set, each referencing a declared entity
//! type. Runs first so a service with unusable metadata reports one clear
//! failure instead of a string of inconclusive probes.

use anyhow::Result;

use crate::context::{RuleContext, ServiceVersion};
use crate::report::{HttpExchangeRecord, RuleReport, Verdict};
use crate::rules::Rule;

const RULE_NAME: &str = "metadata/entity-container";

/// The metadata document declares a non-empty, internally consistent
/// entity container.
pub struct EntityContainerDeclared;

impl Rule for EntityContainerDeclared {
    fn name(&self) -> &'static str {
        RULE_NAME
    }

    fn description(&self) -> &'static str {
        "The metadata document declares at least one entity set whose entity type is defined"
    }

    fn applies_to(&self, _version: ServiceVersion) -> bool {
        true
    }

    fn verify(&self, ctx: &RuleContext) -> Result<RuleReport> {
        let root = ctx.service_root.as_str();

        if ctx.metadata.entity_sets.is_empty() {
            return Ok(RuleReport::from_parts(
                RULE_NAME,
                root,
                Verdict::Fail,
                vec![HttpExchangeRecord::diagnostic(
                    RULE_NAME,
                    "the entity container declares no entity sets",
                )],
            ));
        }

        let dangling: Vec<String> = ctx
            .metadata
            .entity_sets
            .iter()
            .filter(|set| {
                !ctx.metadata
                    .entity_types
                    .iter()
                    .any(|t| t.name == set.entity_type)
            })
            .map(|set| format!("{} -> {}", set.name, set.entity_type))
            .collect();

        if dangling.is_empty() {
            Ok(RuleReport::from_parts(RULE_NAME, root, Verdict::Pass, Vec::new()))
        } else {
            Ok(RuleReport::from_parts(
                RULE_NAME,
                root,
                Verdict::Fail,
                vec![HttpExchangeRecord::diagnostic(
                    RULE_NAME,
                    format!(
                        "entity set(s) reference undeclared entity types: {}",
                        dangling.join(", ")
                    ),
                )],
            ))
        }
    }
}
