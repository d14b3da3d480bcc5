//! Protocol driver for the batch change-set response format rule.
//!
//! Drives one strictly sequential probe against the service: create an
//! entity, read it back, PATCH it inside a batched change-set, inspect the
//! raw multipart response, delete the entity. Every step either continues
//! or settles the verdict early; cleanup runs for everything the probe
//! created no matter where the run stopped.

use anyhow::Result;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use odata_edm::{entity_set_url, Property};

use crate::context::{RuleContext, ServiceVersion};
use crate::http::HttpResponse;
use crate::report::{HttpExchangeRecord, RuleReport, Verdict};
use crate::rules::Rule;
use crate::synth;

use super::payload::{self, BATCH_BOUNDARY};
use super::select::{select_candidate, Selection};
use super::shape::{self, ShapeCheck, CHANGESET_RESPONSE_DELIMITER, EXPECTED_SHAPE};

const RULE_NAME: &str = "batch/changeset-response-format";

/// Key-property types a probe target may use.
const ACCEPTED_KEY_TYPES: &[&str] = &["Edm.Int32", "Edm.Int64", "Edm.Guid", "Edm.String"];
/// Normal-property types the probe may update.
const ACCEPTED_NORMAL_TYPES: &[&str] = &["Edm.String"];

/// Identity of one entity the probe created on the service.
///
/// Exactly one entry exists per successfully created entity; cleanup
/// attempts a delete for every entry regardless of how the run ended.
struct AdditionalInfo {
    entity_id: String,
    has_etag: bool,
}

/// Checks that a change-set response inside a batch response is wrapped as
/// `application/http` with `Content-Transfer-Encoding: binary` rather than
/// falling back to plain `multipart/mixed` framing.
pub struct ChangeSetResponseFormat;

impl Rule for ChangeSetResponseFormat {
    fn name(&self) -> &'static str {
        RULE_NAME
    }

    fn description(&self) -> &'static str {
        "Change-set responses inside a batch response are wrapped as application/http \
         with Content-Transfer-Encoding: binary"
    }

    fn applies_to(&self, version: ServiceVersion) -> bool {
        matches!(version, ServiceVersion::V4)
    }

    fn verify(&self, ctx: &RuleContext) -> Result<RuleReport> {
        let mut created: Vec<AdditionalInfo> = Vec::new();
        let report = run(ctx, &mut created);
        cleanup(ctx, &created);
        Ok(report)
    }
}

/// Runs the probe sequence up to (but not including) cleanup.
fn run(ctx: &RuleContext, created: &mut Vec<AdditionalInfo>) -> RuleReport {
    let root = ctx.service_root.as_str();

    // SelectingResource
    let candidate =
        match select_candidate(&ctx.metadata, ACCEPTED_KEY_TYPES, ACCEPTED_NORMAL_TYPES) {
            Selection::Selected(candidate) => candidate,
            Selection::NoQualifyingType => {
                return inconclusive(
                    root,
                    "no entity type qualifies for the batch change-set probe",
                    Vec::new(),
                );
            }
            Selection::NoBatchSupport => {
                return inconclusive(root, "service does not support batch operation", Vec::new());
            }
        };

    let set_url = match entity_set_url(&ctx.service_root, &candidate.set_name) {
        Ok(url) => url,
        Err(e) => {
            return inconclusive(
                root,
                format!(
                    "URL of entity set {} could not be resolved: {e}",
                    candidate.set_name
                ),
                Vec::new(),
            );
        }
    };

    // CreatingEntity
    let insert_document = synth::insert_payload(candidate.entity_type).to_string();
    let mut create_record = HttpExchangeRecord::exchange(RULE_NAME, "POST", set_url.as_str());
    create_record.request_body = Some(insert_document.clone());
    debug!(rule = RULE_NAME, set = %candidate.set_name, "creating probe entity");

    let create_response = match ctx.transport.create(set_url.as_str(), &[], &insert_document) {
        Ok(response) => response,
        Err(e) => {
            create_record.error = Some(format!("entity creation request failed: {e:#}"));
            return RuleReport::from_parts(
                RULE_NAME,
                root,
                Verdict::Inconclusive,
                vec![create_record],
            );
        }
    };
    create_record.record_response(create_response.status, &create_response.body);

    if create_response.status != 201 {
        create_record.error = Some("entity creation did not return 201 Created".to_owned());
        return RuleReport::from_parts(RULE_NAME, root, Verdict::Fail, vec![create_record]);
    }

    let Some(entity_id) = resolve_entity_id(&ctx.service_root, &create_response) else {
        create_record.error = Some(
            "created entity id could not be resolved from the Location header or response body"
                .to_owned(),
        );
        return RuleReport::from_parts(
            RULE_NAME,
            root,
            Verdict::Inconclusive,
            vec![create_record],
        );
    };
    created.push(AdditionalInfo {
        entity_id: entity_id.clone(),
        has_etag: create_response.etag.is_some(),
    });

    // FetchingCreatedEntity
    let fetch_response = match ctx.transport.get(&entity_id) {
        Ok(response) => response,
        Err(e) => {
            return inconclusive(
                root,
                format!("created entity could not be read back: {e:#}"),
                vec![create_record],
            );
        }
    };
    if fetch_response.status != 200 {
        return inconclusive(
            root,
            "created entity could not be read back (expected 200 OK)",
            vec![create_record],
        );
    }
    let entity: Value = match serde_json::from_str(&fetch_response.body) {
        Ok(value) => value,
        Err(e) => {
            return inconclusive(
                root,
                format!("created entity payload is not valid JSON: {e}"),
                vec![create_record],
            );
        }
    };

    let has_etag = create_response.etag.is_some() || entity.get("@odata.etag").is_some();
    if let Some(info) = created.last_mut() {
        info.has_etag = has_etag;
    }

    // BuildingUpdate
    let updatable: Vec<&Property> = candidate
        .entity_type
        .properties
        .iter()
        .filter(|p| ACCEPTED_NORMAL_TYPES.contains(&p.type_name.as_str()))
        .collect();
    let update_document = synth::update_payload(&entity, &updatable);
    if update_document
        .as_object()
        .map(serde_json::Map::is_empty)
        .unwrap_or(true)
    {
        return inconclusive(
            root,
            "the created entity exposes no updatable property of an accepted type",
            vec![create_record],
        );
    }

    // SendingBatch
    let batch_url = match entity_set_url(&ctx.service_root, "$batch") {
        Ok(url) => url,
        Err(e) => {
            return inconclusive(
                root,
                format!("$batch URL could not be resolved: {e}"),
                vec![create_record],
            );
        }
    };
    let batch_body =
        payload::build_update_batch(&entity_id, &update_document.to_string(), has_etag);
    let mut batch_record = HttpExchangeRecord::exchange(RULE_NAME, "POST", batch_url.as_str());
    batch_record.request_body = Some(batch_body.clone());
    debug!(rule = RULE_NAME, entity = %entity_id, "sending batched change-set update");

    let batch_response = match ctx
        .transport
        .post_batch(batch_url.as_str(), BATCH_BOUNDARY, &batch_body)
    {
        Ok(response) => response,
        Err(e) => {
            batch_record.error = Some(format!("batch request failed: {e:#}"));
            return RuleReport::from_parts(
                RULE_NAME,
                root,
                Verdict::Inconclusive,
                vec![create_record, batch_record],
            );
        }
    };
    batch_record.record_response(batch_response.status, &batch_response.body);

    if batch_response.status != 200 {
        batch_record.error = Some("service did not return 200 OK for the batch request".to_owned());
        return RuleReport::from_parts(
            RULE_NAME,
            root,
            Verdict::Fail,
            vec![create_record, batch_record],
        );
    }

    // VerifyingResponse
    match shape::verify_shape(&batch_response.body) {
        ShapeCheck::Match => RuleReport::from_parts(
            RULE_NAME,
            root,
            Verdict::Pass,
            vec![create_record, batch_record],
        ),
        ShapeCheck::Mismatch { normalized } => {
            batch_record.error = Some(format!(
                "change-set response is not wrapped as application/http with binary transfer \
                 encoding; expected:\n{EXPECTED_SHAPE}\nobserved:\n{normalized}"
            ));
            RuleReport::from_parts(
                RULE_NAME,
                root,
                Verdict::Fail,
                vec![create_record, batch_record],
            )
        }
        ShapeCheck::MissingDelimiter => {
            batch_record.error = Some(format!(
                "batch response contains no change-set response delimiter \
                 ({CHANGESET_RESPONSE_DELIMITER})"
            ));
            RuleReport::from_parts(
                RULE_NAME,
                root,
                Verdict::Fail,
                vec![create_record, batch_record],
            )
        }
    }
}

/// Deletes every entity the probe created, best-effort.
///
/// Failure to delete never changes the verdict; it is only logged.
fn cleanup(ctx: &RuleContext, created: &[AdditionalInfo]) {
    for info in created {
        let headers: Vec<(&str, &str)> = if info.has_etag {
            vec![("If-Match", "*")]
        } else {
            Vec::new()
        };
        match ctx.transport.delete(&info.entity_id, &headers) {
            Ok(response) if matches!(response.status, 200 | 202 | 204) => {
                debug!(rule = RULE_NAME, entity = %info.entity_id, "probe entity deleted");
            }
            Ok(response) => {
                warn!(
                    rule = RULE_NAME,
                    entity = %info.entity_id,
                    status = response.status,
                    "probe entity may not have been deleted"
                );
            }
            Err(e) => {
                warn!(
                    rule = RULE_NAME,
                    entity = %info.entity_id,
                    error = %e,
                    "probe entity delete failed"
                );
            }
        }
    }
}

/// Resolves the created entity's addressable id from the `Location` header,
/// falling back to the id annotations of the response body. Relative ids
/// are absolutized against the service root.
fn resolve_entity_id(root: &Url, response: &HttpResponse) -> Option<String> {
    let raw = response.location.clone().or_else(|| {
        let body: Value = serde_json::from_str(&response.body).ok()?;
        body.get("@odata.id")
            .or_else(|| body.get("@odata.editLink"))
            .and_then(Value::as_str)
            .map(str::to_owned)
    })?;

    if raw.starts_with("http://") || raw.starts_with("https://") {
        Some(raw)
    } else {
        entity_set_url(root, &raw).ok().map(String::from)
    }
}

/// Builds an inconclusive report from the records collected so far plus a
/// closing diagnostic.
fn inconclusive(
    root: &str,
    message: impl Into<String>,
    mut records: Vec<HttpExchangeRecord>,
) -> RuleReport {
    records.push(HttpExchangeRecord::diagnostic(RULE_NAME, message));
    RuleReport::from_parts(RULE_NAME, root, Verdict::Inconclusive, records)
}
