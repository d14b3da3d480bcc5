//! Conformance report types: verdicts, evidence records, and aggregation.

use serde::Serialize;

/// Outcome of one rule invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Verdict {
    /// The service behaved as the rule requires.
    Pass,
    /// The service violated the behavior the rule checks.
    Fail,
    /// The rule could not be applied to this service (no qualifying
    /// resource, or the tested feature is not supported).
    Inconclusive,
}

impl Verdict {
    /// Returns the fixed label used in printed reports.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Pass => "PASS",
            Verdict::Fail => "FAIL",
            Verdict::Inconclusive => "INCONCLUSIVE",
        }
    }

    /// Returns true if this verdict represents a failure.
    #[must_use]
    pub fn is_fail(self) -> bool {
        self == Verdict::Fail
    }
}

/// One request/response exchange (or a bare diagnostic) recorded as rule
/// evidence.
///
/// A record with a non-empty `error` always belongs to a non-pass verdict.
#[derive(Debug, Clone, Serialize)]
pub struct HttpExchangeRecord {
    /// Name of the rule that produced this record.
    pub rule: String,
    /// HTTP method of the attempted request, when one was issued.
    pub method: Option<String>,
    /// URL of the attempted request, when one was issued.
    pub url: Option<String>,
    /// Serialized request body, if the request carried one.
    pub request_body: Option<String>,
    /// HTTP status of the response, when one arrived.
    pub response_status: Option<u16>,
    /// Response body, when one arrived.
    pub response_body: Option<String>,
    /// Human-readable diagnostic for a failed or aborted stage.
    pub error: Option<String>,
}

impl HttpExchangeRecord {
    /// Creates a record for a request about to be issued.
    pub fn exchange(
        rule: impl Into<String>,
        method: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            rule: rule.into(),
            method: Some(method.into()),
            url: Some(url.into()),
            request_body: None,
            response_status: None,
            response_body: None,
            error: None,
        }
    }

    /// Creates a diagnostic-only record (no request was issued).
    pub fn diagnostic(rule: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            rule: rule.into(),
            method: None,
            url: None,
            request_body: None,
            response_status: None,
            response_body: None,
            error: Some(message.into()),
        }
    }

    /// Copies status and body out of a response into this record.
    pub fn record_response(&mut self, status: u16, body: &str) {
        self.response_status = Some(status);
        self.response_body = Some(body.to_owned());
    }

    /// Returns true if the record carries neither a response nor an error —
    /// an unused placeholder that is dropped before reporting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.response_status.is_none() && self.error.is_none()
    }
}

/// Report for one rule invocation: the verdict plus ordered evidence.
#[derive(Debug, Clone, Serialize)]
pub struct RuleReport {
    /// Name of the rule.
    pub rule: String,
    /// Tri-state outcome.
    pub verdict: Verdict,
    /// Root URL of the service the rule ran against.
    pub service_root: String,
    /// Evidence records, in stage-execution order; empty placeholders are
    /// dropped on construction.
    pub details: Vec<HttpExchangeRecord>,
}

impl RuleReport {
    /// Assembles a report, dropping empty placeholder records.
    pub fn from_parts(
        rule: impl Into<String>,
        service_root: impl Into<String>,
        verdict: Verdict,
        details: Vec<HttpExchangeRecord>,
    ) -> Self {
        Self {
            rule: rule.into(),
            verdict,
            service_root: service_root.into(),
            details: details.into_iter().filter(|d| !d.is_empty()).collect(),
        }
    }

    /// Returns true if this rule failed.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.verdict.is_fail()
    }
}

/// Aggregated report across all executed rules.
#[derive(Debug, Default, Serialize)]
pub struct ConformanceReport {
    /// One report per executed rule, in registry order.
    pub reports: Vec<RuleReport>,
}

impl ConformanceReport {
    /// Creates a new empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a rule report.
    pub fn push(&mut self, report: RuleReport) {
        self.reports.push(report);
    }

    /// Returns the count of failed rules.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.reports.iter().filter(|r| r.is_failure()).count()
    }

    /// Returns true if no rule failed (inconclusive rules do not count as
    /// failures).
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failure_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_placeholders_are_dropped_on_assembly() {
        let placeholder = HttpExchangeRecord::exchange("r", "GET", "http://x/");
        let mut kept = HttpExchangeRecord::exchange("r", "POST", "http://x/");
        kept.record_response(201, "created");

        let report =
            RuleReport::from_parts("r", "http://x/", Verdict::Pass, vec![placeholder, kept]);
        assert_eq!(report.details.len(), 1);
        assert_eq!(report.details[0].response_status, Some(201));
    }

    #[test]
    fn inconclusive_rules_do_not_fail_the_report() {
        let mut report = ConformanceReport::new();
        report.push(RuleReport::from_parts(
            "a",
            "http://x/",
            Verdict::Inconclusive,
            vec![HttpExchangeRecord::diagnostic("a", "not applicable")],
        ));
        assert!(report.all_passed());

        report.push(RuleReport::from_parts(
            "b",
            "http://x/",
            Verdict::Fail,
            Vec::new(),
        ));
        assert_eq!(report.failure_count(), 1);
        assert!(!report.all_passed());
    }
}
