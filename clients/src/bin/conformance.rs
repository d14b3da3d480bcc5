//! `odata-conformance` — Runs the OData conformance rule registry against a
//! live service.
//!
//! Fetches the service document and `$metadata`, builds the rule context,
//! executes every applicable rule, and prints a verdict-per-rule report with
//! the request/response evidence behind each non-pass verdict.
//!
//! **Usage:**
//! ```
//! odata-conformance --service-root <url> [--timeout-secs <n>] [--json]
//! ```
//!
//! Exits non-zero if any rule fails. Inconclusive rules (feature not
//! supported by the service) do not fail the run.

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

use std::process;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use url::Url;

use odata_conformance::context::{RuleContext, ServiceVersion};
use odata_conformance::http::{HttpTransport, ReqwestTransport};
use odata_conformance::report::Verdict;
use odata_conformance::run_all;

/// Run the OData conformance rule suite against a service.
#[derive(Parser)]
#[command(
    name = "odata-conformance",
    about = "Probe a live OData service for protocol conformance"
)]
struct Args {
    /// Root URL of the service under test.
    #[arg(long)]
    service_root: String,

    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Emit the report as JSON instead of text.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let service_root =
        Url::parse(&args.service_root).context("--service-root is not a valid URL")?;
    let transport = ReqwestTransport::new(Duration::from_secs(args.timeout_secs))?;

    let service_document = fetch_required(&transport, service_root.as_str(), "service document")?;
    let metadata_url = odata_edm::entity_set_url(&service_root, "$metadata")
        .context("could not resolve the $metadata URL")?;
    let metadata_xml = fetch_required(&transport, metadata_url.as_str(), "$metadata document")?;
    let metadata =
        odata_edm::edmx::parse(&metadata_xml).context("could not parse the $metadata document")?;

    let ctx = RuleContext::new(
        service_root,
        service_document,
        ServiceVersion::V4,
        metadata,
        Box::new(transport),
    );
    let report = run_all(&ctx)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&ctx, &report);
    }

    if !report.all_passed() {
        eprintln!(
            "Conformance FAILED: {} rule(s) did not pass.",
            report.failure_count()
        );
        process::exit(1);
    }
    Ok(())
}

/// Fetches a document the run cannot proceed without.
fn fetch_required(transport: &ReqwestTransport, url: &str, what: &str) -> Result<String> {
    let response = transport
        .get(url)
        .with_context(|| format!("could not fetch the {what}"))?;
    if response.status != 200 {
        bail!("{what} request returned {} (expected 200)", response.status);
    }
    Ok(response.body)
}

/// Prints the human-readable report.
fn print_report(ctx: &RuleContext, report: &odata_conformance::ConformanceReport) {
    println!("OData Conformance Report — {}", ctx.service_root);
    println!("=================================================");
    println!();

    let mut passed = 0usize;
    let mut failed = 0usize;
    let mut inconclusive = 0usize;

    for rule_report in &report.reports {
        match rule_report.verdict {
            Verdict::Pass => passed += 1,
            Verdict::Fail => failed += 1,
            Verdict::Inconclusive => inconclusive += 1,
        }
        println!("[{}] {}", rule_report.verdict.as_str(), rule_report.rule);
        for detail in &rule_report.details {
            if let (Some(method), Some(url)) = (&detail.method, &detail.url) {
                let status = detail
                    .response_status
                    .map_or_else(|| "no response".to_owned(), |s| s.to_string());
                println!("       {method} {url} -> {status}");
            }
            if let Some(error) = &detail.error {
                for line in error.lines() {
                    println!("       {line}");
                }
            }
        }
    }

    println!();
    println!("Summary: {passed} passed, {inconclusive} inconclusive, {failed} failed");
    if failed == 0 {
        println!("Conformance PASSED.");
    }
}
