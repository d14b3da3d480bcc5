//! Per-run rule context.
//!
//! Everything a rule reads is constructed once by the host and threaded
//! through as an explicit parameter; rules hold no global state.

use url::Url;

use odata_edm::ServiceMetadata;

use crate::http::HttpTransport;

/// Protocol version of the service under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceVersion {
    /// OData version 3.
    V3,
    /// OData version 4.
    V4,
}

/// Immutable context handed to every rule invocation.
pub struct RuleContext {
    /// Root URL of the service under test.
    pub service_root: Url,
    /// Raw service document body, kept for host-side reporting.
    pub service_document: String,
    /// Protocol version the host detected for the service.
    pub version: ServiceVersion,
    /// Parsed `$metadata` for the service.
    pub metadata: ServiceMetadata,
    /// Transport used for every probe the rules issue.
    pub transport: Box<dyn HttpTransport>,
}

impl RuleContext {
    /// Creates a context for one conformance run.
    #[must_use]
    pub fn new(
        service_root: Url,
        service_document: String,
        version: ServiceVersion,
        metadata: ServiceMetadata,
        transport: Box<dyn HttpTransport>,
    ) -> Self {
        Self {
            service_root,
            service_document,
            version,
            metadata,
            transport,
        }
    }
}
