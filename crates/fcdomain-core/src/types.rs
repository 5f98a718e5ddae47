//! Data model for the custom-domain reconciler
//!
//! Two families of types live here:
//!
//! - **Desired state**: [`DomainSpec`] and friends, declared by the caller.
//! - **Wire shapes**: the options object sent to the platform
//!   ([`DomainOptions`], PascalCase route fields) and the bindings read
//!   back from it ([`RemoteDomainBinding`], camelCase fields). The casing
//!   is part of the platform contract and is pinned with serde attributes.

use serde::{Deserialize, Serialize};

/// Sentinel domain name requesting a platform-issued temporary domain
pub const AUTO_DOMAIN: &str = "AUTO";

/// Protocols a domain binding can serve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    /// Plain HTTP
    Http,
    /// HTTP over TLS (requires a certificate config)
    Https,
}

impl Protocol {
    /// Wire representation of the protocol
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Http => "HTTP",
            Protocol::Https => "HTTPS",
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user-declared domain binding to converge the platform towards
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainSpec {
    /// Literal DNS name, or the case-insensitive sentinel `AUTO`
    pub domain_name: String,

    /// Protocols to serve, in order. Duplicates are passed through
    /// verbatim. Defaults to `[HTTP]`.
    #[serde(default = "default_protocols")]
    pub protocols: Vec<Protocol>,

    /// Route patterns; the binder supplies the target service/function
    #[serde(default)]
    pub routes: Vec<RoutePattern>,

    /// Optional TLS certificate material or file paths
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cert: Option<CertConfig>,
}

impl DomainSpec {
    /// Create a spec with default protocols and no routes
    pub fn new(domain_name: impl Into<String>) -> Self {
        Self {
            domain_name: domain_name.into(),
            protocols: default_protocols(),
            routes: Vec::new(),
            cert: None,
        }
    }

    /// Whether this spec requests an auto-assigned temporary domain
    pub fn is_auto(&self) -> bool {
        self.domain_name.eq_ignore_ascii_case(AUTO_DOMAIN)
    }
}

fn default_protocols() -> Vec<Protocol> {
    vec![Protocol::Http]
}

/// The user-declared half of a route rule
///
/// The target service and function are supplied by the binder when the
/// rule is normalized for transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutePattern {
    /// Path pattern, e.g. `/*` or `/api/*`
    pub path: String,

    /// Version or alias selector, e.g. `LATEST`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualifier: Option<String>,
}

impl RoutePattern {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            qualifier: None,
        }
    }

    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = Some(qualifier.into());
        self
    }
}

/// TLS certificate configuration
///
/// Each field is either inline PEM material, or a filesystem path ending
/// in `.pem` which the normalizer replaces with the file's contents
/// before transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertConfig {
    /// Private key material or `.pem` path
    #[serde(rename = "PrivateKey")]
    pub private_key: String,

    /// Certificate material or `.pem` path
    #[serde(rename = "Certificate")]
    pub certificate: String,
}

// ---------------------------------------------------------------------------
// Outgoing wire shapes (create/update options)
// ---------------------------------------------------------------------------

/// The options object expected by `createDomain`/`updateDomain`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainOptions {
    /// Comma-joined protocol string, input order preserved
    pub protocol: String,

    /// Route table for the binding
    #[serde(rename = "routeConfig")]
    pub route_config: RouteConfig,

    /// Certificate block; omitted entirely when absent
    #[serde(rename = "certConfig", skip_serializing_if = "Option::is_none")]
    pub cert_config: Option<WireCertConfig>,
}

/// Route table wrapper, matching the platform's `routeConfig` shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteConfig {
    /// Ordered route rules
    pub routes: Vec<WireRoute>,
}

/// A fully-resolved route rule in the platform's outgoing casing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireRoute {
    #[serde(rename = "Path")]
    pub path: String,

    #[serde(rename = "ServiceName")]
    pub service_name: String,

    #[serde(rename = "FunctionName")]
    pub function_name: String,

    #[serde(rename = "Qualifier", skip_serializing_if = "Option::is_none")]
    pub qualifier: Option<String>,
}

/// Certificate block with inline PEM material only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireCertConfig {
    #[serde(rename = "PrivateKey")]
    pub private_key: String,

    #[serde(rename = "Certificate")]
    pub certificate: String,
}

// ---------------------------------------------------------------------------
// Remote state as read back from the platform
// ---------------------------------------------------------------------------

/// A domain binding owned by the remote platform
///
/// Never cached across reconciler calls; every operation re-fetches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteDomainBinding {
    pub domain_name: String,

    #[serde(default)]
    pub protocol: Option<String>,

    #[serde(default)]
    pub route_config: Option<RemoteRouteConfig>,
}

/// Route table as read from the platform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteRouteConfig {
    #[serde(default)]
    pub routes: Vec<RemoteRoute>,
}

/// A single remote route in the platform's read casing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteRoute {
    pub path: String,
    pub service_name: String,
    pub function_name: String,
    #[serde(default)]
    pub qualifier: Option<String>,
}

impl RemoteRoute {
    /// Translate into the outgoing wire casing
    pub fn to_wire(&self) -> WireRoute {
        WireRoute {
            path: self.path.clone(),
            service_name: self.service_name.clone(),
            function_name: self.function_name.clone(),
            qualifier: self.qualifier.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Temporary-domain types
// ---------------------------------------------------------------------------

/// A resolved temporary (auto) domain
#[derive(Debug, Clone, PartialEq)]
pub struct TempDomain {
    /// Concrete platform-issued domain name (ends with the reserved suffix)
    pub domain_name: String,

    /// Route table for the binding
    pub route_config: RouteConfig,
}

/// Expiry metadata for a temporary domain, as reported by the challenge
/// service
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TempDomainExpiry {
    /// Expiry instant in epoch seconds
    #[serde(rename = "expired_time")]
    pub expired_time: i64,

    /// Remaining invocation allowance
    #[serde(rename = "times_limit")]
    pub times_limit: i64,
}

impl TempDomainExpiry {
    /// Whether the domain is still valid at `now` (epoch seconds)
    pub fn is_valid_at(&self, now: i64) -> bool {
        self.expired_time > now
    }
}

/// Handle on the three transient challenge resources
///
/// Strictly owned by a single provisioning call; created immediately
/// before the challenge round-trip and deleted immediately after.
#[derive(Debug, Clone)]
pub struct ChallengeFunctionHandle {
    pub service_name: String,
    pub function_name: String,
    pub trigger_name: String,
}

// ---------------------------------------------------------------------------
// Compute-resource definitions for the challenge function
// ---------------------------------------------------------------------------

/// Definition for a compute service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceDefinition {
    pub service_name: String,
    pub description: String,
}

/// Definition for a function within a service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub function_name: String,
    pub description: String,
    pub runtime: String,
    pub handler: String,
    /// Inline handler source; the wire client packages it for upload
    pub source: String,
}

/// Definition for an HTTP trigger on a function
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerDefinition {
    pub trigger_name: String,
    /// `anonymous` for the challenge trigger
    pub auth_type: String,
    pub methods: Vec<String>,
}
