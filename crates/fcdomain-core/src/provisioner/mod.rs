//! Temporary domain provisioner
//!
//! Resolves the `AUTO` sentinel to a concrete platform-issued domain:
//! scan existing domains for a still-valid, route-matching temporary
//! domain, and when none exists (and generation is requested), mint a
//! fresh one through the external challenge service.
//!
//! ## Challenge-function lifecycle
//!
//! Minting requires proving account ownership: a short-lived function is
//! deployed whose anonymous HTTP handler echoes a fragment of its own
//! name (the one-time token); the issuer invokes it through the
//! candidate domain before handing the name out. The three challenge
//! resources (service, function, trigger) are owned entirely by one
//! provisioning call: acquired immediately before the challenge
//! round-trip and released on every exit path, with delete failures
//! individually swallowed.

use crate::config::ReconcilerConfig;
use crate::error::Result;
use crate::events::{EventSink, ReconcilerEvent};
use crate::traits::{ChallengeService, ComputeClient};
use crate::types::{
    ChallengeFunctionHandle, FunctionDefinition, RemoteDomainBinding, RouteConfig,
    ServiceDefinition, TempDomain, TriggerDefinition, WireRoute,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Handler source for the challenge function
///
/// Echoes the one-time token back from its own function name (the name
/// minus the `fc-` prefix), letting the issuer verify that the candidate
/// domain routes to this account.
const CHALLENGE_HANDLER_SOURCE: &str = r#"'use strict';

module.exports.handler = function (request, response, context) {
  const functionName = context.function.name;

  response.setStatusCode(200);
  response.setHeader('content-type', 'application/json');
  response.send(functionName.slice(3));
};
"#;

/// Prefix for token-derived challenge function names
const CHALLENGE_FUNCTION_PREFIX: &str = "fc-";

/// HTTP methods the challenge trigger accepts
const CHALLENGE_TRIGGER_METHODS: [&str; 3] = ["GET", "POST", "PUT"];

/// Qualifier used for the default wildcard route of a fresh domain
const DEFAULT_QUALIFIER: &str = "LATEST";

/// Reuse-or-provision resolver for temporary (auto) domains
#[derive(Clone)]
pub struct TempDomainProvisioner {
    compute: Arc<dyn ComputeClient>,
    challenge: Arc<dyn ChallengeService>,
    account_id: String,
    region: String,
    temp_domain: crate::config::TempDomainConfig,
    events: EventSink,
}

impl TempDomainProvisioner {
    pub(crate) fn new(
        compute: Arc<dyn ComputeClient>,
        challenge: Arc<dyn ChallengeService>,
        config: &ReconcilerConfig,
        events: EventSink,
    ) -> Self {
        Self {
            compute,
            challenge,
            account_id: config.account_id.clone(),
            region: config.region.clone(),
            temp_domain: config.temp_domain.clone(),
            events,
        }
    }

    /// Resolve a temporary domain for the given target
    ///
    /// # Modes
    ///
    /// - **Pure lookup** (`generate_if_missing = false`): scan *all*
    ///   domains and return the first whose route table targets
    ///   `service_name`/`function_name`. Expiry is not checked and the
    ///   provisioning path is never entered.
    /// - **Provisioning** (`generate_if_missing = true`): scan only true
    ///   temporary domains (reserved suffix), skip expired matches, and
    ///   mint a fresh domain when no valid match exists.
    ///
    /// # Returns
    ///
    /// `Ok(None)` when no match exists (lookup mode) or issuance failed
    /// (provisioning mode — the failure is logged as a warning).
    pub async fn resolve_auto_domain(
        &self,
        service_name: &str,
        function_name: &str,
        generate_if_missing: bool,
    ) -> Result<Option<TempDomain>> {
        let domains = self.compute.list_domains().await?;

        for binding in &domains {
            if generate_if_missing && !binding.domain_name.ends_with(&self.temp_domain.suffix) {
                continue;
            }

            if !route_matches(binding, service_name, function_name) {
                continue;
            }

            if !generate_if_missing {
                // First match wins; no further candidates examined
                return Ok(Some(TempDomain {
                    domain_name: binding.domain_name.clone(),
                    route_config: translated_routes(binding),
                }));
            }

            let expiry = self.challenge.expiry(&binding.domain_name).await?;
            let now = chrono::Utc::now().timestamp();
            if expiry.is_valid_at(now) {
                info!("Reusing temporary domain: {}", binding.domain_name);
                self.events.emit(ReconcilerEvent::TempDomainReused {
                    domain_name: binding.domain_name.clone(),
                });
                return Ok(Some(TempDomain {
                    domain_name: binding.domain_name.clone(),
                    route_config: translated_routes(binding),
                }));
            }

            debug!(
                "Temporary domain {} expired at {}, continuing scan",
                binding.domain_name, expiry.expired_time
            );
        }

        if !generate_if_missing {
            return Ok(None);
        }

        self.provision_fresh(service_name, function_name).await
    }

    /// Mint a fresh temporary domain via the challenge service
    ///
    /// Issuance failure is not fatal for the batch: it is logged as a
    /// warning and reported as `Ok(None)`.
    async fn provision_fresh(
        &self,
        service_name: &str,
        function_name: &str,
    ) -> Result<Option<TempDomain>> {
        info!("Provisioning a fresh temporary domain");

        let token = match self
            .challenge
            .request_token(&self.account_id, &self.region)
            .await
        {
            Ok(token) => token,
            Err(err) => {
                warn!("Failed to obtain challenge token: {}", err);
                self.events.emit(ReconcilerEvent::ProvisioningFailed {
                    error: err.to_string(),
                });
                return Ok(None);
            }
        };

        let handle = self.deploy_challenge_function(&token).await;

        let result = self
            .challenge
            .request_domain(&self.account_id, &self.region, &token)
            .await;

        // The challenge resources never outlive this call, success or
        // failure.
        self.remove_challenge_function(&handle).await;

        match result {
            Ok(domain_name) => {
                info!("Provisioned temporary domain: {}", domain_name);
                self.events.emit(ReconcilerEvent::TempDomainProvisioned {
                    domain_name: domain_name.clone(),
                });
                Ok(Some(TempDomain {
                    domain_name,
                    route_config: default_route_config(service_name, function_name),
                }))
            }
            Err(err) => {
                warn!("Failed to obtain temporary domain: {}", err);
                self.events.emit(ReconcilerEvent::ProvisioningFailed {
                    error: err.to_string(),
                });
                Ok(None)
            }
        }
    }

    /// Deploy the ephemeral challenge service/function/trigger
    ///
    /// Creation failures are individually swallowed: the service may
    /// survive from an interrupted earlier run, and the challenge
    /// round-trip itself will reveal a function that truly failed to
    /// deploy.
    async fn deploy_challenge_function(&self, token: &str) -> ChallengeFunctionHandle {
        let handle = ChallengeFunctionHandle {
            service_name: self.temp_domain.service_name.clone(),
            function_name: format!("{CHALLENGE_FUNCTION_PREFIX}{token}"),
            trigger_name: self.temp_domain.trigger_name.clone(),
        };

        debug!("Deploying challenge function {}", handle.function_name);

        if let Err(err) = self
            .compute
            .create_service(&ServiceDefinition {
                service_name: handle.service_name.clone(),
                description: "generated for temporary-domain authentication".to_string(),
            })
            .await
        {
            debug!("Challenge service creation skipped: {}", err);
        }

        if let Err(err) = self
            .compute
            .create_function(
                &handle.service_name,
                &FunctionDefinition {
                    function_name: handle.function_name.clone(),
                    description: "used by the temporary domain service to authenticate"
                        .to_string(),
                    runtime: self.temp_domain.runtime.clone(),
                    handler: self.temp_domain.handler.clone(),
                    source: CHALLENGE_HANDLER_SOURCE.to_string(),
                },
            )
            .await
        {
            debug!("Challenge function creation skipped: {}", err);
        }

        if let Err(err) = self
            .compute
            .create_trigger(
                &handle.service_name,
                &handle.function_name,
                &TriggerDefinition {
                    trigger_name: handle.trigger_name.clone(),
                    auth_type: "anonymous".to_string(),
                    methods: CHALLENGE_TRIGGER_METHODS
                        .iter()
                        .map(|m| (*m).to_string())
                        .collect(),
                },
            )
            .await
        {
            debug!("Challenge trigger creation skipped: {}", err);
        }

        handle
    }

    /// Best-effort teardown of the challenge resources
    ///
    /// Deletion failures are individually swallowed; a leftover resource
    /// is re-deleted by the next provisioning call.
    async fn remove_challenge_function(&self, handle: &ChallengeFunctionHandle) {
        debug!("Removing challenge function {}", handle.function_name);

        if let Err(err) = self
            .compute
            .delete_trigger(
                &handle.service_name,
                &handle.function_name,
                &handle.trigger_name,
            )
            .await
        {
            debug!("Challenge trigger deletion failed: {}", err);
        }

        if let Err(err) = self
            .compute
            .delete_function(&handle.service_name, &handle.function_name)
            .await
        {
            debug!("Challenge function deletion failed: {}", err);
        }

        if let Err(err) = self.compute.delete_service(&handle.service_name).await {
            debug!("Challenge service deletion failed: {}", err);
        }
    }
}

/// Whether a binding's route table targets the given service/function
fn route_matches(binding: &RemoteDomainBinding, service_name: &str, function_name: &str) -> bool {
    binding
        .route_config
        .as_ref()
        .map(|config| {
            config
                .routes
                .iter()
                .any(|r| r.service_name == service_name && r.function_name == function_name)
        })
        .unwrap_or(false)
}

/// Translate a remote route table into the caller's route shape
fn translated_routes(binding: &RemoteDomainBinding) -> RouteConfig {
    RouteConfig {
        routes: binding
            .route_config
            .as_ref()
            .map(|config| config.routes.iter().map(|r| r.to_wire()).collect())
            .unwrap_or_default(),
    }
}

/// Default single wildcard route for a freshly minted domain
fn default_route_config(service_name: &str, function_name: &str) -> RouteConfig {
    RouteConfig {
        routes: vec![WireRoute {
            path: "/*".to_string(),
            service_name: service_name.to_string(),
            function_name: function_name.to_string(),
            qualifier: Some(DEFAULT_QUALIFIER.to_string()),
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RemoteRoute, RemoteRouteConfig};

    fn binding(name: &str, service: &str, function: &str) -> RemoteDomainBinding {
        RemoteDomainBinding {
            domain_name: name.to_string(),
            protocol: Some("HTTP".to_string()),
            route_config: Some(RemoteRouteConfig {
                routes: vec![RemoteRoute {
                    path: "/*".to_string(),
                    service_name: service.to_string(),
                    function_name: function.to_string(),
                    qualifier: Some("LATEST".to_string()),
                }],
            }),
        }
    }

    #[test]
    fn route_match_requires_both_names() {
        let b = binding("x.test.functioncompute.com", "svc", "fn");
        assert!(route_matches(&b, "svc", "fn"));
        assert!(!route_matches(&b, "svc", "other"));
        assert!(!route_matches(&b, "other", "fn"));
    }

    #[test]
    fn missing_route_config_never_matches() {
        let b = RemoteDomainBinding {
            domain_name: "x".to_string(),
            protocol: None,
            route_config: None,
        };
        assert!(!route_matches(&b, "svc", "fn"));
    }

    #[test]
    fn default_route_is_wildcard_latest() {
        let config = default_route_config("svc", "fn");
        assert_eq!(config.routes.len(), 1);
        let route = &config.routes[0];
        assert_eq!(route.path, "/*");
        assert_eq!(route.service_name, "svc");
        assert_eq!(route.function_name, "fn");
        assert_eq!(route.qualifier.as_deref(), Some("LATEST"));
    }

    #[test]
    fn challenge_handler_echoes_token_fragment() {
        // The handler strips the `fc-` prefix length from its own name
        assert!(CHALLENGE_HANDLER_SOURCE.contains("functionName.slice(3)"));
        assert_eq!(CHALLENGE_FUNCTION_PREFIX.len(), 3);
    }
}
