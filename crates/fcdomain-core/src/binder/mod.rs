//! Domain binder
//!
//! Idempotent create-or-update state machine for one named domain:
//!
//! 1. Resolve the `AUTO` sentinel to a concrete temporary domain
//! 2. Normalize the spec into the platform's options object
//! 3. `getDomain` succeeds → update in place
//! 4. `getDomain` fails → bounded creation retry while the platform
//!    reports the domain as not yet resolved to its endpoint
//!
//! ## Outcomes
//!
//! The binder never reports an incomplete binding as success: an update
//! failure and retry exhaustion are explicit [`BindOutcome`] variants
//! rather than a swallowed error or a success-shaped return value.

use crate::config::{EngineConfig, TempDomainConfig};
use crate::error::{Error, Result};
use crate::events::{EventSink, ReconcilerEvent};
use crate::normalize;
use crate::provisioner::TempDomainProvisioner;
use crate::traits::ComputeClient;
use crate::types::{DomainOptions, DomainSpec, Protocol};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Marker in creation errors for the non-retryable ICP policy rejection
const ICP_MARKER: &str = "ICP";

/// Marker in creation errors for the transient "DNS not yet resolved" case
const UNRESOLVED_MARKER: &str = "has not been resolved";

/// Marker preceding the expected endpoint in the platform's error text
const ENDPOINT_HINT_MARKER: &str = "the expected endpoint is";

/// Result of a bind operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindOutcome {
    /// The binding did not exist and was created
    Created {
        /// The bound domain name (concrete, never `AUTO`)
        domain_name: String,
    },

    /// The binding existed and was updated in place
    Updated {
        /// The bound domain name
        domain_name: String,
    },

    /// The binding exists but the in-place update failed; the remote
    /// binding keeps its previous shape
    UpdateFailed {
        /// The domain name whose update failed
        domain_name: String,
        /// The remote error message
        message: String,
    },

    /// Every creation attempt reported the domain as unresolved; the
    /// binding was never completed
    RetryExhausted {
        /// The domain name that never resolved
        domain_name: String,
        /// Number of creation attempts made
        attempts: usize,
    },

    /// The bind failed before any remote mutation (used by the batch
    /// driver to isolate per-domain failures)
    Failed {
        /// The spec's domain name (may be the `AUTO` sentinel)
        domain_name: String,
        /// The error message
        message: String,
    },
}

impl BindOutcome {
    /// Whether the remote binding matches the desired spec
    pub fn is_bound(&self) -> bool {
        matches!(self, BindOutcome::Created { .. } | BindOutcome::Updated { .. })
    }

    /// The domain name this outcome refers to
    pub fn domain_name(&self) -> &str {
        match self {
            BindOutcome::Created { domain_name }
            | BindOutcome::Updated { domain_name }
            | BindOutcome::UpdateFailed { domain_name, .. }
            | BindOutcome::RetryExhausted { domain_name, .. }
            | BindOutcome::Failed { domain_name, .. } => domain_name,
        }
    }
}

/// Create-or-update state machine for a single domain binding
pub struct DomainBinder {
    compute: Arc<dyn ComputeClient>,
    provisioner: TempDomainProvisioner,
    engine: EngineConfig,
    temp_domain: TempDomainConfig,
    events: EventSink,
}

impl DomainBinder {
    pub(crate) fn new(
        compute: Arc<dyn ComputeClient>,
        provisioner: TempDomainProvisioner,
        engine: EngineConfig,
        temp_domain: TempDomainConfig,
        events: EventSink,
    ) -> Self {
        Self {
            compute,
            provisioner,
            engine,
            temp_domain,
            events,
        }
    }

    /// Converge the remote binding for one domain spec
    ///
    /// # Parameters
    ///
    /// - `spec`: The desired binding (name may be the `AUTO` sentinel)
    /// - `service_name` / `function_name`: Target of every route rule
    ///
    /// # Returns
    ///
    /// - `Ok(BindOutcome)`: The (possibly incomplete) result; inspect
    ///   [`BindOutcome::is_bound`]
    /// - `Err(Error)`: Fatal failures — unreadable certificate, ICP
    ///   rejection, unexpected creation error, or unavailable auto domain
    pub async fn bind(
        &self,
        spec: &DomainSpec,
        service_name: &str,
        function_name: &str,
    ) -> Result<BindOutcome> {
        let (domain_name, options) = if spec.is_auto() {
            info!("Resolving auto domain for {}/{}", service_name, function_name);
            self.resolve_auto(spec, service_name, function_name).await?
        } else {
            (
                spec.domain_name.clone(),
                normalize::build_domain_options(spec, service_name, function_name)?,
            )
        };

        self.events.emit(ReconcilerEvent::BindStarted {
            domain_name: domain_name.clone(),
        });
        info!("Deploying domain: {}", domain_name);

        // Every bind re-fetches remote state; nothing is cached across calls.
        // Any lookup failure is treated as absence, matching the platform's
        // behavior of failing getDomain for unknown names.
        match self.compute.get_domain(&domain_name).await {
            Ok(_) => self.update_existing(&domain_name, &options).await,
            Err(_) => self.create_with_retry(&domain_name, &options).await,
        }
    }

    /// Resolve the `AUTO` sentinel into a concrete name and options
    ///
    /// Temporary domains do not support TLS, so the protocol is forced to
    /// `HTTP` and any certificate config is dropped. A non-empty
    /// user-declared route list overrides the provisioner's route config.
    async fn resolve_auto(
        &self,
        spec: &DomainSpec,
        service_name: &str,
        function_name: &str,
    ) -> Result<(String, DomainOptions)> {
        warn!(
            "Temporary domains are for testing only and cannot be used in production"
        );

        let temp = self
            .provisioner
            .resolve_auto_domain(service_name, function_name, true)
            .await?
            .ok_or_else(|| {
                Error::AutoDomainUnavailable(format!(
                    "no temporary domain could be obtained for {service_name}/{function_name}"
                ))
            })?;

        let route_config = if spec.routes.is_empty() {
            temp.route_config
        } else {
            normalize::build_route_config(spec, service_name, function_name)
        };

        Ok((
            temp.domain_name,
            DomainOptions {
                protocol: Protocol::Http.as_str().to_string(),
                route_config,
                cert_config: None,
            },
        ))
    }

    /// Update an existing binding in place
    ///
    /// A failed update is surfaced as [`BindOutcome::UpdateFailed`]; the
    /// remote binding keeps its previous shape.
    async fn update_existing(
        &self,
        domain_name: &str,
        options: &DomainOptions,
    ) -> Result<BindOutcome> {
        match self.compute.update_domain(domain_name, options).await {
            Ok(()) => {
                info!("Updated domain: {}", domain_name);
                self.events.emit(ReconcilerEvent::DomainUpdated {
                    domain_name: domain_name.to_string(),
                });
                Ok(BindOutcome::Updated {
                    domain_name: domain_name.to_string(),
                })
            }
            Err(err) => {
                warn!("Failed to update domain {}: {}", domain_name, err);
                self.events.emit(ReconcilerEvent::UpdateFailed {
                    domain_name: domain_name.to_string(),
                    error: err.to_string(),
                });
                Ok(BindOutcome::UpdateFailed {
                    domain_name: domain_name.to_string(),
                    message: err.to_string(),
                })
            }
        }
    }

    /// Bounded creation retry loop
    ///
    /// Retries only the transient unresolved-endpoint case, with a
    /// cooperative delay between attempts. An ICP rejection or any other
    /// error short-circuits after a single attempt.
    async fn create_with_retry(
        &self,
        domain_name: &str,
        options: &DomainOptions,
    ) -> Result<BindOutcome> {
        let mut hint_pending = true;

        for attempt in 1..=self.engine.create_retry_attempts {
            match self.compute.create_domain(domain_name, options).await {
                Ok(()) => {
                    info!("Created domain: {}", domain_name);
                    self.events.emit(ReconcilerEvent::DomainCreated {
                        domain_name: domain_name.to_string(),
                    });
                    return Ok(BindOutcome::Created {
                        domain_name: domain_name.to_string(),
                    });
                }
                Err(err) => {
                    let message = remote_text(&err);

                    if message.contains(ICP_MARKER) {
                        return Err(Error::IcpComplianceRequired(message));
                    }

                    if !message.contains(UNRESOLVED_MARKER) {
                        return Err(Error::DomainCreationFailed(message));
                    }

                    // Transient: DNS has not propagated to the platform
                    // endpoint yet. Surface the CNAME hint once per call,
                    // never for platform-issued test domains.
                    if hint_pending {
                        hint_pending = false;
                        if !domain_name.ends_with(&self.temp_domain.suffix) {
                            self.issue_cname_hint(domain_name, &message);
                        }
                    }

                    debug!(
                        "Domain {} not yet resolved (attempt {}/{}), retrying",
                        domain_name, attempt, self.engine.create_retry_attempts
                    );
                    self.events.emit(ReconcilerEvent::CreateRetrying {
                        domain_name: domain_name.to_string(),
                        attempt,
                    });

                    tokio::time::sleep(Duration::from_millis(self.engine.create_retry_delay_ms))
                        .await;
                }
            }
        }

        let attempts = self.engine.create_retry_attempts;
        warn!(
            "Domain {} never resolved after {} creation attempts; binding left incomplete",
            domain_name, attempts
        );
        self.events.emit(ReconcilerEvent::RetryExhausted {
            domain_name: domain_name.to_string(),
            attempts,
        });
        Ok(BindOutcome::RetryExhausted {
            domain_name: domain_name.to_string(),
            attempts,
        })
    }

    /// Tell the operator which endpoint the domain must be CNAMEd to
    fn issue_cname_hint(&self, domain_name: &str, message: &str) {
        match expected_endpoint(message) {
            Some(endpoint) => {
                info!(
                    "Please CNAME your domain {} to {}. Binding will keep retrying; \
                     interrupt the process to stop waiting.",
                    domain_name, endpoint
                );
                self.events.emit(ReconcilerEvent::CnameHintIssued {
                    domain_name: domain_name.to_string(),
                    endpoint,
                });
            }
            None => {
                // The platform message did not carry the expected-endpoint
                // fragment; retry without a hint.
                debug!(
                    "No expected-endpoint fragment in creation error for {}",
                    domain_name
                );
            }
        }
    }
}

/// The remote text used for creation-error classification
///
/// Falls back to the Display rendering for error variants that carry no
/// remote message of their own.
fn remote_text(err: &Error) -> String {
    let message = err.remote_message();
    if message.is_empty() {
        err.to_string()
    } else {
        message.to_string()
    }
}

/// Extract the expected platform endpoint from a creation error message
///
/// The platform wraps the endpoint in two characters on each side, e.g.
/// `... the expected endpoint is ['abc.region.example.com']`. Returns the
/// substring after the marker with the two leading and two trailing
/// wrapping characters stripped, or `None` when the marker is absent or
/// the remainder is too short to unwrap (in which case no hint is shown).
pub fn expected_endpoint(message: &str) -> Option<String> {
    let (_, rest) = message.split_once(ENDPOINT_HINT_MARKER)?;
    let chars: Vec<char> = rest.chars().collect();
    if chars.len() <= 4 {
        return None;
    }
    Some(chars[2..chars.len() - 2].iter().collect())
}
