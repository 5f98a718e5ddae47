//! Domain reconciliation driver
//!
//! The [`DomainReconciler`] is the top-level entry point: it iterates a
//! list of domain specs, applying the binder to each, and provides the
//! symmetric teardown path that deletes bindings (resolving `AUTO` names
//! back to their concrete temporary domain first).
//!
//! ## Batch semantics
//!
//! All operations are sequential, single-flow: one spec is processed
//! fully before the next, and there is no parallel fan-out across
//! domains. In `deploy`, per-domain failures are isolated as
//! [`BindOutcome::Failed`] entries so one domain's error never aborts
//! the batch.

use crate::binder::{BindOutcome, DomainBinder};
use crate::config::ReconcilerConfig;
use crate::error::{Error, Result};
use crate::events::{EventSink, ReconcilerEvent};
use crate::provisioner::TempDomainProvisioner;
use crate::traits::{ChallengeService, ComputeClient};
use crate::types::{DomainSpec, TempDomain};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Error code the platform reports for an already-absent domain binding
const DOMAIN_NOT_FOUND_CODE: &str = "DomainNameNotFound";

/// Top-level reconciler for a batch of domain specs
pub struct DomainReconciler {
    compute: Arc<dyn ComputeClient>,
    binder: DomainBinder,
    provisioner: TempDomainProvisioner,
    events: EventSink,
}

impl DomainReconciler {
    /// Create a new reconciler
    ///
    /// # Parameters
    ///
    /// - `compute`: Platform domain/compute API client
    /// - `challenge`: Temporary-domain challenge endpoint client
    /// - `config`: Reconciler configuration (validated here)
    ///
    /// # Returns
    ///
    /// A tuple of (reconciler, event_receiver); the receiver yields
    /// [`ReconcilerEvent`]s for operator-facing progress and hints.
    pub fn new(
        compute: Arc<dyn ComputeClient>,
        challenge: Arc<dyn ChallengeService>,
        config: ReconcilerConfig,
    ) -> Result<(Self, mpsc::Receiver<ReconcilerEvent>)> {
        config.validate()?;

        let (events, rx) = EventSink::new(config.engine.event_channel_capacity);

        let provisioner = TempDomainProvisioner::new(
            Arc::clone(&compute),
            challenge,
            &config,
            events.clone(),
        );

        let binder = DomainBinder::new(
            Arc::clone(&compute),
            provisioner.clone(),
            config.engine.clone(),
            config.temp_domain.clone(),
            events.clone(),
        );

        let reconciler = Self {
            compute,
            binder,
            provisioner,
            events,
        };

        Ok((reconciler, rx))
    }

    /// Converge the remote binding for a single domain spec
    ///
    /// See [`DomainBinder::bind`].
    pub async fn bind(
        &self,
        spec: &DomainSpec,
        service_name: &str,
        function_name: &str,
    ) -> Result<BindOutcome> {
        self.binder.bind(spec, service_name, function_name).await
    }

    /// Resolve a temporary domain for the given target
    ///
    /// See [`TempDomainProvisioner::resolve_auto_domain`].
    pub async fn resolve_auto_domain(
        &self,
        service_name: &str,
        function_name: &str,
        generate_if_missing: bool,
    ) -> Result<Option<TempDomain>> {
        self.provisioner
            .resolve_auto_domain(service_name, function_name, generate_if_missing)
            .await
    }

    /// Apply the binder to every spec in order
    ///
    /// # Parameters
    ///
    /// - `specs`: Domain specs, processed in order
    /// - `service_name` / `function_name`: Target for every route rule
    /// - `only_domain_name`: When set, skip specs whose name differs
    ///
    /// # Returns
    ///
    /// One [`BindOutcome`] per processed spec, in order. A failed domain
    /// yields a [`BindOutcome::Failed`] entry; the batch never aborts.
    pub async fn deploy(
        &self,
        specs: &[DomainSpec],
        service_name: &str,
        function_name: &str,
        only_domain_name: Option<&str>,
    ) -> Vec<BindOutcome> {
        let mut outcomes = Vec::new();

        for spec in specs {
            if let Some(only) = only_domain_name {
                if spec.domain_name != only {
                    continue;
                }
            }

            match self.binder.bind(spec, service_name, function_name).await {
                Ok(outcome) => outcomes.push(outcome),
                Err(err) => {
                    warn!("Failed to deploy domain {}: {}", spec.domain_name, err);
                    outcomes.push(BindOutcome::Failed {
                        domain_name: spec.domain_name.clone(),
                        message: err.to_string(),
                    });
                }
            }
        }

        outcomes
    }

    /// Delete the bindings for a batch of specs
    ///
    /// When `only_domain_name` is given, spec iteration is bypassed
    /// entirely and exactly that name is deleted. Otherwise every spec is
    /// processed in order, with `AUTO` names resolved to their concrete
    /// temporary domain via a pure lookup first.
    ///
    /// An already-absent binding is success; any other deletion error is
    /// [`Error::DomainDeletionFailed`].
    pub async fn remove(
        &self,
        specs: &[DomainSpec],
        service_name: &str,
        function_name: &str,
        only_domain_name: Option<&str>,
    ) -> Result<()> {
        if let Some(only) = only_domain_name {
            return self.delete_domain(only).await;
        }

        for spec in specs {
            if spec.is_auto() {
                match self
                    .provisioner
                    .resolve_auto_domain(service_name, function_name, false)
                    .await?
                {
                    Some(temp) => self.delete_domain(&temp.domain_name).await?,
                    None => {
                        info!(
                            "No temporary domain routes to {}/{}; nothing to delete",
                            service_name, function_name
                        );
                    }
                }
            } else {
                self.delete_domain(&spec.domain_name).await?;
            }
        }

        Ok(())
    }

    /// Delete one binding, treating "not found" as already satisfied
    async fn delete_domain(&self, domain_name: &str) -> Result<()> {
        info!("Deleting domain: {}", domain_name);

        match self.compute.delete_domain(domain_name).await {
            Ok(()) => {}
            Err(Error::NotFound(_)) => {}
            Err(err) if err.remote_code() == Some(DOMAIN_NOT_FOUND_CODE) => {}
            Err(err) => {
                return Err(Error::DomainDeletionFailed {
                    domain: domain_name.to_string(),
                    message: err.to_string(),
                });
            }
        }

        self.events.emit(ReconcilerEvent::DomainDeleted {
            domain_name: domain_name.to_string(),
        });
        info!("Deleted domain: {}", domain_name);
        Ok(())
    }
}
