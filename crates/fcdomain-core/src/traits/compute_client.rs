// # Compute Client Trait
//
// Defines the interface to the serverless platform's domain-binding API
// and the narrow slice of its compute-resource API needed for the
// challenge function.
//
// ## Constraints on implementations
//
// - One API call per method; no retry or backoff (owned by the binder)
// - No caching: the reconciler re-fetches remote state on every operation
// - `get_domain`/`delete_domain` must surface "not found" as
//   `Error::NotFound` or an `Error::Api` carrying the platform's
//   `DomainNameNotFound` code, so callers can distinguish absence from
//   failure
// - Remote error messages must be preserved verbatim: the binder
//   classifies creation failures by inspecting them

use crate::error::Result;
use crate::types::{
    DomainOptions, FunctionDefinition, RemoteDomainBinding, ServiceDefinition, TriggerDefinition,
};
use async_trait::async_trait;

/// Interface to the platform's domain and compute-resource APIs
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait ComputeClient: Send + Sync {
    /// Fetch an existing domain binding
    ///
    /// # Returns
    ///
    /// - `Ok(RemoteDomainBinding)`: The binding exists
    /// - `Err(Error::NotFound)`: No binding for this name
    async fn get_domain(&self, domain_name: &str) -> Result<RemoteDomainBinding>;

    /// Create a new domain binding
    ///
    /// Fails while the domain's DNS has not yet been resolved to the
    /// platform endpoint; the binder retries that case.
    async fn create_domain(&self, domain_name: &str, options: &DomainOptions) -> Result<()>;

    /// Update an existing domain binding in place
    async fn update_domain(&self, domain_name: &str, options: &DomainOptions) -> Result<()>;

    /// Delete a domain binding
    ///
    /// The platform reports an absent binding with the
    /// `DomainNameNotFound` error code; callers treat that as success.
    async fn delete_domain(&self, domain_name: &str) -> Result<()>;

    /// List all domain bindings in the account/region
    async fn list_domains(&self) -> Result<Vec<RemoteDomainBinding>>;

    /// Create a compute service
    async fn create_service(&self, definition: &ServiceDefinition) -> Result<()>;

    /// Create a function within a service
    async fn create_function(
        &self,
        service_name: &str,
        definition: &FunctionDefinition,
    ) -> Result<()>;

    /// Create an HTTP trigger on a function
    async fn create_trigger(
        &self,
        service_name: &str,
        function_name: &str,
        definition: &TriggerDefinition,
    ) -> Result<()>;

    /// Delete a compute service
    async fn delete_service(&self, service_name: &str) -> Result<()>;

    /// Delete a function
    async fn delete_function(&self, service_name: &str, function_name: &str) -> Result<()>;

    /// Delete a trigger
    async fn delete_trigger(
        &self,
        service_name: &str,
        function_name: &str,
        trigger_name: &str,
    ) -> Result<()>;
}
