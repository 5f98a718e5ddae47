// # fcdomain-core
//
// Core library for the custom-domain reconciler.
//
// ## Architecture Overview
//
// This library converges remote serverless-platform state to match a
// desired set of custom-domain bindings:
// - **ComputeClient**: Trait for the platform's domain and function APIs
// - **ChallengeService**: Trait for the temporary-domain issuing endpoint
// - **DomainBinder**: Idempotent create-or-update state machine for one domain
// - **TempDomainProvisioner**: Reuse-or-provision lifecycle for auto domains
// - **DomainReconciler**: Batch driver applying the binder per domain spec
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Reconciliation logic is separate from wire clients
// 2. **Explicit Outcomes**: Update failures and retry exhaustion are named
//    variants, never silently reported as success
// 3. **Scoped Resources**: The challenge function is acquired and released
//    within a single provisioning call, on every exit path
// 4. **Library-First**: All functionality is usable without the daemon

pub mod binder;
pub mod config;
pub mod driver;
pub mod error;
pub mod events;
pub mod normalize;
pub mod provisioner;
pub mod traits;
pub mod types;

// Re-export core types for convenience
pub use binder::{BindOutcome, DomainBinder};
pub use config::{EngineConfig, ReconcilerConfig, TempDomainConfig};
pub use driver::DomainReconciler;
pub use error::{Error, Result};
pub use events::ReconcilerEvent;
pub use provisioner::TempDomainProvisioner;
pub use traits::{ChallengeService, ComputeClient};
pub use types::{CertConfig, DomainSpec, Protocol, RoutePattern, TempDomain};
