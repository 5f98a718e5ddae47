//! Core traits for the custom-domain reconciler
//!
//! This module defines the abstract interfaces to the two external
//! collaborators:
//!
//! - [`ComputeClient`]: the platform's domain-binding and
//!   compute-resource APIs
//! - [`ChallengeService`]: the out-of-band temporary-domain issuer

pub mod challenge_service;
pub mod compute_client;

pub use challenge_service::ChallengeService;
pub use compute_client::ComputeClient;
