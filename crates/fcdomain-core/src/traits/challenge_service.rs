// # Challenge Service Trait
//
// Interface to the external temporary-domain issuing service.
//
// The issuance protocol is a two-step POST exchange: the first call
// (account id + region) yields a one-time token; after the caller has
// deployed a challenge function named after that token, the second call
// (account id + region + token) verifies ownership by invoking the
// function through the candidate domain, then hands out the domain name.

use crate::error::Result;
use crate::types::TempDomainExpiry;
use async_trait::async_trait;

/// Interface to the temporary-domain challenge endpoint
#[async_trait]
pub trait ChallengeService: Send + Sync {
    /// Request a one-time challenge token for this account/region
    async fn request_token(&self, account_id: &str, region: &str) -> Result<String>;

    /// Redeem the token for a temporary domain name
    ///
    /// The challenge function for `token` must be deployed and reachable
    /// before this call.
    async fn request_domain(&self, account_id: &str, region: &str, token: &str) -> Result<String>;

    /// Look up expiry metadata for an issued temporary domain
    async fn expiry(&self, domain_name: &str) -> Result<TempDomainExpiry>;
}
