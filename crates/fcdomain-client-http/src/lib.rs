// # Platform HTTP Clients
//
// This crate provides the HTTP implementations of the reconciler's two
// outbound interfaces:
//
// - `HttpComputeClient`: the platform's domain-binding and
//   compute-resource REST API
// - `HttpChallengeService`: the external temporary-domain issuing
//   endpoint (two-step POST exchange)
//
// ## Constraints
//
// - One HTTP request per trait method (retries are owned by the binder)
// - Full error propagation: the platform's error message and error code
//   are preserved verbatim, because the binder classifies creation
//   failures by inspecting them
// - HTTP timeout configured (30 seconds)
// - NO retry logic (intentionally omitted - owned by the binder)
// - NO caching (the reconciler re-fetches remote state every operation)
// - NO background tasks
//
// ## Security Requirements
//
// - API token NEVER appears in logs or Debug output
// - Client construction MUST fail fast if the token is empty
//
// ## API Reference
//
// - Get domain:    GET    `/2016-08-15/custom-domains/:name`
// - Create domain: POST   `/2016-08-15/custom-domains`
// - Update domain: PUT    `/2016-08-15/custom-domains/:name`
// - Delete domain: DELETE `/2016-08-15/custom-domains/:name`
// - List domains:  GET    `/2016-08-15/custom-domains`

use async_trait::async_trait;
use fcdomain_core::error::{Error, Result};
use fcdomain_core::traits::{ChallengeService, ComputeClient};
use fcdomain_core::types::{
    DomainOptions, FunctionDefinition, RemoteDomainBinding, ServiceDefinition, TempDomainExpiry,
    TriggerDefinition,
};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

/// Path prefix carrying the platform API version
const API_VERSION: &str = "/2016-08-15";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Build a reqwest client with the shared timeout
fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(DEFAULT_HTTP_TIMEOUT)
        .build()
        .map_err(|e| Error::http(format!("Failed to build HTTP client: {e}")))
}

/// Translate a non-success response into a domain error
///
/// The platform reports structured errors as `{"ErrorCode": ...,
/// "ErrorMessage": ...}`. Both fields are preserved: the message verbatim
/// (the binder pattern-matches on it) and the code via
/// [`Error::remote_code`] (the driver checks for `DomainNameNotFound`).
async fn error_from_response(operation: &str, response: reqwest::Response) -> Error {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read error response".to_string());

    let (code, message) = match serde_json::from_str::<Value>(&body) {
        Ok(json) => {
            let code = json["ErrorCode"]
                .as_str()
                .or_else(|| json["errorCode"].as_str())
                .map(|c| c.to_string());
            let message = json["ErrorMessage"]
                .as_str()
                .or_else(|| json["errorMessage"].as_str())
                .map(|m| m.to_string())
                .unwrap_or_else(|| body.clone());
            (code, message)
        }
        Err(_) => (None, body.clone()),
    };

    match status.as_u16() {
        401 | 403 => Error::http(format!(
            "Authentication failed: invalid API token or insufficient permissions. Status: {status}"
        )),
        404 => match code {
            // A coded 404 is a platform-level "no such resource"; keep
            // the code so callers can distinguish it
            Some(code) => Error::api_with_code(code, message),
            None => Error::not_found(format!("{operation}: {message}")),
        },
        429 => Error::http(format!(
            "Rate limit exceeded. Please retry later. Status: {status}"
        )),
        500..=599 => Error::http(format!(
            "Platform server error (transient): {status} - {message}"
        )),
        _ => match code {
            Some(code) => Error::api_with_code(code, message),
            None => Error::api(message),
        },
    }
}

/// Map a transport-level reqwest failure
fn transport_error(err: reqwest::Error) -> Error {
    Error::http(format!("HTTP request failed: {err}"))
}

// ---------------------------------------------------------------------------
// Compute client
// ---------------------------------------------------------------------------

/// HTTP implementation of [`ComputeClient`]
///
/// Stateless and single-shot: every method is one request against the
/// platform endpoint, with the result or error handed straight back to
/// the caller.
pub struct HttpComputeClient {
    /// Platform endpoint, e.g. `https://<account>.<region>.fc.example.com`
    endpoint: String,

    /// API token
    /// NEVER log this value
    api_token: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for HttpComputeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpComputeClient")
            .field("endpoint", &self.endpoint)
            .field("api_token", &"<REDACTED>")
            .finish()
    }
}

impl HttpComputeClient {
    /// Create a new platform API client
    ///
    /// # Parameters
    ///
    /// - `endpoint`: Platform base URL, without the version path
    /// - `api_token`: Bearer token for the platform API
    ///
    /// # Errors
    ///
    /// Fails fast on an empty token or endpoint.
    pub fn new(endpoint: impl Into<String>, api_token: impl Into<String>) -> Result<Self> {
        let endpoint = endpoint.into();
        let api_token = api_token.into();

        if endpoint.is_empty() {
            return Err(Error::config("Platform endpoint cannot be empty"));
        }
        if api_token.is_empty() {
            return Err(Error::config("Platform API token cannot be empty"));
        }

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_token,
            client: http_client()?,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}{}", self.endpoint, API_VERSION, path)
    }

    /// Send a request with auth headers and map non-success statuses
    async fn send(
        &self,
        operation: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response> {
        let response = request
            .bearer_auth(&self.api_token)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(error_from_response(operation, response).await);
        }

        Ok(response)
    }
}

/// Response shape of the domain listing endpoint
#[derive(Debug, Deserialize)]
struct ListDomainsResponse {
    #[serde(rename = "customDomains", default)]
    custom_domains: Vec<RemoteDomainBinding>,
}

#[async_trait]
impl ComputeClient for HttpComputeClient {
    async fn get_domain(&self, domain_name: &str) -> Result<RemoteDomainBinding> {
        tracing::debug!("Fetching domain binding: {}", domain_name);

        let url = self.url(&format!("/custom-domains/{domain_name}"));
        let response = self.send("Get domain", self.client.get(&url)).await?;

        response
            .json::<RemoteDomainBinding>()
            .await
            .map_err(|e| Error::http(format!("Failed to parse domain response: {e}")))
    }

    async fn create_domain(&self, domain_name: &str, options: &DomainOptions) -> Result<()> {
        tracing::debug!("Creating domain binding: {}", domain_name);

        // The create endpoint takes the name inline with the options
        let mut body = serde_json::to_value(options)?;
        body["domainName"] = Value::String(domain_name.to_string());

        let url = self.url("/custom-domains");
        self.send("Create domain", self.client.post(&url).json(&body))
            .await?;
        Ok(())
    }

    async fn update_domain(&self, domain_name: &str, options: &DomainOptions) -> Result<()> {
        tracing::debug!("Updating domain binding: {}", domain_name);

        let url = self.url(&format!("/custom-domains/{domain_name}"));
        self.send("Update domain", self.client.put(&url).json(options))
            .await?;
        Ok(())
    }

    async fn delete_domain(&self, domain_name: &str) -> Result<()> {
        tracing::debug!("Deleting domain binding: {}", domain_name);

        let url = self.url(&format!("/custom-domains/{domain_name}"));
        self.send("Delete domain", self.client.delete(&url)).await?;
        Ok(())
    }

    async fn list_domains(&self) -> Result<Vec<RemoteDomainBinding>> {
        let url = self.url("/custom-domains");
        let response = self.send("List domains", self.client.get(&url)).await?;

        let listing: ListDomainsResponse = response
            .json()
            .await
            .map_err(|e| Error::http(format!("Failed to parse domain listing: {e}")))?;

        Ok(listing.custom_domains)
    }

    async fn create_service(&self, definition: &ServiceDefinition) -> Result<()> {
        let url = self.url("/services");
        let body = serde_json::json!({
            "serviceName": definition.service_name,
            "description": definition.description,
        });
        self.send("Create service", self.client.post(&url).json(&body))
            .await?;
        Ok(())
    }

    async fn create_function(
        &self,
        service_name: &str,
        definition: &FunctionDefinition,
    ) -> Result<()> {
        let url = self.url(&format!("/services/{service_name}/functions"));
        let body = serde_json::json!({
            "functionName": definition.function_name,
            "description": definition.description,
            "runtime": definition.runtime,
            "handler": definition.handler,
            "code": { "sourceCode": definition.source },
        });
        self.send("Create function", self.client.post(&url).json(&body))
            .await?;
        Ok(())
    }

    async fn create_trigger(
        &self,
        service_name: &str,
        function_name: &str,
        definition: &TriggerDefinition,
    ) -> Result<()> {
        let url = self.url(&format!(
            "/services/{service_name}/functions/{function_name}/triggers"
        ));
        let body = serde_json::json!({
            "triggerName": definition.trigger_name,
            "triggerType": "http",
            "triggerConfig": {
                "authType": definition.auth_type,
                "methods": definition.methods,
            },
        });
        self.send("Create trigger", self.client.post(&url).json(&body))
            .await?;
        Ok(())
    }

    async fn delete_service(&self, service_name: &str) -> Result<()> {
        let url = self.url(&format!("/services/{service_name}"));
        self.send("Delete service", self.client.delete(&url)).await?;
        Ok(())
    }

    async fn delete_function(&self, service_name: &str, function_name: &str) -> Result<()> {
        let url = self.url(&format!("/services/{service_name}/functions/{function_name}"));
        self.send("Delete function", self.client.delete(&url)).await?;
        Ok(())
    }

    async fn delete_trigger(
        &self,
        service_name: &str,
        function_name: &str,
        trigger_name: &str,
    ) -> Result<()> {
        let url = self.url(&format!(
            "/services/{service_name}/functions/{function_name}/triggers/{trigger_name}"
        ));
        self.send("Delete trigger", self.client.delete(&url)).await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Challenge service client
// ---------------------------------------------------------------------------

/// HTTP implementation of [`ChallengeService`]
///
/// The issuing endpoint is a plain JSON-over-POST service: the same URL
/// hands out a token (account + region) and then, once the challenge
/// function is reachable, the domain (account + region + token). Expiry
/// metadata lives behind a separate URL.
#[derive(Debug, Clone)]
pub struct HttpChallengeService {
    /// Token/domain issuing endpoint
    issue_url: String,

    /// Expiry metadata endpoint
    expiry_url: String,

    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
}

#[derive(Debug, Deserialize)]
struct DomainResponse {
    domain: String,
}

impl HttpChallengeService {
    /// Create a new challenge endpoint client
    pub fn new(issue_url: impl Into<String>, expiry_url: impl Into<String>) -> Result<Self> {
        let issue_url = issue_url.into();
        let expiry_url = expiry_url.into();

        if issue_url.is_empty() || expiry_url.is_empty() {
            return Err(Error::config("Challenge endpoint URLs cannot be empty"));
        }

        Ok(Self {
            issue_url,
            expiry_url,
            client: http_client()?,
        })
    }

    async fn post(&self, operation: &str, url: &str, body: &Value) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(error_from_response(operation, response).await);
        }

        Ok(response)
    }
}

#[async_trait]
impl ChallengeService for HttpChallengeService {
    async fn request_token(&self, account_id: &str, region: &str) -> Result<String> {
        let body = serde_json::json!({
            "accountID": account_id,
            "region": region,
        });

        let response = self
            .post("Request challenge token", &self.issue_url, &body)
            .await?;

        let parsed: TokenResponse = response
            .json()
            .await
            .map_err(|e| Error::http(format!("Failed to parse token response: {e}")))?;
        Ok(parsed.token)
    }

    async fn request_domain(&self, account_id: &str, region: &str, token: &str) -> Result<String> {
        let body = serde_json::json!({
            "accountID": account_id,
            "region": region,
            "token": token,
        });

        let response = self
            .post("Request temporary domain", &self.issue_url, &body)
            .await?;

        let parsed: DomainResponse = response
            .json()
            .await
            .map_err(|e| Error::http(format!("Failed to parse domain response: {e}")))?;
        Ok(parsed.domain)
    }

    async fn expiry(&self, domain_name: &str) -> Result<TempDomainExpiry> {
        let body = serde_json::json!({ "domain": domain_name });

        let response = self
            .post("Query domain expiry", &self.expiry_url, &body)
            .await?;

        response
            .json::<TempDomainExpiry>()
            .await
            .map_err(|e| Error::http(format!("Failed to parse expiry response: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_token_rejected() {
        let client = HttpComputeClient::new("https://fc.example.com", "");
        assert!(client.is_err());
    }

    #[test]
    fn test_empty_endpoint_rejected() {
        let client = HttpComputeClient::new("", "token");
        assert!(client.is_err());
    }

    #[test]
    fn test_api_token_not_exposed_in_debug() {
        let client =
            HttpComputeClient::new("https://fc.example.com", "secret_token_12345").unwrap();

        let debug_str = format!("{:?}", client);
        assert!(!debug_str.contains("secret_token_12345"));
        assert!(!debug_str.contains("secret_token"));
        // The struct name should appear but not the token value
        assert!(debug_str.contains("HttpComputeClient"));
    }

    #[test]
    fn test_trailing_slash_trimmed_from_endpoint() {
        let client = HttpComputeClient::new("https://fc.example.com/", "token").unwrap();
        assert_eq!(
            client.url("/custom-domains/example.com"),
            "https://fc.example.com/2016-08-15/custom-domains/example.com"
        );
    }

    #[test]
    fn test_challenge_service_requires_urls() {
        assert!(HttpChallengeService::new("", "https://x.example.com").is_err());
        assert!(HttpChallengeService::new("https://x.example.com", "").is_err());
        assert!(
            HttpChallengeService::new("https://x.example.com", "https://y.example.com").is_ok()
        );
    }

    #[test]
    fn test_domain_listing_parses() {
        let raw = r#"{
            "customDomains": [
                {"domainName": "a.example.com", "protocol": "HTTP"},
                {"domainName": "b.example.com"}
            ]
        }"#;

        let listing: ListDomainsResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(listing.custom_domains.len(), 2);
        assert_eq!(listing.custom_domains[0].domain_name, "a.example.com");
    }

    #[test]
    fn test_empty_listing_defaults() {
        let listing: ListDomainsResponse = serde_json::from_str("{}").unwrap();
        assert!(listing.custom_domains.is_empty());
    }
}
