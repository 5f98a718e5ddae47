// # fcdomaind - Custom-Domain Reconciler Driver
//
// This binary is a THIN integration layer ONLY:
// - Reads configuration from environment variables
// - Initializes the runtime and the HTTP clients
// - Runs one reconciliation action (deploy or remove)
// - Renders reconciler events and outcomes as logs
//
// All reconciliation logic lives in fcdomain-core; all wire plumbing
// lives in fcdomain-client-http. DO NOT add retry or domain logic here.
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// ### Platform
// - `FCDOMAIN_ENDPOINT`: Platform API base URL
// - `FCDOMAIN_API_TOKEN`: Platform API token
// - `FCDOMAIN_ACCOUNT_ID`: Account identifier
// - `FCDOMAIN_REGION`: Platform region
//
// ### Challenge service
// - `FCDOMAIN_CHALLENGE_ISSUE_URL`: Token/domain issuing endpoint
// - `FCDOMAIN_CHALLENGE_EXPIRY_URL`: Expiry metadata endpoint
//
// ### Action
// - `FCDOMAIN_ACTION`: deploy or remove (default: deploy)
// - `FCDOMAIN_SPEC_PATH`: Path to a JSON array of domain specs
// - `FCDOMAIN_SERVICE`: Target service for every route rule
// - `FCDOMAIN_FUNCTION`: Target function for every route rule
// - `FCDOMAIN_ONLY_DOMAIN`: Optional filter to a single domain name
//
// ### Tuning
// - `FCDOMAIN_CREATE_RETRY_ATTEMPTS`: Creation attempts per domain
// - `FCDOMAIN_CREATE_RETRY_DELAY_MS`: Delay between creation attempts
// - `FCDOMAIN_LOG_LEVEL`: trace, debug, info, warn, error (default: info)
//
// ## Example
//
// ```bash
// export FCDOMAIN_ENDPOINT=https://123.cn-hangzhou.fc.example.com
// export FCDOMAIN_API_TOKEN=your_platform_token
// export FCDOMAIN_ACCOUNT_ID=1234567890
// export FCDOMAIN_REGION=cn-hangzhou
// export FCDOMAIN_CHALLENGE_ISSUE_URL=https://challenge.example.com/issue/
// export FCDOMAIN_CHALLENGE_EXPIRY_URL=https://challenge.example.com/expiry/
// export FCDOMAIN_SPEC_PATH=/etc/fcdomain/domains.json
// export FCDOMAIN_SERVICE=my-service
// export FCDOMAIN_FUNCTION=my-function
//
// fcdomaind
// ```

use anyhow::Result;
use fcdomain_core::binder::BindOutcome;
use fcdomain_core::config::ReconcilerConfig;
use fcdomain_core::types::DomainSpec;
use fcdomain_core::{DomainReconciler, ReconcilerEvent};
use fcdomain_client_http::{HttpChallengeService, HttpComputeClient};
use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
///
/// - 0: All requested domains converged
/// - 1: Configuration or startup error
/// - 2: Runtime error (at least one domain failed)
#[derive(Debug, Clone, Copy)]
enum FcdomainExitCode {
    Success = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<FcdomainExitCode> for ExitCode {
    fn from(code: FcdomainExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Requested reconciliation action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Deploy,
    Remove,
}

/// Application configuration
struct Config {
    endpoint: String,
    api_token: String,
    account_id: String,
    region: String,
    challenge_issue_url: String,
    challenge_expiry_url: String,
    action: Action,
    spec_path: String,
    service_name: String,
    function_name: String,
    only_domain: Option<String>,
    create_retry_attempts: Option<usize>,
    create_retry_delay_ms: Option<u64>,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        let action = match env::var("FCDOMAIN_ACTION")
            .unwrap_or_else(|_| "deploy".to_string())
            .to_lowercase()
            .as_str()
        {
            "deploy" => Action::Deploy,
            "remove" => Action::Remove,
            other => anyhow::bail!(
                "FCDOMAIN_ACTION '{}' is not valid. Valid actions: deploy, remove",
                other
            ),
        };

        Ok(Self {
            endpoint: env::var("FCDOMAIN_ENDPOINT")?,
            api_token: env::var("FCDOMAIN_API_TOKEN")?,
            account_id: env::var("FCDOMAIN_ACCOUNT_ID")?,
            region: env::var("FCDOMAIN_REGION")?,
            challenge_issue_url: env::var("FCDOMAIN_CHALLENGE_ISSUE_URL")?,
            challenge_expiry_url: env::var("FCDOMAIN_CHALLENGE_EXPIRY_URL")?,
            action,
            spec_path: env::var("FCDOMAIN_SPEC_PATH")?,
            service_name: env::var("FCDOMAIN_SERVICE")?,
            function_name: env::var("FCDOMAIN_FUNCTION")?,
            only_domain: env::var("FCDOMAIN_ONLY_DOMAIN").ok(),
            create_retry_attempts: env::var("FCDOMAIN_CREATE_RETRY_ATTEMPTS")
                .ok()
                .map(|s| s.parse())
                .transpose()
                .map_err(|e| anyhow::anyhow!("FCDOMAIN_CREATE_RETRY_ATTEMPTS: {}", e))?,
            create_retry_delay_ms: env::var("FCDOMAIN_CREATE_RETRY_DELAY_MS")
                .ok()
                .map(|s| s.parse())
                .transpose()
                .map_err(|e| anyhow::anyhow!("FCDOMAIN_CREATE_RETRY_DELAY_MS: {}", e))?,
            log_level: env::var("FCDOMAIN_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Validate the configuration
    ///
    /// Checks required field presence, token format, URL schemes,
    /// numeric ranges and the log level enumeration.
    fn validate(&self) -> Result<()> {
        if self.api_token.is_empty() {
            anyhow::bail!(
                "FCDOMAIN_API_TOKEN is required. \
                Set it via: export FCDOMAIN_API_TOKEN=your_token"
            );
        }

        if self.api_token.len() < 20 {
            anyhow::bail!(
                "FCDOMAIN_API_TOKEN appears too short ({} chars). \
                Verify your token is correct.",
                self.api_token.len()
            );
        }

        // Check for obvious placeholder tokens (common mistake)
        let token_lower = self.api_token.to_lowercase();
        if token_lower.contains("your_token")
            || token_lower.contains("replace_me")
            || token_lower.contains("example")
            || token_lower == "token"
        {
            anyhow::bail!(
                "FCDOMAIN_API_TOKEN appears to be a placeholder. \
                Use an actual platform API token."
            );
        }

        for (name, value) in [
            ("FCDOMAIN_ENDPOINT", &self.endpoint),
            ("FCDOMAIN_CHALLENGE_ISSUE_URL", &self.challenge_issue_url),
            ("FCDOMAIN_CHALLENGE_EXPIRY_URL", &self.challenge_expiry_url),
        ] {
            if value.is_empty() {
                anyhow::bail!("{} is required", name);
            }
            if !value.starts_with("https://") && !value.starts_with("http://") {
                anyhow::bail!("{} must use HTTP or HTTPS scheme. Got: {}", name, value);
            }
            if value.starts_with("http://") {
                eprintln!(
                    "WARNING: {} uses HTTP (not HTTPS). \
                    This is less secure. Consider using HTTPS.",
                    name
                );
            }
        }

        if self.account_id.is_empty() {
            anyhow::bail!("FCDOMAIN_ACCOUNT_ID is required");
        }
        if self.region.is_empty() {
            anyhow::bail!("FCDOMAIN_REGION is required");
        }
        if self.spec_path.is_empty() {
            anyhow::bail!(
                "FCDOMAIN_SPEC_PATH is required. \
                Set it via: export FCDOMAIN_SPEC_PATH=/etc/fcdomain/domains.json"
            );
        }
        if self.service_name.is_empty() {
            anyhow::bail!("FCDOMAIN_SERVICE is required");
        }
        if self.function_name.is_empty() {
            anyhow::bail!("FCDOMAIN_FUNCTION is required");
        }

        if let Some(domain) = &self.only_domain {
            validate_domain_name(domain)?;
        }

        // Validate numeric ranges
        if let Some(attempts) = self.create_retry_attempts {
            if attempts == 0 || attempts > 10_000 {
                anyhow::bail!(
                    "FCDOMAIN_CREATE_RETRY_ATTEMPTS must be between 1 and 10000. Got: {}",
                    attempts
                );
            }
        }

        if let Some(delay) = self.create_retry_delay_ms {
            if !(100..=60_000).contains(&delay) {
                anyhow::bail!(
                    "FCDOMAIN_CREATE_RETRY_DELAY_MS must be between 100 and 60000. Got: {}",
                    delay
                );
            }
        }

        // Validate log level
        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "FCDOMAIN_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }
}

/// Validate that a string is a valid domain name
///
/// Basic DNS validation per RFC 1035; not comprehensive but catches
/// common errors. The `AUTO` sentinel is accepted as-is.
fn validate_domain_name(domain: &str) -> Result<()> {
    if domain.eq_ignore_ascii_case("AUTO") {
        return Ok(());
    }

    if domain.is_empty() {
        anyhow::bail!("Domain name cannot be empty");
    }

    // Total length limit (RFC 1035: 253 chars max)
    if domain.len() > 253 {
        anyhow::bail!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        );
    }

    for label in domain.split('.') {
        if label.is_empty() {
            anyhow::bail!("Domain name has empty label: '{}'", domain);
        }

        if label.len() > 63 {
            anyhow::bail!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            );
        }

        if !label.chars().all(|c| c.is_alphanumeric() || c == '-') {
            anyhow::bail!(
                "Domain label contains invalid characters. Label: '{}'. \
                Valid: alphanumeric and hyphen only.",
                label
            );
        }

        if label.starts_with('-') || label.ends_with('-') {
            anyhow::bail!(
                "Domain label cannot start or end with hyphen. Label: '{}'",
                label
            );
        }
    }

    Ok(())
}

/// Load the domain specs from the configured JSON file
fn load_specs(path: &str) -> Result<Vec<DomainSpec>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read spec file {}: {}", path, e))?;

    let specs: Vec<DomainSpec> = serde_json::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("Failed to parse spec file {}: {}", path, e))?;

    for spec in &specs {
        validate_domain_name(&spec.domain_name)?;
    }

    Ok(specs)
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return FcdomainExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return FcdomainExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return FcdomainExitCode::ConfigError.into();
    }

    info!("Starting fcdomaind");

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return FcdomainExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        match run(config).await {
            Ok(()) => FcdomainExitCode::Success,
            Err(e) => {
                error!("Reconciliation error: {}", e);
                FcdomainExitCode::RuntimeError
            }
        }
    })
    .into()
}

/// Run one reconciliation action end to end
async fn run(config: Config) -> Result<()> {
    let specs = load_specs(&config.spec_path)?;
    info!("Loaded {} domain spec(s) from {}", specs.len(), config.spec_path);

    let compute = HttpComputeClient::new(&config.endpoint, &config.api_token)?;
    let challenge =
        HttpChallengeService::new(&config.challenge_issue_url, &config.challenge_expiry_url)?;

    let mut reconciler_config = ReconcilerConfig::new(&config.account_id, &config.region);
    if let Some(attempts) = config.create_retry_attempts {
        reconciler_config.engine.create_retry_attempts = attempts;
    }
    if let Some(delay) = config.create_retry_delay_ms {
        reconciler_config.engine.create_retry_delay_ms = delay;
    }

    let (reconciler, mut events) = DomainReconciler::new(
        Arc::new(compute),
        Arc::new(challenge),
        reconciler_config,
    )?;

    // Render reconciler events as logs while the action runs
    let event_task = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            log_event(&event);
        }
    });

    let result = match config.action {
        Action::Deploy => {
            let outcomes = reconciler
                .deploy(
                    &specs,
                    &config.service_name,
                    &config.function_name,
                    config.only_domain.as_deref(),
                )
                .await;
            report_outcomes(&outcomes)
        }
        Action::Remove => reconciler
            .remove(
                &specs,
                &config.service_name,
                &config.function_name,
                config.only_domain.as_deref(),
            )
            .await
            .map_err(|e| anyhow::anyhow!(e)),
    };

    // The reconciler (and its event sender) is dropped here, closing the
    // channel and letting the logging task finish.
    drop(reconciler);
    let _ = event_task.await;

    result
}

/// Summarize deploy outcomes and fail if any domain did not converge
fn report_outcomes(outcomes: &[BindOutcome]) -> Result<()> {
    let mut failed = 0usize;

    for outcome in outcomes {
        match outcome {
            BindOutcome::Created { domain_name } => {
                info!("Domain {} created", domain_name);
            }
            BindOutcome::Updated { domain_name } => {
                info!("Domain {} updated", domain_name);
            }
            BindOutcome::UpdateFailed {
                domain_name,
                message,
            } => {
                warn!("Domain {} update failed: {}", domain_name, message);
                failed += 1;
            }
            BindOutcome::RetryExhausted {
                domain_name,
                attempts,
            } => {
                warn!(
                    "Domain {} not resolved after {} attempts",
                    domain_name, attempts
                );
                failed += 1;
            }
            BindOutcome::Failed {
                domain_name,
                message,
            } => {
                warn!("Domain {} failed: {}", domain_name, message);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} domain(s) did not converge", failed, outcomes.len());
    }

    info!("All {} domain(s) converged", outcomes.len());
    Ok(())
}

/// Render one reconciler event as a log line
fn log_event(event: &ReconcilerEvent) {
    match event {
        ReconcilerEvent::BindStarted { domain_name } => {
            info!("Binding domain: {}", domain_name);
        }
        ReconcilerEvent::DomainCreated { domain_name } => {
            info!("Created domain: {}", domain_name);
        }
        ReconcilerEvent::DomainUpdated { domain_name } => {
            info!("Updated domain: {}", domain_name);
        }
        ReconcilerEvent::UpdateFailed { domain_name, error } => {
            warn!("Update failed for {}: {}", domain_name, error);
        }
        ReconcilerEvent::CnameHintIssued {
            domain_name,
            endpoint,
        } => {
            warn!(
                "Domain {} is not resolved yet. Point a CNAME record at {} and creation will \
                complete on a later attempt.",
                domain_name, endpoint
            );
        }
        ReconcilerEvent::CreateRetrying {
            domain_name,
            attempt,
        } => {
            info!("Waiting for {} to resolve (attempt {})", domain_name, attempt);
        }
        ReconcilerEvent::RetryExhausted {
            domain_name,
            attempts,
        } => {
            warn!(
                "Gave up creating {} after {} attempts",
                domain_name, attempts
            );
        }
        ReconcilerEvent::TempDomainReused { domain_name } => {
            info!("Reusing temporary domain: {}", domain_name);
        }
        ReconcilerEvent::TempDomainProvisioned { domain_name } => {
            info!("Provisioned temporary domain: {}", domain_name);
        }
        ReconcilerEvent::ProvisioningFailed { error } => {
            warn!("Temporary domain provisioning failed: {}", error);
        }
        ReconcilerEvent::DomainDeleted { domain_name } => {
            info!("Deleted domain: {}", domain_name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_sentinel_passes_domain_validation() {
        assert!(validate_domain_name("AUTO").is_ok());
        assert!(validate_domain_name("auto").is_ok());
    }

    #[test]
    fn ordinary_domains_validate() {
        assert!(validate_domain_name("example.com").is_ok());
        assert!(validate_domain_name("sub.example.com").is_ok());
        assert!(validate_domain_name("abc.test.functioncompute.com").is_ok());
    }

    #[test]
    fn malformed_domains_rejected() {
        assert!(validate_domain_name("").is_err());
        assert!(validate_domain_name("ex..ample.com").is_err());
        assert!(validate_domain_name("-example.com").is_err());
        assert!(validate_domain_name("exa mple.com").is_err());
        assert!(validate_domain_name(&"a".repeat(254)).is_err());
    }

    #[test]
    fn overlong_label_rejected() {
        let label = "a".repeat(64);
        assert!(validate_domain_name(&format!("{label}.com")).is_err());
    }
}
