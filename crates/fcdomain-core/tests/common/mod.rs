//! Test doubles and common utilities for reconciler contract tests
//!
//! The mocks share their recorded state behind `Arc`s, so a test can keep
//! its own handle while the reconciler owns a clone coerced to the trait
//! object.

#![allow(dead_code)]

use async_trait::async_trait;
use fcdomain_core::error::{Error, Result};
use fcdomain_core::traits::{ChallengeService, ComputeClient};
use fcdomain_core::types::{
    DomainOptions, FunctionDefinition, RemoteDomainBinding, RemoteRoute, RemoteRouteConfig,
    ServiceDefinition, TempDomainExpiry, TriggerDefinition,
};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Build a remote binding with a single route targeting `service`/`function`
pub fn remote_binding(name: &str, service: &str, function: &str) -> RemoteDomainBinding {
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

/// Scripted behavior for one delete_domain call
#[derive(Clone)]
pub enum DeleteBehavior {
    Ok,
    /// Platform "already absent" error code
    NotFoundCode,
    /// Any other remote error
    Error(String),
}

#[derive(Default)]
struct ComputeState {
    /// Bindings visible to get_domain/list_domains
    domains: Vec<RemoteDomainBinding>,
    /// Scripted create_domain failures, popped per call; empty = success
    create_failures: VecDeque<String>,
    /// When set, update_domain fails with this message
    update_failure: Option<String>,
    /// Per-name delete behavior; absent = Ok
    delete_behaviors: HashMap<String, DeleteBehavior>,
    /// Recorded (name, options) pairs from create_domain
    created: Vec<(String, DomainOptions)>,
    /// Recorded (name, options) pairs from update_domain
    updated: Vec<(String, DomainOptions)>,
    /// Recorded names from delete_domain
    deleted: Vec<String>,
    /// Recorded function names from create_function
    created_functions: Vec<String>,
    /// When set, delete_trigger fails with this message
    delete_trigger_failure: Option<String>,
}

/// A mock ComputeClient with scripted responses and call counters
pub struct MockComputeClient {
    state: Mutex<ComputeState>,
    get_calls: AtomicUsize,
    create_calls: AtomicUsize,
    update_calls: AtomicUsize,
    delete_calls: AtomicUsize,
    list_calls: AtomicUsize,
    create_service_calls: AtomicUsize,
    create_function_calls: AtomicUsize,
    create_trigger_calls: AtomicUsize,
    delete_service_calls: AtomicUsize,
    delete_function_calls: AtomicUsize,
    delete_trigger_calls: AtomicUsize,
}

impl MockComputeClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(ComputeState::default()),
            get_calls: AtomicUsize::new(0),
            create_calls: AtomicUsize::new(0),
            update_calls: AtomicUsize::new(0),
            delete_calls: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
            create_service_calls: AtomicUsize::new(0),
            create_function_calls: AtomicUsize::new(0),
            create_trigger_calls: AtomicUsize::new(0),
            delete_service_calls: AtomicUsize::new(0),
            delete_function_calls: AtomicUsize::new(0),
            delete_trigger_calls: AtomicUsize::new(0),
        })
    }

    /// Seed a binding visible to get_domain and list_domains
    pub fn seed_domain(&self, binding: RemoteDomainBinding) {
        self.state.lock().unwrap().domains.push(binding);
    }

    /// Queue a create_domain failure message (one per call)
    pub fn push_create_failure(&self, message: impl Into<String>) {
        self.state
            .lock()
            .unwrap()
            .create_failures
            .push_back(message.into());
    }

    /// Queue `n` identical create_domain failures
    pub fn push_create_failures(&self, message: &str, n: usize) {
        let mut state = self.state.lock().unwrap();
        for _ in 0..n {
            state.create_failures.push_back(message.to_string());
        }
    }

    /// Make update_domain fail with the given message
    pub fn fail_updates(&self, message: impl Into<String>) {
        self.state.lock().unwrap().update_failure = Some(message.into());
    }

    /// Script the delete behavior for one domain name
    pub fn set_delete_behavior(&self, name: &str, behavior: DeleteBehavior) {
        self.state
            .lock()
            .unwrap()
            .delete_behaviors
            .insert(name.to_string(), behavior);
    }

    /// Make delete_trigger fail with the given message
    pub fn fail_trigger_deletes(&self, message: impl Into<String>) {
        self.state.lock().unwrap().delete_trigger_failure = Some(message.into());
    }

    pub fn get_call_count(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn create_call_count(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn update_call_count(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    pub fn delete_call_count(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    pub fn list_call_count(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn create_service_call_count(&self) -> usize {
        self.create_service_calls.load(Ordering::SeqCst)
    }

    pub fn create_function_call_count(&self) -> usize {
        self.create_function_calls.load(Ordering::SeqCst)
    }

    pub fn create_trigger_call_count(&self) -> usize {
        self.create_trigger_calls.load(Ordering::SeqCst)
    }

    pub fn delete_service_call_count(&self) -> usize {
        self.delete_service_calls.load(Ordering::SeqCst)
    }

    pub fn delete_function_call_count(&self) -> usize {
        self.delete_function_calls.load(Ordering::SeqCst)
    }

    pub fn delete_trigger_call_count(&self) -> usize {
        self.delete_trigger_calls.load(Ordering::SeqCst)
    }

    /// Recorded (name, options) pairs from create_domain
    pub fn created(&self) -> Vec<(String, DomainOptions)> {
        self.state.lock().unwrap().created.clone()
    }

    /// Recorded (name, options) pairs from update_domain
    pub fn updated(&self) -> Vec<(String, DomainOptions)> {
        self.state.lock().unwrap().updated.clone()
    }

    /// Recorded names from delete_domain
    pub fn deleted(&self) -> Vec<String> {
        self.state.lock().unwrap().deleted.clone()
    }

    /// Recorded function names from create_function
    pub fn created_functions(&self) -> Vec<String> {
        self.state.lock().unwrap().created_functions.clone()
    }
}

#[async_trait]
impl ComputeClient for MockComputeClient {
    async fn get_domain(&self, domain_name: &str) -> Result<RemoteDomainBinding> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        state
            .domains
            .iter()
            .find(|b| b.domain_name == domain_name)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("domain {domain_name} not found")))
    }

    async fn create_domain(&self, domain_name: &str, options: &DomainOptions) -> Result<()> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        if let Some(message) = state.create_failures.pop_front() {
            return Err(Error::api(message));
        }
        state.created.push((domain_name.to_string(), options.clone()));
        Ok(())
    }

    async fn update_domain(&self, domain_name: &str, options: &DomainOptions) -> Result<()> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        if let Some(message) = state.update_failure.clone() {
            return Err(Error::api(message));
        }
        state.updated.push((domain_name.to_string(), options.clone()));
        Ok(())
    }

    async fn delete_domain(&self, domain_name: &str) -> Result<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        state.deleted.push(domain_name.to_string());
        match state.delete_behaviors.get(domain_name) {
            None | Some(DeleteBehavior::Ok) => Ok(()),
            Some(DeleteBehavior::NotFoundCode) => Err(Error::api_with_code(
                "DomainNameNotFound",
                format!("domain name {domain_name} not found"),
            )),
            Some(DeleteBehavior::Error(message)) => Err(Error::api(message.clone())),
        }
    }

    async fn list_domains(&self) -> Result<Vec<RemoteDomainBinding>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.state.lock().unwrap().domains.clone())
    }

    async fn create_service(&self, _definition: &ServiceDefinition) -> Result<()> {
        self.create_service_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn create_function(
        &self,
        _service_name: &str,
        definition: &FunctionDefinition,
    ) -> Result<()> {
        self.create_function_calls.fetch_add(1, Ordering::SeqCst);
        self.state
            .lock()
            .unwrap()
            .created_functions
            .push(definition.function_name.clone());
        Ok(())
    }

    async fn create_trigger(
        &self,
        _service_name: &str,
        _function_name: &str,
        _definition: &TriggerDefinition,
    ) -> Result<()> {
        self.create_trigger_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete_service(&self, _service_name: &str) -> Result<()> {
        self.delete_service_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete_function(&self, _service_name: &str, _function_name: &str) -> Result<()> {
        self.delete_function_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete_trigger(
        &self,
        _service_name: &str,
        _function_name: &str,
        _trigger_name: &str,
    ) -> Result<()> {
        self.delete_trigger_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        if let Some(message) = state.delete_trigger_failure.clone() {
            return Err(Error::api(message));
        }
        Ok(())
    }
}

#[derive(Default)]
struct ChallengeState {
    /// When set, request_token fails with this message
    token_failure: Option<String>,
    /// When set, request_domain fails with this message
    domain_failure: Option<String>,
    /// Per-domain expiry metadata; absent = far future
    expiries: HashMap<String, TempDomainExpiry>,
}

/// A mock ChallengeService with scripted responses and call counters
pub struct MockChallengeService {
    state: Mutex<ChallengeState>,
    /// Token handed out by request_token
    pub token: String,
    /// Domain handed out by request_domain
    pub issued_domain: String,
    token_calls: AtomicUsize,
    domain_calls: AtomicUsize,
    expiry_calls: AtomicUsize,
}

impl MockChallengeService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(ChallengeState::default()),
            token: "tok1234567890".to_string(),
            issued_domain: "fresh.test.functioncompute.com".to_string(),
            token_calls: AtomicUsize::new(0),
            domain_calls: AtomicUsize::new(0),
            expiry_calls: AtomicUsize::new(0),
        })
    }

    pub fn fail_token_requests(&self, message: impl Into<String>) {
        self.state.lock().unwrap().token_failure = Some(message.into());
    }

    pub fn fail_domain_requests(&self, message: impl Into<String>) {
        self.state.lock().unwrap().domain_failure = Some(message.into());
    }

    /// Script the expiry metadata for a domain
    pub fn set_expiry(&self, domain_name: &str, expired_time: i64) {
        self.state.lock().unwrap().expiries.insert(
            domain_name.to_string(),
            TempDomainExpiry {
                expired_time,
                times_limit: 1000,
            },
        );
    }

    pub fn token_call_count(&self) -> usize {
        self.token_calls.load(Ordering::SeqCst)
    }

    pub fn domain_call_count(&self) -> usize {
        self.domain_calls.load(Ordering::SeqCst)
    }

    pub fn expiry_call_count(&self) -> usize {
        self.expiry_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChallengeService for MockChallengeService {
    async fn request_token(&self, _account_id: &str, _region: &str) -> Result<String> {
        self.token_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.state.lock().unwrap().token_failure.clone() {
            return Err(Error::http(message));
        }
        Ok(self.token.clone())
    }

    async fn request_domain(
        &self,
        _account_id: &str,
        _region: &str,
        _token: &str,
    ) -> Result<String> {
        self.domain_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.state.lock().unwrap().domain_failure.clone() {
            return Err(Error::http(message));
        }
        Ok(self.issued_domain.clone())
    }

    async fn expiry(&self, domain_name: &str) -> Result<TempDomainExpiry> {
        self.expiry_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .state
            .lock()
            .unwrap()
            .expiries
            .get(domain_name)
            .copied()
            .unwrap_or(TempDomainExpiry {
                expired_time: i64::MAX,
                times_limit: 1000,
            }))
    }
}

/// Helper to create a minimal ReconcilerConfig for testing
pub fn minimal_config() -> fcdomain_core::config::ReconcilerConfig {
    fcdomain_core::config::ReconcilerConfig::new("1234567890", "cn-test")
}

/// Helper to build a reconciler over the given mocks
pub fn reconciler(
    compute: &Arc<MockComputeClient>,
    challenge: &Arc<MockChallengeService>,
    config: fcdomain_core::config::ReconcilerConfig,
) -> (
    fcdomain_core::DomainReconciler,
    tokio::sync::mpsc::Receiver<fcdomain_core::ReconcilerEvent>,
) {
    fcdomain_core::DomainReconciler::new(
        Arc::clone(compute) as Arc<dyn ComputeClient>,
        Arc::clone(challenge) as Arc<dyn ChallengeService>,
        config,
    )
    .expect("reconciler construction succeeds")
}

/// Drain all currently-buffered events from the receiver
pub fn drain_events(
    rx: &mut tokio::sync::mpsc::Receiver<fcdomain_core::ReconcilerEvent>,
) -> Vec<fcdomain_core::ReconcilerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
