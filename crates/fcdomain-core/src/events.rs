//! Events emitted by the reconciler
//!
//! Operator-facing progress and hints flow through a bounded channel
//! created by [`crate::DomainReconciler::new`], instead of an implicit
//! process-wide logger. The channel is lossy under backpressure: when
//! full, events are dropped with a warning log.

use tokio::sync::mpsc;
use tracing::warn;

/// Events emitted while reconciling domain bindings
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcilerEvent {
    /// A bind operation started for a domain spec
    BindStarted {
        domain_name: String,
    },

    /// The binding did not exist and was created
    DomainCreated {
        domain_name: String,
    },

    /// The binding existed and was updated in place
    DomainUpdated {
        domain_name: String,
    },

    /// The in-place update failed; the binding keeps its previous shape
    UpdateFailed {
        domain_name: String,
        error: String,
    },

    /// One-time hint: the operator must CNAME the domain to the platform
    /// endpoint before creation can complete
    CnameHintIssued {
        domain_name: String,
        endpoint: String,
    },

    /// Creation reported the domain as not yet resolved; retrying
    CreateRetrying {
        domain_name: String,
        attempt: usize,
    },

    /// All creation attempts were exhausted without a completed binding
    RetryExhausted {
        domain_name: String,
        attempts: usize,
    },

    /// An unexpired temporary domain matching the target was reused
    TempDomainReused {
        domain_name: String,
    },

    /// A fresh temporary domain was issued by the challenge service
    TempDomainProvisioned {
        domain_name: String,
    },

    /// Temporary-domain issuance failed
    ProvisioningFailed {
        error: String,
    },

    /// A binding was deleted (or was already absent)
    DomainDeleted {
        domain_name: String,
    },
}

/// Shared event sender used by the binder, provisioner and driver
#[derive(Clone)]
pub(crate) struct EventSink {
    tx: mpsc::Sender<ReconcilerEvent>,
}

impl EventSink {
    pub(crate) fn new(capacity: usize) -> (Self, mpsc::Receiver<ReconcilerEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// Emit an event, dropping it with a warning when the channel is full
    pub(crate) fn emit(&self, event: ReconcilerEvent) {
        if self.tx.try_send(event).is_err() {
            warn!("Event channel full, dropping reconciler event");
        }
    }
}
