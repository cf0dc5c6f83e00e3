//! Mutable state of one embedded-browser signing session.

use crate::wire::{AppInfo, ServiceType, UniqueId, Voucher};

/// Step of an authz flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum AuthzSubPhase {
    /// Waiting for approval to sign the payload (or the whole transaction).
    SignPayload,
    /// Payload signed; the envelope phase may start.
    AwaitEnvelopeReady,
    /// Waiting for the fee payer to countersign the envelope.
    SignEnvelope,
}

/// Where the session is in the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum SessionPhase {
    /// Nothing in progress.
    Idle,
    /// A service was acknowledged; waiting for its phase response.
    AwaitingServiceDecision,
    /// Handling authn or a standalone account proof.
    ProcessingAuthn,
    /// Handling a transaction authorization.
    ProcessingAuthz {
        /// Current step.
        sub_phase: AuthzSubPhase,
    },
    /// Handling a user message signature.
    ProcessingUserSignature,
    /// Waiting on the account-linking approval.
    ProcessingAccountLink,
}

/// Authz signature produced by the wallet, waiting for the page to report the transaction id.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingAuthzTransaction {
    /// Host of the dApp.
    pub url: Option<String>,
    /// Title of the dApp.
    pub title: Option<String>,
    /// The voucher that was signed.
    pub voucher: Voucher,
}

/// An outstanding account-linking approval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkAccountHandle {
    /// Generation of the phase that opened the approval.
    pub generation: u64,
    /// The requesting dApp.
    pub app: AppInfo,
}

/// Identity of a phase, captured when it starts and checked before applying any result that
/// resolves after a suspension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseTicket {
    pub generation: u64,
    pub response_id: UniqueId,
}

/// The orchestrator's state. Owned by exactly one bridge.
#[derive(Debug)]
pub struct SigningSession {
    pub in_flight_message_raw: Option<String>,
    pub active_service_type: Option<ServiceType>,
    pub active_response_id: Option<UniqueId>,
    pub ready_to_sign_envelope: bool,
    pub pending_authz_transaction: Option<PendingAuthzTransaction>,
    pub pending_link_account: Option<LinkAccountHandle>,
    pub phase: SessionPhase,
    generation: u64,
}

impl Default for SigningSession {
    fn default() -> Self {
        Self {
            in_flight_message_raw: None,
            active_service_type: None,
            active_response_id: None,
            ready_to_sign_envelope: false,
            pending_authz_transaction: None,
            pending_link_account: None,
            phase: SessionPhase::Idle,
            generation: 0,
        }
    }
}

impl SigningSession {
    /// Records `raw` as the message being handled. Returns `false` for an exact repeat.
    pub fn accept_raw(&mut self, raw: &str) -> bool {
        if self.in_flight_message_raw.as_deref() == Some(raw) {
            return false;
        }
        self.in_flight_message_raw = Some(raw.to_string());
        true
    }

    /// A service was acknowledged.
    pub fn await_decision(&mut self, service_type: ServiceType) {
        self.active_service_type = Some(service_type);
        if !matches!(self.phase, SessionPhase::ProcessingAuthz { .. }) {
            self.phase = SessionPhase::AwaitingServiceDecision;
        }
    }

    /// Starts a phase for `response_id`. Returns `None` if that id is already active.
    ///
    /// Starting a phase supersedes any phase still suspended: its ticket stops being current.
    pub fn begin(
        &mut self,
        service_type: ServiceType,
        response_id: UniqueId,
        phase: SessionPhase,
    ) -> Option<PhaseTicket> {
        if self.active_response_id.as_ref() == Some(&response_id) {
            return None;
        }
        self.generation += 1;
        self.active_service_type = Some(service_type);
        self.active_response_id = Some(response_id.clone());
        self.phase = phase;
        Some(PhaseTicket {
            generation: self.generation,
            response_id,
        })
    }

    /// Whether `ticket` still identifies the active phase.
    pub fn is_current(&self, ticket: &PhaseTicket) -> bool {
        self.generation == ticket.generation
            && self.active_response_id.as_ref() == Some(&ticket.response_id)
    }

    /// Moves the active phase along, if `ticket` is still current.
    pub fn advance(&mut self, ticket: &PhaseTicket, phase: SessionPhase) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.phase = phase;
        true
    }

    /// Completes the phase identified by `ticket`. The envelope flag and pending transaction
    /// survive so the next phase can use them.
    pub fn finish(&mut self, ticket: &PhaseTicket) {
        if !self.is_current(ticket) {
            return;
        }
        self.clear_active();
        self.phase = if self.ready_to_sign_envelope {
            SessionPhase::ProcessingAuthz {
                sub_phase: AuthzSubPhase::AwaitEnvelopeReady,
            }
        } else {
            SessionPhase::Idle
        };
    }

    /// Abandons the phase identified by `ticket` and drops envelope readiness. Returns `false`
    /// without touching anything if the ticket is stale.
    pub fn reset(&mut self, ticket: &PhaseTicket) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.reset_all();
        true
    }

    /// Returns to an empty session regardless of what is active.
    pub fn reset_all(&mut self) {
        self.clear_active();
        self.ready_to_sign_envelope = false;
        self.pending_link_account = None;
        self.phase = SessionPhase::Idle;
    }

    fn clear_active(&mut self) {
        self.in_flight_message_raw = None;
        self.active_service_type = None;
        self.active_response_id = None;
    }
}
