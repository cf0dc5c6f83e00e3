//! The FCL signing protocol state machine.
//!
//! One [`SigningOrchestrator`] serves one embedded page. It classifies each inbound message,
//! drops duplicates, asks the human for approval, signs through the host keystore and posts
//! polling responses back into the page.
//!
//! The session lock is never held across an `.await`. Each phase captures a [`PhaseTicket`]
//! when it starts and re-checks it after every suspension, so a phase overtaken by a newer one
//! can never write into the session or post into the page.

mod authz;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{
    account_proof::encode_account_proof,
    config::BridgeConfig,
    defaults::DomainTag,
    error::{BridgeError, ErrorDisposition},
    platform::{
        ApprovalPresenter, ApprovalRequest, ApprovalResult, FeePayerService, KeySigner,
        NetworkProvider,
    },
    primitives::{decode_hex, FlowAddress},
    roles::SigningObligation,
    session::{AuthzSubPhase, PendingAuthzTransaction, PhaseTicket, SessionPhase, SigningSession},
    template::{
        account_proof_response, authn_response, pre_authz_response, resolve_sponsorship,
        user_signature_response, CompositeSignature, SignedAccountProof, READY_TEMPLATE,
    },
    transport::PagePoster,
    wire::{
        AppInfo, AuthnRequest, InboundMessage, PhaseRequest, PhaseResponse, Service, ServiceType,
        UserSignatureRequest,
    },
};
use authz::authz_obligation;

/// Host capabilities the orchestrator drives.
pub struct Collaborators {
    pub approvals: Arc<dyn ApprovalPresenter>,
    pub signer: Arc<dyn KeySigner>,
    pub fee_payer: Arc<dyn FeePayerService>,
    pub network: Arc<dyn NetworkProvider>,
}

pub struct SigningOrchestrator {
    session_id: String,
    config: BridgeConfig,
    wallet: FlowAddress,
    collaborators: Collaborators,
    page: Arc<PagePoster>,
    session: Mutex<SigningSession>,
}

impl SigningOrchestrator {
    pub fn new(
        session_id: String,
        config: BridgeConfig,
        collaborators: Collaborators,
        page: Arc<PagePoster>,
    ) -> Result<Self, BridgeError> {
        config.validate()?;
        let wallet = config.wallet()?;
        Ok(Self {
            session_id,
            config,
            wallet,
            collaborators,
            page,
            session: Mutex::new(SigningSession::default()),
        })
    }

    fn lock(&self) -> MutexGuard<'_, SigningSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn phase(&self) -> SessionPhase {
        self.lock().phase
    }

    pub fn ready_to_sign_envelope(&self) -> bool {
        self.lock().ready_to_sign_envelope
    }

    /// Removes the transaction waiting for its submitted id.
    pub fn take_pending_transaction(&self) -> Option<PendingAuthzTransaction> {
        self.lock().pending_authz_transaction.take()
    }

    /// Abandons whatever is in progress. Results of suspended phases are discarded.
    pub fn reset(&self) {
        log::info!("[{}] session reset by host", self.session_id);
        self.lock().reset_all();
    }

    /// Handles one raw message from the generic page channel.
    ///
    /// # Errors
    /// Returns the error that ended the phase, after it has been handled: the session is
    /// reset and the user is notified or routed to the network switcher as the error's
    /// [`ErrorDisposition`] requires.
    pub async fn handle_message(&self, raw: &str) -> Result<(), BridgeError> {
        log::debug!("[{}] page message: {raw}", self.session_id);
        let accepted = self.lock().accept_raw(raw);
        if !accepted {
            log::debug!("[{}] dropping repeated page message", self.session_id);
            return Ok(());
        }

        let message = match InboundMessage::classify(raw) {
            Ok(message) => message,
            Err(error) => return Err(self.fail(None, error)),
        };
        match message {
            InboundMessage::ServiceDiscovery(service) => {
                self.on_service_discovery(service.kind()).await
            }
            InboundMessage::PhaseResponse(response) => self.on_phase_response(&response).await,
            InboundMessage::Unrecognized => {
                log::trace!("[{}] ignoring unrecognized page message", self.session_id);
                Ok(())
            }
        }
    }

    async fn on_service_discovery(&self, service_type: ServiceType) -> Result<(), BridgeError> {
        log::debug!("[{}] service discovered: {service_type}", self.session_id);
        self.lock().await_decision(service_type);

        if service_type != ServiceType::PreAuthz {
            return self.page.post(READY_TEMPLATE).await.map_err(|e| self.fail(None, e));
        }

        let result = async {
            let sponsorship = resolve_sponsorship(
                self.collaborators.fee_payer.as_ref(),
                &self.config,
                &self.session_id,
            )
            .await?
            .ok_or_else(|| BridgeError::Generic {
                error: "pre-authz requested but fee sponsorship is not available".to_string(),
            })?;
            let response = pre_authz_response(&self.config, sponsorship)?;
            self.page.post(&response).await
        }
        .await;
        result.map_err(|e| self.fail(None, e))
    }

    async fn on_phase_response(&self, response: &PhaseResponse) -> Result<(), BridgeError> {
        let announced = response
            .service
            .as_ref()
            .map(Service::kind)
            .filter(|kind| *kind != ServiceType::Unknown);
        let active = self.lock().active_service_type;
        let service_type = announced.or(active).unwrap_or(ServiceType::Unknown);

        let request = match PhaseRequest::decode(service_type, response) {
            Ok(request) => request,
            Err(error) => return Err(self.fail(None, error)),
        };
        let response_id = request.unique_id(&response.response_type);
        let phase = match &request {
            PhaseRequest::Authn(_) | PhaseRequest::AccountProof(_) => {
                SessionPhase::ProcessingAuthn
            }
            PhaseRequest::Authz(authz) => match authz_obligation(authz) {
                Ok(SigningObligation::SignEnvelope) => {
                    // an envelope that is not armed must not supersede the payload phase
                    if !self.ready_to_sign_envelope() {
                        return Err(self.fail(None, BridgeError::OutOfOrderEnvelope));
                    }
                    SessionPhase::ProcessingAuthz {
                        sub_phase: AuthzSubPhase::SignEnvelope,
                    }
                }
                Ok(SigningObligation::AccountLink) => SessionPhase::ProcessingAccountLink,
                _ => SessionPhase::ProcessingAuthz {
                    sub_phase: AuthzSubPhase::SignPayload,
                },
            },
            PhaseRequest::UserSignature(_) => SessionPhase::ProcessingUserSignature,
        };

        let ticket = self.lock().begin(service_type, response_id.clone(), phase);
        let Some(ticket) = ticket else {
            log::debug!(
                "[{}] dropping duplicate phase response {response_id}",
                self.session_id
            );
            return Ok(());
        };
        log::info!("[{}] starting phase {response_id}", self.session_id);

        if let Err(error) = self.check_network(response) {
            return Err(self.fail(Some(&ticket), error));
        }

        let app = response.app_info();
        let result = match request {
            PhaseRequest::Authn(request) => self.process_authn(&ticket, app, &request).await,
            PhaseRequest::AccountProof(request) => {
                self.process_account_proof(&ticket, &request).await
            }
            PhaseRequest::Authz(request) => self.process_authz(&ticket, app, request).await,
            PhaseRequest::UserSignature(request) => {
                self.process_user_signature(&ticket, app, &request).await
            }
        };
        result.map_err(|error| self.fail(Some(&ticket), error))
    }

    fn check_network(&self, response: &PhaseResponse) -> Result<(), BridgeError> {
        let Some(requested) = response.network() else {
            return Ok(());
        };
        let current = self.collaborators.network.current_network();
        if requested == current {
            return Ok(());
        }
        self.collaborators.network.switch_network_prompt(
            self.session_id.clone(),
            current,
            requested,
        );
        Err(BridgeError::NetworkMismatch { current, requested })
    }

    async fn process_authn(
        &self,
        ticket: &PhaseTicket,
        app: AppInfo,
        request: &AuthnRequest,
    ) -> Result<(), BridgeError> {
        let challenge = match request.challenge_nonce() {
            Some(nonce) => Some((
                nonce,
                encode_account_proof(
                    &self.wallet,
                    nonce,
                    request.app_identifier.as_deref(),
                    true,
                )
                .map_err(page_input)?,
            )),
            None => None,
        };

        let network = self.collaborators.network.current_network();
        self.approve(ticket, ApprovalRequest::Authn { app, network })
            .await?;

        let account_proof = match challenge {
            Some((nonce, message)) => {
                let signature = self.sign(ticket, message).await?;
                Some(SignedAccountProof {
                    nonce: nonce.to_string(),
                    signature: hex::encode(signature),
                })
            }
            None => None,
        };

        let sponsorship = resolve_sponsorship(
            self.collaborators.fee_payer.as_ref(),
            &self.config,
            &self.session_id,
        )
        .await?;
        let response = authn_response(&self.config, sponsorship, account_proof.as_ref())?;
        self.complete(ticket, &response).await
    }

    async fn process_account_proof(
        &self,
        ticket: &PhaseTicket,
        request: &AuthnRequest,
    ) -> Result<(), BridgeError> {
        let nonce = request.challenge_nonce().ok_or_else(|| BridgeError::Decode {
            error: "account-proof request without a nonce".to_string(),
        })?;
        let message =
            encode_account_proof(&self.wallet, nonce, request.app_identifier.as_deref(), true)
                .map_err(page_input)?;
        let signature = self.sign(ticket, message).await?;
        let response = account_proof_response(
            &self.config,
            &SignedAccountProof {
                nonce: nonce.to_string(),
                signature: hex::encode(signature),
            },
        )?;
        self.complete(ticket, &response).await
    }

    async fn process_user_signature(
        &self,
        ticket: &PhaseTicket,
        app: AppInfo,
        request: &UserSignatureRequest,
    ) -> Result<(), BridgeError> {
        let message = decode_hex(&request.message_to_sign, "message").map_err(page_input)?;
        self.approve(
            ticket,
            ApprovalRequest::UserSignature {
                app,
                message: request.readable_message(),
            },
        )
        .await?;

        let signature = self.sign(ticket, DomainTag::User.prefix(&message)).await?;
        let response = user_signature_response(&CompositeSignature {
            address: self.wallet,
            key_id: self.config.key_index,
            signature: hex::encode(signature),
        })?;
        self.complete(ticket, &response).await
    }

    /// Asks the human. Resolves to the result only if the phase is still current and the
    /// request was approved.
    async fn approve(
        &self,
        ticket: &PhaseTicket,
        request: ApprovalRequest,
    ) -> Result<ApprovalResult, BridgeError> {
        let result = self
            .collaborators
            .approvals
            .present_approval(self.session_id.clone(), request)
            .await?;
        self.ensure_current(ticket)?;
        if !result.approved {
            return Err(BridgeError::ApprovalDenied);
        }
        Ok(result)
    }

    async fn sign(&self, ticket: &PhaseTicket, message: Vec<u8>) -> Result<Vec<u8>, BridgeError> {
        let signature = self
            .collaborators
            .signer
            .sign(self.session_id.clone(), message)
            .await
            .map_err(|e| match e {
                BridgeError::SigningFailure { .. } => e,
                other => BridgeError::SigningFailure {
                    error: other.to_string(),
                },
            })?;
        self.ensure_current(ticket)?;
        Ok(signature)
    }

    fn ensure_current(&self, ticket: &PhaseTicket) -> Result<(), BridgeError> {
        let current = self.lock().is_current(ticket);
        if current {
            Ok(())
        } else {
            Err(BridgeError::StalePhase)
        }
    }

    /// Posts the phase's response and ends the phase.
    async fn complete(&self, ticket: &PhaseTicket, response: &str) -> Result<(), BridgeError> {
        self.ensure_current(ticket)?;
        self.page.post(response).await?;
        self.lock().finish(ticket);
        log::info!("[{}] phase {} complete", self.session_id, ticket.response_id);
        Ok(())
    }

    /// Applies the failure policy for `error` and hands it back.
    ///
    /// A failure of a superseded phase has no side effects. A failure without a phase (bad
    /// discovery or undecodable message) leaves the session as it was.
    fn fail(&self, ticket: Option<&PhaseTicket>, error: BridgeError) -> BridgeError {
        if let Some(ticket) = ticket {
            let current = self.lock().reset(ticket);
            if !current {
                log::warn!(
                    "[{}] discarding result of superseded phase {}: {error}",
                    self.session_id,
                    ticket.response_id
                );
                return error;
            }
        }

        match error.disposition() {
            ErrorDisposition::RecoverSilently => {
                if matches!(error, BridgeError::ApprovalDenied) {
                    log::info!("[{}] request declined", self.session_id);
                } else {
                    log::warn!("[{}] dropping message: {error}", self.session_id);
                }
            }
            ErrorDisposition::SwitchNetwork => {
                log::warn!("[{}] {error}", self.session_id);
            }
            ErrorDisposition::SurfaceToUser => {
                log::error!("[{}] phase failed: {error}", self.session_id);
                self.collaborators
                    .approvals
                    .present_failure(self.session_id.clone(), error.to_string());
            }
        }
        error
    }
}

/// Malformed values inside a page message make the whole message malformed.
fn page_input(error: BridgeError) -> BridgeError {
    match error {
        BridgeError::InvalidInput { .. } => BridgeError::Decode {
            error: error.to_string(),
        },
        other => other,
    }
}
