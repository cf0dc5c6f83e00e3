//! Transaction authorization: payload, envelope and account-link flows.

use super::{page_input, SigningOrchestrator};
use crate::{
    defaults::DomainTag,
    error::BridgeError,
    platform::{ApprovalRequest, RemoteSignature},
    primitives::{decode_hex, FlowAddress, ParseFromForeignBinding},
    roles::{resolve_obligation, resolve_roles, SigningObligation},
    session::{AuthzSubPhase, LinkAccountHandle, PendingAuthzTransaction, PhaseTicket, SessionPhase},
    template::{authz_response, CompositeSignature},
    wire::{AppInfo, AuthzRequest},
};

/// What an authz request asks of the wallet. The payer-only half of an account-linking
/// transaction is an ordinary envelope: the link approval armed it and the fee payer signs it.
pub(super) fn authz_obligation(request: &AuthzRequest) -> Result<SigningObligation, BridgeError> {
    match resolve_obligation(request.script(), request.roles)? {
        SigningObligation::AccountLink
            if matches!(resolve_roles(request.roles), Ok(SigningObligation::SignEnvelope)) =>
        {
            Ok(SigningObligation::SignEnvelope)
        }
        obligation => Ok(obligation),
    }
}

impl SigningOrchestrator {
    pub(super) async fn process_authz(
        &self,
        ticket: &PhaseTicket,
        app: AppInfo,
        request: AuthzRequest,
    ) -> Result<(), BridgeError> {
        let obligation = authz_obligation(&request)?;
        log::debug!("[{}] authz obligation: {obligation:?}", self.session_id);
        match obligation {
            SigningObligation::SignAuthz | SigningObligation::SignPayload => {
                self.sign_payload(ticket, app, request, obligation).await
            }
            SigningObligation::SignEnvelope => self.sign_envelope(ticket, app, request).await,
            SigningObligation::AccountLink => self.link_account(ticket, app, request).await,
        }
    }

    /// Signs as proposer and authorizer. For a payload-only request the envelope phase is
    /// armed before the response is posted.
    async fn sign_payload(
        &self,
        ticket: &PhaseTicket,
        app: AppInfo,
        request: AuthzRequest,
        obligation: SigningObligation,
    ) -> Result<(), BridgeError> {
        let message = decode_hex(&request.message_hex, "message").map_err(page_input)?;
        self.approve(
            ticket,
            ApprovalRequest::Authz {
                app: app.clone(),
                cadence: request.script().to_string(),
                arguments: request.voucher.arguments(),
            },
        )
        .await?;

        let signature = self
            .sign(ticket, DomainTag::Transaction.prefix(&message))
            .await?;
        let response = authz_response(&CompositeSignature {
            address: self.wallet,
            key_id: self.config.key_index,
            signature: hex::encode(signature),
        })?;

        self.store_signed(ticket, app, request, obligation == SigningObligation::SignPayload)?;
        self.complete(ticket, &response).await
    }

    /// Has the fee payer countersign the envelope. Only valid once a payload was signed.
    async fn sign_envelope(
        &self,
        ticket: &PhaseTicket,
        app: AppInfo,
        request: AuthzRequest,
    ) -> Result<(), BridgeError> {
        let ready = {
            let mut session = self.lock();
            let ready = session.ready_to_sign_envelope;
            if ready {
                session.advance(
                    ticket,
                    SessionPhase::ProcessingAuthz {
                        sub_phase: AuthzSubPhase::SignEnvelope,
                    },
                );
            }
            ready
        };
        if !ready {
            return Err(BridgeError::OutOfOrderEnvelope);
        }

        let remote = self
            .collaborators
            .fee_payer
            .sign_envelope(
                self.session_id.clone(),
                request.voucher.to_json(),
                request.message_hex.clone(),
            )
            .await
            .map_err(|e| match e {
                BridgeError::RemoteSigningFailure { .. } => e,
                other => BridgeError::RemoteSigningFailure {
                    error: other.to_string(),
                },
            })?;
        self.ensure_current(ticket)?;

        let response = authz_response(&envelope_signature(remote)?)?;
        self.store_signed(ticket, app, request, false)?;
        self.complete(ticket, &response).await
    }

    /// Account-linking transactions get their own approval. The answer also decides whether
    /// the envelope phase that follows may be signed.
    async fn link_account(
        &self,
        ticket: &PhaseTicket,
        app: AppInfo,
        request: AuthzRequest,
    ) -> Result<(), BridgeError> {
        let message = decode_hex(&request.message_hex, "message").map_err(page_input)?;
        {
            let mut session = self.lock();
            session.advance(ticket, SessionPhase::ProcessingAccountLink);
            session.pending_link_account = Some(LinkAccountHandle {
                generation: ticket.generation,
                app: app.clone(),
            });
        }

        let result = self
            .collaborators
            .approvals
            .present_approval(
                self.session_id.clone(),
                ApprovalRequest::AccountLink {
                    app: app.clone(),
                    cadence: request.script().to_string(),
                },
            )
            .await?;
        {
            let mut session = self.lock();
            if !session.is_current(ticket) {
                return Err(BridgeError::StalePhase);
            }
            session.pending_link_account = None;
            session.ready_to_sign_envelope = result.approved;
        }
        if !result.approved {
            return Err(BridgeError::ApprovalDenied);
        }

        let signature = self
            .sign(ticket, DomainTag::Transaction.prefix(&message))
            .await?;
        let response = authz_response(&CompositeSignature {
            address: self.wallet,
            key_id: self.config.key_index,
            signature: hex::encode(signature),
        })?;
        self.store_signed(ticket, app, request, true)?;
        self.complete(ticket, &response).await
    }

    /// Records the signed transaction for the submission channel and sets envelope readiness.
    fn store_signed(
        &self,
        ticket: &PhaseTicket,
        app: AppInfo,
        request: AuthzRequest,
        ready_to_sign_envelope: bool,
    ) -> Result<(), BridgeError> {
        let pending = PendingAuthzTransaction {
            url: app.url,
            title: app.title,
            voucher: request.voucher,
        };
        let mut session = self.lock();
        if !session.is_current(ticket) {
            return Err(BridgeError::StalePhase);
        }
        session.ready_to_sign_envelope = ready_to_sign_envelope;
        session.pending_authz_transaction = Some(pending);
        drop(session);
        Ok(())
    }
}

fn envelope_signature(remote: RemoteSignature) -> Result<CompositeSignature, BridgeError> {
    let address = FlowAddress::parse_from_ffi(&remote.address, "fee_payer_address").map_err(
        |e| BridgeError::RemoteSigningFailure {
            error: format!("fee payer returned an invalid address: {e}"),
        },
    )?;
    Ok(CompositeSignature {
        address,
        key_id: remote.key_id,
        signature: remote.signature,
    })
}
