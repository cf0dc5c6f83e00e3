use std::sync::Arc;

use crate::{
    config::BridgeConfig,
    defaults::{MESSAGE_CHANNEL, TRANSACTION_CHANNEL},
    error::BridgeError,
    orchestrator::{Collaborators, SigningOrchestrator},
    platform::{
        ApprovalPresenter, FeePayerService, KeySigner, NetworkProvider, PageSink,
        SubmittedTransaction, TransactionSink,
    },
    session::SessionPhase,
    wire::TransactionSubmission,
};

/// Posts JSON into the page, one evaluation at a time.
pub struct PagePoster {
    sink: Arc<dyn PageSink>,
    in_flight: tokio::sync::Mutex<()>,
}

impl PagePoster {
    pub fn new(sink: Arc<dyn PageSink>) -> Self {
        Self {
            sink,
            in_flight: tokio::sync::Mutex::new(()),
        }
    }

    /// Delivers `json` as `window.postMessage(<json>, '*')`.
    pub async fn post(&self, json: &str) -> Result<(), BridgeError> {
        let script = format!("window.postMessage({json}, '*')");
        let _guard = self.in_flight.lock().await;
        self.sink.evaluate_script(script).await.map_err(|e| match e {
            BridgeError::PageDelivery { .. } => e,
            other => BridgeError::PageDelivery {
                error: other.to_string(),
            },
        })
    }
}

/// Connects one embedded-browser page to the wallet.
///
/// The host forwards every message event from the page to [`BrowserBridge::on_page_message`].
/// Responses are delivered back through the [`PageSink`] given at construction.
#[derive(uniffi::Object)]
pub struct BrowserBridge {
    session_id: String,
    orchestrator: SigningOrchestrator,
    page: Arc<PagePoster>,
    transactions: Arc<dyn TransactionSink>,
}

#[uniffi::export(async_runtime = "tokio")]
impl BrowserBridge {
    /// Creates a bridge for a newly opened page.
    ///
    /// # Errors
    /// Returns `BridgeError::InvalidInput` if `config` is not usable.
    #[uniffi::constructor]
    pub fn new(
        config: BridgeConfig,
        approvals: Arc<dyn ApprovalPresenter>,
        signer: Arc<dyn KeySigner>,
        fee_payer: Arc<dyn FeePayerService>,
        network: Arc<dyn NetworkProvider>,
        page: Arc<dyn PageSink>,
        transactions: Arc<dyn TransactionSink>,
    ) -> Result<Self, BridgeError> {
        let session_id = uuid::Uuid::new_v4().to_string();
        let page = Arc::new(PagePoster::new(page));
        let orchestrator = SigningOrchestrator::new(
            session_id.clone(),
            config,
            Collaborators {
                approvals,
                signer,
                fee_payer,
                network,
            },
            page.clone(),
        )?;
        log::info!("[{session_id}] bridge created");
        Ok(Self {
            session_id,
            orchestrator,
            page,
            transactions,
        })
    }

    /// Identifier passed to every collaborator call made for this page.
    #[must_use]
    pub fn session_id(&self) -> String {
        self.session_id.clone()
    }

    /// Handles one message event from the page.
    ///
    /// `channel` is either the generic `message` channel or the `transaction` channel that
    /// reports submitted transaction ids. Other channels are ignored.
    ///
    /// # Errors
    /// Returns the error that ended the current phase. It has already been acted on (the
    /// session reset, the user notified or routed to the network switcher), so hosts only
    /// need to log it.
    pub async fn on_page_message(&self, channel: &str, body: &str) -> Result<(), BridgeError> {
        match channel {
            MESSAGE_CHANNEL => self.orchestrator.handle_message(body).await,
            TRANSACTION_CHANNEL => self.on_transaction(body),
            other => {
                log::warn!("[{}] ignoring message on unknown channel {other}", self.session_id);
                Ok(())
            }
        }
    }

    /// Posts a JSON string into the page.
    ///
    /// # Errors
    /// Returns `BridgeError::PageDelivery` if the page could not evaluate the script.
    pub async fn post_to_page(&self, json: &str) -> Result<(), BridgeError> {
        self.page.post(json).await
    }

    /// Current protocol phase.
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.orchestrator.phase()
    }

    /// Whether a signed payload is waiting for the fee payer's envelope signature.
    #[must_use]
    pub fn ready_to_sign_envelope(&self) -> bool {
        self.orchestrator.ready_to_sign_envelope()
    }

    /// Abandons the current flow, e.g. when the page navigates away.
    pub fn reset(&self) {
        self.orchestrator.reset();
    }
}

impl BrowserBridge {
    fn on_transaction(&self, body: &str) -> Result<(), BridgeError> {
        let submission: TransactionSubmission = serde_json::from_str(body).map_err(|e| {
            log::warn!("[{}] malformed transaction event: {e}", self.session_id);
            BridgeError::from(e)
        })?;
        let Some(pending) = self.orchestrator.take_pending_transaction() else {
            log::debug!(
                "[{}] no signed transaction pending, dropping tx {}",
                self.session_id,
                submission.tx_id
            );
            return Ok(());
        };
        log::info!(
            "[{}] dApp submitted transaction {}",
            self.session_id,
            submission.tx_id
        );
        self.transactions.transaction_submitted(
            self.session_id.clone(),
            SubmittedTransaction {
                tx_id: submission.tx_id,
                url: pending.url,
                title: pending.title,
                voucher_json: pending.voucher.to_json(),
            },
        );
        Ok(())
    }
}
