//! In-memory collaborators for unit tests.

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
};

use serde_json::{json, Value};
use tokio::sync::Notify;

use crate::{
    config::tests::test_config,
    error::BridgeError,
    orchestrator::{Collaborators, SigningOrchestrator},
    platform::{
        ApprovalPresenter, ApprovalRequest, ApprovalResult, FeePayerService, KeySigner,
        NetworkProvider, PageSink, RemoteSignature, SubmittedTransaction, TransactionSink,
    },
    transport::PagePoster,
    Network,
};

pub const SIGNATURE: [u8; 4] = [0xde, 0xad, 0xbe, 0xef];
pub const FEE_PAYER_KEY: u32 = 7;

#[derive(Default)]
pub struct FakeApprovals {
    answers: Mutex<VecDeque<bool>>,
    pub requests: Mutex<Vec<ApprovalRequest>>,
    pub failures: Mutex<Vec<String>>,
    hold_next: AtomicBool,
    release: Notify,
}

impl FakeApprovals {
    /// Queues the answer for the next prompt. Prompts approve when nothing is queued.
    pub fn answer(&self, approved: bool) {
        self.answers.lock().unwrap().push_back(approved);
    }

    /// Makes the next prompt wait until [`Self::release`] is called.
    pub fn hold_next(&self) {
        self.hold_next.store(true, Ordering::SeqCst);
    }

    pub fn release(&self) {
        self.release.notify_one();
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl ApprovalPresenter for FakeApprovals {
    async fn present_approval(
        &self,
        _session_id: String,
        request: ApprovalRequest,
    ) -> Result<ApprovalResult, BridgeError> {
        self.requests.lock().unwrap().push(request);
        if self.hold_next.swap(false, Ordering::SeqCst) {
            self.release.notified().await;
        }
        let approved = self.answers.lock().unwrap().pop_front().unwrap_or(true);
        Ok(ApprovalResult {
            approved,
            data: None,
        })
    }

    fn present_failure(&self, _session_id: String, message: String) {
        self.failures.lock().unwrap().push(message);
    }
}

#[derive(Default)]
pub struct FakeSigner {
    pub messages: Mutex<Vec<Vec<u8>>>,
    pub fail: AtomicBool,
}

impl FakeSigner {
    pub fn sign_count(&self) -> usize {
        self.messages.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl KeySigner for FakeSigner {
    async fn sign(&self, _session_id: String, message: Vec<u8>) -> Result<Vec<u8>, BridgeError> {
        self.messages.lock().unwrap().push(message);
        if self.fail.load(Ordering::SeqCst) {
            return Err(BridgeError::SigningFailure {
                error: "keystore locked".to_string(),
            });
        }
        Ok(SIGNATURE.to_vec())
    }
}

pub struct FakeFeePayer {
    pub sponsorship: AtomicBool,
    pub fail_key_index: AtomicBool,
    pub fail_envelope: AtomicBool,
    pub envelopes: Mutex<Vec<(String, String)>>,
}

impl Default for FakeFeePayer {
    fn default() -> Self {
        Self {
            sponsorship: AtomicBool::new(false),
            fail_key_index: AtomicBool::new(false),
            fail_envelope: AtomicBool::new(false),
            envelopes: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl FeePayerService for FakeFeePayer {
    async fn sponsorship_enabled(&self, _session_id: String) -> Result<bool, BridgeError> {
        Ok(self.sponsorship.load(Ordering::SeqCst))
    }

    async fn fetch_key_index(
        &self,
        _session_id: String,
        address: String,
    ) -> Result<u32, BridgeError> {
        if self.fail_key_index.load(Ordering::SeqCst) {
            return Err(BridgeError::NetworkError {
                url: format!("https://rest-testnet.onflow.org/v1/accounts/{address}"),
                status: Some(404),
                error: "account not found".to_string(),
            });
        }
        Ok(FEE_PAYER_KEY)
    }

    async fn sign_envelope(
        &self,
        _session_id: String,
        voucher_json: String,
        envelope_message: String,
    ) -> Result<RemoteSignature, BridgeError> {
        self.envelopes
            .lock()
            .unwrap()
            .push((voucher_json, envelope_message));
        if self.fail_envelope.load(Ordering::SeqCst) {
            return Err(BridgeError::RemoteSigningFailure {
                error: "fee payer unavailable".to_string(),
            });
        }
        Ok(RemoteSignature {
            address: "0x319e67f2ef9d937f".to_string(),
            key_id: FEE_PAYER_KEY,
            signature: "c0ffee".to_string(),
        })
    }
}

pub struct FakeNetwork {
    pub current: Mutex<Network>,
    pub prompts: Mutex<Vec<(Network, Network)>>,
}

impl Default for FakeNetwork {
    fn default() -> Self {
        Self {
            current: Mutex::new(Network::Testnet),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

impl NetworkProvider for FakeNetwork {
    fn current_network(&self) -> Network {
        *self.current.lock().unwrap()
    }

    fn switch_network_prompt(&self, _session_id: String, from: Network, to: Network) {
        self.prompts.lock().unwrap().push((from, to));
    }
}

#[derive(Default)]
pub struct FakePage {
    pub scripts: Mutex<Vec<String>>,
}

impl FakePage {
    /// Payloads posted so far, parsed back out of their `window.postMessage` wrappers.
    pub fn posted(&self) -> Vec<Value> {
        self.scripts
            .lock()
            .unwrap()
            .iter()
            .map(|script| {
                let json = script
                    .strip_prefix("window.postMessage(")
                    .and_then(|s| s.strip_suffix(", '*')"))
                    .unwrap();
                serde_json::from_str(json).unwrap()
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl PageSink for FakePage {
    async fn evaluate_script(&self, script: String) -> Result<(), BridgeError> {
        self.scripts.lock().unwrap().push(script);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeTransactions {
    pub submitted: Mutex<Vec<SubmittedTransaction>>,
}

impl TransactionSink for FakeTransactions {
    fn transaction_submitted(&self, _session_id: String, transaction: SubmittedTransaction) {
        self.submitted.lock().unwrap().push(transaction);
    }
}

/// Every collaborator a bridge needs, with handles kept for assertions.
#[derive(Default)]
pub struct Fakes {
    pub approvals: Arc<FakeApprovals>,
    pub signer: Arc<FakeSigner>,
    pub fee_payer: Arc<FakeFeePayer>,
    pub network: Arc<FakeNetwork>,
    pub page: Arc<FakePage>,
    pub transactions: Arc<FakeTransactions>,
}

impl Fakes {
    pub fn orchestrator(&self) -> SigningOrchestrator {
        SigningOrchestrator::new(
            "session-1".to_string(),
            test_config(),
            Collaborators {
                approvals: self.approvals.clone(),
                signer: self.signer.clone(),
                fee_payer: self.fee_payer.clone(),
                network: self.network.clone(),
            },
            Arc::new(PagePoster::new(self.page.clone())),
        )
        .unwrap()
    }

    pub fn bridge(&self) -> crate::BrowserBridge {
        crate::BrowserBridge::new(
            test_config(),
            self.approvals.clone(),
            self.signer.clone(),
            self.fee_payer.clone(),
            self.network.clone(),
            self.page.clone(),
            self.transactions.clone(),
        )
        .unwrap()
    }
}

pub fn discovery(service_type: &str) -> String {
    json!({
        "service": {
            "f_type": "Service",
            "type": service_type,
            "endpoint": "flow_wallet://fcl",
        }
    })
    .to_string()
}

pub fn phase_response(service_type: &str, body: &Value) -> String {
    json!({
        "type": "FCL:VIEW:READY:RESPONSE",
        "service": {"f_type": "Service", "type": service_type},
        "config": {
            "app": {"title": "Flow dApp", "icon": "https://dapp.example/icon.png"},
            "client": {"network": "testnet", "hostname": "dapp.example", "fclVersion": "1.12.0"},
        },
        "body": body,
    })
    .to_string()
}

pub fn authz_body(proposer: bool, authorizer: bool, payer: bool, message: &str) -> Value {
    json!({
        "f_type": "Signable",
        "addr": "0xf8d6e0586b0a20c7",
        "cadence": "transaction(amount: UFix64) { prepare(signer: &Account) {} }",
        "message": message,
        "roles": {"proposer": proposer, "authorizer": authorizer, "payer": payer},
        "voucher": {
            "cadence": "transaction(amount: UFix64) { prepare(signer: &Account) {} }",
            "refBlock": "7bc42fe85d32ca513769a74f97f7e1a7bad6c9407f0d934c2aa645ef9cf613c7",
            "computeLimit": 9999,
            "arguments": [{"type": "UFix64", "value": "1.0"}],
            "proposalKey": {"address": "0xf8d6e0586b0a20c7", "keyId": 0, "sequenceNum": 1},
            "payer": "0x319e67f2ef9d937f",
            "authorizers": ["0xf8d6e0586b0a20c7"],
        },
    })
}
