//! Common test utilities shared across integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use fcl_bridge_core::{
    config::BridgeConfig,
    platform::{
        ApprovalPresenter, ApprovalRequest, ApprovalResult, FeePayerService, KeySigner,
        NetworkProvider, PageSink, SubmittedTransaction, TransactionSink,
    },
    BridgeError, BrowserBridge, Network,
};
use serde_json::Value;

pub const WALLET: &str = "0xf8d6e0586b0a20c7";
pub const FEE_PAYER: &str = "0x319e67f2ef9d937f";

pub fn test_config() -> BridgeConfig {
    BridgeConfig::from_json(
        r#"{
            "wallet_address": "0xf8d6e0586b0a20c7",
            "key_index": 1,
            "wallet_name": "Integration Wallet",
            "wallet_icon": "https://wallet.example/icon.png",
            "service_uid": "integration",
            "endpoint": "flow_wallet://fcl",
            "fee_payer_address": "0x319e67f2ef9d937f"
        }"#,
    )
    .unwrap()
}

/// Approves everything and remembers what it was asked.
#[derive(Default)]
pub struct RecordingApprovals {
    pub requests: Mutex<Vec<ApprovalRequest>>,
    pub failures: Mutex<Vec<String>>,
}

#[async_trait::async_trait]
impl ApprovalPresenter for RecordingApprovals {
    async fn present_approval(
        &self,
        _session_id: String,
        request: ApprovalRequest,
    ) -> Result<ApprovalResult, BridgeError> {
        self.requests.lock().unwrap().push(request);
        Ok(ApprovalResult {
            approved: true,
            data: None,
        })
    }

    fn present_failure(&self, _session_id: String, message: String) {
        self.failures.lock().unwrap().push(message);
    }
}

/// Returns the first byte of the message repeated, so tests can tell signatures apart.
#[derive(Default)]
pub struct EchoSigner {
    pub messages: Mutex<Vec<Vec<u8>>>,
}

#[async_trait::async_trait]
impl KeySigner for EchoSigner {
    async fn sign(&self, _session_id: String, message: Vec<u8>) -> Result<Vec<u8>, BridgeError> {
        let signature = vec![message.first().copied().unwrap_or_default(); 64];
        self.messages.lock().unwrap().push(message);
        Ok(signature)
    }
}

pub struct FixedNetwork(pub Network);

impl NetworkProvider for FixedNetwork {
    fn current_network(&self) -> Network {
        self.0
    }

    fn switch_network_prompt(&self, _session_id: String, _from: Network, _to: Network) {}
}

#[derive(Default)]
pub struct InMemoryPage {
    scripts: Mutex<Vec<String>>,
}

impl InMemoryPage {
    pub fn posted(&self) -> Vec<Value> {
        self.scripts
            .lock()
            .unwrap()
            .iter()
            .map(|script| {
                let json = script
                    .strip_prefix("window.postMessage(")
                    .and_then(|s| s.strip_suffix(", '*')"))
                    .expect("script is a postMessage call");
                serde_json::from_str(json).unwrap()
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl PageSink for InMemoryPage {
    async fn evaluate_script(&self, script: String) -> Result<(), BridgeError> {
        self.scripts.lock().unwrap().push(script);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryTransactions {
    pub submitted: Mutex<Vec<SubmittedTransaction>>,
}

impl TransactionSink for InMemoryTransactions {
    fn transaction_submitted(&self, _session_id: String, transaction: SubmittedTransaction) {
        self.submitted.lock().unwrap().push(transaction);
    }
}

pub struct Harness {
    pub bridge: BrowserBridge,
    pub approvals: Arc<RecordingApprovals>,
    pub signer: Arc<EchoSigner>,
    pub page: Arc<InMemoryPage>,
    pub transactions: Arc<InMemoryTransactions>,
}

pub fn harness(fee_payer: Arc<dyn FeePayerService>) -> Harness {
    let approvals = Arc::new(RecordingApprovals::default());
    let signer = Arc::new(EchoSigner::default());
    let page = Arc::new(InMemoryPage::default());
    let transactions = Arc::new(InMemoryTransactions::default());
    let bridge = BrowserBridge::new(
        test_config(),
        approvals.clone(),
        signer.clone(),
        fee_payer,
        Arc::new(FixedNetwork(Network::Testnet)),
        page.clone(),
        transactions.clone(),
    )
    .unwrap();
    Harness {
        bridge,
        approvals,
        signer,
        page,
        transactions,
    }
}

/// A wallet without fee sponsorship.
pub struct NoFeePayer;

#[async_trait::async_trait]
impl FeePayerService for NoFeePayer {
    async fn sponsorship_enabled(&self, _session_id: String) -> Result<bool, BridgeError> {
        Ok(false)
    }

    async fn fetch_key_index(
        &self,
        _session_id: String,
        _address: String,
    ) -> Result<u32, BridgeError> {
        panic!("no fee payer is configured")
    }

    async fn sign_envelope(
        &self,
        _session_id: String,
        _voucher_json: String,
        _envelope_message: String,
    ) -> Result<fcl_bridge_core::platform::RemoteSignature, BridgeError> {
        panic!("no fee payer is configured")
    }
}

pub fn discovery(service_type: &str) -> String {
    serde_json::json!({"service": {"f_type": "Service", "type": service_type}}).to_string()
}

pub fn phase_response(service_type: &str, network: &str, body: &Value) -> String {
    serde_json::json!({
        "type": "FCL:VIEW:READY:RESPONSE",
        "service": {"f_type": "Service", "type": service_type},
        "config": {
            "app": {"title": "Kitty Items"},
            "client": {"network": network, "hostname": "kitty-items.example"},
        },
        "body": body,
    })
    .to_string()
}

pub fn signable(roles: (bool, bool, bool), cadence: &str, message: &str) -> Value {
    serde_json::json!({
        "f_type": "Signable",
        "message": message,
        "roles": {"proposer": roles.0, "authorizer": roles.1, "payer": roles.2},
        "voucher": {
            "cadence": cadence,
            "arguments": [],
            "computeLimit": 100,
            "proposalKey": {"address": WALLET, "keyId": 1, "sequenceNum": 12},
            "payer": FEE_PAYER,
            "authorizers": [WALLET],
        },
    })
}
