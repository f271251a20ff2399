//! Storage purchase flow integration tests.

use std::sync::{Arc, Mutex};

use alloy_primitives::{address, b256, Address, Bytes, B256, U256};
use alloy_sol_types::SolValue;
use async_trait::async_trait;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use quota_client::{
    ChainError, ChainReader, NoticeLevel, Notifier, PurchaseConfig, PurchaseError, PurchaseFlow,
    PurchaseState, QuotaClient, StorageEvents, TransactionRequest, Wallet, BASE_CHAIN_ID,
    DEFAULT_TOKEN_CONTRACT,
};

const ACCOUNT: Address = address!("52908400098527886E0F7030069857D2E4169EE7");
const RECIPIENT: Address = address!("de0B295669a9FD93d5F28D9Ec85E40f4cb697BAe");
const TX_HASH: B256 = b256!("9fc76417374aa880d4449a1f7f31ec597f00b1f6f3dd2d66f4c9c6c445836d8b");

// ============================================================================
// Fakes
// ============================================================================

/// Token contract answering `symbol()` and `decimals()`.
struct FakeToken {
    symbol: Option<String>,
    decimals: Option<u8>,
}

#[async_trait]
impl ChainReader for FakeToken {
    async fn call(&self, _to: Address, data: Bytes) -> Result<Bytes, ChainError> {
        let unavailable = || ChainError::InvalidResponse("execution reverted".into());
        match &data[..4] {
            // symbol()
            [0x95, 0xd8, 0x9b, 0x41] => {
                let symbol = self.symbol.clone().ok_or_else(unavailable)?;
                Ok((symbol,).abi_encode_params().into())
            }
            // decimals()
            [0x31, 0x3c, 0xe5, 0x67] => {
                let decimals = self.decimals.ok_or_else(unavailable)?;
                Ok(U256::from(decimals).abi_encode().into())
            }
            _ => Err(unavailable()),
        }
    }
}

/// Wallet recording every transaction it is asked to sign.
struct FakeWallet {
    account: Option<Address>,
    chain_id: Mutex<u64>,
    reject_signature: bool,
    allow_switch: bool,
    sent: Mutex<Vec<TransactionRequest>>,
}

impl FakeWallet {
    fn on_chain(chain_id: u64) -> Self {
        Self {
            account: Some(ACCOUNT),
            chain_id: Mutex::new(chain_id),
            reject_signature: false,
            allow_switch: true,
            sent: Mutex::new(Vec::new()),
        }
    }

    fn sent(&self) -> Vec<TransactionRequest> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Wallet for FakeWallet {
    async fn account(&self) -> Result<Option<Address>, ChainError> {
        Ok(self.account)
    }

    async fn chain_id(&self) -> Result<u64, ChainError> {
        Ok(*self.chain_id.lock().unwrap())
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<(), ChainError> {
        if !self.allow_switch {
            return Err(ChainError::Rpc {
                code: 4902,
                message: "Unrecognized chain".into(),
            });
        }
        *self.chain_id.lock().unwrap() = chain_id;
        Ok(())
    }

    async fn send_transaction(&self, tx: &TransactionRequest) -> Result<B256, ChainError> {
        self.sent.lock().unwrap().push(tx.clone());
        if self.reject_signature {
            return Err(ChainError::Rpc {
                code: 4001,
                message: "User rejected the request.".into(),
            });
        }
        Ok(TX_HASH)
    }
}

/// Notifier keeping every notice.
#[derive(Default)]
struct RecordingNotifier {
    notices: Mutex<Vec<(NoticeLevel, String)>>,
}

impl RecordingNotifier {
    fn last(&self) -> Option<(NoticeLevel, String)> {
        self.notices.lock().unwrap().last().cloned()
    }

    fn contains(&self, level: NoticeLevel, message: &str) -> bool {
        self.notices
            .lock()
            .unwrap()
            .iter()
            .any(|(l, m)| *l == level && m == message)
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        self.notices.lock().unwrap().push((level, message.to_string()));
    }
}

// ============================================================================
// Harness
// ============================================================================

struct Harness {
    server: MockServer,
    flow: PurchaseFlow,
    wallet: Arc<FakeWallet>,
    notifier: Arc<RecordingNotifier>,
    events: StorageEvents,
}

async fn harness(token: FakeToken, wallet: Option<FakeWallet>) -> Harness {
    let server = MockServer::start().await;
    let client = QuotaClient::new(server.uri()).unwrap();
    let events = StorageEvents::new();
    let notifier = Arc::new(RecordingNotifier::default());
    let wallet = Arc::new(wallet.unwrap_or_else(|| FakeWallet::on_chain(BASE_CHAIN_ID)));

    let flow = PurchaseFlow::new(
        PurchaseConfig::new(RECIPIENT),
        client,
        Arc::new(token),
        events.clone(),
    )
    .with_wallet(wallet.clone())
    .with_notifier(notifier.clone());

    Harness {
        server,
        flow,
        wallet,
        notifier,
        events,
    }
}

fn usdt() -> FakeToken {
    FakeToken {
        symbol: Some("USDT".into()),
        decimals: Some(6),
    }
}

async fn mount_credit_endpoint(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/api/storage/purchase"))
        .and(header(
            "authorization",
            "0x52908400098527886e0f7030069857d2e4169ee7",
        ))
        .and(body_json(json!({
            "transactionHash": TX_HASH.to_string(),
            "paymentMethod": "USDT",
            "network": "Base",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "totalStorageUsed": 0,
            "totalStoragePurchased": 10_737_418_240_u64,
            "totalAvailableStorage": 11_811_160_064_u64,
            "remainingStorage": 11_811_160_064_u64,
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

// ============================================================================
// Success
// ============================================================================

#[tokio::test]
async fn purchase_transfers_and_reports() {
    let h = harness(usdt(), None).await;
    mount_credit_endpoint(&h.server, 1).await;
    let mut subscription = h.events.subscribe();

    let info = h.flow.purchase().await.unwrap();

    assert_eq!(info.total_storage_purchased, 10_737_418_240);

    let sent = h.wallet.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, DEFAULT_TOKEN_CONTRACT);
    assert_eq!(sent[0].from, ACCOUNT);
    // transfer(RECIPIENT, 20 * 10^6)
    assert_eq!(&sent[0].data[..4], &[0xa9, 0x05, 0x9c, 0xbb]);
    assert_eq!(&sent[0].data[16..36], RECIPIENT.as_slice());
    assert_eq!(
        U256::from_be_slice(&sent[0].data[36..68]),
        U256::from(20_000_000u64)
    );

    assert!(subscription.changed().await);
    assert!(matches!(h.flow.state(), PurchaseState::Succeeded { .. }));
    assert!(h.notifier.contains(
        NoticeLevel::Info,
        "Transaction submitted, waiting for confirmation..."
    ));
    assert_eq!(
        h.notifier.last(),
        Some((
            NoticeLevel::Success,
            "Successfully purchased additional storage!".to_string()
        ))
    );
}

#[tokio::test]
async fn missing_decimals_fall_back_to_six() {
    let h = harness(
        FakeToken {
            symbol: Some("USDT".into()),
            decimals: None,
        },
        None,
    )
    .await;
    mount_credit_endpoint(&h.server, 1).await;

    h.flow.purchase().await.unwrap();

    let sent = h.wallet.sent();
    assert_eq!(
        U256::from_be_slice(&sent[0].data[36..68]),
        U256::from(20_000_000u64)
    );
}

#[tokio::test]
async fn amount_follows_reported_decimals() {
    let h = harness(
        FakeToken {
            symbol: Some("USDT".into()),
            decimals: Some(18),
        },
        None,
    )
    .await;
    mount_credit_endpoint(&h.server, 1).await;

    h.flow.purchase().await.unwrap();

    let expected = U256::from(20u64) * U256::from(10u64).pow(U256::from(18u64));
    assert_eq!(U256::from_be_slice(&h.wallet.sent()[0].data[36..68]), expected);
}

// ============================================================================
// Refusals (never reach the wallet's signer)
// ============================================================================

#[tokio::test]
async fn wrong_token_is_refused_without_signing() {
    let h = harness(
        FakeToken {
            symbol: Some("USDC".into()),
            decimals: Some(6),
        },
        None,
    )
    .await;
    mount_credit_endpoint(&h.server, 0).await;
    let subscription = h.events.subscribe();

    let err = h.flow.purchase().await.unwrap_err();

    assert!(matches!(err, PurchaseError::UserInput(_)));
    assert_eq!(err.user_message(), "Wrong token detected: USDC. Expected USDT.");
    assert!(h.wallet.sent().is_empty());
    assert!(!subscription.has_pending());
    assert_eq!(
        h.flow.state(),
        PurchaseState::Failed {
            message: "Wrong token detected: USDC. Expected USDT.".into()
        }
    );
    assert!(!h.flow.state().is_busy());
}

#[tokio::test]
async fn wrong_network_is_refused_without_signing() {
    let h = harness(usdt(), Some(FakeWallet::on_chain(1))).await;
    mount_credit_endpoint(&h.server, 0).await;

    let err = h.flow.purchase().await.unwrap_err();

    assert_eq!(err.user_message(), "Please switch to Base network first");
    assert!(h.wallet.sent().is_empty());
}

#[tokio::test]
async fn wallet_without_account_is_refused() {
    let mut wallet = FakeWallet::on_chain(BASE_CHAIN_ID);
    wallet.account = None;
    let h = harness(usdt(), Some(wallet)).await;

    let err = h.flow.purchase().await.unwrap_err();

    assert_eq!(err.user_message(), "Please connect your wallet first");
    assert!(h.wallet.sent().is_empty());
}

#[tokio::test]
async fn unreadable_symbol_aborts_without_signing() {
    let h = harness(
        FakeToken {
            symbol: None,
            decimals: Some(6),
        },
        None,
    )
    .await;

    let err = h.flow.purchase().await.unwrap_err();

    assert!(matches!(err, PurchaseError::RemoteCall(_)));
    assert!(h.wallet.sent().is_empty());
}

// ============================================================================
// Remote failures
// ============================================================================

#[tokio::test]
async fn rejected_signature_leaves_quota_unchanged() {
    let mut wallet = FakeWallet::on_chain(BASE_CHAIN_ID);
    wallet.reject_signature = true;
    let h = harness(usdt(), Some(wallet)).await;
    mount_credit_endpoint(&h.server, 0).await;
    let subscription = h.events.subscribe();

    let err = h.flow.purchase().await.unwrap_err();

    assert!(matches!(err, PurchaseError::RemoteCall(_)));
    assert_eq!(
        h.notifier.last(),
        Some((
            NoticeLevel::Error,
            "Failed to purchase storage. Please try again.".to_string()
        ))
    );
    assert!(!subscription.has_pending());
}

#[tokio::test]
async fn credit_endpoint_failure_is_reported() {
    let h = harness(usdt(), None).await;
    Mock::given(method("POST"))
        .and(path("/api/storage/purchase"))
        .respond_with(
            ResponseTemplate::new(503).set_body_json(json!({ "error": "Database connection failed" })),
        )
        .mount(&h.server)
        .await;
    let subscription = h.events.subscribe();

    let err = h.flow.purchase().await.unwrap_err();

    assert!(matches!(err, PurchaseError::RemoteCall(_)));
    assert_eq!(h.wallet.sent().len(), 1);
    assert!(!subscription.has_pending());
    assert!(matches!(h.flow.state(), PurchaseState::Failed { .. }));
}

// ============================================================================
// Network switching
// ============================================================================

#[tokio::test]
async fn switch_network_moves_wallet_to_base() {
    let h = harness(usdt(), Some(FakeWallet::on_chain(1))).await;

    assert!(!h.flow.is_correct_network().await.unwrap());
    assert!(h.flow.switch_network().await);
    assert!(h.flow.is_correct_network().await.unwrap());
    assert_eq!(
        h.notifier.last(),
        Some((NoticeLevel::Success, "Switched to Base network".to_string()))
    );
}

#[tokio::test]
async fn failed_switch_is_a_warning() {
    let mut wallet = FakeWallet::on_chain(1);
    wallet.allow_switch = false;
    let h = harness(usdt(), Some(wallet)).await;

    assert!(!h.flow.switch_network().await);
    assert_eq!(
        h.notifier.last(),
        Some((
            NoticeLevel::Warning,
            "Failed to switch network. Please try manually.".to_string()
        ))
    );
    assert_eq!(h.flow.state(), PurchaseState::Idle);
}

#[tokio::test]
async fn offer_labels() {
    let h = harness(usdt(), None).await;

    let offer = h.flow.offer();

    assert_eq!(offer.title, "10GB Storage Plan");
    assert_eq!(offer.price, "20 USDT");
    assert_eq!(offer.action, "Purchase Now with 20 USDT");
}
