//! Stablecoin storage purchase flow.
//!
//! Drives one plan purchase from precondition checks through the token
//! transfer to the credit report, surfacing progress as `PurchaseState`
//! and user-facing messages through a `Notifier`.

use std::str::FromStr;
use std::sync::Arc;

use alloy_primitives::utils::parse_units;
use alloy_primitives::{address, Address, B256, U256};
use tokio::sync::{watch, Mutex, OnceCell};

use quota_core::{
    format_storage, WalletAddress, DEFAULT_PAYMENT_METHOD, DEFAULT_PAYMENT_NETWORK,
    DEFAULT_STORAGE_PLAN_SIZE,
};

use crate::chain::{ChainReader, Erc20, Wallet};
use crate::client::QuotaClient;
use crate::error::PurchaseError;
use crate::events::StorageEvents;
use crate::types::{PurchaseReport, StorageInfo};

// ============================================================================
// Constants
// ============================================================================

/// Base mainnet chain id.
pub const BASE_CHAIN_ID: u64 = 8453;

/// USDT contract on Base.
pub const DEFAULT_TOKEN_CONTRACT: Address = address!("4ed4E862860bED51A9570B96d89aF5E1B0EfEfEd");

/// Decimals assumed when the token contract does not report them.
pub const DEFAULT_TOKEN_DECIMALS: u8 = 6;

/// Price of one plan as a decimal literal in whole tokens.
pub const DEFAULT_PAYMENT_AMOUNT: &str = "20";

const CONNECT_WALLET_MESSAGE: &str = "Please connect your wallet first";
const PURCHASE_IN_PROGRESS_MESSAGE: &str = "A purchase is already in progress";

// ============================================================================
// Configuration
// ============================================================================

/// Purchase settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseConfig {
    /// Chain the payment must be made on.
    pub required_chain_id: u64,
    /// Stablecoin contract address.
    pub token_contract: Address,
    /// Recipient of storage payments.
    pub payment_address: Address,
    /// Plan price as a decimal literal, scaled by the token's decimals.
    pub amount: String,
    /// Symbol the token contract must report.
    pub expected_symbol: String,
    /// Network label sent with the credit report.
    pub network: String,
    /// Decimals used when the contract read fails.
    pub default_decimals: u8,
    /// Storage one plan adds, for display.
    pub plan_size: u64,
}

impl PurchaseConfig {
    /// Default settings paying `payment_address`.
    #[must_use]
    pub fn new(payment_address: Address) -> Self {
        Self {
            required_chain_id: BASE_CHAIN_ID,
            token_contract: DEFAULT_TOKEN_CONTRACT,
            payment_address,
            amount: DEFAULT_PAYMENT_AMOUNT.into(),
            expected_symbol: DEFAULT_PAYMENT_METHOD.into(),
            network: DEFAULT_PAYMENT_NETWORK.into(),
            default_decimals: DEFAULT_TOKEN_DECIMALS,
            plan_size: DEFAULT_STORAGE_PLAN_SIZE,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Reads `PAYMENT_ADDRESS` (required), `TOKEN_CONTRACT_ADDRESS` and
    /// `REQUIRED_CHAIN_ID`. Returns `None` if no valid payment address is set.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let payment_address = std::env::var("PAYMENT_ADDRESS")
            .ok()
            .and_then(|s| match Address::from_str(s.trim()) {
                Ok(addr) => Some(addr),
                Err(e) => {
                    tracing::warn!(error = %e, "Invalid PAYMENT_ADDRESS");
                    None
                }
            })?;

        let mut config = Self::new(payment_address);

        if let Some(token) = std::env::var("TOKEN_CONTRACT_ADDRESS")
            .ok()
            .and_then(|s| Address::from_str(s.trim()).ok())
        {
            config.token_contract = token;
        }
        if let Some(chain_id) = std::env::var("REQUIRED_CHAIN_ID")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            config.required_chain_id = chain_id;
        }

        Some(config)
    }
}

// ============================================================================
// Notices
// ============================================================================

/// Severity of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    /// Something completed.
    Success,
    /// Progress information.
    Info,
    /// Recoverable problem.
    Warning,
    /// The action failed.
    Error,
}

/// Receives transient user-facing messages.
pub trait Notifier: Send + Sync {
    /// Show `message` to the user.
    fn notify(&self, level: NoticeLevel, message: &str);
}

/// Notifier that writes notices to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        match level {
            NoticeLevel::Success | NoticeLevel::Info => tracing::info!(?level, "{message}"),
            NoticeLevel::Warning => tracing::warn!("{message}"),
            NoticeLevel::Error => tracing::error!("{message}"),
        }
    }
}

// ============================================================================
// Flow
// ============================================================================

/// Where a purchase currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseState {
    /// Nothing in progress.
    Idle,
    /// Checking wallet, network and token.
    CheckingNetwork,
    /// Waiting for the wallet to sign and submit the transfer.
    AwaitingSignature,
    /// The transfer was submitted.
    AwaitingConfirmation {
        /// Hash of the submitted transfer.
        transaction_hash: B256,
    },
    /// Reporting the payment to the quota service.
    ReportingPurchase,
    /// Storage was credited; the purchase view can close.
    Succeeded {
        /// Updated totals.
        info: StorageInfo,
    },
    /// The purchase stopped; quota is unchanged.
    Failed {
        /// Message shown to the user.
        message: String,
    },
}

impl PurchaseState {
    /// Whether a purchase is in flight.
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        matches!(
            self,
            Self::CheckingNetwork
                | Self::AwaitingSignature
                | Self::AwaitingConfirmation { .. }
                | Self::ReportingPurchase
        )
    }
}

/// What the purchase view shows for the plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanOffer {
    /// e.g. `10GB Storage Plan`.
    pub title: String,
    /// e.g. `20 USDT`.
    pub price: String,
    /// e.g. `Purchase Now with 20 USDT`.
    pub action: String,
}

/// One wallet's storage purchase.
pub struct PurchaseFlow {
    config: PurchaseConfig,
    client: QuotaClient,
    token: Erc20,
    wallet: Option<Arc<dyn Wallet>>,
    events: StorageEvents,
    notifier: Arc<dyn Notifier>,
    state: watch::Sender<PurchaseState>,
    in_flight: Mutex<()>,
    symbol: OnceCell<String>,
    decimals: OnceCell<u8>,
}

impl PurchaseFlow {
    /// Create a flow with no wallet connected.
    ///
    /// `chain` serves the token's read-only calls.
    #[must_use]
    pub fn new(
        config: PurchaseConfig,
        client: QuotaClient,
        chain: Arc<dyn ChainReader>,
        events: StorageEvents,
    ) -> Self {
        let (state, _) = watch::channel(PurchaseState::Idle);
        Self {
            token: Erc20::new(config.token_contract, chain),
            config,
            client,
            wallet: None,
            events,
            notifier: Arc::new(TracingNotifier),
            state,
            in_flight: Mutex::new(()),
            symbol: OnceCell::new(),
            decimals: OnceCell::new(),
        }
    }

    /// Attach a connected wallet.
    #[must_use]
    pub fn with_wallet(mut self, wallet: Arc<dyn Wallet>) -> Self {
        self.wallet = Some(wallet);
        self
    }

    /// Route notices to `notifier`.
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> PurchaseState {
        self.state.borrow().clone()
    }

    /// Watch state transitions.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<PurchaseState> {
        self.state.subscribe()
    }

    /// Labels for the plan on offer.
    #[must_use]
    pub fn offer(&self) -> PlanOffer {
        let price = format!("{} {}", self.config.amount, self.config.expected_symbol);
        PlanOffer {
            title: format!("{} Storage Plan", format_storage(self.config.plan_size)),
            action: format!("Purchase Now with {price}"),
            price,
        }
    }

    /// Whether the connected wallet is on the required chain.
    ///
    /// # Errors
    ///
    /// Returns an error if no wallet is connected or the chain id read fails.
    pub async fn is_correct_network(&self) -> Result<bool, PurchaseError> {
        let wallet = self.connected_wallet()?;
        Ok(wallet.chain_id().await? == self.config.required_chain_id)
    }

    /// Ask the wallet to move to the required chain.
    ///
    /// A refusal is reported as a warning; the user can switch by hand.
    pub async fn switch_network(&self) -> bool {
        let Ok(wallet) = self.connected_wallet() else {
            self.notifier.notify(NoticeLevel::Error, CONNECT_WALLET_MESSAGE);
            return false;
        };

        match wallet.switch_chain(self.config.required_chain_id).await {
            Ok(()) => {
                self.notifier.notify(
                    NoticeLevel::Success,
                    &format!("Switched to {} network", self.config.network),
                );
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, chain_id = self.config.required_chain_id, "Failed to switch network");
                self.notifier.notify(
                    NoticeLevel::Warning,
                    "Failed to switch network. Please try manually.",
                );
                false
            }
        }
    }

    /// Buy one storage plan.
    ///
    /// On success the quota service has credited the wallet, the
    /// storage-updated signal has fired and the state is `Succeeded`.
    ///
    /// # Errors
    ///
    /// `PurchaseError::UserInput` when a precondition is not met (the wallet
    /// is never asked to sign in that case), `PurchaseError::RemoteCall`
    /// when the wallet, chain or quota service fails.
    pub async fn purchase(&self) -> Result<StorageInfo, PurchaseError> {
        let Ok(_guard) = self.in_flight.try_lock() else {
            return Err(PurchaseError::UserInput(PURCHASE_IN_PROGRESS_MESSAGE.into()));
        };

        match self.run().await {
            Ok(info) => {
                self.state.send_replace(PurchaseState::Succeeded { info });
                self.notifier
                    .notify(NoticeLevel::Success, "Successfully purchased additional storage!");
                self.events.notify();
                Ok(info)
            }
            Err(e) => {
                let message = e.user_message();
                tracing::error!(error = %e, "Storage purchase error");
                self.notifier.notify(NoticeLevel::Error, &message);
                self.state.send_replace(PurchaseState::Failed { message });
                Err(e)
            }
        }
    }

    async fn run(&self) -> Result<StorageInfo, PurchaseError> {
        self.state.send_replace(PurchaseState::CheckingNetwork);

        let wallet = self.connected_wallet()?;
        let account = wallet
            .account()
            .await?
            .ok_or_else(|| PurchaseError::UserInput(CONNECT_WALLET_MESSAGE.into()))?;

        if wallet.chain_id().await? != self.config.required_chain_id {
            return Err(PurchaseError::UserInput(format!(
                "Please switch to {} network first",
                self.config.network
            )));
        }

        let symbol = self.token_symbol().await?;
        if symbol != self.config.expected_symbol {
            return Err(PurchaseError::UserInput(format!(
                "Wrong token detected: {symbol}. Expected {}.",
                self.config.expected_symbol
            )));
        }

        let decimals = self.token_decimals().await;
        let amount = self.scaled_amount(decimals)?;

        tracing::info!(
            amount = %self.config.amount,
            symbol = %symbol,
            decimals,
            network = %self.config.network,
            "Sending storage payment"
        );

        self.state.send_replace(PurchaseState::AwaitingSignature);
        let tx = self
            .token
            .transfer(account, self.config.payment_address, amount);
        let transaction_hash = wallet.send_transaction(&tx).await?;

        self.state
            .send_replace(PurchaseState::AwaitingConfirmation { transaction_hash });
        self.notifier.notify(
            NoticeLevel::Info,
            "Transaction submitted, waiting for confirmation...",
        );

        self.state.send_replace(PurchaseState::ReportingPurchase);
        let wallet_address = WalletAddress::from_str(&account.to_string())
            .map_err(|e| PurchaseError::RemoteCall(e.to_string()))?;
        let report = PurchaseReport {
            transaction_hash: transaction_hash.to_string(),
            payment_method: symbol,
            network: self.config.network.clone(),
        };

        Ok(self.client.report_purchase(&wallet_address, &report).await?)
    }

    fn connected_wallet(&self) -> Result<&Arc<dyn Wallet>, PurchaseError> {
        self.wallet
            .as_ref()
            .ok_or_else(|| PurchaseError::UserInput(CONNECT_WALLET_MESSAGE.into()))
    }

    /// Token symbol, read once and cached.
    async fn token_symbol(&self) -> Result<String, PurchaseError> {
        let symbol = self
            .symbol
            .get_or_try_init(|| async {
                let symbol = self.token.symbol().await?;
                tracing::debug!(symbol = %symbol, "Token symbol");
                Ok::<String, PurchaseError>(symbol)
            })
            .await?;
        Ok(symbol.clone())
    }

    /// Token decimals, read once and cached; the default is used while the
    /// read fails.
    async fn token_decimals(&self) -> u8 {
        match self
            .decimals
            .get_or_try_init(|| self.token.decimals())
            .await
        {
            Ok(decimals) => *decimals,
            Err(e) => {
                tracing::warn!(error = %e, default = self.config.default_decimals, "Token decimals unavailable");
                self.config.default_decimals
            }
        }
    }

    fn scaled_amount(&self, decimals: u8) -> Result<U256, PurchaseError> {
        parse_units(&self.config.amount, decimals)
            .map(|units| units.get_absolute())
            .map_err(|e| {
                PurchaseError::RemoteCall(format!(
                    "cannot scale amount {} by {decimals} decimals: {e}",
                    self.config.amount
                ))
            })
    }
}

impl std::fmt::Debug for PurchaseFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PurchaseFlow")
            .field("config", &self.config)
            .field("state", &*self.state.borrow())
            .field("wallet_connected", &self.wallet.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quota_core::GIB;

    #[test]
    fn default_config_targets_base_usdt() {
        let config = PurchaseConfig::new(Address::ZERO);
        assert_eq!(config.required_chain_id, 8453);
        assert_eq!(config.expected_symbol, "USDT");
        assert_eq!(config.default_decimals, 6);
        assert_eq!(config.plan_size, 10 * GIB);
    }

    #[test]
    fn amount_scales_by_decimals() {
        let units = parse_units("20", 6u8).unwrap().get_absolute();
        assert_eq!(units, U256::from(20_000_000u64));

        let units = parse_units("20", 18u8).unwrap().get_absolute();
        assert_eq!(units, U256::from(20u64) * U256::from(10u64).pow(U256::from(18u64)));
    }

    #[test]
    fn busy_states() {
        assert!(!PurchaseState::Idle.is_busy());
        assert!(PurchaseState::CheckingNetwork.is_busy());
        assert!(PurchaseState::ReportingPurchase.is_busy());
        assert!(!PurchaseState::Failed {
            message: String::new()
        }
        .is_busy());
    }
}
