//! Chain access for stablecoin payments.
//!
//! `ChainReader` covers read-only contract calls and `Wallet` covers the
//! signing side. `RpcWallet` implements both over Ethereum JSON-RPC.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ChainError;

#[allow(missing_docs)]
mod abi {
    alloy_sol_types::sol! {
        interface IERC20 {
            function symbol() external view returns (string);
            function decimals() external view returns (uint8);
            function transfer(address recipient, uint256 amount) external returns (bool);
        }
    }
}

use abi::IERC20;

/// Read-only contract calls.
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Execute `eth_call` against `to` with ABI-encoded `data`.
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ChainError>;
}

/// A connected wallet able to sign and submit transactions.
#[async_trait]
pub trait Wallet: Send + Sync {
    /// The connected account, if any.
    async fn account(&self) -> Result<Option<Address>, ChainError>;

    /// The chain the wallet is currently on.
    async fn chain_id(&self) -> Result<u64, ChainError>;

    /// Ask the wallet to switch to `chain_id`.
    async fn switch_chain(&self, chain_id: u64) -> Result<(), ChainError>;

    /// Sign and submit a transaction, returning its hash.
    async fn send_transaction(&self, tx: &TransactionRequest) -> Result<B256, ChainError>;
}

/// A contract call to be signed by the wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionRequest {
    /// Sending account.
    pub from: Address,
    /// Contract address.
    pub to: Address,
    /// ABI-encoded call data.
    pub data: Bytes,
}

/// ERC-20 token contract.
#[derive(Clone)]
pub struct Erc20 {
    address: Address,
    reader: Arc<dyn ChainReader>,
}

impl Erc20 {
    /// Bind to the token at `address`.
    #[must_use]
    pub fn new(address: Address, reader: Arc<dyn ChainReader>) -> Self {
        Self { address, reader }
    }

    /// Contract address.
    #[must_use]
    pub const fn address(&self) -> Address {
        self.address
    }

    /// Read the token symbol.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or the return data is malformed.
    pub async fn symbol(&self) -> Result<String, ChainError> {
        let data = self
            .reader
            .call(self.address, IERC20::symbolCall {}.abi_encode().into())
            .await?;
        Ok(IERC20::symbolCall::abi_decode_returns(&data, true)?._0)
    }

    /// Read the token decimals.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or the return data is malformed.
    pub async fn decimals(&self) -> Result<u8, ChainError> {
        let data = self
            .reader
            .call(self.address, IERC20::decimalsCall {}.abi_encode().into())
            .await?;
        Ok(IERC20::decimalsCall::abi_decode_returns(&data, true)?._0)
    }

    /// Build the transaction moving `amount` base units from `from` to `recipient`.
    #[must_use]
    pub fn transfer(&self, from: Address, recipient: Address, amount: U256) -> TransactionRequest {
        TransactionRequest {
            from,
            to: self.address,
            data: IERC20::transferCall { recipient, amount }.abi_encode().into(),
        }
    }
}

impl std::fmt::Debug for Erc20 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Erc20")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// JSON-RPC
// ============================================================================

/// Default RPC request timeout.
const RPC_TIMEOUT_SECONDS: u64 = 30;

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// A wallet and chain reader backed by an Ethereum JSON-RPC endpoint.
///
/// The endpoint is expected to manage accounts itself (a wallet bridge or
/// a node with unlocked accounts), so `eth_sendTransaction` signs remotely.
#[derive(Debug)]
pub struct RpcWallet {
    client: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

impl RpcWallet {
    /// Create a wallet talking to `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>) -> Result<Self, ChainError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(RPC_TIMEOUT_SECONDS))
            .build()?;

        Ok(Self {
            client,
            url: url.into(),
            next_id: AtomicU64::new(1),
        })
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<Option<T>, ChainError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        tracing::debug!(method, id, "JSON-RPC request");

        let response: RpcResponse<T> = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(err) = response.error {
            return Err(ChainError::Rpc {
                code: err.code,
                message: err.message,
            });
        }

        Ok(response.result)
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<T, ChainError> {
        self.send(method, params)
            .await?
            .ok_or_else(|| ChainError::InvalidResponse(format!("{method} returned no result")))
    }
}

#[async_trait]
impl ChainReader for RpcWallet {
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ChainError> {
        self.request(
            "eth_call",
            serde_json::json!([{ "to": to, "data": data }, "latest"]),
        )
        .await
    }
}

#[async_trait]
impl Wallet for RpcWallet {
    async fn account(&self) -> Result<Option<Address>, ChainError> {
        let accounts: Vec<Address> = self.request("eth_accounts", serde_json::json!([])).await?;
        Ok(accounts.into_iter().next())
    }

    async fn chain_id(&self) -> Result<u64, ChainError> {
        let hex: String = self.request("eth_chainId", serde_json::json!([])).await?;
        parse_quantity(&hex)
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<(), ChainError> {
        self.send::<serde_json::Value>(
            "wallet_switchEthereumChain",
            serde_json::json!([{ "chainId": format!("{chain_id:#x}") }]),
        )
        .await?;
        Ok(())
    }

    async fn send_transaction(&self, tx: &TransactionRequest) -> Result<B256, ChainError> {
        self.request("eth_sendTransaction", serde_json::json!([tx]))
            .await
    }
}

/// Parse a `0x`-prefixed hex quantity.
fn parse_quantity(hex: &str) -> Result<u64, ChainError> {
    let digits = hex
        .strip_prefix("0x")
        .ok_or_else(|| ChainError::InvalidResponse(format!("not a hex quantity: {hex}")))?;
    u64::from_str_radix(digits, 16)
        .map_err(|e| ChainError::InvalidResponse(format!("bad quantity {hex}: {e}")))
}
