//! Client error types.

/// Errors that can occur when calling the quota service.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server returned an error response.
    #[error("API error: {status} - {message}")]
    Api {
        /// Error message from the response body.
        message: String,
        /// HTTP status code.
        status: u16,
    },
}

/// Errors from the wallet or the chain RPC endpoint.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    /// Transport failure talking to the RPC endpoint.
    #[error("RPC transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The endpoint returned a JSON-RPC error object.
    #[error("RPC error {code}: {message}")]
    Rpc {
        /// JSON-RPC error code.
        code: i64,
        /// Error message.
        message: String,
    },

    /// The response could not be decoded.
    #[error("invalid RPC response: {0}")]
    InvalidResponse(String),

    /// ABI decoding of a contract return value failed.
    #[error("ABI decode error: {0}")]
    Abi(#[from] alloy_sol_types::Error),
}

/// Why a storage purchase did not complete.
///
/// `UserInput` failures are refusals the user can fix (connect a wallet,
/// switch network). `RemoteCall` failures come from the wallet, the chain
/// or the quota service.
#[derive(Debug, thiserror::Error)]
pub enum PurchaseError {
    /// A precondition the user has to fix.
    #[error("{0}")]
    UserInput(String),

    /// A wallet, chain or service call failed.
    #[error("remote call failed: {0}")]
    RemoteCall(String),
}

impl PurchaseError {
    /// Message suitable for showing to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::UserInput(msg) => msg.clone(),
            Self::RemoteCall(_) => "Failed to purchase storage. Please try again.".to_string(),
        }
    }
}

impl From<ChainError> for PurchaseError {
    fn from(err: ChainError) -> Self {
        Self::RemoteCall(err.to_string())
    }
}

impl From<ClientError> for PurchaseError {
    fn from(err: ClientError) -> Self {
        Self::RemoteCall(err.to_string())
    }
}
