use ethers::providers::{ProviderError, RpcError};

#[derive(Debug, thiserror::Error)]
pub enum ExecutionClientError {
    #[error("Reqwest error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("provider error: {0}")]
    Provider(ProviderError),

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("block is missing {field}, probably still pending")]
    IncompleteBlock { field: &'static str },

    #[error("no execution client available")]
    NoClientAvailable,
}

impl From<ProviderError> for ExecutionClientError {
    fn from(err: ProviderError) -> Self {
        match err.as_error_response() {
            Some(rpc) => Self::Rpc { code: rpc.code, message: rpc.message.clone() },
            None => Self::Provider(err),
        }
    }
}
