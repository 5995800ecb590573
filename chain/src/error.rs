use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("no provider configured for chain {0}")]
    UnknownChain(u64),
    #[error("chain id {0} has no ENSIP-11 coin type")]
    InvalidChainId(u64),
    #[error("resolver returned {0} bytes, expected a 20 byte address")]
    MalformedAddress(usize),
    #[error("rpc error: {0}")]
    Rpc(String),
    #[error("rpc call timed out after {0:?}")]
    Timeout(Duration),
}

pub type ChainResult<T> = Result<T, ChainError>;
