use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use domain::{Balance, ChainInfo};
use ethers::{providers::Middleware, types::Address};
use tracing::debug;

use crate::{
    error::{ChainError, ChainResult},
    feeds::u256_to_biguint,
};

#[async_trait]
pub trait BalanceReader: Send + Sync {
    async fn native_balance(&self, chain: &ChainInfo, address: Address) -> ChainResult<Balance>;
}

/// Reads native balances with one provider per chain id.
pub struct RpcBalanceReader<M>
where
    M: Middleware + 'static,
{
    providers: HashMap<u64, Arc<M>>,
    timeout: Duration,
}

impl<M> RpcBalanceReader<M>
where
    M: Middleware + 'static,
{
    pub fn new(providers: HashMap<u64, Arc<M>>, timeout: Duration) -> Self {
        Self { providers, timeout }
    }

    pub fn supports(&self, chain_id: u64) -> bool {
        self.providers.contains_key(&chain_id)
    }
}

#[async_trait]
impl<M> BalanceReader for RpcBalanceReader<M>
where
    M: Middleware + 'static,
{
    async fn native_balance(&self, chain: &ChainInfo, address: Address) -> ChainResult<Balance> {
        let provider = self
            .providers
            .get(&chain.id)
            .ok_or(ChainError::UnknownChain(chain.id))?;
        let raw = tokio::time::timeout(self.timeout, provider.get_balance(address, None))
            .await
            .map_err(|_| ChainError::Timeout(self.timeout))?
            .map_err(|err| ChainError::Rpc(err.to_string()))?;
        debug!(chain_id = chain.id, %address, balance = %raw, "native balance fetched");

        Ok(Balance {
            decimals: chain.native_decimals,
            symbol: chain.native_symbol.clone(),
            value: u256_to_biguint(raw),
        })
    }
}
