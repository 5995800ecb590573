use std::{collections::HashMap, str::FromStr, sync::Arc, time::Duration};

use async_trait::async_trait;
use domain::{PriceFeedResult, RoundData};
use ethers::{
    contract::abigen,
    providers::Middleware,
    types::{Address, I256, U256},
};
use futures::future::join_all;
use num_bigint::{BigInt, BigUint};
use tracing::{debug, warn};

use crate::error::{ChainError, ChainResult};

abigen!(
    AggregatorV3Interface,
    r#"[
        function latestRoundData() external view returns (uint80 roundId, int256 answer, uint256 startedAt, uint256 updatedAt, uint80 answeredInRound)
    ]"#,
);

/// Ethereum mainnet Chainlink USD aggregators, keyed by asset symbol.
/// Testnet native assets are priced with their mainnet counterpart.
const MAINNET_USD_FEEDS: &[(&str, &str)] = &[
    ("ETH", "0x5f4eC3Df9cbd43714FE2740f5E3616155c5b8419"),
    ("WETH", "0x5f4eC3Df9cbd43714FE2740f5E3616155c5b8419"),
    ("BTC", "0xF4030086522a5bEEa4988F8cA5B36dbC97BeE88c"),
    ("LINK", "0x2c1d072e956AFFC0D435Cb7AC38EF18d24d9127c"),
    ("USDC", "0x8fFfFfd4AfB6115b954Bd326cbe7B4BA576818f6"),
    ("DAI", "0xAed0c38402a5d19df6E4c03F4E2DceD6e29c1ee9"),
    ("MATIC", "0x7bAC85A8a13A4BcD8abb3eB7d6b4d632c5a57676"),
    ("AVAX", "0xFF3EEb22B5E3dE6e705b44749C2559d704923FD7"),
];

/// Symbol to aggregator address mapping. Lookups are case sensitive.
#[derive(Debug, Clone, Default)]
pub struct FeedRegistry {
    feeds: HashMap<String, Address>,
}

impl FeedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mainnet_usd() -> Self {
        let feeds = MAINNET_USD_FEEDS
            .iter()
            .filter_map(|(symbol, address)| {
                Address::from_str(address)
                    .ok()
                    .map(|address| (symbol.to_string(), address))
            })
            .collect();
        Self { feeds }
    }

    pub fn with_feed(mut self, symbol: impl Into<String>, address: Address) -> Self {
        self.insert(symbol, address);
        self
    }

    pub fn insert(&mut self, symbol: impl Into<String>, address: Address) {
        self.feeds.insert(symbol.into(), address);
    }

    pub fn extend(&mut self, overrides: impl IntoIterator<Item = (String, Address)>) {
        self.feeds.extend(overrides);
    }

    pub fn feed_for(&self, symbol: &str) -> Option<Address> {
        self.feeds.get(symbol).copied()
    }

    pub fn len(&self) -> usize {
        self.feeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.feeds.is_empty()
    }
}

/// One price query per symbol. Implementations must return exactly
/// `symbols.len()` results in the same order; unknown symbols get
/// [`PriceFeedResult::Unavailable`].
#[async_trait]
pub trait PriceFeedReader: Send + Sync {
    async fn latest_answers(&self, symbols: &[String]) -> Vec<PriceFeedResult>;
}

#[derive(Clone)]
pub struct ChainlinkPriceFeeds<M>
where
    M: Middleware + 'static,
{
    provider: Arc<M>,
    registry: FeedRegistry,
    timeout: Duration,
}

impl<M> ChainlinkPriceFeeds<M>
where
    M: Middleware + 'static,
{
    pub fn new(provider: Arc<M>, registry: FeedRegistry, timeout: Duration) -> Self {
        Self {
            provider,
            registry,
            timeout,
        }
    }

    pub fn registry(&self) -> &FeedRegistry {
        &self.registry
    }

    /// `Ok(None)` when no feed is registered for `symbol`.
    pub async fn latest_round(&self, symbol: &str) -> ChainResult<Option<RoundData>> {
        let Some(address) = self.registry.feed_for(symbol) else {
            return Ok(None);
        };
        let feed = AggregatorV3Interface::new(address, self.provider.clone());
        let call = feed.latest_round_data();
        let (round_id, answer, started_at, updated_at, answered_in_round) =
            tokio::time::timeout(self.timeout, call.call())
                .await
                .map_err(|_| ChainError::Timeout(self.timeout))?
                .map_err(|err| ChainError::Rpc(err.to_string()))?;

        Ok(Some(RoundData {
            round_id,
            answer: i256_to_bigint(answer),
            started_at: u256_to_biguint(started_at),
            updated_at: u256_to_biguint(updated_at),
            answered_in_round,
        }))
    }

    async fn latest_result(&self, symbol: &str) -> PriceFeedResult {
        match self.latest_round(symbol).await {
            Ok(Some(round)) => {
                debug!(
                    %symbol,
                    round_id = %round.round_id,
                    answer = %round.answer,
                    "price feed answered"
                );
                round.into_result()
            }
            Ok(None) => {
                debug!(%symbol, "no price feed registered");
                PriceFeedResult::Unavailable
            }
            Err(err) => {
                warn!(error = %err, %symbol, "price feed read failed");
                PriceFeedResult::Unavailable
            }
        }
    }
}

#[async_trait]
impl<M> PriceFeedReader for ChainlinkPriceFeeds<M>
where
    M: Middleware + 'static,
{
    async fn latest_answers(&self, symbols: &[String]) -> Vec<PriceFeedResult> {
        join_all(symbols.iter().map(|symbol| self.latest_result(symbol))).await
    }
}

/// Fixed answers at the oracle's 8-decimal scale. Used as a fallback and in
/// local setups without a mainnet RPC.
#[derive(Clone, Default)]
pub struct StaticPriceFeeds {
    answers: HashMap<String, BigInt>,
}

impl StaticPriceFeeds {
    pub fn new(answers: HashMap<String, BigInt>) -> Self {
        Self { answers }
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }
}

#[async_trait]
impl PriceFeedReader for StaticPriceFeeds {
    async fn latest_answers(&self, symbols: &[String]) -> Vec<PriceFeedResult> {
        symbols
            .iter()
            .map(|symbol| {
                self.answers
                    .get(symbol)
                    .cloned()
                    .map(PriceFeedResult::from)
                    .unwrap_or(PriceFeedResult::Unavailable)
            })
            .collect()
    }
}

/// Asks `fallback` only for the slots `primary` could not answer.
#[derive(Clone)]
pub struct FallbackPriceFeeds<P, F>
where
    P: PriceFeedReader,
    F: PriceFeedReader,
{
    primary: Arc<P>,
    fallback: Arc<F>,
}

impl<P, F> FallbackPriceFeeds<P, F>
where
    P: PriceFeedReader,
    F: PriceFeedReader,
{
    pub fn new(primary: Arc<P>, fallback: Arc<F>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl<P, F> PriceFeedReader for FallbackPriceFeeds<P, F>
where
    P: PriceFeedReader,
    F: PriceFeedReader,
{
    async fn latest_answers(&self, symbols: &[String]) -> Vec<PriceFeedResult> {
        let mut results = self.primary.latest_answers(symbols).await;
        results.resize(symbols.len(), PriceFeedResult::Unavailable);

        let missing: Vec<usize> = results
            .iter()
            .enumerate()
            .filter(|(_, result)| !result.is_available())
            .map(|(index, _)| index)
            .collect();
        if missing.is_empty() {
            return results;
        }

        let retry: Vec<String> = missing.iter().map(|&index| symbols[index].clone()).collect();
        debug!(symbols = ?retry, "primary price feeds missing, trying fallback");
        let fallback = self.fallback.latest_answers(&retry).await;
        for (index, result) in missing.into_iter().zip(fallback) {
            if result.is_available() {
                results[index] = result;
            }
        }
        results
    }
}

pub(crate) fn i256_to_bigint(value: I256) -> BigInt {
    let mut bytes = [0u8; 32];
    value.into_raw().to_big_endian(&mut bytes);
    BigInt::from_signed_bytes_be(&bytes)
}

pub(crate) fn u256_to_biguint(value: U256) -> BigUint {
    let mut bytes = [0u8; 32];
    value.to_big_endian(&mut bytes);
    BigUint::from_bytes_be(&bytes)
}
