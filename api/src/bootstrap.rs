use std::{collections::HashMap, str::FromStr, sync::Arc, time::Duration};

use anyhow::Result;
use chain::{
    BalanceReader, ChainlinkPriceFeeds, DomainResolver, FallbackPriceFeeds, FeedRegistry,
    PriceFeedReader, PublicResolver, RpcBalanceReader, StaticPriceFeeds,
};
use ethers::{
    providers::{Http, Provider},
    types::Address,
};
use num_bigint::BigInt;
use tracing::{info, warn};

use crate::{config::AppConfig, services::DashboardService, state::AppState};

const POLL_INTERVAL: Duration = Duration::from_millis(500);

pub async fn build_state(config: &AppConfig) -> Result<AppState> {
    let feeds = build_price_feeds(config)?;
    let resolver = build_resolver(config)?;

    let providers_by_chain = build_providers(&config.chain_rpc_urls).await?;
    for chain in &config.chains {
        if !providers_by_chain.contains_key(&chain.id) {
            warn!(chain_id = chain.id, chain = %chain.name, "no rpc configured, balances will read 0");
        }
    }
    let balances: Arc<dyn BalanceReader> =
        Arc::new(RpcBalanceReader::new(providers_by_chain, config.rpc_timeout));

    let dashboard = Arc::new(DashboardService::new(
        config.chains.clone(),
        resolver,
        balances,
        feeds,
    ));
    if !config.watch_domains.is_empty() {
        dashboard
            .clone()
            .spawn_watch(config.watch_domains.clone(), config.dashboard_refresh_interval);
    }

    Ok(AppState {
        config: config.clone(),
        dashboard,
    })
}

fn build_price_feeds(config: &AppConfig) -> Result<Arc<dyn PriceFeedReader>> {
    let provider =
        Provider::<Http>::try_from(config.price_feed_rpc_url.as_str())?.interval(POLL_INTERVAL);

    let mut registry = FeedRegistry::mainnet_usd();
    registry.extend(config.price_feeds.iter().filter_map(|(symbol, raw)| {
        match Address::from_str(raw) {
            Ok(address) => Some((symbol.clone(), address)),
            Err(err) => {
                warn!(%symbol, address = %raw, error = %err, "ignoring invalid price feed address");
                None
            }
        }
    }));
    info!(feeds = registry.len(), "price feed registry ready");

    let chainlink = Arc::new(ChainlinkPriceFeeds::new(
        Arc::new(provider),
        registry,
        config.rpc_timeout,
    ));
    if config.static_price_answers.is_empty() {
        return Ok(chainlink);
    }

    // 靜態報價只在 Chainlink 查不到時補上
    let fallback = Arc::new(StaticPriceFeeds::new(
        config
            .static_price_answers
            .iter()
            .map(|(symbol, answer)| (symbol.clone(), BigInt::from(*answer)))
            .collect(),
    ));
    Ok(Arc::new(FallbackPriceFeeds::new(chainlink, fallback)))
}

fn build_resolver(config: &AppConfig) -> Result<Arc<dyn DomainResolver>> {
    let provider =
        Provider::<Http>::try_from(config.resolver_rpc_url.as_str())?.interval(POLL_INTERVAL);
    let address = parse_contract_address(&config.resolver_address);
    if address.is_none() {
        warn!("RESOLVER_ADDRESS not set, domains will resolve to nothing");
    }
    Ok(Arc::new(PublicResolver::new(
        address,
        Arc::new(provider),
        config.rpc_timeout,
    )))
}

fn parse_contract_address(raw: &str) -> Option<Address> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    match Address::from_str(trimmed) {
        Ok(address) if !address.is_zero() => Some(address),
        Ok(_) => None,
        Err(err) => {
            warn!(address = %trimmed, error = %err, "invalid resolver address");
            None
        }
    }
}

async fn build_providers(
    entries: &HashMap<u64, String>,
) -> Result<HashMap<u64, Arc<Provider<Http>>>> {
    let mut map = HashMap::new();
    for (chain_id, url) in entries {
        let provider = Provider::<Http>::try_from(url.as_str())?.interval(POLL_INTERVAL);
        map.insert(*chain_id, Arc::new(provider));
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contract_address_rejects_blank_and_zero() {
        assert!(parse_contract_address("").is_none());
        assert!(parse_contract_address("  ").is_none());
        assert!(parse_contract_address("0x0000000000000000000000000000000000000000").is_none());
        assert!(parse_contract_address("not-an-address").is_none());
        assert_eq!(
            parse_contract_address(" 0x5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a "),
            Some(Address::repeat_byte(0x5a))
        );
    }

    #[tokio::test]
    async fn providers_are_built_per_chain() {
        let urls = HashMap::from([
            (43113u64, "https://api.avax-test.network/ext/bc/C/rpc".to_string()),
            (11155111u64, "https://rpc.sepolia.org".to_string()),
        ]);
        let providers = build_providers(&urls).await.unwrap();
        assert_eq!(providers.len(), 2);
        assert!(providers.contains_key(&43113));

        let bad = HashMap::from([(1u64, "not a url".to_string())]);
        assert!(build_providers(&bad).await.is_err());
    }
}
