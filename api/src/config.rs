use std::{collections::HashMap, env, time::Duration};

use anyhow::{Context, Result};
use chain::coin_type_for_chain;
use domain::ChainInfo;

const FUJI_CHAIN_ID: u64 = 43113;

/// Testnets a freshly onboarded wallet gets an address on, with public RPCs.
fn default_chains() -> Vec<(ChainInfo, &'static str)> {
    vec![
        (
            ChainInfo::new(11155111, "Sepolia", "ETH"),
            "https://rpc.sepolia.org",
        ),
        (
            ChainInfo::new(FUJI_CHAIN_ID, "Avalanche Fuji", "AVAX"),
            "https://api.avax-test.network/ext/bc/C/rpc",
        ),
        (
            ChainInfo::new(80001, "Polygon Mumbai", "MATIC"),
            "https://rpc-mumbai.maticvigil.com",
        ),
        (
            ChainInfo::new(84531, "Base Goerli", "ETH"),
            "https://goerli.base.org",
        ),
        (
            ChainInfo::new(420, "Optimism Goerli", "ETH"),
            "https://goerli.optimism.io",
        ),
        (
            ChainInfo::new(421613, "Arbitrum Goerli", "ETH"),
            "https://goerli-rollup.arbitrum.io/rpc",
        ),
    ]
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub frontend_origins: Vec<String>,
    pub price_feed_rpc_url: String,
    pub price_feeds: HashMap<String, String>,
    pub static_price_answers: HashMap<String, u128>,
    pub resolver_rpc_url: String,
    pub resolver_address: String,
    pub resolver_chain_id: u64,
    pub chains: Vec<ChainInfo>,
    pub chain_rpc_urls: HashMap<u64, String>,
    pub rpc_timeout: Duration,
    pub dashboard_refresh_interval: Duration,
    pub watch_domains: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let chains = env::var("SUPPORTED_CHAINS")
            .ok()
            .map(|raw| split_chains(&raw))
            .filter(|chains| !chains.is_empty())
            .unwrap_or_else(|| default_chains().into_iter().map(|(chain, _)| chain).collect());

        // 先放預設 RPC，再用 CHAIN_RPC_URLS 覆蓋
        let mut chain_rpc_urls: HashMap<u64, String> = default_chains()
            .into_iter()
            .map(|(chain, url)| (chain.id, url.to_string()))
            .collect();
        chain_rpc_urls.extend(parse_chain_urls("CHAIN_RPC_URLS"));

        let resolver_chain_id = parse_u64("RESOLVER_CHAIN_ID", FUJI_CHAIN_ID);
        let resolver_rpc_url = env::var("RESOLVER_RPC_URL")
            .ok()
            .or_else(|| chain_rpc_urls.get(&resolver_chain_id).cloned())
            .context("RESOLVER_RPC_URL must be set when the resolver chain has no RPC")?;

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8081".to_string())
                .parse()
                .context("PORT must be a valid u16")?,
            frontend_origins: parse_origins(),
            price_feed_rpc_url: env::var("PRICE_FEED_RPC_URL")
                .unwrap_or_else(|_| "https://cloudflare-eth.com".to_string()),
            price_feeds: env::var("PRICE_FEEDS")
                .map(|raw| split_price_feeds(&raw))
                .unwrap_or_default(),
            static_price_answers: env::var("STATIC_PRICE_ANSWERS")
                .map(|raw| split_static_answers(&raw))
                .unwrap_or_default(),
            resolver_rpc_url,
            resolver_address: env::var("RESOLVER_ADDRESS").unwrap_or_default(),
            resolver_chain_id,
            chains,
            chain_rpc_urls,
            rpc_timeout: Duration::from_millis(parse_u64("RPC_TIMEOUT_MS", 4000)),
            dashboard_refresh_interval: parse_duration_seconds("DASHBOARD_REFRESH_SECS", 12),
            watch_domains: env::var("WATCH_DOMAINS")
                .map(|raw| split_list(&raw))
                .unwrap_or_default(),
        })
    }
}

fn parse_origins() -> Vec<String> {
    if let Ok(list) = env::var("FRONTEND_ORIGINS") {
        split_list(&list)
    } else if let Ok(origin) = env::var("FRONTEND_ORIGIN") {
        split_list(&origin)
    } else {
        vec!["http://localhost:3000".to_string()]
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .filter_map(|item| {
            let trimmed = item.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
        .collect()
}

fn parse_duration_seconds(key: &str, default: u64) -> Duration {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(default))
}

fn parse_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn parse_chain_urls(key: &str) -> HashMap<u64, String> {
    match env::var(key) {
        Ok(raw) => split_chain_urls(&raw),
        Err(_) => HashMap::new(),
    }
}

/// `11155111=https://...,43113=https://...`
fn split_chain_urls(raw: &str) -> HashMap<u64, String> {
    raw.split(',')
        .filter_map(|item| {
            let (chain, url) = item.split_once('=')?;
            let chain_id = chain.trim().parse::<u64>().ok()?;
            let url = url.trim();
            if url.is_empty() {
                return None;
            }
            Some((chain_id, url.to_string()))
        })
        .collect()
}

/// `id:Name:SYMBOL[:decimals]`, comma separated.
fn split_chains(raw: &str) -> Vec<ChainInfo> {
    raw.split(',')
        .filter_map(|item| {
            let trimmed = item.trim();
            if trimmed.is_empty() {
                return None;
            }
            let parts: Vec<_> = trimmed.split(':').map(str::trim).collect();
            if parts.len() < 3 {
                return None;
            }
            let id = parts[0].parse::<u64>().ok()?;
            if coin_type_for_chain(id).is_err() {
                tracing::warn!(chain_id = id, "chain id has no ENSIP-11 coin type, skipping");
                return None;
            }
            let name = parts[1];
            let symbol = parts[2];
            if name.is_empty() || symbol.is_empty() {
                return None;
            }
            let decimals = parts
                .get(3)
                .and_then(|d| d.parse::<u8>().ok())
                .unwrap_or(18);
            Some(ChainInfo {
                id,
                name: name.to_string(),
                native_symbol: symbol.to_string(),
                native_decimals: decimals,
            })
        })
        .collect()
}

/// `ETH=0x5f4e...,BTC=0xF403...`. Symbols keep their case.
fn split_price_feeds(raw: &str) -> HashMap<String, String> {
    raw.split(',')
        .filter_map(|item| {
            let (symbol, address) = item.split_once('=')?;
            let symbol = symbol.trim();
            let address = address.trim();
            if symbol.is_empty() || address.is_empty() {
                return None;
            }
            Some((symbol.to_string(), address.to_string()))
        })
        .collect()
}

/// `ETH=300000000000`, answers at the oracle's 8-decimal scale.
fn split_static_answers(raw: &str) -> HashMap<String, u128> {
    raw.split(',')
        .filter_map(|item| {
            let (symbol, value) = item.split_once('=')?;
            let answer = value.trim().parse::<u128>().ok()?;
            let symbol = symbol.trim().to_string();
            if symbol.is_empty() {
                return None;
            }
            Some((symbol, answer))
        })
        .collect()
}
