use std::{collections::HashMap, sync::Arc, time::Duration};

use chain::{coin_type_for_chain, BalanceReader, ChainResult, DomainResolver, PriceFeedReader};
use chrono::Utc;
use domain::{Balance, ChainDetails, ChainInfo, ChainSummary, DashboardView, ValuationResult};
use ethers::types::Address;
use futures::future::join_all;
use num_bigint::BigInt;
use tokio::{sync::RwLock, time::sleep};
use tracing::{info, warn};
use valuation::{compute_valuation, format_units};

/// Resolves a domain on every supported chain and values what it holds.
pub struct DashboardService {
    chains: Vec<ChainInfo>,
    resolver: Arc<dyn DomainResolver>,
    balances: Arc<dyn BalanceReader>,
    feeds: Arc<dyn PriceFeedReader>,
    views: RwLock<HashMap<String, Arc<DashboardView>>>,
}

impl DashboardService {
    pub fn new(
        chains: Vec<ChainInfo>,
        resolver: Arc<dyn DomainResolver>,
        balances: Arc<dyn BalanceReader>,
        feeds: Arc<dyn PriceFeedReader>,
    ) -> Self {
        // ENSIP-11 沒有對應 coin type 的鏈直接排除
        let chains = chains
            .into_iter()
            .filter(|chain| match coin_type_for_chain(chain.id) {
                Ok(_) => true,
                Err(err) => {
                    warn!(error = %err, chain_id = chain.id, "dropping chain without coin type");
                    false
                }
            })
            .collect();
        Self {
            chains,
            resolver,
            balances,
            feeds,
            views: RwLock::new(HashMap::new()),
        }
    }

    pub fn chains(&self) -> &[ChainInfo] {
        &self.chains
    }

    pub fn chain(&self, chain_id: u64) -> Option<&ChainInfo> {
        self.chains.iter().find(|chain| chain.id == chain_id)
    }

    pub fn chain_summaries(&self) -> Vec<ChainSummary> {
        self.chains
            .iter()
            .filter_map(|chain| {
                let coin_type = coin_type_for_chain(chain.id).ok()?;
                Some(ChainSummary {
                    id: chain.id,
                    name: chain.name.clone(),
                    native_symbol: chain.native_symbol.clone(),
                    coin_type,
                })
            })
            .collect()
    }

    /// Resolved address and native balance on one chain. Resolution or RPC
    /// failures show up as an unresolved zero balance; only a chain id with
    /// no ENSIP-11 coin type is an error.
    pub async fn chain_details(
        &self,
        domain: &str,
        chain: &ChainInfo,
    ) -> ChainResult<ChainDetails> {
        let coin_type = coin_type_for_chain(chain.id)?;
        let resolved = match self.resolver.resolve(domain, chain.id).await {
            Ok(resolved) => resolved,
            Err(err) => {
                warn!(error = %err, %domain, chain_id = chain.id, "domain resolution failed");
                None
            }
        };

        let balance = match resolved {
            Some(address) => match self.balances.native_balance(chain, address).await {
                Ok(balance) => balance,
                Err(err) => {
                    warn!(
                        error = %err,
                        %domain,
                        chain_id = chain.id,
                        %address,
                        "native balance fetch failed, using 0"
                    );
                    Balance::zero(chain.native_symbol.clone(), chain.native_decimals)
                }
            },
            None => Balance::zero(chain.native_symbol.clone(), chain.native_decimals),
        };

        let formatted_balance = format_units(
            &BigInt::from(balance.value.clone()),
            u32::from(balance.decimals),
        );
        Ok(ChainDetails {
            chain_id: chain.id,
            chain_name: chain.name.clone(),
            coin_type,
            resolved_address: format!("{:#x}", resolved.unwrap_or_else(Address::zero)),
            resolved: resolved.is_some(),
            symbol: balance.symbol.clone(),
            formatted_balance,
            balance,
        })
    }

    /// One price query per balance, then the pure valuation.
    pub async fn value_balances(&self, balances: &[Balance]) -> ValuationResult {
        let symbols: Vec<String> = balances.iter().map(|b| b.symbol.clone()).collect();
        let results = self.feeds.latest_answers(&symbols).await;
        let unavailable = results.iter().filter(|r| !r.is_available()).count()
            + balances.len().saturating_sub(results.len());
        if unavailable > 0 {
            metrics::counter!("price_feed_unavailable_total").increment(unavailable as u64);
        }
        compute_valuation(balances, &results)
    }

    pub async fn build_view(&self, domain: &str) -> DashboardView {
        let chains: Vec<ChainDetails> = join_all(
            self.chains
                .iter()
                .map(|chain| self.chain_details(domain, chain)),
        )
        .await
        .into_iter()
        .filter_map(Result::ok)
        .collect();
        let balances: Vec<Balance> = chains.iter().map(|c| c.balance.clone()).collect();
        let valuation = self.value_balances(&balances).await;

        DashboardView {
            domain: domain.to_string(),
            chains,
            valuation,
            updated_at: Utc::now(),
        }
    }

    /// Recomputes and replaces the cached view for `domain`.
    pub async fn refresh(&self, domain: &str) -> Arc<DashboardView> {
        let view = Arc::new(self.build_view(domain).await);
        self.views
            .write()
            .await
            .insert(domain.to_string(), view.clone());
        metrics::counter!("dashboard_refresh_total").increment(1);
        view
    }

    pub async fn cached(&self, domain: &str) -> Option<Arc<DashboardView>> {
        self.views.read().await.get(domain).cloned()
    }

    /// Cached view when one exists, otherwise a live one.
    pub async fn view(&self, domain: &str) -> Arc<DashboardView> {
        match self.cached(domain).await {
            Some(view) => view,
            None => self.refresh(domain).await,
        }
    }

    /// Re-polls `domains` every `interval`. Each round replaces the previous
    /// view, so readers always see the latest completed one.
    pub fn spawn_watch(self: Arc<Self>, domains: Vec<String>, interval: Duration) {
        info!(domains = ?domains, interval_secs = interval.as_secs(), "dashboard watch started");
        tokio::spawn(async move {
            loop {
                for domain in &domains {
                    let view = self.refresh(domain).await;
                    info!(
                        %domain,
                        resolved = view.chains.iter().filter(|c| c.resolved).count(),
                        total_usd = %view.valuation.total_formatted_in_usd,
                        "dashboard refreshed"
                    );
                }
                sleep(interval).await;
            }
        });
    }
}
