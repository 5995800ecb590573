pub mod balances;
pub mod error;
pub mod feeds;
pub mod resolver;

pub use balances::{BalanceReader, RpcBalanceReader};
pub use error::{ChainError, ChainResult};
pub use feeds::{
    ChainlinkPriceFeeds, FallbackPriceFeeds, FeedRegistry, PriceFeedReader, StaticPriceFeeds,
};
pub use resolver::{
    coin_type_for_chain, decode_resolved_address, namehash, DomainResolver, PublicResolver,
};
