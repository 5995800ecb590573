use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use ethers::{
    contract::abigen,
    providers::Middleware,
    types::{Address, H256, U256},
    utils::keccak256,
};
use tracing::debug;

use crate::error::{ChainError, ChainResult};

/// High bit reserved by ENSIP-11 for EVM chain coin types.
pub const SLIP44_MSB: u64 = 0x8000_0000;

abigen!(
    PublicResolverContract,
    r#"[
        function addr(bytes32 node, uint256 coinType) external view returns (bytes)
    ]"#,
);

/// ENSIP-11 coin type of an EVM chain.
pub fn coin_type_for_chain(chain_id: u64) -> ChainResult<u64> {
    if chain_id >= SLIP44_MSB {
        return Err(ChainError::InvalidChainId(chain_id));
    }
    Ok(SLIP44_MSB | chain_id)
}

/// EIP-137 namehash. The name is hashed as given, without normalisation.
pub fn namehash(name: &str) -> H256 {
    let mut node = [0u8; 32];
    if name.is_empty() {
        return H256::from(node);
    }
    for label in name.rsplit('.') {
        let mut buf = [0u8; 64];
        buf[..32].copy_from_slice(&node);
        buf[32..].copy_from_slice(&keccak256(label.as_bytes()));
        node = keccak256(buf);
    }
    H256::from(node)
}

/// Empty output and the zero address both mean "no record".
pub fn decode_resolved_address(raw: &[u8]) -> ChainResult<Option<Address>> {
    match raw.len() {
        0 => Ok(None),
        20 => {
            let address = Address::from_slice(raw);
            Ok((!address.is_zero()).then_some(address))
        }
        other => Err(ChainError::MalformedAddress(other)),
    }
}

#[async_trait]
pub trait DomainResolver: Send + Sync {
    /// Chain specific address record of `domain`, if one is set.
    async fn resolve(&self, domain: &str, chain_id: u64) -> ChainResult<Option<Address>>;
}

/// `addr(bytes32,uint256)` reader. Without a contract address every domain
/// resolves to nothing.
pub struct PublicResolver<M>
where
    M: Middleware + 'static,
{
    contract: Option<PublicResolverContract<M>>,
    timeout: Duration,
}

impl<M> PublicResolver<M>
where
    M: Middleware + 'static,
{
    pub fn new(address: Option<Address>, provider: Arc<M>, timeout: Duration) -> Self {
        Self {
            contract: address.map(|address| PublicResolverContract::new(address, provider)),
            timeout,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.contract.is_some()
    }
}

#[async_trait]
impl<M> DomainResolver for PublicResolver<M>
where
    M: Middleware + 'static,
{
    async fn resolve(&self, domain: &str, chain_id: u64) -> ChainResult<Option<Address>> {
        let coin_type = coin_type_for_chain(chain_id)?;
        let Some(contract) = &self.contract else {
            return Ok(None);
        };
        let node = namehash(domain);
        let call = contract.addr(node.0, U256::from(coin_type));
        let raw = tokio::time::timeout(self.timeout, call.call())
            .await
            .map_err(|_| ChainError::Timeout(self.timeout))?
            .map_err(|err| ChainError::Rpc(err.to_string()))?;
        let resolved = decode_resolved_address(raw.as_ref())?;
        debug!(%domain, chain_id, coin_type, resolved = ?resolved, "domain resolved");
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::{
        abi::{encode, Token},
        providers::Provider,
        types::Bytes,
    };

    #[test]
    fn coin_types_follow_ensip11() {
        assert_eq!(coin_type_for_chain(43113).unwrap(), 0x8000_a869);
        assert_eq!(coin_type_for_chain(11155111).unwrap(), 2_158_638_759);
        assert!(matches!(
            coin_type_for_chain(SLIP44_MSB),
            Err(ChainError::InvalidChainId(_))
        ));
    }

    #[test]
    fn namehash_matches_eip137_vectors() {
        assert_eq!(namehash(""), H256::zero());
        assert_eq!(
            format!("{:#x}", namehash("eth")),
            "0x93cdeb708b7545dc668eb9280176169d1c33cfd8ed6f04690a0bcc88a93fc4ae"
        );
        assert_eq!(
            format!("{:#x}", namehash("foo.eth")),
            "0xde9b09fd7c5f901e23a3f19fecc54828e9c848539801e86591bd9801b019f84f"
        );
    }

    #[test]
    fn resolved_bytes_decode() {
        assert_eq!(decode_resolved_address(&[]).unwrap(), None);
        assert_eq!(decode_resolved_address(&[0u8; 20]).unwrap(), None);
        let address = Address::repeat_byte(0xab);
        assert_eq!(
            decode_resolved_address(address.as_bytes()).unwrap(),
            Some(address)
        );
        assert!(matches!(
            decode_resolved_address(&[1u8; 32]),
            Err(ChainError::MalformedAddress(32))
        ));
    }

    #[tokio::test]
    async fn resolver_reads_address_record() {
        let (provider, mock) = Provider::mocked();
        let target = Address::repeat_byte(0x5a);
        let encoded = encode(&[Token::Bytes(target.as_bytes().to_vec())]);
        mock.push::<Bytes, _>(Bytes::from(encoded)).unwrap();

        let resolver = PublicResolver::new(
            Some(Address::repeat_byte(0x01)),
            Arc::new(provider),
            Duration::from_secs(5),
        );
        let resolved = resolver.resolve("alice.unwallet.eth", 43113).await.unwrap();
        assert_eq!(resolved, Some(target));
    }

    #[tokio::test]
    async fn unconfigured_resolver_resolves_nothing() {
        let (provider, _mock) = Provider::mocked();
        let resolver = PublicResolver::new(None, Arc::new(provider), Duration::from_secs(5));
        assert!(!resolver.is_configured());
        assert_eq!(resolver.resolve("alice.eth", 43113).await.unwrap(), None);
        assert!(resolver.resolve("alice.eth", SLIP44_MSB).await.is_err());
    }
}
