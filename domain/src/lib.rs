use chrono::{DateTime, Utc};
use num_bigint::{BigInt, BigUint};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod amount;

use amount::{decimal_string, decimal_string_vec};

/// A token or native balance in the asset's smallest unit (e.g. wei).
///
/// `value` is a base-10 string on the wire. JSON numbers are accepted only up
/// to `u64::MAX`; larger amounts must be sent as strings.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Balance {
    pub decimals: u8,
    pub symbol: String,
    #[serde(with = "decimal_string")]
    pub value: BigUint,
}

impl Balance {
    pub fn new(symbol: impl Into<String>, decimals: u8, value: impl Into<BigUint>) -> Self {
        Self {
            decimals,
            symbol: symbol.into(),
            value: value.into(),
        }
    }

    pub fn zero(symbol: impl Into<String>, decimals: u8) -> Self {
        Self::new(symbol, decimals, 0u32)
    }
}

/// Decoded `latestRoundData()` tuple of an aggregator feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundData {
    pub round_id: u128,
    pub answer: BigInt,
    pub started_at: BigUint,
    pub updated_at: BigUint,
    pub answered_in_round: u128,
}

impl RoundData {
    pub fn into_result(self) -> PriceFeedResult {
        PriceFeedResult::Answer {
            answer: self.answer,
        }
    }
}

/// Outcome of one price query. On the wire: `{ "ok": true, "answer": "..." }`
/// or `{ "ok": false }`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(from = "PriceFeedWire", into = "PriceFeedWire")]
pub enum PriceFeedResult {
    /// Latest answer at the oracle's 8-decimal scale.
    Answer { answer: BigInt },
    Unavailable,
}

impl PriceFeedResult {
    pub fn answer(&self) -> Option<&BigInt> {
        match self {
            PriceFeedResult::Answer { answer } => Some(answer),
            PriceFeedResult::Unavailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.answer().is_some()
    }
}

impl From<BigInt> for PriceFeedResult {
    fn from(answer: BigInt) -> Self {
        PriceFeedResult::Answer { answer }
    }
}

#[derive(Serialize, Deserialize)]
struct PriceFeedWire {
    ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    answer: Option<Value>,
}

impl From<PriceFeedWire> for PriceFeedResult {
    fn from(wire: PriceFeedWire) -> Self {
        if !wire.ok {
            return PriceFeedResult::Unavailable;
        }
        // ok 但沒有可解析的 answer，一律視為失敗
        let answer = match wire.answer {
            Some(Value::String(text)) => text.trim().parse::<BigInt>().ok(),
            Some(Value::Number(number)) => {
                number.as_i64().map(BigInt::from).or_else(|| number.as_u64().map(BigInt::from))
            }
            _ => None,
        };
        answer
            .map(PriceFeedResult::from)
            .unwrap_or(PriceFeedResult::Unavailable)
    }
}

impl From<PriceFeedResult> for PriceFeedWire {
    fn from(result: PriceFeedResult) -> Self {
        match result {
            PriceFeedResult::Answer { answer } => PriceFeedWire {
                ok: true,
                answer: Some(Value::String(answer.to_string())),
            },
            PriceFeedResult::Unavailable => PriceFeedWire {
                ok: false,
                answer: None,
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ValuationResult {
    #[serde(with = "decimal_string_vec")]
    pub prices: Vec<BigInt>,
    #[serde(rename = "balancesInUSD", with = "decimal_string_vec")]
    pub balances_in_usd: Vec<BigInt>,
    #[serde(rename = "totalBalanceInUSD", with = "decimal_string")]
    pub total_balance_in_usd: BigInt,
    #[serde(rename = "totalFormattedInUSD")]
    pub total_formatted_in_usd: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ChainInfo {
    pub id: u64,
    pub name: String,
    pub native_symbol: String,
    pub native_decimals: u8,
}

impl ChainInfo {
    pub fn new(id: u64, name: &str, native_symbol: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            native_symbol: native_symbol.to_string(),
            native_decimals: 18,
        }
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct ChainSummary {
    pub id: u64,
    pub name: String,
    pub native_symbol: String,
    pub coin_type: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChainDetails {
    pub chain_id: u64,
    pub chain_name: String,
    pub coin_type: u64,
    pub resolved_address: String,
    pub resolved: bool,
    pub balance: Balance,
    pub formatted_balance: String,
    pub symbol: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DashboardView {
    pub domain: String,
    pub chains: Vec<ChainDetails>,
    pub valuation: ValuationResult,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingStep {
    pub id: &'static str,
    pub title: &'static str,
    pub short_title: &'static str,
    pub description: &'static str,
}

const ONBOARDING_STEPS: [OnboardingStep; 2] = [
    OnboardingStep {
        id: "1",
        title: "Select Domain",
        short_title: "Select Domain",
        description: "Find your favorite multichain domain name.",
    },
    OnboardingStep {
        id: "2",
        title: "Create Unwallet",
        short_title: "Create Unwallet",
        description: "Deploying smart wallet only using on-device biometrics.",
    },
];

pub fn onboarding_steps() -> &'static [OnboardingStep] {
    &ONBOARDING_STEPS
}

pub fn find_step(id: &str) -> Option<&'static OnboardingStep> {
    ONBOARDING_STEPS.iter().find(|step| step.id == id)
}

pub fn next_step(id: &str) -> Option<&'static OnboardingStep> {
    let index = ONBOARDING_STEPS.iter().position(|step| step.id == id)?;
    ONBOARDING_STEPS.get(index + 1)
}
