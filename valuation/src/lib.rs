//! USD valuation of balances from Chainlink-style price answers.
//!
//! Everything here is synchronous and side-effect free: callers fetch
//! balances and price answers, this crate turns them into a
//! [`ValuationResult`]. A failed or missing price never fails the whole
//! valuation; the affected asset is simply worth zero.

use domain::{Balance, PriceFeedResult, ValuationResult};
use num_bigint::{BigInt, Sign};
use num_traits::{pow, Zero};
use thiserror::Error;

/// Fixed-point scale of aggregator answers.
pub const ORACLE_DECIMALS: u32 = 8;

/// Scale used to render the USD total (the chain's native smallest unit).
pub const DISPLAY_DECIMALS: u32 = 18;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValuationError {
    #[error("empty amount")]
    Empty,
    #[error("invalid digit in amount {0:?}")]
    InvalidDigit(String),
    #[error("amount {value:?} has more than {decimals} fractional digits")]
    TooPrecise { value: String, decimals: u32 },
}

pub type UnitsResult<T> = Result<T, ValuationError>;

/// Values `balances[i]` with `price_results[i]`. A missing or failed result
/// prices that asset at zero; results past the last balance are ignored.
pub fn compute_valuation(
    balances: &[Balance],
    price_results: &[PriceFeedResult],
) -> ValuationResult {
    // price_results 可能比 balances 短，缺少的一律當作 0
    let prices: Vec<BigInt> = (0..balances.len())
        .map(|index| {
            price_results
                .get(index)
                .and_then(PriceFeedResult::answer)
                .map(descale_price)
                .unwrap_or_else(BigInt::zero)
        })
        .collect();

    let balances_in_usd: Vec<BigInt> = balances
        .iter()
        .zip(prices.iter())
        .map(|(balance, price)| BigInt::from(balance.value.clone()) * price)
        .collect();

    let total_balance_in_usd = balances_in_usd
        .iter()
        .fold(BigInt::zero(), |total, value| total + value);
    let total_formatted_in_usd = format_units(&total_balance_in_usd, DISPLAY_DECIMALS);

    tracing::debug!(
        assets = balances.len(),
        priced = prices.iter().filter(|price| !price.is_zero()).count(),
        total = %total_formatted_in_usd,
        "valuation computed"
    );

    ValuationResult {
        prices,
        balances_in_usd,
        total_balance_in_usd,
        total_formatted_in_usd,
    }
}

/// Drops the oracle's fractional digits. Truncates toward zero, so
/// `123456789012` becomes `1234`.
pub fn descale_price(answer: &BigInt) -> BigInt {
    answer / pow(BigInt::from(10u8), ORACLE_DECIMALS as usize)
}

/// Renders `value / 10^decimals` exactly, trimming trailing fractional zeros.
pub fn format_units(value: &BigInt, decimals: u32) -> String {
    let digits = value.magnitude().to_str_radix(10);
    let decimals = decimals as usize;
    let negative = value.sign() == Sign::Minus;

    let padded = if digits.len() < decimals {
        format!("{digits:0>decimals$}")
    } else {
        digits
    };
    let split = padded.len() - decimals;
    let (integer, fraction) = padded.split_at(split);
    let integer = if integer.is_empty() { "0" } else { integer };
    let fraction = fraction.trim_end_matches('0');

    let mut out = String::with_capacity(padded.len() + 2);
    if negative {
        out.push('-');
    }
    out.push_str(integer);
    if !fraction.is_empty() {
        out.push('.');
        out.push_str(fraction);
    }
    out
}

/// Parses a decimal string back into fixed point. Rejects anything that
/// would need rounding.
pub fn parse_units(text: &str, decimals: u32) -> UnitsResult<BigInt> {
    let trimmed = text.trim();
    let (negative, unsigned) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    if unsigned.is_empty() {
        return Err(ValuationError::Empty);
    }

    let (integer, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    if integer.is_empty() && fraction.is_empty() {
        return Err(ValuationError::Empty);
    }
    let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(integer) || !all_digits(fraction) {
        return Err(ValuationError::InvalidDigit(trimmed.to_string()));
    }
    let decimals_len = decimals as usize;
    if fraction.len() > decimals_len {
        return Err(ValuationError::TooPrecise {
            value: trimmed.to_string(),
            decimals,
        });
    }

    let scaled = format!("{integer}{fraction:0<decimals_len$}");
    let magnitude = if scaled.is_empty() {
        BigInt::zero()
    } else {
        BigInt::parse_bytes(scaled.as_bytes(), 10)
            .ok_or_else(|| ValuationError::InvalidDigit(trimmed.to_string()))?
    };
    Ok(if negative { -magnitude } else { magnitude })
}
