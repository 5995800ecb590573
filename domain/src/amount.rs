//! Serde helpers for unbounded integers.
//!
//! Balances and USD totals routinely exceed what a JSON number can carry
//! without loss, so they travel as base-10 strings. Plain JSON integers that
//! fit in a `u64` or `i64` are still accepted on input; anything wider has to
//! be a string, since JSON parsers round such numbers through `f64`.

use std::{fmt::Display, str::FromStr};

use serde::{de, Deserialize, Deserializer, Serializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Text(String),
    Unsigned(u64),
    Signed(i64),
}

impl RawAmount {
    fn into_text(self) -> String {
        match self {
            RawAmount::Text(value) => value,
            RawAmount::Unsigned(value) => value.to_string(),
            RawAmount::Signed(value) => value.to_string(),
        }
    }
}

fn parse_text<T, E>(raw: &str) -> Result<T, E>
where
    T: FromStr,
    T::Err: Display,
    E: de::Error,
{
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(E::custom("empty integer string"));
    }
    trimmed
        .parse::<T>()
        .map_err(|err| E::custom(format!("invalid integer {trimmed:?}: {err}")))
}

pub mod decimal_string {
    use super::*;

    pub fn serialize<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Display,
        S: Serializer,
    {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        T: FromStr,
        T::Err: Display,
        D: Deserializer<'de>,
    {
        let raw = RawAmount::deserialize(deserializer)?.into_text();
        parse_text(&raw)
    }
}

pub mod decimal_string_vec {
    use super::*;

    pub fn serialize<T, S>(values: &[T], serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Display,
        S: Serializer,
    {
        serializer.collect_seq(values.iter().map(|value| value.to_string()))
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        T: FromStr,
        T::Err: Display,
        D: Deserializer<'de>,
    {
        Vec::<RawAmount>::deserialize(deserializer)?
            .into_iter()
            .map(|raw| parse_text(&raw.into_text()))
            .collect()
    }
}
