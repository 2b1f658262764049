//! u128 ↔ string serde adapter.
//!
//! JSON and TOML have no 128-bit integers, so amounts are written as decimal
//! strings. Reading accepts either a string or a plain integer so that
//! hand-written TOML campaign files can use `divisor = 100`.

use serde::de::{self, Visitor};
use serde::{Deserializer, Serializer};

pub fn serialize<S: Serializer>(val: &u128, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&val.to_string())
}

pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<u128, D::Error> {
    struct U128Visitor;

    impl<'de> Visitor<'de> for U128Visitor {
        type Value = u128;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            f.write_str("a u128 as a string or integer")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<u128, E> {
            v.parse().map_err(E::custom)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<u128, E> {
            Ok(v as u128)
        }

        fn visit_u128<E: de::Error>(self, v: u128) -> Result<u128, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<u128, E> {
            if v >= 0 {
                Ok(v as u128)
            } else {
                Err(E::custom("negative value for u128"))
            }
        }
    }

    d.deserialize_any(U128Visitor)
}

/// Same encoding for `Vec<u128>`.
pub mod vec {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Amount {
        Str(String),
        Int(u64),
    }

    pub fn serialize<S: Serializer>(vals: &[u128], s: S) -> Result<S::Ok, S::Error> {
        s.collect_seq(vals.iter().map(|v| v.to_string()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u128>, D::Error> {
        Vec::<Amount>::deserialize(d)?
            .into_iter()
            .map(|a| match a {
                Amount::Str(s) => s.parse::<u128>().map_err(serde::de::Error::custom),
                Amount::Int(v) => Ok(v as u128),
            })
            .collect()
    }
}

/// Same encoding for the values of a `BTreeMap<String, u128>`.
pub mod map {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::collections::BTreeMap;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Amount {
        Str(String),
        Int(u64),
    }

    pub fn serialize<S: Serializer>(vals: &BTreeMap<String, u128>, s: S) -> Result<S::Ok, S::Error> {
        s.collect_map(vals.iter().map(|(k, v)| (k, v.to_string())))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<BTreeMap<String, u128>, D::Error> {
        BTreeMap::<String, Amount>::deserialize(d)?
            .into_iter()
            .map(|(k, a)| {
                let v = match a {
                    Amount::Str(s) => s.parse::<u128>().map_err(serde::de::Error::custom)?,
                    Amount::Int(v) => v as u128,
                };
                Ok((k, v))
            })
            .collect()
    }
}

/// Two-level map, e.g. asset → holder → balance.
pub mod nested_map {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    struct InnerRef<'a>(&'a BTreeMap<String, u128>);

    impl Serialize for InnerRef<'_> {
        fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
            super::map::serialize(self.0, s)
        }
    }

    #[derive(Deserialize)]
    #[serde(transparent)]
    struct Inner(#[serde(with = "super::map")] BTreeMap<String, u128>);

    pub fn serialize<S: Serializer>(
        vals: &BTreeMap<String, BTreeMap<String, u128>>,
        s: S,
    ) -> Result<S::Ok, S::Error> {
        s.collect_map(vals.iter().map(|(k, v)| (k, InnerRef(v))))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<BTreeMap<String, BTreeMap<String, u128>>, D::Error> {
        Ok(BTreeMap::<String, Inner>::deserialize(d)?
            .into_iter()
            .map(|(k, inner)| (k, inner.0))
            .collect())
    }
}
