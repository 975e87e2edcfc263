// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! In the Filecoin ecosystem, there are TWO different ways to present a domain object:
//! - CBOR (defined in [`fvm_ipld_encoding`]).
//!   This is the wire format, and the format of messages inside a test vector.
//! - JSON (see [`serde_json`]).
//!   This is what the Lotus RPC API speaks.
//!
//! `serde` has ONE (de)serialization model per struct, so domain types keep their CBOR
//! `Serialize`/`Deserialize` implementations and attach a separate JSON type through
//! [`HasLotusJson`].
//!
//! Whenever you need the lotus JSON of an object, use the [`LotusJson`] wrapper or
//! `#[serde(with = "crate::lotus_json")]`.
//! The actual [`HasLotusJson::LotusJson`] types should stay private.
//!
//! ### Compound structs
//! - Each field of a struct should be wrapped with [`LotusJson`] (or use `with`).
//! - Use destructuring to ensure exhaustiveness.
//!
//! ### Testing
//! Implementations list JSON snapshots of the domain type in [`HasLotusJson::snapshots`].
//! Modules declared with [`decl_and_test`] have their snapshots checked automatically.

use derive_more::From;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de::DeserializeOwned};
#[cfg(test)]
use serde_json::json;
use std::{fmt::Display, str::FromStr};
#[cfg(test)]
use {pretty_assertions::assert_eq, quickcheck::quickcheck};

pub trait HasLotusJson: Sized {
    /// The struct representing JSON. You should `#[derive(Deserialize, Serialize)]` on it.
    type LotusJson: Serialize + DeserializeOwned;
    /// Snapshots of the JSON, and the domain type it should serialize to.
    ///
    /// Serialization and de-serialization of the domain type should match the snapshot.
    #[cfg(test)]
    fn snapshots() -> Vec<(serde_json::Value, Self)>;
    fn into_lotus_json(self) -> Self::LotusJson;
    fn from_lotus_json(lotus_json: Self::LotusJson) -> Self;
    fn into_lotus_json_value(self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self.into_lotus_json())
    }
}

macro_rules! decl_and_test {
    ($($mod_name:ident for $domain_ty:ty),* $(,)?) => {
        $(
            mod $mod_name;
        )*
        #[test]
        fn all_snapshots() {
            $(
                print!("test snapshots for {}...", std::any::type_name::<$domain_ty>());
                std::io::Write::flush(&mut std::io::stdout()).unwrap();
                // ^ make sure the above line is flushed in case the test fails
                assert_all_snapshots::<$domain_ty>();
                println!("ok.");
            )*
        }
    }
}

decl_and_test!(
    address for crate::shim::address::Address,
    block_header for crate::blocks::BlockHeader,
    cid for ::cid::Cid,
    message for crate::shim::message::Message,
    receipt for crate::shim::executor::Receipt,
    tipset for crate::blocks::Tipset,
    tipset_keys for crate::blocks::TipsetKey,
    token_amount for crate::shim::econ::TokenAmount,
    vec_u8 for Vec<u8>,
);

// Generic over their element type, so they cannot be snapshotted above.
mod opt;
mod raw_bytes; // shares the JSON shape of `Vec<u8>`
mod vec;

#[cfg(test)]
pub fn assert_all_snapshots<T>()
where
    T: HasLotusJson + PartialEq + std::fmt::Debug + Clone,
{
    let snapshots = T::snapshots();
    assert!(!snapshots.is_empty());
    for (lotus_json, val) in snapshots {
        assert_one_snapshot(lotus_json, val);
    }
}

#[cfg(test)]
pub fn assert_one_snapshot<T>(lotus_json: serde_json::Value, val: T)
where
    T: HasLotusJson + PartialEq + std::fmt::Debug + Clone,
{
    // T -> T::LotusJson -> lotus_json
    let serialized = val.clone().into_lotus_json_value().unwrap();
    assert_eq!(
        serialized.to_string(),
        lotus_json.to_string(),
        "snapshot failed for {}",
        std::any::type_name::<T>()
    );

    // lotus_json -> T::LotusJson -> T
    let deserialized = match serde_json::from_value::<T::LotusJson>(lotus_json.clone()) {
        Ok(lotus_json) => T::from_lotus_json(lotus_json),
        Err(e) => panic!(
            "couldn't deserialize a {} from {}: {e}",
            std::any::type_name::<T::LotusJson>(),
            lotus_json
        ),
    };
    assert_eq!(deserialized, val);
}

#[cfg(test)]
pub fn assert_unchanged_via_json<T>(val: T)
where
    T: HasLotusJson + Clone + PartialEq + std::fmt::Debug,
{
    // T -> T::LotusJson -> lotus_json -> T::LotusJson -> T
    let temp = val.clone().into_lotus_json();
    let temp = serde_json::to_value(temp).unwrap();
    let temp = serde_json::from_value::<T::LotusJson>(temp).unwrap();
    let temp = T::from_lotus_json(temp);

    assert_eq!(val, temp);
}

/// Usage: `#[serde(with = "stringify")]`
pub mod stringify {
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
        String::deserialize(deserializer)?
            .parse()
            .map_err(serde::de::Error::custom)
    }
}

/// Usage: `#[serde(with = "base64_standard")]`
///
/// Lotus writes empty byte slices as `null`, which is accepted on input.
pub mod base64_standard {
    use super::*;

    use base64::engine::{Engine as _, general_purpose::STANDARD};

    pub fn serialize<S>(value: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        STANDARD.encode(value).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(s) => STANDARD.decode(s).map_err(serde::de::Error::custom),
            None => Ok(vec![]),
        }
    }
}

/// MUST NOT be used in any `LotusJson` structs
pub fn serialize<S, T>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: HasLotusJson + Clone,
{
    value.clone().into_lotus_json().serialize(serializer)
}

/// MUST NOT be used in any `LotusJson` structs.
pub fn deserialize<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: HasLotusJson,
{
    Ok(T::from_lotus_json(Deserialize::deserialize(deserializer)?))
}

/// A domain struct that is (de) serialized through its lotus JSON representation.
#[derive(Debug, Deserialize, From, Default, PartialEq, Eq, Serialize, Clone)]
#[serde(bound = "T: HasLotusJson + Clone", transparent)]
pub struct LotusJson<T>(#[serde(with = "self")] pub T);

impl<T> LotusJson<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

macro_rules! lotus_json_with_self {
    ($($domain_ty:ty),* $(,)?) => {
        $(
            impl $crate::lotus_json::HasLotusJson for $domain_ty {
                type LotusJson = Self;
                #[cfg(test)]
                fn snapshots() -> Vec<(serde_json::Value, Self)> {
                    unimplemented!("tests are trivial for HasLotusJson<LotusJson = Self>")
                }
                fn into_lotus_json(self) -> Self::LotusJson {
                    self
                }
                fn from_lotus_json(lotus_json: Self::LotusJson) -> Self {
                    lotus_json
                }
            }
        )*
    }
}
pub(crate) use lotus_json_with_self;

lotus_json_with_self!(u32, u64, i64, String, bool, serde_json::Value, ());

impl<A: HasLotusJson> HasLotusJson for (A,) {
    type LotusJson = (A::LotusJson,);
    #[cfg(test)]
    fn snapshots() -> Vec<(serde_json::Value, Self)> {
        unimplemented!("tests are trivial for HasLotusJson<LotusJson = Self>")
    }
    fn into_lotus_json(self) -> Self::LotusJson {
        (self.0.into_lotus_json(),)
    }
    fn from_lotus_json(lotus_json: Self::LotusJson) -> Self {
        (HasLotusJson::from_lotus_json(lotus_json.0),)
    }
}

impl<A: HasLotusJson, B: HasLotusJson> HasLotusJson for (A, B) {
    type LotusJson = (A::LotusJson, B::LotusJson);
    #[cfg(test)]
    fn snapshots() -> Vec<(serde_json::Value, Self)> {
        unimplemented!("tests are trivial for HasLotusJson<LotusJson = Self>")
    }
    fn into_lotus_json(self) -> Self::LotusJson {
        (self.0.into_lotus_json(), self.1.into_lotus_json())
    }
    fn from_lotus_json(lotus_json: Self::LotusJson) -> Self {
        (
            HasLotusJson::from_lotus_json(lotus_json.0),
            HasLotusJson::from_lotus_json(lotus_json.1),
        )
    }
}

#[cfg(test)]
quickcheck! {
    fn token_amounts_survive_json(attos: num_bigint::BigInt) -> () {
        assert_unchanged_via_json(crate::shim::econ::TokenAmount::from_atto(attos))
    }

    fn bytes_survive_json(bytes: Vec<u8>) -> () {
        assert_unchanged_via_json(bytes)
    }
}

#[test]
fn null_bytes_decode_as_empty() {
    let decoded = serde_json::from_value::<LotusJson<Vec<u8>>>(json!(null)).unwrap();
    assert_eq!(decoded.into_inner(), Vec::<u8>::new());
}
