//! Serde adapter for `u128` amounts inside tagged enums.
//!
//! Internally tagged enums are buffered before the variant is known, and
//! that buffer has no `u128` slot. Amounts that fit in a `u64` are written as
//! plain integers; larger ones as decimal strings. Reading accepts either.
//!
//! ```
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! #[serde(tag = "kind")]
//! enum Msg {
//!     Pay {
//!         #[serde(with = "sluice_core::wide")]
//!         amount: u128,
//!     },
//! }
//!
//! let big = Msg::Pay { amount: u128::MAX };
//! let json = serde_json::to_string(&big).unwrap();
//! assert_eq!(serde_json::from_str::<Msg>(&json).unwrap(), big);
//! ```

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserializer, Serializer};

pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
    match u64::try_from(*value) {
        Ok(small) => serializer.serialize_u64(small),
        Err(_) => serializer.collect_str(value),
    }
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
    deserializer.deserialize_any(WideVisitor)
}

struct WideVisitor;

impl Visitor<'_> for WideVisitor {
    type Value = u128;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a non-negative integer or a decimal string")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<u128, E> {
        Ok(u128::from(v))
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<u128, E> {
        Ok(v)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<u128, E> {
        u128::try_from(v).map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<u128, E> {
        v.parse()
            .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
    }
}
