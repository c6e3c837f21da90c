//! Shared protojson encodings.

use serde::{Deserialize, Deserializer};

/// A protojson int64: a decimal string on the wire, occasionally a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Int64(pub u64);

impl<'de> Deserialize<'de> for Int64 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(u64),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Number(n) => Ok(Self(n)),
            Repr::Text(s) => s
                .parse()
                .map(Self)
                .map_err(|_| serde::de::Error::custom(format!("invalid int64 '{}'", s))),
        }
    }
}
