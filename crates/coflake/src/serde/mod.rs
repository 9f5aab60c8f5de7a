//! Field adapters for `#[serde(with = "...")]`.
//!
//! [`SnowflakeId`] serializes as its native integer by default. Use
//! [`as_base32`] to store the Crockford string instead.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::id::SnowflakeId;

pub mod as_native {
    use super::{Deserialize, Deserializer, Serialize, Serializer};
    use crate::id::SnowflakeId;

    /// Serialize an ID as its native integer.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying serializer fails.
    pub fn serialize<S>(id: &SnowflakeId, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        id.to_raw().serialize(s)
    }

    /// Deserialize an ID from its native integer.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying deserializer fails or the value
    /// sets the reserved bit.
    pub fn deserialize<'de, D>(d: D) -> Result<SnowflakeId, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = u64::deserialize(d)?;
        SnowflakeId::try_from_raw(raw).map_err(serde::de::Error::custom)
    }
}

#[cfg_attr(docsrs, doc(cfg(feature = "base32")))]
#[cfg(feature = "base32")]
pub mod as_base32 {
    use super::{Deserializer, Serializer};
    use crate::id::SnowflakeId;

    /// Serialize an ID as a Crockford base32 string.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying serializer fails.
    pub fn serialize<S>(id: &SnowflakeId, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.serialize_str(id.encode().as_str())
    }

    /// Deserialize an ID from a Crockford base32 string.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying deserializer fails, the string is
    /// not valid Crockford base32, or the value sets the reserved bit.
    pub fn deserialize<'de, D>(d: D) -> Result<SnowflakeId, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct Base32Visitor;

        impl serde::de::Visitor<'_> for Base32Visitor {
            type Value = SnowflakeId;

            fn expecting(&self, formatter: &mut core::fmt::Formatter) -> core::fmt::Result {
                formatter.write_str("a Crockford base32 encoded string")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                SnowflakeId::decode(v).map_err(E::custom)
            }
        }

        d.deserialize_str(Base32Visitor)
    }
}

impl Serialize for SnowflakeId {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        as_native::serialize(self, s)
    }
}

impl<'de> Deserialize<'de> for SnowflakeId {
    fn deserialize<D>(d: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        as_native::deserialize(d)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[derive(PartialEq, Eq, Debug, Serialize, Deserialize)]
    struct Row {
        id: SnowflakeId,
    }

    #[test]
    fn native_by_default() {
        let row = Row {
            id: SnowflakeId::from_raw(42),
        };
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"id":42}"#);
        assert_eq!(serde_json::from_str::<Row>(&json).unwrap(), row);
    }

    #[test]
    fn native_rejects_reserved_bit() {
        let err = serde_json::from_value::<Row>(json!({ "id": u64::MAX })).unwrap_err();
        assert!(err.to_string().contains("reserved bit"));
    }

    #[cfg(feature = "base32")]
    #[test]
    fn base32_field() {
        #[derive(PartialEq, Eq, Debug, Serialize, Deserialize)]
        struct Encoded {
            #[serde(with = "as_base32")]
            id: SnowflakeId,
        }

        let row = Encoded {
            id: SnowflakeId::from_raw(42),
        };
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"id":"000000000001A"}"#);
        assert_eq!(serde_json::from_str::<Encoded>(&json).unwrap(), row);

        let err = serde_json::from_value::<Encoded>(json!({ "id": "FZZZZZZZZZZZZ" })).unwrap_err();
        assert!(err.to_string().contains("reserved bit"));
    }
}
