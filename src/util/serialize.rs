use {
    crate::util::conv,
    serde::{Deserialize, Deserializer, Serializer, de},
    serde_with::{DeserializeAs, SerializeAs},
};

/// Serialize and deserialize [`alloy::primitives::U256`] as a `0x`-prefixed
/// hexadecimal string, the form in which JSON-RPC quantities travel.
#[derive(Debug)]
pub struct Hex;

impl<'de> DeserializeAs<'de, alloy::primitives::U256> for Hex {
    fn deserialize_as<D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<alloy::primitives::U256, D::Error> {
        let raw = String::deserialize(deserializer)?;
        conv::hex_to_u256(&raw).map_err(de::Error::custom)
    }
}

impl SerializeAs<alloy::primitives::U256> for Hex {
    fn serialize_as<S: Serializer>(
        value: &alloy::primitives::U256,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{value:#x}"))
    }
}
