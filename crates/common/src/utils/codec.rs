use crate::error::Result;
use serde::{de::DeserializeOwned, Serialize};

/// Serialize any serde-compatible type to compact bincode bytes.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(bincode::serialize(value)?)
}

/// Deserialize bincode bytes to a type.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(bincode::deserialize(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Address;
    use std::collections::HashMap;

    #[test]
    fn test_map_keyed_by_address() {
        let mut balances: HashMap<Address, u128> = HashMap::new();
        balances.insert(Address([3u8; 20]), 10u128.pow(19));

        let bytes = encode(&balances).unwrap();
        let back: HashMap<Address, u128> = decode(&bytes).unwrap();
        assert_eq!(back, balances);
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(decode::<HashMap<Address, u128>>(&[0xff, 0xff]).is_err());
    }
}
