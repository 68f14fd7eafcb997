use rlp::RlpStream;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::DripError;

pub const ADDRESS_LENGTH: usize = 20;

/// Token decimals, fixed at 18 like an ERC-20.
pub const DECIMALS: u8 = 18;

/// One whole token in base units (10^18).
pub const UNIT: Amount = 1_000_000_000_000_000_000;

/// Token quantity in the smallest denomination.
pub type Amount = u128;

/// Seconds since the Unix epoch. Zero means "never".
pub type Timestamp = u64;

// --- NewTypes ---

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address(pub [u8; ADDRESS_LENGTH]);

impl Address {
    pub const ZERO: Address = Address([0u8; ADDRESS_LENGTH]);

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; ADDRESS_LENGTH]
    }

    /// Identity of a contract created by `deployer` with the given account nonce.
    ///
    /// Same derivation as the EVM CREATE opcode: the last 20 bytes of
    /// `keccak256(rlp([deployer, nonce]))`. Lets a deployment know the address
    /// of an entity before it exists.
    pub fn contract_address(deployer: &Address, nonce: u64) -> Address {
        let mut stream = RlpStream::new_list(2);
        stream.append(&deployer.0.to_vec());
        stream.append(&nonce);

        let hash = keccak_hash::keccak(&stream.out());
        let mut addr_bytes = [0u8; ADDRESS_LENGTH];
        addr_bytes.copy_from_slice(&hash.0[12..]);
        Address(addr_bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, DripError> {
        if bytes.len() != ADDRESS_LENGTH {
            return Err(DripError::InvalidAddress(format!(
                "expected {} bytes, got {}",
                ADDRESS_LENGTH,
                bytes.len()
            )));
        }
        let mut arr = [0u8; ADDRESS_LENGTH];
        arr.copy_from_slice(bytes);
        Ok(Address(arr))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", hex::encode(self.0))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = DripError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(digits).map_err(|e| DripError::InvalidAddress(e.to_string()))?;
        Address::from_slice(&bytes)
    }
}

impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Privileged principals. Each privileged operation names exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Ledger deployer; may rebind the minter.
    Owner,
    /// The single identity allowed to issue new units.
    Minter,
    /// Dispenser administrator; controls the pause flag.
    Admin,
}

impl Role {
    /// Failure message reported to a caller lacking this role.
    pub fn denial(&self) -> &'static str {
        match self {
            Role::Owner => "Only owner",
            Role::Minter => "Only faucet can mint",
            Role::Admin => "Only admin",
        }
    }
}

/// Whole tokens to base units, `None` on overflow.
pub fn to_base_units(whole: u64) -> Option<Amount> {
    (whole as Amount).checked_mul(UNIT)
}

/// Renders base units as a decimal token quantity ("10", "1.5").
pub fn format_units(amount: Amount) -> String {
    let whole = amount / UNIT;
    let frac = amount % UNIT;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{:018}", frac);
    format!("{}.{}", whole, frac.trim_end_matches('0'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_display_and_parse() {
        let addr = Address([0xab; ADDRESS_LENGTH]);
        let text = addr.to_string();
        assert!(text.starts_with("0x"));
        assert_eq!(text.parse::<Address>().unwrap(), addr);
        assert_eq!(text.trim_start_matches("0x").parse::<Address>().unwrap(), addr);
    }

    #[test]
    fn test_address_rejects_bad_input() {
        assert!("0x1234".parse::<Address>().is_err());
        assert!("zz".repeat(20).parse::<Address>().is_err());
    }

    #[test]
    fn test_address_serde_roundtrip() {
        let addr = Address([7u8; ADDRESS_LENGTH]);
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{}\"", hex::encode([7u8; ADDRESS_LENGTH])));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }

    #[test]
    fn test_contract_address_matches_create() {
        let deployer: Address = "0x6ac7ea33f8831ea9dcc53393aaa88b25a785dbf0".parse().unwrap();
        assert_eq!(
            Address::contract_address(&deployer, 0).to_string(),
            "0xcd234a471b72ba2f1ccf0a70fcaba648a5eecd8d"
        );
        assert_eq!(
            Address::contract_address(&deployer, 1).to_string(),
            "0x343c43a37d37dff08ae8c4a11544c718abb4fcf8"
        );
    }

    #[test]
    fn test_contract_address_depends_on_nonce_and_deployer() {
        let a = Address([1u8; ADDRESS_LENGTH]);
        let b = Address([2u8; ADDRESS_LENGTH]);
        assert_ne!(Address::contract_address(&a, 0), Address::contract_address(&a, 1));
        assert_ne!(Address::contract_address(&a, 0), Address::contract_address(&b, 0));
        assert_eq!(Address::contract_address(&a, 5), Address::contract_address(&a, 5));
    }

    #[test]
    fn test_units() {
        assert_eq!(to_base_units(10), Some(10 * UNIT));
        assert_eq!(to_base_units(1_000_000), Some(1_000_000 * UNIT));
        assert_eq!(format_units(10 * UNIT), "10");
        assert_eq!(format_units(UNIT + UNIT / 2), "1.5");
        assert_eq!(format_units(0), "0");
    }

    #[test]
    fn test_role_denials_are_distinct() {
        assert_eq!(Role::Admin.denial(), "Only admin");
        assert_ne!(Role::Owner.denial(), Role::Minter.denial());
    }
}
