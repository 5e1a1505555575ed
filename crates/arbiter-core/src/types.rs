use serde::{Deserialize, Serialize};
use std::fmt;

/// Balance in base token units. The stable token uses 6 decimals
/// (1 token = 1_000_000 units); native balances use the same scale.
pub type Balance = u128;

/// Unix timestamp (seconds, UTC).
pub type Timestamp = i64;

/// Sequential challenge handle, assigned at creation.
pub type ChallengeId = u64;

/// Sequential marketplace token handle, assigned at creation.
pub type TokenId = u64;

/// Index of a submission within a challenge. Insertion order is the
/// stable reference used for voting.
pub type SubmissionIndex = u32;

// ── Address ──────────────────────────────────────────────────────────────────

/// 20-byte account address. The all-zero address is the sentinel meaning
/// "no address" (no winner determined, no request submitted by anyone).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address(pub [u8; 20]);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    pub fn from_bytes(b: [u8; 20]) -> Self {
        Self(b)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(stripped)?;
        if bytes.len() != 20 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 20];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({}…)", &self.to_hex()[..10])
    }
}

// ── RequestId ────────────────────────────────────────────────────────────────

/// 32-byte opaque correlation handle linking a submitted oracle request to
/// its eventual off-system result. Assigned by the external network at
/// submission time — never generated locally. The all-zero handle is the
/// sentinel for "nothing submitted yet".
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(pub [u8; 32]);

impl RequestId {
    pub const ZERO: RequestId = RequestId([0u8; 32]);

    pub fn from_bytes(b: [u8; 32]) -> Self {
        Self(b)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(stripped)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RequestId({}…)", &self.to_hex()[..18])
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_hex_round_trip() {
        let a = Address::from_bytes([0xab; 20]);
        let parsed = Address::from_hex(&a.to_hex()).unwrap();
        assert_eq!(a, parsed);
    }

    #[test]
    fn address_from_hex_rejects_wrong_length() {
        assert!(Address::from_hex("0xdeadbeef").is_err());
    }

    #[test]
    fn zero_sentinels() {
        assert!(Address::ZERO.is_zero());
        assert!(RequestId::ZERO.is_zero());
        assert!(!RequestId::from_bytes([1u8; 32]).is_zero());
    }
}
