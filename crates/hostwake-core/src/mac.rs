//! MAC address parsing and formatting.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::IdError;

/// A 48-bit hardware address.
///
/// Accepts `AA:BB:CC:DD:EE:FF`, `aa-bb-cc-dd-ee-ff` and `aabbccddeeff`.
/// Always displays as upper-case, colon separated.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    /// Create a new `MacAddress` from raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    /// Return the underlying bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }
}

impl FromStr for MacAddress {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let invalid = || IdError::InvalidMac(trimmed.to_string());

        let digits: String = if trimmed.contains(':') || trimmed.contains('-') {
            let groups: Vec<&str> = trimmed.split([':', '-']).collect();
            if groups.len() != 6 || groups.iter().any(|g| g.len() != 2) {
                return Err(invalid());
            }
            groups.concat()
        } else {
            trimmed.to_string()
        };

        let bytes = hex::decode(&digits).map_err(|_| invalid())?;
        let arr: [u8; 6] = bytes.try_into().map_err(|_| invalid())?;
        Ok(Self(arr))
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02X}:{b:02X}:{c:02X}:{d:02X}:{e:02X}:{g:02X}")
    }
}

impl fmt::Debug for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MacAddress({self})")
    }
}

impl TryFrom<String> for MacAddress {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MacAddress> for String {
    fn from(mac: MacAddress) -> Self {
        mac.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_colon_form() {
        let mac: MacAddress = "AA:BB:CC:DD:EE:FF".parse().unwrap();
        assert_eq!(mac.as_bytes(), &[0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]);
        assert_eq!(mac.to_string(), "AA:BB:CC:DD:EE:FF");
    }

    #[test]
    fn parse_dash_and_bare_forms() {
        let dashed: MacAddress = "58-11-22-bd-08-df".parse().unwrap();
        let bare: MacAddress = "581122BD08DF".parse().unwrap();
        assert_eq!(dashed, bare);
        assert_eq!(bare.to_string(), "58:11:22:BD:08:DF");
    }

    #[test]
    fn rejects_malformed() {
        for input in ["", "AA:BB:CC:DD:EE", "AA:BB:CC:DD:EE:GG", "AAA:BB:CC:DD:EE:F", "hello"] {
            assert!(
                matches!(input.parse::<MacAddress>(), Err(IdError::InvalidMac(_))),
                "accepted {input:?}"
            );
        }
    }

    #[test]
    fn mac_serde_json() {
        let mac = MacAddress::from_bytes([1, 2, 3, 4, 5, 6]);
        let json = serde_json::to_string(&mac).unwrap();
        assert_eq!(json, "\"01:02:03:04:05:06\"");
        let parsed: MacAddress = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, mac);
    }
}
