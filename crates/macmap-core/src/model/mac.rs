// ── MacAddress ──
//
// Six raw octets, always rendered in canonical lowercase colon form. Used as
// the primary key of every topology map.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid MAC address '{input}'")]
pub struct ParseMacError {
    pub input: String,
}

/// MAC address, displayed as `aa:bb:cc:dd:ee:ff`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    pub const fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    pub const fn octets(&self) -> [u8; 6] {
        self.0
    }

    /// Build from the trailing six arcs of a forwarding-table instance OID.
    ///
    /// Returns `None` if fewer than six arcs are present or any arc is not
    /// a valid octet.
    pub fn from_oid_suffix(arcs: &[u64]) -> Option<Self> {
        let start = arcs.len().checked_sub(6)?;
        let mut octets = [0u8; 6];
        for (slot, arc) in octets.iter_mut().zip(&arcs[start..]) {
            *slot = u8::try_from(*arc).ok()?;
        }
        Some(Self(octets))
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl FromStr for MacAddress {
    type Err = ParseMacError;

    /// Accepts colon-, dash-, or dot-separated input as well as bare hex,
    /// in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseMacError { input: s.to_owned() };
        let hex: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ':' | '-' | '.'))
            .collect();
        if hex.len() != 12 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(err());
        }

        let mut octets = [0u8; 6];
        for (i, slot) in octets.iter_mut().enumerate() {
            *slot = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).map_err(|_| err())?;
        }
        Ok(Self(octets))
    }
}

impl TryFrom<String> for MacAddress {
    type Error = ParseMacError;

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
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn displays_lowercase_colon_form() {
        let mac = MacAddress::new([0xaa, 0xBB, 0x0c, 0xdd, 0xee, 0x01]);
        assert_eq!(mac.to_string(), "aa:bb:0c:dd:ee:01");
    }

    #[test]
    fn parses_common_notations() {
        let want = MacAddress::new([0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0x01]);
        for input in [
            "aa:bb:cc:dd:ee:01",
            "AA-BB-CC-DD-EE-01",
            "aabb.ccdd.ee01",
            "AABBCCDDEE01",
        ] {
            assert_eq!(input.parse::<MacAddress>().unwrap(), want, "{input}");
        }
    }

    #[test]
    fn rejects_wrong_length_and_non_hex() {
        assert!("aa:bb:cc:dd:ee".parse::<MacAddress>().is_err());
        assert!("zz:bb:cc:dd:ee:01".parse::<MacAddress>().is_err());
        assert!("+a:bb:cc:dd:ee:01".parse::<MacAddress>().is_err());
        assert!("aa:bb:cc:dd:ee:+1".parse::<MacAddress>().is_err());
        assert!("aa:bb:cc:dd:ee:01:02".parse::<MacAddress>().is_err());
    }

    #[test]
    fn from_oid_suffix_uses_last_six_arcs() {
        // fdb id 1, then the MAC octets
        let arcs = [1, 170, 187, 204, 221, 238, 1];
        let mac = MacAddress::from_oid_suffix(&arcs).unwrap();
        assert_eq!(mac.to_string(), "aa:bb:cc:dd:ee:01");

        assert!(MacAddress::from_oid_suffix(&[1, 2, 3]).is_none());
        assert!(MacAddress::from_oid_suffix(&[1, 256, 0, 0, 0, 0, 0]).is_none());
    }

    #[test]
    fn serde_round_trips_as_string() {
        let mac: MacAddress = "aa:bb:cc:dd:ee:01".parse().unwrap();
        let json = serde_json::to_string(&mac).unwrap();
        assert_eq!(json, "\"aa:bb:cc:dd:ee:01\"");
        assert_eq!(serde_json::from_str::<MacAddress>(&json).unwrap(), mac);
    }
}
