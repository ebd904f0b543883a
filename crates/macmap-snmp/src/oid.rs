// ── Object identifiers ──
//
// Owned dotted OIDs plus the standard table roots the bridge interrogation
// walks. Instance suffixes (MAC octets, bridge ports, ifIndex) are read back
// with `suffix()` / `last_arc()`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// dot1qTpFdbPort: Q-Bridge MAC-to-bridge-port table, indexed by `<fdb>.<mac octets>`.
pub const DOT1Q_TP_FDB_PORT: &[u64] = &[1, 3, 6, 1, 2, 1, 17, 7, 1, 2, 2, 1, 2];

/// dot1dTpFdbPort: plain Bridge-MIB MAC-to-bridge-port table, indexed by `<mac octets>`.
pub const DOT1D_TP_FDB_PORT: &[u64] = &[1, 3, 6, 1, 2, 1, 17, 4, 3, 1, 2];

/// dot1dBasePortIfIndex: bridge port to ifIndex.
pub const DOT1D_BASE_PORT_IF_INDEX: &[u64] = &[1, 3, 6, 1, 2, 1, 17, 1, 4, 1, 2];

/// ifName (IF-MIB ifXTable).
pub const IF_NAME: &[u64] = &[1, 3, 6, 1, 2, 1, 31, 1, 1, 1, 1];

/// ifDescr (IF-MIB ifTable). Usually useless, but present everywhere.
pub const IF_DESCR: &[u64] = &[1, 3, 6, 1, 2, 1, 2, 2, 1, 2];

/// An owned object identifier, e.g. `1.3.6.1.2.1.31.1.1.1.1.7`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectId(Vec<u64>);

impl ObjectId {
    pub fn new(arcs: impl Into<Vec<u64>>) -> Self {
        Self(arcs.into())
    }

    pub fn arcs(&self) -> &[u64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether this OID lies inside (or equals) the subtree rooted at `root`.
    pub fn starts_with(&self, root: &ObjectId) -> bool {
        self.0.starts_with(&root.0)
    }

    /// Arcs after `root`, or `None` when this OID is outside the subtree.
    pub fn suffix(&self, root: &ObjectId) -> Option<&[u64]> {
        self.0.strip_prefix(root.0.as_slice())
    }

    pub fn last_arc(&self) -> Option<u64> {
        self.0.last().copied()
    }

    /// Append arcs, producing a child OID.
    pub fn child(&self, arcs: &[u64]) -> Self {
        let mut out = self.0.clone();
        out.extend_from_slice(arcs);
        Self(out)
    }
}

impl From<&[u64]> for ObjectId {
    fn from(arcs: &[u64]) -> Self {
        Self(arcs.to_vec())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for arc in &self.0 {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{arc}")?;
            first = false;
        }
        Ok(())
    }
}

impl FromStr for ObjectId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches('.');
        if trimmed.is_empty() {
            return Err(Error::InvalidOid(s.to_owned()));
        }
        trimmed
            .split('.')
            .map(|arc| arc.parse::<u64>().map_err(|_| Error::InvalidOid(s.to_owned())))
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

impl TryFrom<String> for ObjectId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ObjectId> for String {
    fn from(oid: ObjectId) -> Self {
        oid.to_string()
    }
}
