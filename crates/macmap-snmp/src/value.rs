// ── Varbind values ──
//
// Owned, transport-independent view of the SNMP value types the bridge and
// interface tables actually carry.

use crate::oid::ObjectId;

/// A decoded SNMP value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnmpValue {
    Integer(i64),
    /// Counter32, Gauge32/Unsigned32, TimeTicks, Counter64.
    Unsigned(u64),
    OctetString(Vec<u8>),
    /// Anything the bridge tables never legitimately return.
    Other,
}

impl SnmpValue {
    /// Numeric view for index-valued columns. Negative integers are rejected.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Integer(i) => u64::try_from(*i).ok(),
            Self::Unsigned(u) => Some(*u),
            Self::OctetString(_) | Self::Other => None,
        }
    }

    /// Display-string view (lossy UTF-8, surrounding whitespace and NULs trimmed).
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::OctetString(bytes) => Some(
                String::from_utf8_lossy(bytes)
                    .trim_matches(|c: char| c.is_whitespace() || c == '\0')
                    .to_owned(),
            ),
            _ => None,
        }
    }
}

/// One `(instance OID, value)` pair from a walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarBind {
    pub oid: ObjectId,
    pub value: SnmpValue,
}

impl VarBind {
    pub fn new(oid: ObjectId, value: SnmpValue) -> Self {
        Self { oid, value }
    }
}
