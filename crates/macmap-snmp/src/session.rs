// ── Session abstraction ──
//
// The interrogation engine talks to switches only through these traits, so
// the concrete SNMP stack (or a scripted test double) is swappable.

use std::future::Future;

use secrecy::SecretString;

use crate::error::Error;
use crate::oid::ObjectId;
use crate::value::VarBind;

/// Community string used when a switch has no configured secret.
pub const DEFAULT_COMMUNITY: &str = "public";

/// SNMP credentials for one switch.
///
/// A present `user` selects SNMPv3 (with `community` acting as both the
/// auth and privacy passphrase); otherwise `community` is a v2c community
/// string.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub community: SecretString,
    pub user: Option<String>,
}

impl Credentials {
    pub fn new(community: impl Into<String>, user: Option<String>) -> Self {
        Self {
            community: SecretString::from(community.into()),
            user,
        }
    }

    pub fn is_v3(&self) -> bool {
        self.user.is_some()
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Self::new(DEFAULT_COMMUNITY, None)
    }
}

/// An open SNMP session against one agent.
pub trait SnmpSession: Send {
    /// Walk the subtree rooted at `root`, returning rows in agent order.
    fn walk(&mut self, root: &ObjectId) -> impl Future<Output = Result<Vec<VarBind>, Error>> + Send;
}

/// Opens sessions. Shared across all concurrent interrogation tasks.
pub trait SessionFactory: Send + Sync + 'static {
    type Session: SnmpSession + 'static;

    fn open(
        &self,
        address: &str,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<Self::Session, Error>> + Send;
}
