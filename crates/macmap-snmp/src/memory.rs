// ── In-memory agents ──
//
// A `SessionFactory` backed by per-address OID tables. Used to exercise the
// interrogation engine without a network, including unreachable and hung
// agents.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::Error;
use crate::oid::ObjectId;
use crate::session::{Credentials, SessionFactory, SnmpSession};
use crate::value::{SnmpValue, VarBind};

/// How a scripted agent misbehaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// Opening a session fails.
    Unreachable,
    /// Every walk times out.
    Timeout,
    /// Every walk never completes.
    Hang,
}

/// One simulated SNMP agent: a sorted OID table.
#[derive(Debug, Clone, Default)]
pub struct MemoryAgent {
    rows: BTreeMap<ObjectId, SnmpValue>,
    failure: Option<Failure>,
}

impl MemoryAgent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(failure: Failure) -> Self {
        Self {
            rows: BTreeMap::new(),
            failure: Some(failure),
        }
    }

    /// Set `root.<index>` to `value`.
    pub fn set(&mut self, root: &[u64], index: &[u64], value: SnmpValue) -> &mut Self {
        self.rows.insert(ObjectId::from(root).child(index), value);
        self
    }

    pub fn with(mut self, root: &[u64], index: &[u64], value: SnmpValue) -> Self {
        self.set(root, index, value);
        self
    }

    fn walk_rows(&self, root: &ObjectId) -> Vec<VarBind> {
        self.rows
            .range(root.clone()..)
            .skip_while(|(oid, _)| *oid == root)
            .take_while(|(oid, _)| oid.starts_with(root))
            .map(|(oid, value)| VarBind::new(oid.clone(), value.clone()))
            .collect()
    }
}

/// Factory over a fixed set of [`MemoryAgent`]s, keyed by address.
///
/// Counts opened sessions and walks so callers can assert that no agent
/// was contacted.
#[derive(Debug, Clone, Default)]
pub struct MemoryFactory {
    agents: Arc<HashMap<String, MemoryAgent>>,
    opened: Arc<AtomicUsize>,
    walks: Arc<AtomicUsize>,
}

impl MemoryFactory {
    pub fn new(agents: impl IntoIterator<Item = (String, MemoryAgent)>) -> Self {
        Self {
            agents: Arc::new(agents.into_iter().collect()),
            opened: Arc::new(AtomicUsize::new(0)),
            walks: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn sessions_opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn walks_issued(&self) -> usize {
        self.walks.load(Ordering::SeqCst)
    }
}

impl SessionFactory for MemoryFactory {
    type Session = MemorySession;

    async fn open(&self, address: &str, _credentials: &Credentials) -> Result<MemorySession, Error> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        let agent = self.agents.get(address).cloned().ok_or_else(|| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no agent at {address}"),
            ))
        })?;
        if agent.failure == Some(Failure::Unreachable) {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                format!("agent {address} unreachable"),
            )));
        }
        Ok(MemorySession {
            agent,
            walks: Arc::clone(&self.walks),
        })
    }
}

/// Session against a [`MemoryAgent`].
#[derive(Debug)]
pub struct MemorySession {
    agent: MemoryAgent,
    walks: Arc<AtomicUsize>,
}

impl SnmpSession for MemorySession {
    async fn walk(&mut self, root: &ObjectId) -> Result<Vec<VarBind>, Error> {
        self.walks.fetch_add(1, Ordering::SeqCst);
        match self.agent.failure {
            Some(Failure::Timeout) => Err(Error::Timeout { timeout_secs: 5 }),
            Some(Failure::Hang) => std::future::pending().await,
            _ => Ok(self.agent.walk_rows(root)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::oid::{IF_DESCR, IF_NAME};

    fn agent() -> MemoryAgent {
        MemoryAgent::new()
            .with(IF_NAME, &[2], SnmpValue::OctetString(b"Gi1/0/2".to_vec()))
            .with(IF_NAME, &[1], SnmpValue::OctetString(b"Gi1/0/1".to_vec()))
            .with(IF_DESCR, &[1], SnmpValue::OctetString(b"port 1".to_vec()))
    }

    #[tokio::test]
    async fn walk_returns_only_the_subtree_in_oid_order() {
        let factory = MemoryFactory::new([("sw1".to_owned(), agent())]);
        let mut session = factory.open("sw1", &Credentials::default()).await.unwrap();

        let rows = session.walk(&ObjectId::from(IF_NAME)).await.unwrap();
        let names: Vec<_> = rows.iter().map(|vb| vb.value.as_text().unwrap()).collect();
        assert_eq!(names, vec!["Gi1/0/1", "Gi1/0/2"]);
        assert_eq!(factory.walks_issued(), 1);
    }

    #[tokio::test]
    async fn unknown_and_unreachable_agents_fail_to_open() {
        let factory = MemoryFactory::new([(
            "down".to_owned(),
            MemoryAgent::failing(Failure::Unreachable),
        )]);
        assert!(factory.open("down", &Credentials::default()).await.is_err());
        assert!(factory.open("missing", &Credentials::default()).await.is_err());
        assert_eq!(factory.sessions_opened(), 2);
    }

    #[tokio::test]
    async fn timeout_agents_fail_every_walk() {
        let factory = MemoryFactory::new([(
            "slow".to_owned(),
            MemoryAgent::failing(Failure::Timeout),
        )]);
        let mut session = factory.open("slow", &Credentials::default()).await.unwrap();
        let err = session.walk(&ObjectId::from(IF_NAME)).await.unwrap_err();
        assert!(err.is_transient());
    }
}
