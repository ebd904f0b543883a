// ── snmp2-backed session ──
//
// SNMP client built on `snmp2::AsyncSession`. A walk is a GETNEXT loop
// bounded by subtree membership, strictly increasing OIDs, and a row cap;
// every request carries its own timeout since the agent may never answer.
//
// Credentials with a user open a USM session (SHA auth, AES-128 privacy,
// the secret used as both passphrases) when the `snmpv3` feature is on.
// Without it they degrade to v2c with the secret as community.

use std::future::Future;

use secrecy::ExposeSecret;
use snmp2::{AsyncSession, Oid, Value};
use tokio::time::timeout;
use tracing::{debug, trace};
#[cfg(not(feature = "snmpv3"))]
use tracing::warn;

use crate::error::Error;
use crate::oid::ObjectId;
use crate::session::{Credentials, SessionFactory, SnmpSession};
use crate::transport::TransportConfig;
use crate::value::{SnmpValue, VarBind};

/// Opens [`Snmp2Session`]s with a shared [`TransportConfig`].
#[derive(Debug, Clone, Default)]
pub struct Snmp2Factory {
    transport: TransportConfig,
}

impl Snmp2Factory {
    pub fn new(transport: TransportConfig) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &TransportConfig {
        &self.transport
    }

    async fn bounded<T>(&self, fut: impl Future<Output = T>) -> Result<T, Error> {
        timeout(self.transport.timeout, fut)
            .await
            .map_err(|_| Error::Timeout {
                timeout_secs: self.transport.timeout.as_secs(),
            })
    }

    async fn open_v2c(&self, agent: &str, credentials: &Credentials) -> Result<AsyncSession, Error> {
        let community = credentials.community.expose_secret().as_bytes();
        let session = self.bounded(AsyncSession::new_v2c(agent, community, 0)).await??;
        debug!(agent, "opened SNMPv2c session");
        Ok(session)
    }

    #[cfg(feature = "snmpv3")]
    async fn open_v3(
        &self,
        agent: &str,
        user: &str,
        credentials: &Credentials,
    ) -> Result<AsyncSession, Error> {
        use snmp2::v3::{Auth, AuthProtocol, Cipher, Security};

        let secret = credentials.community.expose_secret().as_bytes();
        let security = Security::new(user.as_bytes(), secret)
            .with_auth_protocol(AuthProtocol::Sha1)
            .with_auth(Auth::AuthPriv {
                cipher: Cipher::Aes128,
                privacy_password: secret.to_vec(),
            });
        let mut session = self.bounded(AsyncSession::new_v3(agent, 0, security)).await??;
        // Engine discovery; the agent must answer before any GETNEXT.
        self.bounded(session.init())
            .await?
            .map_err(|e| Error::Protocol(format!("SNMPv3 engine discovery: {e}")))?;
        debug!(agent, user, "opened SNMPv3 session");
        Ok(session)
    }

    #[cfg(not(feature = "snmpv3"))]
    async fn open_v3(
        &self,
        agent: &str,
        user: &str,
        credentials: &Credentials,
    ) -> Result<AsyncSession, Error> {
        warn!(
            agent,
            user, "built without SNMPv3 support, trying v2c with the configured secret"
        );
        self.open_v2c(agent, credentials).await
    }
}

impl SessionFactory for Snmp2Factory {
    type Session = Snmp2Session;

    async fn open(&self, address: &str, credentials: &Credentials) -> Result<Snmp2Session, Error> {
        let agent = self.transport.agent_addr(address);
        let inner = match credentials.user.as_deref() {
            Some(user) => self.open_v3(&agent, user, credentials).await?,
            None => self.open_v2c(&agent, credentials).await?,
        };
        Ok(Snmp2Session {
            inner,
            transport: self.transport.clone(),
        })
    }
}

/// A live SNMP session against one agent.
pub struct Snmp2Session {
    inner: AsyncSession,
    transport: TransportConfig,
}

enum Step {
    End,
    Row(ObjectId, SnmpValue),
}

impl Snmp2Session {
    async fn getnext(&mut self, cursor: &ObjectId) -> Result<Step, Error> {
        let request = to_snmp_oid(cursor)?;
        let timeout_secs = self.transport.timeout.as_secs();

        let mut pdu = match timeout(self.transport.timeout, self.inner.getnext(&request)).await {
            Ok(Ok(pdu)) => pdu,
            Ok(Err(e)) => return Err(Error::Protocol(format!("{e:?}"))),
            Err(_) => return Err(Error::Timeout { timeout_secs }),
        };

        let Some((oid, value)) = pdu.varbinds.next() else {
            return Ok(Step::End);
        };
        let Some(value) = convert_value(&value) else {
            return Ok(Step::End);
        };
        Ok(Step::Row(from_snmp_oid(&oid)?, value))
    }
}

impl SnmpSession for Snmp2Session {
    async fn walk(&mut self, root: &ObjectId) -> Result<Vec<VarBind>, Error> {
        let mut rows = Vec::new();
        let mut cursor = root.clone();

        loop {
            let (oid, value) = match self.getnext(&cursor).await? {
                Step::End => break,
                Step::Row(oid, value) => (oid, value),
            };
            match advance(root, &cursor, oid, rows.len(), self.transport.max_rows)? {
                Some(next) => {
                    trace!(oid = %next, "walk row");
                    rows.push(VarBind::new(next.clone(), value));
                    cursor = next;
                }
                None => break,
            }
        }

        debug!(root = %root, rows = rows.len(), "walk complete");
        Ok(rows)
    }
}

/// Decide whether a GETNEXT answer continues the walk.
///
/// `Ok(None)` ends the walk (the agent stepped outside the subtree).
pub(crate) fn advance(
    root: &ObjectId,
    previous: &ObjectId,
    next: ObjectId,
    rows: usize,
    limit: usize,
) -> Result<Option<ObjectId>, Error> {
    if !next.starts_with(root) || next == *root {
        return Ok(None);
    }
    if next <= *previous {
        return Err(Error::NonIncreasing {
            previous: previous.to_string(),
            next: next.to_string(),
        });
    }
    if rows >= limit {
        return Err(Error::TooManyRows {
            root: root.to_string(),
            limit,
        });
    }
    Ok(Some(next))
}

fn to_snmp_oid(oid: &ObjectId) -> Result<Oid<'static>, Error> {
    Oid::from(oid.arcs()).map_err(|e| Error::InvalidOid(format!("{oid}: {e:?}")))
}

fn from_snmp_oid(oid: &Oid<'_>) -> Result<ObjectId, Error> {
    let arcs = oid
        .iter()
        .ok_or_else(|| Error::InvalidOid(format!("{oid:?}")))?
        .collect::<Vec<u64>>();
    Ok(ObjectId::new(arcs))
}

/// `None` marks the end-of-view exceptions that terminate a walk.
fn convert_value(value: &Value<'_>) -> Option<SnmpValue> {
    match value {
        Value::Integer(i) => Some(SnmpValue::Integer(*i)),
        Value::OctetString(bytes) => Some(SnmpValue::OctetString(bytes.to_vec())),
        Value::Counter32(v) | Value::Unsigned32(v) | Value::Timeticks(v) => {
            Some(SnmpValue::Unsigned(u64::from(*v)))
        }
        Value::Counter64(v) => Some(SnmpValue::Unsigned(*v)),
        Value::EndOfMibView | Value::NoSuchObject | Value::NoSuchInstance => None,
        _ => Some(SnmpValue::Other),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::oid::IF_NAME;

    fn root() -> ObjectId {
        ObjectId::from(IF_NAME)
    }

    #[test]
    fn advance_accepts_rows_inside_subtree() {
        let next = root().child(&[1]);
        let got = advance(&root(), &root(), next.clone(), 0, 10).unwrap();
        assert_eq!(got, Some(next));
    }

    #[test]
    fn advance_stops_outside_subtree() {
        let prev = root().child(&[48]);
        let outside: ObjectId = "1.3.6.1.2.1.31.1.1.1.2.1".parse().unwrap();
        assert_eq!(advance(&root(), &prev, outside, 48, 100).unwrap(), None);
    }

    #[test]
    fn advance_rejects_looping_agents() {
        let prev = root().child(&[5]);
        let err = advance(&root(), &prev, root().child(&[3]), 5, 100).unwrap_err();
        assert!(matches!(err, Error::NonIncreasing { .. }));
    }

    #[test]
    fn advance_enforces_row_cap() {
        let prev = root().child(&[5]);
        let err = advance(&root(), &prev, root().child(&[6]), 5, 5).unwrap_err();
        assert!(matches!(err, Error::TooManyRows { limit: 5, .. }));
    }

    #[cfg(not(feature = "snmpv3"))]
    #[tokio::test]
    async fn v3_credentials_fall_back_to_v2c_without_crypto() {
        let factory = Snmp2Factory::default();
        let creds = Credentials::new("authpass", Some("admin".into()));
        // UDP connect sends nothing, so opening succeeds without an agent.
        let session = factory.open("127.0.0.1", &creds).await;
        assert!(session.is_ok());
    }

    #[cfg(feature = "snmpv3")]
    #[tokio::test(start_paused = true)]
    async fn v3_engine_discovery_is_bounded_by_the_request_timeout() {
        // Bind a socket that never answers so discovery has to time out.
        let silent = tokio::net::UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = silent.local_addr().unwrap().to_string();
        let factory = Snmp2Factory::default();
        let creds = Credentials::new("authpass12345", Some("admin".into()));
        let err = factory.open(&addr, &creds).await.err().unwrap();
        assert!(matches!(err, Error::Timeout { timeout_secs: 5 }));
    }
}
