// ── Scan orchestration ──
//
// Turns configuration into a worklist of switches, interrogates them under
// bounded concurrency, merges each result into the cache as it lands, and
// hands the caller one completion event per switch in completion order.

use std::collections::BTreeSet;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};

use futures_core::Stream;
use indexmap::IndexMap;
use macmap_snmp::{Credentials, SessionFactory};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::config::ScanConfig;
use crate::error::CoreError;
use crate::interrogate::interrogate;
use crate::matcher::PortNameMatcher;
use crate::model::{SwitchCompletion, SwitchReport, SwitchTarget};
use crate::source::{
    ATTR_SWITCH, ATTR_SWITCH_PASSWORD, ATTR_SWITCH_USER, ATTR_SWITCHPORT, ConfigSource,
};
use crate::store::{PortMap, TopologyCache, TopologyWarning};

// ── ScanStream ───────────────────────────────────────────────────

/// Lazy, finite sequence of per-switch completions from one rebuild.
///
/// Nothing is contacted until the stream is first polled. Dropping it
/// aborts every switch still in flight.
pub struct ScanStream {
    switches: usize,
    inner: Pin<Box<dyn Stream<Item = SwitchCompletion> + Send>>,
}

impl ScanStream {
    /// Number of switches this scan will report on.
    pub fn switches(&self) -> usize {
        self.switches
    }
}

impl Stream for ScanStream {
    type Item = SwitchCompletion;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl std::fmt::Debug for ScanStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanStream")
            .field("switches", &self.switches)
            .finish_non_exhaustive()
    }
}

// ── Scanner ──────────────────────────────────────────────────────

/// Drives rebuilds of a [`TopologyCache`] over sessions from `F`.
///
/// Cheaply cloneable; clones share the cache, the factory, and the
/// cancellation generation.
pub struct Scanner<F: SessionFactory> {
    factory: Arc<F>,
    cache: Arc<TopologyCache>,
    config: ScanConfig,
    matcher: Arc<PortNameMatcher>,
    /// Token shared by every scan started since the last `cancel()`.
    generation: Arc<Mutex<CancellationToken>>,
}

impl<F: SessionFactory> Clone for Scanner<F> {
    fn clone(&self) -> Self {
        Self {
            factory: Arc::clone(&self.factory),
            cache: Arc::clone(&self.cache),
            config: self.config.clone(),
            matcher: Arc::clone(&self.matcher),
            generation: Arc::clone(&self.generation),
        }
    }
}

impl<F: SessionFactory> Scanner<F> {
    pub fn new(factory: F, cache: Arc<TopologyCache>, config: ScanConfig) -> Self {
        Self {
            factory: Arc::new(factory),
            cache,
            config,
            matcher: Arc::new(PortNameMatcher::default()),
            generation: Arc::new(Mutex::new(CancellationToken::new())),
        }
    }

    /// Replace the port-name matcher (e.g. with extra vendor rules).
    #[must_use]
    pub fn with_matcher(mut self, matcher: PortNameMatcher) -> Self {
        self.matcher = Arc::new(matcher);
        self
    }

    pub fn cache(&self) -> &Arc<TopologyCache> {
        &self.cache
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Start a full rebuild from `source`.
    ///
    /// Fails only if the caller is tenant-scoped or configuration cannot be
    /// read; both happen before any switch is contacted. Per-switch
    /// failures are logged and show up as completions with zero MACs.
    pub fn rebuild(&self, source: &dyn ConfigSource) -> Result<ScanStream, CoreError> {
        authorize(source)?;

        self.cache.clear();

        let (ports, switches) = switch_port_map(source)?;
        self.cache.set_switch_ports(ports);
        let targets = switch_targets(source, switches)?;

        info!(switches = targets.len(), "starting topology rebuild");
        Ok(self.dispatch(targets))
    }

    /// Interrogate one switch without touching the cache.
    ///
    /// Subject to the same tenant gate as [`Scanner::rebuild`]. Declared
    /// ports from the last rebuild (if any) are used to resolve nodes.
    pub async fn interrogate_switch(
        &self,
        source: &dyn ConfigSource,
        target: &SwitchTarget,
    ) -> Result<SwitchReport, CoreError> {
        authorize(source)?;
        let token = self.scan_token();
        self.guarded(target, &token)
            .instrument(info_span!("interrogate", switch = %target.address))
            .await
    }

    /// Abort every scan in flight. Later rebuilds are unaffected.
    pub fn cancel(&self) {
        let mut current = self.generation.lock().unwrap_or_else(PoisonError::into_inner);
        current.cancel();
        *current = CancellationToken::new();
    }

    // ── Private helpers ──────────────────────────────────────────

    fn scan_token(&self) -> CancellationToken {
        self.generation
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn dispatch(&self, targets: Vec<SwitchTarget>) -> ScanStream {
        let switches = targets.len();
        let scanner = self.clone();
        let token = self.scan_token();
        let permits = Arc::new(Semaphore::new(self.config.effective_concurrency()));

        let inner = async_stream::stream! {
            let mut tasks = JoinSet::new();
            for target in targets {
                let scanner = scanner.clone();
                let permits = Arc::clone(&permits);
                let token = token.clone();
                let span = info_span!("interrogate", switch = %target.address);
                tasks.spawn(
                    async move {
                        let macs = match permits.acquire_owned().await {
                            Ok(_permit) => scanner.scan_one(&target, &token).await,
                            Err(_) => 0,
                        };
                        SwitchCompletion {
                            switch: target.address,
                            macs,
                        }
                    }
                    .instrument(span),
                );
            }

            let mut merged = 0usize;
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok(completion) => {
                        merged += completion.macs;
                        yield completion;
                    }
                    Err(e) => warn!(error = %e, "switch task did not complete"),
                }
            }

            scanner.cache.mark_rebuilt();
            info!(
                switches,
                observations = merged,
                macs = scanner.cache.mac_count(),
                "topology rebuild finished"
            );
        };

        ScanStream {
            switches,
            inner: Box::pin(inner),
        }
    }

    /// One switch inside a rebuild: interrogate, merge, count.
    async fn scan_one(&self, target: &SwitchTarget, token: &CancellationToken) -> usize {
        match self.guarded(target, token).await {
            Ok(report) => {
                self.cache.merge(&report);
                debug!(macs = report.mac_count(), "switch merged");
                report.mac_count()
            }
            Err(e) => {
                warn!(error = %e, "switch interrogation failed");
                0
            }
        }
    }

    /// Interrogation under the per-switch deadline and the cancel token.
    async fn guarded(
        &self,
        target: &SwitchTarget,
        token: &CancellationToken,
    ) -> Result<SwitchReport, CoreError> {
        let deadline = self.config.switch_timeout;
        tokio::select! {
            () = token.cancelled() => Err(CoreError::Cancelled {
                switch: target.address.clone(),
            }),
            result = tokio::time::timeout(deadline, self.interrogate_target(target)) => {
                result.unwrap_or_else(|_| Err(CoreError::Timeout {
                    switch: target.address.clone(),
                    timeout_secs: deadline.as_secs(),
                }))
            }
        }
    }

    async fn interrogate_target(&self, target: &SwitchTarget) -> Result<SwitchReport, CoreError> {
        let mut session = self
            .factory
            .open(&target.address, &target.credentials)
            .await
            .map_err(|e| CoreError::switch(&target.address, e))?;
        let ports = self.cache.switch_ports(&target.address);
        interrogate(&mut session, &target.address, &ports, &self.matcher).await
    }
}

// ── Configuration → worklist ─────────────────────────────────────

/// Network topology is only visible outside of any tenant scope.
fn authorize(source: &dyn ConfigSource) -> Result<(), CoreError> {
    match source.tenant() {
        Some(tenant) => Err(CoreError::Forbidden {
            message: format!("network topology is not available to tenant '{tenant}'"),
        }),
        None => Ok(()),
    }
}

/// Declared port bindings per switch, plus every switch any node names
/// (with or without a port).
fn switch_port_map(
    source: &dyn ConfigSource,
) -> Result<(IndexMap<String, PortMap>, BTreeSet<String>), CoreError> {
    let nodes = source.list_nodes()?;
    let mut attrs = source.node_attributes(&nodes, &[ATTR_SWITCH, ATTR_SWITCHPORT], false)?;

    let mut ports: IndexMap<String, PortMap> = IndexMap::new();
    let mut switches = BTreeSet::new();
    for node in nodes {
        let Some(mut cfg) = attrs.remove(&node) else {
            continue;
        };
        let Some(switch) = cfg.remove(ATTR_SWITCH) else {
            continue;
        };
        switches.insert(switch.clone());
        let Some(label) = cfg.remove(ATTR_SWITCHPORT) else {
            continue;
        };

        let declared = ports.entry(switch.clone()).or_default();
        if let Some(previous) = declared.insert(label.clone(), node.clone()) {
            TopologyWarning::DuplicatePort {
                switch,
                label,
                previous,
                current: node,
            }
            .log();
        }
    }
    Ok((ports, switches))
}

/// Credentials for every switch. No password means community `public`
/// with no user; a user is only honored alongside a password.
fn switch_targets(
    source: &dyn ConfigSource,
    switches: BTreeSet<String>,
) -> Result<Vec<SwitchTarget>, CoreError> {
    let switches: Vec<String> = switches.into_iter().collect();
    let mut secrets =
        source.node_attributes(&switches, &[ATTR_SWITCH_USER, ATTR_SWITCH_PASSWORD], true)?;

    Ok(switches
        .into_iter()
        .map(|switch| {
            let credentials = secrets
                .remove(&switch)
                .and_then(|mut cfg| {
                    let password = cfg.remove(ATTR_SWITCH_PASSWORD)?;
                    Some(Credentials::new(password, cfg.remove(ATTR_SWITCH_USER)))
                })
                .unwrap_or_default();
            SwitchTarget::new(switch, credentials)
        })
        .collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use macmap_snmp::MemoryFactory;
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;
    use crate::source::MemoryConfigSource;

    #[test]
    fn duplicate_labels_keep_the_last_declaration() {
        let source = MemoryConfigSource::new()
            .with_node("n1", "sw1", "3")
            .with_node("n2", "sw1", "3")
            .with_node("n3", "sw2", "Gi1/0/1");
        let (ports, switches) = switch_port_map(&source).unwrap();

        assert_eq!(ports["sw1"].get("3").map(String::as_str), Some("n2"));
        assert_eq!(switches.into_iter().collect::<Vec<_>>(), vec!["sw1", "sw2"]);
    }

    #[test]
    fn switch_without_port_is_still_scanned() {
        let source = MemoryConfigSource::new().with_node_attribute("n1", ATTR_SWITCH, "sw1");
        let (ports, switches) = switch_port_map(&source).unwrap();
        assert!(ports.is_empty());
        assert!(switches.contains("sw1"));
    }

    #[test]
    fn credentials_default_to_public_and_need_a_password() {
        let source = MemoryConfigSource::new()
            .with_switch_credentials("sw2", Some("admin"), "authpass");
        let mut orphan_user = source.clone();
        orphan_user.set("sw3", ATTR_SWITCH_USER, "ignored");

        let targets = switch_targets(
            &orphan_user,
            ["sw1", "sw2", "sw3"].iter().map(|s| (*s).to_owned()).collect(),
        )
        .unwrap();

        let got: Vec<(&str, &str, Option<&str>)> = targets
            .iter()
            .map(|t| {
                (
                    t.address.as_str(),
                    t.credentials.community.expose_secret(),
                    t.credentials.user.as_deref(),
                )
            })
            .collect();
        assert_eq!(
            got,
            vec![
                ("sw1", "public", None),
                ("sw2", "authpass", Some("admin")),
                ("sw3", "public", None),
            ]
        );
    }

    #[test]
    fn tenant_scoped_rebuild_is_forbidden() {
        let factory = MemoryFactory::default();
        let scanner = Scanner::new(factory, Arc::default(), ScanConfig::default());
        let source = MemoryConfigSource::new()
            .with_tenant("acme")
            .with_node("n1", "sw1", "3");

        let err = scanner.rebuild(&source).unwrap_err();
        assert!(matches!(err, CoreError::Forbidden { .. }));
        assert_eq!(scanner.factory().sessions_opened(), 0);
    }
}
