//! Peer socket watchdog.
//!
//! The daemon only exists to serve its peers. The watchdog probes every
//! configured peer socket once per round and counts consecutive failures
//! per path. A success resets that path's count to zero. Once every path
//! has failed at least `threshold` rounds in a row, [`Watchdog::run`]
//! returns and the daemon shuts down.
//!
//! The failure counts live inside the [`Watchdog`] value, which is moved
//! into a single task, so nothing else can observe or mutate them.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use connector_common::config::ConnectorConfig;

use crate::probe::LivenessProbe;

/// Outcome of one probing round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundSummary {
    /// Paths whose failure count reached the threshold.
    pub dead: usize,
    /// Number of monitored paths.
    pub total: usize,
}

impl RoundSummary {
    /// Returns `true` when every monitored peer is dead.
    #[must_use]
    pub const fn all_dead(&self) -> bool {
        self.total > 0 && self.dead >= self.total
    }
}

/// Periodic liveness checker for a fixed set of peer sockets.
#[derive(Debug)]
pub struct Watchdog<P> {
    probe: P,
    paths: Vec<PathBuf>,
    failures: HashMap<PathBuf, u32>,
    threshold: u32,
    interval: Duration,
}

impl<P: LivenessProbe> Watchdog<P> {
    /// Creates a watchdog over `paths`.
    ///
    /// Repeated paths are watched once. Returns `None` when `paths` is
    /// empty: with no peers there is nothing to watch and the daemon must
    /// never shut itself down.
    #[must_use]
    pub fn new(
        mut paths: Vec<PathBuf>,
        probe: P,
        threshold: u32,
        interval: Duration,
    ) -> Option<Self> {
        let mut failures = HashMap::new();
        paths.retain(|p| failures.insert(p.clone(), 0).is_none());
        if paths.is_empty() {
            return None;
        }
        Some(Self {
            probe,
            paths,
            failures,
            threshold,
            interval,
        })
    }

    /// Creates a watchdog from the daemon configuration.
    #[must_use]
    pub fn from_config(config: &ConnectorConfig, probe: P) -> Option<Self> {
        Self::new(
            config.watchdog_sockets.clone(),
            probe,
            config.watchdog_threshold,
            config.watchdog_interval(),
        )
    }

    /// Number of monitored peer sockets.
    #[must_use]
    pub fn peer_count(&self) -> usize {
        self.paths.len()
    }

    /// Current consecutive-failure count for `path`.
    #[must_use]
    pub fn failures(&self, path: &Path) -> u32 {
        self.failures.get(path).copied().unwrap_or(0)
    }

    /// Probes every path once and updates the failure counts.
    pub async fn round(&mut self) -> RoundSummary {
        let mut dead = 0;
        for path in &self.paths {
            let count = self.failures.entry(path.clone()).or_insert(0);
            match self.probe.probe(path).await {
                Ok(()) => *count = 0,
                Err(e) => {
                    *count = count.saturating_add(1);
                    tracing::warn!(
                        path = %path.display(),
                        failures = *count,
                        error = %e,
                        "peer socket is not alive"
                    );
                }
            }
            if *count >= self.threshold {
                dead += 1;
            }
        }
        RoundSummary {
            dead,
            total: self.paths.len(),
        }
    }

    /// Runs rounds until every peer is dead, sleeping `interval` between
    /// rounds.
    pub async fn run(mut self) -> RoundSummary {
        loop {
            let summary = self.round().await;
            if summary.all_dead() {
                tracing::warn!(
                    dead = summary.dead,
                    threshold = self.threshold,
                    "every peer socket is dead"
                );
                return summary;
            }
            tokio::time::sleep(self.interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::future::Future;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::probe::ProbeError;

    const INTERVAL: Duration = Duration::from_secs(10);

    /// Treats a fixed set of paths as alive.
    struct StaticProbe {
        alive: HashSet<PathBuf>,
    }

    impl LivenessProbe for StaticProbe {
        fn probe(&self, path: &Path) -> impl Future<Output = Result<(), ProbeError>> + Send {
            let result = if self.alive.contains(path) {
                Ok(())
            } else {
                Err(ProbeError::NotSocket {
                    path: path.to_path_buf(),
                })
            };
            std::future::ready(result)
        }
    }

    /// Succeeds on every `period`-th probe.
    struct FlakyProbe {
        calls: AtomicUsize,
        period: usize,
    }

    impl LivenessProbe for FlakyProbe {
        fn probe(&self, path: &Path) -> impl Future<Output = Result<(), ProbeError>> + Send {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            let result = if call % self.period == 0 {
                Ok(())
            } else {
                Err(ProbeError::NotSocket {
                    path: path.to_path_buf(),
                })
            };
            std::future::ready(result)
        }
    }

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    fn static_watchdog(watched: &[&str], alive: &[&str]) -> Watchdog<StaticProbe> {
        let probe = StaticProbe {
            alive: paths(alive).into_iter().collect(),
        };
        Watchdog::new(paths(watched), probe, 6, INTERVAL).expect("non-empty")
    }

    #[test]
    fn empty_path_list_disables_watchdog() {
        let probe = StaticProbe {
            alive: HashSet::new(),
        };
        assert!(Watchdog::new(Vec::new(), probe, 6, INTERVAL).is_none());
    }

    #[test]
    fn from_config_uses_configured_sockets() {
        let config = ConnectorConfig {
            watchdog_sockets: paths(&["/run/a.sock"]),
            ..ConnectorConfig::default()
        };
        let watchdog = Watchdog::from_config(&config, StaticProbe {
            alive: HashSet::new(),
        })
        .expect("configured");
        assert_eq!(watchdog.peer_count(), 1);
        assert!(Watchdog::from_config(&ConnectorConfig::default(), StaticProbe {
            alive: HashSet::new(),
        })
        .is_none());
    }

    #[tokio::test]
    async fn repeated_path_needs_the_full_threshold() {
        let mut watchdog = static_watchdog(&["/run/a.sock", "/run/a.sock"], &[]);
        assert_eq!(watchdog.peer_count(), 1);
        for _ in 0..5 {
            assert!(!watchdog.round().await.all_dead());
        }
        assert_eq!(watchdog.failures(Path::new("/run/a.sock")), 5);
        assert!(watchdog.round().await.all_dead());
    }

    #[tokio::test]
    async fn failures_accumulate_and_reset() {
        let mut watchdog = static_watchdog(&["/run/a.sock"], &[]);
        for _ in 0..3 {
            let _ = watchdog.round().await;
        }
        assert_eq!(watchdog.failures(Path::new("/run/a.sock")), 3);

        let _ = watchdog.probe.alive.insert(PathBuf::from("/run/a.sock"));
        let summary = watchdog.round().await;
        assert_eq!(watchdog.failures(Path::new("/run/a.sock")), 0);
        assert_eq!(summary, RoundSummary { dead: 0, total: 1 });
    }

    #[tokio::test]
    async fn path_is_dead_only_at_threshold() {
        let mut watchdog = static_watchdog(&["/run/a.sock"], &[]);
        for _ in 0..5 {
            assert!(!watchdog.round().await.all_dead());
        }
        assert!(watchdog.round().await.all_dead());
    }

    #[tokio::test]
    async fn one_live_peer_keeps_daemon_running() {
        let mut watchdog = static_watchdog(&["/run/a.sock", "/run/b.sock"], &["/run/a.sock"]);
        for _ in 0..20 {
            let summary = watchdog.round().await;
            assert_eq!(summary.total, 2);
            assert!(!summary.all_dead());
        }
        assert_eq!(watchdog.failures(Path::new("/run/b.sock")), 20);
    }

    #[tokio::test(start_paused = true)]
    async fn all_dead_peers_stop_after_six_rounds() {
        let watchdog = static_watchdog(&["/run/a.sock", "/run/b.sock"], &[]);
        let start = tokio::time::Instant::now();

        let summary = watchdog.run().await;

        assert_eq!(summary, RoundSummary { dead: 2, total: 2 });
        assert_eq!(start.elapsed(), INTERVAL * 5);
    }

    #[tokio::test(start_paused = true)]
    async fn live_peer_never_stops_watchdog() {
        let watchdog = static_watchdog(&["/run/a.sock"], &["/run/a.sock"]);
        let result = tokio::time::timeout(Duration::from_secs(24 * 3600), watchdog.run()).await;
        assert!(result.is_err(), "watchdog must keep running");
    }

    #[tokio::test(start_paused = true)]
    async fn intermittent_success_prevents_shutdown() {
        let probe = FlakyProbe {
            calls: AtomicUsize::new(0),
            period: 6,
        };
        let watchdog = Watchdog::new(paths(&["/run/a.sock"]), probe, 6, INTERVAL).unwrap();
        let result = tokio::time::timeout(Duration::from_secs(3600), watchdog.run()).await;
        assert!(result.is_err(), "1-in-6 successes must keep the peer alive");
    }
}
