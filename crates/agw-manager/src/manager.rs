//! The rollout watcher and snapshot publisher.
//!
//! [`ConfigManager::new`] resolves the active config id, translates it,
//! and publishes the first snapshot; translation errors there surface to
//! the caller. With the managed strategy, [`ConfigManager::start`] spawns
//! a polling task that re-resolves the rollout every tick and swaps the
//! published snapshot when the active id changes. All later failures are
//! logged and retried; the data plane keeps the last good snapshot.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use agw_cache::{Cache, SnapshotCache};
use agw_core::{ConfigError, ConfigResult, NodeHash};
use agw_translator::{translate_with_jwks, JwksFetcher, TranslatorConfig};

use crate::sources::{DescriptorSource, RolloutSource, RolloutsDocument};

/// How the active config id is chosen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RolloutStrategy {
    /// Use the config id from the launch flags; never poll.
    #[default]
    Fixed,
    /// Poll the rollout stream and follow the active config id.
    Managed,
}

impl FromStr for RolloutStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fixed" => Ok(Self::Fixed),
            "managed" => Ok(Self::Managed),
            other => Err(ConfigError::validation(format!(
                "rollout_strategy must be fixed or managed, got: {other}"
            ))),
        }
    }
}

impl fmt::Display for RolloutStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed => write!(f, "fixed"),
            Self::Managed => write!(f, "managed"),
        }
    }
}

/// Manager configuration.
#[derive(Clone, Debug)]
pub struct ManagerConfig {
    /// The managed service name.
    pub service_name: String,
    /// Node id the snapshot is published under.
    pub node_id: String,
    /// Rollout strategy.
    pub rollout_strategy: RolloutStrategy,
    /// Polling interval for the managed strategy.
    pub check_rollout_interval: Duration,
    /// Translator inputs; `service_config_id` is replaced per translation
    /// with the active config id.
    pub translator: TranslatorConfig,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            service_name: String::new(),
            node_id: "api_proxy".to_string(),
            rollout_strategy: RolloutStrategy::Fixed,
            check_rollout_interval: Duration::from_secs(60),
            translator: TranslatorConfig::default(),
        }
    }
}

#[derive(Debug, Default)]
struct ManagerState {
    rollout_id: String,
    config_id: String,
}

/// The config manager: owns the published snapshot for one node.
pub struct ConfigManager {
    config: ManagerConfig,
    cache: Arc<SnapshotCache>,
    descriptors: Arc<dyn DescriptorSource>,
    rollouts: Arc<dyn RolloutSource>,
    jwks: Arc<dyn JwksFetcher>,
    state: Mutex<ManagerState>,
    shutdown_tx: watch::Sender<bool>,
}

impl std::fmt::Debug for ConfigManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigManager").finish_non_exhaustive()
    }
}

impl ConfigManager {
    /// Build a manager and publish the initial snapshot.
    ///
    /// # Errors
    ///
    /// The initial resolve/fetch/translate surfaces every failure,
    /// including validation errors, to the caller.
    pub async fn new(
        config: ManagerConfig,
        cache: Arc<SnapshotCache>,
        descriptors: Arc<dyn DescriptorSource>,
        rollouts: Arc<dyn RolloutSource>,
        jwks: Arc<dyn JwksFetcher>,
    ) -> ConfigResult<Arc<Self>> {
        let (shutdown_tx, _) = watch::channel(false);
        let manager = Arc::new(Self {
            config,
            cache,
            descriptors,
            rollouts,
            jwks,
            state: Mutex::new(ManagerState::default()),
            shutdown_tx,
        });

        match manager.config.rollout_strategy {
            RolloutStrategy::Fixed => {
                let config_id = manager.config.translator.service_config_id.clone();
                if config_id.is_empty() {
                    return Err(ConfigError::validation(
                        "service_config_id is required with the fixed rollout strategy",
                    ));
                }
                manager.apply_config(&config_id).await?;
            }
            RolloutStrategy::Managed => {
                let doc = manager
                    .rollouts
                    .fetch_rollouts(&manager.config.service_name)
                    .await?;
                let (rollout_id, config_id) = active_ids(&doc)?;
                manager.apply_config(&config_id).await?;
                manager.state.lock().rollout_id = rollout_id;
            }
        }

        Ok(manager)
    }

    /// Spawn the polling task. A no-op handle is returned for the fixed
    /// strategy.
    pub fn start(self: &Arc<Self>) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            if manager.config.rollout_strategy != RolloutStrategy::Managed {
                return;
            }

            let mut ticker = tokio::time::interval(manager.config.check_rollout_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first tick fires immediately; the initial snapshot is
            // already published.
            ticker.tick().await;

            info!(
                interval = ?manager.config.check_rollout_interval,
                "rollout polling started"
            );
            loop {
                tokio::select! {
                    _ = ticker.tick() => manager.check_rollout().await,
                    _ = shutdown_rx.changed() => {
                        info!("rollout polling stopped");
                        return;
                    }
                }
            }
        })
    }

    /// Stop the polling task within one tick.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// The rollout id the published snapshot was derived from.
    pub fn current_rollout_id(&self) -> String {
        self.state.lock().rollout_id.clone()
    }

    /// The config id of the published snapshot.
    pub fn current_config_id(&self) -> String {
        self.state.lock().config_id.clone()
    }

    async fn check_rollout(&self) {
        let doc = match self.rollouts.fetch_rollouts(&self.config.service_name).await {
            Ok(doc) => doc,
            Err(err) => {
                warn!(error = %err, "rollout fetch failed, keeping current snapshot");
                return;
            }
        };
        let (rollout_id, config_id) = match active_ids(&doc) {
            Ok(ids) => ids,
            Err(err) => {
                warn!(error = %err, "rollout document unusable, keeping current snapshot");
                return;
            }
        };

        if rollout_id == self.current_rollout_id() {
            return;
        }

        info!(
            rollout = %rollout_id,
            config_id = %config_id,
            "rollout changed, re-translating"
        );
        if let Err(err) = self.apply_config(&config_id).await {
            warn!(error = %err, "re-translation failed, keeping current snapshot");
            return;
        }
        self.state.lock().rollout_id = rollout_id;
    }

    async fn apply_config(&self, config_id: &str) -> ConfigResult<()> {
        let descriptor = self
            .descriptors
            .fetch_descriptor(&self.config.service_name, config_id)
            .await?;

        let mut translator_config = self.config.translator.clone();
        translator_config.service_config_id = config_id.to_string();

        let snapshot =
            translate_with_jwks(descriptor, &translator_config, self.jwks.as_ref()).await?;

        self.cache
            .set_snapshot(NodeHash::from_id(&self.config.node_id), snapshot);
        self.state.lock().config_id = config_id.to_string();
        info!(version = %config_id, node = %self.config.node_id, "snapshot published");
        Ok(())
    }
}

fn active_ids(doc: &RolloutsDocument) -> ConfigResult<(String, String)> {
    let rollout = doc
        .newest()
        .ok_or_else(|| ConfigError::validation("rollout document lists no rollouts"))?;
    let config_id = rollout
        .active_config_id()
        .ok_or_else(|| ConfigError::validation("rollout assigns no traffic percentages"))?;
    Ok((rollout.rollout_id.clone(), config_id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{Rollout, TrafficPercentStrategy};

    #[test]
    fn rollout_strategy_parses() {
        assert_eq!(
            "fixed".parse::<RolloutStrategy>().unwrap(),
            RolloutStrategy::Fixed
        );
        assert_eq!(
            "managed".parse::<RolloutStrategy>().unwrap(),
            RolloutStrategy::Managed
        );
        assert!("canary".parse::<RolloutStrategy>().is_err());
    }

    #[test]
    fn active_ids_requires_percentages() {
        let doc = RolloutsDocument {
            rollouts: vec![Rollout {
                rollout_id: "r".to_string(),
                traffic_percent_strategy: TrafficPercentStrategy::default(),
                ..Rollout::default()
            }],
        };
        assert!(active_ids(&doc).is_err());
        assert!(active_ids(&RolloutsDocument::default()).is_err());
    }
}
