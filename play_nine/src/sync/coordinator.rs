use log::{debug, info, warn};
use std::{future::Future, sync::Arc, time::Duration};
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};

use crate::{session::SessionRegistry, table::TableManager};

/// How often the sweeps run (10 seconds)
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorConfig {
    pub sweep_interval: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

/// Owns the two periodic liveness sweeps.
///
/// The stale sweep drops sockets that stopped sending heartbeats and
/// rebroadcasts the affected tables so everyone sees the presence change.
/// The inactivity sweep removes players who have been gone too long,
/// through their table's actor like any other mutation.
#[derive(Clone)]
pub struct Coordinator {
    registry: Arc<SessionRegistry>,
    tables: Arc<TableManager>,
    config: CoordinatorConfig,
}

impl Coordinator {
    pub fn new(tables: Arc<TableManager>, config: CoordinatorConfig) -> Self {
        Self {
            registry: tables.registry().clone(),
            tables,
            config,
        }
    }

    /// Run one stale-connection sweep as of `now`. Returns how many tables were affected.
    pub async fn sweep_stale_connections_at(&self, now: std::time::Instant) -> usize {
        let affected = self.registry.sweep_stale_connections_at(now).await;
        for name in &affected {
            if let Err(e) = self.tables.rebroadcast(name).await {
                warn!("Table '{name}': rebroadcast after stale sweep failed: {e}");
            }
        }
        affected.len()
    }

    pub async fn sweep_stale_connections(&self) -> usize {
        self.sweep_stale_connections_at(std::time::Instant::now()).await
    }

    /// Run one inactivity sweep as of `now`. Returns how many players were removed.
    pub async fn sweep_inactive_players_at(&self, now: std::time::Instant) -> usize {
        let mut removed = 0;
        for (name, player_id) in self.registry.sweep_inactive_players_at(now).await {
            match self.tables.force_leave(&name, player_id.clone()).await {
                Ok(true) => {
                    info!("Table '{name}': forced {player_id} out after inactivity");
                    removed += 1;
                }
                Ok(false) => debug!("Table '{name}': {player_id} already gone"),
                Err(e) => {
                    // Keep the timer so the next sweep tries again.
                    warn!("Table '{name}': forced leave of {player_id} failed: {e}");
                    continue;
                }
            }
            self.registry.clear_inactive(&name, &player_id).await;
        }
        removed
    }

    pub async fn sweep_inactive_players(&self) -> usize {
        self.sweep_inactive_players_at(std::time::Instant::now()).await
    }

    /// Spawn both sweep loops.
    pub fn start(self) -> CoordinatorHandle {
        let (shutdown, _) = watch::channel(false);
        let period = self.config.sweep_interval;

        let stale = {
            let this = self.clone();
            spawn_periodic(period, shutdown.subscribe(), move || {
                let this = this.clone();
                async move {
                    this.sweep_stale_connections().await;
                }
            })
        };
        let inactive = spawn_periodic(period, shutdown.subscribe(), move || {
            let this = self.clone();
            async move {
                this.sweep_inactive_players().await;
            }
        });

        info!("Sweeps running every {period:?}");
        CoordinatorHandle {
            shutdown,
            tasks: vec![stale, inactive],
        }
    }
}

fn spawn_periodic<F, Fut>(period: Duration, mut shutdown: watch::Receiver<bool>, mut tick: F) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = ticker.tick() => tick().await,
                _ = shutdown.changed() => break,
            }
        }
    })
}

/// Stops the sweeps when asked.
pub struct CoordinatorHandle {
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl CoordinatorHandle {
    /// Signal both loops and wait for them to exit
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        for task in self.tasks {
            if let Err(e) = task.await {
                warn!("Sweep task ended abnormally: {e}");
            }
        }
        info!("Sweeps stopped");
    }
}
