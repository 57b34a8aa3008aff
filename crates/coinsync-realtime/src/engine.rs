//! Sync engine driver: wires bootstrap, live query, derivation, write-back,
//! and the view model into one event loop.
//!
//! All pipeline work happens on a single task. It waits for identity
//! bootstrap to settle before opening the live query, then processes
//! snapshots one at a time, in delivery order, each to completion before
//! the next. Teardown unsubscribes both subscriptions exactly once and
//! seals the view model, so late transport events have nowhere to land.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use coinsync_core::error::AppError;
use coinsync_core::result::AppResult;
use coinsync_core::subscription::Subscription;
use coinsync_core::traits::SnapshotEvent;
use coinsync_core::types::{Identity, RawSnapshot};

use crate::bootstrap::{BootstrapOutcome, IdentityBootstrapper};
use crate::context::SyncContext;
use crate::deriver::AggregateDeriver;
use crate::metrics::{MetricsSnapshot, SyncMetrics};
use crate::publisher::WriteBackPublisher;
use crate::translator::SnapshotTranslator;
use crate::view::{ViewEvent, ViewModel, ViewSnapshot};

/// Entry point for starting the sync pipeline.
#[derive(Debug)]
pub struct SyncEngine;

impl SyncEngine {
    /// Spawn the engine task for `ctx`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(ctx: SyncContext) -> SyncHandle {
        let view = Arc::new(ViewModel::new());
        let metrics = Arc::new(SyncMetrics::new());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(run(
            ctx,
            Arc::clone(&view),
            Arc::clone(&metrics),
            shutdown_rx,
        ));

        SyncHandle {
            view,
            metrics,
            shutdown_tx,
            task,
        }
    }
}

/// Owner of a running engine.
///
/// Dropping the handle also tears the engine down.
#[derive(Debug)]
pub struct SyncHandle {
    view: Arc<ViewModel>,
    metrics: Arc<SyncMetrics>,
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SyncHandle {
    /// Observe view changes.
    pub fn view(&self) -> watch::Receiver<ViewSnapshot> {
        self.view.subscribe()
    }

    /// Current rendering.
    pub fn current(&self) -> ViewSnapshot {
        self.view.current()
    }

    /// Pipeline counters.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Tear the engine down and wait for it to finish.
    pub async fn shutdown(self) -> AppResult<()> {
        info!("Shutting down sync engine");
        let _ = self.shutdown_tx.send(true);
        self.task
            .await
            .map_err(|e| AppError::internal(format!("sync engine task failed: {e}")))?;
        info!("Sync engine shut down");
        Ok(())
    }
}

/// Per-run pipeline state once bootstrap succeeded.
struct Pipeline {
    identity: Identity,
    translator: SnapshotTranslator,
    deriver: AggregateDeriver,
    publisher: WriteBackPublisher,
    view: Arc<ViewModel>,
    metrics: Arc<SyncMetrics>,
}

impl Pipeline {
    /// Translate, derive, render, publish.
    fn process(&mut self, snapshot: &RawSnapshot) {
        let translation = self.translator.translate(snapshot);
        self.metrics
            .record_snapshot(translation.records.len(), translation.malformed);

        let aggregate = self.deriver.derive(&translation.records);
        debug!(
            records = translation.records.len(),
            malformed = translation.malformed,
            dropped = translation.dropped,
            total_coins = aggregate.total_coins,
            "Snapshot processed"
        );

        self.view.apply(ViewEvent::Snapshot(aggregate.clone()));
        self.publisher
            .publish(&self.identity, &translation.records, &aggregate);
    }

    /// Follow auth-state changes after bootstrap.
    fn on_auth_state(&mut self, state: Option<Identity>) {
        match state {
            Some(identity) if !identity.same_as(&self.identity) => {
                info!(
                    previous = %self.identity.id,
                    current = %identity.id,
                    "Session identity changed, write-backs follow the new identity"
                );
                self.identity = identity;
            }
            Some(_) => {}
            None => debug!("Auth state reports no identity, keeping bootstrapped identity"),
        }
    }
}

async fn run(
    ctx: SyncContext,
    view: Arc<ViewModel>,
    metrics: Arc<SyncMetrics>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut auth_events = ctx.identity.observe_auth_state();

    let bootstrapper = IdentityBootstrapper::new(&ctx);
    let outcome = tokio::select! {
        biased;
        _ = wait_for_shutdown(&mut shutdown) => {
            auth_events.unsubscribe();
            view.seal();
            return;
        }
        outcome = bootstrapper.bootstrap() => outcome,
    };

    let identity = match outcome {
        BootstrapOutcome::Ready(identity) => {
            view.apply(ViewEvent::AuthSucceeded);
            identity
        }
        BootstrapOutcome::Failed(e) => {
            error!(error = %e, "Identity bootstrap failed, sync halted");
            view.apply(ViewEvent::AuthFailed);
            auth_events.unsubscribe();
            wait_for_shutdown(&mut shutdown).await;
            view.seal();
            return;
        }
    };

    let translator = SnapshotTranslator::new(&ctx);
    let (publisher, writer) = WriteBackPublisher::spawn(&ctx, Arc::clone(&metrics));
    let mut pipeline = Pipeline {
        identity,
        translator,
        deriver: AggregateDeriver::new(&ctx),
        publisher,
        view: Arc::clone(&view),
        metrics,
    };

    let mut snapshots = match pipeline.translator.subscribe(&ctx).await {
        Ok(sub) => Some(sub),
        Err(e) => {
            error!(error = %e, "Live query could not be opened");
            view.apply(ViewEvent::StreamFailed);
            None
        }
    };
    let mut auth_open = true;

    loop {
        tokio::select! {
            biased;
            _ = wait_for_shutdown(&mut shutdown) => break,
            state = auth_events.next(), if auth_open => match state {
                Some(state) => pipeline.on_auth_state(state),
                None => auth_open = false,
            },
            event = next_snapshot(&mut snapshots) => match event {
                Some(SnapshotEvent::Next(snapshot)) => pipeline.process(&snapshot),
                Some(SnapshotEvent::Error(e)) => {
                    error!(error = %e, "Live query failed");
                    close_stream(&mut snapshots, &view);
                }
                None => {
                    error!("Live query ended unexpectedly");
                    close_stream(&mut snapshots, &view);
                }
            },
        }
    }

    if let Some(mut sub) = snapshots.take() {
        sub.unsubscribe();
    }
    auth_events.unsubscribe();
    view.seal();

    drop(pipeline);
    let drain = ctx.config.write_back_drain();
    if tokio::time::timeout(drain, writer).await.is_err() {
        warn!(drain = ?drain, "Write-back still in flight at shutdown, abandoned");
    }
}

/// Unsubscribe from a failed live query and surface the failure. No retry.
fn close_stream(snapshots: &mut Option<Subscription<SnapshotEvent>>, view: &ViewModel) {
    if let Some(mut sub) = snapshots.take() {
        sub.unsubscribe();
    }
    view.apply(ViewEvent::StreamFailed);
}

async fn next_snapshot(
    snapshots: &mut Option<Subscription<SnapshotEvent>>,
) -> Option<SnapshotEvent> {
    match snapshots {
        Some(sub) => sub.next().await,
        None => std::future::pending().await,
    }
}

/// Resolves once shutdown is requested or the handle is gone.
async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    while !*shutdown.borrow_and_update() {
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}
