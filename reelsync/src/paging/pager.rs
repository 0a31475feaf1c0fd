// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Stream assembler
//!
//! A [`PagingStream`] is the consumer's view of one partition: a lazily growing list of
//! movies read from the local paged store, kept current through the store's change
//! notifications, and extended by raising load boundaries on the [`PagingMediator`].
//!
//! Each stream is driven by its own task. Handles talk to it over a command channel and
//! observe it through a watch channel of [`PagingSnapshot`]s. Mediator operations are
//! spawned separately so that dropping every handle never cancels a fetch that is about
//! to commit.
//!
//! A driver runs one load at a time. An explicit refresh or load-more that arrives while a
//! load is running is queued and started when it finishes; scroll hints are dropped.

use super::mediator::{LoadType, MediatorOutcome, PagingMediator};
use crate::config::PagingConfig;
use crate::error::{PagingError, PagingResult};
use crate::model::{Movie, PartitionKey};
use crate::storage::LocalPagedStore;
use log::{debug, error};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

/// Progress of one load direction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    NotLoading { end_reached: bool },
    Loading,
    Error(PagingError),
}

impl LoadState {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }

    pub fn is_end_reached(&self) -> bool {
        matches!(self, LoadState::NotLoading { end_reached: true })
    }

    pub fn error(&self) -> Option<&PagingError> {
        match self {
            LoadState::Error(e) => Some(e),
            _ => None,
        }
    }
}

impl Default for LoadState {
    fn default() -> Self {
        LoadState::NotLoading { end_reached: false }
    }
}

/// What the consumer currently sees
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PagingSnapshot {
    pub items: Vec<Movie>,
    pub refresh: LoadState,
    pub append: LoadState,
    /// Highest ticket returned by [`PagingStream::refresh`] whose refresh has finished,
    /// successfully or not
    pub refreshed: u64,
}

impl PagingSnapshot {
    /// Prepending is never supported
    pub fn prepend(&self) -> LoadState {
        LoadState::NotLoading { end_reached: true }
    }

    /// No load is running in either direction
    pub fn is_idle(&self) -> bool {
        !self.refresh.is_loading() && !self.append.is_loading()
    }

    /// The refresh behind `ticket` has finished and nothing else is loading
    pub fn is_refreshed(&self, ticket: u64) -> bool {
        self.refreshed >= ticket && self.is_idle()
    }
}

#[derive(Debug)]
enum PagerCommand {
    Access(usize),
    LoadMore,
    Retry,
    Refresh(u64),
}

/// Handle to a running partition stream; clones share the same driver
#[derive(Clone)]
pub struct PagingStream {
    partition: PartitionKey,
    snapshots: watch::Receiver<PagingSnapshot>,
    commands: mpsc::UnboundedSender<PagerCommand>,
    tickets: Arc<AtomicU64>,
}

impl PagingStream {
    /// Start driving `partition`. Must be called inside a tokio runtime.
    pub fn spawn(
        partition: PartitionKey,
        store: Arc<dyn LocalPagedStore>,
        mediator: PagingMediator,
        config: PagingConfig,
    ) -> Self {
        let (snapshot_tx, snapshots) = watch::channel(PagingSnapshot {
            refresh: LoadState::Loading,
            ..PagingSnapshot::default()
        });
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (results_tx, results_rx) = mpsc::unbounded_channel();
        let generation = store.subscribe(&partition);

        let driver = PagerDriver {
            partition: partition.clone(),
            store,
            mediator,
            target: config.initial_load_size,
            config,
            snapshot_tx,
            results_tx,
            loaded: 0,
            refresh: LoadState::Loading,
            append: LoadState::default(),
            refreshed: 0,
            failed: None,
            pending_refresh: None,
            pending_append: false,
        };
        tokio::spawn(driver.run(command_rx, results_rx, generation));

        Self {
            partition,
            snapshots,
            commands,
            tickets: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn partition(&self) -> &PartitionKey {
        &self.partition
    }

    pub fn snapshot(&self) -> PagingSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Wait for the next snapshot. Returns false once the driver has stopped.
    pub async fn changed(&mut self) -> bool {
        self.snapshots.changed().await.is_ok()
    }

    /// Wait until a snapshot satisfies `predicate`
    pub async fn wait_for<F>(&mut self, mut predicate: F) -> Option<PagingSnapshot>
    where
        F: FnMut(&PagingSnapshot) -> bool,
    {
        self.snapshots
            .wait_for(|snapshot| predicate(snapshot))
            .await
            .ok()
            .map(|snapshot| snapshot.clone())
    }

    /// Wait until neither direction is loading
    pub async fn settled(&mut self) -> Option<PagingSnapshot> {
        self.wait_for(PagingSnapshot::is_idle).await
    }

    /// The consumer looked at row `index`; loads more when close to the end
    pub fn access(&self, index: usize) {
        self.send(PagerCommand::Access(index));
    }

    /// Show the next page, fetching it when needed. Queued if a load is running.
    pub fn load_more(&self) {
        self.send(PagerCommand::LoadMore);
    }

    /// Re-run the last failed load
    pub fn retry(&self) {
        self.send(PagerCommand::Retry);
    }

    /// Refetch page 1 regardless of freshness. The returned ticket shows up in
    /// [`PagingSnapshot::refreshed`] once this refresh has finished.
    pub fn refresh(&self) -> u64 {
        let ticket = self.tickets.fetch_add(1, Ordering::Relaxed) + 1;
        self.send(PagerCommand::Refresh(ticket));
        ticket
    }

    fn send(&self, command: PagerCommand) {
        if self.commands.send(command).is_err() {
            debug!("Stream for {} already stopped", self.partition);
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Load {
    load_type: LoadType,
    forced: bool,
    /// Refresh ticket this load answers; 0 when nobody waits on it
    ticket: u64,
}

struct LoadResult {
    load: Load,
    result: PagingResult<MediatorOutcome>,
}

struct PagerDriver {
    partition: PartitionKey,
    store: Arc<dyn LocalPagedStore>,
    mediator: PagingMediator,
    config: PagingConfig,
    snapshot_tx: watch::Sender<PagingSnapshot>,
    results_tx: mpsc::UnboundedSender<LoadResult>,
    /// Rows the consumer is allowed to see
    target: usize,
    /// Rows currently exposed
    loaded: usize,
    refresh: LoadState,
    append: LoadState,
    refreshed: u64,
    /// Last failed load, re-run by retry
    failed: Option<Load>,
    /// Explicit refresh received while busy
    pending_refresh: Option<u64>,
    /// Explicit load-more received while busy
    pending_append: bool,
}

impl PagerDriver {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<PagerCommand>,
        mut results: mpsc::UnboundedReceiver<LoadResult>,
        mut generation: watch::Receiver<u64>,
    ) {
        debug!("Stream for {} started", self.partition);
        generation.borrow_and_update();
        self.reload().await;
        self.launch(Load {
            load_type: LoadType::Refresh,
            forced: false,
            ticket: 0,
        });

        let mut store_alive = true;
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command).await,
                    None => break,
                },
                Some(result) = results.recv() => self.handle_result(result).await,
                changed = generation.changed(), if store_alive => {
                    if changed.is_ok() {
                        self.reload().await;
                    } else {
                        store_alive = false;
                    }
                }
            }
        }
        debug!("Stream for {} stopped", self.partition);
    }

    fn is_busy(&self) -> bool {
        self.refresh.is_loading() || self.append.is_loading()
    }

    fn launch(&mut self, load: Load) {
        match load.load_type {
            LoadType::Refresh => {
                self.refresh = LoadState::Loading;
                self.append = LoadState::default();
            }
            LoadType::Append => self.append = LoadState::Loading,
            LoadType::Prepend => return,
        }
        self.failed = None;
        self.publish_state();

        let mediator = self.mediator.clone();
        let partition = self.partition.clone();
        let results = self.results_tx.clone();
        tokio::spawn(async move {
            let result = loop {
                let result = if load.forced {
                    mediator.force_refresh(&partition).await
                } else {
                    mediator.load(&partition, load.load_type).await
                };
                if !matches!(result, Ok(MediatorOutcome::Coalesced)) || results.is_closed() {
                    break result;
                }
                // Another operation owned the partition; run again once it is done so
                // this load reports on rows that include its own work
                mediator.wait_idle(&partition).await;
            };
            // Nobody to tell once the stream is gone; the commit already happened
            let _ = results.send(LoadResult { load, result });
        });
    }

    fn start_refresh(&mut self, ticket: u64) {
        self.target = self.config.initial_load_size;
        self.launch(Load {
            load_type: LoadType::Refresh,
            forced: true,
            ticket,
        });
    }

    async fn handle_command(&mut self, command: PagerCommand) {
        match command {
            PagerCommand::Access(index) => {
                if index + self.config.prefetch_distance >= self.loaded {
                    self.extend(false).await;
                }
            }
            PagerCommand::LoadMore => self.extend(true).await,
            PagerCommand::Retry => {
                if let Some(load) = self.failed {
                    if !self.is_busy() {
                        self.launch(load);
                    }
                }
            }
            PagerCommand::Refresh(ticket) => {
                if self.is_busy() {
                    self.pending_refresh = Some(ticket);
                } else {
                    self.start_refresh(ticket);
                }
            }
        }
    }

    /// Grow the visible window, fetching the next remote page when the store runs out
    async fn extend(&mut self, explicit: bool) {
        if self.is_busy() {
            if explicit {
                self.pending_append = true;
            }
            return;
        }
        if self.loaded >= self.target {
            self.target = self.loaded + self.config.page_size;
            self.reload().await;
        }
        if self.loaded >= self.target {
            return;
        }
        match &self.append {
            LoadState::NotLoading { end_reached: true } => {}
            LoadState::Error(_) if !explicit => {}
            _ => self.launch(Load {
                load_type: LoadType::Append,
                forced: false,
                ticket: 0,
            }),
        }
    }

    async fn handle_result(&mut self, finished: LoadResult) {
        let load = finished.load;
        match (load.load_type, finished.result) {
            (LoadType::Refresh, Ok(outcome)) => {
                self.refresh = LoadState::NotLoading { end_reached: false };
                if outcome.end_reached() {
                    self.append = LoadState::NotLoading { end_reached: true };
                }
            }
            (LoadType::Append, Ok(MediatorOutcome::Coalesced)) => {
                self.append = LoadState::default();
            }
            (LoadType::Append, Ok(outcome)) => {
                self.append = LoadState::NotLoading {
                    end_reached: outcome.end_reached(),
                };
            }
            (load_type, Err(e)) => {
                debug!("{} for {} failed: {}", load_type, self.partition, e);
                match load_type {
                    LoadType::Refresh => self.refresh = LoadState::Error(e),
                    _ => self.append = LoadState::Error(e),
                }
                self.failed = Some(load);
            }
            (LoadType::Prepend, Ok(_)) => {}
        }
        self.refreshed = self.refreshed.max(load.ticket);
        // A skipped load commits nothing, so re-read to pick up rows that arrived while
        // this driver was not subscribed
        self.reload().await;
        self.run_pending().await;
    }

    async fn run_pending(&mut self) {
        if self.is_busy() {
            return;
        }
        if let Some(ticket) = self.pending_refresh.take() {
            self.start_refresh(ticket);
        } else if std::mem::take(&mut self.pending_append) {
            self.extend(true).await;
        }
    }

    async fn reload(&mut self) {
        match self.store.read_page(&self.partition, self.target, None).await {
            Ok(rows) => {
                self.loaded = rows.len();
                let items: Vec<Movie> = rows.into_iter().map(|row| row.movie).collect();
                self.snapshot_tx.send_modify(|snapshot| snapshot.items = items);
                self.publish_state();
            }
            Err(e) => {
                error!("Failed to read {} from the local store: {}", self.partition, e);
                self.refresh = LoadState::Error(e);
                self.failed = Some(Load {
                    load_type: LoadType::Refresh,
                    forced: false,
                    ticket: 0,
                });
                self.publish_state();
            }
        }
    }

    fn publish_state(&self) {
        let refresh = self.refresh.clone();
        let append = self.append.clone();
        let refreshed = self.refreshed;
        self.snapshot_tx.send_if_modified(|snapshot| {
            if snapshot.refresh == refresh
                && snapshot.append == append
                && snapshot.refreshed == refreshed
            {
                return false;
            }
            snapshot.refresh = refresh;
            snapshot.append = append;
            snapshot.refreshed = refreshed;
            true
        });
    }
}
