//! Priority request queue backed by the durable ledger.
//!
//! The in-memory queue is a performance mirror; the ledger is authoritative.
//! Every state change goes through one atomic ledger operation so a
//! concurrently draining background worker never loses an update.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use log::{debug, error, warn};
use tokio::task::JoinHandle;
use uuid::Uuid;

use sokoni_core::network::{
    batch_size, drain_delay, queue_timeout, ConnectionTier, NetworkMonitor,
};
use sokoni_core::sync::{
    derive_endpoint, EntityId, FailureOutcome, HttpMethod, NewSyncOperation, SyncEntity,
    SyncLedger, SyncPriority, FOREGROUND_MAX_RETRIES, QUEUE_SYNC_INTERVAL_SECS,
};

use crate::error::Result;
use crate::transport::{OutboundRequest, RequestTransport};

/// Foreground queue policy knobs.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Retry ceiling before a request is abandoned.
    pub max_retries: i32,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_retries: FOREGROUND_MAX_RETRIES,
        }
    }
}

/// In-memory mirror of one durable ledger record.
#[derive(Debug, Clone)]
pub struct QueuedRequest {
    pub id: String,
    pub url: String,
    pub method: HttpMethod,
    pub payload: Option<serde_json::Value>,
    pub priority: SyncPriority,
    pub timestamp_ms: i64,
    pub retry_count: i32,
    pub max_retries: i32,
    /// Id of the durable record this request mirrors.
    pub ledger_id: i32,
}

/// Enqueue acknowledgement.
#[derive(Debug, Clone, PartialEq)]
pub enum EnqueueAck {
    /// High-priority fast path: delivered inline, response body attached.
    Delivered(serde_json::Value),
    /// Accepted for later delivery; the caller must not assume delivery.
    Queued { ledger_id: i32 },
}

type AbandonmentHook = Box<dyn Fn(&QueuedRequest) + Send + Sync>;

pub struct RequestQueue {
    monitor: Arc<NetworkMonitor>,
    ledger: Arc<dyn SyncLedger>,
    transport: Arc<dyn RequestTransport>,
    config: QueueConfig,
    items: Mutex<Vec<QueuedRequest>>,
    draining: AtomicBool,
    on_abandoned: Option<AbandonmentHook>,
}

impl RequestQueue {
    pub fn new(
        monitor: Arc<NetworkMonitor>,
        ledger: Arc<dyn SyncLedger>,
        transport: Arc<dyn RequestTransport>,
        config: QueueConfig,
    ) -> Self {
        Self {
            monitor,
            ledger,
            transport,
            config,
            items: Mutex::new(Vec::new()),
            draining: AtomicBool::new(false),
            on_abandoned: None,
        }
    }

    /// Install a hook invoked when a request exhausts its retries. The
    /// caller already received a "queued" acknowledgement, so this is the
    /// only signal an action was dropped.
    pub fn with_abandonment_hook(
        mut self,
        hook: impl Fn(&QueuedRequest) + Send + Sync + 'static,
    ) -> Self {
        self.on_abandoned = Some(Box::new(hook));
        self
    }

    pub fn pending_len(&self) -> usize {
        self.lock_items().len()
    }

    /// Accept a mutation for delivery. The intent is mirrored into the
    /// ledger before this returns, so it survives a crash or reload.
    ///
    /// High-priority requests on a usable connection are sent inline and
    /// resolve with the network outcome; everything else acknowledges as
    /// queued immediately, kicking off a drain when online so the item is
    /// not left waiting for the interval timer.
    pub async fn enqueue(
        self: &Arc<Self>,
        url: &str,
        method: HttpMethod,
        payload: Option<serde_json::Value>,
        priority: SyncPriority,
    ) -> Result<EnqueueAck> {
        let ledger_id = self
            .ledger
            .add_operation(NewSyncOperation {
                operation: method.operation_kind(),
                entity_type: SyncEntity::from_path(url),
                entity_id: entity_id_from_path(url),
                data: payload.clone().unwrap_or(serde_json::Value::Null),
                priority,
            })
            .await?;

        let request = QueuedRequest {
            id: Uuid::new_v4().to_string(),
            url: url.to_string(),
            method,
            payload,
            priority,
            timestamp_ms: Utc::now().timestamp_millis(),
            retry_count: 0,
            max_retries: self.config.max_retries,
            ledger_id,
        };
        {
            let mut items = self.lock_items();
            items.push(request.clone());
            sort_items(&mut items);
        }
        debug!(
            "[RequestQueue] Enqueued {} {} (priority {}, ledger {})",
            method,
            url,
            i32::from(priority),
            ledger_id
        );

        let snapshot = self.monitor.snapshot();
        if priority == SyncPriority::High
            && snapshot.is_online
            && snapshot.tier != ConnectionTier::Slow2g
        {
            return self.send_inline(request).await;
        }
        if snapshot.is_online {
            Self::spawn_drain(self);
        }
        Ok(EnqueueAck::Queued { ledger_id })
    }

    /// Drain pending requests. Re-entrant-safe: a second call while a drain
    /// is running is a no-op, as is draining while offline or empty.
    ///
    /// Each cycle takes a tier-sized batch, sends it concurrently with a
    /// tier timeout, settles outcomes against the ledger, then waits a
    /// tier-scaled delay before the next cycle while items remain.
    pub async fn process_queue(&self) {
        if self.draining.swap(true, Ordering::SeqCst) {
            return;
        }
        loop {
            let snapshot = self.monitor.snapshot();
            if !snapshot.is_online {
                break;
            }
            let batch: Vec<QueuedRequest> = {
                let mut items = self.lock_items();
                sort_items(&mut items);
                items
                    .iter()
                    .take(batch_size(snapshot.tier))
                    .cloned()
                    .collect()
            };
            if batch.is_empty() {
                break;
            }

            let mut claimed = Vec::with_capacity(batch.len());
            for request in batch {
                match self.ledger.mark_processing(request.ledger_id).await {
                    Ok(true) => claimed.push(request),
                    // The background worker settled it first.
                    Ok(false) => self.remove_item(&request.id),
                    Err(err) => {
                        error!(
                            "[RequestQueue] Failed to claim ledger record {}: {}",
                            request.ledger_id, err
                        );
                    }
                }
            }

            let timeout = queue_timeout(snapshot.tier);
            let sends = claimed
                .iter()
                .map(|request| self.transport.send(to_outbound(request, timeout)));
            let results = futures::future::join_all(sends).await;
            for (request, result) in claimed.iter().zip(results) {
                match result {
                    Ok(_) => self.settle_success(request).await,
                    Err(err) => self.settle_failure(request, &err).await,
                }
            }

            if self.pending_len() > 0 && self.monitor.is_online() {
                tokio::time::sleep(drain_delay(snapshot.tier)).await;
                continue;
            }
            break;
        }
        self.draining.store(false, Ordering::SeqCst);
    }

    /// Rebuild the in-memory mirror from the ledger. Called on startup
    /// before accepting new work; returns how many records were restored.
    ///
    /// Records stranded in `processing` by a crash between claim and settle
    /// are re-adopted as pending first, and a drain starts immediately when
    /// the connection is up.
    pub async fn restore_from_ledger(self: &Arc<Self>) -> Result<usize> {
        let requeued = self.ledger.requeue_stale_processing().await?;
        if requeued > 0 {
            warn!(
                "[RequestQueue] Re-adopted {} operations stranded in processing",
                requeued
            );
        }
        let pending = self.ledger.pending_operations()?;
        let mut items = self.lock_items();
        items.clear();
        for op in &pending {
            let endpoint = derive_endpoint(op.operation, op.entity_type, &op.entity_id);
            items.push(QueuedRequest {
                id: format!("stored_{}", op.id),
                url: endpoint.path,
                method: endpoint.method,
                payload: if op.data.is_null() {
                    None
                } else {
                    Some(op.data.clone())
                },
                priority: op.priority,
                timestamp_ms: op.timestamp,
                retry_count: op.retry_count,
                max_retries: self.config.max_retries,
                ledger_id: op.id,
            });
        }
        sort_items(&mut items);
        let restored = items.len();
        drop(items);
        if restored > 0 && self.monitor.is_online() {
            Self::spawn_drain(self);
        }
        Ok(restored)
    }

    /// Kick off a drain without awaiting it.
    pub fn spawn_drain(queue: &Arc<RequestQueue>) {
        let queue = Arc::clone(queue);
        tokio::spawn(async move {
            queue.process_queue().await;
        });
    }

    /// Periodic re-drain covering the offline/slow-2g case where no enqueue
    /// call arrives to trigger one.
    pub fn spawn_background_interval(queue: Arc<RequestQueue>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(Duration::from_secs(QUEUE_SYNC_INTERVAL_SECS));
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let snapshot = queue.monitor.snapshot();
                if snapshot.is_online && snapshot.tier != ConnectionTier::Slow2g {
                    queue.process_queue().await;
                }
            }
        })
    }

    /// Drain whenever connectivity comes back.
    pub fn spawn_reconnect_drain(queue: Arc<RequestQueue>) -> JoinHandle<()> {
        let mut rx = queue.monitor.subscribe();
        tokio::spawn(async move {
            let mut was_online = rx.borrow().is_online;
            while rx.changed().await.is_ok() {
                let is_online = rx.borrow().is_online;
                if is_online && !was_online {
                    queue.process_queue().await;
                }
                was_online = is_online;
            }
        })
    }

    async fn send_inline(&self, request: QueuedRequest) -> Result<EnqueueAck> {
        if !self.ledger.mark_processing(request.ledger_id).await? {
            self.remove_item(&request.id);
            return Ok(EnqueueAck::Queued {
                ledger_id: request.ledger_id,
            });
        }
        let timeout = queue_timeout(self.monitor.tier());
        match self.transport.send(to_outbound(&request, timeout)).await {
            Ok(response) => {
                self.remove_item(&request.id);
                self.ledger.mark_completed(request.ledger_id).await?;
                Ok(EnqueueAck::Delivered(response.body))
            }
            Err(err) => {
                // The request stays queued for the drain loop unless this
                // failure exhausted its retries.
                self.settle_failure(&request, &err).await;
                Err(err.into())
            }
        }
    }

    async fn settle_success(&self, request: &QueuedRequest) {
        self.remove_item(&request.id);
        if let Err(err) = self.ledger.mark_completed(request.ledger_id).await {
            error!(
                "[RequestQueue] Failed to mark ledger record {} completed: {}",
                request.ledger_id, err
            );
        }
    }

    async fn settle_failure(&self, request: &QueuedRequest, err: &crate::TransportError) {
        warn!(
            "[RequestQueue] {} {} failed (attempt {}, {:?}): {}",
            request.method,
            request.url,
            request.retry_count + 1,
            err.retry_class(),
            err
        );
        match self
            .ledger
            .record_failure(request.ledger_id, request.max_retries)
            .await
        {
            Ok(FailureOutcome::WillRetry { retry_count }) => {
                let mut items = self.lock_items();
                if let Some(item) = items.iter_mut().find(|item| item.id == request.id) {
                    item.retry_count = retry_count;
                }
            }
            Ok(FailureOutcome::Exhausted) => {
                error!(
                    "[RequestQueue] {} {} abandoned after {} attempts",
                    request.method, request.url, request.max_retries
                );
                self.remove_item(&request.id);
                if let Some(hook) = &self.on_abandoned {
                    hook(request);
                }
            }
            Ok(FailureOutcome::AlreadySettled) => self.remove_item(&request.id),
            Err(store_err) => {
                error!(
                    "[RequestQueue] Ledger update failed for record {}: {}",
                    request.ledger_id, store_err
                );
            }
        }
    }

    fn remove_item(&self, id: &str) {
        self.lock_items().retain(|item| item.id != id);
    }

    fn lock_items(&self) -> MutexGuard<'_, Vec<QueuedRequest>> {
        self.items
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn sort_items(items: &mut [QueuedRequest]) {
    items.sort_by_key(|item| (item.priority, item.timestamp_ms));
}

fn to_outbound(request: &QueuedRequest, timeout: Duration) -> OutboundRequest {
    OutboundRequest {
        method: request.method,
        path: request.url.clone(),
        body: request.payload.clone(),
        priority: request.priority,
        timeout,
    }
}

/// Pull the entity id out of a request path. Collection paths (create) have
/// no id yet; the server assigns one.
fn entity_id_from_path(path: &str) -> EntityId {
    const COLLECTIONS: [&str; 5] = ["products", "cart", "orders", "profile", "vendors"];
    let last = path
        .trim_matches('/')
        .rsplit('/')
        .find(|segment| !segment.is_empty());
    match last {
        Some(segment) => {
            if let Ok(numeric) = segment.parse::<i64>() {
                EntityId::Int(numeric)
            } else if COLLECTIONS.contains(&segment) {
                EntityId::Int(0)
            } else {
                EntityId::Text(segment.to_string())
            }
        }
        None => EntityId::Int(0),
    }
}
