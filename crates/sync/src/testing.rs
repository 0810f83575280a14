//! In-memory fakes shared by the queue, facade and worker tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use sokoni_core::market::{CartItem, CartStore, NewCartItem, Product, ProductStore, VendorProfile, VendorProfileStore};
use sokoni_core::sync::{
    FailureOutcome, NewSyncOperation, SyncLedger, SyncOperation, SyncOperationPatch, SyncStatus,
};
use sokoni_core::{Error, Result};

use crate::error::TransportError;
use crate::transport::{OutboundRequest, RequestTransport, TransportResponse};

type ScriptedSend = std::result::Result<TransportResponse, TransportError>;

/// Transport that records every send and answers from a script, falling
/// back to a default outcome once the script is exhausted.
pub struct FakeTransport {
    pub sent: Mutex<Vec<OutboundRequest>>,
    script: Mutex<VecDeque<ScriptedSend>>,
    default_ok: bool,
}

impl FakeTransport {
    pub fn always_succeeding() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            script: Mutex::new(VecDeque::new()),
            default_ok: true,
        }
    }

    pub fn always_failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            script: Mutex::new(VecDeque::new()),
            default_ok: false,
        }
    }

    pub fn with_script(outcomes: Vec<ScriptedSend>, default_ok: bool) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            script: Mutex::new(outcomes.into()),
            default_ok,
        }
    }

    pub fn sent_paths(&self) -> Vec<String> {
        self.sent
            .lock()
            .expect("sent lock")
            .iter()
            .map(|request| request.path.clone())
            .collect()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().expect("sent lock").len()
    }
}

#[async_trait]
impl RequestTransport for FakeTransport {
    async fn send(&self, request: OutboundRequest) -> ScriptedSend {
        self.sent.lock().expect("sent lock").push(request);
        if let Some(outcome) = self.script.lock().expect("script lock").pop_front() {
            return outcome;
        }
        if self.default_ok {
            Ok(TransportResponse {
                status: 200,
                body: serde_json::json!({ "ok": true }),
            })
        } else {
            Err(TransportError::api(500, "scripted failure"))
        }
    }
}

/// In-memory `SyncLedger` mirroring the SQLite repository's semantics.
#[derive(Default)]
pub struct MemoryLedger {
    ops: Mutex<Vec<SyncOperation>>,
    next_id: AtomicI32,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self {
            ops: Mutex::new(Vec::new()),
            next_id: AtomicI32::new(1),
        }
    }

    pub fn status_of(&self, id: i32) -> Option<SyncStatus> {
        self.ops
            .lock()
            .expect("ops lock")
            .iter()
            .find(|op| op.id == id)
            .map(|op| op.status)
    }
}

#[async_trait]
impl SyncLedger for MemoryLedger {
    async fn add_operation(&self, operation: NewSyncOperation) -> Result<i32> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.ops.lock().expect("ops lock").push(SyncOperation {
            id,
            operation: operation.operation,
            entity_type: operation.entity_type,
            entity_id: operation.entity_id,
            data: operation.data,
            timestamp: Utc::now().timestamp_millis(),
            status: SyncStatus::Pending,
            retry_count: 0,
            priority: operation.priority,
        });
        Ok(id)
    }

    fn pending_operations(&self) -> Result<Vec<SyncOperation>> {
        Ok(self
            .ops
            .lock()
            .expect("ops lock")
            .iter()
            .filter(|op| op.status == SyncStatus::Pending)
            .cloned()
            .collect())
    }

    async fn update_operation(&self, id: i32, patch: SyncOperationPatch) -> Result<()> {
        let mut ops = self.ops.lock().expect("ops lock");
        if let Some(op) = ops.iter_mut().find(|op| op.id == id) {
            if let Some(status) = patch.status {
                op.status = status;
            }
            if let Some(retry_count) = patch.retry_count {
                op.retry_count = retry_count;
            }
            if let Some(data) = patch.data {
                op.data = data;
            }
        }
        Ok(())
    }

    async fn mark_processing(&self, id: i32) -> Result<bool> {
        let mut ops = self.ops.lock().expect("ops lock");
        match ops
            .iter_mut()
            .find(|op| op.id == id && op.status == SyncStatus::Pending)
        {
            Some(op) => {
                op.status = SyncStatus::Processing;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_completed(&self, id: i32) -> Result<()> {
        let mut ops = self.ops.lock().expect("ops lock");
        if let Some(op) = ops.iter_mut().find(|op| op.id == id) {
            op.status = SyncStatus::Completed;
        }
        Ok(())
    }

    async fn record_failure(&self, id: i32, max_retries: i32) -> Result<FailureOutcome> {
        let mut ops = self.ops.lock().expect("ops lock");
        let Some(op) = ops.iter_mut().find(|op| op.id == id) else {
            return Ok(FailureOutcome::AlreadySettled);
        };
        if matches!(op.status, SyncStatus::Completed | SyncStatus::Failed) {
            return Ok(FailureOutcome::AlreadySettled);
        }
        op.retry_count += 1;
        if op.retry_count >= max_retries {
            op.status = SyncStatus::Failed;
            Ok(FailureOutcome::Exhausted)
        } else {
            op.status = SyncStatus::Pending;
            Ok(FailureOutcome::WillRetry {
                retry_count: op.retry_count,
            })
        }
    }

    async fn requeue_stale_processing(&self) -> Result<usize> {
        let mut ops = self.ops.lock().expect("ops lock");
        let mut requeued = 0;
        for op in ops.iter_mut() {
            if op.status == SyncStatus::Processing {
                op.status = SyncStatus::Pending;
                requeued += 1;
            }
        }
        Ok(requeued)
    }

    fn pending_count(&self) -> Result<i64> {
        Ok(self.pending_operations()?.len() as i64)
    }

    async fn prune_completed(&self) -> Result<usize> {
        let mut ops = self.ops.lock().expect("ops lock");
        let before = ops.len();
        ops.retain(|op| op.status != SyncStatus::Completed);
        Ok(before - ops.len())
    }
}

#[derive(Default)]
pub struct MemoryProductStore {
    products: Mutex<Vec<Product>>,
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    fn get_products(&self) -> Result<Vec<Product>> {
        Ok(self.products.lock().expect("products lock").clone())
    }

    fn get_products_by_category(&self, category: &str) -> Result<Vec<Product>> {
        Ok(self
            .products
            .lock()
            .expect("products lock")
            .iter()
            .filter(|product| product.category == category)
            .cloned()
            .collect())
    }

    fn get_product(&self, product_id: i32) -> Result<Option<Product>> {
        Ok(self
            .products
            .lock()
            .expect("products lock")
            .iter()
            .find(|product| product.id == product_id)
            .cloned())
    }

    async fn save_products(&self, incoming: Vec<Product>) -> Result<()> {
        let mut products = self.products.lock().expect("products lock");
        for product in incoming {
            products.retain(|existing| existing.id != product.id);
            products.push(product);
        }
        Ok(())
    }
}

pub struct MemoryCartStore {
    items: Mutex<Vec<CartItem>>,
    next_id: AtomicI32,
    /// When set, every mutation fails; simulates storage unavailability.
    pub fail_writes: std::sync::atomic::AtomicBool,
}

impl Default for MemoryCartStore {
    fn default() -> Self {
        Self {
            items: Mutex::new(Vec::new()),
            next_id: AtomicI32::new(1),
            fail_writes: std::sync::atomic::AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl CartStore for MemoryCartStore {
    async fn add_to_cart(&self, item: NewCartItem) -> Result<CartItem> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Database(sokoni_core::DatabaseError::Internal(
                "cart store unavailable".to_string(),
            )));
        }
        let cart_item = CartItem {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            product_id: item.product_id,
            quantity: item.quantity,
            added_at: Utc::now().to_rfc3339(),
        };
        self.items
            .lock()
            .expect("items lock")
            .push(cart_item.clone());
        Ok(cart_item)
    }

    fn get_cart(&self) -> Result<Vec<CartItem>> {
        Ok(self.items.lock().expect("items lock").clone())
    }

    async fn clear_cart(&self) -> Result<()> {
        self.items.lock().expect("items lock").clear();
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryVendorStore {
    profiles: Mutex<Vec<VendorProfile>>,
}

#[async_trait]
impl VendorProfileStore for MemoryVendorStore {
    fn get_vendor_profile(&self, vendor_id: &str) -> Result<Option<VendorProfile>> {
        Ok(self
            .profiles
            .lock()
            .expect("profiles lock")
            .iter()
            .find(|profile| profile.id == vendor_id)
            .cloned())
    }

    async fn save_vendor_profiles(&self, incoming: Vec<VendorProfile>) -> Result<()> {
        let mut profiles = self.profiles.lock().expect("profiles lock");
        for profile in incoming {
            profiles.retain(|existing| existing.id != profile.id);
            profiles.push(profile);
        }
        Ok(())
    }
}
