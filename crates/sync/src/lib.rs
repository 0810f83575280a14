//! Offline-resilient synchronization: the priority request queue, the API
//! facade and the background sync worker, all coordinating through the
//! durable ledger.

pub mod error;
pub mod facade;
pub mod queue;
pub mod transport;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Result, RetryClass, SyncError, TransportError};
pub use facade::{ApiClient, RequestOptions};
pub use queue::{EnqueueAck, QueueConfig, QueuedRequest, RequestQueue};
pub use transport::{
    FetchedResource, HttpTransport, OutboundRequest, RequestTransport, ResourceFetcher,
    TransportResponse, PRIORITY_HEADER,
};
pub use worker::{
    is_low_priority_asset, spawn_sync_loop, CachedResponse, ConnectionQuality, FetchRouter,
    ResponseCache, SyncReport, SyncWorker, WorkerConfig, CACHE_VERSION, OFFLINE_PAGE_PATH,
    STATIC_ASSETS,
};
