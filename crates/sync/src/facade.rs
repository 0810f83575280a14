//! The API facade: the single call surface application code uses.
//!
//! Hides online/offline branching: reads are local-first, offline mutations
//! are applied locally where possible and mirrored into the queue, direct
//! network calls carry tier-derived timeouts and exponential backoff.

use std::sync::Arc;
use std::time::Duration;

use log::{error, warn};

use sokoni_core::market::{CartStore, NewCartItem, ProductStore, VendorProfileStore};
use sokoni_core::network::{facade_retries, facade_timeout, NetworkMonitor};
use sokoni_core::sync::{facade_backoff, HttpMethod, SyncPriority};
use sokoni_core::Error;

use crate::error::Result;
use crate::queue::{EnqueueAck, RequestQueue};
use crate::transport::{OutboundRequest, RequestTransport};

/// Per-call options. Unset retries/timeout default from the current tier.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub priority: Option<SyncPriority>,
    pub retries: Option<u32>,
    pub timeout: Option<Duration>,
    /// Skip local-first routing and hit the network regardless of state.
    pub force_network: bool,
}

pub struct ApiClient {
    monitor: Arc<NetworkMonitor>,
    products: Arc<dyn ProductStore>,
    cart: Arc<dyn CartStore>,
    vendors: Arc<dyn VendorProfileStore>,
    queue: Arc<RequestQueue>,
    transport: Arc<dyn RequestTransport>,
}

impl ApiClient {
    pub fn new(
        monitor: Arc<NetworkMonitor>,
        products: Arc<dyn ProductStore>,
        cart: Arc<dyn CartStore>,
        vendors: Arc<dyn VendorProfileStore>,
        queue: Arc<RequestQueue>,
        transport: Arc<dyn RequestTransport>,
    ) -> Self {
        Self {
            monitor,
            products,
            cart,
            vendors,
            queue,
            transport,
        }
    }

    pub async fn get(&self, endpoint: &str, opts: RequestOptions) -> Result<serde_json::Value> {
        self.request(endpoint, HttpMethod::Get, None, opts).await
    }

    pub async fn post(
        &self,
        endpoint: &str,
        data: Option<serde_json::Value>,
        opts: RequestOptions,
    ) -> Result<serde_json::Value> {
        self.request(endpoint, HttpMethod::Post, data, opts).await
    }

    pub async fn put(
        &self,
        endpoint: &str,
        data: Option<serde_json::Value>,
        opts: RequestOptions,
    ) -> Result<serde_json::Value> {
        self.request(endpoint, HttpMethod::Put, data, opts).await
    }

    pub async fn delete(&self, endpoint: &str, opts: RequestOptions) -> Result<serde_json::Value> {
        self.request(endpoint, HttpMethod::Delete, None, opts).await
    }

    pub async fn patch(
        &self,
        endpoint: &str,
        data: Option<serde_json::Value>,
        opts: RequestOptions,
    ) -> Result<serde_json::Value> {
        self.request(endpoint, HttpMethod::Patch, data, opts).await
    }

    async fn request(
        &self,
        endpoint: &str,
        method: HttpMethod,
        payload: Option<serde_json::Value>,
        opts: RequestOptions,
    ) -> Result<serde_json::Value> {
        let priority = opts.priority.unwrap_or(SyncPriority::Normal);
        let is_online = self.monitor.is_online();

        if !is_online && method != HttpMethod::Get && !opts.force_network {
            if method == HttpMethod::Post && endpoint == "/cart" {
                match self.apply_cart_locally(&payload).await {
                    Ok(value) => {
                        self.queue
                            .enqueue("/api/cart", method, payload, priority)
                            .await?;
                        return Ok(value);
                    }
                    Err(Error::Database(err)) => {
                        // Store unavailable; a direct network attempt beats
                        // dropping the action.
                        warn!(
                            "[ApiClient] Cart store failed ({}), falling back to network",
                            err
                        );
                    }
                    Err(err) => return Err(err.into()),
                }
            } else {
                let ack = self
                    .queue
                    .enqueue(&format!("/api{}", endpoint), method, payload, priority)
                    .await?;
                return Ok(ack_to_value(ack));
            }
        }

        if method == HttpMethod::Get && !opts.force_network {
            if let Some(value) = self.read_local(endpoint)? {
                return Ok(value);
            }
            if !is_online {
                return Err(Error::UnsupportedEndpoint(endpoint.to_string()).into());
            }
        }

        self.network_request(endpoint, method, payload, priority, &opts)
            .await
    }

    /// Local-first reads for the cached collections.
    fn read_local(&self, endpoint: &str) -> Result<Option<serde_json::Value>> {
        let value = match endpoint {
            "/products" => Some(serde_json::to_value(self.products.get_products()?)
                .map_err(Error::from)?),
            "/cart" => {
                Some(serde_json::to_value(self.cart.get_cart()?).map_err(Error::from)?)
            }
            _ => {
                if let Some(id) = endpoint
                    .strip_prefix("/products/")
                    .and_then(|rest| rest.parse::<i32>().ok())
                {
                    match self.products.get_product(id)? {
                        Some(product) => {
                            Some(serde_json::to_value(product).map_err(Error::from)?)
                        }
                        None => Some(serde_json::Value::Null),
                    }
                } else if let Some(vendor_id) = endpoint.strip_prefix("/vendors/") {
                    match self.vendors.get_vendor_profile(vendor_id)? {
                        Some(profile) => {
                            Some(serde_json::to_value(profile).map_err(Error::from)?)
                        }
                        None => Some(serde_json::Value::Null),
                    }
                } else {
                    None
                }
            }
        };
        Ok(value)
    }

    /// Apply a cart mutation to the local store so the UI reflects it
    /// before any network round-trip.
    async fn apply_cart_locally(
        &self,
        payload: &Option<serde_json::Value>,
    ) -> sokoni_core::Result<serde_json::Value> {
        let Some(payload) = payload else {
            return Err(Error::validation("Cart mutation requires a payload"));
        };
        let item: NewCartItem = serde_json::from_value(payload.clone())?;
        let inserted = self.cart.add_to_cart(item).await?;
        Ok(serde_json::to_value(inserted)?)
    }

    async fn network_request(
        &self,
        endpoint: &str,
        method: HttpMethod,
        payload: Option<serde_json::Value>,
        priority: SyncPriority,
        opts: &RequestOptions,
    ) -> Result<serde_json::Value> {
        let tier = self.monitor.tier();
        let timeout = opts.timeout.unwrap_or_else(|| facade_timeout(tier));
        let retries = opts.retries.unwrap_or_else(|| facade_retries(tier));
        let path = format!("/api{}", endpoint);
        let mut attempt: u32 = 0;
        loop {
            let outcome = self
                .transport
                .send(OutboundRequest {
                    method,
                    path: path.clone(),
                    body: payload.clone(),
                    priority,
                    timeout,
                })
                .await;
            match outcome {
                Ok(response) => {
                    if method == HttpMethod::Post && endpoint == "/cart" {
                        if let Err(err) = self.apply_cart_locally(&payload).await {
                            error!("[ApiClient] Delivered cart mutation not applied locally: {}", err);
                        }
                    }
                    return Ok(response.body);
                }
                Err(err) => {
                    warn!(
                        "[ApiClient] {} {} failed (attempt {}, {:?}): {}",
                        method,
                        path,
                        attempt + 1,
                        err.retry_class(),
                        err
                    );
                    if attempt < retries && self.monitor.is_online() {
                        tokio::time::sleep(facade_backoff(attempt)).await;
                        attempt += 1;
                        continue;
                    }
                    if method != HttpMethod::Get {
                        // Out of retries: hand the mutation to the queue
                        // instead of failing outright.
                        let ack = self.queue.enqueue(&path, method, payload, priority).await?;
                        return Ok(ack_to_value(ack));
                    }
                    return Err(err.into());
                }
            }
        }
    }
}

fn ack_to_value(ack: EnqueueAck) -> serde_json::Value {
    match ack {
        EnqueueAck::Delivered(value) => value,
        EnqueueAck::Queued { ledger_id } => serde_json::json!({
            "status": "queued",
            "ledgerId": ledger_id,
        }),
    }
}
