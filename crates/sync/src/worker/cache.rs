//! Versioned response cache and request-class strategies.
//!
//! Mirrors the worker-side caching contract: navigation is network-first
//! with a static offline page as the last resort, API calls synthesize an
//! offline JSON response, assets adapt to the detected connection quality.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use log::{debug, warn};

use sokoni_core::network::ConnectionTier;

use crate::transport::{FetchedResource, ResourceFetcher};

/// Current cache version. Activation prunes every other version.
pub const CACHE_VERSION: &str = "sokoni-cache-v1";

/// Static page served when a navigation request fails with no cache entry.
pub const OFFLINE_PAGE_PATH: &str = "/offline.html";

/// Assets precached at install time.
pub const STATIC_ASSETS: &[&str] = &[
    "/",
    "/index.html",
    "/offline.html",
    "/assets/index.css",
    "/assets/index.js",
    "/manifest.json",
];

/// Decorative assets that can be skipped entirely on slow connections.
const LOW_PRIORITY_ASSET_PREFIXES: &[&str] = &["/assets/vendor-logos/", "/assets/banners/"];

pub fn is_low_priority_asset(path: &str) -> bool {
    LOW_PRIORITY_ASSET_PREFIXES
        .iter()
        .any(|prefix| path.contains(prefix))
}

/// Coarse connection quality used only by the asset strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionQuality {
    Fast,
    Medium,
    Slow,
}

impl ConnectionQuality {
    pub fn from_tier(tier: ConnectionTier) -> Self {
        match tier {
            ConnectionTier::Slow2g | ConnectionTier::TwoG => ConnectionQuality::Slow,
            ConnectionTier::ThreeG => ConnectionQuality::Medium,
            _ => ConnectionQuality::Fast,
        }
    }

    /// Fallback classification from a latency probe when no tier reading
    /// is available.
    pub fn from_probe_latency(latency: Duration) -> Self {
        if latency > Duration::from_millis(1_000) {
            ConnectionQuality::Slow
        } else if latency > Duration::from_millis(300) {
            ConnectionQuality::Medium
        } else {
            ConnectionQuality::Fast
        }
    }
}

/// One cached response.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedResponse {
    pub status: u16,
    pub content_type: String,
    pub body: Vec<u8>,
}

impl CachedResponse {
    fn empty(status: u16) -> Self {
        Self {
            status,
            content_type: String::new(),
            body: Vec::new(),
        }
    }

    fn offline_api_error() -> Self {
        Self {
            status: 503,
            content_type: "application/json".to_string(),
            body: serde_json::json!({
                "error": "You are offline. This action will be synced when you reconnect.",
            })
            .to_string()
            .into_bytes(),
        }
    }
}

impl From<FetchedResource> for CachedResponse {
    fn from(resource: FetchedResource) -> Self {
        Self {
            status: resource.status,
            content_type: resource.content_type,
            body: resource.body,
        }
    }
}

/// Named, versioned response store. Entries live under a version name so a
/// deployment switch leaves stale versions behind for `activate` to prune.
pub struct ResponseCache {
    version: String,
    caches: Mutex<HashMap<String, HashMap<String, CachedResponse>>>,
}

impl ResponseCache {
    pub fn new(version: &str) -> Self {
        Self {
            version: version.to_string(),
            caches: Mutex::new(HashMap::new()),
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn put(&self, path: &str, response: CachedResponse) {
        self.lock_caches()
            .entry(self.version.clone())
            .or_default()
            .insert(path.to_string(), response);
    }

    pub fn put_versioned(&self, version: &str, path: &str, response: CachedResponse) {
        self.lock_caches()
            .entry(version.to_string())
            .or_default()
            .insert(path.to_string(), response);
    }

    pub fn get(&self, path: &str) -> Option<CachedResponse> {
        self.lock_caches()
            .get(&self.version)
            .and_then(|cache| cache.get(path))
            .cloned()
    }

    /// Drop every cache version except the current one; returns how many
    /// versions were pruned.
    pub fn activate(&self) -> usize {
        let mut caches = self.lock_caches();
        let before = caches.len();
        caches.retain(|name, _| name == &self.version);
        let pruned = before - caches.len();
        if pruned > 0 {
            debug!("[ResponseCache] Pruned {} stale cache versions", pruned);
        }
        pruned
    }

    pub fn versions(&self) -> Vec<String> {
        self.lock_caches().keys().cloned().collect()
    }

    fn lock_caches(&self) -> MutexGuard<'_, HashMap<String, HashMap<String, CachedResponse>>> {
        self.caches
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Applies the per-request-class strategies over a fetcher and a cache.
pub struct FetchRouter {
    fetcher: Arc<dyn ResourceFetcher>,
    cache: Arc<ResponseCache>,
}

impl FetchRouter {
    pub fn new(fetcher: Arc<dyn ResourceFetcher>, cache: Arc<ResponseCache>) -> Self {
        Self { fetcher, cache }
    }

    /// Precache the static shell. Individual failures are logged, not
    /// fatal; a partially warmed cache still helps.
    pub async fn install(&self) {
        for path in STATIC_ASSETS {
            match self.fetcher.fetch(path).await {
                Ok(resource) if resource.is_success() => {
                    self.cache.put(path, resource.into());
                }
                Ok(resource) => {
                    warn!("[ResponseCache] Precache of {} got {}", path, resource.status);
                }
                Err(err) => warn!("[ResponseCache] Precache of {} failed: {}", path, err),
            }
        }
    }

    /// Navigation/HTML: network-first, then cache, then the offline page.
    pub async fn handle_navigation(&self, path: &str) -> CachedResponse {
        match self.fetcher.fetch(path).await {
            Ok(resource) => {
                if resource.is_success() {
                    self.cache.put(path, resource.clone().into());
                }
                resource.into()
            }
            Err(err) => {
                debug!("[ResponseCache] Navigation to {} failed: {}", path, err);
                if let Some(cached) = self.cache.get(path) {
                    return cached;
                }
                self.cache
                    .get(OFFLINE_PAGE_PATH)
                    .unwrap_or_else(|| CachedResponse::empty(404))
            }
        }
    }

    /// API: network-first, cache on success, cached fallback, else a
    /// synthesized 503 telling the caller the action will sync later.
    pub async fn handle_api(&self, path: &str) -> CachedResponse {
        match self.fetcher.fetch(path).await {
            Ok(resource) => {
                if resource.is_success() {
                    self.cache.put(path, resource.clone().into());
                }
                resource.into()
            }
            Err(err) => {
                debug!("[ResponseCache] API fetch of {} failed: {}", path, err);
                self.cache
                    .get(path)
                    .unwrap_or_else(CachedResponse::offline_api_error)
            }
        }
    }

    /// Assets: skipped on slow connections when low priority, cache-first
    /// on medium, stale-while-revalidate otherwise.
    pub async fn handle_asset(&self, path: &str, quality: ConnectionQuality) -> CachedResponse {
        let low_priority = is_low_priority_asset(path);
        if quality == ConnectionQuality::Slow && low_priority {
            return CachedResponse::empty(204);
        }
        if quality == ConnectionQuality::Medium && low_priority {
            if let Some(cached) = self.cache.get(path) {
                return cached;
            }
        }

        match self.cache.get(path) {
            Some(cached) => {
                self.spawn_revalidate(path);
                cached
            }
            None => match self.fetcher.fetch(path).await {
                Ok(resource) => {
                    if resource.is_success() {
                        self.cache.put(path, resource.clone().into());
                    }
                    resource.into()
                }
                Err(err) => {
                    debug!("[ResponseCache] Asset fetch of {} failed: {}", path, err);
                    CachedResponse::empty(504)
                }
            },
        }
    }

    fn spawn_revalidate(&self, path: &str) {
        let fetcher = Arc::clone(&self.fetcher);
        let cache = Arc::clone(&self.cache);
        let path = path.to_string();
        tokio::spawn(async move {
            match fetcher.fetch(&path).await {
                Ok(resource) if resource.is_success() => cache.put(&path, resource.into()),
                Ok(_) | Err(_) => {}
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use async_trait::async_trait;

    /// Fetcher answering from a fixed path -> body table; everything else
    /// fails like a dead network.
    struct TableFetcher {
        table: HashMap<String, Vec<u8>>,
        calls: Mutex<Vec<String>>,
    }

    impl TableFetcher {
        fn new(entries: &[(&str, &str)]) -> Self {
            Self {
                table: entries
                    .iter()
                    .map(|(path, body)| (path.to_string(), body.as_bytes().to_vec()))
                    .collect(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn offline() -> Self {
            Self::new(&[])
        }

        fn call_count(&self) -> usize {
            self.calls.lock().expect("calls lock").len()
        }
    }

    #[async_trait]
    impl ResourceFetcher for TableFetcher {
        async fn fetch(
            &self,
            path: &str,
        ) -> std::result::Result<FetchedResource, TransportError> {
            self.calls.lock().expect("calls lock").push(path.to_string());
            match self.table.get(path) {
                Some(body) => Ok(FetchedResource {
                    status: 200,
                    content_type: "text/html".to_string(),
                    body: body.clone(),
                }),
                None => Err(TransportError::api(0, "connection refused")),
            }
        }
    }

    fn router(fetcher: TableFetcher) -> (Arc<TableFetcher>, Arc<ResponseCache>, FetchRouter) {
        let fetcher = Arc::new(fetcher);
        let cache = Arc::new(ResponseCache::new(CACHE_VERSION));
        let router = FetchRouter::new(
            fetcher.clone() as Arc<dyn ResourceFetcher>,
            Arc::clone(&cache),
        );
        (fetcher, cache, router)
    }

    #[test]
    fn quality_maps_from_tier_and_latency() {
        assert_eq!(
            ConnectionQuality::from_tier(ConnectionTier::Slow2g),
            ConnectionQuality::Slow
        );
        assert_eq!(
            ConnectionQuality::from_tier(ConnectionTier::ThreeG),
            ConnectionQuality::Medium
        );
        assert_eq!(
            ConnectionQuality::from_tier(ConnectionTier::Unknown),
            ConnectionQuality::Fast
        );
        assert_eq!(
            ConnectionQuality::from_probe_latency(Duration::from_millis(1_500)),
            ConnectionQuality::Slow
        );
        assert_eq!(
            ConnectionQuality::from_probe_latency(Duration::from_millis(400)),
            ConnectionQuality::Medium
        );
        assert_eq!(
            ConnectionQuality::from_probe_latency(Duration::from_millis(100)),
            ConnectionQuality::Fast
        );
    }

    #[test]
    fn banner_and_vendor_logo_assets_are_low_priority() {
        assert!(is_low_priority_asset("/assets/banners/sale.png"));
        assert!(is_low_priority_asset("/assets/vendor-logos/vendor1.svg"));
        assert!(!is_low_priority_asset("/assets/index.css"));
    }

    #[test]
    fn activate_prunes_every_other_version() {
        let cache = ResponseCache::new(CACHE_VERSION);
        cache.put("/index.html", CachedResponse::empty(200));
        cache.put_versioned("sokoni-cache-v0", "/index.html", CachedResponse::empty(200));
        cache.put_versioned("legacy", "/app.js", CachedResponse::empty(200));

        assert_eq!(cache.activate(), 2);
        assert_eq!(cache.versions(), [CACHE_VERSION.to_string()]);
        assert!(cache.get("/index.html").is_some());
    }

    #[tokio::test]
    async fn navigation_falls_back_to_the_offline_page() {
        let (_, cache, router) = router(TableFetcher::offline());
        cache.put(
            OFFLINE_PAGE_PATH,
            CachedResponse {
                status: 200,
                content_type: "text/html".to_string(),
                body: b"<h1>You are offline</h1>".to_vec(),
            },
        );

        let response = router.handle_navigation("/products").await;
        assert_eq!(response.status, 200);
        assert_eq!(response.body, b"<h1>You are offline</h1>");

        // A previously cached page wins over the offline page.
        cache.put("/products", CachedResponse::empty(200));
        let cached = router.handle_navigation("/products").await;
        assert_eq!(cached, CachedResponse::empty(200));
    }

    #[tokio::test]
    async fn navigation_without_any_cache_is_a_404() {
        let (_, _, router) = router(TableFetcher::offline());
        let response = router.handle_navigation("/products").await;
        assert_eq!(response.status, 404);
    }

    #[tokio::test]
    async fn api_failure_synthesizes_offline_json() {
        let (_, _, router) = router(TableFetcher::offline());
        let response = router.handle_api("/api/products").await;
        assert_eq!(response.status, 503);
        assert_eq!(response.content_type, "application/json");
        let body: serde_json::Value =
            serde_json::from_slice(&response.body).expect("json body");
        assert!(body["error"].as_str().expect("error message").contains("synced"));
    }

    #[tokio::test]
    async fn successful_api_fetch_is_cached_for_fallback() {
        let (_, cache, router) =
            router(TableFetcher::new(&[("/api/products", "[{\"id\":1}]")]));
        let live = router.handle_api("/api/products").await;
        assert_eq!(live.status, 200);
        assert!(cache.get("/api/products").is_some());
    }

    #[tokio::test]
    async fn slow_connections_skip_low_priority_assets() {
        let (fetcher, _, router) = router(TableFetcher::offline());
        let response = router
            .handle_asset("/assets/banners/sale.png", ConnectionQuality::Slow)
            .await;
        assert_eq!(response.status, 204);
        assert_eq!(fetcher.call_count(), 0);
    }

    #[tokio::test]
    async fn medium_connections_serve_low_priority_assets_cache_first() {
        let (fetcher, cache, router) = router(TableFetcher::offline());
        cache.put("/assets/banners/sale.png", CachedResponse::empty(200));
        let response = router
            .handle_asset("/assets/banners/sale.png", ConnectionQuality::Medium)
            .await;
        assert_eq!(response.status, 200);
        assert_eq!(fetcher.call_count(), 0);
    }

    #[tokio::test]
    async fn fast_connections_revalidate_stale_assets() {
        let (_, cache, router) =
            router(TableFetcher::new(&[("/assets/index.css", "body{}")]));
        cache.put(
            "/assets/index.css",
            CachedResponse {
                status: 200,
                content_type: "text/css".to_string(),
                body: b"stale".to_vec(),
            },
        );

        let response = router
            .handle_asset("/assets/index.css", ConnectionQuality::Fast)
            .await;
        // Stale copy is returned immediately; the refresh runs behind it.
        assert_eq!(response.body, b"stale");

        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
        let refreshed = cache.get("/assets/index.css").expect("cached");
        assert_eq!(refreshed.body, b"body{}");
    }

    #[tokio::test]
    async fn uncached_asset_misses_return_504() {
        let (_, _, router) = router(TableFetcher::offline());
        let response = router
            .handle_asset("/assets/index.css", ConnectionQuality::Fast)
            .await;
        assert_eq!(response.status, 504);
    }

    #[tokio::test]
    async fn install_precaches_the_static_shell() {
        let entries: Vec<(&str, &str)> =
            STATIC_ASSETS.iter().map(|path| (*path, "content")).collect();
        let (_, cache, router) = router(TableFetcher::new(&entries));
        router.install().await;
        for path in STATIC_ASSETS {
            assert!(cache.get(path).is_some(), "missing precache for {}", path);
        }
    }
}
