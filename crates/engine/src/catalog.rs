//! Menu catalog and its time-bounded cache.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use domain::Product;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::time::Instant;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog source unavailable: {0}")]
    Unavailable(String),
}

/// The menu as served to terminals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub products: Vec<Product>,
}

impl Catalog {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    pub fn product(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }
}

/// Where the menu comes from (database, file, remote admin service).
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn load(&self) -> Result<Catalog, CatalogError>;
}

/// Fixed in-memory catalog source. Counts loads.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    catalog: Arc<RwLock<Catalog>>,
    loads: Arc<AtomicUsize>,
}

impl StaticCatalog {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog: Arc::new(RwLock::new(catalog)),
            loads: Arc::default(),
        }
    }

    /// Replaces the source contents; cached copies are unaffected until
    /// they expire or are invalidated.
    pub async fn set(&self, catalog: Catalog) {
        *self.catalog.write().await = catalog;
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl CatalogSource for StaticCatalog {
    async fn load(&self) -> Result<Catalog, CatalogError> {
        self.loads.fetch_add(1, Ordering::Relaxed);
        Ok(self.catalog.read().await.clone())
    }
}

struct CachedCatalog {
    catalog: Arc<Catalog>,
    expires_at: Instant,
}

/// Caches the catalog for a fixed time-to-live.
///
/// Edits made at the source show up after at most one TTL, or immediately
/// after [`invalidate`](Self::invalidate).
pub struct CatalogCache<C: CatalogSource> {
    source: C,
    ttl: Duration,
    entry: RwLock<Option<CachedCatalog>>,
}

impl<C: CatalogSource> CatalogCache<C> {
    pub fn new(source: C, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            entry: RwLock::new(None),
        }
    }

    pub fn source(&self) -> &C {
        &self.source
    }

    /// Returns the cached catalog, loading it when missing or expired.
    pub async fn get(&self) -> Result<Arc<Catalog>, CatalogError> {
        {
            let entry = self.entry.read().await;
            if let Some(cached) = entry.as_ref()
                && cached.expires_at > Instant::now()
            {
                return Ok(Arc::clone(&cached.catalog));
            }
        }

        let mut entry = self.entry.write().await;
        // Another caller may have reloaded while we waited for the lock.
        if let Some(cached) = entry.as_ref()
            && cached.expires_at > Instant::now()
        {
            return Ok(Arc::clone(&cached.catalog));
        }

        let catalog = Arc::new(self.source.load().await?);
        tracing::debug!(products = catalog.products.len(), "catalog loaded");
        *entry = Some(CachedCatalog {
            catalog: Arc::clone(&catalog),
            expires_at: Instant::now() + self.ttl,
        });
        Ok(catalog)
    }

    /// Drops the cached copy; the next `get` reloads from the source.
    pub async fn invalidate(&self) {
        *self.entry.write().await = None;
        tracing::info!("catalog cache invalidated");
    }
}
