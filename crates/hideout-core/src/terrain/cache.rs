//! Region cache and the terrain front door used by the engine.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::models::GeoPoint;

use super::{Landuse, SyntheticTerrain, TerrainError, TerrainProvider, TerrainRegion};

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);
pub const DEFAULT_CACHE_MAX_ENTRIES: usize = 256;

/// Cache key: center rounded to 4 decimals (~11 m), radius to 0.1 km.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionKey {
    lat_e4: i64,
    lon_e4: i64,
    radius_dm: i64,
}

impl RegionKey {
    pub fn new(center: GeoPoint, radius_km: f64) -> Self {
        Self {
            lat_e4: (center.lat * 1e4).round() as i64,
            lon_e4: (center.lon * 1e4).round() as i64,
            radius_dm: (radius_km * 10.0).round() as i64,
        }
    }

    /// The rounded center the region is actually loaded for.
    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(self.lat_e4 as f64 / 1e4, self.lon_e4 as f64 / 1e4)
    }

    pub fn radius_km(&self) -> f64 {
        self.radius_dm as f64 / 10.0
    }
}

#[derive(Debug)]
struct CachedRegion {
    fetched_at: Instant,
    region: Arc<TerrainRegion>,
}

type Slot = Arc<Mutex<Option<CachedRegion>>>;

/// Per-key memoization of loaded regions.
///
/// Each key owns its own lock, so a slow load only blocks callers asking for
/// the same region. Failed loads leave the slot empty.
#[derive(Debug)]
pub struct RegionCache {
    slots: DashMap<RegionKey, Slot>,
    ttl: Duration,
    max_entries: usize,
}

impl Default for RegionCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL, DEFAULT_CACHE_MAX_ENTRIES)
    }
}

impl RegionCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            slots: DashMap::new(),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    pub fn get_or_load<F>(&self, key: RegionKey, load: F) -> Result<Arc<TerrainRegion>, TerrainError>
    where
        F: FnOnce() -> Result<TerrainRegion, TerrainError>,
    {
        let slot: Slot = self
            .slots
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(None)))
            .clone();

        let mut guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(cached) = guard.as_ref() {
            if cached.fetched_at.elapsed() <= self.ttl {
                return Ok(Arc::clone(&cached.region));
            }
        }

        let region = Arc::new(load()?);
        *guard = Some(CachedRegion {
            fetched_at: Instant::now(),
            region: Arc::clone(&region),
        });
        drop(guard);

        self.prune();
        Ok(region)
    }

    /// Number of populated entries.
    pub fn len(&self) -> usize {
        self.slots
            .iter()
            .filter(|entry| {
                entry
                    .value()
                    .try_lock()
                    .map(|slot| slot.is_some())
                    .unwrap_or(true)
            })
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.slots.clear();
    }

    /// Drop expired and empty slots, then the oldest entries beyond the cap.
    ///
    /// Slots that are locked (a load in progress) are left alone.
    fn prune(&self) {
        let now = Instant::now();
        let mut stale = Vec::new();
        let mut live: Vec<(RegionKey, Instant)> = Vec::new();

        for entry in self.slots.iter() {
            let Ok(slot) = entry.value().try_lock() else {
                continue;
            };
            match slot.as_ref() {
                Some(cached) if now.duration_since(cached.fetched_at) <= self.ttl => {
                    live.push((*entry.key(), cached.fetched_at));
                }
                _ => stale.push(*entry.key()),
            }
        }

        for key in &stale {
            self.slots.remove(key);
        }

        if live.len() <= self.max_entries {
            return;
        }

        live.sort_by_key(|(_, fetched_at)| *fetched_at);
        let excess = live.len() - self.max_entries;
        for (key, _) in live.into_iter().take(excess) {
            self.slots.remove(&key);
        }
    }
}

/// Cached terrain lookups over an injectable provider.
///
/// Provider failures fall back to synthetic terrain (unless disabled) and are
/// never cached, so a recovered provider is used on the next request.
pub struct TerrainIntel {
    provider: Arc<dyn TerrainProvider>,
    fallback: Option<SyntheticTerrain>,
    cache: RegionCache,
}

impl std::fmt::Debug for TerrainIntel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerrainIntel")
            .field("provider", &self.provider.name())
            .field("fallback", &self.fallback.is_some())
            .field("cache", &self.cache)
            .finish()
    }
}

impl Default for TerrainIntel {
    fn default() -> Self {
        Self::synthetic()
    }
}

impl TerrainIntel {
    pub fn new(provider: Arc<dyn TerrainProvider>) -> Self {
        Self {
            provider,
            fallback: Some(SyntheticTerrain),
            cache: RegionCache::default(),
        }
    }

    pub fn synthetic() -> Self {
        Self::new(Arc::new(SyntheticTerrain))
    }

    pub fn with_cache(mut self, ttl: Duration, max_entries: usize) -> Self {
        self.cache = RegionCache::new(ttl, max_entries);
        self
    }

    /// Surface provider errors instead of answering with synthetic terrain.
    pub fn without_fallback(mut self) -> Self {
        self.fallback = None;
        self
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn cache(&self) -> &RegionCache {
        &self.cache
    }

    /// Region around `center`, loaded once per rounded key.
    pub fn region(&self, center: GeoPoint, radius_km: f64) -> Result<Arc<TerrainRegion>, TerrainError> {
        let key = RegionKey::new(center, radius_km);
        let loaded = self
            .cache
            .get_or_load(key, || self.provider.load_region(key.center(), key.radius_km()));

        match loaded {
            Ok(region) => Ok(region),
            Err(err) => {
                let Some(fallback) = &self.fallback else {
                    return Err(err);
                };
                tracing::warn!(
                    "Terrain provider '{}' failed, using synthetic terrain: {}",
                    self.provider.name(),
                    err
                );
                fallback
                    .load_region(key.center(), key.radius_km())
                    .map(Arc::new)
            }
        }
    }

    pub fn landuse_at(&self, center: GeoPoint, radius_km: f64, point: GeoPoint) -> Result<Landuse, TerrainError> {
        Ok(self.region(center, radius_km)?.landuse_at(point))
    }

    pub fn elevation_at(&self, center: GeoPoint, radius_km: f64, point: GeoPoint) -> Result<f64, TerrainError> {
        Ok(self.region(center, radius_km)?.elevation_at(point))
    }
}
