//! Option-list sources.
//!
//! [`RegionSource`] is the seam between the cascade and the outside world.
//! [`RegionClient`] talks to the region endpoint over HTTP and
//! [`CachedSource`] keeps successful answers in memory for a while, since
//! administrative divisions change rarely.

use crate::config::WilayahSettings;
use crate::error::FetchError;
use crate::region::{Level, MAX_PAGE_SIZE, Region, RegionPage, RegionQuery};
use dashmap::DashMap;
use std::future::Future;
use std::time::{Duration, Instant};
use url::Url;

/// Something that can produce the option list for a query.
pub trait RegionSource: Send + Sync + 'static {
    fn fetch(
        &self,
        query: &RegionQuery,
    ) -> impl Future<Output = Result<Vec<Region>, FetchError>> + Send;
}

/// HTTP client for `GET <base>/regions`.
#[derive(Debug, Clone)]
pub struct RegionClient {
    http: reqwest::Client,
    base: Url,
    page_size: usize,
}

impl RegionClient {
    /// Create a client for `base_url`. `page_size` is clamped to
    /// `1..=MAX_PAGE_SIZE`.
    pub fn new(base_url: &str, page_size: usize, timeout: Duration) -> Result<Self, FetchError> {
        let base = Url::parse(base_url)
            .map_err(|e| FetchError::invalid_query(format!("bad base URL '{}': {}", base_url, e)))?;
        if base.cannot_be_a_base() {
            return Err(FetchError::invalid_query(format!(
                "base URL '{}' cannot carry a path",
                base_url
            )));
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::transport(e.to_string()))?;
        Ok(Self {
            http,
            base,
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        })
    }

    pub fn from_settings(settings: &WilayahSettings) -> Result<Self, FetchError> {
        Self::new(
            &settings.api_base_url,
            settings.page_size,
            Duration::from_millis(settings.request_timeout_ms),
        )
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Build the request URL for a query.
    ///
    /// `filter[code]` is only sent below the province level.
    pub fn query_url(&self, query: &RegionQuery) -> Result<Url, FetchError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::invalid_query("base URL cannot carry a path"))?
            .pop_if_empty()
            .push("regions");

        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("filter[level]", query.level.as_str());
            match (query.level, query.parent.as_deref()) {
                (Level::Province, _) => {}
                (_, Some(parent)) if !parent.is_empty() => {
                    pairs.append_pair("filter[code]", parent);
                }
                (level, _) => {
                    return Err(FetchError::invalid_query(format!(
                        "{} query without a parent code",
                        level
                    )));
                }
            }
            pairs.append_pair("include", "children");
            pairs.append_pair("per_page", &self.page_size.to_string());
        }

        Ok(url)
    }

    async fn get_regions(&self, query: &RegionQuery) -> Result<Vec<Region>, FetchError> {
        let url = self.query_url(query)?;
        log::debug!(target: "wilayah::source", "GET {}", url);

        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::http(status.as_u16(), url.as_str()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::transport(e.to_string()))?;
        let page: RegionPage =
            serde_json::from_slice(&body).map_err(|e| FetchError::decode(e.to_string()))?;

        Ok(page.into_regions(query.level, self.page_size))
    }
}

impl RegionSource for RegionClient {
    fn fetch(
        &self,
        query: &RegionQuery,
    ) -> impl Future<Output = Result<Vec<Region>, FetchError>> + Send {
        self.get_regions(query)
    }
}

struct CacheEntry {
    stored_at: Instant,
    regions: Vec<Region>,
}

/// In-memory TTL cache in front of another source.
///
/// Only successful fetches are stored. A zero TTL disables caching.
pub struct CachedSource<S> {
    inner: S,
    ttl: Duration,
    entries: DashMap<RegionQuery, CacheEntry>,
}

impl<S: RegionSource> CachedSource<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: DashMap::new(),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn lookup(&self, query: &RegionQuery) -> Option<Vec<Region>> {
        if self.ttl.is_zero() {
            return None;
        }
        let entry = self.entries.get(query)?;
        if entry.stored_at.elapsed() > self.ttl {
            drop(entry);
            self.entries.remove(query);
            return None;
        }
        Some(entry.regions.clone())
    }
}

impl<S: RegionSource> RegionSource for CachedSource<S> {
    fn fetch(
        &self,
        query: &RegionQuery,
    ) -> impl Future<Output = Result<Vec<Region>, FetchError>> + Send {
        async move {
            if let Some(regions) = self.lookup(query) {
                log::trace!(target: "wilayah::source", "Cache hit for {:?}", query);
                return Ok(regions);
            }

            let regions = self.inner.fetch(query).await?;
            if !self.ttl.is_zero() {
                self.entries.insert(
                    query.clone(),
                    CacheEntry {
                        stored_at: Instant::now(),
                        regions: regions.clone(),
                    },
                );
            }
            Ok(regions)
        }
    }
}
