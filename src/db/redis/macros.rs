/// Read-through caching around an async computation.
///
/// Returns the cached value for `$key` when present. Otherwise awaits
/// `$block`, queues its value for a background write with `$ttl` seconds and
/// returns it. A failing cache read is logged and treated as a miss, so Redis
/// being down never fails the request. Errors from `$block` propagate.
///
/// ```rust,ignore
/// let tracks: Vec<TrackSummary> = cached!(self.cache, key, SEARCH_CACHE_TTL, async move {
///     self.fetch_search(query, limit).await
/// })?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        match $cache.get_from_cache(&key).await {
            Ok(Some(hit)) => {
                tracing::debug!(key = %key, "Cache hit");
                Ok(hit)
            }
            lookup => {
                if let Err(e) = lookup {
                    tracing::warn!(error = %e, key = %key, "Cache read failed, treating as miss");
                }
                let value = $block.await?;
                $cache.set_in_background(&key, &value, $ttl);
                Ok(value)
            }
        }
    }};
}
