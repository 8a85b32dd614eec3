/// Read-through caching over [`crate::cache::Cache`].
///
/// Looks `$key` up in the cache and returns the hit. On a miss, awaits
/// `$block`, hands the value to the background writer with `$ttl` seconds to
/// live, and returns it. A failed cache read is logged and treated as a miss,
/// so an unreachable Redis never fails the caller.
///
/// Evaluates to `AppResult<T>`; errors from `$block` are propagated with `?`.
///
/// # Example
/// ```rust,ignore
/// let path: Option<String> = cached!(cache, CacheKey::Poster(id), 3600, async move {
///     fetch_poster_path(id).await
/// })?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        let result: $crate::error::AppResult<_> = match $cache.get_from_cache(&key).await {
            Ok(Some(hit)) => Ok(hit),
            miss => {
                if let Err(e) = miss {
                    tracing::warn!(error = %e, key = %key, "Cache read failed, treating as miss");
                }
                let value = $block.await?;
                $cache.set_in_background(&key, &value, $ttl);
                Ok(value)
            }
        };
        result
    }};
}
