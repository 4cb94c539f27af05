/// Cache-aside helper: returns the cached value when present, otherwise
/// awaits `$block`, stores its result and returns it.
///
/// Evaluates to `Ok((value, hit))` where `hit` reports whether the value
/// came from the cache. Errors from the lookup, the block or the write
/// propagate with `?`, so the macro must be used inside a function returning
/// `AppResult`.
///
/// # Arguments
/// * `$cache`: a [`Cache`](crate::db::Cache) exposing `get_from_cache` and `set`.
/// * `$key`: the [`CacheKey`](crate::db::CacheKey) to read and write.
/// * `$ttl`: time-to-live in seconds for a freshly computed value.
/// * `$block`: future computing the value on a miss.
///
/// # Example
/// ```rust,ignore
/// let (outfits, cached) = cached!(cache, key, RESULTS_TTL_SECS, async move {
///     compute_outfits().await
/// })?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        if let Some(cached) = $cache.get_from_cache(&$key).await? {
            Ok((cached, true))
        } else {
            let value = $block.await?;
            $cache.set(&$key, &value, $ttl).await?;
            Ok((value, false))
        }
    }};
}
