//! Cache key derivation for free/busy results.
//!
//! Keys are a pure function of `(auth_sub, window_start, window_end)` with
//! exact string equality on the bounds — no normalization. Callers that
//! want fuzzy window matching must canonicalize the bounds themselves
//! before calling.
//!
//! Auth subjects are opaque but assumed colon-free (they are issuer
//! subject ids); the window bounds may contain colons, so auth-sub
//! extraction only ever looks at the first segment.

/// Returns the cache key for one user's free/busy result over a window.
pub fn free_busy_key(auth_sub: &str, window_start: &str, window_end: &str) -> String {
    format!("freebusy:{auth_sub}:{window_start}:{window_end}")
}

/// Returns the prefix covering all of one user's free/busy keys,
/// regardless of window.
pub fn free_busy_prefix(auth_sub: &str) -> String {
    format!("freebusy:{auth_sub}:")
}

/// Returns the backend Set key tracking one user's live free/busy cache
/// keys. Tracking sets enable prefix deletion without scanning the whole
/// keyspace.
pub fn free_busy_tracking_key(auth_sub: &str) -> String {
    format!("freebusy:{auth_sub}:_keys")
}

/// Returns true for keys produced by [`free_busy_key`]. Tracking-set keys
/// are excluded.
pub fn is_free_busy_key(key: &str) -> bool {
    let Some(rest) = key.strip_prefix("freebusy:") else {
        return false;
    };
    if rest.ends_with(":_keys") {
        return false;
    }
    // auth_sub plus at least a start and an end segment.
    rest.split(':').count() >= 3
}

/// Extracts the auth subject from a free/busy cache key, if present.
pub fn extract_auth_sub_from_key(key: &str) -> Option<&str> {
    let rest = key.strip_prefix("freebusy:")?;
    let auth_sub = rest.split(':').next()?;
    if auth_sub.is_empty() {
        return None;
    }
    Some(auth_sub)
}

/// Extracts the auth subject from a prefix produced by
/// [`free_busy_prefix`].
pub fn extract_auth_sub_from_prefix(prefix: &str) -> Option<&str> {
    let rest = prefix.strip_prefix("freebusy:")?;
    let auth_sub = rest.strip_suffix(':')?;
    if auth_sub.is_empty() || auth_sub.contains(':') {
        return None;
    }
    Some(auth_sub)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_busy_key_is_deterministic() {
        let a = free_busy_key("sub-1", "2024-01-01T00:00:00Z", "2024-01-08T00:00:00Z");
        let b = free_busy_key("sub-1", "2024-01-01T00:00:00Z", "2024-01-08T00:00:00Z");
        assert_eq!(a, b);
        assert_eq!(
            a,
            "freebusy:sub-1:2024-01-01T00:00:00Z:2024-01-08T00:00:00Z"
        );
    }

    #[test]
    fn test_bounds_are_not_normalized() {
        // Same instant, different spellings: different keys by design.
        let a = free_busy_key("sub-1", "2024-01-01T00:00:00Z", "2024-01-08T00:00:00Z");
        let b = free_busy_key("sub-1", "2024-01-01T00:00:00+00:00", "2024-01-08T00:00:00Z");
        assert_ne!(a, b);
    }

    #[test]
    fn test_key_starts_with_user_prefix() {
        let key = free_busy_key("sub-1", "start", "end");
        assert!(key.starts_with(&free_busy_prefix("sub-1")));
        assert!(!key.starts_with(&free_busy_prefix("sub-2")));
    }

    #[test]
    fn test_is_free_busy_key() {
        assert!(is_free_busy_key("freebusy:sub-1:start:end"));
        assert!(is_free_busy_key(&free_busy_key(
            "sub-1",
            "2024-01-01T00:00:00Z",
            "2024-01-08T00:00:00Z"
        )));

        assert!(!is_free_busy_key("freebusy:sub-1:_keys"));
        assert!(!is_free_busy_key("freebusy:sub-1"));
        assert!(!is_free_busy_key("group:trip"));
    }

    #[test]
    fn test_extract_auth_sub_from_key() {
        let key = free_busy_key("sub-1", "2024-01-01T00:00:00Z", "2024-01-08T00:00:00Z");
        assert_eq!(extract_auth_sub_from_key(&key), Some("sub-1"));
        assert_eq!(extract_auth_sub_from_key("group:trip"), None);
        assert_eq!(extract_auth_sub_from_key("freebusy:"), None);
    }

    #[test]
    fn test_extract_auth_sub_from_prefix() {
        assert_eq!(
            extract_auth_sub_from_prefix(&free_busy_prefix("sub-1")),
            Some("sub-1")
        );
        assert_eq!(extract_auth_sub_from_prefix("freebusy:sub-1"), None);
        assert_eq!(extract_auth_sub_from_prefix("group:trip:"), None);
    }
}
