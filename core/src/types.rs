//! Shared primitive types used across the cache.

use crate::error::CacheResult;

/// Two-letter ISO country code, the catalog key.
pub type CountryCode = String;

/// Platform-assigned loan identifier, the preferred-loan key.
pub type LoanId = u32;

/// Copy a borrowed string into a freshly owned buffer.
///
/// Allocation goes through `try_reserve_exact` so that exhaustion surfaces
/// as `CacheError::OutOfMemory` instead of aborting the process.
pub fn owned_copy(src: &str) -> CacheResult<String> {
    let mut out = String::new();
    out.try_reserve_exact(src.len())?;
    out.push_str(src);
    Ok(out)
}
