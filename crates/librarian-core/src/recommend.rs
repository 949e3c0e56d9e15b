use crate::error::LibrarianError;
use crate::Result;

/// Picks the store with the most free space able to hold `requested_size`
/// bytes, from a caller-gathered `(store_name, free_bytes)` list. Grounded
/// on the original `recommended_store` endpoint: iterate enabled/available
/// stores, take the one with the largest free space that still fits.
pub fn recommend_store(candidates: &[(String, u64)], requested_size: u64) -> Result<String> {
    candidates
        .iter()
        .filter(|(_, free)| *free >= requested_size)
        .max_by_key(|(_, free)| *free)
        .map(|(name, _)| name.clone())
        .ok_or_else(|| {
            let largest_free = candidates.iter().map(|(_, free)| *free).max().unwrap_or(0);
            LibrarianError::NoStoreAvailable {
                requested: requested_size,
                largest_free,
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_the_largest_store_that_fits() {
        let candidates = vec![("small".to_string(), 50), ("large".to_string(), 200)];

        assert_eq!(recommend_store(&candidates, 150).unwrap(), "large");
    }

    #[test]
    fn errors_when_nothing_fits() {
        let candidates = vec![("small".to_string(), 50), ("large".to_string(), 200)];

        let err = recommend_store(&candidates, 250).unwrap_err();
        assert!(matches!(
            err,
            LibrarianError::NoStoreAvailable {
                requested: 250,
                largest_free: 200
            }
        ));
    }
}
