//! Column-name similarity based on normalized Levenshtein distance

use strsim::levenshtein;

/// Similarity between two strings, between 0.0 and 1.0 (higher = more similar).
///
/// `(max_len - distance) / max_len`, lengths counted in chars. Case-sensitive;
/// use [`name_similarity`] to compare column names.
pub fn similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }

    let distance = levenshtein(a, b);
    (max_len - distance) as f64 / max_len as f64
}

/// Case-insensitive similarity for column names
pub fn name_similarity(a: &str, b: &str) -> f64 {
    similarity(&a.to_lowercase(), &b.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_and_empty() {
        assert_eq!(similarity("", ""), 1.0);
        assert_eq!(similarity("customer_id", "customer_id"), 1.0);
    }

    #[test]
    fn test_one_side_empty() {
        assert_eq!(similarity("", "abc"), 0.0);
        assert_eq!(similarity("abc", ""), 0.0);
    }

    #[test]
    fn test_partial_similarity() {
        // kitten -> sitting is the textbook distance of 3 over 7 chars
        let score = similarity("kitten", "sitting");
        assert!((score - 4.0 / 7.0).abs() < 1e-9);

        // user_id -> uid drops "ser_" (distance 4)
        let score = similarity("user_id", "uid");
        assert!((score - 3.0 / 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_case_handling() {
        assert!(similarity("ID", "id") < 1.0);
        assert_eq!(name_similarity("ID", "id"), 1.0);
    }

    #[test]
    fn test_symmetric() {
        assert_eq!(similarity("order_id", "orderid"), similarity("orderid", "order_id"));
    }
}
