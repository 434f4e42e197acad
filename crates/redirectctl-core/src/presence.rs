// Membership tests and next-collection builders for the redirect list.
//
// Comparison is exact: no case folding, no trailing-slash normalization.
// Graph treats `https://a/cb` and `https://a/cb/` as different URIs.

/// Whether `value` occurs anywhere in `collection`.
pub fn contains(collection: &[String], value: &str) -> bool {
    collection.iter().any(|v| v == value)
}

/// `collection` with `value` appended, unless it is already present.
pub fn with_value(collection: &[String], value: &str) -> Vec<String> {
    let mut next = collection.to_vec();
    if !contains(collection, value) {
        next.push(value.to_owned());
    }
    next
}

/// `collection` with every occurrence of `value` removed. Survivors keep
/// their relative order.
pub fn without_value(collection: &[String], value: &str) -> Vec<String> {
    collection.iter().filter(|v| *v != value).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn contains_is_exact() {
        let c = list(&["https://a/cb", "https://b/cb"]);
        assert!(contains(&c, "https://b/cb"));
        assert!(!contains(&c, "https://b/cb/"));
        assert!(!contains(&c, "HTTPS://A/CB"));
        assert!(!contains(&[], "https://a/cb"));
    }

    #[test]
    fn with_value_appends_once() {
        let c = list(&["https://a/cb"]);
        assert_eq!(
            with_value(&c, "https://b/cb"),
            list(&["https://a/cb", "https://b/cb"])
        );
        assert_eq!(with_value(&c, "https://a/cb"), c);
    }

    #[test]
    fn without_value_keeps_order_and_drops_duplicates() {
        let c = list(&["https://a/cb", "https://x/cb", "https://b/cb", "https://x/cb"]);
        assert_eq!(
            without_value(&c, "https://x/cb"),
            list(&["https://a/cb", "https://b/cb"])
        );
        assert_eq!(without_value(&c, "https://missing/cb"), c);
    }
}
