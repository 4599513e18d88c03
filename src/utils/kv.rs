//! `key=value` pair parsing with consistent error handling.

use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// Parse repeated `key=value` flags into a map. Later duplicates win, so a
/// user-supplied property overrides a default with the same key.
pub fn parse_pairs(pairs: &[String]) -> Result<BTreeMap<String, String>> {
    let mut map = BTreeMap::new();

    for pair in pairs {
        let (key, value) = pair.split_once('=').ok_or_else(|| {
            Error::validation_invalid_argument(
                "property",
                format!("Expected key=value, got '{}'", pair),
                Some(pair.clone()),
            )
        })?;

        if key.is_empty() {
            return Err(Error::validation_invalid_argument(
                "property",
                format!("Empty key in '{}'", pair),
                Some(pair.clone()),
            ));
        }

        map.insert(key.to_string(), value.to_string());
    }

    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_simple_pairs() {
        let map = parse_pairs(&pairs(&["priority=50", "force_rebuild=true"])).unwrap();
        assert_eq!(map.get("priority").unwrap(), "50");
        assert_eq!(map.get("force_rebuild").unwrap(), "true");
    }

    #[test]
    fn value_may_contain_equals() {
        let map = parse_pairs(&pairs(&["extra=a=b"])).unwrap();
        assert_eq!(map.get("extra").unwrap(), "a=b");
    }

    #[test]
    fn later_duplicate_wins() {
        let map = parse_pairs(&pairs(&["priority=50", "priority=10"])).unwrap();
        assert_eq!(map.get("priority").unwrap(), "10");
    }

    #[test]
    fn missing_separator_is_rejected() {
        assert!(parse_pairs(&pairs(&["oops"])).is_err());
    }

    #[test]
    fn empty_key_is_rejected() {
        assert!(parse_pairs(&pairs(&["=value"])).is_err());
    }
}
