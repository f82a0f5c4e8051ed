//! Cache keys built from an operation name and its normalized arguments.

use std::fmt::Display;

/// Builds keys of the form `operation:arg1:arg2`. Free-text arguments are
/// trimmed and lower-cased so equivalent queries share an entry.
#[derive(Debug, Clone)]
pub struct CacheKey {
    key: String,
}

impl CacheKey {
    pub fn new(operation: &str) -> Self {
        Self {
            key: operation.to_string(),
        }
    }

    pub fn arg(mut self, value: impl Display) -> Self {
        self.key.push(':');
        self.key.push_str(&value.to_string());
        self
    }

    pub fn text(mut self, value: &str) -> Self {
        self.key.push(':');
        self.key.push_str(&value.trim().to_lowercase());
        self
    }

    pub fn build(self) -> String {
        self.key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        let key = CacheKey::new("hybrid")
            .arg(42)
            .arg(10)
            .arg(0.4)
            .text("Tfidf")
            .build();
        assert_eq!(key, "hybrid:42:10:0.4:tfidf");
    }

    #[test]
    fn test_text_is_normalized() {
        let a = CacheKey::new("search").text("  Harry Potter ").build();
        let b = CacheKey::new("search").text("harry potter").build();
        assert_eq!(a, b);
    }
}
