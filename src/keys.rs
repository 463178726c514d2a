//! Deterministic cache key derivation.
//!
//! A translation is cached under a key derived from the original text and the
//! target language code. The same (text, language) pair always lands on the
//! same key, so repeated lookups hit the same record. Context tags do not
//! participate in the key at all: two requests for the same text in different
//! UI locations share one cache entry.

/// Separator between the trimmed text and the language code before hashing.
const KEY_SEPARATOR: &str = "_";

/// Derive the cache key for a (text, language) pair.
///
/// The text is trimmed first, so `" Welcome "` and `"Welcome"` share a key.
/// No security property is required here, only determinism and a negligible
/// collision probability.
pub fn derive_key(text: &str, language_code: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(text.trim().as_bytes());
    hasher.update(KEY_SEPARATOR.as_bytes());
    hasher.update(language_code.as_bytes());
    hasher.finalize().to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_derive_key_deterministic() {
        let a = derive_key("Welcome", "es");
        let b = derive_key("Welcome", "es");
        assert_eq!(a, b);
    }

    #[test]
    fn test_derive_key_trims_text() {
        assert_eq!(derive_key("  Welcome  ", "es"), derive_key("Welcome", "es"));
        assert_eq!(derive_key("\tWelcome\n", "es"), derive_key("Welcome", "es"));
    }

    #[test]
    fn test_derive_key_differs_per_language() {
        assert_ne!(derive_key("Welcome", "es"), derive_key("Welcome", "fr"));
    }

    #[test]
    fn test_derive_key_differs_per_text() {
        assert_ne!(derive_key("Welcome", "es"), derive_key("Goodbye", "es"));
    }

    #[test]
    fn test_derive_key_is_hex() {
        let key = derive_key("Welcome", "es");
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_derive_key_interior_whitespace_preserved() {
        // Only leading/trailing whitespace is normalized.
        assert_ne!(derive_key("a b", "es"), derive_key("ab", "es"));
    }

    proptest! {
        #[test]
        fn prop_trim_equivalence(text in ".{0,200}", code in "[a-z]{2}") {
            prop_assert_eq!(
                derive_key(&text, &code),
                derive_key(text.trim(), &code)
            );
        }

        #[test]
        fn prop_idempotent(text in ".{0,200}", code in "[a-z]{2}") {
            prop_assert_eq!(derive_key(&text, &code), derive_key(&text, &code));
        }
    }
}
