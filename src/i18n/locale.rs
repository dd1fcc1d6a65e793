//! Locale type: validated locale representation plus request-time resolution.
//!
//! A `Locale` can only be constructed from a code the registry knows, so every
//! downstream consumer (path builder, href resolver, metadata builder) can
//! trust the value without re-checking. Resolution from raw request inputs
//! (URL segment, cookie, `Accept-Language` header) always reduces to a
//! supported locale or the default - never to the raw input.

use crate::i18n::{LocaleConfig, LocaleRegistry};
use anyhow::{bail, Result};

/// A validated locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Locale {
    /// Lowercase locale code (e.g., "en", "es")
    code: &'static str,
}

impl Locale {
    /// Create a Locale from a code string, validating against the registry.
    ///
    /// # Returns
    /// * `Ok(Locale)` if the code is supported and enabled
    /// * `Err` if the code is unknown or the locale is disabled
    pub fn from_code(registry: &LocaleRegistry, code: &str) -> Result<Locale> {
        match registry.get_by_code(code) {
            Some(config) if config.enabled => Ok(Locale { code: config.code }),
            Some(_) => bail!("Locale '{}' is not enabled", code),
            None => bail!("Unknown locale code: '{}'", code),
        }
    }

    /// Reduce a raw locale token to a supported locale or the default.
    ///
    /// Absence of input is a normal case, not an error: `None`, empty strings,
    /// and unrecognized values all resolve to the default locale.
    pub fn normalize(registry: &LocaleRegistry, raw: Option<&str>) -> Locale {
        raw.and_then(|code| Locale::from_code(registry, code).ok())
            .unwrap_or_else(|| Locale::default_for(registry))
    }

    /// The site default locale.
    pub fn default_for(registry: &LocaleRegistry) -> Locale {
        Locale {
            code: registry.default_locale().code,
        }
    }

    /// Resolve a locale from an `Accept-Language` header value.
    ///
    /// Splits on commas, strips quality-value suffixes, lowercases, and for
    /// each entry tries an exact match before falling back to the primary
    /// subtag ("en-US" -> "en-us" -> "en"). Returns `None` when no entry
    /// matches a supported locale.
    pub fn from_accept_language(registry: &LocaleRegistry, header: &str) -> Option<Locale> {
        for part in header.split(',') {
            let tag = part
                .split(';')
                .next()
                .unwrap_or("")
                .trim()
                .to_ascii_lowercase();
            if tag.is_empty() {
                continue;
            }

            if let Ok(locale) = Locale::from_code(registry, &tag) {
                return Some(locale);
            }

            // "en-us" -> "en"
            if let Some(primary) = tag.split('-').next() {
                if let Ok(locale) = Locale::from_code(registry, primary) {
                    return Some(locale);
                }
            }
        }
        None
    }

    /// Resolve the request locale from persisted and negotiated sources.
    ///
    /// Precedence: explicit cookie value wins over `Accept-Language` header,
    /// which wins over the site default.
    pub fn resolve(
        registry: &LocaleRegistry,
        cookie: Option<&str>,
        accept_language: Option<&str>,
    ) -> Locale {
        if let Some(value) = cookie {
            if let Ok(locale) = Locale::from_code(registry, value.trim()) {
                return locale;
            }
        }

        if let Some(header) = accept_language {
            if let Some(locale) = Locale::from_accept_language(registry, header) {
                return locale;
            }
        }

        Locale::default_for(registry)
    }

    /// Get the lowercase locale code.
    pub fn code(&self) -> &'static str {
        self.code
    }

    /// Get the full locale configuration from the registry.
    ///
    /// # Panics
    /// Panics if the code is not in the registry. This cannot happen for a
    /// Locale constructed through `from_code`/`normalize` against the same
    /// registry.
    pub fn config<'a>(&self, registry: &'a LocaleRegistry) -> &'a LocaleConfig {
        registry
            .get_by_code(self.code)
            .expect("Locale code should always be valid")
    }

    /// BCP-47 formatting-locale code (e.g., "en-US").
    pub fn bcp47(&self, registry: &LocaleRegistry) -> &'static str {
        self.config(registry).bcp47
    }

    /// Whether this is the site default locale.
    pub fn is_default(&self, registry: &LocaleRegistry) -> bool {
        self.config(registry).is_default
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> LocaleRegistry {
        LocaleRegistry::site_default()
    }

    // ==================== from_code Tests ====================

    #[test]
    fn test_from_code_supported() {
        let registry = registry();
        let locale = Locale::from_code(&registry, "es").expect("should succeed");
        assert_eq!(locale.code(), "es");
    }

    #[test]
    fn test_from_code_unknown() {
        let registry = registry();
        let result = Locale::from_code(&registry, "fr");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Unknown"));
    }

    #[test]
    fn test_from_code_empty() {
        let registry = registry();
        assert!(Locale::from_code(&registry, "").is_err());
    }

    // ==================== normalize Tests ====================

    #[test]
    fn test_normalize_supported_passes_through() {
        let registry = registry();
        assert_eq!(Locale::normalize(&registry, Some("es")).code(), "es");
        assert_eq!(Locale::normalize(&registry, Some("en")).code(), "en");
    }

    #[test]
    fn test_normalize_unsupported_returns_default() {
        let registry = registry();
        assert_eq!(Locale::normalize(&registry, Some("fr")).code(), "en");
        assert_eq!(Locale::normalize(&registry, Some("xx")).code(), "en");
        assert_eq!(Locale::normalize(&registry, Some("")).code(), "en");
    }

    #[test]
    fn test_normalize_absent_returns_default() {
        let registry = registry();
        assert_eq!(Locale::normalize(&registry, None).code(), "en");
    }

    // ==================== Accept-Language Tests ====================

    #[test]
    fn test_accept_language_exact_match() {
        let registry = registry();
        let locale = Locale::from_accept_language(&registry, "es");
        assert_eq!(locale.map(|l| l.code()), Some("es"));
    }

    #[test]
    fn test_accept_language_region_falls_back_to_primary() {
        let registry = registry();
        let locale = Locale::from_accept_language(&registry, "es-MX,en;q=0.8");
        assert_eq!(locale.map(|l| l.code()), Some("es"));
    }

    #[test]
    fn test_accept_language_quality_values_stripped() {
        let registry = registry();
        let locale = Locale::from_accept_language(&registry, "fr;q=0.9, es;q=0.8, en;q=0.7");
        // "fr" is unsupported, so the next entry wins
        assert_eq!(locale.map(|l| l.code()), Some("es"));
    }

    #[test]
    fn test_accept_language_case_insensitive() {
        let registry = registry();
        let locale = Locale::from_accept_language(&registry, "ES-es");
        assert_eq!(locale.map(|l| l.code()), Some("es"));
    }

    #[test]
    fn test_accept_language_no_match() {
        let registry = registry();
        assert!(Locale::from_accept_language(&registry, "fr-FR, de").is_none());
        assert!(Locale::from_accept_language(&registry, "").is_none());
    }

    // ==================== resolve Precedence Tests ====================

    #[test]
    fn test_resolve_cookie_wins_over_header() {
        let registry = registry();
        let locale = Locale::resolve(&registry, Some("es"), Some("en"));
        assert_eq!(locale.code(), "es");
    }

    #[test]
    fn test_resolve_invalid_cookie_falls_through_to_header() {
        let registry = registry();
        let locale = Locale::resolve(&registry, Some("fr"), Some("es-AR"));
        assert_eq!(locale.code(), "es");
    }

    #[test]
    fn test_resolve_defaults_without_sources() {
        let registry = registry();
        let locale = Locale::resolve(&registry, None, None);
        assert_eq!(locale.code(), "en");
    }

    #[test]
    fn test_resolve_header_only() {
        let registry = registry();
        let locale = Locale::resolve(&registry, None, Some("es-ES,es;q=0.9"));
        assert_eq!(locale.code(), "es");
    }

    // ==================== Trait Tests ====================

    #[test]
    fn test_locale_display() {
        let registry = registry();
        let locale = Locale::normalize(&registry, Some("es"));
        assert_eq!(locale.to_string(), "es");
    }

    #[test]
    fn test_locale_copy_and_eq() {
        let registry = registry();
        let a = Locale::normalize(&registry, Some("en"));
        let b = a;
        assert_eq!(a, b);
    }

    #[test]
    fn test_config_access() {
        let registry = registry();
        let locale = Locale::normalize(&registry, Some("es"));
        assert_eq!(locale.bcp47(&registry), "es-ES");
        assert!(!locale.is_default(&registry));
        assert!(Locale::default_for(&registry).is_default(&registry));
    }
}
