//! Locale registry: Single source of truth for all supported locales.
//!
//! The registry is an explicitly constructed, immutable configuration object.
//! It is built once at startup and passed by reference into every resolver,
//! which keeps the routing logic testable in isolation (tests construct their
//! own registries instead of fighting a global).

/// Configuration for a supported locale.
///
/// Contains all metadata for a specific locale: its URL code, display labels,
/// formatting-locale code, fallback, and whether it's the site default.
#[derive(Debug, Clone)]
pub struct LocaleConfig {
    /// Lowercase URL/code segment (e.g., "en", "es")
    pub code: &'static str,

    /// English label of the locale (e.g., "English", "Spanish")
    pub label: &'static str,

    /// Native label of the locale (e.g., "English", "Español")
    pub native_label: &'static str,

    /// BCP-47 formatting-locale code (e.g., "en-US", "es-ES"), used for
    /// Open Graph locale fields and date formatting
    pub bcp47: &'static str,

    /// Code of the locale content falls back to when a document has no
    /// translation in this locale (None for the default locale)
    pub fallback: Option<&'static str>,

    /// Whether this is the site default locale (exactly one should be true)
    pub is_default: bool,

    /// Whether this locale is enabled for routing
    pub enabled: bool,
}

/// Immutable set of supported locales.
///
/// Every locale-accepting function reduces its input against this registry;
/// an unrecognized value never passes through.
#[derive(Debug, Clone)]
pub struct LocaleRegistry {
    locales: Vec<LocaleConfig>,
}

impl LocaleRegistry {
    /// Build a registry from an explicit locale list.
    pub fn new(locales: Vec<LocaleConfig>) -> Self {
        Self { locales }
    }

    /// The production locale set: English (default) and Spanish.
    pub fn site_default() -> Self {
        Self::new(vec![
            LocaleConfig {
                code: "en",
                label: "English",
                native_label: "English",
                bcp47: "en-US",
                fallback: None,
                is_default: true,
                enabled: true,
            },
            LocaleConfig {
                code: "es",
                label: "Spanish",
                native_label: "Español",
                bcp47: "es-ES",
                fallback: Some("en"),
                is_default: false,
                enabled: true,
            },
        ])
    }

    /// Get a locale configuration by its code.
    ///
    /// # Returns
    /// * `Some(&LocaleConfig)` if the locale exists
    /// * `None` if the locale is not found
    pub fn get_by_code(&self, code: &str) -> Option<&LocaleConfig> {
        self.locales.iter().find(|locale| locale.code == code)
    }

    /// Check if a locale code is supported and enabled.
    pub fn is_supported(&self, code: &str) -> bool {
        self.get_by_code(code)
            .map(|locale| locale.enabled)
            .unwrap_or(false)
    }

    /// Get all enabled locales.
    pub fn list_enabled(&self) -> Vec<&LocaleConfig> {
        self.locales
            .iter()
            .filter(|locale| locale.enabled)
            .collect()
    }

    /// Get the default locale configuration.
    ///
    /// # Panics
    /// Panics if no default locale is found or if multiple defaults are
    /// defined (this indicates a configuration error).
    pub fn default_locale(&self) -> &LocaleConfig {
        let defaults: Vec<_> = self
            .locales
            .iter()
            .filter(|locale| locale.is_default)
            .collect();

        match defaults.len() {
            0 => panic!("No default locale found in registry"),
            1 => defaults[0],
            _ => panic!("Multiple default locales found in registry"),
        }
    }

    /// Get the fallback locale code for a given locale, if any.
    pub fn fallback_for(&self, code: &str) -> Option<&'static str> {
        self.get_by_code(code).and_then(|locale| locale.fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_by_code_english() {
        let registry = LocaleRegistry::site_default();
        let config = registry.get_by_code("en");

        assert!(config.is_some());
        let config = config.unwrap();
        assert_eq!(config.code, "en");
        assert_eq!(config.label, "English");
        assert_eq!(config.bcp47, "en-US");
        assert!(config.is_default);
        assert!(config.enabled);
        assert!(config.fallback.is_none());
    }

    #[test]
    fn test_get_by_code_spanish() {
        let registry = LocaleRegistry::site_default();
        let config = registry.get_by_code("es");

        assert!(config.is_some());
        let config = config.unwrap();
        assert_eq!(config.code, "es");
        assert_eq!(config.native_label, "Español");
        assert_eq!(config.bcp47, "es-ES");
        assert!(!config.is_default);
        assert_eq!(config.fallback, Some("en"));
    }

    #[test]
    fn test_get_by_code_nonexistent() {
        let registry = LocaleRegistry::site_default();
        assert!(registry.get_by_code("fr").is_none());
    }

    #[test]
    fn test_is_supported() {
        let registry = LocaleRegistry::site_default();
        assert!(registry.is_supported("en"));
        assert!(registry.is_supported("es"));
        assert!(!registry.is_supported("fr"));
        assert!(!registry.is_supported(""));
    }

    #[test]
    fn test_is_supported_respects_enabled_flag() {
        let registry = LocaleRegistry::new(vec![
            LocaleConfig {
                code: "en",
                label: "English",
                native_label: "English",
                bcp47: "en-US",
                fallback: None,
                is_default: true,
                enabled: true,
            },
            LocaleConfig {
                code: "de",
                label: "German",
                native_label: "Deutsch",
                bcp47: "de-DE",
                fallback: Some("en"),
                is_default: false,
                enabled: false,
            },
        ]);

        assert!(registry.is_supported("en"));
        assert!(!registry.is_supported("de"));
    }

    #[test]
    fn test_list_enabled() {
        let registry = LocaleRegistry::site_default();
        let enabled = registry.list_enabled();

        assert_eq!(enabled.len(), 2);
        assert!(enabled.iter().any(|locale| locale.code == "en"));
        assert!(enabled.iter().any(|locale| locale.code == "es"));
    }

    #[test]
    fn test_default_locale() {
        let registry = LocaleRegistry::site_default();
        let default = registry.default_locale();

        assert_eq!(default.code, "en");
        assert!(default.is_default);
    }

    #[test]
    fn test_fallback_for() {
        let registry = LocaleRegistry::site_default();
        assert_eq!(registry.fallback_for("es"), Some("en"));
        assert_eq!(registry.fallback_for("en"), None);
        assert_eq!(registry.fallback_for("fr"), None);
    }
}
