//! Internationalization (i18n) module: locales, resolution, and URL prefixing.
//!
//! All locale-related logic lives here. The registry is the single source of
//! truth for supported locales; the `Locale` type can only represent a
//! registered locale; the path builder makes every URL locale-explicit.
//!
//! # Architecture
//!
//! - `registry`: immutable set of supported locales and their metadata,
//!   constructed once and passed into resolvers (no global singleton)
//! - `locale`: validated `Locale` type plus cookie/header resolution
//! - `paths`: locale prefixing of site paths and its inverse
//!
//! # Example
//!
//! ```rust,ignore
//! use catalog_site::i18n::{Locale, LocaleRegistry, build_localized_path};
//!
//! let registry = LocaleRegistry::site_default();
//! let locale = Locale::resolve(&registry, cookie.as_deref(), accept_language);
//! let href = build_localized_path(locale, "/blog/my-post");
//! ```

mod locale;
mod paths;
mod registry;

pub use locale::Locale;
pub use paths::{build_localized_path, normalize_path, strip_locale_prefix};
pub use registry::{LocaleConfig, LocaleRegistry};
