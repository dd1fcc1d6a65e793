//! Path builder: locale prefixing and its inverse.
//!
//! Every canonical URL on the site is locale-explicit - the prefix is applied
//! for the default locale too, so `/en/...` and `/es/...` are the only path
//! shapes that exist. The inverse accepts historical unprefixed paths and
//! degrades them to the default locale rather than erroring.

use crate::i18n::{Locale, LocaleRegistry};

/// Normalize a site-relative path: leading slash, collapsed duplicate
/// slashes, no trailing slash (except the bare root).
pub fn normalize_path(path: &str) -> String {
    let mut normalized = String::with_capacity(path.len() + 1);
    normalized.push('/');
    for segment in path.split('/').filter(|segment| !segment.is_empty()) {
        if !normalized.ends_with('/') {
            normalized.push('/');
        }
        normalized.push_str(segment);
    }
    normalized
}

/// Build a locale-prefixed path from an unprefixed one.
///
/// The bare root maps to `/{locale}` with no trailing segment; everything
/// else becomes `/{locale}{path}`.
pub fn build_localized_path(locale: Locale, path: &str) -> String {
    let normalized = normalize_path(path);
    if normalized == "/" {
        format!("/{}", locale.code())
    } else {
        format!("/{}{}", locale.code(), normalized)
    }
}

/// Split a URL path into its locale and the unprefixed remainder.
///
/// If the first segment is a supported locale, that locale is returned with
/// the rest of the path re-prefixed with `/`. Otherwise the default locale is
/// returned and the whole input is treated as the path.
pub fn strip_locale_prefix(registry: &LocaleRegistry, url_path: &str) -> (Locale, String) {
    let mut segments = url_path.split('/').filter(|segment| !segment.is_empty());

    if let Some(first) = segments.next() {
        if let Ok(locale) = Locale::from_code(registry, first) {
            let rest: Vec<&str> = segments.collect();
            let path = if rest.is_empty() {
                "/".to_string()
            } else {
                format!("/{}", rest.join("/"))
            };
            return (locale, path);
        }
    }

    (Locale::default_for(registry), normalize_path(url_path))
}
