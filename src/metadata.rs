//! Page metadata generation: canonical URL, hreflang alternates, Open Graph
//! fields, robots directives, and typed title/description fallbacks.
//!
//! This is the one place that knows the full alternates contract:
//!
//! - every page declares itself as an alternate of itself (reciprocity)
//! - `x-default` is always present
//! - the home page's `x-default` points at the bare site root with no locale
//!   segment. This is a deliberate exception to the general rule: the
//!   default-locale alternate already covers `/{default}`, and pointing
//!   `x-default` there too would declare two technically-duplicate URLs.

use crate::cms::Document;
use crate::i18n::{build_localized_path, Locale, LocaleRegistry};
use crate::routes::{resolve_href, DocType};
use std::collections::BTreeMap;
use tracing::debug;

/// Robots directive for the rendered page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Robots {
    pub index: bool,
    pub follow: bool,
}

/// An Open Graph image with resolved dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OgImage {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

/// Open Graph fields derived alongside the alternates.
#[derive(Debug, Clone)]
pub struct OpenGraph {
    /// Formatting-locale code of the current page (e.g., "en-US")
    pub locale: &'static str,
    /// Formatting-locale codes of translations in other locales
    pub alternate_locales: Vec<&'static str>,
    pub image: OgImage,
}

/// Everything a page `<head>` needs.
#[derive(Debug, Clone)]
pub struct PageMetadata {
    /// Resolved title: a real value or `None` (for the home page, where the
    /// surrounding layout supplies the default) - never an empty string
    pub title: Option<String>,
    pub description: Option<String>,
    pub canonical_url: String,
    /// hreflang alternates keyed by locale code or "x-default",
    /// values are absolute URLs
    pub alternates: BTreeMap<String, String>,
    pub open_graph: OpenGraph,
    pub robots: Robots,
}

/// Immutable environment for metadata generation, built once at startup.
#[derive(Debug, Clone)]
pub struct MetadataContext<'a> {
    pub registry: &'a LocaleRegistry,
    /// Absolute site base URL without trailing slash
    pub base_url: &'a str,
    /// Outside production every page is forced non-indexable
    pub production: bool,
    /// Log the computed alternates map per render
    pub hreflang_debug: bool,
}

/// Inputs for one page render.
#[derive(Debug, Clone)]
pub struct PageRequest<'a> {
    pub page: Option<&'a Document>,
    /// Unprefixed slug; "index" for the home page. May contain slashes for
    /// nested routes like "products/category/oilseeds".
    pub slug: &'a str,
    pub doc_type: DocType,
    pub locale: Locale,
}

/// Generate the complete metadata for a page.
pub fn generate_page_metadata(ctx: &MetadataContext<'_>, req: &PageRequest<'_>) -> PageMetadata {
    let is_home = req.slug == "index";
    let canonical_path = if is_home {
        "/".to_string()
    } else {
        format!("/{}", req.slug.trim_start_matches('/'))
    };
    let canonical_url = absolute(ctx, &build_localized_path(req.locale, &canonical_path));

    let translations: Vec<_> = req
        .page
        .map(|page| page.usable_translations())
        .unwrap_or_default();

    let default_code = ctx.registry.default_locale().code;
    let mut alternates = BTreeMap::new();

    // x-default first, so a translation entry can never shadow it
    let x_default = if is_home {
        // Deliberate: the bare domain root, not the default-locale root
        format!("{}/", ctx.base_url)
    } else if let Some(url) = translations
        .iter()
        .find(|t| t.lang.as_deref() == Some(default_code))
        .and_then(|t| translation_url(ctx, req.doc_type, t.slug.as_deref(), default_code))
    {
        url
    } else {
        // No default-locale translation: the default-locale canonical for
        // the same path keeps x-default always present
        let default_locale = Locale::default_for(ctx.registry);
        absolute(ctx, &build_localized_path(default_locale, &canonical_path))
    };
    alternates.insert("x-default".to_string(), x_default);

    let mut alternate_locales = Vec::new();
    for translation in &translations {
        let (Some(lang), Some(slug)) = (translation.lang.as_deref(), translation.slug.as_deref())
        else {
            continue;
        };
        let Some(url) = translation_url(ctx, req.doc_type, Some(slug), lang) else {
            continue;
        };
        alternates.insert(lang.to_string(), url);

        if lang != req.locale.code() {
            if let Some(config) = ctx.registry.get_by_code(lang) {
                alternate_locales.push(config.bcp47);
            }
        }
    }

    // hreflang reciprocity: the page always declares itself
    alternates
        .entry(req.locale.code().to_string())
        .or_insert_with(|| canonical_url.clone());

    if ctx.hreflang_debug {
        debug!(
            "hreflang for {} [{}]: {:?}",
            canonical_path,
            req.locale.code(),
            alternates
        );
    }

    let meta = req.page.and_then(|page| page.meta.as_ref());

    let title = meta
        .and_then(|m| m.title.clone())
        .filter(|t| !t.is_empty())
        .or_else(|| {
            req.page
                .and_then(|page| page.title.clone())
                .filter(|t| !t.is_empty())
        })
        .or_else(|| fallback_title(req.doc_type, req.slug));

    let description = meta
        .and_then(|m| m.description.clone())
        .filter(|d| !d.is_empty())
        .or_else(|| match req.doc_type {
            DocType::Product | DocType::Post => req
                .page
                .and_then(|page| page.excerpt.clone())
                .filter(|e| !e.is_empty()),
            _ => None,
        });

    let robots = if !ctx.production {
        Robots {
            index: false,
            follow: false,
        }
    } else if meta.map(|m| m.noindex).unwrap_or(false) {
        Robots {
            index: false,
            follow: true,
        }
    } else {
        Robots {
            index: true,
            follow: true,
        }
    };

    let image = match meta.and_then(|m| m.image.as_ref()) {
        Some(asset) => OgImage {
            url: asset.url.clone(),
            width: asset.width.unwrap_or(1200),
            height: asset.height.unwrap_or(630),
        },
        None => OgImage {
            url: format!(
                "{}/api/og?type={}&slug={}",
                ctx.base_url,
                req.doc_type.tag(),
                encode_query_component(req.slug)
            ),
            width: 1200,
            height: 630,
        },
    };

    PageMetadata {
        title,
        description,
        canonical_url,
        alternates,
        open_graph: OpenGraph {
            locale: req.locale.bcp47(ctx.registry),
            alternate_locales,
            image,
        },
        robots,
    }
}

/// Absolute URL for a translation's href under its own locale.
///
/// Unsupported languages yield `None` and are dropped from the alternates.
fn translation_url(
    ctx: &MetadataContext<'_>,
    doc_type: DocType,
    slug: Option<&str>,
    lang: &str,
) -> Option<String> {
    let locale = Locale::from_code(ctx.registry, lang).ok()?;
    let path = resolve_href(doc_type, slug)?;
    Some(absolute(ctx, &build_localized_path(locale, &path)))
}

fn absolute(ctx: &MetadataContext<'_>, path: &str) -> String {
    format!("{}{}", ctx.base_url, path)
}

/// Type-aware synthesized title when neither meta nor document supply one.
fn fallback_title(doc_type: DocType, slug: &str) -> Option<String> {
    if slug == "index" {
        // The surrounding layout supplies the site default
        return None;
    }
    match doc_type {
        DocType::ProductCategory => Some(format!("Category: {}", humanize_slug(slug))),
        _ => Some(humanize_slug(slug)),
    }
}

/// Turn the last path segment of a slug into a display label:
/// separators become spaces, each word is capitalized.
pub fn humanize_slug(slug: &str) -> String {
    let last_segment = slug.rsplit('/').next().unwrap_or(slug);
    last_segment
        .split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Percent-encode a query component (slugs can contain slashes).
fn encode_query_component(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char);
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}
