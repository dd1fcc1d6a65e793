//! Sitemap emission: one XML sitemap aggregating all locales and types.
//!
//! Static routes are emitted once per supported locale regardless of CMS
//! content. Each published, non-noindexed document contributes exactly one
//! entry under its own recorded language - entries are never synthesized for
//! locales a document doesn't have.

use crate::cms::Document;
use crate::i18n::{build_localized_path, Locale, LocaleRegistry};
use crate::routes::resolve_href_for_tag;
use chrono::{DateTime, SecondsFormat, Utc};

/// One `<url>` element of the sitemap.
#[derive(Debug, Clone, PartialEq)]
pub struct SitemapEntry {
    pub loc: String,
    pub lastmod: Option<DateTime<Utc>>,
    pub changefreq: &'static str,
    pub priority: f32,
}

/// Static routes present for every locale: (unprefixed path, changefreq,
/// priority).
const STATIC_ROUTES: &[(&str, &str, f32)] = &[
    ("/", "weekly", 1.0),
    ("/blog", "daily", 0.8),
    ("/products", "weekly", 0.9),
    ("/contact", "yearly", 0.5),
];

/// Per-type cadence for document entries.
fn document_cadence(doc_type: &str) -> (&'static str, f32) {
    match doc_type {
        "post" => ("monthly", 0.6),
        "product" => ("weekly", 0.8),
        "productCategory" | "blogCategory" | "category" | "postCategory" => ("weekly", 0.5),
        _ => ("monthly", 0.7),
    }
}

/// Compute the full entry list for the site.
pub fn build_sitemap_entries(
    registry: &LocaleRegistry,
    base_url: &str,
    documents: &[Document],
    generated_at: DateTime<Utc>,
) -> Vec<SitemapEntry> {
    let mut entries = Vec::new();

    for locale_config in registry.list_enabled() {
        let locale = Locale::normalize(registry, Some(locale_config.code));
        for (path, changefreq, priority) in STATIC_ROUTES {
            entries.push(SitemapEntry {
                loc: format!("{}{}", base_url, build_localized_path(locale, path)),
                lastmod: Some(generated_at),
                changefreq,
                priority: *priority,
            });
        }
    }

    for document in documents {
        if document.is_noindexed() {
            continue;
        }
        let Some(slug) = document.slug_str() else {
            continue;
        };

        // The document's own language picks its one locale; documents in a
        // language the registry doesn't know are left out rather than filed
        // under a wrong locale
        let locale = match document.language.as_deref() {
            Some(code) => match Locale::from_code(registry, code) {
                Ok(locale) => locale,
                Err(_) => continue,
            },
            None => Locale::default_for(registry),
        };

        let Some(path) = resolve_href_for_tag(&document.doc_type, Some(slug)) else {
            continue;
        };

        // The static route set already covers each locale root
        if path == "/" {
            continue;
        }

        let (changefreq, priority) = document_cadence(&document.doc_type);
        entries.push(SitemapEntry {
            loc: format!("{}{}", base_url, build_localized_path(locale, &path)),
            lastmod: document.updated_at.or_else(|| document.published_or_created()),
            changefreq,
            priority,
        });
    }

    entries
}

/// Render entries as sitemap XML.
pub fn render_sitemap_xml(entries: &[SitemapEntry]) -> String {
    let mut xml = String::with_capacity(entries.len() * 160 + 128);
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    xml.push('\n');
    xml.push_str(r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#);
    xml.push('\n');

    for entry in entries {
        xml.push_str("  <url>\n");
        xml.push_str(&format!("    <loc>{}</loc>\n", escape_xml(&entry.loc)));
        if let Some(lastmod) = entry.lastmod {
            xml.push_str(&format!(
                "    <lastmod>{}</lastmod>\n",
                lastmod.to_rfc3339_opts(SecondsFormat::Secs, true)
            ));
        }
        xml.push_str(&format!(
            "    <changefreq>{}</changefreq>\n",
            entry.changefreq
        ));
        xml.push_str(&format!("    <priority>{:.1}</priority>\n", entry.priority));
        xml.push_str("  </url>\n");
    }

    xml.push_str("</urlset>\n");
    xml
}

fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('\'', "&apos;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::SlugValue;
    use chrono::TimeZone;

    fn registry() -> LocaleRegistry {
        LocaleRegistry::site_default()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    fn doc(doc_type: &str, slug: &str, language: &str) -> Document {
        Document {
            doc_type: doc_type.to_string(),
            title: None,
            slug: Some(SlugValue::Text(slug.to_string())),
            language: Some(language.to_string()),
            excerpt: None,
            body_html: None,
            published_at: Some(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()),
            created_at: None,
            updated_at: None,
            meta: None,
            all_translations: Vec::new(),
            category_slugs: Vec::new(),
        }
    }

    // ==================== Entry Computation Tests ====================

    #[test]
    fn test_static_routes_per_locale() {
        let registry = registry();
        let entries = build_sitemap_entries(&registry, "https://example.com", &[], now());

        // 4 static routes x 2 locales
        assert_eq!(entries.len(), 8);
        assert!(entries.iter().any(|e| e.loc == "https://example.com/en"));
        assert!(entries.iter().any(|e| e.loc == "https://example.com/es"));
        assert!(entries
            .iter()
            .any(|e| e.loc == "https://example.com/en/blog"));
        assert!(entries
            .iter()
            .any(|e| e.loc == "https://example.com/es/contact"));
    }

    #[test]
    fn test_document_entry_under_its_own_language_only() {
        let registry = registry();
        let documents = vec![doc("post", "informe-de-cosecha", "es")];
        let entries =
            build_sitemap_entries(&registry, "https://example.com", &documents, now());

        let post_entries: Vec<_> = entries
            .iter()
            .filter(|e| e.loc.contains("informe-de-cosecha"))
            .collect();
        assert_eq!(post_entries.len(), 1);
        assert_eq!(
            post_entries[0].loc,
            "https://example.com/es/blog/informe-de-cosecha"
        );
    }

    #[test]
    fn test_noindexed_documents_are_excluded() {
        let registry = registry();
        let mut hidden = doc("post", "secret", "en");
        hidden.meta = Some(crate::cms::PageMeta {
            noindex: true,
            ..Default::default()
        });

        let entries =
            build_sitemap_entries(&registry, "https://example.com", &[hidden], now());
        assert!(!entries.iter().any(|e| e.loc.contains("secret")));
    }

    #[test]
    fn test_unsupported_language_documents_are_excluded() {
        let registry = registry();
        let entries = build_sitemap_entries(
            &registry,
            "https://example.com",
            &[doc("post", "rapport", "fr")],
            now(),
        );
        assert!(!entries.iter().any(|e| e.loc.contains("rapport")));
    }

    #[test]
    fn test_index_slug_maps_to_root_and_is_deduplicated() {
        let registry = registry();
        let entries = build_sitemap_entries(
            &registry,
            "https://example.com",
            &[doc("page", "index", "en")],
            now(),
        );

        // The static set already has /en; the index document must not add a
        // second copy
        let roots: Vec<_> = entries
            .iter()
            .filter(|e| e.loc == "https://example.com/en")
            .collect();
        assert_eq!(roots.len(), 1);
    }

    #[test]
    fn test_unknown_type_is_skipped() {
        let registry = registry();
        let entries = build_sitemap_entries(
            &registry,
            "https://example.com",
            &[doc("author", "jane", "en")],
            now(),
        );
        assert!(!entries.iter().any(|e| e.loc.contains("jane")));
    }

    #[test]
    fn test_document_cadence_by_type() {
        let registry = registry();
        let entries = build_sitemap_entries(
            &registry,
            "https://example.com",
            &[doc("product", "soybeans", "en")],
            now(),
        );
        let product = entries
            .iter()
            .find(|e| e.loc.contains("soybeans"))
            .expect("product entry");
        assert_eq!(product.changefreq, "weekly");
        assert_eq!(product.priority, 0.8);
    }

    // ==================== XML Rendering Tests ====================

    #[test]
    fn test_render_sitemap_xml() {
        let entries = vec![SitemapEntry {
            loc: "https://example.com/en/blog/a&b".to_string(),
            lastmod: Some(now()),
            changefreq: "monthly",
            priority: 0.6,
        }];
        let xml = render_sitemap_xml(&entries);

        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains("<loc>https://example.com/en/blog/a&amp;b</loc>"));
        assert!(xml.contains("<lastmod>2024-06-01T00:00:00Z</lastmod>"));
        assert!(xml.contains("<changefreq>monthly</changefreq>"));
        assert!(xml.contains("<priority>0.6</priority>"));
        assert!(xml.ends_with("</urlset>\n"));
    }

    #[test]
    fn test_render_sitemap_xml_without_lastmod() {
        let entries = vec![SitemapEntry {
            loc: "https://example.com/en".to_string(),
            lastmod: None,
            changefreq: "weekly",
            priority: 1.0,
        }];
        let xml = render_sitemap_xml(&entries);
        assert!(!xml.contains("<lastmod>"));
    }
}
