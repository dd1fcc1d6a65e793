//! Document-type href resolution and generic link resolution.
//!
//! Each CMS document type maps to exactly one path-shape rule. The raw
//! resolver returns the *unprefixed* path; locale composition is layered on
//! top via the path builder, so callers choose explicitly whether they want a
//! bare or locale-prefixed href.

use crate::i18n::{build_localized_path, Locale};
use serde::Deserialize;

/// A content kind that determines URL shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocType {
    Page,
    Post,
    Product,
    ProductCategory,
    BlogCategory,
    Contact,
}

impl DocType {
    /// Map a CMS `_type` tag to a document type.
    ///
    /// Accepts the legacy aliases still present in older documents
    /// ("category" and "postCategory" both predate "blogCategory").
    /// Unknown tags return `None`.
    pub fn from_tag(tag: &str) -> Option<DocType> {
        match tag {
            "page" => Some(DocType::Page),
            "post" => Some(DocType::Post),
            "product" => Some(DocType::Product),
            "productCategory" | "product-category" => Some(DocType::ProductCategory),
            "blogCategory" | "blog-category" | "category" | "postCategory" => {
                Some(DocType::BlogCategory)
            }
            "contact" => Some(DocType::Contact),
            _ => None,
        }
    }

    /// The CMS `_type` tag for this document type.
    pub fn tag(&self) -> &'static str {
        match self {
            DocType::Page => "page",
            DocType::Post => "post",
            DocType::Product => "product",
            DocType::ProductCategory => "productCategory",
            DocType::BlogCategory => "blogCategory",
            DocType::Contact => "contact",
        }
    }
}

/// Slugs that all mean "the home page".
fn is_home_slug(slug: &str) -> bool {
    slug.is_empty() || slug == "index" || slug == "home"
}

/// Resolve the canonical unprefixed path for a document type and slug.
///
/// A leading slash on the slug is stripped before composition, so "/foo" and
/// "foo" behave identically. Types that require a slug resolve to `None`
/// without one - callers render that as an absent affordance, never a broken
/// link.
pub fn resolve_href(doc_type: DocType, slug: Option<&str>) -> Option<String> {
    let slug = slug.map(|s| s.trim_start_matches('/'));

    match doc_type {
        DocType::Page => match slug {
            Some(s) if !is_home_slug(s) => Some(format!("/{}", s)),
            _ => Some("/".to_string()),
        },
        DocType::Post => slug
            .filter(|s| !s.is_empty())
            .map(|s| format!("/blog/{}", s)),
        DocType::Product => slug
            .filter(|s| !s.is_empty())
            .map(|s| format!("/products/{}", s)),
        DocType::ProductCategory => slug
            .filter(|s| !s.is_empty())
            .map(|s| format!("/products/category/{}", s)),
        DocType::BlogCategory => slug
            .filter(|s| !s.is_empty())
            .map(|s| format!("/blog/category/{}", s)),
        // Contact ignores the slug entirely
        DocType::Contact => Some("/contact".to_string()),
    }
}

/// Resolve an unprefixed path for a raw `_type` tag; unknown tags yield `None`.
pub fn resolve_href_for_tag(tag: &str, slug: Option<&str>) -> Option<String> {
    DocType::from_tag(tag).and_then(|doc_type| resolve_href(doc_type, slug))
}

/// Resolve a locale-prefixed path for a document type and slug.
pub fn resolve_localized_href(
    doc_type: DocType,
    slug: Option<&str>,
    locale: Locale,
) -> Option<String> {
    resolve_href(doc_type, slug).map(|path| build_localized_path(locale, &path))
}

/// A slug as the CMS serializes it: either a plain string or a `{current}`
/// object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SlugValue {
    Text(String),
    Object { current: Option<String> },
}

impl SlugValue {
    /// Extract the slug string, if one is present and non-empty.
    pub fn as_str(&self) -> Option<&str> {
        let slug = match self {
            SlugValue::Text(s) => Some(s.as_str()),
            SlugValue::Object { current } => current.as_deref(),
        };
        slug.filter(|s| !s.is_empty())
    }
}

/// A generic document reference (`_type` + slug) as fetched from the CMS.
#[derive(Debug, Clone, Deserialize)]
pub struct DocRef {
    #[serde(rename = "_type")]
    pub doc_type: String,
    #[serde(default)]
    pub slug: Option<SlugValue>,
}

impl DocRef {
    /// Resolve this reference to a locale-prefixed href.
    pub fn resolve(&self, locale: Locale) -> Option<String> {
        let slug = self.slug.as_ref().and_then(|s| s.as_str());
        DocType::from_tag(&self.doc_type)
            .and_then(|doc_type| resolve_localized_href(doc_type, slug, locale))
    }
}

/// A generic link value: external URL or internal document reference.
///
/// Exactly one branch supplies the usable href; resolution never fabricates
/// one when required fields are missing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkValue {
    #[serde(default)]
    pub is_external: bool,
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub internal_type: Option<String>,
    #[serde(default)]
    pub internal_slug: Option<String>,
}

/// Resolve a link to a usable href.
///
/// External links are returned verbatim - never locale-prefixed or otherwise
/// transformed. Internal links go through the document-type resolver and come
/// back locale-composed. Legacy records carrying only a bare `href` fall back
/// to it. A missing link resolves to `None` immediately.
pub fn resolve_link_href(link: Option<&LinkValue>, locale: Locale) -> Option<String> {
    let link = link?;

    if link.is_external {
        return link.href.clone();
    }

    if let Some(tag) = link.internal_type.as_deref() {
        let resolved = DocType::from_tag(tag).and_then(|doc_type| {
            resolve_localized_href(doc_type, link.internal_slug.as_deref(), locale)
        });
        if resolved.is_some() {
            return resolved;
        }
    }

    link.href.clone()
}
