//! CMS fetch layer: typed HTTP client for the headless CMS query API.
//!
//! Documents are fetched per request and discarded after response generation;
//! the CMS owns all persistent state. Queries are GROQ strings sent to the
//! Sanity-style `/data/query/{dataset}` endpoint, responses arrive wrapped in
//! a `{"result": ...}` envelope.

use crate::config::Config;
use crate::i18n::Locale;
use crate::routes::{DocType, LinkValue, SlugValue};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use futures::future;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::warn;

/// One document's sibling in another locale.
///
/// Entries with a missing lang or slug are filtered out before use.
#[derive(Debug, Clone, Deserialize)]
pub struct Translation {
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
}

impl Translation {
    /// Both fields present and non-empty.
    pub fn is_usable(&self) -> bool {
        matches!((self.lang.as_deref(), self.slug.as_deref()),
            (Some(lang), Some(slug)) if !lang.is_empty() && !slug.is_empty())
    }
}

/// An uploaded image asset with optional recorded dimensions.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageAsset {
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

/// Per-document SEO metadata as authored in the CMS.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub noindex: bool,
    #[serde(default)]
    pub image: Option<ImageAsset>,
}

/// A CMS document in the shape every page-rendering path consumes.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(rename = "_type")]
    pub doc_type: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub slug: Option<SlugValue>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub body_html: Option<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "_createdAt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "_updatedAt")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub meta: Option<PageMeta>,
    #[serde(default)]
    pub all_translations: Vec<Translation>,
    #[serde(default)]
    pub category_slugs: Vec<String>,
}

impl Document {
    /// The document's slug string, if any.
    pub fn slug_str(&self) -> Option<&str> {
        self.slug.as_ref().and_then(|s| s.as_str())
    }

    /// Translations usable for hreflang alternates (both fields present).
    pub fn usable_translations(&self) -> Vec<&Translation> {
        self.all_translations
            .iter()
            .filter(|t| t.is_usable())
            .collect()
    }

    /// Published timestamp, falling back to creation time.
    ///
    /// Feeds and sitemaps order by this coalesced value.
    pub fn published_or_created(&self) -> Option<DateTime<Utc>> {
        self.published_at.or(self.created_at)
    }

    /// Whether the document opted out of indexing.
    pub fn is_noindexed(&self) -> bool {
        self.meta.as_ref().map(|m| m.noindex).unwrap_or(false)
    }
}

/// Site-wide settings document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub site_title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// One entry in the site navigation.
#[derive(Debug, Clone, Deserialize)]
pub struct NavItem {
    pub label: String,
    #[serde(default)]
    pub link: Option<LinkValue>,
}

/// The navigation document: an ordered list of links.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Navigation {
    #[serde(default)]
    pub items: Vec<NavItem>,
}

/// Query response envelope.
#[derive(Debug, Deserialize)]
struct QueryResponse<T> {
    result: Option<T>,
}

/// HTTP client for the CMS query API.
#[derive(Debug, Clone)]
pub struct CmsClient {
    http: reqwest::Client,
    query_url: String,
    token: Option<String>,
}

/// Projection shared by every document query, mapping CMS fields onto the
/// `Document` shape (slug flattened, body pre-rendered to HTML, sibling
/// translations joined from the translation metadata record).
const DOCUMENT_PROJECTION: &str = r#"{
  _type, title, "slug": slug.current, language, excerpt,
  "bodyHtml": pt::text(body), publishedAt, _createdAt, _updatedAt,
  meta{title, description, noindex, image{"url": asset->url, "width": asset->metadata.dimensions.width, "height": asset->metadata.dimensions.height}},
  "allTranslations": *[_type == "translation.metadata" && references(^._id)][0].translations[]{"lang": _key, "slug": value->slug.current},
  "categorySlugs": categories[]->slug.current
}"#;

impl CmsClient {
    pub fn new(config: &Config) -> Result<Self> {
        Self::from_parts(
            &config.cms_api_url,
            &config.cms_dataset,
            config.cms_api_token.clone(),
        )
    }

    /// Build a client from raw connection parts (used by diagnostic bins
    /// that don't need the full server configuration).
    pub fn from_parts(api_url: &str, dataset: &str, token: Option<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("Failed to build CMS HTTP client")?;

        Ok(Self {
            http,
            query_url: format!("{}/v2021-10-21/data/query/{}", api_url, dataset),
            token,
        })
    }

    /// Run a GROQ query and deserialize the `result` field.
    async fn query<T: DeserializeOwned>(&self, groq: &str) -> Result<Option<T>> {
        let mut request = self.http.get(&self.query_url).query(&[("query", groq)]);

        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .context("Failed to send query to CMS")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("CMS query failed: HTTP {}", status);
        }

        let envelope: QueryResponse<T> = response
            .json()
            .await
            .context("Failed to parse CMS query response")?;

        Ok(envelope.result)
    }

    /// Fetch a single document by type, slug, and locale.
    ///
    /// `None` means the document doesn't exist - an expected, common outcome
    /// that handlers surface as a standard 404.
    pub async fn fetch_document(
        &self,
        doc_type: DocType,
        slug: &str,
        locale: Locale,
    ) -> Result<Option<Document>> {
        let groq = format!(
            r#"*[_type == "{}" && slug.current == "{}" && language == "{}"][0]{}"#,
            doc_type.tag(),
            escape_groq_string(slug),
            locale.code(),
            DOCUMENT_PROJECTION
        );
        self.query(&groq).await
    }

    /// Fetch the site settings for a locale, degrading to defaults when the
    /// settings document is absent.
    pub async fn fetch_settings(&self, locale: Locale) -> Result<Settings> {
        let groq = format!(
            r#"*[_type == "settings" && language == "{}"][0]{{siteTitle, description}}"#,
            locale.code()
        );
        Ok(self.query(&groq).await?.unwrap_or_default())
    }

    /// Fetch the navigation for a locale, degrading to an empty list.
    pub async fn fetch_navigation(&self, locale: Locale) -> Result<Navigation> {
        let groq = format!(
            r#"*[_type == "navigation" && language == "{}"][0]{{items[]{{label, link}}}}"#,
            locale.code()
        );
        Ok(self.query(&groq).await?.unwrap_or_default())
    }

    /// Fetch all published documents of one type, newest first.
    pub async fn fetch_published(&self, doc_type: DocType) -> Result<Vec<Document>> {
        let groq = format!(
            r#"*[_type == "{}" && defined(slug.current) && !(_id in path("drafts.**"))] | order(coalesce(publishedAt, _createdAt) desc){}"#,
            doc_type.tag(),
            DOCUMENT_PROJECTION
        );
        Ok(self.query(&groq).await?.unwrap_or_default())
    }

    /// Fetch every published document across all sitemap-relevant types.
    ///
    /// The per-type queries are independent, so they are issued concurrently
    /// and awaited together.
    pub async fn fetch_all_published(&self) -> Result<Vec<Document>> {
        let types = [
            DocType::Page,
            DocType::Post,
            DocType::Product,
            DocType::ProductCategory,
            DocType::BlogCategory,
        ];
        let results =
            future::try_join_all(types.iter().map(|doc_type| self.fetch_published(*doc_type)))
                .await?;
        Ok(results.into_iter().flatten().collect())
    }

    /// Fetch published posts for a locale, optionally scoped to a category.
    pub async fn fetch_posts(
        &self,
        locale: Locale,
        category: Option<&str>,
    ) -> Result<Vec<Document>> {
        let category_filter = match category {
            Some(slug) => format!(
                r#" && "{}" in categories[]->slug.current"#,
                escape_groq_string(slug)
            ),
            None => String::new(),
        };
        let groq = format!(
            r#"*[_type == "post" && language == "{}" && defined(slug.current){}] | order(coalesce(publishedAt, _createdAt) desc){}"#,
            locale.code(),
            category_filter,
            DOCUMENT_PROJECTION
        );
        Ok(self.query(&groq).await?.unwrap_or_default())
    }

    /// Fetch published products for a locale, optionally scoped to a category.
    pub async fn fetch_products(
        &self,
        locale: Locale,
        category: Option<&str>,
    ) -> Result<Vec<Document>> {
        let category_filter = match category {
            Some(slug) => format!(
                r#" && "{}" in categories[]->slug.current"#,
                escape_groq_string(slug)
            ),
            None => String::new(),
        };
        let groq = format!(
            r#"*[_type == "product" && language == "{}" && defined(slug.current){}] | order(title asc){}"#,
            locale.code(),
            category_filter,
            DOCUMENT_PROJECTION
        );
        Ok(self.query(&groq).await?.unwrap_or_default())
    }

    /// Fetch a category document for list-page metadata.
    ///
    /// A fetch failure here is caught and logged rather than propagated: the
    /// page body still renders with empty category metadata, because content
    /// takes priority over perfect SEO tags.
    pub async fn fetch_category_defensive(
        &self,
        doc_type: DocType,
        slug: &str,
        locale: Locale,
    ) -> Option<Document> {
        match self.fetch_document(doc_type, slug, locale).await {
            Ok(doc) => doc,
            Err(e) => {
                warn!("Category metadata fetch failed for '{}': {}", slug, e);
                None
            }
        }
    }
}

/// Escape a string for interpolation into a GROQ string literal.
fn escape_groq_string(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Document Model Tests ====================

    #[test]
    fn test_document_deserializes_from_cms_shape() {
        let json = r#"{
            "_type": "post",
            "title": "Harvest Report",
            "slug": "harvest-report",
            "language": "en",
            "excerpt": "This season in numbers.",
            "bodyHtml": "<p>Full report</p>",
            "publishedAt": "2024-03-01T09:00:00Z",
            "_createdAt": "2024-02-20T08:00:00Z",
            "meta": {"title": "Harvest Report 2024", "noindex": false},
            "allTranslations": [
                {"lang": "en", "slug": "harvest-report"},
                {"lang": "es", "slug": "informe-de-cosecha"}
            ],
            "categorySlugs": ["market-news"]
        }"#;

        let doc: Document = serde_json::from_str(json).expect("deserialize");
        assert_eq!(doc.doc_type, "post");
        assert_eq!(doc.slug_str(), Some("harvest-report"));
        assert_eq!(doc.usable_translations().len(), 2);
        assert_eq!(doc.category_slugs, vec!["market-news"]);
        assert!(!doc.is_noindexed());
        assert!(doc.published_or_created().is_some());
    }

    #[test]
    fn test_document_minimal_fields() {
        let json = r#"{"_type": "page"}"#;
        let doc: Document = serde_json::from_str(json).expect("deserialize");

        assert!(doc.slug_str().is_none());
        assert!(doc.usable_translations().is_empty());
        assert!(doc.published_or_created().is_none());
        assert!(!doc.is_noindexed());
    }

    #[test]
    fn test_published_or_created_coalesces() {
        let json = r#"{"_type": "post", "_createdAt": "2024-01-01T00:00:00Z"}"#;
        let doc: Document = serde_json::from_str(json).expect("deserialize");
        assert_eq!(
            doc.published_or_created().map(|d| d.to_rfc3339()),
            Some("2024-01-01T00:00:00+00:00".to_string())
        );
    }

    #[test]
    fn test_translation_usability_filter() {
        let usable = Translation {
            lang: Some("es".into()),
            slug: Some("hola".into()),
        };
        let missing_slug = Translation {
            lang: Some("es".into()),
            slug: None,
        };
        let empty_lang = Translation {
            lang: Some("".into()),
            slug: Some("hola".into()),
        };

        assert!(usable.is_usable());
        assert!(!missing_slug.is_usable());
        assert!(!empty_lang.is_usable());
    }

    #[test]
    fn test_noindex_flag() {
        let json = r#"{"_type": "page", "meta": {"noindex": true}}"#;
        let doc: Document = serde_json::from_str(json).expect("deserialize");
        assert!(doc.is_noindexed());
    }

    // ==================== GROQ Escaping Tests ====================

    #[test]
    fn test_escape_groq_string() {
        assert_eq!(escape_groq_string("plain-slug"), "plain-slug");
        assert_eq!(escape_groq_string(r#"a"b"#), r#"a\"b"#);
        assert_eq!(escape_groq_string(r"a\b"), r"a\\b");
    }

    // ==================== Client Tests ====================

    #[test]
    fn test_query_unwraps_result_envelope() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        tokio_test::block_on(async {
            let mock_server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/v2021-10-21/data/query/production"))
                .respond_with(ResponseTemplate::new(200).set_body_string(
                    r#"{"result": {"siteTitle": "Example Trading"}}"#,
                ))
                .mount(&mock_server)
                .await;

            let client = CmsClient::from_parts(&mock_server.uri(), "production", None)
                .expect("client");
            let settings: Option<Settings> =
                client.query("*[_type == \"settings\"][0]").await.expect("query");

            assert_eq!(
                settings.and_then(|s| s.site_title),
                Some("Example Trading".to_string())
            );
        });
    }

    #[test]
    fn test_query_error_status_is_reported() {
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        tokio_test::block_on(async {
            let mock_server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(503))
                .mount(&mock_server)
                .await;

            let client = CmsClient::from_parts(&mock_server.uri(), "production", None)
                .expect("client");
            let result: Result<Option<Settings>> = client.query("*").await;

            let err = result.expect_err("should fail").to_string();
            assert!(err.contains("503"));
        });
    }
}
