//! Blog feed emission: RSS and JSON Feed, per locale, optionally scoped to a
//! category.
//!
//! Items are ordered newest-first by the coalesced published-or-created
//! timestamp and capped at the configured page size. Item descriptions prefer
//! the rendered HTML body over the plain excerpt, falling back to an empty
//! string.

use crate::cms::Document;
use crate::i18n::{build_localized_path, Locale};
use crate::listing::{sort_documents, SortOrder};
use crate::routes::{resolve_href, DocType};
use regex::Regex;
use rss::{Channel, ChannelBuilder, GuidBuilder, ItemBuilder};
use serde::Serialize;

/// Shared inputs for feed generation.
#[derive(Debug, Clone)]
pub struct FeedContext<'a> {
    pub base_url: &'a str,
    pub site_title: &'a str,
    pub site_description: Option<&'a str>,
    pub page_size: usize,
}

/// The blog landing URL the feed belongs to (category-scoped when given).
fn home_page_url(ctx: &FeedContext<'_>, locale: Locale, category: Option<&str>) -> String {
    let path = match category {
        Some(slug) => format!("/blog/category/{}", slug),
        None => "/blog".to_string(),
    };
    format!("{}{}", ctx.base_url, build_localized_path(locale, &path))
}

/// Sort newest-first and cap at the feed page size.
fn feed_window(documents: &[Document], page_size: usize) -> Vec<Document> {
    let mut sorted = documents.to_vec();
    sort_documents(&mut sorted, SortOrder::Newest);
    sorted.truncate(page_size);
    sorted
}

/// Absolute post URL under the post's locale.
fn post_url(ctx: &FeedContext<'_>, locale: Locale, document: &Document) -> Option<String> {
    let path = resolve_href(DocType::Post, document.slug_str())?;
    Some(format!(
        "{}{}",
        ctx.base_url,
        build_localized_path(locale, &path)
    ))
}

/// Description for a feed item: rendered HTML body, else excerpt, else empty.
fn item_description(document: &Document) -> String {
    document
        .body_html
        .clone()
        .filter(|body| !body.is_empty())
        .or_else(|| document.excerpt.clone())
        .unwrap_or_default()
}

/// Build the RSS channel for a locale's blog posts.
pub fn build_rss_feed(
    ctx: &FeedContext<'_>,
    locale: Locale,
    documents: &[Document],
    category: Option<&str>,
) -> Channel {
    let home_url = home_page_url(ctx, locale, category);
    let items: Vec<_> = feed_window(documents, ctx.page_size)
        .iter()
        .filter_map(|document| {
            let url = post_url(ctx, locale, document)?;
            Some(
                ItemBuilder::default()
                    .title(document.title.clone())
                    .link(Some(url.clone()))
                    .guid(Some(
                        GuidBuilder::default().value(url).permalink(true).build(),
                    ))
                    .pub_date(document.published_or_created().map(|d| d.to_rfc2822()))
                    .description(Some(item_description(document)))
                    .build(),
            )
        })
        .collect();

    ChannelBuilder::default()
        .title(feed_title(ctx, category))
        .link(home_url)
        .description(ctx.site_description.unwrap_or_default().to_string())
        .language(Some(locale.code().to_string()))
        .items(items)
        .build()
}

fn feed_title(ctx: &FeedContext<'_>, category: Option<&str>) -> String {
    match category {
        Some(slug) => format!("{} - {}", ctx.site_title, crate::metadata::humanize_slug(slug)),
        None => ctx.site_title.to_string(),
    }
}

/// JSON Feed 1.1 document.
#[derive(Debug, Serialize)]
pub struct JsonFeed {
    pub version: &'static str,
    pub title: String,
    pub home_page_url: String,
    pub feed_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub language: String,
    pub items: Vec<JsonFeedItem>,
}

#[derive(Debug, Serialize)]
pub struct JsonFeedItem {
    pub id: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub content_html: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_published: Option<String>,
}

/// Build the JSON feed for a locale's blog posts.
pub fn build_json_feed(
    ctx: &FeedContext<'_>,
    locale: Locale,
    documents: &[Document],
    category: Option<&str>,
) -> JsonFeed {
    let home_url = home_page_url(ctx, locale, category);
    let items = feed_window(documents, ctx.page_size)
        .iter()
        .filter_map(|document| {
            let url = post_url(ctx, locale, document)?;
            let content_html = item_description(document);
            let summary = document
                .excerpt
                .clone()
                .filter(|excerpt| !excerpt.is_empty())
                .or_else(|| {
                    let plain = strip_html(&content_html);
                    (!plain.is_empty()).then_some(plain)
                });
            Some(JsonFeedItem {
                id: url.clone(),
                url,
                title: document.title.clone(),
                content_html,
                summary,
                date_published: document.published_or_created().map(|d| d.to_rfc3339()),
            })
        })
        .collect();

    JsonFeed {
        version: "https://jsonfeed.org/version/1.1",
        title: feed_title(ctx, category),
        home_page_url: home_url.clone(),
        feed_url: format!("{}/feed.json", home_url),
        description: ctx.site_description.map(String::from),
        language: locale.code().to_string(),
        items,
    }
}

/// Strip HTML tags and collapse whitespace for plain-text summaries.
pub fn strip_html(html: &str) -> String {
    let tags = Regex::new(r"<[^>]*>").expect("static pattern");
    let stripped = tags.replace_all(html, " ");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}
