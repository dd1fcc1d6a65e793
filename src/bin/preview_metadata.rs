//! Metadata preview binary - resolves and displays the metadata a page would
//! render, without serving it. Useful for hreflang debugging: the full
//! alternates map is printed per run.
//!
//! Usage:
//!   cargo run --bin preview -- <type> <slug> [locale]
//!   cargo run --bin preview -- post harvest-report es
//!
//! Required environment variables:
//! - SITE_BASE_URL
//! - CMS_PROJECT_ID
//!
//! Optional:
//! - CMS_API_URL (defaults to the hosted project endpoint)
//! - CMS_DATASET (defaults to "production")
//! - CMS_API_TOKEN
//! - APP_ENV (defaults to "development")

use anyhow::{bail, Context, Result};
use catalog_site::cms::CmsClient;
use catalog_site::i18n::{Locale, LocaleRegistry};
use catalog_site::metadata::{generate_page_metadata, MetadataContext, PageRequest};
use catalog_site::routes::{resolve_href, DocType};

/// Minimal config for previews (no email/server settings required)
struct PreviewConfig {
    site_base_url: String,
    cms_api_url: String,
    cms_dataset: String,
    cms_api_token: Option<String>,
    production: bool,
}

impl PreviewConfig {
    fn from_env() -> Result<Self> {
        let project_id = std::env::var("CMS_PROJECT_ID").context("CMS_PROJECT_ID not set")?;
        Ok(Self {
            site_base_url: std::env::var("SITE_BASE_URL")
                .context("SITE_BASE_URL not set")?
                .trim_end_matches('/')
                .to_string(),
            cms_api_url: std::env::var("CMS_API_URL")
                .unwrap_or_else(|_| format!("https://{}.api.sanity.io", project_id))
                .trim_end_matches('/')
                .to_string(),
            cms_dataset: std::env::var("CMS_DATASET")
                .unwrap_or_else(|_| "production".to_string()),
            cms_api_token: std::env::var("CMS_API_TOKEN").ok(),
            production: std::env::var("APP_ENV")
                .map(|env| env == "production")
                .unwrap_or(false),
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 2 {
        bail!("Usage: preview <type> <slug> [locale]");
    }
    let Some(doc_type) = DocType::from_tag(&args[0]) else {
        bail!("Unknown document type: '{}'", args[0]);
    };
    let slug = args[1].trim_start_matches('/').to_string();

    let registry = LocaleRegistry::site_default();
    let locale = Locale::normalize(&registry, args.get(2).map(String::as_str));

    let config = PreviewConfig::from_env()?;
    let cms = CmsClient::from_parts(
        &config.cms_api_url,
        &config.cms_dataset,
        config.cms_api_token.clone(),
    )?;

    println!(
        "Fetching {} '{}' [{}] ...",
        doc_type.tag(),
        slug,
        locale.code()
    );
    let document = cms.fetch_document(doc_type, &slug, locale).await?;
    if document.is_none() {
        println!("(document not found - showing synthesized metadata)");
    }

    // Metadata keys the page head by its unprefixed path, not the raw slug
    let metadata_slug = resolve_href(doc_type, Some(&slug))
        .map(|path| path.trim_start_matches('/').to_string())
        .unwrap_or_else(|| slug.clone());
    let metadata_slug = if metadata_slug.is_empty() {
        "index".to_string()
    } else {
        metadata_slug
    };

    let ctx = MetadataContext {
        registry: &registry,
        base_url: &config.site_base_url,
        production: config.production,
        hreflang_debug: false,
    };
    let metadata = generate_page_metadata(
        &ctx,
        &PageRequest {
            page: document.as_ref(),
            slug: &metadata_slug,
            doc_type,
            locale,
        },
    );

    println!();
    println!("Title:       {}", metadata.title.as_deref().unwrap_or("(layout default)"));
    println!(
        "Description: {}",
        metadata.description.as_deref().unwrap_or("(none)")
    );
    println!("Canonical:   {}", metadata.canonical_url);
    println!(
        "Robots:      index={} follow={}",
        metadata.robots.index, metadata.robots.follow
    );
    println!("OG locale:   {}", metadata.open_graph.locale);
    if !metadata.open_graph.alternate_locales.is_empty() {
        println!(
            "OG alt:      {}",
            metadata.open_graph.alternate_locales.join(", ")
        );
    }
    println!("OG image:    {}", metadata.open_graph.image.url);

    println!();
    println!("hreflang alternates:");
    for (lang, url) in &metadata.alternates {
        println!("  {:10} -> {}", lang, url);
    }

    Ok(())
}
