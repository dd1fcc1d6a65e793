//! HTTP surface: the axum router, page handlers, feeds, sitemap, contact.
//!
//! URL grammar is `/{locale}/{rest}` for every page; the bare root resolves a
//! locale from cookie then `Accept-Language` and redirects. Legacy unprefixed
//! paths degrade gracefully: the would-be locale segment turns out to be a
//! page path, and the handler redirects to the canonical localized URL
//! instead of erroring.

use crate::cms::{CmsClient, Document, Navigation, Settings};
use crate::config::Config;
use crate::contact::{submit_contact, ContactError, ContactSubmission, EmailClient};
use crate::feeds::{build_json_feed, build_rss_feed, FeedContext};
use crate::i18n::{build_localized_path, strip_locale_prefix, Locale, LocaleRegistry};
use crate::inquiry::{parse_inquiry_param, InquiryList};
use crate::listing::{paginate, parse_page_param, sort_documents, SortOrder};
use crate::metadata::{generate_page_metadata, MetadataContext, PageMetadata, PageRequest};
use crate::routes::{resolve_link_href, resolve_localized_href, DocType};
use crate::sitemap::{build_sitemap_entries, render_sitemap_xml};
use anyhow::Result;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Form, Router};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Items shown per list page.
const LIST_PAGE_SIZE: usize = 12;

/// Name of the locale-preference cookie.
const LOCALE_COOKIE: &str = "site_locale";

/// Cookie lifetime: 30 days.
const LOCALE_COOKIE_MAX_AGE: u32 = 30 * 24 * 60 * 60;

/// Cache policy for feed endpoints.
const FEED_CACHE_CONTROL: &str = "s-maxage=300, stale-while-revalidate=60";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub registry: Arc<LocaleRegistry>,
    pub cms: CmsClient,
    pub email: EmailClient,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let cms = CmsClient::new(&config)?;
        let email = EmailClient::new(&config)?;
        Ok(Self {
            config: Arc::new(config),
            registry: Arc::new(LocaleRegistry::site_default()),
            cms,
            email,
        })
    }

    fn metadata_ctx(&self) -> MetadataContext<'_> {
        MetadataContext {
            registry: &self.registry,
            base_url: &self.config.site_base_url,
            production: self.config.is_production(),
            hreflang_debug: self.config.hreflang_debug,
        }
    }

    fn feed_ctx<'a>(&'a self, settings: &'a Settings) -> FeedContext<'a> {
        FeedContext {
            base_url: &self.config.site_base_url,
            site_title: settings.site_title.as_deref().unwrap_or("Blog"),
            site_description: settings.description.as_deref(),
            page_size: self.config.feed_page_size,
        }
    }
}

/// Internal failure wrapper: logs and answers 500 without leaking details.
pub struct AppError(anyhow::Error);

impl<E: Into<anyhow::Error>> From<E> for AppError {
    fn from(err: E) -> Self {
        AppError(err.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!("Request failed: {:#}", self.0);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Html("<h1>Something went wrong</h1>".to_string()),
        )
            .into_response()
    }
}

/// Build the full application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root_redirect))
        .route("/sitemap.xml", get(sitemap_xml))
        .route("/:locale", get(home_page))
        .route("/:locale/blog", get(blog_list))
        .route("/:locale/blog/rss.xml", get(blog_rss))
        .route("/:locale/blog/feed.json", get(blog_json_feed))
        .route("/:locale/blog/category/:slug", get(blog_category_page))
        .route("/:locale/blog/category/:slug/rss.xml", get(category_rss))
        .route(
            "/:locale/blog/category/:slug/feed.json",
            get(category_json_feed),
        )
        .route("/:locale/blog/:slug", get(post_page))
        .route("/:locale/products", get(products_list))
        .route("/:locale/products/category/:slug", get(product_category_page))
        .route("/:locale/products/:slug", get(product_page))
        .route("/:locale/contact", get(contact_page).post(contact_submit))
        .route("/:locale/:slug", get(generic_page))
        .fallback(fallback_404)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the server until shutdown.
pub async fn run(config: Config) -> Result<()> {
    let port = config.port;
    let state = AppState::new(config)?;
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!("Listening on port {}", port);
    axum::serve(listener, router).await?;
    Ok(())
}

// ==================== Locale plumbing ====================

/// Extract a cookie value from the Cookie header.
fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(|cookies| {
            cookies.split(';').find_map(|pair| {
                let (key, value) = pair.split_once('=')?;
                (key.trim() == name).then_some(value.trim())
            })
        })
}

fn locale_cookie_header(locale: Locale) -> String {
    format!(
        "{}={}; Path=/; Max-Age={}; SameSite=Lax",
        LOCALE_COOKIE,
        locale.code(),
        LOCALE_COOKIE_MAX_AGE
    )
}

/// Validate the locale path segment, or degrade a legacy unprefixed path by
/// redirecting to its canonical localized URL.
fn require_locale(state: &AppState, locale_param: &str, uri: &Uri) -> Result<Locale, Response> {
    match Locale::from_code(&state.registry, locale_param) {
        Ok(locale) => Ok(locale),
        Err(_) => {
            let default = Locale::default_for(&state.registry);
            let target = build_localized_path(default, uri.path());
            Err(Redirect::permanent(&target).into_response())
        }
    }
}

/// `GET /` - resolve a locale (cookie wins over header) and redirect.
async fn root_redirect(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let cookie = cookie_value(&headers, LOCALE_COOKIE);
    let accept_language = headers
        .get(header::ACCEPT_LANGUAGE)
        .and_then(|value| value.to_str().ok());

    let locale = Locale::resolve(&state.registry, cookie, accept_language);
    Redirect::temporary(&format!("/{}", locale.code())).into_response()
}

/// Routes that matched nothing: either a legacy unprefixed URL (redirect to
/// its localized form) or a genuinely unknown path (404).
async fn fallback_404(State(state): State<AppState>, uri: Uri) -> Response {
    let first_segment = uri
        .path()
        .split('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or("");

    if !first_segment.is_empty() && !state.registry.is_supported(first_segment) {
        let (locale, path) = strip_locale_prefix(&state.registry, uri.path());
        return Redirect::permanent(&build_localized_path(locale, &path)).into_response();
    }

    not_found()
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Html("<h1>Page not found</h1>".to_string()),
    )
        .into_response()
}

// ==================== HTML rendering ====================

/// Render a full page: metadata-complete head plus a minimal content body.
fn render_page(
    locale: Locale,
    metadata: &PageMetadata,
    settings: &Settings,
    navigation: &Navigation,
    body: &str,
) -> Response {
    let title = metadata
        .title
        .as_deref()
        .or(settings.site_title.as_deref())
        .unwrap_or_default();

    let mut head = String::new();
    head.push_str(&format!("<title>{}</title>\n", esc(title)));
    if let Some(description) = &metadata.description {
        head.push_str(&format!(
            "<meta name=\"description\" content=\"{}\"/>\n",
            esc(description)
        ));
    }
    head.push_str(&format!(
        "<meta name=\"robots\" content=\"{}\"/>\n",
        robots_content(metadata)
    ));
    head.push_str(&format!(
        "<link rel=\"canonical\" href=\"{}\"/>\n",
        esc(&metadata.canonical_url)
    ));
    for (lang, url) in &metadata.alternates {
        head.push_str(&format!(
            "<link rel=\"alternate\" hreflang=\"{}\" href=\"{}\"/>\n",
            esc(lang),
            esc(url)
        ));
    }
    head.push_str(&format!(
        "<meta property=\"og:title\" content=\"{}\"/>\n",
        esc(title)
    ));
    head.push_str(&format!(
        "<meta property=\"og:url\" content=\"{}\"/>\n",
        esc(&metadata.canonical_url)
    ));
    head.push_str(&format!(
        "<meta property=\"og:locale\" content=\"{}\"/>\n",
        metadata.open_graph.locale
    ));
    for alternate in &metadata.open_graph.alternate_locales {
        head.push_str(&format!(
            "<meta property=\"og:locale:alternate\" content=\"{}\"/>\n",
            alternate
        ));
    }
    head.push_str(&format!(
        "<meta property=\"og:image\" content=\"{}\"/>\n\
         <meta property=\"og:image:width\" content=\"{}\"/>\n\
         <meta property=\"og:image:height\" content=\"{}\"/>\n",
        esc(&metadata.open_graph.image.url),
        metadata.open_graph.image.width,
        metadata.open_graph.image.height
    ));

    let nav = navigation
        .items
        .iter()
        .filter_map(|item| {
            // Unresolvable links render as absent affordances, not broken ones
            let href = resolve_link_href(item.link.as_ref(), locale)?;
            Some(format!("<a href=\"{}\">{}</a>", esc(&href), esc(&item.label)))
        })
        .collect::<Vec<_>>()
        .join(" | ");

    let html = format!(
        "<!DOCTYPE html>\n<html lang=\"{}\">\n<head>\n{}</head>\n<body>\n<nav>{}</nav>\n{}\n</body>\n</html>",
        locale.code(),
        head,
        nav,
        body
    );

    let mut response = Html(html).into_response();
    if let Ok(cookie) = locale_cookie_header(locale).parse() {
        response.headers_mut().insert(header::SET_COOKIE, cookie);
    }
    response
}

fn robots_content(metadata: &PageMetadata) -> &'static str {
    match (metadata.robots.index, metadata.robots.follow) {
        (true, true) => "index, follow",
        (false, true) => "noindex, follow",
        (true, false) => "index, nofollow",
        (false, false) => "noindex, nofollow",
    }
}

fn esc(value: &str) -> String {
    crate::contact::escape_html(value)
}

fn document_body(document: &Document) -> String {
    let mut body = String::new();
    if let Some(title) = &document.title {
        body.push_str(&format!("<h1>{}</h1>\n", esc(title)));
    }
    if let Some(excerpt) = &document.excerpt {
        body.push_str(&format!("<p><em>{}</em></p>\n", esc(excerpt)));
    }
    if let Some(html) = &document.body_html {
        body.push_str(&format!("<article>{}</article>\n", html));
    }
    body
}

fn document_list_body(heading: &str, documents: &[Document], locale: Locale, doc_type: DocType) -> String {
    let mut body = format!("<h1>{}</h1>\n<ul>\n", esc(heading));
    for document in documents {
        let Some(href) = resolve_localized_href(doc_type, document.slug_str(), locale) else {
            continue;
        };
        let label = document.title.as_deref().unwrap_or_else(|| {
            document.slug_str().unwrap_or_default()
        });
        body.push_str(&format!(
            "<li><a href=\"{}\">{}</a></li>\n",
            esc(&href),
            esc(label)
        ));
    }
    body.push_str("</ul>\n");
    body
}

// ==================== Page handlers ====================

#[derive(Debug, Deserialize)]
struct ListQuery {
    page: Option<String>,
    sort: Option<String>,
    category: Option<String>,
    inquiry: Option<String>,
}

async fn home_page(
    State(state): State<AppState>,
    Path(locale_param): Path<String>,
    uri: Uri,
) -> Result<Response, AppError> {
    let locale = match require_locale(&state, &locale_param, &uri) {
        Ok(locale) => locale,
        Err(redirect) => return Ok(redirect),
    };

    let (document, settings, navigation) = tokio::try_join!(
        state.cms.fetch_document(DocType::Page, "index", locale),
        state.cms.fetch_settings(locale),
        state.cms.fetch_navigation(locale),
    )?;

    let metadata = generate_page_metadata(
        &state.metadata_ctx(),
        &PageRequest {
            page: document.as_ref(),
            slug: "index",
            doc_type: DocType::Page,
            locale,
        },
    );

    let body = document
        .as_ref()
        .map(document_body)
        .unwrap_or_else(|| "<h1>Welcome</h1>".to_string());

    Ok(render_page(locale, &metadata, &settings, &navigation, &body))
}

async fn generic_page(
    State(state): State<AppState>,
    Path((locale_param, slug)): Path<(String, String)>,
    uri: Uri,
) -> Result<Response, AppError> {
    let locale = match require_locale(&state, &locale_param, &uri) {
        Ok(locale) => locale,
        Err(redirect) => return Ok(redirect),
    };

    let (document, settings, navigation) = tokio::try_join!(
        state.cms.fetch_document(DocType::Page, &slug, locale),
        state.cms.fetch_settings(locale),
        state.cms.fetch_navigation(locale),
    )?;

    let Some(document) = document else {
        return Ok(not_found());
    };

    let metadata = generate_page_metadata(
        &state.metadata_ctx(),
        &PageRequest {
            page: Some(&document),
            slug: &slug,
            doc_type: DocType::Page,
            locale,
        },
    );

    let body = document_body(&document);
    Ok(render_page(locale, &metadata, &settings, &navigation, &body))
}

async fn post_page(
    State(state): State<AppState>,
    Path((locale_param, slug)): Path<(String, String)>,
    uri: Uri,
) -> Result<Response, AppError> {
    let locale = match require_locale(&state, &locale_param, &uri) {
        Ok(locale) => locale,
        Err(redirect) => return Ok(redirect),
    };

    let (document, settings, navigation) = tokio::try_join!(
        state.cms.fetch_document(DocType::Post, &slug, locale),
        state.cms.fetch_settings(locale),
        state.cms.fetch_navigation(locale),
    )?;

    let Some(document) = document else {
        return Ok(not_found());
    };

    let metadata = generate_page_metadata(
        &state.metadata_ctx(),
        &PageRequest {
            page: Some(&document),
            slug: &format!("blog/{}", slug),
            doc_type: DocType::Post,
            locale,
        },
    );

    let body = document_body(&document);
    Ok(render_page(locale, &metadata, &settings, &navigation, &body))
}

async fn blog_list(
    State(state): State<AppState>,
    Path(locale_param): Path<String>,
    Query(query): Query<ListQuery>,
    uri: Uri,
) -> Result<Response, AppError> {
    let locale = match require_locale(&state, &locale_param, &uri) {
        Ok(locale) => locale,
        Err(redirect) => return Ok(redirect),
    };

    let (mut posts, settings, navigation) = tokio::try_join!(
        state.cms.fetch_posts(locale, None),
        state.cms.fetch_settings(locale),
        state.cms.fetch_navigation(locale),
    )?;

    let sort = SortOrder::from_param(query.sort.as_deref());
    sort_documents(&mut posts, sort);
    let page = paginate(&posts, parse_page_param(query.page.as_deref()), LIST_PAGE_SIZE);

    let metadata = generate_page_metadata(
        &state.metadata_ctx(),
        &PageRequest {
            page: None,
            slug: "blog",
            doc_type: DocType::Page,
            locale,
        },
    );

    let body = document_list_body("Blog", page.items, locale, DocType::Post);
    Ok(render_page(locale, &metadata, &settings, &navigation, &body))
}

async fn blog_category_page(
    State(state): State<AppState>,
    Path((locale_param, slug)): Path<(String, String)>,
    Query(query): Query<ListQuery>,
    uri: Uri,
) -> Result<Response, AppError> {
    let locale = match require_locale(&state, &locale_param, &uri) {
        Ok(locale) => locale,
        Err(redirect) => return Ok(redirect),
    };

    let (posts, settings, navigation) = tokio::try_join!(
        state.cms.fetch_posts(locale, Some(&slug)),
        state.cms.fetch_settings(locale),
        state.cms.fetch_navigation(locale),
    )?;

    // Category metadata degrades to empty on fetch failure; the list renders
    // either way
    let category = state
        .cms
        .fetch_category_defensive(DocType::BlogCategory, &slug, locale)
        .await;

    let mut posts = posts;
    let sort = SortOrder::from_param(query.sort.as_deref());
    sort_documents(&mut posts, sort);
    let page = paginate(&posts, parse_page_param(query.page.as_deref()), LIST_PAGE_SIZE);

    let metadata = generate_page_metadata(
        &state.metadata_ctx(),
        &PageRequest {
            page: category.as_ref(),
            slug: &format!("blog/category/{}", slug),
            doc_type: DocType::BlogCategory,
            locale,
        },
    );

    let heading = category
        .as_ref()
        .and_then(|c| c.title.clone())
        .unwrap_or_else(|| crate::metadata::humanize_slug(&slug));
    let body = document_list_body(&heading, page.items, locale, DocType::Post);
    Ok(render_page(locale, &metadata, &settings, &navigation, &body))
}

async fn products_list(
    State(state): State<AppState>,
    Path(locale_param): Path<String>,
    Query(query): Query<ListQuery>,
    uri: Uri,
) -> Result<Response, AppError> {
    let locale = match require_locale(&state, &locale_param, &uri) {
        Ok(locale) => locale,
        Err(redirect) => return Ok(redirect),
    };

    let (mut products, settings, navigation) = tokio::try_join!(
        state.cms.fetch_products(locale, query.category.as_deref()),
        state.cms.fetch_settings(locale),
        state.cms.fetch_navigation(locale),
    )?;

    let sort = SortOrder::from_param(query.sort.as_deref());
    sort_documents(&mut products, sort);
    let page = paginate(
        &products,
        parse_page_param(query.page.as_deref()),
        LIST_PAGE_SIZE,
    );

    let metadata = generate_page_metadata(
        &state.metadata_ctx(),
        &PageRequest {
            page: None,
            slug: "products",
            doc_type: DocType::Page,
            locale,
        },
    );

    let body = document_list_body("Products", page.items, locale, DocType::Product);
    Ok(render_page(locale, &metadata, &settings, &navigation, &body))
}

async fn product_page(
    State(state): State<AppState>,
    Path((locale_param, slug)): Path<(String, String)>,
    uri: Uri,
) -> Result<Response, AppError> {
    let locale = match require_locale(&state, &locale_param, &uri) {
        Ok(locale) => locale,
        Err(redirect) => return Ok(redirect),
    };

    let (document, settings, navigation) = tokio::try_join!(
        state.cms.fetch_document(DocType::Product, &slug, locale),
        state.cms.fetch_settings(locale),
        state.cms.fetch_navigation(locale),
    )?;

    let Some(document) = document else {
        return Ok(not_found());
    };

    let metadata = generate_page_metadata(
        &state.metadata_ctx(),
        &PageRequest {
            page: Some(&document),
            slug: &format!("products/{}", slug),
            doc_type: DocType::Product,
            locale,
        },
    );

    let body = document_body(&document);
    Ok(render_page(locale, &metadata, &settings, &navigation, &body))
}

async fn product_category_page(
    State(state): State<AppState>,
    Path((locale_param, slug)): Path<(String, String)>,
    Query(query): Query<ListQuery>,
    uri: Uri,
) -> Result<Response, AppError> {
    let locale = match require_locale(&state, &locale_param, &uri) {
        Ok(locale) => locale,
        Err(redirect) => return Ok(redirect),
    };

    let (products, settings, navigation) = tokio::try_join!(
        state.cms.fetch_products(locale, Some(&slug)),
        state.cms.fetch_settings(locale),
        state.cms.fetch_navigation(locale),
    )?;

    let category = state
        .cms
        .fetch_category_defensive(DocType::ProductCategory, &slug, locale)
        .await;

    let mut products = products;
    let sort = SortOrder::from_param(query.sort.as_deref());
    sort_documents(&mut products, sort);
    let page = paginate(
        &products,
        parse_page_param(query.page.as_deref()),
        LIST_PAGE_SIZE,
    );

    let metadata = generate_page_metadata(
        &state.metadata_ctx(),
        &PageRequest {
            page: category.as_ref(),
            slug: &format!("products/category/{}", slug),
            doc_type: DocType::ProductCategory,
            locale,
        },
    );

    let heading = category
        .as_ref()
        .and_then(|c| c.title.clone())
        .unwrap_or_else(|| crate::metadata::humanize_slug(&slug));
    let body = document_list_body(&heading, page.items, locale, DocType::Product);
    Ok(render_page(locale, &metadata, &settings, &navigation, &body))
}

// ==================== Contact handlers ====================

fn contact_form_body(
    items: &InquiryList,
    field_errors: &[(String, String)],
    general_error: Option<&str>,
    captcha_site_key: Option<&str>,
    submitted: bool,
) -> String {
    let mut body = String::from("<h1>Contact us</h1>\n");

    if submitted {
        body.push_str("<p class=\"success\">Thank you - we received your message.</p>\n");
        return body;
    }
    if let Some(message) = general_error {
        body.push_str(&format!("<p class=\"error\">{}</p>\n", esc(message)));
    }

    if !items.is_empty() {
        body.push_str("<h2>Your inquiry</h2>\n<ul>\n");
        for item in items.items() {
            body.push_str(&format!("<li>{}</li>\n", esc(&item.name)));
        }
        body.push_str("</ul>\n");
    }

    body.push_str("<form method=\"post\">\n");
    for (field, label) in [("name", "Name"), ("email", "Email"), ("message", "Message")] {
        if let Some((_, message)) = field_errors.iter().find(|(name, _)| name == field) {
            body.push_str(&format!(
                "<p class=\"field-error\" data-field=\"{}\">{}</p>\n",
                field,
                esc(message)
            ));
        }
        body.push_str(&format!(
            "<label>{}<input name=\"{}\"/></label>\n",
            label, field
        ));
    }
    if let Some(site_key) = captcha_site_key {
        body.push_str(&format!(
            "<div class=\"captcha\" data-sitekey=\"{}\"></div>\n",
            esc(site_key)
        ));
    }
    body.push_str("<button type=\"submit\">Send</button>\n</form>\n");
    body
}

async fn contact_page(
    State(state): State<AppState>,
    Path(locale_param): Path<String>,
    Query(query): Query<ListQuery>,
    uri: Uri,
) -> Result<Response, AppError> {
    let locale = match require_locale(&state, &locale_param, &uri) {
        Ok(locale) => locale,
        Err(redirect) => return Ok(redirect),
    };

    let (document, settings, navigation) = tokio::try_join!(
        state.cms.fetch_document(DocType::Contact, "contact", locale),
        state.cms.fetch_settings(locale),
        state.cms.fetch_navigation(locale),
    )?;

    let metadata = generate_page_metadata(
        &state.metadata_ctx(),
        &PageRequest {
            page: document.as_ref(),
            slug: "contact",
            doc_type: DocType::Contact,
            locale,
        },
    );

    let inquiry = InquiryList::from_items(parse_inquiry_param(query.inquiry.as_deref()));
    let body = contact_form_body(
        &inquiry,
        &[],
        None,
        state.config.captcha_site_key.as_deref(),
        false,
    );
    Ok(render_page(locale, &metadata, &settings, &navigation, &body))
}

async fn contact_submit(
    State(state): State<AppState>,
    Path(locale_param): Path<String>,
    uri: Uri,
    Form(submission): Form<ContactSubmission>,
) -> Result<Response, AppError> {
    let locale = match require_locale(&state, &locale_param, &uri) {
        Ok(locale) => locale,
        Err(redirect) => return Ok(redirect),
    };

    let (settings, navigation) = tokio::try_join!(
        state.cms.fetch_settings(locale),
        state.cms.fetch_navigation(locale),
    )?;

    let metadata = generate_page_metadata(
        &state.metadata_ctx(),
        &PageRequest {
            page: None,
            slug: "contact",
            doc_type: DocType::Contact,
            locale,
        },
    );

    let inquiry = InquiryList::from_items(parse_inquiry_param(submission.inquiry.as_deref()));

    let (body, status) = match submit_contact(&state.email, &submission).await {
        Ok(()) => (
            contact_form_body(&inquiry, &[], None, None, true),
            StatusCode::OK,
        ),
        Err(ContactError::Validation(fields)) => {
            let field_errors: Vec<_> = fields
                .into_iter()
                .map(|f| (f.field, f.message))
                .collect();
            (
                contact_form_body(
                    &inquiry,
                    &field_errors,
                    None,
                    state.config.captcha_site_key.as_deref(),
                    false,
                ),
                StatusCode::UNPROCESSABLE_ENTITY,
            )
        }
        Err(ContactError::Send(reason)) => {
            error!("Contact email send failed: {}", reason);
            (
                contact_form_body(
                    &inquiry,
                    &[],
                    Some("We could not send your message. Please try again later."),
                    state.config.captcha_site_key.as_deref(),
                    false,
                ),
                StatusCode::BAD_GATEWAY,
            )
        }
        Err(ContactError::Unexpected(e)) => {
            error!("Unexpected contact failure: {:#}", e);
            (
                contact_form_body(
                    &inquiry,
                    &[],
                    Some("Something went wrong."),
                    state.config.captcha_site_key.as_deref(),
                    false,
                ),
                StatusCode::INTERNAL_SERVER_ERROR,
            )
        }
    };

    let mut response = render_page(locale, &metadata, &settings, &navigation, &body);
    *response.status_mut() = status;
    Ok(response)
}

// ==================== Feeds & sitemap ====================

fn feed_response(content_type: &'static str, body: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, FEED_CACHE_CONTROL),
        ],
        body,
    )
        .into_response()
}

async fn blog_rss(
    State(state): State<AppState>,
    Path(locale_param): Path<String>,
    uri: Uri,
) -> Result<Response, AppError> {
    rss_response(&state, &locale_param, None, &uri).await
}

async fn category_rss(
    State(state): State<AppState>,
    Path((locale_param, slug)): Path<(String, String)>,
    uri: Uri,
) -> Result<Response, AppError> {
    rss_response(&state, &locale_param, Some(&slug), &uri).await
}

async fn rss_response(
    state: &AppState,
    locale_param: &str,
    category: Option<&str>,
    uri: &Uri,
) -> Result<Response, AppError> {
    let locale = match require_locale(state, locale_param, uri) {
        Ok(locale) => locale,
        Err(redirect) => return Ok(redirect),
    };

    let (posts, settings) = tokio::try_join!(
        state.cms.fetch_posts(locale, category),
        state.cms.fetch_settings(locale),
    )?;

    let channel = build_rss_feed(&state.feed_ctx(&settings), locale, &posts, category);
    Ok(feed_response(
        "application/rss+xml; charset=utf-8",
        channel.to_string(),
    ))
}

async fn blog_json_feed(
    State(state): State<AppState>,
    Path(locale_param): Path<String>,
    uri: Uri,
) -> Result<Response, AppError> {
    json_feed_response(&state, &locale_param, None, &uri).await
}

async fn category_json_feed(
    State(state): State<AppState>,
    Path((locale_param, slug)): Path<(String, String)>,
    uri: Uri,
) -> Result<Response, AppError> {
    json_feed_response(&state, &locale_param, Some(&slug), &uri).await
}

async fn json_feed_response(
    state: &AppState,
    locale_param: &str,
    category: Option<&str>,
    uri: &Uri,
) -> Result<Response, AppError> {
    let locale = match require_locale(state, locale_param, uri) {
        Ok(locale) => locale,
        Err(redirect) => return Ok(redirect),
    };

    let (posts, settings) = tokio::try_join!(
        state.cms.fetch_posts(locale, category),
        state.cms.fetch_settings(locale),
    )?;

    let feed = build_json_feed(&state.feed_ctx(&settings), locale, &posts, category);
    Ok(feed_response(
        "application/feed+json; charset=utf-8",
        serde_json::to_string_pretty(&feed)?,
    ))
}

async fn sitemap_xml(State(state): State<AppState>) -> Result<Response, AppError> {
    let documents = state.cms.fetch_all_published().await?;
    let entries = build_sitemap_entries(
        &state.registry,
        &state.config.site_base_url,
        &documents,
        Utc::now(),
    );
    let xml = render_sitemap_xml(&entries);
    Ok((
        [(header::CONTENT_TYPE, "application/xml; charset=utf-8")],
        xml,
    )
        .into_response())
}
