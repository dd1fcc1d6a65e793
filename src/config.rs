use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    // Site
    pub site_base_url: String,
    pub app_env: String,
    pub port: u16,

    // CMS
    pub cms_api_url: String,
    pub cms_project_id: String,
    pub cms_dataset: String,
    pub cms_api_token: Option<String>,

    // Outbound email
    pub email_api_url: String,
    pub email_api_key: String,
    pub email_from: String,
    pub email_to: String,

    // Contact form
    pub captcha_site_key: Option<String>,

    // Feeds
    pub feed_page_size: usize,

    // Diagnostics
    pub hreflang_debug: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            // Site - base URL without trailing slash, e.g. "https://example.com"
            site_base_url: std::env::var("SITE_BASE_URL")
                .context("SITE_BASE_URL not set")?
                .trim_end_matches('/')
                .to_string(),
            app_env: std::env::var("APP_ENV")
                .unwrap_or_else(|_| "development".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),

            // CMS - API URL defaults to the project's hosted endpoint; an
            // explicit CMS_API_URL overrides it (local proxies, tests)
            cms_api_url: {
                let project_id =
                    std::env::var("CMS_PROJECT_ID").context("CMS_PROJECT_ID not set")?;
                std::env::var("CMS_API_URL")
                    .unwrap_or_else(|_| format!("https://{}.api.sanity.io", project_id))
                    .trim_end_matches('/')
                    .to_string()
            },
            cms_project_id: std::env::var("CMS_PROJECT_ID")
                .context("CMS_PROJECT_ID not set")?,
            cms_dataset: std::env::var("CMS_DATASET")
                .unwrap_or_else(|_| "production".to_string()),
            cms_api_token: std::env::var("CMS_API_TOKEN").ok(),

            // Outbound email
            email_api_url: std::env::var("EMAIL_API_URL")
                .unwrap_or_else(|_| "https://api.resend.com/emails".to_string()),
            email_api_key: std::env::var("EMAIL_API_KEY")
                .context("EMAIL_API_KEY not set")?,
            email_from: std::env::var("EMAIL_FROM").context("EMAIL_FROM not set")?,
            email_to: std::env::var("EMAIL_TO").context("EMAIL_TO not set")?,

            // Contact form
            captcha_site_key: std::env::var("CAPTCHA_SITE_KEY").ok(),

            // Feeds
            feed_page_size: std::env::var("FEED_PAGE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(50),

            // Diagnostics
            hreflang_debug: std::env::var("HREFLANG_DEBUG")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        })
    }

    /// Whether the app runs in production mode.
    ///
    /// Non-production environments must never be indexable, so metadata
    /// generation checks this before emitting robots directives.
    pub fn is_production(&self) -> bool {
        self.app_env == "production"
    }
}
