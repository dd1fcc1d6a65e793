//! Localized CMS-backed catalog website server.
//!
//! The crate turns headless-CMS content into a locale-explicit website:
//! every URL carries its locale, every page declares canonical and hreflang
//! metadata, and the sitemap and blog feeds are derived from the same href
//! resolution rules the pages use.

pub mod cms;
pub mod config;
pub mod contact;
pub mod feeds;
pub mod i18n;
pub mod inquiry;
pub mod listing;
pub mod metadata;
pub mod routes;
pub mod server;
pub mod sitemap;
