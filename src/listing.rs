//! List-view query handling: sort order, page numbers, pagination.
//!
//! Query parameters degrade rather than error: an unknown sort value means
//! "newest", a bad page number means page 1.

use crate::cms::Document;

/// Sort order for list and category pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Newest,
    Az,
    Za,
}

impl SortOrder {
    /// Parse a `sort` query value; anything outside the set means newest.
    pub fn from_param(raw: Option<&str>) -> SortOrder {
        match raw {
            Some("az") => SortOrder::Az,
            Some("za") => SortOrder::Za,
            _ => SortOrder::Newest,
        }
    }

    /// The query value for this order.
    pub fn as_param(&self) -> &'static str {
        match self {
            SortOrder::Newest => "newest",
            SortOrder::Az => "az",
            SortOrder::Za => "za",
        }
    }
}

/// Parse a 1-based `page` query value; non-numeric or ≤ 0 becomes 1.
pub fn parse_page_param(raw: Option<&str>) -> usize {
    raw.and_then(|v| v.parse::<i64>().ok())
        .filter(|&page| page >= 1)
        .map(|page| page as usize)
        .unwrap_or(1)
}

/// Sort documents in place according to the requested order.
///
/// Newest compares the coalesced published-or-created timestamp descending;
/// A→Z / Z→A compare titles case-insensitively.
pub fn sort_documents(documents: &mut [Document], order: SortOrder) {
    match order {
        SortOrder::Newest => {
            documents.sort_by(|a, b| b.published_or_created().cmp(&a.published_or_created()));
        }
        SortOrder::Az => {
            documents.sort_by(|a, b| title_key(a).cmp(&title_key(b)));
        }
        SortOrder::Za => {
            documents.sort_by(|a, b| title_key(b).cmp(&title_key(a)));
        }
    }
}

fn title_key(document: &Document) -> String {
    document
        .title
        .as_deref()
        .unwrap_or_default()
        .to_lowercase()
}

/// One page of a sorted document list.
#[derive(Debug)]
pub struct Page<'a> {
    pub items: &'a [Document],
    /// The page actually served (clamped into range)
    pub number: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

/// Slice one page out of a document list.
///
/// The requested page is clamped into `1..=total_pages`, so a stale
/// deep-pagination link serves the last page instead of an empty one.
pub fn paginate(documents: &[Document], requested_page: usize, per_page: usize) -> Page<'_> {
    let per_page = per_page.max(1);
    let total_items = documents.len();
    let total_pages = total_items.div_ceil(per_page).max(1);
    let number = requested_page.clamp(1, total_pages);

    let start = (number - 1) * per_page;
    let end = (start + per_page).min(total_items);
    let items = if start < total_items {
        &documents[start..end]
    } else {
        &[]
    };

    Page {
        items,
        number,
        total_pages,
        total_items,
    }
}
