//! Record types and creation inputs.
//!
//! Each persisted record kind has a row type (`FromRow`, returned by queries)
//! and a `New*` input type validated before insertion.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::error::StoreError;

/// Maximum length of a navigation entry name.
pub const NAVIGATION_NAME_MAX: usize = 128;
/// Maximum length of a sub-navigation entry name.
pub const SUB_NAVIGATION_NAME_MAX: usize = 20;
/// Maximum length of a navigation link.
pub const LINK_MAX: usize = 255;
/// Maximum length of a page permalink.
pub const PERMALINK_MAX: usize = 100;
/// Maximum length of a page title.
pub const PAGE_TITLE_MAX: usize = 50;
/// Maximum length of a footer or banner title.
pub const BLOCK_TITLE_MAX: usize = 128;
/// Maximum length of a static file name.
pub const FILENAME_MAX: usize = 70;

/// Top-level navigation menu entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct NavigationEntry {
    pub id: i64,
    pub name: String,
    pub link: String,
    /// Display order among siblings (ascending).
    pub position: i32,
    pub active: bool,
}

/// Entry nested under a [`NavigationEntry`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct SubNavigationEntry {
    pub id: i64,
    /// Owning navigation entry.
    pub navigation_id: i64,
    pub name: String,
    pub link: String,
    /// Display order within the parent (ascending).
    pub position: i32,
    pub active: bool,
}

/// Static page addressed by permalink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Page {
    pub id: i64,
    /// Unique slug the page is served under.
    pub permalink: String,
    pub title: String,
    /// Extra markup placed in `<head>` (stylesheets, scripts).
    pub imports: Option<String>,
    /// Page body markup.
    pub content: String,
    /// Set once at creation.
    pub pub_date: DateTime<Utc>,
    pub active: bool,
}

/// Site footer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Footer {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub pub_date: DateTime<Utc>,
    pub active: bool,
}

/// Site banner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Banner {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub pub_date: DateTime<Utc>,
    pub active: bool,
}

/// Uploaded static asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct StaticFile {
    pub id: i64,
    /// Declared name, unique across all static files.
    pub filename: String,
    /// Stored location relative to the uploads root (e.g. `images/logo.png`).
    pub file: String,
}

/// Navigation entry to create.
#[derive(Debug, Clone)]
pub struct NewNavigationEntry {
    pub name: String,
    pub link: String,
    pub position: i32,
    pub active: bool,
}

impl NewNavigationEntry {
    pub(crate) fn validate(&self) -> Result<(), StoreError> {
        require_text("name", &self.name, NAVIGATION_NAME_MAX)?;
        require_text("link", &self.link, LINK_MAX)
    }
}

/// Sub-navigation entry to create.
#[derive(Debug, Clone)]
pub struct NewSubNavigationEntry {
    pub navigation_id: i64,
    pub name: String,
    pub link: String,
    pub position: i32,
    pub active: bool,
}

impl NewSubNavigationEntry {
    pub(crate) fn validate(&self) -> Result<(), StoreError> {
        require_text("name", &self.name, SUB_NAVIGATION_NAME_MAX)?;
        require_text("link", &self.link, LINK_MAX)
    }
}

/// Page to create or update.
#[derive(Debug, Clone)]
pub struct NewPage {
    pub permalink: String,
    pub title: String,
    pub imports: Option<String>,
    pub content: String,
    pub active: bool,
}

impl NewPage {
    pub(crate) fn validate(&self) -> Result<(), StoreError> {
        require_text("permalink", &self.permalink, PERMALINK_MAX)?;
        require_text("title", &self.title, PAGE_TITLE_MAX)?;
        require_content(&self.content)
    }
}

/// Footer or banner to create.
#[derive(Debug, Clone)]
pub struct NewBlock {
    pub title: String,
    pub content: String,
    pub active: bool,
}

impl NewBlock {
    pub(crate) fn validate(&self) -> Result<(), StoreError> {
        require_text("title", &self.title, BLOCK_TITLE_MAX)?;
        require_content(&self.content)
    }
}

/// Content has no length limit but must not be empty.
fn require_content(content: &str) -> Result<(), StoreError> {
    if content.is_empty() {
        return Err(StoreError::invalid("content", "cannot be empty"));
    }
    Ok(())
}

/// Require a non-empty value of at most `max` characters.
pub(crate) fn require_text(field: &'static str, value: &str, max: usize) -> Result<(), StoreError> {
    if value.is_empty() {
        return Err(StoreError::invalid(field, "cannot be empty"));
    }
    let len = value.chars().count();
    if len > max {
        return Err(StoreError::invalid(
            field,
            format!("must be at most {max} characters (got {len})"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_text_accepts_limit() {
        assert!(require_text("name", &"a".repeat(20), 20).is_ok());
    }

    #[test]
    fn test_require_text_counts_chars_not_bytes() {
        assert!(require_text("name", &"é".repeat(20), 20).is_ok());
    }

    #[test]
    fn test_require_text_rejects_too_long() {
        let err = require_text("name", &"a".repeat(21), 20).unwrap_err();
        assert!(err.to_string().contains("at most 20"));
    }

    #[test]
    fn test_require_text_rejects_empty() {
        let err = require_text("title", "", 50).unwrap_err();
        assert!(matches!(err, StoreError::Invalid { field: "title", .. }));
    }

    #[test]
    fn test_sub_navigation_name_limit() {
        let entry = NewSubNavigationEntry {
            navigation_id: 1,
            name: "a much longer name than allowed".to_owned(),
            link: "/x".to_owned(),
            position: 0,
            active: true,
        };
        assert!(entry.validate().is_err());
    }

    #[test]
    fn test_page_requires_content() {
        let page = NewPage {
            permalink: "about".to_owned(),
            title: "About".to_owned(),
            imports: None,
            content: String::new(),
            active: true,
        };

        let err = page.validate().unwrap_err();

        assert!(matches!(err, StoreError::Invalid { field: "content", .. }));
    }

    #[test]
    fn test_block_requires_content() {
        let block = NewBlock {
            title: "Footer".to_owned(),
            content: String::new(),
            active: true,
        };

        let err = block.validate().unwrap_err();

        assert!(matches!(err, StoreError::Invalid { field: "content", .. }));
    }

    #[test]
    fn test_page_serialization() {
        let page = Page {
            id: 1,
            permalink: "home".to_owned(),
            title: "Home".to_owned(),
            imports: None,
            content: "<p>Hi</p>".to_owned(),
            pub_date: DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            active: true,
        };

        let json = serde_json::to_value(&page).unwrap();

        assert_eq!(json["permalink"], "home");
        assert_eq!(json["imports"], serde_json::Value::Null);
        assert_eq!(json["pub_date"], "2025-01-01T00:00:00Z");
    }
}
