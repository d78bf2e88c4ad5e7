//! Page render context.
//!
//! Assembles everything the page template needs for one permalink: the
//! page itself, the active navigation tree, the current footer and banner,
//! and the analytics tracking code.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::StoreError;
use crate::models::{Banner, Footer, NavigationEntry, Page, SubNavigationEntry};
use crate::store::Store;

/// Permalink served when the request names no page.
pub const HOME_PERMALINK: &str = "home";

/// Active navigation entry with its active children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationNode {
    #[serde(flatten)]
    pub entry: NavigationEntry,
    /// Active sub-entries, ordered by position.
    pub children: Vec<SubNavigationEntry>,
}

/// View model for rendering one page.
#[derive(Debug, Clone, Serialize)]
pub struct PageContext {
    pub page: Page,
    pub navigation: Vec<NavigationNode>,
    pub footer: Option<Footer>,
    pub banner: Option<Banner>,
    /// Analytics tracking code (empty when tracking is disabled).
    pub analytics_code: String,
}

/// Map the empty permalink to [`HOME_PERMALINK`].
#[must_use]
pub fn normalize_permalink(permalink: &str) -> &str {
    if permalink.is_empty() {
        HOME_PERMALINK
    } else {
        permalink
    }
}

impl Store {
    /// Build the render context for `permalink`.
    ///
    /// An empty permalink means the home page.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::PageNotFound`] if no active page has this permalink.
    pub async fn page_context(
        &self,
        permalink: &str,
        analytics_code: &str,
    ) -> Result<PageContext, StoreError> {
        let permalink = normalize_permalink(permalink);

        let page = self
            .active_page(permalink)
            .await?
            .ok_or_else(|| StoreError::PageNotFound(permalink.to_owned()))?;

        Ok(PageContext {
            page,
            navigation: self.navigation_tree().await?,
            footer: self.current_footer().await?,
            banner: self.current_banner().await?,
            analytics_code: analytics_code.to_owned(),
        })
    }

    /// The active page with this permalink, if any.
    pub async fn active_page(&self, permalink: &str) -> Result<Option<Page>, StoreError> {
        let page = sqlx::query_as("SELECT * FROM pages WHERE permalink = ? AND active = 1")
            .bind(permalink)
            .fetch_optional(&self.pool)
            .await?;
        Ok(page)
    }

    /// The first active footer (lowest id).
    pub async fn current_footer(&self) -> Result<Option<Footer>, StoreError> {
        let footer = sqlx::query_as("SELECT * FROM footers WHERE active = 1 ORDER BY id LIMIT 1")
            .fetch_optional(&self.pool)
            .await?;
        Ok(footer)
    }

    /// The first active banner (lowest id).
    pub async fn current_banner(&self) -> Result<Option<Banner>, StoreError> {
        let banner = sqlx::query_as("SELECT * FROM banners WHERE active = 1 ORDER BY id LIMIT 1")
            .fetch_optional(&self.pool)
            .await?;
        Ok(banner)
    }

    /// Active navigation entries by position, each with its active children.
    pub async fn navigation_tree(&self) -> Result<Vec<NavigationNode>, StoreError> {
        let entries: Vec<NavigationEntry> =
            sqlx::query_as("SELECT * FROM navigation WHERE active = 1 ORDER BY position, id")
                .fetch_all(&self.pool)
                .await?;

        let children: Vec<SubNavigationEntry> = sqlx::query_as(
            "SELECT s.* FROM sub_navigation s \
             JOIN navigation n ON n.id = s.navigation_id \
             WHERE s.active = 1 AND n.active = 1 \
             ORDER BY s.navigation_id, s.position, s.id",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut by_parent: HashMap<i64, Vec<SubNavigationEntry>> = HashMap::new();
        for child in children {
            by_parent.entry(child.navigation_id).or_default().push(child);
        }

        Ok(entries
            .into_iter()
            .map(|entry| NavigationNode {
                children: by_parent.remove(&entry.id).unwrap_or_default(),
                entry,
            })
            .collect())
    }
}
