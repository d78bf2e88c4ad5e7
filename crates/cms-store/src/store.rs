//! SQLite-backed content store.

use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

use crate::error::{StoreError, is_foreign_key_violation, is_unique_violation};
use crate::models::{
    Banner, Footer, NavigationEntry, NewBlock, NewNavigationEntry, NewPage,
    NewSubNavigationEntry, Page, SubNavigationEntry,
};
use crate::placement::UploadPolicy;
use crate::schema;

/// Content store: database pool plus the upload placement policy.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct Store {
    pub(crate) pool: SqlitePool,
    pub(crate) uploads: UploadPolicy,
}

impl Store {
    /// Open (creating if needed) the database at `path` and apply the schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created, the
    /// database cannot be opened, or the schema fails to apply.
    pub async fn open(path: impl AsRef<Path>, uploads: UploadPolicy) -> Result<Self, StoreError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        schema::migrate(&pool).await?;
        tracing::info!(database = %path.display(), uploads = %uploads.root().display(), "Store opened");

        Ok(Self { pool, uploads })
    }

    /// Upload placement policy.
    #[must_use]
    pub fn uploads(&self) -> &UploadPolicy {
        &self.uploads
    }

    /// Close the connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    // Navigation

    /// Create a navigation entry.
    pub async fn create_navigation(
        &self,
        new: &NewNavigationEntry,
    ) -> Result<NavigationEntry, StoreError> {
        new.validate()?;
        let id = sqlx::query(
            "INSERT INTO navigation (name, link, position, active) VALUES (?, ?, ?, ?)",
        )
        .bind(&new.name)
        .bind(&new.link)
        .bind(new.position)
        .bind(new.active)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        self.get_navigation(id)
            .await?
            .ok_or(StoreError::NotFound { entity: "navigation entry", id })
    }

    /// Look up a navigation entry by id.
    pub async fn get_navigation(&self, id: i64) -> Result<Option<NavigationEntry>, StoreError> {
        let entry = sqlx::query_as("SELECT * FROM navigation WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(entry)
    }

    /// Delete a navigation entry together with its sub-navigation entries.
    pub async fn delete_navigation(&self, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM navigation WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { entity: "navigation entry", id });
        }
        Ok(())
    }

    /// Create a sub-navigation entry under an existing navigation entry.
    pub async fn create_sub_navigation(
        &self,
        new: &NewSubNavigationEntry,
    ) -> Result<SubNavigationEntry, StoreError> {
        new.validate()?;
        let id = sqlx::query(
            "INSERT INTO sub_navigation (navigation_id, name, link, position, active) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(new.navigation_id)
        .bind(&new.name)
        .bind(&new.link)
        .bind(new.position)
        .bind(new.active)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                StoreError::NotFound {
                    entity: "navigation entry",
                    id: new.navigation_id,
                }
            } else {
                e.into()
            }
        })?
        .last_insert_rowid();

        sqlx::query_as("SELECT * FROM sub_navigation WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound { entity: "sub-navigation entry", id })
    }

    /// All sub-navigation entries of a navigation entry, active or not.
    pub async fn list_sub_navigation(
        &self,
        navigation_id: i64,
    ) -> Result<Vec<SubNavigationEntry>, StoreError> {
        let entries = sqlx::query_as(
            "SELECT * FROM sub_navigation WHERE navigation_id = ? ORDER BY position, id",
        )
        .bind(navigation_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    /// Toggle the active flag of a navigation entry.
    pub async fn set_navigation_active(&self, id: i64, active: bool) -> Result<(), StoreError> {
        self.set_active("navigation", "navigation entry", id, active).await
    }

    /// Toggle the active flag of a sub-navigation entry.
    pub async fn set_sub_navigation_active(&self, id: i64, active: bool) -> Result<(), StoreError> {
        self.set_active("sub_navigation", "sub-navigation entry", id, active)
            .await
    }

    // Pages

    /// Create a page. The publish date is set to now.
    pub async fn create_page(&self, new: &NewPage) -> Result<Page, StoreError> {
        new.validate()?;
        let id = sqlx::query(
            "INSERT INTO pages (permalink, title, imports, content, pub_date, active) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&new.permalink)
        .bind(&new.title)
        .bind(&new.imports)
        .bind(&new.content)
        .bind(Utc::now())
        .bind(new.active)
        .execute(&self.pool)
        .await
        .map_err(|e| permalink_error(e, &new.permalink))?
        .last_insert_rowid();

        self.get_page(id)
            .await?
            .ok_or(StoreError::NotFound { entity: "page", id })
    }

    /// Look up a page by id.
    pub async fn get_page(&self, id: i64) -> Result<Option<Page>, StoreError> {
        let page = sqlx::query_as("SELECT * FROM pages WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(page)
    }

    /// Update a page's editable fields. The publish date is left untouched.
    pub async fn update_page(&self, id: i64, new: &NewPage) -> Result<Page, StoreError> {
        new.validate()?;
        let result = sqlx::query(
            "UPDATE pages SET permalink = ?, title = ?, imports = ?, content = ?, active = ? \
             WHERE id = ?",
        )
        .bind(&new.permalink)
        .bind(&new.title)
        .bind(&new.imports)
        .bind(&new.content)
        .bind(new.active)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| permalink_error(e, &new.permalink))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { entity: "page", id });
        }
        self.get_page(id)
            .await?
            .ok_or(StoreError::NotFound { entity: "page", id })
    }

    /// Toggle the active flag of a page.
    pub async fn set_page_active(&self, id: i64, active: bool) -> Result<(), StoreError> {
        self.set_active("pages", "page", id, active).await
    }

    // Footers and banners

    /// Create a footer. The publish date is set to now.
    pub async fn create_footer(&self, new: &NewBlock) -> Result<Footer, StoreError> {
        let id = self.insert_block("footers", new).await?;
        sqlx::query_as("SELECT * FROM footers WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound { entity: "footer", id })
    }

    /// Create a banner. The publish date is set to now.
    pub async fn create_banner(&self, new: &NewBlock) -> Result<Banner, StoreError> {
        let id = self.insert_block("banners", new).await?;
        sqlx::query_as("SELECT * FROM banners WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound { entity: "banner", id })
    }

    /// Toggle the active flag of a footer.
    pub async fn set_footer_active(&self, id: i64, active: bool) -> Result<(), StoreError> {
        self.set_active("footers", "footer", id, active).await
    }

    /// Toggle the active flag of a banner.
    pub async fn set_banner_active(&self, id: i64, active: bool) -> Result<(), StoreError> {
        self.set_active("banners", "banner", id, active).await
    }

    async fn insert_block(&self, table: &'static str, new: &NewBlock) -> Result<i64, StoreError> {
        new.validate()?;
        let id = sqlx::query(&format!(
            "INSERT INTO {table} (title, content, pub_date, active) VALUES (?, ?, ?, ?)"
        ))
        .bind(&new.title)
        .bind(&new.content)
        .bind(Utc::now())
        .bind(new.active)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();
        Ok(id)
    }

    /// Set `active` on a row of one of the soft-enabled tables.
    ///
    /// `table` is always a compile-time constant from this module.
    async fn set_active(
        &self,
        table: &'static str,
        entity: &'static str,
        id: i64,
        active: bool,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(&format!("UPDATE {table} SET active = ? WHERE id = ?"))
            .bind(active)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { entity, id });
        }
        Ok(())
    }
}

/// Map a UNIQUE violation on `pages.permalink` to a duplicate error.
fn permalink_error(err: sqlx::Error, permalink: &str) -> StoreError {
    if is_unique_violation(&err) {
        StoreError::DuplicatePermalink(permalink.to_owned())
    } else {
        err.into()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    /// Store backed by a temporary database and uploads root.
    pub(crate) async fn test_store() -> (Store, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let uploads = UploadPolicy::new(dir.path().join("static/cms/uploads"));
        let store = Store::open(dir.path().join("cms.sqlite3"), uploads)
            .await
            .unwrap();
        (store, dir)
    }

    pub(crate) fn nav(name: &str, position: i32, active: bool) -> NewNavigationEntry {
        NewNavigationEntry {
            name: name.to_owned(),
            link: format!("/{}", name.to_lowercase()),
            position,
            active,
        }
    }

    pub(crate) fn sub_nav(
        navigation_id: i64,
        name: &str,
        position: i32,
        active: bool,
    ) -> NewSubNavigationEntry {
        NewSubNavigationEntry {
            navigation_id,
            name: name.to_owned(),
            link: format!("/{}", name.to_lowercase()),
            position,
            active,
        }
    }

    pub(crate) fn page(permalink: &str, active: bool) -> NewPage {
        NewPage {
            permalink: permalink.to_owned(),
            title: format!("Title of {permalink}"),
            imports: None,
            content: format!("<p>{permalink}</p>"),
            active,
        }
    }

    pub(crate) fn block(title: &str, active: bool) -> NewBlock {
        NewBlock {
            title: title.to_owned(),
            content: format!("<div>{title}</div>"),
            active,
        }
    }

    #[tokio::test]
    async fn test_open_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("nested/cms.sqlite3");
        let uploads = UploadPolicy::new(dir.path());

        let store = Store::open(&db, uploads.clone()).await.unwrap();
        store.create_page(&page("home", true)).await.unwrap();
        store.close().await;

        let reopened = Store::open(&db, uploads).await.unwrap();
        assert!(reopened.get_page(1).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_create_page_rejects_duplicate_permalink() {
        let (store, _dir) = test_store().await;
        store.create_page(&page("about", true)).await.unwrap();

        let err = store.create_page(&page("about", false)).await.unwrap_err();

        assert!(matches!(err, StoreError::DuplicatePermalink(p) if p == "about"));
    }

    #[tokio::test]
    async fn test_create_page_validates_lengths() {
        let (store, _dir) = test_store().await;
        let mut new = page("about", true);
        new.title = "t".repeat(51);

        let err = store.create_page(&new).await.unwrap_err();

        assert!(matches!(err, StoreError::Invalid { field: "title", .. }));
    }

    #[tokio::test]
    async fn test_update_page_keeps_pub_date() {
        let (store, _dir) = test_store().await;
        let created = store.create_page(&page("about", true)).await.unwrap();

        let mut edit = page("about-us", true);
        edit.imports = Some("<link rel=\"stylesheet\" href=\"/x.css\">".to_owned());
        let updated = store.update_page(created.id, &edit).await.unwrap();

        assert_eq!(updated.permalink, "about-us");
        assert_eq!(updated.imports, edit.imports);
        assert_eq!(updated.pub_date, created.pub_date);
    }

    #[tokio::test]
    async fn test_update_missing_page() {
        let (store, _dir) = test_store().await;
        let err = store.update_page(42, &page("x", true)).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: "page", id: 42 }));
    }

    #[tokio::test]
    async fn test_delete_navigation_cascades() {
        let (store, _dir) = test_store().await;
        let parent = store.create_navigation(&nav("About", 1, true)).await.unwrap();
        store
            .create_sub_navigation(&sub_nav(parent.id, "Team", 1, true))
            .await
            .unwrap();
        store
            .create_sub_navigation(&sub_nav(parent.id, "History", 2, false))
            .await
            .unwrap();
        assert_eq!(store.list_sub_navigation(parent.id).await.unwrap().len(), 2);

        store.delete_navigation(parent.id).await.unwrap();

        assert!(store.get_navigation(parent.id).await.unwrap().is_none());
        assert!(store.list_sub_navigation(parent.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sub_navigation_requires_parent() {
        let (store, _dir) = test_store().await;
        let err = store
            .create_sub_navigation(&sub_nav(99, "Orphan", 1, true))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { id: 99, .. }));
    }

    #[tokio::test]
    async fn test_set_active_missing_row() {
        let (store, _dir) = test_store().await;
        let err = store.set_footer_active(7, false).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: "footer", id: 7 }));
    }

    #[tokio::test]
    async fn test_create_footer_and_banner() {
        let (store, _dir) = test_store().await;

        let footer = store.create_footer(&block("Contact", true)).await.unwrap();
        let banner = store.create_banner(&block("Sale", false)).await.unwrap();

        assert_eq!(footer.title, "Contact");
        assert!(footer.active);
        assert_eq!(banner.content, "<div>Sale</div>");
        assert!(!banner.active);
    }
}
