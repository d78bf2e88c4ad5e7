//! SQLite content store for the site CMS.
//!
//! Holds the six record kinds the site is built from:
//!
//! - navigation entries and their sub-navigation entries
//! - pages, addressed by permalink
//! - footers and banners
//! - uploaded static files
//!
//! Static files are the only records with on-disk state. Their placement is
//! decided by [`UploadPolicy`], and the create/replace/delete operations on
//! [`Store`] keep the database row and the file in step (see
//! [`Store::create_static_file`]).
//!
//! Pages are rendered from a [`PageContext`], built by [`Store::page_context`].
//!
//! # Example
//!
//! ```ignore
//! use cms_store::{Store, UploadPolicy};
//!
//! let store = Store::open("cms.sqlite3", UploadPolicy::new("static/cms/uploads")).await?;
//! let logo = store.create_static_file("logo.png", &bytes).await?;
//! assert_eq!(logo.file, "images/logo.png");
//!
//! let context = store.page_context("", "G-XXXX").await?; // home page
//! ```

mod context;
mod error;
mod models;
mod placement;
mod schema;
mod static_files;
mod store;

pub use context::{HOME_PERMALINK, NavigationNode, PageContext, normalize_permalink};
pub use error::StoreError;
pub use models::{
    Banner, Footer, NavigationEntry, NewBlock, NewNavigationEntry, NewPage,
    NewSubNavigationEntry, Page, StaticFile, SubNavigationEntry,
};
pub use placement::{DEFAULT_SUBDIRECTORIES, UploadPolicy, validate_filename};
pub use store::Store;
