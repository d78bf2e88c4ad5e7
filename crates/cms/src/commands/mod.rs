//! CLI command implementations.

pub(crate) mod serve;
pub(crate) mod static_files;

pub(crate) use serve::ServeArgs;
pub(crate) use static_files::StaticCommand;
