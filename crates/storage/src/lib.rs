pub mod backend;
pub mod error;
mod filter;
mod models;
mod path;

pub use crate::backend::Filesystem;
pub use crate::filter::{MimeFilter, UNKNOWN_MIME_TYPE};
pub use crate::models::{SourceFile, TransferMode, local_timestamp};
pub use crate::path::confine;
use std::sync::Arc;

pub type FilesystemHandle = Arc<dyn Filesystem + Send + Sync>;
