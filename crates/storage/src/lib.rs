pub mod backend;
pub mod error;
mod file;
mod list;
mod path;

pub use crate::backend::StorageBackend;
pub use crate::file::ListedFile;
pub use crate::list::{list, list_stream};
pub use crate::path::validate as validate_path;
use std::sync::Arc;

pub type BackendHandle = Arc<dyn StorageBackend + Send + Sync>;
