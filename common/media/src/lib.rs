pub mod config;
pub mod error;
pub mod normalizer;
pub mod product;

pub use config::{MediaConfig, RuntimeMode, DEFAULT_BACKEND_URL};
pub use error::MediaConfigError;
pub use normalizer::{drive_file_id, ImageUrlNormalizer, DRIVE_CONTENT_HOST};
pub use product::{ImageEntry, ImageObject, ProductImageFields};
