//! Attachment handling - path placeholders, file type filters and uploads.

pub mod file_type_filter;
pub mod footprint_lookup;
pub mod manager;
pub mod path_resolver;
pub mod submit;

pub use manager::AttachmentManager;
pub use path_resolver::AttachmentPathResolver;
pub use submit::{AttachmentSubmitHandler, NewAttachment};
