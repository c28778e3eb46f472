//! Attachment classification and access to the stored files.

use super::path_resolver::AttachmentPathResolver;
use crate::entities::attachment;
use std::path::Path;
use url::Url;

/// Placeholders of files stored by the application
const INTERNAL_PLACEHOLDERS: &[&str] = &["%BASE%", "%MEDIA%", "%SECURE%"];
/// Placeholders of files shipped with the application
const BUILTIN_PLACEHOLDERS: &[&str] = &["%FOOTPRINTS%", "%FOOTPRINTS_3D%"];

/// Extensions shown as pictures
pub const PICTURE_EXTS: &[&str] = &["gif", "png", "svg", "bmp", "jpeg", "jpg", "jpe", "webp"];
/// Extensions shown in the 3D viewer
pub const MODEL_EXTS: &[&str] = &["x3d"];

fn first_segment(path: &str) -> &str {
    path.split('/').next().unwrap_or_default()
}

fn extension_of(path: &str) -> Option<String> {
    Path::new(path)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
}

/// Whether the attachment links to an external URL instead of a stored file
#[must_use]
pub fn is_external(attachment: &attachment::Model) -> bool {
    if attachment.path.is_empty() {
        return false;
    }
    let root = first_segment(&attachment.path);
    !INTERNAL_PLACEHOLDERS.contains(&root) && !BUILTIN_PLACEHOLDERS.contains(&root)
}

/// Whether the file is stored outside the public media directory
#[must_use]
pub fn is_secure(attachment: &attachment::Model) -> bool {
    first_segment(&attachment.path) == "%SECURE%"
}

/// Whether the file ships with the application (footprint pictures and models)
#[must_use]
pub fn is_builtin(attachment: &attachment::Model) -> bool {
    BUILTIN_PLACEHOLDERS.contains(&first_segment(&attachment.path))
}

/// Lower-case file extension, taken from the original filename if known.
#[must_use]
pub fn extension(attachment: &attachment::Model) -> Option<String> {
    if let Some(name) = attachment.original_filename.as_deref().filter(|n| !n.is_empty()) {
        return extension_of(name);
    }
    if is_external(attachment) {
        return Url::parse(&attachment.path)
            .ok()
            .and_then(|url| extension_of(url.path()));
    }
    extension_of(&attachment.path)
}

/// Whether the attachment can be shown as a picture. External links without a
/// recognisable extension are assumed to be pictures.
#[must_use]
pub fn is_picture(attachment: &attachment::Model) -> bool {
    match extension(attachment) {
        Some(ext) => PICTURE_EXTS.contains(&ext.as_str()),
        None => is_external(attachment),
    }
}

/// Whether the attachment is a 3D model. Only stored files qualify.
#[must_use]
pub fn is_3d_model(attachment: &attachment::Model) -> bool {
    !is_external(attachment)
        && extension(attachment).is_some_and(|ext| MODEL_EXTS.contains(&ext.as_str()))
}

/// Host of an external link
#[must_use]
pub fn host(attachment: &attachment::Model) -> Option<String> {
    if !is_external(attachment) {
        return None;
    }
    Url::parse(&attachment.path)
        .ok()
        .and_then(|url| url.host_str().map(String::from))
}

/// Filename shown to users. External links have none.
#[must_use]
pub fn filename(attachment: &attachment::Model) -> Option<String> {
    if is_external(attachment) {
        return None;
    }
    attachment
        .original_filename
        .clone()
        .filter(|n| !n.is_empty())
        .or_else(|| {
            Path::new(&attachment.path)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
        })
}

/// Formats a byte count like `1.50K` (powers of 1024).
#[must_use]
pub fn human_file_size(bytes: u64, decimals: usize) -> String {
    const UNITS: [char; 6] = ['B', 'K', 'M', 'G', 'T', 'P'];
    let digits = bytes.to_string().len();
    let factor = ((digits - 1) / 3).min(UNITS.len() - 1);
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    let value = bytes as f64 / 1024f64.powi(factor as i32);
    format!("{value:.decimals$}{}", UNITS[factor])
}

/// Access to the files behind attachments
#[derive(Debug, Clone)]
pub struct AttachmentManager {
    resolver: AttachmentPathResolver,
}

impl AttachmentManager {
    #[must_use]
    pub const fn new(resolver: AttachmentPathResolver) -> Self {
        Self { resolver }
    }

    #[must_use]
    pub const fn resolver(&self) -> &AttachmentPathResolver {
        &self.resolver
    }

    /// Absolute path of the stored file, None for external links and invalid paths.
    #[must_use]
    pub fn to_absolute_path(&self, attachment: &attachment::Model) -> Option<String> {
        if attachment.path.is_empty() || is_external(attachment) {
            return None;
        }
        self.resolver.placeholder_to_real_path(&attachment.path)
    }

    /// Whether the stored file exists on disk
    pub async fn is_file_existing(&self, attachment: &attachment::Model) -> bool {
        match self.to_absolute_path(attachment) {
            Some(path) => tokio::fs::try_exists(&path).await.unwrap_or(false),
            None => false,
        }
    }

    /// Size of the stored file in bytes, None if there is no readable file.
    pub async fn file_size(&self, attachment: &attachment::Model) -> Option<u64> {
        let path = self.to_absolute_path(attachment)?;
        tokio::fs::metadata(&path).await.ok().map(|m| m.len())
    }

    /// File size formatted with [`human_file_size`]
    pub async fn human_file_size(&self, attachment: &attachment::Model) -> Option<String> {
        self.file_size(attachment)
            .await
            .map(|size| human_file_size(size, 2))
    }
}
