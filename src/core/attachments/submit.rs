//! Creating attachments and storing uploaded files.
//!
//! Uploaded files land in `<media>/<owner kind>/<owner id>/` (or below the
//! secure directory) under a generated unique name. The original filename is
//! kept in the attachment so downloads can use it.

use super::{file_type_filter, manager, path_resolver::AttachmentPathResolver};
use crate::{
    core::log::{EventLogger, LogContext, TargetType},
    entities::{Attachment, AttachmentType, attachment},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{PaginatorTrait, Set, prelude::*};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};
use url::Url;
use walkdir::WalkDir;

/// Data for a new attachment
#[derive(Debug, Clone)]
pub struct NewAttachment {
    pub name: String,
    pub owner: TargetType,
    pub owner_id: i64,
    pub attachment_type_id: i64,
    /// External URL; None for attachments that get a file uploaded later
    pub url: Option<String>,
    pub show_in_table: bool,
}

/// Reduces a filename stem to `[a-z0-9-]`.
fn slugify(stem: &str) -> String {
    let mut slug = String::with_capacity(stem.len());
    for c in stem.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "file".to_string()
    } else {
        slug.to_string()
    }
}

/// Generates a unique, filesystem safe name for an uploaded file.
#[must_use]
pub fn generate_filename(original_filename: &str, extension: &str) -> String {
    let stem = Path::new(original_filename)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let unique = uuid::Uuid::new_v4().simple().to_string();
    format!("{}-{}.{}", slugify(&stem), &unique[..13], extension)
}

/// Handles uploads and file moves for attachments
#[derive(Debug, Clone)]
pub struct AttachmentSubmitHandler {
    resolver: AttachmentPathResolver,
    blacklist: Vec<String>,
    logger: EventLogger,
}

impl AttachmentSubmitHandler {
    #[must_use]
    pub const fn new(
        resolver: AttachmentPathResolver,
        blacklist: Vec<String>,
        logger: EventLogger,
    ) -> Self {
        Self {
            resolver,
            blacklist,
            logger,
        }
    }

    /// Directory uploads for the given owner are stored in.
    ///
    /// # Errors
    /// Returns an error if the owner kind can not have attachments or the
    /// storage directory is not configured.
    pub fn target_directory(&self, owner: TargetType, owner_id: i64, secure: bool) -> Result<PathBuf> {
        if !owner.has_attachments() {
            return Err(Error::Validation {
                message: format!("{owner} elements can not have attachments"),
            });
        }
        let base = if secure {
            self.resolver.secure_path()
        } else {
            self.resolver.media_path()
        };
        let base = base.ok_or_else(|| Error::Config {
            message: format!(
                "{} directory is not available",
                if secure { "Secure" } else { "Media" }
            ),
        })?;
        Ok(Path::new(base).join(owner.key()).join(owner_id.to_string()))
    }

    /// Checks an uploaded filename against the global blacklist and the filter
    /// of the attachment type, returning the lower-case extension.
    ///
    /// # Errors
    /// Returns `Error::ForbiddenExtension` if the file type is not allowed.
    pub fn validate_extension(&self, filetype_filter: &str, filename: &str) -> Result<String> {
        let extension = Path::new(filename)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        if self.blacklist.iter().any(|b| b.eq_ignore_ascii_case(&extension)) {
            return Err(Error::ForbiddenExtension { extension });
        }
        if !file_type_filter::is_extension_allowed(filetype_filter, &extension) {
            return Err(Error::ForbiddenExtension { extension });
        }
        Ok(extension)
    }

    /// Creates an attachment record, optionally pointing to an external URL.
    pub async fn create_attachment<C: ConnectionTrait>(
        &self,
        db: &C,
        context: &LogContext,
        data: NewAttachment,
    ) -> Result<attachment::Model> {
        if data.name.trim().is_empty() {
            return Err(Error::Validation {
                message: "Attachment name must not be empty".into(),
            });
        }
        if !data.owner.has_attachments() {
            return Err(Error::Validation {
                message: format!("{} elements can not have attachments", data.owner),
            });
        }
        AttachmentType::find_by_id(data.attachment_type_id)
            .one(db)
            .await?
            .ok_or(Error::NotFound {
                entity: "Attachment type",
                id: data.attachment_type_id,
            })?;

        let path = match data.url {
            Some(url) => {
                let parsed = Url::parse(&url).map_err(|e| Error::Validation {
                    message: format!("Invalid URL '{url}': {e}"),
                })?;
                if !matches!(parsed.scheme(), "http" | "https") {
                    return Err(Error::Validation {
                        message: format!("Unsupported URL scheme '{}'", parsed.scheme()),
                    });
                }
                parsed.to_string()
            }
            None => String::new(),
        };

        let now = Utc::now();
        let model = attachment::ActiveModel {
            name: Set(data.name.trim().to_string()),
            element_type: Set(data.owner as i16),
            element_id: Set(data.owner_id),
            attachment_type_id: Set(data.attachment_type_id),
            path: Set(path),
            original_filename: Set(None),
            show_in_table: Set(data.show_in_table),
            created_at: Set(Some(now)),
            last_modified: Set(Some(now)),
            ..Default::default()
        }
        .insert(db)
        .await?;

        self.logger
            .log_created(db, context, TargetType::Attachment, model.id, None)
            .await?;
        Ok(model)
    }

    /// Stores an uploaded file for an attachment, replacing the previous file.
    #[instrument(skip(self, db, context, attachment, bytes), fields(attachment_id = attachment.id))]
    pub async fn upload<C: ConnectionTrait>(
        &self,
        db: &C,
        context: &LogContext,
        attachment: attachment::Model,
        original_filename: &str,
        bytes: &[u8],
        secure: bool,
    ) -> Result<attachment::Model> {
        let attachment_type = AttachmentType::find_by_id(attachment.attachment_type_id)
            .one(db)
            .await?
            .ok_or(Error::NotFound {
                entity: "Attachment type",
                id: attachment.attachment_type_id,
            })?;
        let extension = self.validate_extension(&attachment_type.filetype_filter, original_filename)?;

        let owner = TargetType::from_i16(attachment.element_type).ok_or_else(|| Error::Validation {
            message: format!("Unknown attachment owner type {}", attachment.element_type),
        })?;
        let directory = self.target_directory(owner, attachment.element_id, secure)?;
        tokio::fs::create_dir_all(&directory).await?;

        let file = directory.join(generate_filename(original_filename, &extension));
        tokio::fs::write(&file, bytes).await?;
        debug!(file = %file.display(), size = bytes.len(), "Stored uploaded file");

        let placeholder = self
            .resolver
            .real_path_to_placeholder(&file.to_string_lossy(), false)
            .ok_or_else(|| Error::InvalidPath {
                path: file.display().to_string(),
            })?;

        // The previous file goes away unless other attachments still use it
        self.delete_file_if_unused(db, &attachment).await?;

        let old = attachment.clone();
        let mut active: attachment::ActiveModel = attachment.into();
        active.path = Set(placeholder);
        active.original_filename = Set(Some(original_filename.to_string()));
        active.last_modified = Set(Some(Utc::now()));
        let updated = active.update(db).await?;

        self.logger
            .log_edited(db, context, TargetType::Attachment, updated.id, &old, &updated, None)
            .await?;
        info!(path = %updated.path, "Attachment file uploaded");
        Ok(updated)
    }

    /// Moves the file of an attachment between public and secure storage.
    /// External and built-in attachments are returned unchanged.
    pub async fn move_file<C: ConnectionTrait>(
        &self,
        db: &C,
        context: &LogContext,
        attachment: attachment::Model,
        secure: bool,
    ) -> Result<attachment::Model> {
        if manager::is_external(&attachment)
            || manager::is_builtin(&attachment)
            || attachment.path.is_empty()
            || manager::is_secure(&attachment) == secure
        {
            return Ok(attachment);
        }

        let source = self
            .resolver
            .placeholder_to_real_path(&attachment.path)
            .ok_or_else(|| Error::InvalidPath {
                path: attachment.path.clone(),
            })?;
        let file_name = Path::new(&source)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| Error::InvalidPath {
                path: attachment.path.clone(),
            })?;

        let owner = TargetType::from_i16(attachment.element_type).ok_or_else(|| Error::Validation {
            message: format!("Unknown attachment owner type {}", attachment.element_type),
        })?;
        let directory = self.target_directory(owner, attachment.element_id, secure)?;
        tokio::fs::create_dir_all(&directory).await?;
        let target = directory.join(file_name);

        // Copy and remove so moves across filesystems work too
        tokio::fs::copy(&source, &target).await?;
        tokio::fs::remove_file(&source).await?;

        let placeholder = self
            .resolver
            .real_path_to_placeholder(&target.to_string_lossy(), false)
            .ok_or_else(|| Error::InvalidPath {
                path: target.display().to_string(),
            })?;

        let old = attachment.clone();
        let mut active: attachment::ActiveModel = attachment.into();
        active.path = Set(placeholder);
        active.last_modified = Set(Some(Utc::now()));
        let updated = active.update(db).await?;

        self.logger
            .log_edited(db, context, TargetType::Attachment, updated.id, &old, &updated, None)
            .await?;
        info!(from = %old.path, to = %updated.path, "Attachment file moved");
        Ok(updated)
    }

    /// Deletes the file of an attachment unless another attachment refers to
    /// the same path. Returns whether a file was removed.
    pub async fn delete_file_if_unused<C: ConnectionTrait>(
        &self,
        db: &C,
        attachment: &attachment::Model,
    ) -> Result<bool> {
        if attachment.path.is_empty() || manager::is_external(attachment) || manager::is_builtin(attachment) {
            return Ok(false);
        }

        let other_users = Attachment::find()
            .filter(attachment::Column::Path.eq(attachment.path.as_str()))
            .filter(attachment::Column::Id.ne(attachment.id))
            .count(db)
            .await?;
        if other_users > 0 {
            debug!(path = %attachment.path, other_users, "File still in use");
            return Ok(false);
        }

        let Some(real) = self.resolver.placeholder_to_real_path(&attachment.path) else {
            warn!(path = %attachment.path, "Can not resolve attachment path");
            return Ok(false);
        };
        match tokio::fs::remove_file(&real).await {
            Ok(()) => {
                debug!(file = %real, "Deleted attachment file");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Deletes an attachment and its file.
    pub async fn delete_attachment<C: ConnectionTrait>(
        &self,
        db: &C,
        context: &LogContext,
        attachment: attachment::Model,
    ) -> Result<()> {
        self.delete_file_if_unused(db, &attachment).await?;
        remove_attachment(db, &self.logger, context, &attachment).await
    }
}

async fn remove_attachment<C: ConnectionTrait>(
    db: &C,
    logger: &EventLogger,
    context: &LogContext,
    attachment: &attachment::Model,
) -> Result<()> {
    Attachment::delete_by_id(attachment.id).exec(db).await?;
    logger
        .log_deleted(db, context, TargetType::Attachment, attachment.id, &attachment.name, attachment)
        .await?;
    Ok(())
}

/// Deletes the attachment rows of an element that is being deleted itself.
///
/// Files stay on disk; once no attachment refers to them they are reported by
/// [`find_unused_files`].
pub async fn remove_attachments_of<C: ConnectionTrait>(
    db: &C,
    logger: &EventLogger,
    context: &LogContext,
    (owner, owner_id): (TargetType, i64),
) -> Result<Vec<attachment::Model>> {
    let attachments = Attachment::find()
        .filter(attachment::Column::ElementType.eq(owner as i16))
        .filter(attachment::Column::ElementId.eq(owner_id))
        .all(db)
        .await?;
    for attachment in &attachments {
        remove_attachment(db, logger, context, attachment).await?;
    }
    if !attachments.is_empty() {
        debug!(%owner, owner_id, count = attachments.len(), "Removed attachments of deleted element");
    }
    Ok(attachments)
}

/// Lists files below the media and secure directories that no attachment
/// refers to.
pub async fn find_unused_files<C: ConnectionTrait>(
    db: &C,
    resolver: &AttachmentPathResolver,
) -> Result<Vec<PathBuf>> {
    let referenced: HashSet<String> = Attachment::find()
        .all(db)
        .await?
        .iter()
        .filter(|a| !manager::is_external(a))
        .filter_map(|a| resolver.placeholder_to_real_path(&a.path))
        .collect();

    let mut unused = Vec::new();
    for root in [resolver.media_path(), resolver.secure_path()].into_iter().flatten() {
        for entry in WalkDir::new(root).into_iter().filter_map(std::result::Result::ok) {
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path().to_string_lossy().replace('\\', "/");
            if !referenced.contains(&path) {
                unused.push(entry.into_path());
            }
        }
    }
    unused.sort();
    Ok(unused)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::config::AppConfig;
    use crate::test_utils::{create_test_attachment_type, setup_test_db};
    use tempfile::TempDir;

    fn handler(dir: &TempDir) -> AttachmentSubmitHandler {
        std::fs::create_dir_all(dir.path().join("media")).unwrap();
        std::fs::create_dir_all(dir.path().join("secure")).unwrap();
        let resolver = AttachmentPathResolver::new(
            dir.path(),
            Path::new("media"),
            Path::new("secure"),
            None,
            None,
        );
        AttachmentSubmitHandler::new(
            resolver,
            AppConfig::default().upload_blacklist,
            EventLogger::default(),
        )
    }

    fn new_attachment(type_id: i64, url: Option<&str>) -> NewAttachment {
        NewAttachment {
            name: "Datasheet".into(),
            owner: TargetType::Part,
            owner_id: 7,
            attachment_type_id: type_id,
            url: url.map(String::from),
            show_in_table: true,
        }
    }

    #[test]
    fn test_generate_filename() {
        let name = generate_filename("My Datasheet (rev 2).PDF", "pdf");
        assert!(name.starts_with("my-datasheet-rev-2-"));
        assert!(name.ends_with(".pdf"));
        assert_ne!(name, generate_filename("My Datasheet (rev 2).PDF", "pdf"));
        assert!(generate_filename("???.png", "png").starts_with("file-"));
    }

    #[test]
    fn test_validate_extension() {
        let dir = TempDir::new().unwrap();
        let handler = handler(&dir);
        assert_eq!(handler.validate_extension("", "shell.PDF").unwrap(), "pdf");
        assert!(matches!(
            handler.validate_extension("", "shell.php"),
            Err(Error::ForbiddenExtension { .. })
        ));
        // Files without extension are blacklisted too
        assert!(handler.validate_extension("", "README").is_err());
        assert!(handler.validate_extension("image/*", "photo.png").is_ok());
        assert!(handler.validate_extension("image/*", "doc.pdf").is_err());
    }

    #[test]
    fn test_target_directory() {
        let dir = TempDir::new().unwrap();
        let handler = handler(&dir);
        let public = handler.target_directory(TargetType::Part, 7, false).unwrap();
        assert!(public.ends_with("media/part/7"));
        let secure = handler.target_directory(TargetType::StorageLocation, 2, true).unwrap();
        assert!(secure.ends_with("secure/storelocation/2"));
        assert!(handler.target_directory(TargetType::PartLot, 1, false).is_err());
    }

    #[tokio::test]
    async fn test_create_external_attachment() -> Result<()> {
        let db = setup_test_db().await?;
        let dir = TempDir::new().unwrap();
        let handler = handler(&dir);
        let attachment_type = create_test_attachment_type(&db, "Datasheets", "").await?;

        let created = handler
            .create_attachment(
                &db,
                &LogContext::cli(),
                new_attachment(attachment_type.id, Some("https://example.com/ds.pdf")),
            )
            .await?;
        assert_eq!(created.path, "https://example.com/ds.pdf");
        assert!(manager::is_external(&created));

        let invalid = handler
            .create_attachment(
                &db,
                &LogContext::cli(),
                new_attachment(attachment_type.id, Some("javascript:alert(1)")),
            )
            .await;
        assert!(matches!(invalid, Err(Error::Validation { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_upload_move_and_cleanup() -> Result<()> {
        let db = setup_test_db().await?;
        let dir = TempDir::new().unwrap();
        let handler = handler(&dir);
        let context = LogContext::cli();
        let attachment_type = create_test_attachment_type(&db, "Datasheets", ".pdf").await?;

        let created = handler
            .create_attachment(&db, &context, new_attachment(attachment_type.id, None))
            .await?;
        let uploaded = handler
            .upload(&db, &context, created, "BC547.pdf", b"%PDF-1.4", false)
            .await?;
        assert!(uploaded.path.starts_with("%MEDIA%/part/7/bc547-"));
        assert_eq!(uploaded.original_filename.as_deref(), Some("BC547.pdf"));

        let rejected = handler
            .upload(&db, &context, uploaded.clone(), "photo.png", b"png", false)
            .await;
        assert!(matches!(rejected, Err(Error::ForbiddenExtension { .. })));

        let moved = handler.move_file(&db, &context, uploaded.clone(), true).await?;
        assert!(moved.path.starts_with("%SECURE%/part/7/"));
        let old_file = handler.resolver.placeholder_to_real_path(&uploaded.path).unwrap();
        assert!(!Path::new(&old_file).exists());

        // A stray file nobody refers to
        std::fs::write(dir.path().join("media/orphan.txt"), b"x").unwrap();
        let unused = find_unused_files(&db, &handler.resolver).await?;
        assert_eq!(unused.len(), 1);
        assert!(unused[0].ends_with("orphan.txt"));

        handler.delete_attachment(&db, &context, moved.clone()).await?;
        let real = handler.resolver.placeholder_to_real_path(&moved.path).unwrap();
        assert!(!Path::new(&real).exists());
        Ok(())
    }
}
