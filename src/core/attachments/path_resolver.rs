//! Conversion between placeholder paths stored in the database and real paths.
//!
//! Attachment paths are stored relative to a symbolic root so the installation
//! can be moved. `%MEDIA%/part/foo.pdf` becomes `<media dir>/part/foo.pdf`.
//! The legacy `%BASE%/data/media` prefix written by old versions still
//! resolves to the media directory.

use super::footprint_lookup;
use crate::config::AppConfig;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, warn};

const MEDIA: &str = "%MEDIA%";
const LEGACY_MEDIA: &str = "%BASE%/data/media";
const FOOTPRINTS: &str = "%FOOTPRINTS%";
const FOOTPRINTS_3D: &str = "%FOOTPRINTS_3D%";
const SECURE: &str = "%SECURE%";

static LEFTOVER_PLACEHOLDER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"%\w+%").ok());
static LEADING_PLACEHOLDER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^%\w+%").ok());

fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}

/// Resolves placeholder paths against the configured storage directories
#[derive(Debug, Clone)]
pub struct AttachmentPathResolver {
    project_dir: PathBuf,
    media_path: Option<String>,
    secure_path: Option<String>,
    footprints_path: Option<String>,
    models_path: Option<String>,
    /// `(placeholder, real path)` pairs in substitution order
    mappings: Vec<(&'static str, String)>,
}

impl AttachmentPathResolver {
    /// Creates a resolver. Relative paths are taken relative to `project_dir`;
    /// directories that do not exist disable their placeholder.
    #[must_use]
    pub fn new(
        project_dir: &Path,
        media_path: &Path,
        secure_path: &Path,
        footprints_path: Option<&Path>,
        models_path: Option<&Path>,
    ) -> Self {
        let project_dir = project_dir.to_path_buf();
        let resolve = |path: &Path| Self::absolute_path(&project_dir, path);

        let media_path = resolve(media_path);
        let secure_path = resolve(secure_path);
        let footprints_path = footprints_path.and_then(resolve);
        let models_path = models_path.and_then(resolve);

        let candidates = [
            (MEDIA, &media_path),
            (LEGACY_MEDIA, &media_path),
            (FOOTPRINTS, &footprints_path),
            (FOOTPRINTS_3D, &models_path),
            (SECURE, &secure_path),
        ];
        let mappings = candidates
            .into_iter()
            .filter_map(|(placeholder, path)| path.clone().map(|p| (placeholder, p)))
            .collect();

        debug!(
            media = ?media_path,
            secure = ?secure_path,
            footprints = ?footprints_path,
            models = ?models_path,
            "Attachment path resolver initialised"
        );

        Self {
            project_dir,
            media_path,
            secure_path,
            footprints_path,
            models_path,
            mappings,
        }
    }

    /// Creates a resolver from the application configuration.
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            &config.project_dir,
            &config.media_directory,
            &config.secure_directory,
            config.footprints_directory.as_deref(),
            config.models_directory.as_deref(),
        )
    }

    /// Canonicalises a configured path, relative paths being taken relative to
    /// the project directory. Returns None if the path does not exist.
    fn absolute_path(project_dir: &Path, path: &Path) -> Option<String> {
        let full = if path.is_absolute() {
            path.to_path_buf()
        } else {
            project_dir.join(path)
        };
        match full.canonicalize() {
            Ok(canonical) => Some(normalize_separators(&canonical.to_string_lossy())),
            Err(e) => {
                warn!(path = %full.display(), error = %e, "Configured directory is not available");
                None
            }
        }
    }

    /// Converts a placeholder path into a real path.
    ///
    /// Returns None if the path does not start with exactly one known
    /// placeholder, still contains a placeholder afterwards, or tries to leave
    /// its root directory with `..`.
    #[must_use]
    pub fn placeholder_to_real_path(&self, placeholder_path: &str) -> Option<String> {
        let mut path = if placeholder_path.contains(FOOTPRINTS) {
            footprint_lookup::convert_legacy_path(placeholder_path)
        } else {
            placeholder_path.to_string()
        };

        let mut count = 0;
        for (placeholder, real) in &self.mappings {
            if let Some(rest) = path.strip_prefix(placeholder) {
                path = format!("{real}{rest}");
                count += 1;
            }
        }

        if count != 1 {
            return None;
        }
        if LEFTOVER_PLACEHOLDER
            .as_ref()
            .is_none_or(|re| re.is_match(&path))
        {
            return None;
        }
        if path.contains("..") {
            return None;
        }

        Some(normalize_separators(&path))
    }

    /// Converts a real path into a placeholder path.
    ///
    /// With `old_version` the legacy `%BASE%/data/media` prefix is produced for
    /// media files instead of `%MEDIA%`. Returns None if the path is not inside
    /// exactly one of the configured directories.
    #[must_use]
    pub fn real_path_to_placeholder(&self, real_path: &str, old_version: bool) -> Option<String> {
        let mut path = normalize_separators(real_path);

        let mut count = 0;
        for (placeholder, real) in &self.mappings {
            if old_version && *placeholder == MEDIA {
                continue;
            }
            if let Some(rest) = path.strip_prefix(real.as_str()) {
                path = format!("{placeholder}{rest}");
                count += 1;
            }
        }

        if count != 1 {
            return None;
        }
        if !LEADING_PLACEHOLDER
            .as_ref()
            .is_some_and(|re| re.is_match(&path))
        {
            return None;
        }

        Some(path)
    }

    #[must_use]
    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    /// Real path of `%MEDIA%`
    #[must_use]
    pub fn media_path(&self) -> Option<&str> {
        self.media_path.as_deref()
    }

    /// Real path of `%SECURE%`
    #[must_use]
    pub fn secure_path(&self) -> Option<&str> {
        self.secure_path.as_deref()
    }

    /// Real path of `%FOOTPRINTS%`
    #[must_use]
    pub fn footprints_path(&self) -> Option<&str> {
        self.footprints_path.as_deref()
    }

    /// Real path of `%FOOTPRINTS_3D%`
    #[must_use]
    pub fn models_path(&self) -> Option<&str> {
        self.models_path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        root: String,
        resolver: AttachmentPathResolver,
    }

    fn fixture(with_footprints: bool) -> Fixture {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("public/media")).unwrap();
        fs::create_dir_all(dir.path().join("uploads")).unwrap();
        fs::create_dir_all(dir.path().join("public/models")).unwrap();
        if with_footprints {
            fs::create_dir_all(dir.path().join("public/img/footprints")).unwrap();
        }

        let resolver = AttachmentPathResolver::new(
            dir.path(),
            Path::new("public/media"),
            Path::new("uploads"),
            Some(Path::new("public/img/footprints")),
            Some(Path::new("public/models")),
        );
        let root = normalize_separators(&dir.path().canonicalize().unwrap().to_string_lossy());
        Fixture {
            _dir: dir,
            root,
            resolver,
        }
    }

    #[test]
    fn test_placeholder_to_real_path() {
        let f = fixture(true);
        assert_eq!(
            f.resolver.placeholder_to_real_path("%MEDIA%/part/1/datasheet.pdf"),
            Some(format!("{}/public/media/part/1/datasheet.pdf", f.root))
        );
        assert_eq!(
            f.resolver.placeholder_to_real_path("%BASE%/data/media/part/old.png"),
            Some(format!("{}/public/media/part/old.png", f.root))
        );
        assert_eq!(
            f.resolver.placeholder_to_real_path("%SECURE%\\part\\secret.pdf"),
            Some(format!("{}/uploads/part/secret.pdf", f.root))
        );
    }

    #[test]
    fn test_legacy_footprint_paths_are_translated() {
        let f = fixture(true);
        assert_eq!(
            f.resolver
                .placeholder_to_real_path("%FOOTPRINTS%/Aktiv/Transistoren/TO92.png"),
            Some(format!("{}/public/img/footprints/Active/Transistors/TO92.png", f.root))
        );
    }

    #[test]
    fn test_invalid_placeholder_paths() {
        let f = fixture(true);
        // No placeholder at all
        assert!(f.resolver.placeholder_to_real_path("/etc/passwd").is_none());
        // Placeholder not at the start
        assert!(f.resolver.placeholder_to_real_path("foo/%MEDIA%/bar").is_none());
        // Unknown placeholder left over
        assert!(f.resolver.placeholder_to_real_path("%MEDIA%/%FOO%/bar").is_none());
        // Directory traversal
        assert!(f.resolver.placeholder_to_real_path("%MEDIA%/../config.toml").is_none());
    }

    #[test]
    fn test_missing_directory_disables_placeholder() {
        let f = fixture(false);
        assert!(f.resolver.footprints_path().is_none());
        assert!(f.resolver.placeholder_to_real_path("%FOOTPRINTS%/Passive/R.png").is_none());
        assert!(f.resolver.models_path().is_some());
    }

    #[test]
    fn test_real_path_to_placeholder() {
        let f = fixture(true);
        let real = format!("{}/public/media/part/1/datasheet.pdf", f.root);
        assert_eq!(
            f.resolver.real_path_to_placeholder(&real, false).as_deref(),
            Some("%MEDIA%/part/1/datasheet.pdf")
        );
        assert_eq!(
            f.resolver.real_path_to_placeholder(&real, true).as_deref(),
            Some("%BASE%/data/media/part/1/datasheet.pdf")
        );

        let secure = format!("{}/uploads/user/avatar.png", f.root);
        assert_eq!(
            f.resolver.real_path_to_placeholder(&secure, false).as_deref(),
            Some("%SECURE%/user/avatar.png")
        );

        assert!(f.resolver.real_path_to_placeholder("/somewhere/else.txt", false).is_none());
    }
}
