//! Accept filters restricting which files can be uploaded for an attachment type.
//!
//! A filter is a comma separated list of extensions (`.pdf`), MIME types
//! (`application/pdf`) and the wildcards `image/*`, `audio/*` and `video/*`,
//! the same syntax as the HTML `accept` attribute.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

const IMAGE_EXTS: &[&str] = &["gif", "png", "svg", "bmp", "jpeg", "jpg", "jpe", "webp"];
const VIDEO_EXTS: &[&str] = &["mp4", "ogv", "ogg", "webm"];
const AUDIO_EXTS: &[&str] = &["mp3", "flac", "ogg", "oga", "wav", "m4a", "opus"];

const WILDCARDS: &[&str] = &["image/*", "audio/*", "video/*"];

/// Extensions of the concrete MIME types a filter may name
const MIME_EXTENSIONS: &[(&str, &[&str])] = &[
    ("application/pdf", &["pdf"]),
    ("application/zip", &["zip"]),
    ("application/json", &["json"]),
    ("application/xml", &["xml"]),
    ("application/msword", &["doc"]),
    (
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        &["docx"],
    ),
    ("application/vnd.ms-excel", &["xls"]),
    (
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        &["xlsx"],
    ),
    ("application/vnd.oasis.opendocument.text", &["odt"]),
    ("application/vnd.oasis.opendocument.spreadsheet", &["ods"]),
    ("application/step", &["step", "stp"]),
    ("text/plain", &["txt", "text", "conf", "def", "list", "log", "in", "ini"]),
    ("text/csv", &["csv"]),
    ("text/markdown", &["md", "markdown"]),
    ("text/html", &["html", "htm"]),
    ("image/png", &["png"]),
    ("image/jpeg", &["jpeg", "jpg", "jpe"]),
    ("image/gif", &["gif"]),
    ("image/bmp", &["bmp"]),
    ("image/svg+xml", &["svg", "svgz"]),
    ("image/webp", &["webp"]),
    ("image/tiff", &["tiff", "tif"]),
    ("model/x3d+xml", &["x3d"]),
    ("model/stl", &["stl"]),
    ("video/mp4", &["mp4", "mp4v", "mpg4"]),
    ("video/webm", &["webm"]),
    ("audio/mpeg", &["mp3", "mpga", "mp2", "mp2a", "m2a", "m3a"]),
    ("audio/ogg", &["ogg", "oga", "spx", "opus"]),
    ("audio/wav", &["wav"]),
    ("audio/flac", &["flac"]),
];

static FILTER_ELEMENT: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^(\.\w+|[-\w.+]+/[-\w.+]+|(image|audio|video)/\*)$").ok());

fn is_valid_element(element: &str) -> bool {
    FILTER_ELEMENT
        .as_ref()
        .is_some_and(|re| re.is_match(element))
}

/// Checks that every element of a filter is an extension, a MIME type or a
/// supported wildcard. The empty filter is valid.
#[must_use]
pub fn validate_filter_string(filter: &str) -> bool {
    let filter = filter.trim();
    filter.is_empty() || filter.split(',').map(str::trim).all(is_valid_element)
}

/// Normalizes a user supplied filter.
///
/// Spaces and semicolons become commas, everything is lower-cased, `*.ext` and
/// bare words become `.ext`, `image` and `image/` become `image/*` (same for
/// audio and video). Invalid elements and duplicates are dropped.
#[must_use]
pub fn normalize_filter_string(filter: &str) -> String {
    let unified = filter.replace([';', ' '], ",").to_lowercase();

    let mut elements: Vec<String> = Vec::new();
    for element in unified.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let element = if let Some(ext) = element.strip_prefix("*.") {
            format!(".{ext}")
        } else if let Some(kind) = ["image", "audio", "video"]
            .into_iter()
            .find(|k| element == *k || element.strip_suffix('/') == Some(*k))
        {
            format!("{kind}/*")
        } else if !element.starts_with('.')
            && !element.contains('/')
            && element.chars().all(|c| c.is_alphanumeric() || c == '_')
        {
            format!(".{element}")
        } else {
            element.to_string()
        };

        if is_valid_element(&element) && !elements.contains(&element) {
            elements.push(element);
        }
    }

    elements.join(",")
}

/// Returns the lower-case extensions (without dot) a filter accepts.
#[must_use]
pub fn resolve_file_extensions(filter: &str) -> BTreeSet<String> {
    let normalized = normalize_filter_string(filter);
    let mut extensions = BTreeSet::new();

    for element in normalized.split(',').filter(|e| !e.is_empty()) {
        let resolved: Vec<&str> = if let Some(ext) = element.strip_prefix('.') {
            vec![ext]
        } else if WILDCARDS.contains(&element) {
            match element {
                "image/*" => IMAGE_EXTS.to_vec(),
                "audio/*" => AUDIO_EXTS.to_vec(),
                _ => VIDEO_EXTS.to_vec(),
            }
        } else {
            MIME_EXTENSIONS
                .iter()
                .find(|(mime, _)| *mime == element)
                .map(|(_, exts)| exts.to_vec())
                .unwrap_or_default()
        };
        extensions.extend(resolved.into_iter().map(String::from));
    }

    extensions
}

/// Checks whether a file extension passes a filter. An empty filter allows
/// every extension.
#[must_use]
pub fn is_extension_allowed(filter: &str, extension: &str) -> bool {
    if filter.trim().is_empty() {
        return true;
    }
    let extension = extension.trim_start_matches('.').to_lowercase();
    resolve_file_extensions(filter).contains(&extension)
}
