//! Photo storage for listings
//!
//! Uploaded images are kept as plain files in an uploads directory, named by
//! a sanitized version of the browser-supplied filename. Same name twice
//! means the second upload overwrites the first; nothing deduplicates and
//! nothing cleans up after a listing is deleted.

use std::io;
use std::path::{Component, Path, PathBuf};

/// File store for listing photos
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    /// Create a store rooted at the given directory, creating it if needed.
    pub fn new(root: &Path) -> Self {
        if let Err(e) = std::fs::create_dir_all(root) {
            log::warn!("Failed to create uploads directory: {}", e);
        } else {
            log::info!("Uploads directory: {:?}", root);
        }

        Self {
            root: root.to_path_buf(),
        }
    }

    /// Directory the store writes into
    pub fn dir(&self) -> &Path {
        &self.root
    }

    fn file_path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Sanitize the browser-supplied name, write the photo bytes under it,
    /// and return the stored name. Same name twice overwrites. A name that
    /// sanitizes to nothing skips the write and returns the empty string;
    /// the listing then simply has no photo.
    pub fn save(&self, client_name: &str, bytes: &[u8]) -> io::Result<String> {
        let name = sanitize_filename(client_name);
        if name.is_empty() {
            log::warn!(
                "Upload name {:?} sanitized to nothing, not storing the photo",
                client_name
            );
            return Ok(String::new());
        }

        let path = self.file_path(&name);
        std::fs::write(&path, bytes)?;
        log::debug!("Stored upload {:?} ({} bytes)", path, bytes.len());
        Ok(name)
    }

    /// Read a stored photo by name.
    ///
    /// Names with path separators or parent components are refused, so a
    /// request cannot read outside the uploads directory. Missing files
    /// come back as None.
    pub fn read(&self, name: &str) -> Option<Vec<u8>> {
        let has_only_normal_components = Path::new(name)
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if name.is_empty() || !has_only_normal_components {
            log::debug!("Refusing upload name outside the store: {:?}", name);
            return None;
        }

        match std::fs::read(self.file_path(name)) {
            Ok(bytes) => Some(bytes),
            Err(_) => None,
        }
    }
}

/// Reduce a browser-supplied filename to a safe ASCII name.
///
/// Path separators become word breaks, whitespace runs collapse to a single
/// underscore, and everything outside `[A-Za-z0-9_.-]` is dropped (non-ASCII
/// included). Leading and trailing dots and underscores are trimmed. The
/// result can be empty, e.g. for a fully non-ASCII name; callers store the
/// empty string and the listing simply has no photo.
pub fn sanitize_filename(name: &str) -> String {
    let mut flattened = String::with_capacity(name.len());
    for ch in name.chars() {
        match ch {
            '/' | '\\' => flattened.push(' '),
            c if c.is_ascii() => flattened.push(c),
            _ => {}
        }
    }

    let joined = flattened.split_whitespace().collect::<Vec<_>>().join("_");
    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();

    kept.trim_matches(|c| c == '.' || c == '_').to_string()
}

/// Guess a Content-Type from the filename extension.
///
/// Only the handful of formats browsers actually upload are mapped;
/// everything else is served as a generic byte stream.
pub fn content_type_for(name: &str) -> &'static str {
    let ext = match name.rsplit_once('.') {
        Some((_, ext)) => ext.to_ascii_lowercase(),
        None => return "application/octet-stream",
    };

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}
