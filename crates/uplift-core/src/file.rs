//! Selected file and finalization metadata types.

use bytes::Bytes;
use mime::Mime;

/// A file the user picked for upload.
///
/// Holds the original name, MIME type, and the raw contents. The byte size
/// is always derived from the contents so the finalized metadata can never
/// drift from what was actually transferred.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    /// Original file name, extension included.
    pub name: String,
    /// MIME type reported by the picker.
    pub content_type: Mime,
    /// Raw file contents.
    pub contents: Bytes,
}

impl SelectedFile {
    /// Creates a new selected file.
    pub fn new(name: impl Into<String>, content_type: Mime, contents: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            content_type,
            contents: contents.into(),
        }
    }

    /// Byte size of the file contents.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.contents.len() as u64
    }

    /// Splits the file name into base name and extension at the last dot.
    ///
    /// Files without an extension yield an empty extension so names like
    /// `archive.tar.gz` keep their full base (`archive.tar`).
    #[must_use]
    pub fn split_name(&self) -> (&str, &str) {
        match self.name.rsplit_once('.') {
            Some((base, ext)) => (base, ext),
            None => (self.name.as_str(), ""),
        }
    }

    /// Builds the finalization metadata triple from this file.
    #[must_use]
    pub fn metadata(&self) -> FileMetadata {
        FileMetadata {
            content_type: self.content_type.to_string(),
            size: self.size(),
            file_name: self.name.clone(),
        }
    }
}

/// The values written into the hosting form's hidden metadata fields
/// during finalization.
///
/// Always derived from the originally selected file, never from a network
/// response (the storage reply carries no body worth trusting).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    /// MIME type of the uploaded file.
    pub content_type: String,
    /// Byte size of the uploaded file.
    pub size: u64,
    /// Original file name.
    pub file_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_derived_from_contents() {
        let file = SelectedFile::new("photo.jpg", mime::IMAGE_JPEG, vec![0u8; 2048]);
        assert_eq!(file.size(), 2048);
    }

    #[test]
    fn test_split_name_last_dot() {
        let file = SelectedFile::new("archive.tar.gz", mime::APPLICATION_OCTET_STREAM, "x");
        assert_eq!(file.split_name(), ("archive.tar", "gz"));
    }

    #[test]
    fn test_split_name_without_extension() {
        let file = SelectedFile::new("README", mime::TEXT_PLAIN, "x");
        assert_eq!(file.split_name(), ("README", ""));
    }

    #[test]
    fn test_metadata_reflects_original_file() {
        let file = SelectedFile::new("photo.jpg", mime::IMAGE_JPEG, vec![0u8; 2048]);
        let metadata = file.metadata();
        assert_eq!(metadata.content_type, "image/jpeg");
        assert_eq!(metadata.size, 2048);
        assert_eq!(metadata.file_name, "photo.jpg");
    }
}
