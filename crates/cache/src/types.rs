use std::fmt;

use crate::error::ResolveError;

/// Externally supplied document identifier.
///
/// The only check is non-emptiness; the key is used verbatim to build the
/// file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentKey(String);

impl DocumentKey {
    pub fn new(raw: impl Into<String>) -> Result<Self, ResolveError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(ResolveError::EmptyKey);
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DocumentKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// What a key refers to; decides the file extension and the content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    /// Signed certificate, fetched from the archive on a miss.
    Attestation,
    /// Generated barcode label.
    Barcode,
}

impl DocumentKind {
    pub fn extension(self) -> &'static str {
        match self {
            DocumentKind::Attestation => ".pdf",
            DocumentKind::Barcode => ".png",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            DocumentKind::Attestation => "application/pdf",
            DocumentKind::Barcode => "image/png",
        }
    }

    /// `<key><ext>`: the name used both in the cache directory and in the archive.
    pub fn file_name(self, key: &DocumentKey) -> String {
        format!("{}{}", key.as_str(), self.extension())
    }
}
