use std::fmt;
use std::io::Cursor;
use std::sync::Arc;

use image::{ImageFormat, ImageReader};

/// Fallback MIME type for content that is neither sniffable nor named.
pub const UNKNOWN_MIME_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Read-only view of a candidate file, as needed by the validator.
///
/// Platforms supply their own implementation; [`LocalFile`] covers in-memory
/// bytes. `decode_dimensions` returns `None` when the image cannot be
/// introspected, which the validator treats as "unknown" rather than invalid.
pub trait FileInspector {
    fn size(&self) -> u64;
    fn mime_type(&self) -> &str;
    fn decode_dimensions(&self) -> Option<Dimensions>;
}

/// A user-selected file held in memory.
///
/// The payload is reference counted so a retry re-sends the exact same bytes
/// without copying them.
#[derive(Clone, PartialEq, Eq)]
pub struct LocalFile {
    name: String,
    mime_type: String,
    bytes: Arc<[u8]>,
}

impl LocalFile {
    pub fn new(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Builds a file whose MIME type is sniffed from the content, falling back
    /// to the file name's extension.
    pub fn sniffed(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        let name = name.into();
        let bytes = bytes.into();
        let mime_type = sniff_mime_type(&name, &bytes);
        Self {
            name,
            mime_type: mime_type.to_string(),
            bytes,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &Arc<[u8]> {
        &self.bytes
    }

    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// True when both handles point at the same payload allocation.
    pub fn shares_payload_with(&self, other: &LocalFile) -> bool {
        Arc::ptr_eq(&self.bytes, &other.bytes)
    }
}

impl fmt::Debug for LocalFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalFile")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl FileInspector for LocalFile {
    fn size(&self) -> u64 {
        self.len()
    }

    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    fn decode_dimensions(&self) -> Option<Dimensions> {
        // Only the header is read; the reader and its cursor are dropped on return.
        let reader = ImageReader::new(Cursor::new(&self.bytes[..]))
            .with_guessed_format()
            .ok()?;
        let (width, height) = reader.into_dimensions().ok()?;
        Some(Dimensions { width, height })
    }
}

/// Content sniffing first, then extension, then `application/octet-stream`.
pub fn sniff_mime_type(name: &str, bytes: &[u8]) -> &'static str {
    if let Ok(format) = image::guess_format(bytes) {
        return format.to_mime_type();
    }
    name.rsplit_once('.')
        .and_then(|(_, ext)| ImageFormat::from_extension(ext))
        .map(|format| format.to_mime_type())
        .unwrap_or(UNKNOWN_MIME_TYPE)
}
