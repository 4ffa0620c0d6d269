use std::collections::BTreeSet;

use upload_logging::upload_debug;

use crate::{Dimensions, ErrorCode, ErrorInfo, FileInspector};

pub const DEFAULT_MAX_FILE_SIZE_BYTES: u64 = 5 * 1024 * 1024;
pub const DEFAULT_ALLOWED_MIME_TYPES: &[&str] =
    &["image/jpeg", "image/png", "image/webp", "image/avif"];

/// Pre-flight rules applied to a candidate file before any network call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationRules {
    pub max_file_size_bytes: u64,
    pub allowed_mime_types: BTreeSet<String>,
    pub min_dimensions: Option<Dimensions>,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_BYTES,
            allowed_mime_types: DEFAULT_ALLOWED_MIME_TYPES
                .iter()
                .map(|mime| mime.to_string())
                .collect(),
            min_dimensions: None,
        }
    }
}

impl ValidationRules {
    fn allows_mime_type(&self, mime_type: &str) -> bool {
        let essence = mime_type.split(';').next().unwrap_or(mime_type).trim();
        self.allowed_mime_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(essence))
    }
}

/// Checks size, then type, then dimensions; the first failure wins.
///
/// Dimensions are only checked when `rules.min_dimensions` is set. A file whose
/// dimensions cannot be decoded passes that check.
pub fn validate<F>(file: &F, rules: &ValidationRules) -> Result<(), ErrorInfo>
where
    F: FileInspector + ?Sized,
{
    if file.size() > rules.max_file_size_bytes {
        return Err(ErrorInfo::file_too_large(rules.max_file_size_bytes));
    }

    if !rules.allows_mime_type(file.mime_type()) {
        return Err(ErrorInfo::from_code(ErrorCode::UnsupportedFormat));
    }

    if let Some(min) = rules.min_dimensions {
        match file.decode_dimensions() {
            Some(actual) if actual.width < min.width || actual.height < min.height => {
                return Err(ErrorInfo::dimensions_too_small(min, actual));
            }
            Some(_) => {}
            None => {
                upload_debug!("Dimension check skipped: image could not be decoded");
            }
        }
    }

    Ok(())
}
