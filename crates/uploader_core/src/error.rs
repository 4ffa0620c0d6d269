use std::fmt;
use std::str::FromStr;

/// Closed taxonomy of upload failures shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorCode {
    FileTooLarge,
    UnsupportedFormat,
    DimensionsTooSmall,
    InvalidSignature,
    RateLimited,
    NetworkError,
    UploadAborted,
    UploadFailed,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 8] = [
        ErrorCode::FileTooLarge,
        ErrorCode::UnsupportedFormat,
        ErrorCode::DimensionsTooSmall,
        ErrorCode::InvalidSignature,
        ErrorCode::RateLimited,
        ErrorCode::NetworkError,
        ErrorCode::UploadAborted,
        ErrorCode::UploadFailed,
    ];

    /// Stable key, suitable for message catalogs and structured server codes.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::FileTooLarge => "file_too_large",
            ErrorCode::UnsupportedFormat => "unsupported_format",
            ErrorCode::DimensionsTooSmall => "dimensions_too_small",
            ErrorCode::InvalidSignature => "invalid_signature",
            ErrorCode::RateLimited => "rate_limited",
            ErrorCode::NetworkError => "network_error",
            ErrorCode::UploadAborted => "upload_aborted",
            ErrorCode::UploadFailed => "upload_failed",
        }
    }

    /// Default English message for this code.
    pub fn default_message(self) -> &'static str {
        match self {
            ErrorCode::FileTooLarge => "The file is too large.",
            ErrorCode::UnsupportedFormat => {
                "This file format is not supported. Use JPEG, PNG, WebP or AVIF."
            }
            ErrorCode::DimensionsTooSmall => "The image is too small.",
            ErrorCode::InvalidSignature => {
                "The upload could not be authorized. Please try again."
            }
            ErrorCode::RateLimited => "Too many uploads. Wait a moment and try again.",
            ErrorCode::NetworkError => "Network error. Check your connection and try again.",
            ErrorCode::UploadAborted => "The upload was cancelled.",
            ErrorCode::UploadFailed => "The upload failed. Please try again.",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownErrorCode(pub String);

impl FromStr for ErrorCode {
    type Err = UnknownErrorCode;

    /// Accepts `file_too_large`, `FILE_TOO_LARGE`, `FileTooLarge` and `file-too-large`.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized: String = raw
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .map(|c| c.to_ascii_lowercase())
            .collect();
        ErrorCode::ALL
            .into_iter()
            .find(|code| code.as_str().replace('_', "") == normalized)
            .ok_or_else(|| UnknownErrorCode(raw.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub code: ErrorCode,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn from_code(code: ErrorCode) -> Self {
        Self::new(code, code.default_message())
    }

    pub fn file_too_large(max_bytes: u64) -> Self {
        Self::new(
            ErrorCode::FileTooLarge,
            format!("The file is too large. Maximum size is {}", format_size(max_bytes)),
        )
    }

    pub fn dimensions_too_small(min: crate::Dimensions, actual: crate::Dimensions) -> Self {
        Self::new(
            ErrorCode::DimensionsTooSmall,
            format!("The image is too small ({actual}). Minimum size is {min}"),
        )
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// Short human-readable size (`5MB`, `1.5MB`, `512KB`, `12B`).
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    if bytes >= MB && bytes % MB == 0 {
        format!("{}MB", bytes / MB)
    } else if bytes >= MB {
        format!("{:.1}MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{}KB", bytes / KB)
    } else {
        format!("{bytes}B")
    }
}
