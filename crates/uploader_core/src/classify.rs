use std::fmt;

use crate::{ErrorCode, ErrorInfo};

/// Raw failure signal reported by the transport, before classification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSignal {
    /// HTTP status, when a response was received.
    pub status: Option<u16>,
    /// Structured error code sent by the server, if any.
    pub code: Option<String>,
    pub message: String,
    pub aborted: bool,
    /// No response was reachable (connect failure, reset, timeout).
    pub network: bool,
}

impl RawSignal {
    pub fn aborted() -> Self {
        Self {
            message: "upload aborted".to_string(),
            aborted: true,
            ..Self::default()
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            network: true,
            ..Self::default()
        }
    }

    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn with_code(mut self, code: Option<String>) -> Self {
        self.code = code;
        self
    }
}

impl fmt::Display for RawSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.aborted, self.network, self.status) {
            (true, _, _) => write!(f, "aborted"),
            (_, true, _) => write!(f, "network: {}", self.message),
            (_, _, Some(status)) => write!(f, "http {status}: {}", self.message),
            _ => write!(f, "{}", self.message),
        }
    }
}

/// Maps a raw transport failure onto the error taxonomy.
///
/// Total: every signal yields exactly one code, `UploadFailed` when nothing
/// else matches. Tiers, in order: abort flag, network flag, structured server
/// code, HTTP status, message text.
pub fn classify(signal: &RawSignal) -> ErrorInfo {
    ErrorInfo::from_code(classify_code(signal))
}

fn classify_code(signal: &RawSignal) -> ErrorCode {
    if signal.aborted {
        return ErrorCode::UploadAborted;
    }
    if signal.network {
        return ErrorCode::NetworkError;
    }
    if let Some(code) = signal.code.as_deref().and_then(server_code) {
        return code;
    }
    match signal.status {
        Some(413) => return ErrorCode::FileTooLarge,
        Some(429) => return ErrorCode::RateLimited,
        _ => {}
    }
    classify_text(&signal.message)
}

// Abort and network codes are client-side only; a server cannot report them.
fn server_code(raw: &str) -> Option<ErrorCode> {
    match raw.parse().ok()? {
        ErrorCode::UploadAborted | ErrorCode::NetworkError => None,
        code => Some(code),
    }
}

// Legacy tier: heuristics over free-form server text.
fn classify_text(message: &str) -> ErrorCode {
    let text = message.to_ascii_lowercase();
    let mentions = |needles: &[&str]| needles.iter().any(|needle| text.contains(needle));

    if mentions(&["size", "too large", "too-large", "toolarge", "413"]) {
        ErrorCode::FileTooLarge
    } else if mentions(&["unsupported", "format", "extension"]) {
        ErrorCode::UnsupportedFormat
    } else if mentions(&["signature", "auth"]) {
        ErrorCode::InvalidSignature
    } else if mentions(&["rate", "limit"]) {
        ErrorCode::RateLimited
    } else {
        ErrorCode::UploadFailed
    }
}
