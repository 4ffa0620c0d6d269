use serde::Deserialize;
use serde_json::Value;
use uploader_core::RawSignal;

const MISSING_URL_MESSAGE: &str = "response did not include an image URL";

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ServerError {
    Text(String),
    Detailed {
        message: Option<String>,
        code: Option<String>,
    },
}

impl ServerError {
    fn into_parts(self) -> (Option<String>, Option<String>) {
        match self {
            ServerError::Text(message) => (Some(message), None),
            ServerError::Detailed { message, code } => (message, code),
        }
    }
}

/// Interprets the upload endpoint's reply.
///
/// Success requires a 2xx status and a non-empty `imageUrl`; everything else
/// becomes a [`RawSignal`] carrying the status, any server message and any
/// structured error code.
pub fn interpret_response(status: u16, body: &str) -> Result<String, RawSignal> {
    // Fields are read independently so a malformed one cannot hide the other.
    let parsed: Value = serde_json::from_str(body).unwrap_or(Value::Null);
    let image_url = parsed
        .get("imageUrl")
        .and_then(Value::as_str)
        .filter(|url| !url.trim().is_empty())
        .map(str::to_string);
    let (message, code) = parsed
        .get("error")
        .and_then(|error| ServerError::deserialize(error).ok())
        .map(ServerError::into_parts)
        .unwrap_or((None, None));
    let message = message.filter(|text| !text.trim().is_empty());

    if (200..300).contains(&status) {
        if let Some(url) = image_url {
            return Ok(url);
        }
        let message = message.unwrap_or_else(|| MISSING_URL_MESSAGE.to_string());
        return Err(RawSignal::http(status, message).with_code(code));
    }

    let message = message.unwrap_or_else(|| format!("upload failed with status {status}"));
    Err(RawSignal::http(status, message).with_code(code))
}
