//! Uploader engine: transport, effect execution and the per-field adapter.
mod engine;
mod field;
mod load;
mod response;
mod transport;
mod types;

pub use engine::{EngineError, EngineHandle};
pub use field::{CompletionCallback, UploadField};
pub use load::{load_local_file, LoadError};
pub use response::interpret_response;
pub use transport::{ProgressSink, ReqwestTransport, Transport, TransportSettings};
pub use types::{EngineEvent, UploadRequest};
