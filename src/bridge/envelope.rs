//! Envelope types - what crosses the boundary between app and host
//!
//! Everything here serializes to the JSON shape an out-of-process host
//! consumes: `{"id", "type": "ASYNC_TRIGGER", "loading": "LOADING",
//! "options": {"event", "payload"}}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;

use crate::models::{DialogOptions, DuplicatePayload, ImportPayload};

/// Identifier the bridge assigns to each dispatched request
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Payload of `read-file`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadFilePayload {
    pub path: PathBuf,
}

/// Payload of `write-file`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteFilePayload {
    pub path: PathBuf,
    pub contents: String,
}

/// A named host operation together with its payload
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireRequest", into = "WireRequest")]
pub enum HostRequest {
    OpenFileDialog(DialogOptions),
    SaveFileDialog(DialogOptions),
    ImportDatabase(ImportPayload),
    DuplicateDatabase(DuplicatePayload),
    ReadFile(ReadFilePayload),
    WriteFile(WriteFilePayload),
    /// An operation the bridge does not know; forwarded untouched
    Custom { event: String, payload: Value },
}

impl HostRequest {
    pub const OPEN_FILE_DIALOG: &'static str = "showOpenDialog";
    pub const SAVE_FILE_DIALOG: &'static str = "showSaveDialog";
    pub const IMPORT_DATABASE: &'static str = "import-db";
    pub const DUPLICATE_DATABASE: &'static str = "duplicate-db";
    pub const READ_FILE: &'static str = "read-file";
    pub const WRITE_FILE: &'static str = "write-file";

    /// Wire name of the operation
    pub fn operation(&self) -> &str {
        match self {
            HostRequest::OpenFileDialog(_) => Self::OPEN_FILE_DIALOG,
            HostRequest::SaveFileDialog(_) => Self::SAVE_FILE_DIALOG,
            HostRequest::ImportDatabase(_) => Self::IMPORT_DATABASE,
            HostRequest::DuplicateDatabase(_) => Self::DUPLICATE_DATABASE,
            HostRequest::ReadFile(_) => Self::READ_FILE,
            HostRequest::WriteFile(_) => Self::WRITE_FILE,
            HostRequest::Custom { event, .. } => event,
        }
    }

    pub fn read_file(path: impl Into<PathBuf>) -> Self {
        HostRequest::ReadFile(ReadFilePayload { path: path.into() })
    }

    pub fn write_file(path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        HostRequest::WriteFile(WriteFilePayload {
            path: path.into(),
            contents: contents.into(),
        })
    }
}

/// Serialized form of a request: operation name plus raw payload
#[derive(Serialize, Deserialize)]
struct WireRequest {
    event: String,
    #[serde(default)]
    payload: Value,
}

impl From<HostRequest> for WireRequest {
    fn from(request: HostRequest) -> Self {
        let event = request.operation().to_string();
        let payload = match request {
            HostRequest::OpenFileDialog(options) | HostRequest::SaveFileDialog(options) => {
                serde_json::to_value(options)
            }
            HostRequest::ImportDatabase(payload) => serde_json::to_value(payload),
            HostRequest::DuplicateDatabase(payload) => serde_json::to_value(payload),
            HostRequest::ReadFile(payload) => serde_json::to_value(payload),
            HostRequest::WriteFile(payload) => serde_json::to_value(payload),
            HostRequest::Custom { payload, .. } => Ok(payload),
        };
        let payload = payload.unwrap_or_else(|e| {
            tracing::warn!(event = %event, error = %e, "Payload not representable as JSON");
            Value::Null
        });
        WireRequest { event, payload }
    }
}

impl TryFrom<WireRequest> for HostRequest {
    type Error = serde_json::Error;

    fn try_from(wire: WireRequest) -> Result<Self, Self::Error> {
        let WireRequest { event, payload } = wire;
        Ok(match event.as_str() {
            Self::OPEN_FILE_DIALOG => HostRequest::OpenFileDialog(serde_json::from_value(payload)?),
            Self::SAVE_FILE_DIALOG => HostRequest::SaveFileDialog(serde_json::from_value(payload)?),
            Self::IMPORT_DATABASE => HostRequest::ImportDatabase(serde_json::from_value(payload)?),
            Self::DUPLICATE_DATABASE => {
                HostRequest::DuplicateDatabase(serde_json::from_value(payload)?)
            }
            Self::READ_FILE => HostRequest::ReadFile(serde_json::from_value(payload)?),
            Self::WRITE_FILE => HostRequest::WriteFile(serde_json::from_value(payload)?),
            _ => HostRequest::Custom { event, payload },
        })
    }
}

/// Discriminant marking an envelope as an asynchronous host trigger
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DispatchKind {
    #[default]
    #[serde(rename = "ASYNC_TRIGGER")]
    AsyncTrigger,
}

/// Loading-state tag carried by every async trigger
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadingTag {
    #[default]
    #[serde(rename = "LOADING")]
    Loading,
}

/// A request wrapped for delivery to the host
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub id: RequestId,
    #[serde(rename = "type")]
    pub kind: DispatchKind,
    pub loading: LoadingTag,
    #[serde(rename = "options")]
    pub request: HostRequest,
}

impl Envelope {
    pub fn new(id: RequestId, request: HostRequest) -> Self {
        Envelope {
            id,
            kind: DispatchKind::AsyncTrigger,
            loading: LoadingTag::Loading,
            request,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

/// Result of a host operation, as delivered to the waiter
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "camelCase")]
pub enum Outcome {
    /// A dialog returned a selection
    Path(PathBuf),
    /// A file was read
    Text(String),
    /// The operation finished and has nothing to report
    Done,
    /// The user dismissed a dialog
    Cancelled,
    /// The host could not perform the operation
    Failed(String),
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Path(_) => "path",
            Outcome::Text(_) => "text",
            Outcome::Done => "done",
            Outcome::Cancelled => "cancelled",
            Outcome::Failed(_) => "failed",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DbType, FileFilter};
    use serde_json::json;

    fn import_dialog() -> DialogOptions {
        DialogOptions {
            title: "Import DB".into(),
            default_path: PathBuf::from("/assets"),
            button_label: "Import".into(),
            filters: vec![FileFilter::new("Custom File Type", &["sql", "tar"])],
        }
    }

    #[test]
    fn test_envelope_wire_shape() {
        let envelope = Envelope::new(RequestId(7), HostRequest::OpenFileDialog(import_dialog()));
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            value,
            json!({
                "id": 7,
                "type": "ASYNC_TRIGGER",
                "loading": "LOADING",
                "options": {
                    "event": "showOpenDialog",
                    "payload": {
                        "title": "Import DB",
                        "defaultPath": "/assets",
                        "buttonLabel": "Import",
                        "filters": [{"name": "Custom File Type", "extensions": ["sql", "tar"]}]
                    }
                }
            })
        );
    }

    #[test]
    fn test_import_payload_uses_camel_case() {
        let request = HostRequest::ImportDatabase(ImportPayload {
            new_db_name: "mydb".into(),
            file_path: PathBuf::from("/tmp/mydb.sql"),
            db_type: DbType::MySQL,
        });
        let json = Envelope::new(RequestId(1), request.clone()).to_json().unwrap();
        assert!(json.contains(r#""newDbName":"mydb""#));
        assert!(json.contains(r#""dbType":"mysql""#));
        assert_eq!(Envelope::from_json(&json).unwrap().request, request);
    }

    #[test]
    fn test_unknown_event_becomes_custom() {
        let text = r#"{"id":3,"type":"ASYNC_TRIGGER","loading":"LOADING","options":{"event":"run-query","payload":{"sql":"select 1"}}}"#;
        let envelope = Envelope::from_json(text).unwrap();
        assert_eq!(envelope.request.operation(), "run-query");
        assert_eq!(
            envelope.request,
            HostRequest::Custom {
                event: "run-query".into(),
                payload: json!({"sql": "select 1"}),
            }
        );
    }

    #[test]
    fn test_duplicate_payload_wire_shape() {
        let text = r#"{"id":4,"type":"ASYNC_TRIGGER","loading":"LOADING","options":{"event":"duplicate-db","payload":{"dbName":"shop","dbCopyName":"shop_copy","copy":false,"dbType":"pg"}}}"#;
        let envelope = Envelope::from_json(text).unwrap();
        assert_eq!(
            envelope.request,
            HostRequest::DuplicateDatabase(DuplicatePayload {
                db_name: "shop".into(),
                db_copy_name: "shop_copy".into(),
                copy: false,
                db_type: DbType::Postgres,
            })
        );
    }

    #[test]
    fn test_known_event_with_bad_payload_is_rejected() {
        let text = r#"{"id":3,"type":"ASYNC_TRIGGER","loading":"LOADING","options":{"event":"read-file","payload":{"nope":1}}}"#;
        assert!(Envelope::from_json(text).is_err());
    }

    #[test]
    fn test_outcome_wire_shape() {
        assert_eq!(serde_json::to_value(Outcome::Done).unwrap(), json!({"status": "done"}));
        assert_eq!(
            serde_json::to_value(Outcome::Failed("boom".into())).unwrap(),
            json!({"status": "failed", "value": "boom"})
        );
    }
}
