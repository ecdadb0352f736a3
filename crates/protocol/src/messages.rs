use serde::{Deserialize, Serialize};

/// A file the surface read into memory before submitting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickedFile {
    /// File name as reported by the browser (no directory part).
    pub name: String,
    /// Raw content, serialized as a flat array of byte values (0-255).
    pub data: Vec<u8>,
}

/// Which side of the channel originates a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Surface → engine.
    FromSurface,
    /// Engine → surface.
    ToSurface,
}

/// Every frame exchanged over the picker channel.
///
/// Serialized as an internally tagged object:
/// `{"type": "upload", "files": [...]}`, `{"type": "uploadComplete"}`, ...
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PickerMessage {
    /// The staged batch. Sent once per submission, after every queued file
    /// was read successfully.
    Upload { files: Vec<PickedFile> },

    /// A queued file could not be read locally; nothing was submitted.
    Error { message: String },

    /// The batch finished without hard errors (skips allowed).
    UploadComplete,

    /// At least one file failed; `message` aggregates the failures.
    UploadError { message: String },
}

impl PickerMessage {
    /// Returns the wire value of the `type` discriminator.
    pub fn message_type(&self) -> &'static str {
        match self {
            PickerMessage::Upload { .. } => "upload",
            PickerMessage::Error { .. } => "error",
            PickerMessage::UploadComplete => "uploadComplete",
            PickerMessage::UploadError { .. } => "uploadError",
        }
    }

    /// Returns the side that is allowed to send this message.
    pub fn direction(&self) -> Direction {
        match self {
            PickerMessage::Upload { .. } | PickerMessage::Error { .. } => Direction::FromSurface,
            PickerMessage::UploadComplete | PickerMessage::UploadError { .. } => {
                Direction::ToSurface
            }
        }
    }

    /// Serializes the message as a JSON text frame.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parses a JSON text frame.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_parses_byte_arrays() {
        let json = r#"{"type":"upload","files":[{"name":"a.txt","data":[72,105]}]}"#;
        let msg = PickerMessage::from_json(json).unwrap();
        assert_eq!(
            msg,
            PickerMessage::Upload {
                files: vec![PickedFile {
                    name: "a.txt".into(),
                    data: vec![72, 105],
                }],
            }
        );
        assert_eq!(msg.direction(), Direction::FromSurface);
    }

    #[test]
    fn upload_rejects_out_of_range_bytes() {
        let json = r#"{"type":"upload","files":[{"name":"a.txt","data":[256]}]}"#;
        assert!(PickerMessage::from_json(json).is_err());
    }

    #[test]
    fn upload_accepts_empty_file() {
        let json = r#"{"type":"upload","files":[{"name":"empty","data":[]}]}"#;
        let PickerMessage::Upload { files } = PickerMessage::from_json(json).unwrap() else {
            panic!("expected upload");
        };
        assert!(files[0].data.is_empty());
    }

    #[test]
    fn error_from_surface() {
        let json = r#"{"type":"error","message":"Failed to read file: a.txt"}"#;
        let msg = PickerMessage::from_json(json).unwrap();
        assert_eq!(msg.message_type(), "error");
        assert_eq!(msg.direction(), Direction::FromSurface);
    }

    #[test]
    fn upload_complete_is_bare_tag() {
        let json = PickerMessage::UploadComplete.to_json().unwrap();
        assert_eq!(json, r#"{"type":"uploadComplete"}"#);
    }

    #[test]
    fn upload_error_carries_message() {
        let msg = PickerMessage::UploadError {
            message: "a.txt: permission denied".into(),
        };
        let value: serde_json::Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
        assert_eq!(value["type"], "uploadError");
        assert_eq!(value["message"], "a.txt: permission denied");
        assert_eq!(msg.direction(), Direction::ToSurface);
    }

    #[test]
    fn unknown_type_is_rejected() {
        assert!(PickerMessage::from_json(r#"{"type":"download"}"#).is_err());
    }

    #[test]
    fn message_type_matches_serialized_tag() {
        let all = [
            PickerMessage::Upload { files: vec![] },
            PickerMessage::Error {
                message: String::new(),
            },
            PickerMessage::UploadComplete,
            PickerMessage::UploadError {
                message: String::new(),
            },
        ];
        for msg in all {
            let value: serde_json::Value =
                serde_json::from_str(&msg.to_json().unwrap()).unwrap();
            assert_eq!(value["type"], msg.message_type());
        }
    }
}
