use std::path::{Path, PathBuf};

use reqwest::multipart::{Form, Part as FormPart};
use serde::Serialize;
use thiserror::Error;

/// Upper bound enforced by the picture picker.
pub const MAX_ATTACHMENT_BYTES: usize = 2 * 1024 * 1024;
pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const MULTIPART_CONTENT_TYPE: &str = "multipart/form-data";
pub const ACCEPTED_ATTACHMENT_TYPES: [&str; 4] =
    ["application/pdf", "image/png", "image/jpeg", "image/jpg"];

#[derive(Debug, Error)]
pub enum AttachmentError {
    #[error("failed to read attachment {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("attachment type {mime_type} is not accepted")]
    UnsupportedType { mime_type: String },
    #[error("attachment is {size} bytes, limit is {max}")]
    TooLarge { size: usize, max: usize },
}

/// A binary file selected for upload alongside form fields.
#[derive(Clone, PartialEq, Eq)]
pub struct Attachment {
    file_name: String,
    mime_type: String,
    bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<Self, AttachmentError> {
        let mime_type = mime_type.into().to_ascii_lowercase();
        if !ACCEPTED_ATTACHMENT_TYPES.contains(&mime_type.as_str()) {
            return Err(AttachmentError::UnsupportedType { mime_type });
        }
        if bytes.len() > MAX_ATTACHMENT_BYTES {
            return Err(AttachmentError::TooLarge {
                size: bytes.len(),
                max: MAX_ATTACHMENT_BYTES,
            });
        }
        Ok(Self {
            file_name: file_name.into(),
            mime_type,
            bytes,
        })
    }

    /// Reads a file from disk, guessing its MIME type from the extension.
    pub async fn from_path(path: &Path) -> Result<Self, AttachmentError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| AttachmentError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        let mime_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Self::new(file_name, mime_type, bytes)
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl std::fmt::Debug for Attachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attachment")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("size_bytes", &self.bytes.len())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    Text(String),
    File(Attachment),
}

/// Ordered multipart fields. Kept as plain data so callers can inspect what
/// will be sent before it is turned into a `reqwest` form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartPayload {
    parts: Vec<(String, Part)>,
}

impl MultipartPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push((name.into(), Part::Text(value.into())));
        self
    }

    pub fn file(mut self, name: impl Into<String>, attachment: Attachment) -> Self {
        self.parts.push((name.into(), Part::File(attachment)));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Part> {
        self.parts
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, part)| part)
    }

    pub fn text_value(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            Part::Text(value) => Some(value),
            Part::File(_) => None,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|(name, _)| name.as_str())
    }

    pub fn into_form(self) -> Result<Form, reqwest::Error> {
        let mut form = Form::new();
        for (name, part) in self.parts {
            form = match part {
                Part::Text(value) => form.text(name, value),
                Part::File(attachment) => {
                    let file_part = FormPart::bytes(attachment.bytes)
                        .file_name(attachment.file_name)
                        .mime_str(&attachment.mime_type)?;
                    form.part(name, file_part)
                }
            };
        }
        Ok(form)
    }
}

/// Body of a mutating request. The variant decides the `Content-Type`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    Json(String),
    Multipart(MultipartPayload),
}

impl RequestBody {
    pub fn json<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::Json(serde_json::to_string(value)?))
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Json(_) => JSON_CONTENT_TYPE,
            Self::Multipart(_) => MULTIPART_CONTENT_TYPE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(len: usize) -> Attachment {
        Attachment::new("dish.png", "image/png", vec![0u8; len]).expect("attachment")
    }

    #[test]
    fn rejects_unlisted_mime_types() {
        let err = Attachment::new("notes.txt", "text/plain", b"hi".to_vec()).expect_err("reject");
        assert!(matches!(err, AttachmentError::UnsupportedType { .. }));
    }

    #[test]
    fn rejects_files_over_two_megabytes() {
        let err = Attachment::new("big.jpg", "image/jpeg", vec![0u8; MAX_ATTACHMENT_BYTES + 1])
            .expect_err("reject");
        assert!(matches!(err, AttachmentError::TooLarge { .. }));
        assert_eq!(png(MAX_ATTACHMENT_BYTES).len(), MAX_ATTACHMENT_BYTES);
    }

    #[test]
    fn payload_keeps_insertion_order_and_lookup() {
        let payload = MultipartPayload::new()
            .text("name", "Soto")
            .text("price", "12000")
            .file("picture", png(4));
        assert_eq!(
            payload.field_names().collect::<Vec<_>>(),
            vec!["name", "price", "picture"]
        );
        assert_eq!(payload.text_value("price"), Some("12000"));
        assert_eq!(payload.text_value("picture"), None);
        assert!(!payload.contains("category"));
    }

    #[test]
    fn every_accepted_attachment_builds_a_form() {
        for mime_type in ACCEPTED_ATTACHMENT_TYPES {
            let attachment =
                Attachment::new("upload", mime_type, b"bytes".to_vec()).expect("attachment");
            let payload = MultipartPayload::new()
                .text("name", "Soto")
                .file("picture", attachment);
            assert!(payload.into_form().is_ok(), "{mime_type} should build");
        }
    }

    #[test]
    fn body_variant_picks_content_type() {
        let json = RequestBody::json(&serde_json::json!({"name": "x"})).expect("json");
        assert_eq!(json.content_type(), "application/json");
        assert_eq!(
            RequestBody::Multipart(MultipartPayload::new()).content_type(),
            "multipart/form-data"
        );
    }

    #[tokio::test]
    async fn from_path_guesses_mime_and_reads_bytes() {
        let dir = std::env::temp_dir().join(format!("console_core_attachment_{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.expect("dir");
        let path = dir.join("menu.jpg");
        tokio::fs::write(&path, b"jpeg-bytes").await.expect("write");

        let attachment = Attachment::from_path(&path).await.expect("load");
        assert_eq!(attachment.file_name(), "menu.jpg");
        assert_eq!(attachment.mime_type(), "image/jpeg");
        assert_eq!(attachment.bytes(), b"jpeg-bytes");

        tokio::fs::remove_dir_all(dir).await.expect("cleanup");
    }
}
