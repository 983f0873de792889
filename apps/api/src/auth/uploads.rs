use axum::extract::Multipart;
use bytes::Bytes;

use crate::errors::AppError;

pub struct UploadRule {
    /// Object key prefix in the bucket.
    pub prefix: &'static str,
    pub max_bytes: usize,
    /// Accepted content types with the file extension stored for each.
    pub allowed: &'static [(&'static str, &'static str)],
    pub description: &'static str,
}

pub const RESUME_UPLOAD: UploadRule = UploadRule {
    prefix: "resumes",
    max_bytes: 5 * 1024 * 1024,
    allowed: &[
        ("application/pdf", "pdf"),
        ("application/msword", "doc"),
        (
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            "docx",
        ),
    ],
    description: "PDF, DOC or DOCX",
};

pub const PICTURE_UPLOAD: UploadRule = UploadRule {
    prefix: "profile-pictures",
    max_bytes: 2 * 1024 * 1024,
    allowed: &[
        ("image/png", "png"),
        ("image/jpeg", "jpg"),
        ("image/webp", "webp"),
    ],
    description: "PNG, JPEG or WEBP",
};

/// Largest request body any upload route accepts, multipart framing included.
pub const UPLOAD_BODY_LIMIT: usize = 6 * 1024 * 1024;

pub struct Upload {
    pub body: Bytes,
    pub content_type: &'static str,
    pub extension: &'static str,
}

impl UploadRule {
    pub fn accept(&self, content_type: &str) -> Option<(&'static str, &'static str)> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        self.allowed
            .iter()
            .find(|(allowed, _)| *allowed == essence)
            .copied()
    }

    /// Reads the `file` field of a multipart body and checks it against this rule.
    pub async fn read(&self, mut multipart: Multipart) -> Result<Upload, AppError> {
        while let Some(field) = multipart.next_field().await? {
            if field.name() != Some("file") {
                continue;
            }

            let declared = field.content_type().unwrap_or_default().to_string();
            let (content_type, extension) = self.accept(&declared).ok_or_else(|| {
                AppError::Validation(format!("Only {} files are allowed", self.description))
            })?;

            let body = field.bytes().await?;
            if body.is_empty() {
                return Err(AppError::Validation("Uploaded file is empty".into()));
            }
            if body.len() > self.max_bytes {
                return Err(AppError::PayloadTooLarge(format!(
                    "File exceeds the {} MiB limit",
                    self.max_bytes / (1024 * 1024)
                )));
            }

            return Ok(Upload {
                body,
                content_type,
                extension,
            });
        }

        Err(AppError::Validation("Missing multipart field 'file'".into()))
    }
}
