//! Multipart form collection for upload endpoints.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::Multipart;

use crate::error::AppError;

/// Name of the form field carrying the uploaded file.
const FILE_FIELD: &str = "file";

/// An uploaded file as received.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// Text fields of a multipart form plus its optional `file` part.
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    pub file: Option<UploadedFile>,
}

impl MultipartForm {
    /// Drain a multipart body.
    ///
    /// A `file` part with no content counts as absent, which is what browsers
    /// send when the file input was left empty.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` if the body is not valid multipart or a
    /// text field is not UTF-8.
    pub async fn collect(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_owned();
            if name == FILE_FIELD {
                let content_type = field.content_type().map(str::to_owned);
                let data = field.bytes().await?;
                if !data.is_empty() {
                    form.file = Some(UploadedFile { content_type, data });
                }
            } else if !name.is_empty() {
                let value = field.text().await?;
                form.fields.insert(name, value);
            }
        }
        Ok(form)
    }

    /// Remove and return a text field.
    pub fn take(&mut self, name: &str) -> Option<String> {
        self.fields.remove(name)
    }
}
