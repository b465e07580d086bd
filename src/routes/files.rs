// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Multipart uploads and file downloads shared by the archive and telecom
//! routes.

use std::collections::HashMap;

use axum::{
    body::Body,
    extract::Multipart,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

use crate::error::{AppError, Result};

/// A file part of a multipart form.
#[derive(Debug)]
pub struct Upload {
    pub file_name: String,
    pub content: Vec<u8>,
}

/// A multipart form: text fields (repeatable) and file parts by field name.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub fields: HashMap<String, Vec<String>>,
    pub files: HashMap<String, Upload>,
}

impl UploadForm {
    pub async fn read(mut multipart: Multipart) -> Result<Self> {
        let mut form = Self::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(format!("Malformed upload: {e}")))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let content = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::BadRequest(format!("Malformed upload: {e}")))?;
                    form.files.insert(
                        name,
                        Upload {
                            file_name,
                            content: content.to_vec(),
                        },
                    );
                }
                None => {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(format!("Malformed upload: {e}")))?;
                    form.fields.entry(name).or_default().push(value);
                }
            }
        }
        Ok(form)
    }

    /// First value of a text field, trimmed; empty when absent.
    pub fn text(&self, name: &str) -> String {
        self.fields
            .get(name)
            .and_then(|values| values.first())
            .map(|v| v.trim().to_string())
            .unwrap_or_default()
    }

    /// A non-blank text field, or a 422 naming it.
    pub fn required_text(&self, name: &str) -> Result<String> {
        let value = self.text(name);
        if value.is_empty() {
            return Err(AppError::field(name, "This field is required."));
        }
        Ok(value)
    }

    /// Integer values of a repeated field. Also accepts one comma separated value.
    pub fn ids(&self, name: &str) -> Result<Vec<i64>> {
        self.fields
            .get(name)
            .into_iter()
            .flatten()
            .flat_map(|value| value.split(','))
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| {
                v.parse()
                    .map_err(|_| AppError::field(name, format!("\"{v}\" is not a valid id.")))
            })
            .collect()
    }

    pub fn take_file(&mut self, name: &str) -> Option<Upload> {
        self.files.remove(name)
    }

    /// A file part that must be present and non-empty.
    pub fn required_file(&mut self, name: &str) -> Result<Upload> {
        match self.files.remove(name) {
            Some(upload) if !upload.content.is_empty() => Ok(upload),
            Some(_) => Err(AppError::field(name, "The submitted file is empty.")),
            None => Err(AppError::field(name, "No file was submitted.")),
        }
    }
}

/// Serve stored bytes as a download named `filename`.
pub fn attachment(filename: &str, content: Vec<u8>) -> Response {
    let ascii: String = filename
        .chars()
        .map(|c| match c {
            ' ' => c,
            '"' | '\\' => '_',
            _ if c.is_ascii_graphic() => c,
            _ => '_',
        })
        .collect();
    let disposition = format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        ascii,
        urlencoding::encode(filename)
    );

    let mut response = (StatusCode::OK, Body::from(content)).into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_headers_escape_non_ascii_names() {
        let response = attachment("2024 月會.xlsx", b"data".to_vec());
        let disposition = response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.starts_with("attachment; filename=\"2024 __.xlsx\""));
        assert!(disposition.contains("filename*=UTF-8''2024%20%E6%9C%88%E6%9C%83.xlsx"));
    }

    #[test]
    fn test_ids_accept_repeated_and_comma_separated() {
        let mut form = UploadForm::default();
        form.fields
            .insert("isps".to_string(), vec!["1".to_string(), "2, 3".to_string()]);
        assert_eq!(form.ids("isps").unwrap(), vec![1, 2, 3]);

        form.fields.insert("isps".to_string(), vec!["x".to_string()]);
        assert!(matches!(form.ids("isps"), Err(AppError::Validation(_))));
        assert!(form.ids("missing").unwrap().is_empty());
    }
}
