//! Resume rewriting proxies.
//!
//! The uploaded file is forwarded to the backend as-is inside a multipart
//! form; the PDF variants stream the backend's binary response straight back
//! to the caller. Nothing here is cached or audited — the backend owns the
//! interesting state.

use axum::{
    extract::{Multipart, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::proxy::upstream::FilePart;
use crate::state::AppState;

pub const REWRITE_PATH: &str = "/resume_writer";
pub const PDF_PATH: &str = "/resume_writer/pdf";
pub const PDF_FROM_TEXT_PATH: &str = "/resume_writer/pdf-from-text";

const DEFAULT_TEMPLATE: &str = "ats";

#[derive(Debug, Deserialize)]
pub struct PdfFromTextRequest {
    pub rewritten_resume: String,
    #[serde(rename = "templateId")]
    pub template_id: Option<String>,
}

/// The file plus any text fields extracted from an upload form.
pub(crate) struct UploadForm {
    pub file: FilePart,
    pub fields: Vec<(String, String)>,
}

/// Reads a multipart body into memory. A missing or empty `file` part is a
/// caller error, reported before anything goes upstream.
pub(crate) async fn read_upload(mut multipart: Multipart) -> Result<UploadForm, AppError> {
    let mut file = None;
    let mut fields = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            let filename = field.file_name().unwrap_or("upload").to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("failed to read upload: {e}")))?;
            file = Some(FilePart {
                filename,
                content_type,
                bytes,
            });
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::Validation(format!("failed to read field '{name}': {e}")))?;
            fields.push((name, value));
        }
    }

    match file {
        Some(file) if !file.bytes.is_empty() => Ok(UploadForm { file, fields }),
        _ => Err(AppError::Validation(
            "No file uploaded or empty buffer".to_string(),
        )),
    }
}

fn template_id(fields: &[(String, String)]) -> String {
    fields
        .iter()
        .find(|(name, _)| name == "templateId")
        .map(|(_, value)| value.clone())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_TEMPLATE.to_string())
}

fn pdf_response(bytes: bytes::Bytes) -> Response {
    ([(header::CONTENT_TYPE, "application/pdf")], bytes).into_response()
}

/// POST /resume_writer — rewritten resume as JSON.
pub async fn handle_rewrite(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<Value>, AppError> {
    let upload = read_upload(multipart).await?;
    let payload = state
        .upstream
        .post_multipart(REWRITE_PATH, upload.file, &[])
        .await?;
    Ok(Json(payload))
}

/// POST /resume_writer/pdf — rewritten resume rendered as a PDF.
pub async fn handle_rewrite_pdf(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let upload = read_upload(multipart).await?;
    let fields = vec![("templateId".to_string(), template_id(&upload.fields))];
    let bytes = state
        .upstream
        .post_multipart_raw(PDF_PATH, upload.file, &fields)
        .await?;
    Ok(pdf_response(bytes))
}

/// POST /resume_writer/pdf-from-text — PDF from an already-rewritten resume.
pub async fn handle_pdf_from_text(
    State(state): State<AppState>,
    Json(request): Json<PdfFromTextRequest>,
) -> Result<Response, AppError> {
    let body = json!({
        "rewritten_resume": request.rewritten_resume,
        "templateId": request.template_id.unwrap_or_else(|| DEFAULT_TEMPLATE.to_string()),
    });
    let bytes = state.upstream.post_json_raw(PDF_FROM_TEXT_PATH, &body).await?;
    Ok(pdf_response(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_id_defaults_to_ats() {
        assert_eq!(template_id(&[]), "ats");
        assert_eq!(
            template_id(&[("templateId".to_string(), String::new())]),
            "ats"
        );
        assert_eq!(
            template_id(&[("templateId".to_string(), "modern".to_string())]),
            "modern"
        );
    }

    #[test]
    fn test_pdf_response_sets_content_type() {
        let response = pdf_response(bytes::Bytes::from_static(b"%PDF-1.4"));
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/pdf"
        );
    }
}
