//! Statement extraction endpoint

use axum::{
    extract::{Multipart, State},
    Json,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::processing::ExtractionResult;
use crate::server::state::AppState;
use crate::storage::{TempStore, TempUpload};
use crate::types::{is_pdf, ExecuteResponse, UploadedDocument};

/// Multipart field carrying the PDF
pub const FILE_FIELD: &str = "inputFile";
/// Multipart field carrying the action label
pub const ACTION_FIELD: &str = "action";

/// POST /execute - Extract transactions from one uploaded PDF
pub async fn execute(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ExecuteResponse>> {
    let form = read_form(state.temp_store(), &mut multipart).await?;
    let (upload, action) = form.validate()?;

    let document = upload.document().clone();
    tracing::info!(
        "Processing file: {} ({} bytes, action: {})",
        document.original_name,
        document.size,
        action
    );

    let outcome = run_extraction(&state, &document).await;

    upload.cleanup().await;

    let result = outcome?;
    Ok(Json(ExecuteResponse::processed(action, &document, result.text)))
}

/// Run the pipeline on its own task so it always reaches remote cleanup
///
/// If this future is dropped (client went away), the drop guard cancels the
/// token and the task winds down, still deleting the remote file.
async fn run_extraction(state: &AppState, document: &UploadedDocument) -> Result<ExtractionResult> {
    let cancel = CancellationToken::new();
    let _cancel_on_drop = cancel.clone().drop_guard();

    let extractor = Arc::clone(state.extractor());
    let path = document.path.clone();
    let display_name = document.stored_name.clone();

    let task = tokio::spawn(async move { extractor.extract(&path, &display_name, &cancel).await });

    task.await
        .map_err(|e| Error::internal(format!("Extraction task failed: {}", e)))?
}

/// Fields collected from the multipart body
#[derive(Default)]
struct ExecuteForm {
    upload: Option<TempUpload>,
    action: Option<String>,
}

impl ExecuteForm {
    /// Require exactly one non-empty file and a non-blank action
    fn validate(self) -> Result<(TempUpload, String)> {
        let action = self.action.filter(|a| !a.trim().is_empty());

        match (self.upload, action) {
            (Some(upload), Some(action)) => {
                if upload.document().size == 0 {
                    return Err(Error::validation("Uploaded file is empty"));
                }
                Ok((upload, action))
            }
            _ => Err(Error::validation(
                "Missing required fields. Please provide inputFile and action",
            )),
        }
    }
}

/// Read the multipart body, persisting the file field to the upload store
///
/// On any error the partially collected form is dropped, which removes a
/// file that was already written.
async fn read_form(store: &TempStore, multipart: &mut Multipart) -> Result<ExecuteForm> {
    let mut form = ExecuteForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::validation(format!("Failed to read multipart field: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            FILE_FIELD => {
                if form.upload.is_some() {
                    return Err(Error::validation("Only one inputFile may be provided"));
                }

                let media_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                if !is_pdf(&media_type) {
                    return Err(Error::validation("Only PDF files are allowed"));
                }

                let original_name = field.file_name().unwrap_or("upload.pdf").to_string();
                form.upload = Some(store.persist(&original_name, &media_type, field).await?);
            }
            ACTION_FIELD => {
                let action = field
                    .text()
                    .await
                    .map_err(|e| Error::validation(format!("Failed to read action: {}", e)))?;
                form.action = Some(action);
            }
            other => {
                return Err(Error::validation(format!("Unexpected field: {}", other)));
            }
        }
    }

    Ok(form)
}
