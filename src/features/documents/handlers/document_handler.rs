use axum::{
    body::Body,
    extract::{Multipart, Path, State},
    http::{header, HeaderValue, StatusCode},
    response::Response,
    Json,
};
use std::sync::Arc;
use tokio_util::io::ReaderStream;
use tracing::debug;

use crate::core::error::{AppError, Result};
use crate::features::documents::dtos::{
    DocumentResponseDto, MessageResponseDto, UploadResponseDto, PDF_MIME_TYPE,
};
use crate::features::documents::services::DocumentService;
use crate::shared::types::ErrorResponse;

/// Upload a PDF document
///
/// Accepts multipart/form-data with a single `file` field. Anything that is
/// not declared as `application/pdf` is rejected before any storage happens.
#[utoipa::path(
    post,
    path = "/documents/upload",
    tag = "documents",
    request_body(
        content = crate::features::documents::dtos::UploadDocumentDto,
        content_type = "multipart/form-data",
        description = "Upload form with a single PDF file field",
    ),
    responses(
        (status = 201, description = "Document uploaded successfully", body = UploadResponseDto),
        (status = 400, description = "Missing file or not a PDF", body = ErrorResponse),
        (status = 500, description = "Storage or record store failure", body = ErrorResponse)
    )
)]
pub async fn upload_document(
    State(service): State<Arc<DocumentService>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponseDto>)> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read multipart data: {}", e))
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" => {
                let content_type = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "application/octet-stream".to_string());

                // The upload gate: exactly this MIME type, checked before any
                // storage side effect
                if content_type != PDF_MIME_TYPE {
                    return Err(AppError::BadRequest(
                        "Only PDF files are allowed".to_string(),
                    ));
                }

                let fname = field
                    .file_name()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "unnamed.pdf".to_string());

                let data = field.bytes().await.map_err(|e| {
                    debug!("Failed to read file bytes: {}", e);
                    AppError::BadRequest(format!("Failed to read file data: {}", e))
                })?;

                file_data = Some(data.to_vec());
                file_name = Some(fname);
            }
            _ => {
                debug!("Ignoring unknown field: {}", field_name);
            }
        }
    }

    let file_data =
        file_data.ok_or_else(|| AppError::BadRequest("Please upload a PDF file".to_string()))?;
    let file_name =
        file_name.ok_or_else(|| AppError::BadRequest("Please upload a PDF file".to_string()))?;

    let doc = service.upload(file_data, &file_name).await?;

    Ok((
        StatusCode::CREATED,
        Json(UploadResponseDto {
            message: "Uploaded Successfully".to_string(),
            doc: doc.into(),
        }),
    ))
}

/// List all documents, newest first
#[utoipa::path(
    get,
    path = "/documents",
    tag = "documents",
    responses(
        (status = 200, description = "All documents ordered by creation time descending", body = Vec<DocumentResponseDto>),
        (status = 500, description = "Record store failure", body = ErrorResponse)
    )
)]
pub async fn list_documents(
    State(service): State<Arc<DocumentService>>,
) -> Result<Json<Vec<DocumentResponseDto>>> {
    let docs = service.list().await?;
    Ok(Json(docs.into_iter().map(Into::into).collect()))
}

/// Download a document
///
/// Streams the stored blob back with the original filename as the suggested
/// save name.
#[utoipa::path(
    get,
    path = "/documents/{id}",
    tag = "documents",
    params(
        ("id" = i64, Path, description = "Document id")
    ),
    responses(
        (status = 200, description = "Binary stream of the stored blob", content_type = "application/pdf"),
        (status = 404, description = "No document with this id", body = ErrorResponse),
        (status = 500, description = "Blob missing or unreadable", body = ErrorResponse)
    )
)]
pub async fn download_document(
    State(service): State<Arc<DocumentService>>,
    Path(id): Path<i64>,
) -> Result<Response> {
    let doc = service.get(id).await?;
    let (file, len) = service.storage().open(&doc.filepath).await?;

    let disposition = format!("attachment; filename=\"{}\"", doc.filename.replace('"', ""));
    let disposition = HeaderValue::from_str(&disposition)
        .map_err(|_| AppError::Internal("Invalid filename for download header".to_string()))?;

    let stream = ReaderStream::new(file);

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, PDF_MIME_TYPE)
        .header(header::CONTENT_LENGTH, len)
        .header(header::CONTENT_DISPOSITION, disposition)
        .body(Body::from_stream(stream))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)))?;

    Ok(response)
}

/// Delete a document
///
/// Removes the metadata row and the blob on disk; a blob that is already
/// gone is not an error.
#[utoipa::path(
    delete,
    path = "/documents/{id}",
    tag = "documents",
    params(
        ("id" = i64, Path, description = "Document id")
    ),
    responses(
        (status = 200, description = "Document deleted", body = MessageResponseDto),
        (status = 404, description = "No document with this id", body = ErrorResponse),
        (status = 500, description = "Record store failure", body = ErrorResponse)
    )
)]
pub async fn delete_document(
    State(service): State<Arc<DocumentService>>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponseDto>> {
    service.delete(id).await?;

    Ok(Json(MessageResponseDto {
        message: "Deleted Successfully".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::documents::routes;
    use crate::modules::storage::DiskStorage;
    use axum_test::multipart::{MultipartForm, Part};
    use axum_test::TestServer;
    use sqlx::sqlite::SqlitePoolOptions;
    use tempfile::TempDir;

    async fn setup() -> (TestServer, TempDir) {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();

        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(DiskStorage::new(dir.path()).await.unwrap());
        let service = Arc::new(DocumentService::new(pool, storage));

        (TestServer::new(routes(service)).unwrap(), dir)
    }

    fn pdf_form(name: &str, bytes: Vec<u8>) -> MultipartForm {
        MultipartForm::new().add_part(
            "file",
            Part::bytes(bytes)
                .file_name(name.to_string())
                .mime_type(PDF_MIME_TYPE),
        )
    }

    #[tokio::test]
    async fn rejects_non_pdf_upload() {
        let (server, dir) = setup().await;

        let form = MultipartForm::new().add_part(
            "file",
            Part::bytes(b"hello".to_vec())
                .file_name("notes.txt")
                .mime_type("text/plain"),
        );
        let response = server.post("/documents/upload").multipart(form).await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.json::<ErrorResponse>().error,
            "Only PDF files are allowed"
        );

        // No row and no blob were created
        let docs = server.get("/documents").await;
        assert!(docs.json::<Vec<DocumentResponseDto>>().is_empty());
        let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn rejects_request_without_file() {
        let (server, _dir) = setup().await;

        let form = MultipartForm::new().add_text("note", "no file here");
        let response = server.post("/documents/upload").multipart(form).await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.json::<ErrorResponse>().error,
            "Please upload a PDF file"
        );
    }

    #[tokio::test]
    async fn download_unknown_id_is_not_found() {
        let (server, _dir) = setup().await;

        let response = server.get("/documents/999999").await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(response.json::<ErrorResponse>().error, "File not found");
    }

    #[tokio::test]
    async fn delete_unknown_id_is_not_found() {
        let (server, _dir) = setup().await;

        let response = server.delete("/documents/999999").await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

        let body = response.json::<serde_json::Value>();
        assert_eq!(body["error"], "File not found");
    }

    #[tokio::test]
    async fn list_orders_newest_first() {
        let (server, _dir) = setup().await;

        for name in ["a.pdf", "b.pdf", "c.pdf"] {
            let response = server
                .post("/documents/upload")
                .multipart(pdf_form(name, b"%PDF-1.4".to_vec()))
                .await;
            assert_eq!(response.status_code(), StatusCode::CREATED);
        }

        let docs = server.get("/documents").await.json::<Vec<DocumentResponseDto>>();
        let names: Vec<&str> = docs.iter().map(|d| d.filename.as_str()).collect();
        assert_eq!(names, vec!["c.pdf", "b.pdf", "a.pdf"]);
    }

    #[tokio::test]
    async fn upload_download_delete_round_trip() {
        let (server, _dir) = setup().await;
        let body = vec![0x25u8; 2048];

        // Upload
        let response = server
            .post("/documents/upload")
            .multipart(pdf_form("report.pdf", body.clone()))
            .await;
        assert_eq!(response.status_code(), StatusCode::CREATED);
        let uploaded = response.json::<UploadResponseDto>();
        assert_eq!(uploaded.message, "Uploaded Successfully");
        assert_eq!(uploaded.doc.filename, "report.pdf");
        assert_eq!(uploaded.doc.filesize, 2048);

        // List contains exactly that document
        let docs = server.get("/documents").await.json::<Vec<DocumentResponseDto>>();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, uploaded.doc.id);

        // Download streams the full blob with the original name
        let download = server.get(&format!("/documents/{}", uploaded.doc.id)).await;
        assert_eq!(download.status_code(), StatusCode::OK);
        assert_eq!(download.as_bytes().len(), 2048);
        let disposition = download
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        assert!(disposition.contains("report.pdf"));

        // Delete
        let deleted = server.delete(&format!("/documents/{}", uploaded.doc.id)).await;
        assert_eq!(deleted.status_code(), StatusCode::OK);
        assert_eq!(
            deleted.json::<MessageResponseDto>().message,
            "Deleted Successfully"
        );

        // Second delete sees a clean 404
        let again = server.delete(&format!("/documents/{}", uploaded.doc.id)).await;
        assert_eq!(again.status_code(), StatusCode::NOT_FOUND);

        // List is empty again
        let docs = server.get("/documents").await.json::<Vec<DocumentResponseDto>>();
        assert!(docs.is_empty());
    }
}
