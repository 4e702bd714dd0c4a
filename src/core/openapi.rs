use utoipa::{Modify, OpenApi};

use crate::features::documents::{dtos as documents_dtos, handlers as documents_handlers};
use crate::shared::types::ErrorResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        documents_handlers::upload_document,
        documents_handlers::list_documents,
        documents_handlers::download_document,
        documents_handlers::delete_document,
    ),
    components(
        schemas(
            documents_dtos::DocumentResponseDto,
            documents_dtos::UploadDocumentDto,
            documents_dtos::UploadResponseDto,
            documents_dtos::MessageResponseDto,
            ErrorResponse,
        )
    ),
    tags(
        (name = "documents", description = "PDF document upload, listing, download and deletion"),
    ),
    info(
        title = "Docshelf API",
        version = "0.1.0",
        description = "Document portal API documentation",
    )
)]
pub struct ApiDoc;

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
