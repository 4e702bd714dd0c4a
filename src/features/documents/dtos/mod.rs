mod document_dto;

pub use document_dto::{
    DocumentResponseDto, MessageResponseDto, UploadDocumentDto, UploadResponseDto, MAX_UPLOAD_SIZE,
    PDF_MIME_TYPE,
};
