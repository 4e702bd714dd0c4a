pub mod document_handler;

pub use document_handler::{
    __path_delete_document, __path_download_document, __path_list_documents,
    __path_upload_document, delete_document, download_document, list_documents, upload_document,
};
