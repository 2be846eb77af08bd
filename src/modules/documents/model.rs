pub use scolaris_models::documents::{
    Document, DocumentFilterParams, NewDocument, PaginatedDocumentsResponse, UploadDocumentForm,
};
