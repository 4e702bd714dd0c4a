use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Error body returned for every 4xx/5xx response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}
