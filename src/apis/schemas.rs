use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ------------------------------------------ General Error API ------------------------------------------
#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
    // Raw upstream text, when the failure came from a provider
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}
