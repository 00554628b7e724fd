use actix_multipart::form::bytes::Bytes as FileBytes;
use actix_multipart::form::MultipartForm;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// Request body of POST /api/upscale.
#[derive(Deserialize, Serialize, ToSchema, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpscaleRequest {
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UpscaleResponse {
    pub upscaled_url: String,
    pub upscaled_urls: Vec<String>,
    pub prediction_id: String,
    // Set when the image was hosted by this service first
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub original_url: Option<String>,
    pub message: String,
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UploadImageResponse {
    pub public_url: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub delete_url: Option<String>,
    pub message: String,
}

// Multipart body shared by the upload endpoints; the file goes in the `image` field.
#[derive(MultipartForm)]
pub struct ImageUploadForm {
    pub image: Option<FileBytes>,
}

// OpenAPI description of `ImageUploadForm`.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct ImageUploadDoc {
    #[schema(value_type = String, format = Binary)]
    pub image: Vec<u8>,
}
