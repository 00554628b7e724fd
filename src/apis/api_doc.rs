use utoipa::OpenApi;

use crate::apis::schemas::ErrorResponse;
use crate::apis::upscale_api;
use crate::apis::upscale_api::schemas::{ImageUploadDoc, UploadImageResponse, UpscaleRequest, UpscaleResponse};

#[derive(OpenApi)]
#[openapi(
    paths(
        upscale_api::upscale::health,
        upscale_api::upscale::upscale,
        upscale_api::upscale::upscale_file,
        upscale_api::upload_image::upload_image,
    ),
    components(
        schemas(UpscaleRequest, UpscaleResponse, UploadImageResponse, ImageUploadDoc, ErrorResponse)
    )
)]
pub struct ApiDoc;
