use actix_multipart::form::bytes::Bytes as FileBytes;
use actix_multipart::form::MultipartForm;
use actix_web::{web, HttpRequest, HttpResponse};
use reqwest::Client;

use crate::apis::{method_not_allowed, respond};
use crate::apis::upscale_api::schemas::{ImageUploadForm, UploadImageResponse};
use crate::configs::settings::Config;
use crate::cores::errors::RelayError;
use crate::cores::image_hosts::host_controller::ImageHost;
use crate::cores::image_hosts::imgbb::ImgBb;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/api/upload-image")
            .route(web::post().to(upload_image))
            .default_service(web::route().to(method_not_allowed)),
    );
}

// Pull the `image` part out of the form, rejecting a missing or empty file.
pub fn take_image(form: ImageUploadForm) -> Result<FileBytes, RelayError> {
    match form.image {
        Some(image) if !image.data.is_empty() => Ok(image),
        _ => Err(RelayError::InvalidInput("no image file found in the upload".to_string())),
    }
}

async fn host_upload(config: &Config, client: &Client, form: ImageUploadForm) -> Result<UploadImageResponse, RelayError> {
    let host: Box<dyn ImageHost> = Box::new(ImgBb::from_settings(&config.imgbb, client.clone())?);
    let image = take_image(form)?;
    let hosted = host.host(&image.data, image.file_name.as_deref()).await?;
    Ok(UploadImageResponse {
        public_url: hosted.url,
        delete_url: hosted.delete_url,
        message: "Upload completed successfully.".to_string(),
    })
}

#[utoipa::path(
    post,
    path = "/api/upload-image",
    request_body(content = ImageUploadDoc, content_type = "multipart/form-data"),
    responses(
        (status = 200, body = UploadImageResponse),
        (status = 400, body = ErrorResponse),
        (status = 500, body = ErrorResponse),
    )
)]
pub async fn upload_image(
    req: HttpRequest,
    config: web::Data<Config>,
    client: web::Data<Client>,
    MultipartForm(form): MultipartForm<ImageUploadForm>,
) -> HttpResponse {
    let result = host_upload(&config, &client, form).await;
    respond(&req, result)
}
