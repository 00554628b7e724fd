use actix_multipart::form::MultipartForm;
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use reqwest::Client;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::apis::{method_not_allowed, respond};
use crate::apis::upscale_api::schemas::{ImageUploadForm, UpscaleRequest, UpscaleResponse};
use crate::apis::upscale_api::upload_image::take_image;
use crate::configs::settings::Config;
use crate::cores::errors::RelayError;
use crate::cores::image_hosts::host_controller::ImageHost;
use crate::cores::image_hosts::imgbb::ImgBb;
use crate::cores::schemas::UpscaleOutcome;
use crate::cores::upscale_models::realesrgan::RealEsrgan;
use crate::cores::upscale_models::upscale_controller::Upscaler;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health)
        .service(
            web::resource("/api/upscale")
                .route(web::post().to(upscale))
                .default_service(web::route().to(method_not_allowed)),
        )
        .service(
            web::resource("/api/upscale/file")
                .route(web::post().to(upscale_file))
                .default_service(web::route().to(method_not_allowed)),
        );
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, body = String))
)]
#[get("/health")]
pub async fn health() -> impl Responder {
    "OK"
}

// Accept only absolute http(s) URLs; anything else is rejected before any outbound call.
pub fn validate_image_url(raw: Option<&str>) -> Result<String, RelayError> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty())
        .ok_or_else(|| RelayError::InvalidInput("image URL was not provided".to_string()))?;
    let parsed = Url::parse(raw)
        .map_err(|err| RelayError::InvalidInput(format!("image URL is not valid: {}", err)))?;
    match parsed.scheme() {
        "http" | "https" if parsed.has_host() => Ok(raw.to_string()),
        _ => Err(RelayError::InvalidInput("image URL must be an http or https address".to_string())),
    }
}

fn upscale_response(outcome: UpscaleOutcome, original_url: Option<String>) -> UpscaleResponse {
    UpscaleResponse {
        upscaled_url: outcome.artifacts.first().cloned().unwrap_or_default(),
        upscaled_urls: outcome.artifacts,
        prediction_id: outcome.prediction_id,
        original_url,
        message: "Upscale completed successfully.".to_string(),
    }
}

// The token is cancelled when this future is dropped, i.e. when the client goes away.
pub async fn run_model(model: &dyn Upscaler, image_url: &str) -> Result<UpscaleOutcome, RelayError> {
    let cancel = CancellationToken::new();
    let _request_alive = cancel.clone().drop_guard();
    model.upscale(image_url, cancel.clone()).await
}

async fn upscale_by_url(config: &Config, client: &Client, req_body: UpscaleRequest) -> Result<UpscaleResponse, RelayError> {
    // 1. Credentials first, so a misconfigured server never calls out
    let model: Box<dyn Upscaler> = Box::new(RealEsrgan::from_config(config, client.clone())?);

    // 2. Validate the image reference
    let image_url = validate_image_url(req_body.image_url.as_deref())?;

    // 3. Submit and wait for the job
    let outcome = run_model(model.as_ref(), &image_url).await?;
    Ok(upscale_response(outcome, None))
}

async fn upscale_upload(config: &Config, client: &Client, form: ImageUploadForm) -> Result<UpscaleResponse, RelayError> {
    let host: Box<dyn ImageHost> = Box::new(ImgBb::from_settings(&config.imgbb, client.clone())?);
    let model: Box<dyn Upscaler> = Box::new(RealEsrgan::from_config(config, client.clone())?);

    let image = take_image(form)?;
    let hosted = host.host(&image.data, image.file_name.as_deref()).await?;

    let outcome = run_model(model.as_ref(), &hosted.url).await?;
    Ok(upscale_response(outcome, Some(hosted.url)))
}

#[utoipa::path(
    post,
    path = "/api/upscale",
    request_body = UpscaleRequest,
    responses(
        (status = 200, body = UpscaleResponse),
        (status = 400, body = ErrorResponse),
        (status = 401, body = ErrorResponse),
        (status = 404, body = ErrorResponse),
        (status = 500, body = ErrorResponse),
        (status = 504, body = ErrorResponse),
    )
)]
pub async fn upscale(
    req: HttpRequest,
    config: web::Data<Config>,
    client: web::Data<Client>,
    req_body: web::Json<UpscaleRequest>,
) -> HttpResponse {
    let result = upscale_by_url(&config, &client, req_body.into_inner()).await;
    respond(&req, result)
}

#[utoipa::path(
    post,
    path = "/api/upscale/file",
    request_body(content = ImageUploadDoc, content_type = "multipart/form-data"),
    responses(
        (status = 200, body = UpscaleResponse),
        (status = 400, body = ErrorResponse),
        (status = 500, body = ErrorResponse),
        (status = 504, body = ErrorResponse),
    )
)]
pub async fn upscale_file(
    req: HttpRequest,
    config: web::Data<Config>,
    client: web::Data<Client>,
    MultipartForm(form): MultipartForm<ImageUploadForm>,
) -> HttpResponse {
    let result = upscale_upload(&config, &client, form).await;
    respond(&req, result)
}
