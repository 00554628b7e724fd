pub mod api_doc;
pub mod schemas;
pub mod upscale_api;

use actix_multipart::form::MultipartFormConfig;
use actix_web::{web, HttpRequest, HttpResponse, ResponseError};
use serde::Serialize;

use crate::apis::schemas::ErrorResponse;
use crate::configs::settings::ServerSettings;
use crate::cores::errors::RelayError;
use crate::utils::log::record;

// JSON bodies only ever carry a URL.
const JSON_LIMIT_BYTES: usize = 64 * 1024;

pub fn configure(cfg: &mut web::ServiceConfig, server: &ServerSettings) {
    cfg.app_data(json_config())
        .app_data(multipart_config(server.max_upload_bytes));
    upscale_api::upscale::configure(cfg);
    upscale_api::upload_image::configure(cfg);
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_LIMIT_BYTES)
        .error_handler(|err, req| {
            let err = RelayError::InvalidInput(format!("invalid JSON body: {}", err));
            record(req, err.status_code().as_u16(), Some(&err.to_string()));
            err.into()
        })
}

fn multipart_config(max_upload_bytes: usize) -> MultipartFormConfig {
    MultipartFormConfig::default()
        .total_limit(max_upload_bytes)
        .memory_limit(max_upload_bytes)
        .error_handler(|err, req| {
            let err = RelayError::InvalidInput(format!("invalid upload: {}", err));
            record(req, err.status_code().as_u16(), Some(&err.to_string()));
            err.into()
        })
}

// Log the outcome and turn it into the client-facing response.
pub fn respond<T: Serialize>(req: &HttpRequest, result: Result<T, RelayError>) -> HttpResponse {
    match result {
        Ok(body) => {
            record(req, 200, None);
            HttpResponse::Ok().json(body)
        }
        Err(err) => {
            let response = err.error_response();
            record(req, response.status().as_u16(), Some(&err.to_string()));
            response
        }
    }
}

pub async fn method_not_allowed(req: HttpRequest) -> HttpResponse {
    let message = format!("Method {} Not Allowed", req.method());
    record(&req, 405, Some(&message));
    HttpResponse::MethodNotAllowed()
        .insert_header(("Allow", "POST"))
        .json(ErrorResponse { message, error: None })
}
