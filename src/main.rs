use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use log::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod apis;
mod configs;
mod cores;
mod utils;

use crate::apis::api_doc::ApiDoc;
use crate::configs::settings::Config;
use crate::utils::build_http_client;
use crate::utils::log::init_logging;

#[cfg(test)]
mod test;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    init_logging();

    let config = Config::load_config()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, format!("Config load failed: {}", e)))?;
    let client = build_http_client(&config.server)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, format!("HTTP client setup failed: {}", e)))?;

    // Missing credentials are reported per request, not here
    if config.replicate.api_token.is_none() {
        info!("REPLICATE_API_TOKEN is not set; upscale requests will fail until it is configured");
    }
    if config.imgbb.api_key.is_none() {
        info!("IMGBB_API_KEY is not set; file uploads will fail until it is configured");
    }

    let bind_address = (config.server.bind_address.clone(), config.server.port);
    info!("Starting server on {}:{}", bind_address.0, bind_address.1);

    let server = config.server.clone();
    let config = web::Data::new(config);
    let client = web::Data::new(client);
    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET", "POST"])
            .allowed_headers(vec!["Content-Type", "Authorization", "User-Agent"])
            .max_age(3600);

        let server = server.clone();
        App::new()
            .wrap(cors)
            .app_data(config.clone())
            .app_data(client.clone())
            .configure(move |cfg| apis::configure(cfg, &server))
            .service(SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()))
    })
    .bind(bind_address)?
    .run()
    .await
}
