use actix_web::HttpRequest;
use chrono::Local;
use log::{error, info, LevelFilter};
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config as LogConfig, Root};
use log4rs::encode::pattern::PatternEncoder;

const LOG_CONFIG_FILE: &str = "src/configs/log4rs.yaml";

// Load the log4rs file, or fall back to plain console output when it is absent.
pub fn init_logging() {
    let config_path = format!("{}/{}", env!("CARGO_MANIFEST_DIR"), LOG_CONFIG_FILE);
    if log4rs::init_file(&config_path, Default::default()).is_ok() {
        return;
    }

    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new("{d(%Y-%m-%d %H:%M:%S)} {h({l})} {t} - {m}{n}")))
        .build();
    let fallback = LogConfig::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(LevelFilter::Info));
    match fallback {
        Ok(config) => {
            let _ = log4rs::init_config(config);
        }
        Err(err) => eprintln!("Failed to configure logging: {}", err),
    }
}

// Combined log format line for one handled request, with the error appended on failure
pub fn log_request(req: &HttpRequest, status_code: u16, error_message: Option<&str>) -> String {
    let referer = req.headers()
        .get("Referer")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");
    let user_agent = req.headers()
        .get("User-Agent")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");
    let client_ip = req.peer_addr().map(|addr| addr.ip().to_string()).unwrap_or_else(|| "unknown".to_string());
    let request_method = req.method().as_str();
    let request_uri = req.uri().to_string();
    let http_version = format!("{:?}", req.version());
    let time = Local::now().format("%d/%b/%Y:%H:%M:%S %z");

    match error_message {
        Some(msg) => format!(
            "{client_ip} - - [{time}] \"{request_method} {request_uri} {http_version}\" {status_code} \"{referer}\" \"{user_agent}\" \"{msg}\""
        ),
        None => format!(
            "{client_ip} - - [{time}] \"{request_method} {request_uri} {http_version}\" {status_code} \"{referer}\" \"{user_agent}\""
        ),
    }
}

pub fn record(req: &HttpRequest, status_code: u16, error_message: Option<&str>) {
    let line = log_request(req, status_code, error_message);
    match error_message {
        Some(_) => error!(target: "error_log", "{}", line),
        None => info!(target: "access_log", "{}", line),
    }
}
