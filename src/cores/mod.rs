pub mod errors;
pub mod image_hosts;
pub mod predictions;
pub mod schemas;
pub mod upscale_models;
