pub mod schemas;
pub mod upload_image;
pub mod upscale;
