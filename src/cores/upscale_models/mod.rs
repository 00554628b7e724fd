pub mod realesrgan;
pub mod upscale_controller;
