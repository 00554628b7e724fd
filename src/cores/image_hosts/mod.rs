pub mod host_controller;
pub mod imgbb;
