pub mod auth_service;
pub mod qr_image_service;
pub mod qrcode_service;
pub mod user_service;
