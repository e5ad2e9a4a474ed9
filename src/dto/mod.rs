pub mod auth_dto;
pub mod qrcode_dto;
pub mod user_dto;
