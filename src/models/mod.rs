pub mod qrcode;
pub mod session;
pub mod user;
