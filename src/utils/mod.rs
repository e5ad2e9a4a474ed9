pub mod crypto;
pub mod params;
pub mod token;
