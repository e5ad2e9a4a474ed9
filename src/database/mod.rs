pub mod memory;
pub mod pool;
pub mod qrcode_store;
pub mod session_store;
pub mod user_store;

pub use memory::MemoryStore;
pub use qrcode_store::{PgQrCodeStore, QrCodeStore};
pub use session_store::{PgSessionStore, SessionResolver, SessionStore};
pub use user_store::{PgUserStore, UserStore};
