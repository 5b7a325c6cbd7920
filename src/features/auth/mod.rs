/// 認証機能のモジュール
pub mod commands;
pub mod models;
pub mod service;
pub mod session;
pub mod token_store;

pub use models::{AuthError, User};
pub use service::AuthService;
pub use session::Session;
pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStore};
