pub mod api_key;
pub mod bookmark;
pub mod session;
pub mod tag;
pub mod user;
