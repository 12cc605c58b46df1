pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService, LoginResult};
pub use auth_service_impl::SeaOrmAuthService;

pub mod bookmark_service;
pub mod bookmark_service_impl;
pub use bookmark_service::{BookmarkError, BookmarkService};
pub use bookmark_service_impl::SeaOrmBookmarkService;
