pub mod prelude;

pub mod api_keys;
pub mod bookmarks;
pub mod sessions;
pub mod tag_bookmarks;
pub mod tags;
pub mod users;
