pub use super::api_keys::Entity as ApiKeys;
pub use super::bookmarks::Entity as Bookmarks;
pub use super::sessions::Entity as Sessions;
pub use super::tag_bookmarks::Entity as TagBookmarks;
pub use super::tags::Entity as Tags;
pub use super::users::Entity as Users;
