mod key;
mod user;

pub use key::{cmd_key_create, cmd_key_delete, cmd_key_list};
pub use user::{cmd_user_delete, cmd_user_list, cmd_user_set};
