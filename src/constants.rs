pub mod auth {

    pub const COOKIE_NAME: &str = "bookmark_auth";

    pub const CSRF_FIELD: &str = "csrf-token";

    pub const SESSION_TOKEN_BYTES: usize = 32;

    pub const SALT_BYTES: usize = 16;

    pub const HASH_BYTES: usize = 32;
}

pub mod limits {

    /// Largest form body the CSRF middleware will buffer
    pub const MAX_FORM_BYTES: usize = 64 * 1024;

    pub const MAX_NAME_LENGTH: usize = 1024;

    pub const MAX_URL_LENGTH: usize = 8192;
}
