use super::ApiError;

pub fn validate_id(resource: &str, id: i32) -> Result<i32, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid {resource} ID: {id}. ID must be a positive integer"
        )));
    }
    Ok(id)
}

/// Only same-site relative paths are honoured after login; anything else
/// falls back to `/`.
#[must_use]
pub fn validate_redirect_target(target: &str) -> &str {
    let same_site = target.starts_with('/')
        && !target.starts_with("//")
        && !target.starts_with("/\\")
        && !target.chars().any(char::is_control);

    if same_site { target } else { "/" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_id() {
        assert!(validate_id("bookmark", 1).is_ok());
        assert!(validate_id("bookmark", 0).is_err());
        assert!(validate_id("key", -4).is_err());
    }

    #[test]
    fn test_redirect_targets() {
        assert_eq!(validate_redirect_target("/bookmarks?page=2"), "/bookmarks?page=2");
        assert_eq!(validate_redirect_target(""), "/");
        assert_eq!(validate_redirect_target("https://evil.example"), "/");
        assert_eq!(validate_redirect_target("//evil.example"), "/");
        assert_eq!(validate_redirect_target("/\\evil.example"), "/");
        assert_eq!(validate_redirect_target("/a\r\nSet-Cookie: x"), "/");
    }
}
