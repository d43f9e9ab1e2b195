use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;

/// Builds the `Authorization` header value for HTTP Basic authentication.
pub fn basic_authorization(username: &str, password: &str) -> String {
    let credentials = format!("{}:{}", username, password);
    format!("Basic {}", BASE64_STANDARD.encode(credentials.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::basic_authorization;

    #[test]
    fn encodes_user_and_password() {
        assert_eq!(
            basic_authorization("admin", "secret"),
            "Basic YWRtaW46c2VjcmV0"
        );
    }

    #[test]
    fn empty_credentials_still_produce_header() {
        assert_eq!(basic_authorization("", ""), "Basic Og==");
    }
}
