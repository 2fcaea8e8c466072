use std::collections::HashMap;

use rtgate_common::TRUST_COOKIE;

/// Parse a `Cookie` header into a name → value map.
///
/// Entries are split on `;`, trimmed, and split once on the first `=`.
/// A malformed or empty header yields an empty map, never an error; an
/// entry without `=` is kept with an empty value so presence checks work.
pub fn parse_cookies(header: &str) -> HashMap<String, String> {
    header
        .split(';')
        .filter_map(|part| {
            let part = part.trim();
            if part.is_empty() {
                return None;
            }
            match part.split_once('=') {
                Some((name, value)) => Some((name.to_string(), value.to_string())),
                None => Some((part.to_string(), String::new())),
            }
        })
        .collect()
}

/// `Set-Cookie` value establishing the trust cookie for `max_age_secs`.
pub fn trust_cookie(max_age_secs: u64) -> String {
    format!("{TRUST_COOKIE}=1; Max-Age={max_age_secs}; Path=/; HttpOnly; Secure; SameSite=Lax")
}

/// `Set-Cookie` value expiring the trust cookie immediately.
pub fn expire_trust_cookie() -> String {
    format!("{TRUST_COOKIE}=; Max-Age=0; Path=/; HttpOnly; Secure; SameSite=Lax")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic() {
        let cookies = parse_cookies("rt_sid=abc123; rt_pass=1");
        assert_eq!(cookies.get("rt_sid").map(String::as_str), Some("abc123"));
        assert_eq!(cookies.get("rt_pass").map(String::as_str), Some("1"));
    }

    #[test]
    fn test_parse_splits_on_first_equals() {
        let cookies = parse_cookies("data=a=b=c");
        assert_eq!(cookies.get("data").map(String::as_str), Some("a=b=c"));
    }

    #[test]
    fn test_parse_malformed_never_errors() {
        assert!(parse_cookies("").is_empty());
        assert!(parse_cookies(";;;").is_empty());

        let cookies = parse_cookies("lonely; rt_sid=abc");
        assert_eq!(cookies.get("lonely").map(String::as_str), Some(""));
        assert_eq!(cookies.get("rt_sid").map(String::as_str), Some("abc"));
    }

    #[test]
    fn test_trust_cookie_attributes() {
        let header = trust_cookie(86_400);
        assert_eq!(
            header,
            "rt_pass=1; Max-Age=86400; Path=/; HttpOnly; Secure; SameSite=Lax"
        );
    }

    #[test]
    fn test_expire_trust_cookie() {
        let header = expire_trust_cookie();
        assert!(header.starts_with("rt_pass=;"));
        assert!(header.contains("Max-Age=0"));
    }
}
