//! Renewal token cookie

use std::time::Duration;

/// Cookie carrying the renewal token
pub const RENEWAL_COOKIE: &str = "refreshToken";

/// Only the auth routes ever receive the renewal token
const RENEWAL_COOKIE_PATH: &str = "/api/auth";

/// `Set-Cookie` value delivering a renewal token
pub fn renewal_cookie(token: &str, max_age: Duration, secure: bool) -> String {
    build(token, max_age.as_secs(), secure)
}

/// `Set-Cookie` value clearing the renewal token
pub fn expired_renewal_cookie(secure: bool) -> String {
    build("", 0, secure)
}

fn build(value: &str, max_age_secs: u64, secure: bool) -> String {
    let mut cookie = format!(
        "{RENEWAL_COOKIE}={value}; HttpOnly; Path={RENEWAL_COOKIE_PATH}; SameSite=Lax; Max-Age={max_age_secs}"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renewal_cookie() {
        let cookie = renewal_cookie("a.b.c", Duration::from_secs(1_209_600), true);
        assert_eq!(
            cookie,
            "refreshToken=a.b.c; HttpOnly; Path=/api/auth; SameSite=Lax; Max-Age=1209600; Secure"
        );
    }

    #[test]
    fn test_insecure_cookie() {
        let cookie = renewal_cookie("a.b.c", Duration::from_secs(60), false);
        assert!(!cookie.contains("Secure"));
        assert!(cookie.contains("HttpOnly"));
    }

    #[test]
    fn test_expired_cookie() {
        let cookie = expired_renewal_cookie(false);
        assert_eq!(
            cookie,
            "refreshToken=; HttpOnly; Path=/api/auth; SameSite=Lax; Max-Age=0"
        );
    }
}
