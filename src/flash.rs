use axum_extra::extract::cookie::{Cookie, CookieJar};

/// Name of the one-shot message cookie.
///
/// A flash is written next to a redirect and consumed by the first page GET
/// that renders it, replicating the classic post/redirect/get message flow.
pub const FLASH_COOKIE: &str = "flash";

/// set_flash
///
/// Attaches a one-shot message to the response jar. The cookie is
/// session-scoped (no max-age) and path-wide so any follow-up page can
/// consume it.
pub fn set_flash(jar: CookieJar, message: &str) -> CookieJar {
    jar.add(
        Cookie::build((FLASH_COOKIE, message.to_owned()))
            .path("/")
            .build(),
    )
}

/// take_flash
///
/// Reads and clears the pending flash message, if one exists. The returned
/// jar must be included in the response for the removal to reach the client.
pub fn take_flash(jar: CookieJar) -> (CookieJar, Option<String>) {
    match jar.get(FLASH_COOKIE).map(|cookie| cookie.value().to_string()) {
        Some(message) => {
            let jar = jar.remove(Cookie::build((FLASH_COOKIE, "")).path("/").build());
            (jar, Some(message))
        }
        None => (jar, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flash_round_trip() {
        let jar = set_flash(CookieJar::new(), "Hello there");
        let (jar, message) = take_flash(jar);
        assert_eq!(message.as_deref(), Some("Hello there"));

        // A second take finds nothing: the message is one-shot.
        let (_, message) = take_flash(jar);
        assert!(message.is_none());
    }

    #[test]
    fn test_take_flash_empty_jar() {
        let (_, message) = take_flash(CookieJar::new());
        assert!(message.is_none());
    }
}
