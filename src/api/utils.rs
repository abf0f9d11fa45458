use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "chatline_session";

/// The session ID sent by the browser, if any.
pub fn session_id(jar: &CookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|id| !id.is_empty())
}

pub fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}

/// Returns the caller's session ID, minting a new one and adding it
/// to the cookie jar when there isn't one yet.
pub fn ensure_session(jar: CookieJar) -> (CookieJar, String) {
    if let Some(id) = session_id(&jar) {
        return (jar, id);
    }
    let id = new_session_id();
    let cookie = Cookie::build((SESSION_COOKIE, id.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);
    (jar.add(cookie), id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_reuses_an_existing_session() {
        let jar = CookieJar::new().add(Cookie::new(SESSION_COOKIE, "abc"));
        let (jar, id) = ensure_session(jar);
        assert_eq!(id, "abc");
        assert_eq!(jar.get(SESSION_COOKIE).unwrap().value(), "abc");
    }

    #[test]
    fn it_creates_a_session_cookie() {
        let (jar, id) = ensure_session(CookieJar::new());
        let cookie = jar.get(SESSION_COOKIE).unwrap();
        assert_eq!(cookie.value(), id);
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert!(Uuid::parse_str(&id).is_ok());
    }

    #[test]
    fn it_ignores_an_empty_cookie() {
        let jar = CookieJar::new().add(Cookie::new(SESSION_COOKIE, ""));
        let (_, id) = ensure_session(jar);
        assert!(!id.is_empty());
    }
}
