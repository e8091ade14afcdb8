//! Minimal `Cookie` / `Set-Cookie` handling for the two cookies the service
//! owns (session and locale).

use axum::http::{header, HeaderMap, HeaderValue};

/// Returns the value of the first cookie called `name` across all `Cookie` headers.
pub fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            (key.trim() == name).then(|| value.trim())
        })
        .find(|value| !value.is_empty())
}

/// Builder for a `Set-Cookie` header value.
#[derive(Debug, Clone)]
pub struct SetCookie {
    name: String,
    value: String,
    max_age: Option<i64>,
    http_only: bool,
    secure: bool,
}

impl SetCookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            max_age: None,
            http_only: false,
            secure: false,
        }
    }

    /// Expired cookie that makes the browser drop `name`.
    pub fn removal(name: impl Into<String>) -> Self {
        Self::new(name, "").max_age(0)
    }

    pub fn max_age(mut self, seconds: i64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    pub fn http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn to_header_value(&self) -> Option<HeaderValue> {
        HeaderValue::from_str(&self.to_string()).ok()
    }
}

impl std::fmt::Display for SetCookie {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}; Path=/", self.name, self.value)?;
        if let Some(max_age) = self.max_age {
            write!(f, "; Max-Age={}", max_age)?;
        }
        write!(f, "; SameSite=Lax")?;
        if self.http_only {
            write!(f, "; HttpOnly")?;
        }
        if self.secure {
            write!(f, "; Secure")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_cookie_from_any_header() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(
            header::COOKIE,
            HeaderValue::from_static("a=1; NEXT_LOCALE=fr ; b=2"),
        );

        assert_eq!(read_cookie(&headers, "NEXT_LOCALE"), Some("fr"));
        assert_eq!(read_cookie(&headers, "theme"), Some("dark"));
        assert_eq!(read_cookie(&headers, "missing"), None);
    }

    #[test]
    fn empty_values_count_as_absent() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("bestof_session="));
        assert_eq!(read_cookie(&headers, "bestof_session"), None);
    }

    #[test]
    fn formats_set_cookie() {
        let cookie = SetCookie::new("NEXT_LOCALE", "fr").max_age(31_536_000);
        assert_eq!(
            cookie.to_string(),
            "NEXT_LOCALE=fr; Path=/; Max-Age=31536000; SameSite=Lax"
        );

        let session = SetCookie::removal("bestof_session")
            .http_only(true)
            .secure(true);
        assert_eq!(
            session.to_string(),
            "bestof_session=; Path=/; Max-Age=0; SameSite=Lax; HttpOnly; Secure"
        );
    }
}
