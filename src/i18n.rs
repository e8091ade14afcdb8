//! Supported locales, locale negotiation and the embedded message catalogs.

use crate::errors::ServiceError;
use crate::middleware_helpers::cookies::{read_cookie, SetCookie};
use axum::http::{header, HeaderMap};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use utoipa::ToSchema;

/// Cookie remembering the visitor's language choice.
pub const LOCALE_COOKIE: &str = "NEXT_LOCALE";

/// One year.
pub const LOCALE_COOKIE_MAX_AGE: i64 = 31_536_000;

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Locale {
    #[default]
    En,
    Fr,
}

static CATALOGS: Lazy<HashMap<Locale, Result<Value, String>>> = Lazy::new(|| {
    let sources = [
        (Locale::En, include_str!("../locales/en.json")),
        (Locale::Fr, include_str!("../locales/fr.json")),
    ];
    sources
        .into_iter()
        .map(|(locale, raw)| {
            let parsed = serde_json::from_str::<Value>(raw).map_err(|e| e.to_string());
            (locale, parsed)
        })
        .collect()
});

impl Locale {
    pub const ALL: [Locale; 2] = [Locale::En, Locale::Fr];

    pub fn as_str(self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Fr => "fr",
        }
    }

    /// Case-insensitive; surrounding whitespace ignored.
    pub fn parse(value: &str) -> Option<Self> {
        value.trim().parse().ok()
    }

    /// The embedded message catalog for this locale.
    pub fn messages(self) -> Result<&'static Value, ServiceError> {
        match CATALOGS.get(&self) {
            Some(Ok(catalog)) => Ok(catalog),
            Some(Err(e)) => Err(ServiceError::InternalError(format!(
                "message catalog for {} is invalid: {}",
                self, e
            ))),
            None => Err(ServiceError::NotFound(
                "Messages not found for locale".to_string(),
            )),
        }
    }

    pub fn cookie(self) -> SetCookie {
        SetCookie::new(LOCALE_COOKIE, self.as_str()).max_age(LOCALE_COOKIE_MAX_AGE)
    }
}

/// First supported language in an `Accept-Language` header, honouring q-values.
pub fn from_accept_language(header_value: &str) -> Option<Locale> {
    let mut candidates: Vec<(f32, Locale)> = header_value
        .split(',')
        .filter_map(|entry| {
            let mut parts = entry.trim().split(';');
            let tag = parts.next()?.trim();
            let quality = parts
                .find_map(|param| param.trim().strip_prefix("q="))
                .and_then(|q| q.trim().parse::<f32>().ok())
                .unwrap_or(1.0);
            let primary = tag.split(['-', '_']).next()?;
            let locale = Locale::parse(primary)?;
            (quality > 0.0).then_some((quality, locale))
        })
        .collect();

    // Stable sort keeps header order among equal weights.
    candidates.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    candidates.first().map(|(_, locale)| *locale)
}

/// Cookie, then `Accept-Language`, then `default`.
pub fn preferred_locale(headers: &HeaderMap, default: Locale) -> Locale {
    read_cookie(headers, LOCALE_COOKIE)
        .and_then(Locale::parse)
        .or_else(|| {
            headers
                .get(header::ACCEPT_LANGUAGE)
                .and_then(|v| v.to_str().ok())
                .and_then(from_accept_language)
        })
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use rstest::rstest;

    #[rstest]
    #[case("fr-CA,fr;q=0.9,en;q=0.8", Some(Locale::Fr))]
    #[case("de-DE,de;q=0.9,en;q=0.5", Some(Locale::En))]
    #[case("en;q=0.3, fr;q=0.7", Some(Locale::Fr))]
    #[case("es, it", None)]
    #[case("fr;q=0, en", Some(Locale::En))]
    #[case("", None)]
    fn accept_language_negotiation(#[case] header: &str, #[case] expected: Option<Locale>) {
        assert_eq!(from_accept_language(header), expected);
    }

    #[test]
    fn cookie_beats_accept_language() {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static("fr"));
        assert_eq!(preferred_locale(&headers, Locale::En), Locale::Fr);

        headers.insert(header::COOKIE, HeaderValue::from_static("NEXT_LOCALE=en"));
        assert_eq!(preferred_locale(&headers, Locale::Fr), Locale::En);
    }

    #[test]
    fn unsupported_cookie_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("NEXT_LOCALE=de"));
        assert_eq!(preferred_locale(&headers, Locale::Fr), Locale::Fr);
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(Locale::parse(" FR "), Some(Locale::Fr));
        assert_eq!(Locale::parse("de"), None);
        assert_eq!(Locale::default().as_str(), "en");
    }

    #[test]
    fn catalogs_share_top_level_sections() {
        for locale in Locale::ALL {
            let catalog = locale.messages().unwrap();
            for section in ["navigation", "home", "products", "order", "blog", "locale"] {
                assert!(catalog.get(section).is_some(), "{locale} lacks {section}");
            }
        }
        assert_eq!(
            Locale::Fr.messages().unwrap()["navigation"]["home"],
            "Accueil"
        );
    }

    #[test]
    fn locale_cookie_lasts_a_year() {
        assert_eq!(
            Locale::Fr.cookie().to_string(),
            "NEXT_LOCALE=fr; Path=/; Max-Age=31536000; SameSite=Lax"
        );
    }
}
