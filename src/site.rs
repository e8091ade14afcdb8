//! Locale routing for page requests and the static site they land on.
//!
//! Every non-API path is expected to start with a supported locale. Requests
//! without one are redirected to the visitor's preferred locale, admin pages
//! require an ADMIN session, and the chosen locale is remembered in the
//! `NEXT_LOCALE` cookie.

use crate::{
    auth::AuthService,
    i18n::{preferred_locale, Locale, LOCALE_COOKIE},
    middleware_helpers::cookies::read_cookie,
};
use axum::{
    extract::{Request, State},
    http::header,
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
    Router,
};
use std::{path::Path, sync::Arc};
use tower_http::services::ServeDir;
use tracing::debug;
use url::form_urlencoded;

/// Prefixes owned by the API and tooling, never locale-routed.
const RESERVED_PREFIXES: [&str; 4] = ["/api", "/health", "/swagger-ui", "/api-docs"];

#[derive(Clone)]
pub struct SiteState {
    pub auth: Arc<AuthService>,
    pub default_locale: Locale,
}

/// What the gate decided for a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageRoute {
    /// Served as-is: files, API and tooling paths.
    PassThrough,
    /// 307 to the given location.
    Redirect(String),
    /// A localized page; `admin` when under `/{locale}/admin`.
    Page { locale: Locale, admin: bool },
}

fn is_reserved(path: &str) -> bool {
    RESERVED_PREFIXES.iter().any(|prefix| {
        path == *prefix
            || path
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with('/'))
    })
}

fn has_extension(path: &str) -> bool {
    path.rsplit('/')
        .next()
        .is_some_and(|last| last.contains('.') && !last.ends_with('.'))
}

fn looks_like_locale(segment: &str) -> bool {
    segment.len() == 2 && segment.bytes().all(|b| b.is_ascii_alphabetic())
}

fn with_query(location: String, query: Option<&str>) -> String {
    match query {
        Some(q) if !q.is_empty() => format!("{location}?{q}"),
        _ => location,
    }
}

/// Decides how a page request is handled. `preferred` is the locale used
/// when the path does not carry a supported one.
pub fn route_page(path: &str, query: Option<&str>, preferred: Locale) -> PageRoute {
    if is_reserved(path) || has_extension(path) {
        return PageRoute::PassThrough;
    }

    let trimmed = path.trim_start_matches('/');
    let (first, rest) = match trimmed.split_once('/') {
        Some((first, rest)) => (first, Some(rest)),
        None => (trimmed, None),
    };

    if let Some(locale) = Locale::parse(first).filter(|l| l.as_str() == first) {
        let admin = rest
            .and_then(|r| r.split('/').next())
            .is_some_and(|segment| segment == "admin");
        return PageRoute::Page { locale, admin };
    }

    let location = if looks_like_locale(first) {
        match rest {
            Some(rest) => format!("/{preferred}/{rest}"),
            None => format!("/{preferred}"),
        }
    } else if trimmed.is_empty() {
        format!("/{preferred}")
    } else {
        format!("/{preferred}/{trimmed}")
    };
    PageRoute::Redirect(with_query(location, query))
}

/// Sign-in page for `locale` that returns to `original` afterwards.
pub fn sign_in_redirect(locale: Locale, original: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("callbackUrl", original)
        .finish();
    format!("/{locale}/auth/signin?{query}")
}

pub async fn locale_gate(State(site): State<SiteState>, request: Request, next: Next) -> Response {
    let preferred = preferred_locale(request.headers(), site.default_locale);
    let uri = request.uri().clone();

    match route_page(uri.path(), uri.query(), preferred) {
        PageRoute::PassThrough => next.run(request).await,
        PageRoute::Redirect(location) => {
            debug!(from = %uri, to = %location, "locale redirect");
            Redirect::temporary(&location).into_response()
        }
        PageRoute::Page { locale, admin } => {
            if admin {
                let allowed = site
                    .auth
                    .user_from_headers(request.headers())
                    .is_ok_and(|user| user.is_admin());
                if !allowed {
                    let original = uri
                        .path_and_query()
                        .map_or(uri.path(), |pq| pq.as_str());
                    return Redirect::temporary(&sign_in_redirect(locale, original))
                        .into_response();
                }
            }

            let remembered = read_cookie(request.headers(), LOCALE_COOKIE) == Some(locale.as_str());
            let mut response = next.run(request).await;
            if !remembered {
                if let Some(value) = locale.cookie().to_header_value() {
                    response.headers_mut().append(header::SET_COOKIE, value);
                }
            }
            response
        }
    }
}

/// Static pages behind the locale gate.
pub fn site_router(static_dir: impl AsRef<Path>, state: SiteState) -> Router {
    Router::new()
        .fallback_service(ServeDir::new(static_dir).append_index_html_on_directories(true))
        .layer(middleware::from_fn_with_state(state, locale_gate))
}
