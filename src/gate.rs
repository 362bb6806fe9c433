use std::{borrow::Cow, sync::Arc};

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, StatusCode, Uri, header::ACCEPT_LANGUAGE, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::{
    auth::{self, SessionStatus},
    config::GateConfig,
    locale::Locale,
};

/// RouteClass
///
/// The access policy attached to a locale-relative route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Needs a session; anonymous visitors go to the login page.
    Protected,
    /// Login/register style pages; logged-in visitors go to the locale root.
    AuthOnly,
    Public,
}

/// RouteTable
///
/// Ordered `(prefix, class)` entries. Protected prefixes come first, then
/// auth-only ones, and the first prefix the route starts with decides.
/// Matching is plain string prefix, not segment aware.
#[derive(Debug, Clone)]
pub struct RouteTable {
    entries: Vec<(String, RouteClass)>,
}

impl RouteTable {
    pub fn new(protected: &[String], auth_only: &[String]) -> Self {
        let entries = protected
            .iter()
            .map(|p| (p.clone(), RouteClass::Protected))
            .chain(auth_only.iter().map(|p| (p.clone(), RouteClass::AuthOnly)))
            .collect();
        Self { entries }
    }

    pub fn classify(&self, route: &str) -> RouteClass {
        self.entries
            .iter()
            .find(|(prefix, _)| route.starts_with(prefix.as_str()))
            .map(|(_, class)| *class)
            .unwrap_or(RouteClass::Public)
    }
}

/// LocalizedPath
///
/// A request path split into its locale segment and the route after it.
/// The route never ends with `/` unless it is the root `/`.
///
/// The gate stores this in the request extensions when it lets a request
/// through, so handlers can extract it instead of parsing the path again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalizedPath {
    pub locale: Locale,
    pub route: String,
}

impl<S> FromRequestParts<S> for LocalizedPath
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Missing only when the gate bypassed the path, i.e. nothing localized lives here.
        parts
            .extensions
            .get::<LocalizedPath>()
            .cloned()
            .ok_or(StatusCode::NOT_FOUND)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectReason {
    MissingLocale,
    LoginRequired,
    AlreadyAuthenticated,
}

/// GateDecision
///
/// The only two outcomes of the gate. `Continue(None)` marks a bypassed path
/// (API route or static asset) that was never localized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Redirect {
        location: String,
        reason: RedirectReason,
    },
    Continue(Option<LocalizedPath>),
}

/// GateRequest
///
/// The parts of an HTTP request the gate looks at, already pulled out of the
/// headers.
#[derive(Debug, Clone, Copy)]
pub struct GateRequest<'a> {
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub accept_language: Option<&'a str>,
    pub session: SessionStatus,
}

/// Gate
///
/// The locale & auth gate. Holds immutable configuration behind an `Arc`, so
/// cloning it into each request is cheap and requests never share mutable
/// state.
#[derive(Debug, Clone)]
pub struct Gate {
    config: Arc<GateConfig>,
    routes: Arc<RouteTable>,
}

impl Gate {
    pub fn new(config: GateConfig) -> Self {
        let routes = RouteTable::new(&config.protected_routes, &config.auth_routes);
        Self {
            config: Arc::new(config),
            routes: Arc::new(routes),
        }
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// resolve_locale
    ///
    /// Picks the locale for a request that has none in its path, from the
    /// `Accept-Language` headers. Never fails.
    pub fn resolve_locale(&self, headers: &HeaderMap) -> Locale {
        let accept_language = accept_language(headers);
        self.config
            .locales
            .negotiate(accept_language.as_deref())
            .clone()
    }

    pub fn session_status(&self, headers: &HeaderMap) -> SessionStatus {
        let token = auth::session_token(headers, &self.config.session_cookie);
        self.config.session_check.evaluate(token)
    }

    /// handle
    ///
    /// Runs the gate for one incoming request.
    pub fn handle(&self, uri: &Uri, headers: &HeaderMap) -> GateDecision {
        let accept_language = accept_language(headers);
        let request = GateRequest {
            path: uri.path(),
            query: uri.query(),
            accept_language: accept_language.as_deref(),
            session: self.session_status(headers),
        };
        self.decide(&request)
    }

    /// decide
    ///
    /// Pure decision function over an already-extracted request view.
    ///
    /// 1. Runs of `/` are collapsed before anything is matched.
    /// 2. Bypass prefixes (and unlocalized public asset files) continue
    ///    untouched.
    /// 3. A path without a supported locale segment is redirected to the same
    ///    path (and query) under the negotiated locale.
    /// 4. Anonymous visitors on protected routes go to the login route.
    /// 5. Logged-in visitors on auth-only routes go to the locale root.
    pub fn decide(&self, request: &GateRequest<'_>) -> GateDecision {
        let path = collapse_slashes(request.path);

        if self.has_bypass_prefix(&path) {
            return GateDecision::Continue(None);
        }

        let Some(localized) = self.split_localized(&path) else {
            if is_static_asset(&path) && self.routes.classify(&path) == RouteClass::Public {
                return GateDecision::Continue(None);
            }
            let locale = self.config.locales.negotiate(request.accept_language);
            return GateDecision::Redirect {
                location: prefixed_location(locale, &path, request.query),
                reason: RedirectReason::MissingLocale,
            };
        };

        match (self.routes.classify(&localized.route), request.session) {
            (RouteClass::Protected, SessionStatus::Anonymous) => GateDecision::Redirect {
                location: format!("/{}{}", localized.locale, self.config.login_route),
                reason: RedirectReason::LoginRequired,
            },
            (RouteClass::AuthOnly, SessionStatus::Authenticated) => GateDecision::Redirect {
                location: format!("/{}", localized.locale),
                reason: RedirectReason::AlreadyAuthenticated,
            },
            _ => GateDecision::Continue(Some(localized)),
        }
    }

    /// split_localized
    ///
    /// Returns `None` when the first segment is not a supported locale code.
    /// Repeated slashes are collapsed, so `/id//profile` yields `/profile`.
    pub fn split_localized(&self, path: &str) -> Option<LocalizedPath> {
        let path = collapse_slashes(path);
        let rest = path.strip_prefix('/').unwrap_or(&path);
        let (segment, tail) = match rest.find('/') {
            Some(idx) => rest.split_at(idx),
            None => (rest, ""),
        };

        let locale = self.config.locales.get(segment)?.clone();
        Some(LocalizedPath {
            locale,
            route: normalize_route(tail),
        })
    }

    /// Bypass prefixes match whole segments: `/api` covers `/api/health`
    /// but not `/apiary`.
    fn has_bypass_prefix(&self, path: &str) -> bool {
        self.config.bypass_prefixes.iter().any(|prefix| {
            let prefix = prefix.trim_end_matches('/');
            path.strip_prefix(prefix)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        })
    }
}

/// locale_auth_gate
///
/// Middleware wrapping every storefront page. Redirects answer with
/// `307 Temporary Redirect`; on pass-through the `LocalizedPath` is attached
/// to the request extensions and the request otherwise proceeds unmodified.
pub async fn locale_auth_gate(State(gate): State<Gate>, mut request: Request, next: Next) -> Response {
    match gate.handle(request.uri(), request.headers()) {
        GateDecision::Redirect { location, reason } => {
            tracing::debug!(
                path = %request.uri().path(),
                location = %location,
                reason = ?reason,
                "gate redirect"
            );
            Redirect::temporary(&location).into_response()
        }
        GateDecision::Continue(Some(localized)) => {
            request.extensions_mut().insert(localized);
            next.run(request).await
        }
        GateDecision::Continue(None) => next.run(request).await,
    }
}

/// Joins repeated `Accept-Language` lines; non UTF-8 values are ignored.
fn accept_language(headers: &HeaderMap) -> Option<String> {
    let values: Vec<&str> = headers
        .get_all(ACCEPT_LANGUAGE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .collect();
    (!values.is_empty()).then(|| values.join(","))
}

fn normalize_route(tail: &str) -> String {
    let trimmed = tail.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

fn prefixed_location(locale: &Locale, path: &str, query: Option<&str>) -> String {
    let mut location = match path {
        "" | "/" => format!("/{locale}"),
        _ => format!("/{locale}{path}"),
    };
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        location.push('?');
        location.push_str(query);
    }
    location
}

// File types served by the frontend build rather than by localized pages.
const ASSET_EXTENSIONS: &[&str] = &[
    "avif", "css", "gif", "ico", "jpeg", "jpg", "js", "json", "map", "mjs", "png", "svg",
    "ttf", "txt", "webmanifest", "webp", "woff", "woff2", "xml",
];

fn is_static_asset(path: &str) -> bool {
    path.rsplit('/')
        .next()
        .and_then(|segment| segment.rsplit_once('.'))
        .is_some_and(|(stem, ext)| {
            !stem.is_empty()
                && ASSET_EXTENSIONS
                    .iter()
                    .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

fn collapse_slashes(path: &str) -> Cow<'_, str> {
    if !path.contains("//") {
        return Cow::Borrowed(path);
    }
    let mut collapsed = String::with_capacity(path.len());
    for c in path.chars() {
        if c == '/' && collapsed.ends_with('/') {
            continue;
        }
        collapsed.push(c);
    }
    Cow::Owned(collapsed)
}
