use std::{env, net::SocketAddr};

use crate::{
    auth::SessionCheck,
    gate::{RouteClass, RouteTable},
    locale::LocaleSet,
};

/// ConfigError
///
/// Every way the environment can describe a routing policy the gate cannot
/// enforce. Raised at startup only; the gate itself never errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("at least one supported locale is required")]
    NoLocales,
    #[error("invalid locale code {0:?}")]
    InvalidLocale(String),
    #[error("default locale {0:?} is not among the supported locales")]
    UnsupportedDefault(String),
    #[error("{var} entry {value:?} must start with '/'")]
    RelativeRoute { var: &'static str, value: String },
    #[error("session cookie name must not be empty")]
    EmptyCookieName,
    #[error("login route {0:?} is itself a protected route")]
    ProtectedLoginRoute(String),
    #[error("BIND_ADDR {0:?} is not a valid socket address")]
    InvalidBindAddr(String),
}

/// Env
///
/// Runtime context. Only switches the log output format.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

/// GateConfig
///
/// The routing policy enforced by the locale & auth gate. Built once at
/// startup and injected into the gate; nothing reads it from globals.
#[derive(Clone, Debug)]
pub struct GateConfig {
    pub locales: LocaleSet,
    // Prefixes of routes that need a session (e.g. "/profile").
    pub protected_routes: Vec<String>,
    // Prefixes of routes only meant for visitors without a session.
    pub auth_routes: Vec<String>,
    // Locale-relative target for anonymous visitors on protected routes.
    pub login_route: String,
    pub session_cookie: String,
    // Prefixes never touched by the gate (API routes, framework assets).
    pub bypass_prefixes: Vec<String>,
    pub session_check: SessionCheck,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            locales: LocaleSet::default(),
            protected_routes: strings(&["/profile", "/wishlist"]),
            auth_routes: strings(&[
                "/auth/login",
                "/auth/register",
                "/auth/forgot-password",
                "/auth/reset-password",
            ]),
            login_route: "/auth/login".to_string(),
            session_cookie: "token".to_string(),
            bypass_prefixes: strings(&[
                "/api",
                "/_next",
                "/favicon.ico",
                "/robots.txt",
                "/sitemap.xml",
            ]),
            session_check: SessionCheck::Presence,
        }
    }
}

impl GateConfig {
    /// validate
    ///
    /// Rejects policies that cannot be enforced: relative prefixes, an empty
    /// cookie name, or a login route the gate would itself send anonymous
    /// visitors away from (an endless redirect).
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_absolute("PROTECTED_ROUTES", &self.protected_routes)?;
        check_absolute("AUTH_ROUTES", &self.auth_routes)?;
        check_absolute("GATE_BYPASS_PREFIXES", &self.bypass_prefixes)?;
        check_absolute("LOGIN_ROUTE", std::slice::from_ref(&self.login_route))?;

        if self.session_cookie.trim().is_empty() {
            return Err(ConfigError::EmptyCookieName);
        }

        let routes = RouteTable::new(&self.protected_routes, &self.auth_routes);
        if routes.classify(&self.login_route) == RouteClass::Protected {
            return Err(ConfigError::ProtectedLoginRoute(self.login_route.clone()));
        }

        Ok(())
    }
}

/// AppConfig
///
/// Holds the service's entire configuration. Immutable once loaded and
/// pulled into handlers through `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub env: Env,
    pub bind_addr: SocketAddr,
    pub gate: GateConfig,
}

impl Default for AppConfig {
    /// Storefront defaults, used by tests and as the base for `load`.
    fn default() -> Self {
        Self {
            env: Env::Local,
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            gate: GateConfig::default(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Startup entry point. Reads the process environment and refuses to
    /// continue on an invalid policy.
    ///
    /// # Panics
    /// Panics with a `FATAL:` message when `try_load` fails.
    pub fn load() -> Self {
        Self::try_load().unwrap_or_else(|e| panic!("FATAL: invalid configuration: {e}"))
    }

    /// try_load
    ///
    /// Same as `load`, returning the error instead of panicking.
    pub fn try_load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// from_lookup
    ///
    /// Builds the configuration from any variable source. Unset or blank
    /// variables keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = GateConfig::default();

        let env = match var("APP_ENV").as_deref() {
            Some("production") => Env::Production,
            _ => Env::Local,
        };

        let bind_addr: SocketAddr = match var("BIND_ADDR") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidBindAddr(raw.clone()))?,
            None => AppConfig::default().bind_addr,
        };

        let locales = match (var("SUPPORTED_LOCALES"), var("DEFAULT_LOCALE")) {
            (None, None) => defaults.locales,
            (codes, default) => {
                let codes = codes
                    .map(|raw| list(&raw))
                    .unwrap_or_else(|| codes_of(&defaults.locales));
                // Without an explicit default, the first listed locale is the fallback.
                let default = default
                    .or_else(|| codes.first().cloned())
                    .unwrap_or_default();
                LocaleSet::new(&codes, &default)?
            }
        };

        let session_check = match var("SESSION_JWT_SECRET") {
            Some(secret) => SessionCheck::Jwt { secret },
            None => SessionCheck::Presence,
        };

        let gate = GateConfig {
            locales,
            protected_routes: var("PROTECTED_ROUTES")
                .map(|raw| list(&raw))
                .unwrap_or(defaults.protected_routes),
            auth_routes: var("AUTH_ROUTES")
                .map(|raw| list(&raw))
                .unwrap_or(defaults.auth_routes),
            login_route: var("LOGIN_ROUTE")
                .map(|raw| raw.trim().to_string())
                .unwrap_or(defaults.login_route),
            session_cookie: var("SESSION_COOKIE")
                .map(|raw| raw.trim().to_string())
                .unwrap_or(defaults.session_cookie),
            bypass_prefixes: var("GATE_BYPASS_PREFIXES")
                .map(|raw| list(&raw))
                .unwrap_or(defaults.bypass_prefixes),
            session_check,
        };
        gate.validate()?;

        Ok(Self {
            env,
            bind_addr,
            gate,
        })
    }
}

fn list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn codes_of(locales: &LocaleSet) -> Vec<String> {
    locales
        .supported()
        .iter()
        .map(|l| l.code().to_string())
        .collect()
}

fn check_absolute(var: &'static str, values: &[String]) -> Result<(), ConfigError> {
    match values.iter().find(|v| !v.starts_with('/')) {
        Some(value) => Err(ConfigError::RelativeRoute {
            var,
            value: value.clone(),
        }),
        None => Ok(()),
    }
}
