//! Route Guard
//!
//! Decides, from the in-memory session flag only, whether a view may render
//! or must redirect to sign-in.

use super::session::SessionManager;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Route {
    SignIn,
    Register,
    Home,
    Products,
    ProductDetail(String),
    /// Any unmatched path
    NotFound(String),
}

impl Route {
    pub fn parse(path: &str) -> Self {
        let trimmed = path.trim();
        let normalized = match trimmed.trim_end_matches('/') {
            "" => "/",
            other => other,
        };

        match normalized {
            "/" => Route::Home,
            "/sign-in" => Route::SignIn,
            "/register" => Route::Register,
            "/products" => Route::Products,
            other => match other.strip_prefix("/products/") {
                Some(id) if !id.is_empty() && !id.contains('/') => {
                    Route::ProductDetail(id.to_string())
                }
                _ => Route::NotFound(trimmed.to_string()),
            },
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::SignIn => "/sign-in".to_string(),
            Route::Register => "/register".to_string(),
            Route::Home => "/".to_string(),
            Route::Products => "/products".to_string(),
            Route::ProductDetail(id) => format!("/products/{}", id),
            Route::NotFound(path) => path.clone(),
        }
    }

    pub fn is_protected(&self) -> bool {
        matches!(
            self,
            Route::Home | Route::Products | Route::ProductDetail(_)
        )
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Render(Route),
    /// `from` is the route to return to after sign-in
    Redirect { to: Route, from: Route },
}

pub struct RouteGuard {
    session: Arc<SessionManager>,
}

impl RouteGuard {
    pub fn new(session: Arc<SessionManager>) -> Self {
        Self { session }
    }

    pub fn check(&self, route: Route) -> GuardDecision {
        if !route.is_protected() || self.session.is_authenticated() {
            GuardDecision::Render(route)
        } else {
            GuardDecision::Redirect {
                to: Route::SignIn,
                from: route,
            }
        }
    }

    /// Where to go after a successful sign-in
    pub fn post_login_destination(from: Option<&Route>) -> Route {
        match from {
            Some(route) if route.is_protected() => route.clone(),
            _ => Route::Home,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_routes() {
        assert_eq!(Route::parse("/"), Route::Home);
        assert_eq!(Route::parse(""), Route::Home);
        assert_eq!(Route::parse("/sign-in"), Route::SignIn);
        assert_eq!(Route::parse("/register/"), Route::Register);
        assert_eq!(Route::parse("/products"), Route::Products);
        assert_eq!(
            Route::parse("/products/42"),
            Route::ProductDetail("42".to_string())
        );
        assert_eq!(
            Route::parse("/products/42/edit"),
            Route::NotFound("/products/42/edit".to_string())
        );
        assert_eq!(Route::parse("/nope"), Route::NotFound("/nope".to_string()));
    }

    #[test]
    fn only_app_views_are_protected() {
        assert!(Route::Home.is_protected());
        assert!(Route::ProductDetail("1".to_string()).is_protected());
        assert!(!Route::SignIn.is_protected());
        assert!(!Route::Register.is_protected());
        assert!(!Route::NotFound("/x".to_string()).is_protected());
    }

    #[test]
    fn post_login_honors_protected_destination() {
        let detail = Route::ProductDetail("7".to_string());
        assert_eq!(RouteGuard::post_login_destination(Some(&detail)), detail);
        assert_eq!(
            RouteGuard::post_login_destination(Some(&Route::Register)),
            Route::Home
        );
        assert_eq!(RouteGuard::post_login_destination(None), Route::Home);
    }

    #[test]
    fn path_round_trips() {
        for route in [
            Route::Home,
            Route::SignIn,
            Route::Register,
            Route::Products,
            Route::ProductDetail("abc".to_string()),
        ] {
            assert_eq!(Route::parse(&route.path()), route);
        }
    }
}
