use std::fmt;
use std::str::FromStr;

use crate::error::ClientError;
use crate::session::SessionStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    Login,
    Signup,
    Songs,
    SongUpload,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::Login => "/login",
            Route::Signup => "/signup",
            Route::Songs => "/songs",
            Route::SongUpload => "/songupload",
        }
    }

    pub fn is_protected(&self) -> bool {
        matches!(self, Route::Songs | Route::SongUpload)
    }
}

impl FromStr for Route {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let path = match s.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };
        match path {
            "/" => Ok(Route::Home),
            "/login" => Ok(Route::Login),
            "/signup" => Ok(Route::Signup),
            "/songs" => Ok(Route::Songs),
            "/songupload" => Ok(Route::SongUpload),
            other => Err(ClientError::Validation(format!("Unknown route: {}", other))),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Render(Route),
    Redirect(Route),
}

/// Protected routes render only while a credential is held. The credential is not checked
/// against the backend.
pub fn guard(route: Route, session: &SessionStore) -> Navigation {
    if route.is_protected() && !session.is_authenticated() {
        Navigation::Redirect(Route::Login)
    } else {
        Navigation::Render(route)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavItem {
    Welcome(String),
    Link { label: &'static str, route: Route },
    Logout,
}

impl fmt::Display for NavItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavItem::Welcome(name) => write!(f, "Welcome, {}", name),
            NavItem::Link { label, route } => write!(f, "{} ({})", label, route),
            NavItem::Logout => f.write_str("Logout"),
        }
    }
}

/// Header navigation for the current session.
pub fn nav_items(session: &SessionStore) -> Vec<NavItem> {
    match session.user() {
        Some(user) => vec![
            NavItem::Welcome(user.name.clone()),
            NavItem::Link {
                label: "Songs",
                route: Route::Songs,
            },
            NavItem::Link {
                label: "Upload Song",
                route: Route::SongUpload,
            },
            NavItem::Logout,
        ],
        None => vec![
            NavItem::Link {
                label: "Login",
                route: Route::Login,
            },
            NavItem::Link {
                label: "Sign Up",
                route: Route::Signup,
            },
        ],
    }
}
