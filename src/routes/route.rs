use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

/// Every place the front-end can be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Root,
    Login,
    Register,
    Dashboard,
    Editor(Uuid),
    NotFound,
}

impl Route {
    /// Whether the route is only reachable with a session
    pub fn requires_session(&self) -> bool {
        matches!(self, Route::Dashboard | Route::Editor(_))
    }
}

impl FromStr for Route {
    type Err = std::convert::Infallible;

    /// Unknown paths parse to `NotFound`, which the guard sends back to the root
    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let trimmed = path.trim_end_matches('/');
        let route = match trimmed {
            "" => Route::Root,
            "/login" => Route::Login,
            "/register" => Route::Register,
            "/dashboard" => Route::Dashboard,
            other => match other.strip_prefix("/edit/").map(Uuid::parse_str) {
                Some(Ok(id)) => Route::Editor(id),
                _ => Route::NotFound,
            },
        };
        Ok(route)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Root => f.write_str("/"),
            Route::Login => f.write_str("/login"),
            Route::Register => f.write_str("/register"),
            Route::Dashboard => f.write_str("/dashboard"),
            Route::Editor(id) => write!(f, "/edit/{}", id),
            Route::NotFound => f.write_str("*"),
        }
    }
}
