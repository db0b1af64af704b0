//! Which page a path shows, depending on whether someone is signed in.

use std::fmt;

/// A page of the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Login,
    Signup,
    Watch { video_id: String },
    Channel { channel_id: String },
    Upload,
    EditChannel,
}

impl Route {
    /// Matches a path such as `/watch/abc`. Query strings and a trailing slash are ignored.
    pub fn parse(path: &str) -> Option<Route> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let route = match segments.as_slice() {
            [] => Route::Home,
            ["login"] => Route::Login,
            ["signup"] => Route::Signup,
            ["upload"] => Route::Upload,
            ["channel", "edit"] => Route::EditChannel,
            ["watch", id] => Route::Watch {
                video_id: id.to_string(),
            },
            ["channel", id] => Route::Channel {
                channel_id: id.to_string(),
            },
            _ => return None,
        };
        Some(route)
    }

    fn requires_auth(&self) -> bool {
        !matches!(self, Route::Login | Route::Signup)
    }

    /// Pages that bounce anonymous visitors to the login page instead of showing nothing.
    fn redirects_anonymous(&self) -> bool {
        matches!(self, Route::Home | Route::Upload | Route::EditChannel)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Home => f.write_str("/"),
            Route::Login => f.write_str("/login"),
            Route::Signup => f.write_str("/signup"),
            Route::Watch { video_id } => write!(f, "/watch/{video_id}"),
            Route::Channel { channel_id } => write!(f, "/channel/{channel_id}"),
            Route::Upload => f.write_str("/upload"),
            Route::EditChannel => f.write_str("/channel/edit"),
        }
    }
}

/// What to do with a navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    Render(Route),
    Redirect(Route),
    /// The page exists but shows nothing to anonymous visitors.
    Blank,
    NotFound,
}

/// Resolves `path` for a visitor who is or is not signed in.
pub fn resolve(path: &str, is_authenticated: bool) -> RouteOutcome {
    let Some(route) = Route::parse(path) else {
        return RouteOutcome::NotFound;
    };
    match (is_authenticated, route.requires_auth()) {
        (true, true) | (false, false) => RouteOutcome::Render(route),
        (true, false) => RouteOutcome::Redirect(Route::Home),
        (false, true) if route.redirects_anonymous() => RouteOutcome::Redirect(Route::Login),
        (false, true) => RouteOutcome::Blank,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn anonymous_home_goes_to_login() {
        assert_eq!(resolve("/", false), RouteOutcome::Redirect(Route::Login));
        assert_eq!(resolve("/upload", false), RouteOutcome::Redirect(Route::Login));
        assert_eq!(
            resolve("/channel/edit", false),
            RouteOutcome::Redirect(Route::Login)
        );
    }

    #[test]
    fn signed_in_skips_login_pages() {
        assert_eq!(resolve("/login", true), RouteOutcome::Redirect(Route::Home));
        assert_eq!(resolve("/signup", true), RouteOutcome::Redirect(Route::Home));
        assert_eq!(resolve("/signup", false), RouteOutcome::Render(Route::Signup));
    }

    #[test]
    fn anonymous_watch_and_channel_are_blank() {
        assert_eq!(resolve("/watch/v1", false), RouteOutcome::Blank);
        assert_eq!(resolve("/channel/c1", false), RouteOutcome::Blank);
        assert_eq!(
            resolve("/watch/v1?t=30", true),
            RouteOutcome::Render(Route::Watch {
                video_id: "v1".into()
            })
        );
    }

    #[test]
    fn edit_is_not_a_channel_id() {
        assert_eq!(Route::parse("/channel/edit/"), Some(Route::EditChannel));
        assert_eq!(
            Route::parse("/channel/edit2"),
            Some(Route::Channel {
                channel_id: "edit2".into()
            })
        );
    }

    #[test]
    fn unknown_paths() {
        assert_eq!(resolve("/watch", true), RouteOutcome::NotFound);
        assert_eq!(resolve("/admin", false), RouteOutcome::NotFound);
    }

    #[test]
    fn display_round_trips_paths() {
        for path in ["/", "/login", "/watch/v1", "/channel/c1", "/channel/edit", "/upload"] {
            assert_eq!(Route::parse(path).unwrap().to_string(), path);
        }
    }
}
