use serde::{Deserialize, Serialize};
use url::Url;

const HOME_PATH: &str = "/";

// Relative navigation URLs are resolved against this base.
const RELATIVE_BASE: &str = "http://localhost/";

/// Semantic view of the page currently shown by the content surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteInfo {
    pub path: String,
    #[serde(default)]
    pub is_tab_route: bool,
    #[serde(default)]
    pub is_home: bool,
    #[serde(default)]
    pub can_go_back: bool,
}

impl RouteInfo {
    /// Home never delegates back navigation to the content, whatever the
    /// WebView history says.
    #[must_use]
    pub fn with_home_override(mut self) -> Self {
        if self.is_home {
            self.can_go_back = false;
        }
        self
    }
}

impl Default for RouteInfo {
    fn default() -> Self {
        Self {
            path: HOME_PATH.into(),
            is_tab_route: false,
            is_home: true,
            can_go_back: false,
        }
    }
}

/// Classifies navigated URLs against the configured tab-root set.
#[derive(Debug, Clone)]
pub struct RouteClassifier {
    tab_routes: Vec<String>,
}

impl RouteClassifier {
    #[must_use]
    pub fn new<I, T>(tab_routes: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        Self {
            tab_routes: tab_routes
                .into_iter()
                .map(|route| normalize(route.as_ref()))
                .collect(),
        }
    }

    /// Builds a [`RouteInfo`] from a navigation event.
    ///
    /// `can_go_back` is the content surface's raw history capability.
    #[must_use]
    pub fn classify(&self, url: &str, can_go_back: bool) -> RouteInfo {
        let path = path_of(url);
        RouteInfo {
            is_tab_route: self.is_tab_route(&path),
            is_home: is_home(&path),
            can_go_back,
            path,
        }
        .with_home_override()
    }

    /// Re-derives the classification of a route reported by the content.
    #[must_use]
    pub fn reclassify(&self, route: RouteInfo) -> RouteInfo {
        let path = normalize(&route.path);
        RouteInfo {
            is_tab_route: route.is_tab_route || self.is_tab_route(&path),
            is_home: is_home(&path),
            can_go_back: route.can_go_back,
            path,
        }
        .with_home_override()
    }

    #[must_use]
    pub fn is_tab_route(&self, path: &str) -> bool {
        let path = normalize(path);
        self.tab_routes.iter().any(|route| *route == path)
    }
}

#[must_use]
pub fn is_home(path: &str) -> bool {
    normalize(path) == HOME_PATH
}

/// Extracts the normalized path of a navigated URL.
///
/// Malformed input yields `/`.
#[must_use]
pub fn path_of(url: &str) -> String {
    let parsed = Url::parse(url).or_else(|_| Url::parse(RELATIVE_BASE).and_then(|b| b.join(url)));
    match parsed {
        Ok(parsed) if parsed.path().starts_with('/') => normalize(parsed.path()),
        Ok(_) | Err(_) => HOME_PATH.into(),
    }
}

fn normalize(path: &str) -> String {
    let trimmed = path.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        HOME_PATH.into()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}
