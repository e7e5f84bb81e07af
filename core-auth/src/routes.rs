//! Route metadata table.
//!
//! Route records form a tree. Metadata is merged from the root record down to
//! the matched record, child keys winning, so every child of `/admin`
//! inherits `requires_auth`.

use std::fmt;
use url::form_urlencoded;

/// Name of the admin login route.
pub const LOGIN_ROUTE_NAME: &str = "admin-login";

/// Query parameter carrying the path to return to after login.
pub const REDIRECT_QUERY_KEY: &str = "redirect";

/// Metadata declared on a route record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteMeta {
    pub requires_auth: Option<bool>,
    pub title: Option<String>,
}

impl RouteMeta {
    pub fn requires_auth(&self) -> bool {
        self.requires_auth.unwrap_or(false)
    }

    /// Metadata of `child` layered over `self`.
    pub fn merge(&self, child: &RouteMeta) -> RouteMeta {
        RouteMeta {
            requires_auth: child.requires_auth.or(self.requires_auth),
            title: child.title.clone().or_else(|| self.title.clone()),
        }
    }
}

/// Declaration of one route and its children.
///
/// Child paths are relative to the parent unless they start with `/`; an
/// empty child path matches the parent path itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRecord {
    pub path: String,
    pub name: Option<String>,
    pub meta: RouteMeta,
    pub children: Vec<RouteRecord>,
}

impl RouteRecord {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: None,
            meta: RouteMeta::default(),
            children: Vec::new(),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.meta.title = Some(title.into());
        self
    }

    pub fn requires_auth(mut self, requires_auth: bool) -> Self {
        self.meta.requires_auth = Some(requires_auth);
        self
    }

    pub fn children(mut self, children: Vec<RouteRecord>) -> Self {
        self.children = children;
        self
    }
}

/// A route record flattened to its absolute path and merged metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedRoute {
    pub path: String,
    pub name: Option<String>,
    pub meta: RouteMeta,
}

/// A navigation target resolved against a [`RouteTable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    /// Path without query or fragment.
    pub path: String,
    /// Target exactly as requested, query and fragment included.
    pub full_path: String,
    pub query: Vec<(String, String)>,
    /// Matched route name, `None` for unknown paths.
    pub name: Option<String>,
    /// Merged metadata, empty for unknown paths.
    pub meta: RouteMeta,
}

/// Where a navigation should go instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteLocation {
    pub name: Option<String>,
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl RouteLocation {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            name: None,
            path: path.into(),
            query: Vec::new(),
        }
    }

    pub fn named(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::new(path)
        }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Value of the first query parameter named `key`.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Path with the form-encoded query, e.g.
    /// `/admin/login?redirect=%2Fadmin%2Fbookings`.
    pub fn href(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }

        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.query.iter())
            .finish();
        format!("{}?{}", self.path, query)
    }
}

impl fmt::Display for RouteLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.href())
    }
}

/// Flattened, read-only route table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    routes: Vec<MatchedRoute>,
}

impl RouteTable {
    pub fn new(records: Vec<RouteRecord>) -> Self {
        let mut routes = Vec::new();
        for record in &records {
            flatten(record, "", &RouteMeta::default(), &mut routes);
        }
        Self { routes }
    }

    /// The routes of the Angel Event site.
    pub fn angel_event() -> Self {
        Self::new(vec![
            RouteRecord::new("/")
                .name("home")
                .title("Angel Event - Créer l'instant parfait"),
            RouteRecord::new("/services")
                .name("services")
                .title("Nos Services - Angel Event"),
            RouteRecord::new("/galerie")
                .name("gallery")
                .title("Galerie - Angel Event"),
            RouteRecord::new("/location")
                .name("rentals")
                .title("Location - Angel Event"),
            RouteRecord::new("/temoignages")
                .name("testimonials")
                .title("Témoignages - Angel Event"),
            RouteRecord::new("/a-propos")
                .name("about")
                .title("À Propos - Angel Event"),
            RouteRecord::new("/contact")
                .name("contact")
                .title("Contact - Angel Event"),
            RouteRecord::new("/reserver")
                .name("booking")
                .title("Réserver - Angel Event"),
            RouteRecord::new("/admin/login")
                .name(LOGIN_ROUTE_NAME)
                .title("Admin Login - Angel Event"),
            RouteRecord::new("/admin").requires_auth(true).children(vec![
                RouteRecord::new("")
                    .name("admin-dashboard")
                    .title("Dashboard - Admin"),
                RouteRecord::new("bookings")
                    .name("admin-bookings")
                    .title("Réservations - Admin"),
                RouteRecord::new("clients")
                    .name("admin-clients")
                    .title("Clients - Admin"),
                RouteRecord::new("content")
                    .name("admin-content")
                    .title("Contenu - Admin"),
                RouteRecord::new("gallery")
                    .name("admin-gallery")
                    .title("Galerie - Admin"),
                RouteRecord::new("rentals")
                    .name("admin-rentals")
                    .title("Location - Admin"),
                RouteRecord::new("testimonials")
                    .name("admin-testimonials")
                    .title("Témoignages - Admin"),
                RouteRecord::new("newsletter")
                    .name("admin-newsletter")
                    .title("Newsletter - Admin"),
            ]),
        ])
    }

    pub fn routes(&self) -> &[MatchedRoute] {
        &self.routes
    }

    /// Route matching `path`, ignoring ASCII case and a trailing slash.
    pub fn find(&self, path: &str) -> Option<&MatchedRoute> {
        let path = normalize(path);
        self.routes
            .iter()
            .find(|route| route.path.eq_ignore_ascii_case(&path))
    }

    pub fn find_by_name(&self, name: &str) -> Option<&MatchedRoute> {
        self.routes
            .iter()
            .find(|route| route.name.as_deref() == Some(name))
    }

    /// Resolve a raw target such as `/admin/bookings?tab=2`.
    pub fn resolve(&self, target: &str) -> ResolvedTarget {
        let full_path = if target.starts_with('/') {
            target.to_string()
        } else {
            format!("/{}", target)
        };

        let without_fragment = full_path
            .split_once('#')
            .map_or(full_path.as_str(), |(before, _)| before);
        let (path, query) = without_fragment
            .split_once('?')
            .unwrap_or((without_fragment, ""));

        let query = form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect();

        let matched = self.find(path);
        ResolvedTarget {
            path: path.to_string(),
            full_path: full_path.clone(),
            query,
            name: matched.and_then(|route| route.name.clone()),
            meta: matched.map(|route| route.meta.clone()).unwrap_or_default(),
        }
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::angel_event()
    }
}

// Children are pushed before their parent so that an empty child path wins
// over the parent record it shares a path with.
fn flatten(record: &RouteRecord, parent: &str, inherited: &RouteMeta, out: &mut Vec<MatchedRoute>) {
    let path = if record.path.starts_with('/') {
        normalize(&record.path)
    } else if record.path.is_empty() {
        normalize(parent)
    } else {
        normalize(&format!("{}/{}", parent.trim_end_matches('/'), record.path))
    };
    let meta = inherited.merge(&record.meta);

    for child in &record.children {
        flatten(child, &path, &meta, out);
    }

    out.push(MatchedRoute {
        path,
        name: record.name.clone(),
        meta,
    });
}

fn normalize(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}
