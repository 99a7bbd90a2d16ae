// Route policy table and classifier. Pure data + pure functions; the table is
// built once at startup and never mutated.

use serde::{Deserialize, Serialize};

/// Role attached to a principal's profile. Exactly one role per principal;
/// a principal with no stored role resolves to `Landlord` (see `session::default_role`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Landlord,
    Tenant,
    Contractor,
}

impl Role {
    /// Canonical landing page for the role, used as the redirect target when
    /// a signed-in user is bounced off a page they cannot use.
    pub fn home_page(&self) -> &'static str {
        match self {
            Role::Landlord => "/dashboard",
            Role::Tenant => "/issues",
            Role::Contractor => "/quotes",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Landlord => "landlord",
            Role::Tenant => "tenant",
            Role::Contractor => "contractor",
        }
    }

    /// Parse the role string stored in a profile row. Unknown values yield
    /// `None`, which downstream defaults to landlord.
    pub fn parse(value: &str) -> Option<Role> {
        match value {
            "landlord" => Some(Role::Landlord),
            "tenant" => Some(Role::Tenant),
            "contractor" => Some(Role::Contractor),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Access rule attached to a path prefix. A prefix carries exactly one rule
/// kind; exclusive and enumerated rules are never combined on one route.
#[derive(Debug, Clone)]
pub enum Access {
    /// Any authenticated role.
    Protected,
    /// Exactly one role may enter.
    Exclusive(Role),
    /// Enumerated allow-list of roles.
    AnyOf(&'static [Role]),
    /// Login/signup pages: anonymous only.
    AuthPage,
}

#[derive(Debug, Clone)]
pub struct RouteRule {
    pub prefix: &'static str,
    pub access: Access,
}

/// Result of classifying one request path. Pure function output; classifying
/// the same path twice always yields the same record.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteClass {
    pub is_protected: bool,
    pub is_auth_page: bool,
    pub exclusive_role: Option<Role>,
    pub allowed_roles: Option<&'static [Role]>,
}

impl RouteClass {
    fn unrestricted() -> Self {
        Self {
            is_protected: false,
            is_auth_page: false,
            exclusive_role: None,
            allowed_roles: None,
        }
    }
}

/// Static, process-wide routing policy: an ordered list of prefix rules plus
/// the static-asset bypass list. Loaded once in `main` and shared via `Arc`.
#[derive(Debug, Clone)]
pub struct RoutePolicy {
    rules: Vec<RouteRule>,
}

const STATIC_PREFIXES: &[&str] = &["/assets"];
const STATIC_EXTENSIONS: &[&str] = &[".svg", ".png", ".jpg", ".jpeg", ".gif", ".webp"];

impl RoutePolicy {
    pub fn new(rules: Vec<RouteRule>) -> Self {
        Self { rules }
    }

    /// The LetLog routing table. Prefixes are configuration, not protocol;
    /// order matters only in that the first matching rule wins.
    pub fn letlog_default() -> Self {
        use Role::*;
        Self::new(vec![
            RouteRule { prefix: "/properties", access: Access::Exclusive(Landlord) },
            RouteRule { prefix: "/tenancies", access: Access::Exclusive(Landlord) },
            RouteRule { prefix: "/compliance", access: Access::Exclusive(Landlord) },
            RouteRule { prefix: "/invite", access: Access::Exclusive(Landlord) },
            RouteRule { prefix: "/quotes", access: Access::Exclusive(Contractor) },
            RouteRule { prefix: "/tenders", access: Access::AnyOf(&[Landlord, Contractor]) },
            RouteRule { prefix: "/issues", access: Access::AnyOf(&[Landlord, Tenant]) },
            RouteRule { prefix: "/dashboard", access: Access::Protected },
            RouteRule { prefix: "/calendar", access: Access::Protected },
            RouteRule { prefix: "/settings", access: Access::Protected },
            RouteRule { prefix: "/reviews", access: Access::Protected },
            RouteRule { prefix: "/api", access: Access::Protected },
            RouteRule { prefix: "/login", access: Access::AuthPage },
            RouteRule { prefix: "/signup", access: Access::AuthPage },
        ])
    }

    /// Static assets never pass through the access gate.
    pub fn is_bypassed(&self, path: &str) -> bool {
        if path == "/favicon.ico" {
            return true;
        }
        if STATIC_PREFIXES.iter().any(|p| prefix_matches(path, p)) {
            return true;
        }
        STATIC_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
    }

    /// Classify a request path against the policy table. No I/O, no failure
    /// mode: an unmatched path is unrestricted and non-auth.
    pub fn classify(&self, path: &str) -> RouteClass {
        for rule in &self.rules {
            if !prefix_matches(path, rule.prefix) {
                continue;
            }
            return match rule.access {
                Access::Protected => RouteClass {
                    is_protected: true,
                    ..RouteClass::unrestricted()
                },
                Access::Exclusive(role) => RouteClass {
                    is_protected: true,
                    exclusive_role: Some(role),
                    ..RouteClass::unrestricted()
                },
                Access::AnyOf(roles) => RouteClass {
                    is_protected: true,
                    allowed_roles: Some(roles),
                    ..RouteClass::unrestricted()
                },
                Access::AuthPage => RouteClass {
                    is_auth_page: true,
                    ..RouteClass::unrestricted()
                },
            };
        }
        RouteClass::unrestricted()
    }
}

/// Exact match or segment-boundary prefix match: `/issues` matches `/issues`
/// and `/issues/42`, but never `/issues2`.
fn prefix_matches(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
