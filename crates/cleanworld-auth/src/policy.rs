//! Route-rule authorization policy
//!
//! A fixed, ordered list of `{method, path pattern} -> access requirement`
//! rules, evaluated after the authentication filter has (or has not)
//! resolved a `Principal`. Rules are scanned in declaration order and the
//! first pattern+method match decides the outcome; there is no union or
//! longest-prefix merging. A request matching no rule is denied unless
//! authenticated.

use axum::http::Method;
use cleanworld_db::Role;

use crate::error::AuthError;
use crate::principal::Principal;

/// Maximum iterations allowed for pattern matching to prevent ReDoS
const MAX_MATCH_ITERATIONS: usize = 10000;

/// Access requirement attached to a route rule
#[derive(Debug, Clone)]
pub enum Access {
    /// Always allowed, principal ignored
    Public,
    /// Allowed for any resolved principal
    Authenticated,
    /// Allowed when the principal's role is a member of the set
    Roles(Vec<Role>),
}

/// A single route rule: path pattern plus optional method restriction
#[derive(Debug, Clone)]
pub struct RouteRule {
    /// `None` matches every HTTP method
    method: Option<Method>,
    pattern: String,
    parts: Vec<PatternPart>,
    access: Access,
}

#[derive(Debug, Clone)]
enum PatternPart {
    /// Literal text that must match exactly
    Literal(String),
    /// Single path segment wildcard (*)
    SingleWildcard,
    /// Multi-segment wildcard (**)
    MultiWildcard,
}

impl RouteRule {
    pub fn new(method: Option<Method>, pattern: &str, access: Access) -> Self {
        Self {
            method,
            pattern: pattern.to_string(),
            parts: compile_pattern(pattern),
            access,
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    fn applies_to(&self, method: &Method, path: &str) -> bool {
        self.method.as_ref().is_none_or(|m| m == method) && matches_pattern(&self.parts, path)
    }
}

/// Compile a glob-like pattern into parts
fn compile_pattern(pattern: &str) -> Vec<PatternPart> {
    let mut parts = Vec::new();
    let mut current = String::new();

    let chars: Vec<char> = pattern.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];

        if ch == '*' {
            // Flush current literal
            if !current.is_empty() {
                parts.push(PatternPart::Literal(current.clone()));
                current.clear();
            }

            // Check for **
            if i + 1 < chars.len() && chars[i + 1] == '*' {
                parts.push(PatternPart::MultiWildcard);
                i += 2;
            } else {
                parts.push(PatternPart::SingleWildcard);
                i += 1;
            }
        } else {
            current.push(ch);
            i += 1;
        }
    }

    // Flush remaining literal
    if !current.is_empty() {
        parts.push(PatternPart::Literal(current));
    }

    parts
}

/// Check if a pattern matches a request path
fn matches_pattern(parts: &[PatternPart], path: &str) -> bool {
    let mut iterations = 0;
    match_recursive(parts, path, 0, 0, &mut iterations)
}

fn match_recursive(
    parts: &[PatternPart],
    path: &str,
    part_idx: usize,
    path_pos: usize,
    iterations: &mut usize,
) -> bool {
    // Prevent ReDoS by limiting iterations
    *iterations += 1;
    if *iterations > MAX_MATCH_ITERATIONS {
        tracing::warn!(
            "Pattern matching exceeded {} iterations, aborting",
            MAX_MATCH_ITERATIONS
        );
        return false;
    }

    // Base cases
    if part_idx >= parts.len() {
        // Pattern exhausted, check if path is also exhausted
        return path_pos >= path.len();
    }

    let path_remaining = &path[path_pos..];

    match &parts[part_idx] {
        PatternPart::Literal(lit) => {
            if path_remaining.starts_with(lit) {
                match_recursive(parts, path, part_idx + 1, path_pos + lit.len(), iterations)
            } else {
                false
            }
        }
        PatternPart::SingleWildcard => {
            // Match any characters until the next '/' or end; an empty
            // segment does not count as a match
            if path_remaining.is_empty() {
                return false;
            }
            if let Some(slash_pos) = path_remaining.find('/') {
                if slash_pos == 0 {
                    return false;
                }
                match_recursive(parts, path, part_idx + 1, path_pos + slash_pos, iterations)
            } else {
                match_recursive(parts, path, part_idx + 1, path.len(), iterations)
            }
        }
        PatternPart::MultiWildcard => {
            // ** matches zero or more characters, segments included
            let remaining_parts = &parts[part_idx + 1..];

            if remaining_parts.is_empty() {
                // ** at end matches everything
                return true;
            }

            // Try matching at each position
            for i in 0..=path_remaining.len() {
                if match_recursive(parts, path, part_idx + 1, path_pos + i, iterations) {
                    return true;
                }
            }
            false
        }
    }
}

/// Ordered-list, first-match-wins authorization policy
pub struct Policy {
    rules: Vec<RouteRule>,
}

impl Policy {
    /// Create a policy from an ordered rule list
    pub fn new(rules: Vec<RouteRule>) -> Self {
        Self { rules }
    }

    /// The CleanWorld route table
    ///
    /// Order matters: specific public and authenticated rules come before
    /// the admin catch-alls for the same prefixes.
    pub fn cleanworld() -> Self {
        use Access::*;

        let any = |pattern: &str, access: Access| RouteRule::new(None, pattern, access);
        let m = |method: Method, pattern: &str, access: Access| {
            RouteRule::new(Some(method), pattern, access)
        };

        Self::new(vec![
            // Login, registration and existence checks are open
            m(Method::POST, "/users/login", Public),
            m(Method::POST, "/users", Public),
            m(Method::GET, "/users/check-email", Public),
            m(Method::GET, "/users/check-user", Public),
            m(Method::GET, "/health", Public),
            // Profile self-edit needs a full account, not a guest
            m(
                Method::PATCH,
                "/users/edit/*",
                Roles(vec![Role::User, Role::Admin]),
            ),
            // Event attendance is driven by the calling principal
            m(Method::GET, "/events/*/attendees", Authenticated),
            m(Method::POST, "/events/*/attendees", Authenticated),
            m(Method::DELETE, "/events/*/attendees/*", Authenticated),
            // Reads are open to anyone who is logged in
            m(Method::GET, "/users/*", Authenticated),
            m(Method::GET, "/zones", Authenticated),
            m(Method::GET, "/zones/*", Authenticated),
            m(Method::GET, "/events", Authenticated),
            m(Method::GET, "/events/*", Authenticated),
            // Everything else on these resources is administrative
            any("/users", Roles(vec![Role::Admin])),
            any("/users/**", Roles(vec![Role::Admin])),
            any("/zones", Roles(vec![Role::Admin])),
            any("/zones/**", Roles(vec![Role::Admin])),
            any("/events", Roles(vec![Role::Admin])),
            any("/events/**", Roles(vec![Role::Admin])),
        ])
    }

    /// Evaluate the policy for a request
    ///
    /// Scans rules in order; the first pattern+method match decides. With
    /// no matching rule the request is denied unless a principal is
    /// present (safe default for routes added without an explicit rule).
    pub fn check(
        &self,
        method: &Method,
        path: &str,
        principal: Option<&Principal>,
    ) -> Result<(), AuthError> {
        let access = self
            .rules
            .iter()
            .find(|rule| rule.applies_to(method, path))
            .map(|rule| &rule.access)
            .unwrap_or(&Access::Authenticated);

        match access {
            Access::Public => Ok(()),
            Access::Authenticated => match principal {
                Some(_) => Ok(()),
                None => Err(AuthError::Unauthenticated),
            },
            Access::Roles(allowed) => match principal {
                None => Err(AuthError::Unauthenticated),
                Some(p) if allowed.contains(&p.role) => Ok(()),
                Some(_) => Err(AuthError::Forbidden),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(role: Role) -> Principal {
        Principal {
            user_id: 5,
            email: "ana@example.com".to_string(),
            role,
        }
    }

    #[test]
    fn test_public_route_ignores_principal() {
        let policy = Policy::new(vec![RouteRule::new(None, "/public", Access::Public)]);

        assert!(policy.check(&Method::GET, "/public", None).is_ok());
        assert!(policy
            .check(&Method::GET, "/public", Some(&principal(Role::Guest)))
            .is_ok());
    }

    #[test]
    fn test_admin_route_outcomes() {
        let policy = Policy::new(vec![
            RouteRule::new(None, "/public", Access::Public),
            RouteRule::new(None, "/admin/**", Access::Roles(vec![Role::Admin])),
        ]);

        // Anonymous: unauthenticated, not forbidden
        let err = policy.check(&Method::GET, "/admin/x", None).unwrap_err();
        assert!(matches!(err, AuthError::Unauthenticated));

        // Wrong role: forbidden, not unauthenticated
        let err = policy
            .check(&Method::GET, "/admin/x", Some(&principal(Role::User)))
            .unwrap_err();
        assert!(matches!(err, AuthError::Forbidden));

        // Right role: allowed
        assert!(policy
            .check(&Method::GET, "/admin/x", Some(&principal(Role::Admin)))
            .is_ok());
    }

    #[test]
    fn test_first_match_wins_over_later_rules() {
        // The specific public rule shadows the broader admin rule
        let policy = Policy::new(vec![
            RouteRule::new(Some(Method::GET), "/admin/status", Access::Public),
            RouteRule::new(None, "/admin/**", Access::Roles(vec![Role::Admin])),
        ]);

        assert!(policy.check(&Method::GET, "/admin/status", None).is_ok());
        assert!(policy.check(&Method::GET, "/admin/other", None).is_err());

        // Method mismatch falls through to the broader rule
        assert!(policy.check(&Method::POST, "/admin/status", None).is_err());
    }

    #[test]
    fn test_role_set_is_membership_not_threshold() {
        let policy = Policy::new(vec![RouteRule::new(
            None,
            "/either",
            Access::Roles(vec![Role::Guest, Role::Admin]),
        )]);

        // User sits between Guest and Admin in the order but is not in the set
        assert!(policy
            .check(&Method::GET, "/either", Some(&principal(Role::User)))
            .is_err());
        assert!(policy
            .check(&Method::GET, "/either", Some(&principal(Role::Guest)))
            .is_ok());
        assert!(policy
            .check(&Method::GET, "/either", Some(&principal(Role::Admin)))
            .is_ok());
    }

    #[test]
    fn test_unmatched_route_is_default_deny() {
        let policy = Policy::new(vec![RouteRule::new(None, "/public", Access::Public)]);

        let err = policy.check(&Method::GET, "/brand-new", None).unwrap_err();
        assert!(matches!(err, AuthError::Unauthenticated));

        assert!(policy
            .check(&Method::GET, "/brand-new", Some(&principal(Role::Guest)))
            .is_ok());
    }

    #[test]
    fn test_single_wildcard_is_one_segment() {
        let policy = Policy::new(vec![RouteRule::new(None, "/zones/*", Access::Public)]);

        assert!(policy.check(&Method::GET, "/zones/12", None).is_ok());
        // Not the bare collection
        assert!(policy.check(&Method::GET, "/zones", None).is_err());
        // Not nested paths
        assert!(policy.check(&Method::GET, "/zones/12/extra", None).is_err());
    }

    #[test]
    fn test_cleanworld_table() {
        let policy = Policy::cleanworld();
        let user = principal(Role::User);
        let admin = principal(Role::Admin);
        let guest = principal(Role::Guest);

        // Public endpoints work anonymously
        assert!(policy.check(&Method::POST, "/users/login", None).is_ok());
        assert!(policy.check(&Method::POST, "/users", None).is_ok());
        assert!(policy.check(&Method::GET, "/users/check-email", None).is_ok());
        assert!(policy.check(&Method::GET, "/health", None).is_ok());

        // Reads need a principal of any role
        assert!(policy.check(&Method::GET, "/zones", None).is_err());
        assert!(policy.check(&Method::GET, "/zones", Some(&guest)).is_ok());
        assert!(policy.check(&Method::GET, "/users/5", Some(&guest)).is_ok());
        assert!(policy.check(&Method::GET, "/events/3", Some(&guest)).is_ok());

        // Profile edit requires user or admin, not guest
        assert!(matches!(
            policy
                .check(&Method::PATCH, "/users/edit/5", Some(&guest))
                .unwrap_err(),
            AuthError::Forbidden
        ));
        assert!(policy.check(&Method::PATCH, "/users/edit/5", Some(&user)).is_ok());
        assert!(policy.check(&Method::PATCH, "/users/edit/5", Some(&admin)).is_ok());

        // Mutations on resources are admin-only
        assert!(matches!(
            policy.check(&Method::POST, "/zones", Some(&user)).unwrap_err(),
            AuthError::Forbidden
        ));
        assert!(policy.check(&Method::POST, "/zones", Some(&admin)).is_ok());
        assert!(policy.check(&Method::DELETE, "/events/3", Some(&admin)).is_ok());
        assert!(policy.check(&Method::GET, "/users", Some(&admin)).is_ok());
        assert!(policy.check(&Method::GET, "/users", Some(&user)).is_err());

        // Attendance is open to any authenticated principal
        assert!(policy
            .check(&Method::POST, "/events/3/attendees", Some(&user))
            .is_ok());
        assert!(policy
            .check(&Method::DELETE, "/events/3/attendees/5", Some(&user))
            .is_ok());
        assert!(policy.check(&Method::POST, "/events/3/attendees", None).is_err());
    }
}
