use std::collections::HashMap;
use std::fmt;
use tracing::{debug, warn};

use super::pre_auth::BlockList;
use crate::models::ApiError;

pub const SUBJECT_CLAIM: &str = "sub";
pub const EMAIL_CLAIM: &str = "email";
pub const SCOPE_CLAIM: &str = "scope";
pub const GROUPS_CLAIM: &str = "cognito:groups";

/// Client context a credential was issued for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Web,
    Mobile,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Web => "customer/web",
            Scope::Mobile => "customer/mobile",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "customer/web" => Some(Scope::Web),
            "customer/mobile" => Some(Scope::Mobile),
            _ => None,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a route demands of the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessTier {
    /// Read access; any one of the listed scopes suffices
    Fetch(&'static [Scope]),
    /// Write access; requires the administrator group
    Admin,
}

impl AccessTier {
    pub const WEB_OR_MOBILE: AccessTier = AccessTier::Fetch(&[Scope::Web, Scope::Mobile]);
    pub const WEB_ONLY: AccessTier = AccessTier::Fetch(&[Scope::Web]);
}

/// Identity asserted by the upstream authorizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub subject: String,
    pub email: Option<String>,
    pub scopes: Vec<Scope>,
    pub groups: Vec<String>,
}

impl Credential {
    /// Build a credential from authorizer claims; `None` without a subject
    pub fn from_claims(claims: &HashMap<String, String>) -> Option<Self> {
        let subject = claims
            .get(SUBJECT_CLAIM)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())?
            .to_string();

        let scopes = claims
            .get(SCOPE_CLAIM)
            .map(|scope| scope.split_whitespace().filter_map(Scope::parse).collect())
            .unwrap_or_default();

        let groups = claims
            .get(GROUPS_CLAIM)
            .map(|groups| parse_groups(groups))
            .unwrap_or_default();

        Some(Credential {
            subject,
            email: claims.get(EMAIL_CLAIM).cloned(),
            scopes,
            groups,
        })
    }

    pub fn has_any_scope(&self, allowed: &[Scope]) -> bool {
        self.scopes.iter().any(|scope| allowed.contains(scope))
    }

    pub fn in_group(&self, group: &str) -> bool {
        self.groups.iter().any(|g| g == group)
    }
}

// API Gateway flattens group lists to "[admin staff]" or "admin,staff"
fn parse_groups(raw: &str) -> Vec<String> {
    raw.trim_start_matches('[')
        .trim_end_matches(']')
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|g| !g.is_empty())
        .map(str::to_string)
        .collect()
}

/// Gatekeeper applied before any repository call
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    admin_group: String,
    block_list: BlockList,
}

impl AccessPolicy {
    pub fn new(admin_group: impl Into<String>, block_list: BlockList) -> Self {
        Self {
            admin_group: admin_group.into(),
            block_list,
        }
    }

    pub fn admin_group(&self) -> &str {
        &self.admin_group
    }

    pub fn block_list(&self) -> &BlockList {
        &self.block_list
    }

    /// Check `claims` against `tier`, returning the caller's credential when allowed
    pub fn authorize(
        &self,
        tier: AccessTier,
        claims: Option<&HashMap<String, String>>,
    ) -> Result<Credential, ApiError> {
        let credential = claims
            .and_then(Credential::from_claims)
            .ok_or(ApiError::Unauthorized)?;

        if let Some(message) = credential
            .email
            .as_deref()
            .and_then(|email| self.block_list.rejection(email))
        {
            warn!(subject = %credential.subject, "Blocked user rejected");
            return Err(ApiError::Blocked { message });
        }

        match tier {
            AccessTier::Admin if !credential.in_group(&self.admin_group) => {
                debug!(subject = %credential.subject, "Caller is not an administrator");
                Err(ApiError::Forbidden {
                    reason: format!("Requires membership of {}", self.admin_group),
                })
            }
            AccessTier::Fetch(allowed) if !credential.has_any_scope(allowed) => {
                debug!(subject = %credential.subject, "Caller lacks a permitted scope");
                Err(ApiError::Forbidden {
                    reason: format!(
                        "Requires one of: {}",
                        allowed
                            .iter()
                            .map(Scope::as_str)
                            .collect::<Vec<_>>()
                            .join(", ")
                    ),
                })
            }
            _ => Ok(credential),
        }
    }
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::new("admin", BlockList::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_scope_parsing() {
        assert_eq!(Scope::parse("customer/web"), Some(Scope::Web));
        assert_eq!(Scope::parse("customer/mobile"), Some(Scope::Mobile));
        assert_eq!(Scope::parse("customer/admin"), None);
        assert_eq!(Scope::Mobile.to_string(), "customer/mobile");
    }

    #[test]
    fn test_credential_from_claims() {
        let credential = Credential::from_claims(&claims(&[
            ("sub", "user-1"),
            ("email", "a@x.com"),
            ("scope", "openid customer/mobile"),
            ("cognito:groups", "[admin staff]"),
        ]))
        .unwrap();

        assert_eq!(credential.subject, "user-1");
        assert_eq!(credential.email.as_deref(), Some("a@x.com"));
        assert_eq!(credential.scopes, vec![Scope::Mobile]);
        assert!(credential.in_group("admin"));
        assert!(credential.in_group("staff"));
    }

    #[test]
    fn test_credential_requires_subject() {
        assert!(Credential::from_claims(&claims(&[("scope", "customer/web")])).is_none());
        assert!(Credential::from_claims(&claims(&[("sub", "  ")])).is_none());
    }

    #[test]
    fn test_missing_claims_are_unauthorized() {
        let policy = AccessPolicy::default();
        let result = policy.authorize(AccessTier::WEB_OR_MOBILE, None);
        assert!(matches!(result, Err(ApiError::Unauthorized)));
    }

    #[test]
    fn test_fetch_scopes() {
        let policy = AccessPolicy::default();
        let mobile = claims(&[("sub", "u"), ("scope", "customer/mobile")]);
        let web = claims(&[("sub", "u"), ("scope", "customer/web")]);
        let none = claims(&[("sub", "u")]);

        assert!(policy.authorize(AccessTier::WEB_OR_MOBILE, Some(&mobile)).is_ok());
        assert!(policy.authorize(AccessTier::WEB_ONLY, Some(&web)).is_ok());
        assert!(matches!(
            policy.authorize(AccessTier::WEB_ONLY, Some(&mobile)),
            Err(ApiError::Forbidden { .. })
        ));
        assert!(matches!(
            policy.authorize(AccessTier::WEB_OR_MOBILE, Some(&none)),
            Err(ApiError::Forbidden { .. })
        ));
    }

    #[test]
    fn test_admin_requires_group() {
        let policy = AccessPolicy::new("hotel-admins", BlockList::default());
        let admin = claims(&[("sub", "u"), ("cognito:groups", "hotel-admins")]);
        let scoped_user = claims(&[("sub", "u"), ("scope", "customer/web")]);

        assert!(policy.authorize(AccessTier::Admin, Some(&admin)).is_ok());
        assert!(matches!(
            policy.authorize(AccessTier::Admin, Some(&scoped_user)),
            Err(ApiError::Forbidden { .. })
        ));
    }

    #[test]
    fn test_blocked_user_is_forbidden() {
        let policy = AccessPolicy::new("admin", BlockList::new().block("a@x.com", "PAYMENT"));
        let blocked = claims(&[
            ("sub", "u"),
            ("email", "a@x.com"),
            ("scope", "customer/web"),
            ("cognito:groups", "admin"),
        ]);

        match policy.authorize(AccessTier::WEB_OR_MOBILE, Some(&blocked)) {
            Err(ApiError::Blocked { message }) => {
                assert_eq!(message, "This user is blocked. Reason: PAYMENT")
            }
            other => panic!("Expected Blocked, got {:?}", other),
        }
        assert!(policy.authorize(AccessTier::Admin, Some(&blocked)).is_err());
    }
}
