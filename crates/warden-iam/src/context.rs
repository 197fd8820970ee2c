use crate::{GUEST_ROLE, Permission};
use std::sync::Arc;

/// Per-request view of what the caller holds.
///
/// Built fresh for every request from the caller's roles; never shared
/// across requests.
#[derive(Debug, Clone, Default)]
pub struct AuthorizationContext {
    roles: Vec<String>,
    permissions: Vec<Arc<Permission>>,
}

impl AuthorizationContext {
    pub fn new(roles: Vec<String>, permissions: Vec<Arc<Permission>>) -> Self {
        Self { roles, permissions }
    }

    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    pub fn permissions(&self) -> &[Arc<Permission>] {
        &self.permissions
    }

    /// No roles at all, or only the guest role.
    pub fn is_anonymous(&self) -> bool {
        match self.roles.as_slice() {
            [] => true,
            [only] => only == GUEST_ROLE,
            _ => false,
        }
    }

    pub fn keys(&self) -> Vec<&str> {
        self.permissions.iter().map(|p| p.key.as_str()).collect()
    }

    pub fn holds(&self, key: &str) -> bool {
        let key = key.trim();
        self.permissions
            .iter()
            .any(|p| p.key.eq_ignore_ascii_case(key))
    }

    pub fn has_all<S: AsRef<str>>(&self, keys: &[S]) -> bool {
        keys.iter().all(|key| self.holds(key.as_ref()))
    }

    pub fn has_any<S: AsRef<str>>(&self, keys: &[S]) -> bool {
        keys.iter().any(|key| self.holds(key.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PermissionId;

    fn permission(id: u32, key: &str) -> Arc<Permission> {
        Arc::new(Permission::placeholder(PermissionId(id), key.to_string()))
    }

    #[test]
    fn anonymous_means_no_roles_or_guest_only() {
        assert!(AuthorizationContext::new(Vec::new(), Vec::new()).is_anonymous());
        assert!(AuthorizationContext::new(vec!["guest".to_string()], Vec::new()).is_anonymous());
        assert!(!AuthorizationContext::new(vec!["user".to_string()], Vec::new()).is_anonymous());
        assert!(
            !AuthorizationContext::new(vec!["guest".to_string(), "user".to_string()], Vec::new())
                .is_anonymous()
        );
    }

    #[test]
    fn has_all_and_has_any() {
        let context = AuthorizationContext::new(
            vec!["user".to_string()],
            vec![permission(0, "docs:read"), permission(1, "docs:write")],
        );
        assert!(context.has_all(&["docs:read", "DOCS:WRITE"]));
        assert!(!context.has_all(&["docs:read", "docs:delete"]));
        assert!(context.has_any(&["docs:delete", "docs:read"]));
        assert!(!context.has_any(&["docs:delete"]));
        assert_eq!(context.keys(), vec!["docs:read", "docs:write"]);
    }
}
