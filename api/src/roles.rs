use pipeline::{RequestContext, RoleChecker};

/// Header carrying the caller's comma-separated roles
pub const ROLES_HEADER: &str = "x-user-roles";

/// Reads roles from a request header set by an upstream authenticating proxy
#[derive(Debug, Clone)]
pub struct HeaderRoleChecker {
    header: String,
}

impl HeaderRoleChecker {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
        }
    }
}

impl Default for HeaderRoleChecker {
    fn default() -> Self {
        Self::new(ROLES_HEADER)
    }
}

impl RoleChecker for HeaderRoleChecker {
    fn has_role(&self, ctx: &RequestContext, role: &str) -> bool {
        ctx.header(&self.header)
            .map(|roles| roles.split(',').any(|r| r.trim().eq_ignore_ascii_case(role)))
            .unwrap_or(false)
    }
}
