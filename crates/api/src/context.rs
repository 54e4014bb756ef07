use courierflow_auth::{Principal, Role};
use courierflow_core::ActorId;

/// Principal context for a request (authenticated identity + role).
///
/// Derived from the bearer token only; never from the request body.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal: Principal,
}

impl PrincipalContext {
    pub fn new(principal: Principal) -> Self {
        Self { principal }
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn actor_id(&self) -> ActorId {
        self.principal.actor_id
    }

    pub fn role(&self) -> Role {
        self.principal.role
    }
}
