use serde::{Deserialize, Serialize};

use courierflow_core::ActorId;

use crate::Role;

/// A fully resolved principal for authorization decisions: who is acting, and
/// in which role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal {
    pub actor_id: ActorId,
    pub role: Role,
}

impl Principal {
    pub fn new(actor_id: ActorId, role: Role) -> Self {
        Self { actor_id, role }
    }

    pub fn merchant(actor_id: ActorId) -> Self {
        Self::new(actor_id, Role::Merchant)
    }

    pub fn courier(actor_id: ActorId) -> Self {
        Self::new(actor_id, Role::Courier)
    }

    pub fn operator(actor_id: ActorId) -> Self {
        Self::new(actor_id, Role::Operator)
    }

    pub fn buyer(actor_id: ActorId) -> Self {
        Self::new(actor_id, Role::Buyer)
    }
}

impl core::fmt::Display for Principal {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{}", self.role, self.actor_id)
    }
}
