use thiserror::Error;

use crate::permissions::permissions_for;
use crate::{Permission, Principal};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: role '{role}' lacks permission '{permission}'")]
    Forbidden {
        role: String,
        permission: &'static str,
    },
}

/// Authorize a principal for a permission.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check); ownership of a particular order
///   is the domain's decision
pub fn authorize(principal: &Principal, required: Permission) -> Result<(), AuthzError> {
    if permissions_for(principal.role).contains(&required) {
        Ok(())
    } else {
        tracing::warn!(
            principal = %principal,
            permission = required.as_str(),
            "authorization denied"
        );
        Err(AuthzError::Forbidden {
            role: principal.role.to_string(),
            permission: required.as_str(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courierflow_core::ActorId;

    #[test]
    fn buyer_may_create_but_not_assign() {
        let buyer = Principal::buyer(ActorId::new());
        assert!(authorize(&buyer, Permission::OrdersCreate).is_ok());

        let err = authorize(&buyer, Permission::OrdersAssign).unwrap_err();
        assert_eq!(
            err,
            AuthzError::Forbidden {
                role: "buyer".to_string(),
                permission: "orders.assign",
            }
        );
    }

    #[test]
    fn operator_reads_reports() {
        let op = Principal::operator(ActorId::new());
        assert!(authorize(&op, Permission::ReportsRead).is_ok());
        assert!(authorize(&op, Permission::OrdersDeliveryStatus).is_err());
    }
}
