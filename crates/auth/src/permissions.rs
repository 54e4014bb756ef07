use serde::Serialize;

use crate::Role;

/// Permission identifier.
///
/// Permissions gate *what kind* of operation a role may attempt. Whether the
/// actor owns the specific order is checked separately by the domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Permission {
    OrdersCreate,
    OrdersRead,
    /// Drive the merchant-facing lifecycle (confirm, prepare, ready, cancel).
    OrdersMerchantStatus,
    /// Drive the courier-facing lifecycle (accept, pick up, in transit, deliver).
    OrdersDeliveryStatus,
    OrdersAssign,
    CouriersRead,
    CouriersAdmin,
    CourierStatsRead,
    NotificationsRead,
    ReportsRead,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::OrdersCreate => "orders.create",
            Permission::OrdersRead => "orders.read",
            Permission::OrdersMerchantStatus => "orders.status.merchant",
            Permission::OrdersDeliveryStatus => "orders.status.delivery",
            Permission::OrdersAssign => "orders.assign",
            Permission::CouriersRead => "couriers.read",
            Permission::CouriersAdmin => "couriers.admin",
            Permission::CourierStatsRead => "couriers.stats.read",
            Permission::NotificationsRead => "notifications.read",
            Permission::ReportsRead => "reports.read",
        }
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

use Permission::*;

static ROLE_PERMISSIONS: &[(Role, &[Permission])] = &[
    (
        Role::Merchant,
        &[OrdersRead, OrdersMerchantStatus, OrdersAssign, CouriersRead, NotificationsRead],
    ),
    (
        Role::Courier,
        &[OrdersRead, OrdersDeliveryStatus, CourierStatsRead, NotificationsRead],
    ),
    (
        Role::Operator,
        &[
            OrdersRead,
            OrdersMerchantStatus,
            OrdersAssign,
            CouriersRead,
            CouriersAdmin,
            CourierStatsRead,
            NotificationsRead,
            ReportsRead,
        ],
    ),
    (Role::Buyer, &[OrdersCreate, OrdersRead, NotificationsRead]),
];

/// Permissions granted to a role.
pub fn permissions_for(role: Role) -> &'static [Permission] {
    ROLE_PERMISSIONS
        .iter()
        .find(|(r, _)| *r == role)
        .map(|(_, perms)| *perms)
        .unwrap_or(&[])
}
