//! Where a notification takes its reader, keyed by `(role, event kind)`.

use courierflow_auth::Role;
use courierflow_core::OrderId;
use courierflow_orders::OrderEventKind;

use OrderEventKind as K;

/// Per-role fallback route prefix.
static ROLE_DEFAULTS: &[(Role, &str)] = &[
    (Role::Merchant, "/merchant/orders"),
    (Role::Courier, "/courier/deliveries"),
    (Role::Operator, "/admin/orders"),
    (Role::Buyer, "/orders"),
];

/// Overrides for events that deserve a more specific screen.
static OVERRIDES: &[(Role, OrderEventKind, &str)] = &[
    (Role::Courier, K::Assigned, "/courier/assignments"),
    (Role::Courier, K::Cancelled, "/courier/history"),
    (Role::Operator, K::Declined, "/admin/dispatch"),
    (Role::Operator, K::Ready, "/admin/dispatch"),
    (Role::Merchant, K::Declined, "/merchant/dispatch"),
    (Role::Buyer, K::InTransit, "/orders/track"),
];

pub fn navigation_target(role: Role, kind: OrderEventKind, order_id: OrderId) -> String {
    let prefix = OVERRIDES
        .iter()
        .find(|(r, k, _)| *r == role && *k == kind)
        .map(|(_, _, p)| *p)
        .or_else(|| ROLE_DEFAULTS.iter().find(|(r, _)| *r == role).map(|(_, p)| *p))
        .unwrap_or("/");
    format!("{}/{order_id}", prefix.trim_end_matches('/'))
}
