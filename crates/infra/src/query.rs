//! Paginated, role-scoped order queries.
//!
//! Scoping is applied here, before filtering and paging, for every caller:
//! merchants see their own orders, couriers the orders bound to them, buyers
//! their purchases, operators everything.

use serde::{Deserialize, Serialize};

use courierflow_auth::{Principal, Role};
use courierflow_core::DomainError;
use courierflow_orders::{resolve_display_status, Order, OrderStatus};

use crate::engine::DispatchError;
use crate::store::OrderStore;

pub const DEFAULT_PAGE_SIZE: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OrderQuery {
    /// 1-based.
    pub page: usize,
    pub page_size: usize,
    /// Compared with the display status, not the raw one.
    pub status: Option<OrderStatus>,
    pub search: Option<String>,
}

impl Default for OrderQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            status: None,
            search: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub current_page: usize,
    pub total_pages: usize,
    pub total_count: usize,
}

/// An order as shown to users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    pub display_status: OrderStatus,
}

impl From<Order> for OrderView {
    fn from(order: Order) -> Self {
        let display_status = resolve_display_status(&order);
        Self {
            order,
            display_status,
        }
    }
}

/// Whether `principal` may see `order` at all.
pub fn is_visible(order: &Order, principal: &Principal) -> bool {
    match principal.role {
        Role::Operator => true,
        Role::Merchant => order.merchant_id() == principal.actor_id,
        Role::Courier => order.bound_courier().is_some_and(|c| c == principal.actor_id),
        Role::Buyer => order.buyer_id() == principal.actor_id,
    }
}

fn matches_search(order: &Order, needle: &str) -> bool {
    let contains = |hay: &str| hay.to_lowercase().contains(needle);
    contains(order.order_number())
        || contains(order.buyer_name())
        || order.items().iter().any(|i| contains(&i.name))
}

#[derive(Debug)]
pub struct OrderQueries<S> {
    store: S,
    max_page_size: usize,
}

impl<S> OrderQueries<S>
where
    S: OrderStore,
{
    pub fn new(store: S, max_page_size: usize) -> Self {
        Self {
            store,
            max_page_size: max_page_size.max(1),
        }
    }

    pub fn query(
        &self,
        principal: &Principal,
        query: &OrderQuery,
    ) -> Result<Page<OrderView>, DispatchError> {
        if query.page == 0 {
            return Err(DomainError::validation("page is 1-based").into());
        }
        if query.page_size == 0 {
            return Err(DomainError::validation("page_size must be positive").into());
        }
        let page_size = query.page_size.min(self.max_page_size);
        let needle = query
            .search
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());

        let mut matching: Vec<OrderView> = self
            .store
            .list_orders()?
            .into_iter()
            .filter(|o| is_visible(o, principal))
            .filter(|o| needle.as_deref().is_none_or(|n| matches_search(o, n)))
            .map(OrderView::from)
            .filter(|v| query.status.is_none_or(|s| v.display_status == s))
            .collect();

        matching.sort_by(|a, b| {
            b.order
                .created_at()
                .cmp(&a.order.created_at())
                .then_with(|| a.order.order_number().cmp(b.order.order_number()))
        });

        let total_count = matching.len();
        let total_pages = total_count.div_ceil(page_size);
        let items = matching
            .into_iter()
            .skip((query.page - 1).saturating_mul(page_size))
            .take(page_size)
            .collect();

        Ok(Page {
            items,
            current_page: query.page,
            total_pages,
            total_count,
        })
    }
}
