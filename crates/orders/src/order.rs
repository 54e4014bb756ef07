use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use courierflow_auth::Principal;
use courierflow_core::{AggregateRoot, BuyerId, CourierId, DomainError, MerchantId, OrderId};

use crate::courier::CourierAssignment;
use crate::history::{StatusHistory, TrackedStatus};

/// Merchant-facing lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Preparing,
    Ready,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|st| st.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DomainError::validation(format!("unknown order status '{s}'")))
    }
}

/// Courier-facing lifecycle.
///
/// `None` on an order means it was never assigned. `AwaitingAssignment` means a
/// courier declined and the order waits for a reassignment; `Assigned` means a
/// courier is bound and has not answered yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    AwaitingAssignment,
    Assigned,
    Accepted,
    PickedUp,
    InTransit,
    Delivered,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::AwaitingAssignment => "awaiting_assignment",
            DeliveryStatus::Assigned => "assigned",
            DeliveryStatus::Accepted => "accepted",
            DeliveryStatus::PickedUp => "picked_up",
            DeliveryStatus::InTransit => "in_transit",
            DeliveryStatus::Delivered => "delivered",
        }
    }
}

/// Order line: name, quantity, unit price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    pub quantity: u32,
    /// Price in smallest currency unit (e.g., cents).
    pub unit_price: u64,
}

/// Checkout input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub merchant_id: MerchantId,
    pub buyer_name: String,
    pub items: Vec<LineItem>,
    pub proof_of_payment: Option<String>,
}

/// Aggregate root: Order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    pub(crate) id: OrderId,
    pub(crate) order_number: String,
    pub(crate) merchant_id: MerchantId,
    pub(crate) buyer_id: BuyerId,
    pub(crate) buyer_name: String,
    pub(crate) items: Vec<LineItem>,
    pub(crate) total_amount: u64,
    pub(crate) status: OrderStatus,
    pub(crate) delivery_status: Option<DeliveryStatus>,
    pub(crate) courier_assignment: Option<CourierAssignment>,
    pub(crate) status_history: StatusHistory,
    pub(crate) proof_of_payment: Option<String>,
    pub(crate) proof_of_delivery_images: Vec<String>,
    pub(crate) delivered_at: Option<DateTime<Utc>>,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) version: u64,
}

impl Order {
    /// Place a new order on behalf of `buyer`.
    ///
    /// The total is computed from the lines; the history starts with a single
    /// `pending` entry and the version with 1.
    pub fn place(
        id: OrderId,
        new: NewOrder,
        buyer: &Principal,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let buyer_name = new.buyer_name.trim().to_string();
        if buyer_name.is_empty() {
            return Err(DomainError::validation("buyer_name is required"));
        }
        if new.items.is_empty() {
            return Err(DomainError::validation("an order needs at least one item"));
        }

        let mut total: u64 = 0;
        for item in &new.items {
            if item.name.trim().is_empty() {
                return Err(DomainError::validation("item name is required"));
            }
            if item.quantity == 0 {
                return Err(DomainError::validation("quantity must be positive"));
            }
            if item.unit_price == 0 {
                return Err(DomainError::validation("unit_price must be positive"));
            }
            total = u64::from(item.quantity)
                .checked_mul(item.unit_price)
                .and_then(|line| total.checked_add(line))
                .ok_or_else(|| DomainError::validation("order total overflows"))?;
        }

        let mut status_history = StatusHistory::new();
        status_history.append(TrackedStatus::Order(OrderStatus::Pending), *buyer, now);

        Ok(Self {
            id,
            order_number: order_number_for(id),
            merchant_id: new.merchant_id,
            buyer_id: BuyerId::from(buyer.actor_id),
            buyer_name,
            items: new.items,
            total_amount: total,
            status: OrderStatus::Pending,
            delivery_status: None,
            courier_assignment: None,
            status_history,
            proof_of_payment: new.proof_of_payment.filter(|p| !p.trim().is_empty()),
            proof_of_delivery_images: Vec::new(),
            delivered_at: None,
            created_at: now,
            version: 1,
        })
    }

    pub fn id_typed(&self) -> OrderId {
        self.id
    }

    pub fn order_number(&self) -> &str {
        &self.order_number
    }

    pub fn merchant_id(&self) -> MerchantId {
        self.merchant_id
    }

    pub fn buyer_id(&self) -> BuyerId {
        self.buyer_id
    }

    pub fn buyer_name(&self) -> &str {
        &self.buyer_name
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn total_amount(&self) -> u64 {
        self.total_amount
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn delivery_status(&self) -> Option<DeliveryStatus> {
        self.delivery_status
    }

    pub fn courier_assignment(&self) -> Option<&CourierAssignment> {
        self.courier_assignment.as_ref()
    }

    /// Courier currently bound to the order, if any.
    pub fn bound_courier(&self) -> Option<CourierId> {
        self.courier_assignment.as_ref().map(|a| a.courier_id)
    }

    pub fn status_history(&self) -> &StatusHistory {
        &self.status_history
    }

    pub fn proof_of_payment(&self) -> Option<&str> {
        self.proof_of_payment.as_deref()
    }

    pub fn proof_of_delivery_images(&self) -> &[String] {
        &self.proof_of_delivery_images
    }

    pub fn delivered_at(&self) -> Option<DateTime<Utc>> {
        self.delivered_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl AggregateRoot for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

fn order_number_for(id: OrderId) -> String {
    // The tail of a v7 UUID is random; the head is a timestamp shared by
    // orders placed in the same millisecond.
    let simple = id.as_uuid().simple().to_string();
    format!("ORD-{}", simple[simple.len() - 10..].to_uppercase())
}
