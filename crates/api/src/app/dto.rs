use serde::{Deserialize, Serialize};

use courierflow_core::MerchantId;
use courierflow_notifications::Notification;
use courierflow_orders::{
    resolve_display_status, HistoryEntry, LineItem, NewOrder, Order, OrderStatus, ProofImage,
};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub merchant_id: MerchantId,
    pub buyer_name: String,
    pub items: Vec<LineItem>,
    pub proof_of_payment: Option<String>,
    /// Face descriptor for the checkout gate, when one is configured.
    pub descriptor: Option<Vec<f32>>,
}

impl CreateOrderRequest {
    pub fn into_parts(self) -> (NewOrder, Option<Vec<f32>>) {
        (
            NewOrder {
                merchant_id: self.merchant_id,
                buyer_name: self.buyer_name,
                items: self.items,
                proof_of_payment: self.proof_of_payment,
            },
            self.descriptor,
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusChangeRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub courier_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ProofRequest {
    pub images: Vec<ProofImage>,
}

#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub active: bool,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct NotificationListQuery {
    pub limit: usize,
    pub offset: usize,
    pub unread_only: bool,
}

impl Default for NotificationListQuery {
    fn default() -> Self {
        Self {
            limit: 20,
            offset: 0,
            unread_only: false,
        }
    }
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub order: Order,
    pub display_status: OrderStatus,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        let display_status = resolve_display_status(&order);
        Self {
            order,
            display_status,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub items: Vec<HistoryEntry>,
}

#[derive(Debug, Serialize)]
pub struct NotificationListResponse {
    pub items: Vec<Notification>,
    pub unread_count: usize,
}
