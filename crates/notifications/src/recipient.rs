use serde::{Deserialize, Serialize};

use courierflow_auth::{Principal, Role};
use courierflow_core::{BuyerId, CourierId, MerchantId};

/// Mailbox owner.
///
/// Operators share one mailbox; everyone else has their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "role", content = "id", rename_all = "snake_case")]
pub enum Recipient {
    Operators,
    Merchant(MerchantId),
    Courier(CourierId),
    Buyer(BuyerId),
}

impl Recipient {
    /// The mailbox a principal reads from.
    pub fn for_principal(principal: &Principal) -> Self {
        match principal.role {
            Role::Operator => Recipient::Operators,
            Role::Merchant => Recipient::Merchant(principal.actor_id.into()),
            Role::Courier => Recipient::Courier(principal.actor_id.into()),
            Role::Buyer => Recipient::Buyer(principal.actor_id.into()),
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Recipient::Operators => Role::Operator,
            Recipient::Merchant(_) => Role::Merchant,
            Recipient::Courier(_) => Role::Courier,
            Recipient::Buyer(_) => Role::Buyer,
        }
    }
}
