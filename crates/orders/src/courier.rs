use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use courierflow_core::{AggregateRoot, CourierId, DomainError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    /// e.g. "motorbike", "van".
    pub kind: String,
    pub plate: String,
}

/// Registration input for a courier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCourier {
    pub name: String,
    pub phone: String,
    pub vehicle: Vehicle,
    pub photo: Option<String>,
}

/// Courier record.
///
/// `is_active` is administrative; `is_available` flips only through
/// [`Courier::mark_bound`] / [`Courier::mark_released`], which the store calls
/// inside the same atomic commit that binds or releases an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Courier {
    id: CourierId,
    name: String,
    phone: String,
    vehicle: Vehicle,
    is_active: bool,
    is_available: bool,
    photo: Option<String>,
    version: u64,
}

impl Courier {
    pub fn register(id: CourierId, new: NewCourier) -> Result<Self, DomainError> {
        let name = new.name.trim().to_string();
        if name.is_empty() {
            return Err(DomainError::validation("courier name is required"));
        }
        let phone = new.phone.trim().to_string();
        if phone.is_empty() {
            return Err(DomainError::validation("courier phone is required"));
        }
        if new.vehicle.plate.trim().is_empty() {
            return Err(DomainError::validation("vehicle plate is required"));
        }

        Ok(Self {
            id,
            name,
            phone,
            vehicle: new.vehicle,
            is_active: true,
            is_available: true,
            photo: new.photo,
            version: 1,
        })
    }

    pub fn id_typed(&self) -> CourierId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn vehicle(&self) -> &Vehicle {
        &self.vehicle
    }

    pub fn photo(&self) -> Option<&str> {
        self.photo.as_deref()
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn is_available(&self) -> bool {
        self.is_available
    }

    /// Free to be bound to an order right now.
    pub fn can_take_work(&self) -> bool {
        self.is_active && self.is_available
    }

    /// Check that the courier may be bound, without changing it.
    pub fn ensure_bindable(&self) -> Result<(), DomainError> {
        if !self.is_active {
            return Err(DomainError::validation(format!("courier {} is not active", self.id)));
        }
        if !self.is_available {
            return Err(DomainError::conflict(format!("courier {} is not available", self.id)));
        }
        Ok(())
    }

    pub fn mark_bound(&mut self) -> Result<(), DomainError> {
        self.ensure_bindable()?;
        self.is_available = false;
        self.version += 1;
        Ok(())
    }

    pub fn mark_released(&mut self) {
        self.is_available = true;
        self.version += 1;
    }

    pub fn set_active(&mut self, active: bool) {
        self.is_active = active;
        self.version += 1;
    }

    /// Denormalized snapshot stored on the order so its display stays stable
    /// if the courier record changes later.
    pub fn snapshot(&self, assigned_at: DateTime<Utc>) -> CourierAssignment {
        CourierAssignment {
            courier_id: self.id,
            courier_name: self.name.clone(),
            courier_phone: self.phone.clone(),
            vehicle: self.vehicle.clone(),
            assigned_at,
        }
    }
}

impl AggregateRoot for Courier {
    type Id = CourierId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// The courier bound to an order, with the display snapshot taken at binding time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourierAssignment {
    pub courier_id: CourierId,
    pub courier_name: String,
    pub courier_phone: String,
    pub vehicle: Vehicle,
    pub assigned_at: DateTime<Utc>,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn new_courier(name: &str) -> NewCourier {
        NewCourier {
            name: name.to_string(),
            phone: "+31 20 555 0100".to_string(),
            vehicle: Vehicle {
                kind: "motorbike".to_string(),
                plate: "AB-123-C".to_string(),
            },
            photo: None,
        }
    }

    #[test]
    fn registered_courier_is_active_and_available() {
        let c = Courier::register(CourierId::new(), new_courier("Grace")).unwrap();
        assert!(c.can_take_work());
    }

    #[test]
    fn binding_flips_availability_and_refuses_a_second_bind() {
        let mut c = Courier::register(CourierId::new(), new_courier("Grace")).unwrap();
        c.mark_bound().unwrap();
        assert!(!c.is_available());
        assert!(matches!(c.mark_bound(), Err(DomainError::Conflict(_))));

        c.mark_released();
        assert!(c.is_available());
    }

    #[test]
    fn inactive_courier_is_not_bindable() {
        let mut c = Courier::register(CourierId::new(), new_courier("Grace")).unwrap();
        c.set_active(false);
        assert!(matches!(c.ensure_bindable(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn registration_requires_name_and_phone() {
        let mut bad = new_courier(" ");
        assert!(Courier::register(CourierId::new(), bad.clone()).is_err());
        bad.name = "Grace".to_string();
        bad.phone = String::new();
        assert!(Courier::register(CourierId::new(), bad).is_err());
    }
}
