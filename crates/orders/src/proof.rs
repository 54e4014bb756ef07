//! Proof-of-delivery gate.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use courierflow_auth::{Principal, Role};
use courierflow_core::DomainError;

use crate::order::Order;
use crate::transitions::{ensure_owner, transition, TargetStatus, Transition};

/// Number of photos a courier must submit to complete a delivery.
pub const REQUIRED_PROOF_IMAGES: usize = 2;

/// Metadata of an uploaded image; the bytes live elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofImage {
    /// Opaque storage reference.
    pub reference: String,
    pub mime_type: String,
    pub size_bytes: u64,
}

/// Type and size policy applied to every proof image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofPolicy {
    pub allowed_mime_types: Vec<String>,
    pub max_image_bytes: u64,
}

/// Accepted when no allow-list is configured.
pub const DEFAULT_PROOF_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];
pub const DEFAULT_MAX_PROOF_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

impl Default for ProofPolicy {
    fn default() -> Self {
        Self {
            allowed_mime_types: DEFAULT_PROOF_MIME_TYPES.iter().map(|m| m.to_string()).collect(),
            max_image_bytes: DEFAULT_MAX_PROOF_IMAGE_BYTES,
        }
    }
}

impl ProofPolicy {
    /// Validate a submission and return the image references in order.
    ///
    /// Never truncates or pads: anything other than exactly
    /// [`REQUIRED_PROOF_IMAGES`] valid, distinct images is rejected.
    pub fn validate(&self, images: &[ProofImage]) -> Result<Vec<String>, DomainError> {
        if images.len() != REQUIRED_PROOF_IMAGES {
            return Err(DomainError::validation(format!(
                "exactly {REQUIRED_PROOF_IMAGES} proof-of-delivery images are required, got {}",
                images.len()
            )));
        }

        let mut seen = HashSet::new();
        for (idx, image) in images.iter().enumerate() {
            let reference = image.reference.trim();
            if reference.is_empty() {
                return Err(DomainError::validation(format!("image {idx}: reference is required")));
            }
            if !seen.insert(reference) {
                return Err(DomainError::validation(format!(
                    "image {idx}: duplicate reference '{reference}'"
                )));
            }
            if !self
                .allowed_mime_types
                .iter()
                .any(|m| m.eq_ignore_ascii_case(image.mime_type.trim()))
            {
                return Err(DomainError::validation(format!(
                    "image {idx}: mime type '{}' is not allowed",
                    image.mime_type
                )));
            }
            if image.size_bytes == 0 {
                return Err(DomainError::validation(format!("image {idx}: file is empty")));
            }
            if image.size_bytes > self.max_image_bytes {
                return Err(DomainError::validation(format!(
                    "image {idx}: {} bytes exceeds the {} byte limit",
                    image.size_bytes, self.max_image_bytes
                )));
            }
        }

        Ok(images.iter().map(|i| i.reference.trim().to_string()).collect())
    }
}

/// Attach the proof images and move the order into `delivered`.
///
/// Authority and ownership are checked before the images, so a stranger
/// learns nothing about the policy.
pub fn complete_delivery(
    order: &Order,
    images: &[ProofImage],
    policy: &ProofPolicy,
    actor: &Principal,
    now: DateTime<Utc>,
) -> Result<Transition, DomainError> {
    if actor.role != Role::Courier {
        return Err(DomainError::forbidden("only the assigned courier may submit proof"));
    }
    ensure_owner(order, actor)?;

    let references = policy.validate(images)?;
    let mut with_proof = order.clone();
    with_proof.proof_of_delivery_images = references;

    transition(&with_proof, TargetStatus::Delivered, actor, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::{DeliveryStatus, OrderStatus};
    use crate::transitions::tests::assigned;
    use crate::transitions::CourierEffect;
    use courierflow_core::{ActorId, AggregateRoot};

    fn image(reference: &str) -> ProofImage {
        ProofImage {
            reference: reference.to_string(),
            mime_type: "image/jpeg".to_string(),
            size_bytes: 120_000,
        }
    }

    fn in_transit() -> (Order, Principal, courierflow_core::CourierId) {
        let (mut f, c, courier) = assigned();
        for t in [TargetStatus::Accepted, TargetStatus::PickedUp, TargetStatus::InTransit] {
            f.order = transition(&f.order, t, &courier, Utc::now()).unwrap().order;
        }
        (f.order, courier, c.id_typed())
    }

    #[test]
    fn one_image_is_rejected_without_touching_the_order() {
        let (order, courier, _) = in_transit();
        let err = complete_delivery(
            &order,
            &[image("pod/1.jpg")],
            &ProofPolicy::default(),
            &courier,
            Utc::now(),
        )
        .unwrap_err();

        assert!(matches!(err, DomainError::Validation(_)));
        assert!(order.proof_of_delivery_images().is_empty());
        assert_eq!(order.delivered_at(), None);
    }

    #[test]
    fn two_images_complete_the_delivery_and_free_the_courier() {
        let (order, courier, courier_id) = in_transit();
        let now = Utc::now();
        let t = complete_delivery(
            &order,
            &[image("pod/1.jpg"), image("pod/2.jpg")],
            &ProofPolicy::default(),
            &courier,
            now,
        )
        .unwrap();

        assert_eq!(t.order.status(), OrderStatus::Delivered);
        assert_eq!(t.order.delivery_status(), Some(DeliveryStatus::Delivered));
        assert!(t.order.delivered_at().is_some());
        assert_eq!(t.order.proof_of_delivery_images().len(), 2);
        assert_eq!(t.courier_effect, Some(CourierEffect::Release(courier_id)));
        // The snapshot stays for display.
        assert_eq!(t.order.bound_courier(), Some(courier_id));
        assert_eq!(t.order.version(), order.version() + 1);
    }

    #[test]
    fn policy_rejects_wrong_type_oversize_and_duplicates() {
        let policy = ProofPolicy {
            allowed_mime_types: vec!["image/png".to_string()],
            max_image_bytes: 1_000,
        };

        let mut pdf = image("a.pdf");
        pdf.mime_type = "application/pdf".to_string();
        let mut png = image("b.png");
        png.mime_type = "IMAGE/PNG".to_string();
        png.size_bytes = 999;
        let mut big = png.clone();
        big.reference = "c.png".to_string();
        big.size_bytes = 1_001;

        assert!(policy.validate(&[pdf, png.clone()]).is_err());
        assert!(policy.validate(&[png.clone(), big]).is_err());
        assert!(policy.validate(&[png.clone(), png.clone()]).is_err());

        let mut other = png.clone();
        other.reference = "d.png".to_string();
        assert_eq!(
            policy.validate(&[png, other]).unwrap(),
            vec!["b.png".to_string(), "d.png".to_string()]
        );
    }

    #[test]
    fn default_policy_accepts_webp_up_to_five_mebibytes() {
        let policy = ProofPolicy::default();
        let mut webp = image("a.webp");
        webp.mime_type = "image/webp".to_string();
        webp.size_bytes = DEFAULT_MAX_PROOF_IMAGE_BYTES;

        assert!(policy.validate(&[webp.clone(), image("b.jpg")]).is_ok());

        webp.size_bytes += 1;
        assert!(policy.validate(&[webp, image("b.jpg")]).is_err());
    }

    #[test]
    fn proof_before_in_transit_is_an_invalid_transition() {
        let (f, _, courier) = assigned();
        let err = complete_delivery(
            &f.order,
            &[image("pod/1.jpg"), image("pod/2.jpg")],
            &ProofPolicy::default(),
            &courier,
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition { .. }));
    }

    #[test]
    fn strangers_are_forbidden_before_images_are_inspected() {
        let (order, _, _) = in_transit();
        let stranger = Principal::courier(ActorId::new());
        let err = complete_delivery(&order, &[], &ProofPolicy::default(), &stranger, Utc::now())
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }
}
