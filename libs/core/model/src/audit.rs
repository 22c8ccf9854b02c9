use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::context::RequestContext;
use crate::lifecycle::SaveOp;

const CREATED_BY: u8 = 0b0001;
const CREATED_IP: u8 = 0b0010;
const UPDATED_BY: u8 = 0b0100;
const UPDATED_IP: u8 = 0b1000;

/// Creator / updater columns carried by every persisted entity.
///
/// Values assigned through the `set_*` methods count as explicit for the next
/// save and are left untouched by [`AuditFields::stamp`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct AuditFields {
    pub created_by: Option<i64>,
    pub created_ip: Option<String>,
    pub updated_by: Option<i64>,
    pub updated_ip: Option<String>,
    #[serde(skip)]
    explicit: u8,
}

impl PartialEq for AuditFields {
    fn eq(&self, other: &Self) -> bool {
        self.created_by == other.created_by
            && self.created_ip == other.created_ip
            && self.updated_by == other.updated_by
            && self.updated_ip == other.updated_ip
    }
}

impl Eq for AuditFields {}

impl AuditFields {
    /// Rebuild from stored columns. Nothing is marked explicit.
    pub fn from_columns(
        created_by: Option<i64>,
        created_ip: Option<String>,
        updated_by: Option<i64>,
        updated_ip: Option<String>,
    ) -> Self {
        Self {
            created_by,
            created_ip,
            updated_by,
            updated_ip,
            explicit: 0,
        }
    }

    pub fn set_created_by(&mut self, user_id: Option<i64>) {
        self.created_by = user_id;
        self.explicit |= CREATED_BY;
    }

    pub fn set_created_ip(&mut self, ip: Option<String>) {
        self.created_ip = ip;
        self.explicit |= CREATED_IP;
    }

    pub fn set_updated_by(&mut self, user_id: Option<i64>) {
        self.updated_by = user_id;
        self.explicit |= UPDATED_BY;
    }

    pub fn set_updated_ip(&mut self, ip: Option<String>) {
        self.updated_ip = ip;
        self.explicit |= UPDATED_IP;
    }

    fn is_explicit(&self, flag: u8) -> bool {
        self.explicit & flag != 0
    }

    /// Fill audit columns from the request context for one save.
    ///
    /// `updated_*` is stamped on every save, `created_*` only on create, and
    /// explicitly assigned fields are kept. User ids are only written when the
    /// context carries a user. Explicit marks are cleared afterwards.
    pub fn stamp(&mut self, ctx: &RequestContext, op: SaveOp) {
        if let Some(ip) = ctx.ip.as_ref() {
            if !self.is_explicit(UPDATED_IP) {
                self.updated_ip = Some(ip.clone());
            }
            if op == SaveOp::Create && !self.is_explicit(CREATED_IP) {
                self.created_ip = Some(ip.clone());
            }
        }

        if let Some(user_id) = ctx.user_id {
            if !self.is_explicit(UPDATED_BY) {
                self.updated_by = Some(user_id);
            }
            if op == SaveOp::Create && !self.is_explicit(CREATED_BY) {
                self.created_by = Some(user_id);
            }
        }

        self.explicit = 0;
    }
}

/// Models exposing their audit columns to the lifecycle hooks
pub trait Auditable {
    fn audit(&self) -> &AuditFields;
    fn audit_mut(&mut self) -> &mut AuditFields;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> RequestContext {
        RequestContext::default().with_user(7).with_ip("10.0.0.1")
    }

    #[test]
    fn create_stamps_creator_and_updater() {
        let mut audit = AuditFields::default();
        audit.stamp(&ctx(), SaveOp::Create);

        assert_eq!(audit.created_by, Some(7));
        assert_eq!(audit.created_ip.as_deref(), Some("10.0.0.1"));
        assert_eq!(audit.updated_by, Some(7));
        assert_eq!(audit.updated_ip.as_deref(), Some("10.0.0.1"));
    }

    #[test]
    fn update_keeps_original_creator() {
        let mut audit = AuditFields::from_columns(Some(1), Some("1.1.1.1".into()), Some(1), None);
        audit.stamp(&ctx(), SaveOp::Update);

        assert_eq!(audit.created_by, Some(1));
        assert_eq!(audit.created_ip.as_deref(), Some("1.1.1.1"));
        assert_eq!(audit.updated_by, Some(7));
        assert_eq!(audit.updated_ip.as_deref(), Some("10.0.0.1"));
    }

    #[test]
    fn explicit_values_survive_stamping_once() {
        let mut audit = AuditFields::default();
        audit.set_created_by(Some(99));
        audit.set_updated_ip(Some("192.168.0.9".into()));
        audit.stamp(&ctx(), SaveOp::Create);

        assert_eq!(audit.created_by, Some(99));
        assert_eq!(audit.updated_ip.as_deref(), Some("192.168.0.9"));
        assert_eq!(audit.updated_by, Some(7));

        // marks are consumed by the save
        audit.stamp(&ctx(), SaveOp::Update);
        assert_eq!(audit.updated_ip.as_deref(), Some("10.0.0.1"));
    }

    #[test]
    fn anonymous_context_leaves_user_columns_alone() {
        let mut audit = AuditFields::from_columns(Some(3), None, Some(3), None);
        let ctx = RequestContext::default().with_ip("10.0.0.2");
        audit.stamp(&ctx, SaveOp::Update);

        assert_eq!(audit.updated_by, Some(3));
        assert_eq!(audit.updated_ip.as_deref(), Some("10.0.0.2"));
    }

    #[test]
    fn explicit_marks_are_not_serialized() {
        let mut audit = AuditFields::default();
        audit.set_created_by(Some(5));
        let json = serde_json::to_value(&audit).unwrap();
        assert_eq!(json["created_by"], 5);
        assert!(json.get("explicit").is_none());
    }
}
