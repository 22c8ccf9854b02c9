use chrono::{DateTime, FixedOffset};
use chrono_tz::Tz;
use core_model::{AuditFields, Auditable, Localize, now_utc};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

static CURRENCY_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Z]{3}$").unwrap());

pub const MAX_LINE_QUANTITY: u32 = 10_000;

fn non_negative(price: &Decimal) -> Result<(), ValidationError> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(ValidationError::new("unit_price_negative"));
    }
    Ok(())
}

/// One purchasable variant in a basket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BasketLine {
    /// Variant reference, e.g. a SKU
    pub variant: String,
    pub quantity: u32,
    #[schema(value_type = String, example = "12.50")]
    pub unit_price: Decimal,
}

fn add_to(lines: &mut Vec<BasketLine>, variant: &str, quantity: u32, unit_price: Decimal) {
    match lines.iter_mut().find(|l| l.variant == variant) {
        Some(line) => {
            line.quantity = line.quantity.saturating_add(quantity).min(MAX_LINE_QUANTITY);
            line.unit_price = unit_price;
        }
        None => lines.push(BasketLine {
            variant: variant.to_string(),
            quantity: quantity.min(MAX_LINE_QUANTITY),
            unit_price,
        }),
    }
}

impl BasketLine {
    pub fn total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Basket {
    #[serde(skip)]
    pub key: i64,
    /// Hashed id
    pub id: String,
    /// Owner; `None` for guest baskets
    pub user_id: Option<i64>,
    #[schema(example = "GBP")]
    pub currency: String,
    pub lines: Vec<BasketLine>,
    /// Sum of the line totals
    #[schema(value_type = String)]
    pub total: Decimal,
    #[serde(skip)]
    pub merged_key: Option<i64>,
    /// Hashed id of the basket this one was merged into
    pub merged_id: Option<String>,
    #[serde(flatten)]
    pub audit: AuditFields,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
    pub deleted_at: Option<DateTime<FixedOffset>>,
}

impl Basket {
    pub fn is_trashed(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn touch(&mut self) {
        self.updated_at = now_utc();
    }

    /// Guest baskets are reachable by anyone holding the id, owned ones by their owner only
    pub fn is_visible_to(&self, user_id: Option<i64>) -> bool {
        self.user_id.is_none() || self.user_id == user_id
    }

    pub fn recalculate(&mut self) {
        self.total = self.lines.iter().map(BasketLine::total).sum();
    }

    /// Add `quantity` of a variant; an existing line keeps its position and takes the new price
    pub fn add_line(&mut self, variant: &str, quantity: u32, unit_price: Decimal) {
        add_to(&mut self.lines, variant, quantity, unit_price);
        self.recalculate();
    }

    /// Set the quantity of a variant; zero removes the line
    pub fn set_line(&mut self, variant: &str, quantity: u32, unit_price: Decimal) {
        if quantity == 0 {
            self.lines.retain(|l| l.variant != variant);
        } else {
            match self.lines.iter_mut().find(|l| l.variant == variant) {
                Some(line) => {
                    line.quantity = quantity;
                    line.unit_price = unit_price;
                }
                None => self.lines.push(BasketLine {
                    variant: variant.to_string(),
                    quantity,
                    unit_price,
                }),
            }
        }
        self.recalculate();
    }

    /// Fold the lines of `guest` into this basket, summing quantities per variant.
    ///
    /// Variants already present keep this basket's unit price.
    pub fn absorb(&mut self, guest: &Basket) {
        for incoming in &guest.lines {
            match self.lines.iter_mut().find(|l| l.variant == incoming.variant) {
                Some(line) => {
                    line.quantity = line
                        .quantity
                        .saturating_add(incoming.quantity)
                        .min(MAX_LINE_QUANTITY);
                }
                None => self.lines.push(incoming.clone()),
            }
        }
        self.recalculate();
    }
}

impl Auditable for Basket {
    fn audit(&self) -> &AuditFields {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut AuditFields {
        &mut self.audit
    }
}

impl Localize for Basket {
    fn localize(mut self, tz: &Tz) -> Self {
        self.created_at = self.created_at.localize(tz);
        self.updated_at = self.updated_at.localize(tz);
        self.deleted_at = self.deleted_at.localize(tz);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Validate, ToSchema)]
pub struct AddLine {
    #[validate(length(min = 1, max = 255))]
    pub variant: String,
    #[validate(range(min = 1, max = 10000))]
    pub quantity: u32,
    #[validate(custom(function = "non_negative"))]
    #[schema(value_type = String, example = "12.50")]
    pub unit_price: Decimal,
}

/// Absolute quantity for a variant; `0` removes the line
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Validate, ToSchema)]
pub struct SetLine {
    #[validate(length(min = 1, max = 255))]
    pub variant: String,
    #[validate(range(max = 10000))]
    pub quantity: u32,
    #[validate(custom(function = "non_negative"))]
    #[schema(value_type = String, example = "12.50")]
    pub unit_price: Decimal,
}

/// A change to one basket line, applied under the basket's write lock
#[derive(Debug, Clone, PartialEq)]
pub enum LineEdit {
    Add(AddLine),
    Set(SetLine),
}

impl LineEdit {
    pub fn variant(&self) -> &str {
        match self {
            LineEdit::Add(line) => &line.variant,
            LineEdit::Set(line) => &line.variant,
        }
    }

    pub fn apply(&self, basket: &mut Basket) {
        match self {
            LineEdit::Add(line) => basket.add_line(&line.variant, line.quantity, line.unit_price),
            LineEdit::Set(line) => basket.set_line(&line.variant, line.quantity, line.unit_price),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateBasket {
    #[validate(regex(path = *CURRENCY_CODE))]
    #[schema(example = "GBP")]
    pub currency: String,
    #[serde(default)]
    #[validate(nested)]
    pub lines: Vec<AddLine>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct MergeBaskets {
    /// Hashed id of the guest basket to fold in
    #[validate(length(min = 1))]
    pub basket_id: String,
}

/// Row data for a new basket
#[derive(Debug, Clone, PartialEq)]
pub struct NewBasket {
    pub user_id: Option<i64>,
    pub currency: String,
    pub lines: Vec<BasketLine>,
}

impl NewBasket {
    /// Lines of the request with repeated variants collapsed
    pub fn from_request(user_id: Option<i64>, input: CreateBasket) -> Self {
        let mut lines = Vec::new();
        for line in input.lines {
            add_to(&mut lines, &line.variant, line.quantity, line.unit_price);
        }
        NewBasket {
            user_id,
            currency: input.currency,
            lines,
        }
    }
}

impl From<NewBasket> for Basket {
    fn from(new: NewBasket) -> Self {
        let now = now_utc();
        let mut basket = Basket {
            key: 0,
            id: String::new(),
            user_id: new.user_id,
            currency: new.currency,
            lines: new.lines,
            total: Decimal::ZERO,
            merged_key: None,
            merged_id: None,
            audit: AuditFields::default(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        basket.recalculate();
        basket
    }
}

/// A basket kept under a name for later
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SavedBasket {
    #[serde(skip)]
    pub key: i64,
    /// Hashed id
    pub id: String,
    #[serde(skip)]
    pub basket_key: i64,
    /// Hashed id of the basket
    pub basket_id: String,
    pub name: String,
    pub user_id: i64,
    #[serde(flatten)]
    pub audit: AuditFields,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
    pub deleted_at: Option<DateTime<FixedOffset>>,
}

impl SavedBasket {
    pub fn touch(&mut self) {
        self.updated_at = now_utc();
    }
}

impl Auditable for SavedBasket {
    fn audit(&self) -> &AuditFields {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut AuditFields {
        &mut self.audit
    }
}

impl Localize for SavedBasket {
    fn localize(mut self, tz: &Tz) -> Self {
        self.created_at = self.created_at.localize(tz);
        self.updated_at = self.updated_at.localize(tz);
        self.deleted_at = self.deleted_at.localize(tz);
        self
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateSavedBasket {
    /// Hashed id of a basket owned by the acting user
    #[validate(length(min = 1))]
    pub basket_id: String,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateSavedBasket {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
}
