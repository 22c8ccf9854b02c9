use chrono::{DateTime, FixedOffset};
use chrono_tz::Tz;
use core_model::{AuditFields, Auditable, Localize, Trashed, now_utc};
use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

/// ISO-4217 alphabetic code
static CURRENCY_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Z]{3}$").unwrap());

pub const PRICE_PLACEHOLDER: &str = "{price}";

fn positive_rate(rate: &Decimal) -> Result<(), ValidationError> {
    if *rate > Decimal::ZERO {
        Ok(())
    } else {
        Err(ValidationError::new("exchange_rate_not_positive"))
    }
}

fn price_template(format: &str) -> Result<(), ValidationError> {
    if format.contains(PRICE_PLACEHOLDER) {
        Ok(())
    } else {
        Err(ValidationError::new("format_missing_price_placeholder"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Currency {
    #[serde(skip)]
    pub key: i64,
    /// Hashed id
    pub id: String,
    #[schema(example = "GBP")]
    pub code: String,
    pub name: String,
    pub enabled: bool,
    /// Rate against the base pricing unit
    #[schema(value_type = String, example = "8.7260")]
    pub exchange_rate: Decimal,
    /// Display template containing `{price}`
    #[schema(example = "&#xa3;{price}")]
    pub format: String,
    pub decimal_point: String,
    pub thousand_point: String,
    pub default: bool,
    #[serde(flatten)]
    pub audit: AuditFields,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
    pub deleted_at: Option<DateTime<FixedOffset>>,
}

impl Currency {
    pub fn is_trashed(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn touch(&mut self) {
        self.updated_at = now_utc();
    }

    /// Render `amount` with two decimals, this currency's separators and template
    pub fn format_amount(&self, amount: Decimal) -> String {
        let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let digits = format!("{:.2}", rounded.abs());
        let (whole, fraction) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));

        let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };
        let price = format!(
            "{}{}{}{}",
            sign,
            group_thousands(whole, &self.thousand_point),
            self.decimal_point,
            fraction
        );
        self.format.replace(PRICE_PLACEHOLDER, &price)
    }

    pub fn apply_update(&mut self, update: UpdateCurrency) {
        if let Some(code) = update.code {
            self.code = code;
        }
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(enabled) = update.enabled {
            self.enabled = enabled;
        }
        if let Some(rate) = update.exchange_rate {
            self.exchange_rate = rate;
        }
        if let Some(format) = update.format {
            self.format = format;
        }
        if let Some(point) = update.decimal_point {
            self.decimal_point = point;
        }
        if let Some(point) = update.thousand_point {
            self.thousand_point = point;
        }
        self.touch();
    }
}

fn group_thousands(digits: &str, separator: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 * separator.len());
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push_str(separator);
        }
        grouped.push(ch);
    }
    grouped
}

impl Auditable for Currency {
    fn audit(&self) -> &AuditFields {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut AuditFields {
        &mut self.audit
    }
}

impl Localize for Currency {
    fn localize(mut self, tz: &Tz) -> Self {
        self.created_at = self.created_at.localize(tz);
        self.updated_at = self.updated_at.localize(tz);
        self.deleted_at = self.deleted_at.localize(tz);
        self
    }
}

fn default_true() -> bool {
    true
}

fn default_decimal_point() -> String {
    ".".to_string()
}

fn default_thousand_point() -> String {
    ",".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateCurrency {
    #[validate(regex(path = *CURRENCY_CODE))]
    pub code: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[validate(custom(function = "positive_rate"))]
    #[schema(value_type = String)]
    pub exchange_rate: Decimal,
    #[validate(length(min = 1, max = 100), custom(function = "price_template"))]
    pub format: String,
    #[serde(default = "default_decimal_point")]
    #[validate(length(max = 4))]
    pub decimal_point: String,
    #[serde(default = "default_thousand_point")]
    #[validate(length(max = 4))]
    pub thousand_point: String,
    /// Becomes the only default currency when set
    #[serde(default)]
    pub default: bool,
}

impl CreateCurrency {
    /// The currencies every fresh installation starts with
    pub fn seed() -> Vec<CreateCurrency> {
        [
            ("GBP", "British Pound", Decimal::new(10, 0), "&#xa3;{price}", true),
            ("EUR", "Euro", Decimal::new(87260, 4), "&euro;{price}", false),
            ("USD", "US Dollars", Decimal::new(71, 1), "&euro;{price}", false),
        ]
        .into_iter()
        .map(|(code, name, exchange_rate, format, default)| CreateCurrency {
            code: code.to_string(),
            name: name.to_string(),
            enabled: true,
            exchange_rate,
            format: format.to_string(),
            decimal_point: default_decimal_point(),
            thousand_point: default_thousand_point(),
            default,
        })
        .collect()
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateCurrency {
    #[validate(regex(path = *CURRENCY_CODE))]
    pub code: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub enabled: Option<bool>,
    #[validate(custom(function = "positive_rate"))]
    #[schema(value_type = Option<String>)]
    pub exchange_rate: Option<Decimal>,
    #[validate(length(min = 1, max = 100), custom(function = "price_template"))]
    pub format: Option<String>,
    #[validate(length(max = 4))]
    pub decimal_point: Option<String>,
    #[validate(length(max = 4))]
    pub thousand_point: Option<String>,
}

/// Query string of `GET /currencies`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, IntoParams, ToSchema)]
pub struct CurrencyFilter {
    /// Only enabled (`true`) or disabled (`false`) currencies
    pub enabled: Option<bool>,
    #[serde(default)]
    pub trashed: Trashed,
}

#[derive(Debug, Clone, Copy, Deserialize, IntoParams, ToSchema)]
pub struct FormatQuery {
    #[param(value_type = String, example = "1234.5")]
    #[schema(value_type = String)]
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FormattedPrice {
    pub code: String,
    #[schema(value_type = String)]
    pub amount: Decimal,
    pub formatted: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn currency(format: &str, decimal_point: &str, thousand_point: &str) -> Currency {
        Currency {
            key: 1,
            id: "x".to_string(),
            code: "GBP".to_string(),
            name: "British Pound".to_string(),
            enabled: true,
            exchange_rate: Decimal::ONE,
            format: format.to_string(),
            decimal_point: decimal_point.to_string(),
            thousand_point: thousand_point.to_string(),
            default: true,
            audit: AuditFields::default(),
            created_at: now_utc(),
            updated_at: now_utc(),
            deleted_at: None,
        }
    }

    #[test]
    fn formats_with_template_and_separators() {
        let gbp = currency("&#xa3;{price}", ".", ",");
        assert_eq!(gbp.format_amount(Decimal::new(1234567, 1)), "&#xa3;123,456.70");
        assert_eq!(gbp.format_amount(Decimal::new(5, 0)), "&#xa3;5.00");
        assert_eq!(gbp.format_amount(Decimal::new(999, 0)), "&#xa3;999.00");

        let eur = currency("{price} EUR", ",", ".");
        assert_eq!(eur.format_amount(Decimal::new(100000025, 4)), "10.000,00 EUR");
    }

    #[test]
    fn rounds_half_away_from_zero() {
        let gbp = currency("{price}", ".", ",");
        assert_eq!(gbp.format_amount(Decimal::new(1005, 3)), "1.01");
        assert_eq!(gbp.format_amount(Decimal::new(-12345, 1)), "-1,234.50");
        assert_eq!(gbp.format_amount(Decimal::new(-1, 3)), "0.00");
    }

    #[test]
    fn create_rules() {
        let mut input = CreateCurrency::seed().remove(0);
        assert!(input.validate().is_ok());

        input.code = "gbp".to_string();
        assert!(input.validate().is_err());

        let mut input = CreateCurrency::seed().remove(1);
        input.exchange_rate = Decimal::ZERO;
        assert!(input.validate().is_err());

        let mut input = CreateCurrency::seed().remove(2);
        input.format = "$".to_string();
        assert!(input.validate().is_err());
    }

    #[test]
    fn seed_matches_installation_defaults() {
        let seed = CreateCurrency::seed();
        let codes: Vec<&str> = seed.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, vec!["GBP", "EUR", "USD"]);
        assert_eq!(seed[1].exchange_rate.to_string(), "8.7260");
        assert_eq!(seed[2].format, "&euro;{price}");
        assert_eq!(seed.iter().filter(|c| c.default).count(), 1);
    }

    #[test]
    fn exchange_rate_serializes_as_string() {
        let json = serde_json::to_value(currency("{price}", ".", ",")).unwrap();
        assert_eq!(json["exchange_rate"], "1");
        assert!(json.get("key").is_none());
    }
}
