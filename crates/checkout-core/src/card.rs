//! Card Checks
//!
//! Pure validators run before a payment request leaves the client, plus the
//! masking used when orders are displayed.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CheckoutError, Result};
use crate::model::{OrderId, PaymentRequest};

/// Card network, detected from the leading digits
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardBrand {
    Visa,
    Mastercard,
    AmericanExpress,
    Discover,
    Unknown,
}

impl CardBrand {
    pub const fn cvv_len(self) -> usize {
        match self {
            Self::AmericanExpress => 4,
            _ => 3,
        }
    }
}

fn digits(input: &str) -> String {
    input.chars().filter(char::is_ascii_digit).collect()
}

/// Luhn checksum over 13–19 digits; spaces and dashes are ignored
pub fn validate_luhn(card_number: &str) -> bool {
    let cleaned: String = card_number
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();

    if !cleaned.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    if !(13..=19).contains(&cleaned.len()) {
        return false;
    }

    let sum: u32 = cleaned
        .bytes()
        .rev()
        .enumerate()
        .map(|(i, b)| {
            let digit = u32::from(b - b'0');
            if i % 2 == 1 {
                let doubled = digit * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                digit
            }
        })
        .sum();

    sum % 10 == 0
}

pub fn card_brand(card_number: &str) -> CardBrand {
    let d = digits(card_number);
    let bytes = d.as_bytes();
    match bytes {
        [b'4', ..] => CardBrand::Visa,
        [b'5', b'1'..=b'5', ..] => CardBrand::Mastercard,
        [b'3', b'4' | b'7', ..] => CardBrand::AmericanExpress,
        [b'6', b'0', b'1', b'1', ..] | [b'6', b'5', ..] => CardBrand::Discover,
        _ => CardBrand::Unknown,
    }
}

/// Card is usable through the last day of its expiry month
///
/// `year` may be two-digit (`29`) or four-digit (`2029`).
pub fn validate_expiry(month: &str, year: &str, today: NaiveDate) -> bool {
    let Ok(month) = month.trim().parse::<u32>() else {
        return false;
    };
    let Ok(mut year) = year.trim().parse::<i32>() else {
        return false;
    };
    if !(1..=12).contains(&month) {
        return false;
    }
    if year < 100 {
        year += 2000;
    }

    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(start_of_next_month)
        .is_some_and(|first_of_next| first_of_next > today)
}

pub fn validate_cvv(cvv: &str, brand: CardBrand) -> bool {
    digits(cvv).len() == brand.cvv_len()
}

/// `**** **** **** 1234`
pub fn mask_card_number(card_number: &str) -> String {
    let d = digits(card_number);
    if d.is_empty() {
        return String::new();
    }
    let last_four = &d[d.len().saturating_sub(4)..];
    format!("**** **** **** {last_four}")
}

pub fn mask_cvv(cvv: &str) -> String {
    "•".repeat(cvv.chars().count())
}

/// `MM/YY` with the month zero-padded
pub fn format_expiry(month: &str, year: &str) -> String {
    format!("{:0>2}/{}", month.trim(), year.trim())
}

/// Card details as entered on the server-to-server checkout form
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentForm {
    pub card_holder_name: String,
    pub card_number: String,
    pub expiry_month: String,
    pub expiry_year: String,
    #[serde(rename = "cardCVC")]
    pub card_cvc: String,
    pub amount: String,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    "USD".into()
}

/// Supported currencies (code, name)
pub const CURRENCIES: &[(&str, &str)] = &[
    ("USD", "US Dollar"),
    ("EUR", "Euro"),
    ("GBP", "British Pound"),
    ("JPY", "Japanese Yen"),
    ("CAD", "Canadian Dollar"),
    ("AUD", "Australian Dollar"),
];

impl PaymentForm {
    /// Collect per-field errors; empty map means the form is valid
    pub fn validate(&self, today: NaiveDate) -> BTreeMap<&'static str, String> {
        let mut errors = BTreeMap::new();

        if self.card_holder_name.trim().is_empty() {
            errors.insert("cardHolderName", "Cardholder name is required".into());
        }

        if self.card_number.trim().is_empty() {
            errors.insert("cardNumber", "Card number is required".into());
        } else if !validate_luhn(&self.card_number) {
            errors.insert("cardNumber", "Invalid card number".into());
        }

        if self.expiry_month.trim().is_empty() || self.expiry_year.trim().is_empty() {
            errors.insert("expiry", "Expiry date is required".into());
        } else if !validate_expiry(&self.expiry_month, &self.expiry_year, today) {
            errors.insert("expiry", "Card has expired or date is invalid".into());
        }

        if !validate_cvv(&self.card_cvc, card_brand(&self.card_number)) {
            errors.insert("cardCVC", "Invalid CVV".into());
        }

        let amount = self.amount.trim();
        if amount.is_empty() {
            errors.insert("amount", "Amount is required".into());
        } else if !matches!(amount.parse::<Decimal>(), Ok(a) if a > Decimal::ZERO) {
            errors.insert("amount", "Enter a valid amount".into());
        }

        if !CURRENCIES.iter().any(|(code, _)| *code == self.currency) {
            errors.insert("currency", format!("Unsupported currency {}", self.currency));
        }

        errors
    }

    /// Validate and build the request body for the initiation endpoint
    pub fn into_request(self, order_id: OrderId, today: NaiveDate) -> Result<PaymentRequest> {
        let errors = self.validate(today);
        if let Some((field, msg)) = errors.into_iter().next() {
            return Err(CheckoutError::Validation(format!("{field}: {msg}")));
        }

        let amount = self
            .amount
            .trim()
            .parse::<Decimal>()
            .map_err(|e| CheckoutError::Validation(e.to_string()))?;

        Ok(PaymentRequest {
            order_id,
            card_holder_name: self.card_holder_name.trim().to_string(),
            card_number: digits(&self.card_number),
            expiry_month: self.expiry_month.trim().to_string(),
            expiry_year: self.expiry_year.trim().to_string(),
            card_cvc: digits(&self.card_cvc),
            amount,
            currency: self.currency,
        })
    }
}

/// Current UTC date, the reference for expiry checks
pub fn today() -> NaiveDate {
    chrono::Utc::now().date_naive()
}

fn start_of_next_month(date: NaiveDate) -> Option<NaiveDate> {
    let (y, m) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(y, m, 1)
}
