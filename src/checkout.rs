//! Three-step checkout wizard: shipping details, payment method, review.
//!
//! The wizard only moves forward once the current step validates; errors are
//! reported per field so the client can render them next to the inputs.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::ValidateEmail;

use crate::{error::FieldErrors, phone::normalize_phone};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum CheckoutStep {
    Shipping = 1,
    Payment = 2,
    Review = 3,
}

impl From<CheckoutStep> for u8 {
    fn from(step: CheckoutStep) -> u8 {
        step as u8
    }
}

impl TryFrom<u8> for CheckoutStep {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(CheckoutStep::Shipping),
            2 => Ok(CheckoutStep::Payment),
            3 => Ok(CheckoutStep::Review),
            other => Err(format!("checkout step must be 1, 2 or 3, got {other}")),
        }
    }
}

impl CheckoutStep {
    fn next(self) -> Option<Self> {
        match self {
            CheckoutStep::Shipping => Some(CheckoutStep::Payment),
            CheckoutStep::Payment => Some(CheckoutStep::Review),
            CheckoutStep::Review => None,
        }
    }

    fn prev(self) -> Self {
        match self {
            CheckoutStep::Shipping | CheckoutStep::Payment => CheckoutStep::Shipping,
            CheckoutStep::Review => CheckoutStep::Payment,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Hosted gateway checkout widget.
    Gateway,
    /// Cash on delivery.
    Cod,
    /// Manually entered card.
    Card,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Gateway => "gateway",
            PaymentMethod::Cod => "cod",
            PaymentMethod::Card => "card",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct ShippingDetails {
    pub full_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct CardDetails {
    pub number: String,
    pub holder_name: String,
    pub expiry_month: u32,
    pub expiry_year: i32,
    pub cvv: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct CheckoutDraft {
    pub shipping: ShippingDetails,
    pub payment_method: Option<PaymentMethod>,
    pub card: Option<CardDetails>,
    pub notes: Option<String>,
}

/// What is kept of a card once validated; the number itself is never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CardSummary {
    pub brand: String,
    pub last4: String,
}

#[derive(Debug, Clone)]
pub struct CheckoutWizard {
    step: CheckoutStep,
    draft: CheckoutDraft,
}

impl CheckoutWizard {
    pub fn new(draft: CheckoutDraft) -> Self {
        Self {
            step: CheckoutStep::Shipping,
            draft,
        }
    }

    /// Pick the wizard back up at a step the client is already on.
    pub fn resume(step: CheckoutStep, draft: CheckoutDraft) -> Self {
        Self { step, draft }
    }

    pub fn step(&self) -> CheckoutStep {
        self.step
    }

    pub fn draft(&self) -> &CheckoutDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut CheckoutDraft {
        &mut self.draft
    }

    /// Move to the next step if the current one validates. On the review step
    /// this re-validates everything and stays put.
    pub fn advance(&mut self, today: NaiveDate) -> Result<CheckoutStep, FieldErrors> {
        let errors = validate_step(self.step, &self.draft, today);
        if !errors.is_empty() {
            return Err(errors);
        }
        if let Some(next) = self.step.next() {
            self.step = next;
        }
        Ok(self.step)
    }

    pub fn back(&mut self) -> CheckoutStep {
        self.step = self.step.prev();
        self.step
    }

    /// Run every step in order; the first failing step stops the wizard.
    pub fn complete(mut self, today: NaiveDate) -> Result<CheckoutDraft, FieldErrors> {
        while self.step != CheckoutStep::Review {
            self.advance(today)?;
        }
        self.advance(today)?;
        Ok(self.draft)
    }
}

/// Errors that block leaving `step`. The review step checks all earlier steps.
pub fn validate_step(step: CheckoutStep, draft: &CheckoutDraft, today: NaiveDate) -> FieldErrors {
    match step {
        CheckoutStep::Shipping => validate_shipping(&draft.shipping),
        CheckoutStep::Payment => validate_payment(draft, today),
        CheckoutStep::Review => {
            let mut errors = validate_shipping(&draft.shipping);
            errors.merge(validate_payment(draft, today));
            errors
        }
    }
}

pub fn validate_shipping(shipping: &ShippingDetails) -> FieldErrors {
    let mut errors = FieldErrors::new();
    let required = [
        ("shipping.full_name", &shipping.full_name),
        ("shipping.address_line1", &shipping.address_line1),
        ("shipping.city", &shipping.city),
        ("shipping.state", &shipping.state),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            errors.add(field, "is required");
        }
    }

    if shipping.phone.trim().is_empty() {
        errors.add("shipping.phone", "is required");
    } else if let Err(err) = normalize_phone(&shipping.phone) {
        errors.add("shipping.phone", err.to_string());
    }

    let pin = shipping.postal_code.trim();
    if pin.is_empty() {
        errors.add("shipping.postal_code", "is required");
    } else if pin.len() != 6 || !pin.bytes().all(|b| b.is_ascii_digit()) || pin.starts_with('0') {
        errors.add("shipping.postal_code", "must be a 6-digit PIN code");
    }

    if let Some(email) = shipping.email.as_deref().filter(|e| !e.trim().is_empty()) {
        if !email.validate_email() {
            errors.add("shipping.email", "is not a valid email address");
        }
    }
    errors
}

pub fn validate_payment(draft: &CheckoutDraft, today: NaiveDate) -> FieldErrors {
    let mut errors = FieldErrors::new();
    match draft.payment_method {
        None => errors.add("payment_method", "is required"),
        Some(PaymentMethod::Card) => match &draft.card {
            None => errors.add("card", "card details are required"),
            Some(card) => {
                if let Err(card_errors) = validate_card(card, today) {
                    errors = card_errors;
                }
            }
        },
        Some(PaymentMethod::Gateway | PaymentMethod::Cod) => {}
    }
    errors
}

pub fn validate_card(card: &CardDetails, today: NaiveDate) -> Result<CardSummary, FieldErrors> {
    let mut errors = FieldErrors::new();
    let number: String = card.number.chars().filter(|c| !c.is_whitespace() && *c != '-').collect();

    if !(12..=19).contains(&number.len()) || !luhn_valid(&number) {
        errors.add("card.number", "is not a valid card number");
    }
    if card.holder_name.trim().is_empty() {
        errors.add("card.holder_name", "is required");
    }

    let year = if card.expiry_year < 100 {
        card.expiry_year + 2000
    } else {
        card.expiry_year
    };
    if !(1..=12).contains(&card.expiry_month) {
        errors.add("card.expiry_month", "must be between 1 and 12");
    } else if (year, card.expiry_month) < (today.year(), today.month()) {
        errors.add("card.expiry_year", "card has expired");
    }

    let cvv = card.cvv.trim();
    if !(3..=4).contains(&cvv.len()) || !cvv.bytes().all(|b| b.is_ascii_digit()) {
        errors.add("card.cvv", "must be 3 or 4 digits");
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(CardSummary {
        brand: card_brand(&number).to_string(),
        last4: number[number.len() - 4..].to_string(),
    })
}

/// Luhn checksum over an all-digit string.
pub fn luhn_valid(number: &str) -> bool {
    if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    let sum: u32 = number
        .bytes()
        .rev()
        .enumerate()
        .map(|(i, b)| {
            let d = u32::from(b - b'0');
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}

pub fn card_brand(number: &str) -> &'static str {
    let prefix2: u32 = number.get(..2).and_then(|p| p.parse().ok()).unwrap_or(0);
    let prefix4: u32 = number.get(..4).and_then(|p| p.parse().ok()).unwrap_or(0);
    if number.starts_with('4') {
        "visa"
    } else if (51..=55).contains(&prefix2) || (2221..=2720).contains(&prefix4) {
        "mastercard"
    } else if prefix2 == 34 || prefix2 == 37 {
        "amex"
    } else if matches!(prefix2, 60 | 65 | 81 | 82) || number.starts_with("508") {
        "rupay"
    } else {
        "card"
    }
}
