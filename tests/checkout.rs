use chrono::NaiveDate;
use storefront_api::checkout::{
    CardDetails, CheckoutDraft, CheckoutStep, CheckoutWizard, PaymentMethod, ShippingDetails,
    card_brand, luhn_valid, validate_card, validate_shipping,
};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
}

fn shipping() -> ShippingDetails {
    ShippingDetails {
        full_name: "Asha Rao".into(),
        phone: "+91 98765 43210".into(),
        email: Some("asha@example.com".into()),
        address_line1: "12 MG Road".into(),
        address_line2: None,
        city: "Bengaluru".into(),
        state: "Karnataka".into(),
        postal_code: "560001".into(),
    }
}

fn card(number: &str, month: u32, year: i32) -> CardDetails {
    CardDetails {
        number: number.into(),
        holder_name: "Asha Rao".into(),
        expiry_month: month,
        expiry_year: year,
        cvv: "123".into(),
    }
}

#[test]
fn cannot_leave_shipping_without_required_fields() {
    let mut wizard = CheckoutWizard::new(CheckoutDraft::default());
    let errors = wizard.advance(today()).unwrap_err();

    for field in [
        "shipping.full_name",
        "shipping.phone",
        "shipping.address_line1",
        "shipping.city",
        "shipping.state",
        "shipping.postal_code",
    ] {
        assert!(errors.contains(field), "expected error for {field}");
    }
    assert_eq!(wizard.step(), CheckoutStep::Shipping);
}

#[test]
fn walks_forward_and_back() {
    let mut wizard = CheckoutWizard::new(CheckoutDraft {
        shipping: shipping(),
        ..Default::default()
    });
    assert_eq!(wizard.back(), CheckoutStep::Shipping);

    assert_eq!(wizard.advance(today()), Ok(CheckoutStep::Payment));

    let errors = wizard.advance(today()).unwrap_err();
    assert!(errors.contains("payment_method"));
    assert_eq!(wizard.step(), CheckoutStep::Payment);

    wizard.draft_mut().payment_method = Some(PaymentMethod::Cod);
    assert_eq!(wizard.advance(today()), Ok(CheckoutStep::Review));
    assert_eq!(wizard.advance(today()), Ok(CheckoutStep::Review));

    assert_eq!(wizard.back(), CheckoutStep::Payment);
    assert_eq!(wizard.back(), CheckoutStep::Shipping);
    assert_eq!(wizard.back(), CheckoutStep::Shipping);
}

#[test]
fn review_revalidates_edited_shipping() {
    let mut wizard = CheckoutWizard::resume(
        CheckoutStep::Review,
        CheckoutDraft {
            shipping: shipping(),
            payment_method: Some(PaymentMethod::Gateway),
            ..Default::default()
        },
    );
    wizard.draft_mut().shipping.city.clear();
    let errors = wizard.advance(today()).unwrap_err();
    assert!(errors.contains("shipping.city"));
}

#[test]
fn complete_requires_valid_card_for_card_payments() {
    let draft = CheckoutDraft {
        shipping: shipping(),
        payment_method: Some(PaymentMethod::Card),
        card: None,
        notes: None,
    };
    let errors = CheckoutWizard::new(draft.clone()).complete(today()).unwrap_err();
    assert!(errors.contains("card"));

    let draft = CheckoutDraft {
        card: Some(card("4111 1111 1111 1111", 12, 2030)),
        ..draft
    };
    assert!(CheckoutWizard::new(draft).complete(today()).is_ok());
}

#[test]
fn shipping_rejects_malformed_values() {
    let mut details = shipping();
    details.postal_code = "012345".into();
    details.phone = "12345".into();
    details.email = Some("not-an-email".into());
    let errors = validate_shipping(&details);
    assert!(errors.contains("shipping.postal_code"));
    assert!(errors.contains("shipping.phone"));
    assert!(errors.contains("shipping.email"));
    assert!(!errors.contains("shipping.city"));
}

#[test]
fn luhn_and_brand() {
    assert!(luhn_valid("4111111111111111"));
    assert!(!luhn_valid("4111111111111112"));
    assert!(!luhn_valid("4111-1111"));
    assert!(!luhn_valid(""));

    assert_eq!(card_brand("4111111111111111"), "visa");
    assert_eq!(card_brand("5500000000000004"), "mastercard");
    assert_eq!(card_brand("378282246310005"), "amex");
}

#[test]
fn card_summary_keeps_only_last_four() {
    let summary = validate_card(&card("5500-0000-0000-0004", 10, 26), today()).unwrap();
    assert_eq!(summary.brand, "mastercard");
    assert_eq!(summary.last4, "0004");
}

#[test]
fn expired_cards_are_rejected() {
    let errors = validate_card(&card("4111111111111111", 9, 2026), today()).unwrap_err();
    assert!(errors.contains("card.expiry_year"));

    let errors = validate_card(&card("4111111111111111", 13, 2030), today()).unwrap_err();
    assert!(errors.contains("card.expiry_month"));
}

#[test]
fn steps_deserialize_from_numbers_only_in_range() {
    let step: CheckoutStep = serde_json::from_str("2").unwrap();
    assert_eq!(step, CheckoutStep::Payment);
    assert!(serde_json::from_str::<CheckoutStep>("0").is_err());
    assert!(serde_json::from_str::<CheckoutStep>("4").is_err());
}
