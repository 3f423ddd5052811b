use storefront_api::phone::{PhoneError, mask_phone, normalize_phone};

#[test]
fn accepts_common_indian_formats() {
    for raw in [
        "9876543210",
        "98765 43210",
        "+91 98765-43210",
        "(0)98765 43210",
        "919876543210",
        " +919876543210 ",
    ] {
        assert_eq!(normalize_phone(raw).as_deref(), Ok("+919876543210"), "{raw}");
    }
}

#[test]
fn rejects_invalid_numbers() {
    assert_eq!(normalize_phone("98765abc10"), Err(PhoneError::InvalidCharacters));
    assert_eq!(normalize_phone("+9876543210"), Err(PhoneError::InvalidLength));
    assert_eq!(normalize_phone("12345"), Err(PhoneError::InvalidLength));
    assert_eq!(normalize_phone("5876543210"), Err(PhoneError::InvalidPrefix));
}

#[test]
fn normalizing_twice_is_stable() {
    let once = normalize_phone("098765 43210").unwrap();
    assert_eq!(normalize_phone(&once).unwrap(), once);
}

#[test]
fn masks_all_but_country_code_and_last_four() {
    assert_eq!(mask_phone("+919876543210"), "+91******3210");
}
