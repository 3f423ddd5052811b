use storefront_api::pricing::{
    CartLine, CartTotals, PricingError, PricingPolicy, StockFlags, discount_percent, tax_on,
};

fn line(unit_price: i64, quantity: i32) -> CartLine {
    CartLine {
        unit_price,
        quantity,
    }
}

#[test]
fn totals_add_shipping_and_tax_below_threshold() {
    let policy = PricingPolicy::default();
    let totals = CartTotals::compute(&[line(20_000, 2), line(5_000, 1)], &policy).unwrap();

    assert_eq!(totals.item_count, 3);
    assert_eq!(totals.subtotal, 45_000);
    assert_eq!(totals.shipping, 4_900);
    assert_eq!(totals.tax, 8_100);
    assert_eq!(totals.total, 45_000 + 4_900 + 8_100);
    assert!(!totals.free_shipping);
    assert_eq!(totals.amount_to_free_shipping, 5_001);
}

#[test]
fn free_shipping_only_strictly_above_threshold() {
    let policy = PricingPolicy::default();

    let at = CartTotals::compute(&[line(policy.free_shipping_threshold, 1)], &policy).unwrap();
    assert!(!at.free_shipping);
    assert_eq!(at.shipping, policy.shipping_fee);
    assert_eq!(at.amount_to_free_shipping, 1);

    let above =
        CartTotals::compute(&[line(policy.free_shipping_threshold + 1, 1)], &policy).unwrap();
    assert!(above.free_shipping);
    assert_eq!(above.shipping, 0);
    assert_eq!(above.amount_to_free_shipping, 0);
}

#[test]
fn empty_cart_costs_nothing() {
    let totals = CartTotals::compute(&[], &PricingPolicy::default()).unwrap();
    assert_eq!(totals.total, 0);
    assert_eq!(totals.shipping, 0);
    assert_eq!(totals.item_count, 0);
    assert!(totals.free_shipping);
    assert_eq!(totals.amount_to_free_shipping, 0);
}

#[test]
fn total_is_always_the_sum_of_its_parts() {
    let policy = PricingPolicy {
        free_shipping_threshold: 99_900,
        shipping_fee: 7_500,
        tax_rate_bps: 500,
    };
    for (price, qty) in [(1, 1), (333, 3), (99_900, 1), (12_345, 7), (0, 4)] {
        let t = CartTotals::compute(&[line(price, qty)], &policy).unwrap();
        assert_eq!(t.total, t.subtotal + t.shipping + t.tax);
        assert_eq!(t.free_shipping, t.shipping == 0);
    }
}

#[test]
fn rejects_bad_lines() {
    let policy = PricingPolicy::default();
    assert_eq!(
        CartTotals::compute(&[line(100, 0)], &policy),
        Err(PricingError::InvalidQuantity)
    );
    assert_eq!(
        CartTotals::compute(&[line(-1, 1)], &policy),
        Err(PricingError::NegativePrice)
    );
    assert_eq!(
        CartTotals::compute(&[line(i64::MAX, 2)], &policy),
        Err(PricingError::Overflow)
    );
}

#[test]
fn tax_rounds_half_up() {
    assert_eq!(tax_on(1, 5_000), Ok(1));
    assert_eq!(tax_on(1, 4_999), Ok(0));
    assert_eq!(tax_on(10_000, 1_800), Ok(1_800));
}

#[test]
fn discount_needs_a_higher_mrp() {
    assert_eq!(discount_percent(750, Some(1_000)), Some(25));
    assert_eq!(discount_percent(1_000, Some(1_000)), None);
    assert_eq!(discount_percent(1_200, Some(1_000)), None);
    assert_eq!(discount_percent(500, None), None);
}

#[test]
fn discount_on_extreme_mrp_does_not_overflow() {
    assert_eq!(discount_percent(100, Some(100_000_000_000_000_000)), Some(99));
    assert_eq!(discount_percent(1, Some(i64::MAX)), Some(99));
    assert_eq!(discount_percent(i64::MAX - 1, Some(i64::MAX)), Some(0));
}

#[test]
fn stock_flags() {
    assert_eq!(
        StockFlags::from_stock(0, 5),
        StockFlags {
            in_stock: false,
            low_stock: false
        }
    );
    assert!(StockFlags::from_stock(5, 5).low_stock);
    assert!(!StockFlags::from_stock(6, 5).low_stock);
    assert!(StockFlags::from_stock(6, 5).in_stock);
}
