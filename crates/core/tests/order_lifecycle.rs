//! Integration tests for checkout and the kitchen workflow

use jiff::Timestamp;
use rusty_money::{Money, iso::GBP};
use testresult::TestResult;

use tiffin::{
    basket::Basket,
    catalog::{CatalogItem, MenuSnapshot},
    checkout::{CheckoutForm, draft_order},
    orders::{
        DeliveryType, Order, OrderReference, OrderStatus, PaymentMethod, StatusChange,
        TransitionError, eta,
    },
    promotions::RedemptionContext,
};

fn placed_order(delivery_type: DeliveryType) -> TestResult<(Order, Timestamp)> {
    let now: Timestamp = "2026-05-01T19:00:00Z".parse()?;

    let menu = MenuSnapshot::new([CatalogItem::new(1, "Lamb Handi", Money::from_minor(12_50, GBP))]);
    let mut basket = Basket::default();
    basket.add(&CatalogItem::new(1, "Lamb Handi", Money::from_minor(12_50, GBP)), 1)?;

    let form = CheckoutForm {
        full_name: "Sam Okafor".to_string(),
        email: "sam@example.com".to_string(),
        phone: "07700 900456".to_string(),
        delivery_type,
        payment_method: match delivery_type {
            DeliveryType::Delivery => PaymentMethod::CashOnDelivery,
            DeliveryType::Collection => PaymentMethod::CashOnCollection,
        },
        address_line1: "12 Dalston Lane".to_string(),
        address_line2: String::new(),
        city: "London".to_string(),
        postcode: "E8 3AZ".to_string(),
        special_instructions: "Ring the bell".to_string(),
        card: None,
    };

    let draft = draft_order(&mut basket, &menu, &form, None, &RedemptionContext::guest(now))?;

    Ok((Order::place(draft, OrderReference::generate(), now), now))
}

#[test]
fn preparing_delivery_order_advances_to_out_for_delivery() -> TestResult {
    let (mut order, now) = placed_order(DeliveryType::Delivery)?;
    order.status = OrderStatus::Preparing;

    let change = order.advance(OrderStatus::Preparing, now)?;

    assert_eq!(change.status(), OrderStatus::OutForDelivery);
    assert_eq!(order.status, OrderStatus::OutForDelivery);

    Ok(())
}

#[test]
fn completed_order_cannot_advance() -> TestResult {
    let (mut order, now) = placed_order(DeliveryType::Delivery)?;
    order.status = OrderStatus::Completed;

    assert_eq!(
        order.advance(OrderStatus::Completed, now),
        Err(TransitionError::NoNextStatus(OrderStatus::Completed))
    );
    assert_eq!(order.status, OrderStatus::Completed);

    Ok(())
}

#[test]
fn collection_order_walks_the_whole_workflow() -> TestResult {
    let (mut order, now) = placed_order(DeliveryType::Collection)?;

    let mut minutes = Vec::new();
    while let Some(next) = order.status.next(order.delivery_type) {
        minutes.push(eta::estimated_minutes_remaining(order.delivery_type, order.status));

        let seen = order.status;
        assert_eq!(
            order.advance(seen, now)?,
            StatusChange::Changed { from: seen, to: next }
        );
    }

    assert_eq!(order.status, OrderStatus::Completed);
    assert_eq!(minutes, [Some(30), Some(25), Some(15), Some(0)]);

    Ok(())
}

#[test]
fn double_click_advance_moves_once() -> TestResult {
    let (mut order, now) = placed_order(DeliveryType::Delivery)?;

    let first = order.advance(OrderStatus::Pending, now)?;
    let second = order.advance(OrderStatus::Pending, now)?;

    assert!(first.is_changed());
    assert_eq!(second, StatusChange::Unchanged(OrderStatus::Confirmed));
    assert_eq!(order.status, OrderStatus::Confirmed);

    Ok(())
}

#[test]
fn order_snapshot_is_independent_of_the_basket() -> TestResult {
    let (order, _) = placed_order(DeliveryType::Delivery)?;

    assert_eq!(order.totals.subtotal, Money::from_minor(12_50, GBP));
    assert_eq!(order.totals.delivery_charge, Money::from_minor(2_50, GBP));
    assert_eq!(order.totals.total, Money::from_minor(15_00, GBP));
    assert_eq!(order.special_instructions.as_deref(), Some("Ring the bell"));
    assert_eq!(order.status, OrderStatus::Pending);

    Ok(())
}
