//! Test helpers.

use std::{
    fmt,
    sync::{Arc, Mutex},
};

use jiff::Timestamp;
use rusty_money::{Money, iso::GBP};
use salvo::{affix_state::inject, prelude::*};
use tracing::{
    Event, Subscriber,
    field::{Field, Visit},
};
use tracing_subscriber::{
    layer::{Context, Layer, SubscriberExt},
    registry,
};
use uuid::Uuid;

use tiffin::{
    basket::Basket,
    catalog::{CatalogItem, ItemId, MenuSnapshot},
    orders::{
        CustomerDetails, DeliveryAddress, DeliveryType, Order, OrderDraft, OrderItem,
        OrderReference, OrderTotals, PaymentMethod,
    },
    pricing::PricingPolicy,
};
use tiffin_app::{
    context::AppContext,
    database::MockHealthCheck,
    domain::{
        accounts::MockAccountsService,
        baskets::{
            MockBasketsService,
            models::{BasketUpdate, BasketView},
        },
        checkout::MockCheckoutService,
        kitchen::MockKitchenService,
        orders::MockOrdersService,
        sessions::{ClientAddress, CustomerUuid, SessionUuid, Visitor},
    },
};

use crate::{extensions::*, state::State};

pub(crate) const TEST_SESSION_UUID: SessionUuid = SessionUuid::from_uuid(Uuid::from_u128(1));
pub(crate) const TEST_CUSTOMER_UUID: CustomerUuid = CustomerUuid::from_uuid(Uuid::from_u128(2));
pub(crate) const TEST_CLIENT_ADDRESS: &str = "203.0.113.7";
pub(crate) const TEST_KITCHEN_TOKEN: &str = "kitchen-secret";

#[salvo::handler]
pub(crate) async fn inject_customer(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    depot.insert_visitor(
        Visitor::customer(TEST_SESSION_UUID, TEST_CUSTOMER_UUID),
        ClientAddress::new(TEST_CLIENT_ADDRESS),
    );
    ctrl.call_next(req, depot, res).await;
}

#[salvo::handler]
pub(crate) async fn inject_guest(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    depot.insert_visitor(
        Visitor::guest(TEST_SESSION_UUID),
        ClientAddress::new(TEST_CLIENT_ADDRESS),
    );
    ctrl.call_next(req, depot, res).await;
}

/// Mocks for every service; any call without an expectation fails the test.
#[derive(Default)]
pub(crate) struct MockServices {
    pub baskets: MockBasketsService,
    pub checkout: MockCheckoutService,
    pub orders: MockOrdersService,
    pub kitchen: MockKitchenService,
    pub accounts: MockAccountsService,
    pub health: MockHealthCheck,
}

impl MockServices {
    pub(crate) fn into_state(self) -> Arc<State> {
        State::shared(
            AppContext {
                baskets: Arc::new(self.baskets),
                checkout: Arc::new(self.checkout),
                orders: Arc::new(self.orders),
                kitchen: Arc::new(self.kitchen),
                accounts: Arc::new(self.accounts),
                health: Arc::new(self.health),
            },
            TEST_KITCHEN_TOKEN,
        )
    }

    /// Serves `route` to the signed-in test customer.
    pub(crate) fn customer_service(self, route: Router) -> Service {
        Service::new(
            Router::new()
                .hoop(inject(self.into_state()))
                .hoop(inject_customer)
                .push(route),
        )
    }

    /// Serves `route` to a guest.
    pub(crate) fn guest_service(self, route: Router) -> Service {
        Service::new(
            Router::new()
                .hoop(inject(self.into_state()))
                .hoop(inject_guest)
                .push(route),
        )
    }
}

pub(crate) fn baskets_service(baskets: MockBasketsService, route: Router) -> Service {
    MockServices {
        baskets,
        ..MockServices::default()
    }
    .customer_service(route)
}

pub(crate) fn guest_baskets_service(baskets: MockBasketsService, route: Router) -> Service {
    MockServices {
        baskets,
        ..MockServices::default()
    }
    .guest_service(route)
}

pub(crate) fn checkout_service(checkout: MockCheckoutService, route: Router) -> Service {
    MockServices {
        checkout,
        ..MockServices::default()
    }
    .guest_service(route)
}

pub(crate) fn orders_service(orders: MockOrdersService, route: Router) -> Service {
    MockServices {
        orders,
        ..MockServices::default()
    }
    .customer_service(route)
}

pub(crate) fn guest_orders_service(orders: MockOrdersService, route: Router) -> Service {
    MockServices {
        orders,
        ..MockServices::default()
    }
    .guest_service(route)
}

pub(crate) fn kitchen_service(kitchen: MockKitchenService, route: Router) -> Service {
    MockServices {
        kitchen,
        ..MockServices::default()
    }
    .guest_service(route)
}

pub(crate) fn accounts_service(accounts: MockAccountsService, route: Router) -> Service {
    MockServices {
        accounts,
        ..MockServices::default()
    }
    .customer_service(route)
}

pub(crate) fn guest_accounts_service(accounts: MockAccountsService, route: Router) -> Service {
    MockServices {
        accounts,
        ..MockServices::default()
    }
    .guest_service(route)
}

fn chana_masala() -> CatalogItem {
    CatalogItem::new(ItemId(1), "Chana Masala", Money::from_minor(9_50, GBP))
}

fn make_update(basket: Basket, promo_removed: bool) -> BasketUpdate {
    let menu = MenuSnapshot::new([chana_masala()]);

    BasketUpdate {
        basket: BasketView::new(basket, &menu),
        promo_removed,
        warning: promo_removed.then(|| "This promo code has expired.".to_string()),
    }
}

fn basket_with(quantity: u32) -> Basket {
    let mut basket = Basket::new(PricingPolicy::reference());

    assert!(
        basket.add(&chana_masala(), quantity).is_ok(),
        "fixture item should be addable"
    );

    basket
}

/// Chana Masala at £9.50 times `quantity`, no promo.
pub(crate) fn make_basket_update(quantity: u32) -> BasketUpdate {
    make_update(basket_with(quantity), false)
}

/// One Chana Masala with SAVE2 taking £2.00 off.
pub(crate) fn make_promo_update() -> BasketUpdate {
    let mut basket = basket_with(1);

    assert!(
        basket
            .apply_promo("SAVE2", Money::from_minor(2_00, GBP))
            .is_ok(),
        "fixture promo should apply"
    );

    make_update(basket, false)
}

/// A basket whose promo has just been taken away.
pub(crate) fn make_promo_removed_update() -> BasketUpdate {
    make_update(basket_with(1), true)
}

/// A pending delivery order for two Chana Masala.
pub(crate) fn make_order() -> Order {
    Order::place(
        OrderDraft {
            customer: CustomerDetails {
                full_name: "Asha Patel".to_string(),
                email: "asha@example.com".to_string(),
                phone: "07700 900123".to_string(),
            },
            address: Some(DeliveryAddress {
                line1: "47 Mare Street".to_string(),
                line2: None,
                city: "London".to_string(),
                postcode: "E8 1HE".to_string(),
            }),
            special_instructions: None,
            delivery_type: DeliveryType::Delivery,
            payment_method: PaymentMethod::CashOnDelivery,
            card_last_four: None,
            items: vec![OrderItem {
                item_id: Some(ItemId(1)),
                item_name: "Chana Masala".to_string(),
                unit_price: Money::from_minor(9_50, GBP),
                quantity: 2,
                notes: None,
            }],
            totals: OrderTotals {
                subtotal: Money::from_minor(19_00, GBP),
                delivery_charge: Money::from_minor(2_50, GBP),
                discount: Money::from_minor(0, GBP),
                total: Money::from_minor(21_50, GBP),
            },
            promo_code: None,
        },
        OrderReference::generate(),
        Timestamp::now(),
    )
}

/// Messages of the log events emitted while the returned guard is alive, on this thread.
pub(crate) fn capture_log_messages() -> (tracing::subscriber::DefaultGuard, LogMessages) {
    let messages = LogMessages::default();

    let subscriber = registry().with(messages.clone());

    (tracing::subscriber::set_default(subscriber), messages)
}

#[derive(Debug, Clone, Default)]
pub(crate) struct LogMessages(Arc<Mutex<Vec<String>>>);

impl LogMessages {
    pub(crate) fn count(&self, message: &str) -> usize {
        self.0
            .lock()
            .map(|messages| messages.iter().filter(|logged| *logged == message).count())
            .unwrap_or_default()
    }
}

impl<S: Subscriber> Layer<S> for LogMessages {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor(None);
        event.record(&mut visitor);

        if let (Some(message), Ok(mut messages)) = (visitor.0, self.0.lock()) {
            messages.push(message);
        }
    }
}

struct MessageVisitor(Option<String>);

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.0 = Some(format!("{value:?}"));
        }
    }
}
