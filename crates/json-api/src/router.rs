//! App Router

use salvo::Router;

use crate::{basket, checkout, kitchen, orders, session};

/// Routes for customers, identified by session, and for kitchen staff, identified by the
/// kitchen token.
pub fn app_router() -> Router {
    Router::new()
        .push(
            Router::new()
                .hoop(session::middleware::handler)
                .push(
                    Router::with_path("basket")
                        .get(basket::get::handler)
                        .push(
                            Router::with_path("items")
                                .post(basket::add_item::handler)
                                .push(
                                    Router::with_path("{item}")
                                        .put(basket::update_item::handler)
                                        .delete(basket::remove_item::handler)
                                        .push(
                                            Router::with_path("notes")
                                                .put(basket::set_notes::handler),
                                        ),
                                ),
                        )
                        .push(
                            Router::with_path("promo")
                                .post(basket::apply_promo::handler)
                                .delete(basket::remove_promo::handler),
                        ),
                )
                .push(Router::with_path("checkout").post(checkout::place_order::handler))
                .push(
                    Router::with_path("orders")
                        .get(orders::index::handler)
                        .push(
                            Router::with_path("{reference}")
                                .get(orders::get::handler)
                                .push(Router::with_path("status").get(orders::status::handler))
                                .push(
                                    Router::with_path("reorder").post(orders::reorder::handler),
                                ),
                        ),
                )
                .push(
                    Router::with_path("session")
                        .push(Router::with_path("sign-in").post(session::sign_in::handler))
                        .push(Router::with_path("sign-out").post(session::sign_out::handler)),
                ),
        )
        .push(
            Router::with_path("kitchen/orders")
                .hoop(kitchen::middleware::handler)
                .get(kitchen::index::handler)
                .push(
                    Router::with_path("{reference}")
                        .push(Router::with_path("advance").post(kitchen::advance::handler))
                        .push(Router::with_path("cancel").post(kitchen::cancel::handler)),
                ),
        )
}
