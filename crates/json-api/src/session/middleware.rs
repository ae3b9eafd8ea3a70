//! Visitor identification middleware.
//!
//! Every request belongs to a session named by the `X-Session-Id` header. Requests without
//! one start a new session, and the id is returned in the response so the client can keep
//! using it. Signed-in customers also send `X-Customer-Id`.

use salvo::{http::header::HeaderValue, prelude::*};
use tiffin_app::domain::sessions::{ClientAddress, CustomerUuid, SessionUuid, Visitor};
use tracing::{debug, warn};

use crate::extensions::*;

pub(crate) const SESSION_HEADER: &str = "x-session-id";
pub(crate) const CUSTOMER_HEADER: &str = "x-customer-id";

#[salvo::handler]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    let session = match req.header::<String>(SESSION_HEADER) {
        None => {
            let session = SessionUuid::new();

            debug!(%session, "starting new session");

            session
        }
        Some(value) => match value.parse::<SessionUuid>() {
            Ok(session) => session,
            Err(_error) => {
                res.render(StatusError::bad_request().brief("Invalid X-Session-Id header"));

                return;
            }
        },
    };

    let customer = match req.header::<String>(CUSTOMER_HEADER) {
        None => None,
        Some(value) => match value.parse::<CustomerUuid>() {
            Ok(customer) => Some(customer),
            Err(_error) => {
                res.render(StatusError::bad_request().brief("Invalid X-Customer-Id header"));

                return;
            }
        },
    };

    match HeaderValue::from_str(&session.to_string()) {
        Ok(value) => {
            res.headers_mut().insert(SESSION_HEADER, value);
        }
        Err(source) => warn!(%session, "could not encode session id header: {source}"),
    }

    let visitor = Visitor { session, customer };
    let client = ClientAddress::new(req.remote_addr().to_string());

    depot.insert_visitor(visitor, client);

    ctrl.call_next(req, depot, res).await;
}
