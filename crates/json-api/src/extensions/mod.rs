//! Handler shorthands.
//!
//! `DepotExt` pulls the shared state and the current visitor out of the
//! depot; `ResultExt` turns service failures into status errors.
//! Handlers glob-import this module so both traits are in scope without naming them.

mod depot;
mod result;

pub(crate) use depot::DepotExt as _;
pub(crate) use result::ResultExt as _;

#[cfg(test)]
mod tests {
    use salvo::prelude::{Depot, StatusCode};
    use testresult::TestResult;
    use tiffin_app::domain::sessions::{ClientAddress, CustomerUuid, SessionUuid, Visitor};

    use super::*;

    #[test]
    fn guests_are_asked_to_sign_in() -> TestResult {
        let mut depot = Depot::new();
        let session = SessionUuid::new();

        depot.insert_visitor(Visitor::guest(session), ClientAddress::new("198.51.100.4"));

        assert_eq!(depot.visitor_or_500()?, Visitor::guest(session));
        assert_eq!(
            depot.customer_or_401().err().map(|error| error.code),
            Some(StatusCode::UNAUTHORIZED)
        );

        Ok(())
    }

    #[test]
    fn signed_in_customers_are_found() -> TestResult {
        let mut depot = Depot::new();
        let customer = CustomerUuid::new();

        depot.insert_visitor(
            Visitor::customer(SessionUuid::new(), customer),
            ClientAddress::new("198.51.100.4"),
        );

        assert_eq!(depot.customer_or_401()?, customer);

        Ok(())
    }

    #[test]
    fn missing_visitors_are_server_errors() {
        let depot = Depot::new();

        assert_eq!(
            depot.visitor_or_500().err().map(|error| error.code),
            Some(StatusCode::INTERNAL_SERVER_ERROR)
        );
    }

    #[test]
    fn bad_input_maps_to_400() {
        let parsed: Result<u8, _> = "three".parse::<u8>();

        assert_eq!(
            parsed.or_400().err().map(|error| error.code),
            Some(StatusCode::BAD_REQUEST)
        );
    }
}
