//! Healthcheck Handler
//!
//! Load balancers take the API out of rotation when the order database stops answering.

use std::sync::Arc;

use salvo::{oapi::ToSchema, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{extensions::*, state::State};

/// Healthcheck response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// `ok` when orders can be taken, `unavailable` otherwise
    pub status: String,
}

/// Healthcheck handler
///
/// Pings the order database. Responds 503 when it cannot be reached.
#[endpoint(
    tags("health"),
    summary = "Health check endpoint",
    responses(
        (status_code = StatusCode::OK, description = "Ready to take orders"),
        (status_code = StatusCode::SERVICE_UNAVAILABLE, description = "Database unreachable"),
    ),
)]
pub(crate) async fn handler(
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<HealthResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    let status = match state.app.health.ping().await {
        Ok(()) => "ok",
        Err(error) => {
            warn!(%error, "healthcheck failed");
            res.status_code(StatusCode::SERVICE_UNAVAILABLE);

            "unavailable"
        }
    };

    Ok(Json(HealthResponse {
        status: status.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use salvo::{
        affix_state::inject,
        test::{ResponseExt, TestClient},
    };
    use testresult::TestResult;
    use tiffin_app::{database::MockHealthCheck, storage::StoreError};

    use crate::test_helpers::MockServices;

    use super::*;

    fn make_service(health: MockHealthCheck) -> Service {
        let state = MockServices {
            health,
            ..MockServices::default()
        }
        .into_state();

        Service::new(
            Router::new()
                .hoop(inject(state))
                .push(Router::with_path("healthcheck").get(handler)),
        )
    }

    #[tokio::test]
    async fn reachable_database_is_healthy() -> TestResult {
        let mut health = MockHealthCheck::new();
        health.expect_ping().once().return_once(|| Ok(()));

        let mut res = TestClient::get("http://example.com/healthcheck")
            .send(&make_service(health))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        let body: HealthResponse = res.take_json().await?;
        assert_eq!(body.status, "ok");

        Ok(())
    }

    #[tokio::test]
    async fn unreachable_database_is_unavailable() -> TestResult {
        let mut health = MockHealthCheck::new();
        health
            .expect_ping()
            .once()
            .return_once(|| Err(StoreError::Unavailable));

        let mut res = TestClient::get("http://example.com/healthcheck")
            .send(&make_service(health))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::SERVICE_UNAVAILABLE));

        let body: HealthResponse = res.take_json().await?;
        assert_eq!(body.status, "unavailable");

        Ok(())
    }
}
