//! State

use std::{fmt, sync::Arc};

use tiffin_app::context::AppContext;

#[derive(Clone)]
pub(crate) struct State {
    pub(crate) app: AppContext,

    /// Bearer token for the kitchen display.
    pub(crate) kitchen_token: String,
}

impl State {
    #[must_use]
    pub(crate) fn new(app: AppContext, kitchen_token: impl Into<String>) -> Self {
        Self {
            app,
            kitchen_token: kitchen_token.into(),
        }
    }

    #[must_use]
    pub(crate) fn shared(app: AppContext, kitchen_token: impl Into<String>) -> Arc<Self> {
        Arc::new(Self::new(app, kitchen_token))
    }
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("app", &self.app)
            .finish_non_exhaustive()
    }
}
