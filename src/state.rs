//! Shared application state for request handlers (C14/C18), grounded on the
//! teacher's `AppState` shape: configuration plus the live services a
//! handler needs, all `Arc`-wrapped and cheap to clone per request.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::handler::RequestHandler;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub handler: Arc<RequestHandler>,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, handler: Arc<RequestHandler>) -> Self {
        Self { config, handler }
    }
}
