//! Shared application state

use std::sync::Arc;

use super::hub::BroadcastHub;
use crate::gateway::MutationGateway;
use crate::store::ItemStore;

/// State shared by the REST and WebSocket handlers
pub struct AppState {
    /// Mutation gateway (owns the store)
    pub gateway: Arc<MutationGateway>,

    /// Session registry for pushes
    pub hub: Arc<BroadcastHub>,
}

impl AppState {
    /// Wire a gateway and hub around the given store
    pub fn new(store: Arc<dyn ItemStore>, hub: Arc<BroadcastHub>) -> Self {
        let gateway = Arc::new(MutationGateway::new(store, hub.clone()));
        Self { gateway, hub }
    }
}
