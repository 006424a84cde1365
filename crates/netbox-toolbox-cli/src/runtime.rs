// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use netbox_toolbox_app::{InventoryApi, QueryOutcome, QueryRequest, run_query};

/// Bridges the TUI to an inventory backend. Holds the one API handle for the
/// life of the process.
pub struct ApiRuntime<A> {
    api: A,
    endpoint: String,
}

impl<A: InventoryApi> ApiRuntime<A> {
    pub fn new(api: A, endpoint: impl Into<String>) -> Self {
        Self {
            api,
            endpoint: endpoint.into(),
        }
    }
}

impl<A: InventoryApi> netbox_toolbox_tui::AppRuntime for ApiRuntime<A> {
    fn run_query(&mut self, request: &QueryRequest) -> QueryOutcome {
        run_query(&self.api, request)
    }

    fn endpoint_label(&self) -> String {
        self.endpoint.clone()
    }
}
