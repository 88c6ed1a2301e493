//! API routes module
//!
//! Route groups are owned by independent domain crates. [`RouteTable`]
//! mounts whichever groups are supplied, in a fixed order, under the `/api`
//! prefix that `create_router` adds.

pub mod health;
pub mod products;

use axum::Router;
use std::collections::HashMap;
use strum::{Display, EnumIter, IntoEnumIterator};
use tracing::{info, warn};

use crate::state::AppState;

/// Handler groups served by the storefront, in mount order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum RouteGroup {
    Auth,
    Users,
    Products,
    Categories,
    Carts,
    Orders,
    Tags,
    Wishlists,
    Collections,
}

impl RouteGroup {
    /// Mount path relative to the API prefix, e.g. `/products`
    pub fn path(self) -> String {
        format!("/{}", self)
    }
}

/// Collects group routers and nests them in [`RouteGroup`] order.
#[derive(Default)]
pub struct RouteTable {
    groups: HashMap<RouteGroup, Router>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Supply the router for `group`; a second call replaces the first.
    pub fn mount(mut self, group: RouteGroup, router: Router) -> Self {
        self.groups.insert(group, router);
        self
    }

    /// Nest every supplied group; missing groups fall through to the 404 fallback.
    pub fn into_router(mut self) -> Router {
        let mut router = Router::new();

        for group in RouteGroup::iter() {
            match self.groups.remove(&group) {
                Some(group_router) => {
                    info!(group = %group, path = %group.path(), "Mounting route group");
                    router = router.nest(&group.path(), group_router);
                }
                None => warn!(group = %group, "No handlers supplied for route group"),
            }
        }

        router
    }
}

/// Create all API routes
pub fn routes(state: &AppState) -> Router {
    RouteTable::new()
        .mount(RouteGroup::Products, products::router(state))
        .into_router()
        .merge(health::router(state.clone()))
}

/// Initialize database indexes
pub async fn init_indexes(state: &AppState) -> eyre::Result<()> {
    products::init_indexes(state).await
}
