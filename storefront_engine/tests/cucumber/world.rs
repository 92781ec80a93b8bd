use std::collections::HashMap;

use cucumber::World;
use storefront_engine::{
    db_types::{ExternalId, Order, OrderId, UserId},
    UserManagement,
};

use crate::support::TestSystem;

#[derive(Default, Debug, World)]
pub struct StorefrontWorld {
    pub system: Option<TestSystem>,
    /// The most recent order of each client, by chat id.
    pub orders: HashMap<i64, OrderId>,
}

impl StorefrontWorld {
    pub fn sys(&self) -> &TestSystem {
        self.system.as_ref().expect("Storefront not initialised")
    }

    pub async fn user_id(&self, external: i64) -> UserId {
        self.sys()
            .db
            .fetch_user_by_external_id(ExternalId::from(external))
            .await
            .expect("Error fetching user")
            .unwrap_or_else(|| panic!("User {external} is not registered"))
            .id
    }

    pub fn order_id(&self, client: i64) -> OrderId {
        *self.orders.get(&client).unwrap_or_else(|| panic!("Client {client} has not placed an order"))
    }

    pub async fn order_of(&self, client: i64) -> Order {
        self.sys().lifecycle.order(self.order_id(client)).await.expect("Error fetching order")
    }
}
