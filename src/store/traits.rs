use crate::model::{Brand, Category, Customer, Entity, Id, Order, OrderItem, Product, User};
use anyhow::Result;

/// CRUD over one table.
///
/// `create` and `update` return the row as persisted, including generated
/// fields, read back in the same statement as the write.
#[async_trait::async_trait]
pub trait EntityStore<E: Entity>: Send + Sync {
    /// List rows ordered by id, optionally restricted to `E::FILTER_KEY = parent`
    async fn list(&self, parent: Option<Id>) -> Result<Vec<E>>;
    async fn get(&self, id: Id) -> Result<Option<E>>;
    async fn create(&self, draft: E::Draft) -> Result<E>;
    /// Replace every editable field. `None` when no row has this id
    async fn update(&self, id: Id, draft: E::Draft) -> Result<Option<E>>;
    /// `false` when no row has this id
    async fn delete(&self, id: Id) -> Result<bool>;
}

pub trait Store:
    EntityStore<User>
    + EntityStore<Brand>
    + EntityStore<Category>
    + EntityStore<Customer>
    + EntityStore<Product>
    + EntityStore<Order>
    + EntityStore<OrderItem>
    + Send
    + Sync
{
}
