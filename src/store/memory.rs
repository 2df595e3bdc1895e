use anyhow::Result;
use parking_lot::RwLock;
use std::collections::BTreeMap;

use crate::model::{Brand, Category, Customer, Entity, Id, Order, OrderItem, Product, User};
use crate::store::traits::{EntityStore, Store};

/// One auto-incrementing table.
#[derive(Debug)]
pub struct Table<E> {
    next_id: Id,
    rows: BTreeMap<Id, E>,
}

impl<E> Default for Table<E> {
    fn default() -> Self {
        Self {
            next_id: 1,
            rows: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Default)]
pub struct Tables {
    users: Table<User>,
    brands: Table<Brand>,
    categories: Table<Category>,
    customers: Table<Customer>,
    products: Table<Product>,
    orders: Table<Order>,
    order_items: Table<OrderItem>,
}

/// Entities that have a table in [`Tables`].
pub trait MemoryBacked: Entity {
    fn table(tables: &Tables) -> &Table<Self>;
    fn table_mut(tables: &mut Tables) -> &mut Table<Self>;
}

macro_rules! memory_backed {
    ($entity:ty, $field:ident) => {
        impl MemoryBacked for $entity {
            fn table(tables: &Tables) -> &Table<Self> {
                &tables.$field
            }

            fn table_mut(tables: &mut Tables) -> &mut Table<Self> {
                &mut tables.$field
            }
        }
    };
}

memory_backed!(User, users);
memory_backed!(Brand, brands);
memory_backed!(Category, categories);
memory_backed!(Customer, customers);
memory_backed!(Product, products);
memory_backed!(Order, orders);
memory_backed!(OrderItem, order_items);

/// In-process store used for tests, demos and `ADMIN_DATABASE__BACKEND=memory`.
///
/// Identifiers are never reused after a delete. Foreign keys are not checked.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl<E: MemoryBacked> EntityStore<E> for MemoryStore {
    async fn list(&self, parent: Option<Id>) -> Result<Vec<E>> {
        let tables = self.tables.read();
        let rows = E::table(&tables)
            .rows
            .values()
            .filter(|row| parent.is_none() || row.filter_value() == parent)
            .cloned()
            .collect();
        Ok(rows)
    }

    async fn get(&self, id: Id) -> Result<Option<E>> {
        let tables = self.tables.read();
        Ok(E::table(&tables).rows.get(&id).cloned())
    }

    async fn create(&self, draft: E::Draft) -> Result<E> {
        let mut tables = self.tables.write();
        let table = E::table_mut(&mut tables);
        let row = E::create_from(table.next_id, draft)?;
        table.next_id += 1;
        table.rows.insert(row.id(), row.clone());
        Ok(row)
    }

    async fn update(&self, id: Id, draft: E::Draft) -> Result<Option<E>> {
        let mut tables = self.tables.write();
        let Some(row) = E::table_mut(&mut tables).rows.get_mut(&id) else {
            return Ok(None);
        };
        // Validate against a copy so a rejected draft leaves the row intact.
        let mut updated = row.clone();
        updated.replace_with(draft)?;
        *row = updated.clone();
        Ok(Some(updated))
    }

    async fn delete(&self, id: Id) -> Result<bool> {
        let mut tables = self.tables.write();
        Ok(E::table_mut(&mut tables).rows.remove(&id).is_some())
    }
}

impl Store for MemoryStore {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BrandDraft, ProductDraft};

    #[tokio::test]
    async fn test_ids_are_fresh_and_never_reused() {
        let store = MemoryStore::new();
        let first = EntityStore::<Brand>::create(&store, BrandDraft::new("Acme", None))
            .await
            .unwrap();
        let second = EntityStore::<Brand>::create(&store, BrandDraft::new("Birch", Some("SE")))
            .await
            .unwrap();
        assert_eq!((first.id, second.id), (1, 2));

        assert!(EntityStore::<Brand>::delete(&store, second.id).await.unwrap());
        assert!(!EntityStore::<Brand>::delete(&store, second.id).await.unwrap());

        let third = EntityStore::<Brand>::create(&store, BrandDraft::new("Cobalt", None))
            .await
            .unwrap();
        assert_eq!(third.id, 3);
    }

    #[tokio::test]
    async fn test_list_filters_on_parent_key() {
        let store = MemoryStore::new();
        for category_id in [1, 2, 1] {
            let draft = ProductDraft {
                name: Some(format!("item-{category_id}")),
                price: Some(1.0),
                category_id: Some(category_id),
                brand_id: Some(1),
                ..Default::default()
            };
            EntityStore::<Product>::create(&store, draft).await.unwrap();
        }

        let all = EntityStore::<Product>::list(&store, None).await.unwrap();
        let first_category = EntityStore::<Product>::list(&store, Some(1)).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(
            first_category.iter().map(|p| p.id).collect::<Vec<_>>(),
            vec![1, 3]
        );
    }

    #[tokio::test]
    async fn test_rejected_update_leaves_row_untouched() {
        let store = MemoryStore::new();
        let brand = EntityStore::<Brand>::create(&store, BrandDraft::new("Acme", Some("US")))
            .await
            .unwrap();

        let result = EntityStore::<Brand>::update(&store, brand.id, BrandDraft::default()).await;
        assert!(result.is_err());

        let stored = EntityStore::<Brand>::get(&store, brand.id).await.unwrap();
        assert_eq!(stored, Some(brand));
    }
}
