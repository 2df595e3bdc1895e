use anyhow::{Context, Result};
use sqlx::postgres::{PgArguments, PgPoolOptions, PgRow};
use sqlx::query::Query;
use sqlx::{PgPool, Postgres, Row};

use crate::model::{
    Brand, BrandDraft, Category, CategoryDraft, Customer, CustomerDraft, Draft, Entity, Id, Order,
    OrderDraft, OrderItem, OrderItemDraft, Product, ProductDraft, User, UserDraft,
};
use crate::store::traits::{EntityStore, Store};

type PgQuery<'q> = Query<'q, Postgres, PgArguments>;

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new PostgreSQL store with the given database URL
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("Failed to create PostgreSQL connection pool")?;

        Ok(Self { pool })
    }

    /// Run the embedded migrations under `migrations/`
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Table mapping for an entity stored in PostgreSQL.
pub trait PgEntity: Entity {
    const TABLE: &'static str;
    /// Columns read back after every statement, `id` first.
    const SELECT_COLUMNS: &'static str;
    /// Columns written from the draft, in bind order.
    const WRITE_COLUMNS: &'static [&'static str];

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error>;

    /// Bind the draft's values in [`PgEntity::WRITE_COLUMNS`] order.
    fn bind_draft<'q>(query: PgQuery<'q>, draft: &Self::Draft) -> PgQuery<'q>;

    /// SET clause entry for one column on update.
    fn update_assignment(column: &str, placeholder: usize) -> String {
        format!("{} = ${}", column, placeholder)
    }
}

fn insert_sql<E: PgEntity>() -> String {
    let placeholders = (1..=E::WRITE_COLUMNS.len())
        .map(|i| format!("${}", i))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
        E::TABLE,
        E::WRITE_COLUMNS.join(", "),
        placeholders,
        E::SELECT_COLUMNS
    )
}

fn update_sql<E: PgEntity>() -> String {
    let assignments = E::WRITE_COLUMNS
        .iter()
        .enumerate()
        .map(|(i, column)| E::update_assignment(column, i + 1))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "UPDATE {} SET {} WHERE id = ${} RETURNING {}",
        E::TABLE,
        assignments,
        E::WRITE_COLUMNS.len() + 1,
        E::SELECT_COLUMNS
    )
}

fn select_sql<E: PgEntity>(filtered: bool) -> String {
    match (filtered, E::FILTER_KEY) {
        (true, Some(column)) => format!(
            "SELECT {} FROM {} WHERE {} = $1 ORDER BY id",
            E::SELECT_COLUMNS,
            E::TABLE,
            column
        ),
        _ => format!("SELECT {} FROM {} ORDER BY id", E::SELECT_COLUMNS, E::TABLE),
    }
}

#[async_trait::async_trait]
impl<E: PgEntity> EntityStore<E> for PostgresStore {
    async fn list(&self, parent: Option<Id>) -> Result<Vec<E>> {
        let filtered = parent.is_some() && E::FILTER_KEY.is_some();
        let sql = select_sql::<E>(filtered);
        let mut query = sqlx::query(&sql);
        if filtered {
            query = query.bind(parent);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("Failed to list {}", E::TABLE))?;

        rows.iter()
            .map(|row| E::from_row(row).with_context(|| format!("Failed to decode {} row", E::TABLE)))
            .collect()
    }

    async fn get(&self, id: Id) -> Result<Option<E>> {
        let sql = format!("SELECT {} FROM {} WHERE id = $1", E::SELECT_COLUMNS, E::TABLE);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to fetch {} {}", E::TABLE, id))?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(E::from_row(&row)?))
    }

    async fn create(&self, draft: E::Draft) -> Result<E> {
        draft.validate_create()?;
        let sql = insert_sql::<E>();
        let row = E::bind_draft(sqlx::query(&sql), &draft)
            .fetch_one(&self.pool)
            .await
            .with_context(|| format!("Failed to insert into {}", E::TABLE))?;

        Ok(E::from_row(&row)?)
    }

    async fn update(&self, id: Id, draft: E::Draft) -> Result<Option<E>> {
        draft.validate_update()?;
        let sql = update_sql::<E>();
        let row = E::bind_draft(sqlx::query(&sql), &draft)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to update {} {}", E::TABLE, id))?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(E::from_row(&row)?))
    }

    async fn delete(&self, id: Id) -> Result<bool> {
        let sql = format!("DELETE FROM {} WHERE id = $1", E::TABLE);
        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to delete {} {}", E::TABLE, id))?;

        Ok(result.rows_affected() > 0)
    }
}

impl Store for PostgresStore {}

impl PgEntity for User {
    const TABLE: &'static str = "users";
    const SELECT_COLUMNS: &'static str = "id, username, email, password_hash, created_at";
    const WRITE_COLUMNS: &'static [&'static str] = &["username", "email", "password_hash"];

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(User {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn bind_draft<'q>(query: PgQuery<'q>, draft: &UserDraft) -> PgQuery<'q> {
        query
            .bind(draft.username.clone())
            .bind(draft.email.clone())
            .bind(draft.password_digest())
    }

    fn update_assignment(column: &str, placeholder: usize) -> String {
        // An update without a password keeps the stored digest.
        if column == "password_hash" {
            format!("password_hash = COALESCE(${}, password_hash)", placeholder)
        } else {
            format!("{} = ${}", column, placeholder)
        }
    }
}

impl PgEntity for Brand {
    const TABLE: &'static str = "brands";
    const SELECT_COLUMNS: &'static str = "id, name, country";
    const WRITE_COLUMNS: &'static [&'static str] = &["name", "country"];

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Brand {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            country: row.try_get("country")?,
        })
    }

    fn bind_draft<'q>(query: PgQuery<'q>, draft: &BrandDraft) -> PgQuery<'q> {
        query
            .bind(draft.name.clone())
            .bind(draft.country.clone().filter(|c| !c.is_empty()))
    }
}

impl PgEntity for Category {
    const TABLE: &'static str = "categories";
    const SELECT_COLUMNS: &'static str = "id, name, description";
    const WRITE_COLUMNS: &'static [&'static str] = &["name", "description"];

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Category {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
        })
    }

    fn bind_draft<'q>(query: PgQuery<'q>, draft: &CategoryDraft) -> PgQuery<'q> {
        query
            .bind(draft.name.clone())
            .bind(draft.description.clone().filter(|d| !d.is_empty()))
    }
}

impl PgEntity for Customer {
    const TABLE: &'static str = "customers";
    const SELECT_COLUMNS: &'static str = "id, user_id, address, phone";
    const WRITE_COLUMNS: &'static [&'static str] = &["user_id", "address", "phone"];

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Customer {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            address: row.try_get("address")?,
            phone: row.try_get("phone")?,
        })
    }

    fn bind_draft<'q>(query: PgQuery<'q>, draft: &CustomerDraft) -> PgQuery<'q> {
        query
            .bind(draft.user_id)
            .bind(draft.address.clone())
            .bind(draft.phone.clone())
    }
}

impl PgEntity for Product {
    const TABLE: &'static str = "products";
    const SELECT_COLUMNS: &'static str =
        "id, name, price, stock, category_id, brand_id, description";
    const WRITE_COLUMNS: &'static [&'static str] = &[
        "name",
        "price",
        "stock",
        "category_id",
        "brand_id",
        "description",
    ];

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Product {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            price: row.try_get("price")?,
            stock: row.try_get("stock")?,
            category_id: row.try_get("category_id")?,
            brand_id: row.try_get("brand_id")?,
            description: row.try_get("description")?,
        })
    }

    fn bind_draft<'q>(query: PgQuery<'q>, draft: &ProductDraft) -> PgQuery<'q> {
        query
            .bind(draft.name.clone())
            .bind(draft.price)
            .bind(draft.stock.unwrap_or(0))
            .bind(draft.category_id)
            .bind(draft.brand_id)
            .bind(draft.description.clone().filter(|d| !d.is_empty()))
    }
}

impl PgEntity for Order {
    const TABLE: &'static str = "orders";
    const SELECT_COLUMNS: &'static str = "id, customer_id, order_date, status, total";
    const WRITE_COLUMNS: &'static [&'static str] =
        &["customer_id", "order_date", "status", "total"];

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Order {
            id: row.try_get("id")?,
            customer_id: row.try_get("customer_id")?,
            order_date: row.try_get("order_date")?,
            status: row.try_get("status")?,
            total: row.try_get("total")?,
        })
    }

    fn bind_draft<'q>(query: PgQuery<'q>, draft: &OrderDraft) -> PgQuery<'q> {
        query
            .bind(draft.customer_id)
            .bind(draft.order_date)
            .bind(draft.status_or_default())
            .bind(draft.total)
    }
}

impl PgEntity for OrderItem {
    const TABLE: &'static str = "order_items";
    const SELECT_COLUMNS: &'static str = "id, order_id, product_id, quantity, price";
    const WRITE_COLUMNS: &'static [&'static str] = &["order_id", "product_id", "quantity", "price"];

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(OrderItem {
            id: row.try_get("id")?,
            order_id: row.try_get("order_id")?,
            product_id: row.try_get("product_id")?,
            quantity: row.try_get("quantity")?,
            price: row.try_get("price")?,
        })
    }

    fn bind_draft<'q>(query: PgQuery<'q>, draft: &OrderItemDraft) -> PgQuery<'q> {
        query
            .bind(draft.order_id)
            .bind(draft.product_id)
            .bind(draft.quantity)
            .bind(draft.price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ValidationError;

    // Never connects: validation has to fail before the first query
    fn unreachable_store() -> PostgresStore {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost:1/none")
            .unwrap();
        PostgresStore { pool }
    }

    #[tokio::test]
    async fn test_invalid_drafts_rejected_before_query() {
        let store = unreachable_store();

        let err = EntityStore::<Brand>::create(&store, BrandDraft::default())
            .await
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<ValidationError>(),
            Some(&ValidationError::new("Name is required"))
        );

        let err = EntityStore::<Customer>::update(&store, 1, CustomerDraft::default())
            .await
            .unwrap_err();
        assert!(err.downcast_ref::<ValidationError>().is_some());
    }

    #[test]
    fn test_insert_returns_row_in_same_statement() {
        assert_eq!(
            insert_sql::<Brand>(),
            "INSERT INTO brands (name, country) VALUES ($1, $2) RETURNING id, name, country"
        );
    }

    #[test]
    fn test_update_keeps_password_when_omitted() {
        assert_eq!(
            update_sql::<User>(),
            "UPDATE users SET username = $1, email = $2, password_hash = COALESCE($3, password_hash) \
             WHERE id = $4 RETURNING id, username, email, password_hash, created_at"
        );
    }

    #[test]
    fn test_filtered_select_uses_parent_key() {
        assert_eq!(
            select_sql::<OrderItem>(true),
            "SELECT id, order_id, product_id, quantity, price FROM order_items WHERE order_id = $1 ORDER BY id"
        );
        // Entities without a filter key ignore the request.
        assert_eq!(
            select_sql::<Brand>(true),
            "SELECT id, name, country FROM brands ORDER BY id"
        );
    }
}
