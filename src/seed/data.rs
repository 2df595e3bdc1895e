use crate::model::{
    Brand, BrandDraft, Category, CategoryDraft, Customer, CustomerDraft, Id, Order, OrderDraft,
    OrderItem, OrderItemDraft, Product, ProductDraft, User, UserDraft,
};
use crate::store::traits::{EntityStore, Store};
use anyhow::Result;
use chrono::NaiveDate;

/// Ids of the catalog rows later seed steps refer to
struct Catalog {
    products: Vec<(Id, f64)>,
}

/// Load a small demo shop: brands, categories, products, two customers with
/// their users, and one order per customer.
pub async fn load_seed_data<S: Store>(store: &S) -> Result<()> {
    let catalog = load_catalog(store).await?;
    let customers = load_customers(store).await?;
    load_orders(store, &catalog, &customers).await?;

    log::info!(
        "Seeded {} products and {} customers",
        catalog.products.len(),
        customers.len()
    );
    Ok(())
}

async fn load_catalog<S: Store>(store: &S) -> Result<Catalog> {
    let acme = EntityStore::<Brand>::create(store, BrandDraft::new("Acme", Some("US"))).await?;
    let nordic =
        EntityStore::<Brand>::create(store, BrandDraft::new("Nordic Goods", Some("SE"))).await?;

    let tools = EntityStore::<Category>::create(
        store,
        CategoryDraft::new("Tools", Some("Hand and power tools")),
    )
    .await?;
    let home =
        EntityStore::<Category>::create(store, CategoryDraft::new("Home", None)).await?;

    let items = [
        ("Claw Hammer", 19.99, 40, tools.id, acme.id),
        ("Cordless Drill", 89.5, 12, tools.id, acme.id),
        ("Wool Blanket", 49.0, 25, home.id, nordic.id),
        ("Oak Cutting Board", 24.75, 0, home.id, nordic.id),
    ];

    let mut products = Vec::with_capacity(items.len());
    for (name, price, stock, category_id, brand_id) in items {
        let product = EntityStore::<Product>::create(
            store,
            ProductDraft {
                name: Some(name.to_string()),
                price: Some(price),
                stock: Some(stock),
                category_id: Some(category_id),
                brand_id: Some(brand_id),
                description: None,
            },
        )
        .await?;
        products.push((product.id, product.price));
    }

    Ok(Catalog { products })
}

async fn load_customers<S: Store>(store: &S) -> Result<Vec<Id>> {
    let people = [
        ("ada", "ada@example.com", "12 Analytical Row", "555-0100"),
        ("grace", "grace@example.com", "7 Compiler Court", "555-0199"),
    ];

    let mut customers = Vec::with_capacity(people.len());
    for (username, email, address, phone) in people {
        let user =
            EntityStore::<User>::create(store, UserDraft::new(username, email, Some("password123")))
                .await?;
        let customer =
            EntityStore::<Customer>::create(store, CustomerDraft::new(user.id, address, phone))
                .await?;
        customers.push(customer.id);
    }

    Ok(customers)
}

async fn load_orders<S: Store>(store: &S, catalog: &Catalog, customers: &[Id]) -> Result<()> {
    let order_date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap_or_default();

    for (customer_id, &(product_id, price)) in customers.iter().zip(catalog.products.iter()) {
        let quantity = 2;
        let order = EntityStore::<Order>::create(
            store,
            OrderDraft {
                customer_id: Some(*customer_id),
                order_date: Some(order_date),
                status: None,
                total: Some(price * f64::from(quantity)),
            },
        )
        .await?;

        EntityStore::<OrderItem>::create(
            store,
            OrderItemDraft::new(order.id, product_id, quantity, price),
        )
        .await?;
    }

    Ok(())
}
