use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::api::handlers;
use crate::model::{Brand, Category, Customer, Entity, Order, OrderItem, Product, User};
use crate::store::traits::{EntityStore, Store};

pub fn create_router<S: Store + 'static>() -> Router<Arc<S>> {
    Router::new()
        // Health check
        .route("/", get(handlers::banner))
        .route("/health", get(handlers::health_check))
        // One resource group per table
        .merge(resource_routes::<User, S>(User::RESOURCE))
        .merge(resource_routes::<Brand, S>(Brand::RESOURCE))
        .merge(resource_routes::<Category, S>(Category::RESOURCE))
        .merge(resource_routes::<Customer, S>(Customer::RESOURCE))
        .merge(resource_routes::<Product, S>(Product::RESOURCE))
        .merge(resource_routes::<Order, S>(Order::RESOURCE))
        .merge(resource_routes::<OrderItem, S>(OrderItem::RESOURCE))
        // Path the browser panels used for order items
        .merge(resource_routes::<OrderItem, S>("orderitems"))
        .layer(CorsLayer::permissive())
}

/// list/create/update/delete plus CSV export and import under `/api/{resource}`
fn resource_routes<E, S>(resource: &str) -> Router<Arc<S>>
where
    E: Entity,
    S: EntityStore<E> + 'static,
{
    let collection = format!("/api/{}", resource);
    Router::new()
        .route(
            &collection,
            get(handlers::list_records::<E, S>).post(handlers::create_record::<E, S>),
        )
        .route(
            &format!("{}/export", collection),
            get(handlers::export_records::<E, S>),
        )
        .route(
            &format!("{}/import", collection),
            post(handlers::import_records::<E, S>),
        )
        .route(
            &format!("{}/:id", collection),
            put(handlers::update_record::<E, S>).delete(handlers::delete_record::<E, S>),
        )
}
