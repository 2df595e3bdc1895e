pub mod brand;
pub mod category;
pub mod common;
pub mod customer;
pub mod entity;
pub mod order;
pub mod order_item;
pub mod product;
pub mod user;

pub use brand::*;
pub use category::*;
pub use common::*;
pub use customer::*;
pub use entity::*;
pub use order::*;
pub use order_item::*;
pub use product::*;
pub use user::*;
