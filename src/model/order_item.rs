use serde::{Deserialize, Serialize};

use crate::model::{
    lenient, require, CsvRow, Draft, Entity, Id, RowReader, RowRejection, ValidationError,
};

const REQUIRED: &str = "order_id, product_id, quantity, and price are required";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: Id,
    pub order_id: Id,
    pub product_id: Id,
    pub quantity: i32,
    pub price: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderItemDraft {
    #[serde(default, deserialize_with = "lenient::id")]
    pub order_id: Option<Id>,
    #[serde(default, deserialize_with = "lenient::id")]
    pub product_id: Option<Id>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub quantity: Option<i32>,
    #[serde(default, deserialize_with = "lenient::float")]
    pub price: Option<f64>,
}

impl OrderItemDraft {
    pub fn new(order_id: Id, product_id: Id, quantity: i32, price: f64) -> Self {
        Self {
            order_id: Some(order_id),
            product_id: Some(product_id),
            quantity: Some(quantity),
            price: Some(price),
        }
    }
}

impl Draft for OrderItemDraft {
    fn validate_create(&self) -> Result<(), ValidationError> {
        if self.order_id.is_some()
            && self.product_id.is_some()
            && self.quantity.is_some()
            && self.price.is_some()
        {
            Ok(())
        } else {
            Err(ValidationError::new(REQUIRED))
        }
    }

    fn from_csv_row(row: &CsvRow) -> Result<Self, RowRejection> {
        let mut reader = RowReader::new(row);
        let order_id = reader.required_number("order_id")?;
        let product_id = reader.required_number("product_id")?;
        let quantity = reader.required_number("quantity")?;
        let price = reader.required_number("price")?;
        reader.finish()?;
        Ok(Self {
            order_id,
            product_id,
            quantity,
            price,
        })
    }
}

impl Entity for OrderItem {
    type Draft = OrderItemDraft;

    const NAME: &'static str = "Order item";
    const RESOURCE: &'static str = "order_items";
    const FILTER_KEY: Option<&'static str> = Some("order_id");
    const EXPORT_HEADERS: &'static [&'static str] =
        &["id", "order_id", "product_id", "quantity", "price"];

    fn id(&self) -> Id {
        self.id
    }

    fn filter_value(&self) -> Option<Id> {
        Some(self.order_id)
    }

    fn create_from(id: Id, draft: OrderItemDraft) -> Result<Self, ValidationError> {
        Ok(Self {
            id,
            order_id: require(draft.order_id, REQUIRED)?,
            product_id: require(draft.product_id, REQUIRED)?,
            quantity: require(draft.quantity, REQUIRED)?,
            price: require(draft.price, REQUIRED)?,
        })
    }

    fn replace_with(&mut self, draft: OrderItemDraft) -> Result<(), ValidationError> {
        *self = Self::create_from(self.id, draft)?;
        Ok(())
    }

    fn to_draft(&self) -> OrderItemDraft {
        OrderItemDraft::new(self.order_id, self.product_id, self.quantity, self.price)
    }

    fn search_text(&self) -> Vec<String> {
        vec![self.quantity.to_string(), self.price.to_string()]
    }

    fn export_record(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.order_id.to_string(),
            self.product_id.to_string(),
            self.quantity.to_string(),
            self.price.to_string(),
        ]
    }
}
