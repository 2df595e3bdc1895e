use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::{
    lenient, non_empty, require, CsvRow, Draft, Entity, Id, Labelled, RowReader, RowRejection,
    ValidationError,
};

const REQUIRED: &str = "customer_id, order_date, and total are required";

pub const DEFAULT_ORDER_STATUS: &str = "pending";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: Id,
    pub customer_id: Id,
    pub order_date: NaiveDate,
    pub status: String,
    pub total: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderDraft {
    #[serde(default, deserialize_with = "lenient::id")]
    pub customer_id: Option<Id>,
    #[serde(default, deserialize_with = "lenient::date")]
    pub order_date: Option<NaiveDate>,
    /// Defaults to [`DEFAULT_ORDER_STATUS`] when absent.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient::float")]
    pub total: Option<f64>,
}

impl OrderDraft {
    pub fn status_or_default(&self) -> String {
        non_empty(self.status.clone()).unwrap_or_else(|| DEFAULT_ORDER_STATUS.to_string())
    }
}

impl Draft for OrderDraft {
    fn validate_create(&self) -> Result<(), ValidationError> {
        if self.customer_id.is_some() && self.order_date.is_some() && self.total.is_some() {
            Ok(())
        } else {
            Err(ValidationError::new(REQUIRED))
        }
    }

    fn from_csv_row(row: &CsvRow) -> Result<Self, RowRejection> {
        let mut reader = RowReader::new(row);
        let customer_id = reader.required_number("customer_id")?;
        let order_date = reader.required_date("order_date")?;
        let status = reader.optional("status");
        let total = reader.required_number("total")?;
        reader.finish()?;
        Ok(Self {
            customer_id,
            order_date,
            status,
            total,
        })
    }
}

impl Entity for Order {
    type Draft = OrderDraft;

    const NAME: &'static str = "Order";
    const RESOURCE: &'static str = "orders";
    const FILTER_KEY: Option<&'static str> = Some("customer_id");
    const EXPORT_HEADERS: &'static [&'static str] =
        &["id", "customer_id", "order_date", "status", "total"];

    fn id(&self) -> Id {
        self.id
    }

    fn filter_value(&self) -> Option<Id> {
        Some(self.customer_id)
    }

    fn create_from(id: Id, draft: OrderDraft) -> Result<Self, ValidationError> {
        let status = draft.status_or_default();
        Ok(Self {
            id,
            customer_id: require(draft.customer_id, REQUIRED)?,
            order_date: require(draft.order_date, REQUIRED)?,
            status,
            total: require(draft.total, REQUIRED)?,
        })
    }

    fn replace_with(&mut self, draft: OrderDraft) -> Result<(), ValidationError> {
        *self = Self::create_from(self.id, draft)?;
        Ok(())
    }

    fn to_draft(&self) -> OrderDraft {
        OrderDraft {
            customer_id: Some(self.customer_id),
            order_date: Some(self.order_date),
            status: Some(self.status.clone()),
            total: Some(self.total),
        }
    }

    fn search_text(&self) -> Vec<String> {
        vec![self.status.clone(), self.order_date.to_string()]
    }

    fn export_record(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.customer_id.to_string(),
            self.order_date.to_string(),
            self.status.clone(),
            self.total.to_string(),
        ]
    }
}

impl Labelled for Order {
    fn key(&self) -> String {
        self.id.to_string()
    }

    fn label(&self) -> String {
        format!("#{}", self.id)
    }
}
