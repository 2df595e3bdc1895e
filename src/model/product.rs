use serde::{Deserialize, Serialize};

use crate::model::{
    cell, lenient, non_empty, present, require, require_text, CsvRow, Draft, Entity, Id, Labelled,
    RowReader, RowRejection, ValidationError,
};

const REQUIRED: &str = "Missing required fields";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Id,
    pub name: String,
    pub price: f64,
    pub stock: i32,
    pub category_id: Id,
    pub brand_id: Id,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductDraft {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::float")]
    pub price: Option<f64>,
    /// Defaults to 0 when absent.
    #[serde(default, deserialize_with = "lenient::int")]
    pub stock: Option<i32>,
    #[serde(default, deserialize_with = "lenient::id")]
    pub category_id: Option<Id>,
    #[serde(default, deserialize_with = "lenient::id")]
    pub brand_id: Option<Id>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Draft for ProductDraft {
    fn validate_create(&self) -> Result<(), ValidationError> {
        if present(&self.name)
            && self.price.is_some()
            && self.category_id.is_some()
            && self.brand_id.is_some()
        {
            Ok(())
        } else {
            Err(ValidationError::new(REQUIRED))
        }
    }

    fn from_csv_row(row: &CsvRow) -> Result<Self, RowRejection> {
        let mut reader = RowReader::new(row);
        let name = reader.required("name");
        let price = reader.required_number("price")?;
        let stock = reader.optional_number("stock")?.or(Some(0));
        let category_id = reader.required_number("category_id")?;
        let brand_id = reader.required_number("brand_id")?;
        let description = reader.optional("description");
        reader.finish()?;
        Ok(Self {
            name,
            price,
            stock,
            category_id,
            brand_id,
            description,
        })
    }
}

impl Entity for Product {
    type Draft = ProductDraft;

    const NAME: &'static str = "Product";
    const RESOURCE: &'static str = "products";
    const FILTER_KEY: Option<&'static str> = Some("category_id");
    const EXPORT_HEADERS: &'static [&'static str] = &[
        "id",
        "name",
        "price",
        "stock",
        "category_id",
        "brand_id",
        "description",
    ];

    fn id(&self) -> Id {
        self.id
    }

    fn filter_value(&self) -> Option<Id> {
        Some(self.category_id)
    }

    fn create_from(id: Id, draft: ProductDraft) -> Result<Self, ValidationError> {
        Ok(Self {
            id,
            name: require_text(draft.name, REQUIRED)?,
            price: require(draft.price, REQUIRED)?,
            stock: draft.stock.unwrap_or(0),
            category_id: require(draft.category_id, REQUIRED)?,
            brand_id: require(draft.brand_id, REQUIRED)?,
            description: non_empty(draft.description),
        })
    }

    fn replace_with(&mut self, draft: ProductDraft) -> Result<(), ValidationError> {
        *self = Self::create_from(self.id, draft)?;
        Ok(())
    }

    fn to_draft(&self) -> ProductDraft {
        ProductDraft {
            name: Some(self.name.clone()),
            price: Some(self.price),
            stock: Some(self.stock),
            category_id: Some(self.category_id),
            brand_id: Some(self.brand_id),
            description: self.description.clone(),
        }
    }

    fn search_text(&self) -> Vec<String> {
        let mut text = vec![self.name.clone()];
        text.extend(self.description.clone());
        text
    }

    fn export_record(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            self.price.to_string(),
            self.stock.to_string(),
            self.category_id.to_string(),
            self.brand_id.to_string(),
            cell(&self.description),
        ]
    }
}

impl Labelled for Product {
    fn key(&self) -> String {
        self.id.to_string()
    }

    fn label(&self) -> String {
        self.name.clone()
    }
}
