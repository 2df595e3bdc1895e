use serde::{Deserialize, Serialize};

use crate::model::{
    cell, non_empty, present, require_text, CsvRow, Draft, Entity, Id, Labelled, RowReader,
    RowRejection, ValidationError,
};

const NAME_REQUIRED: &str = "Name is required";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brand {
    pub id: Id,
    pub name: String,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BrandDraft {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

impl BrandDraft {
    pub fn new(name: &str, country: Option<&str>) -> Self {
        Self {
            name: Some(name.to_string()),
            country: country.map(str::to_string),
        }
    }
}

impl Draft for BrandDraft {
    fn validate_create(&self) -> Result<(), ValidationError> {
        if present(&self.name) {
            Ok(())
        } else {
            Err(ValidationError::new(NAME_REQUIRED))
        }
    }

    fn from_csv_row(row: &CsvRow) -> Result<Self, RowRejection> {
        let mut reader = RowReader::new(row);
        let name = reader.required("name");
        let country = reader.optional("country");
        reader.finish()?;
        Ok(Self { name, country })
    }
}

impl Entity for Brand {
    type Draft = BrandDraft;

    const NAME: &'static str = "Brand";
    const RESOURCE: &'static str = "brands";
    const EXPORT_HEADERS: &'static [&'static str] = &["id", "name", "country"];

    fn id(&self) -> Id {
        self.id
    }

    fn create_from(id: Id, draft: BrandDraft) -> Result<Self, ValidationError> {
        Ok(Self {
            id,
            name: require_text(draft.name, NAME_REQUIRED)?,
            country: non_empty(draft.country),
        })
    }

    fn replace_with(&mut self, draft: BrandDraft) -> Result<(), ValidationError> {
        *self = Self::create_from(self.id, draft)?;
        Ok(())
    }

    fn to_draft(&self) -> BrandDraft {
        BrandDraft {
            name: Some(self.name.clone()),
            country: self.country.clone(),
        }
    }

    fn search_text(&self) -> Vec<String> {
        let mut text = vec![self.name.clone()];
        text.extend(self.country.clone());
        text
    }

    fn export_record(&self) -> Vec<String> {
        vec![self.id.to_string(), self.name.clone(), cell(&self.country)]
    }
}

impl Labelled for Brand {
    fn key(&self) -> String {
        self.id.to_string()
    }

    fn label(&self) -> String {
        self.name.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brand_requires_name() {
        assert_eq!(
            BrandDraft::default().validate_create(),
            Err(ValidationError::new("Name is required"))
        );
        assert!(BrandDraft::new("Acme", None).validate_create().is_ok());
    }

    #[test]
    fn test_empty_country_is_stored_as_null() {
        let brand = Brand::create_from(
            1,
            BrandDraft {
                name: Some("Acme".to_string()),
                country: Some(String::new()),
            },
        )
        .unwrap();
        assert_eq!(brand.country, None);
        assert_eq!(
            serde_json::to_value(&brand).unwrap(),
            serde_json::json!({"id": 1, "name": "Acme", "country": null})
        );
    }
}
