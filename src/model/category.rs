use serde::{Deserialize, Serialize};

use crate::model::{
    cell, non_empty, present, require_text, CsvRow, Draft, Entity, Id, Labelled, RowReader,
    RowRejection, ValidationError,
};

const NAME_REQUIRED: &str = "Name is required";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: Id,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryDraft {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl CategoryDraft {
    pub fn new(name: &str, description: Option<&str>) -> Self {
        Self {
            name: Some(name.to_string()),
            description: description.map(str::to_string),
        }
    }
}

impl Draft for CategoryDraft {
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
        let description = reader.optional("description");
        reader.finish()?;
        Ok(Self { name, description })
    }
}

impl Entity for Category {
    type Draft = CategoryDraft;

    const NAME: &'static str = "Category";
    const RESOURCE: &'static str = "categories";
    const EXPORT_HEADERS: &'static [&'static str] = &["id", "name", "description"];

    fn id(&self) -> Id {
        self.id
    }

    fn create_from(id: Id, draft: CategoryDraft) -> Result<Self, ValidationError> {
        Ok(Self {
            id,
            name: require_text(draft.name, NAME_REQUIRED)?,
            description: non_empty(draft.description),
        })
    }

    fn replace_with(&mut self, draft: CategoryDraft) -> Result<(), ValidationError> {
        *self = Self::create_from(self.id, draft)?;
        Ok(())
    }

    fn to_draft(&self) -> CategoryDraft {
        CategoryDraft {
            name: Some(self.name.clone()),
            description: self.description.clone(),
        }
    }

    fn search_text(&self) -> Vec<String> {
        let mut text = vec![self.name.clone()];
        text.extend(self.description.clone());
        text
    }

    fn export_record(&self) -> Vec<String> {
        vec![self.id.to_string(), self.name.clone(), cell(&self.description)]
    }
}

impl Labelled for Category {
    fn key(&self) -> String {
        self.id.to_string()
    }

    fn label(&self) -> String {
        self.name.clone()
    }
}
