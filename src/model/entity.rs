use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

use crate::model::{CsvRow, Id, RowRejection, ValidationError};

/// The editable field set of an entity: what a form holds, what POST and PUT
/// carry, and what one CSV import row turns into.
///
/// Every field is optional so that an incomplete form can still be held and
/// validated; presence is checked by [`Draft::validate_create`].
pub trait Draft:
    Clone + Debug + Default + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Check the fields a create requires.
    fn validate_create(&self) -> Result<(), ValidationError>;

    /// Check the fields an update requires. Most entities use the create rule.
    fn validate_update(&self) -> Result<(), ValidationError> {
        self.validate_create()
    }

    /// Build a draft from an imported CSV row, coercing numeric columns.
    fn from_csv_row(row: &CsvRow) -> Result<Self, RowRejection>;
}

/// A persisted row of one table.
pub trait Entity:
    Clone + Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    type Draft: Draft;

    /// Display name used in messages ("Brand deleted").
    const NAME: &'static str;
    /// Path segment under `/api`.
    const RESOURCE: &'static str;
    /// Foreign key that `list` may be filtered on, passed as a query parameter.
    const FILTER_KEY: Option<&'static str> = None;
    /// CSV export header, in column order.
    const EXPORT_HEADERS: &'static [&'static str];

    fn id(&self) -> Id;

    /// Value of the [`Entity::FILTER_KEY`] column for this row.
    fn filter_value(&self) -> Option<Id> {
        None
    }

    /// Materialize a new row from a validated draft.
    fn create_from(id: Id, draft: Self::Draft) -> Result<Self, ValidationError>;

    /// Replace every editable field with the draft's values.
    fn replace_with(&mut self, draft: Self::Draft) -> Result<(), ValidationError>;

    /// Pre-fill an edit form from this row.
    fn to_draft(&self) -> Self::Draft;

    /// Text fields matched by the list search box.
    fn search_text(&self) -> Vec<String>;

    /// One CSV export record, aligned with [`Entity::EXPORT_HEADERS`].
    fn export_record(&self) -> Vec<String>;
}

/// Something that can stand in for a foreign key on screen.
pub trait Labelled {
    /// Identifier in the string form used for cross-reference comparison.
    fn key(&self) -> String;
    fn label(&self) -> String;
}
