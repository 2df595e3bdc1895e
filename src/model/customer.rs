use serde::{Deserialize, Serialize};

use crate::model::{
    lenient, present, require, require_text, CsvRow, Draft, Entity, Id, Labelled, RowReader,
    RowRejection, ValidationError,
};

const REQUIRED: &str = "user_id, address, and phone are required";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: Id,
    pub user_id: Id,
    pub address: String,
    pub phone: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerDraft {
    #[serde(default, deserialize_with = "lenient::id")]
    pub user_id: Option<Id>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl CustomerDraft {
    pub fn new(user_id: Id, address: &str, phone: &str) -> Self {
        Self {
            user_id: Some(user_id),
            address: Some(address.to_string()),
            phone: Some(phone.to_string()),
        }
    }
}

impl Draft for CustomerDraft {
    fn validate_create(&self) -> Result<(), ValidationError> {
        if self.user_id.is_some() && present(&self.address) && present(&self.phone) {
            Ok(())
        } else {
            Err(ValidationError::new(REQUIRED))
        }
    }

    fn from_csv_row(row: &CsvRow) -> Result<Self, RowRejection> {
        let mut reader = RowReader::new(row);
        let user_id = reader.required_number("user_id")?;
        let address = reader.required("address");
        let phone = reader.required("phone");
        reader.finish()?;
        Ok(Self {
            user_id,
            address,
            phone,
        })
    }
}

impl Entity for Customer {
    type Draft = CustomerDraft;

    const NAME: &'static str = "Customer";
    const RESOURCE: &'static str = "customers";
    const EXPORT_HEADERS: &'static [&'static str] = &["id", "user_id", "address", "phone"];

    fn id(&self) -> Id {
        self.id
    }

    fn create_from(id: Id, draft: CustomerDraft) -> Result<Self, ValidationError> {
        Ok(Self {
            id,
            user_id: require(draft.user_id, REQUIRED)?,
            address: require_text(draft.address, REQUIRED)?,
            phone: require_text(draft.phone, REQUIRED)?,
        })
    }

    fn replace_with(&mut self, draft: CustomerDraft) -> Result<(), ValidationError> {
        *self = Self::create_from(self.id, draft)?;
        Ok(())
    }

    fn to_draft(&self) -> CustomerDraft {
        CustomerDraft {
            user_id: Some(self.user_id),
            address: Some(self.address.clone()),
            phone: Some(self.phone.clone()),
        }
    }

    fn search_text(&self) -> Vec<String> {
        vec![
            self.user_id.to_string(),
            self.address.clone(),
            self.phone.clone(),
        ]
    }

    fn export_record(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.user_id.to_string(),
            self.address.clone(),
            self.phone.clone(),
        ]
    }
}

/// Without the user list a customer can only be shown by its user id.
impl Labelled for Customer {
    fn key(&self) -> String {
        self.id.to_string()
    }

    fn label(&self) -> String {
        self.user_id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[(&str, &str)]) -> CsvRow {
        cells
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_csv_row_coerces_user_id() {
        let draft =
            CustomerDraft::from_csv_row(&row(&[("user_id", " 7 "), ("address", "1 Main St"), ("phone", "555")]))
                .unwrap();
        assert_eq!(draft, CustomerDraft::new(7, "1 Main St", "555"));
    }

    #[test]
    fn test_csv_row_rejections() {
        let missing =
            CustomerDraft::from_csv_row(&row(&[("user_id", "7"), ("address", "")])).unwrap_err();
        assert_eq!(missing, RowRejection::Missing(vec!["address", "phone"]));

        let invalid = CustomerDraft::from_csv_row(&row(&[
            ("user_id", "seven"),
            ("address", "1 Main St"),
            ("phone", "555"),
        ]))
        .unwrap_err();
        assert_eq!(
            invalid.to_string(),
            "invalid value 'seven' in column 'user_id'"
        );
    }

    #[test]
    fn test_label_falls_back_to_user_id() {
        let customer = Customer::create_from(3, CustomerDraft::new(9, "x", "y")).unwrap();
        assert_eq!(customer.key(), "3");
        assert_eq!(customer.label(), "9");
    }
}
