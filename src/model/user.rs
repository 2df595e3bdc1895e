use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::model::{
    present, require_text, CsvRow, Draft, Entity, Id, Labelled, RowReader, RowRejection,
    ValidationError,
};

const CREATE_REQUIRED: &str = "Username, password, and email are required";
const UPDATE_REQUIRED: &str = "Username and email are required";

/// Password given to imported users whose CSV row has none.
pub const DEFAULT_IMPORT_PASSWORD: &str = "password123";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Id,
    pub username: String,
    pub email: String,
    /// SHA-256 hex digest. Never leaves the server.
    #[serde(skip)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserDraft {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Plain text on the way in. Omitted on update to keep the current one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl UserDraft {
    pub fn new(username: &str, email: &str, password: Option<&str>) -> Self {
        Self {
            username: Some(username.to_string()),
            email: Some(email.to_string()),
            password: password.map(str::to_string),
        }
    }

    /// Digest of the supplied password, if one was supplied.
    pub fn password_digest(&self) -> Option<String> {
        self.password
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(hash_password)
    }
}

pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

impl Draft for UserDraft {
    fn validate_create(&self) -> Result<(), ValidationError> {
        if present(&self.username) && present(&self.password) && present(&self.email) {
            Ok(())
        } else {
            Err(ValidationError::new(CREATE_REQUIRED))
        }
    }

    fn validate_update(&self) -> Result<(), ValidationError> {
        if present(&self.username) && present(&self.email) {
            Ok(())
        } else {
            Err(ValidationError::new(UPDATE_REQUIRED))
        }
    }

    fn from_csv_row(row: &CsvRow) -> Result<Self, RowRejection> {
        let mut reader = RowReader::new(row);
        let username = reader.required("username");
        let email = reader.required("email");
        let password = reader
            .optional("password")
            .unwrap_or_else(|| DEFAULT_IMPORT_PASSWORD.to_string());
        reader.finish()?;
        Ok(Self {
            username,
            email,
            password: Some(password),
        })
    }
}

impl Entity for User {
    type Draft = UserDraft;

    const NAME: &'static str = "User";
    const RESOURCE: &'static str = "users";
    const EXPORT_HEADERS: &'static [&'static str] = &["id", "username", "email", "created_at"];

    fn id(&self) -> Id {
        self.id
    }

    fn create_from(id: Id, draft: UserDraft) -> Result<Self, ValidationError> {
        let password_hash = draft
            .password_digest()
            .ok_or_else(|| ValidationError::new(CREATE_REQUIRED))?;
        Ok(Self {
            id,
            username: require_text(draft.username, CREATE_REQUIRED)?,
            email: require_text(draft.email, CREATE_REQUIRED)?,
            password_hash,
            created_at: Utc::now(),
        })
    }

    fn replace_with(&mut self, draft: UserDraft) -> Result<(), ValidationError> {
        let password_hash = draft.password_digest();
        self.username = require_text(draft.username, UPDATE_REQUIRED)?;
        self.email = require_text(draft.email, UPDATE_REQUIRED)?;
        if let Some(hash) = password_hash {
            self.password_hash = hash;
        }
        Ok(())
    }

    fn to_draft(&self) -> UserDraft {
        // Edit forms never show the stored password.
        UserDraft {
            username: Some(self.username.clone()),
            email: Some(self.email.clone()),
            password: None,
        }
    }

    fn search_text(&self) -> Vec<String> {
        vec![self.username.clone(), self.email.clone()]
    }

    fn export_record(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.username.clone(),
            self.email.clone(),
            self.created_at.to_rfc3339(),
        ]
    }
}

impl Labelled for User {
    fn key(&self) -> String {
        self.id.to_string()
    }

    fn label(&self) -> String {
        format!("{} ({})", self.username, self.email)
    }
}
