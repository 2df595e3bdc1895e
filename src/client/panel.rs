use anyhow::Result;
use std::io::Read;

use crate::client::http::user_message;
use crate::logic::{matches_search, parse_rows, run_import, ImportBatch, ImportReport};
use crate::model::{Draft, Entity, Id, ValidationError};
use crate::store::traits::EntityStore;

/// Where a submitted draft goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitTarget {
    Create,
    Update(Id),
}

/// Form state of a panel. The add form is the draft held while idle.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelMode<D> {
    Idle { draft: D },
    Editing { id: Id, draft: D },
    Submitting { target: SubmitTarget, draft: D },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Banner {
    Error(String),
    Success(String),
}

/// The request a panel wants sent after [`EntityPanel::submit`].
#[derive(Debug, Clone, PartialEq)]
pub struct Submission<D> {
    pub target: SubmitTarget,
    pub draft: D,
}

/// A transition that is not allowed from the current state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PanelError {
    #[error("a request is already in flight")]
    Busy,
    #[error("no request is in flight")]
    NotSubmitting,
    #[error("{0} {1} is not in the loaded list")]
    UnknownRecord(&'static str, Id),
    #[error("an import is already running")]
    ImportRunning,
}

/// List, form, search and import state for one entity.
///
/// Transitions are plain methods on the struct; the async helpers at the end
/// pair them with calls on an [`EntityStore`].
#[derive(Debug, Clone)]
pub struct EntityPanel<E: Entity> {
    records: Vec<E>,
    mode: PanelMode<E::Draft>,
    search: String,
    banner: Option<Banner>,
    importing: bool,
}

impl<E: Entity> Default for EntityPanel<E> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            mode: PanelMode::Idle {
                draft: E::Draft::default(),
            },
            search: String::new(),
            banner: None,
            importing: false,
        }
    }
}

impl<E: Entity> EntityPanel<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[E] {
        &self.records
    }

    pub fn mode(&self) -> &PanelMode<E::Draft> {
        &self.mode
    }

    pub fn banner(&self) -> Option<&Banner> {
        self.banner.as_ref()
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn is_importing(&self) -> bool {
        self.importing
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self.mode, PanelMode::Submitting { .. })
    }

    pub fn draft(&self) -> &E::Draft {
        match &self.mode {
            PanelMode::Idle { draft }
            | PanelMode::Editing { draft, .. }
            | PanelMode::Submitting { draft, .. } => draft,
        }
    }

    /// Replace the snapshot wholesale.
    pub fn load(&mut self, records: Vec<E>) {
        self.records = records;
    }

    /// The draft behind the visible form. Locked while a request is in flight.
    pub fn form_mut(&mut self) -> Result<&mut E::Draft, PanelError> {
        match &mut self.mode {
            PanelMode::Idle { draft } | PanelMode::Editing { draft, .. } => Ok(draft),
            PanelMode::Submitting { .. } => Err(PanelError::Busy),
        }
    }

    /// Open the edit form pre-filled from the loaded row `id`.
    pub fn begin_edit(&mut self, id: Id) -> Result<(), PanelError> {
        if self.is_submitting() {
            return Err(PanelError::Busy);
        }
        let record = self
            .records
            .iter()
            .find(|r| r.id() == id)
            .ok_or(PanelError::UnknownRecord(E::NAME, id))?;

        self.mode = PanelMode::Editing {
            id,
            draft: record.to_draft(),
        };
        self.banner = None;
        Ok(())
    }

    /// Leave the edit form, clearing the draft and both banners.
    pub fn cancel(&mut self) -> Result<(), PanelError> {
        if self.is_submitting() {
            return Err(PanelError::Busy);
        }
        self.mode = PanelMode::Idle {
            draft: E::Draft::default(),
        };
        self.banner = None;
        Ok(())
    }

    /// Check required fields and move to `Submitting`.
    ///
    /// Returns `Ok(None)` when a field is missing: the error banner is set,
    /// the state is unchanged and nothing should be sent.
    pub fn submit(&mut self) -> Result<Option<Submission<E::Draft>>, PanelError> {
        let (target, draft) = match &self.mode {
            PanelMode::Submitting { .. } => return Err(PanelError::Busy),
            PanelMode::Idle { draft } => (SubmitTarget::Create, draft),
            PanelMode::Editing { id, draft } => (SubmitTarget::Update(*id), draft),
        };

        let checked = match target {
            SubmitTarget::Create => draft.validate_create(),
            SubmitTarget::Update(_) => draft.validate_update(),
        };
        if let Err(ValidationError(message)) = checked {
            self.banner = Some(Banner::Error(message));
            return Ok(None);
        }

        let draft = draft.clone();
        self.mode = PanelMode::Submitting {
            target,
            draft: draft.clone(),
        };
        Ok(Some(Submission { target, draft }))
    }

    /// Resolve the in-flight submission.
    ///
    /// Success patches the list and resets to an empty add form. Failure goes
    /// back to the form the submission came from with the draft intact.
    pub fn complete_submit(&mut self, result: Result<E, String>) -> Result<(), PanelError> {
        let PanelMode::Submitting { target, draft } = &self.mode else {
            return Err(PanelError::NotSubmitting);
        };
        let target = *target;

        match result {
            Ok(record) => {
                let message = match target {
                    SubmitTarget::Create => {
                        self.records.push(record);
                        format!("{} added!", E::NAME)
                    }
                    SubmitTarget::Update(id) => {
                        match self.records.iter_mut().find(|r| r.id() == id) {
                            Some(slot) => *slot = record,
                            None => self.records.push(record),
                        }
                        format!("{} updated!", E::NAME)
                    }
                };
                self.mode = PanelMode::Idle {
                    draft: E::Draft::default(),
                };
                self.banner = Some(Banner::Success(message));
            }
            Err(message) => {
                let draft = draft.clone();
                self.mode = match target {
                    SubmitTarget::Create => PanelMode::Idle { draft },
                    SubmitTarget::Update(id) => PanelMode::Editing { id, draft },
                };
                self.banner = Some(Banner::Error(message));
            }
        }
        Ok(())
    }

    /// Resolve a delete of `id`. The row leaves the list only when the
    /// delete went through.
    pub fn complete_delete(&mut self, id: Id, deleted: bool) {
        if !deleted {
            self.banner = Some(Banner::Error("Delete failed".to_string()));
            return;
        }

        self.records.retain(|r| r.id() != id);
        if matches!(self.mode, PanelMode::Editing { id: editing, .. } if editing == id) {
            self.mode = PanelMode::Idle {
                draft: E::Draft::default(),
            };
        }
        self.banner = Some(Banner::Success(format!("{} deleted!", E::NAME)));
    }

    pub fn set_search(&mut self, search: &str) {
        self.search = search.to_string();
    }

    /// Loaded rows matching the search box on their own text fields.
    pub fn visible(&self) -> Vec<&E> {
        self.visible_with(|_| Vec::new())
    }

    /// Like [`EntityPanel::visible`], also matching the resolved labels that
    /// `labels` returns for each row (brand name, customer, ...).
    pub fn visible_with<F>(&self, labels: F) -> Vec<&E>
    where
        F: Fn(&E) -> Vec<String>,
    {
        self.records
            .iter()
            .filter(|record| {
                let mut fields = record.search_text();
                fields.extend(labels(record));
                matches_search(&self.search, &fields)
            })
            .collect()
    }

    pub fn begin_import(&mut self) -> Result<(), PanelError> {
        if self.importing {
            return Err(PanelError::ImportRunning);
        }
        self.importing = true;
        self.banner = None;
        Ok(())
    }

    /// Append the created rows in completion order and summarize the report.
    pub fn finish_import(&mut self, batch: ImportBatch<E>) -> ImportReport {
        self.importing = false;
        self.records.extend(batch.records);
        self.banner = Some(Banner::Success(batch.report.summary()));
        batch.report
    }

    pub fn fail_import(&mut self, message: String) {
        self.importing = false;
        self.banner = Some(Banner::Error(message));
    }

    /// Fetch the list from `store` and replace the snapshot.
    pub async fn reload<S>(&mut self, store: &S, parent: Option<Id>) -> Result<()>
    where
        S: EntityStore<E> + ?Sized,
    {
        match store.list(parent).await {
            Ok(records) => {
                self.load(records);
                Ok(())
            }
            Err(e) => {
                self.banner = Some(Banner::Error(failure_message(&e, "Load")));
                Err(e)
            }
        }
    }

    /// Submit the form through `store` and resolve the outcome.
    /// Returns the persisted row when the save went through.
    pub async fn save<S>(&mut self, store: &S) -> Result<Option<E>, PanelError>
    where
        S: EntityStore<E> + ?Sized,
    {
        let Some(submission) = self.submit()? else {
            return Ok(None);
        };

        let outcome = match submission.target {
            SubmitTarget::Create => store
                .create(submission.draft)
                .await
                .map_err(|e| failure_message(&e, "Add")),
            SubmitTarget::Update(id) => match store.update(id, submission.draft).await {
                Ok(Some(record)) => Ok(record),
                Ok(None) => Err(format!("{} not found", E::NAME)),
                Err(e) => Err(failure_message(&e, "Update")),
            },
        };

        let saved = outcome.as_ref().ok().cloned();
        self.complete_submit(outcome)?;
        Ok(saved)
    }

    /// Delete `id` through `store`.
    pub async fn remove<S>(&mut self, store: &S, id: Id) -> bool
    where
        S: EntityStore<E> + ?Sized,
    {
        let deleted = match store.delete(id).await {
            Ok(deleted) => deleted,
            Err(e) => {
                log::warn!("Delete of {} {} failed: {:#}", E::NAME, id, e);
                false
            }
        };
        self.complete_delete(id, deleted);
        deleted
    }

    /// Parse a CSV file and import its rows through `store`, one at a time.
    pub async fn import_csv<S, R>(
        &mut self,
        store: &S,
        input: R,
    ) -> Result<Option<ImportReport>, PanelError>
    where
        S: EntityStore<E> + ?Sized,
        R: Read,
    {
        self.begin_import()?;
        let rows = match parse_rows(input) {
            Ok(rows) => rows,
            Err(e) => {
                self.fail_import(format!("Import failed: {:#}", e));
                return Ok(None);
            }
        };

        let batch = run_import::<E, S>(store, &rows).await;
        Ok(Some(self.finish_import(batch)))
    }
}

/// Banner text for a failed store call: the server's or validator's message
/// when there is one, otherwise "<action> failed".
fn failure_message(err: &anyhow::Error, action: &str) -> String {
    user_message(err).unwrap_or_else(|| format!("{} failed", action))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::http::ClientError;
    use crate::logic::RowStatus;
    use crate::model::{Brand, BrandDraft, User, UserDraft};
    use crate::store::memory::MemoryStore;
    use chrono::Utc;

    fn brand(id: Id, name: &str) -> Brand {
        Brand {
            id,
            name: name.to_string(),
            country: None,
        }
    }

    fn loaded() -> EntityPanel<Brand> {
        let mut panel = EntityPanel::new();
        panel.load(vec![brand(1, "Acme"), brand(2, "Birch")]);
        panel
    }

    #[test]
    fn test_edit_prefills_and_cancel_clears() {
        let mut panel = loaded();
        panel.banner = Some(Banner::Error("old".to_string()));

        panel.begin_edit(2).unwrap();
        assert_eq!(
            panel.mode(),
            &PanelMode::Editing {
                id: 2,
                draft: BrandDraft::new("Birch", None)
            }
        );
        assert_eq!(panel.banner(), None);

        panel.form_mut().unwrap().country = Some("SE".to_string());
        panel.banner = Some(Banner::Error("old".to_string()));
        panel.cancel().unwrap();
        assert_eq!(
            panel.mode(),
            &PanelMode::Idle {
                draft: BrandDraft::default()
            }
        );
        assert_eq!(panel.banner(), None);
    }

    #[test]
    fn test_edit_of_unloaded_row_is_rejected() {
        let mut panel = loaded();
        assert_eq!(
            panel.begin_edit(9),
            Err(PanelError::UnknownRecord("Brand", 9))
        );
    }

    #[test]
    fn test_missing_field_blocks_submit() {
        let mut panel = loaded();
        assert_eq!(panel.submit().unwrap(), None);
        assert_eq!(
            panel.banner(),
            Some(&Banner::Error("Name is required".to_string()))
        );
        assert!(!panel.is_submitting());
    }

    #[test]
    fn test_create_success_appends_and_resets_form() {
        let mut panel = loaded();
        *panel.form_mut().unwrap() = BrandDraft::new("Cobalt", None);

        let submission = panel.submit().unwrap().unwrap();
        assert_eq!(submission.target, SubmitTarget::Create);
        assert_eq!(panel.form_mut(), Err(PanelError::Busy));
        assert_eq!(panel.submit(), Err(PanelError::Busy));

        panel.complete_submit(Ok(brand(3, "Cobalt"))).unwrap();
        assert_eq!(panel.records().len(), 3);
        assert_eq!(panel.draft(), &BrandDraft::default());
        assert_eq!(
            panel.banner(),
            Some(&Banner::Success("Brand added!".to_string()))
        );
    }

    #[test]
    fn test_update_failure_returns_to_editing_with_draft() {
        let mut panel = loaded();
        panel.begin_edit(1).unwrap();
        panel.form_mut().unwrap().name = Some("Acme Corp".to_string());
        panel.submit().unwrap().unwrap();

        panel
            .complete_submit(Err("Update failed".to_string()))
            .unwrap();
        assert_eq!(
            panel.mode(),
            &PanelMode::Editing {
                id: 1,
                draft: BrandDraft::new("Acme Corp", None)
            }
        );
        assert_eq!(panel.records()[0].name, "Acme");
        assert_eq!(
            panel.complete_submit(Ok(brand(1, "x"))),
            Err(PanelError::NotSubmitting)
        );
    }

    #[test]
    fn test_update_success_replaces_by_id() {
        let mut panel = loaded();
        panel.begin_edit(1).unwrap();
        panel.submit().unwrap().unwrap();
        panel.complete_submit(Ok(brand(1, "Acme Corp"))).unwrap();

        assert_eq!(panel.records()[0], brand(1, "Acme Corp"));
        assert_eq!(panel.records().len(), 2);
        assert_eq!(
            panel.banner(),
            Some(&Banner::Success("Brand updated!".to_string()))
        );
    }

    #[test]
    fn test_delete_outcomes() {
        let mut panel = loaded();
        panel.complete_delete(1, false);
        assert_eq!(panel.records().len(), 2);
        assert_eq!(
            panel.banner(),
            Some(&Banner::Error("Delete failed".to_string()))
        );

        panel.begin_edit(1).unwrap();
        panel.complete_delete(1, true);
        assert_eq!(panel.records(), &[brand(2, "Birch")]);
        assert!(matches!(panel.mode(), PanelMode::Idle { .. }));
        assert_eq!(
            panel.banner(),
            Some(&Banner::Success("Brand deleted!".to_string()))
        );
    }

    #[test]
    fn test_search_covers_fields_and_labels() {
        let mut panel = loaded();
        panel.set_search("bir");
        assert_eq!(panel.visible(), vec![&brand(2, "Birch")]);

        panel.set_search("sweden");
        assert!(panel.visible().is_empty());
        let labelled = panel.visible_with(|b| {
            if b.id == 1 {
                vec!["Sweden".to_string()]
            } else {
                Vec::new()
            }
        });
        assert_eq!(labelled, vec![&brand(1, "Acme")]);
    }

    #[test]
    fn test_user_edit_leaves_password_blank() {
        let mut panel: EntityPanel<User> = EntityPanel::new();
        panel.load(vec![User {
            id: 4,
            username: "ada".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: "digest".to_string(),
            created_at: Utc::now(),
        }]);
        panel.begin_edit(4).unwrap();
        assert_eq!(panel.draft(), &UserDraft::new("ada", "ada@example.com", None));
        assert!(panel.submit().unwrap().is_some());
    }

    #[tokio::test]
    async fn test_save_and_remove_through_store() {
        let store = MemoryStore::new();
        let mut panel: EntityPanel<Brand> = EntityPanel::new();
        panel.reload(&store, None).await.unwrap();
        assert!(panel.records().is_empty());

        *panel.form_mut().unwrap() = BrandDraft::new("Acme", Some("US"));
        let saved = panel.save(&store).await.unwrap().unwrap();
        assert_eq!(saved.id, 1);

        panel.begin_edit(1).unwrap();
        panel.form_mut().unwrap().name = Some(String::new());
        assert_eq!(panel.save(&store).await.unwrap(), None);
        assert_eq!(
            panel.banner(),
            Some(&Banner::Error("Name is required".to_string()))
        );

        panel.cancel().unwrap();
        assert!(panel.remove(&store, 1).await);
        assert!(!panel.remove(&store, 1).await);
        assert!(panel.records().is_empty());
        assert!(EntityStore::<Brand>::list(&store, None)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_import_reports_and_appends() {
        let store = MemoryStore::new();
        let mut panel: EntityPanel<Brand> = EntityPanel::new();

        let csv = "name,country\nAcme,US\n,DE\nBirch,\n";
        let report = panel
            .import_csv(&store, csv.as_bytes())
            .await
            .unwrap()
            .unwrap();

        assert_eq!((report.created, report.skipped, report.failed), (2, 1, 0));
        assert_eq!(report.rows[2].result, RowStatus::Created { id: 2 });
        assert_eq!(panel.records().len(), 2);
        assert!(!panel.is_importing());
        assert_eq!(
            panel.banner(),
            Some(&Banner::Success(
                "Import complete: 2 created, 1 skipped, 0 failed".to_string()
            ))
        );
    }

    #[test]
    fn test_second_import_is_refused_while_running() {
        let mut panel = loaded();
        panel.begin_import().unwrap();
        assert_eq!(panel.begin_import(), Err(PanelError::ImportRunning));
        panel.fail_import("Import failed: bad header".to_string());
        assert!(!panel.is_importing());
    }

    #[test]
    fn test_failure_message_prefers_known_errors() {
        let rejected = anyhow::Error::new(ClientError::Rejected {
            status: 400,
            message: "Missing required fields".to_string(),
        });
        assert_eq!(failure_message(&rejected, "Add"), "Missing required fields");

        let invalid = anyhow::Error::new(ValidationError::new("Name is required"));
        assert_eq!(failure_message(&invalid, "Update"), "Name is required");

        let other = anyhow::anyhow!("connection refused");
        assert_eq!(failure_message(&other, "Load"), "Load failed");
    }
}
