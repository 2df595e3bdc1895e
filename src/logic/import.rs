use serde::{Deserialize, Serialize};

use crate::client::http::user_message;
use crate::model::{CsvRow, Draft, Entity, Id};
use crate::store::traits::EntityStore;

/// What happened to one imported row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum RowStatus {
    Created { id: Id },
    /// Required fields missing or a value could not be coerced. Not sent.
    Skipped { reason: String },
    /// Sent, but the create call failed. Driver errors are reported as
    /// "Database error"; the full chain only goes to the log.
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowOutcome {
    /// 1-based position among the data rows of the file.
    pub row: usize,
    pub result: RowStatus,
}

/// Per-row log of a bulk import plus aggregate counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportReport {
    pub created: usize,
    pub skipped: usize,
    pub failed: usize,
    pub rows: Vec<RowOutcome>,
}

impl ImportReport {
    fn record(&mut self, row: usize, result: RowStatus) {
        match result {
            RowStatus::Created { .. } => self.created += 1,
            RowStatus::Skipped { .. } => self.skipped += 1,
            RowStatus::Failed { .. } => self.failed += 1,
        }
        self.rows.push(RowOutcome { row, result });
    }

    pub fn total(&self) -> usize {
        self.rows.len()
    }

    pub fn summary(&self) -> String {
        format!(
            "Import complete: {} created, {} skipped, {} failed",
            self.created, self.skipped, self.failed
        )
    }
}

/// Records created by an import, in completion order, and the report.
#[derive(Debug, Clone)]
pub struct ImportBatch<E> {
    pub records: Vec<E>,
    pub report: ImportReport,
}

/// Create one record per row, strictly in file order, awaiting each create
/// before the next. A failing row never aborts the run.
pub async fn run_import<E, S>(store: &S, rows: &[CsvRow]) -> ImportBatch<E>
where
    E: Entity,
    S: EntityStore<E> + ?Sized,
{
    let mut records = Vec::new();
    let mut report = ImportReport::default();

    for (index, row) in rows.iter().enumerate() {
        let line = index + 1;
        let draft = match E::Draft::from_csv_row(row) {
            Ok(draft) => draft,
            Err(rejection) => {
                log::debug!("Skipping {} import row {}: {}", E::NAME, line, rejection);
                report.record(
                    line,
                    RowStatus::Skipped {
                        reason: rejection.to_string(),
                    },
                );
                continue;
            }
        };

        match store.create(draft).await {
            Ok(record) => {
                report.record(line, RowStatus::Created { id: record.id() });
                records.push(record);
            }
            Err(e) => {
                log::warn!("{} import row {} failed: {:#}", E::NAME, line, e);
                report.record(
                    line,
                    RowStatus::Failed {
                        reason: user_message(&e)
                            .unwrap_or_else(|| "Database error".to_string()),
                    },
                );
            }
        }
    }

    log::info!("{} import finished: {}", E::NAME, report.summary());
    ImportBatch { records, report }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Brand, BrandDraft, Id, ValidationError};
    use anyhow::{anyhow, Result};
    use parking_lot::Mutex;

    /// Store double that rejects chosen names and records call order.
    /// `reject` fails validation, `broken` fails like a database driver.
    struct FlakyBrands {
        reject: &'static str,
        broken: &'static str,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl EntityStore<Brand> for FlakyBrands {
        async fn list(&self, _parent: Option<Id>) -> Result<Vec<Brand>> {
            Ok(Vec::new())
        }

        async fn get(&self, _id: Id) -> Result<Option<Brand>> {
            Ok(None)
        }

        async fn create(&self, draft: BrandDraft) -> Result<Brand> {
            let name = draft.name.unwrap_or_default();
            let mut calls = self.calls.lock();
            calls.push(name.clone());
            if name == self.reject {
                return Err(ValidationError::new("duplicate brand").into());
            }
            if name == self.broken {
                return Err(anyhow!(
                    "error returned from database: violates foreign key constraint \"products_brand_id_fkey\""
                )
                .context("Failed to insert into brands"));
            }
            Ok(Brand {
                id: calls.len() as Id,
                name,
                country: draft.country,
            })
        }

        async fn update(&self, _id: Id, _draft: BrandDraft) -> Result<Option<Brand>> {
            Ok(None)
        }

        async fn delete(&self, _id: Id) -> Result<bool> {
            Ok(false)
        }
    }

    fn rows(names: &[&str]) -> Vec<CsvRow> {
        names
            .iter()
            .map(|n| [("name".to_string(), n.to_string())].into_iter().collect())
            .collect()
    }

    #[tokio::test]
    async fn test_failures_and_skips_do_not_abort_the_run() {
        let store = FlakyBrands {
            reject: "Bad",
            broken: "Broken",
            calls: Mutex::new(Vec::new()),
        };

        let batch: ImportBatch<Brand> =
            run_import(&store, &rows(&["Acme", "", "Bad", "Cobalt"])).await;

        assert_eq!(*store.calls.lock(), vec!["Acme", "Bad", "Cobalt"]);
        assert_eq!(
            batch.records.iter().map(|b| b.name.as_str()).collect::<Vec<_>>(),
            vec!["Acme", "Cobalt"]
        );
        assert_eq!(
            (batch.report.created, batch.report.skipped, batch.report.failed),
            (2, 1, 1)
        );
        assert_eq!(
            batch.report.rows[1],
            RowOutcome {
                row: 2,
                result: RowStatus::Skipped {
                    reason: "missing required field(s): name".to_string()
                }
            }
        );
        assert_eq!(
            batch.report.rows[2].result,
            RowStatus::Failed {
                reason: "duplicate brand".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_driver_errors_stay_out_of_the_report() {
        let store = FlakyBrands {
            reject: "Bad",
            broken: "Broken",
            calls: Mutex::new(Vec::new()),
        };

        let batch: ImportBatch<Brand> = run_import(&store, &rows(&["Broken", "Acme"])).await;

        assert_eq!(
            batch.report.rows[0].result,
            RowStatus::Failed {
                reason: "Database error".to_string()
            }
        );
        assert_eq!(batch.report.rows[1].result, RowStatus::Created { id: 2 });
        let json = serde_json::to_string(&batch.report).unwrap();
        assert!(!json.contains("foreign key"));
    }

    #[test]
    fn test_report_serializes_outcome_tag() {
        let mut report = ImportReport::default();
        report.record(1, RowStatus::Created { id: 4 });
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(
            json["rows"][0],
            serde_json::json!({"row": 1, "result": {"outcome": "created", "id": 4}})
        );
        assert_eq!(report.summary(), "Import complete: 1 created, 0 skipped, 0 failed");
    }
}
