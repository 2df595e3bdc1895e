use anyhow::{Context, Result};
use std::io::Read;

use crate::model::{CsvRow, Entity};

/// Parse a CSV document whose first line is the header.
///
/// Cells are trimmed and blank lines skipped. A record shorter than the
/// header simply lacks the trailing columns.
pub fn parse_rows<R: Read>(input: R) -> Result<Vec<CsvRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = reader
        .headers()
        .context("Failed to read CSV header")?
        .clone();

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Malformed CSV record {}", index + 1))?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        let row = headers
            .iter()
            .zip(record.iter())
            .map(|(header, value)| (header.to_string(), value.to_string()))
            .collect();
        rows.push(row);
    }

    Ok(rows)
}

/// Render records with the entity's export columns.
pub fn export_csv<E: Entity>(records: &[E]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(E::EXPORT_HEADERS)?;
    for record in records {
        writer.write_record(record.export_record())?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV: {}", e.error()))?;
    Ok(String::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Brand, User, UserDraft};

    #[test]
    fn test_parse_rows_keys_cells_by_header() {
        let input = "name,country\nAcme, US \n\nBirch,\n";
        let rows = parse_rows(input.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["name"], "Acme");
        assert_eq!(rows[0]["country"], "US");
        assert_eq!(rows[1]["country"], "");
    }

    #[test]
    fn test_parse_rows_tolerates_short_records() {
        let rows = parse_rows("name,description\nTools\n".as_bytes()).unwrap();
        assert_eq!(rows[0]["name"], "Tools");
        assert!(!rows[0].contains_key("description"));
    }

    #[test]
    fn test_export_quotes_and_nulls() {
        let brands = vec![
            Brand {
                id: 1,
                name: "Acme, Inc.".to_string(),
                country: None,
            },
            Brand {
                id: 2,
                name: "Birch".to_string(),
                country: Some("SE".to_string()),
            },
        ];
        assert_eq!(
            export_csv(&brands).unwrap(),
            "id,name,country\n1,\"Acme, Inc.\",\n2,Birch,SE\n"
        );
    }

    #[test]
    fn test_user_export_omits_password() {
        use crate::model::Entity;
        let user = User::create_from(1, UserDraft::new("ana", "ana@example.com", Some("pw"))).unwrap();
        let csv = export_csv(&[user]).unwrap();
        let header = csv.lines().next().unwrap();
        assert_eq!(header, "id,username,email,created_at");
        assert!(!csv.contains(&crate::model::hash_password("pw")));
    }
}
