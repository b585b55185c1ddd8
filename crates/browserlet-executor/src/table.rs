//! Turn the driver's raw rows-of-cells into rows-of-records keyed by the
//! header row. A short row produces a partial record with nulls for its
//! missing columns rather than an error.

use std::collections::BTreeMap;

/// One extracted table row, keyed by header column name.
pub type Record = BTreeMap<String, Option<String>>;

/// Convert `rows` (first row is the header) into one record per data row.
pub fn rows_to_records(rows: &[Vec<String>]) -> Vec<Record> {
    let Some(header) = rows.first() else {
        return Vec::new();
    };
    rows[1..]
        .iter()
        .map(|row| {
            header
                .iter()
                .enumerate()
                .map(|(i, name)| (name.clone(), row.get(i).cloned()))
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_row_fills_missing_columns_with_none() {
        let rows = vec![
            vec!["name".to_string(), "email".to_string()],
            vec!["Ada".to_string(), "ada@example.com".to_string()],
            vec!["Grace".to_string()],
        ];
        let records = rows_to_records(&rows);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].get("name").unwrap().as_deref(), Some("Grace"));
        assert_eq!(records[1].get("email").unwrap(), &None);
    }

    #[test]
    fn header_only_table_yields_no_records() {
        assert!(rows_to_records(&[vec!["a".into()]]).is_empty());
    }

    #[test]
    fn empty_table_yields_no_records() {
        assert!(rows_to_records(&[]).is_empty());
    }
}
