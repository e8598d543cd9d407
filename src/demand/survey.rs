use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::fs::File;
use std::path::Path;
use tracing::{debug, warn};

use super::types::Customer;

/// Rows read from a survey file. Rows that could not be parsed at all are
/// counted, not returned.
#[derive(Debug, Default)]
pub struct SurveyRows {
    pub customers: Vec<Customer>,
    pub unreadable: usize,
}

/// Read customers from a survey CSV.
///
/// A row that fails to parse (missing column, text in a numeric field) is
/// logged and skipped; the rest of the file still loads.
pub fn read_survey(path: &Path) -> Result<SurveyRows> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open survey file at {}", path.display()))?;
    read_survey_from(file)
}

/// Same as [`read_survey`] over any reader (tests feed in-memory CSV).
pub fn read_survey_from<R: std::io::Read>(reader: R) -> Result<SurveyRows> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = SurveyRows::default();
    for (line, record) in csv_reader.deserialize::<Customer>().enumerate() {
        match record {
            Ok(customer) => rows.customers.push(customer),
            Err(e) => {
                // +2: one for the header, one for 1-based numbering
                warn!(row = line + 2, error = %e, "skipping unreadable survey row");
                rows.unreadable += 1;
            }
        }
    }

    debug!(
        customers = rows.customers.len(),
        unreadable = rows.unreadable,
        "survey parsed"
    );
    Ok(rows)
}

/// Write customers to a survey CSV atomically
pub fn write_survey(path: &Path, customers: &[Customer]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
    }

    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;

    {
        let mut writer = csv::Writer::from_writer(&mut file);
        for customer in customers {
            writer
                .serialize(customer)
                .with_context(|| format!("Failed to serialize customer {}", customer.id))?;
        }
        writer.flush().context("Failed to flush survey writer")?;
    }

    file.commit().context("Failed to save survey file")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "user_id,name,age,city,preferred_category,expected_price_low,expected_price_high,favorite_keyword";

    #[test]
    fn test_read_full_rows() {
        let csv = format!(
            "{}\nUSER_0001,Priya Sharma,34,Pune,electronics,1000,4000,phone\nUSER_0002,Amit Patel,51,Delhi,electronics,5000,9000,laptop\n",
            HEADER
        );
        let rows = read_survey_from(csv.as_bytes()).unwrap();
        assert_eq!(rows.unreadable, 0);
        assert_eq!(rows.customers.len(), 2);

        let first = &rows.customers[0];
        assert_eq!(first.id, "USER_0001");
        assert_eq!(first.name.as_deref(), Some("Priya Sharma"));
        assert_eq!(first.age, Some(34));
        assert_eq!(first.budget_low, 1000.0);
        assert_eq!(first.budget_high, 4000.0);
        assert_eq!(first.keyword, "phone");
    }

    #[test]
    fn test_optional_columns_may_be_absent() {
        let csv = "user_id,expected_price_low,expected_price_high,favorite_keyword\nU1,10,20,mouse\n";
        let rows = read_survey_from(csv.as_bytes()).unwrap();
        assert_eq!(rows.customers.len(), 1);
        let c = &rows.customers[0];
        assert_eq!(c.category, "electronics");
        assert!(c.name.is_none());
        assert!(c.city.is_none());
    }

    #[test]
    fn test_bad_row_is_skipped_not_fatal() {
        let csv = format!(
            "{}\nU1,A,30,Pune,electronics,cheap,4000,phone\nU2,B,31,Pune,electronics,1000,4000,phone\n",
            HEADER
        );
        let rows = read_survey_from(csv.as_bytes()).unwrap();
        assert_eq!(rows.unreadable, 1);
        assert_eq!(rows.customers.len(), 1);
        assert_eq!(rows.customers[0].id, "U2");
    }

    #[test]
    fn test_write_then_read_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("survey.csv");

        let mut customer = Customer::new("USER_0042", 2000.0, 7000.0, "earbuds");
        customer.city = Some("Chennai".to_string());
        write_survey(&path, &[customer.clone()]).unwrap();

        let rows = read_survey(&path).unwrap();
        assert_eq!(rows.customers, vec![customer]);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_survey(&dir.path().join("nope.csv")).unwrap_err();
        assert!(err.to_string().contains("Failed to open survey file"));
    }
}
