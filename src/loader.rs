//! Data loader
//!
//! Reads the election CSV extracts and materializes each as a SQLite table,
//! replacing any existing table of the same name. Loading is destructive and
//! idempotent: re-running replaces each table wholesale, so two runs leave
//! the database identical to one. No migration or versioning exists.

use crate::config::CsvSource;
use crate::error::{ChatError, Result};
use crate::schema::quote_identifier;
use polars::prelude::*;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use tracing::info;

pub struct DataLoader {
    db_path: PathBuf,
    sources: Vec<CsvSource>,
}

impl DataLoader {
    pub fn new(db_path: impl Into<PathBuf>, sources: Vec<CsvSource>) -> Self {
        Self {
            db_path: db_path.into(),
            sources,
        }
    }

    /// Load every configured CSV into the database. Tables already replaced
    /// stay replaced if a later source fails; there is no rollback.
    pub fn load_all(&self) -> Result<()> {
        if let Some(parent) = self.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut conn = Connection::open(&self.db_path)?;

        for source in &self.sources {
            let df = read_csv(&source.path)?;
            replace_table(&mut conn, &source.table, &df)?;
            info!(
                "Loaded {} rows into table {} from {}",
                df.height(),
                source.table,
                source.path.display()
            );
        }

        Ok(())
    }
}

/// Read a CSV with header row, schema inference, and date parsing.
pub fn read_csv(path: &Path) -> Result<DataFrame> {
    LazyCsvReader::new(path)
        .with_has_header(true)
        .with_infer_schema_length(Some(1000))
        .with_try_parse_dates(true)
        .finish()
        .map_err(|e| ChatError::DataLoad(format!("Failed to read CSV {}: {}", path.display(), e)))?
        .collect()
        .map_err(|e| ChatError::DataLoad(format!("Failed to collect CSV {}: {}", path.display(), e)))
}

/// Drop and recreate `table` from the DataFrame, inserting every row inside
/// one transaction.
pub fn replace_table(conn: &mut Connection, table: &str, df: &DataFrame) -> Result<()> {
    let quoted_table = quote_identifier(table);

    let mut column_defs = Vec::new();
    for field in df.schema().iter_fields() {
        column_defs.push(format!(
            "{} {}",
            quote_identifier(field.name()),
            sqlite_type(field.data_type())
        ));
    }
    if column_defs.is_empty() {
        return Err(ChatError::DataLoad(format!(
            "CSV for table {} has no columns",
            table
        )));
    }

    let tx = conn.transaction()?;
    tx.execute_batch(&format!(
        "DROP TABLE IF EXISTS {};\nCREATE TABLE {} ({});",
        quoted_table,
        quoted_table,
        column_defs.join(", ")
    ))?;

    let placeholders: Vec<String> = (1..=df.width()).map(|i| format!("?{}", i)).collect();
    let insert_sql = format!(
        "INSERT INTO {} VALUES ({})",
        quoted_table,
        placeholders.join(", ")
    );

    {
        let mut stmt = tx.prepare(&insert_sql)?;
        let columns = df.get_columns();
        for row_idx in 0..df.height() {
            let mut params: Vec<rusqlite::types::Value> = Vec::with_capacity(columns.len());
            for series in columns {
                params.push(sqlite_value(series, row_idx)?);
            }
            stmt.execute(rusqlite::params_from_iter(params))?;
        }
    }

    tx.commit()?;
    Ok(())
}

/// Map an inferred polars dtype to a SQLite column type.
fn sqlite_type(dtype: &DataType) -> &'static str {
    match dtype {
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64
        | DataType::Boolean => "INTEGER",
        DataType::Float32 | DataType::Float64 => "REAL",
        _ => "TEXT",
    }
}

/// Convert one cell to a SQLite parameter value based on the series dtype.
fn sqlite_value(series: &Series, row_idx: usize) -> Result<rusqlite::types::Value> {
    use rusqlite::types::Value;

    if series.is_null().get(row_idx).unwrap_or(false) {
        return Ok(Value::Null);
    }

    let any_val = series
        .get(row_idx)
        .map_err(|e| ChatError::DataLoad(format!("Failed to read row {}: {}", row_idx, e)))?;

    let value = match series.dtype() {
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => any_val
            .try_extract::<i64>()
            .map(Value::Integer)
            .unwrap_or(Value::Null),
        DataType::Float32 | DataType::Float64 => any_val
            .try_extract::<f64>()
            .map(Value::Real)
            .unwrap_or(Value::Null),
        DataType::Boolean => match any_val {
            AnyValue::Boolean(b) => Value::Integer(i64::from(b)),
            _ => Value::Null,
        },
        DataType::String => match any_val.get_str() {
            Some(s) => Value::Text(s.to_string()),
            None => Value::Null,
        },
        // Dates and anything else land as text
        _ => Value::Text(any_val.to_string()),
    };

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::execute_query;

    fn temp_workspace(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "election_chat_loader_{}_{}",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_sample_csv(dir: &Path) -> PathBuf {
        let csv_path = dir.join("elections_2024.csv");
        std::fs::write(
            &csv_path,
            "constituency,party,candidate,votes,vote_share\n\
             Pune,X,Asha Rao,100,41.5\n\
             Nagpur,Y,Vikram Patil,250,52.0\n\
             Mumbai North,Z,Sunil Shah,75,18.25\n",
        )
        .unwrap();
        csv_path
    }

    #[test]
    fn loads_csv_into_sqlite_with_inferred_types() {
        let dir = temp_workspace("types");
        let csv_path = write_sample_csv(&dir);
        let db_path = dir.join("elections.db");

        let loader = DataLoader::new(
            &db_path,
            vec![CsvSource {
                table: "elections_2024".to_string(),
                path: csv_path,
            }],
        );
        loader.load_all().unwrap();

        let conn = Connection::open(&db_path).unwrap();
        let result = execute_query(
            &conn,
            "SELECT party, votes, vote_share FROM elections_2024 ORDER BY votes DESC",
        )
        .unwrap();

        assert_eq!(result.row_count(), 3);
        assert_eq!(result.rows[0][1], serde_json::json!(250));
        assert_eq!(result.rows[1][2], serde_json::json!(41.5));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn reloading_replaces_the_table_wholesale() {
        let dir = temp_workspace("idempotent");
        let csv_path = write_sample_csv(&dir);
        let db_path = dir.join("elections.db");

        let loader = DataLoader::new(
            &db_path,
            vec![CsvSource {
                table: "elections_2024".to_string(),
                path: csv_path,
            }],
        );
        loader.load_all().unwrap();
        loader.load_all().unwrap();

        let conn = Connection::open(&db_path).unwrap();
        let result = execute_query(&conn, "SELECT COUNT(*) FROM elections_2024").unwrap();
        assert_eq!(result.rows[0][0], serde_json::json!(3));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_csv_is_a_data_load_error() {
        let dir = temp_workspace("missing");
        let loader = DataLoader::new(
            dir.join("elections.db"),
            vec![CsvSource {
                table: "elections_2024".to_string(),
                path: dir.join("does_not_exist.csv"),
            }],
        );
        assert!(matches!(
            loader.load_all(),
            Err(ChatError::DataLoad(_))
        ));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
