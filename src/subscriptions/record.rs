//! Subscription records and the header-ordered table that holds them

use std::io::{Read, Write};
use std::path::Path;

use super::SubscriptionError;

/// One subscriber: column name to value, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionRecord {
    fields: Vec<(String, String)>,
}

impl SubscriptionRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`SubscriptionRecord::insert`]
    pub fn with(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(column, value);
        self
    }

    /// Sets `column` to `value`, replacing any previous value for that column
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        let column = column.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(c, _)| *c == column) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v.as_str())
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(c, _)| c.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SubscriptionRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Self::new();
        for (column, value) in iter {
            record.insert(column, value);
        }
        record
    }
}

/// Header plus records
///
/// Every record holds exactly the header's columns, in header order. Records
/// are brought into that shape when they are added, and the whole table is
/// checked again before it is written out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionTable {
    header: Vec<String>,
    records: Vec<SubscriptionRecord>,
}

impl SubscriptionTable {
    /// An empty table with the given columns
    pub fn new<I, S>(header: I) -> Result<Self, SubscriptionError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let header: Vec<String> = header.into_iter().map(Into::into).collect();
        if header.is_empty() {
            return Err(schema_error(0, "header has no columns"));
        }
        for (i, column) in header.iter().enumerate() {
            if header[..i].contains(column) {
                return Err(schema_error(0, format!("duplicate column '{}'", column)));
            }
        }
        Ok(Self {
            header,
            records: Vec::new(),
        })
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn records(&self) -> &[SubscriptionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Appends a record after reordering it to header order
    ///
    /// Fails if the record is missing a header column or has one the header
    /// does not name.
    pub fn push(&mut self, record: SubscriptionRecord) -> Result<(), SubscriptionError> {
        let row = self.records.len() + 1;
        let record = self.conform(&record, row)?;
        self.records.push(record);
        Ok(())
    }

    /// Removes every record whose `column` equals `value`
    pub fn remove_where(&mut self, column: &str, value: &str) -> usize {
        let before = self.records.len();
        self.records.retain(|record| record.get(column) != Some(value));
        before - self.records.len()
    }

    /// Checks every record against the header
    pub fn validate(&self) -> Result<(), SubscriptionError> {
        for (i, record) in self.records.iter().enumerate() {
            let in_order = record.len() == self.header.len()
                && record.columns().zip(&self.header).all(|(c, h)| c == h.as_str());
            if !in_order {
                return Err(schema_error(
                    i + 1,
                    "columns differ from the header or are out of order",
                ));
            }
        }
        Ok(())
    }

    /// Reads a table from CSV; the first row is the header
    ///
    /// `path` is only used for error messages.
    pub fn from_reader<R: Read>(reader: R, path: &Path) -> Result<Self, SubscriptionError> {
        let csv_error = |source: csv::Error| SubscriptionError::Csv {
            path: path.to_path_buf(),
            source,
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);

        let header: Vec<String> = reader
            .headers()
            .map_err(csv_error)?
            .iter()
            .map(str::to_string)
            .collect();
        if header.is_empty() {
            return Err(SubscriptionError::MissingHeader {
                path: path.to_path_buf(),
            });
        }

        let mut table = Self::new(header)?;
        for row in reader.records() {
            let row = row.map_err(csv_error)?;
            let record = table
                .header
                .iter()
                .zip(row.iter())
                .map(|(column, value)| (column.clone(), value.to_string()))
                .collect();
            table.records.push(record);
        }

        Ok(table)
    }

    /// Writes the header and then every record, values in header order
    pub fn to_writer<W: Write>(&self, writer: W) -> csv::Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(writer);

        writer.write_record(&self.header)?;
        for record in &self.records {
            writer.write_record(record.values())?;
        }
        writer.flush()?;
        Ok(())
    }

    fn conform(
        &self,
        record: &SubscriptionRecord,
        row: usize,
    ) -> Result<SubscriptionRecord, SubscriptionError> {
        let unknown = record
            .columns()
            .find(|c| !self.header.iter().any(|h| h.as_str() == *c));
        if let Some(extra) = unknown {
            return Err(schema_error(row, format!("unknown column '{}'", extra)));
        }

        self.header
            .iter()
            .map(|column| match record.get(column) {
                Some(value) => Ok((column.clone(), value.to_string())),
                None => Err(schema_error(row, format!("missing column '{}'", column))),
            })
            .collect()
    }
}

fn schema_error(row: usize, reason: impl Into<String>) -> SubscriptionError {
    SubscriptionError::Schema {
        row,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> SubscriptionRecord {
        SubscriptionRecord::new()
            .with("name", "Alice")
            .with("email", "a@x.com")
    }

    #[test]
    fn test_record_insert_replaces_existing_value() {
        let mut record = alice();
        record.insert("name", "Alicia");

        assert_eq!(record.len(), 2);
        assert_eq!(record.get("name"), Some("Alicia"));
        assert_eq!(record.columns().collect::<Vec<_>>(), vec!["name", "email"]);
    }

    #[test]
    fn test_record_from_iter() {
        let record: SubscriptionRecord = [("food", "Pizza"), ("email", "b@x.com")].into_iter().collect();
        assert_eq!(record.get("food"), Some("Pizza"));
        assert_eq!(record.get("missing"), None);
    }

    #[test]
    fn test_table_rejects_empty_and_duplicate_headers() {
        assert!(SubscriptionTable::new(Vec::<String>::new()).is_err());
        let err = SubscriptionTable::new(["name", "name"]).unwrap_err();
        assert!(err.to_string().contains("duplicate column"));
    }

    #[test]
    fn test_push_reorders_to_header_order() {
        let mut table = SubscriptionTable::new(["name", "email"]).unwrap();
        let record = SubscriptionRecord::new()
            .with("email", "a@x.com")
            .with("name", "Alice");

        table.push(record).unwrap();

        assert_eq!(table.records()[0], alice());
        assert!(table.validate().is_ok());
    }

    #[test]
    fn test_push_rejects_unknown_column() {
        let mut table = SubscriptionTable::new(["name", "email"]).unwrap();
        let err = table.push(alice().with("phone", "555")).unwrap_err();

        assert!(matches!(err, SubscriptionError::Schema { row: 1, .. }));
        assert!(err.to_string().contains("phone"));
        assert!(table.is_empty());
    }

    #[test]
    fn test_push_rejects_missing_column() {
        let mut table = SubscriptionTable::new(["name", "email"]).unwrap();
        let err = table
            .push(SubscriptionRecord::new().with("name", "Bob"))
            .unwrap_err();
        assert!(err.to_string().contains("missing column 'email'"));
    }

    #[test]
    fn test_remove_where() {
        let mut table = SubscriptionTable::new(["name", "email"]).unwrap();
        table.push(alice()).unwrap();
        table
            .push(SubscriptionRecord::new().with("name", "Bob").with("email", "b@x.com"))
            .unwrap();
        table.push(alice()).unwrap();

        assert_eq!(table.remove_where("name", "Alice"), 2);
        assert_eq!(table.len(), 1);
        assert_eq!(table.remove_where("name", "Nobody"), 0);
    }

    #[test]
    fn test_to_writer_emits_header_then_rows() {
        let mut table = SubscriptionTable::new(["name", "email"]).unwrap();
        table.push(alice()).unwrap();

        let mut out = Vec::new();
        table.to_writer(&mut out).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "name,email\nAlice,a@x.com\n");
    }

    #[test]
    fn test_to_writer_quotes_values_with_commas() {
        let mut table = SubscriptionTable::new(["name", "food"]).unwrap();
        table
            .push(SubscriptionRecord::new().with("name", "Carol").with("food", "Mac, cheese"))
            .unwrap();

        let mut out = Vec::new();
        table.to_writer(&mut out).unwrap();

        let parsed = SubscriptionTable::from_reader(out.as_slice(), Path::new("mem.csv")).unwrap();
        assert_eq!(parsed.records()[0].get("food"), Some("Mac, cheese"));
    }

    #[test]
    fn test_from_reader_uses_first_row_as_header() {
        let csv = "email,name\na@x.com,Alice\nb@x.com,Bob\n";
        let table = SubscriptionTable::from_reader(csv.as_bytes(), Path::new("mem.csv")).unwrap();

        assert_eq!(table.header(), ["email", "name"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.records()[1].get("name"), Some("Bob"));
        assert_eq!(
            table.records()[0].columns().collect::<Vec<_>>(),
            vec!["email", "name"]
        );
    }

    #[test]
    fn test_from_reader_empty_input_has_no_header() {
        let result = SubscriptionTable::from_reader("".as_bytes(), Path::new("empty.csv"));
        assert!(matches!(result, Err(SubscriptionError::MissingHeader { .. })));
    }

    #[test]
    fn test_from_reader_rejects_ragged_rows() {
        let csv = "name,email\nAlice\n";
        let result = SubscriptionTable::from_reader(csv.as_bytes(), Path::new("ragged.csv"));
        assert!(matches!(result, Err(SubscriptionError::Csv { .. })));
    }
}
