use tracing::warn;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Cannot use '{0}' as delimiter")]
    InvalidDelimiter(char),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("The head line of the CSV file is not valid UTF-8")]
    HeaderEncoding,
}

/// An ordered collection of rows sharing one head line, as read from a CSV file.
///
/// Rows are padded with empty fields to the length of the head line so every column can be addressed
/// in every row. Longer rows are kept as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: csv::StringRecord,
    pub rows: Vec<csv::StringRecord>,
}

impl Table {
    /// Create an empty table with the given column names.
    pub fn new<'a>(headers: impl IntoIterator<Item = &'a str>) -> Self {
        Table {
            headers: headers.into_iter().collect(),
            rows: Vec::new(),
        }
    }

    /// Read a table whose first line holds the column names.
    ///
    /// Rows that can't be decoded are skipped with a warning, they never fail the whole table.
    pub fn from_reader(csv: impl std::io::Read, delimiter: char) -> Result<Self, Error> {
        read(csv, delimiter, true)
    }

    /// Read all lines as rows, leaving the head line empty.
    pub fn from_reader_without_headers(
        csv: impl std::io::Read,
        delimiter: char,
    ) -> Result<Self, Error> {
        read(csv, delimiter, false)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Return the position of `name_or_index` in the head line or `None` if it wasn't found.
    /// If `name_or_index` is a number, it will be used as number and not as name.
    pub fn column(&self, name_or_index: &str) -> Option<usize> {
        if let Ok(index) = name_or_index.parse() {
            self.headers.get(index).map(|_| index)
        } else {
            self.headers.iter().position(|name| name == name_or_index)
        }
    }

    /// All values of the column at `index`, in row order. Rows too short to have the column yield `None`.
    pub fn cells(&self, index: usize) -> impl Iterator<Item = Option<&str>> + '_ {
        self.rows.iter().map(move |row| row.get(index))
    }

    pub fn push(&mut self, row: csv::StringRecord) {
        self.rows.push(row);
    }

    /// Return a table with the same head line which only contains rows for which `keep` returns `true`.
    pub fn filter_rows(&self, mut keep: impl FnMut(&csv::StringRecord) -> bool) -> Table {
        Table {
            headers: self.headers.clone(),
            rows: self.rows.iter().filter(|row| keep(row)).cloned().collect(),
        }
    }

    /// Append a column named `name`, taking one value per row from `values`.
    /// Rows without a corresponding value receive an empty field.
    pub fn with_column<V: AsRef<str>>(
        mut self,
        name: &str,
        values: impl IntoIterator<Item = V>,
    ) -> Table {
        let width = self.headers.len();
        self.headers.push_field(name);
        let mut values = values.into_iter();
        for row in &mut self.rows {
            while row.len() < width {
                row.push_field("");
            }
            match values.next() {
                Some(value) => row.push_field(value.as_ref()),
                None => row.push_field(""),
            }
        }
        self
    }

    /// Write the head line followed by all rows.
    pub fn write_csv(&self, out: impl std::io::Write) -> Result<(), Error> {
        let mut out = csv::WriterBuilder::new()
            .delimiter(b',')
            .flexible(true)
            .from_writer(out);
        out.write_record(&self.headers)?;
        for row in &self.rows {
            out.write_record(row)?;
        }
        out.flush().map_err(csv::Error::from)?;
        Ok(())
    }

    /// The head line as it would appear in a CSV file, for use in messages.
    pub fn head_line(&self) -> String {
        let mut buf = Vec::<u8>::new();
        {
            let mut out = csv::Writer::from_writer(&mut buf);
            out.write_record(&self.headers).ok();
        }
        String::from_utf8_lossy(&buf).trim_end().to_owned()
    }
}

fn read(csv: impl std::io::Read, delimiter: char, has_headers: bool) -> Result<Table, Error> {
    let delimiter: u8 = delimiter
        .try_into()
        .map_err(|_| Error::InvalidDelimiter(delimiter))?;
    let mut csv = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(has_headers)
        .flexible(true)
        .from_reader(csv);
    let headers = if has_headers {
        csv::StringRecord::from_byte_record(csv.byte_headers()?.clone())
            .map_err(|_| Error::HeaderEncoding)?
    } else {
        csv::StringRecord::new()
    };

    let mut rows = Vec::new();
    for record in csv.byte_records() {
        let record = match record {
            Ok(record) => record,
            Err(err) => {
                warn!(%err, "skipping unreadable row");
                continue;
            }
        };
        let line = record.position().map(|pos| pos.line()).unwrap_or_default();
        let mut row = match csv::StringRecord::from_byte_record(record) {
            Ok(row) => row,
            Err(_) => {
                warn!(line, "skipping row with invalid UTF-8");
                continue;
            }
        };
        while row.len() < headers.len() {
            row.push_field("");
        }
        rows.push(row);
    }
    Ok(Table { headers, rows })
}
