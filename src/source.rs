//! Declarative description of the external systems whose accounts are reconciled, and how their exports
//! are turned into tables with well-known column names.

/// Everything needed to read and judge the account export of one external system.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SourceSpec {
    /// A short identifier, used on the command-line and in output file names.
    pub id: String,
    /// The human readable name of the system.
    pub title: String,
    /// The directory below the input root in which exports of this system are found.
    pub subdir: String,
    /// The column holding the full name of the account owner.
    pub name_field: String,
    /// The column holding the account status as seen by the system itself.
    pub status_field: String,
    /// The value of `status_field` marking an account as active.
    pub active_sentinel: String,
    /// How the rows of an export are laid out.
    #[serde(default)]
    pub layout: Layout,
    /// The columns to produce, in order, and the headers they may be found under.
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
    /// Accounts whose name contains any of these, ignoring case, are service accounts and are dropped.
    #[serde(default)]
    pub skip_markers: Vec<String>,
}

/// One column of an ingested table.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FieldSpec {
    pub canonical: String,
    /// Headers that are taken as this field if they match exactly.
    #[serde(default)]
    pub aliases: Vec<String>,
    /// If no alias matches, the first header containing one of these, ignoring case, is used.
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub transform: Transform,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Transform {
    /// Use the value as is.
    #[default]
    Keep,
    /// Map the many spellings of boolean values to `да` and `нет`.
    YesNo,
    /// The cell holds the date an account was blocked, if any.
    BlockDate { blocked: String, active: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Layout {
    /// The first line holds the column names.
    #[default]
    Headed,
    /// A report with a preamble. Data rows follow the first row whose first cell is `marker`, and columns are
    /// addressed by position.
    ///
    /// Produces the name field and the status field. The cell at `invalid_index` holds an "invalid" flag, and
    /// the status is `active` only if the flag equals `valid_value` or is empty, and `inactive` otherwise.
    Report {
        marker: String,
        name_index: usize,
        invalid_index: usize,
        valid_value: String,
        active: String,
        inactive: String,
    },
}

impl SourceSpec {
    /// The ERP user report, in which accounts carry an "invalid" flag rather than an active one.
    pub fn erp() -> Self {
        SourceSpec {
            id: "erp".into(),
            title: "1С".into(),
            subdir: "1С".into(),
            name_field: "1C_ФИО".into(),
            status_field: "1C_Активен".into(),
            active_sentinel: "Да".into(),
            layout: Layout::Report {
                marker: "Пользователь".into(),
                name_index: 0,
                invalid_index: 4,
                valid_value: "Нет".into(),
                active: "Да".into(),
                inactive: "Нет".into(),
            },
            fields: Vec::new(),
            skip_markers: vec!["сервис".into(), "robot".into(), "робот".into()],
        }
    }

    pub fn sfera() -> Self {
        SourceSpec {
            id: "sfera".into(),
            title: "Сфера Курьер".into(),
            subdir: "эдо_сфера_курьер".into(),
            name_field: "Сфера_Курьер_ФИО".into(),
            status_field: "Сфера_Курьер_Активен".into(),
            active_sentinel: "Да".into(),
            layout: Layout::Headed,
            fields: vec![
                FieldSpec::new("Сфера_Курьер_ФИО", &["ФИО"], &["фио", "ф.и.о.", "name"]),
                FieldSpec::new("Сфера_Курьер_Активен", &["Активен"], &["активен", "active", "статус"]),
                FieldSpec::new("Сфера_Курьер_Администратор", &["Администратор"], &["администратор", "admin"]),
            ],
            skip_markers: Vec::new(),
        }
    }

    /// Kontur doesn't export a status, but the date an account was blocked.
    pub fn kontur() -> Self {
        SourceSpec {
            id: "kontur".into(),
            title: "Контур Диадок".into(),
            subdir: "эдо_контур_диадок".into(),
            name_field: "Контур_Диадок_ФИО".into(),
            status_field: "Контур_Диадок_статус".into(),
            active_sentinel: "активна".into(),
            layout: Layout::Headed,
            fields: vec![
                FieldSpec::new("Контур_Диадок_ФИО", &["ФИО"], &["фио", "ф.и.о.", "name"]),
                FieldSpec {
                    transform: Transform::YesNo,
                    ..FieldSpec::new(
                        "Контур_Диадок_Администратор",
                        &["Администратор"],
                        &["администратор", "admin"],
                    )
                },
                FieldSpec {
                    transform: Transform::BlockDate {
                        blocked: "заблокирована".into(),
                        active: "активна".into(),
                    },
                    ..FieldSpec::new(
                        "Контур_Диадок_статус",
                        &["Дата блокировки"],
                        &["дата блокировки", "блокировка", "статус"],
                    )
                },
            ],
            skip_markers: Vec::new(),
        }
    }

    /// All systems known out of the box.
    pub fn builtin() -> Vec<SourceSpec> {
        vec![Self::erp(), Self::sfera(), Self::kontur()]
    }

    /// The columns of tables produced for this source.
    pub fn columns(&self) -> Vec<&str> {
        match self.layout {
            Layout::Headed => self.fields.iter().map(|f| f.canonical.as_str()).collect(),
            Layout::Report { .. } => vec![self.name_field.as_str(), self.status_field.as_str()],
        }
    }

    /// An empty table with the columns of this source, standing in for a missing export.
    pub fn empty_table(&self) -> crate::Table {
        crate::Table::new(self.columns())
    }
}

impl FieldSpec {
    pub fn new(canonical: &str, aliases: &[&str], keywords: &[&str]) -> Self {
        FieldSpec {
            canonical: canonical.into(),
            aliases: aliases.iter().map(|s| s.to_string()).collect(),
            keywords: keywords.iter().map(|s| s.to_string()).collect(),
            transform: Transform::Keep,
        }
    }
}

impl Transform {
    pub fn apply<'a>(&'a self, value: &'a str) -> &'a str {
        match self {
            Transform::Keep => value,
            Transform::YesNo => match value.trim().to_lowercase().as_str() {
                "true" | "истина" | "1" | "yes" | "да" => "да",
                "false" | "ложь" | "0" | "no" | "нет" => "нет",
                _ => value,
            },
            Transform::BlockDate { blocked, active } => {
                if value.trim().is_empty() {
                    active.as_str()
                } else {
                    blocked.as_str()
                }
            }
        }
    }
}

/// Options for [`ingest()`][function::ingest()].
#[derive(Clone, Debug)]
pub struct Options {
    pub delimiter: char,
    /// Only this many rows are kept, the rest is dropped with a warning.
    pub max_rows: usize,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            delimiter: ',',
            max_rows: 10_000,
        }
    }
}

pub(crate) mod function {
    use crate::source::{FieldSpec, Layout, Options, SourceSpec};
    use crate::{table, Table};
    use tracing::{debug, info, warn};

    /// Read the export of the system described by `spec` into a table with the columns of [`SourceSpec::columns()`].
    ///
    /// Rows without a name and service accounts are dropped.
    pub fn ingest(
        csv: impl std::io::Read,
        spec: &SourceSpec,
        Options {
            delimiter,
            max_rows,
        }: Options,
    ) -> Result<Table, table::Error> {
        let mut out = match &spec.layout {
            Layout::Headed => from_headed(Table::from_reader(csv, delimiter)?, spec),
            Layout::Report {
                marker,
                name_index,
                invalid_index,
                valid_value,
                active,
                inactive,
            } => {
                let raw = Table::from_reader_without_headers(csv, delimiter)?;
                let mut out = spec.empty_table();
                let Some(start) = raw
                    .rows
                    .iter()
                    .position(|row| row.get(0).map(str::trim) == Some(marker.as_str()))
                else {
                    warn!(source = %spec.id, %marker, "no head line found in report");
                    return Ok(out);
                };
                debug!(source = %spec.id, row = start, "found head line of report");
                for row in &raw.rows[start + 1..] {
                    let Some(name) = row.get(*name_index).map(str::trim).filter(|n| !n.is_empty())
                    else {
                        continue;
                    };
                    let status = match row.get(*invalid_index).map(str::trim) {
                        None | Some("") => active,
                        Some(flag) if flag == valid_value.as_str() => active,
                        Some(_) => inactive,
                    };
                    out.push(csv::StringRecord::from(vec![name, status.as_str()]));
                }
                out
            }
        };

        let Some(name_index) = out.column(&spec.name_field) else {
            warn!(source = %spec.id, field = %spec.name_field, "name column is not configured");
            return Ok(spec.empty_table());
        };
        let markers: Vec<_> = spec.skip_markers.iter().map(|m| m.to_lowercase()).collect();
        out = out.filter_rows(|row| {
            let name = row.get(name_index).unwrap_or_default();
            if name.trim().is_empty() {
                return false;
            }
            let lowercase = name.to_lowercase();
            if markers.iter().any(|m| lowercase.contains(m.as_str())) {
                debug!(source = %spec.id, name, "skipping service account");
                return false;
            }
            true
        });
        if out.len() > max_rows {
            warn!(source = %spec.id, rows = out.len(), max_rows, "dropping rows beyond the limit");
            out.rows.truncate(max_rows);
        }
        info!(source = %spec.id, rows = out.len(), "loaded accounts");
        Ok(out)
    }

    fn from_headed(raw: Table, spec: &SourceSpec) -> Table {
        let indices = resolve_columns(&raw, &spec.fields);
        for (field, index) in spec.fields.iter().zip(&indices) {
            if index.is_none() {
                warn!(source = %spec.id, field = %field.canonical, headers = %raw.head_line(), "column not found");
            }
        }
        let mut out = spec.empty_table();
        for row in &raw.rows {
            out.push(
                spec.fields
                    .iter()
                    .zip(&indices)
                    .map(|(field, index)| {
                        let value = index.and_then(|i| row.get(i)).unwrap_or_default();
                        field.transform.apply(value)
                    })
                    .collect(),
            );
        }
        out
    }

    /// Find the header position of each field, exact aliases first and keywords second.
    /// A header is used by at most one field.
    pub(crate) fn resolve_columns(raw: &Table, fields: &[FieldSpec]) -> Vec<Option<usize>> {
        let mut taken = vec![false; raw.headers.len()];
        let mut indices = vec![None; fields.len()];
        for (field, index) in fields.iter().zip(indices.iter_mut()) {
            *index = raw.headers.iter().enumerate().find_map(|(i, header)| {
                let header = header.trim();
                (!taken[i] && (header == field.canonical || field.aliases.iter().any(|a| a == header)))
                    .then_some(i)
            });
            if let Some(i) = *index {
                taken[i] = true;
            }
        }
        for (field, index) in fields.iter().zip(indices.iter_mut()) {
            if index.is_some() {
                continue;
            }
            *index = raw.headers.iter().enumerate().find_map(|(i, header)| {
                let header = header.to_lowercase();
                (!taken[i] && field.keywords.iter().any(|k| header.contains(&k.to_lowercase())))
                    .then_some(i)
            });
            if let Some(i) = *index {
                taken[i] = true;
            }
        }
        indices
    }
}
pub use function::ingest;
