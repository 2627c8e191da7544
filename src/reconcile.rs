use crate::{Personnel, SourceSpec, Table};

/// Which of the valid people an account may belong to in order not to be considered stale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Selection {
    Employees,
    Contractors,
    #[default]
    All,
}

impl Selection {
    pub fn employees(&self) -> bool {
        matches!(self, Selection::Employees | Selection::All)
    }

    pub fn contractors(&self) -> bool {
        matches!(self, Selection::Contractors | Selection::All)
    }
}

/// What was learned about the accounts of one external system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationResult {
    /// The amount of distinct people found both among the valid personnel and the accounts of the system.
    pub duplicates_with_valid_set: usize,
    /// The amount of distinct people owning more than one account in the system.
    pub internal_duplicates: usize,
    /// The accounts to deactivate, with all columns of the source table.
    pub users_to_remove: Table,
}

/// The outcome of reconciling one external system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceOutcome {
    pub source: SourceSpec,
    /// The source table with [`INTERNAL_DUPLICATE_COLUMN`] and [`VALID_DUPLICATE_COLUMN`] appended.
    pub augmented: Table,
    pub result: ReconciliationResult,
}

/// Marks rows whose owner has more than one account in the same system.
pub const INTERNAL_DUPLICATE_COLUMN: &str = "Дубликат_внутри";
/// Marks rows whose owner is among the valid personnel.
pub const VALID_DUPLICATE_COLUMN: &str = "Есть_в_AD";
pub const MARK: &str = "да";

/// Everything produced by [`run()`][function::run()].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub personnel: Personnel,
    pub outcomes: Vec<SourceOutcome>,
    /// Valid people not found in the HR roster, see [`missing_in_roster()`][crate::missing_in_roster()].
    pub missing_in_roster: Table,
}

#[derive(Clone, Debug)]
pub struct Options {
    /// The ids of the sources to reconcile, or all configured sources if empty.
    pub sources: Vec<String>,
    pub selection: Selection,
    /// The point in time against which the age of exports is measured.
    pub now: time::OffsetDateTime,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            sources: Vec::new(),
            selection: Selection::default(),
            now: time::OffsetDateTime::now_utc(),
        }
    }
}

pub(crate) mod function {
    use crate::reconcile::{
        Options, ReconciliationResult, Run, Selection, SourceOutcome, INTERNAL_DUPLICATE_COLUMN, MARK,
        VALID_DUPLICATE_COLUMN,
    };
    use crate::{
        directory, discover, duplicates, find_stale, missing_in_roster, normalize_name, roster, source,
        Config, Personnel, SourceSpec, Table, DIRECTORY_NAME_FIELD,
    };
    use std::path::Path;
    use tracing::{info, info_span, warn};

    /// Reconcile the accounts in `external`, which were read according to `spec`, with the `personnel`
    /// chosen by `selection`.
    ///
    /// Without any valid personnel nothing can be judged, and the result is empty rather than claiming every
    /// account to be stale.
    pub fn reconcile(
        spec: &SourceSpec,
        external: &Table,
        personnel: &Personnel,
        selection: Selection,
    ) -> SourceOutcome {
        let _span = info_span!("reconcile", source = %spec.id).entered();
        let empty = Table::new(Personnel::COLUMNS);
        let employees = if selection.employees() { &personnel.employees } else { &empty };
        let contractors = if selection.contractors() { &personnel.contractors } else { &empty };
        let valid = concat(employees, contractors);

        if valid.is_empty() || valid.column(DIRECTORY_NAME_FIELD).is_none() {
            warn!("no valid personnel to compare with");
            return SourceOutcome {
                source: spec.clone(),
                augmented: mark(external.clone(), &Default::default(), &Default::default(), spec),
                result: ReconciliationResult {
                    duplicates_with_valid_set: 0,
                    internal_duplicates: 0,
                    users_to_remove: external.filter_rows(|_| false),
                },
            };
        }

        let with_valid = duplicates::across(&valid, DIRECTORY_NAME_FIELD, external, &spec.name_field);
        let internal = duplicates::within(external, &spec.name_field);
        let users_to_remove = find_stale(external, spec, employees, contractors);
        info!(
            duplicates_with_valid_set = with_valid.len(),
            internal_duplicates = internal.len(),
            users_to_remove = users_to_remove.len(),
            "reconciled"
        );

        SourceOutcome {
            source: spec.clone(),
            augmented: mark(external.clone(), &internal, &with_valid, spec),
            result: ReconciliationResult {
                duplicates_with_valid_set: with_valid.len(),
                internal_duplicates: internal.len(),
                users_to_remove,
            },
        }
    }

    /// Load the newest exports below the input root of `config` and reconcile each selected source.
    ///
    /// Exports that are missing or can't be read are treated as empty.
    pub fn run(
        config: &Config,
        Options {
            sources,
            selection,
            now,
        }: Options,
    ) -> Run {
        let find = |subdir: &str| {
            discover::latest_file(
                &config.input_root.join(subdir),
                &config.extensions,
                config.max_file_age(),
                now,
            )
        };

        let personnel = find(&config.directory_subdir)
            .and_then(|path| {
                load(&path, |file| {
                    directory::load(file, &config.directory_options())
                })
            })
            .unwrap_or_else(|| {
                warn!("no directory export available, nobody is considered valid");
                Personnel::empty()
            });

        let roster = find(&config.roster_subdir)
            .and_then(|path| load(&path, |file| roster::ingest(file, config.delimiter)))
            .unwrap_or_else(|| {
                warn!("no roster export available");
                Table::new([roster::NAME_FIELD])
            });
        let valid = concat(&personnel.employees, &personnel.contractors);
        let missing_in_roster = missing_in_roster(&valid, &roster, roster::NAME_FIELD);

        let mut outcomes = Vec::new();
        for id in &sources {
            if config.source(id).is_none() {
                warn!(source = %id, "ignoring unknown source");
            }
        }
        for spec in config
            .sources
            .iter()
            .filter(|spec| sources.is_empty() || sources.contains(&spec.id))
        {
            let external = find(&spec.subdir)
                .and_then(|path| {
                    load(&path, |file| source::ingest(file, spec, config.source_options()))
                })
                .unwrap_or_else(|| {
                    warn!(source = %spec.id, "no export available");
                    spec.empty_table()
                });
            outcomes.push(reconcile(spec, &external, &personnel, selection));
        }

        Run {
            personnel,
            outcomes,
            missing_in_roster,
        }
    }

    fn load<T, E: std::fmt::Display>(
        path: &Path,
        read: impl FnOnce(std::fs::File) -> Result<T, E>,
    ) -> Option<T> {
        info!(file = %path.display(), "loading export");
        let result = std::fs::File::open(path)
            .map_err(|err| err.to_string())
            .and_then(|file| read(file).map_err(|err| err.to_string()));
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(file = %path.display(), %err, "failed to load export");
                None
            }
        }
    }

    /// Append the rows of `b` to those of `a`, assuming both have the same columns.
    fn concat(a: &Table, b: &Table) -> Table {
        let mut out = a.clone();
        out.rows.extend(b.rows.iter().cloned());
        out
    }

    fn mark(
        table: Table,
        internal: &std::collections::BTreeSet<String>,
        with_valid: &std::collections::BTreeSet<String>,
        spec: &SourceSpec,
    ) -> Table {
        let keys: Vec<_> = match table.column(&spec.name_field) {
            Some(index) => table.cells(index).map(|name| normalize_name(name)).collect(),
            None => vec![String::new(); table.len()],
        };
        let flag = |set: &std::collections::BTreeSet<String>, key: &String| {
            if !key.is_empty() && set.contains(key) {
                MARK
            } else {
                ""
            }
        };
        let internal_marks: Vec<_> = keys.iter().map(|key| flag(internal, key)).collect();
        let valid_marks: Vec<_> = keys.iter().map(|key| flag(with_valid, key)).collect();
        table
            .with_column(INTERNAL_DUPLICATE_COLUMN, internal_marks)
            .with_column(VALID_DUPLICATE_COLUMN, valid_marks)
    }
}
