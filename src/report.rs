//! Write the outcome of a run as a directory of CSV files for human review.
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Could not create '{}'", path.display())]
    Create {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Table(#[from] crate::table::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("Could not format the time of the run")]
    Format(#[from] time::error::Format),
}

/// One line of the summary, per source.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SummaryRow<'a> {
    #[serde(rename = "Источник")]
    pub id: &'a str,
    #[serde(rename = "Система")]
    pub title: &'a str,
    #[serde(rename = "Дубликаты_с_AD")]
    pub duplicates_with_valid_set: usize,
    #[serde(rename = "Внутренние_дубликаты")]
    pub internal_duplicates: usize,
    #[serde(rename = "К_удалению")]
    pub users_to_remove: usize,
}

pub const SUMMARY_FILE: &str = "сводка.csv";
pub const EMPLOYEES_FILE: &str = "сотрудники.csv";
pub const CONTRACTORS_FILE: &str = "ГПХ.csv";
pub const ROSTER_FILE: &str = "сравнение_AD_и_штатки.csv";

/// The name of the file holding the accounts to remove from the source with `id`.
pub fn removal_file(id: &str) -> String {
    format!("{id}_к_удалению.csv")
}

/// The name of the file holding the marked-up accounts of the source with `id`.
pub fn source_file(id: &str) -> String {
    format!("{id}.csv")
}

pub(crate) mod function {
    use crate::reconcile::Run;
    use crate::report::{
        removal_file, source_file, Error, SummaryRow, CONTRACTORS_FILE, EMPLOYEES_FILE, ROSTER_FILE,
        SUMMARY_FILE,
    };
    use crate::Table;
    use std::path::{Path, PathBuf};
    use tracing::info;

    /// Write all tables of `run` into a new directory below `output_root`, named after `timestamp`,
    /// and return its path.
    pub fn write(
        run: &Run,
        output_root: &Path,
        timestamp: time::OffsetDateTime,
    ) -> Result<PathBuf, Error> {
        static FORMAT: &[time::format_description::FormatItem<'static>] =
            time::macros::format_description!("[year][month][day]_[hour][minute][second]");
        let dir = output_root.join(format!("результат_обработки_{}", timestamp.format(FORMAT)?));
        std::fs::create_dir_all(&dir).map_err(|source| Error::Create {
            path: dir.clone(),
            source,
        })?;

        {
            let mut out = csv::Writer::from_writer(create(&dir.join(SUMMARY_FILE))?);
            for outcome in &run.outcomes {
                out.serialize(SummaryRow {
                    id: &outcome.source.id,
                    title: &outcome.source.title,
                    duplicates_with_valid_set: outcome.result.duplicates_with_valid_set,
                    internal_duplicates: outcome.result.internal_duplicates,
                    users_to_remove: outcome.result.users_to_remove.len(),
                })?;
            }
            out.flush().map_err(csv::Error::from)?;
        }
        for outcome in &run.outcomes {
            write_table(&outcome.augmented, &dir.join(source_file(&outcome.source.id)))?;
            write_table(
                &outcome.result.users_to_remove,
                &dir.join(removal_file(&outcome.source.id)),
            )?;
        }
        write_table(&run.personnel.employees, &dir.join(EMPLOYEES_FILE))?;
        write_table(&run.personnel.contractors, &dir.join(CONTRACTORS_FILE))?;
        write_table(&run.missing_in_roster, &dir.join(ROSTER_FILE))?;

        info!(dir = %dir.display(), "wrote results");
        Ok(dir)
    }

    fn write_table(table: &Table, path: &Path) -> Result<(), Error> {
        table.write_csv(std::io::BufWriter::new(create(path)?))?;
        Ok(())
    }

    fn create(path: &Path) -> Result<std::fs::File, Error> {
        std::fs::File::create(path).map_err(|source| Error::Create {
            path: path.to_owned(),
            source,
        })
    }
}
pub use function::write;
