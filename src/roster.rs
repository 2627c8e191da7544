//! Compare the people known to the directory with the HR staffing roster.
use crate::source::FieldSpec;

/// The column under which roster tables carry the full name of a person.
pub const NAME_FIELD: &str = "Штатное_ФИО";

/// Columns of the table produced by [`missing_in_roster()`][crate::missing_in_roster()].
pub const COLUMNS: [&str; 2] = ["ФИО_AD", "Статус"];

pub const MISSING_STATUS: &str = "Активен в AD, но отсутствует в штатном расписании";

/// How the name column of a roster export is found.
pub fn name_field() -> FieldSpec {
    FieldSpec::new(NAME_FIELD, &["Ф.И.О.", "ФИО"], &["фио", "ф.и.о."])
}

pub(crate) mod function {
    use crate::roster::{name_field, COLUMNS, MISSING_STATUS, NAME_FIELD};
    use crate::source::function::resolve_columns;
    use crate::{normalize_name, table, KeySet, Table, DIRECTORY_NAME_FIELD};
    use std::collections::BTreeSet;
    use tracing::{info, warn};

    /// Return everyone in `valid` whose name isn't found in the `roster_field` column of `roster`.
    ///
    /// Each person is listed once under the first spelling seen in `valid`, in the order of `valid`.
    /// An empty roster can't vouch for anyone, and yields an empty result rather than everyone.
    pub fn missing_in_roster(valid: &Table, roster: &Table, roster_field: &str) -> Table {
        let mut out = Table::new(COLUMNS);
        let roster = KeySet::from_column(roster, roster_field);
        if roster.is_empty() {
            warn!("roster is empty, skipping comparison");
            return out;
        }
        let Some(name_index) = valid.column(DIRECTORY_NAME_FIELD) else {
            return out;
        };
        let mut seen = BTreeSet::new();
        for name in valid.cells(name_index).flatten() {
            let key = normalize_name(name);
            if key.is_empty() || roster.contains(&key) || !seen.insert(key) {
                continue;
            }
            out.push(csv::StringRecord::from(vec![name, MISSING_STATUS]));
        }
        info!(missing = out.len(), "compared directory with roster");
        out
    }

    /// Read a roster export into a table with the single column [`NAME_FIELD`].
    pub fn ingest(csv: impl std::io::Read, delimiter: char) -> Result<Table, table::Error> {
        let raw = Table::from_reader(csv, delimiter)?;
        let mut out = Table::new([NAME_FIELD]);
        let Some(index) = resolve_columns(&raw, &[name_field()])[0] else {
            warn!(headers = %raw.head_line(), "no name column found in roster");
            return Ok(out);
        };
        for name in raw.cells(index).flatten() {
            if !name.trim().is_empty() {
                out.push(csv::StringRecord::from(vec![name]));
            }
        }
        info!(rows = out.len(), "loaded roster");
        Ok(out)
    }
}
pub use function::ingest;
