//! Find accounts of external systems which are still active although nobody valid owns them anymore.

pub(crate) mod function {
    use crate::{KeySet, SourceSpec, Table, DIRECTORY_NAME_FIELD};
    use tracing::{debug, warn};

    /// Return the rows of `external` that are active according to `spec`, but whose owner is neither among
    /// `employees` nor among `contractors`.
    ///
    /// Both personnel tables carry names in [`DIRECTORY_NAME_FIELD`], and contribute nothing if that column
    /// is missing. Rows without a name are never flagged, and neither are rows that aren't active in their own
    /// system. The output keeps the columns and the row order of `external`.
    pub fn find_stale(
        external: &Table,
        spec: &SourceSpec,
        employees: &Table,
        contractors: &Table,
    ) -> Table {
        let mut valid = KeySet::from_column(employees, DIRECTORY_NAME_FIELD);
        valid.extend(KeySet::from_column(contractors, DIRECTORY_NAME_FIELD));

        let Some(name_index) = external.column(&spec.name_field) else {
            warn!(source = %spec.id, field = %spec.name_field, "name column missing, no account can be judged");
            return external.filter_rows(|_| false);
        };
        let Some(status_index) = external.column(&spec.status_field) else {
            warn!(source = %spec.id, field = %spec.status_field, "status column missing, no account is known to be active");
            return external.filter_rows(|_| false);
        };

        external.filter_rows(|row| {
            let key = crate::normalize_name(row.get(name_index));
            if key.is_empty() || valid.contains(&key) {
                return false;
            }
            let active = row.get(status_index) == Some(spec.active_sentinel.as_str());
            if active {
                debug!(source = %spec.id, name = %key, "account has no valid owner");
            }
            active
        })
    }
}
