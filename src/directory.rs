//! Read the account export of the directory service and split enabled accounts into employees and contractors.
use crate::Table;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Cannot use '{0}' as delimiter")]
    InvalidDelimiter(char),
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// One account as exported from the directory service.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Entry {
    pub name: String,
    pub sam_account_name: String,
    #[serde(deserialize_with = "enabled")]
    pub enabled: bool,
    pub email_address: String,
    pub company: String,
    /// The full path of the account in the directory tree, which determines its kind.
    pub distinguished_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Employee,
    Contractor,
}

/// The currently valid people according to the directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Personnel {
    /// Enabled accounts of employees, with the columns of [`Personnel::COLUMNS`].
    pub employees: Table,
    /// Enabled accounts of contractors, with the columns of [`Personnel::COLUMNS`].
    pub contractors: Table,
    /// All accounts seen in the export, including disabled and unclassified ones.
    pub total: usize,
}

impl Personnel {
    pub const COLUMNS: [&'static str; 4] = [crate::DIRECTORY_NAME_FIELD, "AD_Логин", "AD_Почта", "AD_Компания"];

    /// Personnel without anyone in it, as used if the directory export is unavailable.
    pub fn empty() -> Self {
        Personnel {
            employees: Table::new(Self::COLUMNS),
            contractors: Table::new(Self::COLUMNS),
            total: 0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Options {
    /// An enabled account whose path contains one of these, ignoring case, belongs to an employee…
    pub employee_markers: Vec<String>,
    /// …unless it also contains one of these.
    pub employee_exclusions: Vec<String>,
    /// Accounts that aren't employees belong to a contractor if their path contains one of these.
    pub contractor_markers: Vec<String>,
    pub delimiter: char,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            employee_markers: vec!["cu_users".into()],
            employee_exclusions: vec!["гпх".into()],
            contractor_markers: vec!["external_organizations".into(), "гпх".into()],
            delimiter: ',',
        }
    }
}

impl Entry {
    /// Determine the kind of the account, or `None` if it is disabled or can't be attributed.
    pub fn kind(&self, options: &Options) -> Option<Kind> {
        if !self.enabled {
            return None;
        }
        let path = self.distinguished_name.to_lowercase();
        let contains_any =
            |markers: &[String]| markers.iter().any(|m| path.contains(&m.to_lowercase()));
        if contains_any(&options.employee_markers) && !contains_any(&options.employee_exclusions) {
            Some(Kind::Employee)
        } else if contains_any(&options.contractor_markers) {
            Some(Kind::Contractor)
        } else {
            None
        }
    }

    fn to_record(&self) -> csv::StringRecord {
        csv::StringRecord::from(vec![
            self.name.as_str(),
            self.sam_account_name.as_str(),
            self.email_address.as_str(),
            self.company.as_str(),
        ])
    }

    fn clean(mut self) -> Self {
        for value in [
            &mut self.name,
            &mut self.sam_account_name,
            &mut self.email_address,
            &mut self.company,
            &mut self.distinguished_name,
        ] {
            *value = clean_value(value);
        }
        self
    }
}

/// Remove control characters and surrounding whitespace.
pub fn clean_value(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_control())
        .collect::<String>()
        .trim()
        .to_owned()
}

fn enabled<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = <String as serde::Deserialize>::deserialize(deserializer)?;
    Ok(matches!(
        value.trim().to_lowercase().as_str(),
        "true" | "1" | "yes" | "да" | "активна"
    ))
}

pub(crate) mod function {
    use crate::directory::{Entry, Error, Kind, Options, Personnel};
    use tracing::{debug, info, warn};

    /// Read a CSV export of directory accounts and return the enabled employees and contractors, in export order.
    ///
    /// Rows that can't be decoded are skipped with a warning.
    pub fn load(csv: impl std::io::Read, options: &Options) -> Result<Personnel, Error> {
        let delimiter = options
            .delimiter
            .try_into()
            .map_err(|_| Error::InvalidDelimiter(options.delimiter))?;
        let mut csv = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(csv);

        let mut personnel = Personnel::empty();
        for entry in csv.deserialize::<Entry>() {
            let entry = match entry {
                Ok(entry) => entry.clean(),
                Err(err) => {
                    warn!(%err, "skipping unreadable directory entry");
                    continue;
                }
            };
            personnel.total += 1;
            match entry.kind(options) {
                Some(Kind::Employee) => personnel.employees.push(entry.to_record()),
                Some(Kind::Contractor) => personnel.contractors.push(entry.to_record()),
                None => {
                    debug!(name = %entry.name, enabled = entry.enabled, "account is neither employee nor contractor")
                }
            }
        }
        info!(
            total = personnel.total,
            employees = personnel.employees.len(),
            contractors = personnel.contractors.len(),
            "loaded directory export"
        );
        Ok(personnel)
    }
}
pub use function::load;
