#![deny(rust_2018_idioms)]

pub mod table;
pub use table::Table;

pub mod keys;
pub use keys::KeySet;

pub mod duplicates;

pub mod stale;
pub use stale::function::find_stale;

pub mod source;
pub use source::SourceSpec;

pub mod directory;
pub use directory::Personnel;

pub mod roster;
pub use roster::function::missing_in_roster;

pub mod discover;

pub mod reconcile;
pub use reconcile::function::{reconcile, run};

pub mod report;

pub mod config;
pub use config::Config;

/// The column under which directory-derived tables carry the full name of a person.
pub const DIRECTORY_NAME_FIELD: &str = "AD_ФИО";

/// Turn a full name as found in any of the sources into the key used to compare people.
///
/// `ё` is folded into `е`, whitespace is collapsed and only the first two words (last and first name) are kept,
/// upper-cased. A missing or blank name yields the empty key, which never takes part in comparisons.
pub fn normalize_name<'a>(full_name: impl Into<Option<&'a str>>) -> String {
    let Some(full_name) = full_name.into() else {
        return String::new();
    };
    let full_name = full_name.replace('ё', "е").replace('Ё', "Е");
    let mut parts = full_name.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some(last), Some(first)) => format!("{last} {first}").to_uppercase(),
        (Some(single), None) => single.to_uppercase(),
        _ => String::new(),
    }
}
