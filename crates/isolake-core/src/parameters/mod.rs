//! Site, hydrologic and climate-period parameters
//!
//! Each parameter struct provides defaults matching the Bear Lake study and can be read
//! from a TOML string, with missing keys falling back to those defaults.

mod hydrologic;
mod periods;
mod site;

pub use hydrologic::HydrologicParameters;
pub use periods::{ClimatePeriod, ClimatePeriods, Scenario};
pub use site::{SiteParameters, SpeciesObservations};

use crate::errors::{IsolakeError, IsolakeResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use toml::{Table, Value};

/// Parse `source` as overrides of `T::default()`.
///
/// Tables are merged key by key, so a nested record such as one species' observations can
/// be overridden partially.
fn parse_toml<T>(source: &str, what: &str) -> IsolakeResult<T>
where
    T: Default + Serialize + DeserializeOwned,
{
    let invalid = |e: &dyn std::fmt::Display| {
        IsolakeError::InvalidConfig(format!("Failed to parse {}: {}", what, e))
    };
    let overrides: Table = toml::from_str(source).map_err(|e| invalid(&e))?;
    let mut merged = Value::try_from(T::default()).map_err(|e| invalid(&e))?;
    merge_into(&mut merged, overrides);
    merged.try_into().map_err(|e| invalid(&e))
}

fn merge_into(base: &mut Value, overrides: Table) {
    let Value::Table(table) = base else {
        *base = Value::Table(overrides);
        return;
    };
    for (key, value) in overrides {
        match value {
            Value::Table(nested) if table.get(&key).is_some_and(Value::is_table) => {
                if let Some(existing) = table.get_mut(&key) {
                    merge_into(existing, nested);
                }
            }
            value => {
                table.insert(key, value);
            }
        }
    }
}
