use crate::error::{SettingsError, SettingsLoadError};
use crate::host::Settings;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::convert::TryFrom;
use std::path::Path;
use std::str::FromStr;

/// Settings store backed by a `.vrsettings` style json document.
///
/// ```json
/// { "driver_faceless": { "serialNumber": "Faceless-0001", "renderWidth": 1512 } }
/// ```
#[derive(Debug, Clone, Default)]
pub struct JsonSettings {
    sections: HashMap<String, Map<String, Value>>,
}

impl JsonSettings {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SettingsLoadError> {
        let contents = std::fs::read_to_string(path)?;
        contents.parse()
    }

    pub fn set(&mut self, section: &str, key: &str, value: Value) {
        self.sections
            .entry(section.to_owned())
            .or_default()
            .insert(key.to_owned(), value);
    }

    fn lookup(&self, section: &str, key: &str) -> Result<&Value, SettingsError> {
        self.sections
            .get(section)
            .and_then(|entries| entries.get(key))
            .ok_or_else(|| SettingsError::UnsetSettingHasNoDefault {
                section: section.to_owned(),
                key: key.to_owned(),
            })
    }
}

fn wrong_type(section: &str, key: &str) -> SettingsError {
    SettingsError::WrongType {
        section: section.to_owned(),
        key: key.to_owned(),
    }
}

impl FromStr for JsonSettings {
    type Err = SettingsLoadError;

    fn from_str(contents: &str) -> Result<Self, Self::Err> {
        let document: Map<String, Value> = serde_json::from_str(contents)?;
        let mut sections = HashMap::new();
        for (name, section) in document {
            match section {
                Value::Object(entries) => {
                    sections.insert(name, entries);
                }
                _ => return Err(SettingsLoadError::NotAnObject(name)),
            }
        }
        Ok(Self { sections })
    }
}

impl Settings for JsonSettings {
    fn get_string(&self, section: &str, key: &str) -> Result<String, SettingsError> {
        self.lookup(section, key)?
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| wrong_type(section, key))
    }

    fn get_int32(&self, section: &str, key: &str) -> Result<i32, SettingsError> {
        self.lookup(section, key)?
            .as_i64()
            .and_then(|value| i32::try_from(value).ok())
            .ok_or_else(|| wrong_type(section, key))
    }

    fn get_float(&self, section: &str, key: &str) -> Result<f32, SettingsError> {
        self.lookup(section, key)?
            .as_f64()
            .map(|value| value as f32)
            .ok_or_else(|| wrong_type(section, key))
    }
}
