use thiserror::Error;

/// Init codes surfaced to the host runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InitError {
    #[error("interface not found")]
    InterfaceNotFound,
    #[error("driver failed to initialize")]
    DriverFailed,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("setting {section}/{key} is unset and has no default")]
    UnsetSettingHasNoDefault { section: String, key: String },
    #[error("setting {section}/{key} has the wrong type")]
    WrongType { section: String, key: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PropertyError {
    #[error("no device behind property container")]
    InvalidDevice,
    #[error("property is not set")]
    UnknownProperty,
    #[error("property holds a different data type")]
    WrongDataType,
}

#[derive(Debug, Error)]
pub enum SettingsLoadError {
    #[error("failed to read settings file")]
    Io(#[from] std::io::Error),
    #[error("failed to parse settings json")]
    Json(#[from] serde_json::Error),
    #[error("settings section {0} is not a json object")]
    NotAnObject(String),
}
