use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown weapon class `{0}`")]
    UnknownWeaponClass(String),
    #[error("weapon entry is missing its `class` tag")]
    MissingWeaponClass,
    #[error("{field} = {value} is outside [{min}, {max}]")]
    ConfigOutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
