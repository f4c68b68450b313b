use thiserror::Error;

use bulwark_core::types::UnitId;
use bulwark_core::CoreError;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("no unit with id {0:?}")]
    UnknownUnit(UnitId),
    #[error("unit id {0:?} is already in use")]
    DuplicateUnit(UnitId),
    #[error("unit {0:?} is missing a required component")]
    MissingComponent(UnitId),
    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type Result<T> = std::result::Result<T, SimError>;
