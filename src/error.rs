use thiserror::Error;

use crate::model::franchise::Franchise;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum CoverError {
    #[error("pair members must differ (got {0} twice)")]
    DegeneratePair(Franchise),
    #[error("{0} is not a current franchise")]
    UnknownFranchise(Franchise),
    #[error("config parse error: {0}")]
    ConfigParse(String),
    #[error("config validation error: {0}")]
    ConfigValidation(String),
}

pub type CoverResult<T> = Result<T, CoverError>;
