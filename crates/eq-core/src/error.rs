use thiserror::Error;

pub type EqResult<T> = Result<T, EqError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EqError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },
}
