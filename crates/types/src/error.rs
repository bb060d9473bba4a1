#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("invalid wei amount: {0:?}")]
    InvalidWei(String),

    #[error("wei amount out of range: {0}")]
    OutOfRange(String),

    #[error("unknown value check method: {0}")]
    UnknownCheckMethod(String),
}
