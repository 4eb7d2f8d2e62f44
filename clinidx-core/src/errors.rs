use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClinidxError {
    #[error("Invalid variant key: {0}")]
    InvalidVariantKey(String),

    #[error("Invalid strand symbol: {0}")]
    InvalidStrand(String),

    #[error("Invalid sequence location: {0}")]
    InvalidLocation(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type ClinidxResult<T> = std::result::Result<T, ClinidxError>;
