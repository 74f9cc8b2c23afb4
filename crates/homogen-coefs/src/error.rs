use std::path::PathBuf;

use thiserror::Error;

/// Errors while persisting or loading coefficients.
#[derive(Debug, Error)]
pub enum CoefsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HDF5 error: {0}")]
    Hdf5(#[from] hdf5::Error),

    #[error("coefficient '{name}' has an inconsistent shape: {source}")]
    Shape {
        name: String,
        source: homogen_core::ShapeError,
    },

    #[error("failed to encode coefficients: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("failed to decode coefficients: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("{} is not a homogen coefficient file", .path.display())]
    NotACoefFile { path: PathBuf },

    #[error("{} has format version {found}, expected {expected}", .path.display())]
    Version {
        path: PathBuf,
        found: u32,
        expected: u32,
    },
}

pub type Result<T> = std::result::Result<T, CoefsError>;
