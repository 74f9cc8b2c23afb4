//! The homogenized coefficient set and its output.
//!
//! [`Coefficients`] is assembled from an engine run. It is reported on the
//! console inside a [`print::with_precision`] scope and persisted as an HDF5
//! file with [`store::save_structured`], a bincode snapshot with
//! [`snapshot::save_snapshot`] and a readable table with [`text::save_text`].

pub mod coefficients;
pub mod error;
pub mod print;
pub mod snapshot;
pub mod store;
pub mod text;

pub use coefficients::Coefficients;
pub use error::{CoefsError, Result};
pub use print::{PrecisionGuard, display_precision, with_precision};
