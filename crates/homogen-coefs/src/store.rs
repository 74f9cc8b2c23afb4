//! Structured HDF5 coefficient store.
//!
//! Every coefficient is one `f64` dataset named after it, with the value's
//! shape (a scalar dataspace for scalars) and an `index` attribute holding
//! its position in the set. The file root carries the `volume` attribute.

use std::path::Path;

use indexmap::IndexMap;
use tracing::debug;

use homogen_core::CoefValue;

use crate::coefficients::Coefficients;
use crate::error::{CoefsError, Result};

/// File extension of structured coefficient files.
pub const EXTENSION: &str = "h5";

const VOLUME_ATTR: &str = "volume";
const INDEX_ATTR: &str = "index";

pub fn save_structured(path: &Path, coefs: &Coefficients) -> Result<()> {
    let file = hdf5::File::create(path)?;
    file.new_attr::<f64>()
        .shape(())
        .create(VOLUME_ATTR)?
        .write_scalar(&coefs.volume())?;

    for (index, (name, value)) in coefs.iter().enumerate() {
        let dataset = match value {
            CoefValue::Scalar(v) => {
                let dataset = file.new_dataset::<f64>().shape(()).create(name.as_str())?;
                dataset.write_scalar(v)?;
                dataset
            }
            CoefValue::Array { shape, data } => {
                let dataset = file
                    .new_dataset::<f64>()
                    .shape(shape.clone())
                    .create(name.as_str())?;
                dataset.write_raw(data.as_slice())?;
                dataset
            }
        };
        dataset
            .new_attr::<u64>()
            .shape(())
            .create(INDEX_ATTR)?
            .write_scalar(&(index as u64))?;
    }

    debug!(path = %path.display(), coefs = coefs.len(), "saved structured coefficients");
    Ok(())
}

/// Load coefficient values and the volume, in their saved order.
pub fn load_structured(path: &Path) -> Result<Coefficients> {
    let file = hdf5::File::open(path)?;
    let volume = file
        .attr(VOLUME_ATTR)
        .map_err(|_| CoefsError::NotACoefFile {
            path: path.to_path_buf(),
        })?
        .read_scalar::<f64>()?;

    let mut entries = Vec::new();
    for name in file.member_names()? {
        let dataset = file.dataset(&name)?;
        let index = dataset.attr(INDEX_ATTR)?.read_scalar::<u64>()?;
        let value = if dataset.is_scalar() {
            CoefValue::scalar(dataset.read_scalar::<f64>()?)
        } else {
            CoefValue::tensor(dataset.shape(), dataset.read_raw::<f64>()?).map_err(|source| {
                CoefsError::Shape {
                    name: name.clone(),
                    source,
                }
            })?
        };
        entries.push((index, name, value));
    }
    entries.sort_by_key(|(index, ..)| *index);

    let values: IndexMap<String, CoefValue> = entries
        .into_iter()
        .map(|(_, name, value)| (name, value))
        .collect();
    let mut coefs = Coefficients::new(values);
    coefs.set_volume(volume);
    Ok(coefs)
}
