//! The coefficient aggregate.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use homogen_core::format::display_number;
use homogen_core::{CoefValue, FloatFormat};

use crate::print::display_precision;

/// Final coefficient values of one run plus their presentation settings.
///
/// Values come from the engine; only `volume` is attached afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coefficients {
    volume: f64,
    values: IndexMap<String, CoefValue>,
    tex_names: Option<IndexMap<String, String>>,
    float_format: FloatFormat,
}

impl Coefficients {
    /// Wrap engine output. The volume starts as NaN until [`set_volume`].
    ///
    /// [`set_volume`]: Coefficients::set_volume
    pub fn new(values: IndexMap<String, CoefValue>) -> Self {
        Self {
            volume: f64::NAN,
            values,
            tex_names: None,
            float_format: FloatFormat::default(),
        }
    }

    pub fn with_tex_names(mut self, tex_names: Option<IndexMap<String, String>>) -> Self {
        self.tex_names = tex_names;
        self
    }

    pub fn with_float_format(mut self, float_format: FloatFormat) -> Self {
        self.float_format = float_format;
        self
    }

    pub fn set_volume(&mut self, volume: f64) {
        self.volume = volume;
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn tex_names(&self) -> Option<&IndexMap<String, String>> {
        self.tex_names.as_ref()
    }

    pub fn float_format(&self) -> &FloatFormat {
        &self.float_format
    }

    pub fn get(&self, name: &str) -> Option<&CoefValue> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, CoefValue> {
        self.values.iter()
    }

    pub fn values(&self) -> &IndexMap<String, CoefValue> {
        &self.values
    }

    /// Display name of a coefficient: its tex name when one is given.
    pub fn label<'a>(&'a self, name: &'a str) -> &'a str {
        self.tex_names
            .as_ref()
            .and_then(|t| t.get(name))
            .map_or(name, String::as_str)
    }

    /// Tex names whose key is not a coefficient, in declaration order.
    pub fn unmatched_tex_names(&self) -> Vec<String> {
        self.tex_names
            .iter()
            .flat_map(|t| t.keys())
            .filter(|k| !self.values.contains_key(*k))
            .cloned()
            .collect()
    }

    /// Console report with `digits` decimals.
    pub fn report(&self, digits: usize) -> String {
        let mut out = format!("volume: {}\n", display_number(self.volume, Some(digits)));
        for (name, value) in &self.values {
            out.push_str(&format!("{}:\n{:.*}\n", name, digits, value));
        }
        out
    }
}

impl fmt::Display for Coefficients {
    /// Uses the current display precision of this thread.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.report(display_precision()))
    }
}
