use derive_more::Constructor;
use std::collections::HashMap;

use crate::consistency::Consistency;
use crate::error::{Error, Result};
use crate::properties::{PropertyReader, INPUT_CONSISTENCY_LEVEL, INPUT_FETCH_SIZE_IN_ROWS};

pub const DEFAULT_FETCH_SIZE_IN_ROWS: usize = 1000;

/// Settings of a table scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Constructor)]
pub struct ReadConf {
    pub fetch_size_in_rows: usize,
    pub consistency: Consistency,
}

impl Default for ReadConf {
    fn default() -> Self {
        ReadConf::new(DEFAULT_FETCH_SIZE_IN_ROWS, Consistency::LocalOne)
    }
}

impl ReadConf {
    pub fn from_properties(properties: &HashMap<String, String>) -> Result<Self> {
        let reader = PropertyReader::new(properties);

        let fetch_size_in_rows = reader
            .parse(INPUT_FETCH_SIZE_IN_ROWS, "a positive integer")?
            .unwrap_or(DEFAULT_FETCH_SIZE_IN_ROWS);
        if fetch_size_in_rows == 0 {
            return Err(Error::ConfigValidation(format!(
                "'{INPUT_FETCH_SIZE_IN_ROWS}' must be positive"
            )));
        }

        let consistency = reader
            .string(INPUT_CONSISTENCY_LEVEL)
            .map(str::parse::<Consistency>)
            .transpose()?
            .unwrap_or_default();

        Ok(ReadConf::new(fetch_size_in_rows, consistency))
    }
}
