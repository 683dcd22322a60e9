use serde_json::{Map, Value};
use std::sync::Arc;

use crate::cluster::Session;
use crate::consistency::Consistency;
use crate::{Error, ReadConf, Result};

/// A single row projected onto scanned columns. Values follow column order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    values: Vec<Value>,
}

impl Row {
    fn project(columns: &[String], source: &Map<String, Value>) -> Self {
        Row {
            values: columns
                .iter()
                .map(|column| source.get(column).cloned().unwrap_or(Value::Null))
                .collect(),
        }
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    #[inline]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    #[inline]
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

/// Streams rows for a given column projection over an established session.
#[derive(Debug)]
pub struct Scanner {
    session: Arc<Session>,
    columns: Vec<String>,
    read_conf: ReadConf,
}

impl Scanner {
    pub fn new(session: Arc<Session>, columns: Vec<String>, read_conf: ReadConf) -> Result<Self> {
        if columns.is_empty() {
            return Err(Error::ConfigValidation(
                "At least one column must be scanned".into(),
            ));
        }

        if read_conf.fetch_size_in_rows == 0 {
            return Err(Error::ConfigValidation("Fetch size must be positive".into()));
        }

        Ok(Scanner {
            session,
            columns,
            read_conf,
        })
    }

    #[inline]
    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    #[inline]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[inline]
    pub fn fetch_size(&self) -> usize {
        self.read_conf.fetch_size_in_rows
    }

    #[inline]
    pub fn consistency(&self) -> Consistency {
        self.read_conf.consistency
    }

    /// Projects source rows onto scanned columns, in pages of at most fetch size rows. Columns
    /// missing from a source row become nulls.
    pub fn scan<I>(&self, rows: I) -> Pages<'_, I::IntoIter>
    where
        I: IntoIterator<Item = Map<String, Value>>,
    {
        Pages {
            columns: &self.columns,
            rows: rows.into_iter(),
            fetch_size: self.read_conf.fetch_size_in_rows,
        }
    }

    /// Releases the scanner. The session stays open.
    pub fn close(self) {}
}

/// Pages of projected rows.
pub struct Pages<'a, I> {
    columns: &'a [String],
    rows: I,
    fetch_size: usize,
}

impl<I: Iterator<Item = Map<String, Value>>> Iterator for Pages<'_, I> {
    type Item = Vec<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        let columns = self.columns;
        let page: Vec<_> = self
            .rows
            .by_ref()
            .take(self.fetch_size)
            .map(|row| Row::project(columns, &row))
            .collect();

        if page.is_empty() {
            None
        } else {
            Some(page)
        }
    }
}
