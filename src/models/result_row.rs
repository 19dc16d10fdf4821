use serde::{Deserialize, Serialize};

/// Cell texts of one scraped table row, in column order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRow {
    cells: Vec<String>,
}

impl ResultRow {
    pub fn new(cells: Vec<String>) -> Self {
        Self { cells }
    }

    pub fn cells(&self) -> &[String] {
        &self.cells
    }

    pub fn cell(&self, index: usize) -> Option<&str> {
        self.cells.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// First cell; the system name on the scout table.
    pub fn label(&self) -> &str {
        self.cell(0).unwrap_or_default()
    }

    pub fn text(&self) -> String {
        self.cells.join(" ")
    }
}

impl<S: Into<String>> FromIterator<S> for ResultRow {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}
