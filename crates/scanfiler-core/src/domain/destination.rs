//! Destination naming for stored documents
//!
//! The destination of a classified document is a pure function of the storage
//! root, the classification and the upload date:
//! `<root>/<category>/<YYYY-MM-DD>_<file name>`.
//!
//! The category is used verbatim as a folder segment. It is not sanitized, so
//! a category containing `/` produces extra path segments.

use chrono::NaiveDate;

use super::classification::Classification;

/// Where a classified document is stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    root: String,
    category: String,
    file_name: String,
}

impl Destination {
    /// Computes the destination for a classification uploaded on `date`
    pub fn new(root: &str, classification: &Classification, date: NaiveDate) -> Self {
        Self {
            root: root.trim_matches('/').to_string(),
            category: classification.category.clone(),
            file_name: format!("{}_{}", date.format("%Y-%m-%d"), classification.file_name),
        }
    }

    /// Storage root (no leading or trailing slash)
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Category folder name
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Date-prefixed file name
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Folder segments from the root down to the category folder
    pub fn folder_segments(&self) -> Vec<&str> {
        self.root
            .split('/')
            .chain(self.category.split('/'))
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Full relative path, `<root>/<category>/<date>_<name>`
    pub fn path(&self) -> String {
        if self.root.is_empty() {
            format!("{}/{}", self.category, self.file_name)
        } else {
            format!("{}/{}/{}", self.root, self.category, self.file_name)
        }
    }
}

impl std::fmt::Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path())
    }
}
