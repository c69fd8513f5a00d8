//! Issuer registry row.

use std::fmt;

/// A tradable issuer. `name` is nullable in the stored schema, so rows read
/// back from a database not written by this crate may lack one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stock {
    pub id: i32,
    pub name: Option<String>,
}

impl Stock {
    pub fn new(id: i32, name: &str) -> Self {
        Self {
            id,
            name: Some(name.to_string()),
        }
    }

    pub fn has_name(&self, name: &str) -> bool {
        self.name.as_deref() == Some(name)
    }
}

impl fmt::Display for Stock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} (id {})", name, self.id),
            None => write!(f, "<unnamed> (id {})", self.id),
        }
    }
}
