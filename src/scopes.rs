use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Scopes requested by the token bootstrap: read-only Drive, Drive activity,
/// Docs and Sheets, plus write access to files this application creates.
pub const DEFAULT_SCOPES: [&str; 5] = [
    "https://www.googleapis.com/auth/drive.readonly",
    "https://www.googleapis.com/auth/drive.activity.readonly",
    "https://www.googleapis.com/auth/documents.readonly",
    "https://www.googleapis.com/auth/spreadsheets.readonly",
    "https://www.googleapis.com/auth/drive.file",
];

/// Ordered, duplicate-free set of OAuth scopes.
///
/// The order is kept for the `scope` request parameter; comparisons between
/// requested and granted scopes use set semantics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct ScopeSet(Vec<String>);

impl ScopeSet {
    /// Build a scope set, dropping blanks and repeated entries.
    pub fn new<I, S>(scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ordered: Vec<String> = Vec::new();
        for scope in scopes {
            let scope = scope.into();
            let scope = scope.trim();
            if !scope.is_empty() && !ordered.iter().any(|s| s == scope) {
                ordered.push(scope.to_string());
            }
        }
        Self(ordered)
    }

    /// Parse the space-delimited form used by the `scope` parameter.
    pub fn parse(delimited: &str) -> Self {
        Self::new(delimited.split_whitespace())
    }

    /// Render the space-delimited form used by the `scope` parameter.
    pub fn to_param(&self) -> String {
        self.0.join(" ")
    }

    /// Scopes in request order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Number of distinct scopes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no scope is requested.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Set equality, ignoring order.
    pub fn same_set(&self, other: &ScopeSet) -> bool {
        let lhs: BTreeSet<&str> = self.iter().collect();
        let rhs: BTreeSet<&str> = other.iter().collect();
        lhs == rhs
    }
}

impl Default for ScopeSet {
    fn default() -> Self {
        Self::new(DEFAULT_SCOPES)
    }
}

impl From<Vec<String>> for ScopeSet {
    fn from(scopes: Vec<String>) -> Self {
        Self::new(scopes)
    }
}

impl From<ScopeSet> for Vec<String> {
    fn from(scopes: ScopeSet) -> Self {
        scopes.0
    }
}

impl fmt::Display for ScopeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_param())
    }
}
