use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ExplorerError;

/// Free-text fragment of a benefit name, e.g. "rozrodcz" or "kardio".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchTerm(String);

impl SearchTerm {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SearchTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SearchTerm {
    type Err = ExplorerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ExplorerError::EmptySearchTerm);
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl Default for SearchTerm {
    fn default() -> Self {
        Self("rozrodcz".to_string())
    }
}

/// Year of the NFZ statistics tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Year(u16);

impl Year {
    pub const MIN: u16 = 2010;
    pub const MAX: u16 = 2030;

    pub fn new(value: u16) -> Result<Self, ExplorerError> {
        if !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(ExplorerError::YearOutOfRange(value.to_string()));
        }
        Ok(Self(value))
    }

    pub fn get(self) -> u16 {
        self.0
    }
}

impl fmt::Display for Year {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Year {
    type Err = ExplorerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let parsed = value
            .trim()
            .parse::<u16>()
            .map_err(|_| ExplorerError::YearOutOfRange(value.to_string()))?;
        Self::new(parsed)
    }
}

impl Default for Year {
    fn default() -> Self {
        Self(2019)
    }
}

/// Page size for the benefits lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Limit(u16);

impl Limit {
    pub const MIN: u16 = 1;
    pub const MAX: u16 = 200;

    pub fn new(value: u16) -> Result<Self, ExplorerError> {
        if !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(ExplorerError::LimitOutOfRange(value.to_string()));
        }
        Ok(Self(value))
    }

    pub fn get(self) -> u16 {
        self.0
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Limit {
    type Err = ExplorerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let parsed = value
            .trim()
            .parse::<u16>()
            .map_err(|_| ExplorerError::LimitOutOfRange(value.to_string()))?;
        Self::new(parsed)
    }
}

impl Default for Limit {
    fn default() -> Self {
        Self(25)
    }
}

/// The three scalar inputs of the fetch pipeline. `Hash + Eq` so identical
/// triples can key the memoization cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct QueryParams {
    pub term: SearchTerm,
    pub year: Year,
    pub limit: Limit,
}

/// One of the three sequential remote-lookup phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Benefits,
    IndexOfTables,
    Icd10Diseases,
}

impl Stage {
    pub fn label(self) -> &'static str {
        match self {
            Stage::Benefits => "benefits",
            Stage::IndexOfTables => "index-of-tables",
            Stage::Icd10Diseases => "icd10-diseases",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One failure captured during any stage. Failures are accumulated in the
/// error table, never raised out of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorRecord {
    #[serde(rename = "etap")]
    pub stage: Stage,
    #[serde(rename = "kod/ID")]
    pub item_id: Option<String>,
    #[serde(rename = "komunikat")]
    pub message: String,
}

impl ErrorRecord {
    pub fn new(stage: Stage, item_id: Option<String>, message: impl Into<String>) -> Self {
        Self {
            stage,
            item_id,
            message: message.into(),
        }
    }
}
