use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::parser::PageFragments;
use crate::taxonomy::is_final_report;

/// Catalog metadata that travels with a report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportMeta {
    #[serde(alias = "dtype", alias = "hazard")]
    pub disaster_type: Option<String>,
    /// Appeal name, usually "<country>: <hazard>".
    #[serde(alias = "name")]
    pub title: Option<String>,
    pub country: Option<String>,
    pub region: Option<String>,
    pub start_date: Option<String>,
    /// Title of the source document, e.g. "DREF Final Report".
    pub document_name: Option<String>,
}

impl ReportMeta {
    /// Calendar date the operation started, when `start_date` carries one.
    pub fn date(&self) -> Option<NaiveDate> {
        let raw = self.start_date.as_deref()?.trim();
        let day = raw.get(..10).unwrap_or(raw);
        NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
    }
}

/// One converted report: the page-concatenated text plus per-page fragments.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentInput {
    pub lead: String,
    pub text: String,
    #[serde(flatten)]
    pub pages: PageFragments,
    #[serde(default)]
    pub meta: Option<ReportMeta>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(Box<DocumentInput>),
    Many(Vec<DocumentInput>),
}

pub fn parse_documents(json: &str) -> Result<Vec<DocumentInput>> {
    let docs = match serde_json::from_str::<OneOrMany>(json)? {
        OneOrMany::One(doc) => vec![*doc],
        OneOrMany::Many(docs) => docs,
    };
    for doc in &docs {
        if let Some(name) = doc.meta.as_ref().and_then(|m| m.document_name.as_deref()) {
            if !is_final_report(name) {
                warn!(lead = %doc.lead, document = name, "not a DREF final report");
            }
        }
    }
    Ok(docs)
}

/// Read every report in a JSON file holding one document or an array of them.
pub fn load_documents(path: &Path) -> Result<Vec<DocumentInput>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    parse_documents(&json).with_context(|| format!("parsing {}", path.display()))
}
