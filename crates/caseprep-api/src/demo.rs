//! The ungated demo catalog.
//!
//! Three fixed cases, each with a fixed interview identifier owned by one
//! shared demo user. Demo progress is kept in an in-memory store and is
//! not durable.

use std::sync::Arc;

use caseprep_core::auth::Requester;
use caseprep_core::error::DomainError;
use caseprep_interview::domain::template::Template;
use caseprep_store::memory::{InMemoryInterviewStore, InMemoryTemplateStore};
use serde::Deserialize;
use uuid::Uuid;

const CATALOG_YAML: &str = include_str!("demo_templates.yaml");

/// Owner of every demo interview.
pub const DEMO_USER_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_4000_8000_0000_0000_0de0);

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    slug: String,
    interview_id: Uuid,
    template: Template,
}

fn parse_entries(yaml: &str) -> Result<Vec<CatalogEntry>, DomainError> {
    serde_yaml::from_str(yaml).map_err(|e| DomainError::Validation(format!("demo catalog: {e}")))
}

/// Templates of the embedded catalog, in catalog order.
///
/// Seeds the authenticated template store when no database is configured.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the catalog is malformed.
pub fn catalog_templates() -> Result<Vec<Template>, DomainError> {
    Ok(parse_entries(CATALOG_YAML)?
        .into_iter()
        .map(|entry| entry.template)
        .collect())
}

/// Parses a YAML list of templates.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the text does not parse.
pub fn templates_from_yaml(yaml: &str) -> Result<Vec<Template>, DomainError> {
    serde_yaml::from_str(yaml).map_err(|e| DomainError::Validation(format!("templates: {e}")))
}

/// One demo case: a URL slug, its template and its fixed interview.
#[derive(Debug, Clone)]
pub struct DemoCase {
    /// URL slug, e.g. `market-entry`.
    pub slug: String,
    /// Fixed interview identifier.
    pub interview_id: Uuid,
    /// Template identifier.
    pub template_id: Uuid,
}

/// Demo cases plus their isolated, in-memory stores.
#[derive(Debug)]
pub struct DemoCatalog {
    cases: Vec<DemoCase>,
    /// Demo interview progress.
    pub interviews: Arc<InMemoryInterviewStore>,
    /// Demo templates.
    pub templates: Arc<InMemoryTemplateStore>,
}

impl DemoCatalog {
    /// Loads the embedded catalog.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the catalog is malformed.
    pub fn load() -> Result<Self, DomainError> {
        Self::from_yaml(CATALOG_YAML)
    }

    /// Loads a catalog from YAML text.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the text does not parse, a
    /// template is malformed, or a slug or identifier repeats.
    pub fn from_yaml(yaml: &str) -> Result<Self, DomainError> {
        let entries = parse_entries(yaml)?;

        let mut cases: Vec<DemoCase> = Vec::with_capacity(entries.len());
        let mut templates = Vec::with_capacity(entries.len());
        for entry in entries {
            if cases
                .iter()
                .any(|c| c.slug == entry.slug || c.interview_id == entry.interview_id)
            {
                return Err(DomainError::Validation(format!(
                    "demo catalog repeats case '{}'",
                    entry.slug
                )));
            }
            cases.push(DemoCase {
                slug: entry.slug,
                interview_id: entry.interview_id,
                template_id: entry.template.id,
            });
            templates.push(entry.template);
        }

        Ok(Self {
            cases,
            interviews: Arc::new(InMemoryInterviewStore::new()),
            templates: Arc::new(InMemoryTemplateStore::from_templates(templates)?),
        })
    }

    /// The requester every demo operation acts as.
    #[must_use]
    pub fn requester(&self) -> Requester {
        Requester::member(DEMO_USER_ID)
    }

    /// All cases in catalog order.
    #[must_use]
    pub fn cases(&self) -> &[DemoCase] {
        &self.cases
    }

    /// Looks up a case by slug.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::TemplateNotFound` for an unknown slug.
    pub fn case(&self, slug: &str) -> Result<&DemoCase, DomainError> {
        self.cases
            .iter()
            .find(|c| c.slug == slug)
            .ok_or_else(|| DomainError::TemplateNotFound(slug.to_owned()))
    }
}
