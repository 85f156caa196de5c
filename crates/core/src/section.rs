//! Tender and Section Identifiers
//!
//! `SECTION_TABLE` is the single place where a UI tab key, the remote
//! category name and the display title of a section are related. Lookups in
//! either direction are total: anything unmapped becomes
//! [`SectionId::Unknown`].

use serde::{Deserialize, Serialize};

/// Opaque tender identifier assigned by the analysis service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenderId(String);

impl TenderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Ids that are empty or whitespace-only cannot address a tender.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Display for TenderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TenderId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TenderId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Tender content categories analyzed independently by the service.
///
/// Ordering follows the tab order of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionId {
    Summary,
    Eligibility,
    ScopeOfWork,
    TechnicalRequirements,
    FinancialTerms,
    EvaluationCriteria,
    SubmissionProcess,
    Timeline,
    ContractConditions,
    DocumentChecklist,
    /// A tab key or remote name the dashboard does not model yet.
    Unknown,
}

/// One row of the section lookup table.
#[derive(Debug, Clone, Copy)]
pub struct SectionSpec {
    pub id: SectionId,
    /// Key used by the dashboard tabs
    pub tab_key: &'static str,
    /// Category name used by the analysis service
    pub remote_name: &'static str,
    /// Human-readable title
    pub title: &'static str,
    /// Whether the service can re-run this section on its own
    pub reanalyzable: bool,
}

/// The section lookup table, in tab order.
pub const SECTION_TABLE: &[SectionSpec] = &[
    SectionSpec {
        id: SectionId::Summary,
        tab_key: "summary",
        remote_name: "tender_summary",
        title: "Summary",
        reanalyzable: false,
    },
    SectionSpec {
        id: SectionId::Eligibility,
        tab_key: "eligibility",
        remote_name: "eligibility_criteria",
        title: "Eligibility",
        reanalyzable: true,
    },
    SectionSpec {
        id: SectionId::ScopeOfWork,
        tab_key: "scope",
        remote_name: "scope_of_work",
        title: "Scope of Work",
        reanalyzable: true,
    },
    SectionSpec {
        id: SectionId::TechnicalRequirements,
        tab_key: "technical",
        remote_name: "technical_requirements",
        title: "Technical Requirements",
        reanalyzable: true,
    },
    SectionSpec {
        id: SectionId::FinancialTerms,
        tab_key: "financial",
        remote_name: "financial_terms",
        title: "Financial Terms",
        reanalyzable: true,
    },
    SectionSpec {
        id: SectionId::EvaluationCriteria,
        tab_key: "evaluation",
        remote_name: "evaluation_criteria",
        title: "Evaluation Criteria",
        reanalyzable: true,
    },
    SectionSpec {
        id: SectionId::SubmissionProcess,
        tab_key: "submission",
        remote_name: "submission_process",
        title: "Submission Process",
        reanalyzable: true,
    },
    SectionSpec {
        id: SectionId::Timeline,
        tab_key: "timeline",
        remote_name: "key_dates",
        title: "Timeline",
        reanalyzable: true,
    },
    SectionSpec {
        id: SectionId::ContractConditions,
        tab_key: "contract",
        remote_name: "contract_conditions",
        title: "Contract Conditions",
        reanalyzable: true,
    },
    SectionSpec {
        id: SectionId::DocumentChecklist,
        tab_key: "documents",
        remote_name: "required_documents",
        title: "Required Documents",
        reanalyzable: false,
    },
];

impl SectionId {
    /// Every modeled section in tab order (excludes `Unknown`).
    pub fn all() -> impl Iterator<Item = SectionId> {
        SECTION_TABLE.iter().map(|spec| spec.id)
    }

    /// Look up a section by its dashboard tab key.
    pub fn from_tab_key(key: &str) -> SectionId {
        SECTION_TABLE
            .iter()
            .find(|spec| spec.tab_key == key)
            .map_or(SectionId::Unknown, |spec| spec.id)
    }

    /// Look up a section by its remote category name.
    pub fn from_remote_name(name: &str) -> SectionId {
        SECTION_TABLE
            .iter()
            .find(|spec| spec.remote_name == name)
            .map_or(SectionId::Unknown, |spec| spec.id)
    }

    /// Table row for this section, `None` for `Unknown`.
    pub fn spec(self) -> Option<&'static SectionSpec> {
        SECTION_TABLE.iter().find(|spec| spec.id == self)
    }

    pub fn tab_key(self) -> &'static str {
        self.spec().map_or("unknown", |spec| spec.tab_key)
    }

    /// Remote category name, `None` when the section is not modeled.
    pub fn remote_name(self) -> Option<&'static str> {
        self.spec().map(|spec| spec.remote_name)
    }

    pub fn title(self) -> &'static str {
        self.spec().map_or("Unknown", |spec| spec.title)
    }

    /// The initial summary and the final document list cannot be re-run
    /// on their own by the service.
    pub fn is_reanalyzable(self) -> bool {
        self.spec().is_some_and(|spec| spec.reanalyzable)
    }

    pub fn is_known(self) -> bool {
        self != SectionId::Unknown
    }
}

impl std::fmt::Display for SectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tab_key())
    }
}
