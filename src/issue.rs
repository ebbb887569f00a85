// SPDX-License-Identifier: PMPL-1.0-or-later
//! Issue data model: the unit of detection and remediation tracking.
//!
//! An [`Issue`] is one detected accessibility defect, typed against a closed
//! catalogue, severity-rated, and carried through the operator's remediation
//! lifecycle by the session store. Everything downstream (scoring, suggestion
//! enhancement, statistics) dispatches exhaustively on [`IssueType`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::document::FieldKind;
use crate::geometry::Rect;

/// Stable issue identifier, assigned by `SessionStore::set_issues` when the
/// issue list is finalized. Never reused or mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IssueId(pub u32);

impl IssueId {
    /// Placeholder carried by issues before the list is finalized.
    pub const UNASSIGNED: IssueId = IssueId(u32::MAX);
}

impl fmt::Display for IssueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "issue-{}", self.0)
    }
}

impl FromStr for IssueId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let n = s
            .strip_prefix("issue-")
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| format!("invalid issue id: {}", s))?;
        Ok(IssueId(n))
    }
}

impl Serialize for IssueId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for IssueId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Severity levels for issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    /// Ordinal weight used for presentation ordering (error > warning > info)
    pub fn ordinal(&self) -> u8 {
        match self {
            Severity::Error => 3,
            Severity::Warning => 2,
            Severity::Info => 1,
        }
    }

    /// Base deduction weight used by the scorer
    pub fn base_weight(&self) -> f64 {
        match self {
            Severity::Error => 5.0,
            Severity::Warning => 2.0,
            Severity::Info => 0.5,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// Scoring category an issue type maps into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Structural,
    Content,
    Forms,
    /// Counted toward the overall score but excluded from category scores
    Other,
}

/// Closed catalogue of detectable issue types
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueType {
    MissingAltText,
    GenericLinkText,
    MissingFormLabel,
    HeadingHierarchy,
    TableStructure,
    UntaggedContent,
    MissingDocumentTitle,
    MissingLanguage,
    FormJavascriptMouseOnly,
    FormJavascriptValidation,
    FormJavascriptTiming,
    FormTabOrder,
    MissingFormInstructions,
    /// Catch-all for capability-detected issues outside the catalogue
    AiDetectedIssue,
}

impl IssueType {
    /// Wire name, matching the serde kebab-case representation
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueType::MissingAltText => "missing-alt-text",
            IssueType::GenericLinkText => "generic-link-text",
            IssueType::MissingFormLabel => "missing-form-label",
            IssueType::HeadingHierarchy => "heading-hierarchy",
            IssueType::TableStructure => "table-structure",
            IssueType::UntaggedContent => "untagged-content",
            IssueType::MissingDocumentTitle => "missing-document-title",
            IssueType::MissingLanguage => "missing-language",
            IssueType::FormJavascriptMouseOnly => "form-javascript-mouse-only",
            IssueType::FormJavascriptValidation => "form-javascript-validation",
            IssueType::FormJavascriptTiming => "form-javascript-timing",
            IssueType::FormTabOrder => "form-tab-order",
            IssueType::MissingFormInstructions => "missing-form-instructions",
            IssueType::AiDetectedIssue => "ai-detected-issue",
        }
    }

    /// Parse a type label, mapping anything outside the catalogue to the
    /// `ai-detected-issue` catch-all. Used for capability-reported types.
    pub fn parse_lenient(label: &str) -> IssueType {
        label.parse().unwrap_or(IssueType::AiDetectedIssue)
    }

    /// Scoring category this type maps into. The lookup is intentionally
    /// sparse: table-structure, missing-form-instructions, and the AI
    /// catch-all land in `Other` and only count toward the overall score.
    pub fn category(&self) -> Category {
        match self {
            IssueType::MissingDocumentTitle
            | IssueType::MissingLanguage
            | IssueType::UntaggedContent
            | IssueType::HeadingHierarchy => Category::Structural,
            IssueType::MissingAltText | IssueType::GenericLinkText => Category::Content,
            IssueType::MissingFormLabel
            | IssueType::FormJavascriptMouseOnly
            | IssueType::FormJavascriptValidation
            | IssueType::FormJavascriptTiming
            | IssueType::FormTabOrder => Category::Forms,
            IssueType::TableStructure
            | IssueType::MissingFormInstructions
            | IssueType::AiDetectedIssue => Category::Other,
        }
    }

    /// Critical types carry a 1.5x deduction multiplier in the scorer
    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            IssueType::MissingAltText
                | IssueType::MissingFormLabel
                | IssueType::FormJavascriptMouseOnly
        )
    }

    /// Types that benefit from a generated remediation suggestion
    pub fn enhancement_eligible(&self) -> bool {
        matches!(
            self,
            IssueType::MissingAltText | IssueType::TableStructure | IssueType::GenericLinkText
        )
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IssueType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "missing-alt-text" => Ok(IssueType::MissingAltText),
            "generic-link-text" => Ok(IssueType::GenericLinkText),
            "missing-form-label" => Ok(IssueType::MissingFormLabel),
            "heading-hierarchy" => Ok(IssueType::HeadingHierarchy),
            "table-structure" => Ok(IssueType::TableStructure),
            "untagged-content" => Ok(IssueType::UntaggedContent),
            "missing-document-title" => Ok(IssueType::MissingDocumentTitle),
            "missing-language" => Ok(IssueType::MissingLanguage),
            "form-javascript-mouse-only" => Ok(IssueType::FormJavascriptMouseOnly),
            "form-javascript-validation" => Ok(IssueType::FormJavascriptValidation),
            "form-javascript-timing" => Ok(IssueType::FormJavascriptTiming),
            "form-tab-order" => Ok(IssueType::FormTabOrder),
            "missing-form-instructions" => Ok(IssueType::MissingFormInstructions),
            "ai-detected-issue" => Ok(IssueType::AiDetectedIssue),
            other => Err(format!("unknown issue type: {}", other)),
        }
    }
}

/// Remediation lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueStatus {
    Pending,
    Accepted,
    Modified,
    Skipped,
    Flagged,
}

impl IssueStatus {
    /// Whether this status counts toward resolution progress.
    /// Flagged issues are parked, not resolved.
    pub fn is_resolved(&self) -> bool {
        matches!(
            self,
            IssueStatus::Accepted | IssueStatus::Modified | IssueStatus::Skipped
        )
    }
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueStatus::Pending => write!(f, "pending"),
            IssueStatus::Accepted => write!(f, "accepted"),
            IssueStatus::Modified => write!(f, "modified"),
            IssueStatus::Skipped => write!(f, "skipped"),
            IssueStatus::Flagged => write!(f, "flagged"),
        }
    }
}

/// Scope a table header applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderScope {
    Col,
    Row,
    Both,
}

/// Operator-approved remediation content. Most issue types take free text;
/// table-structure takes a structured header description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RemediationValue {
    Text(String),
    TableHeaders { headers: String, scope: HeaderScope },
}

impl RemediationValue {
    /// Reject empty values before any state change happens
    pub fn validate(&self) -> Result<(), String> {
        match self {
            RemediationValue::Text(t) if t.trim().is_empty() => {
                Err("remediation value must not be empty".to_string())
            }
            RemediationValue::TableHeaders { headers, .. } if headers.trim().is_empty() => {
                Err("table headers must not be empty".to_string())
            }
            _ => Ok(()),
        }
    }
}

/// Type-specific context captured at detection time, consumed by prompt
/// building and the rule-based fallback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum IssueDetail {
    /// Link issues carry the offending text and destination
    Link {
        current_text: String,
        url: Option<String>,
    },
    /// Form issues carry the field kind
    Field { field_kind: FieldKind },
    /// Heading issues carry the heading text
    Heading { text: String },
}

/// One detected accessibility defect instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    /// Assigned at finalization; `IssueId::UNASSIGNED` before that
    pub id: IssueId,
    #[serde(rename = "type")]
    pub kind: IssueType,
    pub severity: Severity,
    /// Page number, 1-based; 0 for document-level issues
    pub page: u32,
    pub message: String,
    /// Location on the page; absent for document-level issues
    pub bounds: Option<Rect>,
    /// Advisory WCAG criterion reference, not validated
    pub wcag_criterion: Option<String>,
    /// Type-specific detection context
    pub detail: Option<IssueDetail>,
    /// Generated remediation suggestion
    pub suggestion: Option<String>,
    /// Suggestion confidence, 0-100
    pub confidence: Option<u8>,
    /// Which capability service produced the suggestion
    pub ai_service: Option<String>,
    pub reasoning: Option<String>,
    /// True only for issues produced by the augmentor
    #[serde(default)]
    pub ai_detected: bool,
    /// Set when a suggestion request for this issue failed
    #[serde(default)]
    pub enhancement_failed: bool,
    pub status: IssueStatus,
    /// Operator-approved content, set on transition into accepted/modified
    pub final_value: Option<RemediationValue>,
}

impl Issue {
    /// Create a new pending issue. The id stays unassigned until the
    /// session store finalizes the list.
    pub fn new(kind: IssueType, severity: Severity, page: u32, message: &str) -> Self {
        Self {
            id: IssueId::UNASSIGNED,
            kind,
            severity,
            page,
            message: message.to_string(),
            bounds: None,
            wcag_criterion: None,
            detail: None,
            suggestion: None,
            confidence: None,
            ai_service: None,
            reasoning: None,
            ai_detected: false,
            enhancement_failed: false,
            status: IssueStatus::Pending,
            final_value: None,
        }
    }

    /// Set the WCAG criterion reference
    pub fn with_wcag(mut self, criterion: &str) -> Self {
        self.wcag_criterion = Some(criterion.to_string());
        self
    }

    /// Set the page-space bounds
    pub fn with_bounds(mut self, bounds: Rect) -> Self {
        self.bounds = Some(bounds);
        self
    }

    /// Attach type-specific context
    pub fn with_detail(mut self, detail: IssueDetail) -> Self {
        self.detail = Some(detail);
        self
    }

    /// Mark as produced by the augmentor
    pub fn as_ai_detected(mut self) -> Self {
        self.ai_detected = true;
        self
    }

    /// Set the suggestion confidence
    pub fn with_confidence(mut self, confidence: u8) -> Self {
        self.confidence = Some(confidence);
        self
    }
}

/// Order issues for presentation: page ascending, then severity descending.
/// Scoring does not depend on this order.
pub fn sort_for_display(issues: &mut [Issue]) {
    issues.sort_by(|a, b| {
        a.page
            .cmp(&b.page)
            .then(b.severity.ordinal().cmp(&a.severity.ordinal()))
    });
}
