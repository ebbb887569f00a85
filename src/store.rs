// SPDX-License-Identifier: PMPL-1.0-or-later
//! Session store: canonical issue list, remediation ledger, and statistics.
//!
//! One store instance owns the state of one analysis session. The issue
//! list is finalized exactly once per session; after that, issues are never
//! deleted, only transitioned. Every operator action appends one entry to
//! the append-only ledger; current truth lives on the issue itself, the
//! ledger is an audit trail.
//!
//! The store assumes single-actor access and is not thread-safe by
//! contract; a multi-actor deployment must wrap it in its own
//! synchronization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::issue::{
    Issue, IssueId, IssueStatus, IssueType, RemediationValue, Severity,
};

/// Operator action recorded in the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemediationAction {
    Accepted,
    Modified,
    Skipped,
    Flagged,
}

impl fmt::Display for RemediationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemediationAction::Accepted => write!(f, "accepted"),
            RemediationAction::Modified => write!(f, "modified"),
            RemediationAction::Skipped => write!(f, "skipped"),
            RemediationAction::Flagged => write!(f, "flagged"),
        }
    }
}

/// Append-only ledger entry. Never mutated or removed after creation;
/// repeated operator actions on one issue produce multiple entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemediationRecord {
    pub issue_id: IssueId,
    pub issue_type: IssueType,
    pub action: RemediationAction,
    pub value: Option<RemediationValue>,
    pub note: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Triple filter over the issue list; `None` matches everything
#[derive(Debug, Clone, Copy, Default)]
pub struct IssueFilter {
    pub kind: Option<IssueType>,
    pub status: Option<IssueStatus>,
    pub severity: Option<Severity>,
}

impl IssueFilter {
    pub fn matches(&self, issue: &Issue) -> bool {
        self.kind.map_or(true, |k| issue.kind == k)
            && self.status.map_or(true, |s| issue.status == s)
            && self.severity.map_or(true, |s| issue.severity == s)
    }
}

/// Aggregate session progress, recomputed on demand from the issue list
#[derive(Debug, Clone, Serialize)]
pub struct Statistics {
    pub total: usize,
    /// Issues with status accepted, modified, or skipped
    pub resolved: usize,
    pub pending: usize,
    pub flagged: usize,
    pub by_type: BTreeMap<IssueType, usize>,
    pub by_severity: BTreeMap<Severity, usize>,
    pub completion_percentage: f64,
}

/// Outcome of advancing the issue cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Cursor moved to the next pending issue in filtered order
    Next(IssueId),
    /// No pending issue remains anywhere: resolution is complete
    Complete,
    /// Pending issues remain, but none after the cursor in the current filter
    NoneVisible,
}

/// Canonical per-session state
#[derive(Debug)]
pub struct SessionStore {
    session_id: Uuid,
    document_name: String,
    issues: Vec<Issue>,
    remediations: Vec<RemediationRecord>,
    current: Option<IssueId>,
    filter: IssueFilter,
    finalized: bool,
}

impl SessionStore {
    pub fn new(document_name: &str) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            document_name: document_name.to_string(),
            issues: Vec::new(),
            remediations: Vec::new(),
            current: None,
            filter: IssueFilter::default(),
            finalized: false,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn document_name(&self) -> &str {
        &self.document_name
    }

    /// Finalize the issue list for this session: assign stable sequential
    /// ids and reset every status to pending. Usable exactly once.
    pub fn set_issues(&mut self, mut issues: Vec<Issue>) -> Result<()> {
        if self.finalized {
            return Err(Error::IssuesAlreadySet);
        }
        for (idx, issue) in issues.iter_mut().enumerate() {
            issue.id = IssueId(idx as u32);
            issue.status = IssueStatus::Pending;
            issue.final_value = None;
        }
        self.issues = issues;
        self.finalized = true;
        Ok(())
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// Mutable access for the suggestion enhancer, which writes suggestions
    /// back onto issues after each batch resolves
    pub fn issues_mut(&mut self) -> &mut [Issue] {
        &mut self.issues
    }

    pub fn remediations(&self) -> &[RemediationRecord] {
        &self.remediations
    }

    pub fn get_issue(&self, id: IssueId) -> Option<&Issue> {
        self.issues.iter().find(|i| i.id == id)
    }

    fn get_issue_mut(&mut self, id: IssueId) -> Result<&mut Issue> {
        self.issues
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(Error::IssueNotFound(id))
    }

    pub fn filter(&self) -> &IssueFilter {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: IssueFilter) {
        self.filter = filter;
    }

    /// Issues matching the current filter, in list order
    pub fn filtered_issues(&self) -> Vec<&Issue> {
        self.issues
            .iter()
            .filter(|i| self.filter.matches(i))
            .collect()
    }

    pub fn current_issue(&self) -> Option<IssueId> {
        self.current
    }

    pub fn set_current_issue(&mut self, id: IssueId) -> Result<()> {
        if self.get_issue(id).is_none() {
            return Err(Error::IssueNotFound(id));
        }
        self.current = Some(id);
        Ok(())
    }

    /// Append a ledger entry, stamped with the current time. Never fails.
    pub fn add_remediation(
        &mut self,
        issue_id: IssueId,
        issue_type: IssueType,
        action: RemediationAction,
        value: Option<RemediationValue>,
        note: Option<String>,
    ) {
        self.remediations.push(RemediationRecord {
            issue_id,
            issue_type,
            action,
            value,
            note,
            timestamp: Utc::now(),
        });
    }

    /// Accept the issue's generated suggestion as its remediation.
    /// Requires a non-empty suggestion to be present.
    pub fn accept(&mut self, id: IssueId) -> Result<()> {
        let issue = self.get_issue_mut(id)?;
        let suggestion = match issue.suggestion.as_deref() {
            Some(s) if !s.trim().is_empty() => s.to_string(),
            _ => return Err(Error::NoSuggestion(id)),
        };

        issue.status = IssueStatus::Accepted;
        issue.final_value = Some(RemediationValue::Text(suggestion.clone()));
        let kind = issue.kind;
        self.add_remediation(
            id,
            kind,
            RemediationAction::Accepted,
            Some(RemediationValue::Text(suggestion)),
            None,
        );
        Ok(())
    }

    /// Apply an operator-supplied remediation value. Scalar types take
    /// non-empty text; table-structure takes a structured header value.
    pub fn modify(&mut self, id: IssueId, value: RemediationValue) -> Result<()> {
        value.validate().map_err(Error::Validation)?;

        let issue = self.get_issue_mut(id)?;
        match (&value, issue.kind) {
            (RemediationValue::TableHeaders { .. }, IssueType::TableStructure) => {}
            (RemediationValue::Text(_), IssueType::TableStructure) => {
                return Err(Error::Validation(
                    "table-structure issues take a structured header value".to_string(),
                ));
            }
            (RemediationValue::TableHeaders { .. }, _) => {
                return Err(Error::Validation(
                    "only table-structure issues take a structured header value".to_string(),
                ));
            }
            (RemediationValue::Text(_), _) => {}
        }

        issue.status = IssueStatus::Modified;
        issue.final_value = Some(value.clone());
        let kind = issue.kind;
        self.add_remediation(id, kind, RemediationAction::Modified, Some(value), None);
        Ok(())
    }

    /// Defer the issue without a remediation value
    pub fn skip(&mut self, id: IssueId) -> Result<()> {
        let issue = self.get_issue_mut(id)?;
        issue.status = IssueStatus::Skipped;
        let kind = issue.kind;
        self.add_remediation(id, kind, RemediationAction::Skipped, None, None);
        Ok(())
    }

    /// Flag the issue for later review, with an optional note. Flagged
    /// issues do not count toward resolution.
    pub fn flag(&mut self, id: IssueId, note: Option<String>) -> Result<()> {
        let issue = self.get_issue_mut(id)?;
        issue.status = IssueStatus::Flagged;
        let kind = issue.kind;
        self.add_remediation(id, kind, RemediationAction::Flagged, None, note);
        Ok(())
    }

    /// Move the cursor to the next pending issue in filtered order.
    pub fn advance(&mut self) -> Advance {
        let next_id = {
            let filtered = self.filtered_issues();
            let start = self
                .current
                .and_then(|id| filtered.iter().position(|i| i.id == id))
                .map_or(0, |pos| pos + 1);
            filtered
                .iter()
                .skip(start)
                .find(|i| i.status == IssueStatus::Pending)
                .map(|i| i.id)
        };

        match next_id {
            Some(id) => {
                self.current = Some(id);
                Advance::Next(id)
            }
            None if self
                .issues
                .iter()
                .all(|i| i.status != IssueStatus::Pending) =>
            {
                Advance::Complete
            }
            None => Advance::NoneVisible,
        }
    }

    pub fn statistics(&self) -> Statistics {
        let total = self.issues.len();
        let resolved = self
            .issues
            .iter()
            .filter(|i| i.status.is_resolved())
            .count();
        let pending = self
            .issues
            .iter()
            .filter(|i| i.status == IssueStatus::Pending)
            .count();
        let flagged = self
            .issues
            .iter()
            .filter(|i| i.status == IssueStatus::Flagged)
            .count();

        let mut by_type = BTreeMap::new();
        let mut by_severity = BTreeMap::new();
        for issue in &self.issues {
            *by_type.entry(issue.kind).or_default() += 1;
            *by_severity.entry(issue.severity).or_default() += 1;
        }

        Statistics {
            total,
            resolved,
            pending,
            flagged,
            by_type,
            by_severity,
            completion_percentage: if total > 0 {
                resolved as f64 / total as f64 * 100.0
            } else {
                0.0
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_store(count: usize) -> SessionStore {
        let mut store = SessionStore::new("report");
        let issues = (0..count)
            .map(|i| {
                Issue::new(
                    IssueType::MissingAltText,
                    Severity::Error,
                    i as u32 + 1,
                    "Image missing alternative text",
                )
            })
            .collect();
        store.set_issues(issues).unwrap();
        store
    }

    fn with_suggestion(store: &mut SessionStore, id: IssueId) {
        let issue = store
            .issues_mut()
            .iter_mut()
            .find(|i| i.id == id)
            .unwrap();
        issue.suggestion = Some("Photo of the venue entrance".to_string());
    }

    #[test]
    fn test_set_issues_assigns_sequential_ids() {
        let store = seeded_store(3);
        let ids: Vec<String> = store.issues().iter().map(|i| i.id.to_string()).collect();
        assert_eq!(ids, vec!["issue-0", "issue-1", "issue-2"]);
        assert!(store
            .issues()
            .iter()
            .all(|i| i.status == IssueStatus::Pending));
    }

    #[test]
    fn test_set_issues_is_one_shot() {
        let mut store = seeded_store(1);
        assert!(matches!(
            store.set_issues(vec![]),
            Err(Error::IssuesAlreadySet)
        ));
    }

    #[test]
    fn test_accept_requires_suggestion() {
        let mut store = seeded_store(1);
        let id = IssueId(0);
        assert!(matches!(store.accept(id), Err(Error::NoSuggestion(_))));
        assert_eq!(store.get_issue(id).unwrap().status, IssueStatus::Pending);
        assert!(store.remediations().is_empty());
    }

    #[test]
    fn test_accept_with_suggestion() {
        let mut store = seeded_store(1);
        let id = IssueId(0);
        with_suggestion(&mut store, id);

        store.accept(id).unwrap();
        let issue = store.get_issue(id).unwrap();
        assert_eq!(issue.status, IssueStatus::Accepted);
        assert_eq!(
            issue.final_value,
            Some(RemediationValue::Text(
                "Photo of the venue entrance".to_string()
            ))
        );
        assert_eq!(store.remediations().len(), 1);
        assert_eq!(
            store.remediations()[0].action,
            RemediationAction::Accepted
        );
    }

    #[test]
    fn test_modify_rejects_empty_value() {
        let mut store = seeded_store(1);
        let result = store.modify(IssueId(0), RemediationValue::Text("  ".to_string()));
        assert!(matches!(result, Err(Error::Validation(_))));
        assert_eq!(
            store.get_issue(IssueId(0)).unwrap().status,
            IssueStatus::Pending
        );
        assert!(store.remediations().is_empty());
    }

    #[test]
    fn test_modify_table_structure_needs_structured_value() {
        let mut store = SessionStore::new("tables");
        store
            .set_issues(vec![Issue::new(
                IssueType::TableStructure,
                Severity::Error,
                1,
                "Table lacks proper header structure",
            )])
            .unwrap();

        let id = IssueId(0);
        assert!(store
            .modify(id, RemediationValue::Text("Name, Amount".to_string()))
            .is_err());

        store
            .modify(
                id,
                RemediationValue::TableHeaders {
                    headers: "Name, Amount, Date".to_string(),
                    scope: crate::issue::HeaderScope::Col,
                },
            )
            .unwrap();
        assert_eq!(store.get_issue(id).unwrap().status, IssueStatus::Modified);
    }

    #[test]
    fn test_structured_value_rejected_for_scalar_types() {
        let mut store = seeded_store(1);
        let result = store.modify(
            IssueId(0),
            RemediationValue::TableHeaders {
                headers: "a, b".to_string(),
                scope: crate::issue::HeaderScope::Row,
            },
        );
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn test_every_transition_appends_one_ledger_entry() {
        let mut store = seeded_store(3);
        with_suggestion(&mut store, IssueId(0));

        store.accept(IssueId(0)).unwrap();
        store.skip(IssueId(1)).unwrap();
        store.flag(IssueId(2), Some("check with author".to_string())).unwrap();
        assert_eq!(store.remediations().len(), 3);
        assert_eq!(store.remediations()[2].note.as_deref(), Some("check with author"));
    }

    #[test]
    fn test_reacting_on_terminal_issue_appends_again() {
        let mut store = seeded_store(1);
        let id = IssueId(0);
        store.skip(id).unwrap();
        store
            .modify(id, RemediationValue::Text("Chart of revenue".to_string()))
            .unwrap();

        let issue = store.get_issue(id).unwrap();
        assert_eq!(issue.status, IssueStatus::Modified);
        assert_eq!(store.remediations().len(), 2);
        assert_eq!(store.remediations()[0].action, RemediationAction::Skipped);
        assert_eq!(store.remediations()[1].action, RemediationAction::Modified);
    }

    #[test]
    fn test_statistics_resolved_counts() {
        let mut store = seeded_store(4);
        with_suggestion(&mut store, IssueId(0));
        store.accept(IssueId(0)).unwrap();
        store.skip(IssueId(1)).unwrap();
        store.flag(IssueId(2), None).unwrap();

        let stats = store.statistics();
        assert_eq!(stats.total, 4);
        assert_eq!(stats.resolved, 2);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.flagged, 1);
        assert_eq!(stats.completion_percentage, 50.0);
        assert_eq!(stats.by_type[&IssueType::MissingAltText], 4);
        assert_eq!(stats.by_severity[&Severity::Error], 4);
    }

    #[test]
    fn test_statistics_empty_store() {
        let store = SessionStore::new("empty");
        let stats = store.statistics();
        assert_eq!(stats.total, 0);
        assert_eq!(stats.completion_percentage, 0.0);
    }

    #[test]
    fn test_skip_all_signals_completion() {
        let mut store = seeded_store(30);
        for idx in 0..30 {
            store.skip(IssueId(idx)).unwrap();
        }
        let stats = store.statistics();
        assert_eq!(stats.resolved, 30);
        assert_eq!(stats.pending, 0);
        assert_eq!(stats.completion_percentage, 100.0);
        assert_eq!(store.advance(), Advance::Complete);
    }

    #[test]
    fn test_advance_skips_terminal_issues() {
        let mut store = seeded_store(3);
        store.set_current_issue(IssueId(0)).unwrap();
        store.skip(IssueId(1)).unwrap();
        assert_eq!(store.advance(), Advance::Next(IssueId(2)));
        assert_eq!(store.current_issue(), Some(IssueId(2)));
    }

    #[test]
    fn test_advance_respects_filter() {
        let mut store = SessionStore::new("mixed");
        store
            .set_issues(vec![
                Issue::new(IssueType::MissingAltText, Severity::Error, 1, "a"),
                Issue::new(IssueType::GenericLinkText, Severity::Warning, 1, "b"),
                Issue::new(IssueType::MissingAltText, Severity::Error, 2, "c"),
            ])
            .unwrap();

        store.set_filter(IssueFilter {
            kind: Some(IssueType::MissingAltText),
            ..IssueFilter::default()
        });

        assert_eq!(store.advance(), Advance::Next(IssueId(0)));
        assert_eq!(store.advance(), Advance::Next(IssueId(2)));
        // the link issue is still pending but filtered out of view
        assert_eq!(store.advance(), Advance::NoneVisible);
    }

    #[test]
    fn test_filtered_issues_triple_filter() {
        let mut store = SessionStore::new("mixed");
        store
            .set_issues(vec![
                Issue::new(IssueType::MissingAltText, Severity::Error, 1, "a"),
                Issue::new(IssueType::GenericLinkText, Severity::Warning, 1, "b"),
            ])
            .unwrap();
        store.skip(IssueId(0)).unwrap();

        assert_eq!(store.filtered_issues().len(), 2);

        store.set_filter(IssueFilter {
            status: Some(IssueStatus::Pending),
            ..IssueFilter::default()
        });
        assert_eq!(store.filtered_issues().len(), 1);

        store.set_filter(IssueFilter {
            severity: Some(Severity::Warning),
            kind: Some(IssueType::GenericLinkText),
            status: Some(IssueStatus::Pending),
        });
        assert_eq!(store.filtered_issues().len(), 1);
    }

    #[test]
    fn test_unknown_issue_rejected() {
        let mut store = seeded_store(1);
        assert!(matches!(
            store.set_current_issue(IssueId(99)),
            Err(Error::IssueNotFound(_))
        ));
        assert!(matches!(store.skip(IssueId(99)), Err(Error::IssueNotFound(_))));
    }
}
