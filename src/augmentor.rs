// SPDX-License-Identifier: PMPL-1.0-or-later
//! Capability-driven detection on top of the rule catalogue.
//!
//! A bounded sample of pages is rendered and handed to the generative
//! capability; reported candidates are merged into the rule-based issue
//! list, dropping any candidate that geometrically duplicates an existing
//! issue of the same type on the same page. The whole pass is best-effort:
//! a capability failure abandons the remaining pages and never surfaces to
//! the caller.

use tracing::{debug, warn};

use crate::capability::{Capability, DetectedIssue};
use crate::config::AiConfig;
use crate::document::Document;
use crate::issue::{Issue, IssueType, Severity};

/// Severity assumed for candidates that do not state one
const DEFAULT_SEVERITY: Severity = Severity::Warning;

/// WCAG criterion assumed for candidates that do not state one
const DEFAULT_WCAG: &str = "1.3.1";

/// Confidence assumed for candidates that do not state one
const DEFAULT_CONFIDENCE: u8 = 75;

/// Run the augmentation pass and return the merged issue list.
///
/// Surviving candidates are appended after the rule-based issues, not
/// inserted in page order.
pub async fn augment(
    document: &dyn Document,
    mut issues: Vec<Issue>,
    capability: &dyn Capability,
    config: &AiConfig,
) -> Vec<Issue> {
    let pages = sample_pages(document.page_count(), config.sample_pages);
    debug!(pages = ?pages, "Sampling pages for capability analysis");

    let mut candidates: Vec<Issue> = Vec::new();
    for page_num in pages {
        match analyze_page(document, capability, config, page_num).await {
            Ok(found) => candidates.extend(found),
            Err(e) => {
                warn!(page = page_num, error = %e, "Augmentation pass abandoned");
                break;
            }
        }
    }

    let mut appended = 0usize;
    for candidate in candidates {
        if !is_duplicate(&issues, &candidate) {
            issues.push(candidate);
            appended += 1;
        }
    }
    debug!(appended, "Augmentation merge complete");

    issues
}

/// Pick at most `max` pages: all of them for small documents, otherwise the
/// first page, the last page, and pages at a quarter-length stride.
fn sample_pages(page_count: u32, max: usize) -> Vec<u32> {
    if page_count == 0 || max == 0 {
        return Vec::new();
    }
    if page_count as usize <= max {
        return (1..=page_count).collect();
    }

    let mut pages = vec![1, page_count];
    let step = page_count / 4;
    let mut i = step;
    while i < page_count {
        if !pages.contains(&i) {
            pages.push(i);
        }
        i += step;
    }

    pages.truncate(max);
    pages.sort_unstable();
    pages
}

async fn analyze_page(
    document: &dyn Document,
    capability: &dyn Capability,
    config: &AiConfig,
    page_num: u32,
) -> crate::error::Result<Vec<Issue>> {
    let page = document.page(page_num).await?;
    let image = page.render_to_image(config.render_scale).await?;
    let text = page
        .text_runs()
        .await?
        .iter()
        .map(|run| run.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    let detected = capability.analyze_page(&image, &text, page_num).await?;
    Ok(detected
        .into_iter()
        .map(|candidate| convert_candidate(candidate, page_num))
        .collect())
}

fn convert_candidate(candidate: DetectedIssue, page: u32) -> Issue {
    let kind = candidate
        .kind
        .as_deref()
        .map(IssueType::parse_lenient)
        .unwrap_or(IssueType::AiDetectedIssue);
    let severity = match candidate.severity.as_deref() {
        Some("error") => Severity::Error,
        Some("info") => Severity::Info,
        _ => DEFAULT_SEVERITY,
    };

    let mut issue = Issue::new(kind, severity, page, &candidate.description)
        .with_wcag(candidate.wcag_criterion.as_deref().unwrap_or(DEFAULT_WCAG))
        .with_confidence(candidate.confidence.unwrap_or(DEFAULT_CONFIDENCE))
        .as_ai_detected();
    issue.suggestion = candidate.recommendation;
    if let Some(bounds) = candidate.location {
        issue = issue.with_bounds(bounds);
    }
    issue
}

/// A candidate duplicates an existing issue when both sit on the same page,
/// share a type, and their bounds overlap. Either side lacking bounds means
/// the pair can never be a duplicate.
fn is_duplicate(existing: &[Issue], candidate: &Issue) -> bool {
    existing.iter().any(|issue| {
        issue.page == candidate.page
            && issue.kind == candidate.kind
            && match (&issue.bounds, &candidate.bounds) {
                (Some(a), Some(b)) => a.overlaps(b),
                _ => false,
            }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;

    fn issue_with_bounds(kind: IssueType, page: u32, bounds: Option<Rect>) -> Issue {
        let mut issue = Issue::new(kind, Severity::Error, page, "existing");
        issue.bounds = bounds;
        issue
    }

    #[test]
    fn test_sample_all_pages_when_small() {
        assert_eq!(sample_pages(3, 5), vec![1, 2, 3]);
        assert_eq!(sample_pages(5, 5), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_sample_strided_when_large() {
        assert_eq!(sample_pages(20, 5), vec![1, 5, 10, 15, 20]);
        assert_eq!(sample_pages(6, 5), vec![1, 2, 3, 4, 6]);
    }

    #[test]
    fn test_sample_empty_document() {
        assert!(sample_pages(0, 5).is_empty());
    }

    #[test]
    fn test_overlapping_same_type_is_duplicate() {
        let existing = vec![issue_with_bounds(
            IssueType::MissingAltText,
            2,
            Some(Rect::new(10.0, 10.0, 50.0, 50.0)),
        )];
        let candidate = issue_with_bounds(
            IssueType::MissingAltText,
            2,
            Some(Rect::new(30.0, 30.0, 50.0, 50.0)),
        );
        assert!(is_duplicate(&existing, &candidate));
    }

    #[test]
    fn test_disjoint_bounds_not_duplicate() {
        let existing = vec![issue_with_bounds(
            IssueType::MissingAltText,
            2,
            Some(Rect::new(10.0, 10.0, 20.0, 20.0)),
        )];
        let candidate = issue_with_bounds(
            IssueType::MissingAltText,
            2,
            Some(Rect::new(200.0, 200.0, 20.0, 20.0)),
        );
        assert!(!is_duplicate(&existing, &candidate));
    }

    #[test]
    fn test_missing_bounds_never_duplicate() {
        let existing = vec![issue_with_bounds(IssueType::MissingAltText, 2, None)];
        let candidate = issue_with_bounds(
            IssueType::MissingAltText,
            2,
            Some(Rect::new(10.0, 10.0, 20.0, 20.0)),
        );
        assert!(!is_duplicate(&existing, &candidate));

        let candidate_unbounded = issue_with_bounds(IssueType::MissingAltText, 2, None);
        assert!(!is_duplicate(&existing, &candidate_unbounded));
    }

    #[test]
    fn test_different_page_or_type_not_duplicate() {
        let bounds = Some(Rect::new(10.0, 10.0, 50.0, 50.0));
        let existing = vec![issue_with_bounds(IssueType::MissingAltText, 2, bounds)];

        let other_page = issue_with_bounds(IssueType::MissingAltText, 3, bounds);
        assert!(!is_duplicate(&existing, &other_page));

        let other_type = issue_with_bounds(IssueType::TableStructure, 2, bounds);
        assert!(!is_duplicate(&existing, &other_type));
    }

    #[test]
    fn test_convert_candidate_defaults() {
        let issue = convert_candidate(
            DetectedIssue {
                kind: None,
                severity: None,
                description: "Dense paragraph is hard to scan".to_string(),
                location: None,
                wcag_criterion: None,
                confidence: None,
                recommendation: Some("Break into shorter paragraphs".to_string()),
            },
            4,
        );
        assert_eq!(issue.kind, IssueType::AiDetectedIssue);
        assert_eq!(issue.severity, Severity::Warning);
        assert_eq!(issue.page, 4);
        assert!(issue.ai_detected);
        assert_eq!(issue.confidence, Some(75));
        assert_eq!(issue.wcag_criterion.as_deref(), Some("1.3.1"));
        assert_eq!(
            issue.suggestion.as_deref(),
            Some("Break into shorter paragraphs")
        );
    }

    #[test]
    fn test_convert_candidate_known_type() {
        let issue = convert_candidate(
            DetectedIssue {
                kind: Some("missing-alt-text".to_string()),
                severity: Some("error".to_string()),
                description: "Logo has no alt text".to_string(),
                location: Some(Rect::new(5.0, 5.0, 40.0, 40.0)),
                wcag_criterion: Some("1.1.1".to_string()),
                confidence: Some(92),
                recommendation: None,
            },
            1,
        );
        assert_eq!(issue.kind, IssueType::MissingAltText);
        assert_eq!(issue.severity, Severity::Error);
        assert_eq!(issue.confidence, Some(92));
        assert!(issue.bounds.is_some());
    }
}
