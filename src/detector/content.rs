// SPDX-License-Identifier: PMPL-1.0-or-later
//! Content checks: image alternative text and link-text quality.
//!
//! A link has no text of its own; its text is derived as the union of all
//! text runs whose bounding boxes overlap the link rectangle.

use crate::document::{Annotation, AnnotationKind, DrawOp, TextRun};
use crate::issue::{Issue, IssueDetail, IssueType, Severity};

/// Phrases that carry no destination information on their own
const GENERIC_PHRASES: &[&str] = &[
    "click here", "here", "read more", "more", "link", "download", "click", "go", "visit", "see",
];

pub fn check_page(
    runs: &[TextRun],
    annotations: &[Annotation],
    operations: &[DrawOp],
    page: u32,
) -> Vec<Issue> {
    let mut issues = Vec::new();

    for op in operations {
        if let DrawOp::PaintImage { bounds, alt_text } = op {
            if alt_text.as_deref().map_or(true, |t| t.trim().is_empty()) {
                issues.push(
                    Issue::new(
                        IssueType::MissingAltText,
                        Severity::Error,
                        page,
                        "Image missing alternative text",
                    )
                    .with_wcag("1.1.1")
                    .with_bounds(*bounds),
                );
            }
        }
    }

    for annotation in annotations {
        if annotation.subtype != AnnotationKind::Link {
            continue;
        }

        let link_text = link_text(annotation, runs);
        if is_generic_link_text(&link_text) {
            issues.push(
                Issue::new(
                    IssueType::GenericLinkText,
                    Severity::Warning,
                    page,
                    &format!("Link text \"{}\" is not descriptive", link_text),
                )
                .with_wcag("2.4.4")
                .with_bounds(annotation.rect)
                .with_detail(IssueDetail::Link {
                    current_text: link_text,
                    url: annotation.url.clone(),
                }),
            );
        }
    }

    issues
}

/// Union of all run text overlapping the link rectangle, in run order
fn link_text(annotation: &Annotation, runs: &[TextRun]) -> String {
    runs.iter()
        .filter(|run| run.bounds().overlaps(&annotation.rect))
        .map(|run| run.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_generic_link_text(text: &str) -> bool {
    GENERIC_PHRASES.contains(&text.trim().to_lowercase().as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;

    fn link(rect: Rect, url: Option<&str>) -> Annotation {
        Annotation {
            subtype: AnnotationKind::Link,
            rect,
            field_name: None,
            field_kind: None,
            alternative_text: None,
            tab_order: None,
            actions: None,
            url: url.map(String::from),
        }
    }

    fn run_at(text: &str, x: f32, y: f32) -> TextRun {
        TextRun {
            text: text.to_string(),
            x,
            y,
            width: 40.0,
            height: 12.0,
            font_size: 12.0,
        }
    }

    #[test]
    fn test_image_without_alt_text() {
        let ops = vec![DrawOp::PaintImage {
            bounds: Rect::new(10.0, 10.0, 100.0, 80.0),
            alt_text: None,
        }];
        let issues = check_page(&[], &[], &ops, 3);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueType::MissingAltText);
        assert_eq!(issues[0].page, 3);
        assert!(issues[0].bounds.is_some());
    }

    #[test]
    fn test_image_with_alt_text_passes() {
        let ops = vec![DrawOp::PaintImage {
            bounds: Rect::new(10.0, 10.0, 100.0, 80.0),
            alt_text: Some("Org chart of the finance team".to_string()),
        }];
        assert!(check_page(&[], &[], &ops, 1).is_empty());
    }

    #[test]
    fn test_generic_link_text_flagged() {
        let runs = vec![run_at("click", 50.0, 400.0), run_at("here", 92.0, 400.0)];
        let annotations = vec![link(
            Rect::new(48.0, 398.0, 90.0, 14.0),
            Some("https://example.com/report"),
        )];
        let issues = check_page(&runs, &annotations, &[], 2);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueType::GenericLinkText);
        match &issues[0].detail {
            Some(IssueDetail::Link { current_text, url }) => {
                assert_eq!(current_text, "click here");
                assert_eq!(url.as_deref(), Some("https://example.com/report"));
            }
            other => panic!("unexpected detail: {:?}", other),
        }
    }

    #[test]
    fn test_descriptive_link_text_passes() {
        let runs = vec![run_at("2025 annual report", 50.0, 400.0)];
        let annotations = vec![link(Rect::new(48.0, 398.0, 90.0, 14.0), None)];
        assert!(check_page(&runs, &annotations, &[], 2).is_empty());
    }

    #[test]
    fn test_runs_outside_link_rect_ignored() {
        let runs = vec![run_at("here", 400.0, 50.0)];
        let annotations = vec![link(Rect::new(48.0, 398.0, 90.0, 14.0), None)];
        // No overlapping runs: link text is empty, which is not generic
        assert!(check_page(&runs, &annotations, &[], 2).is_empty());
    }
}
