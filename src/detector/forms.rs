// SPDX-License-Identifier: PMPL-1.0-or-later
//! Form checks: field labels, instructions, tab order, and scripted-behavior
//! hazards (mouse-only handlers, blur-time validation, auto-submit/timers).

use crate::document::{Annotation, AnnotationKind, FieldActions, FieldKind};
use crate::issue::{Issue, IssueDetail, IssueType, Severity};

/// Markers in a blur handler that indicate validation behavior
const VALIDATION_MARKERS: &[&str] = &["alert", "error", "invalid"];

/// Markers for auto-submission or time-limited behavior
const TIMING_MARKERS: &[&str] = &["submit", "setTimeout", "setInterval"];

pub fn check_page(annotations: &[Annotation], page: u32) -> Vec<Issue> {
    let mut issues = Vec::new();

    for annotation in annotations {
        if annotation.subtype != AnnotationKind::Widget {
            continue;
        }

        let field_kind = annotation.field_kind.unwrap_or(FieldKind::Other);
        let detail = IssueDetail::Field { field_kind };

        if annotation
            .field_name
            .as_deref()
            .map_or(true, |n| n.trim().is_empty())
        {
            issues.push(
                Issue::new(
                    IssueType::MissingFormLabel,
                    Severity::Error,
                    page,
                    "Form field missing accessible label",
                )
                .with_wcag("3.3.2")
                .with_bounds(annotation.rect)
                .with_detail(detail.clone()),
            );
        }

        if annotation.alternative_text.is_none() && field_kind.needs_instructions() {
            issues.push(
                Issue::new(
                    IssueType::MissingFormInstructions,
                    Severity::Warning,
                    page,
                    "Complex form field missing instructions",
                )
                .with_wcag("3.3.2")
                .with_bounds(annotation.rect)
                .with_detail(detail.clone()),
            );
        }

        if annotation.tab_order.map_or(true, |order| order < 0) {
            issues.push(
                Issue::new(
                    IssueType::FormTabOrder,
                    Severity::Warning,
                    page,
                    "Form field not in tab order",
                )
                .with_wcag("2.1.1")
                .with_bounds(annotation.rect)
                .with_detail(detail.clone()),
            );
        }

        if let Some(actions) = &annotation.actions {
            issues.extend(check_scripted_behavior(annotation, actions, &detail, page));
        }
    }

    issues
}

fn check_scripted_behavior(
    annotation: &Annotation,
    actions: &FieldActions,
    detail: &IssueDetail,
    page: u32,
) -> Vec<Issue> {
    let mut issues = Vec::new();

    if actions.mouse_only() {
        issues.push(
            Issue::new(
                IssueType::FormJavascriptMouseOnly,
                Severity::Error,
                page,
                "Form uses mouse-only JavaScript events",
            )
            .with_wcag("2.1.1")
            .with_bounds(annotation.rect)
            .with_detail(detail.clone()),
        );
    }

    if let Some(blur) = &actions.blur {
        if VALIDATION_MARKERS.iter().any(|m| blur.contains(m)) {
            issues.push(
                Issue::new(
                    IssueType::FormJavascriptValidation,
                    Severity::Warning,
                    page,
                    "Form validation may interfere with assistive technology",
                )
                .with_wcag("3.3.1")
                .with_bounds(annotation.rect)
                .with_detail(detail.clone()),
            );
        }
    }

    if actions
        .scripts()
        .any(|script| TIMING_MARKERS.iter().any(|m| script.contains(m)))
    {
        issues.push(
            Issue::new(
                IssueType::FormJavascriptTiming,
                Severity::Error,
                page,
                "Form has automatic submission or time limits",
            )
            .with_wcag("2.2.1")
            .with_bounds(annotation.rect)
            .with_detail(detail.clone()),
        );
    }

    issues
}
