// SPDX-License-Identifier: PMPL-1.0-or-later
//! Weighted compliance scoring.
//!
//! Deductions are grouped by (type, severity) so one pervasive defect cannot
//! dominate the grade: each group's impact is capped at five occurrences.
//! Larger documents divide their total deduction by a size-leniency factor,
//! capped at 2x. Category scores run the same computation restricted to the
//! types mapped into each category; unmapped types count toward the overall
//! score only.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

use crate::issue::{Category, Issue, IssueType, Severity};

/// Occurrences per (type, severity) group that count toward the deduction
const GROUP_CAP: usize = 5;

/// Deduction multiplier for critical issue types
const CRITICAL_MULTIPLIER: f64 = 1.5;

/// Letter grade for an overall score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn from_score(score: u8) -> Grade {
        if score >= 90 {
            Grade::A
        } else if score >= 80 {
            Grade::B
        } else if score >= 70 {
            Grade::C
        } else if score >= 60 {
            Grade::D
        } else {
            Grade::F
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Grade::A => write!(f, "A"),
            Grade::B => write!(f, "B"),
            Grade::C => write!(f, "C"),
            Grade::D => write!(f, "D"),
            Grade::F => write!(f, "F"),
        }
    }
}

/// Per-category score breakdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryScores {
    pub structural: u8,
    pub content: u8,
    pub forms: u8,
}

/// Overall compliance score, derived from an issue list and never stored
/// independently of it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Score {
    pub overall: u8,
    pub grade: Grade,
    pub category_scores: CategoryScores,
}

/// Deduction weight for one issue occurrence
pub fn weight(kind: IssueType, severity: Severity) -> f64 {
    let base = severity.base_weight();
    if kind.is_critical() {
        base * CRITICAL_MULTIPLIER
    } else {
        base
    }
}

/// Score an issue list. Pure and order-independent: the same issues in any
/// order produce the same score.
pub fn score(issues: &[Issue], page_count: u32) -> Score {
    let overall = score_subset(issues.iter(), page_count);
    let category = |cat: Category| {
        score_subset(
            issues.iter().filter(move |i| i.kind.category() == cat),
            page_count,
        )
    };

    Score {
        overall,
        grade: Grade::from_score(overall),
        category_scores: CategoryScores {
            structural: category(Category::Structural),
            content: category(Category::Content),
            forms: category(Category::Forms),
        },
    }
}

fn score_subset<'a, I: Iterator<Item = &'a Issue>>(issues: I, page_count: u32) -> u8 {
    let mut groups: HashMap<(IssueType, Severity), usize> = HashMap::new();
    for issue in issues {
        *groups.entry((issue.kind, issue.severity)).or_default() += 1;
    }

    let mut deductions: f64 = groups
        .iter()
        .map(|(&(kind, severity), &count)| weight(kind, severity) * count.min(GROUP_CAP) as f64)
        .sum();

    let leniency = (page_count as f64 / 10.0).min(2.0);
    if leniency > 0.0 {
        deductions /= leniency;
    }

    (100.0 - deductions).round().clamp(0.0, 100.0) as u8
}
