// SPDX-License-Identifier: PMPL-1.0-or-later
//! Structural checks: tagged content, heading hierarchy, table structure.
//!
//! Headings are inferred from glyph size, not from document tags: runs larger
//! than the body-text threshold become heading candidates, merged per visual
//! line, with the level derived from fixed size thresholds. Table detection
//! looks for repeated column x-patterns across adjacent rows; header content
//! is never verified, so every detected table reports a structure issue.

use crate::document::{DrawOp, TextRun};
use crate::geometry::Rect;
use crate::issue::{Issue, IssueDetail, IssueType, Severity};

/// Runs above this glyph size are heading candidates
const HEADING_CANDIDATE_SIZE: f32 = 14.0;

/// Runs within this vertical distance belong to the same heading line
const SAME_LINE_TOLERANCE: f32 = 5.0;

/// Column x-positions within this distance count as the same column
const COLUMN_TOLERANCE: i64 = 10;

pub fn check_page(runs: &[TextRun], operations: &[DrawOp], page: u32) -> Vec<Issue> {
    let mut issues = Vec::new();

    if !operations
        .iter()
        .any(|op| matches!(op, DrawOp::BeginMarkedContent))
    {
        issues.push(
            Issue::new(
                IssueType::UntaggedContent,
                Severity::Error,
                page,
                "Page contains untagged content",
            )
            .with_wcag("1.3.1"),
        );
    }

    issues.extend(check_heading_hierarchy(&extract_headings(runs), page));

    for table in detect_tables(runs) {
        // Header presence is never content-verified; every structurally
        // detected table is reported.
        if !table.has_headers {
            let mut issue = Issue::new(
                IssueType::TableStructure,
                Severity::Error,
                page,
                "Table lacks proper header structure",
            )
            .with_wcag("1.3.1");
            if let Some(bounds) = table.bounds {
                issue = issue.with_bounds(bounds);
            }
            issues.push(issue);
        }
    }

    issues
}

/// A glyph-size-inferred heading
#[derive(Debug, Clone, PartialEq)]
struct Heading {
    text: String,
    level: u8,
    y: f32,
}

/// Heading level from glyph size
fn level_for_size(font_size: f32) -> u8 {
    if font_size > 24.0 {
        1
    } else if font_size > 20.0 {
        2
    } else if font_size > 16.0 {
        3
    } else {
        4
    }
}

/// Collect heading candidates, merging runs that share a visual line
fn extract_headings(runs: &[TextRun]) -> Vec<Heading> {
    let mut headings = Vec::new();
    let mut current: Option<Heading> = None;

    for run in runs {
        if run.font_size > HEADING_CANDIDATE_SIZE {
            match current.as_mut() {
                Some(heading) if (heading.y - run.y).abs() < SAME_LINE_TOLERANCE => {
                    heading.text.push(' ');
                    heading.text.push_str(&run.text);
                }
                _ => {
                    if let Some(done) = current.take() {
                        headings.push(done);
                    }
                    current = Some(Heading {
                        text: run.text.clone(),
                        level: level_for_size(run.font_size),
                        y: run.y,
                    });
                }
            }
        } else if let Some(done) = current.take() {
            headings.push(done);
        }
    }

    if let Some(done) = current {
        headings.push(done);
    }

    headings
}

/// Flag any heading level skip (new level more than one deeper than the last)
fn check_heading_hierarchy(headings: &[Heading], page: u32) -> Vec<Issue> {
    let mut issues = Vec::new();
    let mut last_level = 0u8;

    for heading in headings {
        if heading.level > last_level + 1 {
            issues.push(
                Issue::new(
                    IssueType::HeadingHierarchy,
                    Severity::Warning,
                    page,
                    &format!(
                        "Heading level skipped from H{} to H{}",
                        last_level, heading.level
                    ),
                )
                .with_wcag("1.3.1")
                .with_detail(IssueDetail::Heading {
                    text: heading.text.clone(),
                }),
            );
        }
        last_level = heading.level;
    }

    issues
}

#[derive(Debug)]
struct DetectedTable {
    bounds: Option<Rect>,
    has_headers: bool,
}

/// Detect table-like row groups from aligned column patterns.
///
/// Rows are runs grouped by rounded y position, walked top-down. Rows with
/// at least two runs whose rounded x positions match the group's column
/// pattern accumulate; a non-matching multi-run row closes a group of two
/// or more rows as one table. A group still open at the end of the page is
/// not emitted.
fn detect_tables(runs: &[TextRun]) -> Vec<DetectedTable> {
    let mut rows: Vec<(i64, Vec<&TextRun>)> = Vec::new();
    for run in runs {
        let y = run.y.round() as i64;
        match rows.iter_mut().find(|(row_y, _)| *row_y == y) {
            Some((_, row)) => row.push(run),
            None => rows.push((y, vec![run])),
        }
    }
    rows.sort_by(|a, b| b.0.cmp(&a.0));

    let mut tables = Vec::new();
    let mut group: Vec<&TextRun> = Vec::new();
    let mut group_rows = 0usize;
    let mut pattern: Option<Vec<i64>> = None;

    for (_, row) in &rows {
        if row.len() < 2 {
            continue;
        }

        let mut columns: Vec<i64> = row.iter().map(|r| r.x.round() as i64).collect();
        columns.sort_unstable();

        let matches = match &pattern {
            None => true,
            Some(p) => {
                p.len() == columns.len()
                    && p.iter()
                        .zip(&columns)
                        .all(|(a, b)| (a - b).abs() < COLUMN_TOLERANCE)
            }
        };

        if matches {
            if pattern.is_none() {
                pattern = Some(columns);
            }
            group.extend(row.iter().copied());
            group_rows += 1;
        } else if group_rows >= 2 {
            tables.push(DetectedTable {
                bounds: Rect::enclosing(group.iter().map(|r| r.bounds())),
                has_headers: false,
            });
            group.clear();
            group_rows = 0;
            pattern = None;
        }
    }

    tables
}
