// SPDX-License-Identifier: PMPL-1.0-or-later
//! Rule-based issue detection.
//!
//! Each sub-module covers one group of checks: structural (tagged content,
//! headings, tables), content (images, links), and forms (labels, tab order,
//! scripted-behavior hazards). Detection degrades per page: a page that
//! cannot be read contributes no issues and the pass continues.

pub mod content;
pub mod forms;
pub mod structural;

use tracing::{debug, warn};

use crate::document::{Document, DocumentMetadata};
use crate::error::{Error, Result};
use crate::issue::{Issue, IssueType, Severity};

/// Run the full rule catalogue over a document.
///
/// Output order is unspecified; consumers impose presentation order. The
/// only fatal failure is unreadable document metadata.
pub async fn detect(document: &dyn Document) -> Result<Vec<Issue>> {
    let metadata = document
        .metadata()
        .await
        .map_err(|e| Error::UnreadableDocument(e.to_string()))?;

    let mut issues = document_checks(&metadata);

    for page_num in 1..=document.page_count() {
        match detect_page(document, page_num).await {
            Ok(page_issues) => {
                debug!(page = page_num, found = page_issues.len(), "Page analyzed");
                issues.extend(page_issues);
            }
            Err(e) => {
                warn!(page = page_num, error = %e, "Page skipped during detection");
            }
        }
    }

    Ok(issues)
}

/// Document-level checks: title and language metadata
fn document_checks(metadata: &DocumentMetadata) -> Vec<Issue> {
    let mut issues = Vec::new();

    let title_missing = metadata
        .title
        .as_deref()
        .map_or(true, |t| t.trim().is_empty());
    if title_missing {
        issues.push(
            Issue::new(
                IssueType::MissingDocumentTitle,
                Severity::Error,
                0,
                "Document lacks a descriptive title",
            )
            .with_wcag("2.4.2"),
        );
    }

    let language_missing = metadata
        .language
        .as_deref()
        .map_or(true, |l| l.trim().is_empty());
    if language_missing {
        issues.push(
            Issue::new(
                IssueType::MissingLanguage,
                Severity::Error,
                0,
                "Document language is not specified",
            )
            .with_wcag("3.1.1"),
        );
    }

    issues
}

async fn detect_page(document: &dyn Document, page_num: u32) -> Result<Vec<Issue>> {
    let page = document.page(page_num).await?;
    let runs = page.text_runs().await?;
    let annotations = page.annotations().await?;
    let operations = page.operations().await?;

    let mut issues = Vec::new();
    issues.extend(structural::check_page(&runs, &operations, page_num));
    issues.extend(content::check_page(&runs, &annotations, &operations, page_num));
    issues.extend(forms::check_page(&annotations, page_num));
    Ok(issues)
}
