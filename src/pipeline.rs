// SPDX-License-Identifier: PMPL-1.0-or-later
//! Analysis pipeline: detection, augmentation, scoring.
//!
//! One pass over a document snapshot produces the issue list and its score.
//! The caller hands the issues to a `SessionStore` and runs the suggestion
//! enhancer afterwards; this module has no retained state.

use serde::Serialize;
use tracing::info;

use crate::augmentor;
use crate::capability::Capability;
use crate::config::Config;
use crate::detector;
use crate::document::Document;
use crate::error::{Error, Result};
use crate::issue::Issue;
use crate::scorer::{self, Score};

/// Result of one analysis pass
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutcome {
    pub issues: Vec<Issue>,
    pub score: Score,
}

/// Analyze a document: rule-based detection, best-effort capability
/// augmentation, then scoring.
///
/// The only fatal failures are oversized input and unreadable document
/// metadata; per-page and capability failures degrade without aborting.
pub async fn run_analysis(
    document: &dyn Document,
    capability: Option<&dyn Capability>,
    config: &Config,
) -> Result<AnalysisOutcome> {
    let pages = document.page_count();
    if pages > config.limits.max_pages {
        return Err(Error::DocumentLimit(format!(
            "document has {} pages, limit is {}",
            pages, config.limits.max_pages
        )));
    }

    info!(document = document.name(), pages, "Starting analysis");

    let mut issues = detector::detect(document).await?;
    info!(found = issues.len(), "Rule-based detection complete");

    if let Some(capability) = capability {
        issues = augmentor::augment(document, issues, capability, &config.ai).await;
    }

    let score = scorer::score(&issues, pages);
    info!(overall = score.overall, grade = %score.grade, "Analysis complete");

    Ok(AnalysisOutcome { issues, score })
}
