// SPDX-License-Identifier: PMPL-1.0-or-later
//! Batched suggestion enhancement.
//!
//! Issues whose type benefits from a generated remediation are processed in
//! fixed-size batches: batches run sequentially, the requests inside one
//! batch fan out concurrently, and each unit's outcome is merged back only
//! after the whole batch resolves. One failing request marks its issue and
//! never disturbs the rest of the batch. With no capability configured the
//! enhancer skips the network entirely and applies deterministic rule-based
//! suggestions.

use futures::future::join_all;
use tracing::{info, warn};

use crate::capability::Capability;
use crate::config::AiConfig;
use crate::error::Result;
use crate::issue::{Issue, IssueDetail, IssueType};

/// Parsed outcome of one suggestion request
#[derive(Debug, Clone, PartialEq)]
struct Enhancement {
    suggestion: String,
    confidence: u8,
    reasoning: String,
}

/// Enhance every eligible issue in place.
pub async fn enhance(issues: &mut [Issue], capability: Option<&dyn Capability>, config: &AiConfig) {
    let eligible: Vec<usize> = issues
        .iter()
        .enumerate()
        .filter(|(_, issue)| issue.kind.enhancement_eligible())
        .map(|(idx, _)| idx)
        .collect();

    if eligible.is_empty() {
        return;
    }

    let Some(capability) = capability else {
        info!(
            count = eligible.len(),
            "No capability configured, applying rule-based suggestions"
        );
        for idx in eligible {
            let fallback = fallback_suggestion(&issues[idx]);
            apply(&mut issues[idx], fallback, None);
        }
        return;
    };

    info!(count = eligible.len(), "Generating suggestions");

    for chunk in eligible.chunks(config.batch_size.max(1)) {
        let results = {
            let snapshot: &[Issue] = issues;
            let requests = chunk
                .iter()
                .map(|&idx| request_suggestion(&snapshot[idx], capability, config));
            join_all(requests).await
        };

        for (&idx, result) in chunk.iter().zip(results) {
            match result {
                Ok(enhancement) => {
                    let service = capability.service_name().to_string();
                    apply(&mut issues[idx], enhancement, Some(service));
                }
                Err(e) => {
                    warn!(issue = %issues[idx].id, error = %e, "Suggestion request failed");
                    issues[idx].enhancement_failed = true;
                }
            }
        }
    }
}

fn apply(issue: &mut Issue, enhancement: Enhancement, service: Option<String>) {
    issue.suggestion = Some(enhancement.suggestion);
    issue.confidence = Some(enhancement.confidence);
    issue.reasoning = Some(enhancement.reasoning);
    issue.ai_service = service;
}

async fn request_suggestion(
    issue: &Issue,
    capability: &dyn Capability,
    config: &AiConfig,
) -> Result<Enhancement> {
    let prompt = build_prompt(issue);
    let response = capability.request(&prompt, None).await?;
    Ok(parse_response(&response, config.default_confidence))
}

/// Type-specific prompt, with a generic WCAG-remediation fallback
fn build_prompt(issue: &Issue) -> String {
    match issue.kind {
        IssueType::MissingAltText => "Provide a concise, descriptive alternative text for an \
            image in a document. The alt text should convey the essential information or \
            function of the image. Context: General document. Keep it under 125 characters."
            .to_string(),
        IssueType::GenericLinkText => {
            let (current, url) = match &issue.detail {
                Some(IssueDetail::Link { current_text, url }) => {
                    (current_text.as_str(), url.as_deref())
                }
                _ => ("", None),
            };
            format!(
                "The link text \"{}\" is not descriptive. The link points to: {}. Provide \
                 better link text that describes the destination or purpose. Keep it concise \
                 and meaningful.",
                current,
                url.unwrap_or("unknown destination")
            )
        }
        IssueType::TableStructure => "A table lacks proper header structure. Suggest \
            appropriate column headers that would make the table accessible. Context: Data \
            table in document."
            .to_string(),
        IssueType::MissingFormLabel => {
            let field = match &issue.detail {
                Some(IssueDetail::Field { field_kind }) => field_kind.label(),
                _ => "form field",
            };
            format!(
                "A {} lacks an accessible label. Provide a clear, descriptive label that \
                 explains the field's purpose.",
                field
            )
        }
        IssueType::HeadingHierarchy => {
            let heading = match &issue.detail {
                Some(IssueDetail::Heading { text }) => text.as_str(),
                _ => "",
            };
            format!(
                "Heading hierarchy issue: {}. Current heading: \"{}\". Suggest how to fix \
                 this issue.",
                issue.message, heading
            )
        }
        _ => format!(
            "Accessibility issue: {}. Provide a specific suggestion to fix this issue \
             according to WCAG guidelines.",
            issue.message
        ),
    }
}

/// Extract {suggestion, confidence, reasoning} from a free-text response.
/// Lines prefixed `suggestion:` / `confidence:` / `reasoning:` override the
/// defaults; otherwise the whole response is the suggestion.
fn parse_response(response: &str, default_confidence: u8) -> Enhancement {
    let mut suggestion = response.to_string();
    let mut confidence = default_confidence;
    let mut reasoning = String::new();

    for line in response.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(rest) = strip_prefix_ci(line, "suggestion:") {
            suggestion = rest.trim().to_string();
        } else if let Some(rest) = strip_prefix_ci(line, "confidence:") {
            if let Some(parsed) = parse_leading_int(rest) {
                confidence = parsed;
            }
        } else if let Some(rest) = strip_prefix_ci(line, "reasoning:") {
            reasoning = rest.trim().to_string();
        }
    }

    Enhancement {
        suggestion: clean_suggestion(&suggestion),
        confidence,
        reasoning,
    }
}

/// Case-insensitive ASCII prefix strip
fn strip_prefix_ci<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    let head = line.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&line[prefix.len()..])
    } else {
        None
    }
}

/// Leading integer of a string, ignoring trailing text like `%`
fn parse_leading_int(s: &str) -> Option<u8> {
    let digits: String = s.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// Strip wrapping quotes and collapse internal whitespace
fn clean_suggestion(raw: &str) -> String {
    let trimmed = raw
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_string();
    trimmed.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Deterministic suggestion applied when no capability is configured.
/// Confidences are fixed and low-to-moderate, reflecting non-AI provenance.
fn fallback_suggestion(issue: &Issue) -> Enhancement {
    match issue.kind {
        IssueType::MissingAltText => Enhancement {
            suggestion: "Descriptive image of [describe main subject and purpose]".to_string(),
            confidence: 50,
            reasoning: "Generic template - AI enhancement unavailable".to_string(),
        },
        IssueType::GenericLinkText => {
            let url = match &issue.detail {
                Some(IssueDetail::Link { url, .. }) => url.as_deref(),
                _ => None,
            };
            Enhancement {
                suggestion: match url.and_then(host_of) {
                    Some(host) => format!("Visit {}", host),
                    None => "Learn more about [topic]".to_string(),
                },
                confidence: 60,
                reasoning: "Based on URL structure".to_string(),
            }
        }
        IssueType::MissingFormLabel => Enhancement {
            suggestion: "Enter your [field purpose]".to_string(),
            confidence: 50,
            reasoning: "Generic template based on field type".to_string(),
        },
        IssueType::TableStructure => Enhancement {
            suggestion: "Add descriptive column headers".to_string(),
            confidence: 40,
            reasoning: "Requires manual review".to_string(),
        },
        IssueType::HeadingHierarchy => Enhancement {
            suggestion: "Adjust heading level to maintain proper hierarchy".to_string(),
            confidence: 70,
            reasoning: "Standard WCAG requirement".to_string(),
        },
        _ => Enhancement {
            suggestion: "Manual review required".to_string(),
            confidence: 30,
            reasoning: "No automated suggestion available".to_string(),
        },
    }
}

/// Host portion of a URL, without pulling in a URL parser
fn host_of(url: &str) -> Option<String> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))?;
    let host = rest.split('/').next()?;
    if host.is_empty() {
        None
    } else {
        Some(host.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::issue::Severity;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn alt_text_issue() -> Issue {
        Issue::new(
            IssueType::MissingAltText,
            Severity::Error,
            1,
            "Image missing alternative text",
        )
    }

    #[test]
    fn test_parse_structured_response() {
        let response = "Suggestion: \"Bar chart of quarterly revenue\"\n\
                        Confidence: 92\n\
                        Reasoning: Chart shape is clearly visible";
        let parsed = parse_response(response, 85);
        assert_eq!(parsed.suggestion, "Bar chart of quarterly revenue");
        assert_eq!(parsed.confidence, 92);
        assert_eq!(parsed.reasoning, "Chart shape is clearly visible");
    }

    #[test]
    fn test_parse_plain_response_uses_defaults() {
        let parsed = parse_response("  Use a short  description\nof the image ", 85);
        assert_eq!(parsed.suggestion, "Use a short description of the image");
        assert_eq!(parsed.confidence, 85);
        assert_eq!(parsed.reasoning, "");
    }

    #[test]
    fn test_parse_confidence_with_suffix() {
        let parsed = parse_response("Suggestion: x\nConfidence: 70%", 85);
        assert_eq!(parsed.confidence, 70);
    }

    #[test]
    fn test_clean_suggestion_strips_quotes() {
        assert_eq!(clean_suggestion("\"Team photo\""), "Team photo");
        assert_eq!(clean_suggestion("'Team photo'"), "Team photo");
    }

    #[test]
    fn test_host_extraction() {
        assert_eq!(
            host_of("https://example.com/report/2025").as_deref(),
            Some("example.com")
        );
        assert_eq!(host_of("not a url"), None);
    }

    #[test]
    fn test_fallback_table() {
        let fb = fallback_suggestion(&alt_text_issue());
        assert_eq!(fb.confidence, 50);
        assert_eq!(fb.reasoning, "Generic template - AI enhancement unavailable");

        let mut link = Issue::new(IssueType::GenericLinkText, Severity::Warning, 1, "generic");
        link.detail = Some(IssueDetail::Link {
            current_text: "here".to_string(),
            url: Some("https://example.com/download".to_string()),
        });
        let fb = fallback_suggestion(&link);
        assert_eq!(fb.suggestion, "Visit example.com");
        assert_eq!(fb.confidence, 60);
    }

    #[tokio::test]
    async fn test_no_capability_applies_fallback() {
        let mut issues = vec![alt_text_issue()];
        enhance(&mut issues, None, &AiConfig::default()).await;
        assert_eq!(
            issues[0].suggestion.as_deref(),
            Some("Descriptive image of [describe main subject and purpose]")
        );
        assert_eq!(issues[0].confidence, Some(50));
        assert_eq!(
            issues[0].reasoning.as_deref(),
            Some("Generic template - AI enhancement unavailable")
        );
        assert!(issues[0].ai_service.is_none());
        assert!(!issues[0].enhancement_failed);
    }

    #[tokio::test]
    async fn test_ineligible_types_untouched() {
        let mut issues = vec![Issue::new(
            IssueType::MissingLanguage,
            Severity::Error,
            0,
            "Document language is not specified",
        )];
        enhance(&mut issues, None, &AiConfig::default()).await;
        assert!(issues[0].suggestion.is_none());
    }

    /// Capability that fails every n-th request
    struct FlakyCapability {
        calls: AtomicUsize,
        fail_on: usize,
    }

    #[async_trait]
    impl Capability for FlakyCapability {
        fn service_name(&self) -> &str {
            "flaky"
        }

        async fn request(&self, _prompt: &str, _context: Option<&str>) -> Result<String> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call == self.fail_on {
                Err(Error::Capability("synthetic failure".to_string()))
            } else {
                Ok("Suggestion: Generated text\nConfidence: 90".to_string())
            }
        }

        async fn analyze_page(
            &self,
            _image: &[u8],
            _text: &str,
            _page: u32,
        ) -> Result<Vec<crate::capability::DetectedIssue>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_batch_isolation_on_failure() {
        let mut issues = vec![alt_text_issue(), alt_text_issue(), alt_text_issue()];
        let capability = FlakyCapability {
            calls: AtomicUsize::new(0),
            fail_on: 1,
        };
        enhance(&mut issues, Some(&capability), &AiConfig::default()).await;

        let succeeded: Vec<_> = issues.iter().filter(|i| i.suggestion.is_some()).collect();
        let failed: Vec<_> = issues.iter().filter(|i| i.enhancement_failed).collect();
        assert_eq!(succeeded.len(), 2);
        assert_eq!(failed.len(), 1);
        assert!(failed[0].suggestion.is_none());
        for issue in succeeded {
            assert_eq!(issue.suggestion.as_deref(), Some("Generated text"));
            assert_eq!(issue.confidence, Some(90));
            assert_eq!(issue.ai_service.as_deref(), Some("flaky"));
        }
    }

    #[tokio::test]
    async fn test_batches_processed_sequentially() {
        // 7 eligible issues with batch size 5: the failure lands in the
        // second batch and the first batch is untouched by it
        let mut issues: Vec<Issue> = (0..7).map(|_| alt_text_issue()).collect();
        let capability = FlakyCapability {
            calls: AtomicUsize::new(0),
            fail_on: 6,
        };
        enhance(&mut issues, Some(&capability), &AiConfig::default()).await;
        assert_eq!(issues.iter().filter(|i| i.suggestion.is_some()).count(), 6);
        assert_eq!(issues.iter().filter(|i| i.enhancement_failed).count(), 1);
    }
}
