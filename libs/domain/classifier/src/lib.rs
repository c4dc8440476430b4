// [libs/domain/classifier/src/lib.rs]
/*!
 * =================================================================
 * APARATO: RULE-BASED TICKET CLASSIFIER
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: (subject, message) -> (urgency, sentiment, requires_action)
 *
 * Pure, stateless, never fails. The keyword lists are data, not design —
 * tune them freely without touching the matching logic below.
 * =================================================================
 */

use ticketflow_domain_models::{Sentiment, Urgency};

const HIGH_URGENCY_KEYWORDS: &[&str] = &[
    "urgent",
    "critical",
    "lawsuit",
    "gdpr",
    "refund",
    "chargeback",
    "data breach",
    "outage",
    "legal action",
    "emergency",
];

const MEDIUM_URGENCY_KEYWORDS: &[&str] = &[
    "issue",
    "problem",
    "not working",
    "broken",
    "error",
    "delay",
    "disappointed",
];

const NEGATIVE_SENTIMENT_KEYWORDS: &[&str] = &[
    "angry",
    "frustrated",
    "terrible",
    "awful",
    "unacceptable",
    "disappointed",
    "furious",
    "worst",
    "hate",
];

const POSITIVE_SENTIMENT_KEYWORDS: &[&str] = &[
    "thank you",
    "thanks",
    "great",
    "excellent",
    "appreciate",
    "awesome",
    "happy",
    "love",
];

const ACTION_KEYWORDS: &[&str] = &[
    "please",
    "need",
    "require",
    "request",
    "asap",
    "fix",
    "resolve",
    "cancel",
    "refund",
];

/// The classifier's full output for one ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub urgency: Urgency,
    pub sentiment: Sentiment,
    pub requires_action: bool,
}

fn any_keyword_matches(haystack: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| haystack.contains(keyword))
}

/// Classifies a ticket from its subject and message. Operates on the
/// case-folded concatenation of both fields, per spec §4.5.
pub fn classify(subject: &str, message: &str) -> Classification {
    let haystack = format!("{subject} {message}").to_lowercase();

    let urgency = if any_keyword_matches(&haystack, HIGH_URGENCY_KEYWORDS) {
        Urgency::High
    } else if any_keyword_matches(&haystack, MEDIUM_URGENCY_KEYWORDS) {
        Urgency::Medium
    } else {
        Urgency::Low
    };

    let sentiment = if any_keyword_matches(&haystack, NEGATIVE_SENTIMENT_KEYWORDS) {
        Sentiment::Negative
    } else if any_keyword_matches(&haystack, POSITIVE_SENTIMENT_KEYWORDS) {
        Sentiment::Positive
    } else {
        Sentiment::Neutral
    };

    // urgency=high implies requires_action, regardless of action keywords.
    let requires_action = urgency == Urgency::High || any_keyword_matches(&haystack, ACTION_KEYWORDS);

    Classification {
        urgency,
        sentiment,
        requires_action,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn high_urgency_keyword_forces_high_and_requires_action() {
        let result = classify("URGENT: GDPR complaint", "please respond immediately");
        assert_eq!(result.urgency, Urgency::High);
        assert!(result.requires_action);
    }

    #[test]
    fn medium_keyword_without_high_keyword_is_medium() {
        let result = classify("Login broken", "I get an error every time I try");
        assert_eq!(result.urgency, Urgency::Medium);
    }

    #[test]
    fn no_keyword_match_is_low_neutral_no_action() {
        let result = classify("Question about pricing", "What tiers are available?");
        assert_eq!(result.urgency, Urgency::Low);
        assert_eq!(result.sentiment, Sentiment::Neutral);
        assert!(!result.requires_action);
    }

    #[test]
    fn negative_keyword_sets_sentiment_even_at_low_urgency() {
        let result = classify("Feedback", "This is an awful experience overall");
        assert_eq!(result.sentiment, Sentiment::Negative);
        assert_eq!(result.urgency, Urgency::Low);
    }

    #[test]
    fn positive_keyword_sets_sentiment_positive() {
        let result = classify("Thanks", "Thank you so much, the team was awesome");
        assert_eq!(result.sentiment, Sentiment::Positive);
    }

    #[test]
    fn action_keyword_alone_sets_requires_action_without_raising_urgency() {
        let result = classify("Small request", "Please cancel my subscription");
        assert_eq!(result.urgency, Urgency::Low);
        assert!(result.requires_action);
    }

    #[test]
    fn matching_is_case_insensitive() {
        let lower = classify("urgent", "gdpr breach");
        let upper = classify("URGENT", "GDPR BREACH");
        assert_eq!(lower.urgency, upper.urgency);
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn classify_never_panics_on_arbitrary_input(subject in ".*", message in ".*") {
            let _ = classify(&subject, &message);
        }

        #[test]
        fn high_urgency_always_implies_requires_action(subject in ".*") {
            let text_with_high_keyword = format!("{subject} urgent");
            let result = classify(&text_with_high_keyword, "");
            if result.urgency == Urgency::High {
                prop_assert!(result.requires_action);
            }
        }
    }
}
