use crate::descriptor::EngineDescriptor;

/// Generic composer selectors, in priority order. Tried after the engine's
/// own input selector. Chat pages converge on a small set of composer
/// shapes: placeholder-labelled textareas, plain textareas, text inputs,
/// then rich contenteditable editors.
const GENERIC_INPUT_SELECTORS: &[&str] = &[
    "textarea[placeholder*=\"message\" i]",
    "textarea[placeholder*=\"prompt\" i]",
    "textarea",
    "input[type=\"text\"]",
    "[contenteditable=\"true\"]",
    "[role=\"textbox\"]",
];

/// Generic submit-control selectors, in priority order. Tried after the
/// engine's own submit selector. Disabled controls are skipped by the
/// consumer of the cascade.
const GENERIC_SUBMIT_SELECTORS: &[&str] = &[
    "button[type=\"submit\"]",
    "button[data-testid=\"send-button\"]",
    "button[aria-label*=\"send\" i]",
];

/// One ordered pair of selector cascades: engine-specific selector first,
/// generic fallbacks after, first live match wins.
///
/// This is the single source of truth for target discovery. The injection
/// script and the post-injection guard both consume the same cascade, so a
/// page that was injected through selector N is also watched through
/// selector N.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomTargetStrategy {
    input_cascade: Vec<String>,
    submit_cascade: Vec<String>,
}

impl DomTargetStrategy {
    /// Build the cascade for one engine: its descriptor selectors first,
    /// then the generic priority lists. Duplicates are dropped so a
    /// descriptor that names a generic selector does not get scanned twice.
    pub fn for_descriptor(descriptor: &EngineDescriptor) -> Self {
        Self::with_specific(&descriptor.input_selector, &descriptor.submit_selector)
    }

    /// Cascade for explicit selectors, without a full descriptor.
    pub fn with_specific(input_selector: &str, submit_selector: &str) -> Self {
        let mut input_cascade = Vec::with_capacity(1 + GENERIC_INPUT_SELECTORS.len());
        if !input_selector.is_empty() {
            input_cascade.push(input_selector.to_string());
        }
        for sel in GENERIC_INPUT_SELECTORS {
            if *sel != input_selector {
                input_cascade.push((*sel).to_string());
            }
        }

        let mut submit_cascade = Vec::with_capacity(1 + GENERIC_SUBMIT_SELECTORS.len());
        if !submit_selector.is_empty() {
            submit_cascade.push(submit_selector.to_string());
        }
        for sel in GENERIC_SUBMIT_SELECTORS {
            if *sel != submit_selector {
                submit_cascade.push((*sel).to_string());
            }
        }

        Self {
            input_cascade,
            submit_cascade,
        }
    }

    /// Ordered composer selectors, engine-specific first.
    pub fn input_cascade(&self) -> &[String] {
        &self.input_cascade
    }

    /// Ordered submit-control selectors, engine-specific first.
    pub fn submit_cascade(&self) -> &[String] {
        &self.submit_cascade
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> EngineDescriptor {
        EngineDescriptor::new(
            "test",
            "https://chat.example.com/",
            "#composer",
            "#send-btn",
            500,
        )
    }

    #[test]
    fn specific_selector_leads_the_cascade() {
        let strategy = DomTargetStrategy::for_descriptor(&descriptor());
        assert_eq!(strategy.input_cascade()[0], "#composer");
        assert_eq!(strategy.submit_cascade()[0], "#send-btn");
    }

    #[test]
    fn generic_fallbacks_follow_in_priority_order() {
        let strategy = DomTargetStrategy::for_descriptor(&descriptor());
        let cascade = strategy.input_cascade();
        let textarea_pos = cascade.iter().position(|s| s == "textarea").unwrap();
        let editable_pos = cascade
            .iter()
            .position(|s| s == "[contenteditable=\"true\"]")
            .unwrap();
        assert!(textarea_pos < editable_pos);
    }

    #[test]
    fn duplicate_specific_selector_is_not_repeated() {
        let strategy = DomTargetStrategy::with_specific("textarea", "button[type=\"submit\"]");
        let count = strategy
            .input_cascade()
            .iter()
            .filter(|s| s.as_str() == "textarea")
            .count();
        assert_eq!(count, 1);
        assert_eq!(strategy.input_cascade()[0], "textarea");
    }
}
