use crate::descriptor::EngineDescriptor;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Unknown engine: {0}")]
    UnknownEngine(String),
}

/// Immutable name -> descriptor mapping.
///
/// Built once at startup from the builtin table, optionally merged with
/// descriptors from the application configuration (configuration wins on a
/// name collision). Lookups never mutate the registry.
pub struct EngineRegistry {
    engines: HashMap<String, EngineDescriptor>,
}

impl EngineRegistry {
    /// The engines Promptcast ships with. Selectors track the current markup
    /// of each chat page; configuration overrides cover drift between
    /// releases.
    pub fn builtin() -> Self {
        let mut registry = Self {
            engines: HashMap::new(),
        };
        registry.insert(EngineDescriptor::new(
            "chatgpt",
            "https://chatgpt.com/",
            "#prompt-textarea",
            "button[data-testid=\"send-button\"]",
            1500,
        ));
        registry.insert(EngineDescriptor::new(
            "claude",
            "https://claude.ai/new",
            "div[contenteditable=\"true\"][role=\"textbox\"]",
            "button[aria-label*=\"Send\"]",
            2000,
        ));
        registry.insert(EngineDescriptor::new(
            "gemini",
            "https://gemini.google.com/app",
            ".ql-editor[contenteditable=\"true\"]",
            "button[aria-label*=\"Send\"]",
            2000,
        ));
        registry.insert(EngineDescriptor::new(
            "copilot",
            "https://copilot.microsoft.com/",
            "textarea#userInput",
            "button[type=\"submit\"]",
            1500,
        ));
        registry.insert(EngineDescriptor::new(
            "perplexity",
            "https://www.perplexity.ai/",
            "textarea[placeholder*=\"Ask\"]",
            "button[aria-label*=\"Submit\"]",
            1500,
        ));
        registry
    }

    /// An empty registry, for tests and fully configuration-driven setups.
    pub fn empty() -> Self {
        Self {
            engines: HashMap::new(),
        }
    }

    /// Add or replace a descriptor. Only used during startup assembly.
    pub fn insert(&mut self, descriptor: EngineDescriptor) {
        self.engines.insert(descriptor.name.clone(), descriptor);
    }

    /// Merge configured descriptors over the builtin set.
    pub fn merge(&mut self, overrides: impl IntoIterator<Item = EngineDescriptor>) {
        for descriptor in overrides {
            self.insert(descriptor);
        }
    }

    pub fn get(&self, name: &str) -> Result<&EngineDescriptor, EngineError> {
        self.engines
            .get(name)
            .ok_or_else(|| EngineError::UnknownEngine(name.to_string()))
    }

    /// Engine names in no particular order.
    pub fn names(&self) -> Vec<&str> {
        self.engines.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }
}

impl Default for EngineRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
