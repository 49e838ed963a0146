//! # Injection script builder.
//!
//! Builds the one self-contained script an attempt evaluates on the target
//! page. The script is an async sequence of named stages: locate the
//! composer through the selector cascade, focus it synchronously, wait a
//! short settle delay, apply the prompt value plus the synthetic event
//! sequence, wait a longer settle delay, then best-effort click a submit
//! control. Its return value is the wire token the executor classifies.
//!
//! The builder embeds the prompt verbatim between double quotes; escaping
//! is the caller's responsibility (see [`crate::escape`]).

use crate::config::InjectionConfig;
use promptcast_engines::DomTargetStrategy;

/// Prefix of a confirmed value-set result.
pub const WIRE_SUCCESS_PREFIX: &str = "success";
/// Prefix of a classified in-page failure.
pub const WIRE_ERROR_PREFIX: &str = "error:";
/// Token for an exhausted input selector cascade.
pub const TOKEN_INPUT_NOT_FOUND: &str = "error:input-not-found";
/// Token for a confirmed value set on a live element.
pub const TOKEN_VALUE_SET: &str = "success:value-set";

/// Locate stage: walk a selector cascade, first live match wins. Selectors
/// that fail to parse are skipped rather than aborting the cascade.
const STAGE_LOCATE: &str = r#"
  const sleep = (ms) => new Promise((resolve) => setTimeout(resolve, ms));
  const locateFirst = (selectors) => {
    for (const selector of selectors) {
      let el = null;
      try { el = document.querySelector(selector); } catch (err) { continue; }
      if (el) { return el; }
    }
    return null;
  };
  const locateEnabled = (selectors) => {
    for (const selector of selectors) {
      let matches = [];
      try { matches = document.querySelectorAll(selector); } catch (err) { continue; }
      for (const el of matches) {
        if (!el.disabled && el.getAttribute("aria-disabled") !== "true") { return el; }
      }
    }
    return null;
  };
  const isValueTarget = (el) => {
    const tag = (el.tagName || "").toLowerCase();
    return tag === "textarea" || tag === "input";
  };
"#;

/// Apply stage: set the value (`value` for form controls, `textContent`
/// with an `innerHTML` fallback for rich editors), dispatch the synthetic
/// event sequence frameworks listen for, and park the caret at the end.
const STAGE_APPLY: &str = r#"
  const moveCaretToEnd = (el) => {
    try {
      if (isValueTarget(el) && typeof el.setSelectionRange === "function") {
        const end = el.value.length;
        el.setSelectionRange(end, end);
      } else {
        const range = document.createRange();
        range.selectNodeContents(el);
        range.collapse(false);
        const selection = window.getSelection();
        selection.removeAllRanges();
        selection.addRange(range);
      }
    } catch (err) {}
  };
  const applyPrompt = (el, text) => {
    if (isValueTarget(el)) {
      el.value = text;
    } else {
      el.textContent = text;
      if ((el.textContent || "") !== text) { el.innerHTML = text; }
    }
    for (const type of ["focus", "input", "change", "keydown", "keyup"]) {
      let ev;
      if (type === "input") {
        ev = new InputEvent("input", { bubbles: true, cancelable: true, inputType: "insertText", data: text });
      } else if (type === "keydown" || type === "keyup") {
        ev = new KeyboardEvent(type, { bubbles: true, cancelable: true });
      } else {
        ev = new Event(type, { bubbles: true });
      }
      el.dispatchEvent(ev);
    }
    moveCaretToEnd(el);
  };
"#;

/// Submit stage: walk the submit cascade skipping disabled controls and
/// click the first live one. Best-effort; never affects the returned token.
const STAGE_SUBMIT: &str = r#"
  const pressSubmit = () => {
    const control = locateEnabled(SUBMIT_SELECTORS);
    if (!control) { return false; }
    control.click();
    return true;
  };
"#;

/// Run stage: the staged sequence itself. Focus happens synchronously
/// before any mutation; the submit click is wrapped so its failure cannot
/// change the token.
const STAGE_RUN: &str = r#"
  try {
    const target = locateFirst(INPUT_SELECTORS);
    if (!target) { return "error:input-not-found"; }
    target.focus();
    await sleep(VALUE_DELAY_MS);
    applyPrompt(target, PROMPT_TEXT);
    await sleep(SUBMIT_DELAY_MS);
    try { pressSubmit(); } catch (err) {}
    return "success:value-set";
  } catch (err) {
    return "error:" + ((err && err.message) ? err.message : "unexpected");
  }
"#;

/// Builds the staged injection script for one attempt.
pub struct InjectionScriptBuilder<'a> {
    strategy: &'a DomTargetStrategy,
    value_stage_delay_ms: u64,
    submit_stage_delay_ms: u64,
}

impl<'a> InjectionScriptBuilder<'a> {
    pub fn new(
        strategy: &'a DomTargetStrategy,
        value_stage_delay_ms: u64,
        submit_stage_delay_ms: u64,
    ) -> Self {
        Self {
            strategy,
            value_stage_delay_ms,
            submit_stage_delay_ms,
        }
    }

    pub fn from_config(strategy: &'a DomTargetStrategy, config: &InjectionConfig) -> Self {
        Self::new(
            strategy,
            config.value_stage_delay_ms,
            config.submit_stage_delay_ms,
        )
    }

    /// Assemble the script around an already-escaped prompt.
    pub fn build(&self, escaped_prompt: &str) -> String {
        let input_selectors = selector_array(self.strategy.input_cascade());
        let submit_selectors = selector_array(self.strategy.submit_cascade());

        let mut script = String::with_capacity(
            2048 + escaped_prompt.len() + input_selectors.len() + submit_selectors.len(),
        );
        script.push_str("(async () => {\n");
        script.push_str(&format!("  const INPUT_SELECTORS = {input_selectors};\n"));
        script.push_str(&format!("  const SUBMIT_SELECTORS = {submit_selectors};\n"));
        script.push_str(&format!(
            "  const VALUE_DELAY_MS = {};\n",
            self.value_stage_delay_ms
        ));
        script.push_str(&format!(
            "  const SUBMIT_DELAY_MS = {};\n",
            self.submit_stage_delay_ms
        ));
        script.push_str(&format!("  const PROMPT_TEXT = \"{escaped_prompt}\";\n"));
        script.push_str(STAGE_LOCATE);
        script.push_str(STAGE_APPLY);
        script.push_str(STAGE_SUBMIT);
        script.push_str(STAGE_RUN);
        script.push_str("})()");
        script
    }

    /// The named stages, for tests that assert on one stage in isolation.
    pub fn locate_stage() -> &'static str {
        STAGE_LOCATE
    }

    pub fn apply_stage() -> &'static str {
        STAGE_APPLY
    }

    pub fn submit_stage() -> &'static str {
        STAGE_SUBMIT
    }

    pub fn run_stage() -> &'static str {
        STAGE_RUN
    }
}

/// JSON-encode a selector cascade as a script array literal. JSON escaping
/// keeps selectors with embedded quotes intact.
fn selector_array(selectors: &[String]) -> String {
    serde_json::to_string(selectors).unwrap_or_else(|_| "[]".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escape::escape_for_script;

    fn strategy() -> DomTargetStrategy {
        DomTargetStrategy::with_specific("#composer", "#send-btn")
    }

    #[test]
    fn script_embeds_escaped_prompt_verbatim() {
        let strategy = strategy();
        let builder = InjectionScriptBuilder::new(&strategy, 200, 600);
        let script = builder.build(&escape_for_script("Hello <world>"));
        assert!(script.contains("Hello <world>"));
        assert!(script.contains("#composer"));
        assert!(script.contains("#send-btn"));
    }

    #[test]
    fn script_carries_all_four_stages() {
        let strategy = strategy();
        let builder = InjectionScriptBuilder::new(&strategy, 200, 600);
        let script = builder.build("hi");
        assert!(script.contains("locateFirst"));
        assert!(script.contains("target.focus()"));
        assert!(script.contains("applyPrompt"));
        assert!(script.contains("pressSubmit"));
        assert!(script.contains(TOKEN_VALUE_SET));
        assert!(script.contains(TOKEN_INPUT_NOT_FOUND));
    }

    #[test]
    fn stage_delays_come_from_config() {
        let strategy = strategy();
        let config = InjectionConfig {
            value_stage_delay_ms: 77,
            submit_stage_delay_ms: 888,
            ..Default::default()
        };
        let script = InjectionScriptBuilder::from_config(&strategy, &config).build("hi");
        assert!(script.contains("VALUE_DELAY_MS = 77"));
        assert!(script.contains("SUBMIT_DELAY_MS = 888"));
    }

    #[test]
    fn builder_performs_no_escaping_of_its_own() {
        // A raw quote passed straight through proves escaping stays with
        // the caller.
        let strategy = strategy();
        let builder = InjectionScriptBuilder::new(&strategy, 200, 600);
        let script = builder.build("unescaped \" quote");
        assert!(script.contains("unescaped \" quote"));
    }

    #[test]
    fn synthetic_event_sequence_is_fixed() {
        let script = InjectionScriptBuilder::apply_stage();
        assert!(script.contains("[\"focus\", \"input\", \"change\", \"keydown\", \"keyup\"]"));
    }

    #[test]
    fn submit_stage_skips_disabled_controls() {
        let stage = InjectionScriptBuilder::locate_stage();
        assert!(stage.contains("!el.disabled"));
        assert!(stage.contains("aria-disabled"));
    }
}
