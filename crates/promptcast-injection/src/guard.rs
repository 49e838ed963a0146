//! # Post-injection echo guard.
//!
//! Some chat pages echo a submitted message back into their composer,
//! which a later framework sync can re-submit. After a confirmed success,
//! and only then, the guard installs a MutationObserver plus redundant
//! input-event listeners across the same selector cascade used for
//! discovery, and clears any non-empty value that reappears.
//!
//! The "content reappeared = re-submission echo" heuristic cannot tell an
//! echo from a user retyping into the composer while the guard is armed;
//! the guard is scoped to one page load and never re-armed after
//! navigation.

use crate::config::InjectionConfig;
use crate::error::InjectionError;
use crate::script::{WIRE_ERROR_PREFIX, WIRE_SUCCESS_PREFIX};
use crate::ScriptSurface;
use promptcast_engines::DomTargetStrategy;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Token returned by a freshly armed (or already armed) guard script.
pub const TOKEN_GUARD_ARMED: &str = "success:guard-armed";

const GUARD_BODY: &str = r#"
  if (window.__promptcastEchoGuard) { return "success:guard-armed"; }
  const clearEcho = (el) => {
    const tag = (el.tagName || "").toLowerCase();
    const holdsValue = tag === "textarea" || tag === "input";
    const current = holdsValue ? el.value : el.textContent;
    if (!current || current.length === 0) { return; }
    if (holdsValue) {
      el.value = "";
    } else {
      el.textContent = "";
      if ((el.textContent || "") !== "") { el.innerHTML = ""; }
    }
    el.dispatchEvent(new InputEvent("input", { bubbles: true, cancelable: true, inputType: "deleteContentBackward" }));
  };
  const watched = [];
  for (const selector of WATCH_SELECTORS) {
    let matches = [];
    try { matches = document.querySelectorAll(selector); } catch (err) { continue; }
    for (const el of matches) {
      if (!watched.includes(el)) { watched.push(el); }
    }
  }
  if (watched.length === 0) { return "error:no-watch-targets"; }
  for (const el of watched) {
    el.addEventListener("input", () => clearEcho(el));
  }
  const observer = new MutationObserver(() => {
    for (const el of watched) { clearEcho(el); }
  });
  for (const el of watched) {
    observer.observe(el, { childList: true, subtree: true, characterData: true, attributes: true, attributeFilter: ["value"] });
  }
  window.__promptcastEchoGuard = observer;
  return "success:guard-armed";
"#;

pub struct PostInjectionGuard {
    config: InjectionConfig,
}

impl PostInjectionGuard {
    pub fn new(config: InjectionConfig) -> Self {
        Self { config }
    }

    /// The guard script over the given cascade. Idempotent on the page: a
    /// second installation leaves the first observer in place.
    pub fn build_script(&self, strategy: &DomTargetStrategy) -> String {
        let selectors = serde_json::to_string(strategy.input_cascade())
            .unwrap_or_else(|_| "[]".to_string());
        let mut script = String::with_capacity(1024 + selectors.len());
        script.push_str("(() => {\n");
        script.push_str(&format!("  const WATCH_SELECTORS = {selectors};\n"));
        script.push_str(GUARD_BODY);
        script.push_str("})()");
        script
    }

    /// Arm the guard after the post-submit settle delay. Failure is
    /// non-fatal for the flow; the caller logs it and moves on.
    pub async fn install(
        &self,
        surface: &dyn ScriptSurface,
        strategy: &DomTargetStrategy,
        cancel: &CancellationToken,
    ) -> Result<(), InjectionError> {
        let settle = Duration::from_millis(self.config.post_submit_settle_ms);
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(InjectionError::Cancelled),
            _ = tokio::time::sleep(settle) => {}
        }

        let script = self.build_script(strategy);
        let timeout = Duration::from_millis(self.config.evaluate_timeout_ms);
        let token = match tokio::time::timeout(timeout, surface.evaluate(&script)).await {
            Err(_) => {
                return Err(InjectionError::EvaluateTimeout {
                    elapsed_ms: self.config.evaluate_timeout_ms,
                })
            }
            Ok(Err(e)) => return Err(InjectionError::ScriptException(e.to_string())),
            Ok(Ok(token)) => token,
        };

        if token.starts_with(WIRE_SUCCESS_PREFIX) {
            debug!("echo guard armed");
            Ok(())
        } else {
            let reason = token
                .strip_prefix(WIRE_ERROR_PREFIX)
                .unwrap_or(&token)
                .to_string();
            Err(InjectionError::ScriptException(reason))
        }
    }
}
