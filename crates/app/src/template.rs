//! Placeholder filling for prompt templates.
//!
//! Templates use `{{name}}` placeholders substituted from `--var
//! name=value` pairs. Template storage and editing live outside this
//! application; this is only the boundary step before delivery.

/// Replace every `{{name}}` with its value. Unknown placeholders are left
/// in place so the caller can warn about them.
pub fn fill_placeholders(template: &str, vars: &[(String, String)]) -> String {
    let mut out = template.to_string();
    for (name, value) in vars {
        out = out.replace(&format!("{{{{{name}}}}}"), value);
    }
    out
}

/// Placeholder names still present after filling.
pub fn unresolved_placeholders(text: &str) -> Vec<String> {
    let mut found = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find("{{") {
        let tail = &rest[start + 2..];
        match tail.find("}}") {
            Some(end) => {
                let name = tail[..end].trim();
                if !name.is_empty() && !found.iter().any(|n| n == name) {
                    found.push(name.to_string());
                }
                rest = &tail[end + 2..];
            }
            None => break,
        }
    }
    found
}
