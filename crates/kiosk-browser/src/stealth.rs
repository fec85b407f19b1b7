//! Anti-detection patches
//!
//! Registered via `Page.addScriptToEvaluateOnNewDocument` so the bundle
//! runs before any page script on every new document, not once per
//! process. Registration must happen before the first navigation or the
//! first document goes out unpatched.

/// Script bundle overriding the browser properties that reveal automation.
pub const STEALTH_PATCH: &str = r#"
Object.defineProperty(navigator, 'webdriver', { get: () => false });
Object.defineProperty(navigator, 'languages', { get: () => ['en-US', 'en'] });
Object.defineProperty(navigator, 'plugins', { get: () => [1, 2, 3, 4, 5] });
window.chrome = window.chrome || { runtime: {} };

const originalQuery = window.navigator.permissions?.query;
if (originalQuery) {
    window.navigator.permissions.query = (parameters) =>
        parameters.name === 'notifications'
            ? Promise.resolve({ state: Notification.permission })
            : originalQuery(parameters);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn covers_every_patched_surface() {
        assert!(STEALTH_PATCH.contains("webdriver"));
        assert!(STEALTH_PATCH.contains("'languages'"));
        assert!(STEALTH_PATCH.contains("'plugins'"));
        assert!(STEALTH_PATCH.contains("window.chrome"));
        assert!(STEALTH_PATCH.contains("notifications"));
    }

    #[test]
    fn non_notification_permission_queries_are_delegated() {
        // the original query implementation must remain the fallback branch
        assert!(STEALTH_PATCH.contains("originalQuery(parameters)"));
    }
}
