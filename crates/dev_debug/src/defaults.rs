use std::{env, time::Duration};

pub(crate) const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:3000/debug";
pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_millis(200);
pub(crate) const DEFAULT_MARKER: &str = "Rust";
pub(crate) const DUMP_PLACEHOLDER: &str = "🐛";
pub(crate) const DUMP_EXIT_CODE: i32 = 1;
pub(crate) const UNKNOWN: &str = "unknown";
pub(crate) const INSPECTION_PANICKED: &str = "inspection panicked";

pub(crate) const DEV_DEBUG_ENDPOINT_ENV: &str = "DEV_DEBUG_ENDPOINT";
pub(crate) const DEV_DEBUG_ENABLED_ENV: &str = "DEV_DEBUG_ENABLED";
pub(crate) const WEB_CONTEXT_ENVS: &[&str] = &["GATEWAY_INTERFACE", "REQUEST_METHOD"];

pub(crate) fn default_endpoint() -> String {
    env::var(DEV_DEBUG_ENDPOINT_ENV)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())
}

pub(crate) fn flag_enabled(raw: Option<&str>) -> bool {
    match raw.map(str::trim) {
        None | Some("") => false,
        Some(value) => !matches!(
            value.to_ascii_lowercase().as_str(),
            "0" | "false" | "off" | "no"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enable_flag_accepts_any_affirmative_value() {
        assert!(!flag_enabled(None));
        assert!(!flag_enabled(Some("")));
        assert!(!flag_enabled(Some(" 0 ")));
        assert!(!flag_enabled(Some("False")));
        assert!(!flag_enabled(Some("off")));
        assert!(flag_enabled(Some("1")));
        assert!(flag_enabled(Some("yes")));
        assert!(flag_enabled(Some("true")));
    }
}
