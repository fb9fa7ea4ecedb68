//! Base URL resolution and link rewriting for forwarded dev hosts

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Suffix pair describing a development forwarding domain and the preview
/// domain that actually serves forwarded ports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardingRule {
    pub dev_suffix: String,
    pub preview_suffix: String,
}

impl Default for ForwardingRule {
    fn default() -> Self {
        Self {
            dev_suffix: "github.dev".to_string(),
            preview_suffix: "preview.app.github.dev".to_string(),
        }
    }
}

impl ForwardingRule {
    /// Host that forwarded traffic should target, or `None` when `hostname`
    /// is not on the dev forwarding domain.
    pub fn forward_host(&self, hostname: &str) -> Option<String> {
        let hostname = hostname.trim().trim_end_matches('.').to_ascii_lowercase();
        let dev = self.dev_suffix.to_ascii_lowercase();
        let preview = self.preview_suffix.to_ascii_lowercase();

        if is_domain_suffix(&hostname, &preview) {
            return Some(hostname);
        }

        if is_domain_suffix(&hostname, &dev) {
            let prefix = &hostname[..hostname.len() - dev.len()];
            return Some(format!("{}{}", prefix, preview));
        }

        None
    }
}

fn is_domain_suffix(hostname: &str, suffix: &str) -> bool {
    if suffix.is_empty() {
        return false;
    }
    hostname == suffix
        || hostname
            .strip_suffix(suffix)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

/// Resolve the API base URL for a dashboard served from `hostname`.
pub fn resolve_base_url(hostname: &str, rule: &ForwardingRule, local_default: &str) -> String {
    match rule.forward_host(hostname) {
        Some(host) => format!("https://{}/api", host),
        None => local_default.to_string(),
    }
}

/// Point every service link at the forwarded host. Ports and paths of the
/// original URLs are dropped, so all services share one link.
pub fn rewrite_services(
    services: &BTreeMap<String, String>,
    forward_host: &str,
) -> BTreeMap<String, String> {
    let target = format!("https://{}", forward_host);
    services
        .keys()
        .map(|name| (name.clone(), target.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOCAL: &str = "http://localhost/api";

    #[test]
    fn test_forwarded_hosts_resolve_to_preview_domain() {
        let rule = ForwardingRule::default();

        for hostname in ["foo.github.dev", "a-b-c-8080.github.dev", "FOO.GitHub.dev", "github.dev"] {
            let url = resolve_base_url(hostname, &rule, LOCAL);
            assert!(url.starts_with("https://"), "{}", url);
            assert!(url.ends_with(".preview.app.github.dev/api") || url == "https://preview.app.github.dev/api");
        }

        assert_eq!(
            resolve_base_url("foo.github.dev", &rule, LOCAL),
            "https://foo.preview.app.github.dev/api"
        );
    }

    #[test]
    fn test_other_hosts_use_local_default() {
        let rule = ForwardingRule::default();

        for hostname in ["localhost", "127.0.0.1", "example.com", "notgithub.dev", "github.dev.example.com"] {
            assert_eq!(resolve_base_url(hostname, &rule, LOCAL), LOCAL);
        }
    }

    #[test]
    fn test_preview_host_is_not_rewritten_twice() {
        let rule = ForwardingRule::default();
        assert_eq!(
            rule.forward_host("foo.preview.app.github.dev").as_deref(),
            Some("foo.preview.app.github.dev")
        );
    }

    #[test]
    fn test_custom_suffix_pair() {
        let rule = ForwardingRule {
            dev_suffix: "dev.internal".to_string(),
            preview_suffix: "preview.internal".to_string(),
        };
        assert_eq!(
            resolve_base_url("box.dev.internal", &rule, LOCAL),
            "https://box.preview.internal/api"
        );
    }

    #[test]
    fn test_rewrite_collapses_all_services() {
        let mut services = BTreeMap::new();
        services.insert("web".to_string(), "http://host:3000".to_string());
        services.insert("api".to_string(), "http://host:8080".to_string());

        let rewritten = rewrite_services(&services, "foo.preview.app.github.dev");

        assert_eq!(rewritten.len(), 2);
        assert_eq!(rewritten["web"], "https://foo.preview.app.github.dev");
        assert_eq!(rewritten["api"], "https://foo.preview.app.github.dev");
    }
}
