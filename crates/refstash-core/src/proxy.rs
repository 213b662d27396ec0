//! Proxy scheme resolution
//!
//! Institutional proxies rewrite URLs through a host-substitution template
//! such as `https://%h.proxy.example.com/%p`, where `%h` is the original host
//! (with dots optionally replaced by hyphens) and `%p` the original path.
//! The template is compiled into a regex (placeholder -> named capture group)
//! so that resolution is the exact inverse of rewriting.

use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A proxy URL scheme as reported by the browser extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ProxyScheme {
    /// Template with `%h` (host) and `%p` (path) placeholders.
    pub scheme: String,
    /// Whether dots in the original host appear as hyphens in the proxied host.
    #[serde(rename = "dotsToHyphens", default)]
    pub dots_to_hyphens: bool,
}

impl ProxyScheme {
    pub fn new(scheme: impl Into<String>, dots_to_hyphens: bool) -> Self {
        Self {
            scheme: scheme.into(),
            dots_to_hyphens,
        }
    }

    /// Protocol of the scheme template (`https` for `https://%h.../%p`).
    fn protocol(&self) -> Option<&str> {
        self.scheme.split_once("://").map(|(proto, _)| proto)
    }

    /// Compile the template into a matching regex. `%h` must not cross a path
    /// boundary; `%p` swallows the remainder.
    fn compile(&self) -> Option<Regex> {
        let mut pattern = String::from("^");
        let mut rest = self.scheme.as_str();
        while let Some(idx) = rest.find('%') {
            pattern.push_str(&regex::escape(&rest[..idx]));
            match rest.as_bytes().get(idx + 1) {
                Some(b'h') => pattern.push_str("(?P<h>[^/]+)"),
                Some(b'p') => pattern.push_str("(?P<p>.*)"),
                _ => pattern.push_str(&regex::escape(&rest[idx..idx + 1])),
            }
            rest = match rest.as_bytes().get(idx + 1) {
                Some(b'h') | Some(b'p') => &rest[idx + 2..],
                _ => &rest[idx + 1..],
            };
        }
        pattern.push_str(&regex::escape(rest));
        pattern.push('$');
        Regex::new(&pattern).ok()
    }

    /// Recover the canonical URL from a proxied one. Best-effort: URLs that do
    /// not match the scheme shape are returned unchanged.
    pub fn resolve(&self, url: &str) -> String {
        let Some(pattern) = self.compile() else {
            return url.to_string();
        };
        let Some(caps) = pattern.captures(url) else {
            return url.to_string();
        };
        let Some(host) = caps.name("h").map(|m| m.as_str()) else {
            return url.to_string();
        };
        let host = if self.dots_to_hyphens {
            host.replace('-', ".")
        } else {
            host.to_string()
        };
        let path = caps.name("p").map(|m| m.as_str()).unwrap_or("");
        let proto = self.protocol().unwrap_or("https");
        format!("{}://{}/{}", proto, host, path)
    }

    /// Rewrite a canonical URL through the proxy scheme. Returns `None` for
    /// URLs without a recognizable `proto://host/…` shape.
    pub fn rewrite(&self, url: &str) -> Option<String> {
        let (_, host, path) = split_url(url)?;
        let host = if self.dots_to_hyphens {
            host.replace('.', "-")
        } else {
            host.to_string()
        };
        Some(self.scheme.replace("%h", &host).replace("%p", path))
    }

    /// Guess the proxy scheme from a proxied URL alone.
    ///
    /// A hyphen-encoded first host label with a multi-label suffix
    /// (`www-example-com.proxy.example.com`) is taken as `%h` plus the proxy
    /// suffix. Used by `/detect` to match translator targets against the
    /// deproxified URL when the caller did not report its proxy.
    pub fn infer(url: &str) -> Option<ProxyScheme> {
        let (proto, host, _) = split_url(url)?;
        let mut labels = host.split('.');
        let first = labels.next()?;
        let suffix: Vec<&str> = labels.collect();
        if !first.contains('-') || suffix.len() < 2 {
            return None;
        }
        Some(ProxyScheme::new(
            format!("{}://%h.{}/%p", proto, suffix.join(".")),
            true,
        ))
    }
}

/// Split a URL into (protocol, host, path-without-leading-slash).
fn split_url(url: &str) -> Option<(&str, &str, &str)> {
    let (proto, rest) = url.split_once("://")?;
    if proto.is_empty() || rest.is_empty() {
        return None;
    }
    match rest.split_once('/') {
        Some((host, path)) if !host.is_empty() => Some((proto, host, path)),
        Some(_) => None,
        None => Some((proto, rest, "")),
    }
}
