//! Remote image host allowlist and media link checks.

use url::Url;

use crate::error::ValidationErrors;

/// Relative links are resolved against this origin; anything that stays on
/// it is a local asset.
const LOCAL_ORIGIN: &str = "http://local.invalid/";
const LOCAL_HOST: &str = "local.invalid";

/// Hosts the frontend may render remote images from. Empty allows any host.
///
/// Entries are exact host names, or `*.example.com` to also match subdomains.
#[derive(Debug, Clone, Default)]
pub struct ImageHosts {
    hosts: Vec<String>,
}

impl ImageHosts {
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            hosts: hosts
                .into_iter()
                .map(|h| h.into().trim().to_lowercase())
                .filter(|h| !h.is_empty())
                .collect(),
        }
    }

    /// Reads the comma-separated `IMAGE_DOMAINS` variable.
    pub fn from_env() -> Self {
        let raw = std::env::var("IMAGE_DOMAINS").unwrap_or_default();
        Self::new(raw.split(','))
    }

    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    pub fn allows(&self, host: &str) -> bool {
        if self.hosts.is_empty() {
            return true;
        }
        let host = host.to_lowercase();
        self.hosts.iter().any(|allowed| match allowed.strip_prefix("*.") {
            Some(base) => host == base || host.ends_with(&format!(".{}", base)),
            None => host == *allowed,
        })
    }
}

/// Check one media link.
///
/// Relative paths are local assets and always pass. Everything else,
/// including protocol-relative `//host/...` links, must be http(s); when
/// `hosts` is given the host must also be allowed.
pub fn check_link(
    errors: &mut ValidationErrors,
    field: &str,
    link: &str,
    hosts: Option<&ImageHosts>,
) {
    let url = match Url::parse(LOCAL_ORIGIN).and_then(|base| base.join(link.trim())) {
        Ok(url) => url,
        Err(e) => {
            errors.add(field, format!("invalid link: {}", e));
            return;
        }
    };
    if url.host_str() == Some(LOCAL_HOST) {
        return;
    }

    if url.scheme() != "http" && url.scheme() != "https" {
        errors.add(field, format!("unsupported link scheme '{}'", url.scheme()));
        return;
    }

    if let Some(hosts) = hosts {
        let host = url.host_str().unwrap_or_default();
        if !hosts.allows(host) {
            errors.add(field, format!("image host '{}' is not allowed", host));
        }
    }
}

/// Check every link of a list field, naming failures `field[index]`.
pub fn check_links(
    errors: &mut ValidationErrors,
    field: &str,
    links: &[String],
    hosts: Option<&ImageHosts>,
) {
    for (i, link) in links.iter().enumerate() {
        check_link(errors, &format!("{}[{}]", field, i), link, hosts);
    }
}
