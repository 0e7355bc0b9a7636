use serde::{Deserialize, Serialize};

/// A logo whose image could be resolved and decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogoItem {
    pub domain: String,
    pub logo_url: String,
}

impl LogoItem {
    pub fn new(domain: impl Into<String>, logo_url: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            logo_url: logo_url.into(),
        }
    }
}

/// One output row: the domains and logo URLs of a group, in join order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRecord {
    pub group_id: usize,
    pub domains: Vec<String>,
    pub logo_urls: Vec<String>,
}

impl GroupRecord {
    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    /// Iterate `(domain, logo_url)` pairs.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.domains
            .iter()
            .map(String::as_str)
            .zip(self.logo_urls.iter().map(String::as_str))
    }
}
