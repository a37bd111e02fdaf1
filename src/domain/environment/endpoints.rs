//! Ordered RPC endpoint list

use reqwest::Url;
use crate::shared::errors::ConfigError;

/// Ordered, non-empty list of RPC endpoints.
///
/// The first entry is the primary endpoint, the rest are fallbacks tried
/// in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointSet {
    urls: Vec<String>,
}

impl EndpointSet {
    /// Build from a primary endpoint and its fallbacks
    pub fn new(primary: impl Into<String>, fallbacks: Vec<String>) -> Result<Self, ConfigError> {
        let mut urls = Vec::with_capacity(fallbacks.len() + 1);
        urls.push(primary.into());
        urls.extend(fallbacks);
        Self::from_urls(urls)
    }

    /// Build from a flat list, first entry is the primary.
    /// Duplicates are dropped, keeping the first occurrence.
    pub fn from_urls(urls: Vec<String>) -> Result<Self, ConfigError> {
        let mut unique: Vec<String> = Vec::with_capacity(urls.len());
        for raw in urls {
            let url = raw.trim().to_string();
            validate_url(&url)?;
            if !unique.contains(&url) {
                unique.push(url);
            }
        }

        if unique.is_empty() {
            return Err(ConfigError::EmptyEndpoints);
        }

        Ok(Self { urls: unique })
    }

    pub fn primary(&self) -> &str {
        &self.urls[0]
    }

    pub fn fallbacks(&self) -> &[String] {
        &self.urls[1..]
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.urls.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    /// Always false; kept for clippy's `len_without_is_empty`
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn last_index(&self) -> usize {
        self.urls.len() - 1
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.urls.iter().map(String::as_str)
    }
}

fn validate_url(url: &str) -> Result<(), ConfigError> {
    if url.is_empty() {
        return Err(ConfigError::InvalidEndpoint("<empty>".to_string()));
    }
    let parsed = Url::parse(url).map_err(|e| ConfigError::InvalidEndpoint(format!("{}: {}", url, e)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::InvalidEndpoint(format!(
            "{}: unsupported scheme {}",
            url, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_and_fallbacks() {
        let set = EndpointSet::new(
            "https://a.example",
            vec!["https://b.example".to_string(), "https://c.example".to_string()],
        )
        .unwrap();

        assert_eq!(set.len(), 3);
        assert_eq!(set.primary(), "https://a.example");
        assert_eq!(set.fallbacks(), &["https://b.example".to_string(), "https://c.example".to_string()]);
        assert_eq!(set.last_index(), 2);
        assert_eq!(set.get(3), None);
    }

    #[test]
    fn test_duplicates_dropped() {
        let set = EndpointSet::from_urls(vec![
            "https://a.example".to_string(),
            " https://a.example ".to_string(),
            "https://b.example".to_string(),
        ])
        .unwrap();
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["https://a.example", "https://b.example"]);
    }

    #[test]
    fn test_rejects_empty_and_invalid() {
        assert!(matches!(EndpointSet::from_urls(vec![]), Err(ConfigError::EmptyEndpoints)));
        assert!(matches!(
            EndpointSet::from_urls(vec!["".to_string()]),
            Err(ConfigError::InvalidEndpoint(_))
        ));
        assert!(matches!(
            EndpointSet::from_urls(vec!["ftp://a.example".to_string()]),
            Err(ConfigError::InvalidEndpoint(_))
        ));
        assert!(matches!(
            EndpointSet::from_urls(vec!["not a url".to_string()]),
            Err(ConfigError::InvalidEndpoint(_))
        ));
    }
}
