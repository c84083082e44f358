use std::collections::HashMap;

/// Path parameters captured by the router for the matched route.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PathParams {
    inner: HashMap<String, String>,
}

impl PathParams {
    pub fn new(inner: HashMap<String, String>) -> Self {
        Self { inner }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.inner.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn as_map(&self) -> &HashMap<String, String> {
        &self.inner
    }

    pub fn into_map(self) -> HashMap<String, String> {
        self.inner
    }
}

impl FromIterator<(String, String)> for PathParams {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_returns_expected_value() {
        let params: PathParams = [("id".to_string(), "7".to_string())].into_iter().collect();
        assert_eq!(params.get("id"), Some("7"));
        assert_eq!(params.get("missing"), None);
        assert!(!params.is_empty());
    }

    #[test]
    fn default_is_empty() {
        assert!(PathParams::default().is_empty());
        assert!(PathParams::default().into_map().is_empty());
    }
}
