use url::Url;

use crate::error::SharedError;

/// Helpers for building endpoint URLs on top of a base URL without discarding the base URL's own path.
///
/// ```
/// use agent_shared::UrlAppendHelpers;
///
/// let base: url::Url = "http://kms.local/api/".parse().unwrap();
/// assert_eq!(base.add_path("/key/generate").unwrap().as_str(), "http://kms.local/api/key/generate");
/// assert_eq!(
///     base.add_path("vc-holder/credential/record").unwrap().add_segment("a/b").unwrap().as_str(),
///     "http://kms.local/api/vc-holder/credential/record/a%2Fb"
/// );
/// ```
pub trait UrlAppendHelpers {
    /// Appends every `/`-separated segment of `path`.
    fn add_path(&self, path: &str) -> Result<Url, SharedError>;

    /// Appends a single opaque segment. Reserved characters, `/` included, are percent-encoded.
    fn add_segment(&self, segment: &str) -> Result<Url, SharedError>;
}

impl UrlAppendHelpers for Url {
    fn add_path(&self, path: &str) -> Result<Url, SharedError> {
        let mut url = self.clone();

        url.path_segments_mut()
            .map_err(|_| SharedError::CannotBeABase(self.clone()))?
            .pop_if_empty()
            .extend(path.split('/').filter(|segment| !segment.is_empty()));

        Ok(url)
    }

    fn add_segment(&self, segment: &str) -> Result<Url, SharedError> {
        let mut url = self.clone();

        url.path_segments_mut()
            .map_err(|_| SharedError::CannotBeABase(self.clone()))?
            .pop_if_empty()
            .push(segment);

        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("http://kms.local", "/profile", "http://kms.local/profile")]
    #[case("http://kms.local/", "profile", "http://kms.local/profile")]
    #[case("http://kms.local/api", "/key/generate", "http://kms.local/api/key/generate")]
    #[case("http://kms.local/api/", "/key/generate", "http://kms.local/api/key/generate")]
    fn add_path_keeps_the_base_path(#[case] base: &str, #[case] path: &str, #[case] expected: &str) {
        let base: Url = base.parse().unwrap();

        assert_eq!(base.add_path(path).unwrap().as_str(), expected);
    }

    #[test]
    fn add_segment_encodes_reserved_characters() {
        let base: Url = "http://kms.local/key".parse().unwrap();

        assert_eq!(
            base.add_segment("did:peer:4z#key-0").unwrap().as_str(),
            "http://kms.local/key/did:peer:4z%23key-0"
        );
    }

    #[test]
    fn cannot_be_a_base_urls_are_rejected() {
        let base: Url = "mailto:someone@example.com".parse().unwrap();

        assert!(matches!(base.add_path("profile"), Err(SharedError::CannotBeABase(_))));
    }
}
