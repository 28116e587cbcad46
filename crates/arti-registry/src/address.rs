//! Registry address selection and endpoint URL construction.

use url::Url;

use arti_config::{Config, DEFAULT_REGISTRY};
use arti_core::{ArtiError, PackageReference};

use crate::RegistryResult;

/// Substring identifying an artifactory entry in the registry search list
pub const REGISTRY_MARKER: &str = "artifactory";

/// Base URL of the artifactory registry, resolved once per resolver
/// instance from the ambient configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryAddress(String);

impl RegistryAddress {
    /// Pick the registry address: the explicit override when configured
    /// and distinct from the system default, otherwise the first search
    /// entry carrying the artifactory marker.
    pub fn from_config(config: &Config) -> RegistryResult<Self> {
        let register = config.registry.register.as_str();
        if !register.is_empty() && register != DEFAULT_REGISTRY {
            return Ok(Self(register.trim_end_matches('/').to_string()));
        }

        config
            .registry
            .search
            .iter()
            .find(|entry| entry.contains(REGISTRY_MARKER))
            .map(|entry| Self(entry.trim_end_matches('/').to_string()))
            .ok_or(ArtiError::RegistryNotFound)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `<registry>/<org>/<repo>.git/info/refs?service=git-upload-pack`
    pub fn refs_url(&self, reference: &PackageReference) -> RegistryResult<String> {
        let mut url = self.base()?;
        url.path_segments_mut()
            .map_err(|_| self.invalid())?
            .pop_if_empty()
            .push(reference.org())
            .push(&format!("{}.git", reference.repo()))
            .push("info")
            .push("refs");
        url.set_query(Some("service=git-upload-pack"));
        Ok(url.to_string())
    }

    /// `<registry>/binaries/<org>/<repo>.git/<target>`, segments
    /// percent-encoded.
    pub fn archive_url(&self, reference: &PackageReference) -> RegistryResult<String> {
        let mut url = self.base()?;
        url.path_segments_mut()
            .map_err(|_| self.invalid())?
            .pop_if_empty()
            .push("binaries")
            .push(reference.org())
            .push(&format!("{}.git", reference.repo()))
            .push(reference.target());
        Ok(url.to_string())
    }

    fn base(&self) -> RegistryResult<Url> {
        Url::parse(&self.0).map_err(|_| self.invalid())
    }

    fn invalid(&self) -> ArtiError {
        ArtiError::InvalidSource {
            reference: self.0.clone(),
            details: Some("registry address is not a valid base URL".to_string()),
        }
    }
}
