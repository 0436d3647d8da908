use color_eyre::{eyre::eyre, Result};
use url::Url;

use super::types::OwnerId;
use crate::sync::RequestKey;

/// Base URL of the posts feed plus the name of its owner filter parameter.
#[derive(Debug, Clone)]
pub struct Endpoint {
  base: Url,
  filter_param: String,
}

impl Endpoint {
  pub fn new(base_url: &str, filter_param: impl Into<String>) -> Result<Self> {
    let base =
      Url::parse(base_url).map_err(|e| eyre!("Invalid API base URL '{}': {}", base_url, e))?;
    if base.cannot_be_a_base() || !matches!(base.scheme(), "http" | "https") {
      return Err(eyre!("API base URL must be http(s): {}", base_url));
    }

    Ok(Self {
      base,
      filter_param: filter_param.into(),
    })
  }

  pub fn base(&self) -> &Url {
    &self.base
  }

  /// `<base>` when unfiltered, `<base>?<param>=<owner>` otherwise.
  pub fn request_key(&self, owner: Option<OwnerId>) -> RequestKey {
    let mut url = self.base.clone();
    if let Some(owner) = owner {
      url
        .query_pairs_mut()
        .append_pair(&self.filter_param, &owner.to_string());
    }
    RequestKey::new(url.to_string())
  }

  /// Host and port used by the connectivity probe.
  pub fn probe_addr(&self) -> Option<(String, u16)> {
    let host = self.base.host_str()?.to_string();
    let port = self.base.port_or_known_default()?;
    Some((host, port))
  }
}
