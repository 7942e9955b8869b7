use crate::{
    backend::{Backend, Reply, ServerError},
    backup::VersionHistory,
    config::Config,
};
use anyhow::{anyhow, Context, Result};
use log::debug;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use ureq::http::Response;
use ureq::{Agent, Body};
use url::Url;

#[derive(Deserialize)]
struct FileList {
    files: Vec<String>,
}

#[derive(Deserialize)]
struct FileContent {
    content: String,
}

#[derive(Serialize)]
struct Payload<'a> {
    content: &'a str,
}

#[derive(Deserialize, Default)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

pub struct HttpBackend {
    session: Agent,
    base_url: Url,
}

impl HttpBackend {
    pub fn new(config: &Config) -> Result<Self> {
        let base_url = Url::parse(&config.api_url)
            .with_context(|| format!("Invalid API url {}", config.api_url))?;
        if base_url.cannot_be_a_base() {
            return Err(anyhow!("{} cannot be used as an API base url", base_url));
        }
        let agent_config = Agent::config_builder()
            // Error bodies carry the message to show, so statuses are checked by hand
            .http_status_as_error(false)
            .timeout_global(config.timeout_secs.map(Duration::from_secs))
            .build();
        Ok(Self {
            session: Agent::new_with_config(agent_config),
            base_url,
        })
    }

    /// Joins `segments` under the base url, each one percent-encoded as a single path segment.
    fn endpoint(&self, segments: &[&str]) -> Result<String> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("{} cannot be used as an API base url", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        debug!("Request url: {}", url);
        Ok(url.into())
    }

    fn file_endpoint(&self, name: &str) -> Result<String> {
        self.endpoint(&["file", name])
    }
}

/// Parses a 2xx body as `T`; anything else becomes a [`ServerError`].
fn parse<T: DeserializeOwned>(mut response: Response<Body>, fallback: &str) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        // No size limit on file content
        return response
            .body_mut()
            .with_config()
            .limit(u64::MAX)
            .read_json::<T>()
            .with_context(|| format!("Unexpected response from the server ({})", status));
    }
    let body = response
        .body_mut()
        .read_json::<ErrorBody>()
        .unwrap_or_default();
    Err(ServerError {
        status: status.as_u16(),
        message: body.error.unwrap_or_else(|| fallback.to_string()),
    }
    .into())
}

impl Backend for HttpBackend {
    fn list_files(&self) -> Result<Vec<String>> {
        let url = self.endpoint(&["files"])?;
        let response = self
            .session
            .get(url.as_str())
            .call()
            .with_context(|| format!("Could not reach {}", url))?;
        Ok(parse::<FileList>(response, "Unable to list files.")?.files)
    }

    fn read_file(&self, name: &str) -> Result<String> {
        let url = self.file_endpoint(name)?;
        let response = self
            .session
            .get(url.as_str())
            .call()
            .with_context(|| format!("Could not reach {}", url))?;
        Ok(parse::<FileContent>(response, "Unable to read file content.")?.content)
    }

    fn create_file(&self, name: &str, content: &str) -> Result<Reply> {
        let url = self.file_endpoint(name)?;
        let response = self
            .session
            .post(url.as_str())
            .send_json(Payload { content })
            .with_context(|| format!("Could not reach {}", url))?;
        parse(response, "Unable to create the file.")
    }

    fn update_file(&self, name: &str, content: &str) -> Result<Reply> {
        let url = self.file_endpoint(name)?;
        let response = self
            .session
            .put(url.as_str())
            .send_json(Payload { content })
            .with_context(|| format!("Could not reach {}", url))?;
        parse(response, "Unable to save the file.")
    }

    fn delete_file(&self, name: &str) -> Result<Reply> {
        let url = self.file_endpoint(name)?;
        let response = self
            .session
            .delete(url.as_str())
            .call()
            .with_context(|| format!("Could not reach {}", url))?;
        parse(response, "Unable to delete the file.")
    }

    fn list_versions(&self) -> Result<VersionHistory> {
        let url = self.endpoint(&["backup", "versions"])?;
        let response = self
            .session
            .get(url.as_str())
            .call()
            .with_context(|| format!("Could not reach {}", url))?;
        parse(response, "Unable to list backup versions.")
    }

    fn restore_version(&self, key: &str) -> Result<Reply> {
        let url = self.endpoint(&["backup", "restore", key])?;
        let response = self
            .session
            .post(url.as_str())
            .header("Content-Type", "application/json")
            .send_empty()
            .with_context(|| format!("Could not reach {}", url))?;
        parse(response, "Unable to restore the version.")
    }
}
