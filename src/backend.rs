use crate::backup::VersionHistory;
use anyhow::Result;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{self, Display, Formatter};

/// The admin service's REST surface.
pub trait Backend {
    fn list_files(&self) -> Result<Vec<String>>;
    fn read_file(&self, name: &str) -> Result<String>;
    fn create_file(&self, name: &str, content: &str) -> Result<Reply>;
    fn update_file(&self, name: &str, content: &str) -> Result<Reply>;
    fn delete_file(&self, name: &str) -> Result<Reply>;
    fn list_versions(&self) -> Result<VersionHistory>;
    fn restore_version(&self, key: &str) -> Result<Reply>;
}

impl<T: Backend + ?Sized> Backend for &T {
    fn list_files(&self) -> Result<Vec<String>> {
        (**self).list_files()
    }
    fn read_file(&self, name: &str) -> Result<String> {
        (**self).read_file(name)
    }
    fn create_file(&self, name: &str, content: &str) -> Result<Reply> {
        (**self).create_file(name, content)
    }
    fn update_file(&self, name: &str, content: &str) -> Result<Reply> {
        (**self).update_file(name, content)
    }
    fn delete_file(&self, name: &str) -> Result<Reply> {
        (**self).delete_file(name)
    }
    fn list_versions(&self) -> Result<VersionHistory> {
        (**self).list_versions()
    }
    fn restore_version(&self, key: &str) -> Result<Reply> {
        (**self).restore_version(key)
    }
}

/// Body returned by the mutating endpoints.
#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct Reply {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
}

/// The service answered with a non-2xx status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerError {
    pub status: u16,
    pub message: String,
}

impl Display for ServerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for ServerError {}
