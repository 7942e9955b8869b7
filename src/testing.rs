//! Test doubles: an in-memory backend, a scripted prompt and a fake of the
//! admin REST API served over HTTP.

use crate::backend::{Backend, Reply, ServerError};
use crate::backup::{BackupVersion, VersionHistory};
use crate::prompt::Prompt;
use anyhow::{bail, Result};
use serde_json::{json, Value};
use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::net::SocketAddr;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use time::OffsetDateTime;
use warp::http::StatusCode;
use warp::{Filter, Reply as _};

#[derive(Default)]
struct MemoryState {
    files: BTreeMap<String, String>,
    history: VersionHistory,
    snapshots: BTreeMap<String, String>,
    offline: bool,
}

/// Backend keeping everything in memory and recording each call.
#[derive(Default)]
pub struct MemoryBackend {
    state: RefCell<MemoryState>,
    calls: RefCell<Vec<String>>,
}

impl MemoryBackend {
    pub fn with_files(files: &[(&str, &str)]) -> Self {
        let backend = MemoryBackend::default();
        for (name, content) in files {
            backend
                .state
                .borrow_mut()
                .files
                .insert(name.to_string(), content.to_string());
        }
        backend
    }

    pub fn add_version(&self, base: &str, key: &str, last_modified: OffsetDateTime, content: &str) {
        let mut state = self.state.borrow_mut();
        state
            .history
            .entry(base.to_string())
            .or_default()
            .push(BackupVersion {
                key: key.to_string(),
                last_modified,
                size: content.len() as u64,
            });
        state.snapshots.insert(key.to_string(), content.to_string());
    }

    pub fn set_offline(&self, offline: bool) {
        self.state.borrow_mut().offline = offline;
    }

    pub fn content(&self, name: &str) -> Option<String> {
        self.state.borrow().files.get(name).cloned()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    fn record(&self, call: String) -> Result<()> {
        self.calls.borrow_mut().push(call);
        if self.state.borrow().offline {
            bail!("connection refused");
        }
        Ok(())
    }

    fn not_found() -> anyhow::Error {
        ServerError {
            status: 404,
            message: "File not found".to_string(),
        }
        .into()
    }
}

impl Backend for MemoryBackend {
    fn list_files(&self) -> Result<Vec<String>> {
        self.record("GET /files".to_string())?;
        Ok(self.state.borrow().files.keys().cloned().collect())
    }

    fn read_file(&self, name: &str) -> Result<String> {
        self.record(format!("GET /file/{}", name))?;
        self.content(name).ok_or_else(Self::not_found)
    }

    fn create_file(&self, name: &str, content: &str) -> Result<Reply> {
        self.record(format!("POST /file/{}", name))?;
        self.state
            .borrow_mut()
            .files
            .insert(name.to_string(), content.to_string());
        Ok(Reply {
            message: Some("File created successfully.".to_string()),
            filename: Some(name.to_string()),
        })
    }

    fn update_file(&self, name: &str, content: &str) -> Result<Reply> {
        self.record(format!("PUT /file/{}", name))?;
        self.state
            .borrow_mut()
            .files
            .insert(name.to_string(), content.to_string());
        Ok(Reply {
            message: Some("File updated successfully.".to_string()),
            filename: Some(name.to_string()),
        })
    }

    fn delete_file(&self, name: &str) -> Result<Reply> {
        self.record(format!("DELETE /file/{}", name))?;
        match self.state.borrow_mut().files.remove(name) {
            Some(_) => Ok(Reply {
                message: Some(format!("File {} deleted successfully.", name)),
                ..Reply::default()
            }),
            None => Err(Self::not_found()),
        }
    }

    fn list_versions(&self) -> Result<VersionHistory> {
        self.record("GET /backup/versions".to_string())?;
        Ok(self.state.borrow().history.clone())
    }

    fn restore_version(&self, key: &str) -> Result<Reply> {
        self.record(format!("POST /backup/restore/{}", key))?;
        let mut state = self.state.borrow_mut();
        let base = state
            .history
            .iter()
            .find(|(_, versions)| versions.iter().any(|v| v.key == key))
            .map(|(base, _)| base.clone());
        let (Some(base), Some(content)) = (base, state.snapshots.get(key).cloned()) else {
            return Err(ServerError {
                status: 500,
                message: format!("Restore failed for {}: object not found", key),
            }
            .into());
        };
        state.files.insert(base.clone(), content);
        Ok(Reply {
            message: Some(format!(
                "File {} restored successfully from backup key {}.",
                base, key
            )),
            filename: Some(base),
        })
    }
}

#[derive(Default)]
struct Script {
    answers: VecDeque<Option<String>>,
    confirmations: VecDeque<bool>,
    alerts: Vec<String>,
    questions: Vec<String>,
}

/// Prompt answering from a queue. Clones share the same script.
#[derive(Clone, Default)]
pub struct ScriptedPrompt {
    script: Rc<RefCell<Script>>,
}

impl ScriptedPrompt {
    pub fn answer(&self, answer: Option<&str>) -> &Self {
        self.script
            .borrow_mut()
            .answers
            .push_back(answer.map(str::to_string));
        self
    }

    pub fn confirm_with(&self, accepted: bool) -> &Self {
        self.script.borrow_mut().confirmations.push_back(accepted);
        self
    }

    pub fn alerts(&self) -> Vec<String> {
        self.script.borrow().alerts.clone()
    }

    pub fn questions(&self) -> Vec<String> {
        self.script.borrow().questions.clone()
    }
}

impl Prompt for ScriptedPrompt {
    fn prompt(&mut self, message: &str) -> Option<String> {
        let mut script = self.script.borrow_mut();
        script.questions.push(message.to_string());
        script.answers.pop_front().flatten()
    }

    fn confirm(&mut self, message: &str) -> bool {
        let mut script = self.script.borrow_mut();
        script.questions.push(message.to_string());
        script.confirmations.pop_front().unwrap_or(false)
    }

    fn alert(&mut self, message: &str) {
        self.script.borrow_mut().alerts.push(message.to_string());
    }
}

#[derive(Default)]
struct FakeState {
    files: BTreeMap<String, String>,
    /// key -> (last_modified, content)
    versions: BTreeMap<String, (String, String)>,
}

type Store = Arc<Mutex<FakeState>>;

/// The admin REST API on an ephemeral local port, backed by a map.
pub struct FakeServer {
    addr: SocketAddr,
    store: Store,
    hits: Arc<AtomicUsize>,
}

fn decode(segment: &str) -> String {
    percent_encoding::percent_decode_str(segment)
        .decode_utf8_lossy()
        .into_owned()
}

fn json_reply(value: Value, status: StatusCode) -> warp::reply::Response {
    warp::reply::with_status(warp::reply::json(&value), status).into_response()
}

fn not_found() -> warp::reply::Response {
    json_reply(json!({"error": "File not found"}), StatusCode::NOT_FOUND)
}

impl FakeServer {
    pub fn start() -> Self {
        let store = Store::default();
        let hits = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = std::sync::mpsc::channel();

        let server_store = store.clone();
        let server_hits = hits.clone();
        std::thread::spawn(move || {
            let store = server_store;
            let with_store = warp::any().map(move || store.clone());

            let list = warp::path!("api" / "files")
                .and(warp::get())
                .and(with_store.clone())
                .map(|store: Store| {
                    let state = store.lock().unwrap();
                    let files: Vec<&String> = state.files.keys().collect();
                    json_reply(json!({ "files": files }), StatusCode::OK)
                });

            let read = warp::path!("api" / "file" / String)
                .and(warp::get())
                .and(with_store.clone())
                .map(|name: String, store: Store| {
                    let name = decode(&name);
                    if name == "broken.bin" {
                        return warp::reply::with_status("boom", StatusCode::INTERNAL_SERVER_ERROR)
                            .into_response();
                    }
                    match store.lock().unwrap().files.get(&name) {
                        Some(content) => json_reply(
                            json!({ "filename": name, "content": content }),
                            StatusCode::OK,
                        ),
                        None => not_found(),
                    }
                });

            let write = warp::path!("api" / "file" / String)
                .and(warp::post().or(warp::put()).unify())
                .and(warp::body::json())
                .and(with_store.clone())
                .map(|name: String, body: Value, store: Store| {
                    let name = decode(&name);
                    let content = body["content"].as_str().unwrap_or_default().to_string();
                    let is_new = store.lock().unwrap().files.insert(name.clone(), content).is_none();
                    let message = if is_new {
                        "File created successfully."
                    } else {
                        "File updated successfully."
                    };
                    json_reply(json!({ "message": message, "filename": name }), StatusCode::OK)
                });

            let delete = warp::path!("api" / "file" / String)
                .and(warp::delete())
                .and(with_store.clone())
                .map(|name: String, store: Store| {
                    let name = decode(&name);
                    match store.lock().unwrap().files.remove(&name) {
                        Some(_) => json_reply(
                            json!({ "message": format!("File {} deleted successfully.", name) }),
                            StatusCode::OK,
                        ),
                        None => not_found(),
                    }
                });

            let versions = warp::path!("api" / "backup" / "versions")
                .and(warp::get())
                .and(with_store.clone())
                .map(|store: Store| {
                    let state = store.lock().unwrap();
                    let mut grouped = serde_json::Map::new();
                    for (key, (last_modified, content)) in &state.versions {
                        grouped.insert(
                            key.clone(),
                            json!([{
                                "key": key,
                                "last_modified": last_modified,
                                "size": content.len(),
                            }]),
                        );
                    }
                    json_reply(Value::Object(grouped), StatusCode::OK)
                });

            let restore = warp::path!("api" / "backup" / "restore" / String)
                .and(warp::post())
                .and(with_store)
                .map(|key: String, store: Store| {
                    let key = decode(&key);
                    let mut state = store.lock().unwrap();
                    let Some((_, content)) = state.versions.get(&key).cloned() else {
                        return json_reply(
                            json!({ "error": format!("Restore failed for {}: not found", key) }),
                            StatusCode::INTERNAL_SERVER_ERROR,
                        );
                    };
                    let base = key.rsplit('/').next().unwrap_or(&key).to_string();
                    state.files.insert(base.clone(), content);
                    json_reply(
                        json!({
                            "message": format!("File {} restored successfully from backup key {}.", base, key),
                            "filename": base,
                        }),
                        StatusCode::OK,
                    )
                });

            let routes = list
                .or(read)
                .unify()
                .or(write)
                .unify()
                .or(delete)
                .unify()
                .or(versions)
                .unify()
                .or(restore)
                .unify()
                .with(warp::log::custom(move |_| {
                    server_hits.fetch_add(1, Ordering::SeqCst);
                }));

            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            runtime.block_on(async move {
                let (addr, server) = warp::serve(routes).bind_ephemeral(([127, 0, 0, 1], 0));
                tx.send(addr).unwrap();
                server.await;
            });
        });

        FakeServer {
            addr: rx.recv().unwrap(),
            store,
            hits,
        }
    }

    pub fn api_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    pub fn add_file(&self, name: &str, content: &str) {
        self.store
            .lock()
            .unwrap()
            .files
            .insert(name.to_string(), content.to_string());
    }

    pub fn add_version(&self, key: &str, last_modified: &str, content: &str) {
        self.store.lock().unwrap().versions.insert(
            key.to_string(),
            (last_modified.to_string(), content.to_string()),
        );
    }

    pub fn requests(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}
