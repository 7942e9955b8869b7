use crate::backend::{Backend, ServerError};
use crate::backup::newest_first;
use crate::notice::Tone;
use crate::panel::{BackupGroup, HistoryView, Panel, NO_SELECTION_LABEL};
use crate::prompt::Prompt;
use log::{debug, error, warn};
use std::time::Instant;

fn log_failure(what: &str, err: &anyhow::Error) {
    match err.downcast_ref::<ServerError>() {
        Some(server) => error!("{}: HTTP {}: {}", what, server.status, server.message),
        None => error!("{}: {:#}", what, err),
    }
}

/// Drives the admin panel: every user action goes through here, talks to the
/// backend and leaves its result on the [`Panel`].
pub struct Controller<B: Backend, P: Prompt> {
    backend: B,
    prompt: P,
    current_file: Option<String>,
    panel: Panel,
}

impl<B: Backend, P: Prompt> Controller<B, P> {
    pub fn new(backend: B, prompt: P) -> Self {
        Controller {
            backend,
            prompt,
            current_file: None,
            panel: Panel::default(),
        }
    }

    pub fn panel(&self) -> &Panel {
        &self.panel
    }

    pub fn current_file(&self) -> Option<&str> {
        self.current_file.as_deref()
    }

    /// Initial screen: nothing selected, file list and history loaded.
    pub fn start(&mut self) {
        self.reset_editor_state();
        self.load_files();
        self.load_backup_history();
    }

    pub fn tick(&mut self, now: Instant) {
        self.panel.tick(now);
    }

    fn notify(&mut self, message: impl Into<String>, tone: Tone) {
        self.panel.status.show(message, tone, Instant::now());
    }

    fn notify_backup(&mut self, message: impl Into<String>, tone: Tone) {
        self.panel.backup_status.show(message, tone, Instant::now());
    }

    pub fn reset_editor_state(&mut self) {
        self.current_file = None;
        self.panel.editor.label = NO_SELECTION_LABEL.to_string();
        self.panel.editor.load(String::new());
        self.panel.set_controls_enabled(false);
        self.panel.files.clear_active();
    }

    pub fn load_files(&mut self) {
        match self.backend.list_files() {
            Ok(files) => {
                debug!("Loaded {} files", files.len());
                self.panel.files.replace(files);
            }
            Err(err) => {
                self.notify("Error loading files!", Tone::Error);
                log_failure("Error loading files", &err);
            }
        }
    }

    pub fn select_file(&mut self, name: &str) {
        self.current_file = Some(name.to_string());
        self.panel.editor.label = name.to_string();
        self.panel.set_controls_enabled(true);
        if !self.panel.files.mark_active(name) {
            warn!("{} is not in the file list", name);
        }

        match self.backend.read_file(name) {
            Ok(content) => self.panel.editor.load(content),
            Err(err) => {
                self.notify(err.to_string(), Tone::Error);
                log_failure(&format!("Error reading {}", name), &err);
                self.panel.editor.load(String::new());
            }
        }
    }

    /// Replaces the editor buffer. Ignored while the editor is disabled.
    pub fn edit_content(&mut self, content: String) -> bool {
        if !self.panel.editor.enabled {
            return false;
        }
        self.panel.editor.content = content;
        true
    }

    pub fn create_file(&mut self) {
        let Some(name) = self
            .prompt
            .prompt("Enter new file name (Ex: config.txt):")
            .filter(|name| !name.is_empty())
        else {
            return;
        };

        if self.panel.files.contains(&name) {
            self.prompt
                .alert("File name already exists. Please choose a different name.");
            return;
        }

        match self.backend.create_file(&name, "") {
            Ok(_) => {
                self.notify(
                    format!("Created empty file \"{}\". Start editing.", name),
                    Tone::Success,
                );
                self.load_files();
                self.select_file(&name);
            }
            Err(err) => {
                self.notify(format!("Error creating file: {}", err), Tone::Error);
                log_failure("Error creating file", &err);
            }
        }
    }

    pub fn save_file(&mut self) {
        let Some(name) = self.current_file.clone() else {
            return;
        };

        match self.backend.update_file(&name, &self.panel.editor.content) {
            Ok(_) => {
                self.panel.editor.pristine = self.panel.editor.content.clone();
                self.notify("File updated successfully.", Tone::Success);
            }
            Err(err) => {
                self.notify(format!("Save error: {}", err), Tone::Error);
                log_failure("Save error", &err);
            }
        }
    }

    pub fn delete_file(&mut self) {
        let Some(name) = self.current_file.clone() else {
            return;
        };
        if !self.prompt.confirm(&format!(
            "Are you sure you want to delete the file \"{}\"?",
            name
        )) {
            return;
        }

        match self.backend.delete_file(&name) {
            Ok(reply) => {
                let message = reply
                    .message
                    .unwrap_or_else(|| format!("File {} deleted successfully.", name));
                self.notify(message, Tone::Success);
                self.reset_editor_state();
                self.load_files();
            }
            Err(err) => {
                self.notify(format!("Delete error: {}", err), Tone::Error);
                log_failure("Delete error", &err);
            }
        }
    }

    pub fn load_backup_history(&mut self) {
        self.panel.history = HistoryView::Loading;
        let history = match self.backend.list_versions() {
            Ok(history) => history,
            Err(err) => {
                self.notify_backup("Error loading backup history!", Tone::Error);
                log_failure("Error loading backup history", &err);
                return;
            }
        };

        if history.is_empty() {
            self.panel.history = HistoryView::Empty;
            return;
        }
        let groups = history
            .into_iter()
            .map(|(base_name, mut versions)| {
                newest_first(&mut versions);
                BackupGroup {
                    base_name,
                    versions,
                    expanded: false,
                }
            })
            .collect();
        self.panel.history = HistoryView::Groups(groups);
    }

    /// Expands or collapses a history group. Returns false for an unknown group.
    pub fn toggle_group(&mut self, base_name: &str) -> bool {
        match self
            .panel
            .history
            .groups_mut()
            .iter_mut()
            .find(|group| group.base_name == base_name)
        {
            Some(group) => {
                group.expanded = !group.expanded;
                true
            }
            None => false,
        }
    }

    /// Restores by version key alone, looking up the group it belongs to.
    pub fn restore_key(&mut self, key: &str) {
        let base_name = self
            .panel
            .history
            .groups()
            .iter()
            .find(|group| group.versions.iter().any(|version| version.key == key))
            .map(|group| group.base_name.clone());
        match base_name {
            Some(base_name) => self.handle_restore(key, &base_name),
            None => self.notify_backup(format!("Unknown version key {}", key), Tone::Error),
        }
    }

    pub fn handle_restore(&mut self, key: &str, base_name: &str) {
        if !self.prompt.confirm(&format!(
            "Are you sure you want to RESTORE file \"{}\" using version key \"{}\"? This will overwrite the current source file.",
            base_name, key
        )) {
            return;
        }

        self.notify_backup(format!("Restoring {}...", base_name), Tone::Info);

        match self.backend.restore_version(key) {
            Ok(reply) => {
                if let Some(restored) = reply.filename.as_deref().filter(|f| *f != base_name) {
                    warn!("The server restored {} while {} was expected", restored, base_name);
                }
                let message = reply
                    .message
                    .unwrap_or_else(|| format!("File {} restored.", base_name));
                self.notify_backup(message, Tone::Success);
                self.load_files();
                self.select_file(base_name);
            }
            Err(err) => {
                self.notify_backup(format!("RESTORE FAILED: {}", err), Tone::Error);
                log_failure("Restore error", &err);
            }
        }
    }
}
