use crate::backup::BackupVersion;
use crate::notice::Notice;
use std::time::Instant;

pub const NO_SELECTION_LABEL: &str = "Choose or add new file";
pub const NO_FILES_MESSAGE: &str = "No files found.";
pub const LOADING_HISTORY_MESSAGE: &str = "Loading history...";
pub const NO_BACKUPS_MESSAGE: &str = "No backup versions found.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRow {
    pub name: String,
    pub active: bool,
}

#[derive(Debug, Default)]
pub struct FileList {
    pub rows: Vec<FileRow>,
    /// Set once a load returned an empty list.
    pub placeholder: bool,
}

impl FileList {
    pub fn replace(&mut self, names: Vec<String>) {
        self.placeholder = names.is_empty();
        self.rows = names
            .into_iter()
            .map(|name| FileRow {
                name,
                active: false,
            })
            .collect();
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rows.iter().any(|row| row.name == name)
    }

    pub fn clear_active(&mut self) {
        self.rows.iter_mut().for_each(|row| row.active = false);
    }

    /// Returns false when no row carries that name.
    pub fn mark_active(&mut self, name: &str) -> bool {
        self.clear_active();
        match self.rows.iter_mut().find(|row| row.name == name) {
            Some(row) => {
                row.active = true;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, index: usize) -> Option<&FileRow> {
        self.rows.get(index)
    }
}

#[derive(Debug)]
pub struct EditorPane {
    pub label: String,
    pub content: String,
    /// Content as last read from or saved to the server.
    pub pristine: String,
    pub enabled: bool,
}

impl Default for EditorPane {
    fn default() -> Self {
        EditorPane {
            label: NO_SELECTION_LABEL.to_string(),
            content: String::new(),
            pristine: String::new(),
            enabled: false,
        }
    }
}

impl EditorPane {
    pub fn load(&mut self, content: String) {
        self.pristine = content.clone();
        self.content = content;
    }

    pub fn is_modified(&self) -> bool {
        self.content != self.pristine
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupGroup {
    pub base_name: String,
    pub versions: Vec<BackupVersion>,
    pub expanded: bool,
}

#[derive(Debug, PartialEq, Eq)]
pub enum HistoryView {
    Loading,
    Empty,
    Groups(Vec<BackupGroup>),
}

impl HistoryView {
    pub fn groups(&self) -> &[BackupGroup] {
        match self {
            HistoryView::Groups(groups) => groups,
            _ => &[],
        }
    }

    pub fn groups_mut(&mut self) -> &mut [BackupGroup] {
        match self {
            HistoryView::Groups(groups) => groups,
            _ => &mut [],
        }
    }
}

/// Everything the admin screen currently shows.
#[derive(Debug)]
pub struct Panel {
    pub files: FileList,
    pub editor: EditorPane,
    pub save_enabled: bool,
    pub delete_enabled: bool,
    pub status: Notice,
    pub history: HistoryView,
    pub backup_status: Notice,
}

impl Default for Panel {
    fn default() -> Self {
        Panel {
            files: FileList::default(),
            editor: EditorPane::default(),
            save_enabled: false,
            delete_enabled: false,
            status: Notice::default(),
            history: HistoryView::Loading,
            backup_status: Notice::default(),
        }
    }
}

impl Panel {
    pub fn set_controls_enabled(&mut self, enabled: bool) {
        self.editor.enabled = enabled;
        self.save_enabled = enabled;
        self.delete_enabled = enabled;
    }

    pub fn tick(&mut self, now: Instant) {
        self.status.tick(now);
        self.backup_status.tick(now);
    }
}
