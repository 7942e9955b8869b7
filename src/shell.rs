//! Interactive admin session on the terminal.
//!
//! Each command line is one user action on the panel (clicking a row,
//! pressing Save, expanding a history group...). The action runs to
//! completion, then the affected part of the panel is printed along with any
//! notice still on screen.

use crate::backend::Backend;
use crate::controller::Controller;
use crate::prompt::Prompt;
use crate::render;
use anyhow::{bail, Context, Result};
use diffy::PatchFormatter;
use log::{debug, info};
use path_absolutize::Absolutize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::Command as Process;
use std::str::FromStr;
use std::time::Instant;

const HELP: &str = "\
Commands:
  ls                 reload and show the file list
  open <name|#>      select a file and load its content
  close              deselect the current file
  new                create an empty file
  cat                show the editor content
  edit               edit the content in $EDITOR
  import <path>      replace the editor content with a local file
  export <path>      write the editor content to a local file
  diff               show unsaved changes
  save               upload the editor content
  rm                 delete the selected file
  history            reload and show backup versions
  toggle <name|#>    expand or collapse a backup group
  restore <key>      restore a backup version over its file
  help               this message
  quit               leave";

/// Row reference: a name, or a 1-based position as printed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Name(String),
    Index(usize),
}

impl Target {
    fn parse(arg: &str) -> Target {
        match arg.parse::<usize>() {
            Ok(index) if index > 0 => Target::Index(index),
            _ => Target::Name(arg.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Open(Target),
    Close,
    New,
    Cat,
    Edit,
    Import(PathBuf),
    Export(PathBuf),
    Diff,
    Save,
    Delete,
    History,
    Toggle(Target),
    Restore(String),
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim();
        let (name, arg) = match line.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (line, ""),
        };
        let required = |what: &str| -> Result<String> {
            if arg.is_empty() {
                bail!("{} expects {}", name, what)
            }
            Ok(arg.to_string())
        };

        Ok(match name {
            "ls" | "files" => Command::List,
            "open" | "select" => Command::Open(Target::parse(&required("a file name or number")?)),
            "close" => Command::Close,
            "new" | "create" => Command::New,
            "cat" | "show" => Command::Cat,
            "edit" => Command::Edit,
            "import" => Command::Import(PathBuf::from(required("a path")?)),
            "export" => Command::Export(PathBuf::from(required("a path")?)),
            "diff" => Command::Diff,
            "save" => Command::Save,
            "rm" | "delete" => Command::Delete,
            "history" => Command::History,
            "toggle" => Command::Toggle(Target::parse(&required("a group name or number")?)),
            "restore" => Command::Restore(required("a version key")?),
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => bail!("Unknown command {}, type help for the list", other),
        })
    }
}

pub struct Shell<B: Backend, P: Prompt> {
    controller: Controller<B, P>,
    editor_command: Option<String>,
}

impl<B: Backend, P: Prompt> Shell<B, P> {
    pub fn new(controller: Controller<B, P>, editor_command: Option<String>) -> Self {
        Shell {
            controller,
            editor_command,
        }
    }

    pub fn run(&mut self) -> Result<()> {
        let mut line_editor = DefaultEditor::new().context("Could not initialise the terminal")?;
        self.controller.start();
        self.show(&mut io::stdout(), &[Command::List, Command::History])?;
        println!("Type help for the list of commands");

        loop {
            let line = match line_editor.readline("fileadmin> ") {
                Ok(line) => line,
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break,
                Err(err) => return Err(err).context("Error reading the command line"),
            };
            if line.trim().is_empty() {
                continue;
            }
            let _ = line_editor.add_history_entry(line.as_str());

            let command = match line.parse::<Command>() {
                Ok(command) => command,
                Err(err) => {
                    println!("{}", err);
                    continue;
                }
            };
            if command == Command::Quit {
                break;
            }
            debug!("Running {:?}", command);
            if let Err(err) = self.execute(&command) {
                println!("{:#}", err);
            }
            self.show(&mut io::stdout(), &[command])?;
        }
        Ok(())
    }

    fn resolve_file(&self, target: &Target) -> Result<String> {
        match target {
            Target::Name(name) => Ok(name.clone()),
            Target::Index(index) => self
                .controller
                .panel()
                .files
                .get(index - 1)
                .map(|row| row.name.clone())
                .with_context(|| format!("There is no file number {}", index)),
        }
    }

    fn resolve_group(&self, target: &Target) -> Result<String> {
        match target {
            Target::Name(name) => Ok(name.clone()),
            Target::Index(index) => self
                .controller
                .panel()
                .history
                .groups()
                .get(index - 1)
                .map(|group| group.base_name.clone())
                .with_context(|| format!("There is no backup group number {}", index)),
        }
    }

    pub fn execute(&mut self, command: &Command) -> Result<()> {
        match command {
            Command::List => self.controller.load_files(),
            Command::Open(target) => {
                let name = self.resolve_file(target)?;
                self.controller.select_file(&name);
            }
            Command::Close => self.controller.reset_editor_state(),
            Command::New => self.controller.create_file(),
            Command::Cat | Command::Help | Command::Quit => {}
            Command::Edit => {
                let editor_command = self
                    .editor_command
                    .clone()
                    .context("No editor configured, set $EDITOR or use import")?;
                self.require_selection()?;
                let content =
                    edit_externally(&editor_command, &self.controller.panel().editor.content)?;
                self.controller.edit_content(content);
            }
            Command::Import(path) => {
                self.require_selection()?;
                let path = absolute(path)?;
                let content = std::fs::read_to_string(&path)
                    .with_context(|| format!("Could not read {}", path.display()))?;
                info!("Loaded {} into the editor", path.display());
                self.controller.edit_content(content);
            }
            Command::Export(path) => {
                let path = absolute(path)?;
                std::fs::write(&path, &self.controller.panel().editor.content)
                    .with_context(|| format!("Could not write {}", path.display()))?;
                info!("Editor content written to {}", path.display());
            }
            Command::Diff => {}
            Command::Save => self.controller.save_file(),
            Command::Delete => self.controller.delete_file(),
            Command::History => self.controller.load_backup_history(),
            Command::Toggle(target) => {
                let name = self.resolve_group(target)?;
                if !self.controller.toggle_group(&name) {
                    bail!("No backup group named {}", name);
                }
            }
            Command::Restore(key) => self.controller.restore_key(key),
        }
        Ok(())
    }

    fn require_selection(&self) -> Result<()> {
        if !self.controller.panel().editor.enabled {
            bail!("Select a file first");
        }
        Ok(())
    }

    /// Prints what `commands` changed, then the visible notices.
    pub fn show(&mut self, out: &mut impl Write, commands: &[Command]) -> Result<()> {
        self.controller.tick(Instant::now());
        let panel = self.controller.panel();
        for command in commands {
            match command {
                Command::List | Command::Delete => render::files(out, panel)?,
                Command::Open(_)
                | Command::Close
                | Command::New
                | Command::Cat
                | Command::Edit
                | Command::Import(_)
                | Command::Save => {
                    render::files(out, panel)?;
                    render::editor(out, panel)?;
                }
                Command::Restore(_) => {
                    render::files(out, panel)?;
                    render::editor(out, panel)?;
                    render::history(out, panel)?;
                }
                Command::History | Command::Toggle(_) => render::history(out, panel)?,
                Command::Diff => {
                    let patch = diffy::create_patch(&panel.editor.pristine, &panel.editor.content);
                    if patch.hunks().is_empty() {
                        writeln!(out, "No unsaved changes")?;
                    } else {
                        write!(out, "{}", PatchFormatter::new().with_color().fmt_patch(&patch))?;
                    }
                }
                Command::Help => writeln!(out, "{}", HELP)?,
                Command::Export(_) | Command::Quit => {}
            }
        }
        render::notices(out, panel)?;
        Ok(())
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    Ok(path
        .absolutize()
        .with_context(|| format!("Could not find the absolute location of {}", path.display()))?
        .to_path_buf())
}

/// Opens `content` in the user's editor and returns what was saved.
fn edit_externally(editor_command: &str, content: &str) -> Result<String> {
    let mut file = tempfile::Builder::new()
        .prefix("fileadmin-")
        .suffix(".txt")
        .tempfile()
        .context("Could not create a temporary file to edit")?;
    file.write_all(content.as_bytes())?;
    file.flush()?;

    let mut words = editor_command.split_whitespace();
    let program = words.next().context("Empty editor command")?;
    let status = Process::new(program)
        .args(words)
        .arg(file.path())
        .status()
        .with_context(|| format!("Could not start the editor {}", program))?;
    if !status.success() {
        bail!("The editor exited with {}, content left unchanged", status);
    }
    std::fs::read_to_string(file.path()).context("Could not read back the edited content")
}
