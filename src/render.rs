use crate::backup::{format_bytes, format_timestamp};
use crate::notice::Notice;
use crate::panel::{
    HistoryView, Panel, LOADING_HISTORY_MESSAGE, NO_BACKUPS_MESSAGE, NO_FILES_MESSAGE,
};
use std::io::{self, Write};

fn notice(out: &mut impl Write, notice: &Notice) -> io::Result<()> {
    if let Some((text, tone)) = notice.current() {
        writeln!(out, "[{}] {}", tone.label(), text)?;
    }
    Ok(())
}

pub fn files(out: &mut impl Write, panel: &Panel) -> io::Result<()> {
    writeln!(out, "Files")?;
    if panel.files.placeholder {
        writeln!(out, "    {}", NO_FILES_MESSAGE)?;
    }
    for (index, row) in panel.files.rows.iter().enumerate() {
        let marker = if row.active { '>' } else { ' ' };
        writeln!(out, "  {} {:>2}. {}", marker, index + 1, row.name)?;
    }
    Ok(())
}

pub fn editor(out: &mut impl Write, panel: &Panel) -> io::Result<()> {
    let editor = &panel.editor;
    let mut flags = Vec::new();
    if !editor.enabled {
        flags.push("read-only");
    }
    if editor.is_modified() {
        flags.push("modified");
    }
    if flags.is_empty() {
        writeln!(out, "== {} ==", editor.label)?;
    } else {
        writeln!(out, "== {} ({}) ==", editor.label, flags.join(", "))?;
    }
    for (number, line) in editor.content.lines().enumerate() {
        writeln!(out, "{:>4} | {}", number + 1, line)?;
    }
    Ok(())
}

pub fn history(out: &mut impl Write, panel: &Panel) -> io::Result<()> {
    writeln!(out, "Backup history")?;
    let groups = match &panel.history {
        HistoryView::Loading => return writeln!(out, "    {}", LOADING_HISTORY_MESSAGE),
        HistoryView::Empty => return writeln!(out, "    {}", NO_BACKUPS_MESSAGE),
        HistoryView::Groups(groups) => groups,
    };
    for (index, group) in groups.iter().enumerate() {
        let arrow = if group.expanded { 'v' } else { '>' };
        writeln!(
            out,
            "  {} {:>2}. {} ({} versions)",
            arrow,
            index + 1,
            group.base_name,
            group.versions.len()
        )?;
        if !group.expanded {
            continue;
        }
        for version in &group.versions {
            writeln!(out, "        Key: {}", version)?;
            writeln!(
                out,
                "          Modified: {}  Size: {}",
                format_timestamp(version.last_modified),
                format_bytes(version.size)
            )?;
        }
    }
    Ok(())
}

/// Both status areas, only while visible.
pub fn notices(out: &mut impl Write, panel: &Panel) -> io::Result<()> {
    notice(out, &panel.status)?;
    notice(out, &panel.backup_status)
}
