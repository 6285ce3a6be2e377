//! Human-readable command output.
//!
//! Command results are printed to stdout through [`Render`]; logs go to
//! stderr so the two never interleave in pipes.

use std::io::Write;

use crate::provision::{FileAction, InitReport, SetupReport};

/// Trait for human-readable text rendering.
pub trait Render {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()>;
}

/// Render a payload to stdout.
pub fn print<T: Render + ?Sized>(payload: &T) -> std::io::Result<()> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    payload.render_text(&mut handle)?;
    handle.flush()
}

fn action_label(action: FileAction) -> &'static str {
    match action {
        FileAction::Created => "created",
        FileAction::Updated => "updated",
        FileAction::AlreadyExists => "already exists",
        FileAction::Missing => "missing, skipped",
    }
}

impl Render for InitReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        for dir in &self.created_dirs {
            writeln!(w, "Created directory: {}", dir.display())?;
        }
        writeln!(w, ".env:      {}", action_label(self.env_file))?;
        writeln!(w, "nodes.yml: {}", action_label(self.nodes_yml))?;
        Ok(())
    }
}

impl Render for SetupReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(w, "Nodes: {}", self.node_ids.join(", "))?;
        for path in &self.written {
            writeln!(w, "  wrote   {}", path.display())?;
        }
        for path in &self.skipped {
            writeln!(w, "  skipped {} (already exists)", path.display())?;
        }
        writeln!(w, ".env:      {}", action_label(self.env_file))?;
        writeln!(w, "nodes.yml: {}", action_label(self.nodes_yml))?;
        Ok(())
    }
}
