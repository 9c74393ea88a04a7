//! Render collaborator.

use std::io::{self, Write};

use crate::types::Role;

/// Surface that shows the conversation to the user.
///
/// `render` is idempotent: calling it again with the same text shows the
/// same thing. During streaming it receives a growing prefix of the answer.
pub trait Renderer: Send {
    fn render(&mut self, role: Role, text: &str);

    /// User-facing warning (e.g. blank input).
    fn warn(&mut self, message: &str);

    /// User-facing error.
    fn error(&mut self, message: &str);

    /// Called once the current message will not change any more.
    fn end_message(&mut self) {}
}

/// Line-oriented renderer for terminals.
///
/// A terminal cannot redraw earlier output, so assistant text that extends
/// what is already on screen only writes the new suffix.
pub struct TerminalRenderer<W: Write> {
    out: W,
    shown: Option<(Role, String)>,
}

impl TerminalRenderer<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out, shown: None }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn label(role: Role) -> &'static str {
        match role {
            Role::User => "You",
            Role::Assistant => "Bot",
        }
    }

    fn write(&mut self, role: Role, text: &str) -> io::Result<()> {
        match &mut self.shown {
            Some((shown_role, shown))
                if *shown_role == role && text.starts_with(shown.as_str()) =>
            {
                let suffix = &text[shown.len()..];
                self.out.write_all(suffix.as_bytes())?;
                shown.push_str(suffix);
            }
            current => {
                if current.is_some() {
                    writeln!(self.out)?;
                }
                write!(self.out, "{}: {text}", Self::label(role))?;
                *current = Some((role, text.to_string()));
            }
        }
        self.out.flush()
    }

    fn close(&mut self) -> io::Result<()> {
        if self.shown.take().is_some() {
            writeln!(self.out)?;
        }
        self.out.flush()
    }
}

impl<W: Write + Send> Renderer for TerminalRenderer<W> {
    fn render(&mut self, role: Role, text: &str) {
        if let Err(e) = self.write(role, text) {
            tracing::warn!(error = %e, "failed to render");
        }
    }

    fn warn(&mut self, message: &str) {
        let _ = self.close();
        if let Err(e) = writeln!(self.out, "warning: {message}") {
            tracing::warn!(error = %e, "failed to render warning");
        }
    }

    fn error(&mut self, message: &str) {
        let _ = self.close();
        if let Err(e) = writeln!(self.out, "error: {message}") {
            tracing::warn!(error = %e, "failed to render error");
        }
    }

    fn end_message(&mut self) {
        let _ = self.close();
    }
}
