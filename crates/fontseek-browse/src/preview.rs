//! Hand-off of a chosen font to a preview renderer.

use std::io::Write;
use std::path::Path;

/// Something that shows a font given its file path.
///
/// Rendering is entirely the implementor's business; nothing flows back.
pub trait FontPreview {
    fn preview(&mut self, path: &Path);
}

impl<F> FontPreview for F
where
    F: FnMut(&Path),
{
    fn preview(&mut self, path: &Path) {
        self(path)
    }
}

/// Preview that writes the chosen path on its own line.
#[derive(Debug)]
pub struct PathEcho<W> {
    out: W,
}

impl<W: Write> PathEcho<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl PathEcho<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> FontPreview for PathEcho<W> {
    fn preview(&mut self, path: &Path) {
        if let Err(err) = writeln!(self.out, "{}", path.display()).and_then(|_| self.out.flush()) {
            tracing::warn!(error = %err, "could not write selected font path");
        }
    }
}
