//! Colored terminal output utilities.

use console::{Style, Term};

/// Terminal output formatter.
///
/// Messages go to stderr; listings written with [`Output::row`] go to stdout
/// so they can be piped.
pub(crate) struct Output {
    term: Term,
    listing: Term,
    green: Style,
    yellow: Style,
    red: Style,
    cyan_bold: Style,
    dim: Style,
}

impl Output {
    /// Create a new output formatter.
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
            listing: Term::stdout(),
            green: Style::new().green(),
            yellow: Style::new().yellow(),
            red: Style::new().red(),
            cyan_bold: Style::new().cyan().bold(),
            dim: Style::new().dim(),
        }
    }

    /// Print an info message.
    pub(crate) fn info(&self, msg: &str) {
        let _ = self.term.write_line(msg);
    }

    /// Print a success message (green).
    pub(crate) fn success(&self, msg: &str) {
        let _ = self.term.write_line(&self.green.apply_to(msg).to_string());
    }

    /// Print a warning message (yellow).
    pub(crate) fn warning(&self, msg: &str) {
        let _ = self.term.write_line(&self.yellow.apply_to(msg).to_string());
    }

    /// Print an error message (red).
    pub(crate) fn error(&self, msg: &str) {
        let _ = self.term.write_line(&self.red.apply_to(msg).to_string());
    }

    /// Print a listing header (cyan bold).
    pub(crate) fn heading(&self, msg: &str) {
        let _ = self
            .listing
            .write_line(&self.cyan_bold.apply_to(msg).to_string());
    }

    /// Print one listing row: an id, a name and a dimmed detail column.
    pub(crate) fn row(&self, id: i64, name: &str, detail: &str) {
        let _ = self.listing.write_line(&format!(
            "{id:>6}  {name:<40} {}",
            self.dim.apply_to(detail)
        ));
    }
}
