//! Terminal rendering with optional ANSI color.
//!
//! Output is grouped by file. Each diagnostic prints its message plus a
//! one-line snippet of source around its span, when the source is
//! available through the caller-supplied lookup.

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::{DiagnosticSet, Severity};

mod colors {
    pub const ERROR: &str = "\x1b[1;31m";
    pub const WARNING: &str = "\x1b[1;33m";
    pub const INFO: &str = "\x1b[1;36m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const RESET: &str = "\x1b[0m";
}

#[inline]
fn plural_s(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

/// Renders a whole diagnostic set.
pub struct Renderer {
    colors: bool,
}

impl Renderer {
    pub fn new(colors: bool) -> Renderer {
        Renderer { colors }
    }

    fn paint<'a>(&self, code: &'a str) -> &'a str {
        if self.colors {
            code
        } else {
            ""
        }
    }

    fn severity_color(&self, severity: Severity) -> &str {
        match severity {
            Severity::Error => self.paint(colors::ERROR),
            Severity::Warning => self.paint(colors::WARNING),
            Severity::Info => self.paint(colors::INFO),
        }
    }

    /// Write every diagnostic, grouped by file, followed by a summary
    /// line. `source_of` supplies file contents for snippets; returning
    /// `None` skips the snippet for that diagnostic.
    pub fn render<W: Write>(
        &self,
        out: &mut W,
        diagnostics: &DiagnosticSet,
        source_of: &mut dyn FnMut(&Path) -> Option<String>,
    ) -> io::Result<()> {
        let mut by_file: BTreeMap<PathBuf, Vec<&crate::Diagnostic>> = BTreeMap::new();
        for diagnostic in diagnostics.iter() {
            by_file
                .entry(diagnostic.origin.path().to_path_buf())
                .or_default()
                .push(diagnostic);
        }

        for (path, group) in &by_file {
            let shown = if path.as_os_str().is_empty() {
                "(generated)".to_string()
            } else {
                path.display().to_string()
            };
            writeln!(
                out,
                "{}{}{}:",
                self.paint(colors::BOLD),
                shown,
                self.paint(colors::RESET)
            )?;
            let source = source_of(path);
            for diagnostic in group {
                writeln!(
                    out,
                    "  {}{}{}: {}",
                    self.severity_color(diagnostic.severity),
                    diagnostic.severity,
                    self.paint(colors::RESET),
                    diagnostic.message
                )?;
                if let Some(source) = &source {
                    if let Some((line_no, line)) =
                        snippet(source, diagnostic.origin.span.start as usize)
                    {
                        writeln!(
                            out,
                            "    {}{:>4} |{} {}",
                            self.paint(colors::DIM),
                            line_no,
                            self.paint(colors::RESET),
                            line.trim_end()
                        )?;
                    }
                }
            }
        }

        let errors = diagnostics.error_count();
        let warnings = diagnostics.warning_count();
        if errors > 0 || warnings > 0 {
            writeln!(
                out,
                "{} error{}, {} warning{}",
                errors,
                plural_s(errors),
                warnings,
                plural_s(warnings)
            )?;
        }
        Ok(())
    }
}

/// 1-based line number and the full text of the line containing `offset`.
fn snippet(source: &str, offset: usize) -> Option<(usize, &str)> {
    let offset = offset.min(source.len());
    let line_no = source[..offset].bytes().filter(|&b| b == b'\n').count() + 1;
    source.lines().nth(line_no - 1).map(|line| (line_no, line))
}
