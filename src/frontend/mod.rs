use std::path::PathBuf;

use colored::Colorize;

use self::lexer::Span;

pub mod ast;
pub mod intern;
pub mod lexer;
pub mod parser;

#[derive(Debug)]
pub struct SourceFile {
    pub contents: String,
    pub origin: SourceFileOrigin,
}

impl SourceFile {
    pub fn from_memory(contents: impl Into<String>) -> Self {
        Self {
            contents: contents.into(),
            origin: SourceFileOrigin::Memory,
        }
    }

    pub fn value_of_span(&self, span: Span) -> &str {
        &self.contents[span.start..span.end]
    }

    /// 1-based line number of a byte position
    pub fn line_number_for_position(&self, position: usize) -> usize {
        self.contents[..position.min(self.contents.len())]
            .bytes()
            .filter(|b| *b == b'\n')
            .count()
            + 1
    }

    /// 1-based column, counted in characters, of a byte position
    pub fn column_for_position(&self, position: usize) -> usize {
        let position = position.min(self.contents.len());
        let line_start = self.contents[..position]
            .rfind('\n')
            .map(|i| i + 1)
            .unwrap_or(0);

        self.contents[line_start..position].chars().count() + 1
    }

    pub fn format_span_position(&self, span: Span) -> String {
        format!(
            "{}:{}:{}",
            self.origin,
            self.line_number_for_position(span.start),
            self.column_for_position(span.start)
        )
    }

    /// Prints the line containing the start of the span to stderr and
    /// underlines the span (clipped to that line)
    pub fn highlight_span(&self, span: Span) {
        let line_number = self.line_number_for_position(span.start);
        let Some(line) = self.contents.lines().nth(line_number - 1) else {
            return;
        };

        let column = self.column_for_position(span.start);
        let width = self.contents[span.start..span.end.min(self.contents.len())]
            .chars()
            .count()
            .clamp(1, (line.chars().count() + 1).saturating_sub(column).max(1));

        let gutter = line_number.to_string();

        eprintln!("{} {}", format!("{gutter} |").blue(), line);
        eprintln!(
            "{} {}{}",
            format!("{} |", " ".repeat(gutter.len())).blue(),
            " ".repeat(column - 1),
            "^".repeat(width).red()
        );
    }
}

#[derive(Debug)]
pub enum SourceFileOrigin {
    Memory,
    File(PathBuf),
}

impl core::fmt::Display for SourceFileOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceFileOrigin::Memory => f.write_str("<memory>"),
            SourceFileOrigin::File(path) => f.write_fmt(format_args!("{}", path.display())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_are_one_based() {
        let source = SourceFile::from_memory("int main() {\n  return 0;\n}\n");
        let position = source.contents.find("return").unwrap();

        assert_eq!(source.line_number_for_position(position), 2);
        assert_eq!(source.column_for_position(position), 3);
        assert_eq!(
            source.format_span_position(Span::new(position, position + 6)),
            "<memory>:2:3"
        );
    }

    #[test]
    fn columns_count_characters() {
        let source = SourceFile::from_memory("/* été */ int x;");
        let position = source.contents.find("int").unwrap();

        assert_eq!(position, 12);
        assert_eq!(source.column_for_position(position), 11);
    }
}
