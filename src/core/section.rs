//! Section-based configuration text.
//!
//! Both package descriptors in the registry and the project manifest use the
//! same small format:
//!
//! ```text
//! [package]
//! repository = https://github.com/g-truc/glm.git
//! interface = true
//!
//! [glfw.core]
//! static = false
//! ```
//!
//! A document is a sequence of sections. A header line starts with `[` and
//! is closed by the first `]`; the trimmed text in between is the section
//! name. Dotted names (`[parent.child]`) declare nested subsections. Every
//! following non-blank line up to the next header is a `key = value` pair,
//! split on the first `=` with both sides trimmed.
//!
//! The parser knows nothing about packages; semantic checks live in
//! [`crate::core::descriptor`] and [`crate::core::manifest`].

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::core::error::ConfigError;

/// What was wrong with a malformed line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("expected a `[section]` header before any key-value pair")]
    MissingHeader,

    #[error("section header is missing its closing `]`")]
    UnterminatedHeader,

    #[error("section name is empty")]
    EmptySectionName,

    #[error("missing `=` between key and value")]
    MissingDelimiter,

    #[error("key is empty")]
    EmptyKey,
}

/// A malformed structured-text document.
#[derive(Debug, Error, Diagnostic)]
#[error("{kind} (line {line})")]
#[diagnostic(code(narcpm::parse))]
pub struct ParseError {
    /// The specific problem.
    pub kind: ParseErrorKind,

    /// 1-based line number.
    pub line: usize,

    #[source_code]
    pub src: NamedSource<String>,

    #[label("here")]
    pub span: SourceSpan,
}

/// A named section: ordered key-value pairs plus nested subsections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    name: String,
    entries: Vec<(String, String)>,
    subsections: Vec<Section>,
}

impl Section {
    /// Create an empty section.
    pub fn new(name: impl Into<String>) -> Self {
        Section {
            name: name.into(),
            entries: Vec::new(),
            subsections: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set a value. A repeated key replaces the earlier value in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Key-value pairs in declaration order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Look up a nested subsection by name.
    pub fn subsection(&self, name: &str) -> Option<&Section> {
        self.subsections.iter().find(|s| s.name == name)
    }

    /// Nested subsections in declaration order.
    pub fn subsections(&self) -> impl Iterator<Item = &Section> {
        self.subsections.iter()
    }

    fn subsection_entry(&mut self, name: &str) -> &mut Section {
        entry_in(&mut self.subsections, name)
    }
}

/// A parsed document: top-level sections in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    sections: Vec<Section>,
}

impl Document {
    /// Parse `text`. `origin` names the source in diagnostics.
    pub fn parse(origin: &str, text: &str) -> Result<Self, ParseError> {
        let mut doc = Document::default();
        // Path of the section currently receiving key-value pairs.
        let mut current: Option<Vec<String>> = None;
        let mut offset = 0;

        for (idx, raw) in text.split_inclusive('\n').enumerate() {
            let line_start = offset;
            offset += raw.len();

            let trimmed = raw.trim();
            if trimmed.is_empty() {
                continue;
            }

            let fail = |kind: ParseErrorKind| ParseError {
                kind,
                line: idx + 1,
                src: NamedSource::new(origin, text.to_string()),
                span: (line_start, raw.trim_end().len()).into(),
            };

            if let Some(rest) = trimmed.strip_prefix('[') {
                let close = rest
                    .find(']')
                    .ok_or_else(|| fail(ParseErrorKind::UnterminatedHeader))?;
                let path = rest[..close]
                    .split('.')
                    .map(|part| part.trim().to_string())
                    .collect::<Vec<_>>();
                if path.iter().any(|part| part.is_empty()) {
                    return Err(fail(ParseErrorKind::EmptySectionName));
                }

                doc.declare(&path);
                current = Some(path);
                continue;
            }

            let path = current
                .as_ref()
                .ok_or_else(|| fail(ParseErrorKind::MissingHeader))?;
            let (key, value) = trimmed
                .split_once('=')
                .ok_or_else(|| fail(ParseErrorKind::MissingDelimiter))?;
            let key = key.trim();
            if key.is_empty() {
                return Err(fail(ParseErrorKind::EmptyKey));
            }

            doc.section_at(path).insert(key, value.trim());
        }

        Ok(doc)
    }

    /// Read and parse a file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.is_file() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::debug!("parsing {}", path.display());
        Ok(Document::parse(&path.display().to_string(), &text)?)
    }

    /// Look up a top-level section.
    pub fn get(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// Top-level sections in declaration order.
    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// A header re-declaring an existing section discards its earlier
    /// key-value pairs; subsections declared by their own headers survive.
    fn declare(&mut self, path: &[String]) {
        self.section_at(path).entries.clear();
    }

    /// Find or create the section at `path`, creating parents as needed.
    fn section_at(&mut self, path: &[String]) -> &mut Section {
        let mut names = path.iter();
        let first = names.next().map(String::as_str).unwrap_or_default();
        let mut section = entry_in(&mut self.sections, first);
        for name in names {
            section = section.subsection_entry(name);
        }
        section
    }
}

impl FromStr for Document {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Document::parse("<string>", s)
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_section(
            f: &mut fmt::Formatter<'_>,
            prefix: &str,
            section: &Section,
        ) -> fmt::Result {
            let name = if prefix.is_empty() {
                section.name.clone()
            } else {
                format!("{}.{}", prefix, section.name)
            };
            writeln!(f, "[{}]", name)?;
            for (key, value) in section.entries() {
                writeln!(f, "{} = {}", key, value)?;
            }
            for sub in section.subsections() {
                write_section(f, &name, sub)?;
            }
            Ok(())
        }

        for section in &self.sections {
            write_section(f, "", section)?;
        }
        Ok(())
    }
}

fn entry_in<'a>(sections: &'a mut Vec<Section>, name: &str) -> &'a mut Section {
    let idx = match sections.iter().position(|s| s.name == name) {
        Some(idx) => idx,
        None => {
            sections.push(Section::new(name));
            sections.len() - 1
        }
    };
    &mut sections[idx]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_section() {
        let doc: Document = "[pkg]\nrepository = http://x\ninterface=true\n".parse().unwrap();

        assert_eq!(doc.len(), 1);
        let pkg = doc.get("pkg").unwrap();
        assert_eq!(pkg.get("repository"), Some("http://x"));
        assert_eq!(pkg.get("interface"), Some("true"));
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let a: Document = "[pkg]\nrepository = http://x\n".parse().unwrap();
        let b: Document = "[pkg]\n  repository =  http://x  \n".parse().unwrap();
        assert_eq!(a, b);

        let c: Document = "  [ pkg ]  \nrepository=http://x".parse().unwrap();
        assert_eq!(a, c);
    }

    #[test]
    fn test_value_split_on_first_equals() {
        let doc: Document = "[pkg]\nrepository = https://host/repo?a=b\n".parse().unwrap();
        assert_eq!(
            doc.get("pkg").unwrap().get("repository"),
            Some("https://host/repo?a=b")
        );
    }

    #[test]
    fn test_missing_header_fails() {
        for input in ["key = value\n", "x", "  \n\n foo\n[pkg]\n", "]["] {
            let err = input.parse::<Document>().unwrap_err();
            assert_eq!(err.kind, ParseErrorKind::MissingHeader, "input: {:?}", input);
        }
    }

    #[test]
    fn test_unterminated_header_fails() {
        let err = "[package\nrepository = x\n".parse::<Document>().unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnterminatedHeader);
        assert_eq!(err.line, 1);
    }

    #[test]
    fn test_missing_delimiter_fails() {
        let err = "[package]\nrepository x\n".parse::<Document>().unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MissingDelimiter);
        assert_eq!(err.line, 2);
    }

    #[test]
    fn test_empty_names_fail() {
        let err = "[]\n".parse::<Document>().unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::EmptySectionName);

        let err = "[a.]\n".parse::<Document>().unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::EmptySectionName);

        let err = "[a]\n = x\n".parse::<Document>().unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::EmptyKey);
    }

    #[test]
    fn test_empty_and_blank_documents() {
        assert!("".parse::<Document>().unwrap().is_empty());
        assert!("  \n\t\n".parse::<Document>().unwrap().is_empty());
    }

    #[test]
    fn test_redeclared_section_last_wins() {
        let doc: Document = "[a]\nx = 1\ny = 2\n[b]\n[a]\nx = 3\n".parse().unwrap();

        let names: Vec<_> = doc.sections().map(|s| s.name()).collect();
        assert_eq!(names, ["a", "b"]);

        let a = doc.get("a").unwrap();
        assert_eq!(a.get("x"), Some("3"));
        assert_eq!(a.get("y"), None);
    }

    #[test]
    fn test_repeated_key_last_wins() {
        let doc: Document = "[a]\nx = 1\nx = 2\n".parse().unwrap();
        let entries: Vec<_> = doc.get("a").unwrap().entries().collect();
        assert_eq!(entries, [("x", "2")]);
    }

    #[test]
    fn test_nested_subsections() {
        let doc: Document = "[glfw]\nstatic = false\n[glfw.core]\nstatic = true\n[glm]\n"
            .parse()
            .unwrap();

        assert_eq!(doc.len(), 2);
        let glfw = doc.get("glfw").unwrap();
        assert_eq!(glfw.get("static"), Some("false"));
        assert_eq!(glfw.subsection("core").unwrap().get("static"), Some("true"));
        assert!(doc.get("glm").unwrap().subsections().next().is_none());
    }

    #[test]
    fn test_subsection_before_parent() {
        let doc: Document = "[a.b]\nk = v\n[a]\nx = 1\n".parse().unwrap();
        let a = doc.get("a").unwrap();
        assert_eq!(a.get("x"), Some("1"));
        assert_eq!(a.subsection("b").unwrap().get("k"), Some("v"));
    }

    #[test]
    fn test_display_reparses() {
        let text = "[a]\nx = 1\n[a.b]\ny = 2\n[c]\n";
        let doc: Document = text.parse().unwrap();
        let again: Document = doc.to_string().parse().unwrap();
        assert_eq!(doc, again);
    }

    #[test]
    fn test_load_missing_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let err = Document::load(&tmp.path().join("nope.config")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }
}
