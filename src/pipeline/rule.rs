//! Pipeline rule building blocks

use std::fmt;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use super::PipelineError;

/// Asset classes the pipeline knows how to route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssetClass {
    /// Plain HTML pages
    Markup,
    /// The template that becomes the top-level page
    EntryMarkup,
    /// Templates rendered inline into scripts
    Template,
    /// TypeScript sources
    Script,
    /// Sass stylesheets
    Style,
    /// Raster images copied under a content hash
    Image,
    /// Markdown documents
    Document,
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AssetClass::Markup => "markup",
            AssetClass::EntryMarkup => "entry-markup",
            AssetClass::Template => "template",
            AssetClass::Script => "script",
            AssetClass::Style => "style",
            AssetClass::Image => "image",
            AssetClass::Document => "document",
        };
        f.write_str(name)
    }
}

/// File pattern built from a set of extensions.
///
/// Compiles to a case-insensitive regex anchored at the end of the path.
/// The extension list is kept so two patterns can be checked for overlap
/// without reasoning about arbitrary regexes.
#[derive(Debug, Clone)]
pub struct MatchPattern {
    extensions: Vec<String>,
    regex: Regex,
}

impl MatchPattern {
    pub fn extensions(extensions: &[&str]) -> Result<Self, PipelineError> {
        if extensions.is_empty() {
            return Err(PipelineError::EmptyPattern);
        }

        let extensions: Vec<String> = extensions
            .iter()
            .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
            .collect();

        let alternatives = extensions
            .iter()
            .map(|e| regex::escape(e))
            .collect::<Vec<_>>()
            .join("|");
        let regex = Regex::new(&format!(r"(?i)\.(?:{})$", alternatives))?;

        Ok(Self { extensions, regex })
    }

    pub fn is_match(&self, path: &Path) -> bool {
        self.regex.is_match(&path.to_string_lossy())
    }

    /// Whether some file name could match both patterns.
    ///
    /// `d.ts` and `ts` overlap: `types.d.ts` ends with both.
    pub fn overlaps(&self, other: &MatchPattern) -> bool {
        fn suffix_of(long: &str, short: &str) -> bool {
            long == short
                || long
                    .strip_suffix(short)
                    .is_some_and(|head| head.ends_with('.'))
        }

        self.extensions.iter().any(|a| {
            other
                .extensions
                .iter()
                .any(|b| suffix_of(a, b) || suffix_of(b, a))
        })
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

impl Serialize for MatchPattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Path restriction for a rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "path", rename_all = "lowercase")]
pub enum Scope {
    /// Exactly one file
    File(PathBuf),
    /// Everything below a directory
    Dir(PathBuf),
}

impl Scope {
    pub fn contains(&self, path: &Path) -> bool {
        match self {
            Scope::File(file) => path == file,
            Scope::Dir(dir) => path.starts_with(dir),
        }
    }

    /// Every path in `other` is also in `self`
    pub fn covers(&self, other: &Scope) -> bool {
        match (self, other) {
            (Scope::File(a), Scope::File(b)) => a == b,
            (Scope::File(_), Scope::Dir(_)) => false,
            (Scope::Dir(dir), Scope::File(file)) => file.starts_with(dir),
            (Scope::Dir(a), Scope::Dir(b)) => b.starts_with(a),
        }
    }

    pub fn intersects(&self, other: &Scope) -> bool {
        self.covers(other) || other.covers(self)
    }
}

/// One named transform with its options
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransformStep {
    pub name: String,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub options: Map<String, Value>,
}

impl TransformStep {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: Map::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.options.insert(key.to_string(), value.into());
        self
    }
}

/// A file pattern with its scope and the chain applied to matches.
///
/// `chain` is in application order: the first step reads the source file,
/// each later step reads the output of the one before it.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineRule {
    pub name: String,
    pub asset_class: AssetClass,
    pub pattern: MatchPattern,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<Scope>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<Scope>,
    pub chain: Vec<TransformStep>,
}

impl PipelineRule {
    pub fn new(name: impl Into<String>, asset_class: AssetClass, pattern: MatchPattern) -> Self {
        Self {
            name: name.into(),
            asset_class,
            pattern,
            include: Vec::new(),
            exclude: Vec::new(),
            chain: Vec::new(),
        }
    }

    pub fn include(mut self, scope: Scope) -> Self {
        self.include.push(scope);
        self
    }

    pub fn exclude(mut self, scope: Scope) -> Self {
        self.exclude.push(scope);
        self
    }

    /// Append a step to the end of the chain
    pub fn then(mut self, step: TransformStep) -> Self {
        self.chain.push(step);
        self
    }

    pub fn applies_to(&self, path: &Path) -> bool {
        self.pattern.is_match(path)
            && (self.include.is_empty() || self.include.iter().any(|s| s.contains(path)))
            && !self.exclude.iter().any(|s| s.contains(path))
    }

    /// No path can fall inside both rules' scopes
    pub(crate) fn scopes_disjoint(&self, other: &PipelineRule) -> bool {
        fn excluded_by(includes: &[Scope], excludes: &[Scope]) -> bool {
            !includes.is_empty()
                && includes
                    .iter()
                    .all(|inc| excludes.iter().any(|exc| exc.covers(inc)))
        }

        if excluded_by(&self.include, &other.exclude) || excluded_by(&other.include, &self.exclude)
        {
            return true;
        }

        !self.include.is_empty()
            && !other.include.is_empty()
            && !self
                .include
                .iter()
                .any(|a| other.include.iter().any(|b| a.intersects(b)))
    }

    pub(crate) fn conflicts_with(&self, other: &PipelineRule) -> bool {
        self.pattern.overlaps(&other.pattern) && !self.scopes_disjoint(other)
    }
}
