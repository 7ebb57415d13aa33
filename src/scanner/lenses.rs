use super::classify::classify;
use super::types::{ActionArgs, ActionKind, Annotation, Line, MatchVerdict};
use std::collections::HashMap;
use std::sync::Arc;

/// Language identifiers protractor specs are written in.
pub const PROTRACTOR_LANGUAGES: [&str; 2] = ["typescript", "javascript"];

/// Pair each line with its zero-based index.
pub fn document_lines<S: AsRef<str>>(lines: &[S]) -> impl Iterator<Item = Line<'_>> {
    lines.iter().enumerate().map(|(index, text)| Line {
        index,
        text: text.as_ref(),
    })
}

/// Lenses for a single line, in display order.
pub fn annotate_line(line: Line<'_>, document_path: &str) -> Vec<Annotation> {
    let MatchVerdict::Matched {
        test_name,
        is_group,
    } = classify(line.text)
    else {
        return Vec::new();
    };

    let args = ActionArgs {
        test_file: document_path.to_string(),
        test_name,
    };

    if is_group {
        vec![Annotation::new(line.index, ActionKind::RunGroup, args)]
    } else {
        vec![
            Annotation::new(line.index, ActionKind::Run, args.clone()),
            Annotation::new(line.index, ActionKind::Debug, args),
        ]
    }
}

/// Scan a whole document and build its lenses, ordered by line.
pub fn build_annotations<S: AsRef<str>>(lines: &[S], document_path: &str) -> Vec<Annotation> {
    document_lines(lines)
        .flat_map(|line| annotate_line(line, document_path))
        .collect()
}

/// Same as [`build_annotations`] for unsplit document text.
pub fn annotate_source(source: &str, document_path: &str) -> Vec<Annotation> {
    let lines: Vec<&str> = source.lines().collect();
    build_annotations(&lines, document_path)
}

/// Anything that can turn a document into lenses.
pub trait LensProvider: Send + Sync {
    fn provide_lenses(&self, lines: &[&str], document_path: &str) -> Vec<Annotation>;
}

/// Lens provider for protractor/jasmine `it` and `describe` blocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProtractorLenses;

impl LensProvider for ProtractorLenses {
    fn provide_lenses(&self, lines: &[&str], document_path: &str) -> Vec<Annotation> {
        build_annotations(lines, document_path)
    }
}

/// Providers keyed by language identifier.
#[derive(Default, Clone)]
pub struct LensRegistry {
    providers: HashMap<String, Arc<dyn LensProvider>>,
}

impl LensRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with [`ProtractorLenses`] registered for every protractor language.
    pub fn protractor() -> Self {
        let mut registry = Self::new();
        let provider: Arc<dyn LensProvider> = Arc::new(ProtractorLenses);
        for language in PROTRACTOR_LANGUAGES {
            registry.register(language, provider.clone());
        }
        registry
    }

    pub fn register(&mut self, language_id: &str, provider: Arc<dyn LensProvider>) {
        self.providers.insert(language_id.to_string(), provider);
    }

    pub fn supports(&self, language_id: &str) -> bool {
        self.providers.contains_key(language_id)
    }

    pub fn languages(&self) -> Vec<&str> {
        let mut languages: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        languages.sort_unstable();
        languages
    }

    /// `None` when no provider handles `language_id`.
    pub fn provide(
        &self,
        language_id: &str,
        lines: &[&str],
        document_path: &str,
    ) -> Option<Vec<Annotation>> {
        self.providers
            .get(language_id)
            .map(|provider| provider.provide_lenses(lines, document_path))
    }
}

impl std::fmt::Debug for LensRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LensRegistry")
            .field("languages", &self.languages())
            .finish()
    }
}
