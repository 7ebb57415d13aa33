mod classify;
mod lenses;
mod types;

pub use classify::{classify, extract_test_name, is_group_opening, is_test_opening};
pub use lenses::{
    annotate_line, annotate_source, build_annotations, document_lines, LensProvider, LensRegistry,
    ProtractorLenses, PROTRACTOR_LANGUAGES,
};
pub use types::{
    ActionArgs, ActionKind, Annotation, LensPosition, LensRange, Line, MatchVerdict,
    DEBUG_TEST_COMMAND, LENS_COLUMN_SPAN, RUN_TEST_COMMAND,
};
