//! Batch entry point
//!
//! Input is an ordered collection of (file path, source text) pairs; output
//! is one generated unit per type declaration, present or absent. Lexing and
//! parsing are pure per-file functions and run on worker threads, with
//! results collected back in input order so diagnostics are deterministic.
//! The inspector is the synchronization barrier: it only runs once every
//! parse task has completed, and a failure there aborts the whole batch.

use crate::ast::TypeDeclaration;
use crate::generator::{self, GeneratedUnit};
use crate::inspector;
use crate::lexer::{Lexer, DEFAULT_SIGIL};
use crate::parser::Parser;
use crate::ui;
use crate::Result;
use crossbeam::channel;

/// One input file for a batch run.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Path used in diagnostics, usually relative to the scanned root
    pub path: String,
    pub contents: String,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }
}

/// Batch configuration.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Annotation sigil, without the colon
    pub sigil: String,
    /// Template text; `None` uses the embedded default
    pub template: Option<String>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            sigil: DEFAULT_SIGIL.to_string(),
            template: None,
        }
    }
}

/// Message sent from parse workers back to the coordinator.
enum ParseMessage {
    Parsed {
        index: usize,
        result: Result<Vec<TypeDeclaration>>,
    },
}

/// Run the full pipeline over a batch of files.
///
/// Returns one [`GeneratedUnit`] per type declaration across all files, in
/// file-input order. The first per-file diagnostic (in input order) or the
/// inspector's global diagnostic aborts the run.
pub fn run(files: &[SourceFile], options: &BatchOptions) -> Result<Vec<GeneratedUnit>> {
    let forest = parse_all(files, &options.sigil)?;

    let spinner = ui::Spinner::new("Validating dependency graph");
    if let Err(e) = inspector::validate(&forest) {
        spinner.finish_and_clear();
        return Err(e);
    }
    spinner.set_message("Rendering units");
    let units = generator::generate(&forest, options.template.as_deref());
    spinner.finish_and_clear();
    units
}

/// Lex and parse every file concurrently, merging the per-file trees into
/// one forest in input order.
pub fn parse_all(files: &[SourceFile], sigil: &str) -> Result<Vec<TypeDeclaration>> {
    if files.is_empty() {
        return Ok(Vec::new());
    }

    let workers = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(files.len());

    let (tx, rx) = channel::unbounded::<ParseMessage>();

    let mut results: Vec<Option<Result<Vec<TypeDeclaration>>>> = Vec::new();
    results.resize_with(files.len(), || None);

    let progress = ui::FileProgress::new(files.len(), "Parsing");
    std::thread::scope(|scope| {
        for worker in 0..workers {
            let tx = tx.clone();
            scope.spawn(move || {
                for index in (worker..files.len()).step_by(workers) {
                    let file = &files[index];
                    let result = parse_file(file, sigil);
                    tracing::debug!(file = %file.path, "parsed");
                    if tx.send(ParseMessage::Parsed { index, result }).is_err() {
                        return;
                    }
                }
            });
        }
        drop(tx);

        for ParseMessage::Parsed { index, result } in rx {
            results[index] = Some(result);
            progress.inc();
        }
    });
    progress.finish();

    let mut forest = Vec::new();
    for result in results {
        // Every slot is filled: each worker either sends its indices or the
        // whole scope panics
        let roots = result.expect("parse worker dropped a file")?;
        forest.extend(roots);
    }
    Ok(forest)
}

fn parse_file(file: &SourceFile, sigil: &str) -> Result<Vec<TypeDeclaration>> {
    let tokens = Lexer::new(&file.contents, &file.path)
        .with_sigil(sigil)
        .tokenize()?;
    Parser::new(&tokens, &file.path).parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_batch_merges_files_and_generates() {
        let files = vec![
            SourceFile::new(
                "app.swift",
                r#"
class App {
    // weft: api = API <- APIProtocol
}
"#,
            ),
            SourceFile::new(
                "api.swift",
                r#"
class API {
    // weft: token <= String
}
"#,
            ),
        ];

        let units = run(&files, &BatchOptions::default()).unwrap();
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].type_name, "App");
        assert_eq!(units[0].file, "app.swift");
        assert!(units[0]
            .text
            .as_deref()
            .unwrap()
            .contains("func api(token: String) -> APIProtocol"));
        assert_eq!(units[1].type_name, "API");
    }

    #[test]
    fn test_units_follow_file_input_order() {
        let files = vec![
            SourceFile::new("b.swift", "class B {\n    // weft: a = A\n}\n"),
            SourceFile::new("a.swift", "class A {\n}\n"),
        ];

        let units = run(&files, &BatchOptions::default()).unwrap();
        let names: Vec<_> = units.iter().map(|u| u.type_name.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
    }

    #[test]
    fn test_first_diagnostic_in_input_order_wins() {
        // Both files are malformed; the earlier file's error is reported
        let files = vec![
            SourceFile::new("one.swift", "class One {\n    // weft: broken =\n}\n"),
            SourceFile::new("two.swift", "class Two {\n    // weft: also =\n}\n"),
        ];

        let err = run(&files, &BatchOptions::default()).unwrap_err();
        match err {
            Error::Parse { file, line, .. } => {
                assert_eq!(file, "one.swift");
                assert_eq!(line, 2);
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_inspector_failure_aborts_the_whole_batch() {
        let files = vec![
            SourceFile::new(
                "a.swift",
                "class A {\n    // weft: b = B\n}\n",
            ),
            SourceFile::new(
                "b.swift",
                "class B {\n    // weft: a = A\n}\n",
            ),
        ];

        assert!(matches!(
            run(&files, &BatchOptions::default()).unwrap_err(),
            Error::CyclicDependency { .. }
        ));
    }

    #[test]
    fn test_custom_sigil_in_batch() {
        let files = vec![SourceFile::new(
            "a.swift",
            "class A {\n    // inject: engine = Engine\n}\n",
        )];

        let options = BatchOptions {
            sigil: "inject".to_string(),
            ..Default::default()
        };
        let units = run(&files, &options).unwrap();
        assert!(units[0].text.is_some());
    }

    #[test]
    fn test_empty_batch() {
        let units = run(&[], &BatchOptions::default()).unwrap();
        assert!(units.is_empty());
    }
}
