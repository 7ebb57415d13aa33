use std::fs;
use std::path::{Path, PathBuf};

// Helper to create a spec file in the temp dir
fn create_spec_file(content: &str, filename: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "protractor_lens_{}_{}.spec.js",
        filename,
        std::process::id()
    ));
    fs::write(&path, content).expect("Failed to write spec file");
    path
}

// Helper to cleanup spec files
fn cleanup_spec_file(path: &Path) {
    let _ = fs::remove_file(path);
}

#[cfg(test)]
mod classifier_tests {
    use protractor_lens::scanner::{classify, MatchVerdict};

    fn matched(name: &str, is_group: bool) -> MatchVerdict {
        MatchVerdict::Matched {
            test_name: name.to_string(),
            is_group,
        }
    }

    #[test]
    fn test_individual_test_line() {
        assert_eq!(
            classify(r#"it("adds two numbers", () => {"#),
            matched("adds two numbers", false)
        );
        assert_eq!(classify("    it ( 'indented' , function () {"), matched("indented", false));
    }

    #[test]
    fn test_group_line() {
        assert_eq!(
            classify("describe('Login flow', function() {"),
            matched("Login flow", true)
        );
        assert_eq!(classify("\tdescribe(\"nested\", () => {"), matched("nested", true));
    }

    #[test]
    fn test_non_test_lines() {
        for line in [
            "",
            "const it = require('it');",
            "expect(page.title()).toBe('x');",
            "it()",
            "it(name, () => {})",
            "xit('pending', () => {})",
            "beforeEach(() => {",
            "describeThing('x')",
            "  // it(\"skip me\")",
        ] {
            assert_eq!(classify(line), MatchVerdict::None, "line {:?}", line);
        }
    }

    #[test]
    fn test_keyword_after_whitespace_matches_regardless_of_context() {
        // Only the prefix is looked at: a test opener inside a block comment
        // or template literal still counts.
        assert_eq!(classify("   it(\"skip me\")"), matched("skip me", false));
        assert_eq!(classify(" * it('in a doc comment')"), MatchVerdict::None);
    }

    #[test]
    fn test_unterminated_name_is_empty() {
        assert_eq!(classify("it(\""), matched("", false));
        assert_eq!(classify("describe('never closed"), matched("", true));
    }

    #[test]
    fn test_name_is_first_quoted_literal() {
        assert_eq!(
            classify(r#"it('first', "second")"#),
            matched("first", false)
        );
        assert_eq!(
            classify(r#"it("won't break", () => {})"#),
            matched("won't break", false)
        );
    }

    #[test]
    fn test_consecutive_matches_are_independent() {
        // Repeated use of the same patterns must not skip every other line.
        let lines = ["it('a')", "it('b')", "it('c')", "describe('d')", "describe('e')"];
        let verdicts: Vec<_> = lines.iter().map(|l| classify(l)).collect();
        assert!(verdicts.iter().all(|v| v.is_match()));
        assert_eq!(verdicts[4], matched("e", true));
    }
}

#[cfg(test)]
mod annotation_tests {
    use super::*;
    use protractor_lens::scanner::{
        annotate_source, build_annotations, ActionArgs, ActionKind, LensRegistry,
        LENS_COLUMN_SPAN,
    };

    #[test]
    fn test_single_test_gets_run_and_debug() {
        let lenses = build_annotations(&[r#"it("adds two numbers", () => {...})"#], "/ws/math.spec.js");

        assert_eq!(lenses.len(), 2);
        assert_eq!(lenses[0].label, "Run test");
        assert_eq!(lenses[0].action, ActionKind::Run);
        assert_eq!(lenses[1].label, "Debug test");
        assert_eq!(lenses[1].action, ActionKind::Debug);

        let expected = ActionArgs {
            test_file: "/ws/math.spec.js".to_string(),
            test_name: "adds two numbers".to_string(),
        };
        assert_eq!(lenses[0].args, expected);
        assert_eq!(lenses[1].args, expected);
        assert_eq!(lenses[0].range, lenses[1].range);
    }

    #[test]
    fn test_group_gets_single_run_tests() {
        let lenses = build_annotations(&["describe('Login flow', function() {"], "login.spec.ts");

        assert_eq!(lenses.len(), 1);
        assert_eq!(lenses[0].label, "Run tests");
        assert_eq!(lenses[0].action, ActionKind::RunGroup);
        assert_eq!(lenses[0].args.test_name, "Login flow");
    }

    #[test]
    fn test_order_follows_lines() {
        let lenses = build_annotations(&["describe('A', ...)", "  it('B', ...)"], "a.spec.js");

        let summary: Vec<(u32, ActionKind, &str)> = lenses
            .iter()
            .map(|l| (l.line(), l.action, l.args.test_name.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (0, ActionKind::RunGroup, "A"),
                (1, ActionKind::Run, "B"),
                (1, ActionKind::Debug, "B"),
            ]
        );
    }

    #[test]
    fn test_range_anchors_line_start() {
        let lenses = build_annotations(&["", "", "    it('x')"], "x.js");
        for lens in &lenses {
            assert_eq!(lens.range.start.line, 2);
            assert_eq!(lens.range.end.line, 2);
            assert_eq!(lens.range.start.character, 0);
            assert_eq!(lens.range.end.character, LENS_COLUMN_SPAN);
        }
    }

    #[test]
    fn test_no_matches_is_empty() {
        assert!(build_annotations::<&str>(&[], "empty.js").is_empty());
        assert!(annotate_source("const a = 1;\nmodule.exports = a;\n", "a.js").is_empty());
    }

    #[test]
    fn test_path_is_kept_verbatim() {
        let path = r"C:\Users\me\My Project\e2e\..\e2e\app.e2e-spec.ts";
        let lenses = annotate_source("it('works')", path);
        assert!(lenses.iter().all(|l| l.args.test_file == path));
    }

    #[test]
    fn test_spec_file_from_disk() {
        let content = r#"import { browser } from 'protractor';

describe('todo app', () => {
  beforeEach(() => browser.get('/'));

  it('adds an item', async () => {
    // ...
  });

  it("removes an item", async () => {});
});
"#;
        let path = create_spec_file(content, "todo");
        let contents = fs::read_to_string(&path).expect("Could not read spec file");
        let lenses = annotate_source(&contents, &path.to_string_lossy());

        assert_eq!(lenses.len(), 5, "1 group lens + 2 per test");
        assert_eq!(lenses[0].line(), 2);
        assert_eq!(lenses[1].line(), 5);
        assert_eq!(lenses[3].line(), 9);
        assert_eq!(lenses[4].args.test_name, "removes an item");

        cleanup_spec_file(&path);
    }

    #[test]
    fn test_registry_languages() {
        let registry = LensRegistry::protractor();
        assert_eq!(registry.languages(), vec!["javascript", "typescript"]);

        let lines = ["it('x')"];
        assert_eq!(registry.provide("typescript", &lines, "x.ts").map(|l| l.len()), Some(2));
        assert_eq!(registry.provide("javascript", &lines, "x.js").map(|l| l.len()), Some(2));
        assert!(registry.provide("python", &lines, "x.py").is_none());
    }

    #[test]
    fn test_annotation_json_shape() {
        let lenses = build_annotations(&["describe('G')"], "g.js");
        let value = serde_json::to_value(&lenses[0]).unwrap();
        assert_eq!(value["action"], "run-group");
        assert_eq!(value["args"]["testFile"], "g.js");
        assert_eq!(value["args"]["testName"], "G");
        assert_eq!(value["range"]["end"]["character"], 5);
    }
}

#[cfg(test)]
mod runner_tests {
    use protractor_lens::config::{resolve_config_path, Settings, DEFAULT_CONFIG_PATH};
    use protractor_lens::runner::{RunRequest, WORKSPACE_FOLDER};
    use protractor_lens::scanner::ActionArgs;
    use std::path::{Path, PathBuf};

    fn args(file: &str, name: &str) -> ActionArgs {
        ActionArgs {
            test_file: file.to_string(),
            test_name: name.to_string(),
        }
    }

    #[test]
    fn test_config_defaults() {
        assert_eq!(resolve_config_path(None, &Settings::default()), DEFAULT_CONFIG_PATH);
        assert_eq!(
            resolve_config_path(Some(Path::new("/ws")), &Settings::default()),
            DEFAULT_CONFIG_PATH
        );
        assert_eq!(
            resolve_config_path(Some(Path::new("/ws")), &Settings::with_config("")),
            DEFAULT_CONFIG_PATH
        );
        assert_eq!(
            resolve_config_path(None, &Settings::with_config("e2e/protractor.conf.js")),
            DEFAULT_CONFIG_PATH
        );
    }

    #[test]
    fn test_config_joined_onto_root() {
        let root = Path::new("/ws");
        assert_eq!(
            resolve_config_path(Some(root), &Settings::with_config("e2e/protractor.conf.js")),
            root.join("e2e/protractor.conf.js").to_string_lossy()
        );
    }

    #[test]
    fn test_command_lines() {
        let request = RunRequest::new(
            &args("/ws/e2e/login.spec.js", "Login flow"),
            Some(PathBuf::from("/ws")),
            "protractor.conf.js".to_string(),
        );

        assert_eq!(
            request.command_lines().unwrap(),
            vec![
                r#"cd "/ws""#.to_string(),
                r#"node_modules/protractor/bin/protractor protractor.conf.js --disableChecks --specs=/ws/e2e/login.spec.js --grep="Login flow""#.to_string(),
            ]
        );
    }

    #[test]
    fn test_command_without_workspace_skips_cd() {
        let request = RunRequest::new(&args("a.js", ""), None, "protractor.conf.js".to_string());
        assert_eq!(request.cd_line(), None);

        let lines = request.command_lines().unwrap();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with(r#"--grep="""#), "empty name greps everything");
    }

    #[test]
    fn test_hostile_name_stays_inside_quotes() {
        let request = RunRequest::new(
            &args("a.js", r#"says "hi" to $USER"#),
            None,
            "protractor.conf.js".to_string(),
        );
        let line = request.protractor_line().unwrap();
        assert!(line.ends_with(r#"--grep="says \"hi\" to \$USER""#), "{}", line);
    }

    #[test]
    fn test_nul_in_path_is_rejected() {
        let request = RunRequest::new(&args("a\0.js", "x"), None, "p.js".to_string());
        assert!(request.protractor_line().is_err());
    }

    #[test]
    fn test_argv() {
        let request = RunRequest::new(&args("a.js", "my test"), None, "p.conf.js".to_string());
        assert_eq!(
            request.argv(),
            vec![
                "node_modules/protractor/bin/protractor",
                "p.conf.js",
                "--disableChecks",
                "--specs=a.js",
                "--grep=my test",
            ]
        );
    }

    #[test]
    fn test_launch_config_relative_config() {
        let request = RunRequest::new(
            &args("/ws/a.spec.js", "does things"),
            Some(PathBuf::from("/ws")),
            "protractor.conf.js".to_string(),
        );
        let config = request.launch_config();

        assert_eq!(config.launch_type, "node");
        assert_eq!(config.request, "launch");
        assert_eq!(config.name, "Debug Jasmine Tests");
        assert_eq!(config.program, "${workspaceFolder}/node_modules/protractor/bin/protractor");
        assert_eq!(
            config.args,
            vec![
                "${workspaceFolder}/protractor.conf.js",
                "--disableChecks",
                "--specs=/ws/a.spec.js",
                "--grep=does things",
            ]
        );
        assert_eq!(
            config.resolve_source_map_locations,
            vec!["${workspaceFolder}/**", "!**/node_modules/**"]
        );
        assert_eq!(config.skip_files, vec!["<node_internals>/**"]);
    }

    #[test]
    fn test_launch_config_absolute_config_kept() {
        let absolute = std::env::temp_dir().join("protractor.conf.js");
        let request = RunRequest::new(
            &args("a.js", "x"),
            None,
            absolute.to_string_lossy().into_owned(),
        );
        assert_eq!(request.launch_config().args[0], absolute.to_string_lossy());
    }

    #[test]
    fn test_launch_config_json() {
        let request = RunRequest::new(&args("a.js", "x"), None, "p.js".to_string());
        let value = serde_json::to_value(request.launch_config()).unwrap();
        assert_eq!(value["type"], "node");
        assert_eq!(value["skipFiles"][0], "<node_internals>/**");
        assert!(value.get("resolveSourceMapLocations").is_some());
        assert!(value.get("launch_type").is_none());
    }

    #[test]
    fn test_resolve_workspace() {
        let request = RunRequest::new(&args("a.js", "x"), None, "p.js".to_string());
        let resolved = request.launch_config().resolve_workspace(Path::new("/ws"));
        assert_eq!(resolved.program, "/ws/node_modules/protractor/bin/protractor");
        assert_eq!(resolved.args[0], "/ws/p.js");
        assert!(!resolved.resolve_source_map_locations[0].contains(WORKSPACE_FOLDER));
    }
}

#[cfg(test)]
mod dispatcher_tests {
    use protractor_lens::runner::{
        CommandDispatcher, ReusingSessionProvider, RunRequest, TerminalSession,
    };
    use protractor_lens::scanner::ActionArgs;
    use protractor_lens::LensError;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    type Transcript = Arc<Mutex<Vec<(usize, String)>>>;

    struct FakeTerminal {
        id: usize,
        transcript: Transcript,
    }

    impl TerminalSession for FakeTerminal {
        fn send_text(&mut self, text: &str) -> Result<(), LensError> {
            self.transcript.lock().unwrap().push((self.id, text.to_string()));
            Ok(())
        }

        fn is_alive(&mut self) -> bool {
            true
        }
    }

    fn fake_provider(transcript: Transcript) -> ReusingSessionProvider {
        let mut next_id = 0;
        ReusingSessionProvider::new(move || {
            next_id += 1;
            Ok(Box::new(FakeTerminal {
                id: next_id,
                transcript: transcript.clone(),
            }) as Box<dyn TerminalSession>)
        })
    }

    fn request(name: &str) -> RunRequest {
        RunRequest::new(
            &ActionArgs {
                test_file: "/ws/a.spec.js".to_string(),
                test_name: name.to_string(),
            },
            Some(PathBuf::from("/ws")),
            "protractor.conf.js".to_string(),
        )
    }

    #[test]
    fn test_first_session_is_reused() {
        let transcript: Transcript = Arc::default();
        let mut dispatcher = CommandDispatcher::new(fake_provider(transcript.clone()));

        dispatcher.dispatch(&request("one")).unwrap();
        dispatcher.dispatch(&request("two")).unwrap();

        assert_eq!(dispatcher.provider().opened(), 1);
        let transcript = transcript.lock().unwrap();
        assert_eq!(transcript.len(), 4, "cd + protractor per dispatch");
        assert!(transcript.iter().all(|(id, _)| *id == 1));
        assert!(transcript[0].1.starts_with("cd "));
        assert!(transcript[1].1.ends_with(r#"--grep="one""#));
        assert!(transcript[3].1.ends_with(r#"--grep="two""#));
    }

    #[test]
    fn test_failed_session_start_is_reported() {
        let mut dispatcher = CommandDispatcher::new(ReusingSessionProvider::new(|| {
            Err(LensError::Session("no shell".to_string()))
        }));
        let err = dispatcher.dispatch(&request("x")).unwrap_err();
        assert!(matches!(err, LensError::Session(_)));
        assert_eq!(dispatcher.provider().opened(), 0);
    }
}
