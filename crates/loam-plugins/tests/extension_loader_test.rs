//! Loading real Lua plugins from disk and wiring them into the parser and graph

use async_trait::async_trait;
use loam_config::{LoamConfig, ParserConfig};
use loam_core::{NoteGraph, NoteUri, PropertyValue};
use loam_parser::create_parser;
use loam_plugins::test_utils::{test_plugin_fixture, write_manifest, write_plugin};
use loam_plugins::{
    graph_middleware, load_extensions, parser_extensions, ExtensionError, ExtensionLoader,
    ExtensionRecord, ExtensionResult, ModuleLoader,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tracing_test::traced_test;

fn config_with_timeout(folders: Vec<std::path::PathBuf>, timeout_ms: u64) -> LoamConfig {
    let mut config = LoamConfig::with_plugin_folders(folders);
    if let Some(plugins) = config
        .experimental
        .as_mut()
        .and_then(|e| e.local_plugins.as_mut())
    {
        plugins.load_timeout_ms = Some(timeout_ms);
    }
    config
}

#[tokio::test]
async fn test_no_config_loads_nothing() {
    assert!(load_extensions(&LoamConfig::default()).await.is_empty());
}

#[tokio::test]
async fn test_loads_fixture_plugin() {
    let config = LoamConfig::with_plugin_folders([test_plugin_fixture()]);
    let extensions = load_extensions(&config).await;

    assert_eq!(extensions.len(), 1);
    assert_eq!(extensions[0].name, "Test Plugin");
    assert_eq!(extensions[0].source, test_plugin_fixture());
    assert!(extensions[0].parser.is_some());
    assert!(extensions[0].graph_middleware.is_some());
}

#[tokio::test]
async fn test_fixture_middleware_marks_stored_notes() {
    let config = LoamConfig::with_plugin_folders([test_plugin_fixture()]);
    let extensions = load_extensions(&config).await;

    let mut graph = NoteGraph::with_middleware(graph_middleware(&extensions));
    let parser = create_parser(parser_extensions(&extensions), &ParserConfig::default());
    let uri = NoteUri::file("/path/to/a.md");

    let note = parser.parse(&uri, "just text").unwrap();
    graph.set_note(note).unwrap();

    let stored = graph.get_note(&uri).unwrap();
    assert_eq!(
        stored.property("injectedByMiddleware"),
        Some(&PropertyValue::Bool(true))
    );
}

#[tokio::test]
async fn test_fixture_parser_flags_top_heading() {
    let config = LoamConfig::with_plugin_folders([test_plugin_fixture()]);
    let extensions = load_extensions(&config).await;
    let parser = create_parser(parser_extensions(&extensions), &ParserConfig::default());

    let with_heading = parser
        .parse(
            &NoteUri::file("/path/to/a"),
            "\n# This is a note with header\nand some content",
        )
        .unwrap();
    assert!(with_heading
        .property("hasHeading")
        .is_some_and(PropertyValue::is_truthy));
    assert_eq!(
        with_heading.title.as_deref(),
        Some("This is a note with header")
    );

    let without = parser
        .parse(&NoteUri::file("/path/to/b"), "Only body text\n")
        .unwrap();
    assert_eq!(without.property("hasHeading"), Some(&PropertyValue::Bool(false)));
}

#[tokio::test]
#[traced_test]
async fn test_broken_folders_skipped_with_warning() {
    let root = TempDir::new().unwrap();
    let first = write_plugin(root.path(), "first", r#"return { name = "First" }"#);
    let broken = write_plugin(root.path(), "broken", "this is not lua");
    let shapeless = write_plugin(root.path(), "shapeless", "return { parser = {} }");
    let last = write_plugin(root.path(), "last", r#"return { name = "Last" }"#);
    let missing = root.path().join("missing");

    let config =
        LoamConfig::with_plugin_folders([first, broken, shapeless, missing.clone(), last]);
    let report = ExtensionLoader::new().load(&config).await;

    let names: Vec<_> = report.extensions.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["First", "Last"]);
    assert_eq!(report.skipped.len(), 3);
    assert!(matches!(report.skipped[0], ExtensionError::Load { .. }));
    assert!(matches!(report.skipped[1], ExtensionError::ShapeInvalid { .. }));
    assert!(matches!(
        report.skipped[2],
        ExtensionError::NotFound { ref path } if path == &missing
    ));

    assert!(logs_contain("Skipping plugin"));
    assert!(logs_contain("missing `name`"));
}

#[tokio::test]
#[traced_test]
async fn test_disabled_manifest_is_skipped_quietly() {
    let root = TempDir::new().unwrap();
    let off = write_plugin(root.path(), "off", r#"return { name = "Off" }"#);
    write_manifest(&off, "enabled: false\n");

    let report = ExtensionLoader::new()
        .load(&LoamConfig::with_plugin_folders([off]))
        .await;

    assert!(report.extensions.is_empty());
    assert!(report.skipped[0].is_disabled());
    assert!(!report.has_failures());
    assert!(logs_contain("Skipping disabled plugin"));
    assert!(!logs_contain("Skipping plugin:"));
}

#[tokio::test]
async fn test_plugins_apply_in_configured_order() {
    let root = TempDir::new().unwrap();
    let stamp = |label: &str| {
        format!(
            r#"
return {{
  name = "{label}",
  parser = {{
    before_parse = function(text) return text .. " {label}" end,
  }},
  graph_middleware = function(note)
    note.properties.trail = (note.properties.trail or "") .. "{label}"
    return note
  end,
}}
"#
        )
    };
    let a = write_plugin(root.path(), "a", &stamp("A"));
    let b = write_plugin(root.path(), "b", &stamp("B"));

    let extensions = load_extensions(&LoamConfig::with_plugin_folders([b, a])).await;
    let parser = create_parser(parser_extensions(&extensions), &ParserConfig::default());
    let mut graph = NoteGraph::with_middleware(graph_middleware(&extensions));

    let uri = NoteUri::file("/notes/n.md");
    let note = parser.parse(&uri, "start").unwrap();
    assert_eq!(note.source.text, "start B A");

    let stored = graph.set_note(note).unwrap();
    assert_eq!(stored.property("trail"), Some(&PropertyValue::from("BA")));
}

#[tokio::test]
async fn test_middleware_rejection_keeps_graph_unchanged() {
    let root = TempDir::new().unwrap();
    let gate = write_plugin(
        root.path(),
        "gate",
        r#"
return {
  name = "Draft Gate",
  graph_middleware = function(note)
    if note.properties.draft then return nil, "drafts stay out" end
    return note
  end,
}
"#,
    );

    let extensions = load_extensions(&LoamConfig::with_plugin_folders([gate])).await;
    let parser = create_parser(parser_extensions(&extensions), &ParserConfig::default());
    let mut graph = NoteGraph::with_middleware(graph_middleware(&extensions));

    let uri = NoteUri::file("/notes/draft.md");
    let note = parser
        .parse(&uri, "---\ndraft: true\n---\nsee [[other]]\n")
        .unwrap();
    let err = graph.set_note(note).unwrap_err();

    assert!(err.is_rejection());
    assert_eq!(err.middleware(), "Draft Gate");
    assert!(graph.is_empty());
    assert!(graph
        .links(&NoteUri::file("/notes/other.md"), loam_core::Direction::Backward)
        .is_empty());
}

struct SlowLoader;

#[async_trait]
impl ModuleLoader for SlowLoader {
    async fn load_module(&self, path: &Path) -> ExtensionResult<ExtensionRecord> {
        if path.ends_with("slow") {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
        Ok(ExtensionRecord::new(path.display().to_string(), path))
    }
}

#[tokio::test(start_paused = true)]
async fn test_slow_folder_times_out_without_blocking_others() {
    let config = config_with_timeout(vec!["/p/fast".into(), "/p/slow".into()], 200);
    let report = ExtensionLoader::with_loader(Arc::new(SlowLoader))
        .load(&config)
        .await;

    assert_eq!(report.extensions.len(), 1);
    assert_eq!(report.extensions[0].name, "/p/fast");
    assert!(matches!(
        report.skipped[0],
        ExtensionError::Timeout { timeout, .. } if timeout == Duration::from_millis(200)
    ));
}

#[test]
fn test_timed_out_script_does_not_block_runtime_shutdown() {
    let root = TempDir::new().unwrap();
    let spin = write_plugin(root.path(), "spin", "while true do end");
    let ok = write_plugin(root.path(), "ok", r#"return { name = "Ok" }"#);
    let config = config_with_timeout(vec![spin, ok], 100);

    let (done_tx, done_rx) = std::sync::mpsc::channel();
    std::thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .unwrap();
        let report = runtime.block_on(ExtensionLoader::new().load(&config));
        let names: Vec<String> = report.extensions.iter().map(|r| r.name.clone()).collect();
        let timed_out = matches!(report.skipped.as_slice(), [ExtensionError::Timeout { .. }]);
        drop(report);
        drop(runtime);
        let _ = done_tx.send((names, timed_out));
    });

    let (names, timed_out) = done_rx
        .recv_timeout(Duration::from_secs(10))
        .expect("runtime shutdown blocked by a timed-out plugin");
    assert_eq!(names, vec!["Ok"]);
    assert!(timed_out);
}
