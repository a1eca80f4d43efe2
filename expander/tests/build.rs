use std::fs;
use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use expander::{BuildOptions, ContentIndex, ExpandError, build};

fn site(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    for (name, contents) in files {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }
    dir
}

fn options(root: &Path, pages: &[&str]) -> BuildOptions {
    BuildOptions {
        root: root.to_path_buf(),
        pages: pages.iter().map(PathBuf::from).collect(),
        ..BuildOptions::default()
    }
}

#[test]
fn defaults() {
    let options = BuildOptions::default();
    assert_eq!(options.output, PathBuf::from("out"));
    assert_eq!(options.pages, vec![PathBuf::from("index.html")]);
    assert!(options.dependencies.is_empty());
    assert_eq!(options.content, PathBuf::from("markdown_content"));
    assert!(!options.clean);
    assert_eq!(options.max_depth, 64);
}

#[test]
fn builds_pages_and_copies_dependencies() {
    let dir = site(&[
        (
            "index.html",
            r#"<!DOCTYPE html><section type="template" template="partials/head.html"></section>"#,
        ),
        ("partials/head.html", "<h1>Site</h1>"),
        ("about/team.html", "<p>team</p>"),
        ("assets/css/site.css", "body { margin: 0 }"),
        ("assets/logo.txt", "logo"),
        ("robots.txt", "User-agent: *"),
    ]);
    let mut opts = options(dir.path(), &["index.html", "about/team.html"]);
    opts.dependencies = vec![PathBuf::from("assets"), PathBuf::from("robots.txt")];

    let report = build(&opts).unwrap();
    assert!(report.is_success());
    assert_eq!(report.copied, 3);
    assert_eq!(report.written.len(), 2);

    let out = dir.path().join("out");
    assert_eq!(
        fs::read_to_string(out.join("index.html")).unwrap(),
        r#"<!DOCTYPE html><html><head></head><body><section type="template" template="partials/head.html"><h1>Site</h1></section></body></html>"#
    );
    assert_eq!(
        fs::read_to_string(out.join("about/team.html")).unwrap(),
        "<html><head></head><body><p>team</p></body></html>"
    );
    assert_eq!(
        fs::read_to_string(out.join("assets/css/site.css")).unwrap(),
        "body { margin: 0 }"
    );
    assert!(out.join("assets/logo.txt").is_file());
    assert!(out.join("robots.txt").is_file());
    assert!(!out.join("partials").exists());
}

#[test]
fn failing_page_writes_nothing() {
    let dir = site(&[("index.html", "<p>{{{missing}}}</p>")]);
    let err = build(&options(dir.path(), &["index.html"])).unwrap_err();
    assert!(matches!(err, ExpandError::UnresolvedPlaceholder { .. }));
    assert!(!dir.path().join("out/index.html").exists());
}

#[test]
fn keep_going_builds_the_remaining_pages() {
    let dir = site(&[
        ("bad.html", "<p>{{{missing}}}</p>"),
        ("good.html", "<p>fine</p>"),
    ]);
    let mut opts = options(dir.path(), &["bad.html", "good.html"]);
    opts.keep_going = true;

    let report = build(&opts).unwrap();
    assert!(!report.is_success());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].page, PathBuf::from("bad.html"));
    assert_eq!(report.written, vec![dir.path().join("out").join("good.html")]);
    assert!(!dir.path().join("out/bad.html").exists());
}

#[test]
fn stops_at_the_first_failure_by_default() {
    let dir = site(&[
        ("bad.html", "<p>{{{missing}}}</p>"),
        ("good.html", "<p>fine</p>"),
    ]);
    assert!(build(&options(dir.path(), &["bad.html", "good.html"])).is_err());
    assert!(!dir.path().join("out/good.html").exists());
}

#[test]
fn page_descriptors_render_their_template() {
    let dir = site(&[
        (
            "posts/hello.json",
            r#"{"template": "layouts/post.html", "config": {"title": "Hello", "draft": false}}"#,
        ),
        ("layouts/post.html", "<h1>{{{title}}}</h1><p>{{{draft}}}</p>"),
    ]);
    build(&options(dir.path(), &["posts/hello.json"])).unwrap();
    assert_eq!(
        fs::read_to_string(dir.path().join("out/posts/hello.html")).unwrap(),
        "<html><head></head><body><h1>Hello</h1><p></p></body></html>"
    );
}

#[test]
fn descriptor_without_config_has_an_empty_scope() {
    let dir = site(&[
        ("page.json", r#"{"template": "plain.html"}"#),
        ("plain.html", "<p>{{{title}}}</p>"),
    ]);
    let err = build(&options(dir.path(), &["page.json"])).unwrap_err();
    assert!(matches!(err, ExpandError::UnresolvedPlaceholder { .. }));
}

#[test]
fn malformed_descriptors_fail() {
    let dir = site(&[("page.json", r#"{"config": {}}"#)]);
    let err = build(&options(dir.path(), &["page.json"])).unwrap_err();
    assert!(matches!(err, ExpandError::MalformedInput { .. }));
}

#[test]
fn markdown_pages_are_built() {
    let dir = site(&[("notes.md", "# Notes\n")]);
    build(&options(dir.path(), &["notes.md"])).unwrap();
    assert_eq!(
        fs::read_to_string(dir.path().join("out/notes.md")).unwrap(),
        "<html><head></head><body><h1>Notes</h1>\n</body></html>"
    );
}

#[test]
fn clean_removes_stale_output() {
    let dir = site(&[("index.html", "<p>x</p>"), ("out/stale.html", "old")]);

    build(&options(dir.path(), &["index.html"])).unwrap();
    assert!(dir.path().join("out/stale.html").exists());

    let mut opts = options(dir.path(), &["index.html"]);
    opts.clean = true;
    build(&opts).unwrap();
    assert!(!dir.path().join("out/stale.html").exists());
    assert!(dir.path().join("out/index.html").exists());
}

#[test]
fn paths_outside_the_root_are_rejected() {
    let dir = site(&[("index.html", "<p>x</p>")]);
    for page in ["../index.html", "/etc/passwd", "."] {
        let err = build(&options(dir.path(), &[page])).unwrap_err();
        assert!(
            matches!(err, ExpandError::InvalidPath { .. }),
            "{page}: {err}"
        );
    }

    let mut opts = options(dir.path(), &["index.html"]);
    opts.dependencies = vec![PathBuf::from("../elsewhere")];
    assert!(matches!(
        build(&opts).unwrap_err(),
        ExpandError::InvalidPath { .. }
    ));
}

#[test]
fn missing_pages_and_dependencies_fail() {
    let dir = site(&[("index.html", "<p>x</p>")]);
    assert!(matches!(
        build(&options(dir.path(), &["nope.html"])).unwrap_err(),
        ExpandError::MissingFile { .. }
    ));

    let mut opts = options(dir.path(), &["index.html"]);
    opts.dependencies = vec![PathBuf::from("static")];
    assert!(matches!(
        build(&opts).unwrap_err(),
        ExpandError::MissingFile { .. }
    ));
}

#[test]
fn output_directory_is_never_copied_into_itself() {
    let dir = site(&[("index.html", "<p>x</p>"), ("site/a.txt", "a")]);
    let mut opts = options(dir.path(), &["index.html"]);
    opts.output = PathBuf::from("site/out");
    opts.dependencies = vec![PathBuf::from("site")];

    build(&opts).unwrap();
    build(&opts).unwrap();
    let out = dir.path().join("site/out");
    assert!(out.join("site/a.txt").is_file());
    assert!(!out.join("site/out").exists());
}

#[test]
fn articles_receive_markdown_content() {
    let dir = site(&[
        (
            "index.html",
            r#"<main><article id="intro"><h2>Intro</h2></article><article id="none"></article></main>"#,
        ),
        ("markdown_content/posts/intro.md", "Hello *there*"),
    ]);
    build(&options(dir.path(), &["index.html"])).unwrap();
    assert_eq!(
        fs::read_to_string(dir.path().join("out/index.html")).unwrap(),
        concat!(
            r#"<html><head></head><body><main><article id="intro"><h2>Intro</h2>"#,
            "<p>Hello <em>there</em></p>\n</article>",
            r#"<article id="none"></article></main></body></html>"#
        )
    );
}

#[test]
fn article_content_is_inserted_after_expansion() {
    let dir = site(&[
        (
            "page.json",
            r#"{"template": "layout.html", "config": {"title": "T"}}"#,
        ),
        ("layout.html", r#"<h1>{{{title}}}</h1><article id="about"></article>"#),
        ("notes/about.md", "Plain {{{raw}}}"),
    ]);
    let mut opts = options(dir.path(), &["page.json"]);
    opts.content = PathBuf::from("notes");
    build(&opts).unwrap();
    assert_eq!(
        fs::read_to_string(dir.path().join("out/page.html")).unwrap(),
        "<html><head></head><body><h1>T</h1><article id=\"about\"><p>Plain {{{raw}}}</p>\n</article></body></html>"
    );
}

#[test]
fn content_index_keys_files_by_stem() {
    let dir = site(&[
        ("content/a/intro.md", "first"),
        ("content/b/intro.md", "second"),
        ("content/b/outro.md", "end"),
        ("content/b/notes.txt", "skip"),
    ]);
    let index = ContentIndex::scan(&dir.path().join("content")).unwrap();
    assert_eq!(index.len(), 2);
    assert_eq!(
        index.get("intro"),
        Some(dir.path().join("content/a/intro.md").as_path())
    );
    assert!(index.get("notes").is_none());

    let missing = ContentIndex::scan(&dir.path().join("nowhere")).unwrap();
    assert!(missing.is_empty());
}

#[test]
fn content_directory_must_stay_inside_the_root() {
    let dir = site(&[("index.html", "<p>x</p>")]);
    let mut opts = options(dir.path(), &["index.html"]);
    opts.content = PathBuf::from("../content");
    assert!(matches!(
        build(&opts).unwrap_err(),
        ExpandError::InvalidPath { .. }
    ));
}
