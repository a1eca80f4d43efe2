use pretty_assertions::assert_eq;

use stitch::{DirectiveKind, Document, Origin, SourceKind};

fn fragment(markup: &str) -> Document {
    Document::load(markup, Origin::Inline, false)
}

#[test]
fn root_documents_get_an_envelope() {
    let doc = Document::load("<p>x</p>", Origin::Inline, true);
    assert_eq!(
        doc.serialize().unwrap(),
        "<html><head></head><body><p>x</p></body></html>"
    );
}

#[test]
fn fragments_serialize_without_envelope() {
    let doc = fragment("<div><p>plain</p></div>");
    assert_eq!(doc.serialize().unwrap(), "<div><p>plain</p></div>");
}

#[test]
fn doctype_is_kept_for_roots() {
    let doc = Document::load("<!DOCTYPE html><html><head><title>t</title></head><body></body></html>", Origin::Inline, true);
    assert_eq!(
        doc.serialize().unwrap(),
        "<!DOCTYPE html><html><head><title>t</title></head><body></body></html>"
    );
}

#[test]
fn template_blocks_are_handled_once() {
    let mut doc = fragment(r#"<section type="template" template="t.html"><em>in</em></section>"#);
    let block = doc.next_unhandled_template().expect("template block");
    assert_eq!(block.kind(), DirectiveKind::Template);
    assert_eq!(block.attribute("template").as_deref(), Some("t.html"));
    assert_eq!(block.attribute("input"), None);
    assert!(doc.next_unhandled_template().is_none());
    assert_eq!(doc.handled_count(), 1);
}

#[test]
fn marker_receives_inner_markup() {
    let mut doc = fragment(r#"<section type="template" template="t.html"><em>in</em></section>"#);
    let block = doc.next_unhandled_template().unwrap();
    let inner = block.inner_markup().unwrap();
    assert_eq!(inner, "<em>in</em>");

    assert!(doc.fill_template(&block, r#"<div><section type="innermarker"/></div>"#, &inner));
    assert_eq!(
        doc.serialize().unwrap(),
        r#"<section type="template" template="t.html"><div><em>in</em></div></section>"#
    );
}

#[test]
fn content_swallowed_by_self_closed_marker_is_kept() {
    let mut doc = fragment(r#"<section type="template" template="t.html"><em>in</em></section>"#);
    let block = doc.next_unhandled_template().unwrap();
    assert!(doc.fill_template(&block, r#"<section type="innermarker"/><p>after</p>"#, "<em>in</em>"));
    assert_eq!(
        doc.serialize().unwrap(),
        r#"<section type="template" template="t.html"><em>in</em><p>after</p></section>"#
    );
}

#[test]
fn missing_marker_is_reported() {
    let mut doc = fragment(r#"<section type="template" template="t.html">x</section>"#);
    let block = doc.next_unhandled_template().unwrap();
    assert!(!doc.fill_template(&block, "<p>no marker</p>", "x"));
}

#[test]
fn templates_inside_filled_output_are_already_handled() {
    let mut doc = fragment(
        r#"<section type="template" template="outer.html"><section type="template" template="in.html"></section></section>"#,
    );
    let block = doc.next_unhandled_template().unwrap();
    let inner = block.inner_markup().unwrap();
    assert!(doc.fill_template(
        &block,
        r#"<section type="template" template="wrap.html"><b>done</b></section><section type="innermarker"></section>"#,
        &inner,
    ));
    assert_eq!(doc.handled_count(), 2);

    let next = doc.next_unhandled_template().expect("inner content block");
    assert_eq!(next.attribute("template").as_deref(), Some("in.html"));
    assert!(doc.next_unhandled_template().is_none());
}

#[test]
fn articles_receive_content_by_id() {
    let doc = Document::load(
        r#"<main><article id="intro"><h2>Intro</h2></article><article id="other"></article><article></article></main>"#,
        Origin::Inline,
        true,
    );
    let mut asked = Vec::new();
    let embedded = doc
        .embed_articles(|id| {
            asked.push(id.to_string());
            Ok::<_, ()>((id == "intro").then(|| "<p>hello</p>".to_string()))
        })
        .unwrap();
    assert_eq!(embedded, 1);
    assert_eq!(asked, vec!["intro", "other"]);
    assert_eq!(
        doc.serialize().unwrap(),
        r#"<html><head></head><body><main><article id="intro"><h2>Intro</h2><p>hello</p></article><article id="other"></article><article></article></main></body></html>"#
    );
}

#[test]
fn repeat_blocks_are_replaced_whole() {
    let doc = fragment(r#"<ul><section type="repeat" input="xs"><li>x</li></section></ul>"#);
    let block = doc.next_repeat().expect("repeat block");
    assert_eq!(block.attribute("input").as_deref(), Some("xs"));
    let inner = block.inner_markup().unwrap();
    block.replace_with(&inner.repeat(2));
    assert_eq!(doc.serialize().unwrap(), "<ul><li>x</li><li>x</li></ul>");
    assert!(doc.next_repeat().is_none());
}

#[test]
fn empty_repeat_removes_block() {
    let doc = fragment(r#"<ul><section type="repeat" input="xs"><li>x</li></section></ul>"#);
    doc.next_repeat().unwrap().replace_with("");
    assert_eq!(doc.serialize().unwrap(), "<ul></ul>");
}

#[test]
fn repeat_blocks_are_found_in_document_order() {
    let doc = fragment(
        r#"<section type="repeat" input="a">1</section><section type="repeat" input="b">2</section>"#,
    );
    assert_eq!(doc.next_repeat().unwrap().attribute("input").as_deref(), Some("a"));
}

#[test]
fn describe_shows_the_opening_tag() {
    let doc = fragment(r#"<section type="repeat" input="users">x</section>"#);
    assert_eq!(
        doc.next_repeat().unwrap().describe(),
        r#"<section type="repeat" input="users">"#
    );
}

#[test]
fn include_tags_survive_html_parsing() {
    let doc = fragment("<p><<<md:intro.md>>></p>");
    assert_eq!(
        doc.serialize().unwrap(),
        "<p>&lt;&lt;&lt;md:intro.md&gt;&gt;&gt;</p>"
    );
}

#[test]
fn protection_leaves_other_angle_brackets_alone() {
    assert_eq!(
        stitch::source::protect_include_tags("a <<<<md:x.md>>> b << c"),
        "a <&lt;&lt;&lt;md:x.md&gt;&gt;&gt; b << c"
    );
    assert_eq!(stitch::source::protect_include_tags("<<<nope>>>"), "<<<nope>>>");
}

#[test]
fn markdown_is_rendered_to_html() {
    assert_eq!(stitch::markdown::to_html("# Hi\n\nsome *text*"), "<h1>Hi</h1>\n<p>some <em>text</em></p>\n");
}

#[test]
fn source_kinds_follow_extensions() {
    assert_eq!(SourceKind::from_path("a/b.md".as_ref()).unwrap(), SourceKind::Markdown);
    assert_eq!(SourceKind::from_path("page.html".as_ref()).unwrap(), SourceKind::Html);
    let err = SourceKind::from_path("notes.txt".as_ref()).unwrap_err();
    assert!(err.to_string().contains("unsupported template type 'txt'"));
    assert_eq!(SourceKind::from_tag_name("md"), Some(SourceKind::Markdown));
    assert_eq!(SourceKind::from_tag_name("txt"), None);
}

#[test]
fn origin_names_inline_text() {
    assert_eq!(Origin::Inline.to_string(), "inline text");
    assert_eq!(Origin::File("pages/a.html".into()).to_string(), "pages/a.html");
}
