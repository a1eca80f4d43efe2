//! The mutable document tree and its directive blocks.
//!
//! Directive blocks are `<section>` elements distinguished by their `type`
//! attribute:
//!
//! ```html
//! <section type="template" template="layout.html" input="data.json">...</section>
//! <section type="repeat" input="users">...</section>
//! <section type="innermarker"></section>
//! ```

pub mod dom;

use std::fmt;
use std::rc::Rc;

use log::debug;
use markup5ever_rcdom::{Handle, RcDom};

use crate::error::MarkupError;
use crate::source::{Origin, protect_include_tags};

const DIRECTIVE_ELEMENT: &str = "section";
const DIRECTIVE_ATTRIBUTE: &str = "type";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    Template,
    Repeat,
    InnerMarker,
}

impl DirectiveKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DirectiveKind::Template => "template",
            DirectiveKind::Repeat => "repeat",
            DirectiveKind::InnerMarker => "innermarker",
        }
    }

    fn matches(self, node: &Handle) -> bool {
        dom::element_name(node) == Some(DIRECTIVE_ELEMENT)
            && dom::attribute(node, DIRECTIVE_ATTRIBUTE).as_deref() == Some(self.as_str())
    }
}

impl fmt::Display for DirectiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A markup tree loaded for a single expansion pass.
pub struct Document {
    /// Keeps the parsed tree alive; `content` points into it.
    _dom: RcDom,
    /// The document node for roots, the fragment holder otherwise.
    content: Handle,
    origin: Origin,
    /// Template blocks already expanded in this tree, including those that
    /// arrived expanded inside a template's output. Holding the handles
    /// keeps their identity stable for the lifetime of the document.
    handled: Vec<Handle>,
}

impl Document {
    /// Load markup into a tree. Roots are parsed as complete documents;
    /// fragments as body content so no envelope is injected.
    pub fn load(markup: &str, origin: Origin, is_root: bool) -> Self {
        let markup = protect_include_tags(markup);
        let (dom, content) = if is_root {
            let dom = dom::parse_root(&markup);
            let content = dom.document.clone();
            (dom, content)
        } else {
            dom::parse_body_fragment(&markup)
        };
        Document {
            _dom: dom,
            content,
            origin,
            handled: Vec::new(),
        }
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Find the first template block not yet handled and mark it handled.
    pub fn next_unhandled_template(&mut self) -> Option<Block> {
        let handled = &self.handled;
        let node = dom::find_first(&self.content, &|node| {
            DirectiveKind::Template.matches(node) && !handled.iter().any(|h| Rc::ptr_eq(h, node))
        })?;
        self.handled.push(node.clone());
        debug!("{}: expanding template block", self.origin);
        Some(Block {
            node,
            kind: DirectiveKind::Template,
        })
    }

    /// Find the first repeat block in document order.
    pub fn next_repeat(&self) -> Option<Block> {
        dom::find_first(&self.content, &|node| DirectiveKind::Repeat.matches(node)).map(|node| {
            Block {
                node,
                kind: DirectiveKind::Repeat,
            }
        })
    }

    /// Number of template blocks marked handled so far.
    pub fn handled_count(&self) -> usize {
        self.handled.len()
    }

    /// Replace the children of template `block` with its expanded template
    /// `markup`, then put `inner` in place of the template's first
    /// `innermarker`. Returns whether a marker was found.
    ///
    /// Template blocks inside `markup` were expanded by the nested parse
    /// that produced it and are marked handled. Blocks inside `inner` are
    /// not, so the caller's content is still expanded in this tree.
    pub fn fill_template(&mut self, block: &Block, markup: &str, inner: &str) -> bool {
        let nodes = dom::fragment_nodes(&protect_include_tags(markup));
        for node in &nodes {
            self.mark_templates_handled(node);
        }
        dom::set_children(&block.node, nodes);
        block.replace_marker(inner)
    }

    fn mark_templates_handled(&mut self, node: &Handle) {
        if DirectiveKind::Template.matches(node) {
            self.handled.push(node.clone());
        }
        for child in node.children.borrow().iter() {
            self.mark_templates_handled(child);
        }
    }

    /// Append content to `<article id="...">` elements, in document order.
    ///
    /// `content` maps an article id to the markup to append, or `None` to
    /// leave the article untouched. Returns how many articles received
    /// content.
    pub fn embed_articles<E>(
        &self,
        mut content: impl FnMut(&str) -> Result<Option<String>, E>,
    ) -> Result<usize, E> {
        let mut embedded = 0;
        for article in dom::find_all(&self.content, &|node| dom::element_name(node) == Some("article")) {
            let Some(id) = dom::attribute(&article, "id").filter(|id| !id.is_empty()) else {
                continue;
            };
            if let Some(markup) = content(&id)? {
                dom::append_children(&article, dom::fragment_nodes(&markup));
                embedded += 1;
            }
        }
        Ok(embedded)
    }

    /// Serialize the tree: the whole document for roots, only the fragment
    /// content otherwise.
    pub fn serialize(&self) -> Result<String, MarkupError> {
        dom::serialize_children(&self.content)
    }
}

/// A directive block found in a [`Document`].
#[derive(Debug, Clone)]
pub struct Block {
    node: Handle,
    kind: DirectiveKind,
}

impl Block {
    pub fn kind(&self) -> DirectiveKind {
        self.kind
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        dom::attribute(&self.node, name)
    }

    /// The opening tag as authored, for error messages.
    pub fn describe(&self) -> String {
        let mut text = format!("<{DIRECTIVE_ELEMENT}");
        if let markup5ever_rcdom::NodeData::Element { attrs, .. } = &self.node.data {
            for attr in attrs.borrow().iter() {
                text.push_str(&format!(" {}=\"{}\"", attr.name.local.as_ref(), attr.value));
            }
        }
        text.push('>');
        text
    }

    pub fn inner_markup(&self) -> Result<String, MarkupError> {
        dom::serialize_children(&self.node)
    }

    /// Replace the block itself with `markup`.
    pub fn replace_with(&self, markup: &str) {
        let nodes = dom::fragment_nodes(&protect_include_tags(markup));
        dom::replace_node(&self.node, nodes);
    }

    /// Replace the first `innermarker` block inside this block with
    /// `markup`. Returns whether a marker was found.
    ///
    /// `<section type="innermarker"/>` is not self-closing in HTML, so the
    /// parser nests any following siblings inside the marker. Those nodes
    /// are kept and placed after the inserted markup.
    fn replace_marker(&self, markup: &str) -> bool {
        let Some(marker) = dom::find_first(&self.node, &|node| DirectiveKind::InnerMarker.matches(node))
        else {
            return false;
        };
        let mut nodes = dom::fragment_nodes(&protect_include_tags(markup));
        nodes.extend(dom::take_children(&marker));
        dom::replace_node(&marker, nodes)
    }
}
