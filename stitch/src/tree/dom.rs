//! Thin mutation and serialization helpers over `markup5ever_rcdom`.

use std::rc::Rc;

use html5ever::serialize::{SerializeOpts, TraversalScope, serialize};
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::{LocalName, Namespace, ParseOpts, QualName, parse_document, parse_fragment};
use markup5ever_rcdom::{Handle, NodeData, RcDom, SerializableHandle};

use crate::error::MarkupError;

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Parse a complete HTML document. The parser injects the `html`, `head`
/// and `body` envelope when the markup lacks it.
pub fn parse_root(markup: &str) -> RcDom {
    parse_document(RcDom::default(), ParseOpts::default()).one(StrTendril::from_slice(markup))
}

/// Parse markup as the content of a `<body>`, without any envelope.
///
/// Returns the DOM together with the element holding the parsed nodes.
pub fn parse_body_fragment(markup: &str) -> (RcDom, Handle) {
    let context = QualName::new(None, Namespace::from(HTML_NAMESPACE), LocalName::from("body"));
    let dom = parse_fragment(RcDom::default(), ParseOpts::default(), context, Vec::new())
        .one(StrTendril::from_slice(markup));
    let holder = dom
        .document
        .children
        .borrow()
        .first()
        .cloned()
        .unwrap_or_else(|| dom.document.clone());
    (dom, holder)
}

/// Parse markup into detached nodes ready to be inserted into another tree.
pub fn fragment_nodes(markup: &str) -> Vec<Handle> {
    let (_dom, holder) = parse_body_fragment(markup);
    let nodes = std::mem::take(&mut *holder.children.borrow_mut());
    for node in &nodes {
        node.parent.set(None);
    }
    nodes
}

/// Serialize the children of `node`.
pub fn serialize_children(node: &Handle) -> Result<String, MarkupError> {
    let mut bytes = Vec::new();
    let opts = SerializeOpts {
        traversal_scope: TraversalScope::ChildrenOnly(None),
        ..Default::default()
    };
    serialize(&mut bytes, &SerializableHandle::from(node.clone()), opts)
        .map_err(MarkupError::Serialize)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

pub fn element_name(node: &Handle) -> Option<&str> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.as_ref()),
        _ => None,
    }
}

pub fn attribute(node: &Handle, attr: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|a| a.name.local.as_ref() == attr)
            .map(|a| a.value.to_string()),
        _ => None,
    }
}

/// Depth-first, document-order search for the first node matching `pred`.
pub fn find_first(node: &Handle, pred: &dyn Fn(&Handle) -> bool) -> Option<Handle> {
    for child in node.children.borrow().iter() {
        if pred(child) {
            return Some(child.clone());
        }
        if let Some(found) = find_first(child, pred) {
            return Some(found);
        }
    }
    None
}

/// Every node under `node` matching `pred`, in document order.
pub fn find_all(node: &Handle, pred: &dyn Fn(&Handle) -> bool) -> Vec<Handle> {
    let mut found = Vec::new();
    collect(node, pred, &mut found);
    found
}

fn collect(node: &Handle, pred: &dyn Fn(&Handle) -> bool, found: &mut Vec<Handle>) {
    for child in node.children.borrow().iter() {
        if pred(child) {
            found.push(child.clone());
        }
        collect(child, pred, found);
    }
}

/// Append `nodes` after the existing children of `parent`.
pub fn append_children(parent: &Handle, nodes: Vec<Handle>) {
    for node in &nodes {
        node.parent.set(Some(Rc::downgrade(parent)));
    }
    parent.children.borrow_mut().extend(nodes);
}

/// Replace all children of `parent` with `nodes`.
pub fn set_children(parent: &Handle, nodes: Vec<Handle>) {
    for old in parent.children.borrow().iter() {
        old.parent.set(None);
    }
    for node in &nodes {
        node.parent.set(Some(Rc::downgrade(parent)));
    }
    *parent.children.borrow_mut() = nodes;
}

/// Replace `node` in its parent's child list with `nodes`.
///
/// Returns false when `node` is detached.
pub fn replace_node(node: &Handle, nodes: Vec<Handle>) -> bool {
    let Some(parent) = node.parent.take().and_then(|weak| weak.upgrade()) else {
        return false;
    };
    let mut children = parent.children.borrow_mut();
    let Some(index) = children.iter().position(|c| Rc::ptr_eq(c, node)) else {
        return false;
    };
    for new in &nodes {
        new.parent.set(Some(Rc::downgrade(&parent)));
    }
    children.splice(index..=index, nodes);
    true
}

/// Detach and return all children of `node`.
pub fn take_children(node: &Handle) -> Vec<Handle> {
    let nodes = std::mem::take(&mut *node.children.borrow_mut());
    for child in &nodes {
        child.parent.set(None);
    }
    nodes
}
