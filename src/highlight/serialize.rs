//! HTML serialization of a [`Dom`] subtree.

use super::dom::{Dom, NodeData, NodeId};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements whose text children are written out verbatim.
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "script", "style", "xmp", "iframe", "noembed", "noframes", "plaintext", "noscript",
];

/// Serialize the children of `root` (its inner HTML).
pub fn inner_html(dom: &Dom, root: NodeId) -> String {
    let mut out = String::new();
    for child in dom.children(root) {
        write_node(dom, child, &mut out);
    }
    out
}

fn write_node(dom: &Dom, id: NodeId, out: &mut String) {
    let Some(node) = dom.get(id) else {
        return;
    };

    match &node.data {
        NodeData::Document => {
            for child in dom.children(id) {
                write_node(dom, child, out);
            }
        }
        NodeData::Doctype(name) => {
            out.push_str("<!DOCTYPE ");
            out.push_str(name);
            out.push('>');
        }
        NodeData::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        NodeData::Text(text) => {
            let raw = dom
                .tag_name(node.parent)
                .is_some_and(|tag| RAW_TEXT_ELEMENTS.contains(&tag));
            if raw {
                out.push_str(text);
            } else {
                escape_text(text, out);
            }
        }
        NodeData::Element { name, attrs } => {
            let tag = name.local.as_ref();
            out.push('<');
            out.push_str(tag);
            for attr in attrs {
                out.push(' ');
                if let Some(prefix) = &attr.name.prefix {
                    out.push_str(prefix.as_ref());
                    out.push(':');
                }
                out.push_str(attr.name.local.as_ref());
                out.push_str("=\"");
                escape_attr(&attr.value, out);
                out.push('"');
            }
            out.push('>');

            if VOID_ELEMENTS.contains(&tag) {
                return;
            }
            for child in dom.children(id) {
                write_node(dom, child, out);
            }
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
    }
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}

fn escape_attr(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}
