//! html5ever `TreeSink` that builds a [`Dom`].

use std::borrow::Cow;
use std::cell::RefCell;

use html5ever::tendril::StrTendril;
use html5ever::tree_builder::{ElementFlags, NodeOrText, QuirksMode, TreeSink};
use html5ever::{Attribute as ParsedAttribute, QualName};

use super::dom::{Attribute, Dom, NodeData, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Handle(NodeId);

/// Tree builder target. The trait hands out `&self`, hence the `RefCell`.
pub struct DomSink {
    dom: RefCell<Dom>,
}

impl DomSink {
    pub fn new() -> Self {
        Self {
            dom: RefCell::new(Dom::new()),
        }
    }

    pub fn into_dom(self) -> Dom {
        self.dom.into_inner()
    }

    fn insert(&self, parent: NodeId, child: NodeOrText<Handle>) {
        let mut dom = self.dom.borrow_mut();
        match child {
            NodeOrText::AppendNode(node) => dom.append(parent, node.0),
            NodeOrText::AppendText(text) => dom.append_text(parent, &text),
        }
    }
}

impl Default for DomSink {
    fn default() -> Self {
        Self::new()
    }
}

fn convert_attrs(attrs: Vec<ParsedAttribute>) -> Vec<Attribute> {
    attrs
        .into_iter()
        .map(|a| Attribute {
            name: a.name,
            value: a.value.to_string(),
        })
        .collect()
}

impl TreeSink for DomSink {
    type Handle = Handle;
    type Output = Self;
    type ElemName<'a>
        = &'a QualName
    where
        Self: 'a;

    fn finish(self) -> Self {
        self
    }

    // Page content is user-edited; repair silently like a browser
    fn parse_error(&self, _msg: Cow<'static, str>) {}

    fn get_document(&self) -> Handle {
        Handle(self.dom.borrow().document())
    }

    fn elem_name<'a>(&'a self, target: &'a Handle) -> &'a QualName {
        static NO_NAME: QualName = QualName {
            prefix: None,
            ns: html5ever::ns!(),
            local: html5ever::local_name!(""),
        };

        let dom = self.dom.borrow();
        match dom.get(target.0).map(|n| &n.data) {
            // SAFETY: element names are never mutated or removed once
            // created, and the tree builder only holds the reference while
            // it inspects the element, before any further node is allocated.
            Some(NodeData::Element { name, .. }) => unsafe {
                std::mem::transmute::<&QualName, &'a QualName>(name)
            },
            _ => &NO_NAME,
        }
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<ParsedAttribute>,
        _flags: ElementFlags,
    ) -> Handle {
        Handle(
            self.dom
                .borrow_mut()
                .create_element(name, convert_attrs(attrs)),
        )
    }

    fn create_comment(&self, text: StrTendril) -> Handle {
        Handle(self.dom.borrow_mut().create_comment(text.to_string()))
    }

    fn create_pi(&self, _target: StrTendril, _data: StrTendril) -> Handle {
        Handle(self.dom.borrow_mut().create_comment(String::new()))
    }

    fn append(&self, parent: &Handle, child: NodeOrText<Handle>) {
        self.insert(parent.0, child);
    }

    fn append_based_on_parent_node(
        &self,
        element: &Handle,
        prev_element: &Handle,
        child: NodeOrText<Handle>,
    ) {
        let parent = self
            .dom
            .borrow()
            .get(element.0)
            .map_or(NodeId::NONE, |n| n.parent);
        if parent.is_some() {
            self.append_before_sibling(element, child);
        } else {
            self.insert(prev_element.0, child);
        }
    }

    fn append_doctype_to_document(
        &self,
        name: StrTendril,
        _public_id: StrTendril,
        _system_id: StrTendril,
    ) {
        let mut dom = self.dom.borrow_mut();
        let doctype = dom.create_doctype(name.to_string());
        let document = dom.document();
        dom.append(document, doctype);
    }

    fn get_template_contents(&self, target: &Handle) -> Handle {
        *target
    }

    fn same_node(&self, x: &Handle, y: &Handle) -> bool {
        x == y
    }

    fn set_quirks_mode(&self, _mode: QuirksMode) {}

    fn append_before_sibling(&self, sibling: &Handle, new_node: NodeOrText<Handle>) {
        let mut dom = self.dom.borrow_mut();
        let node = match new_node {
            NodeOrText::AppendNode(node) => node.0,
            NodeOrText::AppendText(text) => dom.create_text(text.to_string()),
        };
        dom.insert_before(sibling.0, node);
    }

    fn add_attrs_if_missing(&self, target: &Handle, attrs: Vec<ParsedAttribute>) {
        let mut dom = self.dom.borrow_mut();
        if let Some(node) = dom.get_mut(target.0)
            && let NodeData::Element {
                attrs: existing, ..
            } = &mut node.data
        {
            for attr in convert_attrs(attrs) {
                if !existing.iter().any(|a| a.name == attr.name) {
                    existing.push(attr);
                }
            }
        }
    }

    fn remove_from_parent(&self, target: &Handle) {
        self.dom.borrow_mut().detach(target.0);
    }

    fn reparent_children(&self, node: &Handle, new_parent: &Handle) {
        let mut dom = self.dom.borrow_mut();
        let children: Vec<NodeId> = dom.children(node.0).collect();
        for child in children {
            dom.append(new_parent.0, child);
        }
    }
}
