use super::dom_forms::{is_radio_input, reset_runtime_state_from_attrs};
use super::html::is_void_tag;
use super::*;

impl Dom {
    pub(crate) fn new() -> Self {
        let root = Node {
            parent: None,
            children: Vec::new(),
            node_type: NodeType::Document,
        };
        Self {
            nodes: vec![root],
            root: NodeId(0),
            id_index: HashMap::new(),
        }
    }

    pub(crate) fn create_node(&mut self, parent: Option<NodeId>, node_type: NodeType) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent,
            children: Vec::new(),
            node_type,
        });
        if let Some(parent_id) = parent {
            self.nodes[parent_id.0].children.push(id);
        }
        id
    }

    pub(crate) fn create_element(
        &mut self,
        parent: NodeId,
        tag_name: String,
        attrs: HashMap<String, String>,
    ) -> NodeId {
        let value = attrs.get("value").cloned().unwrap_or_default();
        let checked = attrs.contains_key("checked");
        let disabled = attrs.contains_key("disabled");
        let readonly = attrs.contains_key("readonly");
        let element = Element {
            tag_name,
            attrs,
            value,
            checked,
            disabled,
            readonly,
        };
        self.create_node(Some(parent), NodeType::Element(element))
    }

    pub(crate) fn create_text(&mut self, parent: NodeId, text: String) -> NodeId {
        self.create_node(Some(parent), NodeType::Text(text))
    }

    pub(crate) fn element(&self, node_id: NodeId) -> Option<&Element> {
        match &self.nodes[node_id.0].node_type {
            NodeType::Element(element) => Some(element),
            _ => None,
        }
    }

    pub(crate) fn element_mut(&mut self, node_id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes[node_id.0].node_type {
            NodeType::Element(element) => Some(element),
            _ => None,
        }
    }

    pub(crate) fn tag_name(&self, node_id: NodeId) -> Option<&str> {
        self.element(node_id).map(|e| e.tag_name.as_str())
    }

    pub(crate) fn parent(&self, node_id: NodeId) -> Option<NodeId> {
        self.nodes[node_id.0].parent
    }

    pub(crate) fn children(&self, node_id: NodeId) -> &[NodeId] {
        &self.nodes[node_id.0].children
    }

    pub(crate) fn is_valid_node(&self, node_id: NodeId) -> bool {
        node_id.0 < self.nodes.len()
    }

    pub(crate) fn root_of(&self, node_id: NodeId) -> NodeId {
        let mut cursor = node_id;
        while let Some(parent) = self.parent(cursor) {
            cursor = parent;
        }
        cursor
    }

    pub(crate) fn by_id(&self, id: &str) -> Option<NodeId> {
        self.id_index
            .get(id)
            .and_then(|nodes| nodes.first())
            .copied()
    }

    pub(crate) fn rebuild_id_index(&mut self) {
        let mut index: HashMap<String, Vec<NodeId>> = HashMap::new();
        let mut stack = vec![self.root];
        while let Some(node) = stack.pop() {
            if let NodeType::Element(element) = &self.nodes[node.0].node_type {
                if let Some(id) = element.attrs.get("id") {
                    if !id.is_empty() {
                        index.entry(id.clone()).or_default().push(node);
                    }
                }
            }
            for child in self.nodes[node.0].children.iter().rev() {
                stack.push(*child);
            }
        }
        self.id_index = index;
    }

    /// Preorder walk of the subtree rooted at `root`, elements only.
    pub(crate) fn subtree_elements(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if self.element(node).is_some() {
                out.push(node);
            }
            for child in self.nodes[node.0].children.iter().rev() {
                stack.push(*child);
            }
        }
        out
    }

    pub(crate) fn connected_elements(&self) -> Vec<NodeId> {
        self.subtree_elements(self.root)
    }

    pub(crate) fn text_content(&self, node_id: NodeId) -> String {
        match &self.nodes[node_id.0].node_type {
            NodeType::Document | NodeType::Element(_) => {
                let mut out = String::new();
                for child in &self.nodes[node_id.0].children {
                    out.push_str(&self.text_content(*child));
                }
                out
            }
            NodeType::Text(text) => text.clone(),
        }
    }

    pub(crate) fn set_text_content(&mut self, node_id: NodeId, value: &str) -> Result<()> {
        if self.element(node_id).is_none() {
            return Err(Error::PageRuntime(
                "text content target is not an element".into(),
            ));
        }
        self.nodes[node_id.0].children.clear();
        if !value.is_empty() {
            self.create_text(node_id, value.to_string());
        }
        Ok(())
    }

    pub(crate) fn attr(&self, node_id: NodeId, name: &str) -> Option<String> {
        self.element(node_id)
            .and_then(|e| e.attrs.get(name).cloned())
    }

    pub(crate) fn set_attr(&mut self, node_id: NodeId, name: &str, value: &str) -> Result<()> {
        let lowered = name.to_ascii_lowercase();
        {
            let element = self.element_mut(node_id).ok_or_else(|| {
                Error::PageRuntime("attribute target is not an element".into())
            })?;
            element
                .attrs
                .insert(lowered.clone(), value.to_string());

            match lowered.as_str() {
                "value" => {
                    if !is_checkbox_or_radio_input_element(element) {
                        element.value = value.to_string();
                    }
                }
                "checked" => element.checked = true,
                "disabled" => element.disabled = true,
                "readonly" => element.readonly = true,
                _ => {}
            }
        }

        if lowered == "checked" && is_radio_input(self, node_id) {
            self.uncheck_other_radios_in_group(node_id);
        }
        if lowered == "id" {
            self.rebuild_id_index();
        }
        Ok(())
    }

    pub(crate) fn remove_attr(&mut self, node_id: NodeId, name: &str) -> Result<()> {
        let lowered = name.to_ascii_lowercase();
        {
            let element = self.element_mut(node_id).ok_or_else(|| {
                Error::PageRuntime("attribute target is not an element".into())
            })?;
            element.attrs.remove(&lowered);

            match lowered.as_str() {
                "value" => {
                    if !is_checkbox_or_radio_input_element(element) {
                        element.value = String::new();
                    }
                }
                "checked" => element.checked = false,
                "disabled" => element.disabled = false,
                "readonly" => element.readonly = false,
                _ => {}
            }
        }

        if lowered == "id" {
            self.rebuild_id_index();
        }
        Ok(())
    }

    pub(crate) fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        if child == self.root || child == parent {
            return Err(Error::PageRuntime("invalid append target".into()));
        }
        if !self.is_valid_node(child) || !self.is_valid_node(parent) {
            return Err(Error::PageRuntime("append node is invalid".into()));
        }

        // Prevent cycles: parent must not be inside child's subtree.
        let mut cursor = Some(parent);
        while let Some(node) = cursor {
            if node == child {
                return Err(Error::PageRuntime("append would create a cycle".into()));
            }
            cursor = self.parent(node);
        }

        if let Some(old_parent) = self.parent(child) {
            self.nodes[old_parent.0].children.retain(|id| *id != child);
        }
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
        self.rebuild_id_index();
        Ok(())
    }

    pub(crate) fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        if self.parent(child) != Some(parent) {
            return Err(Error::PageRuntime(
                "remove target is not a direct child".into(),
            ));
        }
        self.nodes[parent.0].children.retain(|id| *id != child);
        self.nodes[child.0].parent = None;
        self.rebuild_id_index();
        Ok(())
    }

    pub(crate) fn remove_node(&mut self, node: NodeId) -> Result<()> {
        if node == self.root {
            return Err(Error::PageRuntime("cannot remove document root".into()));
        }
        let Some(parent) = self.parent(node) else {
            return Ok(());
        };
        self.remove_child(parent, node)
    }

    /// Deep structural copy of `source`, detached from the tree. Runtime
    /// value/checked state is re-derived from attributes, as a structural
    /// duplicate of a form does not carry live field state.
    pub(crate) fn clone_subtree(&mut self, source: NodeId) -> Result<NodeId> {
        if !self.is_valid_node(source) {
            return Err(Error::PageRuntime("clone source is invalid".into()));
        }
        self.clone_node_recursive(source)
    }

    fn clone_node_recursive(&mut self, source: NodeId) -> Result<NodeId> {
        stacker::maybe_grow(64 * 1024, 4 * 1024 * 1024, || {
            let node_type = match &self.nodes[source.0].node_type {
                NodeType::Document => {
                    return Err(Error::PageRuntime("cannot clone the document node".into()));
                }
                NodeType::Element(element) => {
                    let mut copy = element.clone();
                    reset_runtime_state_from_attrs(&mut copy);
                    NodeType::Element(copy)
                }
                NodeType::Text(text) => NodeType::Text(text.clone()),
            };

            let copy_id = self.create_node(None, node_type);
            let children = self.nodes[source.0].children.clone();
            for child in children {
                let child_copy = self.clone_node_recursive(child)?;
                self.nodes[child_copy.0].parent = Some(copy_id);
                self.nodes[copy_id.0].children.push(child_copy);
            }
            Ok(copy_id)
        })
    }

    /// Stable serialized form of a node: attributes in name order, void tags
    /// without end tags. Used by the capture step and by restoration checks.
    pub(crate) fn dump_node(&self, node_id: NodeId) -> String {
        stacker::maybe_grow(64 * 1024, 4 * 1024 * 1024, || {
            match &self.nodes[node_id.0].node_type {
                NodeType::Document => {
                    let mut out = String::new();
                    for child in &self.nodes[node_id.0].children {
                        out.push_str(&self.dump_node(*child));
                    }
                    out
                }
                NodeType::Text(text) => escape_html_text_for_serialization(text),
                NodeType::Element(element) => {
                    let mut out = String::new();
                    out.push('<');
                    out.push_str(&element.tag_name);
                    let mut names = element.attrs.keys().collect::<Vec<_>>();
                    names.sort();
                    for name in names {
                        out.push(' ');
                        out.push_str(name);
                        out.push_str("=\"");
                        out.push_str(&escape_html_attr_for_serialization(&element.attrs[name]));
                        out.push('"');
                    }
                    out.push('>');
                    if is_void_tag(&element.tag_name) {
                        return out;
                    }
                    for child in &self.nodes[node_id.0].children {
                        out.push_str(&self.dump_node(*child));
                    }
                    out.push_str("</");
                    out.push_str(&element.tag_name);
                    out.push('>');
                    out
                }
            }
        })
    }
}

fn is_checkbox_or_radio_input_element(element: &Element) -> bool {
    if !element.tag_name.eq_ignore_ascii_case("input") {
        return false;
    }
    matches!(
        element
            .attrs
            .get("type")
            .map(|kind| kind.to_ascii_lowercase())
            .as_deref(),
        Some("checkbox") | Some("radio")
    )
}
