use super::*;

pub(crate) fn is_checkbox_input(dom: &Dom, node_id: NodeId) -> bool {
    let Some(element) = dom.element(node_id) else {
        return false;
    };

    if !element.tag_name.eq_ignore_ascii_case("input") {
        return false;
    }

    element
        .attrs
        .get("type")
        .map(|kind| kind.eq_ignore_ascii_case("checkbox"))
        .unwrap_or(false)
}

pub(crate) fn is_radio_input(dom: &Dom, node_id: NodeId) -> bool {
    let Some(element) = dom.element(node_id) else {
        return false;
    };

    if !element.tag_name.eq_ignore_ascii_case("input") {
        return false;
    }

    element
        .attrs
        .get("type")
        .map(|kind| kind.eq_ignore_ascii_case("radio"))
        .unwrap_or(false)
}

/// Controls whose current runtime value must be carried onto an export
/// duplicate: value-bearing inputs, textareas and selects. Buttons carry no
/// user state.
pub(crate) fn is_value_carrying_control(dom: &Dom, node_id: NodeId) -> bool {
    let Some(element) = dom.element(node_id) else {
        return false;
    };

    if element.tag_name.eq_ignore_ascii_case("select")
        || element.tag_name.eq_ignore_ascii_case("textarea")
    {
        return true;
    }

    if !element.tag_name.eq_ignore_ascii_case("input") {
        return false;
    }

    !element
        .attrs
        .get("type")
        .map(|kind| {
            kind.eq_ignore_ascii_case("button")
                || kind.eq_ignore_ascii_case("submit")
                || kind.eq_ignore_ascii_case("reset")
                || kind.eq_ignore_ascii_case("image")
        })
        .unwrap_or(false)
}

pub(crate) fn is_text_entry_control(dom: &Dom, node_id: NodeId) -> bool {
    let Some(element) = dom.element(node_id) else {
        return false;
    };

    if element.tag_name.eq_ignore_ascii_case("textarea") {
        return true;
    }
    if !element.tag_name.eq_ignore_ascii_case("input") {
        return false;
    }
    !is_checkbox_input(dom, node_id) && !is_radio_input(dom, node_id)
}

/// Re-derive runtime control state from declared attributes. This is what a
/// fresh structural copy of a control starts from: the HTML-declared
/// defaults, not the live values the user has since typed or toggled.
pub(crate) fn reset_runtime_state_from_attrs(element: &mut Element) {
    element.value = element.attrs.get("value").cloned().unwrap_or_default();
    element.checked = element.attrs.contains_key("checked");
    element.disabled = element.attrs.contains_key("disabled");
    element.readonly = element.attrs.contains_key("readonly");
}

impl Dom {
    pub(crate) fn value(&self, node_id: NodeId) -> Result<String> {
        let element = self
            .element(node_id)
            .ok_or_else(|| Error::PageRuntime("value target is not an element".into()))?;
        Ok(element.value.clone())
    }

    pub(crate) fn set_value(&mut self, node_id: NodeId, value: &str) -> Result<()> {
        if self
            .tag_name(node_id)
            .map(|tag| tag.eq_ignore_ascii_case("select"))
            .unwrap_or(false)
        {
            return self.set_select_value(node_id, value);
        }

        let element = self
            .element_mut(node_id)
            .ok_or_else(|| Error::PageRuntime("value target is not an element".into()))?;
        element.value = value.to_string();
        Ok(())
    }

    pub(crate) fn checked(&self, node_id: NodeId) -> Result<bool> {
        let element = self
            .element(node_id)
            .ok_or_else(|| Error::PageRuntime("checked target is not an element".into()))?;
        Ok(element.checked)
    }

    pub(crate) fn set_checked(&mut self, node_id: NodeId, checked: bool) -> Result<()> {
        if checked && is_radio_input(self, node_id) {
            self.uncheck_other_radios_in_group(node_id);
        }
        let element = self
            .element_mut(node_id)
            .ok_or_else(|| Error::PageRuntime("checked target is not an element".into()))?;
        element.checked = checked;
        Ok(())
    }

    /// Radio exclusivity is scoped to the owning form, or to the control's
    /// tree root when no form ancestor exists. Scoping by tree keeps a
    /// detached duplicate's radios from competing with the live page's.
    pub(crate) fn uncheck_other_radios_in_group(&mut self, target: NodeId) {
        let target_name = self.attr(target, "name").unwrap_or_default();
        if target_name.is_empty() {
            return;
        }
        let scope = self
            .find_ancestor_by_tag(target, "form")
            .unwrap_or_else(|| self.root_of(target));

        for node in self.subtree_elements(scope) {
            if node == target {
                continue;
            }
            if !is_radio_input(self, node) {
                continue;
            }
            if self.attr(node, "name").unwrap_or_default() != target_name {
                continue;
            }
            if let Some(element) = self.element_mut(node) {
                element.checked = false;
            }
        }
    }

    pub(crate) fn normalize_radio_groups(&mut self) -> Result<()> {
        for node in self.connected_elements() {
            if !is_radio_input(self, node) {
                continue;
            }
            if self.attr(node, "checked").is_some() {
                self.set_checked(node, true)?;
            }
        }
        Ok(())
    }

    pub(crate) fn disabled(&self, node_id: NodeId) -> bool {
        self.element(node_id).map(|e| e.disabled).unwrap_or(false)
    }

    pub(crate) fn readonly(&self, node_id: NodeId) -> bool {
        self.element(node_id).map(|e| e.readonly).unwrap_or(false)
    }

    pub(crate) fn find_ancestor_by_tag(&self, node_id: NodeId, tag: &str) -> Option<NodeId> {
        let mut cursor = self.parent(node_id);
        while let Some(current) = cursor {
            if self
                .tag_name(current)
                .map(|t| t.eq_ignore_ascii_case(tag))
                .unwrap_or(false)
            {
                return Some(current);
            }
            cursor = self.parent(current);
        }
        None
    }

    pub(crate) fn select_options(&self, select: NodeId) -> Vec<NodeId> {
        self.subtree_elements(select)
            .into_iter()
            .filter(|node| {
                self.tag_name(*node)
                    .map(|tag| tag.eq_ignore_ascii_case("option"))
                    .unwrap_or(false)
            })
            .collect()
    }

    pub(crate) fn option_value(&self, option: NodeId) -> String {
        if let Some(value) = self.attr(option, "value") {
            return value;
        }
        self.text_content(option).trim().to_string()
    }

    fn set_select_value(&mut self, select: NodeId, value: &str) -> Result<()> {
        let matched = self
            .select_options(select)
            .into_iter()
            .any(|option| self.option_value(option) == value);

        let element = self
            .element_mut(select)
            .ok_or_else(|| Error::PageRuntime("value target is not an element".into()))?;
        element.value = if matched {
            value.to_string()
        } else {
            String::new()
        };
        Ok(())
    }

    /// Give selects and textareas their initial runtime values: a textarea
    /// starts from its text content, a select from the last explicitly
    /// selected option (or the first option).
    pub(crate) fn initialize_form_control_values(&mut self) -> Result<()> {
        for node in self.connected_elements() {
            if self
                .tag_name(node)
                .map(|tag| tag.eq_ignore_ascii_case("textarea"))
                .unwrap_or(false)
            {
                let text = self.text_content(node);
                let element = self.element_mut(node).ok_or_else(|| {
                    Error::PageRuntime("textarea target is not an element".into())
                })?;
                element.value = text;
                continue;
            }

            if !self
                .tag_name(node)
                .map(|tag| tag.eq_ignore_ascii_case("select"))
                .unwrap_or(false)
            {
                continue;
            }

            let options = self.select_options(node);
            let chosen = options
                .iter()
                .rev()
                .find(|option| self.attr(**option, "selected").is_some())
                .or_else(|| options.first())
                .copied();

            let value = chosen
                .map(|option| self.option_value(option))
                .unwrap_or_default();
            let element = self
                .element_mut(node)
                .ok_or_else(|| Error::PageRuntime("select target is not an element".into()))?;
            element.value = value;
        }
        Ok(())
    }
}
