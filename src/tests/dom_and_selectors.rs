use super::*;

#[test]
fn parser_builds_tree_and_indexes_ids() -> Result<()> {
    let html = r#"
        <body>
          <section id='intro'>
            <h2 id='tittel'>Bestilling</h2>
            <p id='ingress'>Fyll ut skjemaet.</p>
          </section>
        </body>
        "#;

    let page = Page::from_html(html)?;
    page.assert_exists("#intro")?;
    page.assert_text("#tittel", "Bestilling")?;
    page.assert_text("#ingress", "Fyll ut skjemaet.")?;
    Ok(())
}

#[test]
fn void_elements_do_not_swallow_siblings() -> Result<()> {
    let html = r#"<div id='wrap'><input id='a' type='text'><p id='b'>etter</p></div>"#;
    let page = Page::from_html(html)?;
    page.assert_exists("#a")?;
    page.assert_text("#b", "etter")?;
    Ok(())
}

#[test]
fn textarea_initial_value_comes_from_its_text() -> Result<()> {
    let html = "<textarea id='notat'>forhåndsutfylt</textarea>";
    let page = Page::from_html(html)?;
    page.assert_value("#notat", "forhåndsutfylt")?;
    Ok(())
}

#[test]
fn character_references_decode_in_text_and_attributes() -> Result<()> {
    let html = r#"<p id='tekst' title='Vilk&aring;r'>Fjord &amp; fjell</p>"#;
    let page = Page::from_html(html)?;
    // Unknown named entities pass through untouched; the core set decodes.
    page.assert_text("#tekst", "Fjord & fjell")?;
    assert_eq!(
        page.dom.attr(page.dom.by_id("tekst").unwrap(), "title"),
        Some("Vilk&aring;r".to_string())
    );
    Ok(())
}

#[test]
fn numeric_character_references_decode() -> Result<()> {
    let page = Page::from_html("<p id='t'>&#216;l &#x26; mat</p>")?;
    page.assert_text("#t", "Øl & mat")?;
    Ok(())
}

#[test]
fn optional_closing_tags_for_list_items_and_options() -> Result<()> {
    let html = r#"
        <ul id='liste'><li>en<li>to<li>tre</ul>
        <select id='valg'>
          <option value='a'>A
          <option value='b' selected>B
        </select>
        "#;

    let page = Page::from_html(html)?;
    let list = page.dom.by_id("liste").unwrap();
    let items = page
        .dom
        .children(list)
        .iter()
        .filter(|node| page.dom.element(**node).is_some())
        .count();
    assert_eq!(items, 3);
    page.assert_value("#valg", "b")?;
    Ok(())
}

#[test]
fn selector_groups_compounds_and_child_combinator() -> Result<()> {
    let html = r#"
        <form id='skjema'>
          <div class='rad'>
            <input id='direkte' type='text'>
          </div>
          <input id='kryss' type='checkbox'>
        </form>
        "#;

    let page = Page::from_html(html)?;
    let hits = crate::selector::select_all(&page.dom, "input[type=checkbox], .rad > input")?;
    assert_eq!(hits.len(), 2);

    let compound = crate::selector::select_all(&page.dom, "form#skjema input[type=text]")?;
    assert_eq!(compound.len(), 1);
    Ok(())
}

#[test]
fn unsupported_selector_is_rejected() {
    let page = Page::from_html("<div></div>").expect("page should parse");
    match crate::selector::select_all(&page.dom, "div:hover") {
        Err(Error::UnsupportedSelector(_)) => {}
        other => panic!("expected unsupported selector, got: {other:?}"),
    }
    match crate::selector::select_all(&page.dom, "div + p") {
        Err(Error::UnsupportedSelector(_)) => {}
        other => panic!("expected unsupported selector, got: {other:?}"),
    }
}

#[test]
fn class_and_style_ops_round_trip() -> Result<()> {
    let mut page = Page::from_html("<div id='boks' class='reveal kort'></div>")?;
    let node = page.dom.by_id("boks").unwrap();

    page.dom.add_class(node, "active")?;
    page.assert_class("#boks", "active", true)?;
    page.dom.remove_class(node, "reveal")?;
    page.assert_class("#boks", "reveal", false)?;

    page.dom.style_set(node, "opacity", "1")?;
    page.dom.style_set(node, "borderColor", "red")?;
    page.assert_style("#boks", "opacity", "1")?;
    page.assert_style("#boks", "border-color", "red")?;

    // Clearing the last declaration keeps an empty style attribute.
    page.dom.style_set(node, "opacity", "")?;
    page.dom.style_set(node, "borderColor", "")?;
    assert_eq!(page.dom.attr(node, "style"), Some(String::new()));
    Ok(())
}

#[test]
fn clone_subtree_resets_runtime_state_to_declared_defaults() -> Result<()> {
    let html = r#"
        <form id='skjema'>
          <input id='navn' type='text' value=''>
          <input id='kryss' type='checkbox'>
        </form>
        "#;

    let mut page = Page::from_html(html)?;
    page.type_text("#navn", "12345")?;
    page.set_checked("#kryss", true)?;

    let region = page.dom.by_id("skjema").unwrap();
    let copy = page.dom.clone_subtree(region)?;

    let copied_inputs = page
        .dom
        .subtree_elements(copy)
        .into_iter()
        .filter(|node| page.dom.tag_name(*node) == Some("input"))
        .collect::<Vec<_>>();
    assert_eq!(copied_inputs.len(), 2);
    assert_eq!(page.dom.value(copied_inputs[0])?, "");
    assert!(!page.dom.checked(copied_inputs[1])?);

    // The live controls keep their runtime state.
    page.assert_value("#navn", "12345")?;
    page.assert_checked("#kryss", true)?;
    Ok(())
}

#[test]
fn radio_exclusivity_is_scoped_to_the_owning_form() -> Result<()> {
    let html = r#"
        <form id='a'>
          <input id='a1' type='radio' name='frakt' checked>
          <input id='a2' type='radio' name='frakt'>
        </form>
        <form id='b'>
          <input id='b1' type='radio' name='frakt' checked>
        </form>
        "#;

    let mut page = Page::from_html(html)?;
    page.click("#a2")?;

    page.assert_checked("#a1", false)?;
    page.assert_checked("#a2", true)?;
    page.assert_checked("#b1", true)?;
    Ok(())
}

#[test]
fn select_initial_value_prefers_last_selected_option() -> Result<()> {
    let html = r#"
        <select id='farge'>
          <option value='rod' selected>Rød</option>
          <option value='bla' selected>Blå</option>
          <option value='gronn'>Grønn</option>
        </select>
        "#;

    let page = Page::from_html(html)?;
    page.assert_value("#farge", "bla")?;
    Ok(())
}

#[test]
fn dump_node_orders_attributes_by_name() -> Result<()> {
    let page = Page::from_html(r#"<input type='text' id='x' name='navn' value='v'>"#)?;
    let node = page.dom.by_id("x").unwrap();
    assert_eq!(
        page.dom.dump_node(node),
        r#"<input id="x" name="navn" type="text" value="v">"#
    );
    Ok(())
}

#[test]
fn dump_and_reparse_are_stable() -> Result<()> {
    let html = r#"
        <body>
          <section id='s' class='reveal' style='color: blue;'>
            <p>Tekst &amp; tegn</p>
            <input type='checkbox' checked>
          </section>
        </body>
        "#;

    let page = Page::from_html(html)?;
    let first = page.dump_dom("body")?;
    let reparsed = Page::from_html(&first)?;
    assert_eq!(reparsed.dump_dom("body")?, first);
    Ok(())
}
