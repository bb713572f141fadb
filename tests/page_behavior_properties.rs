use proptest::collection::vec;
use proptest::prelude::*;

use order_page::{
    Capture, DocumentRenderer, Page, PdfOptions, RenderError, RenderedDocument, SnapshotRenderer,
};

const REVEAL_PAGE: &str = r#"
    <section id='s0' class='reveal'>A</section>
    <section id='s1' class='reveal'>B</section>
    <section id='s2' class='reveal'>C</section>
    "#;

const HERO_PAGE: &str = r#"
    <section class='hero'><div class='hero-bg'></div></section>
    "#;

const FORM_PAGE: &str = r#"
    <body>
      <section class='hero'><div class='hero-bg'></div></section>
      <section id='innhold'>
        <form id='bestilling'>
          <input id='navn' name='navn' type='text'>
          <input id='vilkaar' name='vilkaar' type='checkbox'>
          <select id='antall' name='antall'>
            <option value='1' selected>1</option>
            <option value='2'>2</option>
            <option value='3'>3</option>
          </select>
          <textarea id='notat' name='notat'></textarea>
        </form>
      </section>
      <footer>Kontakt</footer>
    </body>
    "#;

struct FailingRenderer;

impl DocumentRenderer for FailingRenderer {
    fn render(
        &mut self,
        _capture: &Capture,
        _options: &PdfOptions,
    ) -> std::result::Result<RenderedDocument, RenderError> {
        Err(RenderError::new("engine rejected the capture"))
    }
}

proptest! {
    #[test]
    fn reveal_state_is_monotonic_under_arbitrary_entry_bursts(
        entries in vec((0usize..3, 0.0f64..=1.0), 0..48),
    ) {
        let mut page = Page::from_html(REVEAL_PAGE).unwrap();
        let mut expected = [false; 3];

        for (target, ratio) in entries {
            page.intersect(&format!("#s{target}"), ratio).unwrap();
            page.run_frame().unwrap();
            if ratio >= 0.1 {
                expected[target] = true;
            }

            for (index, revealed) in expected.iter().enumerate() {
                let selector = format!("#s{index}");
                prop_assert_eq!(page.is_revealed(&selector).unwrap(), *revealed);
                page.assert_class(&selector, "active", *revealed).unwrap();
            }
        }

        let still_waiting = expected.iter().filter(|revealed| !**revealed).count();
        prop_assert_eq!(page.observed_reveal_count(), still_waiting);
        prop_assert_eq!(page.revealed_count(), 3 - still_waiting);
    }

    #[test]
    fn a_pointer_burst_coalesces_to_one_write_of_the_final_position(
        moves in vec((0.0f64..=1280.0, 0.0f64..=720.0), 1..24),
    ) {
        let mut page = Page::from_html(HERO_PAGE).unwrap();
        page.enable_trace(true);
        page.set_trace_stderr(false);

        for (x, y) in &moves {
            page.pointer_move(*x, *y).unwrap();
        }
        page.run_frame().unwrap();

        let applies = page
            .take_trace_logs()
            .into_iter()
            .filter(|line| line.contains("[parallax] apply"))
            .count();
        prop_assert_eq!(applies, 1);

        // The write must match a page that only ever saw the last move.
        let mut reference = Page::from_html(HERO_PAGE).unwrap();
        let (x, y) = *moves.last().unwrap();
        reference.pointer_move(x, y).unwrap();
        reference.run_frame().unwrap();
        prop_assert_eq!(
            page.dump_dom(".hero-bg").unwrap(),
            reference.dump_dom(".hero-bg").unwrap()
        );
    }

    #[test]
    fn export_always_restores_the_page_regardless_of_state_and_outcome(
        name in "[A-Za-zÆØÅæøå0-9 ]{0,24}",
        note in "[A-Za-z0-9,. ]{0,40}",
        agree in any::<bool>(),
        quantity in 1usize..=3,
        scroll in 0i64..2400,
        fail in any::<bool>(),
    ) {
        let renderer: Box<dyn DocumentRenderer> = if fail {
            Box::new(FailingRenderer)
        } else {
            Box::new(SnapshotRenderer)
        };
        let mut page = Page::with_renderer(FORM_PAGE, renderer).unwrap();

        page.type_text("#navn", &name).unwrap();
        page.type_text("#notat", &note).unwrap();
        page.set_checked("#vilkaar", agree).unwrap();
        page.select_value("#antall", &quantity.to_string()).unwrap();
        page.scroll_to(0, scroll);

        let before = page.dump_dom("body").unwrap();
        let outcome = page.export_document("bestilling");
        prop_assert_eq!(outcome.is_ok(), !fail);

        prop_assert_eq!(page.dump_dom("body").unwrap(), before);
        prop_assert_eq!(page.scroll_offset(), (0, scroll));
        page.assert_value("#navn", &name).unwrap();
        page.assert_value("#notat", &note).unwrap();
        page.assert_checked("#vilkaar", agree).unwrap();

        if let Ok(document) = outcome {
            let exported = Page::from_html(&document.pages[0]).unwrap();
            exported.assert_value("#navn", &name).unwrap();
            exported.assert_value("#antall", &quantity.to_string()).unwrap();
            exported.assert_checked("#vilkaar", agree).unwrap();
        }
    }
}
