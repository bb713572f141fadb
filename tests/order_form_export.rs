use order_page::{
    Capture, DocumentRenderer, EXPORT_FAILURE_NOTICE, EXPORT_FILE_NAME, Error, ExportPhase, Page,
    PdfOptions, RenderError, RenderedDocument, Result,
};

const ORDER_PAGE: &str = r#"
    <body>
      <section class='hero'>
        <div class='hero-bg'></div>
        <h1>KIAS</h1>
        <p>Bestill kurs og materiell</p>
      </section>
      <section id='om-oss' class='reveal'>
        <h2>Om oss</h2>
        <p>Vi leverer kurs i arbeidssikkerhet.</p>
      </section>
      <section id='skjema-seksjon' class='reveal'>
        <form id='bestillingsskjema'>
          <input id='navn' name='navn' type='text' placeholder='Fullt navn'>
          <input id='epost' name='epost' type='email'>
          <input id='telefon' name='telefon' type='tel'>
          <select id='kurs' name='kurs'>
            <option value='grunnkurs' selected>Grunnkurs</option>
            <option value='oppfrisking'>Oppfriskingskurs</option>
          </select>
          <input id='hent' name='levering' type='radio' value='hent' checked>
          <input id='post' name='levering' type='radio' value='post'>
          <textarea id='melding' name='melding'></textarea>
          <input id='vilkaar' name='vilkaar' type='checkbox'>
          <button id='send-knapp' type='button'>Last ned skjema</button>
        </form>
      </section>
      <footer id='bunntekst'>Kontakt oss på post@kias.no</footer>
    </body>
    "#;

#[test]
fn filled_form_exports_to_the_fixed_document_name() -> Result<()> {
    let mut page = Page::from_html(ORDER_PAGE)?;

    // The visitor scrolls, sections reveal, the hero follows the pointer.
    page.intersect("#om-oss", 0.3)?;
    page.intersect("#skjema-seksjon", 0.2)?;
    page.pointer_move(640.0, 360.0)?;
    page.run_frame()?;
    page.assert_class("#om-oss", "active", true)?;
    page.assert_class("#skjema-seksjon", "active", true)?;

    // The form gets filled in.
    page.type_text("#navn", "Kari Nordmann")?;
    page.type_text("#epost", "kari@example.no")?;
    page.type_text("#telefon", "99887766")?;
    page.select_value("#kurs", "oppfrisking")?;
    page.click("#post")?;
    page.type_text("#melding", "Ønsker faktura på e-post.")?;
    page.set_checked("#vilkaar", true)?;
    page.scroll_to(0, 1200);

    let document = page.export_document("bestillingsskjema")?;
    assert_eq!(document.file_name, EXPORT_FILE_NAME);
    assert_eq!(document.pages.len(), 1);

    // The capture carries the live field state, not the declared defaults.
    let exported = Page::from_html(&document.pages[0])?;
    exported.assert_value("#navn", "Kari Nordmann")?;
    exported.assert_value("#epost", "kari@example.no")?;
    exported.assert_value("#kurs", "oppfrisking")?;
    exported.assert_checked("#hent", false)?;
    exported.assert_checked("#post", true)?;
    exported.assert_value("#melding", "Ønsker faktura på e-post.")?;
    exported.assert_checked("#vilkaar", true)?;

    // The live page is back exactly where the visitor left it.
    assert_eq!(page.scroll_offset(), (0, 1200));
    page.assert_class("#om-oss", "active", true)?;
    page.assert_value("#navn", "Kari Nordmann")?;
    page.assert_checked("#vilkaar", true)?;
    assert_eq!(page.export_phase(), ExportPhase::Idle);
    Ok(())
}

struct FailingRenderer;

impl DocumentRenderer for FailingRenderer {
    fn render(
        &mut self,
        _capture: &Capture,
        _options: &PdfOptions,
    ) -> std::result::Result<RenderedDocument, RenderError> {
        Err(RenderError::new("canvas allocation failed"))
    }
}

#[test]
fn engine_failure_shows_the_notice_and_leaves_the_page_untouched() -> Result<()> {
    let mut page = Page::with_renderer(ORDER_PAGE, Box::new(FailingRenderer))?;
    page.type_text("#navn", "Ola Nordmann")?;
    page.scroll_to(0, 900);
    let before = page.dump_dom("body")?;

    match page.export_document("bestillingsskjema") {
        Err(Error::RenderFailure(message)) => assert!(message.contains("canvas")),
        other => panic!("expected render failure, got: {other:?}"),
    }

    assert_eq!(page.dump_dom("body")?, before);
    assert_eq!(page.scroll_offset(), (0, 900));
    assert_eq!(page.alerts().len(), 1);
    assert_eq!(page.alerts()[0], EXPORT_FAILURE_NOTICE);
    assert_eq!(page.export_phase(), ExportPhase::Idle);
    assert!(page.downloads().is_empty());
    Ok(())
}

#[test]
fn repeated_exports_each_read_the_current_field_state() -> Result<()> {
    let mut page = Page::from_html(ORDER_PAGE)?;

    page.type_text("#navn", "Første")?;
    let first = page.export_document("bestillingsskjema")?;
    Page::from_html(&first.pages[0])?.assert_value("#navn", "Første")?;

    page.type_text("#navn", "Andre")?;
    let second = page.export_document("bestillingsskjema")?;
    Page::from_html(&second.pages[0])?.assert_value("#navn", "Andre")?;

    assert_eq!(page.downloads().len(), 2);
    Ok(())
}
