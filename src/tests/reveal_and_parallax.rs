use super::*;

const HERO_PAGE: &str = r#"
    <section class='hero'>
      <div class='hero-bg'></div>
      <h1>KIAS Bestilling</h1>
    </section>
    <section id='om' class='reveal'>Om oss</section>
    <section id='skjema' class='reveal'>Skjema</section>
    "#;

#[test]
fn reveal_marks_element_on_first_threshold_crossing() -> Result<()> {
    let mut page = Page::from_html(HERO_PAGE)?;
    assert_eq!(page.observed_reveal_count(), 2);

    page.intersect("#om", 0.15)?;
    page.assert_class("#om", "active", false)?;
    page.run_frame()?;

    page.assert_class("#om", "active", true)?;
    page.assert_class("#skjema", "active", false)?;
    assert_eq!(page.observed_reveal_count(), 1);
    assert!(page.is_revealed("#om")?);
    Ok(())
}

#[test]
fn entries_below_the_threshold_are_ignored() -> Result<()> {
    let mut page = Page::from_html(HERO_PAGE)?;
    page.intersect("#om", 0.05)?;
    page.run_frame()?;

    page.assert_class("#om", "active", false)?;
    assert_eq!(page.observed_reveal_count(), 2);
    Ok(())
}

#[test]
fn reveal_is_monotonic_and_fires_once() -> Result<()> {
    let mut page = Page::from_html(HERO_PAGE)?;
    page.enable_trace(true);
    page.set_trace_stderr(false);

    page.intersect("#om", 0.5)?;
    page.intersect("#om", 0.9)?;
    page.run_frame()?;
    page.intersect("#om", 1.0)?;
    page.run_frame()?;

    let applies = page
        .take_trace_logs()
        .into_iter()
        .filter(|line| line.contains("[reveal] apply"))
        .count();
    assert_eq!(applies, 1);
    page.assert_class("#om", "active", true)?;
    Ok(())
}

#[test]
fn custom_threshold_is_honored() -> Result<()> {
    let mut page = Page::from_html(HERO_PAGE)?;
    page.set_reveal_options(RevealOptions {
        threshold: 0.5,
        root_margin: "0px".to_string(),
    });

    page.intersect("#om", 0.4)?;
    page.run_frame()?;
    page.assert_class("#om", "active", false)?;

    page.intersect("#om", 0.6)?;
    page.run_frame()?;
    page.assert_class("#om", "active", true)?;
    Ok(())
}

#[test]
fn pages_without_reveal_targets_are_a_no_op() -> Result<()> {
    let mut page = Page::from_html("<p id='bare'>tekst</p>")?;
    assert_eq!(page.observed_reveal_count(), 0);
    page.intersect(".reveal", 1.0)?;
    page.run_frame()?;
    Ok(())
}

#[test]
fn parallax_applies_transform_on_the_next_frame() -> Result<()> {
    let mut page = Page::from_html(HERO_PAGE)?;
    page.pointer_move(640.0, 360.0)?;

    page.assert_style(".hero-bg", "transform", "")?;
    page.run_frame()?;
    page.assert_style(".hero-bg", "transform", "translate3d(-10px, -10px, 0)")?;
    Ok(())
}

#[test]
fn parallax_coalesces_a_burst_into_one_write_of_the_last_position() -> Result<()> {
    let mut page = Page::from_html(HERO_PAGE)?;
    page.enable_trace(true);
    page.set_trace_stderr(false);

    page.pointer_move(0.0, 0.0)?;
    page.pointer_move(640.0, 360.0)?;
    page.pointer_move(960.0, 540.0)?;
    page.run_frame()?;

    let applies = page
        .take_trace_logs()
        .into_iter()
        .filter(|line| line.contains("[parallax] apply"))
        .count();
    assert_eq!(applies, 1);
    page.assert_style(".hero-bg", "transform", "translate3d(-15px, -15px, 0)")?;
    Ok(())
}

#[test]
fn parallax_gate_reopens_after_each_frame() -> Result<()> {
    let mut page = Page::from_html(HERO_PAGE)?;
    page.pointer_move(640.0, 360.0)?;
    page.run_frame()?;
    page.pointer_move(320.0, 180.0)?;
    page.run_frame()?;

    page.assert_style(".hero-bg", "transform", "translate3d(-5px, -5px, 0)")?;
    Ok(())
}

#[test]
fn frames_without_pointer_movement_write_nothing() -> Result<()> {
    let mut page = Page::from_html(HERO_PAGE)?;
    page.pointer_move(640.0, 360.0)?;
    page.run_frame()?;

    page.enable_trace(true);
    page.set_trace_stderr(false);
    page.run_frame()?;
    let applies = page
        .take_trace_logs()
        .into_iter()
        .filter(|line| line.contains("[parallax] apply"))
        .count();
    assert_eq!(applies, 0);
    Ok(())
}

#[test]
fn missing_hero_layers_disable_the_effect() -> Result<()> {
    let mut page = Page::from_html("<section class='hero'>uten bakgrunn</section>")?;
    page.pointer_move(100.0, 100.0)?;
    assert!(page.frame_queue.is_empty());
    page.run_frame()?;
    Ok(())
}

#[test]
fn pointer_positions_clamp_to_the_viewport() -> Result<()> {
    let mut page = Page::from_html(HERO_PAGE)?;
    page.set_viewport(1000.0, 500.0)?;
    page.pointer_move(2000.0, -50.0)?;
    page.run_frame()?;

    page.assert_style(".hero-bg", "transform", "translate3d(-20px, -0px, 0)")?;
    Ok(())
}
