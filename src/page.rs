use log::debug;

use super::dom_forms::{is_checkbox_input, is_radio_input, is_text_entry_control};
use super::html::parse_html;
use super::parallax::ParallaxController;
use super::reveal::RevealController;
use super::selector::{select_all, select_one};
use super::*;

pub(crate) const FRAME_INTERVAL_MS: i64 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FrameTask {
    RevealActivate(NodeId),
    ParallaxApply,
}

/// A loaded order-form page: the DOM plus the script's three components,
/// driven deterministically. Events are delivered by method call and frames
/// run only when asked, so every intermediate state can be inspected.
pub struct Page {
    pub(crate) dom: Dom,
    pub(crate) viewport_width: f64,
    pub(crate) viewport_height: f64,
    pub(crate) scroll_x: i64,
    pub(crate) scroll_y: i64,
    pub(crate) now_ms: i64,
    pub(crate) frame_queue: Vec<FrameTask>,
    pub(crate) reveal: RevealController,
    pub(crate) parallax: ParallaxController,
    pub(crate) export_phase: ExportPhase,
    pub(crate) last_export_outcome: Option<ExportPhase>,
    pub(crate) renderer: Box<dyn DocumentRenderer>,
    pub(crate) pdf_options: PdfOptions,
    pub(crate) downloads: Vec<RenderedDocument>,
    pub(crate) alerts: Vec<String>,
    pub(crate) trace: bool,
    pub(crate) trace_logs: Vec<String>,
    pub(crate) trace_log_limit: usize,
    pub(crate) trace_to_stderr: bool,
}

impl Page {
    pub fn from_html(html: &str) -> Result<Self> {
        Self::with_renderer(html, Box::new(SnapshotRenderer))
    }

    pub fn with_renderer(html: &str, renderer: Box<dyn DocumentRenderer>) -> Result<Self> {
        let dom = parse_html(html)?;
        let mut page = Self {
            dom,
            viewport_width: 1280.0,
            viewport_height: 720.0,
            scroll_x: 0,
            scroll_y: 0,
            now_ms: 0,
            frame_queue: Vec::new(),
            reveal: RevealController::new(RevealOptions::default()),
            parallax: ParallaxController::new(ParallaxOptions::default()),
            export_phase: ExportPhase::Idle,
            last_export_outcome: None,
            renderer,
            pdf_options: PdfOptions::default(),
            downloads: Vec::new(),
            alerts: Vec::new(),
            trace: false,
            trace_logs: Vec::new(),
            trace_log_limit: 10_000,
            trace_to_stderr: true,
        };
        page.wire_components()?;
        Ok(page)
    }

    fn wire_components(&mut self) -> Result<()> {
        for node in select_all(&self.dom, ".reveal")? {
            self.reveal.observe(node);
        }
        let hero = select_all(&self.dom, ".hero")?.into_iter().next();
        let background = select_all(&self.dom, ".hero-bg")?.into_iter().next();
        self.parallax.bind(hero, background);
        debug!(
            "page wired: {} reveal targets, parallax bound: {}",
            self.reveal.observed_count(),
            self.parallax.is_bound()
        );
        Ok(())
    }

    pub fn set_viewport(&mut self, width: f64, height: f64) -> Result<()> {
        if !(width > 0.0) || !(height > 0.0) {
            return Err(Error::PageRuntime(
                "viewport dimensions must be positive".into(),
            ));
        }
        self.viewport_width = width;
        self.viewport_height = height;
        Ok(())
    }

    pub fn viewport(&self) -> (f64, f64) {
        (self.viewport_width, self.viewport_height)
    }

    pub fn scroll_to(&mut self, x: i64, y: i64) {
        self.scroll_x = x;
        self.scroll_y = y;
    }

    pub fn scroll_offset(&self) -> (i64, i64) {
        (self.scroll_x, self.scroll_y)
    }

    pub fn now_ms(&self) -> i64 {
        self.now_ms
    }

    pub fn advance_time(&mut self, delta_ms: i64) -> Result<()> {
        if delta_ms < 0 {
            return Err(Error::PageRuntime(
                "advance_time requires non-negative milliseconds".into(),
            ));
        }
        let from = self.now_ms;
        self.now_ms = self.now_ms.saturating_add(delta_ms);
        self.trace_line(format!(
            "[timer] advance delta_ms={delta_ms} from={from} to={}",
            self.now_ms
        ));
        Ok(())
    }

    /// Runs one display-refresh pass: every task queued before this call
    /// executes; tasks queued while running wait for the next frame.
    pub fn run_frame(&mut self) -> Result<()> {
        self.now_ms = self.now_ms.saturating_add(FRAME_INTERVAL_MS);
        let tasks = std::mem::take(&mut self.frame_queue);
        let count = tasks.len();
        for task in tasks {
            match task {
                FrameTask::RevealActivate(node) => {
                    self.dom.add_class(node, "active")?;
                    self.trace_line(format!("[reveal] apply node={}", node.0));
                }
                FrameTask::ParallaxApply => {
                    if let Some((background, transform)) = self.parallax.take_frame_update() {
                        self.dom.style_set(background, "transform", &transform)?;
                        self.trace_line(format!("[parallax] apply transform={transform}"));
                    }
                }
            }
        }
        self.trace_line(format!("[frame] ran tasks={count} now_ms={}", self.now_ms));
        Ok(())
    }

    /// Delivers an intersection entry for every element the selector matches.
    /// Elements that are not observed (or already revealed) ignore it.
    pub fn intersect(&mut self, selector: &str, ratio: f64) -> Result<()> {
        if !(0.0..=1.0).contains(&ratio) {
            return Err(Error::PageRuntime(
                "intersection ratio must be within 0..=1".into(),
            ));
        }
        for node in select_all(&self.dom, selector)? {
            if self.reveal.on_intersection(node, ratio) {
                self.frame_queue.push(FrameTask::RevealActivate(node));
                self.trace_line(format!(
                    "[reveal] schedule node={} ratio={}",
                    node.0,
                    format_float(ratio)
                ));
            }
        }
        Ok(())
    }

    /// Pointer movement over the hero region, in viewport coordinates.
    /// Without a hero and a background layer this is a no-op.
    pub fn pointer_move(&mut self, x: f64, y: f64) -> Result<()> {
        if !self.parallax.is_bound() {
            return Ok(());
        }
        let x_fraction = (x / self.viewport_width).clamp(0.0, 1.0);
        let y_fraction = (y / self.viewport_height).clamp(0.0, 1.0);
        if self.parallax.note_pointer(x_fraction, y_fraction) {
            self.frame_queue.push(FrameTask::ParallaxApply);
        }
        self.trace_line(format!(
            "[parallax] pointer x={} y={}",
            format_float(x_fraction),
            format_float(y_fraction)
        ));
        Ok(())
    }

    pub fn type_text(&mut self, selector: &str, text: &str) -> Result<()> {
        let target = select_one(&self.dom, selector)?;
        if self.dom.disabled(target) {
            return Ok(());
        }
        if self.dom.readonly(target) {
            return Ok(());
        }

        if !is_text_entry_control(&self.dom, target) {
            let actual = self
                .dom
                .tag_name(target)
                .unwrap_or("non-element")
                .to_ascii_lowercase();
            return Err(Error::TypeMismatch {
                selector: selector.to_string(),
                expected: "input or textarea".into(),
                actual,
            });
        }

        self.dom.set_value(target, text)?;
        Ok(())
    }

    pub fn set_checked(&mut self, selector: &str, checked: bool) -> Result<()> {
        let target = select_one(&self.dom, selector)?;
        if self.dom.disabled(target) {
            return Ok(());
        }

        if !is_checkbox_input(&self.dom, target) && !is_radio_input(&self.dom, target) {
            let tag = self
                .dom
                .tag_name(target)
                .unwrap_or_default()
                .to_ascii_lowercase();
            let kind = self
                .dom
                .attr(target, "type")
                .unwrap_or_else(|| "text".into())
                .to_ascii_lowercase();
            return Err(Error::TypeMismatch {
                selector: selector.to_string(),
                expected: "input[type=checkbox|radio]".into(),
                actual: if tag == "input" {
                    format!("input[type={kind}]")
                } else {
                    tag
                },
            });
        }

        let current = self.dom.checked(target)?;
        if current != checked {
            self.dom.set_checked(target, checked)?;
        }
        Ok(())
    }

    pub fn select_value(&mut self, selector: &str, value: &str) -> Result<()> {
        let target = select_one(&self.dom, selector)?;
        if self.dom.disabled(target) {
            return Ok(());
        }

        let tag = self
            .dom
            .tag_name(target)
            .unwrap_or_default()
            .to_ascii_lowercase();
        if tag != "select" {
            return Err(Error::TypeMismatch {
                selector: selector.to_string(),
                expected: "select".into(),
                actual: tag,
            });
        }

        self.dom.set_value(target, value)
    }

    pub fn click(&mut self, selector: &str) -> Result<()> {
        let target = select_one(&self.dom, selector)?;
        if self.dom.disabled(target) {
            return Ok(());
        }

        if is_checkbox_input(&self.dom, target) {
            let current = self.dom.checked(target)?;
            self.dom.set_checked(target, !current)?;
        }

        if is_radio_input(&self.dom, target) {
            let current = self.dom.checked(target)?;
            if !current {
                self.dom.set_checked(target, true)?;
            }
        }

        Ok(())
    }

    pub fn set_reveal_options(&mut self, options: RevealOptions) {
        self.reveal.set_options(options);
    }

    pub fn reveal_options(&self) -> &RevealOptions {
        self.reveal.options()
    }

    pub fn set_parallax_options(&mut self, options: ParallaxOptions) {
        self.parallax.set_options(options);
    }

    pub fn set_pdf_options(&mut self, options: PdfOptions) {
        self.pdf_options = options;
    }

    pub fn pdf_options(&self) -> &PdfOptions {
        &self.pdf_options
    }

    pub fn set_document_renderer(&mut self, renderer: Box<dyn DocumentRenderer>) {
        self.renderer = renderer;
    }

    pub fn downloads(&self) -> &[RenderedDocument] {
        &self.downloads
    }

    pub fn alerts(&self) -> &[String] {
        &self.alerts
    }

    pub fn export_phase(&self) -> ExportPhase {
        self.export_phase
    }

    pub fn last_export_outcome(&self) -> Option<ExportPhase> {
        self.last_export_outcome
    }

    pub fn observed_reveal_count(&self) -> usize {
        self.reveal.observed_count()
    }

    pub fn revealed_count(&self) -> usize {
        self.reveal.revealed_count()
    }

    pub fn is_revealed(&self, selector: &str) -> Result<bool> {
        let target = select_one(&self.dom, selector)?;
        Ok(self.reveal.is_revealed(target))
    }

    pub fn assert_text(&self, selector: &str, expected: &str) -> Result<()> {
        let target = select_one(&self.dom, selector)?;
        let actual = self.dom.text_content(target);
        if actual != expected {
            return Err(self.assertion_failed(selector, expected, &actual, target));
        }
        Ok(())
    }

    pub fn assert_value(&self, selector: &str, expected: &str) -> Result<()> {
        let target = select_one(&self.dom, selector)?;
        let actual = self.dom.value(target)?;
        if actual != expected {
            return Err(self.assertion_failed(selector, expected, &actual, target));
        }
        Ok(())
    }

    pub fn assert_checked(&self, selector: &str, expected: bool) -> Result<()> {
        let target = select_one(&self.dom, selector)?;
        let actual = self.dom.checked(target)?;
        if actual != expected {
            return Err(self.assertion_failed(
                selector,
                &expected.to_string(),
                &actual.to_string(),
                target,
            ));
        }
        Ok(())
    }

    pub fn assert_class(&self, selector: &str, class_name: &str, expected: bool) -> Result<()> {
        let target = select_one(&self.dom, selector)?;
        let actual = self.dom.has_class_name(target, class_name);
        if actual != expected {
            return Err(self.assertion_failed(
                selector,
                &format!("class {class_name}: {expected}"),
                &format!("class {class_name}: {actual}"),
                target,
            ));
        }
        Ok(())
    }

    pub fn assert_style(&self, selector: &str, property: &str, expected: &str) -> Result<()> {
        let target = select_one(&self.dom, selector)?;
        let actual = self.dom.style_get(target, property)?;
        if actual != expected {
            return Err(self.assertion_failed(selector, expected, &actual, target));
        }
        Ok(())
    }

    pub fn assert_exists(&self, selector: &str) -> Result<()> {
        select_one(&self.dom, selector).map(|_| ())
    }

    pub fn dump_dom(&self, selector: &str) -> Result<String> {
        let target = select_one(&self.dom, selector)?;
        Ok(self.dom.dump_node(target))
    }

    fn assertion_failed(
        &self,
        selector: &str,
        expected: &str,
        actual: &str,
        target: NodeId,
    ) -> Error {
        Error::AssertionFailed {
            selector: selector.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
            dom_snippet: truncate_chars(&self.dom.dump_node(target), 160),
        }
    }

    pub fn enable_trace(&mut self, enabled: bool) {
        self.trace = enabled;
    }

    pub fn take_trace_logs(&mut self) -> Vec<String> {
        std::mem::take(&mut self.trace_logs)
    }

    pub fn set_trace_stderr(&mut self, enabled: bool) {
        self.trace_to_stderr = enabled;
    }

    pub fn set_trace_log_limit(&mut self, max_entries: usize) -> Result<()> {
        if max_entries == 0 {
            return Err(Error::PageRuntime(
                "set_trace_log_limit requires at least 1 entry".into(),
            ));
        }
        self.trace_log_limit = max_entries;
        while self.trace_logs.len() > self.trace_log_limit {
            self.trace_logs.remove(0);
        }
        Ok(())
    }

    pub(crate) fn trace_line(&mut self, line: String) {
        if !self.trace {
            return;
        }
        if self.trace_to_stderr {
            eprintln!("{line}");
        }
        self.trace_logs.push(line);
        while self.trace_logs.len() > self.trace_log_limit {
            self.trace_logs.remove(0);
        }
    }
}
