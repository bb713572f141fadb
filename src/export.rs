use std::error::Error as StdError;
use std::fmt;

use log::{debug, warn};

use super::dom_forms::{is_checkbox_input, is_radio_input, is_value_carrying_control};
use super::*;

pub const EXPORT_FILE_NAME: &str = "KIAS-Bestillingsskjema.pdf";
pub const EXPORT_FAILURE_NOTICE: &str =
    "Kunne ikke generere PDF-dokumentet. Vennligst prøv igjen.";

/// A4 width at CSS resolution (96dpi). The staged duplicate is laid out at
/// this fixed desktop width so a narrow viewport cannot reflow the capture.
pub const A4_CSS_WIDTH_PX: i64 = 794;

pub(crate) const EXPORT_PADDING_PX: i64 = 24;
pub(crate) const SETTLE_DELAY_MS: i64 = 100;
pub(crate) const PRINT_COLOR: &str = "#000000";
pub(crate) const EXPORT_REF_KEY: &str = "exportRef";
pub(crate) const REVEAL_MARKER_CLASSES: [&str; 2] = ["reveal", "active"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportPhase {
    Idle,
    Cloning,
    Normalizing,
    Staged,
    Capturing,
    Saved,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSize {
    A4,
    Letter,
}

impl PageSize {
    pub fn dimensions_mm(self) -> (f64, f64) {
        match self {
            Self::A4 => (210.0, 297.0),
            Self::Letter => (215.9, 279.4),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    Landscape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationPolicy {
    /// Prefer shifting whole blocks to the next page over splitting them.
    AvoidBreaks,
    /// Cut pages wherever the flow happens to land.
    FixedFlow,
}

/// Configuration handed to the paginated-document rendering engine. Page
/// margins default to zero; the print margin is carried as padding on the
/// staged duplicate instead.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfOptions {
    pub file_name: String,
    pub margin_mm: f64,
    pub page_size: PageSize,
    pub orientation: Orientation,
    pub raster_scale: u32,
    pub use_cors_images: bool,
    pub pagination: PaginationPolicy,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            file_name: EXPORT_FILE_NAME.to_string(),
            margin_mm: 0.0,
            page_size: PageSize::A4,
            orientation: Orientation::Portrait,
            raster_scale: 2,
            use_cors_images: true,
            pagination: PaginationPolicy::AvoidBreaks,
        }
    }
}

/// What the engine sees: the staged duplicate in serialized form, the fixed
/// layout width, and the scroll origin the capture starts from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    pub html: String,
    pub layout_width_px: i64,
    pub scroll_offset: (i64, i64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderError {
    pub message: String,
}

impl RenderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "render error: {}", self.message)
    }
}

impl StdError for RenderError {}

/// The paginated-document rendering engine, consumed as a black box.
pub trait DocumentRenderer {
    fn render(
        &mut self,
        capture: &Capture,
        options: &PdfOptions,
    ) -> std::result::Result<RenderedDocument, RenderError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub file_name: String,
    pub pages: Vec<String>,
    pub page_size: PageSize,
    pub orientation: Orientation,
    pub raster_scale: u32,
}

/// Built-in engine stand-in: a single logical page holding the serialized
/// capture verbatim. Deterministic, and sufficient to assert what the real
/// engine would have been handed.
#[derive(Debug, Default, Clone, Copy)]
pub struct SnapshotRenderer;

impl DocumentRenderer for SnapshotRenderer {
    fn render(
        &mut self,
        capture: &Capture,
        options: &PdfOptions,
    ) -> std::result::Result<RenderedDocument, RenderError> {
        Ok(RenderedDocument {
            file_name: options.file_name.clone(),
            pages: vec![capture.html.clone()],
            page_size: options.page_size,
            orientation: options.orientation,
            raster_scale: options.raster_scale,
        })
    }
}

/// Everything staging touched on the live page, recorded so cleanup can
/// revert it. Created by the staging step, consumed exactly once by
/// `restore_after_export`, on success and failure alike.
pub(crate) struct RestorationToken {
    staged: NodeId,
    hidden: Vec<(NodeId, Option<String>)>,
    scroll: (i64, i64),
    tagged_sources: Vec<NodeId>,
}

impl Page {
    /// Exports the form region identified by `region_id` to a paginated
    /// document. The live page is left bit-identical to its state before the
    /// call, whether rendering succeeds or fails.
    pub fn export_document(&mut self, region_id: &str) -> Result<RenderedDocument> {
        if self.export_phase != ExportPhase::Idle {
            return Err(Error::ExportInProgress);
        }
        let Some(region) = self.dom.by_id(region_id) else {
            return Err(Error::RegionNotFound(region_id.to_string()));
        };

        self.set_export_phase(ExportPhase::Cloning);
        let tagged = self.tag_controls_for_export(region)?;
        let duplicate = match self.build_print_duplicate(region, &tagged) {
            Ok(duplicate) => duplicate,
            Err(err) => {
                self.strip_export_tags(&tagged)?;
                self.set_export_phase(ExportPhase::Idle);
                return Err(err);
            }
        };

        let token = self.stage_exclusive(duplicate, tagged)?;

        let outcome = self.capture_staged(duplicate);
        match &outcome {
            Ok(_) => self.set_export_phase(ExportPhase::Saved),
            Err(_) => self.set_export_phase(ExportPhase::Failed),
        }
        self.last_export_outcome = Some(self.export_phase);

        self.restore_after_export(token)?;
        self.set_export_phase(ExportPhase::Idle);

        match outcome {
            Ok(document) => {
                debug!("document export saved: {}", document.file_name);
                self.downloads.push(document.clone());
                Ok(document)
            }
            Err(err) => {
                if matches!(err, Error::RenderFailure(_)) {
                    self.alerts.push(EXPORT_FAILURE_NOTICE.to_string());
                    self.trace_line("[export] failure notice shown".into());
                }
                Err(err)
            }
        }
    }

    pub(crate) fn set_export_phase(&mut self, phase: ExportPhase) {
        if self.export_phase != phase {
            debug!("export phase {:?} -> {:?}", self.export_phase, phase);
        }
        self.export_phase = phase;
        self.trace_line(format!("[export] phase {phase:?}"));
    }

    /// Marks every value-carrying control in the region with a correlation
    /// attribute, so source and duplicate controls can be matched by a
    /// stable identifier instead of by position.
    fn tag_controls_for_export(&mut self, region: NodeId) -> Result<Vec<NodeId>> {
        let controls = self
            .dom
            .subtree_elements(region)
            .into_iter()
            .filter(|node| is_value_carrying_control(&self.dom, *node))
            .collect::<Vec<_>>();

        for (index, node) in controls.iter().enumerate() {
            self.dom
                .dataset_set(*node, EXPORT_REF_KEY, &index.to_string())?;
        }
        self.trace_line(format!("[export] tagged controls={}", controls.len()));
        Ok(controls)
    }

    fn strip_export_tags(&mut self, tagged: &[NodeId]) -> Result<()> {
        for node in tagged {
            self.dom.dataset_remove(*node, EXPORT_REF_KEY)?;
        }
        Ok(())
    }

    fn build_print_duplicate(&mut self, region: NodeId, tagged: &[NodeId]) -> Result<NodeId> {
        let duplicate = self.dom.clone_subtree(region)?;
        self.propagate_field_state(tagged, duplicate)?;
        self.set_export_phase(ExportPhase::Normalizing);
        self.normalize_for_print(duplicate)?;
        Ok(duplicate)
    }

    /// Carries each source control's live runtime state onto its duplicate.
    /// The duplicate starts from HTML-declared defaults only, so typed text,
    /// toggled checkboxes and changed selects would otherwise be lost.
    fn propagate_field_state(&mut self, tagged: &[NodeId], duplicate: NodeId) -> Result<()> {
        let mut by_ref: HashMap<String, NodeId> = HashMap::new();
        for node in self.dom.subtree_elements(duplicate) {
            let key = self.dom.dataset_get(node, EXPORT_REF_KEY)?;
            if !key.is_empty() {
                by_ref.insert(key, node);
            }
        }

        for (index, source) in tagged.iter().enumerate() {
            let Some(copy) = by_ref.get(&index.to_string()).copied() else {
                return Err(Error::PageRuntime(
                    "export duplicate is missing a matched control".into(),
                ));
            };

            if is_checkbox_input(&self.dom, *source) || is_radio_input(&self.dom, *source) {
                let checked = self.dom.checked(*source)?;
                self.dom.set_checked(copy, checked)?;
                if checked {
                    self.dom.set_attr(copy, "checked", "")?;
                } else {
                    self.dom.remove_attr(copy, "checked")?;
                }
            } else {
                let value = self.dom.value(*source)?;
                let tag = self
                    .dom
                    .tag_name(copy)
                    .unwrap_or_default()
                    .to_ascii_lowercase();
                self.dom.set_value(copy, &value)?;
                match tag.as_str() {
                    "select" => {
                        for option in self.dom.select_options(copy) {
                            if self.dom.option_value(option) == value {
                                self.dom.set_attr(option, "selected", "")?;
                            } else {
                                self.dom.remove_attr(option, "selected")?;
                            }
                        }
                    }
                    "textarea" => {
                        self.dom.set_text_content(copy, &value)?;
                    }
                    _ => {
                        self.dom.set_attr(copy, "value", &value)?;
                    }
                }
            }

            self.dom.dataset_remove(copy, EXPORT_REF_KEY)?;
        }

        self.trace_line(format!("[export] propagated controls={}", tagged.len()));
        Ok(())
    }

    /// Forces the duplicate into a stable printable state: no transitions or
    /// animations mid-flight, no transforms, full opacity, one print color,
    /// and no reveal markers left to render an element invisible.
    fn normalize_for_print(&mut self, duplicate: NodeId) -> Result<()> {
        let mut normalized = 0usize;
        for node in self.dom.subtree_elements(duplicate) {
            self.dom.style_set(node, "transition", "none")?;
            self.dom.style_set(node, "animation", "none")?;
            self.dom.style_set(node, "transform", "none")?;
            self.dom.style_set(node, "opacity", "1")?;
            self.dom.style_set(node, "color", PRINT_COLOR)?;

            let border_color = self.dom.style_get(node, "borderColor")?;
            if !border_color.is_empty() && !border_color.eq_ignore_ascii_case("transparent") {
                self.dom.style_set(node, "borderColor", PRINT_COLOR)?;
            }

            for class_name in REVEAL_MARKER_CLASSES {
                self.dom.remove_class(node, class_name)?;
            }
            normalized += 1;
        }
        self.trace_line(format!("[export] normalized elements={normalized}"));
        Ok(())
    }

    /// Exclusive-mode staging: the duplicate becomes the page's sole visible
    /// content. Returns the restoration token cleanup requires; if staging
    /// itself fails midway, the partial token is restored here.
    fn stage_exclusive(
        &mut self,
        duplicate: NodeId,
        tagged: Vec<NodeId>,
    ) -> Result<RestorationToken> {
        let mut token = RestorationToken {
            staged: duplicate,
            hidden: Vec::new(),
            scroll: (self.scroll_x, self.scroll_y),
            tagged_sources: tagged,
        };

        if let Err(err) = self.stage_exclusive_inner(duplicate, &mut token) {
            self.restore_after_export(token)?;
            self.set_export_phase(ExportPhase::Idle);
            return Err(err);
        }
        Ok(token)
    }

    fn stage_exclusive_inner(
        &mut self,
        duplicate: NodeId,
        token: &mut RestorationToken,
    ) -> Result<()> {
        let container = page_container(&self.dom);
        let children = self.dom.children(container).to_vec();
        for node in children {
            if self.dom.element(node).is_none() {
                continue;
            }
            let prior = self.dom.attr(node, "style");
            self.dom.style_set(node, "display", "none")?;
            token.hidden.push((node, prior));
        }

        self.dom.append_child(container, duplicate)?;
        self.dom
            .style_set(duplicate, "width", &format!("{A4_CSS_WIDTH_PX}px"))?;
        self.dom
            .style_set(duplicate, "padding", &format!("{EXPORT_PADDING_PX}px"))?;
        self.dom.style_set(duplicate, "margin", "0 auto")?;
        self.dom
            .style_set(duplicate, "backgroundColor", "#ffffff")?;
        self.scroll_to(0, 0);

        self.set_export_phase(ExportPhase::Staged);
        self.trace_line(format!(
            "[export] staged exclusive hidden={}",
            token.hidden.len()
        ));
        Ok(())
    }

    /// One rendering pass after the settle delay, then the engine call.
    fn capture_staged(&mut self, duplicate: NodeId) -> Result<RenderedDocument> {
        self.settle()?;

        self.set_export_phase(ExportPhase::Capturing);
        let capture = Capture {
            html: self.dom.dump_node(duplicate),
            layout_width_px: A4_CSS_WIDTH_PX,
            scroll_offset: (self.scroll_x, self.scroll_y),
        };
        self.trace_line(format!("[export] capture bytes={}", capture.html.len()));

        let options = self.pdf_options.clone();
        self.renderer.render(&capture, &options).map_err(|err| {
            warn!("document render failed: {}", err.message);
            Error::RenderFailure(err.message)
        })
    }

    fn settle(&mut self) -> Result<()> {
        self.advance_time(SETTLE_DELAY_MS)?;
        self.run_frame()
    }

    /// Unconditional cleanup: unstage the duplicate, restore hidden
    /// sections' exact prior style attributes, restore the scroll offset and
    /// strip the correlation attributes from the source controls.
    fn restore_after_export(&mut self, token: RestorationToken) -> Result<()> {
        self.dom.remove_node(token.staged)?;

        let unhidden = token.hidden.len();
        for (node, prior) in token.hidden {
            match prior {
                Some(style) => self.dom.set_attr(node, "style", &style)?,
                None => self.dom.remove_attr(node, "style")?,
            }
        }

        self.scroll_to(token.scroll.0, token.scroll.1);

        for source in token.tagged_sources {
            self.dom.dataset_remove(source, EXPORT_REF_KEY)?;
        }

        self.trace_line(format!(
            "[export] restored scroll=({}, {}) unhidden={unhidden}",
            self.scroll_x, self.scroll_y
        ));
        Ok(())
    }
}

fn page_container(dom: &Dom) -> NodeId {
    dom.connected_elements()
        .into_iter()
        .find(|node| {
            dom.tag_name(*node)
                .map(|tag| tag.eq_ignore_ascii_case("body"))
                .unwrap_or(false)
        })
        .unwrap_or(dom.root)
}
