use super::*;

#[derive(Debug, Clone, PartialEq)]
pub struct ParallaxOptions {
    /// Maximum offset, in px, applied when the pointer reaches the far
    /// viewport edge.
    pub amplitude: f64,
}

impl Default for ParallaxOptions {
    fn default() -> Self {
        Self { amplitude: 20.0 }
    }
}

/// Moves the hero background opposite to the pointer. Updates are coalesced
/// to one per frame: `ticking` blocks further frame tasks from queueing, and
/// `pending` always holds the freshest fractions, so the write that lands
/// reflects the last pointer event of a burst.
#[derive(Debug)]
pub(crate) struct ParallaxController {
    options: ParallaxOptions,
    hero: Option<NodeId>,
    background: Option<NodeId>,
    pending: Option<(f64, f64)>,
    ticking: bool,
}

impl ParallaxController {
    pub(crate) fn new(options: ParallaxOptions) -> Self {
        Self {
            options,
            hero: None,
            background: None,
            pending: None,
            ticking: false,
        }
    }

    pub(crate) fn set_options(&mut self, options: ParallaxOptions) {
        self.options = options;
    }

    pub(crate) fn bind(&mut self, hero: Option<NodeId>, background: Option<NodeId>) {
        self.hero = hero;
        self.background = background;
    }

    pub(crate) fn is_bound(&self) -> bool {
        self.hero.is_some() && self.background.is_some()
    }

    /// Records the latest pointer fractions. Returns `true` when a frame
    /// task should be queued; `false` while one is already pending.
    pub(crate) fn note_pointer(&mut self, x_fraction: f64, y_fraction: f64) -> bool {
        if !self.is_bound() {
            return false;
        }
        self.pending = Some((x_fraction, y_fraction));
        if self.ticking {
            return false;
        }
        self.ticking = true;
        true
    }

    /// Consumes the pending update at frame time. Returns the background
    /// node and the transform value to write.
    pub(crate) fn take_frame_update(&mut self) -> Option<(NodeId, String)> {
        self.ticking = false;
        let (x_fraction, y_fraction) = self.pending.take()?;
        let background = self.background?;

        let x = format_float(x_fraction * self.options.amplitude);
        let y = format_float(y_fraction * self.options.amplitude);
        // translate3d keeps the layer on the compositor.
        Some((background, format!("translate3d(-{x}px, -{y}px, 0)")))
    }
}
