//! Viewport tracking: which section is currently in view.
//!
//! The producer side is [`IntersectionObserver`], which turns viewport and
//! heading geometry into batches of [`IntersectionEntry`]. The consumer side
//! is the pure reducer [`select_active`]. [`ActiveSpy`] ties the two together
//! and flags the matching navigation link.

use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::logging;
use crate::models::{Heading, IntersectionEntry, NavLink, Rect, Viewport};

/// Fraction of the viewport cut off the top of the observation band.
pub const ROOT_MARGIN_TOP: f64 = 0.20;
/// Fraction of the viewport cut off the bottom of the observation band.
pub const ROOT_MARGIN_BOTTOM: f64 = 0.70;
pub const THRESHOLDS: [f64; 4] = [0.08, 0.18, 0.28, 0.38];

#[derive(Debug, Clone, PartialEq)]
pub struct ObserverOptions {
    pub margin_top: f64,
    pub margin_bottom: f64,
    pub thresholds: Vec<f64>,
}

impl Default for ObserverOptions {
    fn default() -> Self {
        Self {
            margin_top: ROOT_MARGIN_TOP,
            margin_bottom: ROOT_MARGIN_BOTTOM,
            thresholds: THRESHOLDS.to_vec(),
        }
    }
}

impl ObserverOptions {
    /// The part of the viewport in which a heading counts as visible.
    pub fn band(&self, viewport: Viewport) -> Rect {
        let top = viewport.scroll_y + viewport.height * self.margin_top;
        let height = viewport.height * (1.0 - self.margin_top - self.margin_bottom);
        Rect::new(top, height.max(0.0))
    }

    fn threshold_index(&self, ratio: f64) -> usize {
        self.thresholds.iter().filter(|t| ratio >= **t).count()
    }
}

/// Reports headings whose visibility inside the band crossed a threshold
/// since the previous call.
#[derive(Debug, Clone)]
pub struct IntersectionObserver {
    options: ObserverOptions,
    targets: Vec<String>,
    previous: HashMap<String, (bool, usize)>,
}

impl IntersectionObserver {
    pub fn new(options: ObserverOptions) -> Self {
        Self {
            options,
            targets: Vec::new(),
            previous: HashMap::new(),
        }
    }

    pub fn observe(&mut self, target: impl Into<String>) {
        let target = target.into();
        if !self.targets.contains(&target) {
            self.targets.push(target);
        }
    }

    pub fn disconnect(&mut self) {
        self.targets.clear();
        self.previous.clear();
    }

    pub fn is_observing(&self) -> bool {
        !self.targets.is_empty()
    }

    pub fn options(&self) -> &ObserverOptions {
        &self.options
    }

    /// Measure every observed target and return the entries whose state
    /// changed. The first measurement of a target is always reported.
    pub fn take_records<F>(&mut self, viewport: Viewport, rect_of: F) -> Vec<IntersectionEntry>
    where
        F: Fn(&str) -> Option<Rect>,
    {
        let band = self.options.band(viewport);
        let mut records = Vec::new();

        for target in &self.targets {
            let Some(rect) = rect_of(target) else {
                continue;
            };
            let (is_intersecting, ratio) = intersect(rect, band);
            let state = (is_intersecting, self.options.threshold_index(ratio));
            if self.previous.get(target) == Some(&state) {
                continue;
            }
            self.previous.insert(target.clone(), state);
            records.push(IntersectionEntry::new(target.clone(), ratio, is_intersecting));
        }

        records
    }
}

/// Edge-adjacent rectangles count as intersecting with a zero ratio, the way
/// browsers report them.
fn intersect(rect: Rect, band: Rect) -> (bool, f64) {
    let is_intersecting = rect.top <= band.bottom() && rect.bottom() >= band.top;
    if !is_intersecting {
        return (false, 0.0);
    }
    if rect.height <= 0.0 {
        return (true, 1.0);
    }
    let overlap = rect.bottom().min(band.bottom()) - rect.top.max(band.top);
    (true, (overlap.max(0.0) / rect.height).min(1.0))
}

/// Pick the next active target from one batch.
///
/// Only intersecting entries with a non-empty target are candidates; the
/// highest ratio wins and ties go to the earliest entry. A batch without
/// candidates keeps `previous`.
pub fn select_active<'a>(
    previous: Option<&'a str>,
    batch: &'a [IntersectionEntry],
) -> Option<&'a str> {
    let mut best: Option<&IntersectionEntry> = None;
    for entry in batch {
        if !entry.is_intersecting || entry.target.is_empty() {
            continue;
        }
        match best {
            Some(current) if ratio_of(entry) <= ratio_of(current) => {}
            _ => best = Some(entry),
        }
    }
    best.map(|entry| entry.target.as_str()).or(previous)
}

fn ratio_of(entry: &IntersectionEntry) -> f64 {
    if entry.ratio.is_nan() { 0.0 } else { entry.ratio }
}

/// Flag the link pointing at `target` and clear all others.
pub fn mark_active(links: &mut [NavLink], target: &str) {
    for link in links.iter_mut() {
        link.active = link.target == target;
    }
}

/// Shared switch that detaches an [`ActiveSpy`]. Cloning it is cheap and any
/// clone may stop the spy.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    stopped: Rc<Cell<bool>>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.stopped.set(true);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.get()
    }
}

/// Keeps a single navigation link flagged as active while the reader scrolls.
#[derive(Debug)]
pub struct ActiveSpy {
    targets: Vec<String>,
    active: Option<String>,
    observer: Option<IntersectionObserver>,
    handle: StopHandle,
}

/// Start tracking `headings`; inert when either list is empty.
pub fn active_spy(headings: &[Heading], links: &[NavLink]) -> ActiveSpy {
    active_spy_with(headings, links, ObserverOptions::default())
}

pub fn active_spy_with(headings: &[Heading], links: &[NavLink], options: ObserverOptions) -> ActiveSpy {
    if headings.is_empty() || links.is_empty() {
        return ActiveSpy::inert();
    }

    let mut observer = IntersectionObserver::new(options);
    for heading in headings {
        if let Some(id) = heading.anchor() {
            observer.observe(id);
        }
    }

    ActiveSpy {
        targets: links.iter().map(|l| l.target.clone()).collect(),
        active: None,
        observer: Some(observer),
        handle: StopHandle::default(),
    }
}

impl ActiveSpy {
    pub fn inert() -> Self {
        Self {
            targets: Vec::new(),
            active: None,
            observer: None,
            handle: StopHandle::default(),
        }
    }

    pub fn is_inert(&self) -> bool {
        self.observer.is_none()
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.handle.clone()
    }

    pub fn stop(&mut self) {
        self.handle.stop();
        self.detach();
    }

    pub fn is_stopped(&self) -> bool {
        self.handle.is_stopped()
    }

    fn detach(&mut self) {
        if let Some(mut observer) = self.observer.take() {
            observer.disconnect();
            logging::debug("active section tracking stopped");
        }
    }

    fn is_live(&mut self) -> bool {
        if self.handle.is_stopped() {
            self.detach();
            return false;
        }
        self.observer.is_some()
    }

    /// Feed one batch of observations. Returns true when the active link
    /// changed.
    pub fn apply(&mut self, batch: &[IntersectionEntry], links: &mut [NavLink]) -> bool {
        if !self.is_live() {
            return false;
        }

        let known: Vec<IntersectionEntry> = batch
            .iter()
            .filter(|e| self.targets.iter().any(|t| *t == e.target))
            .cloned()
            .collect();
        let Some(next) = select_active(self.active.as_deref(), &known).map(str::to_string) else {
            return false;
        };
        if self.active.as_deref() == Some(next.as_str()) {
            return false;
        }

        logging::debug(format!("active section -> {}", next));
        mark_active(links, &next);
        self.active = Some(next);
        true
    }

    /// Measure the current geometry and apply whatever changed.
    pub fn observe<F>(&mut self, viewport: Viewport, rect_of: F, links: &mut [NavLink]) -> bool
    where
        F: Fn(&str) -> Option<Rect>,
    {
        if !self.is_live() {
            return false;
        }
        let batch = match self.observer.as_mut() {
            Some(observer) => observer.take_records(viewport, rect_of),
            None => return false,
        };
        if batch.is_empty() {
            return false;
        }
        self.apply(&batch, links)
    }
}
