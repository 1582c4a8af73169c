use std::time::Duration;

use crate::anchors::AnchorRegistry;
use crate::clipboard::copy_text;
use crate::env::Environment;
use crate::location::{decode_hash, fragment, with_fragment};
use crate::logging;
use crate::models::{IntersectionEntry, NavLink, Toc};
use crate::scheduler::TimerId;
use crate::spy::{ActiveSpy, StopHandle, active_spy};
use crate::toast::{Toast, ToastKind};
use crate::toc::{DocumentRoot, NavContainer, build_toc_with};

/// Scroll offset past which the back-to-top affordance shows.
pub const BACK_TOP_THRESHOLD: f64 = 280.0;

pub const SECTION_LINK_COPIED: &str = "Section link copied";
pub const PAGE_LINK_COPIED: &str = "Page link copied";
pub const COPY_FAILED: &str = "Copy failed, please copy the link from the address bar";

/// A host element the controller wires up. `visible` mirrors the `is-show`
/// flag for elements that toggle.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Affordance {
    pub visible: bool,
}

/// Everything is optional; a missing element only disables its own feature.
#[derive(Debug, Clone, Default)]
pub struct PageOptions {
    pub nav_container: Option<NavContainer>,
    pub document_root: Option<DocumentRoot>,
    pub back_top: Option<Affordance>,
    pub copy_page_link: Option<Affordance>,
    pub back: Option<Affordance>,
    pub fallback_back_url: Option<String>,
    pub back_top_threshold: Option<f64>,
    pub toast_duration_ms: Option<u64>,
}

impl PageOptions {
    /// Options with every affordance present.
    pub fn full(document_root: DocumentRoot, nav_container: NavContainer) -> Self {
        Self {
            nav_container: Some(nav_container),
            document_root: Some(document_root),
            back_top: Some(Affordance::default()),
            copy_page_link: Some(Affordance::default()),
            back: Some(Affordance::default()),
            ..Self::default()
        }
    }
}

/// User interaction and platform callbacks delivered to the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum PageEvent {
    /// The anchor affordance of the heading at this index was activated.
    HeadingAnchorClicked(usize),
    /// The TOC link at this index was activated.
    TocLinkClicked(usize),
    BackTopClicked,
    CopyPageLinkClicked,
    BackClicked,
    Scrolled,
    Intersections(Vec<IntersectionEntry>),
    TimerFired(TimerId),
}

pub struct PageController {
    document_root: Option<DocumentRoot>,
    nav_container: Option<NavContainer>,
    back_top: Option<Affordance>,
    copy_page_link: Option<Affordance>,
    back: Option<Affordance>,
    fallback_back_url: String,
    back_top_threshold: f64,
    registry: AnchorRegistry,
    toc: Toc,
    spy: ActiveSpy,
    toast: Toast,
    deferred_scroll: Option<TimerId>,
}

impl PageController {
    /// Build the TOC, start tracking, wire the affordances and schedule the
    /// initial deep-link scroll for the next turn.
    pub fn init<E>(options: PageOptions, env: &mut E) -> Self
    where
        E: Environment + ?Sized,
    {
        let mut document_root = options.document_root;
        let mut nav_container = options.nav_container;
        let mut registry = AnchorRegistry::new();

        let toc = build_toc_with(document_root.as_mut(), nav_container.as_mut(), &mut registry);
        let spy = active_spy(&toc.headings, &toc.links);

        let mut toast = Toast::new();
        if let Some(ms) = options.toast_duration_ms {
            toast = toast.with_default_duration(ms);
        }

        let mut controller = Self {
            document_root,
            nav_container,
            back_top: options.back_top,
            copy_page_link: options.copy_page_link,
            back: options.back,
            fallback_back_url: options.fallback_back_url.unwrap_or_default(),
            back_top_threshold: options.back_top_threshold.unwrap_or(BACK_TOP_THRESHOLD),
            registry,
            toc,
            spy,
            toast,
            deferred_scroll: None,
        };

        controller.update_back_top(env);
        controller.deferred_scroll = Some(env.set_timeout(Duration::ZERO));

        logging::info(format!(
            "page ready: {} sections, tracking {}",
            controller.toc.links.len(),
            if controller.spy.is_inert() { "off" } else { "on" }
        ));
        controller
    }

    pub fn handle<E>(&mut self, event: PageEvent, env: &mut E)
    where
        E: Environment + ?Sized,
    {
        match event {
            PageEvent::HeadingAnchorClicked(index) => self.copy_section_link(index, env),
            PageEvent::TocLinkClicked(index) => self.follow_toc_link(index, env),
            PageEvent::BackTopClicked => {
                if self.back_top.is_some() {
                    env.scroll_to_top();
                }
            }
            PageEvent::CopyPageLinkClicked => {
                if self.copy_page_link.is_some() {
                    let href = env.location();
                    let copied = copy_text(env, &href);
                    self.notify_copy(env, copied, PAGE_LINK_COPIED);
                }
            }
            PageEvent::BackClicked => self.go_back(env),
            PageEvent::Scrolled => {
                self.update_back_top(env);
                self.measure(env);
            }
            PageEvent::Intersections(batch) => {
                if let Some(nav) = self.nav_container.as_mut() {
                    self.spy.apply(&batch, &mut nav.links);
                }
            }
            PageEvent::TimerFired(id) => self.fire_timer(id, env),
        }
    }

    /// Stop section tracking. Anchors, links and the other affordances stay.
    pub fn destroy(&mut self) {
        self.spy.stop();
    }

    pub fn teardown_handle(&self) -> StopHandle {
        self.spy.stop_handle()
    }

    pub fn is_tracking(&self) -> bool {
        !self.spy.is_inert() && !self.spy.is_stopped()
    }

    pub fn toc(&self) -> &Toc {
        &self.toc
    }

    pub fn document_root(&self) -> Option<&DocumentRoot> {
        self.document_root.as_ref()
    }

    pub fn nav_container(&self) -> Option<&NavContainer> {
        self.nav_container.as_ref()
    }

    pub fn links(&self) -> &[NavLink] {
        self.nav_container
            .as_ref()
            .map(|nav| nav.links.as_slice())
            .unwrap_or(&[])
    }

    pub fn active(&self) -> Option<&str> {
        self.spy.active()
    }

    pub fn active_index(&self) -> Option<usize> {
        self.nav_container.as_ref().and_then(NavContainer::active_index)
    }

    pub fn toast(&self) -> &Toast {
        &self.toast
    }

    pub fn anchors(&self) -> &AnchorRegistry {
        &self.registry
    }

    pub fn back_top_visible(&self) -> bool {
        self.back_top.as_ref().is_some_and(|a| a.visible)
    }

    pub fn has_back(&self) -> bool {
        self.back.is_some()
    }

    fn copy_section_link<E>(&mut self, index: usize, env: &mut E)
    where
        E: Environment + ?Sized,
    {
        let Some(id) = self
            .document_root
            .as_ref()
            .and_then(|root| root.headings.get(index))
            .filter(|heading| heading.decorated)
            .and_then(|heading| heading.anchor())
            .map(str::to_string)
        else {
            return;
        };

        let url = with_fragment(&env.location(), &id);
        let copied = copy_text(env, &url);
        self.notify_copy(env, copied, SECTION_LINK_COPIED);
        env.replace_url(&url);
    }

    fn follow_toc_link<E>(&mut self, index: usize, env: &mut E)
    where
        E: Environment + ?Sized,
    {
        let Some(target) = self.links().get(index).map(|link| link.target.clone()) else {
            return;
        };
        let url = with_fragment(&env.location(), &target);
        env.replace_url(&url);
        scroll_to_hash(env, &target);
    }

    fn go_back<E>(&mut self, env: &mut E)
    where
        E: Environment + ?Sized,
    {
        if self.back.is_none() {
            return;
        }
        if env.history_len() > 1 {
            env.history_back();
        } else if !self.fallback_back_url.is_empty() {
            env.navigate(&self.fallback_back_url);
        }
    }

    fn notify_copy<E>(&mut self, env: &mut E, copied: bool, success: &str)
    where
        E: Environment + ?Sized,
    {
        if copied {
            self.toast.show(env, success, ToastKind::Info, None);
        } else {
            self.toast.show(env, COPY_FAILED, ToastKind::Error, None);
        }
    }

    fn update_back_top<E>(&mut self, env: &E)
    where
        E: Environment + ?Sized,
    {
        let threshold = self.back_top_threshold;
        if let Some(back_top) = self.back_top.as_mut() {
            back_top.visible = env.scroll_y() > threshold;
        }
    }

    fn measure<E>(&mut self, env: &E)
    where
        E: Environment + ?Sized,
    {
        let Some(nav) = self.nav_container.as_mut() else {
            return;
        };
        self.spy
            .observe(env.viewport(), |id| env.element_rect(id), &mut nav.links);
    }

    fn fire_timer<E>(&mut self, id: TimerId, env: &mut E)
    where
        E: Environment + ?Sized,
    {
        if self.toast.on_timer(id) {
            return;
        }
        if self.deferred_scroll == Some(id) {
            self.deferred_scroll = None;
            if let Some(target) = fragment(&env.location()) {
                scroll_to_hash(env, &target);
            }
            self.measure(env);
        }
    }
}

/// Scroll to the element named by `hash`; unknown or empty targets do nothing.
pub fn scroll_to_hash<E>(env: &mut E, hash: &str) -> bool
where
    E: Environment + ?Sized,
{
    let id = decode_hash(hash);
    if id.is_empty() {
        return false;
    }
    env.scroll_into_view(&id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::mock::{MockEnvironment, Outcome};
    use crate::models::{Heading, HeadingLevel, Rect};

    const PAGE: &str = "https://example.com/guide.html";

    fn document(labels: &[&str]) -> DocumentRoot {
        DocumentRoot::new(
            labels
                .iter()
                .map(|label| Heading::new(HeadingLevel::H2, *label))
                .collect(),
        )
    }

    #[test]
    fn test_init_builds_toc_and_defers_scroll() {
        let mut env = MockEnvironment::new(PAGE);
        let page = PageController::init(PageOptions::full(document(&["Intro", "Intro"]), NavContainer::new()), &mut env);

        let targets: Vec<&str> = page.links().iter().map(|l| l.target.as_str()).collect();
        assert_eq!(targets, vec!["intro", "intro-2"]);
        assert!(page.is_tracking());
        assert_eq!(env.timers.len(), 1);
        assert_eq!(page.anchors().len(), 2);
    }

    #[test]
    fn test_missing_everything_is_inert() {
        let mut env = MockEnvironment::new(PAGE);
        let mut page = PageController::init(PageOptions::default(), &mut env);
        assert!(page.toc().is_empty());
        assert!(!page.is_tracking());

        page.handle(PageEvent::HeadingAnchorClicked(0), &mut env);
        page.handle(PageEvent::TocLinkClicked(0), &mut env);
        page.handle(PageEvent::BackClicked, &mut env);
        page.handle(PageEvent::CopyPageLinkClicked, &mut env);
        page.handle(PageEvent::BackTopClicked, &mut env);
        assert!(env.replaced_urls.is_empty());
        assert!(env.clipboard.is_none());
        assert_eq!(env.back_calls, 0);
        assert_eq!(env.top_scrolls, 0);
    }

    #[test]
    fn test_heading_click_copies_deep_link() {
        let mut env = MockEnvironment::new(PAGE);
        let mut page = PageController::init(PageOptions::full(document(&["Intro", "Usage"]), NavContainer::new()), &mut env);

        page.handle(PageEvent::HeadingAnchorClicked(1), &mut env);
        assert_eq!(env.clipboard.as_deref(), Some("https://example.com/guide.html#usage"));
        assert_eq!(env.href, "https://example.com/guide.html#usage");
        assert_eq!(env.history_len, 1);
        assert_eq!(page.toast().message(), SECTION_LINK_COPIED);
        assert_eq!(page.toast().kind(), ToastKind::Info);
    }

    #[test]
    fn test_failed_copy_still_replaces_url() {
        let mut env = MockEnvironment::new(PAGE).with_clipboard(true, Outcome::Error, Outcome::Fail);
        let mut page = PageController::init(PageOptions::full(document(&["Intro"]), NavContainer::new()), &mut env);

        page.handle(PageEvent::HeadingAnchorClicked(0), &mut env);
        assert_eq!(page.toast().message(), COPY_FAILED);
        assert_eq!(page.toast().kind(), ToastKind::Error);
        assert_eq!(env.href, "https://example.com/guide.html#intro");
    }

    #[test]
    fn test_toc_click_replaces_url_and_scrolls() {
        let mut env = MockEnvironment::new(PAGE).with_element("usage", Rect::new(900.0, 30.0));
        let mut page = PageController::init(PageOptions::full(document(&["Intro", "Usage"]), NavContainer::new()), &mut env);

        page.handle(PageEvent::TocLinkClicked(1), &mut env);
        assert_eq!(env.replaced_urls, vec!["https://example.com/guide.html#usage"]);
        assert_eq!(env.scrolled_to, vec!["usage"]);
        assert!(env.clipboard.is_none());
    }

    #[test]
    fn test_back_prefers_history() {
        let mut env = MockEnvironment::new(PAGE);
        env.history_len = 3;
        let mut options = PageOptions::full(document(&[]), NavContainer::new());
        options.fallback_back_url = Some("https://example.com/".to_string());
        let mut page = PageController::init(options, &mut env);

        page.handle(PageEvent::BackClicked, &mut env);
        assert_eq!(env.back_calls, 1);
        assert!(env.navigations.is_empty());
    }

    #[test]
    fn test_back_uses_fallback_then_noop() {
        let mut env = MockEnvironment::new(PAGE);
        let mut options = PageOptions::full(document(&[]), NavContainer::new());
        options.fallback_back_url = Some("https://example.com/".to_string());
        let mut page = PageController::init(options, &mut env);
        page.handle(PageEvent::BackClicked, &mut env);
        assert_eq!(env.navigations, vec!["https://example.com/"]);

        let mut env = MockEnvironment::new(PAGE);
        let mut page = PageController::init(PageOptions::full(document(&[]), NavContainer::new()), &mut env);
        page.handle(PageEvent::BackClicked, &mut env);
        assert!(env.navigations.is_empty());
        assert_eq!(env.back_calls, 0);
    }

    #[test]
    fn test_back_top_threshold() {
        let mut env = MockEnvironment::new(PAGE);
        let mut page = PageController::init(PageOptions::full(document(&["A"]), NavContainer::new()), &mut env);
        assert!(!page.back_top_visible());

        env.scroll_y = 280.0;
        page.handle(PageEvent::Scrolled, &mut env);
        assert!(!page.back_top_visible());

        env.scroll_y = 281.0;
        page.handle(PageEvent::Scrolled, &mut env);
        assert!(page.back_top_visible());

        page.handle(PageEvent::BackTopClicked, &mut env);
        page.handle(PageEvent::Scrolled, &mut env);
        assert_eq!(env.top_scrolls, 1);
        assert!(!page.back_top_visible());
    }

    #[test]
    fn test_initial_hash_scroll_is_deferred() {
        let mut env = MockEnvironment::new("https://example.com/guide.html#usage")
            .with_element("usage", Rect::new(1200.0, 30.0));
        let mut page = PageController::init(PageOptions::full(document(&["Intro", "Usage"]), NavContainer::new()), &mut env);
        assert!(env.scrolled_to.is_empty());

        for id in env.advance(0) {
            page.handle(PageEvent::TimerFired(id), &mut env);
        }
        assert_eq!(env.scrolled_to, vec!["usage"]);
    }

    #[test]
    fn test_toast_timer_hides_message() {
        let mut env = MockEnvironment::new(PAGE);
        let mut page = PageController::init(PageOptions::full(document(&["Intro"]), NavContainer::new()), &mut env);
        page.handle(PageEvent::CopyPageLinkClicked, &mut env);
        assert_eq!(env.clipboard.as_deref(), Some(PAGE));
        assert!(page.toast().is_visible());

        for id in env.advance(1400) {
            page.handle(PageEvent::TimerFired(id), &mut env);
        }
        assert!(!page.toast().is_visible());
    }

    #[test]
    fn test_destroy_stops_tracking_only() {
        let mut env = MockEnvironment::new(PAGE);
        let mut page = PageController::init(PageOptions::full(document(&["A", "B"]), NavContainer::new()), &mut env);
        page.handle(
            PageEvent::Intersections(vec![IntersectionEntry::new("a", 0.5, true)]),
            &mut env,
        );
        assert_eq!(page.active(), Some("a"));

        page.destroy();
        page.handle(
            PageEvent::Intersections(vec![IntersectionEntry::new("b", 0.9, true)]),
            &mut env,
        );
        assert_eq!(page.active_index(), Some(0));
        assert_eq!(page.links().len(), 2);

        page.handle(PageEvent::HeadingAnchorClicked(1), &mut env);
        assert_eq!(env.clipboard.as_deref(), Some("https://example.com/guide.html#b"));
    }
}
