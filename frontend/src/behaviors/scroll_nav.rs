use crate::config::{classes, selectors, BehaviorConfig};
use crate::dom::{Dom, NodeId};
use crate::error::{BehaviorError, Result};
use crate::events::{Deferred, EventKind, FrameToken, ListenTarget, PageEvent};
use crate::page::{Behavior, Context};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectionBounds {
    pub top: f64,
    pub height: f64,
}

impl SectionBounds {
    fn contains(&self, position: f64) -> bool {
        position >= self.top && position < self.top + self.height
    }
}

/// Index of the section under `position`. Sections may overlap; the last
/// one in document order wins.
pub fn section_at(sections: &[SectionBounds], position: f64) -> Option<usize> {
    sections.iter().rposition(|section| section.contains(position))
}

#[derive(Debug, Clone)]
struct NavLink {
    node: NodeId,
    /// Fragment without the leading `#`.
    target: String,
}

/// Smooth-scrolls in-page nav links and keeps the link of the section in
/// view marked active.
pub struct ScrollNavigator {
    header_offset: f64,
    line_offset: f64,
    links: Vec<NavLink>,
    sections: Vec<NodeId>,
    active: Option<NodeId>,
    pending_frame: Option<FrameToken>,
}

impl ScrollNavigator {
    pub fn new(config: &BehaviorConfig) -> Self {
        Self {
            header_offset: config.header_offset_px,
            line_offset: config.active_line_offset_px,
            links: Vec::new(),
            sections: Vec::new(),
            active: None,
            pending_frame: None,
        }
    }

    fn scroll_to_target(&self, link: &NavLink, dom: &dyn Dom) {
        if link.target.is_empty() {
            return;
        }
        match dom.element_by_id(&link.target) {
            Some(section) => dom.scroll_to(dom.offset_top(section) - self.header_offset),
            None => log::debug!("No section #{} to scroll to", link.target),
        }
    }

    fn schedule_recompute(&mut self, ctx: &mut Context<'_>) {
        if let Some(token) = self.pending_frame.take() {
            ctx.cancel_frame(token);
        }
        self.pending_frame = Some(ctx.request_frame(Deferred::RecomputeActiveSection));
    }

    fn recompute(&mut self, dom: &dyn Dom) -> Result<()> {
        let bounds: Vec<SectionBounds> = self
            .sections
            .iter()
            .map(|&section| SectionBounds {
                top: dom.offset_top(section),
                height: dom.offset_height(section),
            })
            .collect();

        let Some(index) = section_at(&bounds, dom.scroll_y() + self.line_offset) else {
            return Ok(());
        };
        let section_id = dom.attribute(self.sections[index], "id").unwrap_or_default();
        let active = self
            .links
            .iter()
            .find(|link| link.target == section_id)
            .map(|link| link.node);

        for link in &self.links {
            dom.remove_class(link.node, classes::ACTIVE)?;
        }
        if let Some(link) = active {
            dom.add_class(link, classes::ACTIVE)?;
        }
        self.active = active;
        Ok(())
    }
}

impl Behavior for ScrollNavigator {
    fn name(&self) -> &'static str {
        "scroll-navigator"
    }

    fn subscriptions(&self) -> &'static [EventKind] {
        &[EventKind::Click, EventKind::Scroll, EventKind::Deferred]
    }

    fn mount(&mut self, ctx: &mut Context<'_>) -> Result<()> {
        let dom = ctx.dom();
        self.links = dom
            .query_all(selectors::NAV_ANCHORS)
            .into_iter()
            .map(|node| NavLink {
                node,
                target: dom
                    .attribute(node, "href")
                    .map(|href| href.strip_prefix('#').unwrap_or(&href).to_string())
                    .unwrap_or_default(),
            })
            .collect();
        if self.links.is_empty() {
            return Err(BehaviorError::MissingElement(selectors::NAV_ANCHORS));
        }
        self.sections = dom.query_all(selectors::SECTIONS);

        for link in &self.links {
            ctx.listen(ListenTarget::Node(link.node), EventKind::Click);
        }
        ctx.listen(ListenTarget::Window, EventKind::Scroll);
        Ok(())
    }

    fn handle(&mut self, event: &PageEvent, ctx: &mut Context<'_>) -> Result<()> {
        match event {
            PageEvent::Click { node, .. } => {
                if let Some(link) = self.links.iter().find(|link| link.node == *node) {
                    ctx.prevent_default();
                    self.scroll_to_target(link, ctx.dom());
                }
            }
            PageEvent::Scroll => self.schedule_recompute(ctx),
            PageEvent::Deferred {
                task: Deferred::RecomputeActiveSection,
                ..
            } => {
                self.pending_frame = None;
                self.recompute(ctx.dom())?;
            }
            _ => {}
        }
        Ok(())
    }
}
