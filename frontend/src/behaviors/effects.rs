use std::collections::HashSet;

use crate::config::{selectors, BehaviorConfig};
use crate::dom::{Dom, NodeId, Rect};
use crate::error::{BehaviorError, Result};
use crate::events::{Deferred, EventKind, ListenTarget, PageEvent};
use crate::page::{Behavior, Context};

const LIFTED: &str = "translateY(-2px) scale(1.05)";
const RESTING: &str = "translateY(0) scale(1)";
const CARD_HOVER_BACKGROUND: &str = "rgba(255, 255, 255, 0.15)";
const CARD_BACKGROUND: &str = "rgba(255, 255, 255, 0.1)";

/// Geometry of a click ripple, relative to the clicked control.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ripple {
    pub size: f64,
    pub left: f64,
    pub top: f64,
}

impl Ripple {
    /// A circle as large as the control's longer side, centred on the click.
    pub fn centered_at(rect: Rect, client_x: f64, client_y: f64) -> Self {
        let size = rect.width.max(rect.height);
        Self {
            size,
            left: client_x - rect.left - size / 2.0,
            top: client_y - rect.top - size / 2.0,
        }
    }

    pub fn style(&self, duration_ms: u32) -> Vec<(&'static str, String)> {
        vec![
            ("position", "absolute".to_string()),
            ("width", format!("{}px", self.size)),
            ("height", format!("{}px", self.size)),
            ("left", format!("{}px", self.left)),
            ("top", format!("{}px", self.top)),
            ("background", "rgba(255, 255, 255, 0.3)".to_string()),
            ("border-radius", "50%".to_string()),
            ("transform", "scale(0)".to_string()),
            (
                "animation",
                format!("ripple {}s linear", f64::from(duration_ms) / 1000.0),
            ),
            ("pointer-events", "none".to_string()),
        ]
    }
}

/// Hover lift and click ripple on buttons, translucency change on cards.
pub struct InteractionEffects {
    ripple_ms: u32,
    buttons: HashSet<NodeId>,
    cards: HashSet<NodeId>,
}

impl InteractionEffects {
    pub fn new(config: &BehaviorConfig) -> Self {
        Self {
            ripple_ms: config.ripple_duration_ms,
            buttons: HashSet::new(),
            cards: HashSet::new(),
        }
    }

    fn hover(&self, node: NodeId, entered: bool, dom: &dyn Dom) -> Result<()> {
        if self.buttons.contains(&node) {
            dom.set_style(node, "transform", if entered { LIFTED } else { RESTING })?;
        }
        if self.cards.contains(&node) {
            let background = if entered {
                CARD_HOVER_BACKGROUND
            } else {
                CARD_BACKGROUND
            };
            dom.set_style(node, "background", background)?;
        }
        Ok(())
    }

    fn spawn_ripple(
        &self,
        button: NodeId,
        client_x: f64,
        client_y: f64,
        ctx: &mut Context<'_>,
    ) -> Result<()> {
        let dom = ctx.dom();
        let ripple = Ripple::centered_at(dom.bounding_rect(button), client_x, client_y);
        let overlay = dom.create_element("span")?;
        for (property, value) in ripple.style(self.ripple_ms) {
            dom.set_style(overlay, property, &value)?;
        }
        dom.append_child(button, overlay)?;
        ctx.set_timeout(self.ripple_ms, Deferred::RemoveRipple(overlay));
        Ok(())
    }
}

impl Behavior for InteractionEffects {
    fn name(&self) -> &'static str {
        "interaction-effects"
    }

    fn subscriptions(&self) -> &'static [EventKind] {
        &[
            EventKind::PointerEnter,
            EventKind::PointerLeave,
            EventKind::Click,
            EventKind::Deferred,
        ]
    }

    fn mount(&mut self, ctx: &mut Context<'_>) -> Result<()> {
        let dom = ctx.dom();
        self.buttons = dom.query_all(selectors::BUTTONS).into_iter().collect();
        self.cards = dom.query_all(selectors::CARDS).into_iter().collect();
        if self.buttons.is_empty() && self.cards.is_empty() {
            return Err(BehaviorError::MissingElement(selectors::BUTTONS));
        }

        let mut hoverable: Vec<NodeId> = self.buttons.union(&self.cards).copied().collect();
        hoverable.sort();
        for node in hoverable {
            ctx.listen(ListenTarget::Node(node), EventKind::PointerEnter);
            ctx.listen(ListenTarget::Node(node), EventKind::PointerLeave);
            if self.buttons.contains(&node) {
                ctx.listen(ListenTarget::Node(node), EventKind::Click);
            }
        }
        Ok(())
    }

    fn handle(&mut self, event: &PageEvent, ctx: &mut Context<'_>) -> Result<()> {
        match *event {
            PageEvent::PointerEnter { node } => self.hover(node, true, ctx.dom()),
            PageEvent::PointerLeave { node } => self.hover(node, false, ctx.dom()),
            PageEvent::Click {
                node,
                client_x,
                client_y,
            } if self.buttons.contains(&node) => self.spawn_ripple(node, client_x, client_y, ctx),
            PageEvent::Deferred {
                task: Deferred::RemoveRipple(overlay),
                ..
            } => {
                ctx.dom().remove(overlay);
                Ok(())
            }
            _ => Ok(()),
        }
    }
}
