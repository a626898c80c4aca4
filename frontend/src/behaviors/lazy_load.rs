use crate::config::{classes, selectors};
use crate::dom::{Dom, NodeId};
use crate::error::{BehaviorError, Result};
use crate::events::{EventKind, ObserverKind, ObserverOptions, PageEvent};
use crate::page::{Behavior, Context, TriggerRecord};

const LAZY_KIND: &str = "data-lazy";
const LAZY_SOURCE: &str = "data-src";

/// Loads deferred background images once their element becomes visible.
#[derive(Default)]
pub struct LazyLoader {
    loaded: TriggerRecord,
}

impl LazyLoader {
    pub fn new() -> Self {
        Self::default()
    }

    fn load(&mut self, node: NodeId, ctx: &mut Context<'_>) -> Result<()> {
        if !self.loaded.trigger(node) {
            return Ok(());
        }
        ctx.unobserve(ObserverKind::LazyLoad, node);

        let dom = ctx.dom();
        if dom.attribute(node, LAZY_KIND).as_deref() == Some("background") {
            match dom.attribute(node, LAZY_SOURCE) {
                Some(src) => dom.set_style(node, "background-image", &format!("url({src})"))?,
                None => log::warn!("{} is a lazy background without {}", node, LAZY_SOURCE),
            }
        }
        dom.add_class(node, classes::LOADED)
    }
}

impl Behavior for LazyLoader {
    fn name(&self) -> &'static str {
        "lazy-loader"
    }

    fn subscriptions(&self) -> &'static [EventKind] {
        &[EventKind::Intersection]
    }

    fn mount(&mut self, ctx: &mut Context<'_>) -> Result<()> {
        let deferred = ctx.dom().query_all(selectors::LAZY);
        if deferred.is_empty() {
            return Err(BehaviorError::MissingElement(selectors::LAZY));
        }
        let options = ObserverOptions::default();
        for node in deferred {
            ctx.observe(ObserverKind::LazyLoad, &options, node);
        }
        Ok(())
    }

    fn handle(&mut self, event: &PageEvent, ctx: &mut Context<'_>) -> Result<()> {
        match event {
            PageEvent::Intersection {
                observer: ObserverKind::LazyLoad,
                node,
            } => self.load(*node, ctx),
            _ => Ok(()),
        }
    }
}
