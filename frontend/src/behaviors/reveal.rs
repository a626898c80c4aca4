use crate::config::{classes, selectors, BehaviorConfig};
use crate::dom::{Dom, NodeId};
use crate::error::{BehaviorError, Result};
use crate::events::{EventKind, ObserverKind, ObserverOptions, PageEvent};
use crate::page::{Behavior, Context, TriggerRecord};

/// Entrance delay for the element at `index` in a group staggered by
/// `step_ms`.
pub fn stagger_delay(index: usize, step_ms: u32) -> u64 {
    index as u64 * u64::from(step_ms)
}

/// Adds the reveal class to cards and titles the first time they scroll
/// into view, cascading step and feature cards by their sibling position.
pub struct RevealAnimator {
    options: ObserverOptions,
    step_stagger_ms: u32,
    feature_stagger_ms: u32,
    revealed: TriggerRecord,
}

impl RevealAnimator {
    pub fn new(config: &BehaviorConfig) -> Self {
        Self {
            options: config.reveal_options(),
            step_stagger_ms: config.step_stagger_ms,
            feature_stagger_ms: config.feature_stagger_ms,
            revealed: TriggerRecord::default(),
        }
    }

    fn stagger_for(&self, node: NodeId, dom: &dyn Dom) -> Option<u32> {
        if dom.has_class(node, classes::FEATURE_CARD) {
            Some(self.feature_stagger_ms)
        } else if dom.has_class(node, classes::STEP_CARD) {
            Some(self.step_stagger_ms)
        } else {
            None
        }
    }

    fn reveal(&mut self, node: NodeId, ctx: &mut Context<'_>) -> Result<()> {
        if !self.revealed.trigger(node) {
            return Ok(());
        }
        ctx.unobserve(ObserverKind::Reveal, node);

        let dom = ctx.dom();
        if let Some(step_ms) = self.stagger_for(node, dom) {
            let index = dom.sibling_index(node).unwrap_or(0);
            let delay = stagger_delay(index, step_ms);
            dom.set_style(node, "animation-delay", &format!("{delay}ms"))?;
        }
        dom.add_class(node, classes::REVEALED)
    }
}

impl Behavior for RevealAnimator {
    fn name(&self) -> &'static str {
        "reveal-animator"
    }

    fn subscriptions(&self) -> &'static [EventKind] {
        &[EventKind::Intersection]
    }

    fn mount(&mut self, ctx: &mut Context<'_>) -> Result<()> {
        let targets = ctx.dom().query_all(selectors::REVEAL_TARGETS);
        if targets.is_empty() {
            return Err(BehaviorError::MissingElement(selectors::REVEAL_TARGETS));
        }
        for node in targets {
            ctx.observe(ObserverKind::Reveal, &self.options, node);
        }
        Ok(())
    }

    fn handle(&mut self, event: &PageEvent, ctx: &mut Context<'_>) -> Result<()> {
        match event {
            PageEvent::Intersection {
                observer: ObserverKind::Reveal,
                node,
            } => self.reveal(*node, ctx),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::Page;
    use crate::test_utils::{FakeDom, Harness};

    struct Fixture {
        harness: Harness,
        steps: Vec<NodeId>,
        features: Vec<NodeId>,
        title: NodeId,
    }

    fn fixture() -> Fixture {
        let dom = FakeDom::new();
        let body = dom.body_node();
        let title = dom.add_with_class("h2", body, "section-title");

        let steps_grid = dom.add("div", body);
        let steps: Vec<_> = (0..3)
            .map(|_| {
                let card = dom.add_with_class("div", steps_grid, "glass-card");
                dom.add_class(card, classes::STEP_CARD).unwrap();
                card
            })
            .collect();

        let features_grid = dom.add("div", body);
        // A heading before the cards shifts their sibling index by one.
        dom.add("h3", features_grid);
        let features: Vec<_> = (0..2)
            .map(|_| {
                let card = dom.add_with_class("div", features_grid, "glass-card");
                dom.add_class(card, classes::FEATURE_CARD).unwrap();
                card
            })
            .collect();

        let mut targets = vec![title];
        targets.extend(&steps);
        targets.extend(&features);
        dom.register_query(selectors::REVEAL_TARGETS, targets);

        let page = Page::new().with(RevealAnimator::new(&BehaviorConfig::default()));
        let mut harness = Harness::new(dom, page);
        harness.mount();
        Fixture {
            harness,
            steps,
            features,
            title,
        }
    }

    #[test]
    fn observes_with_early_trigger_margin() {
        let fixture = fixture();
        let options = fixture
            .harness
            .observer_options(ObserverKind::Reveal, fixture.title)
            .unwrap();
        assert_eq!(options.threshold, 0.1);
        assert_eq!(options.root_margin.as_deref(), Some("0px 0px -50px 0px"));
    }

    #[test]
    fn step_and_feature_cards_are_staggered_by_sibling_index() {
        let mut fixture = fixture();
        for node in fixture.steps.iter().chain(&fixture.features).copied() {
            fixture.harness.intersect(ObserverKind::Reveal, node);
        }

        let dom = &fixture.harness.dom;
        let step_delays: Vec<_> = fixture
            .steps
            .iter()
            .map(|&node| dom.style(node, "animation-delay").unwrap())
            .collect();
        assert_eq!(step_delays, ["0ms", "200ms", "400ms"]);

        let feature_delays: Vec<_> = fixture
            .features
            .iter()
            .map(|&node| dom.style(node, "animation-delay").unwrap())
            .collect();
        assert_eq!(feature_delays, ["300ms", "600ms"]);
    }

    #[test]
    fn plain_targets_reveal_without_delay() {
        let mut fixture = fixture();
        fixture.harness.intersect(ObserverKind::Reveal, fixture.title);

        let dom = &fixture.harness.dom;
        assert!(dom.has_class(fixture.title, classes::REVEALED));
        assert_eq!(dom.style(fixture.title, "animation-delay"), None);
    }

    #[test]
    fn reveal_is_one_shot() {
        let mut fixture = fixture();
        let card = fixture.steps[1];
        fixture.harness.intersect(ObserverKind::Reveal, card);
        assert!(!fixture.harness.is_observed(ObserverKind::Reveal, card));

        // A stray late entry must not recompute anything.
        fixture
            .harness
            .dom
            .set_style(card, "animation-delay", "9ms")
            .unwrap();
        fixture.harness.dispatch(PageEvent::Intersection {
            observer: ObserverKind::Reveal,
            node: card,
        });
        assert_eq!(
            fixture.harness.dom.style(card, "animation-delay").as_deref(),
            Some("9ms")
        );
    }

    #[test]
    fn other_observers_are_ignored() {
        let mut fixture = fixture();
        fixture.harness.dispatch(PageEvent::Intersection {
            observer: ObserverKind::LazyLoad,
            node: fixture.title,
        });
        assert!(!fixture.harness.dom.has_class(fixture.title, classes::REVEALED));
    }

    #[test]
    fn stagger_delay_scales_with_index() {
        assert_eq!(stagger_delay(0, 200), 0);
        assert_eq!(stagger_delay(4, 300), 1200);
    }
}
