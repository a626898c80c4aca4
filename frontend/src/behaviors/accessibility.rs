use std::collections::HashSet;

use crate::config::{classes, selectors, BehaviorConfig};
use crate::dom::{Dom, NodeId};
use crate::error::{BehaviorError, Result};
use crate::events::{
    Deferred, EventKind, Key, ListenTarget, MediaFeature, ObserverKind, ObserverOptions, PageEvent,
};
use crate::page::{Behavior, Context};

/// Styles that keep a live region readable to assistive technology but
/// off screen.
const VISUALLY_HIDDEN: [(&str, &str); 5] = [
    ("position", "absolute"),
    ("left", "-10000px"),
    ("width", "1px"),
    ("height", "1px"),
    ("overflow", "hidden"),
];

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Preferences {
    pub reduced_motion: bool,
    pub high_contrast: bool,
}

impl Preferences {
    fn get(&self, feature: MediaFeature) -> bool {
        match feature {
            MediaFeature::ReducedMotion => self.reduced_motion,
            MediaFeature::HighContrast => self.high_contrast,
        }
    }

    fn set(&mut self, feature: MediaFeature, matches: bool) {
        match feature {
            MediaFeature::ReducedMotion => self.reduced_motion = matches,
            MediaFeature::HighContrast => self.high_contrast = matches,
        }
    }
}

pub fn announcement_text(heading: &str) -> String {
    format!("Entered {heading} section")
}

/// Keyboard focus styling, user preference mirroring and section-entry
/// announcements for screen readers.
pub struct AccessibilityManager {
    announce_options: ObserverOptions,
    announce_ms: u32,
    body: Option<NodeId>,
    sections: HashSet<NodeId>,
    keyboard_mode: bool,
    preferences: Preferences,
}

impl AccessibilityManager {
    pub fn new(config: &BehaviorConfig) -> Self {
        Self {
            announce_options: config.announce_options(),
            announce_ms: config.announce_duration_ms,
            body: None,
            sections: HashSet::new(),
            keyboard_mode: false,
            preferences: Preferences::default(),
        }
    }

    pub fn preferences(&self) -> Preferences {
        self.preferences
    }

    fn set_keyboard_mode(&mut self, enabled: bool, dom: &dyn Dom) -> Result<()> {
        if self.keyboard_mode == enabled {
            return Ok(());
        }
        self.keyboard_mode = enabled;
        let Some(body) = self.body else {
            return Ok(());
        };
        if enabled {
            dom.add_class(body, classes::KEYBOARD_NAVIGATION)
        } else {
            dom.remove_class(body, classes::KEYBOARD_NAVIGATION)
        }
    }

    fn set_preference(&mut self, feature: MediaFeature, matches: bool, dom: &dyn Dom) -> Result<()> {
        if self.preferences.get(feature) == matches {
            return Ok(());
        }
        self.preferences.set(feature, matches);
        log::info!("{} now {}", feature.query(), matches);

        let Some(body) = self.body else {
            return Ok(());
        };
        let marker = match feature {
            MediaFeature::ReducedMotion => classes::REDUCED_MOTION,
            MediaFeature::HighContrast => classes::HIGH_CONTRAST,
        };
        if matches {
            dom.add_class(body, marker)?;
        } else {
            dom.remove_class(body, marker)?;
        }

        if feature == MediaFeature::ReducedMotion {
            for node in dom.query_all(selectors::AMBIENT_ANIMATIONS) {
                if matches {
                    dom.set_style(node, "animation", "none")?;
                } else {
                    dom.remove_style(node, "animation")?;
                }
            }
        }
        Ok(())
    }

    fn announce_section(&self, section: NodeId, ctx: &mut Context<'_>) -> Result<()> {
        let dom = ctx.dom();
        if dom.attribute(section, "id").map_or(true, |id| id.is_empty()) {
            return Ok(());
        }
        let Some(heading) = dom.query_within(section, selectors::HEADINGS).first().copied() else {
            return Ok(());
        };
        let title = dom.text(heading).unwrap_or_default();
        let title = title.trim();
        if title.is_empty() {
            return Ok(());
        }
        self.announce(&announcement_text(title), ctx)
    }

    /// Appends a fresh live region holding `message` and schedules its
    /// removal. Overlapping announcements each get their own node.
    fn announce(&self, message: &str, ctx: &mut Context<'_>) -> Result<()> {
        let body = self.body.ok_or(BehaviorError::MissingElement("body"))?;
        let dom = ctx.dom();
        let region = dom.create_element("div")?;
        dom.set_attribute(region, "aria-live", "polite")?;
        dom.set_attribute(region, "aria-atomic", "true")?;
        for (property, value) in VISUALLY_HIDDEN {
            dom.set_style(region, property, value)?;
        }
        dom.set_text(region, message)?;
        dom.append_child(body, region)?;
        ctx.set_timeout(self.announce_ms, Deferred::RemoveAnnouncement(region));
        Ok(())
    }
}

impl Behavior for AccessibilityManager {
    fn name(&self) -> &'static str {
        "accessibility"
    }

    fn subscriptions(&self) -> &'static [EventKind] {
        &[
            EventKind::KeyDown,
            EventKind::PointerDown,
            EventKind::MediaChange,
            EventKind::Intersection,
            EventKind::Deferred,
        ]
    }

    fn mount(&mut self, ctx: &mut Context<'_>) -> Result<()> {
        let dom = ctx.dom();
        self.body = Some(dom.body().ok_or(BehaviorError::MissingElement("body"))?);

        ctx.listen(ListenTarget::Document, EventKind::KeyDown);
        ctx.listen(ListenTarget::Document, EventKind::PointerDown);

        for feature in [MediaFeature::ReducedMotion, MediaFeature::HighContrast] {
            self.set_preference(feature, dom.media_matches(feature.query()), dom)?;
            ctx.listen(ListenTarget::Media(feature), EventKind::MediaChange);
        }

        self.sections = dom.query_all(selectors::SECTIONS).into_iter().collect();
        let mut sections: Vec<NodeId> = self.sections.iter().copied().collect();
        sections.sort();
        for section in sections {
            ctx.observe(ObserverKind::SectionAnnounce, &self.announce_options, section);
        }
        Ok(())
    }

    fn handle(&mut self, event: &PageEvent, ctx: &mut Context<'_>) -> Result<()> {
        match event {
            PageEvent::KeyDown { key: Key::Tab } => self.set_keyboard_mode(true, ctx.dom()),
            PageEvent::PointerDown => self.set_keyboard_mode(false, ctx.dom()),
            PageEvent::MediaChange { feature, matches } => {
                self.set_preference(*feature, *matches, ctx.dom())
            }
            PageEvent::Intersection {
                observer: ObserverKind::SectionAnnounce,
                node,
            } if self.sections.contains(node) => self.announce_section(*node, ctx),
            PageEvent::Deferred {
                task: Deferred::RemoveAnnouncement(region),
                ..
            } => {
                ctx.dom().remove(*region);
                Ok(())
            }
            _ => Ok(()),
        }
    }
}
