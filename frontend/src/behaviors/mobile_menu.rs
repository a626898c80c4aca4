use crate::config::{classes, selectors, BehaviorConfig};
use crate::dom::{Dom, NodeId};
use crate::error::{BehaviorError, Result};
use crate::events::{EventKind, Key, ListenTarget, PageEvent};
use crate::page::{Behavior, Context};

const MENU_ID: &str = "nav-links";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MenuState {
    #[default]
    Closed,
    Open,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuInput {
    Toggle,
    LinkActivated,
    OutsidePress,
    Escape,
    DesktopViewport,
}

impl MenuState {
    /// Toggling flips the state; every other input closes the menu.
    pub fn next(self, input: MenuInput) -> MenuState {
        match (self, input) {
            (MenuState::Closed, MenuInput::Toggle) => MenuState::Open,
            (MenuState::Open, MenuInput::Toggle) => MenuState::Closed,
            (_, _) => MenuState::Closed,
        }
    }

    pub fn is_open(self) -> bool {
        self == MenuState::Open
    }
}

struct MenuParts {
    toggle: NodeId,
    menu: NodeId,
    container: Option<NodeId>,
    body: Option<NodeId>,
    links: Vec<NodeId>,
}

impl MenuParts {
    /// The region a click must land outside of to close the menu.
    fn inside(&self) -> NodeId {
        self.container.unwrap_or(self.menu)
    }

    /// Every element carrying an open marker, with the marker it carries.
    fn markers(&self) -> Vec<(NodeId, &'static str)> {
        let mut markers = vec![
            (self.toggle, classes::ACTIVE),
            (self.menu, classes::MENU_OPEN),
        ];
        markers.extend(self.container.map(|node| (node, classes::CONTAINER_OPEN)));
        markers.extend(self.body.map(|node| (node, classes::CONTAINER_OPEN)));
        markers
    }
}

/// Open/close state machine for the collapsible navigation menu. The DOM
/// markers are a projection of `state`, rewritten on every transition.
pub struct MobileMenuController {
    breakpoint: f64,
    state: MenuState,
    parts: Option<MenuParts>,
}

impl MobileMenuController {
    pub fn new(config: &BehaviorConfig) -> Self {
        Self {
            breakpoint: config.mobile_breakpoint_px,
            state: MenuState::Closed,
            parts: None,
        }
    }

    fn apply(&mut self, input: MenuInput, dom: &dyn Dom) -> Result<()> {
        let next = self.state.next(input);
        if next == self.state {
            return Ok(());
        }
        self.state = next;
        log::debug!("Mobile menu {:?} after {:?}", next, input);
        self.render(dom)
    }

    fn render(&self, dom: &dyn Dom) -> Result<()> {
        let Some(parts) = &self.parts else {
            return Ok(());
        };
        let open = self.state.is_open();
        for (node, class) in parts.markers() {
            if open {
                dom.add_class(node, class)?;
            } else {
                dom.remove_class(node, class)?;
            }
        }
        dom.set_attribute(parts.toggle, "aria-expanded", bool_attr(open))?;
        dom.set_attribute(parts.menu, "aria-hidden", bool_attr(!open))?;
        Ok(())
    }

    fn input_for(&self, event: &PageEvent, dom: &dyn Dom) -> Option<MenuInput> {
        let parts = self.parts.as_ref()?;
        match event {
            PageEvent::Click { node, .. } if *node == parts.toggle => Some(MenuInput::Toggle),
            PageEvent::Click { node, .. } if parts.links.contains(node) => {
                Some(MenuInput::LinkActivated)
            }
            PageEvent::DocumentClick { target } if self.state.is_open() => {
                let inside = target.is_some_and(|target| dom.contains(parts.inside(), target));
                (!inside).then_some(MenuInput::OutsidePress)
            }
            PageEvent::KeyDown { key: Key::Escape } if self.state.is_open() => {
                Some(MenuInput::Escape)
            }
            PageEvent::Resize { width } if self.state.is_open() && *width > self.breakpoint => {
                Some(MenuInput::DesktopViewport)
            }
            _ => None,
        }
    }
}

fn bool_attr(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

impl Behavior for MobileMenuController {
    fn name(&self) -> &'static str {
        "mobile-menu"
    }

    fn subscriptions(&self) -> &'static [EventKind] {
        &[
            EventKind::Click,
            EventKind::DocumentClick,
            EventKind::KeyDown,
            EventKind::Resize,
        ]
    }

    fn mount(&mut self, ctx: &mut Context<'_>) -> Result<()> {
        let dom = ctx.dom();
        let toggle = dom
            .query(selectors::HAMBURGER)
            .ok_or(BehaviorError::MissingElement(selectors::HAMBURGER))?;
        let menu = dom
            .query(selectors::NAV_MENU)
            .ok_or(BehaviorError::MissingElement(selectors::NAV_MENU))?;
        let parts = MenuParts {
            toggle,
            menu,
            container: dom.query(selectors::NAV_CONTAINER),
            body: dom.body(),
            links: dom.query_within(menu, selectors::MENU_LINKS),
        };
        log::debug!(
            "Mobile menu: container={} links={}",
            parts.container.is_some(),
            parts.links.len()
        );

        dom.set_attribute(toggle, "aria-controls", MENU_ID)?;
        dom.set_attribute(toggle, "aria-label", "Toggle navigation menu")?;
        dom.set_attribute(menu, "id", MENU_ID)?;

        ctx.listen(ListenTarget::Node(toggle), EventKind::Click);
        for link in &parts.links {
            ctx.listen(ListenTarget::Node(*link), EventKind::Click);
        }
        ctx.listen(ListenTarget::Document, EventKind::DocumentClick);
        ctx.listen(ListenTarget::Document, EventKind::KeyDown);
        ctx.listen(ListenTarget::Window, EventKind::Resize);

        self.parts = Some(parts);
        self.state = MenuState::Closed;
        self.render(dom)
    }

    fn handle(&mut self, event: &PageEvent, ctx: &mut Context<'_>) -> Result<()> {
        let Some(input) = self.input_for(event, ctx.dom()) else {
            return Ok(());
        };
        if input == MenuInput::Toggle {
            // The same click must not reach the document and count as an
            // outside press.
            ctx.prevent_default();
            ctx.stop_propagation();
        }
        self.apply(input, ctx.dom())
    }
}
