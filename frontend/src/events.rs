//! Typed page events and the requests behaviors hand back to the host.

use std::fmt;

use crate::dom::NodeId;

/// Discriminant used as the key of the page's handler table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    /// Activation of a specific element the behavior listens on.
    Click,
    /// Any click bubbling up to the document.
    DocumentClick,
    /// Mouse button pressed anywhere in the document.
    PointerDown,
    PointerEnter,
    PointerLeave,
    KeyDown,
    Scroll,
    Resize,
    Intersection,
    MediaChange,
    /// A timeout or animation frame the behavior asked for earlier.
    Deferred,
}

impl EventKind {
    /// The DOM event type a listener for this kind attaches to. Kinds
    /// delivered through observers or timers have none.
    pub fn dom_event(self) -> Option<&'static str> {
        match self {
            EventKind::Click | EventKind::DocumentClick => Some("click"),
            EventKind::PointerDown => Some("mousedown"),
            EventKind::PointerEnter => Some("mouseenter"),
            EventKind::PointerLeave => Some("mouseleave"),
            EventKind::KeyDown => Some("keydown"),
            EventKind::Scroll => Some("scroll"),
            EventKind::Resize => Some("resize"),
            EventKind::MediaChange => Some("change"),
            EventKind::Intersection | EventKind::Deferred => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Tab,
    Escape,
    Other,
}

impl Key {
    pub fn from_dom(key: &str) -> Self {
        match key {
            "Tab" => Key::Tab,
            "Escape" | "Esc" => Key::Escape,
            _ => Key::Other,
        }
    }
}

/// User preference media features mirrored onto the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MediaFeature {
    ReducedMotion,
    HighContrast,
}

impl MediaFeature {
    pub fn query(self) -> &'static str {
        match self {
            MediaFeature::ReducedMotion => "(prefers-reduced-motion: reduce)",
            MediaFeature::HighContrast => "(prefers-contrast: high)",
        }
    }
}

/// One intersection observer exists per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObserverKind {
    Reveal,
    SectionAnnounce,
    StatCounter,
    LazyLoad,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObserverOptions {
    pub threshold: f64,
    pub root_margin: Option<String>,
}

/// Work scheduled for later, delivered back as [`PageEvent::Deferred`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Deferred {
    RecomputeActiveSection,
    CountFrame(NodeId),
    RemoveRipple(NodeId),
    RemoveAnnouncement(NodeId),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PageEvent {
    Click {
        node: NodeId,
        client_x: f64,
        client_y: f64,
    },
    DocumentClick {
        target: Option<NodeId>,
    },
    PointerDown,
    PointerEnter {
        node: NodeId,
    },
    PointerLeave {
        node: NodeId,
    },
    KeyDown {
        key: Key,
    },
    Scroll,
    Resize {
        width: f64,
    },
    /// Only entries that became visible are delivered.
    Intersection {
        observer: ObserverKind,
        node: NodeId,
    },
    MediaChange {
        feature: MediaFeature,
        matches: bool,
    },
    Deferred {
        task: Deferred,
        timestamp: f64,
    },
}

impl PageEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            PageEvent::Click { .. } => EventKind::Click,
            PageEvent::DocumentClick { .. } => EventKind::DocumentClick,
            PageEvent::PointerDown => EventKind::PointerDown,
            PageEvent::PointerEnter { .. } => EventKind::PointerEnter,
            PageEvent::PointerLeave { .. } => EventKind::PointerLeave,
            PageEvent::KeyDown { .. } => EventKind::KeyDown,
            PageEvent::Scroll => EventKind::Scroll,
            PageEvent::Resize { .. } => EventKind::Resize,
            PageEvent::Intersection { .. } => EventKind::Intersection,
            PageEvent::MediaChange { .. } => EventKind::MediaChange,
            PageEvent::Deferred { .. } => EventKind::Deferred,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ListenTarget {
    Window,
    Document,
    Node(NodeId),
    Media(MediaFeature),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameToken(pub u32);

impl fmt::Display for FrameToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frame#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HostRequest {
    Listen {
        target: ListenTarget,
        kind: EventKind,
    },
    Observe {
        observer: ObserverKind,
        options: ObserverOptions,
        node: NodeId,
    },
    Unobserve {
        observer: ObserverKind,
        node: NodeId,
    },
    Timeout {
        delay_ms: u32,
        task: Deferred,
    },
    Frame {
        token: FrameToken,
        task: Deferred,
    },
    CancelFrame(FrameToken),
}
