//! In-memory document and virtual-clock harness shared by unit tests.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::dom::{Dom, NodeId, Rect};
use crate::error::{BehaviorError, Result};
use crate::events::{
    Deferred, EventKind, FrameToken, HostRequest, ListenTarget, ObserverKind, ObserverOptions,
    PageEvent,
};
use crate::page::{Outcome, Page};

const DESKTOP_WIDTH: f64 = 1280.0;

#[derive(Debug, Default, Clone)]
pub struct FakeNode {
    pub tag: String,
    pub classes: BTreeSet<String>,
    pub attributes: BTreeMap<String, String>,
    pub style: BTreeMap<String, String>,
    pub text: Option<String>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub offset_top: f64,
    pub offset_height: f64,
    pub rect: Rect,
    pub attached: bool,
}

pub struct FakeDom {
    nodes: RefCell<Vec<FakeNode>>,
    queries: RefCell<HashMap<String, Vec<NodeId>>>,
    scoped: RefCell<HashMap<(NodeId, String), Vec<NodeId>>>,
    media: RefCell<HashMap<String, bool>>,
    injected: RefCell<Vec<String>>,
    scrolls: RefCell<Vec<f64>>,
    scroll_y: Cell<f64>,
    body: NodeId,
}

impl Default for FakeDom {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeDom {
    pub fn new() -> Self {
        let body = FakeNode {
            tag: "body".to_string(),
            attached: true,
            ..FakeNode::default()
        };
        Self {
            nodes: RefCell::new(vec![body]),
            queries: RefCell::new(HashMap::new()),
            scoped: RefCell::new(HashMap::new()),
            media: RefCell::new(HashMap::new()),
            injected: RefCell::new(Vec::new()),
            scrolls: RefCell::new(Vec::new()),
            scroll_y: Cell::new(0.0),
            body: NodeId(0),
        }
    }

    pub fn body_node(&self) -> NodeId {
        self.body
    }

    /// Adds an attached `tag` element as the last child of `parent`.
    pub fn add(&self, tag: &str, parent: NodeId) -> NodeId {
        let node = self.push(tag);
        self.append_child(parent, node).unwrap();
        node
    }

    pub fn add_with_class(&self, tag: &str, parent: NodeId, class: &str) -> NodeId {
        let node = self.add(tag, parent);
        self.add_class(node, class).unwrap();
        node
    }

    pub fn register_query(&self, selector: &str, nodes: Vec<NodeId>) {
        self.queries.borrow_mut().insert(selector.to_string(), nodes);
    }

    pub fn register_scoped(&self, root: NodeId, selector: &str, nodes: Vec<NodeId>) {
        self.scoped
            .borrow_mut()
            .insert((root, selector.to_string()), nodes);
    }

    pub fn set_layout(&self, node: NodeId, offset_top: f64, offset_height: f64) {
        let mut nodes = self.nodes.borrow_mut();
        nodes[node.0 as usize].offset_top = offset_top;
        nodes[node.0 as usize].offset_height = offset_height;
    }

    pub fn set_rect(&self, node: NodeId, rect: Rect) {
        self.nodes.borrow_mut()[node.0 as usize].rect = rect;
    }

    pub fn set_media(&self, query: &str, matches: bool) {
        self.media.borrow_mut().insert(query.to_string(), matches);
    }

    pub fn set_scroll_y(&self, y: f64) {
        self.scroll_y.set(y);
    }

    pub fn node(&self, node: NodeId) -> FakeNode {
        self.nodes.borrow()[node.0 as usize].clone()
    }

    pub fn style(&self, node: NodeId, property: &str) -> Option<String> {
        self.nodes.borrow()[node.0 as usize]
            .style
            .get(property)
            .cloned()
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes.borrow()[node.0 as usize].children.clone()
    }

    pub fn is_attached(&self, node: NodeId) -> bool {
        self.nodes.borrow()[node.0 as usize].attached
    }

    pub fn scrolls(&self) -> Vec<f64> {
        self.scrolls.borrow().clone()
    }

    pub fn injected_styles(&self) -> Vec<String> {
        self.injected.borrow().clone()
    }

    fn push(&self, tag: &str) -> NodeId {
        let mut nodes = self.nodes.borrow_mut();
        nodes.push(FakeNode {
            tag: tag.to_string(),
            ..FakeNode::default()
        });
        NodeId((nodes.len() - 1) as u32)
    }

    fn with_node<T>(&self, node: NodeId, f: impl FnOnce(&mut FakeNode) -> T) -> Result<T> {
        let mut nodes = self.nodes.borrow_mut();
        let entry = nodes
            .get_mut(node.0 as usize)
            .ok_or(BehaviorError::UnknownNode(node))?;
        Ok(f(entry))
    }

    fn set_attached(nodes: &mut [FakeNode], node: NodeId, attached: bool) {
        nodes[node.0 as usize].attached = attached;
        for child in nodes[node.0 as usize].children.clone() {
            Self::set_attached(nodes, child, attached);
        }
    }
}

impl Dom for FakeDom {
    fn query_all(&self, selector: &str) -> Vec<NodeId> {
        self.queries
            .borrow()
            .get(selector)
            .cloned()
            .unwrap_or_default()
    }

    fn query(&self, selector: &str) -> Option<NodeId> {
        self.query_all(selector).into_iter().next()
    }

    fn query_within(&self, root: NodeId, selector: &str) -> Vec<NodeId> {
        self.scoped
            .borrow()
            .get(&(root, selector.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.nodes
            .borrow()
            .iter()
            .position(|node| node.attached && node.attributes.get("id").map(String::as_str) == Some(id))
            .map(|index| NodeId(index as u32))
    }

    fn body(&self) -> Option<NodeId> {
        Some(self.body)
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.nodes
            .borrow()
            .get(node.0 as usize)
            .and_then(|entry| entry.attributes.get(name).cloned())
    }

    fn set_attribute(&self, node: NodeId, name: &str, value: &str) -> Result<()> {
        self.with_node(node, |entry| {
            entry.attributes.insert(name.to_string(), value.to_string());
        })
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.nodes
            .borrow()
            .get(node.0 as usize)
            .is_some_and(|entry| entry.classes.contains(class))
    }

    fn add_class(&self, node: NodeId, class: &str) -> Result<()> {
        self.with_node(node, |entry| {
            entry.classes.insert(class.to_string());
        })
    }

    fn remove_class(&self, node: NodeId, class: &str) -> Result<()> {
        self.with_node(node, |entry| {
            entry.classes.remove(class);
        })
    }

    fn set_style(&self, node: NodeId, property: &str, value: &str) -> Result<()> {
        self.with_node(node, |entry| {
            entry.style.insert(property.to_string(), value.to_string());
        })
    }

    fn remove_style(&self, node: NodeId, property: &str) -> Result<()> {
        self.with_node(node, |entry| {
            entry.style.remove(property);
        })
    }

    fn text(&self, node: NodeId) -> Option<String> {
        self.nodes
            .borrow()
            .get(node.0 as usize)
            .and_then(|entry| entry.text.clone())
    }

    fn set_text(&self, node: NodeId, text: &str) -> Result<()> {
        self.with_node(node, |entry| entry.text = Some(text.to_string()))
    }

    fn offset_top(&self, node: NodeId) -> f64 {
        self.nodes.borrow()[node.0 as usize].offset_top
    }

    fn offset_height(&self, node: NodeId) -> f64 {
        self.nodes.borrow()[node.0 as usize].offset_height
    }

    fn bounding_rect(&self, node: NodeId) -> Rect {
        self.nodes.borrow()[node.0 as usize].rect
    }

    fn sibling_index(&self, node: NodeId) -> Option<usize> {
        let nodes = self.nodes.borrow();
        let parent = nodes.get(node.0 as usize)?.parent?;
        nodes[parent.0 as usize]
            .children
            .iter()
            .position(|child| *child == node)
    }

    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let nodes = self.nodes.borrow();
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = nodes.get(id.0 as usize).and_then(|entry| entry.parent);
        }
        false
    }

    fn create_element(&self, tag: &str) -> Result<NodeId> {
        Ok(self.push(tag))
    }

    fn append_child(&self, parent: NodeId, child: NodeId) -> Result<()> {
        let mut nodes = self.nodes.borrow_mut();
        if nodes.get(parent.0 as usize).is_none() {
            return Err(BehaviorError::UnknownNode(parent));
        }
        if nodes.get(child.0 as usize).is_none() {
            return Err(BehaviorError::UnknownNode(child));
        }
        nodes[parent.0 as usize].children.push(child);
        nodes[child.0 as usize].parent = Some(parent);
        let attached = nodes[parent.0 as usize].attached;
        Self::set_attached(&mut nodes, child, attached);
        Ok(())
    }

    fn remove(&self, node: NodeId) {
        let mut nodes = self.nodes.borrow_mut();
        let Some(parent) = nodes.get(node.0 as usize).and_then(|entry| entry.parent) else {
            return;
        };
        nodes[parent.0 as usize].children.retain(|child| *child != node);
        nodes[node.0 as usize].parent = None;
        Self::set_attached(&mut nodes, node, false);
    }

    fn inject_style(&self, css: &str) -> Result<()> {
        let mut injected = self.injected.borrow_mut();
        injected.clear();
        injected.push(css.to_string());
        Ok(())
    }

    fn scroll_y(&self) -> f64 {
        self.scroll_y.get()
    }

    fn viewport_width(&self) -> f64 {
        DESKTOP_WIDTH
    }

    fn scroll_to(&self, top: f64) {
        self.scrolls.borrow_mut().push(top);
    }

    fn media_matches(&self, query: &str) -> bool {
        self.media.borrow().get(query).copied().unwrap_or(false)
    }
}

struct PendingTimer {
    due: f64,
    seq: u64,
    task: Deferred,
}

/// Drives a [`Page`] the way the browser runtime does, with listeners,
/// observers, timeouts and frames simulated in memory.
pub struct Harness {
    pub dom: FakeDom,
    pub page: Page,
    now: f64,
    seq: u64,
    timers: Vec<PendingTimer>,
    frames: Vec<(FrameToken, Deferred)>,
    listeners: HashSet<(ListenTarget, EventKind)>,
    observed: HashMap<(ObserverKind, NodeId), ObserverOptions>,
    cancelled_frames: usize,
}

impl Harness {
    pub fn new(dom: FakeDom, page: Page) -> Self {
        Self {
            dom,
            page,
            now: 0.0,
            seq: 0,
            timers: Vec::new(),
            frames: Vec::new(),
            listeners: HashSet::new(),
            observed: HashMap::new(),
            cancelled_frames: 0,
        }
    }

    pub fn mount(&mut self) {
        let dispatch = self.page.mount(&self.dom);
        self.apply(dispatch.requests);
    }

    pub fn dispatch(&mut self, event: PageEvent) -> Outcome {
        let dispatch = self.page.dispatch(&event, &self.dom);
        self.apply(dispatch.requests);
        dispatch.outcome
    }

    /// Delivers an intersection entry the way a real observer would: only
    /// for nodes that are currently observed.
    pub fn intersect(&mut self, observer: ObserverKind, node: NodeId) -> Outcome {
        if !self.is_observed(observer, node) {
            return Outcome::default();
        }
        self.dispatch(PageEvent::Intersection { observer, node })
    }

    /// Moves the clock forward, firing due timeouts in order.
    pub fn advance(&mut self, ms: f64) {
        let target = self.now + ms;
        loop {
            let next = self
                .timers
                .iter()
                .enumerate()
                .filter(|(_, timer)| timer.due <= target)
                .min_by(|(_, a), (_, b)| a.due.total_cmp(&b.due).then(a.seq.cmp(&b.seq)))
                .map(|(index, _)| index);
            let Some(index) = next else {
                break;
            };
            let timer = self.timers.remove(index);
            self.now = timer.due;
            self.dispatch(PageEvent::Deferred {
                task: timer.task,
                timestamp: self.now,
            });
        }
        self.now = target;
    }

    /// Runs every frame requested so far with the current clock as the
    /// frame timestamp. Frames requested while running wait for the next call.
    pub fn run_frame(&mut self) {
        let frames = std::mem::take(&mut self.frames);
        for (_, task) in frames {
            self.dispatch(PageEvent::Deferred {
                task,
                timestamp: self.now,
            });
        }
    }

    pub fn pending_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn cancelled_frames(&self) -> usize {
        self.cancelled_frames
    }

    pub fn is_listening(&self, target: ListenTarget, kind: EventKind) -> bool {
        self.listeners.contains(&(target, kind))
    }

    pub fn is_observed(&self, observer: ObserverKind, node: NodeId) -> bool {
        self.observed.contains_key(&(observer, node))
    }

    pub fn observer_options(&self, observer: ObserverKind, node: NodeId) -> Option<ObserverOptions> {
        self.observed.get(&(observer, node)).cloned()
    }

    fn apply(&mut self, requests: Vec<HostRequest>) {
        for request in requests {
            match request {
                HostRequest::Listen { target, kind } => {
                    self.listeners.insert((target, kind));
                }
                HostRequest::Observe {
                    observer,
                    options,
                    node,
                } => {
                    self.observed.insert((observer, node), options);
                }
                HostRequest::Unobserve { observer, node } => {
                    self.observed.remove(&(observer, node));
                }
                HostRequest::Timeout { delay_ms, task } => {
                    self.seq += 1;
                    self.timers.push(PendingTimer {
                        due: self.now + f64::from(delay_ms),
                        seq: self.seq,
                        task,
                    });
                }
                HostRequest::Frame { token, task } => self.frames.push((token, task)),
                HostRequest::CancelFrame(token) => {
                    let before = self.frames.len();
                    self.frames.retain(|(pending, _)| *pending != token);
                    self.cancelled_frames += before - self.frames.len();
                }
            }
        }
    }
}
