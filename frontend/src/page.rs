//! The page event bus.

use std::collections::{BTreeMap, HashSet};

use crate::dom::{Dom, NodeId};
use crate::error::Result;
use crate::events::{
    Deferred, EventKind, FrameToken, HostRequest, ListenTarget, ObserverKind, ObserverOptions,
    PageEvent,
};

pub trait Behavior {
    fn name(&self) -> &'static str;

    /// Event kinds routed to [`Behavior::handle`] once mounted.
    fn subscriptions(&self) -> &'static [EventKind];

    /// Finds the behavior's elements and asks for listeners and observers.
    /// An error leaves the behavior unmounted; the rest of the page is
    /// unaffected.
    fn mount(&mut self, ctx: &mut Context<'_>) -> Result<()>;

    fn handle(&mut self, event: &PageEvent, ctx: &mut Context<'_>) -> Result<()>;
}

/// What the host should do with the DOM event that caused a dispatch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub prevent_default: bool,
    pub stop_propagation: bool,
}

impl Outcome {
    fn merge(&mut self, other: Outcome) {
        self.prevent_default |= other.prevent_default;
        self.stop_propagation |= other.stop_propagation;
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Dispatch {
    pub outcome: Outcome,
    pub requests: Vec<HostRequest>,
}

/// Handed to behaviors while they mount or handle an event.
pub struct Context<'a> {
    dom: &'a dyn Dom,
    next_frame: &'a mut u32,
    requests: Vec<HostRequest>,
    outcome: Outcome,
}

impl<'a> Context<'a> {
    fn new(dom: &'a dyn Dom, next_frame: &'a mut u32) -> Self {
        Self {
            dom,
            next_frame,
            requests: Vec::new(),
            outcome: Outcome::default(),
        }
    }

    pub fn dom(&self) -> &'a dyn Dom {
        self.dom
    }

    pub fn listen(&mut self, target: ListenTarget, kind: EventKind) {
        self.requests.push(HostRequest::Listen { target, kind });
    }

    pub fn observe(&mut self, observer: ObserverKind, options: &ObserverOptions, node: NodeId) {
        self.requests.push(HostRequest::Observe {
            observer,
            options: options.clone(),
            node,
        });
    }

    pub fn unobserve(&mut self, observer: ObserverKind, node: NodeId) {
        self.requests.push(HostRequest::Unobserve { observer, node });
    }

    pub fn set_timeout(&mut self, delay_ms: u32, task: Deferred) {
        self.requests.push(HostRequest::Timeout { delay_ms, task });
    }

    pub fn request_frame(&mut self, task: Deferred) -> FrameToken {
        let token = FrameToken(*self.next_frame);
        *self.next_frame = self.next_frame.wrapping_add(1);
        self.requests.push(HostRequest::Frame { token, task });
        token
    }

    pub fn cancel_frame(&mut self, token: FrameToken) {
        self.requests.push(HostRequest::CancelFrame(token));
    }

    pub fn prevent_default(&mut self) {
        self.outcome.prevent_default = true;
    }

    pub fn stop_propagation(&mut self) {
        self.outcome.stop_propagation = true;
    }

    fn finish(self) -> (Outcome, Vec<HostRequest>) {
        (self.outcome, self.requests)
    }
}

/// Elements a one-shot behavior has already processed.
#[derive(Debug, Default, Clone)]
pub struct TriggerRecord {
    triggered: HashSet<NodeId>,
}

impl TriggerRecord {
    /// Records `node`, returning false when it was already triggered.
    pub fn trigger(&mut self, node: NodeId) -> bool {
        self.triggered.insert(node)
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.triggered.contains(&node)
    }

    pub fn len(&self) -> usize {
        self.triggered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triggered.is_empty()
    }
}

#[derive(Default)]
pub struct Page {
    behaviors: Vec<Box<dyn Behavior>>,
    handlers: BTreeMap<EventKind, Vec<usize>>,
    listening: HashSet<(ListenTarget, EventKind)>,
    next_frame: u32,
}

impl Page {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, behavior: impl Behavior + 'static) -> Self {
        self.behaviors.push(Box::new(behavior));
        self
    }

    /// Mounts every registered behavior in order. Only behaviors that mount
    /// cleanly enter the handler table, and only their requests are kept.
    pub fn mount(&mut self, dom: &dyn Dom) -> Dispatch {
        let mut dispatch = Dispatch::default();
        for (index, behavior) in self.behaviors.iter_mut().enumerate() {
            let mut ctx = Context::new(dom, &mut self.next_frame);
            match behavior.mount(&mut ctx) {
                Ok(()) => {
                    let (_, requests) = ctx.finish();
                    dispatch.requests.extend(requests);
                    for kind in behavior.subscriptions() {
                        self.handlers.entry(*kind).or_default().push(index);
                    }
                    log::debug!("Mounted {}", behavior.name());
                }
                Err(e) if e.is_missing_element() => {
                    log::debug!("Skipping {}: {}", behavior.name(), e);
                }
                Err(e) => {
                    log::error!("Failed to mount {}: {}", behavior.name(), e);
                }
            }
        }
        dispatch.requests = self.dedupe_listeners(dispatch.requests);
        dispatch
    }

    /// Routes `event` to every subscriber of its kind. A failing handler is
    /// logged and the remaining subscribers still run.
    pub fn dispatch(&mut self, event: &PageEvent, dom: &dyn Dom) -> Dispatch {
        let mut dispatch = Dispatch::default();
        let Some(subscribers) = self.handlers.get(&event.kind()) else {
            return dispatch;
        };

        for &index in subscribers {
            let behavior = &mut self.behaviors[index];
            let mut ctx = Context::new(dom, &mut self.next_frame);
            if let Err(e) = behavior.handle(event, &mut ctx) {
                log::error!("{} failed on {:?}: {}", behavior.name(), event.kind(), e);
            }
            let (outcome, requests) = ctx.finish();
            dispatch.outcome.merge(outcome);
            dispatch.requests.extend(requests);
        }
        dispatch.requests = self.dedupe_listeners(dispatch.requests);
        dispatch
    }

    /// Names of the mounted behaviors that receive `kind`.
    pub fn subscribers(&self, kind: EventKind) -> Vec<&'static str> {
        self.handlers
            .get(&kind)
            .map(|indices| {
                indices
                    .iter()
                    .map(|&index| self.behaviors[index].name())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn dedupe_listeners(&mut self, requests: Vec<HostRequest>) -> Vec<HostRequest> {
        requests
            .into_iter()
            .filter(|request| match request {
                HostRequest::Listen { target, kind } => self.listening.insert((*target, *kind)),
                _ => true,
            })
            .collect()
    }
}
