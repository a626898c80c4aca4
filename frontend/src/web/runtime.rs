use std::cell::{Cell, Ref, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use gloo_timers::callback::Timeout;
use wasm_bindgen::prelude::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    ErrorEvent, Event, EventTarget, IntersectionObserver, IntersectionObserverEntry,
    IntersectionObserverInit, KeyboardEvent, MouseEvent, Window,
};

use crate::dom::Dom;
use crate::error::{BehaviorError, Result};
use crate::events::{
    EventKind, FrameToken, HostRequest, Key, ListenTarget, ObserverKind, ObserverOptions,
    PageEvent,
};
use crate::page::{Outcome, Page};
use crate::pages::landing;
use crate::web::dom::WebDom;

pub struct Runtime {
    dom: WebDom,
    page: RefCell<Page>,
    observers: RefCell<HashMap<ObserverKind, IntersectionObserver>>,
    frames: RefCell<HashMap<FrameToken, i32>>,
}

impl Runtime {
    /// Bootstraps the landing page on `dom` and starts serving its
    /// requests. Callbacks keep the runtime alive for the page's lifetime.
    pub fn launch(dom: WebDom) -> Rc<Self> {
        let (page, dispatch) = landing::bootstrap(&dom);
        let runtime = Rc::new(Self {
            dom,
            page: RefCell::new(page),
            observers: RefCell::new(HashMap::new()),
            frames: RefCell::new(HashMap::new()),
        });
        runtime.perform(dispatch.requests);
        runtime
    }

    pub fn dom(&self) -> &WebDom {
        &self.dom
    }

    pub fn page(&self) -> Ref<'_, Page> {
        self.page.borrow()
    }

    /// Animation frames requested and not yet run or cancelled.
    pub fn pending_frames(&self) -> usize {
        self.frames.borrow().len()
    }

    pub fn dispatch(self: &Rc<Self>, event: PageEvent) -> Outcome {
        let dispatch = match self.page.try_borrow_mut() {
            Ok(mut page) => page.dispatch(&event, &self.dom),
            Err(_) => {
                log::warn!("Dropped re-entrant {:?} event", event.kind());
                return Outcome::default();
            }
        };
        self.perform(dispatch.requests);
        dispatch.outcome
    }

    fn perform(self: &Rc<Self>, requests: Vec<HostRequest>) {
        for request in requests {
            if let Err(e) = self.apply(&request) {
                log::error!("Failed to apply {:?}: {}", request, e);
            }
        }
    }

    fn apply(self: &Rc<Self>, request: &HostRequest) -> Result<()> {
        match request {
            HostRequest::Listen { target, kind } => self.listen(*target, *kind),
            HostRequest::Observe {
                observer,
                options,
                node,
            } => {
                let element = self.dom.element(*node)?;
                self.observer(*observer, options)?.observe(&element);
                Ok(())
            }
            HostRequest::Unobserve { observer, node } => {
                if let Some(io) = self.observers.borrow().get(observer) {
                    io.unobserve(&self.dom.element(*node)?);
                }
                Ok(())
            }
            HostRequest::Timeout { delay_ms, task } => {
                let runtime = Rc::clone(self);
                let task = *task;
                Timeout::new(*delay_ms, move || {
                    let timestamp = runtime.now();
                    runtime.dispatch(PageEvent::Deferred { task, timestamp });
                })
                .forget();
                Ok(())
            }
            HostRequest::Frame { token, task } => {
                let runtime = Rc::clone(self);
                let (token, task) = (*token, *task);
                let callback = Closure::once_into_js(move |timestamp: f64| {
                    runtime.frames.borrow_mut().remove(&token);
                    runtime.dispatch(PageEvent::Deferred { task, timestamp });
                });
                let handle = self
                    .dom
                    .window()
                    .request_animation_frame(callback.unchecked_ref())?;
                self.frames.borrow_mut().insert(token, handle);
                Ok(())
            }
            HostRequest::CancelFrame(token) => {
                let handle = self.frames.borrow_mut().remove(token);
                if let Some(handle) = handle {
                    self.dom.window().cancel_animation_frame(handle)?;
                }
                Ok(())
            }
        }
    }

    fn listen(self: &Rc<Self>, target: ListenTarget, kind: EventKind) -> Result<()> {
        let Some(event_type) = kind.dom_event() else {
            log::warn!("{:?} cannot be listened for", kind);
            return Ok(());
        };
        let event_target: EventTarget = match target {
            ListenTarget::Window => self.dom.window().clone().into(),
            ListenTarget::Document => self.dom.document().clone().into(),
            ListenTarget::Node(node) => self.dom.element(node)?.into(),
            ListenTarget::Media(feature) => self
                .dom
                .window()
                .match_media(feature.query())?
                .ok_or(BehaviorError::NoGlobal("matchMedia"))?
                .into(),
        };

        let runtime = Rc::clone(self);
        let callback = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            let Some(page_event) = runtime.translate(target, kind, &event) else {
                return;
            };
            let outcome = runtime.dispatch(page_event);
            if outcome.prevent_default {
                event.prevent_default();
            }
            if outcome.stop_propagation {
                event.stop_propagation();
            }
        });
        event_target.add_event_listener_with_callback(event_type, callback.as_ref().unchecked_ref())?;
        callback.forget();
        Ok(())
    }

    /// Turns a raw DOM event into the typed event for `kind`. Payloads the
    /// behaviors never read are not extracted.
    fn translate(&self, target: ListenTarget, kind: EventKind, event: &Event) -> Option<PageEvent> {
        let node = match target {
            ListenTarget::Node(node) => Some(node),
            _ => None,
        };
        match kind {
            EventKind::Click => {
                let (client_x, client_y) = event
                    .dyn_ref::<MouseEvent>()
                    .map(|mouse| (f64::from(mouse.client_x()), f64::from(mouse.client_y())))
                    .unwrap_or_default();
                Some(PageEvent::Click {
                    node: node?,
                    client_x,
                    client_y,
                })
            }
            EventKind::DocumentClick => {
                let target = event
                    .target()
                    .and_then(|target| target.dyn_into::<web_sys::Element>().ok())
                    .and_then(|element| self.dom.nearest_known(&element));
                Some(PageEvent::DocumentClick { target })
            }
            EventKind::PointerDown => Some(PageEvent::PointerDown),
            EventKind::PointerEnter => Some(PageEvent::PointerEnter { node: node? }),
            EventKind::PointerLeave => Some(PageEvent::PointerLeave { node: node? }),
            EventKind::KeyDown => {
                let key = event.dyn_ref::<KeyboardEvent>()?.key();
                Some(PageEvent::KeyDown {
                    key: Key::from_dom(&key),
                })
            }
            EventKind::Scroll => Some(PageEvent::Scroll),
            EventKind::Resize => Some(PageEvent::Resize {
                width: self.dom.viewport_width(),
            }),
            EventKind::MediaChange => match target {
                ListenTarget::Media(feature) => Some(PageEvent::MediaChange {
                    feature,
                    matches: self.dom.media_matches(feature.query()),
                }),
                _ => None,
            },
            EventKind::Intersection | EventKind::Deferred => None,
        }
    }

    /// The observer for `kind`, created with `options` on first use.
    fn observer(
        self: &Rc<Self>,
        kind: ObserverKind,
        options: &ObserverOptions,
    ) -> Result<IntersectionObserver> {
        if let Some(io) = self.observers.borrow().get(&kind) {
            return Ok(io.clone());
        }

        let runtime = Rc::clone(self);
        let callback = Closure::<dyn FnMut(js_sys::Array, IntersectionObserver)>::new(
            move |entries: js_sys::Array, _io: IntersectionObserver| {
                for entry in entries.iter() {
                    let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>() else {
                        continue;
                    };
                    if !entry.is_intersecting() {
                        continue;
                    }
                    let Some(node) = runtime.dom.lookup(&entry.target()) else {
                        continue;
                    };
                    runtime.dispatch(PageEvent::Intersection {
                        observer: kind,
                        node,
                    });
                }
            },
        );

        let init = IntersectionObserverInit::new();
        init.set_threshold(&JsValue::from_f64(options.threshold));
        if let Some(margin) = &options.root_margin {
            init.set_root_margin(margin);
        }
        let io = IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &init)?;
        callback.forget();

        log::debug!("Created {:?} observer at threshold {}", kind, options.threshold);
        self.observers.borrow_mut().insert(kind, io.clone());
        Ok(io)
    }

    fn now(&self) -> f64 {
        self.dom
            .window()
            .performance()
            .map(|performance| performance.now())
            .unwrap_or(0.0)
    }
}

thread_local! {
    static UNCAUGHT_ERRORS: Cell<u32> = const { Cell::new(0) };
}

/// Uncaught script errors logged since start-up.
pub fn uncaught_errors() -> u32 {
    UNCAUGHT_ERRORS.with(Cell::get)
}

/// Logs uncaught script errors on `window` and lets the page carry on.
pub fn log_uncaught_errors(window: &Window) -> Result<()> {
    let on_error = Closure::<dyn FnMut(Event)>::new(|event: Event| {
        UNCAUGHT_ERRORS.with(|count| count.set(count.get() + 1));
        match event.dyn_ref::<ErrorEvent>() {
            Some(error) => log::error!("JavaScript error: {}", error.message()),
            None => log::error!("JavaScript error event: {}", event.type_()),
        }
    });
    window.add_event_listener_with_callback("error", on_error.as_ref().unchecked_ref())?;
    on_error.forget();
    Ok(())
}

/// Installs the error logger and mounts the page once the document has
/// been parsed.
pub fn install() -> Result<()> {
    let dom = WebDom::new()?;
    log_uncaught_errors(dom.window())?;

    if dom.document().ready_state() == "loading" {
        let document = dom.document().clone();
        let on_ready = Closure::once_into_js(move || {
            Runtime::launch(dom);
        });
        document.add_event_listener_with_callback("DOMContentLoaded", on_ready.unchecked_ref())?;
    } else {
        Runtime::launch(dom);
    }
    Ok(())
}
