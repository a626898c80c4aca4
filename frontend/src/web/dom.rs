use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use js_sys::Reflect;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlElement, NodeList, ScrollBehavior, ScrollToOptions, Window};

use crate::dom::{Dom, NodeId, Rect};
use crate::error::{BehaviorError, Result};

const STYLE_ID: &str = "page-behaviors-style";

thread_local! {
    static INSTANCES: Cell<u32> = const { Cell::new(0) };
}

/// [`Dom`] over the live browser document.
///
/// Each registered element carries its handle in an expando property, so
/// lookups do not scan the registry. Handles are released by [`Dom::remove`].
pub struct WebDom {
    window: Window,
    document: Document,
    nodes: RefCell<HashMap<u32, Element>>,
    next_id: Cell<u32>,
    handle_key: JsValue,
}

impl WebDom {
    pub fn new() -> Result<Self> {
        let window = web_sys::window().ok_or(BehaviorError::NoGlobal("window"))?;
        let document = window
            .document()
            .ok_or(BehaviorError::NoGlobal("document"))?;
        let instance = INSTANCES.with(|count| {
            let instance = count.get();
            count.set(instance + 1);
            instance
        });
        Ok(Self {
            window,
            document,
            nodes: RefCell::new(HashMap::new()),
            next_id: Cell::new(0),
            handle_key: JsValue::from_str(&format!("__pageBehaviorsNode{instance}")),
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Number of elements currently holding a handle.
    pub fn tracked_nodes(&self) -> usize {
        self.nodes.borrow().len()
    }

    /// The handle of `element` if it is registered.
    pub fn lookup(&self, element: &Element) -> Option<NodeId> {
        let id = Reflect::get(element, &self.handle_key).ok()?.as_f64()? as u32;
        self.nodes
            .borrow()
            .get(&id)
            .filter(|known| known.is_same_node(Some(&**element)))
            .map(|_| NodeId(id))
    }

    /// The handle of `element` or of its closest registered ancestor.
    pub fn nearest_known(&self, element: &Element) -> Option<NodeId> {
        let mut current = Some(element.clone());
        while let Some(element) = current {
            if let Some(node) = self.lookup(&element) {
                return Some(node);
            }
            current = element.parent_element();
        }
        None
    }

    /// Returns the handle for `element`, registering it on first sight.
    pub fn intern(&self, element: &Element) -> NodeId {
        if let Some(node) = self.lookup(element) {
            return node;
        }
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        if let Err(e) = Reflect::set(element, &self.handle_key, &JsValue::from(id)) {
            log::warn!("Could not tag node#{}: {:?}", id, e);
        }
        self.nodes.borrow_mut().insert(id, element.clone());
        NodeId(id)
    }

    pub fn element(&self, node: NodeId) -> Result<Element> {
        self.nodes
            .borrow()
            .get(&node.0)
            .cloned()
            .ok_or(BehaviorError::UnknownNode(node))
    }

    fn html(&self, node: NodeId) -> Result<HtmlElement> {
        self.element(node)?
            .dyn_into::<HtmlElement>()
            .map_err(|_| BehaviorError::Js(format!("{node} is not an HTML element")))
    }

    fn intern_list(&self, list: NodeList) -> Vec<NodeId> {
        (0..list.length())
            .filter_map(|index| list.item(index))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .map(|element| self.intern(&element))
            .collect()
    }
}

impl Dom for WebDom {
    fn query_all(&self, selector: &str) -> Vec<NodeId> {
        match self.document.query_selector_all(selector) {
            Ok(list) => self.intern_list(list),
            Err(e) => {
                log::warn!("Bad selector {}: {:?}", selector, e);
                Vec::new()
            }
        }
    }

    fn query(&self, selector: &str) -> Option<NodeId> {
        let element = self.document.query_selector(selector).ok().flatten()?;
        Some(self.intern(&element))
    }

    fn query_within(&self, root: NodeId, selector: &str) -> Vec<NodeId> {
        self.element(root)
            .and_then(|root| Ok(root.query_selector_all(selector)?))
            .map(|list| self.intern_list(list))
            .unwrap_or_default()
    }

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        let element = self.document.get_element_by_id(id)?;
        Some(self.intern(&element))
    }

    fn body(&self) -> Option<NodeId> {
        let body = self.document.body()?;
        Some(self.intern(&body))
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.element(node).ok()?.get_attribute(name)
    }

    fn set_attribute(&self, node: NodeId, name: &str, value: &str) -> Result<()> {
        Ok(self.element(node)?.set_attribute(name, value)?)
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.element(node)
            .map(|element| element.class_list().contains(class))
            .unwrap_or(false)
    }

    fn add_class(&self, node: NodeId, class: &str) -> Result<()> {
        Ok(self.element(node)?.class_list().add_1(class)?)
    }

    fn remove_class(&self, node: NodeId, class: &str) -> Result<()> {
        Ok(self.element(node)?.class_list().remove_1(class)?)
    }

    fn set_style(&self, node: NodeId, property: &str, value: &str) -> Result<()> {
        Ok(self.html(node)?.style().set_property(property, value)?)
    }

    fn remove_style(&self, node: NodeId, property: &str) -> Result<()> {
        self.html(node)?.style().remove_property(property)?;
        Ok(())
    }

    fn text(&self, node: NodeId) -> Option<String> {
        self.element(node).ok()?.text_content()
    }

    fn set_text(&self, node: NodeId, text: &str) -> Result<()> {
        self.element(node)?.set_text_content(Some(text));
        Ok(())
    }

    fn offset_top(&self, node: NodeId) -> f64 {
        self.html(node)
            .map(|element| f64::from(element.offset_top()))
            .unwrap_or(0.0)
    }

    fn offset_height(&self, node: NodeId) -> f64 {
        self.html(node)
            .map(|element| f64::from(element.offset_height()))
            .unwrap_or(0.0)
    }

    fn bounding_rect(&self, node: NodeId) -> Rect {
        let Ok(element) = self.element(node) else {
            return Rect::default();
        };
        let rect = element.get_bounding_client_rect();
        Rect {
            left: rect.left(),
            top: rect.top(),
            width: rect.width(),
            height: rect.height(),
        }
    }

    fn sibling_index(&self, node: NodeId) -> Option<usize> {
        let element = self.element(node).ok()?;
        let siblings = element.parent_element()?.children();
        (0..siblings.length())
            .position(|index| {
                siblings
                    .item(index)
                    .is_some_and(|sibling| sibling.is_same_node(Some(&*element)))
            })
    }

    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        match (self.element(ancestor), self.element(node)) {
            (Ok(ancestor), Ok(node)) => ancestor.contains(Some(&*node)),
            _ => false,
        }
    }

    fn create_element(&self, tag: &str) -> Result<NodeId> {
        let element = self.document.create_element(tag)?;
        Ok(self.intern(&element))
    }

    fn append_child(&self, parent: NodeId, child: NodeId) -> Result<()> {
        let parent = self.element(parent)?;
        let child = self.element(child)?;
        parent.append_child(&child)?;
        Ok(())
    }

    fn remove(&self, node: NodeId) {
        let Some(element) = self.nodes.borrow_mut().remove(&node.0) else {
            return;
        };
        element.remove();
        let _ = Reflect::delete_property(&element, &self.handle_key);
    }

    fn inject_style(&self, css: &str) -> Result<()> {
        if let Some(existing) = self.document.get_element_by_id(STYLE_ID) {
            existing.set_text_content(Some(css));
            return Ok(());
        }
        let head = self.document.head().ok_or(BehaviorError::NoGlobal("head"))?;
        let style = self.document.create_element("style")?;
        style.set_id(STYLE_ID);
        style.set_text_content(Some(css));
        head.append_child(&style)?;
        Ok(())
    }

    fn scroll_y(&self) -> f64 {
        self.window.scroll_y().unwrap_or(0.0)
    }

    fn viewport_width(&self) -> f64 {
        self.window
            .inner_width()
            .ok()
            .and_then(|width| width.as_f64())
            .unwrap_or(0.0)
    }

    fn scroll_to(&self, top: f64) {
        let options = ScrollToOptions::new();
        options.set_top(top);
        options.set_behavior(ScrollBehavior::Smooth);
        self.window.scroll_to_with_scroll_to_options(&options);
    }

    fn media_matches(&self, query: &str) -> bool {
        match self.window.match_media(query) {
            Ok(Some(list)) => list.matches(),
            _ => false,
        }
    }
}
