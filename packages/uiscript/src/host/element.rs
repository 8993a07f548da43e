//! Element tree.
//!
//! `Element` is a cheap, shared handle: clones refer to the same node. The
//! tree owns children strongly and parents weakly. No `RefCell` borrow is
//! ever held while a listener runs, so listeners may freely mutate the tree.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use glam::Vec2;

use super::document::{Document, DocumentData};
use super::event::{Event, EventListener, EventPhase};
use super::variant::Variant;

pub(crate) type ElementRef = Rc<RefCell<ElementData>>;
pub(crate) type WeakElementRef = Weak<RefCell<ElementData>>;

pub(crate) struct ElementData {
    pub(crate) tag: String,
    pub(crate) attributes: BTreeMap<String, Variant>,
    pub(crate) style: BTreeMap<String, String>,
    pub(crate) inner_rml: String,
    pub(crate) offset: Vec2,
    pub(crate) size: Vec2,
    pub(crate) parent: WeakElementRef,
    /// Document that created this element, used until it is attached.
    pub(crate) owner: WeakElementRef,
    pub(crate) children: Vec<Element>,
    pub(crate) listeners: Vec<(String, Rc<dyn EventListener>)>,
    /// Listeners created from `on<event>` attributes, keyed by event type.
    pub(crate) inline_listeners: BTreeMap<String, Rc<dyn EventListener>>,
    pub(crate) document: Option<DocumentData>,
}

#[derive(Clone)]
pub struct Element(pub(crate) ElementRef);

impl Element {
    pub fn new(tag: &str) -> Self {
        Self::with_document_data(tag, None)
    }

    pub(crate) fn with_document_data(tag: &str, document: Option<DocumentData>) -> Self {
        Element(Rc::new(RefCell::new(ElementData {
            tag: tag.to_string(),
            attributes: BTreeMap::new(),
            style: BTreeMap::new(),
            inner_rml: String::new(),
            offset: Vec2::ZERO,
            size: Vec2::ZERO,
            parent: Weak::new(),
            owner: Weak::new(),
            children: Vec::new(),
            listeners: Vec::new(),
            inline_listeners: BTreeMap::new(),
            document,
        })))
    }

    pub(crate) fn downgrade(&self) -> WeakElementRef {
        Rc::downgrade(&self.0)
    }

    pub fn ptr_eq(&self, other: &Element) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn is_document(&self) -> bool {
        self.0.borrow().document.is_some()
    }

    pub fn tag_name(&self) -> String {
        self.0.borrow().tag.clone()
    }

    pub fn id(&self) -> String {
        self.attribute("id")
            .map(|v| v.to_markup_string())
            .unwrap_or_default()
    }

    pub fn set_id(&self, id: &str) {
        self.set_attribute("id", Variant::from(id));
    }

    // === Classes ===

    pub fn class_names(&self) -> String {
        self.attribute("class")
            .map(|v| v.to_markup_string())
            .unwrap_or_default()
    }

    pub fn set_class_names(&self, names: &str) {
        self.set_attribute("class", Variant::from(names));
    }

    pub fn is_class_set(&self, name: &str) -> bool {
        self.class_names().split_whitespace().any(|c| c == name)
    }

    /// Add or remove a single class name.
    pub fn set_class(&self, name: &str, activate: bool) {
        let mut classes: Vec<String> = self
            .class_names()
            .split_whitespace()
            .filter(|c| *c != name)
            .map(str::to_string)
            .collect();
        if activate {
            classes.push(name.to_string());
        }
        self.set_class_names(&classes.join(" "));
    }

    // === Attributes ===

    pub fn attribute(&self, name: &str) -> Option<Variant> {
        self.0.borrow().attributes.get(name).cloned()
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.0.borrow().attributes.contains_key(name)
    }

    pub fn attributes(&self) -> BTreeMap<String, Variant> {
        self.0.borrow().attributes.clone()
    }

    pub fn attribute_names(&self) -> Vec<String> {
        self.0.borrow().attributes.keys().cloned().collect()
    }

    pub fn num_attributes(&self) -> usize {
        self.0.borrow().attributes.len()
    }

    /// Set an attribute. String values of `on<event>` attributes are turned
    /// into inline event listeners by the factory of the owning core.
    pub fn set_attribute(&self, name: &str, value: Variant) {
        let inline_code = match (name.strip_prefix("on"), &value) {
            (Some(event), Variant::String(code)) if !event.is_empty() => {
                Some((event.to_string(), code.clone()))
            }
            _ => None,
        };
        self.0.borrow_mut().attributes.insert(name.to_string(), value);

        if let Some((event, code)) = inline_code {
            self.attach_inline_listener(&event, &code);
        }
    }

    pub fn remove_attribute(&self, name: &str) -> bool {
        let removed = self.0.borrow_mut().attributes.remove(name).is_some();
        if removed {
            if let Some(event) = name.strip_prefix("on") {
                self.detach_inline_listener(event);
            }
        }
        removed
    }

    fn attach_inline_listener(&self, event: &str, code: &str) {
        self.detach_inline_listener(event);

        let core = self
            .owner_document()
            .and_then(|doc| doc.context())
            .and_then(|ctx| ctx.core());
        let Some(core) = core else {
            log::warn!(
                "Inline '{}' handler on <{}> ignored: element is not part of a context",
                event,
                self.tag_name()
            );
            return;
        };

        if let Some(listener) = core.instance_event_listener(code, self) {
            self.add_event_listener(event, listener.clone());
            self.0
                .borrow_mut()
                .inline_listeners
                .insert(event.to_string(), listener);
        }
    }

    fn detach_inline_listener(&self, event: &str) {
        let previous = self.0.borrow_mut().inline_listeners.remove(event);
        if let Some(previous) = previous {
            self.remove_event_listener(event, &previous);
        }
    }

    // === Style ===

    pub fn style_property(&self, name: &str) -> Option<String> {
        self.0.borrow().style.get(name).cloned()
    }

    pub fn set_style_property(&self, name: &str, value: &str) {
        self.0
            .borrow_mut()
            .style
            .insert(name.to_string(), value.to_string());
    }

    pub fn remove_style_property(&self, name: &str) -> bool {
        self.0.borrow_mut().style.remove(name).is_some()
    }

    pub fn style_properties(&self) -> BTreeMap<String, String> {
        self.0.borrow().style.clone()
    }

    // === Content and geometry ===

    pub fn inner_rml(&self) -> String {
        self.0.borrow().inner_rml.clone()
    }

    pub fn set_inner_rml(&self, rml: &str) {
        self.0.borrow_mut().inner_rml = rml.to_string();
    }

    pub fn offset(&self) -> Vec2 {
        self.0.borrow().offset
    }

    pub fn set_offset(&self, offset: Vec2) {
        self.0.borrow_mut().offset = offset;
    }

    pub fn size(&self) -> Vec2 {
        self.0.borrow().size
    }

    pub fn set_size(&self, size: Vec2) {
        self.0.borrow_mut().size = size;
    }

    // === Tree ===

    pub fn parent(&self) -> Option<Element> {
        self.0.borrow().parent.upgrade().map(Element)
    }

    pub fn children(&self) -> Vec<Element> {
        self.0.borrow().children.clone()
    }

    pub fn num_children(&self) -> usize {
        self.0.borrow().children.len()
    }

    pub fn has_child_nodes(&self) -> bool {
        self.num_children() > 0
    }

    pub fn first_child(&self) -> Option<Element> {
        self.0.borrow().children.first().cloned()
    }

    pub fn last_child(&self) -> Option<Element> {
        self.0.borrow().children.last().cloned()
    }

    pub fn next_sibling(&self) -> Option<Element> {
        self.sibling(1)
    }

    pub fn previous_sibling(&self) -> Option<Element> {
        self.sibling(-1)
    }

    fn sibling(&self, step: isize) -> Option<Element> {
        let parent = self.parent()?;
        let siblings = parent.children();
        let index = siblings.iter().position(|c| c.ptr_eq(self))?;
        let target = index.checked_add_signed(step)?;
        siblings.get(target).cloned()
    }

    /// Whether `self` is `other` or one of its ancestors.
    pub fn is_ancestor_of(&self, other: &Element) -> bool {
        let mut current = Some(other.clone());
        while let Some(element) = current {
            if element.ptr_eq(self) {
                return true;
            }
            current = element.parent();
        }
        false
    }

    /// Append `child`, detaching it from any previous parent. Returns false
    /// if that would create a cycle.
    pub fn append_child(&self, child: &Element) -> bool {
        if child.is_ancestor_of(self) {
            return false;
        }
        if let Some(old_parent) = child.parent() {
            old_parent.remove_child(child);
        }

        {
            let mut data = child.0.borrow_mut();
            data.parent = self.downgrade();
            data.owner = Weak::new();
        }
        self.0.borrow_mut().children.push(child.clone());
        true
    }

    pub fn remove_child(&self, child: &Element) -> bool {
        let removed = {
            let mut data = self.0.borrow_mut();
            let before = data.children.len();
            data.children.retain(|c| !c.ptr_eq(child));
            data.children.len() != before
        };
        if removed {
            let owner = self.owner_document().map(|d| d.as_element().downgrade());
            let mut data = child.0.borrow_mut();
            data.parent = Weak::new();
            data.owner = owner.unwrap_or_default();
        }
        removed
    }

    /// Depth-first search of this element and its descendants. Elements
    /// without an id never match, so an empty `id` finds nothing.
    pub fn get_element_by_id(&self, id: &str) -> Option<Element> {
        if id.is_empty() {
            return None;
        }
        if self.id() == id {
            return Some(self.clone());
        }
        self.children()
            .iter()
            .find_map(|child| child.get_element_by_id(id))
    }

    /// All descendants (not including `self`) with the given tag, in
    /// document order.
    pub fn get_elements_by_tag_name(&self, tag: &str) -> Vec<Element> {
        let mut found = Vec::new();
        self.collect_by_tag(tag, &mut found);
        found
    }

    fn collect_by_tag(&self, tag: &str, found: &mut Vec<Element>) {
        for child in self.children() {
            if child.tag_name() == tag {
                found.push(child.clone());
            }
            child.collect_by_tag(tag, found);
        }
    }

    /// Document this element belongs to: the nearest document ancestor
    /// (including `self`), or the document that created a detached element.
    pub fn owner_document(&self) -> Option<Document> {
        let mut current = self.clone();
        loop {
            if current.is_document() {
                return Some(Document(current));
            }
            let parent = current.parent();
            match parent {
                Some(parent) => current = parent,
                None => break,
            }
        }
        let owner = current.0.borrow().owner.upgrade();
        owner.map(|owner| Document(Element(owner)))
    }

    pub(crate) fn set_owner(&self, document: &Document) {
        self.0.borrow_mut().owner = document.as_element().downgrade();
    }

    // === Events ===

    pub fn add_event_listener(&self, event: &str, listener: Rc<dyn EventListener>) {
        self.0
            .borrow_mut()
            .listeners
            .push((event.to_string(), listener));
    }

    pub fn remove_event_listener(&self, event: &str, listener: &Rc<dyn EventListener>) -> bool {
        let removed = {
            let mut data = self.0.borrow_mut();
            let before = data.listeners.len();
            data.listeners
                .retain(|(e, l)| !(e == event && Rc::ptr_eq(l, listener)));
            data.listeners.len() != before
        };
        if removed {
            listener.on_detach(self);
        }
        removed
    }

    pub fn listeners_for(&self, event: &str) -> Vec<Rc<dyn EventListener>> {
        self.0
            .borrow()
            .listeners
            .iter()
            .filter(|(e, _)| e == event)
            .map(|(_, l)| l.clone())
            .collect()
    }

    /// Dispatch an event at this element: target phase first, then bubbling
    /// through the ancestors. Returns false if an interruptible event had its
    /// propagation stopped.
    pub fn dispatch_event(
        &self,
        event_type: &str,
        parameters: BTreeMap<String, Variant>,
        interruptible: bool,
    ) -> bool {
        let event = Event::new(event_type, self, parameters, interruptible);

        let mut current = Some(self.clone());
        let mut phase = EventPhase::Target;
        while let Some(element) = current {
            event.enter(&element, phase);
            for listener in element.listeners_for(event_type) {
                listener.process_event(&event);
            }
            if !event.is_propagating() {
                return false;
            }
            current = element.parent();
            phase = EventPhase::Bubble;
        }
        true
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl std::fmt::Debug for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let data = self.0.borrow();
        f.debug_struct("Element")
            .field("tag", &data.tag)
            .field("attributes", &data.attributes)
            .field("children", &data.children.len())
            .finish()
    }
}
