//! Instancer registries.

use std::collections::HashMap;
use std::rc::Rc;

use super::document::Document;
use super::element::Element;
use super::event::EventListener;

/// Tag used for the fallback element instancer.
pub const DEFAULT_TAG: &str = "*";

/// Produces elements for a tag.
pub trait ElementInstancer {
    fn instance_element(&self, parent: Option<&Element>, tag: &str) -> Option<Element>;
}

/// Produces listeners from inline handler code (`onclick="..."`).
pub trait EventListenerInstancer {
    fn instance_event_listener(&self, code: &str, element: &Element) -> Option<Rc<dyn EventListener>>;
}

struct GenericElementInstancer;

impl ElementInstancer for GenericElementInstancer {
    fn instance_element(&self, _parent: Option<&Element>, tag: &str) -> Option<Element> {
        Some(Element::new(tag))
    }
}

struct PlainDocumentInstancer;

impl ElementInstancer for PlainDocumentInstancer {
    fn instance_element(&self, _parent: Option<&Element>, tag: &str) -> Option<Element> {
        Some(Document::new(tag).as_element().clone())
    }
}

pub struct Factory {
    element_instancers: HashMap<String, Rc<dyn ElementInstancer>>,
    event_listener_instancer: Option<Rc<dyn EventListenerInstancer>>,
}

impl Factory {
    pub fn new() -> Self {
        let mut factory = Self {
            element_instancers: HashMap::new(),
            event_listener_instancer: None,
        };
        factory.register_element_instancer(DEFAULT_TAG, Rc::new(GenericElementInstancer));
        factory.register_element_instancer("body", Rc::new(PlainDocumentInstancer));
        factory
    }

    /// Register the instancer for `tag`, replacing any previous one. The
    /// factory keeps the instancer alive from here on.
    pub fn register_element_instancer(
        &mut self,
        tag: &str,
        instancer: Rc<dyn ElementInstancer>,
    ) -> Option<Rc<dyn ElementInstancer>> {
        self.element_instancers.insert(tag.to_string(), instancer)
    }

    /// Instancer for `tag`, falling back to the generic one.
    pub fn element_instancer(&self, tag: &str) -> Option<Rc<dyn ElementInstancer>> {
        self.element_instancers
            .get(tag)
            .or_else(|| self.element_instancers.get(DEFAULT_TAG))
            .cloned()
    }

    pub fn registered_tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self.element_instancers.keys().cloned().collect();
        tags.sort();
        tags
    }

    pub fn register_event_listener_instancer(
        &mut self,
        instancer: Rc<dyn EventListenerInstancer>,
    ) -> Option<Rc<dyn EventListenerInstancer>> {
        self.event_listener_instancer.replace(instancer)
    }

    pub fn event_listener_instancer(&self) -> Option<Rc<dyn EventListenerInstancer>> {
        self.event_listener_instancer.clone()
    }
}

impl Default for Factory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_instancer() {
        let factory = Factory::new();
        let instancer = factory.element_instancer("div").unwrap();
        let element = instancer.instance_element(None, "div").unwrap();
        assert_eq!(element.tag_name(), "div");
        assert!(!element.is_document());
    }

    #[test]
    fn test_body_produces_documents() {
        let factory = Factory::new();
        let element = factory
            .element_instancer("body")
            .and_then(|i| i.instance_element(None, "body"))
            .unwrap();
        assert!(element.is_document());
    }

    #[test]
    fn test_replacing_returns_previous() {
        let mut factory = Factory::new();
        assert!(factory
            .register_element_instancer("body", Rc::new(GenericElementInstancer))
            .is_some());
        assert!(factory.event_listener_instancer().is_none());
        assert_eq!(factory.registered_tags(), vec!["*".to_string(), "body".to_string()]);
    }
}
