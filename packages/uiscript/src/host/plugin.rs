//! Plugin contract between the host and its extensions.

use std::ops::BitOr;

use super::context::Context;
use super::core::Core;
use super::document::Document;
use super::element::Element;

/// Which notifications a plugin wants to receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventClasses(u32);

impl EventClasses {
    /// Initialise, shutdown, context creation and destruction.
    pub const BASIC: EventClasses = EventClasses(1);
    /// Document load and unload.
    pub const DOCUMENT: EventClasses = EventClasses(1 << 1);
    /// Element creation.
    pub const ELEMENT: EventClasses = EventClasses(1 << 2);
    pub const ALL: EventClasses = EventClasses(0b111);

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, other: EventClasses) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for EventClasses {
    type Output = EventClasses;

    fn bitor(self, rhs: EventClasses) -> EventClasses {
        EventClasses(self.0 | rhs.0)
    }
}

pub trait Plugin {
    fn event_classes(&self) -> EventClasses {
        EventClasses::ALL
    }

    fn on_initialise(&mut self, _core: &Core) {}
    fn on_shutdown(&mut self, _core: &Core) {}
    fn on_context_create(&mut self, _context: &Context) {}
    fn on_context_destroy(&mut self, _context: &Context) {}
    fn on_document_load(&mut self, _document: &Document) {}
    fn on_document_unload(&mut self, _document: &Document) {}
    fn on_element_create(&mut self, _element: &Element) {}
}
