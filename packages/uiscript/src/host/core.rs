//! Host core: plugin registry, factory and contexts.

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::rc::{Rc, Weak};

use glam::IVec2;

use super::context::Context;
use super::document::Document;
use super::element::Element;
use super::event::EventListener;
use super::factory::{ElementInstancer, EventListenerInstancer, Factory};
use super::plugin::{EventClasses, Plugin};

struct CoreInner {
    factory: RefCell<Factory>,
    contexts: RefCell<Vec<Context>>,
    plugins: RefCell<Vec<Box<dyn Plugin>>>,
    initialised: Cell<bool>,
}

/// Shared handle to the host core.
#[derive(Clone)]
pub struct Core(Rc<CoreInner>);

/// Non-owning handle held by contexts.
#[derive(Clone, Default)]
pub struct WeakCore(Weak<CoreInner>);

impl WeakCore {
    pub fn upgrade(&self) -> Option<Core> {
        self.0.upgrade().map(Core)
    }
}

impl Core {
    pub fn new() -> Self {
        Core(Rc::new(CoreInner {
            factory: RefCell::new(Factory::new()),
            contexts: RefCell::new(Vec::new()),
            plugins: RefCell::new(Vec::new()),
            initialised: Cell::new(false),
        }))
    }

    pub fn downgrade(&self) -> WeakCore {
        WeakCore(Rc::downgrade(&self.0))
    }

    pub fn ptr_eq(&self, other: &Core) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn is_initialised(&self) -> bool {
        self.0.initialised.get()
    }

    // === Plugins ===

    /// Register a plugin. If the core is already initialised the plugin is
    /// initialised immediately.
    pub fn register_plugin(&self, mut plugin: Box<dyn Plugin>) {
        if self.is_initialised() {
            plugin.on_initialise(self);
        }
        self.0.plugins.borrow_mut().push(plugin);
    }

    pub fn num_plugins(&self) -> usize {
        self.0.plugins.borrow().len()
    }

    pub fn initialise(&self) {
        if self.0.initialised.replace(true) {
            return;
        }
        log::info!("Initialising core with {} plugin(s)", self.num_plugins());

        // Plugins are taken out while they run so they can call back into
        // the core, including registering further plugins.
        let mut plugins = std::mem::take(&mut *self.0.plugins.borrow_mut());
        for plugin in plugins.iter_mut() {
            plugin.on_initialise(self);
        }
        let mut slot = self.0.plugins.borrow_mut();
        plugins.append(&mut slot);
        *slot = plugins;
    }

    /// Unload every context, shut every plugin down and release them along
    /// with all registered instancers.
    pub fn shutdown(&self) {
        if !self.0.initialised.replace(false) {
            return;
        }
        let contexts = std::mem::take(&mut *self.0.contexts.borrow_mut());
        for context in &contexts {
            context.unload_all_documents();
            self.notify(EventClasses::BASIC, |p| p.on_context_destroy(context));
        }

        let mut plugins = std::mem::take(&mut *self.0.plugins.borrow_mut());
        for plugin in plugins.iter_mut() {
            plugin.on_shutdown(self);
        }
        drop(plugins);

        *self.0.factory.borrow_mut() = Factory::new();
        log::info!("Core shut down");
    }

    fn notify(&self, class: EventClasses, mut f: impl FnMut(&mut dyn Plugin)) {
        let Ok(mut plugins) = self.0.plugins.try_borrow_mut() else {
            log::warn!("Plugin notification skipped: plugins are busy");
            return;
        };
        for plugin in plugins.iter_mut() {
            if plugin.event_classes().contains(class) {
                f(plugin.as_mut());
            }
        }
    }

    pub(crate) fn notify_document_load(&self, document: &Document) {
        self.notify(EventClasses::DOCUMENT, |p| p.on_document_load(document));
    }

    pub(crate) fn notify_document_unload(&self, document: &Document) {
        self.notify(EventClasses::DOCUMENT, |p| p.on_document_unload(document));
    }

    // === Factory ===

    pub fn factory(&self) -> Ref<'_, Factory> {
        self.0.factory.borrow()
    }

    pub fn factory_mut(&self) -> RefMut<'_, Factory> {
        self.0.factory.borrow_mut()
    }

    pub fn register_element_instancer(&self, tag: &str, instancer: Rc<dyn ElementInstancer>) {
        self.factory_mut().register_element_instancer(tag, instancer);
    }

    pub fn register_event_listener_instancer(&self, instancer: Rc<dyn EventListenerInstancer>) {
        self.factory_mut().register_event_listener_instancer(instancer);
    }

    pub fn instance_element(&self, parent: Option<&Element>, tag: &str) -> Option<Element> {
        // Released before the instancer runs: script instancers re-enter the core.
        let instancer = self.factory().element_instancer(tag)?;
        let element = instancer.instance_element(parent, tag)?;
        self.notify(EventClasses::ELEMENT, |p| p.on_element_create(&element));
        Some(element)
    }

    pub fn instance_event_listener(&self, code: &str, element: &Element) -> Option<Rc<dyn EventListener>> {
        let instancer = self.factory().event_listener_instancer();
        match instancer {
            Some(instancer) => instancer.instance_event_listener(code, element),
            None => {
                log::warn!("No event listener instancer registered; inline handler ignored");
                None
            }
        }
    }

    // === Contexts ===

    /// Create a named context. Returns `None` if the name is taken.
    pub fn create_context(&self, name: &str, dimensions: IVec2) -> Option<Context> {
        if self.get_context(name).is_some() {
            log::warn!("Context '{}' already exists", name);
            return None;
        }
        let context = Context::new(name, dimensions, self.downgrade());
        self.0.contexts.borrow_mut().push(context.clone());
        self.notify(EventClasses::BASIC, |p| p.on_context_create(&context));
        Some(context)
    }

    pub fn get_context(&self, name: &str) -> Option<Context> {
        self.0
            .contexts
            .borrow()
            .iter()
            .find(|c| c.name() == name)
            .cloned()
    }

    pub fn contexts(&self) -> Vec<Context> {
        self.0.contexts.borrow().clone()
    }

    pub fn remove_context(&self, name: &str) -> bool {
        let context = {
            let mut contexts = self.0.contexts.borrow_mut();
            let Some(index) = contexts.iter().position(|c| c.name() == name) else {
                return false;
            };
            contexts.remove(index)
        };
        context.unload_all_documents();
        self.notify(EventClasses::BASIC, |p| p.on_context_destroy(&context));
        true
    }
}

impl Default for Core {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counts {
        init: usize,
        shutdown: usize,
        contexts: usize,
        documents: usize,
        elements: usize,
    }

    struct CountingPlugin {
        classes: EventClasses,
        counts: Rc<RefCell<Counts>>,
    }

    impl Plugin for CountingPlugin {
        fn event_classes(&self) -> EventClasses {
            self.classes
        }
        fn on_initialise(&mut self, _core: &Core) {
            self.counts.borrow_mut().init += 1;
        }
        fn on_shutdown(&mut self, _core: &Core) {
            self.counts.borrow_mut().shutdown += 1;
        }
        fn on_context_create(&mut self, _context: &Context) {
            self.counts.borrow_mut().contexts += 1;
        }
        fn on_document_load(&mut self, _document: &Document) {
            self.counts.borrow_mut().documents += 1;
        }
        fn on_element_create(&mut self, _element: &Element) {
            self.counts.borrow_mut().elements += 1;
        }
    }

    fn plugin(classes: EventClasses) -> (Box<dyn Plugin>, Rc<RefCell<Counts>>) {
        let counts = Rc::new(RefCell::new(Counts::default()));
        (Box::new(CountingPlugin { classes, counts: counts.clone() }), counts)
    }

    #[test]
    fn test_lifecycle_hooks() {
        let core = Core::new();
        let (p, counts) = plugin(EventClasses::ALL);
        core.register_plugin(p);
        assert_eq!(counts.borrow().init, 0);

        core.initialise();
        core.initialise();
        assert_eq!(counts.borrow().init, 1);

        core.shutdown();
        assert_eq!(counts.borrow().shutdown, 1);
        assert_eq!(core.num_plugins(), 0);
    }

    #[test]
    fn test_late_registration_initialises_immediately() {
        let core = Core::new();
        core.initialise();
        let (p, counts) = plugin(EventClasses::BASIC);
        core.register_plugin(p);
        assert_eq!(counts.borrow().init, 1);
    }

    #[test]
    fn test_notifications_respect_event_classes() {
        let core = Core::new();
        let (basic, basic_counts) = plugin(EventClasses::BASIC);
        let (all, all_counts) = plugin(EventClasses::ALL);
        core.register_plugin(basic);
        core.register_plugin(all);
        core.initialise();

        let context = core.create_context("main", IVec2::new(800, 600)).unwrap();
        context.create_document("body").unwrap();

        assert_eq!(basic_counts.borrow().contexts, 1);
        assert_eq!(basic_counts.borrow().documents, 0);
        assert_eq!(basic_counts.borrow().elements, 0);
        assert_eq!(all_counts.borrow().contexts, 1);
        assert_eq!(all_counts.borrow().documents, 1);
        assert_eq!(all_counts.borrow().elements, 1);
    }

    #[test]
    fn test_contexts() {
        let core = Core::new();
        let ctx = core.create_context("main", IVec2::new(640, 480)).unwrap();
        assert!(core.create_context("main", IVec2::ZERO).is_none());
        assert_eq!(core.get_context("main"), Some(ctx.clone()));

        let doc = ctx.create_document("body").unwrap();
        doc.set_id("menu");
        assert_eq!(ctx.get_document("menu"), Some(doc.clone()));
        assert_eq!(doc.context(), Some(ctx.clone()));

        assert!(doc.close());
        assert_eq!(ctx.num_documents(), 0);
        assert!(doc.context().is_none());

        assert!(core.remove_context("main"));
        assert!(core.contexts().is_empty());
    }

    #[test]
    fn test_create_document_requires_document_instancer() {
        let core = Core::new();
        let ctx = core.create_context("main", IVec2::ZERO).unwrap();
        assert!(ctx.create_document("div").is_none());
    }
}
