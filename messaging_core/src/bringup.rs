//! Explicit, ordered subsystem bring-up.
//!
//! Subsystems are constructed by the application and registered with the
//! messenger in the order they are added. Registration happens once; after
//! that, subsystems talk to each other only through the messenger.

use std::rc::Rc;

use tracing::info;

use crate::messenger::Messenger;

/// A subsystem that wires its handlers into the messenger at bring-up.
pub trait Subsystem {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Register factories, subscribers and capability handlers.
    fn register(self: Rc<Self>, messenger: &Messenger);
}

/// Ordered list of subsystems to bring online.
#[derive(Default)]
pub struct BringUp {
    subsystems: Vec<Rc<dyn Subsystem>>,
}

impl BringUp {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subsystem after the ones already added.
    pub fn with<S: Subsystem + 'static>(mut self, subsystem: Rc<S>) -> Self {
        self.subsystems.push(subsystem);
        self
    }

    /// Register every subsystem, in order. Returns their names.
    pub fn run(self, messenger: &Messenger) -> Vec<&'static str> {
        let mut online = Vec::with_capacity(self.subsystems.len());
        for subsystem in self.subsystems {
            let name = subsystem.name();
            subsystem.register(messenger);
            info!("{name}: Online");
            online.push(name);
        }
        online
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Event;
    use std::cell::RefCell;

    struct Recorder {
        name: &'static str,
        order: Rc<RefCell<Vec<&'static str>>>,
    }

    impl Subsystem for Recorder {
        fn name(&self) -> &'static str {
            self.name
        }

        fn register(self: Rc<Self>, messenger: &Messenger) {
            self.order.borrow_mut().push(self.name);
            messenger.register_factory(self.name, Event::signal);
        }
    }

    #[test]
    fn test_bring_up_runs_in_order() {
        let messenger = Messenger::new();
        let order: Rc<RefCell<Vec<&'static str>>> = Rc::default();

        let online = BringUp::new()
            .with(Rc::new(Recorder {
                name: "AUDIO",
                order: Rc::clone(&order),
            }))
            .with(Rc::new(Recorder {
                name: "STATS",
                order: Rc::clone(&order),
            }))
            .run(&messenger);

        assert_eq!(online, vec!["AUDIO", "STATS"]);
        assert_eq!(*order.borrow(), vec!["AUDIO", "STATS"]);
        assert!(messenger.has_factory("AUDIO"));
        assert!(messenger.has_factory("STATS"));
    }
}
