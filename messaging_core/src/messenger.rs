//! The messenger: one registry object holding the event bus, the capability
//! tables and the special channels.
//!
//! A messenger is built once during bring-up and handed by reference to every
//! subsystem. All methods take `&self`; handlers may publish, register or
//! dispatch from inside a delivery. It is single-threaded (`!Send`) and does
//! no queuing: every call runs to completion on the caller's stack.

use std::cell::Cell;
use std::rc::Rc;

use tracing::{error, info, warn};

use crate::bus::{Delivery, EventBus};
use crate::capability::{Capability, CapabilityTag, CapabilityTables, Table};
use crate::config::MessengerConfig;
use crate::entity::EntityId;
use crate::error::{HandlerError, MessagingError};
use crate::event::Event;
use crate::fault::{Fault, FaultKind, FaultLog};
use crate::handler::{Dispatch, HandlerId};
use crate::special::SpecialChannels;
use crate::value::{Args, FromValue, Value};

/// The communication hub shared by all subsystems.
pub struct Messenger {
    config: MessengerConfig,
    faults: FaultLog,
    bus: EventBus,
    capabilities: CapabilityTables,
    special: SpecialChannels,
    live: Cell<bool>,
}

impl Messenger {
    /// Create a messenger with default configuration.
    pub fn new() -> Self {
        Self::with_config(MessengerConfig::default())
    }

    pub fn with_config(config: MessengerConfig) -> Self {
        Self {
            faults: FaultLog::new(config.fault_log_capacity),
            config,
            bus: EventBus::default(),
            capabilities: CapabilityTables::default(),
            special: SpecialChannels::default(),
            live: Cell::new(true),
        }
    }

    pub fn config(&self) -> &MessengerConfig {
        &self.config
    }

    fn dispatch(&self) -> Dispatch<'_> {
        Dispatch {
            config: &self.config,
            faults: &self.faults,
        }
    }

    fn overwritten(&self, replaced: bool, what: &str, key: &str) {
        if replaced && self.config.warn_on_overwrite {
            warn!(kind = what, key, "Registration replaced an existing handler");
        }
    }

    fn bound(&self, outcome: Result<bool, MessagingError>, table: &str, tag: CapabilityTag) {
        match outcome {
            Ok(replaced) => self.overwritten(replaced, table, tag.name()),
            Err(err) => error!(table, error = %err, "Capability registration refused"),
        }
    }

    // ---- event bus ----

    /// Append `handler` to the subscribers of `name`.
    ///
    /// Handlers are never deduplicated and cannot be removed.
    pub fn subscribe(
        &self,
        name: &str,
        handler: impl Fn(&Event) -> Result<(), HandlerError> + 'static,
    ) -> HandlerId {
        self.bus.subscribe(name, Rc::new(handler))
    }

    /// Install the factory that builds events published under `name`,
    /// replacing any previous one.
    pub fn register_factory(
        &self,
        name: &str,
        factory: impl Fn(&Args<'_>) -> Result<Event, MessagingError> + 'static,
    ) {
        if !self.is_live() {
            error!(event = name, "Messenger is torn down, factory not registered");
            return;
        }
        let replaced = self.bus.register_factory(name, Rc::new(factory));
        self.overwritten(replaced, "factory", name);
    }

    /// Build an event from `args` with the factory for `name` and deliver it.
    ///
    /// Never fails from the caller's point of view: a missing or failing
    /// factory aborts delivery, a failing subscriber is skipped, and both are
    /// logged and recorded in [`Messenger::faults`].
    pub fn publish(&self, name: &str, args: &[Value]) -> Delivery {
        if !self.is_live() {
            return self.offline(name);
        }
        self.bus.publish(name, args, self.dispatch())
    }

    /// Deliver an event the caller already built. The event is dropped once
    /// every subscriber has seen it.
    pub fn publish_event(&self, name: &str, event: Event) -> Delivery {
        if !self.is_live() {
            return self.offline(name);
        }
        self.bus.deliver(name, event, self.dispatch())
    }

    // After teardown no construction path is reachable: every publish misses.
    fn offline(&self, name: &str) -> Delivery {
        error!(event = name, "Messenger is torn down, event dropped");
        self.faults.record(Fault {
            kind: FaultKind::MissingFactory,
            channel: name.to_string(),
            handler: None,
            detail: "messenger torn down".to_string(),
        });
        Delivery::Aborted(FaultKind::MissingFactory)
    }

    pub fn subscriber_count(&self, name: &str) -> usize {
        self.bus.subscriber_count(name)
    }

    pub fn has_factory(&self, name: &str) -> bool {
        self.bus.has_factory(name)
    }

    // ---- capability tables ----

    pub fn register_exists<T: Capability>(&self, handler: impl Fn(EntityId) -> bool + 'static) {
        let outcome = self.capabilities.bind_exists::<T>(Rc::new(handler));
        self.bound(outcome, "exists", T::TAG);
    }

    pub fn register_fetch<T: Capability>(
        &self,
        handler: impl Fn(EntityId) -> Option<Value> + 'static,
    ) {
        let outcome = self.capabilities.bind_fetch::<T>(Rc::new(handler));
        self.bound(outcome, "fetch", T::TAG);
    }

    pub fn register_create<T: Capability>(&self, handler: impl Fn(&str, EntityId) + 'static) {
        let outcome = self.capabilities.bind_create::<T>(Rc::new(handler));
        self.bound(outcome, "create", T::TAG);
    }

    pub fn register_toggle<T: Capability>(&self, handler: impl Fn(EntityId, bool) + 'static) {
        let outcome = self.capabilities.bind_toggle::<T>(Rc::new(handler));
        self.bound(outcome, "toggle", T::TAG);
    }

    /// Whether a `T` exists for `id`.
    ///
    /// Capability calls assume the owner registered during bring-up; a
    /// missing handler is an error for the caller, not a logged fault.
    pub fn query<T: Capability>(&self, id: EntityId) -> Result<bool, MessagingError> {
        let handler = self.capabilities.exists::<T>().map_err(report)?;
        Ok(handler(id))
    }

    /// Fetch the `T` associated with `id`, if its owner has one.
    pub fn fetch<T: Capability>(&self, id: EntityId) -> Result<Option<T::Fetched>, MessagingError> {
        let handler = self.capabilities.fetch::<T>().map_err(report)?;
        let Some(value) = handler(id) else {
            return Ok(None);
        };

        let found = value.kind();
        <T::Fetched as FromValue>::from_value(value)
            .map(Some)
            .map_err(|_| {
                report(MessagingError::TypeMismatch {
                    tag: T::TAG,
                    expected: <T::Fetched as FromValue>::EXPECTED,
                    found: found.to_string(),
                })
            })
    }

    /// Ask the owner of `T` to create one from `archetype` for `id`.
    pub fn create<T: Capability>(&self, archetype: &str, id: EntityId) -> Result<(), MessagingError> {
        let handler = self.capabilities.create::<T>().map_err(report)?;
        handler(archetype, id);
        Ok(())
    }

    /// Activate or deactivate the `T` associated with `id`.
    pub fn set_state<T: Capability>(&self, id: EntityId, active: bool) -> Result<(), MessagingError> {
        let handler = self.capabilities.toggle::<T>().map_err(report)?;
        handler(id, active);
        Ok(())
    }

    pub fn activate<T: Capability>(&self, id: EntityId) -> Result<(), MessagingError> {
        self.set_state::<T>(id, true)
    }

    pub fn deactivate<T: Capability>(&self, id: EntityId) -> Result<(), MessagingError> {
        self.set_state::<T>(id, false)
    }

    pub fn has_handler<T: Capability>(&self, table: Table) -> bool {
        self.capabilities.contains::<T>(table)
    }

    // ---- special channels ----

    pub fn register_special_event(
        &self,
        name: &str,
        handler: impl Fn(EntityId) -> Result<(), HandlerError> + 'static,
    ) -> HandlerId {
        self.special.register_event(name, Rc::new(handler))
    }

    pub fn register_special_request(
        &self,
        name: &str,
        handler: impl Fn(&str) -> Option<EntityId> + 'static,
    ) {
        let replaced = self.special.register_request(name, Rc::new(handler));
        self.overwritten(replaced, "special request", name);
    }

    /// Forward `id` to every handler of the special event `name`.
    pub fn special_publish(&self, name: &str, id: EntityId) -> Delivery {
        self.special.publish(name, id, self.dispatch())
    }

    /// Resolve `arg` through the special request `name`.
    pub fn special_request(&self, name: &str, arg: &str) -> Option<EntityId> {
        self.special.request(name, arg, self.dispatch())
    }

    pub fn special_handler_count(&self, name: &str) -> usize {
        self.special.handler_count(name)
    }

    pub fn has_special_request(&self, name: &str) -> bool {
        self.special.has_request(name)
    }

    // ---- faults and lifecycle ----

    /// Faults recorded so far, oldest first.
    pub fn faults(&self) -> Vec<Fault> {
        self.faults.snapshot()
    }

    /// Number of recorded faults of one kind.
    pub fn fault_count(&self, kind: FaultKind) -> usize {
        self.faults
            .snapshot()
            .iter()
            .filter(|f| f.kind == kind)
            .count()
    }

    pub fn clear_faults(&self) {
        self.faults.clear();
    }

    pub fn is_live(&self) -> bool {
        self.live.get()
    }

    /// Shut the messenger down.
    ///
    /// The factory table is cleared and further factory registrations and
    /// publishes are refused. Subscribers, capability tables and special
    /// channels are left as is.
    pub fn teardown(&self) {
        if !self.live.replace(false) {
            return;
        }
        self.bus.clear_factories();
        info!("Messenger: Offline");
    }
}

impl Default for Messenger {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Messenger {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn report(err: MessagingError) -> MessagingError {
    error!(error = %err, "Capability dispatch failed");
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use crate::value::decode_record;
    use serde::{Deserialize, Serialize};
    use std::cell::RefCell;

    type Log = Rc<RefCell<Vec<String>>>;

    fn marker(log: &Log, text: &'static str) -> impl Fn(&Event) -> Result<(), HandlerError> {
        let log = Rc::clone(log);
        move |_| {
            log.borrow_mut().push(text.to_string());
            Ok(())
        }
    }

    struct Health;

    impl Capability for Health {
        const TAG: CapabilityTag = CapabilityTag::new("Health");
        type Fetched = HealthComponent;
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct HealthComponent {
        current: i32,
        max: i32,
    }

    impl FromValue for HealthComponent {
        const EXPECTED: &'static str = "HealthComponent";

        fn from_value(value: Value) -> Result<Self, MessagingError> {
            decode_record(value, Self::EXPECTED)
        }
    }

    #[test]
    fn test_ping_reaches_subscribers_in_order() {
        let messenger = Messenger::new();
        let log: Log = Rc::default();

        messenger.register_factory("PING", Event::signal);
        messenger.subscribe("PING", marker(&log, "first"));
        messenger.subscribe("PING", marker(&log, "second"));

        let delivery = messenger.publish("PING", &[]);

        assert_eq!(*log.borrow(), vec!["first", "second"]);
        assert_eq!(delivery, Delivery::Delivered { invoked: 2, failed: 0 });
    }

    #[test]
    fn test_failing_subscriber_does_not_stop_delivery() {
        let messenger = Messenger::new();
        let log: Log = Rc::default();

        messenger.register_factory("HIT", Event::signal);
        messenger.subscribe("HIT", marker(&log, "a"));
        messenger.subscribe("HIT", |_| Err(HandlerError::msg("broken")));
        messenger.subscribe("HIT", |_| panic!("worse"));
        messenger.subscribe("HIT", marker(&log, "d"));

        let delivery = messenger.publish("HIT", &[]);

        assert_eq!(*log.borrow(), vec!["a", "d"]);
        assert_eq!(delivery, Delivery::Delivered { invoked: 4, failed: 2 });
        assert_eq!(messenger.fault_count(FaultKind::Subscriber), 2);
    }

    #[test]
    fn test_missing_factory_records_one_fault() {
        let messenger = Messenger::new();
        let log: Log = Rc::default();
        messenger.subscribe("GHOST", marker(&log, "never"));

        let delivery = messenger.publish("GHOST", &args![1]);

        assert_eq!(delivery, Delivery::Aborted(FaultKind::MissingFactory));
        assert!(log.borrow().is_empty());
        let faults = messenger.faults();
        assert_eq!(faults.len(), 1);
        assert_eq!(faults[0].kind, FaultKind::MissingFactory);
        assert_eq!(faults[0].channel, "GHOST");
    }

    #[test]
    fn test_failing_factory_aborts() {
        let messenger = Messenger::new();
        let log: Log = Rc::default();
        messenger.register_factory("BUTTON_CLICK", Event::button_press);
        messenger.subscribe("BUTTON_CLICK", marker(&log, "never"));

        // Wrong argument kind.
        let delivery = messenger.publish("BUTTON_CLICK", &args![3]);
        assert_eq!(delivery, Delivery::Aborted(FaultKind::Construction));

        messenger.register_factory("BOOM", |_| panic!("factory exploded"));
        messenger.subscribe("BOOM", marker(&log, "never"));
        assert!(!messenger.publish("BOOM", &[]).is_delivered());

        assert!(log.borrow().is_empty());
        assert_eq!(messenger.fault_count(FaultKind::Construction), 2);
    }

    #[test]
    fn test_second_factory_replaces_first() {
        let messenger = Messenger::new();
        let seen: Rc<RefCell<Vec<Event>>> = Rc::default();

        messenger.register_factory("CLICK", |_| {
            Ok(Event::ButtonPress {
                command: "old".to_string(),
            })
        });
        messenger.register_factory("CLICK", |_| {
            Ok(Event::ButtonPress {
                command: "new".to_string(),
            })
        });
        let sink = Rc::clone(&seen);
        messenger.subscribe("CLICK", move |event| {
            sink.borrow_mut().push(event.clone());
            Ok(())
        });

        messenger.publish("CLICK", &[]);

        assert_eq!(
            *seen.borrow(),
            vec![Event::ButtonPress {
                command: "new".to_string()
            }]
        );
    }

    #[test]
    fn test_publish_event_delivers_owned_value() {
        let messenger = Messenger::new();
        let seen: Rc<RefCell<Vec<i64>>> = Rc::default();
        let sink = Rc::clone(&seen);
        messenger.subscribe("LEVEL_UP", move |event| match event {
            Event::LevelUp { level, .. } => {
                sink.borrow_mut().push(*level);
                Ok(())
            }
            other => Err(HandlerError::UnexpectedEvent {
                expected: "LevelUp",
                found: other.kind(),
            }),
        });

        // No factory needed when the caller supplies the event.
        let delivery = messenger.publish_event(
            "LEVEL_UP",
            Event::LevelUp {
                id: EntityId(1),
                level: 4,
            },
        );

        assert!(delivery.is_delivered());
        assert_eq!(*seen.borrow(), vec![4]);
    }

    #[test]
    fn test_subscriber_can_publish_reentrantly() {
        let messenger = Rc::new(Messenger::new());
        let log: Log = Rc::default();

        messenger.register_factory("OUTER", Event::signal);
        messenger.register_factory("INNER", Event::signal);
        messenger.subscribe("INNER", marker(&log, "inner"));

        let inner = Rc::downgrade(&messenger);
        let outer_log = Rc::clone(&log);
        messenger.subscribe("OUTER", move |_| {
            outer_log.borrow_mut().push("outer".to_string());
            if let Some(m) = inner.upgrade() {
                m.publish("INNER", &[]);
            }
            Ok(())
        });

        messenger.publish("OUTER", &[]);

        assert_eq!(*log.borrow(), vec!["outer", "inner"]);
    }

    #[test]
    fn test_query_uses_latest_handler() {
        let messenger = Messenger::new();
        messenger.register_exists::<Health>(|id| id == EntityId(5));

        assert!(messenger.query::<Health>(EntityId(5)).unwrap());
        assert!(!messenger.query::<Health>(EntityId(6)).unwrap());

        messenger.register_exists::<Health>(|id| id == EntityId(6));
        assert!(messenger.query::<Health>(EntityId(6)).unwrap());
    }

    #[test]
    fn test_capability_without_handler_is_error() {
        let messenger = Messenger::new();

        assert!(matches!(
            messenger.query::<Health>(EntityId(1)),
            Err(MessagingError::MissingHandler {
                table: Table::Exists,
                ..
            })
        ));
        assert!(messenger.create::<Health>("Goblin", EntityId(1)).is_err());
        assert!(messenger.activate::<Health>(EntityId(1)).is_err());
        assert!(messenger.fetch::<Health>(EntityId(1)).is_err());
        // Capability errors are returned, not recorded as bus faults.
        assert!(messenger.faults().is_empty());
    }

    #[test]
    fn test_fetch_decodes_record() {
        let messenger = Messenger::new();
        messenger.register_fetch::<Health>(|id| {
            (id == EntityId(1))
                .then(|| Value::record(&HealthComponent { current: 7, max: 10 }).ok())
                .flatten()
        });

        let fetched = messenger.fetch::<Health>(EntityId(1)).unwrap();
        assert_eq!(fetched, Some(HealthComponent { current: 7, max: 10 }));
        assert_eq!(messenger.fetch::<Health>(EntityId(2)).unwrap(), None);
    }

    #[test]
    fn test_fetch_type_mismatch() {
        let messenger = Messenger::new();
        messenger.register_fetch::<Health>(|_| Some(Value::Text("not health".to_string())));

        let result = messenger.fetch::<Health>(EntityId(1));
        assert!(matches!(
            result,
            Err(MessagingError::TypeMismatch {
                expected: "HealthComponent",
                ..
            })
        ));
    }

    #[test]
    fn test_create_and_toggle_forward_arguments() {
        let messenger = Messenger::new();
        let calls: Rc<RefCell<Vec<String>>> = Rc::default();

        let sink = Rc::clone(&calls);
        messenger.register_create::<Health>(move |archetype, id| {
            sink.borrow_mut().push(format!("create {archetype} {id}"));
        });
        let sink = Rc::clone(&calls);
        messenger.register_toggle::<Health>(move |id, active| {
            sink.borrow_mut().push(format!("toggle {id} {active}"));
        });

        messenger.create::<Health>("Goblin", EntityId(3)).unwrap();
        messenger.deactivate::<Health>(EntityId(3)).unwrap();
        messenger.activate::<Health>(EntityId(3)).unwrap();

        assert_eq!(
            *calls.borrow(),
            vec!["create Goblin #3", "toggle #3 false", "toggle #3 true"]
        );
        assert!(messenger.has_handler::<Health>(Table::Create));
        assert!(!messenger.has_handler::<Health>(Table::Exists));
    }

    #[test]
    fn test_special_event_isolates_faults() {
        let messenger = Messenger::new();
        let deleted: Rc<RefCell<Vec<EntityId>>> = Rc::default();

        messenger.register_special_event("ENTITY_DELETED", |_| Err(HandlerError::msg("nope")));
        let sink = Rc::clone(&deleted);
        messenger.register_special_event("ENTITY_DELETED", move |id| {
            sink.borrow_mut().push(id);
            Ok(())
        });

        let delivery = messenger.special_publish("ENTITY_DELETED", EntityId(8));

        assert_eq!(*deleted.borrow(), vec![EntityId(8)]);
        assert_eq!(delivery, Delivery::Delivered { invoked: 2, failed: 1 });
        assert_eq!(messenger.fault_count(FaultKind::SpecialSubscriber), 1);
        assert_eq!(messenger.special_handler_count("ENTITY_DELETED"), 2);
    }

    #[test]
    fn test_special_publish_without_handlers() {
        let messenger = Messenger::new();
        let delivery = messenger.special_publish("NOBODY", EntityId(1));
        assert_eq!(delivery, Delivery::Delivered { invoked: 0, failed: 0 });
        assert!(messenger.faults().is_empty());
    }

    #[test]
    fn test_special_request_resolves_names() {
        let messenger = Messenger::new();
        messenger.register_special_request("FIND_BY_NAME", |name| {
            (name == "Player").then_some(EntityId(42))
        });

        assert_eq!(
            messenger.special_request("FIND_BY_NAME", "Player"),
            Some(EntityId(42))
        );
        assert_eq!(messenger.special_request("FIND_BY_NAME", "Ghost"), None);
        assert_eq!(messenger.special_request("UNKNOWN", "Player"), None);
    }

    #[test]
    fn test_special_request_panic_resolves_to_none() {
        let messenger = Messenger::new();
        messenger.register_special_request("FIND_BY_NAME", |_| panic!("lookup broke"));

        assert_eq!(messenger.special_request("FIND_BY_NAME", "Player"), None);
        assert_eq!(messenger.fault_count(FaultKind::SpecialRequest), 1);
    }

    #[test]
    fn test_teardown_clears_factories_only() {
        let messenger = Messenger::new();
        let log: Log = Rc::default();
        messenger.register_factory("PING", Event::signal);
        messenger.subscribe("PING", marker(&log, "ping"));
        messenger.register_exists::<Health>(|_| true);

        messenger.teardown();

        assert!(!messenger.is_live());
        assert!(!messenger.has_factory("PING"));
        assert_eq!(
            messenger.publish("PING", &[]),
            Delivery::Aborted(FaultKind::MissingFactory)
        );
        assert!(log.borrow().is_empty());
        assert!(messenger.query::<Health>(EntityId(1)).unwrap());
        assert_eq!(messenger.subscriber_count("PING"), 1);
    }

    #[test]
    fn test_publish_after_teardown_is_refused() {
        let messenger = Messenger::new();
        let log: Log = Rc::default();
        messenger.subscribe("PING", marker(&log, "ping"));

        messenger.teardown();
        messenger.register_factory("PING", Event::signal);

        assert!(!messenger.has_factory("PING"));
        assert_eq!(
            messenger.publish("PING", &[]),
            Delivery::Aborted(FaultKind::MissingFactory)
        );
        assert_eq!(
            messenger.publish_event("PING", Event::Signal),
            Delivery::Aborted(FaultKind::MissingFactory)
        );
        assert!(log.borrow().is_empty());
        assert_eq!(messenger.fault_count(FaultKind::MissingFactory), 2);
    }

    struct Armor;

    impl Capability for Armor {
        const TAG: CapabilityTag = CapabilityTag::new("Health");
        type Fetched = i64;
    }

    #[test]
    fn test_shared_tag_does_not_hijack_dispatch() {
        let messenger = Messenger::new();
        messenger.register_exists::<Health>(|_| true);
        messenger.register_exists::<Armor>(|_| false);

        assert!(messenger.query::<Health>(EntityId(1)).unwrap());
        assert!(matches!(
            messenger.query::<Armor>(EntityId(1)),
            Err(MessagingError::TagCollision { .. })
        ));
        assert!(!messenger.has_handler::<Armor>(Table::Exists));
    }

    #[test]
    #[should_panic(expected = "subscriber exploded")]
    fn test_panics_propagate_without_isolation() {
        let messenger = Messenger::with_config(MessengerConfig {
            isolate_panics: false,
            ..Default::default()
        });
        messenger.register_factory("PING", Event::signal);
        messenger.subscribe("PING", |_| panic!("subscriber exploded"));
        messenger.publish("PING", &[]);
    }

    #[test]
    fn test_quiet_overwrite_still_replaces_factory() {
        let messenger = Messenger::with_config(MessengerConfig {
            warn_on_overwrite: false,
            ..Default::default()
        });
        let seen: Rc<RefCell<Vec<Event>>> = Rc::default();
        let sink = Rc::clone(&seen);
        messenger.register_factory("PING", Event::signal);
        messenger.register_factory("PING", |_| Ok(Event::Pause { paused: true }));
        messenger.subscribe("PING", move |event: &Event| {
            sink.borrow_mut().push(event.clone());
            Ok(())
        });

        messenger.publish("PING", &[]);

        assert_eq!(*seen.borrow(), vec![Event::Pause { paused: true }]);
    }

    #[test]
    fn test_fault_log_respects_config() {
        let messenger = Messenger::with_config(MessengerConfig {
            fault_log_capacity: 0,
            ..Default::default()
        });
        messenger.publish("MISSING", &[]);
        assert!(messenger.faults().is_empty());
    }
}
