//! Event payloads delivered by the bus.
//!
//! Every kind of occurrence has one variant. Factories build events from
//! publisher arguments; subscribers only ever see `&Event`.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::bringup::Subsystem;
use crate::entity::EntityId;
use crate::error::MessagingError;
use crate::messenger::Messenger;
use crate::value::Args;

/// Well-known event and channel names.
pub mod names {
    pub const GAME_OVER: &str = "GAMEOVER";
    pub const RESTART: &str = "RESTART";
    pub const BUTTON_CLICK: &str = "BUTTON_CLICK";
    pub const PAUSE: &str = "PAUSE";
    pub const LEVEL_UP: &str = "LEVEL_UP";
    pub const ENTITY_CREATION: &str = "ENTITY_CREATION";
    pub const ENTITY_STATE: &str = "ENTITY_STATE";
    pub const COLLISION_ENTER: &str = "COLLISION_ENTER";
    pub const COLLISION_STAY: &str = "COLLISION_STAY";
    pub const COLLISION_EXIT: &str = "COLLISION_EXIT";
    pub const MOUSE_CLICK: &str = "MOUSE_CLICK";
    pub const AUDIO: &str = "AUDIO";

    /// Special event carrying the ID of a deleted entity.
    pub const ENTITY_DELETION: &str = "ENTITY_DELETION";
    /// Special request resolving an entity name to its ID.
    pub const FIND_BY_NAME: &str = "FIND_BY_NAME";
}

/// Which part of a contact an event reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollisionPhase {
    Enter,
    Stay,
    Exit,
}

/// An immutable description of something that happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// Zero-payload notification (e.g. `GAMEOVER`, `RESTART`).
    Signal,
    ButtonPress {
        command: String,
    },
    EntityCreated {
        id: EntityId,
        archetype: String,
    },
    EntityState {
        id: EntityId,
        active: bool,
    },
    Collision {
        phase: CollisionPhase,
        first: EntityId,
        second: EntityId,
    },
    MouseClick {
        x: f32,
        y: f32,
    },
    Audio {
        cue: String,
    },
    Pause {
        paused: bool,
    },
    LevelUp {
        id: EntityId,
        level: i64,
    },
}

impl Event {
    /// Variant name, used in logs and handler errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::Signal => "Signal",
            Event::ButtonPress { .. } => "ButtonPress",
            Event::EntityCreated { .. } => "EntityCreated",
            Event::EntityState { .. } => "EntityState",
            Event::Collision { .. } => "Collision",
            Event::MouseClick { .. } => "MouseClick",
            Event::Audio { .. } => "Audio",
            Event::Pause { .. } => "Pause",
            Event::LevelUp { .. } => "LevelUp",
        }
    }

    /// Factory for zero-payload events. Arguments are ignored.
    pub fn signal(_args: &Args<'_>) -> Result<Event, MessagingError> {
        Ok(Event::Signal)
    }

    /// `(command: text)`
    pub fn button_press(args: &Args<'_>) -> Result<Event, MessagingError> {
        Ok(Event::ButtonPress {
            command: args.text(0)?.to_string(),
        })
    }

    /// `(id: entity, archetype: text)`
    pub fn entity_created(args: &Args<'_>) -> Result<Event, MessagingError> {
        Ok(Event::EntityCreated {
            id: args.entity(0)?,
            archetype: args.text(1)?.to_string(),
        })
    }

    /// `(id: entity, active: bool)`
    pub fn entity_state(args: &Args<'_>) -> Result<Event, MessagingError> {
        Ok(Event::EntityState {
            id: args.entity(0)?,
            active: args.boolean(1)?,
        })
    }

    /// Factory for one collision phase: `(first: entity, second: entity)`.
    pub fn collision(
        phase: CollisionPhase,
    ) -> impl Fn(&Args<'_>) -> Result<Event, MessagingError> {
        move |args| {
            Ok(Event::Collision {
                phase,
                first: args.entity(0)?,
                second: args.entity(1)?,
            })
        }
    }

    /// `(x: float, y: float)`
    pub fn mouse_click(args: &Args<'_>) -> Result<Event, MessagingError> {
        Ok(Event::MouseClick {
            x: args.float(0)? as f32,
            y: args.float(1)? as f32,
        })
    }

    /// `(cue: text)`
    pub fn audio(args: &Args<'_>) -> Result<Event, MessagingError> {
        Ok(Event::Audio {
            cue: args.text(0)?.to_string(),
        })
    }

    /// `(paused: bool)`
    pub fn pause(args: &Args<'_>) -> Result<Event, MessagingError> {
        Ok(Event::Pause {
            paused: args.boolean(0)?,
        })
    }

    /// `(id: entity, level: int)`
    pub fn level_up(args: &Args<'_>) -> Result<Event, MessagingError> {
        Ok(Event::LevelUp {
            id: args.entity(0)?,
            level: args.int(1)?,
        })
    }
}

/// Registers the factory of every standard event under its well-known name.
pub struct StandardEvents;

impl Subsystem for StandardEvents {
    fn name(&self) -> &'static str {
        "StandardEvents"
    }

    fn register(self: Rc<Self>, messenger: &Messenger) {
        messenger.register_factory(names::GAME_OVER, Event::signal);
        messenger.register_factory(names::RESTART, Event::signal);
        messenger.register_factory(names::BUTTON_CLICK, Event::button_press);
        messenger.register_factory(names::PAUSE, Event::pause);
        messenger.register_factory(names::LEVEL_UP, Event::level_up);
        messenger.register_factory(names::ENTITY_CREATION, Event::entity_created);
        messenger.register_factory(names::ENTITY_STATE, Event::entity_state);
        messenger.register_factory(names::COLLISION_ENTER, Event::collision(CollisionPhase::Enter));
        messenger.register_factory(names::COLLISION_STAY, Event::collision(CollisionPhase::Stay));
        messenger.register_factory(names::COLLISION_EXIT, Event::collision(CollisionPhase::Exit));
        messenger.register_factory(names::MOUSE_CLICK, Event::mouse_click);
        messenger.register_factory(names::AUDIO, Event::audio);
    }
}
