//! The stats tracker subsystem.
//!
//! Listens for game flow events on the messenger and keeps the Game,
//! Session and Lifetime groups up to date.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use messaging_core::{names, Event, HandlerError, Messenger, Subsystem};
use tracing::debug;

use crate::groups::{StatGroups, GAME, GAMES_PLAYED, LIFETIME, SESSION, TIME_ALIVE};
use crate::stat::StatValue;

/// Button commands the tracker reacts to.
pub mod commands {
    pub const GAMEPLAY: &str = "GAMEPLAY";
    pub const RESET_STATS: &str = "RESETSTATS";
    pub const PAUSE: &str = "PAUSE";
}

/// Keeps track of game statistics.
#[derive(Debug)]
pub struct StatsTracker {
    pub(crate) stats: RefCell<StatGroups>,
    playing: Cell<bool>,
}

impl StatsTracker {
    /// Create a tracker with the default stat layout.
    pub fn new() -> Self {
        Self::with_stats(StatGroups::with_default_layout())
    }

    pub fn with_stats(stats: StatGroups) -> Self {
        Self {
            stats: RefCell::new(stats),
            playing: Cell::new(false),
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing.get()
    }

    /// Current value of one stat.
    pub fn stat(&self, group: &str, stat: &str) -> Option<StatValue> {
        self.stats.borrow().get(group, stat).cloned()
    }

    /// Copy of every group.
    pub fn snapshot(&self) -> StatGroups {
        self.stats.borrow().clone()
    }

    /// Run `f` with mutable access to the stat groups.
    pub fn edit<R>(&self, f: impl FnOnce(&mut StatGroups) -> R) -> R {
        f(&mut self.stats.borrow_mut())
    }

    /// Per-frame update: accumulates time alive while a game is running.
    pub fn update(&self, dt: f64) {
        if self.playing.get() {
            self.stats
                .borrow_mut()
                .increment(GAME, TIME_ALIVE, &StatValue::Float(dt));
        }
    }

    pub fn on_game_over(&self) {
        self.stats.borrow_mut().roll_up(SESSION, GAME);
        self.playing.set(false);
    }

    pub fn on_restart(&self) {
        let mut stats = self.stats.borrow_mut();
        stats.roll_up(SESSION, GAME);
        stats.reset(GAME);
    }

    /// React to a `BUTTON_CLICK` event.
    pub fn on_button(&self, event: &Event) -> Result<(), HandlerError> {
        let Event::ButtonPress { command } = event else {
            return Err(HandlerError::UnexpectedEvent {
                expected: "ButtonPress",
                found: event.kind(),
            });
        };

        match command.as_str() {
            commands::GAMEPLAY => {
                let mut stats = self.stats.borrow_mut();
                stats.increment(SESSION, GAMES_PLAYED, &StatValue::Int(1));
                stats.roll_up(SESSION, GAME);
                stats.reset(GAME);
                self.playing.set(true);
            }
            commands::RESET_STATS => {
                let mut stats = self.stats.borrow_mut();
                stats.reset(GAME);
                stats.reset(LIFETIME);
                stats.reset(SESSION);
            }
            commands::PAUSE => self.playing.set(!self.playing.get()),
            other => debug!(command = other, "Ignoring button command"),
        }
        Ok(())
    }
}

impl Default for StatsTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl Subsystem for StatsTracker {
    fn name(&self) -> &'static str {
        "GameStats"
    }

    fn register(self: Rc<Self>, messenger: &Messenger) {
        let tracker = Rc::clone(&self);
        messenger.subscribe(names::GAME_OVER, move |_| {
            tracker.on_game_over();
            Ok(())
        });

        let tracker = Rc::clone(&self);
        messenger.subscribe(names::RESTART, move |_| {
            tracker.on_restart();
            Ok(())
        });

        messenger.subscribe(names::BUTTON_CLICK, move |event| self.on_button(event));
    }
}
