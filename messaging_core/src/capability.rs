//! Capability tables: "does a T exist / fetch T / create T / toggle T"
//! dispatched to whichever subsystem owns T.
//!
//! Capabilities are identified by an explicit [`CapabilityTag`] declared on
//! a marker type, so callers name a capability without depending on the
//! crate that implements it. Each table holds at most one handler per tag;
//! the last registration by the same type wins. A tag is owned by the first
//! type that binds it: another type declaring the same tag is refused, and
//! dispatching through it fails with [`MessagingError::TagCollision`].

use std::cell::RefCell;
use std::collections::HashMap;

use serde::Serialize;

use crate::error::MessagingError;
use crate::handler::{CreateFn, ExistsFn, FetchFn, ToggleFn};
use crate::value::FromValue;

/// Process-wide identifier of a logical capability type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct CapabilityTag(&'static str);

impl CapabilityTag {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub const fn name(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for CapabilityTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

/// A capability that can be dispatched through the tables.
///
/// ```
/// use messaging_core::{Capability, CapabilityTag};
///
/// struct Health;
///
/// impl Capability for Health {
///     const TAG: CapabilityTag = CapabilityTag::new("Health");
///     type Fetched = i64;
/// }
/// ```
pub trait Capability {
    const TAG: CapabilityTag;

    /// What a fetch for this capability decodes into.
    type Fetched: FromValue;
}

/// The four capability tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Table {
    Exists,
    Fetch,
    Create,
    Toggle,
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Table::Exists => "exists",
            Table::Fetch => "fetch",
            Table::Create => "create",
            Table::Toggle => "toggle",
        };
        f.write_str(name)
    }
}

/// A handler together with the type that registered it.
struct Binding<F> {
    owner: &'static str,
    handler: F,
}

type Bindings<F> = RefCell<HashMap<CapabilityTag, Binding<F>>>;

#[derive(Default)]
pub(crate) struct CapabilityTables {
    exists: Bindings<ExistsFn>,
    fetch: Bindings<FetchFn>,
    create: Bindings<CreateFn>,
    toggle: Bindings<ToggleFn>,
}

fn owner_of<T: Capability>() -> &'static str {
    std::any::type_name::<T>()
}

/// Bind `handler` for `T`. Returns whether a handler of `T` was replaced.
///
/// A tag already bound by a different type is left untouched.
fn bind<T: Capability, F>(map: &Bindings<F>, handler: F) -> Result<bool, MessagingError> {
    let owner = owner_of::<T>();
    let mut map = map.borrow_mut();
    if let Some(existing) = map.get(&T::TAG) {
        if existing.owner != owner {
            return Err(MessagingError::TagCollision {
                tag: T::TAG,
                owner: existing.owner,
                requested: owner,
            });
        }
    }
    Ok(map.insert(T::TAG, Binding { owner, handler }).is_some())
}

// The handler is cloned out so it runs without the table borrowed.
fn lookup<T: Capability, F: Clone>(map: &Bindings<F>, table: Table) -> Result<F, MessagingError> {
    let map = map.borrow();
    let binding = map.get(&T::TAG).ok_or(MessagingError::MissingHandler {
        table,
        tag: T::TAG,
    })?;
    let requested = owner_of::<T>();
    if binding.owner != requested {
        return Err(MessagingError::TagCollision {
            tag: T::TAG,
            owner: binding.owner,
            requested,
        });
    }
    Ok(binding.handler.clone())
}

fn bound<T: Capability, F>(map: &Bindings<F>) -> bool {
    map.borrow()
        .get(&T::TAG)
        .is_some_and(|binding| binding.owner == owner_of::<T>())
}

impl CapabilityTables {
    pub fn bind_exists<T: Capability>(&self, handler: ExistsFn) -> Result<bool, MessagingError> {
        bind::<T, _>(&self.exists, handler)
    }

    pub fn bind_fetch<T: Capability>(&self, handler: FetchFn) -> Result<bool, MessagingError> {
        bind::<T, _>(&self.fetch, handler)
    }

    pub fn bind_create<T: Capability>(&self, handler: CreateFn) -> Result<bool, MessagingError> {
        bind::<T, _>(&self.create, handler)
    }

    pub fn bind_toggle<T: Capability>(&self, handler: ToggleFn) -> Result<bool, MessagingError> {
        bind::<T, _>(&self.toggle, handler)
    }

    pub fn exists<T: Capability>(&self) -> Result<ExistsFn, MessagingError> {
        lookup::<T, _>(&self.exists, Table::Exists)
    }

    pub fn fetch<T: Capability>(&self) -> Result<FetchFn, MessagingError> {
        lookup::<T, _>(&self.fetch, Table::Fetch)
    }

    pub fn create<T: Capability>(&self) -> Result<CreateFn, MessagingError> {
        lookup::<T, _>(&self.create, Table::Create)
    }

    pub fn toggle<T: Capability>(&self) -> Result<ToggleFn, MessagingError> {
        lookup::<T, _>(&self.toggle, Table::Toggle)
    }

    pub fn contains<T: Capability>(&self, table: Table) -> bool {
        match table {
            Table::Exists => bound::<T, _>(&self.exists),
            Table::Fetch => bound::<T, _>(&self.fetch),
            Table::Create => bound::<T, _>(&self.create),
            Table::Toggle => bound::<T, _>(&self.toggle),
        }
    }
}
