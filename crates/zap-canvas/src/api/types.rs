use std::fmt;

/// Category of an attached entity.
///
/// The surface keeps one collection per kind and routes every lookup and
/// detachment through this tag, so dispatch never needs a type test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Drawable,
    Control,
    Group,
    Component,
    RenderHook,
    PointerHook,
}

/// Slot address inside a per-kind arena.
///
/// The generation changes every time a slot is freed, so a key kept past
/// detachment never resolves to whatever reuses the slot.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl Key {
    /// Raw slot index (diagnostics only).
    pub fn index(self) -> u32 {
        self.index
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@gen{}", self.index, self.generation)
    }
}

/// Opaque identifier handed out by the surface on attachment.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId {
    pub kind: EntityKind,
    pub key: Key,
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({:?})", self.kind, self.key)
    }
}

macro_rules! typed_id {
    ($(#[$meta:meta])* $name:ident => $kind:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub(crate) Key);

        impl $name {
            pub fn key(self) -> Key {
                self.0
            }
        }

        impl From<$name> for EntityId {
            fn from(id: $name) -> EntityId {
                EntityId { kind: EntityKind::$kind, key: id.0 }
            }
        }

        impl TryFrom<EntityId> for $name {
            type Error = EntityId;

            fn try_from(id: EntityId) -> Result<Self, Self::Error> {
                if id.kind == EntityKind::$kind {
                    Ok($name(id.key))
                } else {
                    Err(id)
                }
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({:?})"), self.0)
            }
        }
    };
}

typed_id!(
    /// Identifier of an attached [`Drawable`](crate::Drawable).
    DrawableId => Drawable
);
typed_id!(
    /// Identifier of an attached [`Control`](crate::Control).
    ControlId => Control
);
typed_id!(
    /// Identifier of an attached [`Group`](crate::Group).
    GroupId => Group
);
typed_id!(
    /// Identifier of an attached [`Composite`](crate::Composite).
    ComponentId => Component
);
typed_id!(RenderHookId => RenderHook);
typed_id!(PointerHookId => PointerHook);
