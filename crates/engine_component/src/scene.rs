//! Scene ownership tagging.
//!
//! Scene management lives outside this crate. It marks the current scene by
//! attaching [`ActiveScene`] to the scene's entity; the store then stamps
//! every entity created afterwards with [`CreatedInScene`] so teardown code can
//! select a scene's entities with an ordinary query.

use crate::component::Component;
use crate::entity::Entity;

/// Marker placed on the entity that represents the currently active scene.
///
/// If several entities carry the marker, the lowest entity id wins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActiveScene;

impl Component for ActiveScene {
    fn type_name() -> &'static str {
        "ActiveScene"
    }
}

/// The scene that was active when an entity was created.
///
/// Only the store constructs this tag, once, inside
/// [`ComponentStore::create_entity`](crate::ComponentStore::create_entity).
/// It has no public constructor and is not `Clone`, and the store refuses to
/// attach or detach it on a caller's behalf.
#[derive(Debug, PartialEq, Eq)]
pub struct CreatedInScene {
    scene: Option<Entity>,
}

impl CreatedInScene {
    pub(crate) fn new(scene: Option<Entity>) -> Self {
        Self { scene }
    }

    /// The scene entity, or `None` for entities created before any scene was
    /// active.
    #[must_use]
    pub fn scene(&self) -> Option<Entity> {
        self.scene
    }
}

impl Component for CreatedInScene {
    fn type_name() -> &'static str {
        "CreatedInScene"
    }
}
