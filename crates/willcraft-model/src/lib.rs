//! Willcraft entity model: the record shapes every other crate reads.
//!
//! Two layers live here:
//!
//! - `entity`: typed person/charity/fiduciary records with a closed role set,
//!   id-referenced parent links, and idempotent normalization.
//! - `intake`: the immutable snapshot of the intake form (flat field map,
//!   the entity collection, per-article selection lists) plus the on-demand
//!   synthesized client/testator record.
//!
//! Everything is a pure projection: reading never mutates the snapshot, and
//! functions that propose new state return values for the surrounding store
//! to commit.

pub mod entity;
pub mod intake;

pub use entity::{
    middle_initial, normalize, ChildLink, ChildRelationship, Entity, EntityId, NameParts,
    Organization, OrganizationKind, ParentRef, Person, Role, WireEntry,
};
pub use intake::{Intake, SelectionState};
