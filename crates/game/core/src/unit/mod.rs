//! Ground footprints ("unit groups").
//!
//! A [`UnitGroup`] owns the cells one ground cast placed. Groups live in a
//! [`GroupPool`] and are addressed by generation-checked [`GroupHandle`]s, so
//! a handle kept after its group died resolves to nothing even once the
//! numeric id is handed out again. Cells are found by position through the
//! [`CellIndex`]. Placement is planned by [`plan_placement`] without touching
//! any state; the world applies the plan only if the whole footprint fits.
mod cell;
mod error;
mod group;
mod handle;
mod index;
mod placement;
mod pool;

pub use cell::{CellPayload, UnitCell};
pub use error::PlacementError;
pub use group::UnitGroup;
pub use handle::GroupHandle;
pub use index::{CellIndex, CellRef};
pub use placement::{PlacementContext, PlacementPlan, PlacementRequest, plan_placement};
pub use pool::GroupPool;
