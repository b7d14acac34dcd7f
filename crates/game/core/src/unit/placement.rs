//! Footprint planning.
//!
//! [`plan_placement`] reads the map, the live groups and the actors on the
//! ground and decides which cells a new footprint gets, without mutating
//! anything. Either the whole plan is applied or none of it.

use std::collections::BTreeSet;

use crate::config::GameConfig;
use crate::env::{MapOracle, ZoneFlags};
use crate::skill::{SkillDefinition, SkillFlags, SkillLevel, UnitFlags};
use crate::state::{Direction, EntitiesState, EntityId, Position};
use crate::unit::{CellIndex, CellRef, GroupHandle, GroupPool, PlacementError};

/// Read-only view of the world a plan is made against.
#[derive(Clone, Copy)]
pub struct PlacementContext<'a> {
    pub map: &'a dyn MapOracle,
    pub pool: &'a GroupPool,
    pub cells: &'a CellIndex,
    pub entities: &'a EntitiesState,
    pub config: &'a GameConfig,
}

#[derive(Clone, Copy, Debug)]
pub struct PlacementRequest<'a> {
    pub definition: &'a SkillDefinition,
    pub level: SkillLevel,
    pub owner: EntityId,
    pub anchor: Position,
    pub facing: Direction,
}

/// Outcome of a successful plan.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlacementPlan {
    /// Cells the new group gets, in layout order.
    pub cells: Vec<Position>,
    /// Existing cells destroyed together with the new cell on their tile.
    pub annihilate: Vec<CellRef>,
    /// Whole groups the new footprint removes.
    pub cleanse: Vec<GroupHandle>,
}

impl PlacementPlan {
    /// A plan may consist only of annihilations; then no group is created.
    pub fn creates_group(&self) -> bool {
        !self.cells.is_empty()
    }
}

pub fn plan_placement(
    ctx: &PlacementContext<'_>,
    request: &PlacementRequest<'_>,
) -> Result<PlacementPlan, PlacementError> {
    let definition = request.definition;
    let spec = definition
        .unit
        .as_ref()
        .ok_or(PlacementError::NotAGroundSkill(definition.id))?;

    let cap = spec.instance_cap(request.level, ctx.config);
    if cap > 0 && ctx.pool.count_for(request.owner, definition.id) >= cap {
        return Err(PlacementError::InstanceCap {
            skill: definition.id,
            cap,
        });
    }

    let mut blocked_zone = ZoneFlags::NO_GROUND_SKILL | ZoneFlags::NO_SKILL;
    if definition.flags.contains(SkillFlags::TRAP) {
        blocked_zone |= ZoneFlags::NO_TRAP;
    }

    let mut plan = PlacementPlan::default();
    let mut seen = BTreeSet::new();
    let mut cleanse = BTreeSet::new();
    let layout = spec.layout_at(request.level);

    for (dx, dy) in layout.offsets(request.facing) {
        let position = request.anchor.offset(dx, dy);
        if !seen.insert(position) {
            continue;
        }

        if !terrain_allows(ctx.map, spec.flags, request.anchor, position) {
            if spec.flags.contains(UnitFlags::STRICT_TERRAIN) {
                return Err(PlacementError::BlockedCell(position));
            }
            continue;
        }
        if ctx.map.zone(position).intersects(blocked_zone) {
            return Err(PlacementError::ZoneRestricted(position));
        }
        if spec.flags.contains(UnitFlags::NO_FOOTSET) && !ctx.entities.alive_at(position).is_empty() {
            return Err(PlacementError::Occupied(position));
        }

        let mut annihilated = false;
        for existing in ctx.cells.at(position) {
            let Some(group) = ctx.pool.get(existing.group) else {
                continue;
            };
            if group.is_invalidated() || !group.cell(existing.cell).is_some_and(|cell| cell.alive) {
                continue;
            }

            if spec.flags.contains(UnitFlags::CLEANSE) {
                cleanse.insert(existing.group);
                continue;
            }
            if group.skill == definition.id && spec.flags.contains(UnitFlags::NO_REITERATION) {
                return Err(PlacementError::Overlap(position));
            }
            let mutual = spec.annihilates.contains(&group.skill)
                || group
                    .spec()
                    .is_some_and(|theirs| theirs.annihilates.contains(&definition.id));
            if mutual {
                plan.annihilate.push(existing);
                annihilated = true;
            }
        }

        if !annihilated {
            plan.cells.push(position);
        }
    }

    plan.cleanse = cleanse.into_iter().collect();
    if plan.cells.is_empty() && plan.annihilate.is_empty() {
        return Err(PlacementError::NoLegalCell);
    }
    Ok(plan)
}

fn terrain_allows(map: &dyn MapOracle, flags: UnitFlags, anchor: Position, position: Position) -> bool {
    if !map.contains(position) || !map.is_walkable(position) {
        return false;
    }
    !flags.contains(UnitFlags::PATH_CHECK) || map.is_reachable(anchor, position)
}
