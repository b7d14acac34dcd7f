use crate::condition::ConditionError;
use crate::env::{MapOracle, ZoneFlags};
use crate::skill::{CastKind, ComboWaiver, ItemCost, SkillDefinition, SkillFlags, SkillLevel};
use crate::state::{ActorState, EntityId, Position, Relation, StatusKind, Tick};

/// When the check runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CheckPhase {
    /// Before a cast session starts: everything is validated.
    CastStart,
    /// When a ground footprint is about to be placed: only the caster's
    /// liveness and resources are re-validated. `in_combo` carries over
    /// whether the cast started inside a combo window, so its waivers still
    /// apply.
    Placement { in_combo: bool },
}

/// Snapshot of a target actor taken before the caster is borrowed mutably.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TargetView {
    pub id: EntityId,
    pub position: Position,
    pub alive: bool,
    pub relation: Relation,
}

impl TargetView {
    pub fn of(caster: &ActorState, target: &ActorState) -> Self {
        Self {
            id: target.id,
            position: target.position,
            alive: target.is_alive(),
            relation: caster.relation_to(target),
        }
    }
}

/// What the skill is aimed at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CheckTarget {
    Caster,
    Actor(TargetView),
    Ground(Position),
}

/// One check request.
#[derive(Clone, Copy)]
pub struct ConditionRequest<'a> {
    pub definition: &'a SkillDefinition,
    pub level: SkillLevel,
    pub target: CheckTarget,
    pub phase: CheckPhase,
    pub now: Tick,
    pub map: &'a dyn MapOracle,
}

/// Resources a successful check takes (or took) from the caster.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Deduction {
    pub hp: u32,
    pub sp: u32,
    pub zeny: u64,
    pub items: Vec<ItemCost>,
    pub charges: u8,
    /// The combo window was consumed by this use.
    pub combo: bool,
    /// Whether the amounts above were actually removed.
    pub committed: bool,
}

/// Stateless validator.
///
/// Every requirement is checked before anything is deducted, so a failure at
/// any step leaves the caster exactly as it was.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConditionChecker;

impl ConditionChecker {
    /// Validates without touching the caster.
    pub fn check(
        &self,
        caster: &ActorState,
        request: &ConditionRequest<'_>,
    ) -> Result<Deduction, ConditionError> {
        let definition = request.definition;
        let level = request.level;

        if !caster.is_alive() {
            return Err(ConditionError::CasterDead);
        }
        if !definition.is_valid_level(level) {
            return Err(ConditionError::InvalidLevel {
                skill: definition.id,
                level,
                max: definition.max_level,
            });
        }

        let in_combo = match request.phase {
            CheckPhase::CastStart => self.check_state(caster, request)?,
            CheckPhase::Placement { in_combo } => in_combo,
        };
        let waive = if in_combo {
            definition.combo.map(|rule| rule.waive).unwrap_or_default()
        } else {
            ComboWaiver::empty()
        };

        if request.phase == CheckPhase::CastStart {
            self.check_target(caster, request, waive)?;
        }

        let mut deduction = self.check_costs(caster, definition, level, waive)?;
        deduction.combo = in_combo;
        Ok(deduction)
    }

    /// Validates and, when `commit` is set, deducts every cost in one step.
    pub fn check_and_commit(
        &self,
        caster: &mut ActorState,
        request: &ConditionRequest<'_>,
        commit: bool,
    ) -> Result<Deduction, ConditionError> {
        let mut deduction = self.check(caster, request)?;
        if deduction.combo {
            caster.statuses.remove(StatusKind::Combo);
        }
        if commit {
            Self::apply(caster, &deduction);
            deduction.committed = true;
        }
        Ok(deduction)
    }

    fn apply(caster: &mut ActorState, deduction: &Deduction) {
        caster.hp.drain(deduction.hp);
        caster.sp.drain(deduction.sp);
        caster.inventory.zeny -= deduction.zeny;
        for cost in &deduction.items {
            caster.inventory.take(cost.item, cost.amount);
        }
        caster.charges -= deduction.charges;
    }

    /// Actor-state checks. Returns whether the use continues a combo window.
    fn check_state(
        &self,
        caster: &ActorState,
        request: &ConditionRequest<'_>,
    ) -> Result<bool, ConditionError> {
        let definition = request.definition;
        let now = request.now;

        if caster.can_act_at > now {
            return Err(ConditionError::ActionDelay {
                until: caster.can_act_at,
            });
        }
        if let Some(until) = caster.cooldown_until(definition.id)
            && until > now
        {
            return Err(ConditionError::OnCooldown {
                skill: definition.id,
                until,
            });
        }
        if let Some(kind) = caster.casting_blocker(now) {
            return Err(ConditionError::StatusForbids(kind));
        }
        if let Some(required) = definition.requirements.required_status
            && !caster.statuses.has(required, now)
        {
            return Err(ConditionError::MissingStatus(required));
        }

        let in_combo = match definition.combo {
            Some(rule) => {
                if caster.statuses.value_of(StatusKind::Combo, now) != rule.follows.as_status_value()
                {
                    return Err(ConditionError::ComboRequired(rule.follows));
                }
                true
            }
            None => false,
        };

        let weapons = &definition.requirements.weapons;
        if !weapons.is_empty() && !weapons.contains(&caster.weapon) {
            return Err(ConditionError::WrongWeapon(caster.weapon));
        }

        let zone = request.map.zone(caster.position);
        let blocked = ZoneFlags::NO_SKILL | definition.requirements.nocast_zones;
        if zone.intersects(blocked) || (zone.contains(ZoneFlags::TOWN) && definition.target.is_offensive())
        {
            return Err(ConditionError::ZoneRestricted(caster.position));
        }

        Ok(in_combo)
    }

    fn check_target(
        &self,
        caster: &ActorState,
        request: &ConditionRequest<'_>,
        waive: ComboWaiver,
    ) -> Result<(), ConditionError> {
        let definition = request.definition;
        let range = definition.range.get(request.level);
        let check_range = |to: Position| {
            let distance = caster.position.distance(to);
            if !waive.contains(ComboWaiver::RANGE) && distance > range {
                return Err(ConditionError::OutOfRange { distance, range });
            }
            Ok(())
        };

        match (definition.cast_kind, request.target) {
            (CastKind::Ground, CheckTarget::Ground(anchor)) => {
                let map = request.map;
                if !map.contains(anchor) || !map.is_walkable(anchor) {
                    return Err(ConditionError::TerrainRestricted(anchor));
                }
                let mut blocked = ZoneFlags::NO_GROUND_SKILL | ZoneFlags::NO_SKILL;
                if definition.flags.contains(SkillFlags::TRAP) {
                    blocked |= ZoneFlags::NO_TRAP;
                }
                if map.zone(anchor).intersects(blocked) {
                    return Err(ConditionError::ZoneRestricted(anchor));
                }
                check_range(anchor)
            }
            (CastKind::Targeted, CheckTarget::Actor(view)) => {
                if !view.alive {
                    return Err(ConditionError::TargetDead(view.id));
                }
                if !definition.target.allows(view.relation) {
                    return Err(ConditionError::InvalidTarget(view.id));
                }
                check_range(view.position)
            }
            (CastKind::Targeted, CheckTarget::Caster) => {
                if definition.target.contains(crate::skill::TargetMask::SELF) {
                    Ok(())
                } else {
                    Err(ConditionError::InvalidTarget(caster.id))
                }
            }
            (CastKind::SelfCast, CheckTarget::Caster) => Ok(()),
            _ => Err(ConditionError::WrongTargetKind),
        }
    }

    fn check_costs(
        &self,
        caster: &ActorState,
        definition: &SkillDefinition,
        level: SkillLevel,
        waive: ComboWaiver,
    ) -> Result<Deduction, ConditionError> {
        let requirements = &definition.requirements;

        let hp = requirements
            .hp
            .get(level)
            .saturating_add(caster.hp.percent_of_max(requirements.hp_rate.get(level)));
        // Casting may not kill the caster: HP must stay above the cost.
        if hp > 0 && caster.hp.current <= hp {
            return Err(ConditionError::InsufficientHp {
                need: hp,
                have: caster.hp.current,
            });
        }

        let sp = if waive.contains(ComboWaiver::SP_COST) {
            0
        } else {
            requirements
                .sp
                .get(level)
                .saturating_add(caster.sp.percent_of_max(requirements.sp_rate.get(level)))
        };
        if caster.sp.current < sp {
            return Err(ConditionError::InsufficientSp {
                need: sp,
                have: caster.sp.current,
            });
        }

        let zeny = u64::from(requirements.zeny.get(level));
        if caster.inventory.zeny < zeny {
            return Err(ConditionError::InsufficientZeny {
                need: zeny,
                have: caster.inventory.zeny,
            });
        }

        for cost in &requirements.items {
            let have = caster.inventory.count(cost.item);
            if have < cost.amount {
                return Err(ConditionError::MissingItem {
                    item: cost.item,
                    need: cost.amount,
                    have,
                });
            }
        }

        let charges = if waive.contains(ComboWaiver::CHARGES) {
            0
        } else {
            requirements.charges.get(level)
        };
        if caster.charges < charges {
            return Err(ConditionError::InsufficientCharges {
                need: charges,
                have: caster.charges,
            });
        }

        Ok(Deduction {
            hp,
            sp,
            zeny,
            items: requirements.items.clone(),
            charges,
            combo: false,
            committed: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skill::{ComboRule, LevelTable, SkillId, TargetMask, UnitSpec};
    use crate::state::{ActorKind, ItemId, StatusEffect, WeaponClass};
    use crate::testing::OpenField;

    fn caster() -> ActorState {
        ActorState::new(EntityId(1), ActorKind::Player, Position::new(5, 5))
            .with_team(1)
            .with_hp(200, 200)
            .with_sp(100, 100)
            .with_zeny(500)
    }

    fn enemy_at(position: Position) -> ActorState {
        ActorState::new(EntityId(2), ActorKind::Monster, position).with_team(2)
    }

    fn bolt() -> SkillDefinition {
        SkillDefinition::new(SkillId(19), "Fire Bolt", CastKind::Targeted)
            .with_range(LevelTable::constant(9))
            .with_sp(LevelTable::<u32>::linear(12, 2, 10))
    }

    fn request<'a>(
        definition: &'a SkillDefinition,
        level: SkillLevel,
        target: CheckTarget,
        map: &'a OpenField,
    ) -> ConditionRequest<'a> {
        ConditionRequest {
            definition,
            level,
            target,
            phase: CheckPhase::CastStart,
            now: Tick(1_000),
            map,
        }
    }

    #[test]
    fn out_of_range_deducts_nothing() {
        let map = OpenField::new(30, 30);
        let definition = bolt();
        let mut caster = caster();
        let target = enemy_at(Position::new(15, 5));
        let view = TargetView::of(&caster, &target);
        let before = caster.clone();

        let result = ConditionChecker.check_and_commit(
            &mut caster,
            &request(&definition, 5, CheckTarget::Actor(view), &map),
            true,
        );

        assert_eq!(
            result,
            Err(ConditionError::OutOfRange {
                distance: 10,
                range: 9
            })
        );
        assert_eq!(caster, before);
    }

    #[test]
    fn commit_deducts_every_cost_at_once() {
        let map = OpenField::new(30, 30);
        let mut definition = bolt();
        definition.requirements.zeny = LevelTable::constant(100);
        definition.requirements.items = vec![ItemCost {
            item: ItemId(717),
            amount: 1,
        }];
        let mut caster = caster().with_item(ItemId(717), 3);
        let view = TargetView::of(&caster, &enemy_at(Position::new(8, 5)));

        let deduction = ConditionChecker
            .check_and_commit(
                &mut caster,
                &request(&definition, 3, CheckTarget::Actor(view), &map),
                true,
            )
            .unwrap();

        assert!(deduction.committed);
        assert_eq!(deduction.sp, 16);
        assert_eq!(caster.sp.current, 84);
        assert_eq!(caster.inventory.zeny, 400);
        assert_eq!(caster.inventory.count(ItemId(717)), 2);
    }

    #[test]
    fn check_without_commit_is_pure() {
        let map = OpenField::new(30, 30);
        let definition = bolt();
        let mut caster = caster();
        let view = TargetView::of(&caster, &enemy_at(Position::new(8, 5)));
        let before = caster.clone();

        let deduction = ConditionChecker
            .check_and_commit(
                &mut caster,
                &request(&definition, 1, CheckTarget::Actor(view), &map),
                false,
            )
            .unwrap();

        assert!(!deduction.committed);
        assert_eq!(caster, before);
    }

    #[test]
    fn a_failing_late_requirement_leaves_earlier_ones_untouched() {
        let map = OpenField::new(30, 30);
        let mut definition = bolt();
        definition.requirements.charges = LevelTable::constant(5);
        let mut caster = caster().with_charges(2);
        let view = TargetView::of(&caster, &enemy_at(Position::new(8, 5)));

        let result = ConditionChecker.check_and_commit(
            &mut caster,
            &request(&definition, 1, CheckTarget::Actor(view), &map),
            true,
        );

        assert_eq!(
            result,
            Err(ConditionError::InsufficientCharges { need: 5, have: 2 })
        );
        assert_eq!(caster.sp.current, 100);
    }

    #[test]
    fn hp_cost_must_leave_the_caster_alive() {
        let map = OpenField::new(30, 30);
        let mut definition = bolt();
        definition.requirements.hp = LevelTable::constant(200);
        let caster = caster();
        let view = TargetView::of(&caster, &enemy_at(Position::new(8, 5)));

        let result = ConditionChecker.check(
            &caster,
            &request(&definition, 1, CheckTarget::Actor(view), &map),
        );
        assert_eq!(
            result,
            Err(ConditionError::InsufficientHp {
                need: 200,
                have: 200
            })
        );
    }

    #[test]
    fn silence_and_cooldown_block() {
        let map = OpenField::new(30, 30);
        let definition = bolt();
        let view_target = enemy_at(Position::new(8, 5));

        let mut silenced = caster();
        silenced
            .statuses
            .add(StatusEffect::new(StatusKind::Silenced, Tick(5_000)));
        let view = TargetView::of(&silenced, &view_target);
        assert_eq!(
            ConditionChecker.check(&silenced, &request(&definition, 1, CheckTarget::Actor(view), &map)),
            Err(ConditionError::StatusForbids(StatusKind::Silenced))
        );

        let mut cooling = caster();
        cooling.cooldowns.insert(definition.id, Tick(2_000));
        let view = TargetView::of(&cooling, &view_target);
        assert_eq!(
            ConditionChecker.check(&cooling, &request(&definition, 1, CheckTarget::Actor(view), &map)),
            Err(ConditionError::OnCooldown {
                skill: definition.id,
                until: Tick(2_000)
            })
        );
    }

    #[test]
    fn wrong_weapon_and_friendly_target() {
        let map = OpenField::new(30, 30);
        let mut definition = bolt();
        definition.requirements.weapons = vec![WeaponClass::Bow];
        let caster = caster().with_weapon(WeaponClass::Dagger);
        let view = TargetView::of(&caster, &enemy_at(Position::new(8, 5)));
        assert_eq!(
            ConditionChecker.check(&caster, &request(&definition, 1, CheckTarget::Actor(view), &map)),
            Err(ConditionError::WrongWeapon(WeaponClass::Dagger))
        );

        let definition = bolt();
        let friend = ActorState::new(EntityId(3), ActorKind::Player, Position::new(6, 5)).with_team(1);
        let view = TargetView::of(&caster, &friend);
        assert_eq!(
            ConditionChecker.check(&caster, &request(&definition, 1, CheckTarget::Actor(view), &map)),
            Err(ConditionError::InvalidTarget(EntityId(3)))
        );
    }

    #[test]
    fn combo_requires_window_and_waives_range() {
        let map = OpenField::new(30, 30);
        let opener = SkillId(263);
        let definition = SkillDefinition::new(SkillId(272), "Chain Combo", CastKind::Targeted)
            .with_range(LevelTable::constant(1))
            .with_combo(ComboRule {
                follows: opener,
                waive: ComboWaiver::RANGE | ComboWaiver::SP_COST,
            })
            .with_sp(LevelTable::constant(11));
        let far = enemy_at(Position::new(9, 5));

        let mut caster = caster();
        let view = TargetView::of(&caster, &far);
        assert_eq!(
            ConditionChecker.check(&caster, &request(&definition, 1, CheckTarget::Actor(view), &map)),
            Err(ConditionError::ComboRequired(opener))
        );

        caster.statuses.add(
            StatusEffect::new(StatusKind::Combo, Tick(2_000)).with_value(opener.as_status_value()),
        );
        let deduction = ConditionChecker
            .check_and_commit(
                &mut caster,
                &request(&definition, 1, CheckTarget::Actor(view), &map),
                true,
            )
            .unwrap();

        assert!(deduction.combo);
        assert_eq!(deduction.sp, 0);
        assert!(!caster.statuses.has(StatusKind::Combo, Tick(1_000)));
    }

    #[test]
    fn ground_target_on_wall_or_restricted_zone() {
        let wall = Position::new(7, 5);
        let map = OpenField::new(30, 30)
            .with_wall(wall)
            .with_zone(Position::new(8, 8), ZoneFlags::NO_TRAP);
        let definition = SkillDefinition::new(SkillId(117), "Ankle Snare", CastKind::Ground)
            .with_range(LevelTable::constant(3))
            .with_flags(SkillFlags::TRAP)
            .with_unit(UnitSpec::default());
        let caster = caster();

        assert_eq!(
            ConditionChecker.check(&caster, &request(&definition, 1, CheckTarget::Ground(wall), &map)),
            Err(ConditionError::TerrainRestricted(wall))
        );
        assert_eq!(
            ConditionChecker.check(
                &caster,
                &request(&definition, 1, CheckTarget::Ground(Position::new(8, 8)), &map)
            ),
            Err(ConditionError::ZoneRestricted(Position::new(8, 8)))
        );
        assert_eq!(
            ConditionChecker.check(&caster, &request(&definition, 1, CheckTarget::Caster, &map)),
            Err(ConditionError::WrongTargetKind)
        );
    }

    #[test]
    fn placement_phase_only_rechecks_resources() {
        let map = OpenField::new(30, 30);
        let definition = SkillDefinition::new(SkillId(18), "Fire Wall", CastKind::Ground)
            .with_range(LevelTable::constant(1))
            .with_sp(LevelTable::constant(40))
            .with_target(TargetMask::ENEMY)
            .with_unit(UnitSpec::default());
        let mut caster = caster();
        caster.can_act_at = Tick(9_999);

        let mut req = request(&definition, 1, CheckTarget::Ground(Position::new(20, 20)), &map);
        req.phase = CheckPhase::Placement { in_combo: false };
        let deduction = ConditionChecker.check_and_commit(&mut caster, &req, true).unwrap();
        assert_eq!(deduction.sp, 40);
        assert_eq!(caster.sp.current, 60);
    }

    #[test]
    fn placement_keeps_the_combo_waivers_of_its_cast() {
        let map = OpenField::new(30, 30);
        let definition = SkillDefinition::new(SkillId(18), "Fire Wall", CastKind::Ground)
            .with_range(LevelTable::constant(1))
            .with_sp(LevelTable::constant(40))
            .with_combo(ComboRule {
                follows: SkillId(263),
                waive: ComboWaiver::SP_COST,
            })
            .with_unit(UnitSpec::default());
        let caster = caster();

        let mut req = request(&definition, 1, CheckTarget::Ground(Position::new(20, 20)), &map);
        req.phase = CheckPhase::Placement { in_combo: true };
        let deduction = ConditionChecker.check(&caster, &req).unwrap();
        assert!(deduction.combo);
        assert_eq!(deduction.sp, 0);

        req.phase = CheckPhase::Placement { in_combo: false };
        assert_eq!(ConditionChecker.check(&caster, &req).unwrap().sp, 40);
    }
}
