//! Keyboard autopilot for the player's flagship.
//!
//! Held keys map straight onto commands. Pressing land, jump or board
//! latches an autopilot that keeps flying the maneuver after the key is
//! released, until a movement key cancels it or the maneuver begins.

use corsair_core::command::Command;
use corsair_core::constants::FACING_DOT;
use corsair_core::geometry::{unit, Point};
use corsair_core::types::{PlanetId, SystemId};

use crate::maneuver::{move_to, move_to_planet, prepare_for_hyperspace, turn_backward, turn_toward};
use crate::targeting::{auto_fire, target_aim};
use crate::view::{AiContext, ShipOrders, ShipView};

/// Planets without a spaceport are only picked when nothing better exists.
const UNLANDABLE_PENALTY: f64 = 10_000.0;

/// Keys that take manual control back from the autopilot.
const CANCEL_KEYS: Command = Command::FORWARD
    .with(Command::REVERSE)
    .with(Command::LEFT)
    .with(Command::RIGHT);

const LATCH_KEYS: Command = Command::LAND.with(Command::HYPERSPACE).with(Command::BOARD);

#[derive(Debug, Clone, Default)]
pub struct PlayerController {
    held: Command,
    latched: Command,
    /// Fire fixed guns without a trigger press when they would hit.
    pub automatic_fire: bool,
}

impl PlayerController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys currently latched by the autopilot.
    pub fn latched(&self) -> Command {
        self.latched
    }

    /// Turn this tick's held keys into orders for the flagship at `index`.
    pub fn control(&mut self, ctx: &AiContext<'_>, index: usize, held: Command) -> ShipOrders {
        let Some(ship) = ctx.ships.get(index) else {
            return ShipOrders::default();
        };
        let mut orders = ShipOrders::keep(ship);
        let mut me = ship.clone();
        let pressed = held.without(self.held);
        self.held = held;

        if held.has_any(CANCEL_KEYS) {
            self.latched = Command::NONE;
        }

        let mut command = Command::NONE;
        if pressed.has(Command::LAND) {
            if me.target_planet.is_none() {
                me.target_planet = nearest_planet(ctx, &me);
            }
            if me.target_planet.is_some() {
                self.latched = Command::LAND;
            }
        } else if pressed.has(Command::HYPERSPACE) {
            if me.target_system.is_none() {
                me.target_system = best_link(ctx, &me);
            }
            if me.target_system.is_some() {
                self.latched = Command::HYPERSPACE;
            }
        } else if pressed.has(Command::BOARD) {
            let keep = ctx.ship(me.target_ship).is_some_and(|t| can_board(&me, t));
            if !keep {
                me.target_ship = nearest_boardable(ctx, &me);
            }
            if me.target_ship.is_some() {
                self.latched = Command::BOARD;
            }
        }

        if held.has(Command::LEFT) || held.has(Command::RIGHT) {
            let right = f64::from(u8::from(held.has(Command::RIGHT)));
            let left = f64::from(u8::from(held.has(Command::LEFT)));
            command.set_turn(right - left);
        } else if held.has(Command::REVERSE) {
            if me.reverse_acceleration > 0.0 {
                command.set(Command::REVERSE);
            } else {
                command.set_turn(turn_backward(&me));
            }
        }
        if held.has(Command::FORWARD) {
            command.set(Command::FORWARD);
        }

        let mut fires_guns = held.has(Command::PRIMARY);
        for weapon in &me.weapons {
            if weapon.is_special {
                continue;
            }
            let trigger = if weapon.is_homing {
                Command::SECONDARY
            } else {
                Command::PRIMARY
            };
            if held.has(trigger) {
                command.set(Command::fire(weapon.index));
            }
        }

        let hostile_target = ctx
            .ship(me.target_ship)
            .map_or(true, |t| ctx.is_enemy(&me, t));
        if self.automatic_fire && !self.latched.has_any(LATCH_KEYS) && hostile_target {
            let automatic = auto_fire(ctx, &me);
            fires_guns |= !automatic.is_empty();
            command.merge(&automatic);
        }
        for key in [
            Command::SCAN,
            Command::CLOAK,
            Command::AFTERBURNER,
            Command::LAUNCH,
        ] {
            if held.has(key) {
                command.set(key);
            }
        }

        // Nudge the nose onto a target that is already nearly ahead.
        if fires_guns && command.turn() == 0.0 && !self.latched.has_any(LATCH_KEYS) {
            if let Some(target) = ctx
                .ship(me.target_ship)
                .filter(|t| t.system == me.system && !t.is_destroyed)
            {
                let d = unit(target.position - me.position);
                if d.dot(me.facing.unit()) >= FACING_DOT {
                    command.set_turn(turn_toward(&me, target_aim(&me, target)));
                }
            }
        }

        self.fly_latched(ctx, &mut me, &mut command, held);
        orders.command = command;
        orders.target_ship = me.target_ship;
        orders.target_system = me.target_system;
        orders.target_planet = me.target_planet;
        orders
    }

    fn fly_latched(
        &mut self,
        ctx: &AiContext<'_>,
        me: &mut ShipView,
        command: &mut Command,
        held: Command,
    ) {
        if self.latched.has(Command::LAND) {
            if me.is_landing || me.target_planet.is_none() {
                self.latched = Command::NONE;
                return;
            }
            move_to_planet(ctx, me, command);
            command.set(Command::LAND);
        } else if self.latched.has(Command::HYPERSPACE) {
            let Some(to) = me.target_system else {
                self.latched = Command::NONE;
                return;
            };
            if me.is_hyperspacing || (!me.can_jump() && !me.is_entering_hyperspace) {
                if !me.is_hyperspacing {
                    log::info!("ship {} cannot make the jump", me.id);
                }
                self.latched = Command::NONE;
                return;
            }
            let direction = me
                .system
                .and_then(|from| ctx.jump_direction(from, to))
                .unwrap_or(Point::ZERO);
            prepare_for_hyperspace(me, command, direction);
            command.set(Command::HYPERSPACE);
            if held.has(Command::HYPERSPACE) {
                command.set(Command::WAIT);
            }
        } else if self.latched.has(Command::BOARD) {
            match ctx.ship(me.target_ship).filter(|t| can_board(me, t)) {
                Some(target) => {
                    move_to(me, command, target.position, 40.0, 0.8);
                    command.set(Command::BOARD);
                }
                None => self.latched.clear(Command::BOARD),
            }
        }
        if !self.latched.has_any(LATCH_KEYS) {
            self.latched = Command::NONE;
        }
    }
}

fn can_board(me: &ShipView, other: &ShipView) -> bool {
    other.id != me.id && other.system == me.system && other.is_disabled && !other.is_destroyed
}

/// Closest planet, strongly preferring ones with a spaceport that allow
/// landing.
fn nearest_planet(ctx: &AiContext<'_>, me: &ShipView) -> Option<PlanetId> {
    let system = me.system.and_then(|id| ctx.system(id))?;
    system
        .objects
        .iter()
        .filter_map(|object| {
            let id = object.planet?;
            let mut distance = object.position.distance(me.position);
            let usable = ctx
                .catalog
                .planet(id)
                .is_some_and(|planet| planet.landable && planet.has_spaceport);
            if !usable {
                distance += UNLANDABLE_PENALTY;
            }
            Some((id, distance))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(id, _)| id)
}

/// The outgoing link that best matches the ship's facing.
fn best_link(ctx: &AiContext<'_>, me: &ShipView) -> Option<SystemId> {
    let here = me.system?;
    let system = ctx.system(here)?;
    let links = if me.has_jump_drive {
        &system.neighbors
    } else {
        &system.links
    };
    let facing = me.facing.unit();
    links
        .iter()
        .filter_map(|&link| {
            let direction = ctx.jump_direction(here, link)?;
            Some((link, facing.dot(unit(direction))))
        })
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(link, _)| link)
}

/// Disabled ships in range of boarding, enemies first, then by distance.
fn nearest_boardable(ctx: &AiContext<'_>, me: &ShipView) -> Option<usize> {
    ctx.ships
        .iter()
        .filter(|other| can_board(me, other))
        .min_by(|a, b| {
            let enemy_a = ctx.is_enemy(me, a);
            let enemy_b = ctx.is_enemy(me, b);
            enemy_b.cmp(&enemy_a).then(
                a.position
                    .distance(me.position)
                    .total_cmp(&b.position.distance(me.position)),
            )
        })
        .map(|other| other.id)
}
