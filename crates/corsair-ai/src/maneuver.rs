//! Steering primitives shared by every behavior and by the player's
//! autopilot.
//!
//! Each primitive reads a [`ShipView`] and writes turn and thrust into a
//! [`Command`]. Primitives that reach their goal return `true` and leave
//! the command untouched for the caller to extend.

use std::f64::consts::PI;

use corsair_core::command::Command;
use corsair_core::constants::{
    ESCORT_DISTANCE, FACING_DOT, JUMP_SPEED, STOPPED_SPEED, STOPPING_SLACK,
};
use corsair_core::geometry::{cross, unit, Angle, Point};

use crate::view::{AiContext, ShipView};

/// Turn command in `[-1, 1]` that rotates the ship toward `vector`.
///
/// Turns at full rate until one step would reach the goal, then commands
/// exactly the fraction needed to land on it.
pub fn turn_toward(ship: &ShipView, vector: Point) -> f64 {
    turn_command(ship.facing, ship.turn_rate, vector)
}

/// [`turn_toward`] for a bare facing and turn rate.
pub fn turn_command(facing: Angle, turn_rate: f64, vector: Point) -> f64 {
    if turn_rate <= 0.0 || vector == Point::ZERO {
        return 0.0;
    }
    let facing = facing.unit();
    let c = cross(vector, facing);
    if vector.dot(facing) > 0.0 {
        let angle = (c / vector.length()).clamp(-1.0, 1.0).asin().to_degrees();
        if angle.abs() <= turn_rate {
            return -angle / turn_rate;
        }
    }
    if c < 0.0 {
        1.0
    } else {
        -1.0
    }
}

/// Turn to face against the current velocity.
pub fn turn_backward(ship: &ShipView) -> f64 {
    turn_toward(ship, -ship.velocity)
}

/// Set forward (positive) or reverse (negative) thrust.
pub fn thrust(command: &mut Command, amount: f64) {
    if amount > 0.0 {
        command.set(Command::FORWARD);
    } else if amount < 0.0 {
        command.set(Command::REVERSE);
    }
    command.set_thrust(amount);
}

/// Where the ship would come to rest if it turned around and braked now.
pub fn stopping_point(ship: &ShipView) -> Point {
    let v = ship.speed();
    if v == 0.0 || ship.acceleration <= 0.0 || ship.turn_rate <= 0.0 {
        return ship.position;
    }
    let heading = ship.velocity / v;
    let degrees_to_turn = (-heading.dot(ship.facing.unit())).clamp(-1.0, 1.0).acos().to_degrees();
    let stop_distance = v * degrees_to_turn / ship.turn_rate + 0.5 * v * v / ship.acceleration;
    ship.position + heading * stop_distance
}

/// Fly to `target` and come to rest within `radius` at below `slow`.
pub fn move_to(ship: &ShipView, command: &mut Command, target: Point, radius: f64, slow: f64) -> bool {
    let distance = target - ship.position;
    if distance.length() < radius && ship.speed() < slow {
        return true;
    }
    let facing = ship.facing.unit();

    // Drifting away from the target: head back toward it first.
    if distance.dot(ship.velocity) < 0.0 {
        command.set_turn(turn_toward(ship, distance));
        if distance.dot(facing) > 0.0 {
            thrust(command, 1.0);
        }
        return false;
    }

    let is_close = distance.length() < 0.2 * radius;
    let correction = target - stopping_point(ship);
    if !is_close || correction.length() > STOPPING_SLACK {
        command.set_turn(turn_toward(ship, correction));
    }
    if unit(correction).dot(facing) > FACING_DOT {
        thrust(command, 1.0);
    }
    false
}

/// Fly to the ship's target planet and hold over it.
pub fn move_to_planet(ctx: &AiContext<'_>, ship: &ShipView, command: &mut Command) -> bool {
    let Some(planet) = ship.target_planet else {
        return false;
    };
    let Some(object) = ctx.stellar(ship.system, planet) else {
        return false;
    };
    move_to(ship, command, object.position, object.radius, 1.0)
}

/// Brake until the speed is at most `max_speed` (or fully stopped when
/// `max_speed` is zero).
pub fn stop(ship: &ShipView, command: &mut Command, max_speed: f64) -> bool {
    let speed = ship.speed();
    let limit_speed = if max_speed > 0.0 { max_speed } else { STOPPED_SPEED };
    if speed <= limit_speed {
        return true;
    }
    if max_speed == 0.0 {
        command.set(Command::STOP);
    }
    if ship.acceleration <= 0.0 {
        command.set_turn(turn_backward(ship));
        return false;
    }

    // The closer to stopped, the straighter the ship must point before
    // thrusting, so the last few frames do not add sideways drift.
    let stop_time = speed / ship.acceleration;
    let limit = 0.8 + 0.2 / (1.0 + stop_time * stop_time * stop_time * 0.001);
    let heading = ship.velocity / speed;
    let facing = ship.facing.unit();

    if ship.reverse_acceleration > 0.0 && ship.turn_rate > 0.0 {
        let degrees_to_turn = (-heading.dot(facing)).clamp(-1.0, 1.0).acos().to_degrees();
        let forward_time = degrees_to_turn / ship.turn_rate + stop_time;
        let reverse_time =
            (180.0 - degrees_to_turn) / ship.turn_rate + speed / ship.reverse_acceleration;
        if reverse_time < forward_time {
            command.set_turn(turn_toward(ship, ship.velocity));
            if heading.dot(facing) > limit {
                thrust(command, -(speed / ship.reverse_acceleration).min(1.0));
            }
            return false;
        }
    }

    command.set_turn(turn_backward(ship));
    if heading.dot(facing) < -limit {
        thrust(command, stop_time.min(1.0));
    }
    false
}

/// Slow to jump speed, then line up with `direction`.
pub fn prepare_for_hyperspace(ship: &ShipView, command: &mut Command, direction: Point) {
    if stop(ship, command, JUMP_SPEED) {
        command.set_turn(turn_toward(ship, direction));
    }
}

/// Whether a ship with this state may enter hyperspace toward `direction`.
///
/// It must be below jump speed and either facing the direction already or
/// able to reach it within one turn step.
pub fn is_aligned_for_jump(facing: Angle, velocity: Point, turn_rate: f64, direction: Point) -> bool {
    if velocity.length() > JUMP_SPEED || direction == Point::ZERO {
        return false;
    }
    let facing_unit = facing.unit();
    if facing_unit.dot(direction) <= 0.0 {
        return false;
    }
    let goal = Angle::from_vector(direction);
    goal.delta_from(facing).abs() <= turn_rate.max(1e-9)
}

pub fn can_hyperspace(ship: &ShipView, direction: Point) -> bool {
    is_aligned_for_jump(ship.facing, ship.velocity, ship.turn_rate, direction)
}

/// Orbit near `target`, closing in when far away.
pub fn circle_around(ship: &ShipView, command: &mut Command, target: Point) {
    let direction = target - ship.position;
    command.set_turn(turn_toward(ship, direction));
    if ship.facing.unit().dot(direction) >= 0.0 && direction.length() > ESCORT_DISTANCE {
        thrust(command, 1.0);
    }
}

/// Point the guns along `aim` and close the distance to `target`.
pub fn move_to_attack(ship: &ShipView, command: &mut Command, target: &ShipView, aim: Point) {
    let d = target.position - ship.position;
    command.set_turn(turn_toward(ship, aim));

    // Diameter of the tightest circle the ship flies at its current speed.
    let steps_in_full_turn = if ship.turn_rate > 0.0 {
        360.0 / ship.turn_rate
    } else {
        f64::INFINITY
    };
    let diameter = (steps_in_full_turn * ship.speed() / PI).max(200.0);

    let facing = ship.facing.unit();
    if (d.dot(facing) >= 0.0 && d.length() > diameter)
        || (ship.velocity.dot(d) < 0.0 && facing.dot(unit(d)) >= 0.9)
    {
        thrust(command, 1.0);
    }
}
