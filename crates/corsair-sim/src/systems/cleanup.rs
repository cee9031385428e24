//! Cleanup system: removes entities marked dead this tick and clears
//! references that pointed at them.

use hecs::{Entity, World};

use crate::ship::Ship;

/// Despawn everything in `despawn_buffer`, then drop dangling parent,
/// target and escort links. The buffer is drained.
pub fn run(world: &mut World, despawn_buffer: &mut Vec<Entity>) {
    despawn_buffer.sort_unstable();
    despawn_buffer.dedup();
    let removed = !despawn_buffer.is_empty();
    for entity in despawn_buffer.drain(..) {
        let _ = world.despawn(entity);
    }
    if !removed {
        return;
    }

    let mut alive: Vec<Entity> = world.query::<&Ship>().iter().map(|(entity, _)| entity).collect();
    alive.sort_unstable();
    let exists = |entity: &Entity| alive.binary_search(entity).is_ok();

    for (_, ship) in world.query_mut::<&mut Ship>() {
        if ship.parent.is_some_and(|e| !exists(&e)) {
            ship.parent = None;
        }
        if ship.target_ship.is_some_and(|e| !exists(&e)) {
            ship.target_ship = None;
        }
        if ship.scan_target.is_some_and(|e| !exists(&e)) {
            ship.scan_target = None;
            ship.cargo_scan = 0.0;
            ship.outfit_scan = 0.0;
        }
        if ship.boarded.is_some_and(|e| !exists(&e)) {
            ship.boarded = None;
        }
        ship.escorts.retain(|e| exists(e));
    }
}
