//! Presentation cues emitted while the world advances.

use corsair_core::body::Body;
use corsair_core::events::Cue;
use corsair_core::types::EffectId;

/// Place `count` copies of each effect at `body`.
pub fn place(out: &mut Vec<Cue>, effects: &[(EffectId, u32)], body: &Body) {
    for &(effect, count) in effects {
        for _ in 0..count {
            out.push(Cue::Effect {
                effect,
                position: body.position,
                velocity: body.velocity,
                facing: body.facing,
            });
        }
    }
}

pub fn sound(out: &mut Vec<Cue>, name: Option<&str>, body: &Body) {
    if let Some(name) = name {
        out.push(Cue::Sound {
            name: name.to_string(),
            position: body.position,
        });
    }
}
