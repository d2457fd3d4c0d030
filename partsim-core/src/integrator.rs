use crate::engine::ParticleSet;

/// Advance every particle one sub-step with position Verlet:
/// `next = 2 * pos - prev + accel * dt²`, then `prev = pos` and `pos = next`.
///
/// `dt` must be the same on every call; velocity is implied by the last
/// displacement and a changing `dt` would rescale it.
pub fn step(particles: &mut ParticleSet, dt: f32) {
    let dt2 = dt * dt;
    let ParticleSet {
        pos,
        prev_pos,
        accel,
        ..
    } = particles;

    for ((p, prev), a) in pos.iter_mut().zip(prev_pos.iter_mut()).zip(accel.iter()) {
        let next = 2.0 * *p - *prev + *a * dt2;
        *prev = *p;
        *p = next;
    }
}
