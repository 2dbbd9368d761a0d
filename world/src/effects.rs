//! Cosmetic particles and screen shake driven by the simulation tick.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;
use tower_defence_core::{Color, ParticleSnapshot, Shape};

/// Lifetime consumed by one tick at normal speed, in milliseconds.
const FRAME_MS: f32 = 16.0;
const PARTICLE_GRAVITY: f32 = 0.1;
const FLASH_SIZE: f32 = 20.0;
const FLASH_LIFETIME_MS: f32 = 100.0;
const SHAKE_INTENSITY: f32 = 3.0;
const SHAKE_DURATION_MS: f32 = 200.0;

#[derive(Clone, Debug)]
pub(crate) struct Particle {
    position: Vec2,
    velocity: Vec2,
    size: f32,
    max_size: f32,
    color: Color,
    life_ms: f32,
    max_life_ms: f32,
    gravity: f32,
    flash: bool,
}

impl Particle {
    /// Advances the particle by one tick; returns whether it is still alive.
    pub(crate) fn update(&mut self, factor: f32) -> bool {
        self.position += self.velocity * factor;
        self.velocity.y += self.gravity * factor;
        self.life_ms -= FRAME_MS * factor;
        self.size = self.max_size * (self.life_ms / self.max_life_ms).max(0.0);
        self.life_ms > 0.0
    }

    pub(crate) fn snapshot(&self) -> ParticleSnapshot {
        ParticleSnapshot {
            position: self.position,
            size: self.size,
            color: self.color,
            life: (self.life_ms / self.max_life_ms).clamp(0.0, 1.0),
            flash: self.flash,
        }
    }
}

/// Appends the burst emitted when an enemy dies.
pub(crate) fn explosion<R: Rng>(rng: &mut R, position: Vec2, shape: Shape, out: &mut Vec<Particle>) {
    let palette = palette(shape);
    let count: u32 = rng.gen_range(8..=16);
    for index in 0..count {
        let angle = TAU * index as f32 / count as f32 + rng.gen_range(-0.25f32..0.25);
        let speed: f32 = rng.gen_range(2.0..6.0);
        let size: f32 = rng.gen_range(2.0..6.0);
        let life_ms: f32 = rng.gen_range(300.0..500.0);
        let color = palette[rng.gen_range(0..palette.len())];
        out.push(Particle {
            position,
            velocity: Vec2::from_angle(angle) * speed,
            size,
            max_size: size,
            color,
            life_ms,
            max_life_ms: life_ms,
            gravity: PARTICLE_GRAVITY,
            flash: false,
        });
    }

    out.push(Particle {
        position,
        velocity: Vec2::ZERO,
        size: FLASH_SIZE,
        max_size: FLASH_SIZE,
        color: Color::WHITE,
        life_ms: FLASH_LIFETIME_MS,
        max_life_ms: FLASH_LIFETIME_MS,
        gravity: 0.0,
        flash: true,
    });
}

fn palette(shape: Shape) -> [Color; 3] {
    match shape {
        Shape::Circle => [
            Color::from_rgb(0x00, 0xff, 0x00),
            Color::from_rgb(0x88, 0xff, 0x88),
            Color::WHITE,
        ],
        Shape::Triangle => [
            Color::from_rgb(0xff, 0xff, 0x00),
            Color::from_rgb(0xff, 0xaa, 0x00),
            Color::WHITE,
        ],
        Shape::Square => [
            Color::from_rgb(0xff, 0x00, 0x00),
            Color::from_rgb(0xff, 0x66, 0x66),
            Color::WHITE,
        ],
    }
}

/// Short camera shake triggered by kills.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct ScreenShake {
    intensity: f32,
    duration_ms: f32,
    elapsed_ms: f32,
}

impl ScreenShake {
    /// Restarts the shake at full intensity.
    pub(crate) fn trigger(&mut self) {
        self.intensity = SHAKE_INTENSITY;
        self.duration_ms = SHAKE_DURATION_MS;
        self.elapsed_ms = 0.0;
    }

    pub(crate) fn update(&mut self, factor: f32) {
        if self.duration_ms <= 0.0 {
            return;
        }
        self.elapsed_ms += FRAME_MS * factor;
        if self.elapsed_ms >= self.duration_ms {
            *self = Self::default();
        }
    }

    pub(crate) fn intensity(&self) -> f32 {
        self.intensity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn explosion_emits_burst_and_single_flash() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut particles = Vec::new();
        explosion(&mut rng, Vec2::new(100.0, 100.0), Shape::Square, &mut particles);

        assert!((9..=17).contains(&particles.len()));
        let flashes: Vec<_> = particles.iter().filter(|particle| particle.flash).collect();
        assert_eq!(flashes.len(), 1);
        let palette = palette(Shape::Square);
        for particle in particles.iter().filter(|particle| !particle.flash) {
            assert!(palette.contains(&particle.color));
            assert!((2.0..6.0).contains(&particle.size));
            assert!((300.0..500.0).contains(&particle.life_ms));
        }
    }

    #[test]
    fn explosions_are_reproducible_for_a_seed() {
        let burst = |seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut particles = Vec::new();
            explosion(&mut rng, Vec2::ZERO, Shape::Circle, &mut particles);
            particles
                .iter()
                .map(Particle::snapshot)
                .collect::<Vec<_>>()
        };
        assert_eq!(burst(11), burst(11));
    }

    #[test]
    fn flash_expires_after_hundred_milliseconds() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut particles = Vec::new();
        explosion(&mut rng, Vec2::ZERO, Shape::Triangle, &mut particles);
        let mut flash = particles.pop().expect("flash is pushed last");

        let mut ticks = 0;
        while flash.update(1.0) {
            ticks += 1;
        }
        // 100ms of life at 16ms per tick.
        assert_eq!(ticks, 6);
    }

    #[test]
    fn shake_fades_after_duration() {
        let mut shake = ScreenShake::default();
        shake.trigger();
        assert!((shake.intensity() - 3.0).abs() < f32::EPSILON);

        for _ in 0..3 {
            shake.update(4.0);
        }
        assert!((shake.intensity() - 3.0).abs() < f32::EPSILON);
        shake.update(4.0);
        assert_eq!(shake.intensity(), 0.0);
    }
}
