//! Fixed-capacity ring of particles behind the hairball effect.
//!
//! One slot is written per frame, right after `head`, from the particle at
//! `head` plus a random impulse. Traversal starts just past `head` (the oldest
//! particle) and walks forward to the one before `head`, so the newest point is
//! never joined to the oldest.

use glam::Vec3;

use crate::error::ConfigError;
use crate::rng::UnitRandom;

pub const DEFAULT_CAPACITY: usize = 1024;

/// Largest trail whose strip, together with the grids and floaty patterns,
/// stays within the default `LineBatchConfig` vertex budget.
pub const MAX_CAPACITY: usize = 1 << 15;

/// Fraction of the previous position carried into the next particle.
const INERTIA: f32 = 0.9;

#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Particle {
    pub position: Vec3,
    /// RGB in `[0, 1)`.
    pub color: Vec3,
}

#[derive(Debug, Clone)]
pub struct TrailBuffer {
    slots: Box<[Particle]>,
    mask: usize,
    head: usize,
}

impl TrailBuffer {
    /// Allocates `capacity` zeroed slots with `head` at 0.
    ///
    /// `capacity` must be a power of two no larger than [`MAX_CAPACITY`].
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        if !capacity.is_power_of_two() || capacity > MAX_CAPACITY {
            return Err(ConfigError::InvalidCapacity(capacity));
        }
        Ok(Self {
            slots: vec![Particle::default(); capacity].into_boxed_slice(),
            mask: capacity - 1,
            head: 0,
        })
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Index of the most recently written slot.
    #[inline]
    pub fn head(&self) -> usize {
        self.head
    }

    pub fn slot(&self, index: usize) -> Option<&Particle> {
        self.slots.get(index)
    }

    /// Writes the next particle and moves `head` onto it.
    ///
    /// Draws six samples from `rng`, in order: velocity x, y, z, then color
    /// r, g, b.
    pub fn advance<R: UnitRandom + ?Sized>(&mut self, rng: &mut R) {
        let velocity = Vec3::new(rng.next_unit_float(), rng.next_unit_float(), rng.next_unit_float());
        let color = Vec3::new(rng.next_unit_float(), rng.next_unit_float(), rng.next_unit_float());

        let prev = self.slots[self.head].position;
        let next = (self.head + 1) & self.mask;

        self.slots[next] = Particle {
            position: prev * INERTIA + velocity,
            color: (color + Vec3::ONE) * 0.5,
        };
        self.head = next;
    }

    /// Calls `visitor(position, color)` for every slot except `head`, oldest first.
    ///
    /// Always `capacity - 1` calls.
    pub fn emit_strip<F>(&self, mut visitor: F)
    where
        F: FnMut(Vec3, Vec3),
    {
        for p in self.strip() {
            visitor(p.position, p.color);
        }
    }

    /// Iterator with the same order as [`emit_strip`](Self::emit_strip).
    pub fn strip(&self) -> Strip<'_> {
        Strip {
            slots: &self.slots,
            mask: self.mask,
            index: (self.head + 1) & self.mask,
            head: self.head,
        }
    }
}

/// Oldest-to-newest walk over a [`TrailBuffer`], excluding `head`.
pub struct Strip<'a> {
    slots: &'a [Particle],
    mask: usize,
    index: usize,
    head: usize,
}

impl<'a> Iterator for Strip<'a> {
    type Item = &'a Particle;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index == self.head {
            return None;
        }
        let p = &self.slots[self.index];
        self.index = (self.index + 1) & self.mask;
        Some(p)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.head.wrapping_sub(self.index) & self.mask;
        (n, Some(n))
    }
}

impl ExactSizeIterator for Strip<'_> {}
