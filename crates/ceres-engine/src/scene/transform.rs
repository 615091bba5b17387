use std::sync::atomic::{AtomicU32, Ordering};

/// Entity position shared between the input thread (writer) and the render loop (reader).
///
/// Each axis is an independent `f32` stored as bits in an `AtomicU32`. There is no
/// cross-axis consistency requirement, so a reader may observe a new `x` with an old `y`
/// for one frame; it never observes a torn float.
#[derive(Debug)]
pub struct SharedTransform {
    x: AtomicU32,
    y: AtomicU32,
    z: AtomicU32,
}

impl SharedTransform {
    pub fn new(position: [f32; 3]) -> Self {
        Self {
            x: AtomicU32::new(position[0].to_bits()),
            y: AtomicU32::new(position[1].to_bits()),
            z: AtomicU32::new(position[2].to_bits()),
        }
    }

    #[inline]
    pub fn x(&self) -> f32 {
        f32::from_bits(self.x.load(Ordering::Acquire))
    }

    #[inline]
    pub fn y(&self) -> f32 {
        f32::from_bits(self.y.load(Ordering::Acquire))
    }

    #[inline]
    pub fn z(&self) -> f32 {
        f32::from_bits(self.z.load(Ordering::Acquire))
    }

    pub fn position(&self) -> [f32; 3] {
        [self.x(), self.y(), self.z()]
    }

    /// Adds `delta` to the position.
    ///
    /// Each changed axis is one atomic read-modify-write; an axis with a zero delta is never
    /// written. Writers on different axes, or on the same axis, do not lose each other's steps.
    pub fn translate(&self, delta: [f32; 3]) {
        for (axis, d) in [&self.x, &self.y, &self.z].into_iter().zip(delta) {
            if d != 0.0 {
                add(axis, d);
            }
        }
    }
}

fn add(axis: &AtomicU32, delta: f32) {
    // the closure never declines, so the update always lands
    let _ = axis.fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| {
        Some((f32::from_bits(bits) + delta).to_bits())
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn translate_accumulates() {
        let t = SharedTransform::new([0.0, -0.2, -1.0]);
        t.translate([0.5, 0.2, 0.0]);
        t.translate([-0.25, 0.0, 0.0]);
        assert_eq!(t.position(), [0.25, -0.2 + 0.2, -1.0]);
    }

    #[test]
    fn writes_from_another_thread_are_visible() {
        let t = Arc::new(SharedTransform::new([0.0; 3]));
        let writer = Arc::clone(&t);

        std::thread::spawn(move || {
            for _ in 0..1000 {
                writer.translate([1.0, 0.0, 0.0]);
            }
        })
        .join()
        .unwrap();

        assert_eq!(t.x(), 1000.0);
        assert_eq!(t.y(), 0.0);
    }

    #[test]
    fn concurrent_moves_on_different_axes_are_not_lost() {
        let t = Arc::new(SharedTransform::new([0.0; 3]));
        let horizontal = Arc::clone(&t);
        let vertical = Arc::clone(&t);

        let h = std::thread::spawn(move || {
            for i in 0..100_000 {
                let dx = if i % 2 == 0 { 1.0 } else { -1.0 };
                horizontal.translate([dx, 0.0, 0.0]);
            }
        });
        let v = std::thread::spawn(move || {
            for _ in 0..100_000 {
                vertical.translate([0.0, 1.0, 0.0]);
            }
        });
        h.join().unwrap();
        v.join().unwrap();

        assert_eq!(t.position(), [0.0, 100_000.0, 0.0]);
    }

    #[test]
    fn concurrent_moves_on_one_axis_all_land() {
        let t = Arc::new(SharedTransform::new([0.0; 3]));
        let writers: Vec<_> = (0..4)
            .map(|_| {
                let w = Arc::clone(&t);
                std::thread::spawn(move || {
                    for _ in 0..25_000 {
                        w.translate([0.0, 1.0, 0.0]);
                    }
                })
            })
            .collect();
        for w in writers {
            w.join().unwrap();
        }

        assert_eq!(t.y(), 100_000.0);
    }

    #[test]
    fn zero_delta_leaves_axis_bits_untouched() {
        let t = SharedTransform::new([-0.0, 0.125, f32::MIN_POSITIVE]);
        t.translate([0.0, 0.0, 0.0]);
        assert_eq!(t.x().to_bits(), (-0.0f32).to_bits());
        assert_eq!(t.y(), 0.125);
        assert_eq!(t.z(), f32::MIN_POSITIVE);
    }
}
