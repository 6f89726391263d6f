use rand::Rng;

use crate::geometry::{Point, Rect};

/// Random integer in `[x - range, x + range]`
pub fn random_around<R: Rng + ?Sized>(x: i64, range: i64, rng: &mut R) -> i64 {
    let range = range.max(0);
    x + rng.gen_range(-range..=range)
}

/// Point near the centre of `truth`, offset independently on each axis by a
/// uniform integer in `[-hint_range, hint_range]`.
pub fn compute_hint<R: Rng + ?Sized>(truth: &Rect, hint_range: i64, rng: &mut R) -> Point {
    let (cx, cy) = truth.center();
    Point::new(
        random_around(cx, hint_range, rng) as f64,
        random_around(cy, hint_range, rng) as f64,
    )
}

/// Decides when the timed hint shows up. Callers hold the per-round `hinted`
/// flag; a second reveal in the same round is always refused.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HintScheduler {
    hint_time_ms: u32,
    hint_range: i64,
}

impl HintScheduler {
    pub fn new(hint_time_ms: u32, hint_range: i64) -> Self {
        Self {
            hint_time_ms,
            hint_range,
        }
    }

    pub fn should_reveal(&self, round_time_ms: u32, hinted: bool) -> bool {
        !hinted && round_time_ms == self.hint_time_ms
    }

    pub fn compute<R: Rng + ?Sized>(&self, truth: &Rect, rng: &mut R) -> Point {
        compute_hint(truth, self.hint_range, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn hint_stays_within_range_of_center() {
        let truth = Rect::new(100.0, 200.0, 150.0, 260.0).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let p = compute_hint(&truth, 20, &mut rng);
            assert!((105.0..=145.0).contains(&p.x), "x out of range: {}", p.x);
            assert!((210.0..=250.0).contains(&p.y), "y out of range: {}", p.y);
            assert_eq!(p.x.fract(), 0.0);
            assert_eq!(p.y.fract(), 0.0);
        }
    }

    #[test]
    fn zero_range_hits_center() {
        let truth = Rect::new(0.0, 0.0, 10.0, 20.0).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(compute_hint(&truth, 0, &mut rng), Point::new(5.0, 10.0));
    }

    #[test]
    fn offsets_cover_both_ends() {
        let mut rng = StdRng::seed_from_u64(3);
        let samples: Vec<i64> = (0..2_000).map(|_| random_around(0, 2, &mut rng)).collect();
        assert!(samples.contains(&-2));
        assert!(samples.contains(&2));
    }

    #[test]
    fn scheduler_reveals_once() {
        let scheduler = HintScheduler::new(5_000, 20);
        assert!(scheduler.should_reveal(5_000, false));
        assert!(!scheduler.should_reveal(5_000, true));
        assert!(!scheduler.should_reveal(5_100, false));
    }
}
