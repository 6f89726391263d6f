//! Where round data comes from.
//!
//! Each round needs a truth / predicted rectangle pair. Annotation files store
//! them in default (image) scale; the engine only ever sees canvas-scale
//! rectangles.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::Difficulty;
use crate::error::{RoundError, RoundResult};
use crate::geometry::Rect;

/// Truth and predicted region for one image, in canvas scale
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnnotationPair {
    pub truth: Rect,
    pub predicted: Rect,
}

impl AnnotationPair {
    /// Map default-scale rectangles onto a canvas
    pub fn to_canvas_scale(&self, factor: f64) -> AnnotationPair {
        AnnotationPair {
            truth: self.truth.scaled(factor),
            predicted: self.predicted.scaled(factor),
        }
    }
}

/// Supplies the pair for a given image id
pub trait AnnotationSource {
    fn fetch(&mut self, file_id: u32, difficulty: Difficulty) -> RoundResult<AnnotationPair>;
}

/// Fetch `file_id`, asking again up to `retries` more times while the load
/// fails. Other errors are returned at once.
pub fn fetch_retrying<S: AnnotationSource + ?Sized>(
    source: &mut S,
    file_id: u32,
    difficulty: Difficulty,
    retries: u32,
) -> RoundResult<AnnotationPair> {
    let mut attempt = 0;
    loop {
        match source.fetch(file_id, difficulty) {
            Err(RoundError::LoadFailed(reason)) if attempt < retries => {
                attempt += 1;
                log::warn!("image {} failed to load ({}), retrying", file_id, reason);
            }
            result => return result,
        }
    }
}

/// Reads `<root>/<difficulty>/annotations/<id>.json`
#[derive(Debug, Clone)]
pub struct DirAnnotationSource {
    root: PathBuf,
    canvas_scale: f64,
}

impl DirAnnotationSource {
    pub fn new<P: AsRef<Path>>(root: P, canvas_scale: f64) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            canvas_scale,
        }
    }

    pub fn annotation_path(&self, file_id: u32, difficulty: Difficulty) -> PathBuf {
        self.root
            .join(difficulty.to_string())
            .join("annotations")
            .join(format!("{file_id}.json"))
    }
}

impl AnnotationSource for DirAnnotationSource {
    fn fetch(&mut self, file_id: u32, difficulty: Difficulty) -> RoundResult<AnnotationPair> {
        let path = self.annotation_path(file_id, difficulty);
        let bytes = fs::read(&path)
            .map_err(|e| RoundError::LoadFailed(format!("{}: {}", path.display(), e)))?;
        // rectangle validation happens during deserialization
        let pair: AnnotationPair = serde_json::from_slice(&bytes).map_err(|e| {
            if e.is_data() {
                RoundError::InvalidGeometry(format!("{}: {}", path.display(), e))
            } else {
                RoundError::LoadFailed(format!("{}: {}", path.display(), e))
            }
        })?;
        Ok(pair.to_canvas_scale(self.canvas_scale))
    }
}

/// Fixed pairs, cycled in order. Useful for demos and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticAnnotationSource {
    pairs: Vec<AnnotationPair>,
}

impl StaticAnnotationSource {
    pub fn new(pairs: Vec<AnnotationPair>) -> Self {
        Self { pairs }
    }
}

impl AnnotationSource for StaticAnnotationSource {
    fn fetch(&mut self, file_id: u32, _difficulty: Difficulty) -> RoundResult<AnnotationPair> {
        if self.pairs.is_empty() {
            return Err(RoundError::LoadFailed("no annotation pairs available".into()));
        }
        Ok(self.pairs[file_id as usize % self.pairs.len()])
    }
}

/// Hands out image ids for a game: a fixed challenge list first, then random
/// ids that have not been used yet in this game.
#[derive(Debug, Clone)]
pub struct FileIdGenerator {
    challenge: VecDeque<u32>,
    remaining: Vec<u32>,
}

impl FileIdGenerator {
    pub fn new<R: Rng + ?Sized>(file_count: u32, challenge: Vec<u32>, rng: &mut R) -> Self {
        let mut remaining: Vec<u32> = (0..file_count)
            .filter(|id| !challenge.contains(id))
            .collect();
        remaining.shuffle(rng);
        Self {
            challenge: challenge.into(),
            remaining,
        }
    }

    pub fn next_id(&mut self) -> Option<u32> {
        self.challenge.pop_front().or_else(|| self.remaining.pop())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;
    use tempfile::tempdir;

    fn write_annotation(root: &Path, difficulty: Difficulty, id: u32, body: &str) {
        let dir = root.join(difficulty.to_string()).join("annotations");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(format!("{id}.json")), body).unwrap();
    }

    #[test]
    fn reads_and_rescales_annotation() {
        let dir = tempdir().unwrap();
        write_annotation(
            dir.path(),
            Difficulty::Medium,
            7,
            r#"{ "truth": [10, 20, 30, 40], "predicted": [12, 22, 32, 42] }"#,
        );

        let mut source = DirAnnotationSource::new(dir.path(), 2.0);
        let pair = source.fetch(7, Difficulty::Medium).unwrap();
        assert_eq!(<[f64; 4]>::from(pair.truth), [20.0, 40.0, 60.0, 80.0]);
        assert_eq!(<[f64; 4]>::from(pair.predicted), [24.0, 44.0, 64.0, 84.0]);
    }

    #[test]
    fn missing_file_is_load_failure() {
        let dir = tempdir().unwrap();
        let mut source = DirAnnotationSource::new(dir.path(), 1.0);
        assert_matches!(
            source.fetch(1, Difficulty::Easy),
            Err(RoundError::LoadFailed(_))
        );
    }

    #[test]
    fn inverted_rectangle_is_invalid_geometry() {
        let dir = tempdir().unwrap();
        write_annotation(
            dir.path(),
            Difficulty::Easy,
            3,
            r#"{ "truth": [30, 20, 10, 40], "predicted": [12, 22, 32, 42] }"#,
        );
        let mut source = DirAnnotationSource::new(dir.path(), 1.0);
        assert_matches!(
            source.fetch(3, Difficulty::Easy),
            Err(RoundError::InvalidGeometry(_))
        );
    }

    #[test]
    fn truncated_file_is_load_failure() {
        let dir = tempdir().unwrap();
        write_annotation(dir.path(), Difficulty::Easy, 4, r#"{ "truth": [1, 2"#);
        let mut source = DirAnnotationSource::new(dir.path(), 1.0);
        assert_matches!(
            source.fetch(4, Difficulty::Easy),
            Err(RoundError::LoadFailed(_))
        );
    }

    #[test]
    fn static_source_cycles() {
        let a = AnnotationPair {
            truth: Rect::new(0.0, 0.0, 1.0, 1.0).unwrap(),
            predicted: Rect::new(0.0, 0.0, 1.0, 1.0).unwrap(),
        };
        let mut source = StaticAnnotationSource::new(vec![a]);
        assert_eq!(source.fetch(5, Difficulty::Hard).unwrap(), a);

        let mut empty = StaticAnnotationSource::default();
        assert_matches!(
            empty.fetch(0, Difficulty::Hard),
            Err(RoundError::LoadFailed(_))
        );
    }

    struct Flaky {
        failures: u32,
        calls: u32,
    }

    impl AnnotationSource for Flaky {
        fn fetch(&mut self, file_id: u32, _difficulty: Difficulty) -> RoundResult<AnnotationPair> {
            self.calls += 1;
            if self.calls <= self.failures {
                return Err(RoundError::LoadFailed(format!("image {file_id} timed out")));
            }
            let r = Rect::new(0.0, 0.0, 1.0, 1.0)?;
            Ok(AnnotationPair {
                truth: r,
                predicted: r,
            })
        }
    }

    #[test]
    fn failed_load_is_retried_once() {
        let mut once = Flaky {
            failures: 1,
            calls: 0,
        };
        assert!(fetch_retrying(&mut once, 3, Difficulty::Easy, 1).is_ok());
        assert_eq!(once.calls, 2);

        let mut twice = Flaky {
            failures: 2,
            calls: 0,
        };
        assert_matches!(
            fetch_retrying(&mut twice, 3, Difficulty::Easy, 1),
            Err(RoundError::LoadFailed(_))
        );
        assert_eq!(twice.calls, 2);
    }

    #[test]
    fn bad_geometry_is_not_retried() {
        let dir = tempdir().unwrap();
        write_annotation(
            dir.path(),
            Difficulty::Easy,
            3,
            r#"{ "truth": [30, 20, 10, 40], "predicted": [12, 22, 32, 42] }"#,
        );
        let mut source = DirAnnotationSource::new(dir.path(), 1.0);
        assert_matches!(
            fetch_retrying(&mut source, 3, Difficulty::Easy, 5),
            Err(RoundError::InvalidGeometry(_))
        );
    }

    #[test]
    fn ids_are_not_repeated() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut ids = FileIdGenerator::new(20, vec![], &mut rng);
        let drawn: Vec<u32> = std::iter::from_fn(|| ids.next_id()).collect();
        assert_eq!(drawn.len(), 20);
        assert_eq!(drawn.iter().collect::<HashSet<_>>().len(), 20);
    }

    #[test]
    fn challenge_ids_come_first() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut ids = FileIdGenerator::new(5, vec![4, 2], &mut rng);
        assert_eq!(ids.next_id(), Some(4));
        assert_eq!(ids.next_id(), Some(2));
        let rest: HashSet<u32> = std::iter::from_fn(|| ids.next_id()).collect();
        assert_eq!(rest, HashSet::from([0, 1, 3]));
    }
}
