//! Candidate matching: which target frame should a dragged object snap to.
//!
//! A [`CandidateSet`] is a snapshot of every eligible target frame's world
//! location taken when a session starts, indexed by a [`SpatialIndex`].
//! Queries run one [`Probe`] per enabled frame of the dragged object and
//! keep the single closest pair.

use snapper_math::{Mat4, Vec3};

use crate::config::SnapperConfig;
use crate::error::{Result, SnapError};
use crate::frame::{FrameRef, FrameSet, TagSet};
use crate::scene::{ObjectId, Scene};
use crate::spatial::SpatialIndex;

/// A target frame eligible for snapping
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    pub object: ObjectId,
    pub frame: FrameRef,
    /// World location when the set was built
    pub location: Vec3,
    pub accept_tags: TagSet,
}

/// Which objects are left out of a candidate set.
///
/// Hidden objects, objects with snapping off and disabled frames are
/// always left out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CandidateFilter {
    /// The object being moved
    pub subject: Option<ObjectId>,
    /// Leave out every selected object as well
    pub exclude_selected: bool,
}

impl CandidateFilter {
    pub fn excluding(subject: ObjectId) -> Self {
        Self {
            subject: Some(subject),
            exclude_selected: false,
        }
    }

    pub fn with_selected_excluded(mut self, exclude: bool) -> Self {
        self.exclude_selected = exclude;
        self
    }
}

/// Thresholds for [`CandidateSet::query`]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MatchOptions {
    /// Pairs at or beyond this world distance never match
    pub max_distance: f32,
    /// Require a probe tag to appear in the candidate's accept tags
    pub match_tags: bool,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            max_distance: 2.0,
            match_tags: false,
        }
    }
}

impl From<&SnapperConfig> for MatchOptions {
    fn from(config: &SnapperConfig) -> Self {
        Self {
            max_distance: config.max_snap_distance,
            match_tags: config.match_tags,
        }
    }
}

/// A frame of the dragged object, in that object's local space
#[derive(Clone, Debug, PartialEq)]
pub struct Probe {
    pub frame: FrameRef,
    pub location: Vec3,
    pub tags: TagSet,
}

impl Probe {
    /// One probe per enabled frame, fixed slots first
    pub fn collect(frames: &FrameSet) -> Vec<Probe> {
        frames
            .iter_enabled()
            .map(|(frame, f)| Probe {
                frame,
                location: f.location,
                tags: f.tags.clone(),
            })
            .collect()
    }
}

/// Best probe/candidate pair
#[derive(Clone, Debug, PartialEq)]
pub struct Match {
    /// Index into the candidate set
    pub candidate: usize,
    pub target_object: ObjectId,
    pub target_frame: FrameRef,
    pub source_frame: FrameRef,
    /// Candidate world location
    pub target_location: Vec3,
    /// Probe world location
    pub source_location: Vec3,
    pub distance: f32,
}

#[derive(Debug, Default)]
pub struct CandidateSet {
    candidates: Vec<Candidate>,
    index: SpatialIndex,
}

impl CandidateSet {
    /// Collect every eligible frame in scene order (fixed slots, then
    /// extras, per object) and index their world locations.
    pub fn build(scene: &Scene, filter: CandidateFilter) -> Result<Self> {
        let mut candidates = Vec::new();
        for object in scene.objects() {
            let id = object.id();
            if !object.is_snap_target()
                || filter.subject == Some(id)
                || (filter.exclude_selected && scene.selection().is_selected(id))
            {
                continue;
            }
            let world = scene.world_matrix(id)?;
            for (frame, f) in object.frames.iter_enabled() {
                candidates.push(Candidate {
                    object: id,
                    frame,
                    location: f.world_location(&world),
                    accept_tags: f.accept_tags.clone(),
                });
            }
        }

        let mut index = SpatialIndex::with_capacity(candidates.len());
        for (i, c) in candidates.iter().enumerate() {
            index.insert(c.location, i);
        }
        index.balance();

        log::debug!("Built candidate set with {} frames", candidates.len());
        Ok(Self { candidates, index })
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Candidate> {
        self.candidates.get(index)
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// Closest probe/candidate pair under `options`.
    ///
    /// Each probe contributes only its nearest hit. With tag matching that
    /// hit must also accept one of the probe's tags, otherwise the probe
    /// contributes nothing even if a farther candidate would accept it. A pair
    /// only replaces the current best when strictly closer, so the first
    /// probe wins ties; inside one probe ties go to candidate order.
    pub fn query(
        &self,
        probes: &[Probe],
        subject_world: &Mat4,
        options: &MatchOptions,
    ) -> Option<Match> {
        let mut best: Option<Match> = None;
        for probe in probes {
            let location = subject_world.transform_point(probe.location);
            let Some(hit) = self.index.nearest(location) else { continue };
            if hit.distance >= options.max_distance {
                continue;
            }
            if options.match_tags
                && !probe.tags.intersects(&self.candidates[hit.key].accept_tags)
            {
                continue;
            }
            if best.as_ref().map_or(true, |b| hit.distance < b.distance) {
                let candidate = &self.candidates[hit.key];
                best = Some(Match {
                    candidate: hit.key,
                    target_object: candidate.object,
                    target_frame: candidate.frame,
                    source_frame: probe.frame,
                    target_location: candidate.location,
                    source_location: location,
                    distance: hit.distance,
                });
            }
        }
        if let Some(m) = &best {
            log::trace!(
                "Best match {}:{} <- {} at {:.5}",
                m.target_object,
                m.target_frame,
                m.source_frame,
                m.distance
            );
        }
        best
    }

    /// Every candidate within `radius` of `point`, closest first
    pub fn query_range(&self, point: Vec3, radius: f32) -> Vec<(&Candidate, f32)> {
        self.index
            .range(point, radius)
            .into_iter()
            .map(|n| (&self.candidates[n.key], n.distance))
            .collect()
    }

    /// Closest candidate to `point` with no distance limit
    pub fn nearest(&self, point: Vec3) -> Option<(&Candidate, f32)> {
        self.index
            .nearest(point)
            .map(|n| (&self.candidates[n.key], n.distance))
    }
}

/// Select every object with an enabled frame that coincides (within
/// `radius`) with an enabled frame of a selected object. With `recursive`
/// the search repeats from the grown selection until nothing new is found.
///
/// Returns the newly selected objects in the order they were found.
pub fn select_neighbors(scene: &mut Scene, recursive: bool, radius: f32) -> Result<Vec<ObjectId>> {
    if scene.selection().is_empty() {
        log::warn!("Select neighbors needs a selection");
        return Err(SnapError::EmptySelection("neighbor search"));
    }

    let mut found = Vec::new();
    loop {
        let candidates = CandidateSet::build(
            scene,
            CandidateFilter::default().with_selected_excluded(true),
        )?;
        if candidates.is_empty() {
            break;
        }

        let mut points = Vec::new();
        for &id in scene.selection().selected() {
            let object = scene.object(id)?;
            if !object.frames.enabled {
                continue;
            }
            let world = scene.world_matrix(id)?;
            points.extend(object.frames.iter_enabled().map(|(_, f)| f.world_location(&world)));
        }

        let mut new = Vec::new();
        for point in points {
            for (candidate, _) in candidates.query_range(point, radius) {
                if !new.contains(&candidate.object) {
                    new.push(candidate.object);
                }
            }
        }
        for &id in &new {
            scene.selection_mut().add_quiet(id);
        }
        log::debug!("Selected {} neighboring objects", new.len());
        let grew = !new.is_empty();
        found.extend(new);

        if !recursive || !grew {
            break;
        }
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{FixedSlot, Frame};
    use approx::assert_relative_eq;

    const A: FrameRef = FrameRef::Fixed(FixedSlot::A);

    fn snap_object(scene: &mut Scene, name: &str, at: Vec3) -> ObjectId {
        let id = scene.spawn(name, Mat4::from_translation(at));
        scene.object_mut(id).unwrap().frames.enabled = true;
        id
    }

    fn probe(tags: &str) -> Probe {
        Probe {
            frame: A,
            location: Vec3::ZERO,
            tags: TagSet::parse(tags),
        }
    }

    #[test]
    fn test_query_nearest_within_threshold() {
        let mut scene = Scene::new();
        snap_object(&mut scene, "a", Vec3::new(0.0, 0.0, 0.0));
        snap_object(&mut scene, "b", Vec3::new(1.0, 0.0, 0.0));
        snap_object(&mut scene, "c", Vec3::new(5.0, 5.0, 5.0));
        let set = CandidateSet::build(&scene, CandidateFilter::default()).unwrap();
        let options = MatchOptions::default();

        let world = Mat4::from_translation(Vec3::new(0.1, 0.0, 0.0));
        let m = set.query(&[probe("")], &world, &options).unwrap();
        assert_eq!(m.target_location, Vec3::ZERO);
        assert_relative_eq!(m.distance, 0.1, epsilon = 1e-6);

        let far = Mat4::from_translation(Vec3::new(10.0, 10.0, 10.0));
        assert!(set.query(&[probe("")], &far, &options).is_none());
    }

    #[test]
    fn test_tag_filtering() {
        let mut scene = Scene::new();
        let wall = snap_object(&mut scene, "wall", Vec3::new(0.0, 0.0, 0.0));
        scene.object_mut(wall).unwrap().frames.fixed_mut(FixedSlot::A).accept_tags =
            TagSet::parse("wall");
        let set = CandidateSet::build(&scene, CandidateFilter::default()).unwrap();
        let options = MatchOptions {
            match_tags: true,
            ..Default::default()
        };
        let world = Mat4::from_translation(Vec3::new(0.1, 0.0, 0.0));

        assert!(set.query(&[probe("floor")], &world, &options).is_none());
        assert!(set.query(&[probe("wall, floor")], &world, &options).is_some());
    }

    #[test]
    fn test_tag_filter_rejected_nearest_gives_no_match() {
        let mut scene = Scene::new();
        let near = snap_object(&mut scene, "near", Vec3::new(0.0, 0.0, 0.0));
        let far = snap_object(&mut scene, "far", Vec3::new(1.0, 0.0, 0.0));
        scene.object_mut(near).unwrap().frames.fixed_mut(FixedSlot::A).accept_tags =
            TagSet::parse("wall");
        scene.object_mut(far).unwrap().frames.fixed_mut(FixedSlot::A).accept_tags =
            TagSet::parse("floor");
        let set = CandidateSet::build(&scene, CandidateFilter::default()).unwrap();
        let options = MatchOptions {
            match_tags: true,
            ..Default::default()
        };

        let world = Mat4::from_translation(Vec3::new(0.1, 0.0, 0.0));
        assert!(set.query(&[probe("floor")], &world, &options).is_none());

        // near to the floor target, it is the nearest hit and accepts
        let world = Mat4::from_translation(Vec3::new(0.9, 0.0, 0.0));
        let m = set.query(&[probe("floor")], &world, &options).unwrap();
        assert_eq!(m.target_object, far);
    }

    #[test]
    fn test_first_probe_wins_ties() {
        let mut scene = Scene::new();
        snap_object(&mut scene, "t", Vec3::new(0.0, 0.0, 0.0));
        let set = CandidateSet::build(&scene, CandidateFilter::default()).unwrap();
        let b = FrameRef::Fixed(FixedSlot::B);
        let probes = vec![
            Probe { frame: A, location: Vec3::new(0.5, 0.0, 0.0), tags: TagSet::new() },
            Probe { frame: b, location: Vec3::new(-0.5, 0.0, 0.0), tags: TagSet::new() },
        ];
        let m = set.query(&probes, &Mat4::IDENTITY, &MatchOptions::default()).unwrap();
        assert_eq!(m.source_frame, A);
    }

    #[test]
    fn test_build_filters() {
        let mut scene = Scene::new();
        let subject = snap_object(&mut scene, "subject", Vec3::ZERO);
        let selected = snap_object(&mut scene, "selected", Vec3::X);
        let hidden = snap_object(&mut scene, "hidden", Vec3::Y);
        let off = scene.spawn("off", Mat4::IDENTITY);
        let other = snap_object(&mut scene, "other", Vec3::Z);
        scene.object_mut(hidden).unwrap().visible = false;
        scene
            .object_mut(other)
            .unwrap()
            .frames
            .fixed_mut(FixedSlot::B)
            .disabled = false;
        scene.object_mut(other).unwrap().frames.add_extra(1.0);
        scene.selection_mut().select_multiple([selected, subject]);

        let set = CandidateSet::build(&scene, CandidateFilter::excluding(subject)).unwrap();
        let objects: Vec<_> = set.candidates().iter().map(|c| c.object).collect();
        assert_eq!(objects, vec![selected, other, other, other]);
        assert!(!objects.contains(&off));

        let set = CandidateSet::build(
            &scene,
            CandidateFilter::excluding(subject).with_selected_excluded(true),
        )
        .unwrap();
        let frames: Vec<_> = set.candidates().iter().map(|c| c.frame).collect();
        assert_eq!(
            frames,
            vec![A, FrameRef::Fixed(FixedSlot::B), FrameRef::Extra(0)]
        );
    }

    #[test]
    fn test_range_query_finds_coincident_frames() {
        let mut scene = Scene::new();
        snap_object(&mut scene, "a", Vec3::new(1.0, 2.0, 3.0));
        snap_object(&mut scene, "b", Vec3::new(1.0, 2.0, 3.0));
        snap_object(&mut scene, "c", Vec3::new(1.0, 2.1, 3.0));
        let set = CandidateSet::build(&scene, CandidateFilter::default()).unwrap();

        let first = set.query_range(Vec3::new(1.0, 2.0, 3.0), 1e-4);
        assert_eq!(first.len(), 2);
        let again = set.query_range(Vec3::new(1.0, 2.0, 3.0), 1e-4);
        assert_eq!(first, again);
    }

    #[test]
    fn test_select_neighbors_recursive() {
        let mut scene = Scene::new();
        let a = snap_object(&mut scene, "a", Vec3::ZERO);
        let b = snap_object(&mut scene, "b", Vec3::ZERO);
        let c = snap_object(&mut scene, "c", Vec3::new(2.0, 0.0, 0.0));
        let d = snap_object(&mut scene, "d", Vec3::new(9.0, 0.0, 0.0));
        // b has a second frame touching c
        let extra = {
            let frames = &mut scene.object_mut(b).unwrap().frames;
            let i = frames.add_extra(1.0);
            frames.get_mut(FrameRef::Extra(i)).unwrap().location = Vec3::new(2.0, 0.0, 0.0);
            i
        };
        assert_eq!(extra, 0);
        scene.object_mut(c).unwrap().frames.fixed_mut(FixedSlot::A).location = Vec3::ZERO;

        scene.selection_mut().select_multiple([a]);
        let found = select_neighbors(&mut scene, false, 1e-4).unwrap();
        assert_eq!(found, vec![b]);
        assert!(!scene.selection().is_selected(c));

        scene.selection_mut().select_multiple([a]);
        let found = select_neighbors(&mut scene, true, 1e-4).unwrap();
        assert_eq!(found, vec![b, c]);
        assert!(!scene.selection().is_selected(d));
        assert_eq!(scene.selection().active(), Some(a));

        // nothing new on a second pass
        let found = select_neighbors(&mut scene, true, 1e-4).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_frame_builder_used_for_probes() {
        let mut frames = FrameSet::new();
        *frames.fixed_mut(FixedSlot::C) = Frame::new("C").with_tags("x");
        let probes = Probe::collect(&frames);
        assert_eq!(probes.len(), 2);
        assert!(probes[1].tags.contains("x"));
    }
}
