//! Snap-point frames and the per-object frame collection.
//!
//! A [`Frame`] is a local reference frame (location, principal direction,
//! up vector) attached to an object. Every object owns a [`FrameSet`] with
//! four fixed slots `A`..`D` and an open-ended list of extra frames, both
//! addressed through [`FrameRef`].

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use snapper_math::{radians, Mat4, Vec3};

/// One of the four fixed frame slots every object carries
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FixedSlot {
    A,
    B,
    C,
    D,
}

impl FixedSlot {
    pub const ALL: [FixedSlot; 4] = [FixedSlot::A, FixedSlot::B, FixedSlot::C, FixedSlot::D];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FixedSlot::A => "A",
            FixedSlot::B => "B",
            FixedSlot::C => "C",
            FixedSlot::D => "D",
        }
    }
}

impl fmt::Display for FixedSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Address of a frame inside a [`FrameSet`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FrameRef {
    Fixed(FixedSlot),
    Extra(usize),
}

impl fmt::Display for FrameRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameRef::Fixed(slot) => write!(f, "{}", slot),
            FrameRef::Extra(i) => write!(f, "#{}", i),
        }
    }
}

impl From<FixedSlot> for FrameRef {
    fn from(slot: FixedSlot) -> Self {
        FrameRef::Fixed(slot)
    }
}

/// Set of tags parsed from a comma-separated list
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSet(BTreeSet<String>);

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `"wall, floor"`. Tags are trimmed and empty entries dropped.
    pub fn parse(list: &str) -> Self {
        Self(
            list.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_owned)
                .collect(),
        )
    }

    /// True when the two sets share at least one tag
    pub fn intersects(&self, other: &TagSet) -> bool {
        self.0.iter().any(|t| other.0.contains(t))
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.contains(tag)
    }

    pub fn insert(&mut self, tag: impl Into<String>) -> bool {
        let tag = tag.into();
        let tag = tag.trim();
        !tag.is_empty() && self.0.insert(tag.to_owned())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl From<&str> for TagSet {
    fn from(list: &str) -> Self {
        Self::parse(list)
    }
}

impl fmt::Display for TagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, tag) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(tag)?;
        }
        Ok(())
    }
}

/// A snap-point: a local reference frame on an object.
///
/// `location`, `direction` and `up` live in the owning object's local
/// space. `direction` and `up` need not be unit length. The right vector
/// is never stored; see [`Frame::right`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub location: Vec3,
    pub direction: Vec3,
    pub up: Vec3,
    snap_angle: f32,
    pub label: String,
    pub label_color: [f32; 4],
    gizmo_scale: f32,
    pub tags: TagSet,
    pub accept_tags: TagSet,
    pub disabled: bool,
}

impl Frame {
    pub const DEFAULT_DIRECTION: Vec3 = Vec3::X;
    pub const DEFAULT_UP: Vec3 = Vec3::Z;
    pub const DEFAULT_SNAP_ANGLE_DEGREES: f32 = 45.0;
    pub const MIN_SNAP_ANGLE_DEGREES: f32 = 0.01;
    pub const MIN_GIZMO_SCALE: f32 = 1e-5;

    /// A frame with default vectors and the given label
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            location: Vec3::ZERO,
            direction: Self::DEFAULT_DIRECTION,
            up: Self::DEFAULT_UP,
            snap_angle: radians(Self::DEFAULT_SNAP_ANGLE_DEGREES),
            label: label.into(),
            label_color: [1.0, 1.0, 1.0, 1.0],
            gizmo_scale: 1.0,
            tags: TagSet::new(),
            accept_tags: TagSet::new(),
            disabled: false,
        }
    }

    pub fn with_location(mut self, location: Vec3) -> Self {
        self.location = location;
        self
    }

    pub fn with_direction(mut self, direction: Vec3) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_up(mut self, up: Vec3) -> Self {
        self.up = up;
        self
    }

    pub fn with_snap_angle(mut self, radians: f32) -> Self {
        self.set_snap_angle(radians);
        self
    }

    pub fn with_tags(mut self, tags: &str) -> Self {
        self.tags = TagSet::parse(tags);
        self
    }

    pub fn with_accept_tags(mut self, tags: &str) -> Self {
        self.accept_tags = TagSet::parse(tags);
        self
    }

    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// Right-hand vector, `normalize(direction × up)`.
    ///
    /// Zero when direction and up are parallel.
    pub fn right(&self) -> Vec3 {
        self.direction.cross(self.up).normalize_or_zero()
    }

    /// Rotation step in radians
    #[inline]
    pub fn snap_angle(&self) -> f32 {
        self.snap_angle
    }

    /// Set the rotation step, clamped to `[0.01°, 180°]`
    pub fn set_snap_angle(&mut self, radians_value: f32) {
        let min = radians(Self::MIN_SNAP_ANGLE_DEGREES);
        self.snap_angle = if radians_value.is_nan() {
            min
        } else {
            radians_value.clamp(min, core::f32::consts::PI)
        };
    }

    #[inline]
    pub fn gizmo_scale(&self) -> f32 {
        self.gizmo_scale
    }

    pub fn set_gizmo_scale(&mut self, scale: f32) {
        self.gizmo_scale = if scale.is_nan() {
            Self::MIN_GIZMO_SCALE
        } else {
            scale.max(Self::MIN_GIZMO_SCALE)
        };
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        !self.disabled
    }

    pub fn world_location(&self, world: &Mat4) -> Vec3 {
        world.transform_point(self.location)
    }

    pub fn world_direction(&self, world: &Mat4) -> Vec3 {
        world.transform_vector(self.direction)
    }

    pub fn world_up(&self, world: &Mat4) -> Vec3 {
        world.transform_vector(self.up)
    }

    /// Restore location, direction and up to their defaults
    pub fn reset(&mut self) {
        self.location = Vec3::ZERO;
        self.direction = Self::DEFAULT_DIRECTION;
        self.up = Self::DEFAULT_UP;
    }

    /// Step direction and up through the axis presets:
    /// +X, -X, +Y, -Y, +Z, -Z and back to +X.
    ///
    /// The up vector is +Z except for the +Z and -Z directions, which use
    /// +X. A direction that matches no preset goes back to +X.
    pub fn cycle_axes(&mut self) {
        let (direction, up) = match self.direction {
            d if d == Vec3::X => (Vec3::NEG_X, Vec3::Z),
            d if d == Vec3::NEG_X => (Vec3::Y, Vec3::Z),
            d if d == Vec3::Y => (Vec3::NEG_Y, Vec3::Z),
            d if d == Vec3::NEG_Y => (Vec3::Z, Vec3::X),
            d if d == Vec3::Z => (Vec3::NEG_Z, Vec3::X),
            _ => (Vec3::X, Vec3::Z),
        };
        self.direction = direction;
        self.up = up;
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::new("Label")
    }
}

/// Gizmo scale used when snapping is switched on or a frame is added:
/// the smallest object dimension, but never below 0.2
pub fn gizmo_scale_for(dimensions: Vec3) -> f32 {
    dimensions.min_element().max(0.2)
}

/// All frames owned by one object, plus its snapping flag
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameSet {
    /// Whether the object takes part in snapping at all
    pub enabled: bool,
    fixed: [Frame; 4],
    extras: Vec<Frame>,
    active_extra: usize,
}

impl Default for FrameSet {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSet {
    /// Slot `A` enabled, `B`..`D` disabled, no extras, snapping off
    pub fn new() -> Self {
        let fixed = FixedSlot::ALL.map(|slot| {
            Frame::new(slot.as_str()).with_disabled(slot != FixedSlot::A)
        });
        Self {
            enabled: false,
            fixed,
            extras: Vec::new(),
            active_extra: 0,
        }
    }

    pub fn get(&self, frame: FrameRef) -> Option<&Frame> {
        match frame {
            FrameRef::Fixed(slot) => Some(&self.fixed[slot.index()]),
            FrameRef::Extra(i) => self.extras.get(i),
        }
    }

    pub fn get_mut(&mut self, frame: FrameRef) -> Option<&mut Frame> {
        match frame {
            FrameRef::Fixed(slot) => Some(&mut self.fixed[slot.index()]),
            FrameRef::Extra(i) => self.extras.get_mut(i),
        }
    }

    #[inline]
    pub fn fixed(&self, slot: FixedSlot) -> &Frame {
        &self.fixed[slot.index()]
    }

    #[inline]
    pub fn fixed_mut(&mut self, slot: FixedSlot) -> &mut Frame {
        &mut self.fixed[slot.index()]
    }

    pub fn extras(&self) -> &[Frame] {
        &self.extras
    }

    /// Fixed slots in `A..D` order, then extras in list order
    pub fn iter(&self) -> impl Iterator<Item = (FrameRef, &Frame)> {
        FixedSlot::ALL
            .iter()
            .map(move |&slot| (FrameRef::Fixed(slot), &self.fixed[slot.index()]))
            .chain(
                self.extras
                    .iter()
                    .enumerate()
                    .map(|(i, f)| (FrameRef::Extra(i), f)),
            )
    }

    /// Like [`iter`](Self::iter) but skips disabled frames
    pub fn iter_enabled(&self) -> impl Iterator<Item = (FrameRef, &Frame)> {
        self.iter().filter(|(_, f)| f.is_enabled())
    }

    /// Append an extra frame labelled with its 1-based position.
    /// Returns the new frame's index.
    pub fn add_extra(&mut self, gizmo_scale: f32) -> usize {
        let mut frame = Frame::new((self.extras.len() + 1).to_string());
        frame.set_gizmo_scale(gizmo_scale);
        self.extras.push(frame);
        self.extras.len() - 1
    }

    /// Remove an extra frame; later frames shift down by one and the
    /// active extra moves to `index - 1` (or 0).
    pub fn remove_extra(&mut self, index: usize) -> Option<Frame> {
        if index >= self.extras.len() {
            return None;
        }
        let removed = self.extras.remove(index);
        self.active_extra = index.saturating_sub(1);
        Some(removed)
    }

    #[inline]
    pub fn active_extra(&self) -> usize {
        self.active_extra
    }

    pub fn set_active_extra(&mut self, index: usize) {
        self.active_extra = index;
    }

    pub fn set_fixed_gizmo_scale(&mut self, scale: f32) {
        for frame in self.fixed.iter_mut() {
            frame.set_gizmo_scale(scale);
        }
    }

    /// Take over `other`'s snapping flag and fixed slots, and append its
    /// extras after our own
    pub fn copy_from(&mut self, other: &FrameSet) {
        self.enabled = other.enabled;
        self.fixed = other.fixed.clone();
        self.extras.extend(other.extras.iter().cloned());
    }
}
