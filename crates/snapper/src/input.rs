//! Pointer and keyboard input, and the host's view projection.

use snapper_math::{Vec2, Vec3};

/// Mouse event delivered to an interactive session.
#[derive(Clone, Debug, PartialEq)]
pub struct MouseEvent {
    /// Pointer position in screen pixels
    pub position: Vec2,
    pub button: Option<MouseButton>,
    pub pressed: bool,
    pub modifiers: Modifiers,
}

impl MouseEvent {
    pub fn moved(position: Vec2) -> Self {
        Self {
            position,
            button: None,
            pressed: false,
            modifiers: Modifiers::default(),
        }
    }

    pub fn pressed(position: Vec2, button: MouseButton) -> Self {
        Self {
            position,
            button: Some(button),
            pressed: true,
            modifiers: Modifiers::default(),
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const SHIFT: Self = Self {
        shift: true,
        ctrl: false,
        alt: false,
    };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Escape,
    Other,
}

/// Everything a session reacts to
#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    MouseMove(MouseEvent),
    MouseButton(MouseEvent),
    Key {
        key: Key,
        pressed: bool,
        modifiers: Modifiers,
    },
}

/// World/screen conversion supplied by the host viewport
pub trait ViewProjection {
    /// Screen position of a world point, `None` if it is behind the view
    fn world_to_screen(&self, world: Vec3) -> Option<Vec2>;

    /// World point under `screen`, at the depth of `depth_reference`
    fn screen_to_world(&self, screen: Vec2, depth_reference: Vec3) -> Vec3;
}

/// Orthographic view looking down the world -Z axis.
///
/// Screen x/y map to world x/y; depth comes from the reference point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TopViewProjection {
    pub pixels_per_unit: f32,
    /// Screen position of the world origin
    pub origin: Vec2,
}

impl Default for TopViewProjection {
    fn default() -> Self {
        Self {
            pixels_per_unit: 1.0,
            origin: Vec2::ZERO,
        }
    }
}

impl TopViewProjection {
    pub fn new(pixels_per_unit: f32, origin: Vec2) -> Self {
        Self {
            pixels_per_unit,
            origin,
        }
    }
}

impl ViewProjection for TopViewProjection {
    fn world_to_screen(&self, world: Vec3) -> Option<Vec2> {
        if self.pixels_per_unit == 0.0 || !world.is_finite() {
            return None;
        }
        Some(Vec2::new(world.x, world.y) * self.pixels_per_unit + self.origin)
    }

    fn screen_to_world(&self, screen: Vec2, depth_reference: Vec3) -> Vec3 {
        let p = (screen - self.origin) * (1.0 / self.pixels_per_unit);
        Vec3::new(p.x, p.y, depth_reference.z)
    }
}
