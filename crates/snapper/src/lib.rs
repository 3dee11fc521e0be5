//! Snapper - snap-point frames and frame-to-frame alignment
//!
//! Objects carry named frames (location, direction, up). One object is
//! moved so that one of its frames lands on a frame of another object,
//! either through single-shot operators or by dragging it in an
//! interactive session that keeps the closest pair of frames highlighted.
//!
//! # Features
//!
//! - Four fixed frame slots plus any number of extra frames per object
//! - Alignment with optional flip and discrete rotation steps
//! - k-d tree matching of the dragged object's frames against every target
//! - Tag filtering between frames
//! - Temporary parenting of co-selected objects during a drag
//! - Undo/redo for every operator and for committed sessions
//!
//! # Architecture
//!
//! ```text
//!            ┌────────────────────────────┐
//!            │        SnapSession         │◄── InputEvent, ViewProjection
//!            └─────────────┬──────────────┘
//!                          │
//!         ┌────────────────┼────────────────┐
//!         ▼                ▼                ▼
//!   ┌──────────┐    ┌─────────────┐   ┌───────────┐
//!   │ Matcher  │    │    align    │   │ Commands  │
//!   │ (kd-tree)│    │             │   │ + history │
//!   └────┬─────┘    └──────┬──────┘   └─────┬─────┘
//!        └─────────────────┼────────────────┘
//!                          ▼
//!            ┌────────────────────────────┐
//!            │  Scene / FrameSet / Frame  │
//!            └────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use snapper::prelude::*;
//!
//! let mut scene = Scene::new();
//! let base = scene.spawn("base", Mat4::IDENTITY);
//! let part = scene.spawn("part", Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0)));
//! for id in [base, part] {
//!     toggle_snapping(&mut scene, id)?;
//! }
//! scene.selection_mut().select_multiple([part]);
//!
//! let view = TopViewProjection::default();
//! let config = SnapperConfig::default();
//! let mut session = SnapSession::new();
//! session.start(&mut scene, &view, Vec2::new(5.0, 0.0), &config, false)?;
//! session.on_move(&mut scene, &view, Vec2::new(0.4, 0.0))?;
//! session.on_confirm(&mut scene, false)?;
//! ```

pub mod align;
pub mod commands;
pub mod config;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod input;
pub mod matcher;
pub mod operators;
pub mod scene;
pub mod selection;
pub mod session;
pub mod spatial;

pub use align::{align, directions_aligned, rotate_in_place, Alignment};
pub use config::SnapperConfig;
pub use error::{Result, SnapError};
pub use frame::{FixedSlot, Frame, FrameRef, FrameSet, TagSet};
pub use matcher::{select_neighbors, CandidateSet, Match, MatchOptions, Probe};
pub use scene::{ObjectId, Scene, SceneObject};
pub use session::{Highlight, SessionState, SessionStatus, SnapSession};

pub mod prelude {
    //! Common imports for snapping
    pub use crate::align::{align, rotate_in_place, Alignment};
    pub use crate::commands::{execute, Command, UndoHistory};
    pub use crate::config::SnapperConfig;
    pub use crate::error::{Result, SnapError};
    pub use crate::frame::{FixedSlot, Frame, FrameRef, FrameSet, TagSet};
    pub use crate::geometry::EditGeometry;
    pub use crate::input::{InputEvent, Key, Modifiers, MouseButton, MouseEvent, TopViewProjection, ViewProjection};
    pub use crate::matcher::{select_neighbors, CandidateFilter, CandidateSet, MatchOptions};
    pub use crate::operators::*;
    pub use crate::scene::{ObjectId, Scene};
    pub use crate::session::{Highlight, SessionStatus, SnapSession};
    pub use snapper_math::prelude::*;
}
