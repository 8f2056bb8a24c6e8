//! Parser for .bvh (Biovision Hierarchy) motion capture files and a frame-stepping
//! engine that replays the motion on the parsed joint tree.
//!
//! ```no_run
//! use bvh_motion::parse::load_bvh_from_file;
//! use bvh_motion::player::MotionPlayer;
//!
//! let mut skeleton = load_bvh_from_file("./walk.bvh")?;
//! let mut player = MotionPlayer::new(&mut skeleton);
//! while player.step()? {
//!     for (index, position) in player.skeleton().absolute_positions() {
//!         // hand positions to a renderer
//!         let _ = (index, position);
//!     }
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod channel;
pub mod error;
pub mod math;
pub mod parse;
pub mod player;
pub mod skeleton;
pub mod types;

pub use channel::{ChannelBinding, ChannelMotion, ChannelType};
pub use error::{BvhError, PlaybackError, Result};
pub use parse::{load_bvh_from_file, load_bvh_from_string, parse_bvh};
pub use player::{MotionPlayer, PlaybackState};
pub use skeleton::{NodeKind, Skeleton, SkeletonNode};
