use crate::channel::{ChannelMotion, ChannelType};
use crate::error::PlaybackError;
use crate::skeleton::Skeleton;
use crate::types::Index;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// No frame applied yet.
    Uninitialized,
    /// The given frame is the last one applied.
    Playing(usize),
    /// Every channel ran out of samples. `last` is the final frame applied, if any.
    Exhausted { last: Option<usize> },
}

/// Steps a [`Skeleton`] through its motion data one frame at a time.
///
/// Channel samples are treated as absolute values, but what gets applied to a node
/// is the change since the previous frame: position channels shift the running
/// offset along their axis, rotation channels rotate the node and its subtree in
/// the channel's plane. Channels are applied in declaration order, one axis at a time.
///
/// There is no rewind. Playing again means parsing again (or keeping a clone of the
/// skeleton from before playback).
#[derive(Debug)]
pub struct MotionPlayer<'a> {
    skeleton: &'a mut Skeleton,
    state: PlaybackState,
}

impl<'a> MotionPlayer<'a> {
    pub fn new(skeleton: &'a mut Skeleton) -> Self {
        MotionPlayer {
            skeleton,
            state: PlaybackState::Uninitialized,
        }
    }

    pub fn skeleton(&self) -> &Skeleton {
        &*self.skeleton
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn frame_time_seconds(&self) -> f64 {
        self.skeleton.frame_time_seconds()
    }

    /// Last frame applied, `None` before the first [`MotionPlayer::step`].
    pub fn current_frame_index(&self) -> Option<usize> {
        match self.state {
            PlaybackState::Uninitialized => None,
            PlaybackState::Playing(frame) => Some(frame),
            PlaybackState::Exhausted { last } => last,
        }
    }

    pub fn remaining_frames(&self) -> usize {
        let total = self.skeleton.frame_count();
        match self.state {
            PlaybackState::Uninitialized => total,
            PlaybackState::Playing(frame) => total.saturating_sub(frame + 1),
            PlaybackState::Exhausted { .. } => 0,
        }
    }

    /// Apply the next frame. Returns `Ok(false)`, without touching the skeleton, once the
    /// shortest channel has no more samples; every later call does the same.
    ///
    /// Every [`ChannelType`] has a motion, and [`Skeleton::bind_channel`] only binds to
    /// nodes in the arena, so a skeleton built through the parser or the builder never
    /// yields [`PlaybackError::UnsupportedChannel`]. The check stays for bindings whose
    /// target is out of range.
    pub fn step(&mut self) -> Result<bool, PlaybackError> {
        let frame = match self.state {
            PlaybackState::Uninitialized => 0,
            PlaybackState::Playing(frame) => frame + 1,
            PlaybackState::Exhausted { .. } => return Ok(false),
        };

        if frame >= self.skeleton.frame_count() {
            log::trace!("Motion exhausted before frame {}", frame);
            self.state = PlaybackState::Exhausted {
                last: frame.checked_sub(1),
            };
            return Ok(false);
        }

        //// Collect the whole frame first so a bad binding leaves the skeleton untouched
        let mut deltas: Vec<(ChannelType, Index, f64)> =
            Vec::with_capacity(self.skeleton.channel_bindings().len());
        for (channel, binding) in self.skeleton.channel_bindings().iter().enumerate() {
            if binding.target >= self.skeleton.len() {
                return Err(PlaybackError::UnsupportedChannel {
                    channel,
                    target: binding.target,
                });
            }
            deltas.push((binding.kind, binding.target, binding.delta(frame).unwrap_or(0.0)));
        }

        for (kind, target, delta) in deltas {
            match kind.motion() {
                ChannelMotion::Translate { axis } => {
                    self.skeleton.translate(target, axis, delta);
                }
                ChannelMotion::Rotate { plane } => {
                    self.skeleton.apply_transformation(target, &plane.rotation(delta));
                }
            }
        }

        log::trace!("Applied frame {}", frame);
        self.state = PlaybackState::Playing(frame);
        Ok(true)
    }
}
