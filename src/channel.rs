use std::fmt;
use std::str::FromStr;

use crate::math::Plane;
use crate::types::Index;

/// One animated degree of freedom of a joint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelType {
    Xposition,
    Yposition,
    Zposition,
    Xrotation,
    Yrotation,
    Zrotation,
}

/// Tokens accepted on a CHANNELS line, and nothing else.
const CHANNEL_TOKENS: [(&str, ChannelType); 6] = [
    ("Xposition", ChannelType::Xposition),
    ("Yposition", ChannelType::Yposition),
    ("Zposition", ChannelType::Zposition),
    ("Xrotation", ChannelType::Xrotation),
    ("Yrotation", ChannelType::Yrotation),
    ("Zrotation", ChannelType::Zrotation),
];

impl ChannelType {
    pub fn token(self) -> &'static str {
        CHANNEL_TOKENS
            .iter()
            .find(|(_, kind)| *kind == self)
            .map(|(token, _)| *token)
            .unwrap_or_default()
    }

    /// What the channel does to its node. Xrotation turns the YZ plane, Yrotation XZ,
    /// Zrotation XY.
    pub fn motion(self) -> ChannelMotion {
        match self {
            ChannelType::Xposition => ChannelMotion::Translate { axis: 0 },
            ChannelType::Yposition => ChannelMotion::Translate { axis: 1 },
            ChannelType::Zposition => ChannelMotion::Translate { axis: 2 },
            ChannelType::Xrotation => ChannelMotion::Rotate { plane: Plane::YZ },
            ChannelType::Yrotation => ChannelMotion::Rotate { plane: Plane::XZ },
            ChannelType::Zrotation => ChannelMotion::Rotate { plane: Plane::XY },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelMotion {
    /// Shift the running offset along one component (0 = x, 1 = y, 2 = z).
    Translate { axis: usize },
    /// Rotate the node and its subtree within a plane.
    Rotate { plane: Plane },
}

/// Raised for a token outside the recognized channel names; carries the token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownChannel(pub String);

impl FromStr for ChannelType {
    type Err = UnknownChannel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CHANNEL_TOKENS
            .iter()
            .find(|(token, _)| *token == s)
            .map(|(_, kind)| *kind)
            .ok_or_else(|| UnknownChannel(s.to_string()))
    }
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// A channel declared on a node, with one sample per motion frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelBinding {
    pub kind: ChannelType,
    /// Node that declared the channel.
    pub target: Index,
    pub samples: Vec<f64>,
}

impl ChannelBinding {
    pub fn new(kind: ChannelType, target: Index) -> Self {
        ChannelBinding {
            kind,
            target,
            samples: Vec::new(),
        }
    }

    /// Change since the previous frame; the first frame is measured from 0.
    pub fn delta(&self, frame: usize) -> Option<f64> {
        let current = *self.samples.get(frame)?;
        let last = if frame > 0 {
            self.samples[frame - 1]
        } else {
            0.0
        };
        Some(current - last)
    }
}
