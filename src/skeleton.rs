use crate::channel::{ChannelBinding, ChannelType};
use crate::math::is_proper_rotation;
use crate::types::*;
use cgmath::Zero;

/////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    Joint,
    /// Leaf marker from an `End Site` block: has an offset, never a name or channels.
    EndSite,
}

/// A joint (or end site) of the skeleton tree.
///
/// `offset` is what the file declared and never changes. `current_offset` starts
/// out equal to it and is what motion playback moves around.
#[derive(Debug, Clone, PartialEq)]
pub struct SkeletonNode {
    name: Option<String>,
    index: Index,
    kind: NodeKind,
    parent: Option<Index>,
    children: Vec<Index>,
    offset: Position,
    current_offset: Position,
    channels: Vec<Index>,
}

impl SkeletonNode {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn index(&self) -> Index {
        self.index
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn is_end_site(&self) -> bool {
        self.kind == NodeKind::EndSite
    }

    pub fn parent(&self) -> Option<Index> {
        self.parent
    }

    /// All children in file order, end sites included.
    pub fn children(&self) -> &[Index] {
        &self.children
    }

    /// Displacement from the parent as read from the file.
    pub fn offset(&self) -> Position {
        self.offset
    }

    /// Displacement from the parent after the motion applied so far.
    pub fn current_offset(&self) -> Position {
        self.current_offset
    }

    /// Indices into [`Skeleton::channel_bindings`], in declaration order.
    pub fn channels(&self) -> &[Index] {
        &self.channels
    }
}

/////////////////////////////////////////////////////////////////////////////////////////////////

/// Parse result: the joint trees of a .bvh file plus its motion channels.
///
/// Nodes live in a single arena and refer to each other by [`Index`]. Topology is
/// fixed once built; playback only touches `current_offset` of the nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Skeleton {
    nodes: Vec<SkeletonNode>,
    roots: Vec<Index>,
    channels: Vec<ChannelBinding>,
    frame_time: f64,
    declared_frames: Option<usize>,
}

impl Default for Skeleton {
    fn default() -> Self {
        Skeleton::new()
    }
}

impl Skeleton {
    pub fn new() -> Self {
        Skeleton {
            nodes: Vec::new(),
            roots: Vec::new(),
            channels: Vec::new(),
            frame_time: 0.0,
            declared_frames: None,
        }
    }

    //////////////////////////////////////// building ////////////////////////////////////////

    pub fn add_root(&mut self, name: Option<String>, offset: Position) -> Index {
        let index = self.push_node(name, NodeKind::Root, None, offset);
        self.roots.push(index);
        index
    }

    /// Attach a joint or end site below `parent`. Returns `None` if `parent` does not exist
    /// or is itself an end site.
    pub fn add_child(
        &mut self,
        parent: Index,
        kind: NodeKind,
        name: Option<String>,
        offset: Position,
    ) -> Option<Index> {
        if kind == NodeKind::Root || self.nodes.get(parent)?.is_end_site() {
            return None;
        }
        let name = if kind == NodeKind::EndSite { None } else { name };
        let index = self.push_node(name, kind, Some(parent), offset);
        self.nodes[parent].children.push(index);
        Some(index)
    }

    /// Declare a channel on `node`. The binding is appended to the global list, whose
    /// order is the column order of each motion row.
    pub fn bind_channel(&mut self, node: Index, kind: ChannelType) -> Option<Index> {
        let target = self.nodes.get_mut(node)?;
        if target.kind == NodeKind::EndSite {
            return None;
        }
        let channel = self.channels.len();
        target.channels.push(channel);
        self.channels.push(ChannelBinding::new(kind, node));
        Some(channel)
    }

    /// Append one motion row. `values` must hold one value per channel binding.
    pub fn push_frame(&mut self, values: &[f64]) -> bool {
        if values.len() != self.channels.len() {
            return false;
        }
        for (channel, value) in self.channels.iter_mut().zip(values) {
            channel.samples.push(*value);
        }
        true
    }

    pub fn set_frame_time(&mut self, seconds: f64) {
        self.frame_time = seconds;
    }

    pub fn set_declared_frames(&mut self, frames: Option<usize>) {
        self.declared_frames = frames;
    }

    fn push_node(
        &mut self,
        name: Option<String>,
        kind: NodeKind,
        parent: Option<Index>,
        offset: Position,
    ) -> Index {
        let index = self.nodes.len();
        self.nodes.push(SkeletonNode {
            name,
            index,
            kind,
            parent,
            children: Vec::new(),
            offset,
            current_offset: offset,
            channels: Vec::new(),
        });
        index
    }

    //////////////////////////////////////// queries ////////////////////////////////////////

    /// Root nodes in declaration order.
    pub fn roots(&self) -> &[Index] {
        &self.roots
    }

    pub fn nodes(&self) -> &[SkeletonNode] {
        &self.nodes
    }

    pub fn node(&self, index: Index) -> Option<&SkeletonNode> {
        self.nodes.get(index)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Every channel of the file, in declaration order.
    pub fn channel_bindings(&self) -> &[ChannelBinding] {
        &self.channels
    }

    pub fn frame_time_seconds(&self) -> f64 {
        self.frame_time
    }

    /// Frames per second, rounded down. 0 when the frame time is not positive.
    pub fn fps(&self) -> u32 {
        if self.frame_time > 0.0 {
            (1.0 / self.frame_time) as u32
        } else {
            0
        }
    }

    /// Frame count announced by the `Frames:` line, `None` when it had no readable
    /// count. Not checked against the data.
    pub fn declared_frames(&self) -> Option<usize> {
        self.declared_frames
    }

    /// Number of frames every channel has a sample for.
    pub fn frame_count(&self) -> usize {
        self.channels
            .iter()
            .map(|channel| channel.samples.len())
            .min()
            .unwrap_or(0)
    }

    /// JOINT children only, without end sites.
    pub fn joint_children(&self, index: Index) -> impl Iterator<Item = &SkeletonNode> + '_ {
        self.nodes
            .get(index)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
            .iter()
            .map(move |&child| &self.nodes[child])
            .filter(|child| !child.is_end_site())
    }

    /// First node (in arena order) with the given name.
    pub fn find(&self, name: &str) -> Option<&SkeletonNode> {
        self.nodes.iter().find(|node| node.name() == Some(name))
    }

    /// Number of ancestors of the node; roots have depth 0.
    pub fn depth(&self, index: Index) -> Option<Depth> {
        self.ancestors(index).map(|path| path.len() - 1)
    }

    /// Path from `index` up to its root, both included.
    fn ancestors(&self, index: Index) -> Option<Vec<Index>> {
        let mut path = vec![index];
        let mut node = self.nodes.get(index)?;
        while let Some(parent) = node.parent {
            path.push(parent);
            node = &self.nodes[parent];
        }
        Some(path)
    }

    /// Sum of the running offsets from the root down to the node, the node's own included.
    pub fn absolute_offset(&self, index: Index) -> Option<Position> {
        let path = self.ancestors(index)?;
        Some(
            path.iter()
                .map(|&i| self.nodes[i].current_offset)
                .fold(Position::zero(), |sum, offset| sum + offset),
        )
    }

    /// Same as [`Skeleton::absolute_offset`] but with the offsets declared in the file.
    pub fn rest_absolute_offset(&self, index: Index) -> Option<Position> {
        let path = self.ancestors(index)?;
        Some(
            path.iter()
                .map(|&i| self.nodes[i].offset)
                .fold(Position::zero(), |sum, offset| sum + offset),
        )
    }

    /// All nodes parent-before-children. Roots in declaration order, siblings in file order.
    pub fn preorder(&self) -> Vec<Index> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<Index> = self.roots.iter().rev().copied().collect();
        while let Some(index) = stack.pop() {
            order.push(index);
            stack.extend(self.nodes[index].children.iter().rev());
        }
        order
    }

    /// Absolute position of every node, in [`Skeleton::preorder`] order.
    pub fn absolute_positions(&self) -> Vec<(Index, Position)> {
        let mut positions: Vec<Option<Position>> = vec![None; self.nodes.len()];
        let mut result = Vec::with_capacity(self.nodes.len());
        for index in self.preorder() {
            let node = &self.nodes[index];
            let base = node
                .parent
                .and_then(|parent| positions[parent])
                .unwrap_or_else(Position::zero);
            let position = base + node.current_offset;
            positions[index] = Some(position);
            result.push((index, position));
        }
        result
    }

    /// Returns the kinematic chains like \[\[0,1,2,3\],\[4,5,6,7,8\],\[9,10,11\]\]: the pre-order
    /// sequence cut wherever a node is not the child of the node before it.
    /// For a typical humanoid these are the legs, arms and spine+head.
    pub fn kinematic_chains(&self) -> Vec<Vec<Index>> {
        let mut kinematic_chains: Vec<Vec<Index>> = Vec::new();
        let mut chain: Vec<Index> = Vec::new();
        for index in self.preorder() {
            let continues = match (chain.last(), self.nodes[index].parent) {
                (Some(&last), Some(parent)) => last == parent,
                _ => false,
            };
            if !continues && !chain.is_empty() {
                kinematic_chains.push(std::mem::take(&mut chain));
            }
            chain.push(index);
        }
        if !chain.is_empty() {
            kinematic_chains.push(chain);
        }
        kinematic_chains
    }

    //////////////////////////////////////// motion ////////////////////////////////////////

    /// Rotate the running offset of `index` and of everything below it by `transform`.
    /// Turning a limb turns all of its distal parts with it.
    pub fn apply_transformation(&mut self, index: Index, transform: &Rotation) -> bool {
        if index >= self.nodes.len() {
            return false;
        }
        if !is_proper_rotation(transform) {
            log::warn!(
                "Applying a transform to node {} that is not a proper rotation",
                index
            );
        }

        let mut stack = vec![index];
        while let Some(i) = stack.pop() {
            let node = &mut self.nodes[i];
            node.current_offset = *transform * node.current_offset;
            stack.extend(node.children.iter().copied());
        }
        true
    }

    /// Move the running offset of `index` by `delta` along one axis (0 = x, 1 = y, 2 = z).
    pub fn translate(&mut self, index: Index, axis: usize, delta: f64) -> bool {
        match self.nodes.get_mut(index) {
            Some(node) if axis < 3 => {
                node.current_offset[axis] += delta;
                true
            }
            _ => false,
        }
    }
}
