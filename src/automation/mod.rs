// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Automation engine.
//!
//! A lane is a sorted list of nodes evaluated by linear interpolation.
//! Volume lanes interpolate on the perceptual fader scale rather than in
//! raw decibels.

pub mod volume;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TimelineError};
use crate::position::Position;
use crate::timing::TimeSignature;

/// Handle identifying an automation lane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LaneId(pub u64);

impl fmt::Display for LaneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle identifying a node within a lane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parameter controlled by a lane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Envelope {
    /// Level in dB
    Volume,
    /// Stereo position, -1 (left) to 1 (right)
    Pan,
    /// Tempo in BPM
    Tempo,
    /// Any other plugin or device parameter
    Other,
}

impl Envelope {
    /// Value range a new lane of this kind starts with
    pub fn default_range(&self) -> (f64, f64) {
        match self {
            Envelope::Volume => (-60.0, 6.0),
            Envelope::Pan => (-1.0, 1.0),
            Envelope::Tempo => (20.0, 300.0),
            Envelope::Other => (0.0, 1.0),
        }
    }

    /// Interpolate between two node values
    fn interpolate(&self, a: f64, b: f64, t: f64) -> f64 {
        match self {
            Envelope::Volume => {
                let (na, nb) = (volume::normalize(a), volume::normalize(b));
                volume::denormalize(na + (nb - na) * t)
            }
            _ => a + (b - a) * t,
        }
    }
}

/// A point on an automation curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AutomationNode {
    pub id: NodeId,
    pub pos: Position,
    pub value: f64,
}

impl AutomationNode {
    pub fn new(id: NodeId, pos: Position, value: f64) -> Self {
        Self { id, pos, value }
    }
}

/// Automation curve for one parameter
///
/// A loaded lane is rebuilt node by node, so it keeps the same range,
/// ordering and uniqueness guarantees as one edited in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "LaneData")]
pub struct AutomationLane {
    pub id: LaneId,
    pub envelope: Envelope,
    min_value: f64,
    max_value: f64,
    /// Sorted by position, positions and ids unique
    nodes: Vec<AutomationNode>,
    pub enabled: bool,
}

#[derive(Deserialize)]
struct LaneData {
    id: LaneId,
    envelope: Envelope,
    min_value: f64,
    max_value: f64,
    #[serde(default)]
    nodes: Vec<AutomationNode>,
    #[serde(default = "default_enabled")]
    enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl TryFrom<LaneData> for AutomationLane {
    type Error = TimelineError;

    fn try_from(data: LaneData) -> Result<Self> {
        let mut lane = Self::new(data.id, data.envelope, data.min_value, data.max_value)?;
        for node in data.nodes {
            lane.insert_node(node)?;
        }
        lane.enabled = data.enabled;
        Ok(lane)
    }
}

impl AutomationLane {
    /// Create an empty lane over `[min_value, max_value]`
    pub fn new(id: LaneId, envelope: Envelope, min_value: f64, max_value: f64) -> Result<Self> {
        if !min_value.is_finite() || !max_value.is_finite() || min_value >= max_value {
            return Err(TimelineError::InvalidLaneRange {
                min: min_value,
                max: max_value,
            });
        }
        Ok(Self {
            id,
            envelope,
            min_value,
            max_value,
            nodes: Vec::new(),
            enabled: true,
        })
    }

    /// Create an empty lane with the envelope's default range
    pub fn with_default_range(id: LaneId, envelope: Envelope) -> Self {
        let (min_value, max_value) = envelope.default_range();
        Self {
            id,
            envelope,
            min_value,
            max_value,
            nodes: Vec::new(),
            enabled: true,
        }
    }

    pub fn min_value(&self) -> f64 {
        self.min_value
    }

    pub fn max_value(&self) -> f64 {
        self.max_value
    }

    pub fn nodes(&self) -> &[AutomationNode] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&AutomationNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            return self.min_value;
        }
        value.clamp(self.min_value, self.max_value)
    }

    /// Value of the curve at `pos`
    ///
    /// A lane with fewer than two nodes, or a disabled lane, has no curve
    /// and returns `None`. Outside the node range the nearest node's value
    /// holds.
    pub fn value_at(&self, pos: Position, sig: TimeSignature) -> Option<f64> {
        if !self.enabled || self.nodes.len() < 2 {
            return None;
        }

        let index = self.nodes.partition_point(|n| n.pos <= pos);
        if index == 0 {
            return Some(self.clamp(self.nodes[0].value));
        }
        if index == self.nodes.len() {
            return Some(self.clamp(self.nodes[index - 1].value));
        }

        let before = &self.nodes[index - 1];
        let after = &self.nodes[index];
        let from = before.pos.to_ticks(sig);
        let to = after.pos.to_ticks(sig);
        let t = if to > from {
            (pos.to_ticks(sig).saturating_sub(from)) as f64 / (to - from) as f64
        } else {
            0.0
        };

        Some(self.clamp(self.envelope.interpolate(before.value, after.value, t)))
    }

    /// Insert a node in position order, clamping its value to the lane range
    pub fn insert_node(&mut self, node: AutomationNode) -> Result<()> {
        if self.nodes.iter().any(|n| n.id == node.id) {
            return Err(TimelineError::DuplicateNodeId(node.id));
        }
        if self.nodes.iter().any(|n| n.pos == node.pos) {
            return Err(TimelineError::DuplicateNodePosition(node.pos));
        }

        let node = AutomationNode {
            value: self.clamp(node.value),
            ..node
        };
        let index = self.nodes.partition_point(|n| n.pos < node.pos);
        self.nodes.insert(index, node);
        Ok(())
    }

    /// Remove a node, returning it
    pub fn delete_node(&mut self, id: NodeId) -> Result<AutomationNode> {
        let index = self
            .nodes
            .iter()
            .position(|n| n.id == id)
            .ok_or(TimelineError::NodeNotFound(id))?;
        Ok(self.nodes.remove(index))
    }

    /// Move a node to a new position and value, keeping the list sorted
    pub fn move_node(&mut self, id: NodeId, pos: Position, value: f64) -> Result<()> {
        if self.nodes.iter().any(|n| n.pos == pos && n.id != id) {
            return Err(TimelineError::DuplicateNodePosition(pos));
        }
        self.delete_node(id)?;
        self.insert_node(AutomationNode { id, pos, value })
    }

    /// Re-position every node, keeping the lane sorted
    ///
    /// Nodes mapped onto a position already taken are dropped.
    pub fn map_positions(&mut self, f: impl Fn(Position) -> Position) {
        let nodes = std::mem::take(&mut self.nodes);
        for node in nodes {
            let moved = AutomationNode {
                pos: f(node.pos),
                ..node
            };
            if let Err(e) = self.insert_node(moved) {
                tracing::warn!("Dropped automation node {} in lane {}: {}", node.id, self.id, e);
            }
        }
    }
}
