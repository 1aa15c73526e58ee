/*! Boundary between the IR and whatever runs detectors over it.
 *
 * A detector reports nodes, not positions. Turning those nodes into file locations happens here,
 * through the same line index for the primary finding and every related one, so reports never
 * disagree about where a node lives.
 */

use crate::ir::{IrGraph, Location, NodeId};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a finding. Ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionImpact {
    Info,
    Warning,
    Low,
    Medium,
    High,
}

impl fmt::Display for DetectionImpact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DetectionImpact::Info => "info",
            DetectionImpact::Warning => "warning",
            DetectionImpact::Low => "low",
            DetectionImpact::Medium => "medium",
            DetectionImpact::High => "high",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detection {
    pub node: NodeId,
    pub message: String,
    #[serde(default)]
    pub subdetections: Vec<Detection>,
}

impl Detection {
    pub fn new(node: NodeId, message: impl Into<String>) -> Self {
        Self {
            node,
            message: message.into(),
            subdetections: Vec::new(),
        }
    }

    pub fn with_subdetection(mut self, sub: Detection) -> Self {
        self.subdetections.push(sub);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectorResult {
    pub detection: Detection,
    pub impact: DetectionImpact,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedLocation {
    pub message: String,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocatedDetection {
    pub impact: DetectionImpact,
    pub message: String,
    pub location: Location,
    pub related: Vec<RelatedLocation>,
}

impl DetectorResult {
    pub fn new(detection: Detection, impact: DetectionImpact) -> Self {
        Self { detection, impact }
    }

    /// Resolves the primary node and all nested subdetections, depth-first.
    pub fn locate(&self, graph: &IrGraph) -> Result<LocatedDetection> {
        let mut related = Vec::new();
        let mut pending: Vec<&Detection> = self.detection.subdetections.iter().rev().collect();
        while let Some(sub) = pending.pop() {
            related.push(RelatedLocation {
                message: sub.message.clone(),
                location: graph.locate(sub.node)?,
            });
            pending.extend(sub.subdetections.iter().rev());
        }

        Ok(LocatedDetection {
            impact: self.impact,
            message: self.detection.message.clone(),
            location: graph.locate(self.detection.node)?,
            related,
        })
    }
}
