//! Events delivered by the tracking provider.
//!
//! The provider reports anchors (hands, planes and anything else it tracks)
//! as a stream of add/update/remove events carrying the anchor's pose in the
//! world. The engine processes each event to completion before the next one.

use cgmath::Matrix4;
use serde::{Deserialize, Serialize};

use crate::{
    data_structures::mesh::{Mesh, Vertex, VertexFormat, pack_rgba},
    error::MeshError,
    hand::HandAnchor,
};

/// Provider-assigned identity of an anchor, stable across its updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnchorId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorEventKind {
    Added,
    Updated,
    Removed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlaneClassification {
    Wall,
    Floor,
    Ceiling,
    Table,
    Door,
    Seat,
    Window,
    Undetermined,
    NotAvailable,
    Unknown,
}

const PLANE_ALPHA: u8 = 166;

impl PlaneClassification {
    /// Translucent debug tint for planes of this kind.
    pub fn color(self) -> u32 {
        let (r, g, b) = match self {
            PlaneClassification::Wall => (0, 0, 255),
            PlaneClassification::Floor => (255, 0, 0),
            PlaneClassification::Ceiling => (0, 255, 0),
            PlaneClassification::Table => (255, 255, 0),
            PlaneClassification::Door => (153, 102, 51),
            PlaneClassification::Seat => (255, 45, 85),
            PlaneClassification::Window => (255, 128, 0),
            PlaneClassification::Undetermined => (170, 170, 170),
            PlaneClassification::NotAvailable => (128, 128, 128),
            PlaneClassification::Unknown => (0, 0, 0),
        };
        pack_rgba(r, g, b, PLANE_ALPHA)
    }
}

/// Size of a detected plane and where its center sits in anchor space.
///
/// In extent space the plane spans `width` along X and `height` along Z, with
/// +Y as its normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneExtent {
    pub width: f32,
    pub height: f32,
    pub anchor_from_extent: Matrix4<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneAnchor {
    pub classification: PlaneClassification,
    pub extent: PlaneExtent,
}

/// A chunk of reconstructed room geometry in anchor space.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshAnchor {
    pub vertices: Vec<[f32; 3]>,
    pub faces: Vec<[u32; 3]>,
}

impl MeshAnchor {
    /// Position-only triangle mesh of this chunk, in anchor space.
    pub fn to_mesh(&self) -> Result<Mesh, MeshError> {
        let vertices = self.vertices.iter().map(|&p| Vertex::new(p.into())).collect();
        let indices = self.faces.iter().flatten().copied().collect();
        Mesh::new("scene-mesh", vertices, indices, VertexFormat::Position)
    }
}

/// A detected reference image. Its pose is only reliable while tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageAnchor {
    pub is_tracked: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnchorPayload {
    Hand(HandAnchor),
    Plane(PlaneAnchor),
    Mesh(MeshAnchor),
    Image(ImageAnchor),
    /// Anchors the engine does not interpret, such as world anchors.
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackingEvent {
    pub anchor: AnchorId,
    pub kind: AnchorEventKind,
    pub origin_from_anchor: Matrix4<f32>,
    pub payload: AnchorPayload,
}

impl TrackingEvent {
    pub fn new(
        anchor: AnchorId,
        kind: AnchorEventKind,
        origin_from_anchor: Matrix4<f32>,
        payload: AnchorPayload,
    ) -> Self {
        Self {
            anchor,
            kind,
            origin_from_anchor,
            payload,
        }
    }

    pub fn hand(&self) -> Option<&HandAnchor> {
        match &self.payload {
            AnchorPayload::Hand(hand) => Some(hand),
            _ => None,
        }
    }

    pub fn plane(&self) -> Option<&PlaneAnchor> {
        match &self.payload {
            AnchorPayload::Plane(plane) => Some(plane),
            _ => None,
        }
    }

    pub fn mesh(&self) -> Option<&MeshAnchor> {
        match &self.payload {
            AnchorPayload::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    pub fn image(&self) -> Option<&ImageAnchor> {
        match &self.payload {
            AnchorPayload::Image(image) => Some(image),
            _ => None,
        }
    }
}
