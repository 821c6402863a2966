//! Portals crossed by a path, between the A* search and the funnel algorithm

use glam::Vec3;
use navmesh_common::TriangleRef;

/// How a portal is traversed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortalKind {
    /// Free movement through a segment
    Walk,
    /// Discrete hop from a take-off point to a landing point
    Jump,
}

/// Segment crossed when moving from one triangle to the next.
///
/// For a walk portal, `left` is on the left of the agent crossing it and
/// `right` on its right. A jump portal stores the take-off point in `left`
/// and the landing point in `right`. Start and end points of a path are
/// degenerate walk portals with `left == right`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathPortal {
    left: Vec3,
    right: Vec3,
    from: Option<TriangleRef>,
    to: Option<TriangleRef>,
    kind: PortalKind,
}

impl PathPortal {
    /// Degenerate portal at a path end point
    pub fn point(point: Vec3) -> Self {
        Self {
            left: point,
            right: point,
            from: None,
            to: None,
            kind: PortalKind::Walk,
        }
    }

    pub fn walk(left: Vec3, right: Vec3, from: TriangleRef, to: TriangleRef) -> Self {
        Self {
            left,
            right,
            from: Some(from),
            to: Some(to),
            kind: PortalKind::Walk,
        }
    }

    pub fn jump(take_off: Vec3, landing: Vec3, from: TriangleRef, to: TriangleRef) -> Self {
        Self {
            left: take_off,
            right: landing,
            from: Some(from),
            to: Some(to),
            kind: PortalKind::Jump,
        }
    }

    pub fn left(&self) -> Vec3 {
        self.left
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    /// Triangle the portal is left from, `None` for path end points
    pub fn from(&self) -> Option<TriangleRef> {
        self.from
    }

    /// Triangle the portal leads to, `None` for path end points
    pub fn to(&self) -> Option<TriangleRef> {
        self.to
    }

    pub fn kind(&self) -> PortalKind {
        self.kind
    }

    pub fn is_jump(&self) -> bool {
        self.kind == PortalKind::Jump
    }

    pub fn is_degenerate(&self) -> bool {
        self.kind == PortalKind::Walk && self.left == self.right
    }

    pub fn take_off(&self) -> Option<Vec3> {
        self.is_jump().then_some(self.left)
    }

    pub fn landing(&self) -> Option<Vec3> {
        self.is_jump().then_some(self.right)
    }
}
