use glam::{Vec2, Vec3};
use std::f32::consts::TAU;

/// Profile revolved to form the lantern body, as (radius, height) pairs.
pub const LANTERN_PROFILE: [Vec2; 5] = [
    Vec2::new(0.0, 1.0),
    Vec2::new(0.25, 0.125),
    Vec2::new(0.25, 0.0),
    Vec2::new(0.45, 0.125),
    Vec2::new(0.45, 0.5),
];
pub const LANTERN_SEGMENTS: u32 = 20;

/// Errors from preparing mesh data for upload.
#[derive(Debug, thiserror::Error)]
pub enum MeshError {
    #[error("mesh has {0} vertices, exceeding the 16-bit index range")]
    TooManyVertices(usize),
}

/// Indexed triangle list with positions only.
///
/// Indices are kept as u32 while building so merging can never overflow;
/// [`MeshData::indices_u16`] narrows them for upload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub positions: Vec<Vec3>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Lowest and highest local Y, or `None` for an empty mesh.
    pub fn y_range(&self) -> Option<(f32, f32)> {
        let mut ys = self.positions.iter().map(|p| p.y);
        let first = ys.next()?;
        Some(ys.fold((first, first), |(lo, hi), y| (lo.min(y), hi.max(y))))
    }

    pub fn indices_u16(&self) -> Result<Vec<u16>, MeshError> {
        if self.positions.len() > usize::from(u16::MAX) + 1 {
            return Err(MeshError::TooManyVertices(self.positions.len()));
        }
        Ok(self.indices.iter().map(|&i| i as u16).collect())
    }

    pub fn positions_array(&self) -> Vec<[f32; 3]> {
        self.positions.iter().map(|p| p.to_array()).collect()
    }
}

/// Revolve a 2D profile around the Y axis.
///
/// Produces `segments + 1` rings so the seam has its own vertices, with each
/// profile point `p` mapped to `(p.x sin φ, p.y, p.x cos φ)`.
pub fn lathe(profile: &[Vec2], segments: u32) -> MeshData {
    let segments = segments.max(1);
    let ring = profile.len() as u32;
    let mut mesh = MeshData::default();

    for i in 0..=segments {
        let phi = i as f32 / segments as f32 * TAU;
        let (sin, cos) = phi.sin_cos();
        for p in profile {
            mesh.positions.push(Vec3::new(p.x * sin, p.y, p.x * cos));
        }
    }

    for i in 0..segments {
        for j in 0..ring.saturating_sub(1) {
            let base = j + i * ring;
            let a = base;
            let b = base + ring;
            let c = base + ring + 1;
            let d = base + 1;
            mesh.indices.extend_from_slice(&[a, b, d, c, d, b]);
        }
    }
    mesh
}

/// Capped frustum centered on the origin, `height` tall along Y.
pub fn cylinder(radius_top: f32, radius_bottom: f32, height: f32, radial_segments: u32) -> MeshData {
    let radial = radial_segments.max(1);
    let half = height / 2.0;
    let mut mesh = MeshData::default();

    // Side wall: a top ring and a bottom ring.
    for y in 0..=1u32 {
        let v = y as f32;
        let radius = v * (radius_bottom - radius_top) + radius_top;
        for x in 0..=radial {
            let theta = x as f32 / radial as f32 * TAU;
            let (sin, cos) = theta.sin_cos();
            mesh.positions
                .push(Vec3::new(radius * sin, -v * height + half, radius * cos));
        }
    }
    let row = radial + 1;
    for x in 0..radial {
        let a = x;
        let b = row + x;
        let c = row + x + 1;
        let d = x + 1;
        mesh.indices.extend_from_slice(&[a, b, d, b, c, d]);
    }

    push_cap(&mut mesh, radius_top, half, radial, true);
    push_cap(&mut mesh, radius_bottom, -half, radial, false);
    mesh
}

fn push_cap(mesh: &mut MeshData, radius: f32, y: f32, radial: u32, top: bool) {
    // One center vertex per segment, then the rim.
    let center_start = mesh.positions.len() as u32;
    mesh.positions
        .extend((0..radial).map(|_| Vec3::new(0.0, y, 0.0)));
    let rim_start = mesh.positions.len() as u32;
    for x in 0..=radial {
        let theta = x as f32 / radial as f32 * TAU;
        let (sin, cos) = theta.sin_cos();
        mesh.positions.push(Vec3::new(radius * sin, y, radius * cos));
    }

    for x in 0..radial {
        let c = center_start + x;
        let i = rim_start + x;
        if top {
            mesh.indices.extend_from_slice(&[i, i + 1, c]);
        } else {
            mesh.indices.extend_from_slice(&[i + 1, i, c]);
        }
    }
}

/// Concatenate meshes into one, offsetting each mesh's indices.
pub fn merge(meshes: &[MeshData]) -> MeshData {
    let mut merged = MeshData::default();
    for mesh in meshes {
        let offset = merged.positions.len() as u32;
        merged.positions.extend_from_slice(&mesh.positions);
        merged.indices.extend(mesh.indices.iter().map(|i| i + offset));
    }
    merged
}

/// The single merged lantern mesh: lathe body plus the small light base.
pub fn lantern_mesh() -> MeshData {
    let body = lathe(&LANTERN_PROFILE, LANTERN_SEGMENTS);
    let light = cylinder(0.1, 0.05, 0.2, 10);
    let mesh = merge(&[body, light]);
    tracing::debug!(
        vertices = mesh.vertex_count(),
        triangles = mesh.triangle_count(),
        "built lantern mesh"
    );
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indices_in_range(mesh: &MeshData) -> bool {
        mesh.indices
            .iter()
            .all(|&i| (i as usize) < mesh.positions.len())
    }

    #[test]
    fn lathe_counts() {
        let mesh = lathe(&LANTERN_PROFILE, LANTERN_SEGMENTS);
        assert_eq!(mesh.vertex_count(), 21 * 5);
        assert_eq!(mesh.triangle_count(), 20 * 4 * 2);
        assert!(indices_in_range(&mesh));
    }

    #[test]
    fn lathe_preserves_profile_heights_and_radii() {
        let mesh = lathe(&LANTERN_PROFILE, 8);
        for (k, p) in mesh.positions.iter().enumerate() {
            let src = LANTERN_PROFILE[k % LANTERN_PROFILE.len()];
            assert_eq!(p.y, src.y);
            let r = (p.x * p.x + p.z * p.z).sqrt();
            assert!((r - src.x).abs() < 1e-5);
        }
    }

    #[test]
    fn lathe_seam_closes() {
        let mesh = lathe(&LANTERN_PROFILE, 12);
        let n = LANTERN_PROFILE.len();
        let first = &mesh.positions[..n];
        let last = &mesh.positions[mesh.positions.len() - n..];
        for (a, b) in first.iter().zip(last) {
            assert!((*a - *b).length() < 1e-5);
        }
    }

    #[test]
    fn lathe_single_point_has_no_faces() {
        let mesh = lathe(&[Vec2::new(1.0, 0.0)], 4);
        assert_eq!(mesh.vertex_count(), 5);
        assert_eq!(mesh.triangle_count(), 0);
    }

    #[test]
    fn cylinder_counts() {
        let mesh = cylinder(0.1, 0.05, 0.2, 10);
        assert_eq!(mesh.vertex_count(), 22 + 2 * (10 + 11));
        assert_eq!(mesh.triangle_count(), 20 + 2 * 10);
        assert!(indices_in_range(&mesh));
    }

    #[test]
    fn cylinder_is_centered_and_tapered() {
        let mesh = cylinder(0.1, 0.05, 0.2, 10);
        let (lo, hi) = mesh.y_range().unwrap();
        assert!((lo + 0.1).abs() < 1e-6);
        assert!((hi - 0.1).abs() < 1e-6);
        let radial = |p: Vec3| Vec3::new(p.x, 0.0, p.z).length();
        // Top ring first, bottom ring after it.
        assert!((radial(mesh.positions[0]) - 0.1).abs() < 1e-6);
        assert!((radial(mesh.positions[11]) - 0.05).abs() < 1e-6);
        assert!(mesh.positions[0].y > mesh.positions[11].y);
    }

    #[test]
    fn merge_offsets_indices() {
        let a = lathe(&LANTERN_PROFILE, 4);
        let b = cylinder(0.1, 0.05, 0.2, 6);
        let merged = merge(&[a.clone(), b.clone()]);
        assert_eq!(merged.vertex_count(), a.vertex_count() + b.vertex_count());
        assert_eq!(merged.indices.len(), a.indices.len() + b.indices.len());
        let offset = a.vertex_count() as u32;
        assert_eq!(merged.indices[a.indices.len()], b.indices[0] + offset);
        assert!(indices_in_range(&merged));
    }

    #[test]
    fn lantern_mesh_shape() {
        let mesh = lantern_mesh();
        assert_eq!(mesh.vertex_count(), 105 + 64);
        assert_eq!(mesh.triangle_count(), 160 + 40);
        assert!(indices_in_range(&mesh));
        let (lo, hi) = mesh.y_range().unwrap();
        assert!((lo + 0.1).abs() < 1e-6);
        assert_eq!(hi, 1.0);
        assert_eq!(mesh.indices_u16().unwrap().len(), mesh.indices.len());
    }

    #[test]
    fn oversized_mesh_rejected_for_u16() {
        let mesh = MeshData {
            positions: vec![Vec3::ZERO; 70_000],
            indices: vec![0, 1, 69_999],
        };
        assert!(matches!(
            mesh.indices_u16(),
            Err(MeshError::TooManyVertices(70_000))
        ));
    }

    #[test]
    fn empty_mesh_has_no_range() {
        assert!(MeshData::default().y_range().is_none());
    }
}
