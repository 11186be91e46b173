use anyhow::{Context, Result, anyhow, bail, ensure};

use crate::data_structures::model::ModelVertex;

/**
 * A small .obj parser for the subset the game's assets use: `v`, `vn`, `vt`
 * and triangulated `f position/texcoord/normal` faces. Everything else
 * (`mtllib`, `usemtl`, groups, smoothing, comments) is skipped.
 *
 * Every face corner becomes its own vertex, so corners that share a position
 * but differ in texcoord or normal never alias. The index buffer is therefore
 * just 0..3*faces in face order.
 */
pub fn parse_obj(source: &str) -> Result<(Vec<ModelVertex>, Vec<u32>)> {
    // First pass counts directives so the second can pre-size every container.
    let mut position_count = 0;
    let mut texcoord_count = 0;
    let mut normal_count = 0;
    let mut face_count = 0;
    for line in source.lines() {
        match line.split_whitespace().next() {
            Some("v") => position_count += 1,
            Some("vt") => texcoord_count += 1,
            Some("vn") => normal_count += 1,
            Some("f") => face_count += 1,
            _ => {}
        }
    }

    let mut positions: Vec<[f32; 3]> = Vec::with_capacity(position_count);
    let mut texcoords: Vec<[f32; 2]> = Vec::with_capacity(texcoord_count);
    let mut normals: Vec<[f32; 3]> = Vec::with_capacity(normal_count);
    let mut vertices: Vec<ModelVertex> = Vec::with_capacity(face_count * 3);
    let mut indices: Vec<u32> = Vec::with_capacity(face_count * 3);

    for (i, line) in source.lines().enumerate() {
        let number = i + 1;
        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("v") => {
                positions.push([
                    parse_component(parts.next(), number, "v")?,
                    parse_component(parts.next(), number, "v")?,
                    parse_component(parts.next(), number, "v")?,
                ]);
            }
            Some("vt") => {
                let u = parse_component(parts.next(), number, "vt")?;
                let v = parse_component(parts.next(), number, "vt")?;
                // Images are stored top-down while obj V grows bottom-up.
                texcoords.push([u, 1.0 - v]);
            }
            Some("vn") => {
                normals.push([
                    parse_component(parts.next(), number, "vn")?,
                    parse_component(parts.next(), number, "vn")?,
                    parse_component(parts.next(), number, "vn")?,
                ]);
            }
            Some("f") => {
                let corners: Vec<&str> = parts.collect();
                ensure!(
                    corners.len() == 3,
                    "line {}: only triangulated faces are supported, got {} corners",
                    number,
                    corners.len()
                );
                for corner in corners {
                    let (pi, ti, ni) = parse_corner(corner, number)?;
                    let position = *positions.get(pi).ok_or_else(|| {
                        anyhow!(
                            "line {}: position index {} out of range (have {})",
                            number,
                            pi + 1,
                            positions.len()
                        )
                    })?;
                    let tex_coords = *texcoords.get(ti).ok_or_else(|| {
                        anyhow!(
                            "line {}: texcoord index {} out of range (have {})",
                            number,
                            ti + 1,
                            texcoords.len()
                        )
                    })?;
                    let normal = *normals.get(ni).ok_or_else(|| {
                        anyhow!(
                            "line {}: normal index {} out of range (have {})",
                            number,
                            ni + 1,
                            normals.len()
                        )
                    })?;

                    vertices.push(ModelVertex {
                        position,
                        tex_coords,
                        normal,
                        tangent: [0.0; 3],
                    });
                    indices.push(vertices.len() as u32 - 1);
                }
            }
            // mtllib/usemtl/o/g/s, comments and blank lines
            _ => {}
        }
    }

    Ok((vertices, indices))
}

fn parse_component(token: Option<&str>, number: usize, directive: &str) -> Result<f32> {
    let token = token
        .ok_or_else(|| anyhow!("line {}: {} is missing a component", number, directive))?;
    token
        .parse::<f32>()
        .with_context(|| format!("line {}: bad number {:?} in {}", number, token, directive))
}

fn parse_corner(corner: &str, number: usize) -> Result<(usize, usize, usize)> {
    let mut parts = corner.split('/');
    let position = parse_index(parts.next(), corner, number)?;
    let texcoord = parse_index(parts.next(), corner, number)?;
    let normal = parse_index(parts.next(), corner, number)?;
    if parts.next().is_some() {
        bail!("line {}: malformed face corner {:?}", number, corner);
    }
    Ok((position, texcoord, normal))
}

fn parse_index(part: Option<&str>, corner: &str, number: usize) -> Result<usize> {
    let part = part.filter(|p| !p.is_empty()).ok_or_else(|| {
        anyhow!(
            "line {}: face corner {:?} must be position/texcoord/normal",
            number,
            corner
        )
    })?;
    let raw: usize = part.parse().with_context(|| {
        format!("line {}: bad index in face corner {:?}", number, corner)
    })?;
    ensure!(
        raw >= 1,
        "line {}: face indices are 1-based, got 0 in {:?}",
        number,
        corner
    );
    Ok(raw - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUAD: &str = "\
# a unit quad
mtllib scene.mtl
o quad
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 1.0 1.0 0.0
v 0.0 1.0 0.0
vt 0.0 0.0
vt 1.0 0.0
vt 1.0 1.0
vt 0.0 1.0
vn 0.0 0.0 1.0
usemtl neon
s off
f 1/1/1 2/2/1 3/3/1
f 1/1/1 3/3/1 4/4/1
";

    #[test]
    fn corners_become_unshared_vertices_in_face_order() {
        let (vertices, indices) = parse_obj(QUAD).unwrap();
        // Two triangles, three fresh vertices each, no dedup of the shared
        // corners.
        assert_eq!(vertices.len(), 6);
        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(vertices[0].position, vertices[3].position);
    }

    #[test]
    fn indices_are_converted_from_one_based() {
        let source = "\
v 1.0 2.0 3.0
v 4.0 5.0 6.0
vt 0.5 0.0
vn 0.0 1.0 0.0
f 2/1/1 1/1/1 2/1/1
";
        let (vertices, _) = parse_obj(source).unwrap();
        assert_eq!(vertices[0].position, [4.0, 5.0, 6.0]);
        assert_eq!(vertices[1].position, [1.0, 2.0, 3.0]);
        assert_eq!(vertices[0].normal, [0.0, 1.0, 0.0]);
    }

    #[test]
    fn v_coordinate_is_flipped() {
        let source = "\
v 0.0 0.0 0.0
vt 0.25 0.75
vn 0.0 0.0 1.0
f 1/1/1 1/1/1 1/1/1
";
        let (vertices, _) = parse_obj(source).unwrap();
        assert_eq!(vertices[0].tex_coords, [0.25, 0.25]);
    }

    #[test]
    fn quads_are_rejected_with_the_line_number() {
        let source = "\
v 0.0 0.0 0.0
vt 0.0 0.0
vn 0.0 0.0 1.0
f 1/1/1 1/1/1 1/1/1 1/1/1
";
        let err = parse_obj(source).unwrap_err().to_string();
        assert!(err.contains("line 4"), "unexpected error: {err}");
        assert!(err.contains("4 corners"), "unexpected error: {err}");
    }

    #[test]
    fn out_of_range_position_index_is_an_error() {
        let source = "\
v 0.0 0.0 0.0
vt 0.0 0.0
vn 0.0 0.0 1.0
f 2/1/1 1/1/1 1/1/1
";
        let err = parse_obj(source).unwrap_err().to_string();
        assert!(err.contains("line 4"), "unexpected error: {err}");
        assert!(err.contains("out of range"), "unexpected error: {err}");
    }

    #[test]
    fn corner_without_normal_is_an_error() {
        let source = "\
v 0.0 0.0 0.0
vt 0.0 0.0
vn 0.0 0.0 1.0
f 1/1 1/1 1/1
";
        assert!(parse_obj(source).is_err());
    }

    #[test]
    fn zero_index_is_an_error() {
        let source = "\
v 0.0 0.0 0.0
vt 0.0 0.0
vn 0.0 0.0 1.0
f 0/1/1 1/1/1 1/1/1
";
        let err = parse_obj(source).unwrap_err().to_string();
        assert!(err.contains("1-based"), "unexpected error: {err}");
    }

    #[test]
    fn unknown_directives_are_skipped() {
        let source = "\
g track
vp 0.5 0.5
";
        let (vertices, indices) = parse_obj(source).unwrap();
        assert!(vertices.is_empty());
        assert!(indices.is_empty());
    }

    #[test]
    fn bad_number_reports_the_directive() {
        let source = "v 0.0 nope 0.0\n";
        let err = format!("{:#}", parse_obj(source).unwrap_err());
        assert!(err.contains("line 1"), "unexpected error: {err}");
    }
}
