//! Native text serialization of patch streams.
//!
//! A patch stream is a whitespace-delimited concatenation of patches. Each
//! patch starts with a class header (`200` for surfaces, `700` for volumes,
//! followed by a three-integer format version), then the space dimension and
//! rational flag (only `3 0` is handled), then per parametric direction the
//! control count and order followed by the knot vector, and finally the
//! control points, u fastest.

use std::io::Write;

use patchwork_math::Point3;

use crate::{validate_knots, SplineError, SplineSurface, SplineVolume};

/// Class id of a surface patch in the stream.
const CLASS_SURFACE: i64 = 200;
/// Class id of a volume patch in the stream.
const CLASS_VOLUME: i64 = 700;

/// One patch from a patch stream.
#[derive(Debug, Clone)]
pub enum Patch {
    /// A bivariate patch.
    Surface(SplineSurface),
    /// A trivariate patch.
    Volume(SplineVolume),
}

impl Patch {
    /// True if this is a volume patch.
    pub fn is_volume(&self) -> bool {
        matches!(self, Patch::Volume(_))
    }
}

/// Cursor over whitespace-delimited tokens.
struct Cursor<'a> {
    tokens: Vec<&'a str>,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            tokens: input.split_whitespace().collect(),
            pos: 0,
        }
    }

    fn done(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn next(&mut self) -> Result<&'a str, SplineError> {
        let tok = self
            .tokens
            .get(self.pos)
            .ok_or_else(|| SplineError::parse("unexpected end of patch stream"))?;
        self.pos += 1;
        Ok(tok)
    }

    fn next_i64(&mut self) -> Result<i64, SplineError> {
        let tok = self.next()?;
        tok.parse()
            .map_err(|_| SplineError::parse(format!("expected integer, got \"{}\"", tok)))
    }

    fn next_usize(&mut self) -> Result<usize, SplineError> {
        let tok = self.next()?;
        tok.parse()
            .map_err(|_| SplineError::parse(format!("expected count, got \"{}\"", tok)))
    }

    fn next_f64(&mut self) -> Result<f64, SplineError> {
        let tok = self.next()?;
        tok.parse()
            .map_err(|_| SplineError::parse(format!("expected number, got \"{}\"", tok)))
    }
}

/// Read one parametric direction: control count, order, knot vector.
fn read_direction(cur: &mut Cursor) -> Result<(usize, usize, Vec<f64>), SplineError> {
    let n = cur.next_usize()?;
    let order = cur.next_usize()?;
    if n < 2 {
        return Err(SplineError::parse(format!(
            "patch needs at least 2 control points per direction, got {}",
            n
        )));
    }
    if order < 2 {
        return Err(SplineError::UnsupportedFormat(format!(
            "order {} not handled (need at least 2)",
            order
        )));
    }
    let mut knots = Vec::with_capacity(n + order);
    for _ in 0..n + order {
        knots.push(cur.next_f64()?);
    }
    if !validate_knots(&knots, n, order - 1) {
        return Err(SplineError::InvalidKnots(format!(
            "non-decreasing knot vector of length {} expected",
            n + order
        )));
    }
    Ok((n, order - 1, knots))
}

fn read_points(cur: &mut Cursor, count: usize) -> Result<Vec<Point3>, SplineError> {
    let mut pts = Vec::with_capacity(count);
    for _ in 0..count {
        let x = cur.next_f64()?;
        let y = cur.next_f64()?;
        let z = cur.next_f64()?;
        pts.push(Point3::new(x, y, z));
    }
    Ok(pts)
}

/// Read every patch from a stream.
pub fn read_patches(input: &str) -> Result<Vec<Patch>, SplineError> {
    let mut cur = Cursor::new(input);
    let mut patches = Vec::new();

    while !cur.done() {
        let class = cur.next_i64()?;
        // Format version triple, unused
        for _ in 0..3 {
            cur.next_i64()?;
        }
        let dim = cur.next_i64()?;
        let rational = cur.next_i64()?;
        if dim != 3 || rational != 0 {
            return Err(SplineError::UnsupportedFormat(format!(
                "dimension {} rational {} (only non-rational 3D patches are handled)",
                dim, rational
            )));
        }

        match class {
            CLASS_SURFACE => {
                let (n_u, deg_u, knots_u) = read_direction(&mut cur)?;
                let (n_v, deg_v, knots_v) = read_direction(&mut cur)?;
                let pts = read_points(&mut cur, n_u * n_v)?;
                patches.push(Patch::Surface(SplineSurface::new(
                    pts,
                    [n_u, n_v],
                    knots_u,
                    knots_v,
                    [deg_u, deg_v],
                )));
            }
            CLASS_VOLUME => {
                let (n_u, deg_u, knots_u) = read_direction(&mut cur)?;
                let (n_v, deg_v, knots_v) = read_direction(&mut cur)?;
                let (n_w, deg_w, knots_w) = read_direction(&mut cur)?;
                let pts = read_points(&mut cur, n_u * n_v * n_w)?;
                patches.push(Patch::Volume(SplineVolume::new(
                    pts,
                    [n_u, n_v, n_w],
                    knots_u,
                    knots_v,
                    knots_w,
                    [deg_u, deg_v, deg_w],
                )));
            }
            other => return Err(SplineError::UnsupportedClass(other)),
        }
    }

    Ok(patches)
}

fn write_knot_line<W: Write>(w: &mut W, knots: &[f64]) -> std::io::Result<()> {
    let line: Vec<String> = knots.iter().map(|k| k.to_string()).collect();
    writeln!(w, "{}", line.join(" "))
}

fn write_points<W: Write>(w: &mut W, pts: &[Point3]) -> std::io::Result<()> {
    for p in pts {
        writeln!(w, "{} {} {}", p.x, p.y, p.z)?;
    }
    Ok(())
}

/// Write one surface patch in the stream format.
pub fn write_surface<W: Write>(w: &mut W, s: &SplineSurface) -> Result<(), SplineError> {
    writeln!(w, "{} 1 0 0", CLASS_SURFACE)?;
    writeln!(w, "3 0")?;
    writeln!(w, "{} {}", s.n_u, s.degree_u + 1)?;
    write_knot_line(w, &s.knots_u)?;
    writeln!(w, "{} {}", s.n_v, s.degree_v + 1)?;
    write_knot_line(w, &s.knots_v)?;
    write_points(w, &s.control_points)?;
    Ok(())
}

/// Write one volume patch in the stream format.
pub fn write_volume<W: Write>(w: &mut W, v: &SplineVolume) -> Result<(), SplineError> {
    writeln!(w, "{} 1 0 0", CLASS_VOLUME)?;
    writeln!(w, "3 0")?;
    writeln!(w, "{} {}", v.n_u, v.degree_u + 1)?;
    write_knot_line(w, &v.knots_u)?;
    writeln!(w, "{} {}", v.n_v, v.degree_v + 1)?;
    write_knot_line(w, &v.knots_v)?;
    writeln!(w, "{} {}", v.n_w, v.degree_w + 1)?;
    write_knot_line(w, &v.knots_w)?;
    write_points(w, &v.control_points)?;
    Ok(())
}

/// Write one patch in the stream format.
pub fn write_patch<W: Write>(w: &mut W, patch: &Patch) -> Result<(), SplineError> {
    match patch {
        Patch::Surface(s) => write_surface(w, s),
        Patch::Volume(v) => write_volume(w, v),
    }
}

/// Write every patch, concatenated in order.
pub fn write_patches<W: Write>(w: &mut W, patches: &[Patch]) -> Result<(), SplineError> {
    for patch in patches {
        write_patch(w, patch)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNIT_SQUARE: &str = "200 1 0 0
3 0
2 2
0 0 1 1
2 2
0 0 1 1
0 0 0
1 0 0
0 1 0
1 1 0
";

    #[test]
    fn test_read_surface() {
        let patches = read_patches(UNIT_SQUARE).unwrap();
        assert_eq!(patches.len(), 1);
        match &patches[0] {
            Patch::Surface(s) => {
                assert_eq!((s.n_u, s.n_v), (2, 2));
                assert_eq!((s.degree_u, s.degree_v), (1, 1));
                assert!((s.corner(3) - Point3::new(1.0, 1.0, 0.0)).norm() < 1e-12);
            }
            _ => panic!("expected a surface patch"),
        }
    }

    #[test]
    fn test_roundtrip_volume() {
        let mut pts = Vec::new();
        for k in 0..2 {
            for j in 0..2 {
                for i in 0..3 {
                    pts.push(Point3::new(i as f64 * 0.5, j as f64, k as f64));
                }
            }
        }
        let vol = SplineVolume::new(
            pts,
            [3, 2, 2],
            vec![0.0, 0.0, 0.5, 1.0, 1.0],
            vec![0.0, 0.0, 1.0, 1.0],
            vec![0.0, 0.0, 1.0, 1.0],
            [1, 1, 1],
        );
        let mut buf = Vec::new();
        write_patch(&mut buf, &Patch::Volume(vol.clone())).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let patches = read_patches(&text).unwrap();
        match &patches[0] {
            Patch::Volume(v) => {
                assert_eq!((v.n_u, v.n_v, v.n_w), (3, 2, 2));
                assert_eq!(v.knots_u, vol.knots_u);
                for (a, b) in v.control_points.iter().zip(&vol.control_points) {
                    assert!((a - b).norm() < 1e-15);
                }
            }
            _ => panic!("expected a volume patch"),
        }
    }

    #[test]
    fn test_concatenated_patches() {
        let two = format!("{}{}", UNIT_SQUARE, UNIT_SQUARE);
        let patches = read_patches(&two).unwrap();
        assert_eq!(patches.len(), 2);
    }

    #[test]
    fn test_unknown_class() {
        let err = read_patches("100 1 0 0\n3 0\n").unwrap_err();
        assert!(matches!(err, SplineError::UnsupportedClass(100)));
    }

    #[test]
    fn test_truncated_stream() {
        let err = read_patches("200 1 0 0\n3 0\n2 2\n0 0 1 1\n").unwrap_err();
        assert!(matches!(err, SplineError::Parse { .. }));
    }

    #[test]
    fn test_bad_knots() {
        let bad = "200 1 0 0\n3 0\n2 2\n0 1 0 1\n2 2\n0 0 1 1\n0 0 0\n1 0 0\n0 1 0\n1 1 0\n";
        let err = read_patches(bad).unwrap_err();
        assert!(matches!(err, SplineError::InvalidKnots(_)));
    }
}
