use super::Point;

/// Drop interior points that sit on a straight horizontal or vertical run,
/// plus repeated points. Endpoints and true corners are kept.
///
/// The output has no repeated neighbours and no axis-collinear triple, so a
/// second pass returns it unchanged.
pub fn simplify(points: &[Point]) -> Vec<Point> {
    if points.len() <= 2 {
        return points.to_vec();
    }
    let mut out: Vec<Point> = Vec::with_capacity(points.len());
    for &p in points {
        if out.last() == Some(&p) {
            continue;
        }
        out.push(p);
        while out.len() >= 3 {
            let n = out.len();
            if !axis_collinear(out[n - 3], out[n - 2], out[n - 1]) {
                break;
            }
            out.remove(n - 2);
            if out[n - 3] == out[n - 2] {
                // Path doubled back onto itself.
                out.pop();
            }
        }
    }
    if out.len() < 2 {
        return vec![points[0], points[points.len() - 1]];
    }
    out
}

fn axis_collinear(a: Point, b: Point, c: Point) -> bool {
    (a.x == b.x && b.x == c.x) || (a.y == b.y && b.y == c.y)
}
