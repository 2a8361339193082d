//! 2D affine transforms in `[a, b, c, d, e, f]` form.
//!
//! A point maps as `x' = a*x + c*y + e`, `y' = b*x + d*y + f`, the layout
//! used by PDF content streams and by the viewport of every extractor.

pub type Transform = [f64; 6];

pub const IDENTITY: Transform = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// Compose two transforms: the result applies `inner` first, then `outer`.
pub fn transform(outer: &Transform, inner: &Transform) -> Transform {
    [
        outer[0] * inner[0] + outer[2] * inner[1],
        outer[1] * inner[0] + outer[3] * inner[1],
        outer[0] * inner[2] + outer[2] * inner[3],
        outer[1] * inner[2] + outer[3] * inner[3],
        outer[0] * inner[4] + outer[2] * inner[5] + outer[4],
        outer[1] * inner[4] + outer[3] * inner[5] + outer[5],
    ]
}

pub fn apply(m: &Transform, (x, y): (f64, f64)) -> (f64, f64) {
    (m[0] * x + m[2] * y + m[4], m[1] * x + m[3] * y + m[5])
}

/// Translation component, i.e. where the origin lands.
pub fn origin(m: &Transform) -> (f64, f64) {
    (m[4], m[5])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_is_neutral() {
        let m = [2.0, 0.0, 0.0, 3.0, 10.0, 20.0];
        assert_eq!(transform(&IDENTITY, &m), m);
        assert_eq!(transform(&m, &IDENTITY), m);
    }

    #[test]
    fn test_flip_viewport_composition() {
        // Letter-sized page flipped so y grows downward
        let viewport = [1.0, 0.0, 0.0, -1.0, 0.0, 792.0];
        let text = [12.0, 0.0, 0.0, 12.0, 72.0, 700.0];
        let composed = transform(&viewport, &text);

        assert_eq!(origin(&composed), (72.0, 92.0));
        assert_eq!(composed[3], -12.0);
    }

    #[test]
    fn test_apply_matches_composed_origin() {
        let outer = [1.0, 0.0, 0.0, -1.0, -5.0, 100.0];
        let inner = [1.0, 0.0, 0.0, 1.0, 30.0, 40.0];
        let composed = transform(&outer, &inner);
        assert_eq!(apply(&outer, (30.0, 40.0)), origin(&composed));
    }
}
