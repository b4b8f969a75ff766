//! Affine pixel/line → ground transforms

use crate::raster::GroundControlPoint;

/// Six-coefficient affine transform in GDAL order
///
/// `x = c[0] + pixel * c[1] + line * c[2]`
/// `y = c[3] + pixel * c[4] + line * c[5]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform(pub [f64; 6]);

impl GeoTransform {
    pub fn new(coefficients: [f64; 6]) -> Self {
        Self(coefficients)
    }

    /// Axis-aligned transform with no rotation terms
    pub fn north_up(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self([origin_x, pixel_width, 0.0, origin_y, 0.0, pixel_height])
    }

    pub fn coefficients(&self) -> [f64; 6] {
        self.0
    }

    /// Map an image position to ground coordinates
    pub fn apply(&self, pixel: f64, line: f64) -> (f64, f64) {
        let c = &self.0;
        (
            c[0] + pixel * c[1] + line * c[2],
            c[3] + pixel * c[4] + line * c[5],
        )
    }

    /// Ground coordinates of the four image corners
    ///
    /// Corner order follows pixels `{0, w, w, 0}` and lines `{0, 0, h, h}`.
    pub fn corners(&self, width: usize, height: usize) -> [(f64, f64); 4] {
        let (w, h) = (width as f64, height as f64);
        [
            self.apply(0.0, 0.0),
            self.apply(w, 0.0),
            self.apply(w, h),
            self.apply(0.0, h),
        ]
    }
}

/// Derive an affine transform from ground-control points
///
/// Two points give a north-up transform spanning them. Three or more are
/// fitted by least squares. Returns `None` when there are too few points or
/// their image positions are degenerate.
pub fn geo_transform_from_gcps(gcps: &[GroundControlPoint]) -> Option<GeoTransform> {
    match gcps.len() {
        0 | 1 => None,
        2 => north_up_from_pair(&gcps[0], &gcps[1]),
        _ => least_squares_fit(gcps),
    }
}

fn north_up_from_pair(a: &GroundControlPoint, b: &GroundControlPoint) -> Option<GeoTransform> {
    if a.pixel == b.pixel || a.line == b.line {
        return None;
    }

    let pixel_width = (b.x - a.x) / (b.pixel - a.pixel);
    let pixel_height = (b.y - a.y) / (b.line - a.line);
    Some(GeoTransform::north_up(
        a.x - a.pixel * pixel_width,
        a.y - a.line * pixel_height,
        pixel_width,
        pixel_height,
    ))
}

fn least_squares_fit(gcps: &[GroundControlPoint]) -> Option<GeoTransform> {
    let n = gcps.len() as f64;
    let mean = |f: fn(&GroundControlPoint) -> f64| gcps.iter().map(f).sum::<f64>() / n;
    let (mp, ml) = (mean(|g| g.pixel), mean(|g| g.line));
    let (mx, my) = (mean(|g| g.x), mean(|g| g.y));

    // Centered normal equations
    let (mut spp, mut sll, mut spl) = (0.0, 0.0, 0.0);
    let (mut spx, mut slx, mut spy, mut sly) = (0.0, 0.0, 0.0, 0.0);
    for g in gcps {
        let (p, l) = (g.pixel - mp, g.line - ml);
        let (x, y) = (g.x - mx, g.y - my);
        spp += p * p;
        sll += l * l;
        spl += p * l;
        spx += p * x;
        slx += l * x;
        spy += p * y;
        sly += l * y;
    }

    let scale = spp * sll;
    let det = scale - spl * spl;
    if scale == 0.0 || det.abs() <= scale * 1e-12 {
        return None;
    }

    let b = (spx * sll - slx * spl) / det;
    let c = (slx * spp - spx * spl) / det;
    let e = (spy * sll - sly * spl) / det;
    let f = (sly * spp - spy * spl) / det;

    Some(GeoTransform([
        mx - b * mp - c * ml,
        b,
        c,
        my - e * mp - f * ml,
        e,
        f,
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: [f64; 6], b: [f64; 6]) {
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-6, "{:?} != {:?}", a, b);
        }
    }

    #[test]
    fn test_corners_of_identity_like_transform() {
        let gt = GeoTransform::north_up(0.0, 0.0, 1.0, -1.0);
        let corners = gt.corners(10, 10);
        assert_eq!(corners, [(0.0, 0.0), (10.0, 0.0), (10.0, -10.0), (0.0, -10.0)]);
    }

    #[test]
    fn test_apply_uses_rotation_terms() {
        let gt = GeoTransform::new([100.0, 2.0, 0.5, 200.0, 0.25, -2.0]);
        assert_eq!(gt.apply(10.0, 4.0), (100.0 + 20.0 + 2.0, 200.0 + 2.5 - 8.0));
    }

    #[test]
    fn test_gcp_fit_recovers_rotated_transform() {
        let truth = GeoTransform::new([747000.0, 0.5, 0.1, 4407600.0, -0.05, -0.5]);
        let gcps: Vec<_> = [(0.0, 0.0), (1000.0, 0.0), (0.0, 800.0), (1000.0, 800.0), (420.0, 133.0)]
            .iter()
            .map(|&(p, l)| {
                let (x, y) = truth.apply(p, l);
                GroundControlPoint::new(p, l, x, y)
            })
            .collect();

        let fitted = geo_transform_from_gcps(&gcps).unwrap();
        assert_close(fitted.coefficients(), truth.coefficients());
    }

    #[test]
    fn test_gcp_pair_gives_north_up_transform() {
        let gcps = [
            GroundControlPoint::new(0.0, 0.0, 10.0, 50.0),
            GroundControlPoint::new(100.0, 200.0, 11.0, 48.0),
        ];
        let fitted = geo_transform_from_gcps(&gcps).unwrap();
        assert_close(fitted.coefficients(), [10.0, 0.01, 0.0, 50.0, 0.0, -0.01]);
    }

    #[test]
    fn test_gcp_fit_rejects_degenerate_sets() {
        assert!(geo_transform_from_gcps(&[]).is_none());
        assert!(geo_transform_from_gcps(&[GroundControlPoint::new(0.0, 0.0, 1.0, 1.0)]).is_none());

        let collinear = [
            GroundControlPoint::new(0.0, 0.0, 0.0, 0.0),
            GroundControlPoint::new(1.0, 1.0, 1.0, 1.0),
            GroundControlPoint::new(2.0, 2.0, 2.0, 2.0),
        ];
        assert!(geo_transform_from_gcps(&collinear).is_none());

        let same_line = [
            GroundControlPoint::new(0.0, 5.0, 0.0, 0.0),
            GroundControlPoint::new(9.0, 5.0, 1.0, 1.0),
        ];
        assert!(geo_transform_from_gcps(&same_line).is_none());
    }
}
