use serde::{Deserialize, Serialize};

/// Rectangular numeric range covering two selected fields of a dataset.
///
/// All-zero bounds mean "no data", not a real zero-width range.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Bounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

/// Caller-supplied visible range used to clip trend lines.
pub type Viewport = Bounds;

impl Bounds {
    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    pub fn is_no_data(&self) -> bool {
        self.x_min == 0.0 && self.x_max == 0.0 && self.y_min == 0.0 && self.y_max == 0.0
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x_min && x <= self.x_max && y >= self.y_min && y <= self.y_max
    }

    /// Widen each axis by a fixed amount on both sides.
    pub fn padded(&self, x_pad: f64, y_pad: f64) -> Bounds {
        Bounds {
            x_min: self.x_min - x_pad,
            x_max: self.x_max + x_pad,
            y_min: self.y_min - y_pad,
            y_max: self.y_max + y_pad,
        }
    }

    pub fn x_domain(&self) -> (f64, f64) {
        (self.x_min, self.x_max)
    }

    pub fn y_domain(&self) -> (f64, f64) {
        (self.y_min, self.y_max)
    }
}

/// Min/max of two fields over records where both are finite.
///
/// Records where either selector yields `None` or a non-finite value are
/// skipped. Returns all-zero bounds when nothing remains.
pub fn data_bounds<T, X, Y>(data: &[T], x: X, y: Y) -> Bounds
where
    X: Fn(&T) -> Option<f64>,
    Y: Fn(&T) -> Option<f64>,
{
    let mut acc: Option<Bounds> = None;
    for (px, py) in data.iter().filter_map(|item| valid_pair(item, &x, &y)) {
        let b = acc.get_or_insert(Bounds::new(px, px, py, py));
        b.x_min = b.x_min.min(px);
        b.x_max = b.x_max.max(px);
        b.y_min = b.y_min.min(py);
        b.y_max = b.y_max.max(py);
    }
    acc.unwrap_or_default()
}

pub(crate) fn valid_pair<T, X, Y>(item: &T, x: &X, y: &Y) -> Option<(f64, f64)>
where
    X: Fn(&T) -> Option<f64>,
    Y: Fn(&T) -> Option<f64>,
{
    let px = x(item).filter(|v| v.is_finite())?;
    let py = y(item).filter(|v| v.is_finite())?;
    Some((px, py))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    type Row = (Option<f64>, Option<f64>);

    fn first(r: &Row) -> Option<f64> {
        r.0
    }

    fn second(r: &Row) -> Option<f64> {
        r.1
    }

    #[test]
    fn test_bounds_over_complete_rows() {
        let data: Vec<Row> = vec![
            (Some(3.0), Some(140.0)),
            (Some(1.5), Some(162.0)),
            (Some(4.2), Some(120.0)),
        ];
        let b = data_bounds(&data, first, second);
        assert_eq!(b, Bounds::new(1.5, 4.2, 120.0, 162.0));
        assert!(!b.is_no_data());
    }

    #[test]
    fn test_rows_missing_a_field_are_excluded() {
        let data: Vec<Row> = vec![
            (Some(10.0), None),
            (Some(2.0), Some(5.0)),
            (None, Some(-100.0)),
            (Some(f64::NAN), Some(1.0)),
            (Some(3.0), Some(f64::INFINITY)),
        ];
        let b = data_bounds(&data, first, second);
        assert_eq!(b, Bounds::new(2.0, 2.0, 5.0, 5.0));
    }

    #[test]
    fn test_empty_and_all_missing_give_zero_bounds() {
        let empty: Vec<Row> = Vec::new();
        assert!(data_bounds(&empty, first, second).is_no_data());

        let missing: Vec<Row> = vec![(None, Some(1.0)), (Some(1.0), None), (None, None)];
        let b = data_bounds(&missing, first, second);
        assert_eq!(b, Bounds::default());
        assert!(b.is_no_data());
    }

    #[test]
    fn test_padded_and_contains() {
        let b = Bounds::new(0.0, 10.0, 100.0, 180.0).padded(2.0, 5.0);
        assert_eq!(b, Bounds::new(-2.0, 12.0, 95.0, 185.0));
        assert!(b.contains(-2.0, 185.0));
        assert!(!b.contains(12.5, 150.0));
    }

    proptest! {
        #[test]
        fn prop_bounds_are_ordered(
            rows in prop::collection::vec(
                (prop::option::of(-1e6..1e6f64), prop::option::of(-1e6..1e6f64)),
                1..64,
            )
        ) {
            let b = data_bounds(&rows, first, second);
            prop_assert!(b.x_min <= b.x_max);
            prop_assert!(b.y_min <= b.y_max);
            for (x, y) in rows.iter().filter_map(|r| Some((r.0?, r.1?))) {
                prop_assert!(b.contains(x, y));
            }
        }

        #[test]
        fn prop_bounds_are_idempotent(
            rows in prop::collection::vec((prop::option::of(-1e3..1e3f64), prop::option::of(-1e3..1e3f64)), 0..32)
        ) {
            let a = data_bounds(&rows, first, second);
            let b = data_bounds(&rows, first, second);
            prop_assert_eq!(a.x_min.to_bits(), b.x_min.to_bits());
            prop_assert_eq!(a.x_max.to_bits(), b.x_max.to_bits());
            prop_assert_eq!(a.y_min.to_bits(), b.y_min.to_bits());
            prop_assert_eq!(a.y_max.to_bits(), b.y_max.to_bits());
        }
    }
}
