//! Topology construction options and the zoom-level quantization policy.

/// Quantization applied when no zoom level is given, and for any zoom
/// level above 10.
pub const DEFAULT_QUANTIZATION: u32 = 10_000;

/// Set quantization (the maximum number of differentiable values along
/// each dimension) by map tile zoom level.
///
/// | Zoom level | Quantization |
/// |------------|--------------|
/// | <=6        | 400          |
/// | 7          | 700          |
/// | 8          | 1500         |
/// | 9          | 3000         |
/// | 10         | 5000         |
/// | >10        | 10000        |
pub fn quantization_for_zoom(zoom: i64) -> u32 {
    match zoom {
        i64::MIN..=6 => 400,
        7 => 700,
        8 => 1500,
        9 => 3000,
        10 => 5000,
        _ => DEFAULT_QUANTIZATION,
    }
}

/// Options for one topology construction, shared read-only by every file
/// in an upload session once all form fields are in.
#[derive(Debug, Clone)]
pub struct TopologyOptions {
    /// Grid resolution per dimension; always one of the fixed buckets, so
    /// simplification is never silently disabled by a zero value.
    pub quantization: u32,
    /// Projection expression, stored verbatim and never validated here.
    pub projection: Option<String>,
    /// Feature property to promote to geometry id.
    pub id_property: Option<String>,
    /// Properties to retain in output geometries.
    pub property_transform: Option<Vec<String>>,
    /// Emit construction diagnostics into the capture buffer.
    pub verbose: bool,
}

impl Default for TopologyOptions {
    fn default() -> Self {
        Self {
            quantization: DEFAULT_QUANTIZATION,
            projection: None,
            id_property: None,
            property_transform: None,
            verbose: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantization_buckets() {
        assert_eq!(quantization_for_zoom(0), 400);
        assert_eq!(quantization_for_zoom(6), 400);
        assert_eq!(quantization_for_zoom(7), 700);
        assert_eq!(quantization_for_zoom(8), 1500);
        assert_eq!(quantization_for_zoom(9), 3000);
        assert_eq!(quantization_for_zoom(10), 5000);
        assert_eq!(quantization_for_zoom(11), 10_000);
        assert_eq!(quantization_for_zoom(18), 10_000);
    }

    #[test]
    fn test_quantization_is_monotonic_in_zoom() {
        let mut last = 0;
        for zoom in -2..=12 {
            let q = quantization_for_zoom(zoom);
            assert!(q >= last, "quantization decreased at zoom {}", zoom);
            last = q;
        }
    }

    #[test]
    fn test_default_options_never_disable_quantization() {
        assert_ne!(TopologyOptions::default().quantization, 0);
    }
}
