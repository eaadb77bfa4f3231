//! Smoothstep and the vertical opacity envelope

/// Hermite smoothstep of `x` between `edge0` and `edge1`, clamped to [0, 1]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    if edge1 <= edge0 {
        return if x < edge0 { 0.0 } else { 1.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Opacity as a pure function of vertical position and viewport height.
///
/// Zero above the viewport, fades in over the top `fade_in_band` fraction,
/// holds at `max_opacity`, fades out over the bottom `fade_out_band`
/// fraction. Depending on nothing but `y` and `height` keeps a mid-flight
/// resize from leaving a leaf half-faded.
pub fn opacity_envelope(
    y: f32,
    height: f32,
    fade_in_band: f32,
    fade_out_band: f32,
    max_opacity: f32,
) -> f32 {
    if !y.is_finite() || !height.is_finite() || height <= 0.0 {
        return 0.0;
    }
    let fade_in = smoothstep(0.0, fade_in_band.max(0.0) * height, y);
    let fade_out_start = height * (1.0 - fade_out_band.max(0.0));
    let fade_out = 1.0 - smoothstep(fade_out_start, height, y);
    let alpha = fade_in * fade_out * max_opacity;
    if alpha.is_finite() {
        alpha.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smoothstep_is_clamped() {
        assert_eq!(smoothstep(0.0, 1.0, -3.0), 0.0);
        assert_eq!(smoothstep(0.0, 1.0, 3.0), 1.0);
        assert!((smoothstep(0.0, 1.0, 0.5) - 0.5).abs() < 1e-6);
        // Zero-width band degrades to a step
        assert_eq!(smoothstep(2.0, 2.0, 1.0), 0.0);
        assert_eq!(smoothstep(2.0, 2.0, 2.0), 1.0);
    }

    #[test]
    fn envelope_shape() {
        let h = 800.0;
        assert_eq!(opacity_envelope(-50.0, h, 0.1, 0.15, 0.9), 0.0);
        assert!((opacity_envelope(400.0, h, 0.1, 0.15, 0.9) - 0.9).abs() < 1e-6);
        let near_top = opacity_envelope(20.0, h, 0.1, 0.15, 0.9);
        assert!(near_top > 0.0 && near_top < 0.9);
        assert_eq!(opacity_envelope(h + 10.0, h, 0.1, 0.15, 0.9), 0.0);
    }

    #[test]
    fn envelope_always_in_unit_range() {
        for i in -200..1200 {
            let y = i as f32;
            let a = opacity_envelope(y, 800.0, 0.1, 0.15, 1.5);
            assert!((0.0..=1.0).contains(&a), "y={y} alpha={a}");
        }
        assert_eq!(opacity_envelope(f32::NAN, 800.0, 0.1, 0.1, 1.0), 0.0);
        assert_eq!(opacity_envelope(10.0, 0.0, 0.1, 0.1, 1.0), 0.0);
    }
}
