//! Easing helpers for renderers animating between two activation snapshots

use crate::network::ActivationSnapshot;

/// Cubic ease-in-out over `t` in `[0, 1]`, values outside are clamped
pub fn ease_in_out_cubic(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

fn lerp(a: f64, b: f64, k: f64) -> f64 {
    a + (b - a) * k
}

/// Blends `before` into `after` at progress `t`, eased
pub fn interpolate(
    before: &ActivationSnapshot,
    after: &ActivationSnapshot,
    t: f64,
) -> ActivationSnapshot {
    let k = ease_in_out_cubic(t);
    ActivationSnapshot {
        net_hidden: [
            lerp(before.net_hidden[0], after.net_hidden[0], k),
            lerp(before.net_hidden[1], after.net_hidden[1], k),
        ],
        hidden: [
            lerp(before.hidden[0], after.hidden[0], k),
            lerp(before.hidden[1], after.hidden[1], k),
        ],
        net_output: lerp(before.net_output, after.net_output, k),
        output: lerp(before.output, after.output, k),
    }
}

/// `n` evenly spaced frames from `before` to `after`, both ends included
pub fn frames(
    before: &ActivationSnapshot,
    after: &ActivationSnapshot,
    n: usize,
) -> Vec<ActivationSnapshot> {
    match n {
        0 => vec![],
        1 => vec![*after],
        _ => (0..n)
            .map(|i| interpolate(before, after, i as f64 / (n - 1) as f64))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_close;

    #[test]
    fn test_ease_in_out_cubic() {
        assert_eq!(ease_in_out_cubic(0.0), 0.0);
        assert_eq!(ease_in_out_cubic(0.5), 0.5);
        assert_eq!(ease_in_out_cubic(1.0), 1.0);
        assert_close!(ease_in_out_cubic(0.25), 0.0625);
        assert_close!(ease_in_out_cubic(0.75), 0.9375);
        assert_eq!(ease_in_out_cubic(-3.0), 0.0);
        assert_eq!(ease_in_out_cubic(7.0), 1.0);
    }

    #[test]
    fn test_interpolate_endpoints() {
        let before = ActivationSnapshot::default();
        let after = ActivationSnapshot {
            net_hidden: [0.5, 0.3],
            hidden: [0.62, 0.57],
            net_output: 0.26,
            output: 0.56,
        };
        assert_eq!(interpolate(&before, &after, 0.0), before);
        assert_eq!(interpolate(&before, &after, 1.0), after);
        assert_close!(interpolate(&before, &after, 0.5).output, 0.28);
    }

    #[test]
    fn test_frames() {
        let before = ActivationSnapshot::default();
        let after = ActivationSnapshot {
            output: 1.0,
            ..Default::default()
        };
        let outputs: Vec<f64> = frames(&before, &after, 5).iter().map(|a| a.output).collect();
        assert_eq!(outputs.len(), 5);
        assert_eq!(outputs[0], 0.0);
        assert_eq!(outputs[4], 1.0);
        assert!(outputs.windows(2).all(|w| w[0] <= w[1]));
        assert!(frames(&before, &after, 0).is_empty());
        assert_eq!(frames(&before, &after, 1), vec![after]);
    }
}
