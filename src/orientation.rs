use crate::geometry::round_to_decimals;
use crate::ordering::OrderedStack;

/// Reverse a flattened 3x3 direction matrix into (z, y, x) axis order.
fn reversed_direction(direction: &[[f64; 3]; 3]) -> [[f64; 3]; 3] {
    let mut flat = [0.0; 9];
    for (i, row) in direction.iter().enumerate() {
        flat[i * 3..(i + 1) * 3].copy_from_slice(row);
    }
    flat.reverse();

    let mut reversed = [[0.0; 3]; 3];
    for (i, row) in reversed.iter_mut().enumerate() {
        row.copy_from_slice(&flat[i * 3..(i + 1) * 3]);
    }
    reversed
}

/// Derive the canonical orientation matrix for an ordered stack.
///
/// In-plane rows come from the first slice's direction metadata. The z row
/// is recomputed from measured slice positions: per-slice direction
/// metadata does not encode the true inter-slice displacement once slices
/// are reordered or irregularly spaced. The smallest consecutive delta per
/// axis is used, so a leading irregular gap cannot skew the result.
///
/// A single-slice stack has no positional deltas; its reversed direction
/// matrix is returned verbatim.
pub fn resolve_orientation(stack: &OrderedStack, decimals: i32) -> [[f64; 3]; 3] {
    let mut orientation = reversed_direction(&stack.slices[0].direction);
    if stack.positions.len() < 2 {
        return orientation;
    }

    let min_delta = |axis: usize| {
        stack
            .positions
            .windows(2)
            .map(|pair| pair[1][axis] - pair[0][axis])
            .fold(f64::INFINITY, f64::min)
    };

    orientation[0] = [
        round_to_decimals(min_delta(0), decimals) / stack.slice_spacing,
        round_to_decimals(min_delta(1), decimals) / stack.slice_spacing,
        round_to_decimals(min_delta(2), decimals) / stack.slice_spacing,
    ];
    orientation
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::CollectingSink;
    use crate::geometry::AssemblyConfig;
    use crate::ordering::order_slices;
    use crate::slice::SliceMetadata;
    use ndarray::Array2;

    const IDENTITY: [[f64; 3]; 3] = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

    fn slice_at(z: f64, index: usize) -> SliceMetadata {
        SliceMetadata {
            origin: [0.0, 0.0, z],
            spacing: [1.0, 1.0, 1.0],
            direction: IDENTITY,
            pixel_array: Array2::zeros((2, 2)),
            original_index: index,
        }
    }

    fn ordered(slices: Vec<SliceMetadata>) -> OrderedStack {
        let mut sink = CollectingSink::default();
        order_slices(slices, &AssemblyConfig::default(), &mut sink)
    }

    #[test]
    fn test_reversal_maps_source_order_to_canonical() {
        // Values 1..=9 laid out row-major; full reversal flips both axes.
        let source = [[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]];
        let reversed = reversed_direction(&source);
        assert_eq!(
            reversed,
            [[9.0, 8.0, 7.0], [6.0, 5.0, 4.0], [3.0, 2.0, 1.0]]
        );
    }

    #[test]
    fn test_identity_stack_resolves_to_identity() {
        let stack = ordered(vec![slice_at(0.0, 0), slice_at(1.0, 1), slice_at(2.0, 2)]);
        assert_eq!(resolve_orientation(&stack, 5), IDENTITY);
    }

    #[test]
    fn test_z_row_uses_smallest_delta() {
        // A missing slice leaves a double gap; the z row must come from the
        // unit gap, not the outlier.
        let stack = ordered(vec![slice_at(0.0, 0), slice_at(2.0, 1), slice_at(3.0, 2)]);
        let orientation = resolve_orientation(&stack, 5);
        assert_eq!(orientation[0], [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let stack = ordered(vec![slice_at(2.0, 0), slice_at(0.0, 1), slice_at(1.0, 2)]);
        let first = resolve_orientation(&stack, 5);

        let restack = ordered(stack.slices.clone());
        let second = resolve_orientation(&restack, 5);
        assert_eq!(first, second);
    }

    #[test]
    fn test_single_slice_keeps_direction_metadata() {
        let mut slice = slice_at(0.0, 0);
        slice.direction = [[0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]];
        let expected = reversed_direction(&slice.direction);

        let stack = ordered(vec![slice]);
        assert_eq!(resolve_orientation(&stack, 5), expected);
    }
}
