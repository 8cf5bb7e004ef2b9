use crate::lut::{Diagonal, Side, lookup_diagonal};

/// Sides sorted by descending stop count. Ties keep canonical side order.
pub fn order_by_stop_count(counts: [usize; 4]) -> [Side; 4] {
    let mut order = Side::ALL;
    // sort_by_key is stable
    order.sort_by_key(|s| std::cmp::Reverse(counts[s.index()]));
    order
}

/// Picks the active diagonal of a cell from the stop counts of its sides,
/// indexed by `Side::index`.
pub fn select_diagonal(counts: [usize; 4]) -> Diagonal {
    let order = order_by_stop_count(counts);
    match lookup_diagonal(order) {
        Some(d) => d,
        None => unreachable!("side ordering {order:?} is not a permutation"),
    }
}

/// `select_diagonal` from per-side stop lists.
pub fn select_diagonal_for(stops: [&[f64]; 4]) -> Diagonal {
    select_diagonal(stops.map(<[f64]>::len))
}
