//! Randomized fallback ordering
//!
//! Used only when the ranking lookup produced no usable order, so the list
//! is not shown in whatever incidental order the directory returned. The
//! random source is always passed in; tests use a seeded `StdRng`.

use rand::Rng;

/// Unbiased in-place Fisher-Yates shuffle
///
/// For `i` from `len - 1` down to `1`, draws `j` uniformly from `[0, i]`
/// and swaps `i` and `j`.
pub fn fisher_yates<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
}

/// Shuffle `items`, optionally pinning one entry to the front
///
/// If `pin` matches exactly one element, that element is moved to position
/// 0 and only the remaining elements are shuffled. With zero or several
/// matches the pin is ignored and the whole list is shuffled.
pub fn fallback_order<T, R, P>(mut items: Vec<T>, pin: Option<P>, rng: &mut R) -> Vec<T>
where
    R: Rng + ?Sized,
    P: Fn(&T) -> bool,
{
    let pinned_index = pin.and_then(|pred| {
        let mut matches = items.iter().enumerate().filter(|&(_, item)| pred(item));
        match (matches.next(), matches.next()) {
            (Some((index, _)), None) => Some(index),
            _ => None,
        }
    });

    match pinned_index {
        Some(index) => {
            let pinned = items.remove(index);
            items.insert(0, pinned);
            fisher_yates(&mut items[1..], rng);
        }
        None => fisher_yates(&mut items, rng),
    }

    items
}
