//! Protocol fees accrued by pools between two fee settling events.
//!
//! Older stable and weighted pools pay the protocol in a single token, the
//! one holding the largest balance or weight respectively, which mirrors the
//! shortcut the deployed contracts take. Newer pools instead mint pool shares
//! to the protocol; those calculators return the ownership percentage and the
//! share amount it translates to.

use crate::fixed_point::Bfp;

pub mod composable_stable;
pub mod stable;
pub mod weighted;

/// Index of the largest value, preferring the lowest index on ties.
pub fn index_of_max(values: &[Bfp]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, &Bfp)>, (index, value)| match best {
            Some((_, max)) if max >= value => best,
            _ => Some((index, value)),
        })
        .map(|(index, _)| index)
}
