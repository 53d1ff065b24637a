//! Order-preserving set algebra over identifier sequences.
//!
//! Shared by the reducer, the sync engine and the view resolver.

use std::collections::HashSet;

/// Items of `a` in order, then items of `b` not already seen, without duplicates.
pub fn union<A, B>(a: &[A], b: &[B]) -> Vec<String>
where
    A: AsRef<str>,
    B: AsRef<str>,
{
    let mut seen = HashSet::with_capacity(a.len() + b.len());
    a.iter()
        .map(AsRef::<str>::as_ref)
        .chain(b.iter().map(AsRef::<str>::as_ref))
        .filter(|id| seen.insert(*id))
        .map(str::to_string)
        .collect()
}

/// Items of `a` that are not in `b`, in `a`'s order.
pub fn difference<A, B>(a: &[A], b: &[B]) -> Vec<String>
where
    A: AsRef<str>,
    B: AsRef<str>,
{
    let doomed: HashSet<&str> = b.iter().map(AsRef::<str>::as_ref).collect();
    a.iter()
        .map(AsRef::<str>::as_ref)
        .filter(|id| !doomed.contains(id))
        .map(str::to_string)
        .collect()
}

/// `a` without duplicates, keeping first occurrences.
pub fn uniq<A: AsRef<str>>(a: &[A]) -> Vec<String> {
    union::<A, &str>(a, &[])
}
