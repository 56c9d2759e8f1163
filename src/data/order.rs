/// Canonical age-group order used by every age-keyed chart.
/// The all-ages bucket `00+` deliberately sorts last.
pub const CANONICAL_AGE_ORDER: [&str; 9] = [
    "0-4", "5-9", "10-14", "15-19", "20-39", "40-59", "60-79", "80+", "00+",
];

/// Syndromes from most to least severe.
pub const SYNDROME_ORDER: [&str; 3] = ["SARI", "ARI", "ILI"];

/// Position of an age group in [`CANONICAL_AGE_ORDER`].
pub fn age_rank(age_group: &str) -> Option<usize> {
    CANONICAL_AGE_ORDER.iter().position(|g| *g == age_group)
}

/// Position of a syndrome in [`SYNDROME_ORDER`].
pub fn syndrome_rank(syndrome: &str) -> Option<usize> {
    SYNDROME_ORDER.iter().position(|s| *s == syndrome)
}

/// Reorder `items` into canonical age order.
///
/// Only groups actually present are kept; canonical groups missing from
/// `items` are skipped, never padded. Items whose age group is not in the
/// canonical list are dropped.
pub fn reorder_by_age<T>(items: Vec<T>, age_group: impl Fn(&T) -> &str) -> Vec<T> {
    let mut ranked: Vec<(usize, T)> = items
        .into_iter()
        .filter_map(|item| {
            let Some(rank) = age_rank(age_group(&item)) else {
                log::debug!("omitting age group '{}' outside canonical order", age_group(&item));
                return None;
            };
            Some((rank, item))
        })
        .collect();
    ranked.sort_by_key(|(rank, _)| *rank);
    ranked.into_iter().map(|(_, item)| item).collect()
}

/// Sort age-group labels canonically; unknown labels follow in their given order.
pub fn sort_age_labels(labels: &mut [String]) {
    labels.sort_by_key(|g| age_rank(g).unwrap_or(usize::MAX));
}
