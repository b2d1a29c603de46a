//! Collection selection strings: `1,3,5` or `1-11` or a mix.

/// Parses a selection against the configured ids. Unknown ids and malformed
/// parts are ignored; reversed ranges are accepted. Result is sorted and unique.
pub fn parse_selection(raw: &str, available: &[u32]) -> Vec<u32> {
    let mut selected: Vec<u32> = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        if let Some((a, b)) = part.split_once('-') {
            let (Ok(a), Ok(b)) = (a.trim().parse::<u32>(), b.trim().parse::<u32>()) else {
                continue;
            };
            let (lo, hi) = if a > b { (b, a) } else { (a, b) };
            selected.extend(available.iter().copied().filter(|n| (lo..=hi).contains(n)));
        } else if let Ok(n) = part.parse::<u32>() {
            if available.contains(&n) {
                selected.push(n);
            }
        }
    }
    selected.sort_unstable();
    selected.dedup();
    selected
}
