use std::collections::HashMap;

/// Sørensen–Dice similarity of two strings over character bigrams, scaled
/// to `0.0..=100.0`.
///
/// Whitespace is ignored and comparison is case-sensitive. Identical strings
/// score 100 even when they are too short to have bigrams.
///
/// # Examples
///
/// ```
/// use varstash_package::similarity;
///
/// assert_eq!(similarity("SceneA", "SceneA"), 100.0);
/// assert_eq!(similarity("SceneA", "Unrelated"), 0.0);
/// assert!(similarity("MyScene_preview", "MyScene") > 50.0);
/// ```
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().filter(|c| !c.is_whitespace()).collect();
    let b: Vec<char> = b.chars().filter(|c| !c.is_whitespace()).collect();
    if a == b {
        return 100.0;
    }
    if a.len() < 2 || b.len() < 2 {
        return 0.0;
    }

    let mut bigrams: HashMap<(char, char), usize> = HashMap::new();
    for pair in a.windows(2) {
        *bigrams.entry((pair[0], pair[1])).or_default() += 1;
    }
    let mut shared = 0usize;
    for pair in b.windows(2) {
        if let Some(count) = bigrams.get_mut(&(pair[0], pair[1]))
            && *count > 0
        {
            *count -= 1;
            shared += 1;
        }
    }
    (2 * shared) as f64 / (a.len() + b.len() - 2) as f64 * 100.0
}
