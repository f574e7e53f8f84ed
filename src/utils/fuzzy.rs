// Fuzzy matching for resource search and header suggestions

/// Calculate Levenshtein distance between two strings
/// Returns the minimum number of single-character edits (insertions, deletions, substitutions)
/// needed to transform one string into another
pub fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    let s1_chars: Vec<char> = s1.chars().collect();
    let s2_chars: Vec<char> = s2.chars().collect();
    let s1_len = s1_chars.len();
    let s2_len = s2_chars.len();

    if s1_len == 0 {
        return s2_len;
    }
    if s2_len == 0 {
        return s1_len;
    }

    // Two rolling rows are enough
    let mut prev: Vec<usize> = (0..=s2_len).collect();
    let mut curr = vec![0; s2_len + 1];

    for i in 1..=s1_len {
        curr[0] = i;
        for j in 1..=s2_len {
            let cost = if s1_chars[i - 1] == s2_chars[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1)                    // deletion
                .min(curr[j - 1] + 1)                  // insertion
                .min(prev[j - 1] + cost);              // substitution
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[s2_len]
}

/// Check if s2 is a substring of s1 (case-insensitive)
pub fn is_substring_match(s1: &str, s2: &str) -> bool {
    s1.to_lowercase().contains(&s2.to_lowercase())
}

/// Resource names containing `query` (case-insensitive); all names for an
/// empty query. Input order is kept.
pub fn filter_resource_names<'a>(resources: &'a [String], query: &str) -> Vec<&'a str> {
    let query = query.trim();
    resources
        .iter()
        .filter(|r| query.is_empty() || is_substring_match(r, query))
        .map(String::as_str)
        .collect()
}

/// Find headers close to a header name that is not in the file
/// Returns up to 3 matches sorted by distance (closest first)
pub fn find_near_headers(search: &str, headers: &[String], max_distance: usize) -> Vec<(String, usize)> {
    let search_lower = search.to_lowercase();
    let mut matches: Vec<(String, usize)> = headers
        .iter()
        .filter_map(|header| {
            let distance = levenshtein_distance(&search_lower, &header.to_lowercase());
            if distance <= max_distance || is_substring_match(header, search) {
                Some((header.clone(), distance))
            } else {
                None
            }
        })
        .collect();

    matches.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
    matches.into_iter().take(3).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_distance() {
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
        assert_eq!(levenshtein_distance("", "abc"), 3);
        assert_eq!(levenshtein_distance("abc", ""), 3);
        assert_eq!(levenshtein_distance("", ""), 0);
        assert_eq!(levenshtein_distance("same", "same"), 0);
        assert_eq!(levenshtein_distance("Maszyna", "Maszyny"), 1);
    }

    #[test]
    fn test_is_substring_match() {
        assert!(is_substring_match("Maszyna A", "maszyna"));
        assert!(is_substring_match("Press 2", "PRESS"));
        assert!(!is_substring_match("Lathe", "press"));
    }

    #[test]
    fn test_filter_resource_names() {
        let resources = vec!["Lathe 1".to_string(), "Press A".to_string(), "Press B".to_string()];
        assert_eq!(filter_resource_names(&resources, "press"), vec!["Press A", "Press B"]);
        assert_eq!(filter_resource_names(&resources, "").len(), 3);
        assert!(filter_resource_names(&resources, "mill").is_empty());
    }

    #[test]
    fn test_find_near_headers() {
        let headers = vec![
            "Order No.".to_string(),
            "Resource".to_string(),
            "Start Time".to_string(),
        ];
        let matches = find_near_headers("Resorce", &headers, 2);
        assert_eq!(matches[0].0, "Resource");
        assert_eq!(matches[0].1, 1);

        assert!(find_near_headers("Quantity", &headers, 2).is_empty());
    }
}
