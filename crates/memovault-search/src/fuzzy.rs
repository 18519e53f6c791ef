//! Subsequence scoring for approximate keyword matches.
//!
//! Matching is always case-insensitive; both the text and the pattern are
//! lowercased before scoring. An exact substring hit scores [`EXACT_SCORE`]
//! outright. Otherwise the pattern is matched as an in-order character
//! subsequence: each hit earns a base award plus a bonus that grows with the
//! current run of consecutive hits, an incomplete pattern scales the score by
//! the matched fraction, and a first hit deep into the text decays the score
//! by up to 30%.

/// Score of an exact substring match.
pub const EXACT_SCORE: f32 = 1000.0;

/// Minimum score for a fuzzy hit to count as a match at all.
pub const FUZZY_SCORE_FLOOR: f32 = 50.0;

const BASE_AWARD: f32 = 10.0;
const STREAK_BONUS: f32 = 5.0;
const POSITION_DECAY: f32 = 0.3;

/// Outcome of scoring one pattern against one text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuzzyOutcome {
    /// Accumulated score; zero when nothing matched.
    pub score: f32,
    /// Character index of the first matched character, when any matched.
    pub match_index: Option<usize>,
}

/// Score `pattern` against `text`.
///
/// An empty pattern scores zero. Exact containment short-circuits to
/// [`EXACT_SCORE`] with the index of the hit; otherwise the subsequence walk
/// applies the streak, completeness, and position adjustments in that order.
pub fn fuzzy_match(text: &str, pattern: &str) -> FuzzyOutcome {
    if pattern.is_empty() {
        return FuzzyOutcome {
            score: 0.0,
            match_index: None,
        };
    }

    let text_lower = text.to_lowercase();
    let pattern_lower = pattern.to_lowercase();

    if let Some(byte_idx) = text_lower.find(&pattern_lower) {
        return FuzzyOutcome {
            score: EXACT_SCORE,
            match_index: Some(text_lower[..byte_idx].chars().count()),
        };
    }

    let text_chars: Vec<char> = text_lower.chars().collect();
    let pattern_chars: Vec<char> = pattern_lower.chars().collect();

    let mut score = 0.0f32;
    let mut streak = 0u32;
    let mut match_index = None;
    let mut pi = 0usize;

    for (ti, &ch) in text_chars.iter().enumerate() {
        if pi < pattern_chars.len() && ch == pattern_chars[pi] {
            if match_index.is_none() {
                match_index = Some(ti);
            }
            score += BASE_AWARD + streak as f32 * STREAK_BONUS;
            streak += 1;
            pi += 1;
        } else {
            streak = 0;
        }
    }

    if pi < pattern_chars.len() {
        score *= pi as f32 / pattern_chars.len() as f32;
    }
    if let Some(idx) = match_index {
        score *= 1.0 - idx as f32 / text_chars.len() as f32 * POSITION_DECAY;
    }

    FuzzyOutcome { score, match_index }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_empty_pattern_scores_zero() {
        let outcome = fuzzy_match("anything", "");
        assert_eq!(outcome.score, 0.0);
        assert_eq!(outcome.match_index, None);
    }

    #[test]
    fn test_exact_substring_scores_exact() {
        let outcome = fuzzy_match("meeting notes", "notes");
        assert_eq!(outcome.score, EXACT_SCORE);
        assert_eq!(outcome.match_index, Some(8));
    }

    #[test]
    fn test_exact_match_is_case_insensitive() {
        let outcome = fuzzy_match("Meeting NOTES", "notes");
        assert_eq!(outcome.score, EXACT_SCORE);
        assert_eq!(outcome.match_index, Some(8));
    }

    #[test]
    fn test_scattered_subsequence_earns_base_awards() {
        // a, b, c hit with gaps between them, so no streak bonus applies.
        let outcome = fuzzy_match("axbxc", "abc");
        assert!(close(outcome.score, 30.0));
        assert_eq!(outcome.match_index, Some(0));
    }

    #[test]
    fn test_consecutive_hits_earn_streak_bonus() {
        // "abc" run at index 1: 10 + 15 + 20 = 45, decayed for the late
        // start by 1 - 1/4 * 0.3.
        let outcome = fuzzy_match("xabc", "abc");
        assert!(close(outcome.score, 45.0 * 0.925));
        assert_eq!(outcome.match_index, Some(1));
    }

    #[test]
    fn test_incomplete_pattern_scales_by_matched_fraction() {
        // Two of three pattern characters hit: (10 + 15) * 2/3.
        let outcome = fuzzy_match("ab", "abz");
        assert!(close(outcome.score, 25.0 * 2.0 / 3.0));
        assert_eq!(outcome.match_index, Some(0));
    }

    #[test]
    fn test_no_hit_scores_zero() {
        let outcome = fuzzy_match("abc", "xyz");
        assert_eq!(outcome.score, 0.0);
        assert_eq!(outcome.match_index, None);
    }

    #[test]
    fn test_exact_outranks_any_subsequence() {
        let exact = fuzzy_match("project plan", "plan");
        let scattered = fuzzy_match("p l a n spread wide", "plan");
        assert!(exact.score > scattered.score);
    }

    #[test]
    fn test_earlier_first_hit_outscores_later_one() {
        // Same hits and streaks, different starting offsets.
        let early = fuzzy_match("abcxxxxxxx", "abq");
        let late = fuzzy_match("xxxxxxxabc", "abq");
        assert!(early.score > late.score);
    }

    #[test]
    fn test_match_index_counts_characters_not_bytes() {
        let outcome = fuzzy_match("日本語 notes", "notes");
        assert_eq!(outcome.score, EXACT_SCORE);
        assert_eq!(outcome.match_index, Some(4));
    }

    #[test]
    fn test_floor_separates_weak_and_strong_hits() {
        // A short scattered hit stays under the floor; long consecutive
        // runs clear it without being exact.
        let weak = fuzzy_match("zzazzbzz", "ab");
        assert!(weak.score <= FUZZY_SCORE_FLOOR);

        let strong = fuzzy_match("sanztorin", "santorin");
        assert!(strong.score < EXACT_SCORE);
        assert!(strong.score > FUZZY_SCORE_FLOOR);
    }
}
