use std::collections::HashMap;

use super::{DiffMatchPatch, TextError, find_from, rfind_from};

impl DiffMatchPatch {
    /// Locate the best instance of `pattern` in `text` near `loc`.
    ///
    /// Returns `Ok(None)` when nothing scores under `match_threshold`.
    pub fn match_main(&self, text: &str, pattern: &str, loc: usize) -> Result<Option<usize>, TextError> {
        let text: Vec<char> = text.chars().collect();
        let pattern: Vec<char> = pattern.chars().collect();
        self.match_main_chars(&text, &pattern, loc)
    }

    pub(crate) fn match_main_chars(
        &self,
        text: &[char],
        pattern: &[char],
        loc: usize,
    ) -> Result<Option<usize>, TextError> {
        let loc = loc.min(text.len());
        if text == pattern {
            // Shortcut (potentially not guaranteed by the algorithm)
            Ok(Some(0))
        } else if text.is_empty() {
            Ok(None)
        } else if text.get(loc..loc + pattern.len()) == Some(pattern) {
            // Perfect match at the perfect spot.
            Ok(Some(loc))
        } else {
            self.match_bitap(text, pattern, loc)
        }
    }

    /// Bitap fuzzy search for `pattern` near `loc`.
    pub fn match_bitap(
        &self,
        text: &[char],
        pattern: &[char],
        loc: usize,
    ) -> Result<Option<usize>, TextError> {
        let max_bits = self.match_max_bits.min(u32::BITS as usize);
        if pattern.len() > max_bits {
            return Err(TextError::PatternTooLong {
                length: pattern.len(),
                max_bits,
            });
        }
        if pattern.is_empty() {
            return Ok(Some(loc));
        }

        let alphabet = match_alphabet(pattern);
        let loc_i = loc as isize;
        let score = |errors: usize, x: isize| -> f64 {
            let accuracy = errors as f64 / pattern.len() as f64;
            let proximity = (loc_i - x).unsigned_abs();
            if self.match_distance == 0 {
                return if proximity == 0 { accuracy } else { 1.0 };
            }
            accuracy + proximity as f64 / self.match_distance as f64
        };

        // Highest score beyond which we give up.
        let mut score_threshold = self.match_threshold;
        // Is there a nearby exact match? (speedup)
        if let Some(exact) = find_from(text, pattern, loc) {
            score_threshold = score_threshold.min(score(0, exact as isize));
            // What about in the other direction? (speedup)
            if let Some(exact) = rfind_from(text, pattern, loc + pattern.len()) {
                score_threshold = score_threshold.min(score(0, exact as isize));
            }
        }

        let match_mask: u32 = 1 << (pattern.len() - 1);
        let mut best_loc: Option<usize> = None;
        let mut bin_max = (pattern.len() + text.len()) as isize;
        let mut last_rd: Vec<u32> = Vec::new();

        for d in 0..pattern.len() {
            // Binary search for how far from `loc` we can stray at this error level.
            let mut bin_min: isize = 0;
            let mut bin_mid = bin_max;
            while bin_min < bin_mid {
                if score(d, loc_i + bin_mid) <= score_threshold {
                    bin_min = bin_mid;
                } else {
                    bin_max = bin_mid;
                }
                bin_mid = (bin_max - bin_min) / 2 + bin_min;
            }
            // Use the result from this iteration as the maximum for the next.
            bin_max = bin_mid;
            let mut start = (loc_i - bin_mid + 1).max(1) as usize;
            let finish = ((loc_i + bin_mid).min(text.len() as isize) as usize) + pattern.len();

            let mut rd = vec![0u32; finish + 2];
            rd[finish + 1] = (1u32 << d) - 1;
            let mut j = finish;
            while j >= start {
                let char_match = text
                    .get(j - 1)
                    .and_then(|ch| alphabet.get(ch))
                    .copied()
                    .unwrap_or(0);
                rd[j] = if d == 0 {
                    // First pass: exact match.
                    ((rd[j + 1] << 1) | 1) & char_match
                } else {
                    // Subsequent passes: fuzzy match.
                    let prev = |at: usize| last_rd.get(at).copied().unwrap_or(0);
                    (((rd[j + 1] << 1) | 1) & char_match)
                        | (((prev(j + 1) | prev(j)) << 1) | 1)
                        | prev(j + 1)
                };
                if rd[j] & match_mask != 0 {
                    let candidate = score(d, j as isize - 1);
                    // This match will almost certainly be better than any existing match.
                    if candidate <= score_threshold {
                        score_threshold = candidate;
                        let found = j - 1;
                        best_loc = Some(found);
                        if found > loc {
                            // When passing loc, don't exceed our current distance from loc.
                            start = (2 * loc_i - found as isize).max(1) as usize;
                        } else {
                            // Already passed loc, downhill from here on in.
                            break;
                        }
                    }
                }
                j -= 1;
            }
            // No hope for a (better) match at greater error levels.
            if score(d + 1, loc_i) > score_threshold {
                break;
            }
            last_rd = rd;
        }
        Ok(best_loc)
    }
}

/// Bitmask of the positions each character occupies in `pattern`.
pub(crate) fn match_alphabet(pattern: &[char]) -> HashMap<char, u32> {
    let mut alphabet = HashMap::new();
    for (i, &ch) in pattern.iter().enumerate() {
        *alphabet.entry(ch).or_insert(0) |= 1u32 << (pattern.len() - i - 1);
    }
    alphabet
}
