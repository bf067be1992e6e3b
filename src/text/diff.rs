use std::{collections::HashMap, time::Instant};

use super::{Diff, DiffMatchPatch, Operation, TextError, find, find_from, uri};

/// Result of the half-match heuristic: both texts split around a shared middle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HalfMatch {
    pub text1_a: Vec<char>,
    pub text1_b: Vec<char>,
    pub text2_a: Vec<char>,
    pub text2_b: Vec<char>,
    pub mid_common: Vec<char>,
}

/// Texts encoded one line per char, with the table to decode them again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineEncoding {
    pub chars1: Vec<char>,
    pub chars2: Vec<char>,
    pub lines: Vec<Vec<char>>,
}

impl DiffMatchPatch {
    /// Diff two texts. `checklines` enables the line-level speedup for large inputs.
    pub fn diff_main(&self, text1: &str, text2: &str, checklines: bool) -> Vec<Diff> {
        let text1: Vec<char> = text1.chars().collect();
        let text2: Vec<char> = text2.chars().collect();
        self.diff_main_chars(&text1, &text2, checklines, self.deadline())
    }

    pub(crate) fn diff_main_chars(
        &self,
        text1: &[char],
        text2: &[char],
        checklines: bool,
        deadline: Option<Instant>,
    ) -> Vec<Diff> {
        if text1 == text2 {
            return if text1.is_empty() {
                Vec::new()
            } else {
                vec![Diff::from_chars(Operation::Equal, text1)]
            };
        }

        let prefix_len = diff_common_prefix(text1, text2);
        let prefix = &text1[..prefix_len];
        let text1 = &text1[prefix_len..];
        let text2 = &text2[prefix_len..];

        let suffix_len = diff_common_suffix(text1, text2);
        let suffix = &text1[text1.len() - suffix_len..];
        let text1 = &text1[..text1.len() - suffix_len];
        let text2 = &text2[..text2.len() - suffix_len];

        let mut diffs = self.diff_compute(text1, text2, checklines, deadline);
        if !prefix.is_empty() {
            diffs.insert(0, Diff::from_chars(Operation::Equal, prefix));
        }
        if !suffix.is_empty() {
            diffs.push(Diff::from_chars(Operation::Equal, suffix));
        }
        self.diff_cleanup_merge(&mut diffs);
        diffs
    }

    /// Diff two texts that share no common prefix or suffix.
    fn diff_compute(
        &self,
        text1: &[char],
        text2: &[char],
        checklines: bool,
        deadline: Option<Instant>,
    ) -> Vec<Diff> {
        if text1.is_empty() {
            return vec![Diff::from_chars(Operation::Insert, text2)];
        }
        if text2.is_empty() {
            return vec![Diff::from_chars(Operation::Delete, text1)];
        }

        let (long, short) = if text1.len() > text2.len() {
            (text1, text2)
        } else {
            (text2, text1)
        };
        if let Some(i) = find(long, short) {
            let op = if text1.len() > text2.len() {
                Operation::Delete
            } else {
                Operation::Insert
            };
            return vec![
                Diff::from_chars(op, &long[..i]),
                Diff::from_chars(Operation::Equal, short),
                Diff::from_chars(op, &long[i + short.len()..]),
            ];
        }

        if short.len() == 1 {
            // After the containment check a single char cannot be an equality.
            return vec![
                Diff::from_chars(Operation::Delete, text1),
                Diff::from_chars(Operation::Insert, text2),
            ];
        }

        if let Some(hm) = self.diff_half_match(text1, text2) {
            let mut diffs = self.diff_main_chars(&hm.text1_a, &hm.text2_a, checklines, deadline);
            diffs.push(Diff::from_chars(Operation::Equal, hm.mid_common));
            diffs.extend(self.diff_main_chars(&hm.text1_b, &hm.text2_b, checklines, deadline));
            return diffs;
        }

        if checklines && text1.len() > 100 && text2.len() > 100 {
            return self.diff_line_mode(text1, text2, deadline);
        }

        self.diff_bisect_chars(text1, text2, deadline)
    }

    /// Quick line-level diff, then rediff the changed runs char by char.
    fn diff_line_mode(&self, text1: &[char], text2: &[char], deadline: Option<Instant>) -> Vec<Diff> {
        let encoded = diff_lines_to_chars(text1, text2);
        let mut diffs = self.diff_main_chars(&encoded.chars1, &encoded.chars2, false, deadline);
        diff_chars_to_lines(&mut diffs, &encoded.lines);
        self.diff_cleanup_semantic(&mut diffs);

        // Sentinel so the trailing run gets flushed.
        diffs.push(Diff::from_chars(Operation::Equal, Vec::new()));
        let mut pointer = 0;
        let mut count_delete = 0;
        let mut count_insert = 0;
        let mut text_delete: Vec<char> = Vec::new();
        let mut text_insert: Vec<char> = Vec::new();
        while pointer < diffs.len() {
            match diffs[pointer].op {
                Operation::Insert => {
                    count_insert += 1;
                    text_insert.extend_from_slice(&diffs[pointer].text);
                }
                Operation::Delete => {
                    count_delete += 1;
                    text_delete.extend_from_slice(&diffs[pointer].text);
                }
                Operation::Equal => {
                    if count_delete >= 1 && count_insert >= 1 {
                        let start = pointer - count_delete - count_insert;
                        let sub = self.diff_main_chars(&text_delete, &text_insert, false, deadline);
                        let sub_len = sub.len();
                        diffs.splice(start..pointer, sub);
                        pointer = start + sub_len;
                    }
                    count_insert = 0;
                    count_delete = 0;
                    text_delete.clear();
                    text_insert.clear();
                }
            }
            pointer += 1;
        }
        diffs.pop();
        diffs
    }

    /// Find the middle snake of a diff, split the problem in two and return
    /// the recursively constructed diff.
    pub fn diff_bisect(&self, text1: &str, text2: &str, deadline: Option<Instant>) -> Vec<Diff> {
        let text1: Vec<char> = text1.chars().collect();
        let text2: Vec<char> = text2.chars().collect();
        self.diff_bisect_chars(&text1, &text2, deadline)
    }

    fn diff_bisect_chars(&self, text1: &[char], text2: &[char], deadline: Option<Instant>) -> Vec<Diff> {
        let text1_length = text1.len() as isize;
        let text2_length = text2.len() as isize;
        let max_d = (text1_length + text2_length + 1) / 2;
        let v_offset = max_d;
        let v_length = 2 * max_d;
        // Two spare slots keep the k = d + 1 lookups in bounds for tiny inputs.
        let mut v1: Vec<isize> = vec![-1; v_length as usize + 2];
        let mut v2: Vec<isize> = vec![-1; v_length as usize + 2];
        v1[(v_offset + 1) as usize] = 0;
        v2[(v_offset + 1) as usize] = 0;
        let delta = text1_length - text2_length;
        // If the total number of characters is odd, the front path collides
        // with the reverse path.
        let front = delta % 2 != 0;
        let mut k1start = 0;
        let mut k1end = 0;
        let mut k2start = 0;
        let mut k2end = 0;

        for d in 0..max_d {
            if deadline.is_some_and(|deadline| Instant::now() > deadline) {
                break;
            }

            let mut k1 = -d + k1start;
            while k1 <= d - k1end {
                let k1_offset = (v_offset + k1) as usize;
                let mut x1 = if k1 == -d || (k1 != d && v1[k1_offset - 1] < v1[k1_offset + 1]) {
                    v1[k1_offset + 1]
                } else {
                    v1[k1_offset - 1] + 1
                };
                let mut y1 = x1 - k1;
                while x1 < text1_length
                    && y1 < text2_length
                    && text1[x1 as usize] == text2[y1 as usize]
                {
                    x1 += 1;
                    y1 += 1;
                }
                v1[k1_offset] = x1;
                if x1 > text1_length {
                    // Ran off the right of the graph.
                    k1end += 2;
                } else if y1 > text2_length {
                    // Ran off the bottom of the graph.
                    k1start += 2;
                } else if front {
                    let k2_offset = v_offset + delta - k1;
                    if k2_offset >= 0 && k2_offset < v_length && v2[k2_offset as usize] != -1 {
                        let x2 = text1_length - v2[k2_offset as usize];
                        if x1 >= x2 {
                            return self.diff_bisect_split(
                                text1,
                                text2,
                                x1 as usize,
                                y1 as usize,
                                deadline,
                            );
                        }
                    }
                }
                k1 += 2;
            }

            let mut k2 = -d + k2start;
            while k2 <= d - k2end {
                let k2_offset = (v_offset + k2) as usize;
                let mut x2 = if k2 == -d || (k2 != d && v2[k2_offset - 1] < v2[k2_offset + 1]) {
                    v2[k2_offset + 1]
                } else {
                    v2[k2_offset - 1] + 1
                };
                let mut y2 = x2 - k2;
                while x2 < text1_length
                    && y2 < text2_length
                    && text1[(text1_length - x2 - 1) as usize]
                        == text2[(text2_length - y2 - 1) as usize]
                {
                    x2 += 1;
                    y2 += 1;
                }
                v2[k2_offset] = x2;
                if x2 > text1_length {
                    k2end += 2;
                } else if y2 > text2_length {
                    k2start += 2;
                } else if !front {
                    let k1_offset = v_offset + delta - k2;
                    if k1_offset >= 0 && k1_offset < v_length && v1[k1_offset as usize] != -1 {
                        let x1 = v1[k1_offset as usize];
                        let y1 = v_offset + x1 - k1_offset;
                        // Mirror x2 onto top-left coordinate system.
                        let x2 = text1_length - x2;
                        if x1 >= x2 {
                            return self.diff_bisect_split(
                                text1,
                                text2,
                                x1 as usize,
                                y1 as usize,
                                deadline,
                            );
                        }
                    }
                }
                k2 += 2;
            }
        }

        // Out of time, or no commonality at all.
        vec![
            Diff::from_chars(Operation::Delete, text1),
            Diff::from_chars(Operation::Insert, text2),
        ]
    }

    fn diff_bisect_split(
        &self,
        text1: &[char],
        text2: &[char],
        x: usize,
        y: usize,
        deadline: Option<Instant>,
    ) -> Vec<Diff> {
        let mut diffs = self.diff_main_chars(&text1[..x], &text2[..y], false, deadline);
        diffs.extend(self.diff_main_chars(&text1[x..], &text2[y..], false, deadline));
        diffs
    }

    /// Do the two texts share a substring at least half the length of the
    /// longer text? Trades optimality for speed, so disabled without a timeout.
    pub fn diff_half_match(&self, text1: &[char], text2: &[char]) -> Option<HalfMatch> {
        if self.diff_timeout.is_zero() {
            return None;
        }
        let (long, short) = if text1.len() > text2.len() {
            (text1, text2)
        } else {
            (text2, text1)
        };
        if long.len() < 4 || short.len() * 2 < long.len() {
            return None;
        }

        let hm1 = half_match_at(long, short, long.len().div_ceil(4));
        let hm2 = half_match_at(long, short, long.len().div_ceil(2));
        let hm = match (hm1, hm2) {
            (None, None) => return None,
            (Some(hm), None) | (None, Some(hm)) => hm,
            (Some(hm1), Some(hm2)) => {
                if hm1.mid_common.len() > hm2.mid_common.len() {
                    hm1
                } else {
                    hm2
                }
            }
        };

        if text1.len() > text2.len() {
            Some(hm)
        } else {
            Some(HalfMatch {
                text1_a: hm.text2_a,
                text1_b: hm.text2_b,
                text2_a: hm.text1_a,
                text2_b: hm.text1_b,
                mid_common: hm.mid_common,
            })
        }
    }

    /// Location in `text2` equivalent to `loc` in `text1`.
    pub fn diff_x_index(&self, diffs: &[Diff], loc: usize) -> usize {
        diff_x_index(diffs, loc)
    }

    /// Source text (all equalities and deletions).
    pub fn diff_text1(&self, diffs: &[Diff]) -> String {
        diff_text1(diffs).into_iter().collect()
    }

    /// Destination text (all equalities and insertions).
    pub fn diff_text2(&self, diffs: &[Diff]) -> String {
        diff_text2(diffs).into_iter().collect()
    }

    /// Number of inserted, deleted or substituted characters.
    pub fn diff_levenshtein(&self, diffs: &[Diff]) -> usize {
        diff_levenshtein(diffs)
    }

    /// Crush the diff into a tab-separated string describing the operations
    /// needed to turn text1 into text2, e.g. `=3\t-2\t+ing`.
    pub fn diff_to_delta(&self, diffs: &[Diff]) -> String {
        let tokens: Vec<String> = diffs
            .iter()
            .map(|diff| match diff.op {
                Operation::Insert => format!("+{}", uri::encode_uri(&diff.text())),
                Operation::Delete => format!("-{}", diff.text.len()),
                Operation::Equal => format!("={}", diff.text.len()),
            })
            .collect();
        tokens.join("\t").replace("%20", " ")
    }

    /// Rebuild the full diff from the source text and a delta.
    pub fn diff_from_delta(&self, text1: &str, delta: &str) -> Result<Vec<Diff>, TextError> {
        let source: Vec<char> = text1.chars().collect();
        let mut diffs = Vec::new();
        let mut pointer = 0usize;
        for token in delta.split('\t') {
            let mut chars = token.chars();
            let Some(sign) = chars.next() else {
                // Blank tokens are ok (from a trailing \t).
                continue;
            };
            let param = chars.as_str();
            match sign {
                '+' => {
                    let text = uri::decode_uri_in(param, "diff_fromDelta")?;
                    diffs.push(Diff::insert(&text));
                }
                '-' | '=' => {
                    let n: usize = param.parse().map_err(|_| TextError::InvalidDeltaNumber {
                        token: param.to_string(),
                    })?;
                    let end = pointer + n;
                    if end > source.len() {
                        return Err(TextError::DeltaLengthMismatch {
                            consumed: end,
                            expected: source.len(),
                        });
                    }
                    let op = if sign == '=' {
                        Operation::Equal
                    } else {
                        Operation::Delete
                    };
                    diffs.push(Diff::from_chars(op, &source[pointer..end]));
                    pointer = end;
                }
                _ => {
                    return Err(TextError::InvalidDiffDelta {
                        token: token.to_string(),
                    });
                }
            }
        }
        if pointer != source.len() {
            return Err(TextError::DeltaLengthMismatch {
                consumed: pointer,
                expected: source.len(),
            });
        }
        Ok(diffs)
    }
}

/// Does a substring of `short` exist within `long` such that it is at least
/// half the length of `long`, seeded by the quarter of `long` starting at `i`?
fn half_match_at(long: &[char], short: &[char], i: usize) -> Option<HalfMatch> {
    let seed = &long[i..i + long.len() / 4];
    let mut best_common: Vec<char> = Vec::new();
    let mut best = HalfMatch {
        text1_a: Vec::new(),
        text1_b: Vec::new(),
        text2_a: Vec::new(),
        text2_b: Vec::new(),
        mid_common: Vec::new(),
    };

    let mut next = find_from(short, seed, 0);
    while let Some(j) = next {
        let prefix_len = diff_common_prefix(&long[i..], &short[j..]);
        let suffix_len = diff_common_suffix(&long[..i], &short[..j]);
        if best_common.len() < suffix_len + prefix_len {
            best_common = short[j - suffix_len..j + prefix_len].to_vec();
            best.text1_a = long[..i - suffix_len].to_vec();
            best.text1_b = long[i + prefix_len..].to_vec();
            best.text2_a = short[..j - suffix_len].to_vec();
            best.text2_b = short[j + prefix_len..].to_vec();
        }
        next = find_from(short, seed, j + 1);
    }

    if best_common.len() * 2 >= long.len() {
        best.mid_common = best_common;
        Some(best)
    } else {
        None
    }
}

/// Length of the common prefix, found by binary search.
pub fn diff_common_prefix(text1: &[char], text2: &[char]) -> usize {
    if text1.is_empty() || text2.is_empty() || text1[0] != text2[0] {
        return 0;
    }
    let mut min = 0;
    let mut max = text1.len().min(text2.len());
    let mut mid = max;
    let mut start = 0;
    while min < mid {
        if text1[start..mid] == text2[start..mid] {
            min = mid;
            start = min;
        } else {
            max = mid;
        }
        mid = (max - min) / 2 + min;
    }
    mid
}

/// Length of the common suffix, found by binary search.
pub fn diff_common_suffix(text1: &[char], text2: &[char]) -> usize {
    let (n1, n2) = (text1.len(), text2.len());
    if n1 == 0 || n2 == 0 || text1[n1 - 1] != text2[n2 - 1] {
        return 0;
    }
    let mut min = 0;
    let mut max = n1.min(n2);
    let mut mid = max;
    let mut end = 0;
    while min < mid {
        if text1[n1 - mid..n1 - end] == text2[n2 - mid..n2 - end] {
            min = mid;
            end = min;
        } else {
            max = mid;
        }
        mid = (max - min) / 2 + min;
    }
    mid
}

/// Length of the longest suffix of `text1` that is a prefix of `text2`.
pub fn diff_common_overlap(text1: &[char], text2: &[char]) -> usize {
    let (n1, n2) = (text1.len(), text2.len());
    if n1 == 0 || n2 == 0 {
        return 0;
    }
    let text1 = if n1 > n2 { &text1[n1 - n2..] } else { text1 };
    let text2 = if n1 < n2 { &text2[..n1] } else { text2 };
    let text_length = n1.min(n2);
    if text1 == text2 {
        return text_length;
    }

    // Grow a candidate overlap one match at a time.
    let mut best = 0;
    let mut length = 1;
    loop {
        let pattern = &text1[text_length - length..];
        let Some(found) = find(text2, pattern) else {
            return best;
        };
        length += found;
        if found == 0 || text1[text_length - length..] == text2[..length] {
            best = length;
            length += 1;
        }
    }
}

/// Encode both texts as one char per unique line.
pub fn diff_lines_to_chars(text1: &[char], text2: &[char]) -> LineEncoding {
    // Index 0 is reserved so no line is ever encoded as '\0'.
    let mut lines: Vec<Vec<char>> = vec![Vec::new()];
    let mut hash: HashMap<Vec<char>, usize> = HashMap::new();
    let chars1 = lines_to_chars_munge(text1, &mut lines, &mut hash, 40_000);
    let chars2 = lines_to_chars_munge(text2, &mut lines, &mut hash, 65_535);
    LineEncoding {
        chars1,
        chars2,
        lines,
    }
}

fn lines_to_chars_munge(
    text: &[char],
    lines: &mut Vec<Vec<char>>,
    hash: &mut HashMap<Vec<char>, usize>,
    max_lines: usize,
) -> Vec<char> {
    let mut chars = Vec::new();
    let mut line_start = 0;
    while line_start < text.len() {
        let mut line_end = find_from(text, &['\n'], line_start).unwrap_or(text.len() - 1);
        let mut line = &text[line_start..=line_end];
        if let Some(&index) = hash.get(line) {
            chars.push(line_index_char(index));
        } else {
            if lines.len() == max_lines {
                // Bail out: the rest of the text becomes one final "line".
                line = &text[line_start..];
                line_end = text.len() - 1;
            }
            chars.push(line_index_char(lines.len()));
            hash.insert(line.to_vec(), lines.len());
            lines.push(line.to_vec());
        }
        line_start = line_end + 1;
    }
    chars
}

/// Map a line index onto a char, stepping over the surrogate range.
fn line_index_char(index: usize) -> char {
    let code = index as u32;
    let code = if code >= 0xD800 { code + 0x800 } else { code };
    char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER)
}

fn char_line_index(ch: char) -> usize {
    let code = ch as u32;
    if code >= 0xE000 {
        (code - 0x800) as usize
    } else {
        code as usize
    }
}

/// Rehydrate the text in a diff from line-encoded chars.
pub fn diff_chars_to_lines(diffs: &mut [Diff], lines: &[Vec<char>]) {
    for diff in diffs.iter_mut() {
        let mut text = Vec::new();
        for &ch in &diff.text {
            if let Some(line) = lines.get(char_line_index(ch)) {
                text.extend_from_slice(line);
            }
        }
        diff.text = text;
    }
}

pub fn diff_x_index(diffs: &[Diff], loc: usize) -> usize {
    let mut chars1 = 0;
    let mut chars2 = 0;
    let mut last_chars1 = 0;
    let mut last_chars2 = 0;
    let mut overshot = None;
    for diff in diffs {
        if diff.op != Operation::Insert {
            chars1 += diff.text.len();
        }
        if diff.op != Operation::Delete {
            chars2 += diff.text.len();
        }
        if chars1 > loc {
            overshot = Some(diff);
            break;
        }
        last_chars1 = chars1;
        last_chars2 = chars2;
    }
    if overshot.is_some_and(|diff| diff.op == Operation::Delete) {
        // The location was deleted.
        return last_chars2;
    }
    last_chars2 + (loc - last_chars1)
}

pub(crate) fn diff_text1(diffs: &[Diff]) -> Vec<char> {
    diffs
        .iter()
        .filter(|diff| diff.op != Operation::Insert)
        .flat_map(|diff| diff.text.iter().copied())
        .collect()
}

pub(crate) fn diff_text2(diffs: &[Diff]) -> Vec<char> {
    diffs
        .iter()
        .filter(|diff| diff.op != Operation::Delete)
        .flat_map(|diff| diff.text.iter().copied())
        .collect()
}

pub(crate) fn diff_levenshtein(diffs: &[Diff]) -> usize {
    let mut levenshtein = 0;
    let mut insertions = 0;
    let mut deletions = 0;
    for diff in diffs {
        match diff.op {
            Operation::Insert => insertions += diff.text.len(),
            Operation::Delete => deletions += diff.text.len(),
            Operation::Equal => {
                // A deletion and an insertion is one substitution.
                levenshtein += insertions.max(deletions);
                insertions = 0;
                deletions = 0;
            }
        }
    }
    levenshtein + insertions.max(deletions)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use assert2::{check, let_assert};

    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    fn unlimited() -> DiffMatchPatch {
        DiffMatchPatch {
            diff_timeout: Duration::ZERO,
            ..DiffMatchPatch::default()
        }
    }

    #[test]
    fn common_prefix_and_suffix() {
        check!(diff_common_prefix(&chars("abc"), &chars("xyz")) == 0);
        check!(diff_common_prefix(&chars("1234abcdef"), &chars("1234xyz")) == 4);
        check!(diff_common_prefix(&chars("1234"), &chars("1234xyz")) == 4);
        check!(diff_common_suffix(&chars("abc"), &chars("xyz")) == 0);
        check!(diff_common_suffix(&chars("abcdef1234"), &chars("xyz1234")) == 4);
        check!(diff_common_suffix(&chars("1234"), &chars("xyz1234")) == 4);
    }

    #[test]
    fn common_overlap() {
        check!(diff_common_overlap(&chars(""), &chars("abcd")) == 0);
        check!(diff_common_overlap(&chars("abc"), &chars("abcd")) == 3);
        check!(diff_common_overlap(&chars("123456"), &chars("abcd")) == 0);
        check!(diff_common_overlap(&chars("123456xxx"), &chars("xxxabcd")) == 3);
        check!(diff_common_overlap(&chars("fi"), &chars("\u{fb01}i")) == 0);
    }

    #[test]
    fn half_match_finds_shared_middle() {
        let dmp = DiffMatchPatch::default();
        check!(dmp.diff_half_match(&chars("1234567890"), &chars("abcdef")).is_none());
        check!(dmp.diff_half_match(&chars("12345"), &chars("23")).is_none());

        let_assert!(Some(hm) = dmp.diff_half_match(&chars("1234567890"), &chars("a345678z")));
        check!(hm.text1_a == chars("12"));
        check!(hm.text1_b == chars("90"));
        check!(hm.text2_a == chars("a"));
        check!(hm.text2_b == chars("z"));
        check!(hm.mid_common == chars("345678"));

        let_assert!(Some(hm) = dmp.diff_half_match(&chars("a345678z"), &chars("1234567890")));
        check!(hm.text1_a == chars("a"));
        check!(hm.text2_a == chars("12"));
        check!(hm.mid_common == chars("345678"));
    }

    #[test]
    fn half_match_is_disabled_without_timeout() {
        let dmp = unlimited();
        check!(
            dmp.diff_half_match(&chars("qHilloHelloHew"), &chars("xHelloHeHulloy"))
                .is_none()
        );
    }

    #[test]
    fn lines_to_chars_round_trip() {
        let text1 = chars("alpha\nbeta\nalpha\n");
        let text2 = chars("beta\nalpha\nbeta\n");
        let encoded = diff_lines_to_chars(&text1, &text2);
        check!(encoded.chars1 == vec!['\u{1}', '\u{2}', '\u{1}']);
        check!(encoded.chars2 == vec!['\u{2}', '\u{1}', '\u{2}']);
        check!(encoded.lines.len() == 3);

        let mut diffs = vec![
            Diff::from_chars(Operation::Equal, encoded.chars1.clone()),
            Diff::from_chars(Operation::Insert, encoded.chars2.clone()),
        ];
        diff_chars_to_lines(&mut diffs, &encoded.lines);
        check!(diffs[0].text == text1);
        check!(diffs[1].text == text2);
    }

    #[test]
    fn line_chars_skip_surrogates() {
        for index in [0, 1, 0xD7FF, 0xD800, 0xFFFF, 70_000] {
            check!(char_line_index(line_index_char(index)) == index);
        }
    }

    #[test]
    fn main_trivial_cases() {
        let dmp = unlimited();
        check!(dmp.diff_main("", "", false).is_empty());
        check!(dmp.diff_main("abc", "abc", false) == vec![Diff::equal("abc")]);
        check!(
            dmp.diff_main("abc", "ab123c", false)
                == vec![Diff::equal("ab"), Diff::insert("123"), Diff::equal("c")]
        );
        check!(
            dmp.diff_main("a123bc", "abc", false)
                == vec![Diff::equal("a"), Diff::delete("123"), Diff::equal("bc")]
        );
        check!(
            dmp.diff_main("abc", "a123b456c", false)
                == vec![
                    Diff::equal("a"),
                    Diff::insert("123"),
                    Diff::equal("b"),
                    Diff::insert("456"),
                    Diff::equal("c"),
                ]
        );
    }

    #[test]
    fn main_real_diffs() {
        let dmp = unlimited();
        check!(dmp.diff_main("a", "b", false) == vec![Diff::delete("a"), Diff::insert("b")]);
        check!(
            dmp.diff_main("Apples are a fruit.", "Bananas are also fruit.", false)
                == vec![
                    Diff::delete("Apple"),
                    Diff::insert("Banana"),
                    Diff::equal("s are a"),
                    Diff::insert("lso"),
                    Diff::equal(" fruit."),
                ]
        );
        check!(
            dmp.diff_main("1ayb2", "abxab", false)
                == vec![
                    Diff::delete("1"),
                    Diff::equal("a"),
                    Diff::delete("y"),
                    Diff::equal("b"),
                    Diff::delete("2"),
                    Diff::insert("xab"),
                ]
        );
        check!(
            dmp.diff_main("abcy", "xaxcxabc", false)
                == vec![Diff::insert("xaxcx"), Diff::equal("abc"), Diff::delete("y")]
        );
    }

    #[test]
    fn bisect_finds_middle_snake() {
        let dmp = DiffMatchPatch::default();
        check!(
            dmp.diff_bisect("cat", "map", None)
                == vec![
                    Diff::delete("c"),
                    Diff::insert("m"),
                    Diff::equal("a"),
                    Diff::delete("t"),
                    Diff::insert("p"),
                ]
        );
    }

    #[test]
    fn bisect_gives_up_past_the_deadline() {
        let dmp = DiffMatchPatch::default();
        let past = Instant::now() - Duration::from_secs(1);
        check!(
            dmp.diff_bisect("cat", "map", Some(past))
                == vec![Diff::delete("cat"), Diff::insert("map")]
        );
    }

    #[test]
    fn line_mode_matches_char_mode_output() {
        let dmp = unlimited();
        let a = "1234567890\n".repeat(13);
        let b = "abcdefghij\n".repeat(13);
        check!(dmp.diff_main(&a, &b, true) == dmp.diff_main(&a, &b, false));

        let a = "1234567890".repeat(13);
        let b = "abcdefghij".repeat(13);
        check!(dmp.diff_main(&a, &b, true) == dmp.diff_main(&a, &b, false));
    }

    #[test]
    fn line_mode_texts_still_rebuild() {
        let dmp = unlimited();
        let a = "1234567890\n1234567890\n1234567890\n".repeat(5) + "tail line differs\n";
        let b = "abcdefghij\n1234567890\n1234567890\n".repeat(5) + "tail line differs!\n";
        let diffs = dmp.diff_main(&a, &b, true);
        check!(dmp.diff_text1(&diffs) == a);
        check!(dmp.diff_text2(&diffs) == b);
    }

    #[test]
    fn x_index_translates_locations() {
        let diffs = vec![Diff::delete("a"), Diff::insert("1234"), Diff::equal("xyz")];
        check!(diff_x_index(&diffs, 2) == 5);
        let diffs = vec![Diff::equal("a"), Diff::delete("1234"), Diff::equal("xyz")];
        check!(diff_x_index(&diffs, 3) == 1);
    }

    #[test]
    fn levenshtein_counts_edits() {
        let diffs = vec![Diff::delete("abc"), Diff::insert("1234"), Diff::equal("xyz")];
        check!(diff_levenshtein(&diffs) == 4);
        let diffs = vec![Diff::equal("xyz"), Diff::delete("abc"), Diff::insert("1234")];
        check!(diff_levenshtein(&diffs) == 4);
        let diffs = vec![Diff::delete("abc"), Diff::equal("xyz"), Diff::insert("1234")];
        check!(diff_levenshtein(&diffs) == 7);
    }

    #[test]
    fn delta_round_trip() {
        let dmp = DiffMatchPatch::default();
        let diffs = vec![
            Diff::equal("jump"),
            Diff::delete("s"),
            Diff::insert("ed"),
            Diff::equal(" over "),
            Diff::delete("the"),
            Diff::insert("a"),
            Diff::equal(" lazy"),
            Diff::insert("old dog"),
        ];
        let text1 = dmp.diff_text1(&diffs);
        check!(text1 == "jumps over the lazy");

        let delta = dmp.diff_to_delta(&diffs);
        check!(delta == "=4\t-1\t+ed\t=6\t-3\t+a\t=5\t+old dog");
        let_assert!(Ok(decoded) = dmp.diff_from_delta(&text1, &delta));
        check!(decoded == diffs);
    }

    #[test]
    fn delta_rejects_bad_input() {
        let dmp = DiffMatchPatch::default();
        let_assert!(
            Err(TextError::DeltaLengthMismatch { .. }) =
                dmp.diff_from_delta("jumps over the lazyx", "=4\t-1\t+ed\t=6\t-3\t+a\t=5")
        );
        let_assert!(
            Err(TextError::DeltaLengthMismatch { .. }) = dmp.diff_from_delta("umps", "=5")
        );
        let_assert!(Err(TextError::IllegalEscape { .. }) = dmp.diff_from_delta("", "+%c3%xy"));
        let_assert!(Err(TextError::InvalidDiffDelta { .. }) = dmp.diff_from_delta("abc", "*3"));
    }
}
