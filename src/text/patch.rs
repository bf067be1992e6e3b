use std::fmt;

use tracing::trace;

use super::{
    Diff, DiffMatchPatch, HunkRange, Operation, TextError,
    diff::{diff_levenshtein, diff_text1, diff_text2, diff_x_index},
    find, parse_hunk_header, rfind, substring,
    uri::{decode_uri_in, encode_uri},
};

/// One hunk of a text patch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Patch {
    pub diffs: Vec<Diff>,
    pub start1: usize,
    pub start2: usize,
    pub length1: usize,
    pub length2: usize,
}

impl fmt::Display for Patch {
    /// Unified-diff-like rendering with `encodeURI`-escaped bodies.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "@@ -{} +{} @@",
            HunkRange::from_bounds(self.start1, self.length1),
            HunkRange::from_bounds(self.start2, self.length2)
        )?;
        for diff in &self.diffs {
            let sign = match diff.op {
                Operation::Insert => '+',
                Operation::Delete => '-',
                Operation::Equal => ' ',
            };
            writeln!(f, "{sign}{}", encode_uri(&diff.text()).replace("%20", " "))?;
        }
        Ok(())
    }
}

/// The ways a set of patches can be computed.
#[derive(Debug, Clone, Copy)]
pub enum PatchInput<'a> {
    /// Diff the two texts first.
    Texts(&'a str, &'a str),
    /// Derive the source text from the diffs.
    Diffs(&'a [Diff]),
    /// Source text plus the diffs that transform it.
    TextDiffs(&'a str, &'a [Diff]),
}

impl DiffMatchPatch {
    pub fn patch_make(&self, input: PatchInput<'_>) -> Vec<Patch> {
        match input {
            PatchInput::Texts(text1, text2) => {
                let mut diffs = self.diff_main(text1, text2, true);
                if diffs.len() > 2 {
                    self.diff_cleanup_semantic(&mut diffs);
                    self.diff_cleanup_efficiency(&mut diffs);
                }
                let text1: Vec<char> = text1.chars().collect();
                self.patch_make_internal(&text1, &diffs)
            }
            PatchInput::Diffs(diffs) => self.patch_make_internal(&diff_text1(diffs), diffs),
            PatchInput::TextDiffs(text1, diffs) => {
                let text1: Vec<char> = text1.chars().collect();
                self.patch_make_internal(&text1, diffs)
            }
        }
    }

    fn patch_make_internal(&self, text1: &[char], diffs: &[Diff]) -> Vec<Patch> {
        let mut patches = Vec::new();
        if diffs.is_empty() {
            return patches;
        }
        let mut patch = Patch::default();
        let mut char_count1 = 0;
        let mut char_count2 = 0;
        // Context is taken from the text as it looks after the patches so far.
        let mut prepatch_text = text1.to_vec();
        let mut postpatch_text = text1.to_vec();

        for (x, diff) in diffs.iter().enumerate() {
            if patch.diffs.is_empty() && diff.op != Operation::Equal {
                // A new patch starts here.
                patch.start1 = char_count1;
                patch.start2 = char_count2;
            }

            match diff.op {
                Operation::Insert => {
                    patch.diffs.push(diff.clone());
                    patch.length2 += diff.text.len();
                    postpatch_text.splice(char_count2..char_count2, diff.text.iter().copied());
                }
                Operation::Delete => {
                    patch.length1 += diff.text.len();
                    patch.diffs.push(diff.clone());
                    postpatch_text.drain(char_count2..char_count2 + diff.text.len());
                }
                Operation::Equal => {
                    if diff.text.len() <= 2 * self.patch_margin
                        && !patch.diffs.is_empty()
                        && diffs.len() != x + 1
                    {
                        // Small equality inside a patch.
                        patch.diffs.push(diff.clone());
                        patch.length1 += diff.text.len();
                        patch.length2 += diff.text.len();
                    } else if diff.text.len() >= 2 * self.patch_margin && !patch.diffs.is_empty() {
                        // Time for a new patch.
                        self.patch_add_context(&mut patch, &prepatch_text);
                        patches.push(std::mem::take(&mut patch));
                        prepatch_text = postpatch_text.clone();
                        char_count1 = char_count2;
                    }
                }
            }

            if diff.op != Operation::Insert {
                char_count1 += diff.text.len();
            }
            if diff.op != Operation::Delete {
                char_count2 += diff.text.len();
            }
        }
        // Pick up the leftover patch if not empty.
        if !patch.diffs.is_empty() {
            self.patch_add_context(&mut patch, &prepatch_text);
            patches.push(patch);
        }
        patches
    }

    /// Grow a patch with surrounding context until its source span is unique
    /// in `text`, or it hits the Bitap size limit.
    pub fn patch_add_context(&self, patch: &mut Patch, text: &[char]) {
        if text.is_empty() {
            return;
        }
        let start2 = patch.start2 as isize;
        let length1 = patch.length1 as isize;
        let mut pattern = substring(text, start2, start2 + length1);
        let mut padding: isize = 0;

        let limit = self.match_max_bits.saturating_sub(2 * self.patch_margin);
        while find(text, pattern) != rfind(text, pattern) && pattern.len() < limit {
            padding += self.patch_margin as isize;
            pattern = substring(text, start2 - padding, start2 + length1 + padding);
        }
        // Add one chunk for good luck.
        padding += self.patch_margin as isize;

        let prefix = substring(text, start2 - padding, start2).to_vec();
        let suffix = substring(text, start2 + length1, start2 + length1 + padding).to_vec();
        let (prefix_len, suffix_len) = (prefix.len(), suffix.len());
        if !prefix.is_empty() {
            patch.diffs.insert(0, Diff::from_chars(Operation::Equal, prefix));
        }
        if !suffix.is_empty() {
            patch.diffs.push(Diff::from_chars(Operation::Equal, suffix));
        }

        patch.start1 = patch.start1.saturating_sub(prefix_len);
        patch.start2 = patch.start2.saturating_sub(prefix_len);
        patch.length1 += prefix_len + suffix_len;
        patch.length2 += prefix_len + suffix_len;
    }

    /// Pad the first and last patch with control characters so edits at the
    /// edges of the text still have context to match against.
    pub fn patch_add_padding(&self, patches: &mut [Patch]) -> Vec<char> {
        let padding_length = self.patch_margin;
        let null_padding: Vec<char> = (1..=padding_length as u32).filter_map(char::from_u32).collect();

        for patch in patches.iter_mut() {
            patch.start1 += padding_length;
            patch.start2 += padding_length;
        }

        if let Some(patch) = patches.first_mut() {
            let leading = patch.diffs.first_mut().filter(|diff| diff.op == Operation::Equal);
            if let Some(first) = leading {
                if padding_length > first.text.len() {
                    let extra = padding_length - first.text.len();
                    let mut text = null_padding[first.text.len()..].to_vec();
                    text.extend_from_slice(&first.text);
                    first.text = text;
                    patch.start1 -= extra;
                    patch.start2 -= extra;
                    patch.length1 += extra;
                    patch.length2 += extra;
                }
            } else {
                patch
                    .diffs
                    .insert(0, Diff::from_chars(Operation::Equal, null_padding.clone()));
                patch.start1 -= padding_length;
                patch.start2 -= padding_length;
                patch.length1 += padding_length;
                patch.length2 += padding_length;
            }
        }

        if let Some(patch) = patches.last_mut() {
            let trailing = patch.diffs.last_mut().filter(|diff| diff.op == Operation::Equal);
            if let Some(last) = trailing {
                if padding_length > last.text.len() {
                    let extra = padding_length - last.text.len();
                    last.text.extend_from_slice(&null_padding[..extra]);
                    patch.length1 += extra;
                    patch.length2 += extra;
                }
            } else {
                patch
                    .diffs
                    .push(Diff::from_chars(Operation::Equal, null_padding.clone()));
                patch.length1 += padding_length;
                patch.length2 += padding_length;
            }
        }

        null_padding
    }

    /// Break up any patch whose source span is longer than the Bitap limit.
    pub fn patch_split_max(&self, patches: &mut Vec<Patch>) {
        let patch_size = self.match_max_bits;
        let margin = self.patch_margin;
        let mut x = 0;
        while x < patches.len() {
            if patches[x].length1 <= patch_size {
                x += 1;
                continue;
            }
            let mut big_patch = patches.remove(x);
            let mut big_diffs: std::collections::VecDeque<Diff> = big_patch.diffs.drain(..).collect();
            let mut start1 = big_patch.start1;
            let mut start2 = big_patch.start2;
            let mut precontext: Vec<char> = Vec::new();

            while !big_diffs.is_empty() {
                let mut patch = Patch {
                    start1: start1.saturating_sub(precontext.len()),
                    start2: start2.saturating_sub(precontext.len()),
                    ..Patch::default()
                };
                let mut empty = true;
                if !precontext.is_empty() {
                    patch.length1 = precontext.len();
                    patch.length2 = precontext.len();
                    patch.diffs.push(Diff::from_chars(Operation::Equal, precontext.clone()));
                }

                while patch.length1 < patch_size.saturating_sub(margin) {
                    let Some(front) = big_diffs.front_mut() else { break };
                    let op = front.op;
                    if op == Operation::Insert {
                        // Insertions are harmless.
                        patch.length2 += front.text.len();
                        start2 += front.text.len();
                        if let Some(diff) = big_diffs.pop_front() {
                            patch.diffs.push(diff);
                        }
                        empty = false;
                    } else if op == Operation::Delete
                        && patch.diffs.len() == 1
                        && patch.diffs[0].op == Operation::Equal
                        && front.text.len() > 2 * patch_size
                    {
                        // This is a large deletion. Let it pass in one chunk.
                        patch.length1 += front.text.len();
                        start1 += front.text.len();
                        empty = false;
                        if let Some(diff) = big_diffs.pop_front() {
                            patch.diffs.push(diff);
                        }
                    } else {
                        // Deletion or equality. Only take as much as we can stomach.
                        let take = (patch_size - patch.length1 - margin).min(front.text.len());
                        let chunk: Vec<char> = front.text[..take].to_vec();
                        patch.length1 += take;
                        start1 += take;
                        if op == Operation::Equal {
                            patch.length2 += take;
                            start2 += take;
                        } else {
                            empty = false;
                        }
                        if take == front.text.len() {
                            big_diffs.pop_front();
                        } else {
                            front.text.drain(..take);
                        }
                        patch.diffs.push(Diff::from_chars(op, chunk));
                    }
                }

                // Compute the head context for the next patch.
                let text2 = diff_text2(&patch.diffs);
                precontext = text2[text2.len().saturating_sub(margin)..].to_vec();
                // Append the end context for this patch.
                let remaining: Vec<Diff> = big_diffs.iter().cloned().collect();
                let text1 = diff_text1(&remaining);
                let postcontext = &text1[..margin.min(text1.len())];
                if !postcontext.is_empty() {
                    patch.length1 += postcontext.len();
                    patch.length2 += postcontext.len();
                    let trailing = patch.diffs.last_mut().filter(|diff| diff.op == Operation::Equal);
                    if let Some(last) = trailing {
                        last.text.extend_from_slice(postcontext);
                    } else {
                        patch.diffs.push(Diff::from_chars(Operation::Equal, postcontext));
                    }
                }
                if !empty {
                    patches.insert(x, patch);
                    x += 1;
                }
            }
        }
    }

    /// Apply `patches` to `text`, tolerating drift in the target.
    ///
    /// Returns the patched text and, per patch, whether it could be placed.
    pub fn patch_apply(&self, patches: &[Patch], text: &str) -> Result<(String, Vec<bool>), TextError> {
        if patches.is_empty() {
            return Ok((text.to_string(), Vec::new()));
        }
        let mut patches = patches.to_vec();
        let null_padding = self.patch_add_padding(&mut patches);
        let mut text: Vec<char> = null_padding
            .iter()
            .copied()
            .chain(text.chars())
            .chain(null_padding.iter().copied())
            .collect();
        self.patch_split_max(&mut patches);

        let max_bits = self.match_max_bits;
        // Drift between where a patch was expected and where it landed.
        let mut delta: isize = 0;
        let mut results = Vec::with_capacity(patches.len());

        for (x, patch) in patches.iter().enumerate() {
            let expected_loc = (patch.start2 as isize + delta).max(0) as usize;
            let text1 = diff_text1(&patch.diffs);
            let mut end_loc: Option<usize> = None;
            let start_loc = if text1.len() > max_bits {
                // Long patch: match the head and tail separately.
                match self.match_main_chars(&text, &text1[..max_bits], expected_loc)? {
                    Some(start) => {
                        end_loc = self.match_main_chars(
                            &text,
                            &text1[text1.len() - max_bits..],
                            expected_loc + text1.len() - max_bits,
                        )?;
                        match end_loc {
                            Some(end) if start < end => Some(start),
                            _ => None,
                        }
                    }
                    None => None,
                }
            } else {
                self.match_main_chars(&text, &text1, expected_loc)?
            };

            let Some(start_loc) = start_loc else {
                trace!(patch = x, "no match for text patch");
                results.push(false);
                // Subtract the delta for this failed patch from subsequent patches.
                delta -= patch.length2 as isize - patch.length1 as isize;
                continue;
            };
            delta = start_loc as isize - expected_loc as isize;

            let text2 = match end_loc {
                None => substring(&text, start_loc as isize, (start_loc + text1.len()) as isize),
                Some(end) => substring(&text, start_loc as isize, (end + max_bits) as isize),
            }
            .to_vec();

            if text1 == text2 {
                // Perfect match, just shove the replacement text in.
                let replacement = diff_text2(&patch.diffs);
                let end = (start_loc + text1.len()).min(text.len());
                text.splice(start_loc..end, replacement);
                results.push(true);
                continue;
            }

            // Imperfect match. Diff the expected text against what is there
            // and map the patch's edits through it.
            let mut diffs = self.diff_main_chars(&text1, &text2, false, self.deadline());
            if text1.len() > max_bits
                && diff_levenshtein(&diffs) as f64 / text1.len() as f64 > self.patch_delete_threshold
            {
                // The end points match, but the content is unacceptably bad.
                results.push(false);
                continue;
            }
            self.diff_cleanup_semantic_lossless(&mut diffs);
            let mut index1 = 0;
            for edit in &patch.diffs {
                match edit.op {
                    Operation::Insert => {
                        let at = (start_loc + diff_x_index(&diffs, index1)).min(text.len());
                        text.splice(at..at, edit.text.iter().copied());
                    }
                    Operation::Delete => {
                        let from = (start_loc + diff_x_index(&diffs, index1)).min(text.len());
                        let to = (start_loc + diff_x_index(&diffs, index1 + edit.text.len()))
                            .clamp(from, text.len());
                        text.drain(from..to);
                    }
                    Operation::Equal => {}
                }
                if edit.op != Operation::Delete {
                    index1 += edit.text.len();
                }
            }
            results.push(true);
        }

        // Strip the padding off.
        let inner = substring(
            &text,
            null_padding.len() as isize,
            text.len() as isize - null_padding.len() as isize,
        );
        Ok((inner.iter().collect(), results))
    }

    pub fn patch_to_text(&self, patches: &[Patch]) -> String {
        patches.iter().map(Patch::to_string).collect()
    }

    pub fn patch_from_text(&self, text: &str) -> Result<Vec<Patch>, TextError> {
        let mut patches = Vec::new();
        if text.is_empty() {
            return Ok(patches);
        }
        let lines: Vec<&str> = text.split('\n').collect();
        let mut pointer = 0;
        while pointer < lines.len() {
            let header = parse_hunk_header(lines[pointer])?;
            let mut patch = Patch {
                start1: header.old.offset(),
                length1: header.old.len(),
                start2: header.new.offset(),
                length2: header.new.len(),
                ..Patch::default()
            };
            pointer += 1;

            while pointer < lines.len() {
                let line = lines[pointer];
                let mut chars = line.chars();
                let Some(sign) = chars.next() else {
                    // Blank line, whatever.
                    pointer += 1;
                    continue;
                };
                if sign == '@' {
                    // Start of next patch.
                    break;
                }
                let body = decode_uri_in(chars.as_str(), "patch_fromText")?;
                let op = match sign {
                    '-' => Operation::Delete,
                    '+' => Operation::Insert,
                    ' ' => Operation::Equal,
                    other => return Err(TextError::invalid_patch_mode(other, &body)),
                };
                patch.diffs.push(Diff::new(op, &body));
                pointer += 1;
            }
            patches.push(patch);
        }
        Ok(patches)
    }
}
