use super::{
    Diff, DiffMatchPatch, Operation,
    diff::{diff_common_overlap, diff_common_prefix, diff_common_suffix},
};

impl DiffMatchPatch {
    /// Reduce the number of edits by eliminating semantically trivial equalities.
    pub fn diff_cleanup_semantic(&self, diffs: &mut Vec<Diff>) {
        let mut changes = false;
        // Indices of candidate equalities.
        let mut equalities: Vec<usize> = Vec::new();
        let mut last_equality: Option<Vec<char>> = None;
        let mut pointer: isize = 0;
        // Characters changed before and after the last equality.
        let mut length_insertions1 = 0;
        let mut length_deletions1 = 0;
        let mut length_insertions2 = 0;
        let mut length_deletions2 = 0;

        while (pointer as usize) < diffs.len() {
            let p = pointer as usize;
            if diffs[p].op == Operation::Equal {
                equalities.push(p);
                length_insertions1 = length_insertions2;
                length_deletions1 = length_deletions2;
                length_insertions2 = 0;
                length_deletions2 = 0;
                last_equality = Some(diffs[p].text.clone());
            } else {
                if diffs[p].op == Operation::Insert {
                    length_insertions2 += diffs[p].text.len();
                } else {
                    length_deletions2 += diffs[p].text.len();
                }
                // An equality no larger than the edits on both sides gets absorbed.
                let absorb = last_equality.as_ref().is_some_and(|equality| {
                    !equality.is_empty()
                        && equality.len() <= length_insertions1.max(length_deletions1)
                        && equality.len() <= length_insertions2.max(length_deletions2)
                });
                if absorb {
                    let Some(at) = equalities.pop() else { break };
                    let equality = last_equality.take().unwrap_or_default();
                    diffs.insert(at, Diff::from_chars(Operation::Delete, equality));
                    diffs[at + 1].op = Operation::Insert;
                    // Throw away the previous equality too, it needs reevaluating.
                    equalities.pop();
                    pointer = equalities.last().map_or(-1, |&last| last as isize);
                    length_insertions1 = 0;
                    length_deletions1 = 0;
                    length_insertions2 = 0;
                    length_deletions2 = 0;
                    changes = true;
                }
            }
            pointer += 1;
        }

        if changes {
            self.diff_cleanup_merge(diffs);
        }
        self.diff_cleanup_semantic_lossless(diffs);

        // Extract overlaps between a deletion and the following insertion:
        // <del>abcxxx</del><ins>xxxdef</ins> -> <del>abc</del>xxx<ins>def</ins>
        let mut pointer = 1;
        while pointer < diffs.len() {
            if diffs[pointer - 1].op == Operation::Delete && diffs[pointer].op == Operation::Insert {
                let deletion = diffs[pointer - 1].text.clone();
                let insertion = diffs[pointer].text.clone();
                let overlap1 = diff_common_overlap(&deletion, &insertion);
                let overlap2 = diff_common_overlap(&insertion, &deletion);
                if overlap1 >= overlap2 {
                    if overlap1 * 2 >= deletion.len() || overlap1 * 2 >= insertion.len() {
                        diffs.insert(
                            pointer,
                            Diff::from_chars(Operation::Equal, &insertion[..overlap1]),
                        );
                        diffs[pointer - 1].text = deletion[..deletion.len() - overlap1].to_vec();
                        diffs[pointer + 1].text = insertion[overlap1..].to_vec();
                        pointer += 1;
                    }
                } else if overlap2 * 2 >= deletion.len() || overlap2 * 2 >= insertion.len() {
                    // Reverse overlap: swap the edits around the shared text.
                    diffs.insert(
                        pointer,
                        Diff::from_chars(Operation::Equal, &deletion[..overlap2]),
                    );
                    diffs[pointer - 1] = Diff::from_chars(
                        Operation::Insert,
                        &insertion[..insertion.len() - overlap2],
                    );
                    diffs[pointer + 1] = Diff::from_chars(Operation::Delete, &deletion[overlap2..]);
                    pointer += 1;
                }
                pointer += 1;
            }
            pointer += 1;
        }
    }

    /// Slide single edits surrounded by equalities sideways so they line up
    /// with word, line or blank-line boundaries.
    pub fn diff_cleanup_semantic_lossless(&self, diffs: &mut Vec<Diff>) {
        let mut pointer: isize = 1;
        while pointer + 1 < diffs.len() as isize {
            let p = pointer as usize;
            if p >= 1 && diffs[p - 1].op == Operation::Equal && diffs[p + 1].op == Operation::Equal {
                let mut equality1 = diffs[p - 1].text.clone();
                let mut edit = diffs[p].text.clone();
                let mut equality2 = diffs[p + 1].text.clone();

                // Shift the edit as far left as possible.
                let common_offset = diff_common_suffix(&equality1, &edit);
                if common_offset > 0 {
                    let common = edit[edit.len() - common_offset..].to_vec();
                    equality1.truncate(equality1.len() - common_offset);
                    edit = [common.as_slice(), &edit[..edit.len() - common_offset]].concat();
                    equality2 = [common.as_slice(), equality2.as_slice()].concat();
                }

                // Then step right one char at a time looking for the best fit.
                let mut best_equality1 = equality1.clone();
                let mut best_edit = edit.clone();
                let mut best_equality2 = equality2.clone();
                let mut best_score =
                    semantic_score(&equality1, &edit) + semantic_score(&edit, &equality2);
                while !edit.is_empty() && !equality2.is_empty() && edit[0] == equality2[0] {
                    equality1.push(edit[0]);
                    edit.remove(0);
                    edit.push(equality2[0]);
                    equality2.remove(0);
                    let score = semantic_score(&equality1, &edit) + semantic_score(&edit, &equality2);
                    // >= favours trailing over leading whitespace on edits.
                    if score >= best_score {
                        best_score = score;
                        best_equality1 = equality1.clone();
                        best_edit = edit.clone();
                        best_equality2 = equality2.clone();
                    }
                }

                if diffs[p - 1].text != best_equality1 {
                    let mut p = p;
                    if best_equality1.is_empty() {
                        diffs.remove(p - 1);
                        p -= 1;
                        pointer -= 1;
                    } else {
                        diffs[p - 1].text = best_equality1;
                    }
                    diffs[p].text = best_edit;
                    if best_equality2.is_empty() {
                        diffs.remove(p + 1);
                        pointer -= 1;
                    } else {
                        diffs[p + 1].text = best_equality2;
                    }
                }
            }
            pointer += 1;
        }
    }

    /// Reduce the number of edits by eliminating operationally trivial equalities.
    pub fn diff_cleanup_efficiency(&self, diffs: &mut Vec<Diff>) {
        let mut changes = false;
        let mut equalities: Vec<usize> = Vec::new();
        let mut last_equality: Option<Vec<char>> = None;
        let mut pointer: isize = 0;
        // Is there an insertion/deletion operation before/after the last equality?
        let mut pre_ins = false;
        let mut pre_del = false;
        let mut post_ins = false;
        let mut post_del = false;

        while (pointer as usize) < diffs.len() {
            let p = pointer as usize;
            if diffs[p].op == Operation::Equal {
                if diffs[p].text.len() < self.diff_edit_cost && (post_ins || post_del) {
                    // Candidate found.
                    equalities.push(p);
                    pre_ins = post_ins;
                    pre_del = post_del;
                    last_equality = Some(diffs[p].text.clone());
                } else {
                    // Not a candidate, and can never become one.
                    equalities.clear();
                    last_equality = None;
                }
                post_ins = false;
                post_del = false;
            } else {
                if diffs[p].op == Operation::Delete {
                    post_del = true;
                } else {
                    post_ins = true;
                }
                // Five types to be split:
                // <ins>A</ins><del>B</del>XY<ins>C</ins><del>D</del>
                // <ins>A</ins>X<ins>C</ins><del>D</del>
                // <ins>A</ins><del>B</del>X<ins>C</ins>
                // <ins>A</del>X<ins>C</ins><del>D</del>
                // <ins>A</ins><del>B</del>X<del>C</del>
                let sides = [pre_ins, pre_del, post_ins, post_del]
                    .iter()
                    .filter(|&&side| side)
                    .count();
                let split = last_equality.as_ref().is_some_and(|equality| {
                    !equality.is_empty()
                        && ((pre_ins && pre_del && post_ins && post_del)
                            || (equality.len() * 2 < self.diff_edit_cost && sides == 3))
                });
                if split {
                    let Some(&at) = equalities.last() else { break };
                    let equality = last_equality.take().unwrap_or_default();
                    diffs.insert(at, Diff::from_chars(Operation::Delete, equality));
                    diffs[at + 1].op = Operation::Insert;
                    equalities.pop();
                    if pre_ins && pre_del {
                        // No changes made which could affect previous entry, keep going.
                        post_ins = true;
                        post_del = true;
                        equalities.clear();
                    } else {
                        equalities.pop();
                        pointer = equalities.last().map_or(-1, |&last| last as isize);
                        post_ins = false;
                        post_del = false;
                    }
                    changes = true;
                }
            }
            pointer += 1;
        }

        if changes {
            self.diff_cleanup_merge(diffs);
        }
    }

    /// Reorder and merge like edit sections, and factor out commonalities
    /// between adjacent insertions and deletions. Idempotent.
    pub fn diff_cleanup_merge(&self, diffs: &mut Vec<Diff>) {
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
                    pointer += 1;
                }
                Operation::Delete => {
                    count_delete += 1;
                    text_delete.extend_from_slice(&diffs[pointer].text);
                    pointer += 1;
                }
                Operation::Equal => {
                    if count_delete + count_insert > 1 {
                        if count_delete != 0 && count_insert != 0 {
                            // Factor out any common prefix.
                            let common = diff_common_prefix(&text_insert, &text_delete);
                            if common != 0 {
                                let run_start = pointer - count_delete - count_insert;
                                if run_start > 0 && diffs[run_start - 1].op == Operation::Equal {
                                    diffs[run_start - 1]
                                        .text
                                        .extend_from_slice(&text_insert[..common]);
                                } else {
                                    diffs.insert(
                                        0,
                                        Diff::from_chars(Operation::Equal, &text_insert[..common]),
                                    );
                                    pointer += 1;
                                }
                                text_insert.drain(..common);
                                text_delete.drain(..common);
                            }
                            // Factor out any common suffix.
                            let common = diff_common_suffix(&text_insert, &text_delete);
                            if common != 0 {
                                let mut text = text_insert[text_insert.len() - common..].to_vec();
                                text.extend_from_slice(&diffs[pointer].text);
                                diffs[pointer].text = text;
                                text_insert.truncate(text_insert.len() - common);
                                text_delete.truncate(text_delete.len() - common);
                            }
                        }
                        // Replace the run with the merged edits.
                        pointer -= count_delete + count_insert;
                        diffs.drain(pointer..pointer + count_delete + count_insert);
                        if !text_delete.is_empty() {
                            diffs.insert(
                                pointer,
                                Diff::from_chars(Operation::Delete, std::mem::take(&mut text_delete)),
                            );
                            pointer += 1;
                        }
                        if !text_insert.is_empty() {
                            diffs.insert(
                                pointer,
                                Diff::from_chars(Operation::Insert, std::mem::take(&mut text_insert)),
                            );
                            pointer += 1;
                        }
                        pointer += 1;
                    } else if pointer != 0 && diffs[pointer - 1].op == Operation::Equal {
                        // Merge this equality with the previous one.
                        let text = std::mem::take(&mut diffs[pointer].text);
                        diffs[pointer - 1].text.extend(text);
                        diffs.remove(pointer);
                    } else {
                        pointer += 1;
                    }
                    count_insert = 0;
                    count_delete = 0;
                    text_delete.clear();
                    text_insert.clear();
                }
            }
        }
        if diffs.last().is_some_and(|last| last.text.is_empty()) {
            diffs.pop();
        }

        // Second pass: look for single edits surrounded on both sides by
        // equalities which can be shifted sideways to eliminate an equality,
        // e.g. A<ins>BA</ins>C -> <ins>AB</ins>AC
        let mut changes = false;
        let mut pointer = 1;
        while pointer + 1 < diffs.len() {
            if diffs[pointer - 1].op == Operation::Equal && diffs[pointer + 1].op == Operation::Equal {
                let prev = diffs[pointer - 1].text.clone();
                let next = diffs[pointer + 1].text.clone();
                if diffs[pointer].text.ends_with(&prev) {
                    // Shift the edit over the previous equality.
                    let edit = &diffs[pointer].text;
                    let shifted = [prev.as_slice(), &edit[..edit.len() - prev.len()]].concat();
                    diffs[pointer].text = shifted;
                    diffs[pointer + 1].text = [prev.as_slice(), next.as_slice()].concat();
                    diffs.remove(pointer - 1);
                    changes = true;
                } else if diffs[pointer].text.starts_with(&next) {
                    // Shift the edit over the next equality.
                    diffs[pointer - 1].text.extend_from_slice(&next);
                    let edit = &diffs[pointer].text;
                    let shifted = [&edit[next.len()..], next.as_slice()].concat();
                    diffs[pointer].text = shifted;
                    diffs.remove(pointer + 1);
                    changes = true;
                }
            }
            pointer += 1;
        }
        if changes {
            self.diff_cleanup_merge(diffs);
        }
    }
}

/// How well does the boundary between `one` and `two` sit on a natural
/// break? 6 for an edge of the text down to 0 for mid-word.
fn semantic_score(one: &[char], two: &[char]) -> u8 {
    let (Some(&char1), Some(&char2)) = (one.last(), two.first()) else {
        return 6;
    };
    let non_alphanumeric1 = !char1.is_ascii_alphanumeric();
    let non_alphanumeric2 = !char2.is_ascii_alphanumeric();
    let whitespace1 = non_alphanumeric1 && char1.is_whitespace();
    let whitespace2 = non_alphanumeric2 && char2.is_whitespace();
    let line_break1 = whitespace1 && (char1 == '\r' || char1 == '\n');
    let line_break2 = whitespace2 && (char2 == '\r' || char2 == '\n');
    let blank_line1 = line_break1 && (one.ends_with(&['\n', '\n']) || one.ends_with(&['\n', '\r', '\n']));
    let blank_line2 = line_break2
        && (two.starts_with(&['\n', '\n'])
            || two.starts_with(&['\r', '\n', '\n'])
            || two.starts_with(&['\n', '\r', '\n'])
            || two.starts_with(&['\r', '\n', '\r', '\n']));

    if blank_line1 || blank_line2 {
        5
    } else if line_break1 || line_break2 {
        4
    } else if non_alphanumeric1 && !whitespace1 && whitespace2 {
        // End of sentence.
        3
    } else if whitespace1 || whitespace2 {
        2
    } else if non_alphanumeric1 || non_alphanumeric2 {
        1
    } else {
        0
    }
}
