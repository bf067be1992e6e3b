//! Longest common subsequence over index-addressed sequences.

/// Matched positions of a common subsequence, in ascending order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subsequence {
    pub indices1: Vec<usize>,
    pub indices2: Vec<usize>,
}

impl Subsequence {
    /// The matched elements, taken from the first sequence.
    pub fn sequence<'a, T>(&self, items1: &'a [T]) -> Vec<&'a T> {
        self.indices1.iter().map(|&index| &items1[index]).collect()
    }

    pub fn len(&self) -> usize {
        self.indices1.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices1.is_empty()
    }
}

/// LCS of two sequences of lengths `len1` and `len2`, where
/// `matches(index1, index2)` decides whether two elements are the same.
///
/// The predicate may be stateful (hash caches), so it takes `&mut self`.
pub fn lcs<F>(len1: usize, len2: usize, mut matches: F) -> Subsequence
where
    F: FnMut(usize, usize) -> bool,
{
    let matrix = length_matrix(len1, len2, &mut matches);
    backtrack(&matrix, len1, len2, &mut matches)
}

/// LCS of two slices compared with `==`.
pub fn lcs_slices<T: PartialEq>(items1: &[T], items2: &[T]) -> Subsequence {
    lcs(items1.len(), items2.len(), |index1, index2| items1[index1] == items2[index2])
}

/// LCS of two strings, by character.
pub fn lcs_str(text1: &str, text2: &str) -> String {
    let chars1: Vec<char> = text1.chars().collect();
    let chars2: Vec<char> = text2.chars().collect();
    lcs_slices(&chars1, &chars2)
        .sequence(&chars1)
        .into_iter()
        .collect()
}

fn length_matrix<F>(len1: usize, len2: usize, matches: &mut F) -> Vec<Vec<usize>>
where
    F: FnMut(usize, usize) -> bool,
{
    let mut matrix = vec![vec![0; len2 + 1]; len1 + 1];
    for x in 1..=len1 {
        for y in 1..=len2 {
            matrix[x][y] = if matches(x - 1, y - 1) {
                matrix[x - 1][y - 1] + 1
            } else {
                matrix[x - 1][y].max(matrix[x][y - 1])
            };
        }
    }
    matrix
}

fn backtrack<F>(matrix: &[Vec<usize>], len1: usize, len2: usize, matches: &mut F) -> Subsequence
where
    F: FnMut(usize, usize) -> bool,
{
    let mut subsequence = Subsequence::default();
    let (mut index1, mut index2) = (len1, len2);
    while index1 != 0 && index2 != 0 {
        if matches(index1 - 1, index2 - 1) {
            subsequence.indices1.push(index1 - 1);
            subsequence.indices2.push(index2 - 1);
            index1 -= 1;
            index2 -= 1;
        } else if matrix[index1][index2 - 1] > matrix[index1 - 1][index2] {
            index2 -= 1;
        } else {
            index1 -= 1;
        }
    }
    subsequence.indices1.reverse();
    subsequence.indices2.reverse();
    subsequence
}
