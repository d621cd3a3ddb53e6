/// Enumerates the `k`-element combinations of `0..n` in ascending lexicographic order.
///
/// The index buffer is owned by the generator and reused by [`Combinations::reset`], so a
/// search that walks many levels allocates once. Because each combination borrows the
/// buffer, this is a lending generator rather than an [`Iterator`].
///
/// ```
/// use mocap_geom::Combinations;
///
/// let mut combinations = Combinations::new(4, 2);
/// let mut seen = vec![];
/// while let Some(c) = combinations.next_combination() {
///     seen.push(c.to_vec());
/// }
/// assert_eq!(
///     seen,
///     vec![vec![0, 1], vec![0, 2], vec![0, 3], vec![1, 2], vec![1, 3], vec![2, 3]],
/// );
/// ```
#[derive(Debug, Clone)]
pub struct Combinations {
    n: usize,
    indices: Vec<usize>,
    started: bool,
    exhausted: bool,
}

impl Combinations {
    pub fn new(n: usize, k: usize) -> Self {
        let mut combinations = Self {
            n: 0,
            indices: Vec::with_capacity(k),
            started: false,
            exhausted: false,
        };
        combinations.reset(n, k);
        combinations
    }

    /// Restarts enumeration over `k`-element combinations of `0..n`, keeping the buffer.
    pub fn reset(&mut self, n: usize, k: usize) {
        self.n = n;
        self.indices.clear();
        self.indices.extend(0..k);
        self.started = false;
        self.exhausted = k > n;
    }

    /// Advances to the next combination.
    ///
    /// For `k = 0` a single empty combination is produced. For `k > n` nothing is produced.
    pub fn next_combination(&mut self) -> Option<&[usize]> {
        if self.exhausted {
            return None;
        }
        if !self.started {
            self.started = true;
            return Some(&self.indices);
        }
        let k = self.indices.len();
        // Find the rightmost index that can still move right.
        let pivot = (0..k).rev().find(|&i| self.indices[i] < self.n - k + i);
        match pivot {
            Some(i) => {
                self.indices[i] += 1;
                for j in i + 1..k {
                    self.indices[j] = self.indices[j - 1] + 1;
                }
                Some(&self.indices)
            }
            None => {
                self.exhausted = true;
                None
            }
        }
    }
}

/// The binomial coefficient `C(n, k)`: how many combinations [`Combinations`] will produce.
pub fn binomial(n: usize, k: usize) -> usize {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    (0..k).fold(1, |acc, i| acc * (n - i) / (i + 1))
}
