/// Lexicographic iterator over every coordinate of a dense shape
/// (last dimension fastest).
pub struct CoordIterator {
    shape: Vec<usize>,
    /// Coordinate yielded next; `None` once exhausted
    pending: Option<Vec<usize>>,
}

impl CoordIterator {
    pub fn new(shape: Vec<usize>) -> Self {
        let pending = shape.iter().all(|&s| s > 0).then(|| vec![0; shape.len()]);
        Self { shape, pending }
    }

    /// Number of coordinates the shape holds
    pub fn volume(&self) -> usize {
        self.shape.iter().product()
    }

    /// Odometer step: bump the innermost axis that has room, zeroing the
    /// axes after it. `false` when every axis wrapped.
    fn advance(shape: &[usize], crd: &mut [usize]) -> bool {
        for (c, &extent) in crd.iter_mut().zip(shape).rev() {
            if *c + 1 < extent {
                *c += 1;
                return true;
            }
            *c = 0;
        }
        false
    }
}

impl Iterator for CoordIterator {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        let crd = self.pending.take()?;
        let mut succ = crd.clone();
        if Self::advance(&self.shape, &mut succ) {
            self.pending = Some(succ);
        }
        Some(crd)
    }
}
