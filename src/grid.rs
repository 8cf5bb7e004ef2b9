/// Row-major flat grid. No per-cell objects.
/// Grows one row or column at a time at any edge.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid<T> {
    pub data: Vec<T>,
    pub w: usize,
    pub h: usize,
}

impl<T: Clone + Default> Grid<T> {
    pub fn new(w: usize, h: usize) -> Self {
        Self::filled(w, h, T::default())
    }

    pub fn filled(w: usize, h: usize, v: T) -> Self {
        Self {
            data: vec![v; w * h],
            w,
            h,
        }
    }

    /// Builds a grid from rows. Returns None if the rows are ragged.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Option<Self> {
        let h = rows.len();
        let w = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|r| r.len() != w) {
            return None;
        }
        Some(Self {
            data: rows.into_iter().flatten().collect(),
            w,
            h,
        })
    }

    #[inline]
    pub fn idx(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.w && y < self.h);
        y * self.w + x
    }

    #[inline]
    pub fn contains(&self, x: usize, y: usize) -> bool {
        x < self.w && y < self.h
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> &T {
        &self.data[self.idx(x, y)]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, v: T) {
        let i = self.idx(x, y);
        self.data[i] = v;
    }

    pub fn rows(&self) -> impl Iterator<Item = &[T]> {
        // chunks(0) panics; an empty grid has no rows anyway
        self.data.chunks(self.w.max(1)).take(self.h)
    }

    pub fn to_rows(&self) -> Vec<Vec<T>> {
        self.rows().map(<[T]>::to_vec).collect()
    }

    /// Inserts a default-filled column before column `at` (`at == w` appends).
    pub fn insert_column(&mut self, at: usize) {
        debug_assert!(at <= self.w);
        let w = self.w;
        let mut data = Vec::with_capacity((w + 1) * self.h);
        for row in self.data.chunks(w.max(1)).take(self.h) {
            data.extend_from_slice(&row[..at]);
            data.push(T::default());
            data.extend_from_slice(&row[at..]);
        }
        if w == 0 {
            data = vec![T::default(); self.h];
        }
        self.data = data;
        self.w += 1;
    }

    /// Inserts a default-filled row before row `at` (`at == h` appends).
    pub fn insert_row(&mut self, at: usize) {
        debug_assert!(at <= self.h);
        let i = at * self.w;
        self.data
            .splice(i..i, std::iter::repeat_n(T::default(), self.w));
        self.h += 1;
    }
}
