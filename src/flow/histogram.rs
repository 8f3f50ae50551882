use crate::priv_prelude::*;

/// Most bins a histogram read back from a document may have.
pub(crate) const MAX_BINS: usize = 1 << 20;

/// Counts values into fixed-width bins starting at zero. Bin `i` covers
/// `[i * bin_width, (i + 1) * bin_width)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    bin_width: f64,
    counts: Vec<u64>,
}

/// A non-empty bin, as reported by `Histogram::bins`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bin {
    pub index: usize,
    pub start: f64,
    pub width: f64,
    pub count: u64,
}

impl Histogram {
    pub fn new(bin_width: f64) -> Histogram {
        Histogram {
            bin_width,
            counts: Vec::new(),
        }
    }

    pub fn bin_width(&self) -> f64 {
        self.bin_width
    }

    /// Number of bins up to and including the highest one ever touched.
    pub fn n_bins(&self) -> usize {
        self.counts.len()
    }

    pub fn count(&self, index: usize) -> u64 {
        self.counts.get(index).cloned().unwrap_or(0)
    }

    /// Record one value. Negative values land in the first bin.
    pub fn add_value(&mut self, value: f64) {
        let index = if value > 0.0 && self.bin_width > 0.0 {
            (value / self.bin_width).floor() as usize
        } else {
            0
        };
        if index >= self.counts.len() {
            self.counts.resize(index + 1, 0);
        }
        self.counts[index] += 1;
    }

    /// Number of values recorded.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// The non-empty bins in index order.
    pub fn bins(&self) -> impl Iterator<Item = Bin> + '_ {
        let width = self.bin_width;
        self
        .counts
        .iter()
        .enumerate()
        .filter(|(_, count)| **count > 0)
        .map(move |(index, count)| Bin {
            index,
            start: index as f64 * width,
            width,
            count: *count,
        })
    }

    pub(crate) fn set_bin_width(&mut self, bin_width: f64) {
        self.bin_width = bin_width;
    }

    pub(crate) fn set_n_bins(&mut self, n_bins: usize) {
        self.counts.resize(n_bins, 0);
    }

    pub(crate) fn set_count(&mut self, index: usize, count: u64) {
        if index >= self.counts.len() {
            self.counts.resize(index + 1, 0);
        }
        self.counts[index] = count;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn values_land_in_their_bins() {
        let mut histogram = Histogram::new(0.001);
        histogram.add_value(0.0051);
        histogram.add_value(0.0059);
        histogram.add_value(0.0004);
        histogram.add_value(-1.0);

        assert_eq!(histogram.n_bins(), 6);
        assert_eq!(histogram.count(5), 2);
        assert_eq!(histogram.count(0), 2);
        assert_eq!(histogram.total(), 4);
        let bins: Vec<_> = histogram.bins().map(|bin| (bin.index, bin.count)).collect();
        assert_eq!(bins, vec![(0, 2), (5, 2)]);
    }

    #[test]
    fn size_bins() {
        let mut histogram = Histogram::new(2000.0);
        histogram.add_value(128.0);
        histogram.add_value(1052.0);
        assert_eq!(histogram.n_bins(), 1);
        assert_eq!(histogram.count(0), 2);
    }
}
