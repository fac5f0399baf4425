use std::collections::HashMap;

use serde::Serialize;

/// Welford's online algorithm for mean and variance in O(1) memory
#[derive(Debug, Clone, Default)]
pub struct WelfordStats {
    count: u64,
    mean: f64,
    m2: f64, // Sum of squares of differences from current mean
    min: Option<f64>,
    max: Option<f64>,
}

impl WelfordStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_values(values: &[f64]) -> Self {
        let mut stats = Self::new();
        for &v in values {
            stats.update(v);
        }
        stats
    }

    pub fn update(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);

        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then_some(self.mean)
    }

    /// Sample variance (n - 1 denominator)
    pub fn variance(&self) -> Option<f64> {
        (self.count > 1).then(|| self.m2 / (self.count - 1) as f64)
    }

    pub fn std_dev(&self) -> Option<f64> {
        self.variance().map(f64::sqrt)
    }

    pub fn min(&self) -> Option<f64> {
        self.min
    }

    pub fn max(&self) -> Option<f64> {
        self.max
    }
}

/// Quantile of already sorted values with linear interpolation between ranks
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    let pos = (sorted.len() - 1) as f64 * q;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(f64::total_cmp);
    out
}

/// Central moments m2, m3, m4 (population, n denominator)
fn central_moments(values: &[f64]) -> Option<(f64, f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let (mut m2, mut m3, mut m4) = (0.0, 0.0, 0.0);
    for v in values {
        let d = v - mean;
        m2 += d * d;
        m3 += d * d * d;
        m4 += d * d * d * d;
    }
    Some((m2 / n, m3 / n, m4 / n))
}

/// Biased sample skewness, `m3 / m2^1.5`. `None` for constant or empty input.
pub fn skewness(values: &[f64]) -> Option<f64> {
    let (m2, m3, _) = central_moments(values)?;
    (m2 > 0.0).then(|| m3 / m2.powf(1.5))
}

/// Biased excess (Fisher) kurtosis, `m4 / m2^2 - 3`
pub fn kurtosis(values: &[f64]) -> Option<f64> {
    let (m2, _, m4) = central_moments(values)?;
    (m2 > 0.0).then(|| m4 / (m2 * m2) - 3.0)
}

/// Pearson correlation over the pairs where both sides are present
pub fn pearson(xs: &[Option<f64>], ys: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        let (dx, dy) = (x - mean_x, y - mean_y);
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    let denom = (sxx * syy).sqrt();
    (denom > 0.0).then(|| sxy / denom)
}

/// Round to `digits` decimal places
pub fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}

/// Count/mean/std/min/quartiles/max of a numeric column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Describe {
    pub count: u64,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

impl Describe {
    pub fn from_values(values: &[f64]) -> Self {
        let welford = WelfordStats::from_values(values);
        let sorted = sorted(values);
        Self {
            count: welford.count(),
            mean: welford.mean(),
            std: welford.std_dev(),
            min: welford.min(),
            q25: quantile(&sorted, 0.25),
            median: quantile(&sorted, 0.5),
            q75: quantile(&sorted, 0.75),
            max: welford.max(),
        }
    }
}

/// A value and how many times it occurred
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

/// Frequency table over string values
#[derive(Debug, Clone, Default)]
pub struct ValueCounts {
    counts: HashMap<String, usize>,
    total: usize,
}

impl ValueCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, value: &str) {
        *self.counts.entry(value.to_string()).or_insert(0) += 1;
        self.total += 1;
    }

    pub fn unique_count(&self) -> usize {
        self.counts.len()
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn get(&self, value: &str) -> usize {
        self.counts.get(value).copied().unwrap_or(0)
    }

    /// Most frequent values first; ties ordered by value
    pub fn top(&self, k: usize) -> Vec<ValueCount> {
        let mut entries: Vec<ValueCount> = self
            .counts
            .iter()
            .map(|(value, &count)| ValueCount {
                value: value.clone(),
                count,
            })
            .collect();
        entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
        entries.truncate(k);
        entries
    }
}

impl<'a> FromIterator<&'a str> for ValueCounts {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut counts = ValueCounts::new();
        for value in iter {
            counts.add(value);
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pearson() {
        let xs = [Some(1.0), Some(2.0), Some(3.0), None];
        let ys = [Some(2.0), Some(4.0), Some(6.0), Some(100.0)];
        assert!((pearson(&xs, &ys).unwrap() - 1.0).abs() < 1e-12);
        let flat = [Some(1.0), Some(1.0), Some(1.0), Some(1.0)];
        assert_eq!(pearson(&xs, &flat), None);
    }

    #[test]
    fn test_welford_basic() {
        let stats = WelfordStats::from_values(&[1.0, 2.0, 3.0, 4.0, 5.0]);

        assert_eq!(stats.count(), 5);
        assert!((stats.mean().unwrap() - 3.0).abs() < 1e-10);
        assert!((stats.variance().unwrap() - 2.5).abs() < 1e-10);
        assert_eq!(stats.min(), Some(1.0));
        assert_eq!(stats.max(), Some(5.0));
    }

    #[test]
    fn test_welford_single_value() {
        let stats = WelfordStats::from_values(&[42.0]);
        assert_eq!(stats.mean(), Some(42.0));
        assert!(stats.variance().is_none());
    }

    #[test]
    fn test_quantile_interpolates() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&values, 0.0), Some(1.0));
        assert_eq!(quantile(&values, 0.5), Some(2.5));
        assert_eq!(quantile(&values, 0.25), Some(1.75));
        assert_eq!(quantile(&values, 1.0), Some(4.0));
        assert_eq!(quantile(&[], 0.5), None);
    }

    #[test]
    fn test_skewness_symmetric_is_zero() {
        let skew = skewness(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert!(skew.abs() < 1e-12);
        assert!(skewness(&[2.0, 2.0]).is_none());
    }

    #[test]
    fn test_skewness_right_tail_positive() {
        assert!(skewness(&[1.0, 1.0, 1.0, 10.0]).unwrap() > 0.0);
    }

    #[test]
    fn test_kurtosis_uniform_like() {
        // Population excess kurtosis of 1..5 is -1.3
        let kurt = kurtosis(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert!((kurt + 1.3).abs() < 1e-10);
    }

    #[test]
    fn test_describe() {
        let d = Describe::from_values(&[4.0, 1.0, 3.0, 2.0]);
        assert_eq!(d.count, 4);
        assert_eq!(d.min, Some(1.0));
        assert_eq!(d.median, Some(2.5));
        assert_eq!(d.max, Some(4.0));
    }

    #[test]
    fn test_value_counts_top() {
        let counts: ValueCounts = ["B", "A", "B", "C", "A", "B"].into_iter().collect();
        let top = counts.top(2);
        assert_eq!(top[0], ValueCount { value: "B".to_string(), count: 3 });
        assert_eq!(top[1], ValueCount { value: "A".to_string(), count: 2 });
        assert_eq!(counts.unique_count(), 3);
        assert_eq!(counts.total(), 6);
        assert_eq!(counts.get("Z"), 0);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(0.4567, 2), 0.46);
    }
}
