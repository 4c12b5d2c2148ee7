/********************************************************************************
 * Copyright (c) 2025 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! Streaming approximate histogram over `f64` samples.
//!
//! Ben-Haim/Tom-Tov style: at most `max_bins` `(value, count)` bins kept
//! sorted ascending; once the bound is exceeded the two adjacent bins with the
//! smallest value delta merge into their count-weighted mean. Accuracy is
//! within a fraction of a bin, which is enough for latency telemetry; the
//! point is bounded space, not exactness.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One histogram bin: a representative value and the sample count it carries.
/// Counts are fractional because merged bins carry weighted contributions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bin {
    #[serde(rename = "v")]
    pub value: f64,
    #[serde(rename = "c")]
    pub count: f64,
}

/// A bounded-bin approximate distribution. Not thread-safe; callers hold
/// their own lock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Histogram {
    #[serde(rename = "bins")]
    bins: Vec<Bin>,
    #[serde(rename = "max")]
    max_bins: usize,
    #[serde(rename = "total")]
    total: u64,
}

impl Histogram {
    /// Creates a histogram holding at most `max_bins` bins.
    ///
    /// There is no optimal bin count; somewhere between 20 and 80 is usually
    /// sufficient.
    pub fn new(max_bins: usize) -> Self {
        Self {
            bins: Vec::new(),
            max_bins,
            total: 0,
        }
    }

    /// Adds a sample, creating a bin at its value if one does not exist yet.
    pub fn add(&mut self, value: f64) {
        self.total += 1;
        match self.bins.iter().position(|bin| bin.value >= value) {
            Some(i) if self.bins[i].value == value => self.bins[i].count += 1.0,
            Some(i) => self.bins.insert(i, Bin { value, count: 1.0 }),
            None => self.bins.push(Bin { value, count: 1.0 }),
        }
        self.trim();
    }

    /// Returns the value of the bin the quantile `q` falls into, or `-1.0`
    /// when the histogram is empty. Approximate: a bin may straddle the
    /// quantile.
    pub fn quantile(&self, q: f64) -> f64 {
        let mut remaining = q * self.total as f64;
        for bin in &self.bins {
            remaining -= bin.count;
            if remaining <= 0.0 {
                return bin.value;
            }
        }
        -1.0
    }

    /// Cumulative distribution at `x`: the fraction of samples in bins whose
    /// value is `<= x`.
    pub fn cdf(&self, x: f64) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let below: f64 = self
            .bins
            .iter()
            .filter(|bin| bin.value <= x)
            .map(|bin| bin.count)
            .sum();
        below / self.total as f64
    }

    /// Sample mean of the distribution.
    pub fn mean(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let sum: f64 = self.bins.iter().map(|bin| bin.value * bin.count).sum();
        sum / self.total as f64
    }

    /// Sample variance of the distribution.
    pub fn variance(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let mean = self.mean();
        let sum: f64 = self
            .bins
            .iter()
            .map(|bin| bin.count * (bin.value - mean) * (bin.value - mean))
            .sum();
        sum / self.total as f64
    }

    /// Total number of samples added.
    pub fn count(&self) -> u64 {
        self.total
    }

    /// Multiplies every bin value by `s`. Useful when samples arrive in large
    /// units such as nanoseconds.
    pub fn scale(&mut self, s: f64) {
        for bin in &mut self.bins {
            bin.value *= s;
        }
    }

    /// Absorbs all bins from `other`, then re-sorts and trims back to the
    /// bound.
    pub fn merge_with(&mut self, other: &Histogram) {
        self.total += other.total;
        self.bins.extend_from_slice(&other.bins);
        self.bins.sort_by(|a, b| a.value.total_cmp(&b.value));
        self.trim();
    }

    pub fn bins(&self) -> &[Bin] {
        &self.bins
    }

    // Merges the two adjacent bins with the smallest value delta until the
    // bin count is back under the bound.
    fn trim(&mut self) {
        while self.bins.len() > self.max_bins {
            let mut min_delta = f64::MAX;
            let mut min_index = 0;
            for i in 1..self.bins.len() {
                let delta = self.bins[i].value - self.bins[i - 1].value;
                if delta < min_delta {
                    min_delta = delta;
                    min_index = i;
                }
            }

            let merged_count = self.bins[min_index - 1].count + self.bins[min_index].count;
            let merged = Bin {
                value: (self.bins[min_index - 1].value * self.bins[min_index - 1].count
                    + self.bins[min_index].value * self.bins[min_index].count)
                    / merged_count,
                count: merged_count,
            };
            self.bins[min_index - 1] = merged;
            self.bins.remove(min_index);
        }
    }
}

impl fmt::Display for Histogram {
    /// Renders the distribution as one bar per bin, scaled to fit a terminal.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total Entries: {}", self.total)?;

        let max = self
            .bins
            .iter()
            .map(|bin| bin.count)
            .fold(0.0f64, f64::max);
        let scale = if max > 75.0 { 75.0 / max } else { 1.0 };

        for bin in &self.bins {
            let bar = "*".repeat((bin.count * scale) as usize);
            writeln!(f, "{:.2}:\t{}", bin.value, bar)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Histogram;

    fn approx(x: f64, y: f64) -> bool {
        (x - y).abs() < 0.2
    }

    // Deterministic pseudo-random stream; splitmix-style multiplier LCG.
    struct Rng(u64);

    impl Rng {
        fn next_unit(&mut self) -> f64 {
            self.0 = self
                .0
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (self.0 >> 11) as f64 / (1u64 << 53) as f64
        }

        // Irwin-Hall sum of twelve uniforms, a standard-normal approximation.
        fn next_gaussian(&mut self) -> f64 {
            (0..12).map(|_| self.next_unit()).sum::<f64>() - 6.0
        }
    }

    /// Integer-rounded latency-like samples with median 18 and quartiles
    /// 14 / 22.
    fn test_data() -> Vec<f64> {
        let mut rng = Rng(0x5EED_1234_5678_9ABC);
        (0..14_999)
            .map(|_| (18.0 + 5.93 * rng.next_gaussian()).round())
            .collect()
    }

    #[test]
    fn quantiles_and_cdf_match_the_distribution() {
        let mut h = Histogram::new(160);
        for value in test_data() {
            h.add(value);
        }

        assert_eq!(h.count(), 14_999);
        assert!(approx(h.quantile(0.25), 14.0), "got {}", h.quantile(0.25));
        assert!(approx(h.quantile(0.5), 18.0), "got {}", h.quantile(0.5));
        assert!(approx(h.quantile(0.75), 22.0), "got {}", h.quantile(0.75));
        assert!(approx(h.cdf(18.0), 0.5), "got {}", h.cdf(18.0));
        assert!(approx(h.cdf(22.0), 0.75), "got {}", h.cdf(22.0));

        h.scale(0.5);
        assert!(approx(h.quantile(0.5), 9.0), "got {}", h.quantile(0.5));
    }

    #[test]
    fn bin_count_never_exceeds_the_bound() {
        let mut h = Histogram::new(10);
        let mut rng = Rng(42);
        for _ in 0..5_000 {
            h.add(rng.next_unit() * 1000.0);
            assert!(h.bins().len() <= 10);
        }

        let mut other = Histogram::new(10);
        for _ in 0..5_000 {
            other.add(rng.next_unit() * 1000.0);
        }
        h.merge_with(&other);
        assert!(h.bins().len() <= 10);
        assert_eq!(h.count(), 10_000);
    }

    #[test]
    fn empty_histogram_reports_sentinels() {
        let h = Histogram::new(20);
        assert_eq!(h.quantile(0.5), -1.0);
        assert_eq!(h.cdf(10.0), 0.0);
        assert_eq!(h.mean(), 0.0);
        assert_eq!(h.variance(), 0.0);
        assert_eq!(h.count(), 0);
    }

    #[test]
    fn exact_values_increment_existing_bins() {
        let mut h = Histogram::new(20);
        for _ in 0..5 {
            h.add(3.0);
        }
        assert_eq!(h.bins().len(), 1);
        assert_eq!(h.bins()[0].count, 5.0);
        assert_eq!(h.mean(), 3.0);
    }

    #[test]
    fn merged_bins_keep_the_weighted_mean() {
        let mut h = Histogram::new(2);
        h.add(0.0);
        h.add(10.0);
        h.add(10.5); // closest pair is (10, 10.5); merges to 10.25
        let bins = h.bins();
        assert_eq!(bins.len(), 2);
        assert_eq!(bins[1].value, 10.25);
        assert_eq!(bins[1].count, 2.0);
        assert_eq!(h.count(), 3);
    }

    #[test]
    fn display_renders_one_bar_per_bin() {
        let mut h = Histogram::new(20);
        h.add(1.0);
        h.add(2.0);
        let rendered = h.to_string();
        assert!(rendered.starts_with("Total Entries: 2"));
        assert_eq!(rendered.lines().count(), 3);
    }
}
