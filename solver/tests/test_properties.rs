//! Property-based tests for coverage sets, accumulators and engines.

use proptest::prelude::*;

use discovery_latency::accumulator::ConvolutionAccumulator;
use discovery_latency::alternation::AlternationSequence;
use discovery_latency::config::{LossRate, ScanParams};
use discovery_latency::coverage::{IntervalCoverage, ProbabilisticIntervalCoverage};
use discovery_latency::distribution::OutputForm;
use discovery_latency::engine::{
    AlternationEngine, FixedIntervalEngine, LatencyEngine, LossyAlternationEngine,
};
use discovery_latency::logging::RunLog;
use discovery_latency::types::{Interval, ProbInterval};

/// Strategy: a domain length and a list of sub-intervals inside it.
fn intervals_strategy() -> impl Strategy<Value = (u64, Vec<(u64, u64)>)> {
    (1u64..300).prop_flat_map(|len| {
        let iv = (0..len, 0..len).prop_map(|(a, b)| (a.min(b), a.max(b) + 1));
        (Just(len), prop::collection::vec(iv, 0..20))
    })
}

/// Strategy: small valid scan parameters.
fn scan_strategy() -> impl Strategy<Value = ScanParams> {
    (5u64..80, 0u64..80, 0u64..400).prop_map(|(s, w, end)| {
        ScanParams::new(s, 1 + w % s, end).unwrap()
    })
}

fn brute_force_layer(width: usize, k: usize) -> Vec<f64> {
    let mut layer = vec![1.0];
    for _ in 0..k {
        let mut next = vec![0.0; layer.len() + width];
        for (v, &c) in layer.iter().enumerate() {
            for d in 0..=width {
                next[v + d] += c;
            }
        }
        layer = next;
    }
    layer
}

proptest! {
    // 1. Boolean remainder never increases and stays within the domain
    #[test]
    fn boolean_remain_monotone((len, ivs) in intervals_strategy()) {
        let mut cov = IntervalCoverage::over(len);
        let mut prev = cov.remain_len().unwrap();
        prop_assert_eq!(prev, len);
        for (a, b) in ivs {
            let iv = Interval::new(a, b).unwrap();
            let peek = cov.peek_new_coverage(iv).unwrap();
            let got = cov.new_coverage(iv, true).unwrap();
            prop_assert_eq!(peek, got);
            let remain = cov.remain_len().unwrap();
            prop_assert!(remain <= prev);
            prop_assert_eq!(prev - remain, got.length);
            prev = remain;
        }
        // stored intervals are sorted, disjoint and non-adjacent
        for pair in cov.intervals().windows(2) {
            prop_assert!(pair[0].end < pair[1].start);
        }
    }

    // 2. Probabilistic coverage stays in [0, 1] and never decreases
    #[test]
    fn probabilistic_coverage_bounded(
        (len, ivs) in intervals_strategy(),
        ps in prop::collection::vec(0.0f64..=1.0, 20),
    ) {
        let mut cov = ProbabilisticIntervalCoverage::over(len);
        let mut prev = 0.0;
        for (i, (a, b)) in ivs.into_iter().enumerate() {
            let claim = ProbInterval::new(a, b, ps[i]).unwrap();
            let gained = cov.new_coverage(claim, true).unwrap();
            prop_assert!(gained >= 0.0);
            prop_assert!(cov.coverage() >= prev - 1e-12);
            prop_assert!(cov.coverage() <= 1.0 + 1e-9);
            prev = cov.coverage();
        }
        for f in cov.fragments() {
            prop_assert!((0.0..1.0).contains(&f.residual));
        }
    }

    // 3. Two overlapping claims leave (1 - p1)(1 - p2) undiscovered
    #[test]
    fn residual_multiplies(len in 2u64..200, p1 in 0.0f64..=1.0, p2 in 0.0f64..=1.0) {
        let mut cov = ProbabilisticIntervalCoverage::over(len);
        cov.insert(ProbInterval::new(0, len, p1).unwrap()).unwrap();
        cov.insert(ProbInterval::new(len / 2, len, p2).unwrap()).unwrap();
        let expected = (1.0 - p1) * (1.0 - p2);
        prop_assert!((cov.residual_at(len - 1) - expected).abs() < 1e-12);
        prop_assert!((cov.residual_at(0) - (1.0 - p1)).abs() < 1e-12);
    }

    // 4. Compound-jitter layers match direct convolution and normalize to 1
    #[test]
    fn convolution_matches_brute_force(width in 0usize..8, k in 0usize..6) {
        let mut acc = ConvolutionAccumulator::new(width);
        acc.ensure(k);
        let layer = acc.layer(k).unwrap().to_vec();
        prop_assert_eq!(&layer, &brute_force_layer(width, k));
        let sum: f64 = acc.pdf(k).iter().sum();
        prop_assert!((sum - 1.0).abs() < 1e-9);
    }

    // 5. Fixed-interval PDF is a probability distribution and its CDF ends at 1
    #[test]
    fn fixed_engine_is_distribution(scan in scan_strategy(), adv in 1u64..60) {
        let engine = FixedIntervalEngine::new(adv, scan, RunLog::quiet()).unwrap();
        let pdf = engine.simulate_all(OutputForm::Pdf).unwrap();
        prop_assert_eq!(pdf.len() as u64, scan.end_time + 2);
        prop_assert!(pdf.values().iter().all(|&p| p >= 0.0));
        let sum: f64 = pdf.values().iter().sum();
        prop_assert!((sum - 1.0).abs() < 1e-9);

        let cdf = engine.simulate_all(OutputForm::Cdf).unwrap();
        for pair in cdf.values().windows(2) {
            prop_assert!(pair[1] >= pair[0] - 1e-12);
        }
        prop_assert_eq!(*cdf.values().last().unwrap(), 1.0);
    }

    // 6. A constant alternation sequence is a periodic broadcaster
    #[test]
    fn constant_alternation_is_fixed(scan in scan_strategy(), adv in 1u64..60, reps in 1usize..4) {
        let fixed = FixedIntervalEngine::new(adv, scan, RunLog::quiet())
            .unwrap()
            .simulate_all(OutputForm::Pdf)
            .unwrap();
        let seq = AlternationSequence::new(vec![adv; reps]).unwrap();
        let alt = AlternationEngine::new(seq, scan, RunLog::quiet())
            .unwrap()
            .simulate_all(OutputForm::Pdf)
            .unwrap();
        for (a, b) in fixed.values().iter().zip(alt.values()) {
            prop_assert!((a - b).abs() < 1e-9);
        }
    }

    // 7. Loss never makes discovery more likely by any time
    #[test]
    fn loss_delays_discovery(
        scan in scan_strategy(),
        gaps in prop::collection::vec(1u64..60, 1..4),
        loss in 0.0f64..=100.0,
    ) {
        let seq = AlternationSequence::new(gaps).unwrap();
        let lossless = LossyAlternationEngine::new(
            seq.clone(), scan, LossRate::ZERO, RunLog::quiet(),
        ).unwrap().simulate_all(OutputForm::Cdf).unwrap();
        let lossy = LossyAlternationEngine::new(
            seq, scan, LossRate::from_percent(loss).unwrap(), RunLog::quiet(),
        ).unwrap().simulate_all(OutputForm::Cdf).unwrap();
        for (a, b) in lossless.values().iter().zip(lossy.values()) {
            prop_assert!(*b <= a + 1e-9);
        }
    }
}

proptest! {
    // 8. Boolean merge agrees with a per-point bitmap of the domain
    #[test]
    fn boolean_matches_bitmap((len, ivs) in intervals_strategy()) {
        let mut cov = IntervalCoverage::over(len);
        let mut covered = vec![false; len as usize];
        for (a, b) in ivs {
            let fresh = (a..b).filter(|&x| !covered[x as usize]).count() as u64;
            let got = cov.new_coverage(Interval::new(a, b).unwrap(), true).unwrap();
            prop_assert_eq!(got.length, fresh);
            for x in a..b {
                covered[x as usize] = true;
            }
        }

        let mut runs = Vec::new();
        let mut x = 0u64;
        while x < len {
            if covered[x as usize] {
                let start = x;
                while x < len && covered[x as usize] {
                    x += 1;
                }
                runs.push(Interval::new(start, x).unwrap());
            } else {
                x += 1;
            }
        }
        prop_assert_eq!(cov.intervals(), runs.as_slice());
        let total = covered.iter().filter(|&&c| c).count() as u64;
        prop_assert_eq!(cov.remain_len().unwrap(), len - total);
    }

    // 9. Probabilistic residuals agree with a per-point product of (1 - p)
    #[test]
    fn probabilistic_matches_pointwise(
        (len, ivs) in intervals_strategy(),
        ps in prop::collection::vec(0.0f64..=1.0, 20),
    ) {
        let mut cov = ProbabilisticIntervalCoverage::over(len);
        let mut residual = vec![1.0f64; len as usize];
        for (i, (a, b)) in ivs.into_iter().enumerate() {
            let p = ps[i];
            let expected: f64 = (a..b).map(|x| residual[x as usize] * p).sum::<f64>() / len as f64;
            let gained = cov.new_coverage(ProbInterval::new(a, b, p).unwrap(), true).unwrap();
            prop_assert!((gained - expected).abs() < 1e-9, "gained={gained} expected={expected}");
            for x in a..b {
                residual[x as usize] *= 1.0 - p;
            }
        }
        for x in 0..len {
            prop_assert!((cov.residual_at(x) - residual[x as usize]).abs() < 1e-12, "x={x}");
        }
    }
}
