use super::*;
use crate::assert_fp_eq;

#[test]
fn normalize_sums_to_one() {
    let mut v = [1.0, 3.0, 4.0];
    assert!(normalize(&mut v, 0.0));
    assert_fp_eq!(v, [0.125, 0.375, 0.5]);
}

#[test]
fn normalize_below_floor_is_untouched() {
    let mut v = [0.0_f64; 4];
    assert!(!normalize(&mut v, 0.0));
    assert_eq!(v, [0.0; 4]);

    let mut tiny = [1e-7_f64, 2e-7];
    assert!(!normalize(&mut tiny, DEFAULT_NORMALIZE_FLOOR));
    assert_eq!(tiny, [1e-7, 2e-7]);
}

#[test]
fn normalize_log_space() {
    let mut v = [LogProb::from_f64(2.0), LogProb::from_f64(6.0)];
    assert!(normalize(&mut v, 0.0));
    assert_fp_eq!(v[0].to_f64(), 0.25, 1e-12);
    assert_fp_eq!(v[1].to_f64(), 0.75, 1e-12);
}

#[test]
fn log_prob_arithmetic() {
    let a = LogProb::from_f64(0.2);
    let b = LogProb::from_f64(0.3);
    assert_fp_eq!((a + b).to_f64(), 0.5, 1e-12);
    assert_fp_eq!((a * b).to_f64(), 0.06, 1e-12);
    assert_fp_eq!((a / b).to_f64(), 2.0 / 3.0, 1e-12);
    assert_fp_eq!((LogProb::ZERO + b).to_f64(), 0.3, 1e-12);
    assert_eq!((LogProb::ZERO + LogProb::ZERO).to_f64(), 0.0);
}

#[test]
fn scale_and_zero() {
    let mut v = [1.0_f32, 2.0];
    scale(&mut v, 0.5);
    assert_eq!(v, [0.5, 1.0]);
    zero(&mut v);
    assert_eq!(v, [0.0, 0.0]);
}

#[test]
fn argmax_first_on_ties() {
    assert_eq!(argmax(&[0.1, 0.4, 0.4, 0.1]), Some(1));
    assert_eq!(argmax::<f64>(&[]), None);
}

#[test]
fn relative_entropy_of_identical_is_zero() {
    let p = [0.25; 4];
    assert_fp_eq!(@absolute, relative_entropy(&p, &p), 0.0, 1e-12);
    assert_fp_eq!(relative_entropy(&[1.0, 0.0, 0.0, 0.0], &p), 2.0);
}
