//! Temporal alignment of a comparison tree onto a reference tree.

use log::debug;

use crate::error::Result;
use crate::topology::ROOT_NAME;
use crate::tree::LineageTree;

/// Resample every comparison series whose cell also exists in `reference` so both
/// have the same number of samples. Returns the number of rewritten series.
pub fn align_to_reference(reference: &LineageTree, comparison: &mut LineageTree) -> Result<usize> {
    let mut rewritten = 0;

    for name in reference.level_order(ROOT_NAME)? {
        let Some(ref_node) = reference.get(&name) else {
            continue;
        };
        let Some(cmp_node) = comparison.get_mut(&name) else {
            continue;
        };

        let ref_len = ref_node.series.len();
        let aligned = if ref_node.children().is_some() {
            align_internal(&cmp_node.series, ref_len)
        } else {
            align_leaf(&cmp_node.series, ref_len)
        };

        if let Some(series) = aligned {
            debug!(
                "Aligned {}: {} -> {} samples",
                name,
                cmp_node.series.len(),
                series.len()
            );
            cmp_node.series = series;
            rewritten += 1;
        }
    }

    Ok(rewritten)
}

/// Internal nodes interpolate when both sides have enough samples.
/// `None` means the series is left as is.
fn align_internal(series: &[f64], ref_len: usize) -> Option<Vec<f64>> {
    let cmp_len = series.len();
    if ref_len < 2 {
        (cmp_len != ref_len).then(|| truncate_or_pad(series, ref_len))
    } else if cmp_len < 2 {
        Some(truncate_or_pad(series, ref_len))
    } else if cmp_len != ref_len {
        Some(resample_linear(series, ref_len))
    } else {
        None
    }
}

fn align_leaf(series: &[f64], ref_len: usize) -> Option<Vec<f64>> {
    (series.len() != ref_len).then(|| truncate_or_pad(series, ref_len))
}

/// Cut to `len` samples, or repeat the last sample until `len` is reached.
pub fn truncate_or_pad(series: &[f64], len: usize) -> Vec<f64> {
    if series.len() >= len {
        return series[..len].to_vec();
    }
    let fill = series.last().copied().unwrap_or(0.0);
    let mut out = series.to_vec();
    out.resize(len, fill);
    out
}

/// Linear resampling of `series` onto `len` evenly spaced points of `[0, 1]`.
///
/// Both ends map onto each other exactly.
pub fn resample_linear(series: &[f64], len: usize) -> Vec<f64> {
    let n = series.len();
    if n < 2 || len < 2 {
        return truncate_or_pad(series, len);
    }

    let last_src = (n - 1) as f64;
    let last_dst = (len - 1) as f64;
    (0..len)
        .map(|j| {
            if j == 0 {
                return series[0];
            }
            if j == len - 1 {
                return series[n - 1];
            }
            let pos = j as f64 / last_dst * last_src;
            let i = (pos.floor() as usize).min(n - 2);
            let frac = pos - i as f64;
            series[i] + (series[i + 1] - series[i]) * frac
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::CellSeries;
    use std::collections::BTreeMap;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn tree(entries: &[(&str, &[f64])]) -> LineageTree {
        let cells: BTreeMap<String, CellSeries> = entries
            .iter()
            .map(|(name, series)| {
                (
                    name.to_string(),
                    CellSeries {
                        start_timepoint: 1,
                        series: series.to_vec(),
                    },
                )
            })
            .collect();
        LineageTree::build(&cells).unwrap()
    }

    #[test]
    fn internal_node_interpolates_with_exact_endpoints() {
        let reference = tree(&[("AB", &[0.0; 5]), ("ABa", &[0.0]), ("ABp", &[0.0])]);
        let mut comparison = tree(&[("AB", &[10.0, 20.0, 40.0])]);
        align_to_reference(&reference, &mut comparison).unwrap();

        let out = &comparison.get("AB").unwrap().series;
        assert_eq!(out.len(), 5);
        assert_eq!(out[0], 10.0);
        assert_eq!(out[4], 40.0);
        assert!(close(out[1], 15.0));
        assert!(close(out[2], 20.0));
        assert!(close(out[3], 30.0));
    }

    #[test]
    fn leaf_truncates_without_interpolation() {
        let reference = tree(&[("ABa", &[0.0; 4])]);
        let mut comparison = tree(&[("ABa", &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0])]);
        align_to_reference(&reference, &mut comparison).unwrap();
        assert_eq!(comparison.get("ABa").unwrap().series, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn leaf_pads_with_last_value() {
        let reference = tree(&[("ABp", &[0.0; 5])]);
        let mut comparison = tree(&[("ABp", &[2.0, 9.0])]);
        align_to_reference(&reference, &mut comparison).unwrap();
        assert_eq!(
            comparison.get("ABp").unwrap().series,
            vec![2.0, 9.0, 9.0, 9.0, 9.0]
        );
    }

    #[test]
    fn short_reference_truncates_internal_node() {
        let reference = tree(&[("P1", &[1.0]), ("EMS", &[1.0]), ("P2", &[1.0])]);
        let mut comparison = tree(&[("P1", &[4.0, 5.0, 6.0])]);
        align_to_reference(&reference, &mut comparison).unwrap();
        assert_eq!(comparison.get("P1").unwrap().series, vec![4.0]);
    }

    #[test]
    fn short_comparison_pads_internal_node() {
        let reference = tree(&[("P1", &[1.0, 2.0, 3.0]), ("EMS", &[1.0]), ("P2", &[1.0])]);
        let mut comparison = tree(&[("P1", &[7.0])]);
        align_to_reference(&reference, &mut comparison).unwrap();
        assert_eq!(comparison.get("P1").unwrap().series, vec![7.0, 7.0, 7.0]);
    }

    #[test]
    fn node_kind_follows_the_reference() {
        // AB is a leaf in the comparison but internal in the reference
        let reference = tree(&[("AB", &[0.0; 3]), ("ABa", &[0.0]), ("ABp", &[0.0])]);
        let mut comparison = tree(&[("AB", &[0.0, 10.0])]);
        align_to_reference(&reference, &mut comparison).unwrap();
        assert_eq!(comparison.get("AB").unwrap().series, vec![0.0, 5.0, 10.0]);
    }

    #[test]
    fn cells_missing_from_comparison_are_untouched() {
        let reference = tree(&[("ABal", &[1.0, 2.0]), ("ABar", &[1.0])]);
        let mut comparison = tree(&[]);
        align_to_reference(&reference, &mut comparison).unwrap();
        assert!(!comparison.contains("ABal"));
        assert_eq!(comparison.get("ABa").unwrap().series, vec![0.0; 5]);
    }

    #[test]
    fn padding_empty_series_uses_zero() {
        assert_eq!(truncate_or_pad(&[], 3), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn downsampling_keeps_endpoints() {
        let out = resample_linear(&[0.0, 1.0, 2.0, 3.0, 4.0], 3);
        assert_eq!(out, vec![0.0, 2.0, 4.0]);
    }
}
