use super::aggregate::EnrollmentSum;

// ---------------------------------------------------------------------------
// Share normalization: fraction of a year's total enrollment per institution
// ---------------------------------------------------------------------------

/// One institution's slice of a year's enrollment.
#[derive(Debug, Clone, PartialEq)]
pub struct ShareRow {
    pub institution: String,
    pub enrolled: u64,
    /// Fraction of the year's total, in [0, 1]. 0.0 when the year's total is
    /// zero; consumers treat that as "no emphasis".
    pub share: f64,
}

/// All shares of one year, rows ascending by share. The ordering is part of
/// the presentation contract: the color mapper and the chart walk rows from
/// smallest to largest share.
#[derive(Debug, Clone, PartialEq)]
pub struct YearShares {
    pub year: i32,
    pub rows: Vec<ShareRow>,
}

impl YearShares {
    /// Smallest and largest share of the year, for the grayscale ramp.
    /// `None` for an empty year (not produced by `shares_by_year`).
    pub fn share_bounds(&self) -> Option<(f64, f64)> {
        let min = self.rows.first()?.share;
        let max = self.rows.last()?.share;
        Some((min, max))
    }
}

/// Normalize grouped sums into per-year shares. The denominator is always the
/// year's own total, never the global one. Input rows must be sorted
/// ascending by year, as produced by `enrollment_by_institution`.
pub fn shares_by_year(sums: &[EnrollmentSum]) -> Vec<YearShares> {
    let mut out: Vec<YearShares> = Vec::new();

    for sum in sums {
        match out.last_mut() {
            Some(group) if group.year == sum.year => group.rows.push(ShareRow {
                institution: sum.institution.clone(),
                enrolled: sum.enrolled,
                share: 0.0,
            }),
            _ => out.push(YearShares {
                year: sum.year,
                rows: vec![ShareRow {
                    institution: sum.institution.clone(),
                    enrolled: sum.enrolled,
                    share: 0.0,
                }],
            }),
        }
    }

    for group in &mut out {
        let total: u64 = group.rows.iter().map(|r| r.enrolled).sum();
        if total > 0 {
            for row in &mut group.rows {
                row.share = row.enrolled as f64 / total as f64;
            }
        }
        group
            .rows
            .sort_by(|a, b| a.share.total_cmp(&b.share).then(a.institution.cmp(&b.institution)));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mk_sum(year: i32, institution: &str, enrolled: u64) -> EnrollmentSum {
        EnrollmentSum {
            year,
            institution: institution.to_string(),
            enrolled,
        }
    }

    #[test]
    fn shares_sum_to_one_per_year() {
        let sums = vec![
            mk_sum(2020, "UNIVERSIDAD DE LAS AMERICAS", 100),
            mk_sum(2020, "X", 300),
            mk_sum(2021, "UNIVERSIDAD DE LAS AMERICAS", 50),
            mk_sum(2021, "X", 50),
        ];
        for group in shares_by_year(&sums) {
            let total: f64 = group.rows.iter().map(|r| r.share).sum();
            assert!((total - 1.0).abs() < 1e-9, "year {}: {total}", group.year);
        }
    }

    #[test]
    fn worked_example_shares() {
        let sums = vec![
            mk_sum(2020, "UNIVERSIDAD DE LAS AMERICAS", 100),
            mk_sum(2020, "X", 300),
            mk_sum(2021, "UNIVERSIDAD DE LAS AMERICAS", 50),
            mk_sum(2021, "X", 50),
        ];
        let groups = shares_by_year(&sums);
        assert_eq!(groups.len(), 2);

        let y2020 = &groups[0];
        assert_eq!(y2020.rows[0].institution, "UNIVERSIDAD DE LAS AMERICAS");
        assert!((y2020.rows[0].share - 0.25).abs() < 1e-9);
        assert!((y2020.rows[1].share - 0.75).abs() < 1e-9);

        let y2021 = &groups[1];
        assert!((y2021.rows[0].share - 0.5).abs() < 1e-9);
        assert!((y2021.rows[1].share - 0.5).abs() < 1e-9);
    }

    #[test]
    fn rows_ascend_by_share_within_each_year() {
        let sums = vec![
            mk_sum(2020, "A", 500),
            mk_sum(2020, "B", 20),
            mk_sum(2020, "C", 80),
        ];
        let groups = shares_by_year(&sums);
        let shares: Vec<f64> = groups[0].rows.iter().map(|r| r.share).collect();
        assert!(shares.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(groups[0].rows[0].institution, "B");
    }

    #[test]
    fn zero_total_year_yields_zero_shares_without_panicking() {
        let sums = vec![mk_sum(2020, "A", 0), mk_sum(2020, "B", 0)];
        let groups = shares_by_year(&sums);
        assert!(groups[0].rows.iter().all(|r| r.share == 0.0));
        assert_eq!(groups[0].share_bounds(), Some((0.0, 0.0)));
    }
}
