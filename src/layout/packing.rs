use crate::panel::FeatureId;

/// Closed interval in domain units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub start: f64,
    pub stop: f64,
}

impl Interval {
    pub fn new(start: f64, stop: f64) -> Self {
        Self { start, stop }
    }

    /// Feature extent widened by one unit on each side after snapping to
    /// whole units, so touching features never share a row.
    pub fn padded(start: f64, stop: f64) -> Self {
        Self {
            start: start.floor() - 1.0,
            stop: stop.ceil() + 1.0,
        }
    }

    pub fn extend_right(self, amount: f64) -> Self {
        Self {
            start: self.start,
            stop: self.stop + amount.max(0.0),
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.start && value <= self.stop
    }

    /// Endpoint-inclusion test: either interval's start lies inside the other.
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.contains(other.start) || other.contains(self.start)
    }
}

/// Committed intervals per display row. Index 0 holds row 1.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OccupancyGrid {
    rows: Vec<Vec<Interval>>,
    max_assigned: u32,
}

impl OccupancyGrid {
    pub fn clear(&mut self) {
        self.rows.clear();
        self.max_assigned = 0;
    }

    pub fn row(&self, row: u32) -> &[Interval] {
        row.checked_sub(1)
            .and_then(|idx| self.rows.get(idx as usize))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn conflicts(&self, row: u32, candidate: &Interval) -> bool {
        self.row(row).iter().any(|covered| candidate.overlaps(covered))
    }

    fn commit(&mut self, row: u32, interval: Interval) {
        let idx = row as usize - 1;
        if self.rows.len() <= idx {
            self.rows.resize_with(idx + 1, Vec::new);
        }
        self.rows[idx].push(interval);
    }

    /// Highest row any feature was assigned to, or 1 for an empty track.
    /// Rows only reserved for label text do not count.
    pub fn rows_used(&self) -> u32 {
        self.max_assigned.max(1)
    }

    /// Number of rows holding at least one interval, label rows included.
    pub fn occupied_rows(&self) -> u32 {
        self.rows.len() as u32
    }
}

/// Puts `candidate` on the lowest row where it does not overlap anything
/// already committed. With `reserve_label_row` the row below must be free as
/// well and the interval is committed to both.
pub fn assign_row(grid: &mut OccupancyGrid, candidate: Interval, reserve_label_row: bool) -> u32 {
    let mut row = 1;
    loop {
        let blocked = grid.conflicts(row, &candidate)
            || (reserve_label_row && grid.conflicts(row + 1, &candidate));
        if !blocked {
            grid.commit(row, candidate);
            if reserve_label_row {
                grid.commit(row + 1, candidate);
            }
            grid.max_assigned = grid.max_assigned.max(row);
            return row;
        }
        row += 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PackRequest {
    pub feature: FeatureId,
    pub start: f64,
    pub stop: f64,
    /// Rendered label width in pixels, when the feature carries a label.
    pub label_width: Option<f64>,
}

/// Packs one track. The grid is rebuilt from scratch; features go in
/// ascending start order, ties keeping their insertion order.
pub fn pack_track(
    grid: &mut OccupancyGrid,
    requests: &[PackRequest],
    rescale_factor: f64,
) -> Vec<(FeatureId, u32)> {
    grid.clear();
    let mut ordered: Vec<&PackRequest> = requests.iter().collect();
    ordered.sort_by(|a, b| a.start.total_cmp(&b.start));

    ordered
        .into_iter()
        .map(|req| {
            let mut candidate = Interval::padded(req.start, req.stop);
            if let Some(width) = req.label_width {
                candidate = candidate.extend_right(width * rescale_factor);
            }
            let row = assign_row(grid, candidate, req.label_width.is_some());
            (req.feature, row)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(id: usize, start: f64, stop: f64) -> PackRequest {
        PackRequest {
            feature: FeatureId(id),
            start,
            stop,
            label_width: None,
        }
    }

    fn row_of(rows: &[(FeatureId, u32)], id: usize) -> u32 {
        rows.iter().find(|(f, _)| f.0 == id).map(|(_, r)| *r).unwrap()
    }

    #[test]
    fn overlapping_features_are_bumped() {
        let mut grid = OccupancyGrid::default();
        let rows = pack_track(&mut grid, &[req(0, 10.0, 50.0), req(1, 40.0, 90.0)], 1.0);
        assert_eq!(row_of(&rows, 0), 1);
        assert_eq!(row_of(&rows, 1), 2);
        assert_eq!(grid.rows_used(), 2);
    }

    #[test]
    fn padding_separates_touching_features() {
        let mut grid = OccupancyGrid::default();
        // [9,21] and [20,31] overlap once padded.
        let rows = pack_track(&mut grid, &[req(0, 10.0, 20.0), req(1, 21.0, 30.0)], 1.0);
        assert_eq!(row_of(&rows, 1), 2);

        // [9,21] and [22,31] do not.
        let rows = pack_track(&mut grid, &[req(0, 10.0, 20.0), req(1, 23.0, 30.0)], 1.0);
        assert_eq!(row_of(&rows, 1), 1);
        assert_eq!(grid.rows_used(), 1);
    }

    #[test]
    fn disjoint_features_share_first_row() {
        let mut grid = OccupancyGrid::default();
        let requests: Vec<_> = (0..20)
            .map(|i| req(i, i as f64 * 10.0, i as f64 * 10.0 + 5.0))
            .collect();
        let rows = pack_track(&mut grid, &requests, 1.0);
        assert!(rows.iter().all(|(_, row)| *row == 1));
        assert_eq!(grid.rows_used(), 1);
    }

    #[test]
    fn empty_track_uses_one_row() {
        let mut grid = OccupancyGrid::default();
        assert!(pack_track(&mut grid, &[], 1.0).is_empty());
        assert_eq!(grid.rows_used(), 1);
    }

    #[test]
    fn processes_in_start_order_not_insertion_order() {
        let mut grid = OccupancyGrid::default();
        let rows = pack_track(&mut grid, &[req(0, 40.0, 90.0), req(1, 10.0, 50.0)], 1.0);
        assert_eq!(row_of(&rows, 1), 1);
        assert_eq!(row_of(&rows, 0), 2);
    }

    #[test]
    fn first_fit_reuses_freed_rows() {
        let mut grid = OccupancyGrid::default();
        let rows = pack_track(
            &mut grid,
            &[req(0, 0.0, 100.0), req(1, 10.0, 20.0), req(2, 30.0, 40.0), req(3, 35.0, 60.0)],
            1.0,
        );
        assert_eq!(row_of(&rows, 0), 1);
        assert_eq!(row_of(&rows, 1), 2);
        assert_eq!(row_of(&rows, 2), 2);
        assert_eq!(row_of(&rows, 3), 3);
    }

    #[test]
    fn label_reserves_row_below() {
        let mut grid = OccupancyGrid::default();
        let labelled = PackRequest {
            label_width: Some(40.0),
            ..req(0, 10.0, 20.0)
        };
        // Label covers up to 21 + 40 * 2 = 101 in domain units.
        let rows = pack_track(&mut grid, &[labelled, req(1, 60.0, 70.0)], 2.0);
        assert_eq!(row_of(&rows, 0), 1);
        assert_eq!(row_of(&rows, 1), 3);
        assert_eq!(grid.row(2), &[Interval::new(9.0, 101.0)]);
        assert_eq!(grid.rows_used(), 3);
        assert_eq!(grid.occupied_rows(), 3);
    }

    #[test]
    fn labelled_feature_needs_free_row_below() {
        let mut grid = OccupancyGrid::default();
        let plain = req(0, 200.0, 300.0);
        let blocker = req(1, 250.0, 260.0);
        let labelled = PackRequest {
            label_width: Some(1.0),
            ..req(2, 500.0, 520.0)
        };
        let low = req(3, 270.0, 280.0);
        let rows = pack_track(&mut grid, &[plain, blocker, low, labelled], 1.0);
        assert_eq!(row_of(&rows, 0), 1);
        assert_eq!(row_of(&rows, 1), 2);
        assert_eq!(row_of(&rows, 3), 2);
        assert_eq!(row_of(&rows, 2), 1);
    }

    #[test]
    fn rows_never_hold_overlapping_padded_intervals() {
        let mut grid = OccupancyGrid::default();
        let requests: Vec<_> = (0..60)
            .map(|i| {
                let start = ((i * 37) % 500) as f64;
                req(i, start, start + ((i * 13) % 90) as f64)
            })
            .collect();
        let rows = pack_track(&mut grid, &requests, 1.0);
        for (a, row_a) in &rows {
            for (b, row_b) in &rows {
                if a == b || row_a != row_b {
                    continue;
                }
                let ra = &requests[a.0];
                let rb = &requests[b.0];
                assert!(
                    !Interval::padded(ra.start, ra.stop).overlaps(&Interval::padded(rb.start, rb.stop)),
                    "{a:?} and {b:?} share row {row_a}"
                );
            }
        }
    }
}
