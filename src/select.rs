use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ordered_float::OrderedFloat;
use rayon::prelude::*;

use crate::distance::Unit;
use crate::error::SelectError;
use crate::model::{GeoRecord, NeighborEntry, NeighborResult, NEIGHBOR_COUNT};

/// Shared flag checked between subjects. Once tripped, a running
/// selection ends with [`SelectError::Cancelled`].
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Candidate {
    dist: OrderedFloat<f64>,
    position: usize,
}

/// Brute-force all-pairs nearest neighbor selection.
#[derive(Debug, Clone, Copy)]
pub struct Selector {
    unit: Unit,
    k: usize,
}

impl Default for Selector {
    fn default() -> Self {
        Self::new(Unit::Miles)
    }
}

impl Selector {
    pub fn new(unit: Unit) -> Self {
        Self { unit, k: NEIGHBOR_COUNT }
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    /// Rank every other record for each subject and keep the closest `k`.
    ///
    /// Subjects are processed in parallel; the result is always in
    /// index-ascending order. Records must be in ingestion order, i.e.
    /// `records[i].index == i`.
    pub fn select(&self, records: &[GeoRecord], cancel: &CancelToken) -> Result<NeighborResult, SelectError> {
        if let Some((pos, rec)) = records.iter().enumerate().find(|(pos, rec)| rec.index != *pos) {
            return Err(SelectError::Computation(format!(
                "record at position {} carries index {}",
                pos, rec.index
            )));
        }

        let rows = records
            .par_iter()
            .enumerate()
            .map(|(position, _)| {
                if cancel.is_cancelled() {
                    return Err(SelectError::Cancelled);
                }
                self.nearest(position, records)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(NeighborResult::new(rows))
    }

    fn nearest(&self, position: usize, records: &[GeoRecord]) -> Result<Vec<NeighborEntry>, SelectError> {
        let subject = &records[position];
        let mut candidates = Vec::with_capacity(records.len().saturating_sub(1));

        for (other, record) in records.iter().enumerate() {
            // Self is skipped even when another record shares its coordinates.
            if other == position {
                continue;
            }
            let d = self.unit.distance(subject, record);
            if !d.is_finite() {
                return Err(SelectError::Computation(format!(
                    "non-finite distance between records {} and {}",
                    subject.index, record.index
                )));
            }
            candidates.push(Candidate { dist: OrderedFloat(d), position: other });
        }

        // Stable: ties keep generation order.
        candidates.sort_by_key(|c| c.dist);

        Ok(candidates
            .into_iter()
            .take(self.k)
            .map(|c| {
                let neighbor = &records[c.position];
                NeighborEntry {
                    neighbor: neighbor.index,
                    distance: c.dist.into_inner(),
                    same_channel: neighbor.channel == subject.channel,
                }
            })
            .collect())
    }
}

/// Three nearest neighbors of every record, in miles.
pub fn select(records: &[GeoRecord], cancel: &CancelToken) -> Result<NeighborResult, SelectError> {
    Selector::default().select(records, cancel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Channel;

    fn rec(index: usize, lat: f64, lon: f64, channel: Channel) -> GeoRecord {
        GeoRecord::new(index, lat, lon, channel)
    }

    #[test]
    fn empty_input_gives_empty_result() {
        let result = select(&[], &CancelToken::new()).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn equal_distances_keep_input_order() {
        // Four points one degree from the origin, all equidistant.
        let records = vec![
            rec(0, 0.0, 0.0, Channel::Number(1)),
            rec(1, 0.0, 1.0, Channel::Number(1)),
            rec(2, 1.0, 0.0, Channel::Number(1)),
            rec(3, 0.0, -1.0, Channel::Number(1)),
            rec(4, -1.0, 0.0, Channel::Number(1)),
        ];
        let result = select(&records, &CancelToken::new()).unwrap();
        let order: Vec<usize> = result.get(0).unwrap().iter().map(|e| e.neighbor).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn coincident_points_do_not_hide_self_exclusion() {
        let records = vec![
            rec(0, 5.0, 5.0, Channel::Unknown),
            rec(1, 5.0, 5.0, Channel::Unknown),
        ];
        let result = select(&records, &CancelToken::new()).unwrap();
        assert_eq!(result.get(0).unwrap()[0].neighbor, 1);
        assert_eq!(result.get(0).unwrap()[0].distance, 0.0);
        assert_eq!(result.get(1).unwrap()[0].neighbor, 0);
    }

    #[test]
    fn cancelled_token_yields_no_result() {
        let records = vec![rec(0, 0.0, 0.0, Channel::Unknown), rec(1, 1.0, 1.0, Channel::Unknown)];
        let token = CancelToken::new();
        token.cancel();
        assert!(matches!(select(&records, &token), Err(SelectError::Cancelled)));
    }

    #[test]
    fn out_of_order_store_is_a_computation_error() {
        let records = vec![rec(1, 0.0, 0.0, Channel::Unknown), rec(0, 1.0, 1.0, Channel::Unknown)];
        assert!(matches!(
            select(&records, &CancelToken::new()),
            Err(SelectError::Computation(_))
        ));
    }

    #[test]
    fn kilometers_selector_reports_kilometers() {
        let records = vec![rec(0, 0.0, 0.0, Channel::Unknown), rec(1, 0.0, 1.0, Channel::Unknown)];
        let miles = Selector::new(Unit::Miles).select(&records, &CancelToken::new()).unwrap();
        let km = Selector::new(Unit::Kilometers).select(&records, &CancelToken::new()).unwrap();
        assert!(km.get(0).unwrap()[0].distance > miles.get(0).unwrap()[0].distance);
    }
}
