/// Sentinel cost for unreachable location pairs. Large enough that any route
/// through such a cell loses to dropping the job, small enough not to
/// overflow when summed along a route of i64 cumuls.
pub const UNREACHABLE: i64 = i32::MAX as i64;

/// Square travel-cost matrices stored flat in row-major order. Index 0 is the
/// depot, indices `1..n` are jobs in request order. To find the slot for a
/// pair of locations use `from * num_locations + to`.
#[derive(Debug, Clone)]
pub struct TravelMatrices {
    distances: Vec<i64>,
    durations: Vec<i64>,
    num_locations: usize,
}

impl TravelMatrices {
    /// Every off-diagonal cell starts out unreachable; providers overwrite
    /// the cells they have answers for.
    pub fn filled(num_locations: usize) -> Self {
        let mut matrices = TravelMatrices {
            distances: vec![UNREACHABLE; num_locations * num_locations],
            durations: vec![UNREACHABLE; num_locations * num_locations],
            num_locations,
        };

        for i in 0..num_locations {
            matrices.distances[i * num_locations + i] = 0;
            matrices.durations[i * num_locations + i] = 0;
        }

        matrices
    }

    pub fn from_square(distances: Vec<Vec<i64>>, durations: Vec<Vec<i64>>) -> Self {
        let num_locations = distances.len();
        let mut matrices = TravelMatrices::filled(num_locations);

        for (i, row) in distances.into_iter().enumerate() {
            for (j, value) in row.into_iter().enumerate() {
                if i != j {
                    matrices.distances[i * num_locations + j] = value;
                }
            }
        }

        for (i, row) in durations.into_iter().enumerate() {
            for (j, value) in row.into_iter().enumerate() {
                if i != j {
                    matrices.durations[i * num_locations + j] = value;
                }
            }
        }

        matrices
    }

    #[inline(always)]
    fn index(&self, from: usize, to: usize) -> usize {
        from * self.num_locations + to
    }

    pub fn set(&mut self, from: usize, to: usize, distance: i64, duration: i64) {
        if from == to {
            return;
        }

        let index = self.index(from, to);
        self.distances[index] = distance;
        self.durations[index] = duration;
    }

    #[inline(always)]
    pub fn distance(&self, from: usize, to: usize) -> i64 {
        self.distances[self.index(from, to)]
    }

    #[inline(always)]
    pub fn duration(&self, from: usize, to: usize) -> i64 {
        self.durations[self.index(from, to)]
    }

    pub fn is_reachable(&self, from: usize, to: usize) -> bool {
        self.durations[self.index(from, to)] < UNREACHABLE
    }

    pub fn num_locations(&self) -> usize {
        self.num_locations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filled_matrix_has_zero_diagonal() {
        let matrices = TravelMatrices::filled(3);

        for i in 0..3 {
            assert_eq!(matrices.distance(i, i), 0);
            assert_eq!(matrices.duration(i, i), 0);
        }

        assert_eq!(matrices.distance(0, 1), UNREACHABLE);
        assert!(!matrices.is_reachable(0, 1));
    }

    #[test]
    fn test_from_square_forces_diagonal() {
        let distances = vec![vec![7, 100], vec![100, 7]];
        let durations = vec![vec![7, 60], vec![60, 7]];

        let matrices = TravelMatrices::from_square(distances, durations);

        assert_eq!(matrices.distance(0, 0), 0);
        assert_eq!(matrices.distance(1, 1), 0);
        assert_eq!(matrices.distance(0, 1), 100);
        assert_eq!(matrices.duration(1, 0), 60);
    }

    #[test]
    fn test_set_ignores_diagonal() {
        let mut matrices = TravelMatrices::filled(2);
        matrices.set(0, 0, 42, 42);
        matrices.set(0, 1, 42, 42);

        assert_eq!(matrices.distance(0, 0), 0);
        assert_eq!(matrices.duration(0, 1), 42);
    }
}
