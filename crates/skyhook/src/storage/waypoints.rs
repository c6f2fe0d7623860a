//! Ordered named-coordinate lists, edited as text rows and persisted as
//! JSON records.
//!
//! The store keeps coordinates as the text the user typed; parsing to
//! floats happens in [`WaypointStore::validate_all`], and a save only
//! touches the file once every row has passed. Names need not be unique
//! and duplicate coordinates are fine, order is the display order.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result, RowError};

/// One persisted record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// One editable row. Coordinate fields stay text until validation so a
/// half-typed value never destroys what the user entered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaypointRow {
    pub name: String,
    pub x: String,
    pub y: String,
    pub z: String,
}

impl WaypointRow {
    pub fn new(name: impl Into<String>, [x, y, z]: [f32; 3]) -> Self {
        Self {
            name: name.into(),
            x: x.to_string(),
            y: y.to_string(),
            z: z.to_string(),
        }
    }
}

impl From<Waypoint> for WaypointRow {
    fn from(w: Waypoint) -> Self {
        Self::new(w.name, [w.x, w.y, w.z])
    }
}

fn parse_coordinate(row: usize, field: &'static str, text: &str) -> std::result::Result<f32, RowError> {
    match text.trim().parse::<f32>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(RowError {
            row,
            field,
            value: text.to_string(),
        }),
    }
}

/// The in-memory waypoint list for one session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WaypointStore {
    rows: Vec<WaypointRow>,
}

impl WaypointStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_waypoints(waypoints: Vec<Waypoint>) -> Self {
        Self {
            rows: waypoints.into_iter().map(WaypointRow::from).collect(),
        }
    }

    /// Rows in display order.
    pub fn list(&self) -> &[WaypointRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&WaypointRow> {
        self.rows.get(index)
    }

    /// Insert at `index`, clamped to the end of the list.
    pub fn add(&mut self, index: usize, row: WaypointRow) {
        let index = index.min(self.rows.len());
        self.rows.insert(index, row);
    }

    pub fn push(&mut self, row: WaypointRow) {
        self.rows.push(row);
    }

    /// Duplicate the selected rows, each copy landing right after its
    /// original. Indices are processed highest first so earlier insertions
    /// in the batch cannot shift later ones.
    pub fn duplicate(&mut self, indices: &[usize]) {
        for &index in Self::descending(indices).iter() {
            if index < self.rows.len() {
                let copy = self.rows[index].clone();
                self.rows.insert(index + 1, copy);
            }
        }
    }

    /// Remove the selected rows, highest index first.
    pub fn remove(&mut self, indices: &[usize]) {
        for &index in Self::descending(indices).iter() {
            if index < self.rows.len() {
                self.rows.remove(index);
            }
        }
    }

    fn descending(indices: &[usize]) -> Vec<usize> {
        let mut sorted = indices.to_vec();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        sorted.dedup();
        sorted
    }

    /// Parse every row's coordinates as finite floats. Failures are
    /// aggregated across the whole list, never just the first bad cell.
    pub fn validate_all(&self) -> Result<Vec<Waypoint>> {
        let mut waypoints = Vec::with_capacity(self.rows.len());
        let mut errors = Vec::new();
        for (i, row) in self.rows.iter().enumerate() {
            let x = parse_coordinate(i, "x", &row.x);
            let y = parse_coordinate(i, "y", &row.y);
            let z = parse_coordinate(i, "z", &row.z);
            match (x, y, z) {
                (Ok(x), Ok(y), Ok(z)) => waypoints.push(Waypoint {
                    name: row.name.clone(),
                    x,
                    y,
                    z,
                }),
                (x, y, z) => {
                    errors.extend([x.err(), y.err(), z.err()].into_iter().flatten());
                }
            }
        }
        if errors.is_empty() {
            Ok(waypoints)
        } else {
            Err(Error::WaypointValidation(errors))
        }
    }

    /// Validate, then write the whole list. Any row failure aborts before
    /// the file is touched, so a failed save leaves both the file and this
    /// store exactly as they were.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let waypoints = self.validate_all()?;
        let json = serde_json::to_string_pretty(&waypoints)?;
        std::fs::write(path.as_ref(), json)?;
        info!(
            "Saved {} waypoint(s) to {}",
            waypoints.len(),
            path.as_ref().display()
        );
        Ok(())
    }

    /// Load a list from disk. A missing or unparseable file is
    /// [`Error::WaypointsNotFound`]; valid JSON of the wrong shape is
    /// [`Error::WaypointFormat`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|_| Error::WaypointsNotFound(path.display().to_string()))?;
        let value: serde_json::Value = serde_json::from_str(&text)
            .map_err(|_| Error::WaypointsNotFound(path.display().to_string()))?;
        let waypoints: Vec<Waypoint> = serde_json::from_value(value)
            .map_err(|e| Error::WaypointFormat(e.to_string()))?;
        info!(
            "Loaded {} waypoint(s) from {}",
            waypoints.len(),
            path.display()
        );
        Ok(Self::from_waypoints(waypoints))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_store() -> WaypointStore {
        WaypointStore::from_waypoints(vec![
            Waypoint {
                name: "A".into(),
                x: 1.0,
                y: 2.0,
                z: 3.0,
            },
            Waypoint {
                name: "B".into(),
                x: -1.5,
                y: 0.0,
                z: 9.25,
            },
        ])
    }

    #[test]
    fn test_save_load_round_trip_preserves_order_and_floats() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trip.waypoints.json");

        let store = sample_store();
        store.save(&path).unwrap();
        let loaded = WaypointStore::load(&path).unwrap();

        let waypoints = loaded.validate_all().unwrap();
        assert_eq!(waypoints.len(), 2);
        assert_eq!(waypoints[0].name, "A");
        assert_eq!((waypoints[0].x, waypoints[0].y, waypoints[0].z), (1.0, 2.0, 3.0));
        assert_eq!(waypoints[1].name, "B");
        assert_eq!(
            (waypoints[1].x, waypoints[1].y, waypoints[1].z),
            (-1.5, 0.0, 9.25)
        );
    }

    #[test]
    fn test_duplicate_names_and_coordinates_allowed() {
        let mut store = sample_store();
        store.push(WaypointRow::new("A", [1.0, 2.0, 3.0]));
        assert_eq!(store.validate_all().unwrap().len(), 3);
    }

    #[test]
    fn test_add_inserts_at_index_and_clamps() {
        let mut store = sample_store();
        store.add(1, WaypointRow::new("mid", [0.0, 0.0, 0.0]));
        assert_eq!(store.get(1).unwrap().name, "mid");

        store.add(99, WaypointRow::new("tail", [0.0, 0.0, 0.0]));
        assert_eq!(store.list().last().unwrap().name, "tail");
    }

    #[test]
    fn test_batch_remove_processes_highest_index_first() {
        let mut store = WaypointStore::new();
        for name in ["a", "b", "c", "d"] {
            store.push(WaypointRow::new(name, [0.0, 0.0, 0.0]));
        }
        // Passing ascending indices must still drop exactly b and d.
        store.remove(&[1, 3]);
        let names: Vec<_> = store.list().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["a", "c"]);
    }

    #[test]
    fn test_batch_duplicate_keeps_copies_adjacent() {
        let mut store = WaypointStore::new();
        for name in ["a", "b", "c"] {
            store.push(WaypointRow::new(name, [0.0, 0.0, 0.0]));
        }
        store.duplicate(&[0, 2]);
        let names: Vec<_> = store.list().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["a", "a", "b", "c", "c"]);
    }

    #[test]
    fn test_out_of_range_batch_indices_ignored() {
        let mut store = sample_store();
        store.remove(&[7]);
        store.duplicate(&[7]);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_validate_reports_every_bad_cell() {
        let mut store = WaypointStore::new();
        store.push(WaypointRow {
            name: "bad".into(),
            x: "abc".into(),
            y: "2.0".into(),
            z: "inf".into(),
        });
        store.push(WaypointRow::new("good", [1.0, 1.0, 1.0]));
        store.push(WaypointRow {
            name: "worse".into(),
            x: "1.0".into(),
            y: "".into(),
            z: "3.0".into(),
        });

        let Err(Error::WaypointValidation(errors)) = store.validate_all() else {
            panic!("expected aggregated validation failure");
        };
        assert_eq!(errors.len(), 3);
        assert_eq!((errors[0].row, errors[0].field), (0, "x"));
        assert_eq!((errors[1].row, errors[1].field), (0, "z"));
        assert_eq!((errors[2].row, errors[2].field), (2, "y"));
    }

    #[test]
    fn test_failed_save_writes_nothing_and_keeps_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("unchanged.waypoints.json");

        let mut store = sample_store();
        store.push(WaypointRow {
            name: "bad".into(),
            x: "not-a-number".into(),
            y: "0".into(),
            z: "0".into(),
        });
        let before = store.clone();

        assert!(matches!(
            store.save(&path),
            Err(Error::WaypointValidation(_))
        ));
        assert!(!path.exists());
        assert_eq!(store, before);
    }

    #[test]
    fn test_load_missing_file_is_not_found() {
        assert!(matches!(
            WaypointStore::load("/nonexistent/nowhere.waypoints.json"),
            Err(Error::WaypointsNotFound(_))
        ));
    }

    #[test]
    fn test_load_corrupt_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrupt.waypoints.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            WaypointStore::load(&path),
            Err(Error::WaypointsNotFound(_))
        ));
    }

    #[test]
    fn test_load_wrong_shape_is_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shape.waypoints.json");
        std::fs::write(&path, r#"{"waypoints": "nope"}"#).unwrap();
        assert!(matches!(
            WaypointStore::load(&path),
            Err(Error::WaypointFormat(_))
        ));
    }

    #[test]
    fn test_failed_load_leaves_caller_list_untouched() {
        // Load returns a fresh store; a failure simply yields no store, so
        // the session keeps whatever list it already had.
        let store = sample_store();
        let result = WaypointStore::load("/nonexistent/nowhere.waypoints.json");
        assert!(result.is_err());
        assert_eq!(store.len(), 2);
    }
}
