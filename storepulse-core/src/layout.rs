//! Store layout grid model
//!
//! Owns a rectangular grid of typed zone cells. The grid is replaced
//! wholesale by template generation and by optimization, and mutated one
//! cell at a time by local edits. The set of zone types on offer depends
//! on the last performed operation: a fresh template only offers the
//! structural zones, an optimized grid offers all nine.

use serde::{Deserialize, Serialize};

use crate::api::LayoutBackend;
use crate::error::{Error, Result};
use crate::types::RequestState;

/// The category tag of one grid cell.
///
/// Variant names match the backend's wire tags exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ZoneType {
    Empty,
    Walkway,
    Aisle,
    Cashier,
    Door,
    StaffRoom,
    Butcher,
    FruitsVeg,
    Spices,
}

impl ZoneType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ZoneType::Empty => "Empty",
            ZoneType::Walkway => "Walkway",
            ZoneType::Aisle => "Aisle",
            ZoneType::Cashier => "Cashier",
            ZoneType::Door => "Door",
            ZoneType::StaffRoom => "StaffRoom",
            ZoneType::Butcher => "Butcher",
            ZoneType::FruitsVeg => "FruitsVeg",
            ZoneType::Spices => "Spices",
        }
    }
}

impl std::fmt::Display for ZoneType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ZoneType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Empty" => Ok(ZoneType::Empty),
            "Walkway" => Ok(ZoneType::Walkway),
            "Aisle" => Ok(ZoneType::Aisle),
            "Cashier" => Ok(ZoneType::Cashier),
            "Door" => Ok(ZoneType::Door),
            "StaffRoom" => Ok(ZoneType::StaffRoom),
            "Butcher" => Ok(ZoneType::Butcher),
            "FruitsVeg" => Ok(ZoneType::FruitsVeg),
            "Spices" => Ok(ZoneType::Spices),
            _ => Err(format!("unknown zone type: {}", s)),
        }
    }
}

/// Zones offerable on a freshly generated template
pub const TEMPLATE_ZONES: [ZoneType; 3] = [ZoneType::Empty, ZoneType::Walkway, ZoneType::Door];

/// Zones offerable after optimization
pub const ALL_ZONES: [ZoneType; 9] = [
    ZoneType::Empty,
    ZoneType::Walkway,
    ZoneType::Aisle,
    ZoneType::Cashier,
    ZoneType::Door,
    ZoneType::StaffRoom,
    ZoneType::Butcher,
    ZoneType::FruitsVeg,
    ZoneType::Spices,
];

/// One cell of the layout grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutCell {
    #[serde(rename = "type")]
    pub zone: ZoneType,
    pub x: usize,
    pub y: usize,
}

/// A rectangular grid of layout cells.
///
/// Construction validates rectangularity; remote responses with jagged
/// rows are rejected rather than silently accepted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct LayoutGrid {
    cells: Vec<Vec<LayoutCell>>,
}

impl LayoutGrid {
    /// Build a grid from rows of cells, enforcing equal row lengths.
    pub fn from_cells(cells: Vec<Vec<LayoutCell>>) -> Result<Self> {
        if let Some(first) = cells.first() {
            let cols = first.len();
            if let Some((i, row)) = cells.iter().enumerate().find(|(_, r)| r.len() != cols) {
                return Err(Error::Layout(format!(
                    "jagged grid: row {} has {} cells, expected {}",
                    i,
                    row.len(),
                    cols
                )));
            }
        }
        Ok(Self { cells })
    }

    pub fn rows(&self) -> usize {
        self.cells.len()
    }

    pub fn cols(&self) -> usize {
        self.cells.first().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&LayoutCell> {
        self.cells.get(row).and_then(|r| r.get(col))
    }

    /// Rows of cells, for rendering and for the optimize payload.
    pub fn cells(&self) -> &[Vec<LayoutCell>] {
        &self.cells
    }

    /// Set one cell's zone; false when out of bounds.
    fn set_zone(&mut self, row: usize, col: usize, zone: ZoneType) -> bool {
        match self.cells.get_mut(row).and_then(|r| r.get_mut(col)) {
            Some(cell) => {
                cell.zone = zone;
                true
            }
            None => false,
        }
    }
}

/// Serializable snapshot of the model's local state, for callers that
/// persist a grid between invocations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutSnapshot {
    pub grid: Vec<Vec<LayoutCell>>,
    pub cell_size: f64,
    /// Whether the last grid-replacing operation was an optimization
    pub optimized: bool,
}

/// Owns the layout grid and its round-trips to the backend.
pub struct LayoutModel<B: LayoutBackend> {
    backend: B,
    grid: LayoutGrid,
    cell_size: f64,
    palette: &'static [ZoneType],
    state: RequestState,
}

impl<B: LayoutBackend> LayoutModel<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            grid: LayoutGrid::default(),
            cell_size: 1.0,
            palette: &TEMPLATE_ZONES,
            state: RequestState::Idle,
        }
    }

    /// Rebuild a model from a persisted snapshot.
    pub fn restore(backend: B, snapshot: LayoutSnapshot) -> Result<Self> {
        let grid = LayoutGrid::from_cells(snapshot.grid)?;
        Ok(Self {
            backend,
            grid,
            cell_size: snapshot.cell_size,
            palette: if snapshot.optimized {
                &ALL_ZONES
            } else {
                &TEMPLATE_ZONES
            },
            state: RequestState::Idle,
        })
    }

    /// Snapshot the local state for persistence.
    pub fn snapshot(&self) -> LayoutSnapshot {
        LayoutSnapshot {
            grid: self.grid.cells().to_vec(),
            cell_size: self.cell_size,
            optimized: self.palette.len() == ALL_ZONES.len(),
        }
    }

    pub fn grid(&self) -> &LayoutGrid {
        &self.grid
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Zone types currently on offer for edits.
    pub fn palette(&self) -> &[ZoneType] {
        self.palette
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    /// Request a fresh template grid of the given physical dimensions.
    ///
    /// On success the whole grid is replaced and the palette narrows to
    /// the structural zones. Failure leaves the grid untouched.
    pub async fn generate(&mut self, width: f64, height: f64, cell_size: f64) -> Result<()> {
        if self.state == RequestState::InFlight {
            return Err(Error::Busy);
        }

        self.state = RequestState::InFlight;
        let result = self.backend.generate_layout(width, height, cell_size).await;
        self.state = RequestState::Idle;

        let response = result?;
        let grid = LayoutGrid::from_cells(response.grid)?;
        if grid.rows() != response.rows || grid.cols() != response.cols {
            return Err(Error::Layout(format!(
                "template dimensions mismatch: got {}x{}, response claims {}x{}",
                grid.rows(),
                grid.cols(),
                response.rows,
                response.cols
            )));
        }

        tracing::info!(rows = grid.rows(), cols = grid.cols(), "Generated layout template");
        self.grid = grid;
        self.cell_size = cell_size;
        self.palette = &TEMPLATE_ZONES;
        Ok(())
    }

    /// Send the current grid for optimization.
    ///
    /// On success the whole grid is replaced and the palette widens to
    /// all nine zones. Failure is returned to the caller with the grid
    /// unchanged; there is no automatic retry.
    pub async fn optimize(&mut self) -> Result<()> {
        if self.state == RequestState::InFlight {
            return Err(Error::Busy);
        }
        if self.grid.is_empty() {
            return Err(Error::Layout("no grid to optimize".to_string()));
        }

        self.state = RequestState::InFlight;
        let result = self
            .backend
            .optimize_layout(
                self.grid.cells(),
                self.grid.rows(),
                self.grid.cols(),
                self.cell_size,
            )
            .await;
        self.state = RequestState::Idle;

        let grid = LayoutGrid::from_cells(result?)?;
        tracing::info!(rows = grid.rows(), cols = grid.cols(), "Optimized layout");
        self.grid = grid;
        self.palette = &ALL_ZONES;
        Ok(())
    }

    /// Set one cell's zone in place. Out-of-bounds coordinates are a
    /// silent no-op; this is the only local, network-free mutation.
    pub fn edit_cell(&mut self, row: usize, col: usize, zone: ZoneType) {
        if !self.grid.set_zone(row, col, zone) {
            tracing::debug!(row, col, "Ignoring out-of-bounds cell edit");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::LayoutTemplateResponse;
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn cell(zone: ZoneType, x: usize, y: usize) -> LayoutCell {
        LayoutCell { zone, x, y }
    }

    /// Builds a rows x cols walkway grid with a door at the origin, the
    /// same shape the backend template endpoint produces.
    fn template_cells(rows: usize, cols: usize) -> Vec<Vec<LayoutCell>> {
        (0..rows)
            .map(|y| {
                (0..cols)
                    .map(|x| {
                        let zone = if x == 0 && y == 0 {
                            ZoneType::Door
                        } else {
                            ZoneType::Walkway
                        };
                        cell(zone, x, y)
                    })
                    .collect()
            })
            .collect()
    }

    #[derive(Default)]
    struct FakeLayoutBackend {
        template: Option<(usize, usize)>,
        optimized: Option<Vec<Vec<LayoutCell>>>,
        requests: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LayoutBackend for FakeLayoutBackend {
        async fn generate_layout(
            &self,
            width: f64,
            height: f64,
            cell_size: f64,
        ) -> crate::error::Result<LayoutTemplateResponse> {
            self.requests
                .lock()
                .unwrap()
                .push(format!("generate:{}x{}@{}", width, height, cell_size));
            let (rows, cols) = self
                .template
                .ok_or_else(|| Error::Api("generator down".to_string()))?;
            Ok(LayoutTemplateResponse {
                grid: template_cells(rows, cols),
                rows,
                cols,
                cell_size,
            })
        }

        async fn optimize_layout(
            &self,
            _grid: &[Vec<LayoutCell>],
            rows: usize,
            cols: usize,
            _cell_size: f64,
        ) -> crate::error::Result<Vec<Vec<LayoutCell>>> {
            self.requests
                .lock()
                .unwrap()
                .push(format!("optimize:{}x{}", rows, cols));
            self.optimized
                .clone()
                .ok_or_else(|| Error::Api("optimizer down".to_string()))
        }
    }

    #[tokio::test]
    async fn test_generate_replaces_grid_and_narrows_palette() {
        let backend = FakeLayoutBackend {
            template: Some((5, 5)),
            ..Default::default()
        };
        let mut model = LayoutModel::new(backend);

        model.generate(5.0, 5.0, 1.0).await.unwrap();

        assert_eq!(model.grid().rows(), 5);
        assert_eq!(model.grid().cols(), 5);
        assert_eq!(model.palette(), &TEMPLATE_ZONES);
        assert_eq!(model.state(), RequestState::Idle);
        for row in model.grid().cells() {
            for c in row {
                assert!(TEMPLATE_ZONES.contains(&c.zone));
            }
        }
    }

    #[tokio::test]
    async fn test_optimize_widens_palette() {
        let backend = FakeLayoutBackend {
            template: Some((3, 3)),
            optimized: Some(vec![
                vec![cell(ZoneType::Door, 0, 0), cell(ZoneType::Cashier, 1, 0)],
                vec![cell(ZoneType::Walkway, 0, 1), cell(ZoneType::Aisle, 1, 1)],
            ]),
            ..Default::default()
        };
        let mut model = LayoutModel::new(backend);
        model.generate(3.0, 3.0, 1.0).await.unwrap();

        model.optimize().await.unwrap();

        assert_eq!(model.grid().rows(), 2);
        assert_eq!(model.palette(), &ALL_ZONES);
        assert_eq!(
            model.grid().cell(1, 1).map(|c| c.zone),
            Some(ZoneType::Aisle)
        );
    }

    #[tokio::test]
    async fn test_optimize_failure_leaves_grid_unchanged() {
        let backend = FakeLayoutBackend {
            template: Some((4, 4)),
            optimized: None, // optimizer fails
            ..Default::default()
        };
        let mut model = LayoutModel::new(backend);
        model.generate(4.0, 4.0, 1.0).await.unwrap();
        let before = model.grid().clone();

        let result = model.optimize().await;

        assert!(result.is_err());
        assert_eq!(*model.grid(), before);
        assert_eq!(model.palette(), &TEMPLATE_ZONES);
        assert_eq!(model.state(), RequestState::Idle);
    }

    #[tokio::test]
    async fn test_optimize_without_grid_is_an_error() {
        let mut model = LayoutModel::new(FakeLayoutBackend::default());
        assert!(model.optimize().await.is_err());
    }

    #[tokio::test]
    async fn test_edit_cell_in_bounds_and_out_of_bounds() {
        let backend = FakeLayoutBackend {
            template: Some((5, 5)),
            ..Default::default()
        };
        let mut model = LayoutModel::new(backend);
        model.generate(5.0, 5.0, 1.0).await.unwrap();

        model.edit_cell(2, 3, ZoneType::Door);
        assert_eq!(model.grid().cell(2, 3).map(|c| c.zone), Some(ZoneType::Door));

        let before = model.grid().clone();
        model.edit_cell(10, 10, ZoneType::Door);
        assert_eq!(*model.grid(), before);
    }

    #[test]
    fn test_jagged_grid_is_rejected() {
        let cells = vec![
            vec![cell(ZoneType::Walkway, 0, 0), cell(ZoneType::Walkway, 1, 0)],
            vec![cell(ZoneType::Walkway, 0, 1)],
        ];
        assert!(matches!(
            LayoutGrid::from_cells(cells),
            Err(Error::Layout(_))
        ));
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_rejected() {
        struct LyingBackend;

        #[async_trait]
        impl LayoutBackend for LyingBackend {
            async fn generate_layout(
                &self,
                _width: f64,
                _height: f64,
                cell_size: f64,
            ) -> crate::error::Result<LayoutTemplateResponse> {
                Ok(LayoutTemplateResponse {
                    grid: template_cells(2, 2),
                    rows: 3, // does not match the grid
                    cols: 2,
                    cell_size,
                })
            }

            async fn optimize_layout(
                &self,
                _grid: &[Vec<LayoutCell>],
                _rows: usize,
                _cols: usize,
                _cell_size: f64,
            ) -> crate::error::Result<Vec<Vec<LayoutCell>>> {
                unimplemented!("not used in this test")
            }
        }

        let mut model = LayoutModel::new(LyingBackend);
        assert!(matches!(
            model.generate(2.0, 2.0, 1.0).await,
            Err(Error::Layout(_))
        ));
        assert!(model.grid().is_empty());
    }

    #[tokio::test]
    async fn test_busy_model_rejects_overlapping_requests() {
        let backend = FakeLayoutBackend {
            template: Some((2, 2)),
            ..Default::default()
        };
        let mut model = LayoutModel::new(backend);
        model.state = RequestState::InFlight;

        assert!(matches!(
            model.generate(2.0, 2.0, 1.0).await,
            Err(Error::Busy)
        ));
        assert!(matches!(model.optimize().await, Err(Error::Busy)));
    }

    #[tokio::test]
    async fn test_snapshot_round_trip_preserves_palette() {
        let backend = FakeLayoutBackend {
            template: Some((2, 2)),
            optimized: Some(template_cells(2, 2)),
            ..Default::default()
        };
        let mut model = LayoutModel::new(backend);
        model.generate(2.0, 2.0, 1.0).await.unwrap();
        model.optimize().await.unwrap();

        let snapshot = model.snapshot();
        assert!(snapshot.optimized);

        let restored =
            LayoutModel::restore(FakeLayoutBackend::default(), snapshot).unwrap();
        assert_eq!(restored.palette(), &ALL_ZONES);
        assert_eq!(restored.grid().rows(), 2);
    }

    #[test]
    fn test_zone_type_parse() {
        assert_eq!("StaffRoom".parse::<ZoneType>(), Ok(ZoneType::StaffRoom));
        assert!("Bakery".parse::<ZoneType>().is_err());
    }
}
