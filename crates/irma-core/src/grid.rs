//! Flat bounded world grid.

use std::fmt;

use rand::Rng;

use crate::cell::{Cell, Token};
use crate::config::{ConfigError, IrmaConfig};
use crate::sink::{NullView, WorldView};

/// Number of neighbour directions.
pub const DIRECTIONS: usize = 8;

/// Fixed `width * height` array of cells addressed by `y * width + x`.
pub struct Grid {
    width: u32,
    height: u32,
    cells: Vec<Cell>,
    dirs: [i64; DIRECTIONS],
    palette: Vec<u32>,
    org_color: u32,
    view: Box<dyn WorldView>,
}

impl fmt::Debug for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grid")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("occupied", &self.cells.iter().filter(|c| !c.is_empty()).count())
            .finish()
    }
}

impl Grid {
    /// Construct an empty grid without a rendering sink.
    pub fn new(width: u32, height: u32) -> Result<Self, ConfigError> {
        if width == 0 || height == 0 {
            return Err(ConfigError::InvalidConfig(
                "grid dimensions must be non-zero",
            ));
        }
        let w = i64::from(width);
        Ok(Self {
            width,
            height,
            cells: vec![Cell::Empty; (width as usize) * (height as usize)],
            dirs: [-w, -w + 1, 1, w + 1, w, w - 1, -1, -w - 1],
            palette: Vec::new(),
            org_color: 0xffffff,
            view: Box::new(NullView),
        })
    }

    /// Construct a grid whose colors follow `config`.
    pub fn from_config(config: &IrmaConfig) -> Result<Self, ConfigError> {
        let mut grid = Self::new(config.world_width, config.world_height)?;
        grid.palette = config.surfaces.iter().map(|s| s.color).collect();
        grid.org_color = config.org_color;
        Ok(grid)
    }

    /// Replace the rendering sink.
    pub fn set_view(&mut self, view: Box<dyn WorldView>) {
        self.view = view;
    }

    /// Forward a status line to the rendering sink.
    pub fn title(&mut self, text: &str) {
        self.view.title(text);
    }

    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Converts an offset into `(x, y)`.
    #[inline]
    #[must_use]
    pub fn xy(&self, offset: usize) -> (u32, u32) {
        let w = self.width as usize;
        ((offset % w) as u32, (offset / w) as u32)
    }

    /// Converts `(x, y)` into an offset, if inside the grid.
    #[must_use]
    pub fn offset(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height)
            .then(|| (y as usize) * (self.width as usize) + (x as usize))
    }

    /// Occupant of `offset`; out-of-range offsets read as empty.
    #[inline]
    #[must_use]
    pub fn get(&self, offset: usize) -> Cell {
        self.cells.get(offset).copied().unwrap_or_default()
    }

    /// Offset reached from `offset` in direction `dir % 8`, shifted by `extra`.
    ///
    /// Only the flat range is checked: stepping off a row edge lands on the
    /// neighbouring row.
    #[inline]
    #[must_use]
    pub fn neighbor(&self, offset: usize, dir: usize, extra: i64) -> Option<usize> {
        let target = (offset as i64)
            .saturating_add(self.dirs[dir % DIRECTIONS])
            .saturating_add(extra);
        (0..self.cells.len() as i64)
            .contains(&target)
            .then_some(target as usize)
    }

    /// Random empty offset, giving up after `attempts` probes.
    pub fn random_empty<R: Rng + ?Sized>(&self, rng: &mut R, attempts: usize) -> Option<usize> {
        (0..attempts)
            .map(|_| rng.random_range(0..self.cells.len()))
            .find(|&offset| self.cells[offset].is_empty())
    }

    /// Overwrite `offset` with `cell`.
    pub fn set(&mut self, offset: usize, cell: Cell) {
        let Some(slot) = self.cells.get_mut(offset) else {
            return;
        };
        *slot = cell;
        let (x, y) = self.xy(offset);
        match cell {
            Cell::Empty => self.view.empty(x, y),
            Cell::Org(_) => self.view.dot(x, y, self.org_color),
            Cell::Token(token) => {
                let color = self
                    .palette
                    .get(usize::from(token.kind))
                    .copied()
                    .unwrap_or(0xffffff);
                self.view.dot(x, y, color);
            }
        }
    }

    pub fn clear(&mut self, offset: usize) {
        self.set(offset, Cell::Empty);
    }

    pub fn set_org(&mut self, offset: usize, slot: usize) {
        self.set(offset, Cell::Org(slot));
    }

    pub fn set_token(&mut self, offset: usize, token: Token) {
        self.set(offset, Cell::Token(token));
    }

    /// Move the organism in `slot` from `from` to `to`, leaving `restore` behind.
    pub fn move_org(&mut self, from: usize, to: usize, slot: usize, restore: Cell) {
        self.set(from, restore);
        self.set(to, Cell::Org(slot));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use std::sync::{Arc, Mutex};

    #[test]
    fn offsets_and_neighbors() {
        let grid = Grid::new(4, 3).expect("grid");
        assert_eq!(grid.len(), 12);
        assert_eq!(grid.offset(1, 2), Some(9));
        assert_eq!(grid.offset(4, 0), None);
        assert_eq!(grid.xy(9), (1, 2));
        assert_eq!(grid.neighbor(5, 2, 0), Some(6));
        assert_eq!(grid.neighbor(5, 4, 0), Some(9));
        assert_eq!(grid.neighbor(1, 0, 0), None);
        assert_eq!(grid.neighbor(11, 3, 0), None);
        assert_eq!(grid.neighbor(5, 10, 0), Some(6), "direction wraps modulo 8");
        assert_eq!(grid.neighbor(0, 2, 3), Some(4));
        assert_eq!(grid.get(100), Cell::Empty);
    }

    #[test]
    fn random_empty_skips_occupied_cells() {
        let mut grid = Grid::new(2, 1).expect("grid");
        grid.set_org(0, 0);
        let mut rng = SmallRng::seed_from_u64(3);
        assert_eq!(grid.random_empty(&mut rng, 64), Some(1));
        grid.set_token(1, Token::unit(0));
        assert_eq!(grid.random_empty(&mut rng, 64), None);
    }

    #[derive(Clone, Default)]
    struct SpyView {
        events: Arc<Mutex<Vec<(u32, u32, Option<u32>)>>>,
    }

    impl WorldView for SpyView {
        fn dot(&mut self, x: u32, y: u32, color: u32) {
            self.events.lock().unwrap().push((x, y, Some(color)));
        }

        fn empty(&mut self, x: u32, y: u32) {
            self.events.lock().unwrap().push((x, y, None));
        }

        fn title(&mut self, _text: &str) {}
    }

    #[test]
    fn move_org_notifies_view() {
        let config = IrmaConfig {
            world_width: 3,
            world_height: 3,
            ..IrmaConfig::default()
        };
        let mut grid = Grid::from_config(&config).expect("grid");
        let spy = SpyView::default();
        let events = spy.events.clone();
        grid.set_view(Box::new(spy));

        grid.set_org(4, 7);
        grid.move_org(4, 5, 7, Cell::Token(Token::unit(0)));
        assert_eq!(grid.get(4), Cell::Token(Token::unit(0)));
        assert_eq!(grid.get(5), Cell::Org(7));

        let events = events.lock().unwrap();
        assert_eq!(
            *events,
            vec![
                (1, 1, Some(config.org_color)),
                (1, 1, Some(config.surfaces[0].color)),
                (2, 1, Some(config.org_color)),
            ]
        );
    }
}
