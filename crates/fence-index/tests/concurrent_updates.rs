use std::thread;

use chrono::Utc;
use fence_core::geometry::Point;
use fence_core::ids::EntityId;
use fence_index::{CellKey, Grid, SpatialIndex};
use pretty_assertions::assert_eq;

const VEHICLES: usize = 64;
const ROUNDS: usize = 200;

fn membership_count(index: &SpatialIndex, id: &EntityId, span: i64) -> usize {
    let mut hits = 0;
    for x in -1..=span {
        for y in -1..=span {
            if index.cell_members(CellKey::new(x, y)).contains(id) {
                hits += 1;
            }
        }
    }
    hits
}

#[test]
fn parallel_moves_leave_each_vehicle_in_one_cell() {
    let index = SpatialIndex::new(Grid::new(1.0).unwrap(), 4).unwrap();
    let ids: Vec<EntityId> = (0..VEHICLES).map(|i| EntityId::new(format!("v{i:03}"))).collect();

    thread::scope(|scope| {
        for worker in 0..4_usize {
            let index = &index;
            let ids = &ids;
            scope.spawn(move || {
                for round in 0..ROUNDS {
                    for (i, id) in ids.iter().enumerate() {
                        #[allow(clippy::cast_precision_loss)]
                        let x = ((i + round + worker) % 8) as f64 + 0.5;
                        #[allow(clippy::cast_precision_loss)]
                        let y = ((i * 3 + round) % 8) as f64 + 0.5;
                        index.upsert(id, Point::new(x, y), Utc::now()).unwrap();
                    }
                }
            });
        }
    });

    assert_eq!(index.len(), VEHICLES);
    for id in &ids {
        let cell = index.cell_of(id).unwrap();
        assert_eq!(membership_count(&index, id, 8), 1, "{id} is not in exactly one cell");
        assert!(index.cell_members(cell).contains(id));
    }
}

#[test]
fn parallel_remove_and_reinsert_settles_consistently() {
    let index = SpatialIndex::new(Grid::new(0.5).unwrap(), 2).unwrap();
    let ids: Vec<EntityId> = (0..16).map(|i| EntityId::new(format!("r{i}"))).collect();

    thread::scope(|scope| {
        let index = &index;
        let ids = &ids;
        scope.spawn(move || {
            for _ in 0..ROUNDS {
                for id in ids {
                    index.upsert(id, Point::new(1.2, 1.2), Utc::now()).unwrap();
                }
            }
        });
        scope.spawn(move || {
            for _ in 0..ROUNDS {
                for id in ids {
                    index.remove(id);
                }
            }
        });
    });

    let tracked = index.len();
    let members = index.cell_members(CellKey::new(2, 2)).len();
    assert_eq!(tracked, members);
    assert!(index.occupied_cells() <= 1);
}
