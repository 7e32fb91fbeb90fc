//! Static layout construction and validation tests

use city_parking::simulation::{
    CityConfig, CityLayout, Cell, Direction, Directions, MAX_GRID_CELLS,
};

fn cell(x: i32, y: i32) -> Cell {
    Cell::new(x, y)
}

#[test]
fn test_open_grid_defaults_to_all_directions() {
    let layout = CityLayout::new(&CityConfig::open_grid(4, 3)).expect("valid layout");

    assert_eq!(layout.width(), 4);
    assert_eq!(layout.height(), 3);
    assert_eq!(layout.cell_count(), 12);
    for c in layout.cells() {
        assert_eq!(layout.allowed_directions(c), Directions::ALL);
        assert!(!layout.is_building(c));
        assert!(!layout.is_parking_lot(c));
    }
    assert_eq!(layout.allowed_directions(cell(4, 0)), Directions::NONE);
}

#[test]
fn test_buildings_and_parking_lot_ids() {
    let config = CityConfig::open_grid(5, 5)
        .with_building([cell(1, 1), cell(1, 2)])
        .with_parking_lots([cell(3, 3), cell(0, 4), cell(4, 0)]);
    let layout = CityLayout::new(&config).expect("valid layout");

    assert!(layout.is_building(cell(1, 1)));
    assert!(layout.is_building(cell(1, 2)));
    assert_eq!(layout.allowed_directions(cell(1, 1)), Directions::NONE);

    assert_eq!(layout.parking_lot_id(cell(3, 3)), Some(1));
    assert_eq!(layout.parking_lot_id(cell(0, 4)), Some(2));
    assert_eq!(layout.parking_lot_id(cell(4, 0)), Some(3));
    assert_eq!(layout.parking_lot_id(cell(2, 2)), None);
    assert_eq!(layout.parking_lots(), &[cell(3, 3), cell(0, 4), cell(4, 0)]);

    let road_cells = layout.road_cells().count();
    assert_eq!(road_cells, 25 - 2 - 3);
}

#[test]
fn test_repeated_overrides_are_combined() {
    let config = CityConfig::open_grid(3, 3)
        .with_road("NE", [cell(1, 1), cell(0, 0)])
        .with_road("SE", [cell(1, 1)]);
    let layout = CityLayout::new(&config).expect("valid layout");

    let directions = layout.allowed_directions(cell(1, 1));
    assert!(directions.contains(Direction::North));
    assert!(directions.contains(Direction::East));
    assert!(directions.contains(Direction::South));
    assert!(!directions.contains(Direction::West));
    assert_eq!(directions.len(), 3);

    assert_eq!(
        layout.allowed_directions(cell(0, 0)),
        [Direction::North, Direction::East]
            .into_iter()
            .collect::<Directions>()
    );
}

#[test]
fn test_overrides_on_parking_lots_are_ignored() {
    let config = CityConfig::open_grid(3, 3)
        .with_parking_lots([cell(2, 2)])
        .with_road("S", [cell(2, 2)]);
    let layout = CityLayout::new(&config).expect("valid layout");

    assert_eq!(layout.allowed_directions(cell(2, 2)), Directions::ALL);
}

#[test]
fn test_custom_default_directions() {
    let mut config = CityConfig::open_grid(2, 2);
    config.default_directions = "NE".to_string();
    let layout = CityLayout::new(&config).expect("valid layout");

    assert!(layout.permits_move(cell(0, 0), cell(1, 0)));
    assert!(layout.permits_move(cell(0, 0), cell(0, 1)));
    assert!(!layout.permits_move(cell(1, 0), cell(0, 0)));
}

#[test]
fn test_road_graph_respects_buildings_and_directions() {
    let config = CityConfig::open_grid(3, 1)
        .with_building([cell(2, 0)])
        .with_road("E", [cell(0, 0)]);
    let layout = CityLayout::new(&config).expect("valid layout");

    assert!(layout.permits_move(cell(0, 0), cell(1, 0)));
    // Building cells are never entered
    assert!(!layout.permits_move(cell(1, 0), cell(2, 0)));
    assert!(layout.permits_move(cell(1, 0), cell(0, 0)));
    // Not adjacent
    assert!(!layout.permits_move(cell(0, 0), cell(2, 0)));

    let neighbors: Vec<Cell> = layout
        .road_neighbors(cell(1, 0))
        .map(|(neighbor, _)| neighbor)
        .collect();
    assert_eq!(neighbors, vec![cell(0, 0)]);
}

#[test]
fn test_rejects_empty_grid() {
    assert!(CityLayout::new(&CityConfig::open_grid(0, 5)).is_err());
    assert!(CityLayout::new(&CityConfig::open_grid(5, -1)).is_err());
}

#[test]
fn test_rejects_oversized_grid() {
    let err = CityLayout::new(&CityConfig::open_grid(70_000, 70_000)).expect_err("too many cells");
    assert!(format!("{:#}", err).contains("exceeds the limit"));

    assert!(CityLayout::new(&CityConfig::open_grid(i32::MAX, 2)).is_err());

    let side = 1 << 12;
    let too_wide = CityConfig::open_grid(side + 1, side);
    assert!(CityLayout::new(&too_wide).is_err());
    assert!((side * side) as usize <= MAX_GRID_CELLS);
}

#[test]
fn test_rejects_out_of_bounds_coordinates() {
    let building = CityConfig::open_grid(3, 3).with_building([cell(3, 0)]);
    assert!(CityLayout::new(&building).is_err());

    let lot = CityConfig::open_grid(3, 3).with_parking_lots([cell(0, -1)]);
    assert!(CityLayout::new(&lot).is_err());

    let road = CityConfig::open_grid(3, 3).with_road("N", [cell(1, 7)]);
    let err = CityLayout::new(&road).expect_err("override outside grid");
    assert!(format!("{:#}", err).contains("outside the 3x3 grid"));
}

#[test]
fn test_rejects_building_parking_lot_overlap() {
    let config = CityConfig::open_grid(3, 3)
        .with_building([cell(1, 1)])
        .with_parking_lots([cell(1, 1)]);
    let err = CityLayout::new(&config).expect_err("overlap must fail");
    assert!(format!("{:#}", err).contains("both building and parking lot"));
}

#[test]
fn test_rejects_duplicate_parking_lot() {
    let config = CityConfig::open_grid(3, 3).with_parking_lots([cell(0, 0), cell(0, 0)]);
    assert!(CityLayout::new(&config).is_err());
}

#[test]
fn test_rejects_bad_direction_sets() {
    let empty = CityConfig::open_grid(3, 3).with_road("", [cell(0, 0)]);
    assert!(CityLayout::new(&empty).is_err());

    let unknown = CityConfig::open_grid(3, 3).with_road("NX", [cell(0, 0)]);
    assert!(CityLayout::new(&unknown).is_err());

    let mut no_default = CityConfig::open_grid(3, 3);
    no_default.default_directions = String::new();
    assert!(CityLayout::new(&no_default).is_err());
}

#[test]
fn test_disconnected_parking_lots() {
    // (1, 0) only leads east, so nothing ever comes back to (0, 0)
    let config = CityConfig::open_grid(3, 1)
        .with_parking_lots([cell(0, 0), cell(2, 0)])
        .with_road("E", [cell(1, 0)]);
    let layout = CityLayout::new(&config).expect("valid layout");
    assert_eq!(
        layout.disconnected_parking_lots(),
        vec![cell(0, 0), cell(2, 0)]
    );

    let open = CityConfig::open_grid(3, 1).with_parking_lots([cell(0, 0), cell(2, 0)]);
    let layout = CityLayout::new(&open).expect("valid layout");
    assert!(layout.disconnected_parking_lots().is_empty());
}

#[test]
fn test_downtown_map_layout() {
    let config = CityConfig::downtown().expect("bundled map parses");
    let layout = CityLayout::new(&config).expect("bundled map is valid");

    assert_eq!((layout.width(), layout.height()), (24, 24));
    assert_eq!(layout.parking_lots().len(), 17);
    assert_eq!(layout.parking_lot_id(cell(2, 9)), Some(1));
    assert_eq!(layout.parking_lot_id(cell(20, 19)), Some(17));
    assert!(layout.is_building(cell(2, 2)));
    assert!(!layout.is_building(cell(2, 9)));

    assert_eq!(layout.allowed_directions(cell(0, 0)), Directions::parse("NE").unwrap());
    assert_eq!(layout.allowed_directions(cell(23, 5)), Directions::parse("SW").unwrap());
    // Corner cells where the northbound and southbound lanes meet
    assert_eq!(layout.allowed_directions(cell(1, 15)), Directions::parse("SE").unwrap());
    assert_eq!(layout.allowed_directions(cell(1, 13)), Directions::parse("SW").unwrap());
    assert_eq!(layout.allowed_directions(cell(13, 22)), Directions::parse("NSE").unwrap());
    assert!(!layout.permits_move(cell(1, 15), cell(1, 16)));
    // Parking lots keep every direction
    assert_eq!(layout.allowed_directions(cell(17, 2)), Directions::ALL);

    for c in layout.cells() {
        if !layout.is_building(c) {
            assert!(!layout.allowed_directions(c).is_empty(), "{} has no exit", c);
        }
    }
}
