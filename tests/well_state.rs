mod common;

use common::{binary_file, intehead};
use eclio::ecl::restart::header::intehead as ih;
use eclio::ecl::restart::state::{icon, iseg, iwel, xcon};
use eclio::ecl::restart::well_state::well_nr_in_lgr;
use eclio::{EclArray, GridId, RestartFile, RestartHeader, UnitSystemTables, WellState};

const NIWELZ: usize = 72;
const NICONZ: usize = 15;
const NXCONZ: usize = 35;
const NISEGZ: usize = 4;
const NRSEGZ: usize = 3;

fn iwel_window(head: (i32, i32), nconn: i32, msw: Option<(i32, i32)>) -> Vec<i32> {
    let mut window = vec![0; NIWELZ];
    window[iwel::IHEAD] = head.0;
    window[iwel::JHEAD] = head.1;
    window[iwel::NCONN] = nconn;
    window[iwel::WTYPE] = 1;
    window[iwel::STATUS] = 1;
    if let Some((id, nseg)) = msw {
        window[iwel::MSW_ID] = id;
        window[iwel::NWSEG] = nseg;
    }
    window
}

fn icon_window(ijk: (i32, i32, i32), open: bool, segment: i32) -> Vec<i32> {
    let mut window = vec![0; NICONZ];
    window[icon::I] = ijk.0;
    window[icon::J] = ijk.1;
    window[icon::K] = ijk.2;
    window[icon::STATUS] = if open { 1 } else { 0 };
    window[icon::SEGMENT] = segment;
    window
}

fn iseg_window(outlet: i32, branch: i32) -> Vec<i32> {
    let mut window = vec![0; NISEGZ];
    window[iseg::OUTLET] = outlet;
    window[iseg::BRANCH] = branch;
    window
}

/// Two global wells, `P1` and the multi-segment `MSW`, followed by two
/// local grids. `LGR1` has its own header and completes `MSW`; `LGR2` is empty.
fn step_arrays() -> Vec<EclArray> {
    let mut iwel_data = iwel_window((3, 4), 2, None);
    iwel_data.extend(iwel_window((5, 5), 2, Some((1, 4))));

    let mut icon_data = icon_window((3, 4, 1), true, 0);
    icon_data.extend(icon_window((3, 4, 2), false, 0));
    icon_data.extend(icon_window((5, 5, 1), true, 3));
    icon_data.extend(icon_window((5, 5, 2), true, 4));

    let mut xcon_data = vec![0.0; 4 * NXCONZ];
    xcon_data[xcon::OIL] = 86.4;
    xcon_data[xcon::PRESSURE] = 200.0;

    // Segments 1 and 2 form branch 1; segments 3 and 4 form branch 2,
    // which drains into segment 1.
    let mut iseg_data = iseg_window(0, 1);
    iseg_data.extend(iseg_window(1, 1));
    iseg_data.extend(iseg_window(1, 2));
    iseg_data.extend(iseg_window(3, 2));

    let rseg_data = vec![
        10.0, 1000.0, 0.1, //
        20.0, 1010.0, 0.1, //
        15.0, 1005.0, 0.08, //
        15.0, 1012.0, 0.08,
    ];

    vec![
        EclArray::inte(
            "INTEHEAD",
            intehead(&[
                (ih::NWELLS, 2),
                (ih::NCWMAX, 2),
                (ih::NIWELZ, NIWELZ as i32),
                (ih::NZWELZ, 1),
                (ih::NICONZ, NICONZ as i32),
                (ih::NSCONZ, 1),
                (ih::NXCONZ, NXCONZ as i32),
                (ih::NSWLMX, 1),
                (ih::NSEGMX, 4),
                (ih::NISEGZ, NISEGZ as i32),
                (ih::NRSEGZ, NRSEGZ as i32),
            ]),
        ),
        EclArray::char("ZWEL", ["P1", "MSW"]),
        EclArray::inte("IWEL", iwel_data),
        EclArray::inte("ICON", icon_data),
        EclArray::real("SCON", vec![10.0, 20.0, 30.0, 40.0]),
        EclArray::doub("XCON", xcon_data),
        EclArray::inte("ISEG", iseg_data),
        EclArray::doub("RSEG", rseg_data),
        EclArray::char("LGR", ["LGR1"]),
        EclArray::inte(
            "INTEHEAD",
            intehead(&[
                (ih::NWELLS, 1),
                (ih::NCWMAX, 1),
                (ih::NIWELZ, 5),
                (ih::NZWELZ, 1),
                (ih::NICONZ, NICONZ as i32),
            ]),
        ),
        EclArray::char("ZWEL", ["MSW"]),
        EclArray::inte("IWEL", vec![0, 0, 0, 0, 1]),
        EclArray::inte("ICON", icon_window((2, 2, 3), true, 0)),
        EclArray::mess("ENDLGR"),
        EclArray::char("LGR", ["LGR2"]),
        EclArray::mess("ENDLGR"),
    ]
}

fn lgr_names() -> Vec<String> {
    vec!["LGR1".to_string(), "LGR2".to_string()]
}

fn load_wells() -> Vec<WellState> {
    let file = binary_file(&step_arrays());
    let step = file.view();
    let header = RestartHeader::load(&step.global()).unwrap();
    WellState::load_all(&step, &header, &lgr_names()).unwrap()
}

#[test]
fn global_connections_are_decoded() {
    let wells = load_wells();
    assert_eq!(wells.len(), 2);

    let p1 = &wells[0];
    assert_eq!(p1.name, "P1");
    assert_eq!(p1.head, (2, 3));
    assert!(p1.open);
    assert!(!p1.is_msw());
    assert_eq!(p1.grids().collect::<Vec<_>>(), [GridId::Global]);

    let connections = p1.connections(GridId::Global);
    assert_eq!(connections.len(), 2);
    assert_eq!(connections[0].ijk, (2, 3, 0));
    assert_eq!(connections[1].ijk, (2, 3, 1));
    assert!(connections[0].open);
    assert!(!connections[1].open);
    assert_eq!(connections[0].segment, None);
    assert_eq!(connections[0].connection_factor, 10.0);
    assert_eq!(connections[1].connection_factor, 20.0);
    assert!((connections[0].oil_rate - 0.001).abs() < 1e-12);
    assert!((connections[0].pressure - 200.0e5).abs() < 1e-6);
    assert_eq!(connections[1].oil_rate, 0.0);
    assert!(p1.connections(GridId::Lgr(0)).is_empty());
}

#[test]
fn segments_form_an_arena_with_branches() {
    let wells = load_wells();
    let msw = &wells[1];
    assert!(msw.is_msw());

    let segments = msw.segments();
    assert_eq!(segments.len(), 4);
    let numbers: Vec<usize> = segments.iter().map(|s| s.number).collect();
    assert_eq!(numbers, [1, 2, 3, 4]);
    let outlets: Vec<Option<usize>> = segments.iter().map(|s| s.outlet).collect();
    assert_eq!(outlets, [None, Some(0), Some(0), Some(2)]);
    assert_eq!(segments[0].length, 10.0);
    assert_eq!(segments[3].depth, 1012.0);
    assert_eq!(segments[2].diameter, 0.08);

    assert_eq!(segments[0].connections, Vec::<usize>::new());
    assert_eq!(segments[2].connections, [0]);
    assert_eq!(segments[3].connections, [1]);

    assert_eq!(msw.segment_index(4), Some(3));
    assert_eq!(msw.segment_index(9), None);
    assert_eq!(msw.inlets(0), [1, 2]);
    assert!(msw.inlets(3).is_empty());
    assert_eq!(msw.path_to_top(3), [3, 2, 0]);

    let branches = msw.branches();
    assert_eq!(branches.len(), 2);
    assert_eq!(branches[0].id, 1);
    assert_eq!(branches[0].segments, [0, 1]);
    assert_eq!(branches[0].start, 1);
    assert_eq!(branches[0].outlet, None);
    assert_eq!(branches[1].id, 2);
    assert_eq!(branches[1].segments, [2, 3]);
    assert_eq!(branches[1].start, 3);
    assert_eq!(branches[1].outlet, Some(0));
}

#[test]
fn local_grid_connections_are_keyed_by_grid() {
    let wells = load_wells();
    let msw = &wells[1];

    assert_eq!(msw.grids().collect::<Vec<_>>(), [GridId::Global, GridId::Lgr(0)]);
    assert_eq!(msw.num_connections(), 3);

    let local = msw.connections(GridId::Lgr(0));
    assert_eq!(local.len(), 1);
    assert_eq!(local[0].ijk, (1, 1, 2));
    assert_eq!(msw.lgr_connections("LGR1"), local);
    assert!(msw.lgr_connections("LGR2").is_empty());
    assert!(msw.lgr_connections("NOPE").is_empty());
}

#[test]
fn well_numbers_in_local_grids() {
    let file = binary_file(&step_arrays());
    let step = file.view();
    let lgr1 = step.lgr("LGR1").unwrap().unwrap();
    let lgr2 = step.lgr("LGR2").unwrap().unwrap();

    assert_eq!(well_nr_in_lgr("MSW", &lgr1).unwrap(), Some(0));
    assert_eq!(well_nr_in_lgr("P1", &lgr1).unwrap(), None);
    assert_eq!(well_nr_in_lgr("MSW", &lgr2).unwrap(), None);
}

#[test]
fn restart_file_assembles_wells_of_a_step() {
    let mut arrays = vec![EclArray::inte("SEQNUM", vec![12])];
    arrays.extend(step_arrays());
    let restart = RestartFile::from_array_file(binary_file(&arrays), None).unwrap();

    let wells = restart.well_states(12, UnitSystemTables::standard()).unwrap();
    let names: Vec<&str> = wells.iter().map(|w| w.name.as_str()).collect();
    assert_eq!(names, ["P1", "MSW"]);
    assert_eq!(wells[1].lgr_connections("LGR1").len(), 1);
}

#[test]
fn steps_without_wells_have_no_well_states() {
    let file = binary_file(&[EclArray::inte("INTEHEAD", intehead(&[]))]);
    let step = file.view();
    let header = RestartHeader::load(&step).unwrap();
    assert!(WellState::load_all(&step, &header, &[]).unwrap().is_empty());
}
