mod common;

use std::io::Cursor;
use std::sync::atomic::Ordering;

use common::{binary_bytes, binary_file, formatted_bytes, CountingReader};
use eclio::ecl::codec::RecordStream;
use eclio::ecl::types::elements::{element_sum, min_max};
use eclio::ecl::types::models::StreamMode;
use eclio::ecl::format::binary;
use eclio::{ArrayFile, ArrayType, ByteOrder, EclArray, EclError, OpenOptions, RestartFile};

fn sample_arrays() -> Vec<EclArray> {
    vec![
        EclArray::inte("INTEHEAD", (1..=1500).collect()),
        EclArray::doub("DOUBHEAD", vec![0.25, -1.5, 1e10, 0.0]),
        EclArray::logi("LOGIHEAD", vec![true, false, true]),
        EclArray::char("ZWEL", ["P1", "INJ-2", ""]),
        EclArray::mess("ENDSOL"),
        EclArray::c0nn("NAMES", 20, ["a longer well name", "x"]),
        EclArray::real("PRESSURE", vec![0.5, 100.0, -3.25]),
    ]
}

#[test]
fn lazy_loads_are_memoized() {
    let (reader, calls) = CountingReader::new(binary_bytes(&sample_arrays(), ByteOrder::Big));
    let file = ArrayFile::from_reader(reader, OpenOptions::default()).unwrap();
    assert!(!file.is_loaded(0));

    let before = calls.load(Ordering::SeqCst);
    let first = file.get::<i32>("INTEHEAD").unwrap();
    let after_first = calls.load(Ordering::SeqCst);
    assert!(after_first > before);
    assert!(file.is_loaded(0));

    let second = file.get::<i32>("INTEHEAD").unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), after_first);
    assert!(std::ptr::eq(first.as_ptr(), second.as_ptr()));
    assert_eq!(second.len(), 1500);
    assert_eq!(second[1499], 1500);
}

#[test]
fn binary_and_formatted_scans_agree() {
    let arrays = sample_arrays();
    let binary = binary_file(&arrays);
    let formatted = ArrayFile::from_reader(Cursor::new(formatted_bytes(&arrays)), OpenOptions::default()).unwrap();
    assert!(!binary.is_formatted());
    assert!(formatted.is_formatted());

    assert_eq!(binary.list(), formatted.list());
    assert_eq!(binary.list()[5], ("NAMES".to_string(), ArrayType::C0nn(20), 2));

    for file_ints in [binary.get::<i32>("INTEHEAD").unwrap(), formatted.get::<i32>("INTEHEAD").unwrap()] {
        assert_eq!(file_ints, (1..=1500).collect::<Vec<_>>().as_slice());
    }
    assert_eq!(formatted.get::<f64>("DOUBHEAD").unwrap(), &[0.25, -1.5, 1e10, 0.0]);
    assert_eq!(formatted.get::<bool>("LOGIHEAD").unwrap(), &[true, false, true]);
    assert_eq!(formatted.get::<String>("ZWEL").unwrap(), &["P1", "INJ-2", ""]);
    assert_eq!(formatted.get::<String>("NAMES").unwrap(), &["a longer well name", "x"]);
    assert_eq!(formatted.get::<f32>("PRESSURE").unwrap(), &[0.5, 100.0, -3.25]);

    assert_eq!(binary.get::<f64>("DOUBHEAD").unwrap(), formatted.get::<f64>("DOUBHEAD").unwrap());
    assert_eq!(binary.get::<String>("ZWEL").unwrap(), formatted.get::<String>("ZWEL").unwrap());
    assert_eq!(binary.end_offset(), binary_bytes(&arrays, ByteOrder::Big).len() as u64);
}

#[test]
fn little_endian_files_are_detected() {
    let bytes = binary_bytes(&sample_arrays(), ByteOrder::Little);
    let file = ArrayFile::from_reader(Cursor::new(bytes), OpenOptions::default()).unwrap();
    assert_eq!(file.byte_order(), ByteOrder::Little);
    assert_eq!(file.get::<f32>("PRESSURE").unwrap(), &[0.5, 100.0, -3.25]);
}

#[test]
fn typed_access_checks_the_stored_type() {
    let file = binary_file(&sample_arrays());
    match file.get::<f64>("INTEHEAD") {
        Err(EclError::TypeMismatch { name, expected, actual }) => {
            assert_eq!(name, "INTEHEAD");
            assert_eq!(expected, "DOUB");
            assert_eq!(actual, "INTE");
        }
        other => panic!("expected TypeMismatch, got {:?}", other),
    }
    assert!(matches!(file.get::<i32>("NOSUCH"), Err(EclError::MissingArray(_))));
    assert!(matches!(file.get_at::<i32>(99), Err(EclError::IndexOutOfRange { index: 99, .. })));
}

#[test]
fn repeated_names_are_addressed_by_occurrence() {
    let file = binary_file(&[
        EclArray::inte("SEQNUM", vec![1]),
        EclArray::inte("INTEHEAD", vec![10]),
        EclArray::inte("SEQNUM", vec![2]),
        EclArray::inte("INTEHEAD", vec![20]),
    ]);
    assert_eq!(file.count("INTEHEAD"), 2);
    assert_eq!(file.index_of("INTEHEAD"), Some(1));
    assert_eq!(file.nth_index_of("INTEHEAD", 1), Some(3));
    assert_eq!(file.get::<i32>("INTEHEAD").unwrap(), &[10]);
    assert_eq!(file.get_nth::<i32>("INTEHEAD", 1).unwrap(), &[20]);
    assert!(matches!(file.get_nth::<i32>("INTEHEAD", 2), Err(EclError::MissingArray(_))));

    file.load_all().unwrap();
    assert!((0..file.len()).all(|i| file.is_loaded(i)));
}

fn raw_file(records: &[Vec<u8>]) -> Vec<u8> {
    let mut stream = RecordStream::new(Cursor::new(Vec::new()), StreamMode::Write, false, ByteOrder::Big);
    for record in records {
        stream.write_record(record).unwrap();
    }
    stream.into_inner().into_inner()
}

fn raw_header(name: &[u8; 8], count: i32, type_name: &[u8; 4]) -> Vec<u8> {
    let mut header = name.to_vec();
    header.extend_from_slice(&count.to_be_bytes());
    header.extend_from_slice(type_name);
    header
}

#[test]
fn ix_files_are_recognized() {
    let eclipse = binary_file(&[EclArray::logi("LOGIHEAD", vec![true, false])]);
    assert!(!eclipse.is_ix());

    let with_c0nn = binary_file(&[EclArray::c0nn("ZWLS", 16, ["WELL-NAME"])]);
    assert!(with_c0nn.is_ix());

    let positive_true = raw_file(&[raw_header(b"LOGIHEAD", 2, b"LOGI"), vec![0, 0, 0, 1, 0, 0, 0, 0]]);
    let ix = ArrayFile::from_reader(Cursor::new(positive_true), OpenOptions::default()).unwrap();
    assert!(ix.is_ix());
    assert_eq!(ix.get::<bool>("LOGIHEAD").unwrap(), &[true, false]);
}

#[test]
fn unknown_array_types_are_rejected() {
    let bytes = raw_file(&[raw_header(b"WEIRD   ", 0, b"XXXX")]);
    match ArrayFile::from_reader(Cursor::new(bytes), OpenOptions::default()) {
        Err(EclError::UnsupportedArrayType { name, type_name }) => {
            assert_eq!(name, "WEIRD");
            assert_eq!(type_name, "XXXX");
        }
        other => panic!("expected UnsupportedArrayType, got {:?}", other.map(|f| f.list())),
    }
    assert_eq!(ArrayType::from_name("X231"), None);
    assert_eq!(ArrayType::from_name("C042"), Some(ArrayType::C0nn(42)));
}

#[test]
fn truncated_payloads_fail_the_scan() {
    let mut bytes = binary_bytes(&[EclArray::inte("PORV", vec![1; 10])], ByteOrder::Big);
    bytes.truncate(bytes.len() - 10);
    assert!(matches!(
        ArrayFile::from_reader(Cursor::new(bytes), OpenOptions::default()),
        Err(EclError::InvalidFormat(_))
    ));
}

#[test]
fn files_on_disk_use_their_extension() {
    let dir = tempfile::tempdir().unwrap();
    let arrays = sample_arrays();

    let binary_path = dir.path().join("CASE.UNRST");
    let mut stream = RecordStream::open_write(&binary_path, false, ByteOrder::Big).unwrap();
    for array in &arrays {
        binary::write_array(&mut stream, array).unwrap();
    }
    stream.flush().unwrap();
    drop(stream);

    let formatted_path = dir.path().join("CASE.FUNRST");
    std::fs::write(&formatted_path, formatted_bytes(&arrays)).unwrap();

    let binary = ArrayFile::open(&binary_path).unwrap();
    let formatted = ArrayFile::open(&formatted_path).unwrap();
    assert!(!binary.is_formatted());
    assert!(formatted.is_formatted());
    assert_eq!(binary.path(), binary_path.as_path());
    assert_eq!(binary.list(), formatted.list());

    let mut append = RecordStream::open_append(&binary_path, false, ByteOrder::Big).unwrap();
    binary::write_array(&mut append, &EclArray::inte("EXTRA", vec![7])).unwrap();
    drop(append);
    let appended = ArrayFile::open(&binary_path).unwrap();
    assert_eq!(appended.len(), arrays.len() + 1);
    assert_eq!(appended.get::<i32>("EXTRA").unwrap(), &[7]);
}

#[test]
fn non_unified_restart_files_take_the_report_from_the_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("CASE.X0007");
    let mut stream = RecordStream::open_write(&path, false, ByteOrder::Big).unwrap();
    binary::write_array(&mut stream, &EclArray::inte("INTEHEAD", common::intehead(&[]))).unwrap();
    drop(stream);

    let restart = RestartFile::open(&path).unwrap();
    assert!(!restart.is_unified());
    assert_eq!(restart.report_steps(), vec![7]);
    assert!(restart.step(7).is_some());
    assert!(restart.step(8).is_none());
}

#[test]
fn views_split_steps_and_local_grids() {
    let file = binary_file(&[
        EclArray::inte("SEQNUM", vec![1]),
        EclArray::inte("INTEHEAD", vec![1]),
        EclArray::char("LGR", ["LGR1"]),
        EclArray::inte("INTEHEAD", vec![2]),
        EclArray::mess("ENDLGR"),
        EclArray::inte("SEQNUM", vec![5]),
        EclArray::inte("INTEHEAD", vec![3]),
    ]);
    {
        let steps = file.view().split_at_key("SEQNUM");
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].len(), 5);
        assert_eq!(steps[1].range(), 5..7);

        let global = steps[0].global();
        assert_eq!(global.len(), 2);
        assert_eq!(global.count("INTEHEAD"), 1);
        assert_eq!(steps[0].count("INTEHEAD"), 2);

        let blocks = steps[0].lgr_blocks().unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].name, "LGR1");
        assert_eq!(blocks[0].view.get::<i32>("INTEHEAD").unwrap(), &[2]);
        assert!(steps[0].lgr("LGR2").unwrap().is_none());
        assert_eq!(steps[1].get::<i32>("INTEHEAD").unwrap(), &[3]);
    }

    let restart = RestartFile::from_array_file(file, None).unwrap();
    assert!(restart.is_unified());
    assert_eq!(restart.report_steps(), vec![1, 5]);
    assert_eq!(restart.step(5).unwrap().get::<i32>("INTEHEAD").unwrap(), &[3]);
}

#[test]
fn numeric_helpers_cover_every_numeric_type() {
    let file = binary_file(&sample_arrays());
    let ints = file.get::<i32>("INTEHEAD").unwrap();
    assert_eq!(element_sum(ints), f64::from(1500 * 1501 / 2));
    assert_eq!(min_max(ints), Some((1, 1500)));
    assert_eq!(min_max(file.get::<f32>("PRESSURE").unwrap()), Some((-3.25, 100.0)));
    assert_eq!(element_sum(file.get::<f64>("DOUBHEAD").unwrap()), 0.25 - 1.5 + 1e10);
    assert_eq!(min_max::<f64>(&[]), None);
}

#[test]
fn integer_sums_do_not_wrap() {
    assert_eq!(element_sum(&[i32::MAX, 1]), 2_147_483_648.0);
    assert_eq!(element_sum(&[i32::MIN, -1]), -2_147_483_649.0);
    assert_eq!(element_sum::<i32>(&[]), 0.0);
}

#[test]
fn three_digit_exponents_keep_the_field_width() {
    let arrays = [
        EclArray::doub("D", vec![1e-200, 1.0, 2.0, 3.0, -1e200]),
        EclArray::inte("E", vec![5]),
    ];
    let bytes = formatted_bytes(&arrays);
    let text = String::from_utf8(bytes.clone()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    // Three DOUB values per line, 23 characters each.
    assert_eq!(lines[1].len(), 3 * 23);
    assert_eq!(lines[2].len(), 2 * 23);
    assert!(lines[1].starts_with("   0.10000000000000-199"));
    assert!(lines[2].ends_with("  -0.10000000000000+201"));

    let file = ArrayFile::from_reader(Cursor::new(bytes), OpenOptions::default()).unwrap();
    let values = file.get::<f64>("D").unwrap();
    assert_eq!(values.len(), 5);
    for (value, expected) in values.iter().zip([1e-200, 1.0, 2.0, 3.0, -1e200]) {
        assert!((value - expected).abs() <= 1e-12 * expected.abs(), "{} != {}", value, expected);
    }
    assert_eq!(file.get::<i32>("E").unwrap(), &[5]);
}

#[test]
fn formatted_files_with_crlf_line_ends_are_read() {
    let arrays = [
        EclArray::inte("KEYS", (1..=8).collect::<Vec<i32>>()),
        EclArray::char("NAMES", ["P1", "INJ-2"]),
        EclArray::doub("X", vec![0.5]),
    ];
    let unix = String::from_utf8(formatted_bytes(&arrays)).unwrap();
    let dos = unix.replace('\n', "\r\n");

    let file = ArrayFile::from_reader(Cursor::new(dos.into_bytes()), OpenOptions::default()).unwrap();
    assert_eq!(file.list().len(), 3);
    assert_eq!(file.get::<i32>("KEYS").unwrap(), &[1, 2, 3, 4, 5, 6, 7, 8]);
    assert_eq!(file.get::<String>("NAMES").unwrap(), &["P1", "INJ-2"]);
    assert_eq!(file.get::<f64>("X").unwrap(), &[0.5]);
}
