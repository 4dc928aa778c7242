use std::io::Cursor;

use eclio::ecl::format::grdecl::{
    is_grdecl_file, next_keyword, read_keyword, read_keyword_data, read_keyword_name, read_records, seek_keyword,
    seek_next_keyword, GrdeclKind, GrdeclOptions, GrdeclValues,
};
use eclio::{ArrayData, EclError};

fn deck(text: &str) -> Cursor<&[u8]> {
    Cursor::new(text.as_bytes())
}

fn doubles(values: GrdeclValues) -> Vec<f64> {
    match values {
        GrdeclValues::Double(v) => v,
        other => panic!("expected doubles, got {:?}", other),
    }
}

#[test]
fn multiplier_expands_to_repeated_values() {
    let mut stream = deck("PERMX\n1000*0.25 /\n");
    let data = read_keyword("PERMX", false, &mut stream, &GrdeclOptions::default(), GrdeclKind::Double)
        .unwrap()
        .expect("PERMX present");
    assert!(!data.size_limit_exceeded);
    assert_eq!(doubles(data.values), vec![0.25; 1000]);
}

#[test]
fn plain_and_compressed_tokens_mix() {
    let mut stream = deck("PORO\n0.16 0.17 1000*0.20 /\n");
    let data = read_keyword("PORO", false, &mut stream, &GrdeclOptions::default(), GrdeclKind::Double)
        .unwrap()
        .unwrap();
    let mut expected = vec![0.16, 0.17];
    expected.extend(std::iter::repeat(0.20).take(1000));
    assert_eq!(doubles(data.values), expected);
}

#[test]
fn comments_and_blank_lines_are_ignored() {
    let text = "-- generated grid\n\nACTNUM\n  1 1 0 -- first row\n\n  2*1 /\nPORO -- porosity\n 5*0.3 /\n";
    let mut stream = deck(text);
    assert!(seek_next_keyword(&mut stream).unwrap());
    assert_eq!(read_keyword_name(&mut stream).unwrap().as_deref(), Some("ACTNUM"));
    let actnum = read_keyword_data(&mut stream, "ACTNUM", &GrdeclOptions::default(), GrdeclKind::Int).unwrap();
    assert_eq!(actnum.values, GrdeclValues::Int(vec![1, 1, 0, 1, 1]));

    assert!(seek_next_keyword(&mut stream).unwrap());
    assert_eq!(read_keyword_name(&mut stream).unwrap().as_deref(), Some("PORO"));
    let poro = read_keyword_data(&mut stream, "PORO", &GrdeclOptions::default(), GrdeclKind::Float).unwrap();
    assert_eq!(poro.values, GrdeclValues::Float(vec![0.3; 5]));
    assert!(!seek_next_keyword(&mut stream).unwrap());
}

#[test]
fn keywords_are_walked_in_order() {
    let text = "SPECGRID\n 2 1 1 1 F /\n-- note\nCOORD\n 6*0.0\n 6*1.0 /\nZCORN\n8*1.0 /\n";

    // Seeking without consuming stays on the same keyword.
    let mut stream = deck(text);
    assert!(seek_next_keyword(&mut stream).unwrap());
    let first = stream.position();
    assert!(seek_next_keyword(&mut stream).unwrap());
    assert_eq!(stream.position(), first);

    let mut stream = deck(text);
    let mut names = Vec::new();
    while let Some(name) = next_keyword(&mut stream).unwrap() {
        names.push(name);
    }
    assert_eq!(names, ["SPECGRID", "COORD", "ZCORN"]);
    assert_eq!(next_keyword(&mut stream).unwrap(), None);
}

#[test]
fn strict_mode_rejects_bad_tokens() {
    let text = "MULTZ\n1.0 abc 2.0 /\n";
    let strict = GrdeclOptions::default();
    match read_keyword("MULTZ", false, &mut deck(text), &strict, GrdeclKind::Double) {
        Err(EclError::MalformedKeywordData { keyword, token }) => {
            assert_eq!(keyword, "MULTZ");
            assert_eq!(token, "abc");
        }
        other => panic!("expected MalformedKeywordData, got {:?}", other),
    }

    let lenient = GrdeclOptions { strict: false, ..GrdeclOptions::default() };
    let data = read_keyword("MULTZ", false, &mut deck(text), &lenient, GrdeclKind::Double).unwrap().unwrap();
    assert_eq!(doubles(data.values), vec![1.0, 2.0]);
}

#[test]
fn size_limit_drops_data_and_flags_it() {
    let options = GrdeclOptions { max_elements: 10, ..GrdeclOptions::default() };
    let mut stream = deck("BIG\n4*1 20*2 3 /\nNEXT\n7 /\n");
    let data = read_keyword("BIG", false, &mut stream, &options, GrdeclKind::Int).unwrap().unwrap();
    assert!(data.size_limit_exceeded);
    assert!(data.is_empty());
    assert!(matches!(
        data.into_array("BIG", options.max_elements),
        Err(EclError::SizeLimitExceeded { limit: 10, .. })
    ));

    // The oversized keyword is consumed up to its terminator.
    let next = read_keyword("NEXT", false, &mut stream, &options, GrdeclKind::Int).unwrap().unwrap();
    assert_eq!(next.values, GrdeclValues::Int(vec![7]));
    let array = next.into_array("NEXT", options.max_elements).unwrap();
    assert_eq!(array.data, ArrayData::Inte(vec![7]));
}

#[test]
fn unterminated_keywords_keep_their_data() {
    let data = read_keyword("PORO", false, &mut deck("PORO\n0.1 0.2\n"), &GrdeclOptions::default(), GrdeclKind::Double)
        .unwrap()
        .unwrap();
    assert_eq!(doubles(data.values), vec![0.1, 0.2]);
}

#[test]
fn keyword_search_can_wrap_around() {
    let mut stream = deck("A\n1 /\nB\n2 /\n");
    let options = GrdeclOptions::default();
    read_keyword("B", false, &mut stream, &options, GrdeclKind::Int).unwrap().unwrap();
    let position = stream.position();

    assert!(!seek_keyword("A", false, &mut stream).unwrap());
    assert_eq!(stream.position(), position);
    assert!(read_keyword("C", true, &mut stream, &options, GrdeclKind::Int).unwrap().is_none());

    let a = read_keyword("A", true, &mut stream, &options, GrdeclKind::Int).unwrap().unwrap();
    assert_eq!(a.values, GrdeclValues::Int(vec![1]));
}

#[test]
fn records_keep_defaults_and_strip_quotes() {
    let mut stream = deck("VFPPROD\n 1 2000.0 'GAS' /\n 3* 4 -- items\n /\n 2*'THP' /\n");
    assert!(seek_keyword("VFPPROD", false, &mut stream).unwrap());
    read_keyword_name(&mut stream).unwrap();
    let records = read_records(&mut stream, 3).unwrap();
    assert_eq!(records[0], vec!["1", "2000.0", "GAS"]);
    assert_eq!(records[1], vec!["*", "*", "*", "4"]);
    assert_eq!(records[2], vec!["THP", "THP"]);
    assert!(matches!(read_records(&mut stream, 1), Err(EclError::InvalidFormat(_))));
}

#[test]
fn grdecl_sniffing() {
    let mut grdecl = deck("-- exported\n\nCOORD\n 1 2 3 /\n");
    assert!(is_grdecl_file(&mut grdecl).unwrap());
    assert_eq!(grdecl.position(), 0);

    assert!(!is_grdecl_file(&mut deck(" 'INTEHEAD'          3 'INTE'\n")).unwrap());
    assert!(!is_grdecl_file(&mut deck("1 2 3 /\n")).unwrap());
}
