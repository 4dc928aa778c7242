use std::io::Cursor;

use eclio::ecl::codec::{is_fortran_file, RecordStream};
use eclio::ecl::types::models::StreamMode;
use eclio::{ByteOrder, EclError};

fn write_records(payloads: &[&[u8]], order: ByteOrder) -> Vec<u8> {
    let mut stream = RecordStream::new(Cursor::new(Vec::new()), StreamMode::Write, false, order);
    for payload in payloads {
        stream.write_record(payload).unwrap();
    }
    assert_eq!(stream.record_count(), payloads.len() as u64);
    stream.into_inner().into_inner()
}

fn reader(bytes: Vec<u8>, order: ByteOrder) -> RecordStream<Cursor<Vec<u8>>> {
    RecordStream::new(Cursor::new(bytes), StreamMode::Read, false, order)
}

#[test]
fn records_round_trip_in_both_byte_orders() {
    let payloads: [&[u8]; 3] = [b"INTEHEAD", b"", b"some longer payload bytes"];
    for order in [ByteOrder::Big, ByteOrder::Little] {
        let bytes = write_records(&payloads, order);
        assert_eq!(bytes.len(), payloads.iter().map(|p| p.len() + 8).sum::<usize>());

        let mut stream = reader(bytes, order);
        for payload in payloads {
            let len = stream.begin_read().unwrap().expect("record present");
            assert_eq!(len as usize, payload.len());
            assert_eq!(stream.active_header(), Some(len));
            let mut buf = vec![0u8; payload.len()];
            stream.read_payload(&mut buf).unwrap();
            stream.end_read().unwrap();
            assert_eq!(buf, payload);
            assert_eq!(stream.active_header(), None);
        }
        assert_eq!(stream.begin_read().unwrap(), None);
        assert_eq!(stream.record_count(), 3);
    }
}

#[test]
fn markers_follow_the_requested_byte_order() {
    let big = write_records(&[b"ABCD"], ByteOrder::Big);
    let little = write_records(&[b"ABCD"], ByteOrder::Little);
    assert_eq!(&big[..4], &[0, 0, 0, 4]);
    assert_eq!(&little[..4], &[4, 0, 0, 0]);
    assert_eq!(&big[4..8], b"ABCD");
}

#[test]
fn flipped_byte_order_is_not_applied_silently() {
    let bytes = write_records(&[b"0123456789AB"], ByteOrder::Little);

    // Read big-endian, the header claims 201326592 bytes.
    let mut wrong = reader(bytes.clone(), ByteOrder::Big);
    match wrong.begin_read() {
        Err(EclError::CorruptRecord { record, header, .. }) => {
            assert_eq!(record, 0);
            assert_eq!(header, 12 << 24);
        }
        other => panic!("expected CorruptRecord, got {:?}", other),
    }

    let mut right = reader(bytes, ByteOrder::Little);
    assert_eq!(right.read_record().unwrap().as_deref(), Some(&b"0123456789AB"[..]));
}

#[test]
fn corrupt_trailer_names_the_record_and_poisons_the_stream() {
    let mut bytes = write_records(&[b"first", b"second", b"third"], ByteOrder::Big);
    // Trailer of record 1 is the four bytes just before record 2.
    let trailer_end = (5 + 8) + (6 + 8);
    bytes[trailer_end - 1] ^= 0x40;

    let mut stream = reader(bytes, ByteOrder::Big).with_path("CASE.UNRST");
    assert_eq!(stream.read_record().unwrap().as_deref(), Some(&b"first"[..]));
    match stream.read_record() {
        Err(EclError::CorruptRecord { path, record, header, trailer }) => {
            assert_eq!(record, 1);
            assert_eq!(header, 6);
            assert_ne!(trailer, header);
            assert_eq!(path.to_str(), Some("CASE.UNRST"));
        }
        other => panic!("expected CorruptRecord, got {:?}", other),
    }
    assert!(matches!(stream.read_record(), Err(EclError::InvalidState(_))));
}

#[test]
fn corrupt_header_is_detected_at_the_trailer() {
    let mut bytes = write_records(&[b"ABCDEFGH", b"IJKLMNOP"], ByteOrder::Big);
    // Declare 4 bytes for record 1 instead of 8.
    bytes[16 + 3] = 4;

    let mut stream = reader(bytes, ByteOrder::Big);
    stream.read_record().unwrap();
    match stream.read_record() {
        Err(EclError::CorruptRecord { record, header, .. }) => {
            assert_eq!(record, 1);
            assert_eq!(header, 4);
        }
        other => panic!("expected CorruptRecord, got {:?}", other),
    }
}

#[test]
fn trailer_with_its_sign_bit_set_is_a_corrupt_record() {
    let mut bytes = write_records(&[b"first", b"second", b"third"], ByteOrder::Big);
    // First byte of the trailer of record 1.
    bytes[(5 + 8) + (6 + 4)] ^= 0x80;

    let mut stream = reader(bytes, ByteOrder::Big);
    assert_eq!(stream.read_record().unwrap().as_deref(), Some(&b"first"[..]));
    match stream.read_record() {
        Err(EclError::CorruptRecord { record, header, trailer, .. }) => {
            assert_eq!(record, 1);
            assert_eq!(header, 6);
            assert_eq!(trailer, 0x8000_0006);
        }
        other => panic!("expected CorruptRecord, got {:?}", other),
    }
    assert!(matches!(stream.read_record(), Err(EclError::InvalidState(_))));
}

#[test]
fn header_running_past_the_end_is_a_corrupt_record() {
    let mut bytes = write_records(&[b"first", b"second", b"third"], ByteOrder::Big);
    // Header of record 1 now declares 0x01000006 bytes.
    bytes[13] = 0x01;

    let mut stream = reader(bytes, ByteOrder::Big);
    stream.read_record().unwrap();
    match stream.read_record() {
        Err(EclError::CorruptRecord { record, header, trailer, .. }) => {
            assert_eq!(record, 1);
            assert_eq!(header, 0x0100_0006);
            assert_eq!(trailer, 0);
        }
        other => panic!("expected CorruptRecord, got {:?}", other),
    }
    assert!(matches!(stream.skip_record(), Err(EclError::InvalidState(_))));
}

#[test]
fn missing_trailer_is_a_corrupt_record() {
    let mut bytes = write_records(&[b"ABCD", b"EFGH"], ByteOrder::Big);
    bytes.truncate(bytes.len() - 2);

    let mut stream = reader(bytes, ByteOrder::Big);
    stream.read_record().unwrap();
    match stream.read_record() {
        Err(EclError::CorruptRecord { record, header, .. }) => {
            assert_eq!(record, 1);
            assert_eq!(header, 4);
        }
        other => panic!("expected CorruptRecord, got {:?}", other),
    }
}

#[test]
fn transfers_outside_the_protocol_are_rejected() {
    let bytes = write_records(&[b"ABCD"], ByteOrder::Big);

    let mut stream = reader(bytes.clone(), ByteOrder::Big);
    assert!(matches!(stream.end_read(), Err(EclError::InvalidState(_))));
    assert!(matches!(stream.read_payload(&mut [0u8; 1]), Err(EclError::InvalidState(_))));

    let mut stream = reader(bytes.clone(), ByteOrder::Big);
    stream.begin_read().unwrap();
    assert!(matches!(stream.read_payload(&mut [0u8; 5]), Err(EclError::InvalidState(_))));

    let mut stream = reader(bytes.clone(), ByteOrder::Big);
    stream.begin_read().unwrap();
    stream.read_payload(&mut [0u8; 2]).unwrap();
    assert!(matches!(stream.end_read(), Err(EclError::InvalidState(_))));

    let mut stream = reader(bytes, ByteOrder::Big);
    stream.begin_read().unwrap();
    assert!(matches!(stream.begin_read(), Err(EclError::InvalidState(_))));

    let mut writer = RecordStream::new(Cursor::new(Vec::new()), StreamMode::Write, false, ByteOrder::Big);
    assert!(matches!(writer.begin_read(), Err(EclError::InvalidState(_))));
    writer.begin_write(3).unwrap();
    writer.write_payload(b"AB").unwrap();
    assert!(matches!(writer.end_write(), Err(EclError::InvalidState(_))));
}

#[test]
fn skip_record_seeks_over_payloads() {
    let bytes = write_records(&[b"skip me", b"keep"], ByteOrder::Big);
    let mut stream = reader(bytes, ByteOrder::Big);
    assert!(stream.skip_record().unwrap());
    assert_eq!(stream.read_record().unwrap().as_deref(), Some(&b"keep"[..]));
    assert!(!stream.skip_record().unwrap());
}

#[test]
fn fortran_probe_detects_byte_order_and_restores_position() {
    let mut big = Cursor::new(write_records(&[b"12345678"], ByteOrder::Big));
    assert_eq!(is_fortran_file(&mut big).unwrap(), Some(ByteOrder::Big));
    assert_eq!(big.position(), 0);

    let mut little = Cursor::new(write_records(&[b"12345678"], ByteOrder::Little));
    assert_eq!(is_fortran_file(&mut little).unwrap(), Some(ByteOrder::Little));
    assert_eq!(little.position(), 0);

    let mut text = Cursor::new(b" 'INTEHEAD'         411 'INTE'\n".to_vec());
    assert_eq!(is_fortran_file(&mut text).unwrap(), None);
    assert_eq!(text.position(), 0);

    let mut zeros = Cursor::new(vec![0u8; 32]);
    assert_eq!(is_fortran_file(&mut zeros).unwrap(), None);
}

#[test]
fn formatted_streams_have_no_markers() {
    let mut writer = RecordStream::new(Cursor::new(Vec::new()), StreamMode::Write, true, ByteOrder::Big);
    writer.begin_write(0).unwrap();
    writer.write_payload(b"plain text\n").unwrap();
    writer.end_write().unwrap();
    let bytes = writer.into_inner().into_inner();
    assert_eq!(bytes, b"plain text\n");

    let mut stream = RecordStream::new(Cursor::new(bytes), StreamMode::Read, true, ByteOrder::Big);
    assert_eq!(stream.begin_read().unwrap(), Some(0));
}
