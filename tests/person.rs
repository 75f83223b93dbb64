mod common;

use common::{
    DOCUMENT, DOCUMENT_FIELDS, EventLog, ID, LINE_FIELDS, NAME, NUMBER, PERSON, PHONE_FIELD,
    PHONE_TYPE, SECTION_FIELDS, Values, init_tracing,
};
use pbstream::{
    CodecConfig, Decoder, Encoder, Error, TwoPassWriter, Value, decode, encode_to_bytes,
};

fn encode_person(buf: &mut [u8]) -> pbstream::Result<usize> {
    let mut encoder = Encoder::default();
    let mut session = encoder.start(&PERSON, buf)?;
    session.add_int32(ID, 1237)?;
    session.add_string(NAME, "Jim")?;
    for (number, kind) in [("123", 0), ("456", 1)] {
        session.nested_start(PHONE_FIELD)?;
        session.add_string(NUMBER, number)?;
        session.add_enum(PHONE_TYPE, kind)?;
        session.nested_end()?;
    }
    session.finish()
}

#[test]
fn person_event_sequence() {
    init_tracing();
    let mut buf = [0u8; 128];
    let len = encode_person(&mut buf).unwrap();

    let mut log = EventLog::default();
    let consumed = decode(&PERSON, &buf[..len], &mut log).unwrap();
    assert_eq!(consumed, len);
    assert_eq!(
        log.0,
        [
            "start Person",
            "id=1237",
            "name=\"Jim\"",
            "start PhoneNumber",
            "number=\"123\"",
            "type=0",
            "end PhoneNumber",
            "start PhoneNumber",
            "number=\"456\"",
            "type=1",
            "end PhoneNumber",
            "end Person",
        ]
    );
}

#[test]
fn person_wire_bytes() {
    let mut buf = [0u8; 128];
    let len = encode_person(&mut buf).unwrap();
    assert_eq!(
        &buf[..len],
        &[
            0x08, 0xd5, 0x09, // id
            0x12, 0x03, b'J', b'i', b'm', // name
            0x22, 0x07, 0x0a, 0x03, b'1', b'2', b'3', 0x10, 0x00, // phone
            0x22, 0x07, 0x0a, 0x03, b'4', b'5', b'6', 0x10, 0x01, // phone
        ]
    );
}

#[test]
fn person_two_pass_matches() {
    let mut buf = [0u8; 128];
    let len = encode_person(&mut buf).unwrap();

    let bytes = encode_to_bytes(&PERSON, CodecConfig::default(), |w: &mut TwoPassWriter<'_>| {
        w.add_field(ID, Value::Int32(1237))?;
        w.add_field(NAME, Value::String("Jim"))?;
        for (number, kind) in [("123", 0), ("456", 1)] {
            w.nested(PHONE_FIELD, |phone| {
                phone.add_field(NUMBER, Value::String(number))?;
                phone.add_field(PHONE_TYPE, Value::Enum(kind))
            })?;
        }
        Ok(())
    })
    .unwrap();
    assert_eq!(&bytes[..], &buf[..len]);
}

#[test]
fn three_level_nesting() {
    let mut buf = [0u8; 256];
    let mut encoder = Encoder::default();
    let mut s = encoder.start(&DOCUMENT, &mut buf).unwrap();
    s.add_uint64(&DOCUMENT_FIELDS[0], 7).unwrap();
    for (title, lines) in [("intro", &["a", "bc"][..]), ("body", &["def"][..])] {
        s.nested_start(&DOCUMENT_FIELDS[1]).unwrap();
        s.add_string(&SECTION_FIELDS[0], title).unwrap();
        for text in lines {
            s.nested_start(&SECTION_FIELDS[1]).unwrap();
            assert_eq!(s.depth(), 3);
            s.add_string(&LINE_FIELDS[0], text).unwrap();
            s.add_uint32(&LINE_FIELDS[1], text.len() as u32).unwrap();
            s.nested_end().unwrap();
        }
        s.nested_end().unwrap();
    }
    let len = s.finish().unwrap();

    let mut log = EventLog::default();
    decode(&DOCUMENT, &buf[..len], &mut log).unwrap();
    assert_eq!(
        log.0,
        [
            "start Document",
            "version=7",
            "start Section",
            "title=\"intro\"",
            "start Line",
            "text=\"a\"",
            "width=1",
            "end Line",
            "start Line",
            "text=\"bc\"",
            "width=2",
            "end Line",
            "end Section",
            "start Section",
            "title=\"body\"",
            "start Line",
            "text=\"def\"",
            "width=3",
            "end Line",
            "end Section",
            "end Document",
        ]
    );
}

#[test]
fn depth_exceeded_is_fatal() {
    let mut buf = [0u8; 256];
    let mut encoder = Encoder::default();
    let mut s = encoder.start(&DOCUMENT, &mut buf).unwrap();
    s.nested_start(&DOCUMENT_FIELDS[1]).unwrap();
    s.nested_start(&SECTION_FIELDS[1]).unwrap();
    s.add_string(&LINE_FIELDS[0], "deep").unwrap();
    s.nested_end().unwrap();
    s.nested_end().unwrap();
    let len = s.finish().unwrap();

    let mut decoder = Decoder::new(CodecConfig::with_max_depth(2));
    let mut log = EventLog::default();
    let err = decoder
        .decode(&DOCUMENT, &buf[..len], &mut log)
        .unwrap_err();
    assert!(matches!(err, Error::DepthExceeded { limit: 2 }));
    assert!(err.is_fatal());
    // Events before the failing push were delivered
    assert_eq!(log.0, ["start Document", "start Section"]);

    let mut encoder = Encoder::new(CodecConfig::with_max_depth(2));
    let mut s = encoder.start(&DOCUMENT, &mut buf).unwrap();
    s.nested_start(&DOCUMENT_FIELDS[1]).unwrap();
    assert!(matches!(
        s.nested_start(&SECTION_FIELDS[1]),
        Err(Error::DepthExceeded { limit: 2 })
    ));
}

#[test]
fn unknown_fields_skipped() {
    let buf = [
        0x08, 0xd5, 0x09, // id
        0x78, 0xff, 0x01, // field 15, varint
        0x85, 0x01, 1, 2, 3, 4, // field 16, fixed32
        0x89, 0x01, 1, 2, 3, 4, 5, 6, 7, 8, // field 17, fixed64
        0x92, 0x01, 0x02, 0xaa, 0xbb, // field 18, length-delimited
        0x12, 0x03, b'J', b'i', b'm', // name
    ];
    let mut values = Values::default();
    let consumed = decode(&PERSON, &buf, &mut values).unwrap();
    assert_eq!(consumed, buf.len());
    assert_eq!(
        values.0,
        [(1, "1237".to_string()), (2, "\"Jim\"".to_string())]
    );
}

#[test]
fn truncated_input_reports_prefix() {
    let mut buf = [0u8; 128];
    let len = encode_person(&mut buf).unwrap();

    let mut log = EventLog::default();
    let err = decode(&PERSON, &buf[..len - 1], &mut log).unwrap_err();
    assert!(matches!(err, Error::EndOfBuffer { .. }));
    assert_eq!(&log.0[..3], ["start Person", "id=1237", "name=\"Jim\""]);
}

#[test]
fn encode_into_short_buffer() {
    let mut buf = [0u8; 12];
    assert!(matches!(
        encode_person(&mut buf),
        Err(Error::EndOfBuffer { .. })
    ));
}

#[test]
fn pre_encoded_phone_embeds_verbatim() {
    let mut phone = [0u8; 16];
    let mut encoder = Encoder::default();
    let mut s = encoder.start(&common::PHONE, &mut phone).unwrap();
    s.add_string(NUMBER, "123").unwrap();
    s.add_enum(PHONE_TYPE, 0).unwrap();
    let phone_len = s.finish().unwrap();
    let phone = &phone[..phone_len];

    let mut buf = [0u8; 128];
    let mut s = encoder.start(&PERSON, &mut buf).unwrap();
    s.add_int32(ID, 1237).unwrap();
    s.add_field(PHONE_FIELD, Value::Message(phone)).unwrap();
    let len = s.finish().unwrap();
    assert_eq!(
        &buf[..len],
        &[0x08, 0xd5, 0x09, 0x22, 0x07, 0x0a, 0x03, b'1', b'2', b'3', 0x10, 0x00]
    );

    let bytes = encode_to_bytes(&PERSON, CodecConfig::default(), |w| {
        w.add_field(ID, Value::Int32(1237))?;
        w.add_field(PHONE_FIELD, Value::Message(phone))
    })
    .unwrap();
    assert_eq!(&bytes[..], &buf[..len]);

    let mut log = EventLog::default();
    decode(&PERSON, &buf[..len], &mut log).unwrap();
    assert_eq!(
        log.0,
        [
            "start Person",
            "id=1237",
            "start PhoneNumber",
            "number=\"123\"",
            "type=0",
            "end PhoneNumber",
            "end Person",
        ]
    );
}
