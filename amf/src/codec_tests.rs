use std::collections::HashMap;
use std::rc::Rc;

use bytes::Bytes;
use wirevalue::{ErrorKind, Value, record};

use crate::{Date, Decoder, Encoder, Format, UnknownFormat, Xml, XmlDoc, decode_bytes, encode};

#[test]
fn format_tokens_are_case_insensitive() {
    for token in ["0", "amf0", "AMF0", "Amf0"] {
        assert_eq!(token.parse::<Format>().unwrap(), Format::Amf0);
    }
    for token in ["3", "amf3", "AMF3"] {
        assert_eq!(token.parse::<Format>().unwrap(), Format::Amf3);
    }
    assert_eq!(
        "amf2".parse::<Format>(),
        Err(UnknownFormat("amf2".to_string()))
    );
}

#[test]
fn scalar_round_trips() {
    for format in [Format::Amf0, Format::Amf3] {
        assert!(decode_bytes::<bool>(&encode(&true, format).unwrap()).unwrap());
        assert_eq!(
            decode_bytes::<f64>(&encode(&1.5f64, format).unwrap()).unwrap(),
            1.5
        );
        assert_eq!(
            decode_bytes::<String>(&encode(&"hej".to_string(), format).unwrap()).unwrap(),
            "hej"
        );
        assert_eq!(
            decode_bytes::<Option<String>>(&encode(&None::<String>, format).unwrap()).unwrap(),
            None
        );
        assert_eq!(
            decode_bytes::<Date>(&encode(&Date(1_234.5), format).unwrap()).unwrap(),
            Date(1_234.5)
        );
        assert_eq!(
            decode_bytes::<XmlDoc>(&encode(&XmlDoc("<a/>".to_string()), format).unwrap())
                .unwrap(),
            XmlDoc("<a/>".to_string())
        );
    }
}

#[test]
fn amf3_only_values_round_trip() {
    let cases: Vec<i64> = vec![
        0,
        5,
        127,
        128,
        16_384,
        2_097_152,
        (1 << 28) - 1,
        -1,
        -2_137,
        -(1 << 28),
    ];
    for n in cases {
        let encoded = encode(&n, Format::Amf3).unwrap();
        assert_eq!(decode_bytes::<i64>(&encoded).unwrap(), n, "{n}");
    }

    let raw = Bytes::from_static(&[0x00, 0xFF, 0x7F]);
    assert_eq!(
        decode_bytes::<Bytes>(&encode(&raw, Format::Amf3).unwrap()).unwrap(),
        raw
    );
    assert_eq!(
        decode_bytes::<Xml>(&encode(&Xml("<b/>".to_string()), Format::Amf3).unwrap()).unwrap(),
        Xml("<b/>".to_string())
    );
}

#[test]
fn true_encodes_to_the_documented_bytes() {
    let encoded = encode(&true, Format::Amf0).unwrap();
    assert_eq!(&encoded[..], [0x01, 0x01]);
    assert!(decode_bytes::<bool>(&encoded).unwrap());
}

#[test]
fn integer_five_encodes_to_the_documented_bytes() {
    let encoded = encode(&5i64, Format::Amf3).unwrap();
    assert_eq!(&encoded[..], [0x11, 0x04, 0x05]);
}

#[test]
fn sequences_and_maps_round_trip() {
    for format in [Format::Amf0, Format::Amf3] {
        let sequence = vec!["a".to_string(), "b".to_string()];
        assert_eq!(
            decode_bytes::<Vec<String>>(&encode(&sequence, format).unwrap()).unwrap(),
            sequence
        );

        let mut map = HashMap::new();
        map.insert("k".to_string(), 2.5f64);
        assert_eq!(
            decode_bytes::<HashMap<String, f64>>(&encode(&map, format).unwrap()).unwrap(),
            map
        );
    }
}

#[test]
fn empty_sequence_round_trips_in_both_generations() {
    let empty: Vec<f64> = vec![];
    for format in [Format::Amf0, Format::Amf3] {
        assert_eq!(
            decode_bytes::<Vec<f64>>(&encode(&empty, format).unwrap()).unwrap(),
            empty
        );
    }
}

#[test]
fn boolean_into_integer_target_is_unmatched() {
    let encoded = encode(&true, Format::Amf3).unwrap();
    let err = decode_bytes::<i64>(&encoded).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unmatched);
}

record! {
    #[derive(Debug, Default, Clone, PartialEq)]
    struct Ping {
        name: String => amf = "n",
    }
}

#[test]
fn record_emits_inline_trait_then_reference() {
    let pings = vec![
        Ping {
            name: "x".to_string(),
        },
        Ping {
            name: "y".to_string(),
        },
    ];
    let encoded = encode(&pings, Format::Amf3).unwrap();
    assert_eq!(
        &encoded[..],
        [
            0x11, 0x09, 0x05, 0x01, // switch, array of two, dense
            0x0A, 0x13, 0x01, 0x03, b'n', 0x06, 0x03, b'x', // inline trait, one member
            0x0A, 0x01, 0x06, 0x03, b'y', // trait-table reference
        ]
    );
    assert_eq!(decode_bytes::<Vec<Ping>>(&encoded).unwrap(), pings);
}

record! {
    #[derive(Debug, Default, Clone, PartialEq)]
    struct Track {
        title: String => amf = "title",
        rating: f64 => amf = "rating,omitempty",
        tags: Vec<String> => amf = "tags,omitempty",
        cover: Option<String> => amf = "cover,omitempty",
        flags: HashMap<String, bool> => amf = "flags,omitempty",
    }
}

#[test]
fn record_round_trips_in_both_generations() {
    let mut flags = HashMap::new();
    flags.insert("live".to_string(), true);
    let track = Track {
        title: "intro".to_string(),
        rating: 4.5,
        tags: vec!["demo".to_string()],
        cover: Some("front.png".to_string()),
        flags,
    };
    for format in [Format::Amf0, Format::Amf3] {
        let encoded = encode(&track, format).unwrap();
        assert_eq!(decode_bytes::<Track>(&encoded).unwrap(), track);
    }
}

#[test]
fn decode_resets_record_fields_elided_by_the_source() {
    let sparse = Track {
        title: "solo".to_string(),
        ..Track::default()
    };
    let encoded = encode(&sparse, Format::Amf0).unwrap();

    let mut target = Track {
        title: "old".to_string(),
        rating: 9.0,
        tags: vec!["stale".to_string()],
        cover: Some("stale.png".to_string()),
        flags: HashMap::new(),
    };
    Decoder::new(&encoded[..]).decode_into(&mut target).unwrap();
    assert_eq!(target, sparse);
}

#[test]
fn shared_references_survive_decode() {
    // The leading class pair is the canonical decoded form, so the round
    // trip compares exactly.
    let shared = Rc::new(vec![
        ("$".to_string(), Value::String(String::new())),
        ("a".to_string(), Value::Integer(1)),
    ]);
    let twice = Value::array(vec![Value::Object(shared.clone()), Value::Object(shared)]);
    let encoded = Encoder::new().encode_value(&twice, Format::Amf3).unwrap();
    let decoded = Decoder::new(&encoded[..]).decode_value().unwrap();

    let Value::Array(items) = &decoded else {
        panic!("expected array, got {decoded}");
    };
    let (Value::Object(first), Value::Object(second)) = (&items[0], &items[1]) else {
        panic!("expected objects");
    };
    assert!(Rc::ptr_eq(first, second));
    assert_eq!(decoded, twice);
}

#[test]
fn distinct_equal_composites_stay_separate_literals() {
    let rebuild = || {
        Value::object(vec![
            ("$".to_string(), Value::String(String::new())),
            ("a".to_string(), Value::Integer(1)),
        ])
    };
    let separate = Value::array(vec![rebuild(), rebuild()]);
    let encoded = Encoder::new().encode_value(&separate, Format::Amf3).unwrap();
    let decoded = Decoder::new(&encoded[..]).decode_value().unwrap();

    let Value::Array(items) = &decoded else {
        panic!("expected array, got {decoded}");
    };
    let (Value::Object(first), Value::Object(second)) = (&items[0], &items[1]) else {
        panic!("expected objects");
    };
    assert!(!Rc::ptr_eq(first, second));
    assert_eq!(decoded, separate);
}

#[test]
fn typed_object_class_name_survives_the_wire() {
    let value = Value::object(vec![
        ("$".to_string(), Value::String("Track".to_string())),
        ("title".to_string(), Value::String("intro".to_string())),
    ]);
    for format in [Format::Amf0, Format::Amf3] {
        let encoded = Encoder::new().encode_value(&value, format).unwrap();
        let decoded = Decoder::new(&encoded[..]).decode_value().unwrap();
        assert_eq!(decoded, value);
    }
}

#[test]
fn amf0_associative_array_round_trips_at_value_level() {
    let dictionary = Value::dictionary(vec![(
        Value::String("k".to_string()),
        Value::Double(1.0),
    )]);
    let encoded = Encoder::new().encode_value(&dictionary, Format::Amf0).unwrap();
    let decoded = Decoder::new(&encoded[..]).decode_value().unwrap();
    // Associative arrays come back as a plain attribute list.
    assert_eq!(
        decoded,
        Value::object(vec![("k".to_string(), Value::Double(1.0))])
    );
}

#[test]
fn date_offset_asymmetry_is_preserved() {
    // Encode writes a zero offset, so a round trip is exact.
    let encoded = encode(&Date(90_000.0), Format::Amf0).unwrap();
    assert_eq!(decode_bytes::<Date>(&encoded).unwrap(), Date(90_000.0));

    // A nonzero wire offset shifts the decoded timestamp by minutes.
    let mut crafted = vec![0x0B];
    crafted.extend_from_slice(&90_000.0f64.to_be_bytes());
    crafted.extend_from_slice(&(-2i16).to_be_bytes());
    assert_eq!(
        decode_bytes::<Date>(&crafted).unwrap(),
        Date(90_000.0 - 120_000.0)
    );
}

#[test]
fn nested_structures_round_trip() {
    record! {
        #[derive(Debug, Default, Clone, PartialEq)]
        struct Album {
            name: String => amf = "name",
            tracks: Vec<Track> => amf = "tracks",
        }
    }

    let album = Album {
        name: "first".to_string(),
        tracks: vec![
            Track {
                title: "a".to_string(),
                ..Track::default()
            },
            Track {
                title: "b".to_string(),
                rating: 3.0,
                ..Track::default()
            },
        ],
    };
    for format in [Format::Amf0, Format::Amf3] {
        let encoded = encode(&album, format).unwrap();
        assert_eq!(decode_bytes::<Album>(&encoded).unwrap(), album);
    }
}
