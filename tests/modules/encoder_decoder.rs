use bson_wire::{
    decode_all, decode_document, doc, encode_document,
    spec::BinarySubtype,
    Binary, Bson, DbRef, Document, Error, JavaScriptCodeWithScope, ObjectId, Regex, RegexOptions,
    Timestamp, Uuid,
};

fn round_trip(doc: &Document, expected: &[u8]) {
    let bytes = encode_document(doc, false).unwrap();
    assert_eq!(bytes, expected);

    let (decoded, rest) = decode_document(&bytes).unwrap();
    assert!(rest.is_empty());
    assert_eq!(&decoded, doc);
}

#[test]
fn test_empty_document() {
    round_trip(&doc! {}, &[5, 0, 0, 0, 0]);
}

#[test]
fn test_encode_decode_floating_point() {
    let doc = doc! { "key": 1020.123 };
    let expected = [
        18, 0, 0, 0, 1, 107, 101, 121, 0, 68, 139, 108, 231, 251, 224, 143, 64, 0,
    ];

    round_trip(&doc, &expected);
}

#[test]
fn test_encode_decode_utf8_string() {
    let doc = doc! { "key": "test你好吗" };
    let expected = [
        28, 0, 0, 0, 2, 107, 101, 121, 0, 14, 0, 0, 0, 116, 101, 115, 116, 228, 189, 160, 229,
        165, 189, 229, 144, 151, 0, 0,
    ];

    round_trip(&doc, &expected);
}

#[test]
fn test_encode_decode_hello_world() {
    let doc = doc! { "hello": "world" };
    let expected = [
        0x16, 0x00, 0x00, 0x00, 0x02, 0x68, 0x65, 0x6C, 0x6C, 0x6F, 0x00, 0x06, 0x00, 0x00, 0x00,
        0x77, 0x6F, 0x72, 0x6C, 0x64, 0x00, 0x00,
    ];

    round_trip(&doc, &expected);
}

#[test]
fn test_encode_decode_array() {
    let doc = doc! { "key": [1.01, "xyz"] };
    let expected = [
        37, 0, 0, 0, 4, 107, 101, 121, 0, 27, 0, 0, 0, 1, 48, 0, 41, 92, 143, 194, 245, 40, 240,
        63, 2, 49, 0, 4, 0, 0, 0, 120, 121, 122, 0, 0, 0,
    ];

    round_trip(&doc, &expected);
}

#[test]
fn test_encode_decode_embedded_document() {
    let doc = doc! { "key": { "subkey": 1 } };
    let expected = [
        27, 0, 0, 0, 3, 107, 101, 121, 0, 17, 0, 0, 0, 16, 115, 117, 98, 107, 101, 121, 0, 1, 0,
        0, 0, 0, 0,
    ];

    round_trip(&doc, &expected);
}

#[test]
fn test_encode_decode_boolean() {
    let doc = doc! { "key": true };
    let expected = [11, 0, 0, 0, 8, 107, 101, 121, 0, 1, 0];

    round_trip(&doc, &expected);

    let doc = doc! { "b": true, "n": null };
    let expected = [
        0x0C, 0x00, 0x00, 0x00, 0x08, 0x62, 0x00, 0x01, 0x0A, 0x6E, 0x00, 0x00,
    ];

    round_trip(&doc, &expected);
}

#[test]
fn test_encode_decode_null() {
    let doc = doc! { "key": null };
    let expected = [10, 0, 0, 0, 10, 107, 101, 121, 0, 0];

    round_trip(&doc, &expected);
}

#[test]
fn test_encode_decode_int32() {
    let doc = doc! { "x": 1 };
    let expected = [
        0x0C, 0x00, 0x00, 0x00, 0x10, 0x78, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00,
    ];

    round_trip(&doc, &expected);
}

#[test]
fn test_int64_promotion() {
    // 2147483648 no longer fits in an int32, so it widens to int64.
    let doc = doc! { "x": 2147483648i64 };
    let expected = [
        0x10, 0x00, 0x00, 0x00, 0x12, 0x78, 0x00, 0x00, 0x00, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00,
        0x00,
    ];

    round_trip(&doc, &expected);
}

#[test]
fn test_encode_decode_int64() {
    let doc = doc! { "key": Bson::Int64(8_589_934_592) };
    let expected = [18, 0, 0, 0, 18, 107, 101, 121, 0, 0, 0, 0, 0, 2, 0, 0, 0, 0];

    round_trip(&doc, &expected);
}

#[test]
fn test_encode_decode_regexp() {
    let doc = doc! {
        "key": Regex::new("^a", RegexOptions::IGNORE_CASE | RegexOptions::MULTILINE),
    };
    let expected = [
        16, 0, 0, 0, 0x0B, 107, 101, 121, 0, b'^', b'a', 0, b'i', b'm', 0, 0,
    ];

    round_trip(&doc, &expected);
}

#[test]
fn test_regex_letters_in_alphabetical_order() {
    let all = RegexOptions::VERBOSE
        | RegexOptions::DOT_ALL
        | RegexOptions::MULTILINE
        | RegexOptions::LOCALE
        | RegexOptions::IGNORE_CASE;
    assert_eq!(all.to_letters(), "ilmsx");
}

#[test]
fn test_regex_unicode_flag_is_lost_on_round_trip() {
    let doc = doc! {
        "key": Regex::new("a", RegexOptions::IGNORE_CASE | RegexOptions::UNICODE),
    };

    let bytes = encode_document(&doc, false).unwrap();
    let (decoded, _) = decode_document(&bytes).unwrap();

    match decoded.get("key") {
        Some(Bson::RegularExpression(regex)) => {
            assert_eq!(regex.options, RegexOptions::IGNORE_CASE);
        }
        other => panic!("expected a regex, got {:?}", other),
    }
}

#[test]
fn test_regex_unknown_flag_letters_are_ignored() {
    // "qix": only 'i' and 'x' name known options.
    let bytes = [
        16, 0, 0, 0, 0x0B, 107, 101, 121, 0, b'a', 0, b'q', b'i', b'x', 0, 0,
    ];

    let (decoded, _) = decode_document(&bytes).unwrap();
    assert_eq!(
        decoded.get("key"),
        Some(&Bson::RegularExpression(Regex::new(
            "a",
            RegexOptions::IGNORE_CASE | RegexOptions::VERBOSE
        )))
    );
}

#[test]
fn test_encode_decode_javascript_code() {
    let doc = doc! { "key": Bson::JavaScriptCode("1".to_owned()) };
    let expected = [16, 0, 0, 0, 13, 107, 101, 121, 0, 2, 0, 0, 0, 49, 0, 0];

    round_trip(&doc, &expected);
}

#[test]
fn test_encode_decode_javascript_code_with_scope() {
    let doc = doc! {
        "key": JavaScriptCodeWithScope {
            code: "1".to_owned(),
            scope: doc! {},
        },
    };
    let expected = [
        25, 0, 0, 0, 0x0F, 107, 101, 121, 0, 15, 0, 0, 0, 2, 0, 0, 0, 49, 0, 5, 0, 0, 0, 0, 0,
    ];

    round_trip(&doc, &expected);
}

#[test]
fn test_encode_decode_timestamp() {
    // The increment occupies the low four bytes, the time the high four.
    let doc = doc! {
        "key": Timestamp { time: 100, increment: 200 },
    };
    let expected = [
        18, 0, 0, 0, 0x11, 107, 101, 121, 0, 200, 0, 0, 0, 100, 0, 0, 0, 0,
    ];

    round_trip(&doc, &expected);
}

#[test]
fn test_encode_decode_binary_generic() {
    let doc = doc! { "key": vec![1u8, 2, 3] };
    let expected = [18, 0, 0, 0, 5, 107, 101, 121, 0, 3, 0, 0, 0, 0, 1, 2, 3, 0];

    round_trip(&doc, &expected);
}

#[test]
fn test_encode_decode_binary_old() {
    // Subtype 2 carries a redundant inner length, and the outer length is 4
    // greater than the payload.
    let doc = doc! {
        "key": Binary { subtype: BinarySubtype::BinaryOld, bytes: vec![1, 2, 3] },
    };
    let expected = [
        22, 0, 0, 0, 5, 107, 101, 121, 0, 7, 0, 0, 0, 2, 3, 0, 0, 0, 1, 2, 3, 0,
    ];

    round_trip(&doc, &expected);
}

#[test]
fn test_encode_decode_uuid() {
    let uuid: Uuid = "00112233-4455-6677-8899-aabbccddeeff".parse().unwrap();
    let doc = doc! { "key": uuid };
    // Binary subtype 3, 16 bytes, stored little-endian.
    let expected = [
        31, 0, 0, 0, 5, 107, 101, 121, 0, 16, 0, 0, 0, 3, 0x33, 0x22, 0x11, 0x00, 0x55, 0x44,
        0x77, 0x66, 0x88, 0x99, 0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF, 0,
    ];

    round_trip(&doc, &expected);
}

#[test]
fn test_uuid_wrong_length_is_rejected() {
    // Binary subtype 3 with a 4-byte payload.
    let bytes = [
        19, 0, 0, 0, 5, 107, 101, 121, 0, 4, 0, 0, 0, 3, 1, 2, 3, 4, 0,
    ];

    assert!(matches!(
        decode_document(&bytes),
        Err(Error::InvalidBson { .. })
    ));
}

#[test]
fn test_binary_subtype_preservation() {
    for subtype in [
        BinarySubtype::Generic,
        BinarySubtype::BinaryOld,
        BinarySubtype::Md5,
        BinarySubtype::UserDefined(128),
    ] {
        let doc = doc! {
            "key": Binary { subtype, bytes: vec![9, 8, 7, 6] },
        };
        let bytes = encode_document(&doc, false).unwrap();
        let (decoded, _) = decode_document(&bytes).unwrap();
        assert_eq!(decoded, doc, "subtype {:?}", subtype);
    }

    // Subtype 3 round-trips through the Uuid variant.
    let doc = doc! { "key": Uuid::from_bytes([7; 16]) };
    let bytes = encode_document(&doc, false).unwrap();
    let (decoded, _) = decode_document(&bytes).unwrap();
    assert_eq!(decoded, doc);
}

#[test]
fn test_encode_decode_object_id() {
    let doc = doc! {
        "key": ObjectId::parse_str("64c3ec2f0d81a2f5c4b90317").unwrap(),
    };
    let expected = [
        22, 0, 0, 0, 7, 107, 101, 121, 0, 0x64, 0xC3, 0xEC, 0x2F, 0x0D, 0x81, 0xA2, 0xF5, 0xC4,
        0xB9, 0x03, 0x17, 0,
    ];

    round_trip(&doc, &expected);
}

#[test]
fn test_encode_decode_datetime() {
    let doc = doc! { "key": bson_wire::DateTime::from_millis(1000) };
    let expected = [18, 0, 0, 0, 9, 107, 101, 121, 0, 232, 3, 0, 0, 0, 0, 0, 0, 0];

    round_trip(&doc, &expected);
}

#[test]
fn test_datetime_offset_normalized_on_encode() {
    use chrono::{FixedOffset, TimeZone, Utc};

    let aware = FixedOffset::east_opt(2 * 3600)
        .unwrap()
        .with_ymd_and_hms(2010, 10, 2, 14, 0, 0)
        .unwrap();
    let utc = Utc.with_ymd_and_hms(2010, 10, 2, 12, 0, 0).unwrap();

    let from_aware = encode_document(&doc! { "d": aware }, false).unwrap();
    let from_utc = encode_document(&doc! { "d": utc }, false).unwrap();
    assert_eq!(from_aware, from_utc);

    // A naive datetime is taken to already be in UTC.
    let from_naive = encode_document(&doc! { "d": utc.naive_utc() }, false).unwrap();
    assert_eq!(from_naive, from_utc);
}

#[test]
fn test_encode_decode_min_max_key() {
    round_trip(
        &doc! { "key": Bson::MinKey },
        &[10, 0, 0, 0, 0xFF, 107, 101, 121, 0, 0],
    );
    round_trip(
        &doc! { "key": Bson::MaxKey },
        &[10, 0, 0, 0, 0x7F, 107, 101, 121, 0, 0],
    );
}

#[test]
fn test_dbref_round_trip() {
    let mut dbref = DbRef::new("coll", 5, Some("other_db".to_owned()));
    dbref.extra.insert("note", "kept");

    let doc = doc! { "ref": dbref.clone() };
    let bytes = encode_document(&doc, false).unwrap();
    let (decoded, _) = decode_document(&bytes).unwrap();

    assert_eq!(decoded.get("ref"), Some(&Bson::DbRef(dbref)));
}

#[test]
fn test_dbref_detection_requires_ref_first() {
    // $ref first: decodes as a DBRef.
    let as_dbref = encode_document(&doc! { "r": { "$ref": "coll", "$id": 5 } }, false).unwrap();
    let (decoded, _) = decode_document(&as_dbref).unwrap();
    assert_eq!(
        decoded.get("r"),
        Some(&Bson::DbRef(DbRef::new("coll", 5, None)))
    );

    // $ref in second position: stays a plain document.
    let as_doc = encode_document(&doc! { "r": { "$id": 5, "$ref": "coll" } }, false).unwrap();
    let (decoded, _) = decode_document(&as_doc).unwrap();
    assert_eq!(
        decoded.get("r"),
        Some(&Bson::Document(doc! { "$id": 5, "$ref": "coll" }))
    );

    // $ref without $id: stays a plain document.
    let no_id = encode_document(&doc! { "r": { "$ref": "coll" } }, false).unwrap();
    let (decoded, _) = decode_document(&no_id).unwrap();
    assert_eq!(
        decoded.get("r"),
        Some(&Bson::Document(doc! { "$ref": "coll" }))
    );
}

#[test]
fn test_decode_dbpointer() {
    // Type 0x0C: length-prefixed namespace, then a 12-byte ObjectId.
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&29i32.to_le_bytes());
    bytes.push(0x0C);
    bytes.extend_from_slice(b"a\0");
    bytes.extend_from_slice(&5i32.to_le_bytes());
    bytes.extend_from_slice(b"db.c\0");
    bytes.extend_from_slice(&[0xAA; 12]);
    bytes.push(0);
    assert_eq!(bytes.len(), 29);

    let (decoded, _) = decode_document(&bytes).unwrap();
    assert_eq!(
        decoded.get("a"),
        Some(&Bson::DbRef(DbRef::new(
            "db.c",
            ObjectId::from_bytes([0xAA; 12]),
            None
        )))
    );
}

#[test]
fn test_decode_symbol_and_undefined() {
    // Symbol (0x0E) decodes as a string.
    let symbol = [16, 0, 0, 0, 0x0E, 107, 101, 121, 0, 2, 0, 0, 0, 49, 0, 0];
    let (decoded, _) = decode_document(&symbol).unwrap();
    assert_eq!(decoded, doc! { "key": "1" });

    // Undefined (0x06) decodes as null.
    let undefined = [8, 0, 0, 0, 0x06, 97, 0, 0];
    let (decoded, _) = decode_document(&undefined).unwrap();
    assert_eq!(decoded, doc! { "a": null });
}

#[test]
fn test_id_is_written_first() {
    let doc = doc! { "a": 1, "_id": 2 };
    let expected = [
        21, 0, 0, 0, 0x10, 95, 105, 100, 0, 2, 0, 0, 0, 0x10, 97, 0, 1, 0, 0, 0, 0,
    ];

    let bytes = encode_document(&doc, false).unwrap();
    assert_eq!(bytes, expected);

    // The document itself keeps the caller's order.
    let keys: Vec<_> = doc.keys().map(|k| k.as_str()).collect();
    assert_eq!(keys, vec!["a", "_id"]);
}

#[test]
fn test_nested_documents_do_not_promote_id() {
    let doc = doc! { "outer": { "a": 1, "_id": 2 } };
    let bytes = encode_document(&doc, false).unwrap();
    let (decoded, _) = decode_document(&bytes).unwrap();

    let inner = decoded.get_document("outer").unwrap();
    let keys: Vec<_> = inner.keys().map(|k| k.as_str()).collect();
    assert_eq!(keys, vec!["a", "_id"]);
}

#[test]
fn test_check_keys() {
    let dollar = doc! { "$query": 1 };
    let dotted = doc! { "a.b": 1 };

    assert!(matches!(
        encode_document(&dollar, true),
        Err(Error::InvalidDocument { .. })
    ));
    assert!(matches!(
        encode_document(&dotted, true),
        Err(Error::InvalidDocument { .. })
    ));

    // Both are legal when key checking is off.
    assert!(encode_document(&dollar, false).is_ok());
    assert!(encode_document(&dotted, false).is_ok());

    // Key checking applies to nested documents too.
    let nested = doc! { "a": { "$inc": 1 } };
    assert!(matches!(
        encode_document(&nested, true),
        Err(Error::InvalidDocument { .. })
    ));
}

#[test]
fn test_key_with_nul_is_always_rejected() {
    let doc = doc! { "a\0b": 1 };
    assert!(matches!(
        encode_document(&doc, false),
        Err(Error::InvalidDocument { .. })
    ));
}

#[test]
fn test_regex_pattern_with_nul_is_rejected() {
    let doc = doc! { "r": Regex::new("a\0b", RegexOptions::empty()) };
    assert!(matches!(
        encode_document(&doc, false),
        Err(Error::InvalidDocument { .. })
    ));
}

#[test]
fn test_nesting_too_deep_on_encode() {
    let mut doc = doc! { "leaf": 1 };
    for _ in 0..105 {
        let mut outer = Document::new();
        outer.insert("n", doc);
        doc = outer;
    }

    assert!(matches!(
        encode_document(&doc, false),
        Err(Error::InvalidDocument { .. })
    ));
}

#[test]
fn test_nesting_too_deep_on_decode() {
    let mut body = vec![5u8, 0, 0, 0, 0];
    for _ in 0..105 {
        let size = (4 + 1 + 2 + body.len() + 1) as i32;
        let mut wrapped = Vec::new();
        wrapped.extend_from_slice(&size.to_le_bytes());
        wrapped.push(3);
        wrapped.extend_from_slice(b"n\0");
        wrapped.extend_from_slice(&body);
        wrapped.push(0);
        body = wrapped;
    }

    assert!(matches!(
        decode_document(&body),
        Err(Error::InvalidBson { .. })
    ));
}

#[test]
fn test_decode_not_enough_data() {
    assert!(matches!(
        decode_document(&[5, 0, 0, 0]),
        Err(Error::InvalidBson { .. })
    ));
    assert!(matches!(decode_document(&[]), Err(Error::InvalidBson { .. })));
}

#[test]
fn test_decode_objsize_too_large() {
    assert!(matches!(
        decode_document(&[10, 0, 0, 0, 0]),
        Err(Error::InvalidBson { .. })
    ));
}

#[test]
fn test_decode_bad_eoo() {
    assert!(matches!(
        decode_document(&[5, 0, 0, 0, 1]),
        Err(Error::InvalidBson { .. })
    ));
}

#[test]
fn test_decode_unknown_element_type() {
    let bytes = [8, 0, 0, 0, 0x20, 97, 0, 0];
    assert!(matches!(
        decode_document(&bytes),
        Err(Error::InvalidBson { .. })
    ));
}

#[test]
fn test_decode_truncated_element_payload() {
    // Declares an int32 element but only carries three payload bytes.
    let bytes = [11, 0, 0, 0, 0x10, 120, 0, 1, 0, 0, 0];
    assert!(matches!(
        decode_document(&bytes),
        Err(Error::InvalidBson { .. })
    ));
}

#[test]
fn test_decode_invalid_utf8() {
    // 0xFF in a key.
    let bad_key = [9, 0, 0, 0, 8, 0xFF, 0, 1, 0];
    assert!(matches!(
        decode_document(&bad_key),
        Err(Error::InvalidStringData { .. })
    ));

    // 0xFF in a string value.
    let bad_value = [14, 0, 0, 0, 2, 97, 0, 2, 0, 0, 0, 0xFF, 0, 0];
    assert!(matches!(
        decode_document(&bad_value),
        Err(Error::InvalidStringData { .. })
    ));
}

#[test]
fn test_decode_returns_unread_tail() {
    let mut bytes = encode_document(&doc! { "x": 1 }, false).unwrap();
    bytes.extend_from_slice(b"leftover");

    let (decoded, rest) = decode_document(&bytes).unwrap();
    assert_eq!(decoded, doc! { "x": 1 });
    assert_eq!(rest, b"leftover");
}

#[test]
fn test_decode_all_concatenation() {
    let docs = vec![
        doc! { "a": 1 },
        doc! { "b": "two", "c": [true, null] },
        doc! {},
    ];

    let mut bytes = Vec::new();
    for doc in &docs {
        bytes.extend_from_slice(&encode_document(doc, false).unwrap());
    }

    assert_eq!(decode_all(&bytes).unwrap(), docs);
    assert_eq!(decode_all(&[]).unwrap(), Vec::<Document>::new());

    // A truncated trailing document fails the whole call.
    bytes.pop();
    assert!(decode_all(&bytes).is_err());
}

#[test]
fn test_length_self_consistency() {
    let docs = [
        doc! {},
        doc! { "a": 1 },
        doc! { "nested": { "deep": [1, 2, { "er": null }] } },
    ];

    for doc in &docs {
        let bytes = encode_document(doc, false).unwrap();
        let declared = i32::from_le_bytes(bytes[..4].try_into().unwrap()) as usize;
        assert_eq!(declared, bytes.len());
        assert_eq!(bytes[bytes.len() - 1], 0);
        assert!(bytes.len() >= 5);
    }
}
