use bson_wire::{
    doc,
    message::{self, OpCode, QueryFlags, UpdateFlags},
    Error,
};

fn header(bytes: &[u8]) -> (i32, i32, i32, i32) {
    let field = |at: usize| i32::from_le_bytes(bytes[at..at + 4].try_into().unwrap());
    (field(0), field(4), field(8), field(12))
}

#[test]
fn test_get_more() {
    let (request_id, bytes) = message::get_more("db.c", 10, 0x1122334455667788).unwrap();

    let (length, header_id, response_to, op_code) = header(&bytes);
    assert_eq!(length as usize, bytes.len());
    assert_eq!(header_id, request_id);
    assert_eq!(response_to, 0);
    assert_eq!(op_code, OpCode::GetMore as i32);
    assert_eq!(&bytes[12..16], &[0xD5, 0x07, 0x00, 0x00]);

    // reserved, cstring collection name, numToReturn, cursor id
    assert_eq!(&bytes[16..20], &[0, 0, 0, 0]);
    assert_eq!(&bytes[20..25], b"db.c\0");
    assert_eq!(&bytes[25..29], &10i32.to_le_bytes());
    assert_eq!(
        &bytes[29..37],
        &[0x88, 0x77, 0x66, 0x55, 0x44, 0x33, 0x22, 0x11]
    );
    assert_eq!(bytes.len(), 37);
}

#[test]
fn test_insert() {
    let msg = message::insert("db.c", &[doc! { "x": 1 }], true, None).unwrap();

    let (length, header_id, response_to, op_code) = header(&msg.bytes);
    assert_eq!(length as usize, msg.bytes.len());
    assert_eq!(header_id, msg.request_id);
    assert_eq!(response_to, 0);
    assert_eq!(op_code, OpCode::Insert as i32);
    assert_eq!(&msg.bytes[12..16], &[0xD2, 0x07, 0x00, 0x00]);

    // flags, cstring collection name, then the document
    assert_eq!(&msg.bytes[16..20], &[0, 0, 0, 0]);
    assert_eq!(&msg.bytes[20..25], b"db.c\0");
    assert_eq!(
        &msg.bytes[25..],
        &[0x0C, 0, 0, 0, 0x10, 0x78, 0, 1, 0, 0, 0, 0]
    );
    assert_eq!(msg.max_document_size, 12);
}

#[test]
fn test_insert_tracks_largest_document() {
    let msg = message::insert(
        "db.c",
        &[doc! { "x": 1 }, doc! { "longer": "payload here" }, doc! {}],
        false,
        None,
    )
    .unwrap();

    let largest = bson_wire::encode_document(&doc! { "longer": "payload here" }, false)
        .unwrap()
        .len();
    assert_eq!(msg.max_document_size, largest);
}

#[test]
fn test_empty_bulk_insert_is_rejected() {
    assert!(matches!(
        message::insert("db.c", &[], true, None),
        Err(Error::InvalidOperation { .. })
    ));
}

#[test]
fn test_insert_safe_appends_last_error_query() {
    let msg = message::insert(
        "db.c",
        &[doc! { "x": 1 }],
        true,
        Some(&doc! { "w": 2, "wtimeout": 100 }),
    )
    .unwrap();

    // Two back-to-back complete messages.
    let first_length = i32::from_le_bytes(msg.bytes[0..4].try_into().unwrap()) as usize;
    assert!(first_length < msg.bytes.len());
    let second = &msg.bytes[first_length..];
    let (second_length, second_id, response_to, op_code) = header(second);
    assert_eq!(first_length + second_length as usize, msg.bytes.len());

    // Same request id, QUERY opcode.
    assert_eq!(second_id, msg.request_id);
    assert_eq!(response_to, 0);
    assert_eq!(op_code, OpCode::Query as i32);
    assert_eq!(&second[12..16], &[0xD4, 0x07, 0x00, 0x00]);

    // The fixed prologue: options, admin.$cmd, numToSkip, numToReturn -1.
    assert_eq!(&second[16..20], &[0, 0, 0, 0]);
    assert_eq!(&second[20..31], b"admin.$cmd\0");
    assert_eq!(&second[31..35], &[0, 0, 0, 0]);
    assert_eq!(&second[35..39], &[0xFF, 0xFF, 0xFF, 0xFF]);

    // The command document leads with getlasterror: 1, then the options.
    let expected = doc! { "getlasterror": 1, "w": 2, "wtimeout": 100 };
    let (command, rest) = bson_wire::decode_document(&second[39..]).unwrap();
    assert!(rest.is_empty());
    assert_eq!(command, expected);
    assert_eq!(command.keys().next().map(|k| k.as_str()), Some("getlasterror"));
}

#[test]
fn test_update() {
    let msg = message::update(
        "db.c",
        UpdateFlags::UPSERT | UpdateFlags::MULTI,
        &doc! { "x": 1 },
        &doc! { "$set": { "x": 2 } },
        None,
    )
    .unwrap();

    let (length, _, _, op_code) = header(&msg.bytes);
    assert_eq!(length as usize, msg.bytes.len());
    assert_eq!(op_code, OpCode::Update as i32);
    assert_eq!(&msg.bytes[12..16], &[0xD1, 0x07, 0x00, 0x00]);

    // reserved, cstring collection name, options
    assert_eq!(&msg.bytes[16..20], &[0, 0, 0, 0]);
    assert_eq!(&msg.bytes[20..25], b"db.c\0");
    assert_eq!(&msg.bytes[25..29], &3i32.to_le_bytes());

    // selector document, then update document
    let (selector, rest) = bson_wire::decode_document(&msg.bytes[29..]).unwrap();
    assert_eq!(selector, doc! { "x": 1 });
    let (update, rest) = bson_wire::decode_document(rest).unwrap();
    assert_eq!(update, doc! { "$set": { "x": 2 } });
    assert!(rest.is_empty());

    // max size is the larger of the two documents
    let update_len = bson_wire::encode_document(&doc! { "$set": { "x": 2 } }, false)
        .unwrap()
        .len();
    assert_eq!(msg.max_document_size, update_len);
}

#[test]
fn test_update_safe_appends_last_error_query() {
    let msg = message::update(
        "db.c",
        UpdateFlags::empty(),
        &doc! {},
        &doc! { "x": 1 },
        Some(&doc! {}),
    )
    .unwrap();

    let first_length = i32::from_le_bytes(msg.bytes[0..4].try_into().unwrap()) as usize;
    let second = &msg.bytes[first_length..];
    assert_eq!(&second[12..16], &[0xD4, 0x07, 0x00, 0x00]);

    let (command, _) = bson_wire::decode_document(&second[39..]).unwrap();
    assert_eq!(command, doc! { "getlasterror": 1 });
}

#[test]
fn test_query() {
    let msg = message::query(
        QueryFlags::SECONDARY_OK | QueryFlags::TAILABLE_CURSOR,
        "db.c",
        4,
        -1,
        &doc! { "x": 1 },
        Some(&doc! { "x": 1, "y": 1 }),
    )
    .unwrap();

    let (length, _, _, op_code) = header(&msg.bytes);
    assert_eq!(length as usize, msg.bytes.len());
    assert_eq!(op_code, OpCode::Query as i32);
    assert_eq!(&msg.bytes[12..16], &[0xD4, 0x07, 0x00, 0x00]);

    // caller-supplied flags, cstring collection name, skip, return
    assert_eq!(&msg.bytes[16..20], &6i32.to_le_bytes());
    assert_eq!(&msg.bytes[20..25], b"db.c\0");
    assert_eq!(&msg.bytes[25..29], &4i32.to_le_bytes());
    assert_eq!(&msg.bytes[29..33], &(-1i32).to_le_bytes());

    // query document, then the optional field selector
    let (query, rest) = bson_wire::decode_document(&msg.bytes[33..]).unwrap();
    assert_eq!(query, doc! { "x": 1 });
    let (selector, rest) = bson_wire::decode_document(rest).unwrap();
    assert_eq!(selector, doc! { "x": 1, "y": 1 });
    assert!(rest.is_empty());

    let selector_len = bson_wire::encode_document(&doc! { "x": 1, "y": 1 }, false)
        .unwrap()
        .len();
    assert_eq!(msg.max_document_size, selector_len);
}

#[test]
fn test_query_without_field_selector() {
    let msg = message::query(QueryFlags::empty(), "db.c", 0, 0, &doc! {}, None).unwrap();

    let (query, rest) = bson_wire::decode_document(&msg.bytes[33..]).unwrap();
    assert_eq!(query, doc! {});
    assert!(rest.is_empty());
    assert_eq!(msg.max_document_size, 5);
}

#[test]
fn test_insert_applies_check_keys() {
    assert!(matches!(
        message::insert("db.c", &[doc! { "$bad": 1 }], true, None),
        Err(Error::InvalidDocument { .. })
    ));
    assert!(message::insert("db.c", &[doc! { "$bad": 1 }], false, None).is_ok());
}

#[test]
fn test_collection_name_with_nul_is_rejected() {
    assert!(matches!(
        message::get_more("db\0c", 1, 1),
        Err(Error::InvalidDocument { .. })
    ));
}

#[test]
fn test_insert_promotes_id_in_each_document() {
    let msg = message::insert("db.c", &[doc! { "a": 1, "_id": 7 }], false, None).unwrap();
    let (doc, _) = bson_wire::decode_document(&msg.bytes[25..]).unwrap();
    assert_eq!(doc.keys().next().map(|k| k.as_str()), Some("_id"));
}
