//! Builders for the MongoDB wire protocol request messages that carry BSON
//! payloads: INSERT, UPDATE, QUERY, and GET_MORE.
//!
//! Every message starts with the same 16-byte little-endian header: a
//! back-patched total length, a randomly generated request id, a responseTo
//! of zero, and the opcode. The per-opcode body follows. For INSERT and
//! UPDATE, callers can request a server acknowledgment ("safe mode") by
//! passing `getLastError` options; the builder then appends a second,
//! complete QUERY message against `admin.$cmd` reusing the same request id.

use bitflags::bitflags;
use rand::{thread_rng, Rng};

use crate::{
    buffer::Buffer,
    document::Document,
    encode::write_document,
    error::{Error, Result},
};

/// Operation codes for the request messages this module assembles.
#[repr(i32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum OpCode {
    Update = 2001,
    Insert = 2002,
    Query = 2004,
    GetMore = 2005,
}

bitflags! {
    /// Option bits carried in the options int32 of an UPDATE message.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct UpdateFlags: i32 {
        /// Insert the document if no document matches the selector.
        const UPSERT = 1;
        /// Update all matching documents instead of just the first.
        const MULTI = 2;
    }
}

bitflags! {
    /// Option bits carried in the flags int32 of a QUERY message.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct QueryFlags: i32 {
        /// Leave the cursor open after the initial batch.
        const TAILABLE_CURSOR = 2;
        /// Allow reads from secondary replica set members.
        const SECONDARY_OK = 4;
        /// Disable the server's idle cursor timeout.
        const NO_CURSOR_TIMEOUT = 16;
        /// Block briefly at the end of a tailable cursor instead of
        /// returning no data.
        const AWAIT_DATA = 32;
        /// Stream the results in multiple reply packets.
        const EXHAUST = 64;
        /// Tolerate unavailable shards.
        const PARTIAL = 128;
    }
}

/// An assembled wire message, ready to be written to a MongoDB socket.
#[derive(Debug, Clone)]
pub struct Message {
    /// The request id carried in the message header. When a `getLastError`
    /// frame was appended, it carries this same id.
    pub request_id: i32,

    /// The complete message bytes, header included.
    pub bytes: Vec<u8>,

    /// The size of the largest single document in the message body, for
    /// callers enforcing the server's maximum BSON size.
    pub max_document_size: usize,
}

/// Builds an INSERT message for one or more documents.
///
/// `last_error` of `Some(args)` requests a safe write: a `getLastError`
/// command frame with the given options is appended after the insert.
pub fn insert(
    collection: &str,
    documents: &[Document],
    check_keys: bool,
    last_error: Option<&Document>,
) -> Result<Message> {
    let request_id = next_request_id();
    let mut buffer = Buffer::new();

    let length_location = write_header(&mut buffer, request_id, OpCode::Insert)?;
    buffer.write(&0i32.to_le_bytes())?; // flags
    write_collection_name(&mut buffer, collection)?;

    let mut max_document_size = 0;
    for document in documents {
        let before = buffer.position();
        write_document(&mut buffer, document, check_keys, true, 0)?;
        max_document_size = max_document_size.max(buffer.position() - before);
    }
    if max_document_size == 0 {
        return Err(Error::invalid_operation("cannot do an empty bulk insert"));
    }

    patch_length(&mut buffer, length_location);

    if let Some(args) = last_error {
        write_last_error(&mut buffer, request_id, args)?;
    }

    Ok(Message {
        request_id,
        bytes: buffer.into_bytes(),
        max_document_size,
    })
}

/// Builds an UPDATE message.
///
/// `max_document_size` of the result is the larger of the selector and the
/// update document.
pub fn update(
    collection: &str,
    flags: UpdateFlags,
    selector: &Document,
    update: &Document,
    last_error: Option<&Document>,
) -> Result<Message> {
    let request_id = next_request_id();
    let mut buffer = Buffer::new();

    let length_location = write_header(&mut buffer, request_id, OpCode::Update)?;
    buffer.write(&0i32.to_le_bytes())?; // reserved
    write_collection_name(&mut buffer, collection)?;
    buffer.write(&flags.bits().to_le_bytes())?;

    let before = buffer.position();
    write_document(&mut buffer, selector, false, true, 0)?;
    let mut max_document_size = buffer.position() - before;

    let before = buffer.position();
    write_document(&mut buffer, update, false, true, 0)?;
    max_document_size = max_document_size.max(buffer.position() - before);

    patch_length(&mut buffer, length_location);

    if let Some(args) = last_error {
        write_last_error(&mut buffer, request_id, args)?;
    }

    Ok(Message {
        request_id,
        bytes: buffer.into_bytes(),
        max_document_size,
    })
}

/// Builds a QUERY message.
///
/// `max_document_size` of the result is the larger of the query and the
/// field selector, when one is given.
pub fn query(
    flags: QueryFlags,
    collection: &str,
    num_to_skip: i32,
    num_to_return: i32,
    query: &Document,
    field_selector: Option<&Document>,
) -> Result<Message> {
    let request_id = next_request_id();
    let mut buffer = Buffer::new();

    let length_location = write_header(&mut buffer, request_id, OpCode::Query)?;
    buffer.write(&flags.bits().to_le_bytes())?;
    write_collection_name(&mut buffer, collection)?;
    buffer.write(&num_to_skip.to_le_bytes())?;
    buffer.write(&num_to_return.to_le_bytes())?;

    let before = buffer.position();
    write_document(&mut buffer, query, false, true, 0)?;
    let mut max_document_size = buffer.position() - before;

    if let Some(selector) = field_selector {
        let before = buffer.position();
        write_document(&mut buffer, selector, false, true, 0)?;
        max_document_size = max_document_size.max(buffer.position() - before);
    }

    patch_length(&mut buffer, length_location);

    Ok(Message {
        request_id,
        bytes: buffer.into_bytes(),
        max_document_size,
    })
}

/// Builds a GET_MORE message, returning the request id and the message
/// bytes. GET_MORE carries no documents, so there is no size to report.
pub fn get_more(collection: &str, num_to_return: i32, cursor_id: i64) -> Result<(i32, Vec<u8>)> {
    let request_id = next_request_id();
    let mut buffer = Buffer::new();

    let length_location = write_header(&mut buffer, request_id, OpCode::GetMore)?;
    buffer.write(&0i32.to_le_bytes())?; // reserved
    write_collection_name(&mut buffer, collection)?;
    buffer.write(&num_to_return.to_le_bytes())?;
    buffer.write(&cursor_id.to_le_bytes())?;

    patch_length(&mut buffer, length_location);

    Ok((request_id, buffer.into_bytes()))
}

fn next_request_id() -> i32 {
    thread_rng().gen()
}

/// Writes the message header, reserving the length slot and returning its
/// offset.
fn write_header(buffer: &mut Buffer, request_id: i32, op_code: OpCode) -> Result<usize> {
    let length_location = buffer.save_space(4)?;
    buffer.write(&request_id.to_le_bytes())?;
    buffer.write(&0i32.to_le_bytes())?; // responseTo
    buffer.write(&(op_code as i32).to_le_bytes())?;
    Ok(length_location)
}

fn patch_length(buffer: &mut Buffer, length_location: usize) {
    let length = (buffer.position() - length_location) as i32;
    buffer.patch_i32(length_location, length);
}

fn write_collection_name(buffer: &mut Buffer, name: &str) -> Result<()> {
    if name.as_bytes().contains(&0) {
        return Err(Error::invalid_document(
            "collection names must not contain the NULL byte",
        ));
    }
    buffer.write(name.as_bytes())?;
    buffer.write(&[0])
}

/// Appends a complete `getLastError` command frame reusing `request_id`.
///
/// The 31 bytes between the length slot's request id and the command
/// document are fixed: responseTo, the QUERY opcode, zero options, the
/// `admin.$cmd` namespace, a zero skip, and a numToReturn of -1.
fn write_last_error(buffer: &mut Buffer, request_id: i32, args: &Document) -> Result<()> {
    let length_location = buffer.save_space(4)?;
    buffer.write(&request_id.to_le_bytes())?;
    buffer.write(&0i32.to_le_bytes())?; // responseTo
    buffer.write(&(OpCode::Query as i32).to_le_bytes())?;
    buffer.write(&0i32.to_le_bytes())?; // options
    buffer.write(b"admin.$cmd\x00")?;
    buffer.write(&0i32.to_le_bytes())?; // numToSkip
    buffer.write(&(-1i32).to_le_bytes())?; // numToReturn

    let mut command = Document::new();
    command.insert("getlasterror", 1);
    for (key, value) in args {
        command.insert(key.clone(), value.clone());
    }
    write_document(buffer, &command, false, false, 0)?;

    patch_length(buffer, length_location);
    Ok(())
}
