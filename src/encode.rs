//! The BSON document encoder.

use crate::{
    bson::{Bson, JavaScriptCodeWithScope, Regex},
    buffer::Buffer,
    document::Document,
    error::{Error, Result},
    spec::{BinarySubtype, ElementType},
};

/// Values nested deeper than this fail with a clean error instead of
/// exhausting the native stack.
pub(crate) const MAX_RECURSION_DEPTH: usize = 100;

/// Encodes a document into its BSON byte representation.
///
/// When `check_keys` is true, keys starting with `'$'` or containing `'.'`
/// are rejected with [`Error::InvalidDocument`]. Keys containing a NUL byte
/// are always rejected. If the document has an `_id` entry it is written
/// first regardless of its position; the document itself is not reordered.
///
/// ```rust
/// use bson_wire::{doc, encode_document};
///
/// let bytes = encode_document(&doc! { "hello": "world" }, false).unwrap();
/// assert_eq!(bytes[..4], (bytes.len() as u32).to_le_bytes());
/// ```
pub fn encode_document(document: &Document, check_keys: bool) -> Result<Vec<u8>> {
    let mut buffer = Buffer::new();
    write_document(&mut buffer, document, check_keys, true, 0)?;
    Ok(buffer.into_bytes())
}

/// Writes one complete document, length prefix and trailing NUL included.
///
/// `_id` promotion only applies when `top_level` is set; nested documents
/// keep their caller's iteration order untouched.
pub(crate) fn write_document(
    buffer: &mut Buffer,
    document: &Document,
    check_keys: bool,
    top_level: bool,
    depth: usize,
) -> Result<()> {
    let length_location = buffer.save_space(4)?;

    if top_level {
        if let Some(id) = document.get("_id") {
            // The server requires _id first. Key checks don't apply to it.
            write_pair(buffer, "_id", id, false, depth)?;
        }
    }

    for (key, value) in document {
        if top_level && key == "_id" {
            continue;
        }
        write_pair(buffer, key, value, check_keys, depth)?;
    }

    buffer.write(&[0])?;
    let length = (buffer.position() - length_location) as i32;
    buffer.patch_i32(length_location, length);
    Ok(())
}

/// Writes one element: reserved type byte, key cstring, then the value. The
/// type byte is patched once the value arm is known.
fn write_pair(
    buffer: &mut Buffer,
    key: &str,
    value: &Bson,
    check_keys: bool,
    depth: usize,
) -> Result<()> {
    let type_byte = buffer.save_space(1)?;
    if check_keys {
        check_key_name(key)?;
    }
    write_cstring(buffer, key, "key names")?;
    write_element(buffer, type_byte, value, check_keys, depth)
}

fn check_key_name(key: &str) -> Result<()> {
    if key.starts_with('$') {
        return Err(Error::invalid_document(format!(
            "key '{}' must not start with '$'",
            key
        )));
    }
    if key.contains('.') {
        return Err(Error::invalid_document(format!(
            "key '{}' must not contain '.'",
            key
        )));
    }
    Ok(())
}

/// Writes a NUL-terminated string, rejecting interior NUL bytes. `what`
/// names the offending position in the error message.
fn write_cstring(buffer: &mut Buffer, s: &str, what: &str) -> Result<()> {
    if s.as_bytes().contains(&0) {
        return Err(Error::invalid_document(format!(
            "{} must not contain the NULL byte",
            what
        )));
    }
    buffer.write(s.as_bytes())?;
    buffer.write(&[0])
}

/// Writes a length-prefixed string: `len(utf8) + 1` as a little-endian
/// int32, the UTF-8 bytes, then the terminating NUL counted by the length.
fn write_string(buffer: &mut Buffer, s: &str) -> Result<()> {
    buffer.write(&(s.len() as i32 + 1).to_le_bytes())?;
    buffer.write(s.as_bytes())?;
    buffer.write(&[0])
}

fn write_element(
    buffer: &mut Buffer,
    type_byte: usize,
    value: &Bson,
    check_keys: bool,
    depth: usize,
) -> Result<()> {
    if depth > MAX_RECURSION_DEPTH {
        return Err(Error::invalid_document(
            "nesting too deep: documents are limited to 100 levels",
        ));
    }

    match value {
        Bson::Double(v) => {
            buffer.set_u8(type_byte, ElementType::Double as u8);
            buffer.write(&v.to_le_bytes())
        }
        Bson::String(s) => {
            buffer.set_u8(type_byte, ElementType::String as u8);
            write_string(buffer, s)
        }
        Bson::Document(document) => {
            buffer.set_u8(type_byte, ElementType::EmbeddedDocument as u8);
            write_document(buffer, document, check_keys, false, depth + 1)
        }
        Bson::Array(array) => {
            buffer.set_u8(type_byte, ElementType::Array as u8);

            let length_location = buffer.save_space(4)?;
            for (index, item) in array.iter().enumerate() {
                // Keys are the decimal index strings "0", "1", ... in
                // positional order.
                let item_type_byte = buffer.save_space(1)?;
                buffer.write(index.to_string().as_bytes())?;
                buffer.write(&[0])?;
                write_element(buffer, item_type_byte, item, check_keys, depth + 1)?;
            }
            buffer.write(&[0])?;
            let length = (buffer.position() - length_location) as i32;
            buffer.patch_i32(length_location, length);
            Ok(())
        }
        Bson::Binary(binary) => {
            buffer.set_u8(type_byte, ElementType::Binary as u8);

            let length = binary.bytes.len() as i32;
            if binary.subtype == BinarySubtype::BinaryOld {
                // The payload carries its own redundant length; the outer
                // length covers that extra int32 as well.
                buffer.write(&(length + 4).to_le_bytes())?;
                buffer.write(&[u8::from(binary.subtype)])?;
                buffer.write(&length.to_le_bytes())?;
            } else {
                buffer.write(&length.to_le_bytes())?;
                buffer.write(&[u8::from(binary.subtype)])?;
            }
            buffer.write(&binary.bytes)
        }
        Bson::Uuid(uuid) => {
            // A special case of binary: subtype 3, always 16 bytes, stored
            // little-endian.
            buffer.set_u8(type_byte, ElementType::Binary as u8);
            buffer.write(&16i32.to_le_bytes())?;
            buffer.write(&[u8::from(BinarySubtype::UuidOld)])?;
            buffer.write(&uuid.bytes_le())
        }
        Bson::ObjectId(id) => {
            buffer.set_u8(type_byte, ElementType::ObjectId as u8);
            buffer.write(&id.bytes())
        }
        Bson::Boolean(b) => {
            buffer.set_u8(type_byte, ElementType::Boolean as u8);
            buffer.write(&[*b as u8])
        }
        Bson::DateTime(dt) => {
            buffer.set_u8(type_byte, ElementType::DateTime as u8);
            buffer.write(&dt.timestamp_millis().to_le_bytes())
        }
        Bson::Null => {
            buffer.set_u8(type_byte, ElementType::Null as u8);
            Ok(())
        }
        Bson::RegularExpression(Regex { pattern, options }) => {
            buffer.set_u8(type_byte, ElementType::RegularExpression as u8);
            write_cstring(buffer, pattern, "regex patterns")?;
            write_cstring(buffer, &options.to_letters(), "regex options")
        }
        Bson::JavaScriptCode(code) => {
            buffer.set_u8(type_byte, ElementType::JavaScriptCode as u8);
            write_string(buffer, code)
        }
        Bson::JavaScriptCodeWithScope(JavaScriptCodeWithScope { code, scope }) => {
            buffer.set_u8(type_byte, ElementType::JavaScriptCodeWithScope as u8);

            let length_location = buffer.save_space(4)?;
            write_string(buffer, code)?;
            write_document(buffer, scope, false, false, depth + 1)?;
            let length = (buffer.position() - length_location) as i32;
            buffer.patch_i32(length_location, length);
            Ok(())
        }
        Bson::Int32(v) => {
            buffer.set_u8(type_byte, ElementType::Int32 as u8);
            buffer.write(&v.to_le_bytes())
        }
        Bson::Timestamp(ts) => {
            buffer.set_u8(type_byte, ElementType::Timestamp as u8);
            buffer.write(&ts.increment.to_le_bytes())?;
            buffer.write(&ts.time.to_le_bytes())
        }
        Bson::Int64(v) => {
            buffer.set_u8(type_byte, ElementType::Int64 as u8);
            buffer.write(&v.to_le_bytes())
        }
        Bson::DbRef(dbref) => {
            buffer.set_u8(type_byte, ElementType::EmbeddedDocument as u8);
            write_document(buffer, &dbref.to_document(), false, false, depth + 1)
        }
        Bson::MinKey => {
            buffer.set_u8(type_byte, ElementType::MinKey as u8);
            Ok(())
        }
        Bson::MaxKey => {
            buffer.set_u8(type_byte, ElementType::MaxKey as u8);
            Ok(())
        }
    }
}
