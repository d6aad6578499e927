//! The BSON document decoder.

use std::str;

use crate::{
    binary::Binary,
    bson::{Array, Bson, DbRef, JavaScriptCodeWithScope, Regex, RegexOptions, Timestamp},
    datetime::DateTime,
    document::Document,
    encode::MAX_RECURSION_DEPTH,
    error::{Error, Result},
    oid::ObjectId,
    spec::{BinarySubtype, ElementType},
    uuid::Uuid,
};

/// The smallest well-formed document: a length prefix and a trailing NUL.
const MIN_DOCUMENT_SIZE: usize = 5;

/// Decodes exactly one document from the front of `bytes`, returning it
/// together with the unread tail.
///
/// ```rust
/// use bson_wire::{decode_document, doc, encode_document};
///
/// let mut bytes = encode_document(&doc! { "x": 1 }, false).unwrap();
/// bytes.extend_from_slice(b"tail");
///
/// let (decoded, rest) = decode_document(&bytes).unwrap();
/// assert_eq!(decoded, doc! { "x": 1 });
/// assert_eq!(rest, b"tail");
/// ```
pub fn decode_document(bytes: &[u8]) -> Result<(Document, &[u8])> {
    if bytes.len() < MIN_DOCUMENT_SIZE {
        return Err(Error::invalid_bson("not enough data for a BSON document"));
    }
    let mut pos = 0;
    let document = read_document(bytes, &mut pos, 0)?;
    Ok((document, &bytes[pos..]))
}

/// Decodes a concatenation of documents until the input is exhausted.
pub fn decode_all(bytes: &[u8]) -> Result<Vec<Document>> {
    let mut documents = Vec::new();
    let mut rest = bytes;
    while !rest.is_empty() {
        let (document, remaining) = decode_document(rest)?;
        documents.push(document);
        rest = remaining;
    }
    Ok(documents)
}

/// Checks that `count` more bytes are available before `end`.
fn need(end: usize, pos: usize, count: usize) -> Result<()> {
    if count > end || pos > end - count {
        return Err(Error::invalid_bson(
            "element payload exceeds remaining bytes",
        ));
    }
    Ok(())
}

fn read_i32(bytes: &[u8], pos: &mut usize, end: usize) -> Result<i32> {
    need(end, *pos, 4)?;
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&bytes[*pos..*pos + 4]);
    *pos += 4;
    Ok(i32::from_le_bytes(raw))
}

fn read_u32(bytes: &[u8], pos: &mut usize, end: usize) -> Result<u32> {
    need(end, *pos, 4)?;
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&bytes[*pos..*pos + 4]);
    *pos += 4;
    Ok(u32::from_le_bytes(raw))
}

fn read_i64(bytes: &[u8], pos: &mut usize, end: usize) -> Result<i64> {
    need(end, *pos, 8)?;
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&bytes[*pos..*pos + 8]);
    *pos += 8;
    Ok(i64::from_le_bytes(raw))
}

fn read_f64(bytes: &[u8], pos: &mut usize, end: usize) -> Result<f64> {
    need(end, *pos, 8)?;
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&bytes[*pos..*pos + 8]);
    *pos += 8;
    Ok(f64::from_le_bytes(raw))
}

fn read_bytes<'a>(bytes: &'a [u8], pos: &mut usize, end: usize, count: usize) -> Result<&'a [u8]> {
    need(end, *pos, count)?;
    let slice = &bytes[*pos..*pos + count];
    *pos += count;
    Ok(slice)
}

fn validate_utf8(raw: &[u8]) -> Result<&str> {
    str::from_utf8(raw).map_err(|e| Error::invalid_string_data(e.to_string()))
}

/// Reads a NUL-terminated UTF-8 string; the terminator must appear before
/// `end`.
fn read_cstring<'a>(bytes: &'a [u8], pos: &mut usize, end: usize) -> Result<&'a str> {
    let nul = bytes[*pos..end]
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| Error::invalid_bson("unterminated cstring"))?;
    let s = validate_utf8(&bytes[*pos..*pos + nul])?;
    *pos += nul + 1;
    Ok(s)
}

/// Reads a length-prefixed string. The declared length counts the trailing
/// NUL, which must be present.
fn read_string<'a>(bytes: &'a [u8], pos: &mut usize, end: usize) -> Result<&'a str> {
    let length = read_i32(bytes, pos, end)?;
    if length < 1 {
        return Err(Error::invalid_bson("invalid string length"));
    }
    let raw = read_bytes(bytes, pos, end, length as usize)?;
    if raw[raw.len() - 1] != 0 {
        return Err(Error::invalid_bson("string missing NUL terminator"));
    }
    validate_utf8(&raw[..raw.len() - 1])
}

/// Reads one complete document starting at `*pos`: validates the length
/// prefix and trailing NUL, then parses elements until the terminator.
fn read_document(bytes: &[u8], pos: &mut usize, depth: usize) -> Result<Document> {
    if depth > MAX_RECURSION_DEPTH {
        return Err(Error::invalid_bson(
            "nesting too deep: documents are limited to 100 levels",
        ));
    }

    let start = *pos;
    let declared = read_i32(bytes, pos, bytes.len())?;
    if declared < MIN_DOCUMENT_SIZE as i32 {
        return Err(Error::invalid_bson("invalid document size"));
    }
    let size = declared as usize;
    if size > bytes.len() - start {
        return Err(Error::invalid_bson("objsize too large"));
    }
    let end = start + size - 1;
    if bytes[end] != 0 {
        return Err(Error::invalid_bson("bad eoo"));
    }

    let mut document = Document::new();
    while *pos < end {
        let element_type = bytes[*pos];
        *pos += 1;
        let key = read_cstring(bytes, pos, end)?.to_owned();
        let value = read_element(bytes, pos, end, element_type, depth)?;
        document.insert(key, value);
    }
    if *pos != end {
        return Err(Error::invalid_bson("element overran document bounds"));
    }
    *pos = end + 1;
    Ok(document)
}

fn read_element(
    bytes: &[u8],
    pos: &mut usize,
    end: usize,
    tag: u8,
    depth: usize,
) -> Result<Bson> {
    let element_type = ElementType::from(tag)
        .ok_or_else(|| Error::invalid_bson(format!("unrecognized element type {:#04x}", tag)))?;

    let value = match element_type {
        ElementType::Double => Bson::Double(read_f64(bytes, pos, end)?),
        ElementType::String => Bson::String(read_string(bytes, pos, end)?.to_owned()),
        ElementType::EmbeddedDocument => {
            peek_size(bytes, pos, end)?;
            let document = read_document(bytes, pos, depth + 1)?;
            into_dbref(document)
        }
        ElementType::Array => {
            let size = peek_size(bytes, pos, end)?;
            let array_end = *pos + size - 1;
            *pos += 4;

            let mut array = Array::new();
            while *pos < array_end {
                let item_type = bytes[*pos];
                *pos += 1;
                // Element keys are just the index strings; skip them.
                read_cstring(bytes, pos, array_end)?;
                array.push(read_element(bytes, pos, array_end, item_type, depth + 1)?);
            }
            if *pos != array_end || bytes[array_end] != 0 {
                return Err(Error::invalid_bson("bad eoo"));
            }
            *pos = array_end + 1;
            Bson::Array(array)
        }
        ElementType::Binary => {
            let length = read_i32(bytes, pos, end)?;
            if length < 0 {
                return Err(Error::invalid_bson("invalid binary length"));
            }
            need(end, *pos, 1 + length as usize)?;
            let subtype = BinarySubtype::from(bytes[*pos]);
            *pos += 1;

            match subtype {
                BinarySubtype::BinaryOld => {
                    // The inner length is redundant; the payload is the
                    // outer length minus the 4 bytes it occupies.
                    if length < 4 {
                        return Err(Error::invalid_bson("invalid binary length"));
                    }
                    read_i32(bytes, pos, end)?;
                    let payload = read_bytes(bytes, pos, end, length as usize - 4)?;
                    Bson::Binary(Binary {
                        subtype,
                        bytes: payload.to_vec(),
                    })
                }
                BinarySubtype::UuidOld => {
                    if length != 16 {
                        return Err(Error::invalid_bson("UUIDs are exactly 16 bytes"));
                    }
                    let mut raw = [0u8; 16];
                    raw.copy_from_slice(read_bytes(bytes, pos, end, 16)?);
                    Bson::Uuid(Uuid::from_bytes_le(raw))
                }
                _ => {
                    let payload = read_bytes(bytes, pos, end, length as usize)?;
                    Bson::Binary(Binary {
                        subtype,
                        bytes: payload.to_vec(),
                    })
                }
            }
        }
        // Undefined is deprecated; it decodes as null.
        ElementType::Undefined | ElementType::Null => Bson::Null,
        ElementType::ObjectId => {
            let mut raw = [0u8; 12];
            raw.copy_from_slice(read_bytes(bytes, pos, end, 12)?);
            Bson::ObjectId(ObjectId::from_bytes(raw))
        }
        ElementType::Boolean => {
            need(end, *pos, 1)?;
            let b = bytes[*pos];
            *pos += 1;
            Bson::Boolean(b != 0)
        }
        ElementType::DateTime => {
            Bson::DateTime(DateTime::from_millis(read_i64(bytes, pos, end)?))
        }
        ElementType::RegularExpression => {
            let pattern = read_cstring(bytes, pos, end)?.to_owned();
            let letters = read_cstring(bytes, pos, end)?;
            Bson::RegularExpression(Regex {
                pattern,
                options: RegexOptions::from_letters(letters),
            })
        }
        // DBPointer is deprecated; it decodes as a DBRef.
        ElementType::DbPointer => {
            let namespace = read_string(bytes, pos, end)?.to_owned();
            let mut raw = [0u8; 12];
            raw.copy_from_slice(read_bytes(bytes, pos, end, 12)?);
            Bson::DbRef(DbRef::new(namespace, ObjectId::from_bytes(raw), None))
        }
        ElementType::JavaScriptCode => {
            Bson::JavaScriptCode(read_string(bytes, pos, end)?.to_owned())
        }
        // Symbol is deprecated; it decodes as a string.
        ElementType::Symbol => Bson::String(read_string(bytes, pos, end)?.to_owned()),
        ElementType::JavaScriptCodeWithScope => {
            let start = *pos;
            let length = read_i32(bytes, pos, end)?;
            if length < 14 {
                // Shorter than an empty code string plus an empty scope.
                return Err(Error::invalid_bson("invalid code_w_scope length"));
            }
            need(end, start, length as usize)?;
            let code = read_string(bytes, pos, end)?.to_owned();
            let scope = read_document(bytes, pos, depth + 1)?;
            if *pos - start != length as usize {
                return Err(Error::invalid_bson("code_w_scope length mismatch"));
            }
            Bson::JavaScriptCodeWithScope(JavaScriptCodeWithScope { code, scope })
        }
        ElementType::Int32 => Bson::Int32(read_i32(bytes, pos, end)?),
        ElementType::Timestamp => {
            let increment = read_u32(bytes, pos, end)?;
            let time = read_u32(bytes, pos, end)?;
            Bson::Timestamp(Timestamp { time, increment })
        }
        ElementType::Int64 => Bson::Int64(read_i64(bytes, pos, end)?),
        ElementType::MaxKey => Bson::MaxKey,
        ElementType::MinKey => Bson::MinKey,
    };
    Ok(value)
}

/// Peeks the size prefix of an embedded document or array without consuming
/// it, checking that the whole structure fits before `end`.
fn peek_size(bytes: &[u8], pos: &mut usize, end: usize) -> Result<usize> {
    let mut peek = *pos;
    let declared = read_i32(bytes, &mut peek, end)?;
    if declared < MIN_DOCUMENT_SIZE as i32 {
        return Err(Error::invalid_bson("invalid document size"));
    }
    need(end, *pos, declared as usize)?;
    Ok(declared as usize)
}

/// A decoded sub-document whose first key is `$ref` is a DBRef. `$ref`,
/// `$id`, and `$db` move into the reference; everything else stays in its
/// extra-fields document.
fn into_dbref(mut document: Document) -> Bson {
    match (document.iter().next(), document.get("$id")) {
        (Some((key, Bson::String(_))), Some(_)) if key == "$ref" => {}
        _ => return Bson::Document(document),
    }

    let collection = match document.remove("$ref") {
        Some(Bson::String(collection)) => collection,
        // Checked above; keep the document intact if it somehow changed.
        _ => return Bson::Document(document),
    };
    let id = document.remove("$id").unwrap_or(Bson::Null);
    let database = match document.remove("$db") {
        Some(Bson::String(database)) => Some(database),
        // A non-string $db stays with the extra fields.
        Some(other) => {
            document.insert("$db", other);
            None
        }
        None => None,
    };

    Bson::DbRef(DbRef {
        collection,
        id: Box::new(id),
        database,
        extra: document,
    })
}
