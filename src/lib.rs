//! BSON, short for Binary JSON, is a binary-encoded serialization of
//! JSON-like documents. Like JSON, BSON supports the embedding of documents
//! and arrays within other documents and arrays, and it adds types that are
//! not part of the JSON spec, such as datetimes and binary data.
//!
//! ```text
//! // JSON equivalent
//! {"hello": "world"}
//!
//! // BSON encoding
//! \x16\x00\x00\x00                   // total document size
//! \x02                               // 0x02 = type String
//! hello\x00                          // field name
//! \x06\x00\x00\x00world\x00          // field value
//! \x00                               // 0x00 = type EOO ('end of object')
//! ```
//!
//! BSON is the primary data representation for
//! [MongoDB](https://www.mongodb.com/). This crate implements the codec for
//! it together with a builder for the wire protocol request messages that
//! carry BSON payloads. For more information about BSON itself, see
//! [bsonspec.org](http://bsonspec.org).
//!
//! ## Values and documents
//!
//! The possible BSON values are modeled by the [`Bson`] enum, and documents
//! (insertion-ordered maps from string keys to values) by the [`Document`]
//! struct. Both can be built directly or through the [`bson!`] and [`doc!`]
//! macros:
//!
//! ```rust
//! use bson_wire::{doc, Bson};
//!
//! let doc = doc! {
//!     "hello": "world",
//!     "int": 5,
//!     "subdoc": { "cat": true },
//! };
//! assert_eq!(doc.get("int"), Some(&Bson::Int32(5)));
//! ```
//!
//! ## Encoding and decoding
//!
//! [`encode_document`] turns a [`Document`] into its BSON bytes, and
//! [`decode_document`] / [`decode_all`] turn bytes back into documents:
//!
//! ```rust
//! use bson_wire::{decode_document, doc, encode_document};
//!
//! let doc = doc! { "x": 1, "y": "z" };
//! let bytes = encode_document(&doc, false).unwrap();
//! let (roundtrip, rest) = decode_document(&bytes).unwrap();
//! assert_eq!(roundtrip, doc);
//! assert!(rest.is_empty());
//! ```
//!
//! ## Wire messages
//!
//! The [`message`] module assembles the INSERT, UPDATE, QUERY, and GET_MORE
//! messages of the MongoDB wire protocol, optionally followed by an in-band
//! `getLastError` acknowledgment request:
//!
//! ```rust
//! use bson_wire::{doc, message};
//!
//! let msg = message::insert("db.test", &[doc! { "x": 1 }], true, None).unwrap();
//! assert_eq!(msg.bytes.len(), msg.bytes[0] as usize);
//! ```

pub use self::{
    binary::Binary,
    bson::{Array, Bson, DbRef, JavaScriptCodeWithScope, Regex, RegexOptions, Timestamp},
    buffer::Buffer,
    datetime::DateTime,
    decode::{decode_all, decode_document},
    document::Document,
    encode::encode_document,
    error::{Error, Result},
    oid::ObjectId,
    uuid::Uuid,
};

pub mod binary;
mod bson;
pub mod buffer;
pub mod datetime;
pub mod decode;
pub mod document;
pub mod encode;
pub mod error;
mod macros;
pub mod message;
pub mod oid;
pub mod spec;
pub mod uuid;
