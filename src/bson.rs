//! The BSON value model.

use std::fmt::{self, Debug, Display};

use bitflags::bitflags;

use crate::{
    binary::Binary,
    datetime::DateTime,
    document::Document,
    error::Error,
    oid::ObjectId,
    spec::{BinarySubtype, ElementType},
    uuid::Uuid,
};

/// Possible BSON value types.
#[derive(Clone, PartialEq)]
pub enum Bson {
    /// 64-bit binary floating point
    Double(f64),
    /// UTF-8 string
    String(String),
    /// Array
    Array(Array),
    /// Embedded document
    Document(Document),
    /// Boolean value
    Boolean(bool),
    /// Null value
    Null,
    /// Regular expression
    RegularExpression(Regex),
    /// JavaScript code
    JavaScriptCode(String),
    /// JavaScript code with scope
    JavaScriptCodeWithScope(JavaScriptCodeWithScope),
    /// 32-bit signed integer
    Int32(i32),
    /// 64-bit signed integer
    Int64(i64),
    /// Timestamp
    Timestamp(Timestamp),
    /// Binary data
    Binary(Binary),
    /// [ObjectId](http://dochub.mongodb.org/core/objectids)
    ObjectId(ObjectId),
    /// UTC datetime
    DateTime(DateTime),
    /// UUID, carried on the wire as binary subtype 3
    Uuid(Uuid),
    /// Reference to a document in another collection
    DbRef(DbRef),
    /// Sentinel that sorts below all other values
    MinKey,
    /// Sentinel that sorts above all other values
    MaxKey,
}

/// Alias for `Vec<Bson>`.
pub type Array = Vec<Bson>;

impl Display for Bson {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Bson::Double(d) => write!(fmt, "{}", d),
            Bson::String(s) => write!(fmt, "\"{}\"", s),
            Bson::Array(arr) => {
                fmt.write_str("[")?;

                let mut first = true;
                for bson in arr {
                    if !first {
                        fmt.write_str(", ")?;
                    }
                    write!(fmt, "{}", bson)?;
                    first = false;
                }

                fmt.write_str("]")
            }
            Bson::Document(doc) => write!(fmt, "{}", doc),
            Bson::Boolean(b) => write!(fmt, "{}", b),
            Bson::Null => fmt.write_str("null"),
            Bson::RegularExpression(regex) => write!(fmt, "{}", regex),
            Bson::JavaScriptCode(code)
            | Bson::JavaScriptCodeWithScope(JavaScriptCodeWithScope { code, .. }) => {
                fmt.write_str(code)
            }
            Bson::Int32(i) => write!(fmt, "{}", i),
            Bson::Int64(i) => write!(fmt, "{}", i),
            Bson::Timestamp(ts) => write!(fmt, "{}", ts),
            Bson::Binary(bin) => write!(fmt, "{}", bin),
            Bson::ObjectId(id) => write!(fmt, "ObjectId(\"{}\")", id),
            Bson::DateTime(dt) => write!(fmt, "DateTime(\"{}\")", dt),
            Bson::Uuid(uuid) => write!(fmt, "Uuid(\"{}\")", uuid),
            Bson::DbRef(dbref) => write!(fmt, "{}", dbref),
            Bson::MinKey => fmt.write_str("MinKey"),
            Bson::MaxKey => fmt.write_str("MaxKey"),
        }
    }
}

impl Debug for Bson {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Bson::Double(d) => write!(fmt, "Double({:?})", d),
            Bson::String(s) => write!(fmt, "String({:?})", s),
            Bson::Array(arr) => {
                fmt.write_str("Array(")?;
                Debug::fmt(arr, fmt)?;
                fmt.write_str(")")
            }
            Bson::Document(doc) => Debug::fmt(doc, fmt),
            Bson::Boolean(b) => write!(fmt, "Boolean({:?})", b),
            Bson::Null => fmt.write_str("Null"),
            Bson::RegularExpression(regex) => Debug::fmt(regex, fmt),
            Bson::JavaScriptCode(code) => write!(fmt, "JavaScriptCode({:?})", code),
            Bson::JavaScriptCodeWithScope(code_w_scope) => Debug::fmt(code_w_scope, fmt),
            Bson::Int32(i) => write!(fmt, "Int32({:?})", i),
            Bson::Int64(i) => write!(fmt, "Int64({:?})", i),
            Bson::Timestamp(ts) => Debug::fmt(ts, fmt),
            Bson::Binary(bin) => Debug::fmt(bin, fmt),
            Bson::ObjectId(id) => Debug::fmt(id, fmt),
            Bson::DateTime(dt) => Debug::fmt(dt, fmt),
            Bson::Uuid(uuid) => Debug::fmt(uuid, fmt),
            Bson::DbRef(dbref) => Debug::fmt(dbref, fmt),
            Bson::MinKey => fmt.write_str("MinKey"),
            Bson::MaxKey => fmt.write_str("MaxKey"),
        }
    }
}

impl From<f32> for Bson {
    fn from(x: f32) -> Bson {
        Bson::Double(x as f64)
    }
}

impl From<f64> for Bson {
    fn from(x: f64) -> Bson {
        Bson::Double(x)
    }
}

impl From<&str> for Bson {
    fn from(s: &str) -> Bson {
        Bson::String(s.to_owned())
    }
}

impl From<String> for Bson {
    fn from(s: String) -> Bson {
        Bson::String(s)
    }
}

impl From<&String> for Bson {
    fn from(s: &String) -> Bson {
        Bson::String(s.clone())
    }
}

impl From<bool> for Bson {
    fn from(b: bool) -> Bson {
        Bson::Boolean(b)
    }
}

impl From<i32> for Bson {
    fn from(i: i32) -> Bson {
        Bson::Int32(i)
    }
}

/// Integers narrow to `Int32` when they fit in a signed 32-bit value and
/// widen to `Int64` otherwise.
impl From<i64> for Bson {
    fn from(i: i64) -> Bson {
        match i32::try_from(i) {
            Ok(i) => Bson::Int32(i),
            Err(_) => Bson::Int64(i),
        }
    }
}

impl From<u32> for Bson {
    fn from(u: u32) -> Bson {
        Bson::from(u as i64)
    }
}

/// Fails with [`Error::Overflow`] when the value exceeds the signed 64-bit
/// range.
impl TryFrom<u64> for Bson {
    type Error = Error;

    fn try_from(u: u64) -> Result<Bson, Error> {
        match i64::try_from(u) {
            Ok(i) => Ok(Bson::from(i)),
            Err(_) => Err(Error::Overflow),
        }
    }
}

/// Fails with [`Error::Overflow`] when the value exceeds the signed 64-bit
/// range.
impl TryFrom<i128> for Bson {
    type Error = Error;

    fn try_from(i: i128) -> Result<Bson, Error> {
        match i64::try_from(i) {
            Ok(i) => Ok(Bson::from(i)),
            Err(_) => Err(Error::Overflow),
        }
    }
}

impl From<Array> for Bson {
    fn from(arr: Array) -> Bson {
        Bson::Array(arr)
    }
}

impl From<Document> for Bson {
    fn from(doc: Document) -> Bson {
        Bson::Document(doc)
    }
}

impl From<Regex> for Bson {
    fn from(regex: Regex) -> Bson {
        Bson::RegularExpression(regex)
    }
}

impl From<JavaScriptCodeWithScope> for Bson {
    fn from(code_w_scope: JavaScriptCodeWithScope) -> Bson {
        Bson::JavaScriptCodeWithScope(code_w_scope)
    }
}

impl From<Timestamp> for Bson {
    fn from(ts: Timestamp) -> Bson {
        Bson::Timestamp(ts)
    }
}

impl From<Binary> for Bson {
    fn from(binary: Binary) -> Bson {
        Bson::Binary(binary)
    }
}

/// Byte strings become generic (subtype 0) binary values.
impl From<Vec<u8>> for Bson {
    fn from(bytes: Vec<u8>) -> Bson {
        Bson::Binary(Binary {
            subtype: BinarySubtype::Generic,
            bytes,
        })
    }
}

impl From<&[u8]> for Bson {
    fn from(bytes: &[u8]) -> Bson {
        Bson::from(bytes.to_vec())
    }
}

impl From<ObjectId> for Bson {
    fn from(id: ObjectId) -> Bson {
        Bson::ObjectId(id)
    }
}

impl From<DateTime> for Bson {
    fn from(dt: DateTime) -> Bson {
        Bson::DateTime(dt)
    }
}

/// Zone-aware datetimes are normalized to UTC by their offset.
impl<T: chrono::TimeZone> From<chrono::DateTime<T>> for Bson {
    fn from(dt: chrono::DateTime<T>) -> Bson {
        Bson::DateTime(DateTime::from_chrono(dt))
    }
}

/// Naive datetimes are taken to already be in UTC.
impl From<chrono::NaiveDateTime> for Bson {
    fn from(dt: chrono::NaiveDateTime) -> Bson {
        Bson::DateTime(DateTime::from_millis(dt.and_utc().timestamp_millis()))
    }
}

impl From<Uuid> for Bson {
    fn from(uuid: Uuid) -> Bson {
        Bson::Uuid(uuid)
    }
}

impl From<uuid::Uuid> for Bson {
    fn from(uuid: uuid::Uuid) -> Bson {
        Bson::Uuid(uuid.into())
    }
}

impl From<DbRef> for Bson {
    fn from(dbref: DbRef) -> Bson {
        Bson::DbRef(dbref)
    }
}

impl<T: Into<Bson>> From<Option<T>> for Bson {
    fn from(opt: Option<T>) -> Bson {
        match opt {
            Some(value) => value.into(),
            None => Bson::Null,
        }
    }
}

impl Bson {
    /// Gets the [`ElementType`] this value is tagged with on the wire.
    ///
    /// `Uuid` reports [`ElementType::Binary`] and `DbRef` reports
    /// [`ElementType::EmbeddedDocument`], matching their encoded form.
    pub fn element_type(&self) -> ElementType {
        match self {
            Bson::Double(..) => ElementType::Double,
            Bson::String(..) => ElementType::String,
            Bson::Array(..) => ElementType::Array,
            Bson::Document(..) => ElementType::EmbeddedDocument,
            Bson::Boolean(..) => ElementType::Boolean,
            Bson::Null => ElementType::Null,
            Bson::RegularExpression(..) => ElementType::RegularExpression,
            Bson::JavaScriptCode(..) => ElementType::JavaScriptCode,
            Bson::JavaScriptCodeWithScope(..) => ElementType::JavaScriptCodeWithScope,
            Bson::Int32(..) => ElementType::Int32,
            Bson::Int64(..) => ElementType::Int64,
            Bson::Timestamp(..) => ElementType::Timestamp,
            Bson::Binary(..) => ElementType::Binary,
            Bson::ObjectId(..) => ElementType::ObjectId,
            Bson::DateTime(..) => ElementType::DateTime,
            Bson::Uuid(..) => ElementType::Binary,
            Bson::DbRef(..) => ElementType::EmbeddedDocument,
            Bson::MinKey => ElementType::MinKey,
            Bson::MaxKey => ElementType::MaxKey,
        }
    }

    /// If this value is a `Double`, returns the associated `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Bson::Double(d) => Some(*d),
            _ => None,
        }
    }

    /// If this value is a `String`, returns the associated `&str`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Bson::String(s) => Some(s),
            _ => None,
        }
    }

    /// If this value is an `Array`, returns a reference to it.
    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Bson::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// If this value is a `Document`, returns a reference to it.
    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Bson::Document(doc) => Some(doc),
            _ => None,
        }
    }

    /// If this value is a `Boolean`, returns the associated `bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Bson::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// If this value is an `Int32`, returns the associated `i32`.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Bson::Int32(i) => Some(*i),
            _ => None,
        }
    }

    /// If this value is an `Int64`, returns the associated `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Bson::Int64(i) => Some(*i),
            _ => None,
        }
    }

    /// If this value is an `ObjectId`, returns it.
    pub fn as_object_id(&self) -> Option<ObjectId> {
        match self {
            Bson::ObjectId(id) => Some(*id),
            _ => None,
        }
    }

    /// If this value is a `DateTime`, returns it.
    pub fn as_datetime(&self) -> Option<DateTime> {
        match self {
            Bson::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    /// If this value is `Null`, returns `()`.
    pub fn as_null(&self) -> Option<()> {
        match self {
            Bson::Null => Some(()),
            _ => None,
        }
    }
}

/// A BSON regular expression: a pattern and a set of option flags.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Regex {
    /// The regex pattern to match.
    pub pattern: String,

    /// The options in effect for the pattern.
    pub options: RegexOptions,
}

impl Regex {
    pub fn new(pattern: impl Into<String>, options: RegexOptions) -> Self {
        Self {
            pattern: pattern.into(),
            options,
        }
    }
}

impl Display for Regex {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "/{}/{}", self.pattern, self.options.to_letters())
    }
}

bitflags! {
    /// Regular expression option flags.
    ///
    /// Each flag corresponds to a letter in the options cstring that follows
    /// the pattern on the wire. `UNICODE` is accepted when decoding but has
    /// no letter on encode, so a round trip through BSON drops that bit.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RegexOptions: u32 {
        /// `i`
        const IGNORE_CASE = 2;
        /// `l`
        const LOCALE = 4;
        /// `m`
        const MULTILINE = 8;
        /// `s`
        const DOT_ALL = 16;
        /// `u`; decode-only
        const UNICODE = 32;
        /// `x`
        const VERBOSE = 64;
    }
}

impl RegexOptions {
    /// Renders the option letters as they appear on the wire, in alphabetical
    /// order. `UNICODE` has no letter and is never emitted.
    pub fn to_letters(self) -> String {
        let mut letters = String::new();
        if self.contains(RegexOptions::IGNORE_CASE) {
            letters.push('i');
        }
        if self.contains(RegexOptions::LOCALE) {
            letters.push('l');
        }
        if self.contains(RegexOptions::MULTILINE) {
            letters.push('m');
        }
        if self.contains(RegexOptions::DOT_ALL) {
            letters.push('s');
        }
        if self.contains(RegexOptions::VERBOSE) {
            letters.push('x');
        }
        letters
    }

    /// Folds option letters into a mask. Unknown letters are ignored.
    pub fn from_letters(letters: &str) -> Self {
        let mut options = RegexOptions::empty();
        for letter in letters.chars() {
            match letter {
                'i' => options |= RegexOptions::IGNORE_CASE,
                'l' => options |= RegexOptions::LOCALE,
                'm' => options |= RegexOptions::MULTILINE,
                's' => options |= RegexOptions::DOT_ALL,
                'u' => options |= RegexOptions::UNICODE,
                'x' => options |= RegexOptions::VERBOSE,
                _ => {}
            }
        }
        options
    }
}

/// A BSON timestamp, an internal MongoDB type used in replication; not a
/// wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timestamp {
    /// Seconds since the Unix epoch.
    pub time: u32,

    /// An incrementing ordinal for operations within a given second.
    pub increment: u32,
}

impl Display for Timestamp {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "Timestamp({}, {})", self.time, self.increment)
    }
}

/// JavaScript code paired with the scope document its free variables resolve
/// against.
#[derive(Debug, Clone, PartialEq)]
pub struct JavaScriptCodeWithScope {
    pub code: String,
    pub scope: Document,
}

/// A reference to a document in another collection, serialized as a
/// sub-document with `$ref`, `$id`, and optional `$db` fields.
#[derive(Debug, Clone, PartialEq)]
pub struct DbRef {
    /// The collection the referenced document lives in.
    pub collection: String,

    /// The value of the referenced document's `_id`.
    pub id: Box<Bson>,

    /// The database, when the reference crosses databases.
    pub database: Option<String>,

    /// Any additional fields carried alongside the reference.
    pub extra: Document,
}

impl DbRef {
    pub fn new(
        collection: impl Into<String>,
        id: impl Into<Bson>,
        database: Option<String>,
    ) -> Self {
        Self {
            collection: collection.into(),
            id: Box::new(id.into()),
            database,
            extra: Document::new(),
        }
    }

    /// The sub-document this reference serializes as: `$ref`, `$id`,
    /// optional `$db`, then any extra fields in their own order.
    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert("$ref", Bson::String(self.collection.clone()));
        doc.insert("$id", (*self.id).clone());
        if let Some(ref database) = self.database {
            doc.insert("$db", Bson::String(database.clone()));
        }
        for (key, value) in &self.extra {
            doc.insert(key.clone(), value.clone());
        }
        doc
    }
}

impl Display for DbRef {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "DBRef(\"{}\", {}", self.collection, self.id)?;
        if let Some(ref database) = self.database {
            write!(fmt, ", \"{}\"", database)?;
        }
        fmt.write_str(")")
    }
}
