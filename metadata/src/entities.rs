//! Catalog record types. `UniqueID` and `Timestamp` mirror the original
//! `int64`/`uint64` identifiers: ids are assigned externally and are
//! globally unique per entity kind, timestamps are opaque and monotonic.

pub type UniqueId = i64;
pub type Timestamp = u64;
pub type CollectionId = UniqueId;
pub type SegmentId = UniqueId;

/// A single field in a collection's schema.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldSchema {
    pub field_id: UniqueId,
    pub name: String,
    pub data_type: DataType,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataType {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    Float,
    Double,
    String,
    VectorFloat,
    VectorBinary,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Bool => "bool",
            DataType::Int8 => "int8",
            DataType::Int16 => "int16",
            DataType::Int32 => "int32",
            DataType::Int64 => "int64",
            DataType::Float => "float",
            DataType::Double => "double",
            DataType::String => "string",
            DataType::VectorFloat => "vector_float",
            DataType::VectorBinary => "vector_binary",
        }
    }

    pub fn parse(s: &str) -> Option<DataType> {
        Some(match s {
            "bool" => DataType::Bool,
            "int8" => DataType::Int8,
            "int16" => DataType::Int16,
            "int32" => DataType::Int32,
            "int64" => DataType::Int64,
            "float" => DataType::Float,
            "double" => DataType::Double,
            "string" => DataType::String,
            "vector_float" => DataType::VectorFloat,
            "vector_binary" => DataType::VectorBinary,
            _ => return None,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Schema {
    pub name: String,
    pub fields: Vec<FieldSchema>,
}

/// A named, schema-bearing container; the unit of catalog identity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Collection {
    pub id: UniqueId,
    pub schema: Schema,
    pub create_time: Timestamp,
    pub segment_ids: Vec<UniqueId>,
    pub partition_tags: Vec<String>,
}

/// A unit of stored data belonging to exactly one `(collection, partition)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    pub segment_id: UniqueId,
    pub collection_id: UniqueId,
    pub partition_tag: String,
    pub num_rows: i64,
    pub open_time: Timestamp,
    pub close_time: Timestamp,
    pub binlog_file_paths: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tenant {
    pub id: UniqueId,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Proxy {
    pub id: UniqueId,
    pub address: String,
}
