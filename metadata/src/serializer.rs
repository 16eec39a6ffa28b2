//! Deterministic textual codec for catalog records.
//!
//! Every record is a sequence of `key: value` lines, written and read in a
//! fixed field order; repeated fields (segment ids, partition tags, schema
//! fields) are repeated `key: value` lines. This is the same shape as the
//! `proto.MarshalTextString`/`proto.UnmarshalText` encoding the original
//! catalog used, reimplemented without a protobuf toolchain so the crate
//! has no code-generation step.
//!
//! `decode(encode(x)) == x` holds for every value constructible through
//! this module's own types; malformed input (an unparsable line, a missing
//! required field, an out-of-range integer) is rejected with
//! [`MetaError::MalformedRecord`].

use crate::entities::{Collection, DataType, FieldSchema, Proxy, Schema, Segment, Tenant};
use crate::error::MetaError;

fn malformed(reason: impl Into<String>) -> MetaError {
    MetaError::MalformedRecord(reason.into())
}

fn lines(text: &str) -> impl Iterator<Item = (&str, &str)> {
    text.lines().filter(|l| !l.is_empty()).filter_map(|line| line.split_once(": "))
}

fn parse_i64(key: &str, v: &str) -> Result<i64, MetaError> {
    v.parse().map_err(|_| malformed(format!("{key} is not an integer: {v}")))
}

fn parse_u64(key: &str, v: &str) -> Result<u64, MetaError> {
    v.parse().map_err(|_| malformed(format!("{key} is not an integer: {v}")))
}

pub fn encode_collection(c: &Collection) -> String {
    let mut out = String::new();
    out.push_str(&format!("id: {}\n", c.id));
    out.push_str(&format!("schema.name: {}\n", c.schema.name));
    for f in &c.schema.fields {
        out.push_str(&format!(
            "schema.field: {}|{}|{}\n",
            f.field_id,
            f.name,
            f.data_type.as_str()
        ));
    }
    out.push_str(&format!("create_time: {}\n", c.create_time));
    for id in &c.segment_ids {
        out.push_str(&format!("segment_id: {id}\n"));
    }
    for tag in &c.partition_tags {
        out.push_str(&format!("partition_tag: {tag}\n"));
    }
    out
}

pub fn decode_collection(text: &str) -> Result<Collection, MetaError> {
    let mut id = None;
    let mut name = None;
    let mut fields = Vec::new();
    let mut create_time = None;
    let mut segment_ids = Vec::new();
    let mut partition_tags = Vec::new();

    for (key, value) in lines(text) {
        match key {
            "id" => id = Some(parse_i64(key, value)?),
            "schema.name" => name = Some(value.to_string()),
            "schema.field" => {
                let mut parts = value.splitn(3, '|');
                let (Some(field_id), Some(fname), Some(dtype)) =
                    (parts.next(), parts.next(), parts.next())
                else {
                    return Err(malformed(format!("unparsable schema.field: {value}")));
                };
                fields.push(FieldSchema {
                    field_id: parse_i64("schema.field.id", field_id)?,
                    name: fname.to_string(),
                    data_type: DataType::parse(dtype)
                        .ok_or_else(|| malformed(format!("unknown data type: {dtype}")))?,
                });
            }
            "create_time" => create_time = Some(parse_u64(key, value)?),
            "segment_id" => segment_ids.push(parse_i64(key, value)?),
            "partition_tag" => partition_tags.push(value.to_string()),
            other => return Err(malformed(format!("unknown field: {other}"))),
        }
    }

    Ok(Collection {
        id: id.ok_or_else(|| malformed("missing id"))?,
        schema: Schema { name: name.ok_or_else(|| malformed("missing schema.name"))?, fields },
        create_time: create_time.unwrap_or(0),
        segment_ids,
        partition_tags,
    })
}

pub fn encode_segment(s: &Segment) -> String {
    let mut out = String::new();
    out.push_str(&format!("segment_id: {}\n", s.segment_id));
    out.push_str(&format!("collection_id: {}\n", s.collection_id));
    out.push_str(&format!("partition_tag: {}\n", s.partition_tag));
    out.push_str(&format!("num_rows: {}\n", s.num_rows));
    out.push_str(&format!("open_time: {}\n", s.open_time));
    out.push_str(&format!("close_time: {}\n", s.close_time));
    for p in &s.binlog_file_paths {
        out.push_str(&format!("binlog_file_path: {p}\n"));
    }
    out
}

pub fn decode_segment(text: &str) -> Result<Segment, MetaError> {
    let mut segment_id = None;
    let mut collection_id = None;
    let mut partition_tag = None;
    let mut num_rows = 0i64;
    let mut open_time = 0u64;
    let mut close_time = 0u64;
    let mut binlog_file_paths = Vec::new();

    for (key, value) in lines(text) {
        match key {
            "segment_id" => segment_id = Some(parse_i64(key, value)?),
            "collection_id" => collection_id = Some(parse_i64(key, value)?),
            "partition_tag" => partition_tag = Some(value.to_string()),
            "num_rows" => num_rows = parse_i64(key, value)?,
            "open_time" => open_time = parse_u64(key, value)?,
            "close_time" => close_time = parse_u64(key, value)?,
            "binlog_file_path" => binlog_file_paths.push(value.to_string()),
            other => return Err(malformed(format!("unknown field: {other}"))),
        }
    }

    Ok(Segment {
        segment_id: segment_id.ok_or_else(|| malformed("missing segment_id"))?,
        collection_id: collection_id.ok_or_else(|| malformed("missing collection_id"))?,
        partition_tag: partition_tag.ok_or_else(|| malformed("missing partition_tag"))?,
        num_rows,
        open_time,
        close_time,
        binlog_file_paths,
    })
}

pub fn encode_tenant(t: &Tenant) -> String {
    format!("id: {}\nname: {}\n", t.id, t.name)
}

pub fn decode_tenant(text: &str) -> Result<Tenant, MetaError> {
    let mut id = None;
    let mut name = None;
    for (key, value) in lines(text) {
        match key {
            "id" => id = Some(parse_i64(key, value)?),
            "name" => name = Some(value.to_string()),
            other => return Err(malformed(format!("unknown field: {other}"))),
        }
    }
    Ok(Tenant {
        id: id.ok_or_else(|| malformed("missing id"))?,
        name: name.ok_or_else(|| malformed("missing name"))?,
    })
}

pub fn encode_proxy(p: &Proxy) -> String {
    format!("id: {}\naddress: {}\n", p.id, p.address)
}

pub fn decode_proxy(text: &str) -> Result<Proxy, MetaError> {
    let mut id = None;
    let mut address = None;
    for (key, value) in lines(text) {
        match key {
            "id" => id = Some(parse_i64(key, value)?),
            "address" => address = Some(value.to_string()),
            other => return Err(malformed(format!("unknown field: {other}"))),
        }
    }
    Ok(Proxy {
        id: id.ok_or_else(|| malformed("missing id"))?,
        address: address.ok_or_else(|| malformed("missing address"))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_round_trips() {
        let c = Collection {
            id: 1,
            schema: Schema {
                name: "c1".to_string(),
                fields: vec![FieldSchema {
                    field_id: 100,
                    name: "embedding".to_string(),
                    data_type: DataType::VectorFloat,
                }],
            },
            create_time: 42,
            segment_ids: vec![5, 6],
            partition_tags: vec!["_default".to_string(), "p1".to_string()],
        };
        assert_eq!(decode_collection(&encode_collection(&c)).unwrap(), c);
    }

    #[test]
    fn segment_round_trips() {
        let s = Segment {
            segment_id: 100,
            collection_id: 1,
            partition_tag: "_default".to_string(),
            num_rows: 10,
            open_time: 1,
            close_time: 0,
            binlog_file_paths: vec!["a.bin".to_string()],
        };
        assert_eq!(decode_segment(&encode_segment(&s)).unwrap(), s);
    }

    #[test]
    fn malformed_collection_is_rejected() {
        assert!(matches!(decode_collection("garbage"), Err(MetaError::MalformedRecord(_))));
        assert!(matches!(decode_collection("id: 1\n"), Err(MetaError::MalformedRecord(_))));
    }

    #[test]
    fn tenant_and_proxy_round_trip() {
        let t = Tenant { id: 1, name: "t1".to_string() };
        assert_eq!(decode_tenant(&encode_tenant(&t)).unwrap(), t);
        let p = Proxy { id: 2, address: "127.0.0.1:19530".to_string() };
        assert_eq!(decode_proxy(&encode_proxy(&p)).unwrap(), p);
    }
}
