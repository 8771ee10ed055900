use crate::error::{InspectError, Result};
use crate::value::Value;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use tokio_postgres::types::{FromSql, Kind, Type};
use tokio_postgres::Row;

type BoxError = Box<dyn std::error::Error + Sync + Send>;

/// Wire payload of one value, decoded later according to its column type.
#[derive(Debug)]
struct Raw<'a>(&'a [u8]);

impl<'a> FromSql<'a> for Raw<'a> {
    fn from_sql(_: &Type, raw: &'a [u8]) -> std::result::Result<Self, BoxError> {
        Ok(Self(raw))
    }

    fn accepts(_: &Type) -> bool {
        true
    }
}

#[derive(Debug)]
struct NumericText(String);

impl NumericText {
    const NEGATIVE: u16 = 0x4000;
    const NAN: u16 = 0xC000;
    const POS_INFINITY: u16 = 0xD000;
    const NEG_INFINITY: u16 = 0xF000;

    fn parse(raw: &[u8]) -> std::result::Result<String, BoxError> {
        if raw.len() < 8 {
            return Err("invalid NUMERIC payload: too short".into());
        }

        let ndigits = u16::from_be_bytes([raw[0], raw[1]]) as usize;
        let weight = i16::from_be_bytes([raw[2], raw[3]]) as i32;
        let sign = u16::from_be_bytes([raw[4], raw[5]]);
        let dscale = u16::from_be_bytes([raw[6], raw[7]]) as usize;

        match sign {
            Self::NAN => return Ok("NaN".to_string()),
            Self::POS_INFINITY => return Ok("Infinity".to_string()),
            Self::NEG_INFINITY => return Ok("-Infinity".to_string()),
            _ => {}
        }
        if raw.len() < 8 + ndigits * 2 {
            return Err("invalid NUMERIC payload: truncated digits".into());
        }

        let groups: Vec<u16> = raw[8..8 + ndigits * 2]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();

        // Base-10000 digit groups; group i has weight `weight - i`.
        let group_at = |w: i32| -> u16 {
            let index = weight - w;
            if index < 0 {
                0
            } else {
                groups.get(index as usize).copied().unwrap_or(0)
            }
        };

        let mut integer = String::new();
        for w in (0..=weight.max(0)).rev() {
            let group = group_at(w);
            if integer.is_empty() {
                if group != 0 || w == 0 {
                    integer.push_str(&group.to_string());
                }
            } else {
                integer.push_str(&format!("{:04}", group));
            }
        }
        if weight < 0 || integer.is_empty() {
            integer = "0".to_string();
        }

        let mut fraction = String::new();
        let mut w = -1;
        while fraction.len() < dscale {
            fraction.push_str(&format!("{:04}", group_at(w)));
            w -= 1;
        }
        fraction.truncate(dscale);

        let mut out = String::new();
        if sign == Self::NEGATIVE {
            out.push('-');
        }
        out.push_str(&integer);
        if !fraction.is_empty() {
            out.push('.');
            out.push_str(&fraction);
        }
        Ok(out)
    }
}

impl<'a> FromSql<'a> for NumericText {
    fn from_sql(_: &Type, raw: &'a [u8]) -> std::result::Result<Self, BoxError> {
        Ok(Self(Self::parse(raw)?))
    }

    fn accepts(ty: &Type) -> bool {
        *ty == Type::NUMERIC
    }
}

/// Microseconds, days and months, in wire order.
fn interval(raw: &[u8]) -> std::result::Result<Value, BoxError> {
    let raw: &[u8; 16] = raw
        .try_into()
        .map_err(|_| format!("invalid INTERVAL payload: {} bytes", raw.len()))?;
    let (micros, rest) = raw.split_at(8);
    let (days, months) = rest.split_at(4);

    Ok(Value::Interval {
        months: i32::from_be_bytes(months.try_into()?),
        days: i32::from_be_bytes(days.try_into()?),
        microseconds: i64::from_be_bytes(micros.try_into()?),
    })
}

fn decode_value(ty: &Type, raw: &[u8]) -> std::result::Result<Value, BoxError> {
    match ty.kind() {
        Kind::Enum(_) => return Ok(Value::String(String::from_utf8(raw.to_vec())?)),
        Kind::Domain(base) => return decode_value(base, raw),
        Kind::Array(member) => {
            let items = Vec::<Option<Raw>>::from_sql(ty, raw)?;
            return items
                .into_iter()
                .map(|item| match item {
                    Some(Raw(raw)) => decode_value(member, raw),
                    None => Ok(Value::Null),
                })
                .collect::<std::result::Result<Vec<_>, BoxError>>()
                .map(Value::Array);
        }
        _ => {}
    }

    let value = match ty.name() {
        "bool" => Value::Bool(bool::from_sql(ty, raw)?),
        "int2" => Value::Int16(i16::from_sql(ty, raw)?),
        "int4" => Value::Int32(i32::from_sql(ty, raw)?),
        "int8" => Value::Int64(i64::from_sql(ty, raw)?),
        "oid" | "regclass" | "regproc" | "regprocedure" | "regoper" | "regoperator" | "regtype"
        | "regnamespace" | "regrole" | "regconfig" | "regdictionary" | "regcollation" => {
            Value::Int64(u32::from_sql(&Type::OID, raw)? as i64)
        }
        "float4" => Value::Float32(f32::from_sql(ty, raw)?),
        "float8" => Value::Float64(f64::from_sql(ty, raw)?),
        "numeric" => Value::Decimal(NumericText::from_sql(ty, raw)?.0),
        "char" => Value::String((i8::from_sql(ty, raw)? as u8 as char).to_string()),
        "text" | "varchar" | "bpchar" | "name" | "unknown" => {
            Value::String(String::from_sql(ty, raw)?)
        }
        "bytea" => Value::Bytes(Vec::<u8>::from_sql(ty, raw)?),
        "uuid" => Value::Uuid(uuid::Uuid::from_sql(ty, raw)?),
        "json" | "jsonb" => Value::Json(serde_json::Value::from_sql(ty, raw)?),
        "date" => Value::Date(NaiveDate::from_sql(ty, raw)?),
        "time" => Value::Time(NaiveTime::from_sql(ty, raw)?),
        "timestamp" => Value::DateTime(NaiveDateTime::from_sql(ty, raw)?),
        "timestamptz" => Value::DateTimeUtc(DateTime::<Utc>::from_sql(ty, raw)?),
        "interval" => interval(raw)?,
        // Binary encoding of a type without a decoder; shown as hex.
        _ => Value::Bytes(raw.to_vec()),
    };
    Ok(value)
}

fn decode_column(row: &Row, idx: usize) -> std::result::Result<Value, BoxError> {
    let ty = row.columns()[idx].type_();
    match row.try_get::<_, Option<Raw>>(idx)? {
        Some(Raw(raw)) => decode_value(ty, raw),
        None => Ok(Value::Null),
    }
}

pub fn decode_row(query: &str, row: &Row) -> Result<Vec<Value>> {
    (0..row.len())
        .map(|idx| {
            decode_column(row, idx).map_err(|e| InspectError::Decode {
                query: query.to_string(),
                column: row.columns()[idx].name().to_string(),
                message: e.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numeric(ndigits: u16, weight: i16, sign: u16, dscale: u16, groups: &[u16]) -> Vec<u8> {
        let mut raw = Vec::new();
        raw.extend_from_slice(&ndigits.to_be_bytes());
        raw.extend_from_slice(&weight.to_be_bytes());
        raw.extend_from_slice(&sign.to_be_bytes());
        raw.extend_from_slice(&dscale.to_be_bytes());
        for g in groups {
            raw.extend_from_slice(&g.to_be_bytes());
        }
        raw
    }

    #[test]
    fn test_numeric_integer_and_fraction() {
        // 12345.678
        let raw = numeric(3, 1, 0, 3, &[1, 2345, 6780]);
        assert_eq!(NumericText::parse(&raw).unwrap(), "12345.678");
    }

    #[test]
    fn test_numeric_keeps_scale() {
        // 12.500
        let raw = numeric(2, 0, 0, 3, &[12, 5000]);
        assert_eq!(NumericText::parse(&raw).unwrap(), "12.500");
    }

    #[test]
    fn test_numeric_trailing_zero_groups() {
        // 1000000 stored as one group with weight 1
        let raw = numeric(1, 1, 0, 0, &[100]);
        assert_eq!(NumericText::parse(&raw).unwrap(), "1000000");
    }

    #[test]
    fn test_numeric_small_negative() {
        // -0.0042
        let raw = numeric(1, -1, NumericText::NEGATIVE, 4, &[42]);
        assert_eq!(NumericText::parse(&raw).unwrap(), "-0.0042");
    }

    #[test]
    fn test_numeric_zero_and_nan() {
        assert_eq!(NumericText::parse(&numeric(0, 0, 0, 0, &[])).unwrap(), "0");
        assert_eq!(NumericText::parse(&numeric(0, 0, 0, 2, &[])).unwrap(), "0.00");
        assert_eq!(
            NumericText::parse(&numeric(0, 0, NumericText::NAN, 0, &[])).unwrap(),
            "NaN"
        );
    }

    #[test]
    fn test_numeric_rejects_truncated_payload() {
        assert!(NumericText::parse(&[0, 1, 0]).is_err());
        assert!(NumericText::parse(&numeric(2, 0, 0, 0, &[1])).is_err());
    }

    #[test]
    fn test_numeric_infinities() {
        let pos = numeric(0, 0, NumericText::POS_INFINITY, 0, &[]);
        let neg = numeric(0, 0, NumericText::NEG_INFINITY, 0, &[]);
        assert_eq!(NumericText::parse(&pos).unwrap(), "Infinity");
        assert_eq!(NumericText::parse(&neg).unwrap(), "-Infinity");
    }

    fn interval_payload(micros: i64, days: i32, months: i32) -> Vec<u8> {
        let mut raw = Vec::new();
        raw.extend_from_slice(&micros.to_be_bytes());
        raw.extend_from_slice(&days.to_be_bytes());
        raw.extend_from_slice(&months.to_be_bytes());
        raw
    }

    #[test]
    fn test_oid_aliases_decode_as_integers() {
        let raw = 16384u32.to_be_bytes();
        assert_eq!(decode_value(&Type::REGCLASS, &raw).unwrap(), Value::Int64(16384));
        assert_eq!(decode_value(&Type::OID, &raw).unwrap(), Value::Int64(16384));
        assert_eq!(
            decode_value(&Type::REGPROC, &u32::MAX.to_be_bytes()).unwrap(),
            Value::Int64(u32::MAX as i64)
        );
    }

    #[test]
    fn test_interval_payload() {
        let value = decode_value(&Type::INTERVAL, &interval_payload(0, 1, 0)).unwrap();
        assert_eq!(
            value,
            Value::Interval {
                months: 0,
                days: 1,
                microseconds: 0
            }
        );
        assert_eq!(value.display_string().as_deref(), Some("1 day"));
        assert!(decode_value(&Type::INTERVAL, &[0; 12]).is_err());
    }

    #[test]
    fn test_domain_decodes_as_base_type() {
        let positive_int = Type::new(
            "positive_int".to_string(),
            90001,
            Kind::Domain(Type::INT4),
            "public".to_string(),
        );
        assert_eq!(
            decode_value(&positive_int, &42i32.to_be_bytes()).unwrap(),
            Value::Int32(42)
        );
    }

    #[test]
    fn test_enum_decodes_as_label() {
        let role = Type::new(
            "chat_role".to_string(),
            90002,
            Kind::Enum(vec!["user".to_string(), "assistant".to_string()]),
            "public".to_string(),
        );
        assert_eq!(
            decode_value(&role, b"assistant").unwrap(),
            Value::String("assistant".to_string())
        );
    }

    #[test]
    fn test_unknown_type_is_hex() {
        let raw = [2u8, 32, 0, 4, 10, 0, 0, 1];
        assert_eq!(decode_value(&Type::INET, &raw).unwrap(), Value::Bytes(raw.to_vec()));
    }

    #[test]
    fn test_text_array_with_null() {
        // One dimension, has nulls, element type text, 2 elements, lower bound 1.
        let mut raw = Vec::new();
        for word in [1i32, 1, Type::TEXT.oid() as i32, 2, 1] {
            raw.extend_from_slice(&word.to_be_bytes());
        }
        raw.extend_from_slice(&4i32.to_be_bytes());
        raw.extend_from_slice(b"anon");
        raw.extend_from_slice(&(-1i32).to_be_bytes());

        assert_eq!(
            decode_value(&Type::TEXT_ARRAY, &raw).unwrap(),
            Value::Array(vec![Value::String("anon".to_string()), Value::Null])
        );
    }
}
