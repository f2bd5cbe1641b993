use crate::errors::DbError;
use bson::Document as BsonDocument;

/// Parse a JSON string into a `bson::Document`, keeping key order.
///
/// # Errors
/// Returns `InvalidExpression` if the top-level value is not an object, or
/// `Json` if the input is not valid JSON.
pub fn parse_json_document(json: &str) -> Result<BsonDocument, DbError> {
    let val: serde_json::Value = serde_json::from_str(json)?;
    json_value_to_document(val)
}

/// Convert a `serde_json::Value` that must be an object into a `bson::Document`.
///
/// # Errors
/// Returns `InvalidExpression` for non-object values.
pub fn json_value_to_document(val: serde_json::Value) -> Result<BsonDocument, DbError> {
    let serde_json::Value::Object(obj) = val else {
        return Err(DbError::invalid("expected JSON object"));
    };
    BsonDocument::try_from(obj).map_err(|e| DbError::invalid(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_to_bson_success() {
        let d = parse_json_document("{\"b\":\"x\",\"a\":1}").unwrap();
        assert_eq!(d.get_i32("a").unwrap(), 1);
        assert_eq!(d.get_str("b").unwrap(), "x");
        assert_eq!(d.keys().collect::<Vec<_>>(), vec!["b", "a"]);
    }

    #[test]
    fn json_to_bson_rejects_array() {
        assert!(matches!(parse_json_document("[1,2,3]"), Err(DbError::InvalidExpression(_))));
        assert!(matches!(parse_json_document("{"), Err(DbError::Json(_))));
    }
}
