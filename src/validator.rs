//! Document shape checks run before decoding.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{DecodeError, ErrorObject, ShapeError};
use crate::types::{json_type_name, DATA, ERRORS, ID, TYPE};

/// Reject documents that carry an `errors` member.
///
/// # Errors
///
/// Returns `DecodeError::ErrorDocument` with every parsed error object, or
/// `ShapeError::InvalidErrors` if the member is not an array of objects.
pub fn ensure_not_error_document(document: &Value) -> Result<(), DecodeError> {
    match document.get(ERRORS) {
        None | Some(Value::Null) => Ok(()),
        Some(errors) => Err(DecodeError::ErrorDocument {
            errors: parse_errors(errors)?,
        }),
    }
}

/// Translate an `errors` array into error objects.
///
/// Unknown members are ignored; every member of an error object is optional.
pub fn parse_errors(errors: &Value) -> Result<Vec<ErrorObject>, ShapeError> {
    if !errors.is_array() {
        return Err(ShapeError::InvalidErrors);
    }
    Vec::<ErrorObject>::deserialize(errors).map_err(|_| ShapeError::InvalidErrors)
}

/// Require a `data` member holding a single resource object.
///
/// # Errors
///
/// Returns `ShapeError` if `data` is missing, scalar, or an array.
pub fn ensure_object_shape(document: &Value) -> Result<&Value, ShapeError> {
    let data = ensure_data_node(document)?;
    if data.is_array() {
        return Err(ShapeError::ExpectedObject);
    }
    Ok(data)
}

/// Require a `data` member holding an array of resource objects.
///
/// # Errors
///
/// Returns `ShapeError` if `data` is missing, scalar, or an object.
pub fn ensure_collection_shape(document: &Value) -> Result<&Value, ShapeError> {
    let data = ensure_data_node(document)?;
    if !data.is_array() {
        return Err(ShapeError::ExpectedArray);
    }
    Ok(data)
}

/// True if a linkage has scalar, non-null `type` and `id` members.
pub fn is_relationship_linkage_well_formed(linkage: &Value) -> bool {
    let is_scalar = |v: &Value| !(v.is_null() || v.is_array() || v.is_object());
    matches!(
        (linkage.get(TYPE), linkage.get(ID)),
        (Some(t), Some(id)) if is_scalar(t) && is_scalar(id)
    )
}

fn ensure_data_node(document: &Value) -> Result<&Value, ShapeError> {
    if !document.is_object() {
        return Err(ShapeError::NotAnObject {
            actual: json_type_name(document).to_string(),
        });
    }

    let data = document.get(DATA).ok_or(ShapeError::MissingData)?;
    if !(data.is_object() || data.is_array()) {
        return Err(ShapeError::ScalarData {
            actual: json_type_name(data).to_string(),
        });
    }
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn object_shape_accepts_single_resource() {
        let doc = json!({ "data": { "type": "users", "id": "1" } });
        assert!(ensure_object_shape(&doc).is_ok());
        assert_eq!(
            ensure_collection_shape(&doc).unwrap_err(),
            ShapeError::ExpectedArray
        );
    }

    #[test]
    fn collection_shape_accepts_array() {
        let doc = json!({ "data": [] });
        assert!(ensure_collection_shape(&doc).is_ok());
        assert_eq!(
            ensure_object_shape(&doc).unwrap_err(),
            ShapeError::ExpectedObject
        );
    }

    #[test]
    fn missing_data_rejected() {
        let doc = json!({ "included": [] });
        assert_eq!(
            ensure_object_shape(&doc).unwrap_err(),
            ShapeError::MissingData
        );
    }

    #[test]
    fn scalar_and_null_data_rejected() {
        for data in [json!("users"), json!(1), json!(null)] {
            let doc = json!({ "data": data });
            assert!(matches!(
                ensure_object_shape(&doc),
                Err(ShapeError::ScalarData { .. })
            ));
        }
    }

    #[test]
    fn non_object_document_rejected() {
        let err = ensure_object_shape(&json!([1, 2])).unwrap_err();
        assert_eq!(
            err,
            ShapeError::NotAnObject {
                actual: "array".into()
            }
        );
    }

    #[test]
    fn error_document_carries_parsed_errors() {
        let doc = json!({
            "errors": [
                { "status": "403", "title": "Forbidden" },
                { "status": "422", "detail": "name is blank", "source": { "pointer": "/data/attributes/name" } }
            ]
        });
        match ensure_not_error_document(&doc) {
            Err(DecodeError::ErrorDocument { errors }) => {
                assert_eq!(errors.len(), 2);
                assert_eq!(errors[0].title.as_deref(), Some("Forbidden"));
                assert_eq!(errors[1].detail.as_deref(), Some("name is blank"));
            }
            other => panic!("expected error document, got {:?}", other),
        }
    }

    #[test]
    fn null_errors_member_is_ignored() {
        let doc = json!({ "data": { "type": "users" }, "errors": null });
        assert!(ensure_not_error_document(&doc).is_ok());
    }

    #[test]
    fn malformed_errors_member_is_shape_error() {
        let doc = json!({ "errors": "boom" });
        assert!(matches!(
            ensure_not_error_document(&doc),
            Err(DecodeError::Shape(ShapeError::InvalidErrors))
        ));

        let doc = json!({ "errors": [1, 2] });
        assert!(matches!(
            ensure_not_error_document(&doc),
            Err(DecodeError::Shape(ShapeError::InvalidErrors))
        ));
    }

    #[test]
    fn linkage_well_formedness() {
        assert!(is_relationship_linkage_well_formed(
            &json!({ "type": "roles", "id": "1" })
        ));
        assert!(is_relationship_linkage_well_formed(
            &json!({ "type": "roles", "id": 1 })
        ));
        assert!(!is_relationship_linkage_well_formed(&json!({ "type": "roles" })));
        assert!(!is_relationship_linkage_well_formed(
            &json!({ "type": "roles", "id": null })
        ));
        assert!(!is_relationship_linkage_well_formed(
            &json!({ "type": ["roles"], "id": "1" })
        ));
        assert!(!is_relationship_linkage_well_formed(
            &json!({ "type": "roles", "id": { "value": 1 } })
        ));
        assert!(!is_relationship_linkage_well_formed(&json!(null)));
    }
}
