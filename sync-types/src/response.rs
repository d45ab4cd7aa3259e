//! NetworkResponse - the JSON wrapper around every remote payload.

use serde::{Deserialize, Serialize};

use crate::TypesError;

/// Wrapper for data provided by the remote service.
///
/// Every endpoint answers `{"data": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkResponse<T> {
    /// The payload
    pub data: T,
}

impl<T> NetworkResponse<T> {
    /// Wrap a payload.
    pub fn new(data: T) -> Self {
        Self { data }
    }

    /// Unwrap the payload.
    pub fn into_data(self) -> T {
        self.data
    }
}

impl<T: for<'de> Deserialize<'de>> NetworkResponse<T> {
    /// Decode a response body.
    pub fn from_json(bytes: &[u8]) -> Result<Self, TypesError> {
        serde_json::from_slice(bytes).map_err(TypesError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ChangeListEntry;

    #[test]
    fn decodes_change_list_body() {
        let body = br#"{"data":[{"id":"a","changeListVersion":1,"isDelete":false}]}"#;
        let response = NetworkResponse::<Vec<ChangeListEntry>>::from_json(body).unwrap();
        assert_eq!(response.into_data(), vec![ChangeListEntry::updated("a", 1)]);
    }

    #[test]
    fn missing_data_field_is_an_error() {
        let result = NetworkResponse::<Vec<ChangeListEntry>>::from_json(b"{\"items\":[]}");
        assert!(matches!(result, Err(TypesError::Decode(_))));
    }
}
