/// unwraps a diesel query result inside a route returning `CustomResult`.
/// a missing row becomes a 404 naming `$type_str`, anything else is logged
/// under `$target` and becomes a 500.
macro_rules! db_handle_get_error_http {
    ( $data:expr, $target:expr, $type_str:expr) => {
        match $data {
            Ok(e) => e,
            Err(diesel::result::Error::NotFound) => {
                return Err($crate::errors::Error::NotFoundError {
                    what: $type_str.to_string(),
                });
            }
            Err(error) => {
                log::error!(target: $target, "Error getting {}. (error: {})", $type_str, error);
                return Err($crate::errors::Error::DatabaseError { source: error });
            }
        }
    };
}

/// same as `db_handle_get_error_http` for code that returns `QueryResult`
macro_rules! db_handle_get_error {
    ( $data:expr, $target:expr, $type_str:expr) => {
        match $data {
            Ok(e) => e,
            Err(diesel::result::Error::NotFound) => {
                return Err(diesel::result::Error::NotFound);
            }
            Err(error) => {
                log::error!(target: $target, "Error getting {}. (error: {})", $type_str, error);
                return Err(error);
            }
        }
    };
}

pub(crate) use db_handle_get_error;
pub(crate) use db_handle_get_error_http;
