use crate::errors::{CustomResult, Error};

pub const MAX_NAME_LENGTH: usize = 100;

pub struct Helpers {}

impl Helpers {
    /// # clean a catalog name
    /// trims the name and checks it is not empty and fits the column
    ///
    /// ## Arguments
    /// * `field` - The name of the field, used in the error
    /// * `raw` - The name as submitted
    ///
    /// ## Returns
    /// * `String` - The trimmed name
    pub fn clean_name(field: &str, raw: &str) -> CustomResult<String> {
        let name = raw.trim();

        if name.is_empty() {
            return Err(Error::invalid_input(field, "must not be empty"));
        }

        if name.chars().count() > MAX_NAME_LENGTH {
            return Err(Error::InvalidInputError {
                field: field.to_string(),
                reason: format!("must be at most {MAX_NAME_LENGTH} characters"),
            });
        }

        Ok(name.to_string())
    }
}
