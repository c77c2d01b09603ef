//! Mapping of transport errors into the uplift error taxonomy.

use uplift_core::Error;

/// Converts a reqwest transport error into a classified [`Error`].
pub(crate) fn from_reqwest(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::timeout().with_message(err.to_string()).with_source(err)
    } else if err.is_connect() {
        Error::network_error()
            .with_message("Connection failed")
            .with_source(err)
    } else {
        Error::network_error()
            .with_message(err.to_string())
            .with_source(err)
    }
}
