//! Request extractors that reject with the standard JSON error body.

pub mod actor;
pub mod hashed_id_path;
pub mod validated_json;
pub mod validated_query;

pub use actor::{Actor, USER_ID_HEADER, TIMEZONE_HEADER};
pub use hashed_id_path::HashedIdPath;
pub use validated_json::ValidatedJson;
pub use validated_query::ValidatedQuery;
