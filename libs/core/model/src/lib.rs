//! Base entity behaviour shared by every persisted storefront model.
//!
//! - [`context`]: the acting user, client IP and timezone of a request
//! - [`audit`]: created/updated by + IP stamping
//! - [`lifecycle`]: ordered model event callbacks invoked by repositories
//! - [`hashid`]: reversible numeric id <-> opaque token mapping
//! - [`timezone`]: UTC storage and per-user presentation of timestamps
//! - [`scope`]: `enabled` / `default` predicates and soft delete filters
//! - [`localized`]: locale keyed text fields
//! - [`pagination`]: page requests and response metadata

pub mod audit;
pub mod context;
pub mod hashid;
pub mod lifecycle;
pub mod localized;
pub mod pagination;
pub mod scope;
pub mod timezone;

pub use audit::{AuditFields, Auditable};
pub use context::RequestContext;
pub use hashid::{HashIdCodec, HashIdError};
pub use lifecycle::{AuditStamp, Lifecycle, LifecycleError, LifecycleEvent, LifecycleHook, SaveOp};
pub use localized::{LocalizedText, unsupported_locales};
pub use pagination::{PageMeta, PageRequest, Paginated};
pub use scope::{ScopeExt, Trashed};
pub use timezone::{Localize, Timestamp, localize, now_utc, to_utc};
