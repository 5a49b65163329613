//! Declarative bindings for a social-network REST API.
//!
//! An [`EndpointDescriptor`] describes one remote operation (path template,
//! verb, allowed parameters, payload shape, auth, pagination). [`Api`] turns a
//! descriptor plus [`CallArgs`] into a signed request, sends it through the
//! retrying executor from `perch-http` and hands the body to a [`Parser`].
//!
//! ```no_run
//! # async fn demo() -> perch_api::Result<()> {
//! use futures::StreamExt;
//! use perch_api::{Api, CallArgs, catalog};
//! use perch_config::ClientConfig;
//!
//! let api = Api::new(ClientConfig::default())?;
//! let status = api.call(&catalog::GET_STATUS, CallArgs::new().arg(20)).await?;
//! println!("{status:?}");
//!
//! let ids = api.cursor(&catalog::FRIENDS_IDS, CallArgs::new().param("screen_name", "alice"))?;
//! let ids = ids.items(500);
//! futures::pin_mut!(ids);
//! while let Some(id) = ids.next().await {
//!     println!("{}", id?);
//! }
//! # Ok(()) }
//! ```
pub mod args;
pub mod auth;
pub mod binder;
pub mod cache;
pub mod catalog;
pub mod cursor;
pub mod descriptor;
pub mod error;
pub mod multipart;
pub mod parser;
pub mod template;
pub mod validate;

pub use args::{CallArgs, list_to_csv};
pub use auth::{Authenticator, BearerAuth};
pub use binder::{Api, Binding};
pub use cache::{MemoryCache, ResponseCache};
pub use cursor::Cursor;
pub use descriptor::{EndpointDescriptor, HttpMethod, Pagination, PayloadKind};
pub use error::{Error, Result};
pub use multipart::{Multipart, pack_image};
pub use parser::{JsonParser, Page, Paginated, ParseError, Parser, Payload};
