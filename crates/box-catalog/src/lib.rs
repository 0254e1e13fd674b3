//! Vagrant box catalog management.
//!
//! A catalog is a directory tree on a web server: one directory per box,
//! each holding a `metadata.json` document and the box files it lists.
//! [`BoxCatalog`] reads and updates that tree over ssh and scp, running
//! every command through a [`command_runner::Shell`].
//!
//! # Example
//!
//! ```no_run
//! use box_catalog::{BoxCatalog, CatalogServer};
//! use command_runner::CommandRunner;
//!
//! # async fn example() -> box_catalog::Result<()> {
//! let server = CatalogServer::new("boxes.example.com", "vagrant");
//! let catalog = BoxCatalog::connect(CommandRunner::new(), server, "team/mint17").await;
//! if let Some(latest) = catalog.latest_version_provider("virtualbox") {
//!     println!("{} {}", latest.version, latest.checksum);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod catalog;
pub mod error;
pub mod metadata;
pub mod server;
pub mod version_provider;

pub use catalog::BoxCatalog;
pub use error::{CatalogError, Result};
pub use metadata::{numeric_version, BoxVersion, CatalogMetadata, ProviderEntry};
pub use server::{CatalogServer, DEFAULT_BOXES_DIR, DEFAULT_URL_PATH, METADATA_FILE};
pub use version_provider::{VersionProvider, CHECKSUM_TYPE};
