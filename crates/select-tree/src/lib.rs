//! Select Tree - cascading select chains
//!
//! Turns a set of single-choice controls into a dependent chain: the root is
//! populated from a capability, and every selection repopulates the next
//! control from the selected value while clearing everything further down.
//!
//! - Chain discovery from declarative metadata ([`ChainDiscoverer`])
//! - Generation-guarded population ([`Populator`])
//! - Top-down seeding from initial values ([`Seeder`])
//! - Change cascading ([`CascadeController`])
//! - Manifests in TOML/JSON/YAML ([`ChainManifest`])
//!
//! # Example
//!
//! ```rust,ignore
//! use select_tree::prelude::*;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let manifest = ChainManifest::from_toml_str(select_tree::manifest::DEMO_MANIFEST)?;
//! let (tree, controls) = manifest.instantiate();
//!
//! let handle = tree.attach(manifest.root_id(), TreeOptions::new().with_initial_values(["h"]))?;
//! handle.wait_seeded().await;
//!
//! let books = controls.get(&ControlId::new("books")).unwrap();
//! println!("{} books offered", books.option_count());
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod capability;
pub mod cascade;
pub mod chain;
pub mod config;
pub mod control;
pub mod error;
pub mod manifest;
pub mod metadata;
pub mod populate;
pub mod seed;
pub mod tree;
pub mod types;

// Re-exports for convenience
pub use capability::{
    CallbackCapability, Capability, CapabilityRegistry, Completion, FnCapability,
    StaticCapability,
};
pub use cascade::CascadeController;
pub use chain::{Chain, ChainDiscoverer, ChildEdge, Link};
pub use config::{TreeOptions, DEFAULT_PLACEHOLDER_LABEL};
pub use control::{
    Control, ControlResolver, ControlSet, MemoryControl, SubscriptionId, ValueChangedHandler,
};
pub use error::{ConfigError, ManifestError, SeedError, SelectTreeError};
pub use manifest::{CapabilitySpec, ChainManifest, ControlSpec, Format};
pub use metadata::{ControlMetadata, MetadataSource};
pub use populate::{PopulateOutcome, Population, Populator};
pub use seed::{SeedReport, SeedStep, Seeder};
pub use tree::{SelectTree, TreeHandle};
pub use types::{ControlId, OptionEntry, OptionValue, PopulateRequest};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with select chains
    pub use crate::{
        Capability, CapabilityRegistry, ChainManifest, Control, ControlId, ControlMetadata,
        ControlSet, MemoryControl, OptionEntry, OptionValue, PopulateRequest, SelectTree,
        SelectTreeError, TreeHandle, TreeOptions,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
