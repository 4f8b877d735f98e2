//! Generates EventCatalog services, teams and domains from Atlassian Compass components.
//!
//! Components come either from `compass.yml` files or from the Compass GraphQL API. They are
//! normalized into [`component::ComponentConfig`], resolved against each other and rendered into
//! catalog entities written through an [`eventcatalog::Catalog`].

pub mod component;
pub mod dependencies;
pub mod domain;
pub mod errors;
pub mod generator;
pub mod markdown;
pub mod normalize;
pub mod owners;
pub mod sanitize;
pub mod service;
pub mod settings;
pub mod team;

pub use crate::errors::{GeneratorError, GeneratorResult};
pub use crate::generator::{GenerationFailure, GenerationSummary, Generator, ServiceIdStrategy};
pub use crate::owners::{AssignmentSummary, OwnerAssignment};
pub use crate::settings::GeneratorSettings;
