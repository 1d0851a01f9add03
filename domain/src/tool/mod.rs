//! Tool domain module
//!
//! Everything the orchestrator knows about tools without touching the
//! backend: the session [`ToolCatalog`], per-provider schema dialects,
//! argument validation and result sanitizing.
//!
//! ```text
//! ┌────────────────┐  translate   ┌──────────────────┐
//! │ ToolCatalog    │─────────────▶│ dialect schemas  │──▶ provider
//! │ (descriptors)  │              └──────────────────┘
//! └───────┬────────┘
//!         │ validate
//!         ▼
//! ┌────────────────┐   invoke     ┌──────────────────┐  sanitize
//! │ ToolInvocation │─────────────▶│ RawToolOutput    │──────────▶ TextBlock[]
//! └────────────────┘              └──────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`ToolDescriptor`] / [`ToolCatalog`]: name, description, parameter schema
//! - [`Dialect`] and [`translate`]: provider tool declarations
//! - [`ToolValidator`]: pre-invocation argument checks
//! - [`sanitize`]: bounded text from arbitrary tool output
//! - [`ToolInvocation`]: an open or closed tool call

pub mod dialect;
pub mod entities;
pub mod sanitizer;
pub mod traits;
pub mod value_objects;

pub use dialect::{Dialect, translate};
pub use entities::{ToolCatalog, ToolDescriptor};
pub use sanitizer::{ClientProfile, SizeLimits, TRUNCATION_MARKER, TextBlock, sanitize};
pub use traits::{DefaultToolValidator, ToolValidator};
pub use value_objects::{InvocationResult, RawToolOutput, ToolInvocation};
