//! Force-directed view of clergy ordination and consecration lineages.
//!
//! The pure parts (model, filters, layout, lineage, highlight, interaction)
//! never touch the DOM. `component` and `render` adapt them to a canvas.

pub mod api;
mod component;
mod config;
mod error;
mod filters;
mod highlight;
mod interaction;
mod layout;
mod lineage;
mod model;
mod render;
mod state;
mod types;

pub use component::LineageGraphCanvas;
pub use error::GraphError;
pub use filters::FilterCriteria;
pub use types::{Node, NodeId};
