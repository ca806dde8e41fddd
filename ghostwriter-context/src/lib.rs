pub mod loader;
pub mod model;

pub use loader::{ContextLoadError, LoadReport, load_context, load_documents};
pub use model::{ContextDocument, assemble_context};
