pub mod index;
pub mod loader;
pub mod location;
pub mod record;

pub use index::SelectionError;
pub use loader::{CatalogLoader, LoadError};
pub use location::Location;
pub use record::{Catalog, ListEntry, MediaConvention, SoundRecord};
