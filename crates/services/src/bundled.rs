use codeclimb_core::model::{Catalog, CatalogError};

const BUNDLED_CATALOG: &str = include_str!("../data/catalog.json");

/// The course content shipped with the app.
///
/// # Errors
///
/// Returns `CatalogError` if the bundled document is invalid.
pub fn bundled_catalog() -> Result<Catalog, CatalogError> {
    Catalog::from_json(BUNDLED_CATALOG)
}
