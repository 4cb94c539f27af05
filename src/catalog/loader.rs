use std::{io::Read, path::Path};

use crate::{
    error::{AppError, AppResult},
    models::Role,
};

use super::{
    extract::{normalize_product, RawProduct},
    Catalog,
};

/// Loads the product catalog from a CSV export of the product sheet
pub fn load_catalog(path: impl AsRef<Path>) -> AppResult<Catalog> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|e| {
        AppError::Config(format!("Failed to open catalog {}: {}", path.display(), e))
    })?;

    let catalog = load_catalog_from_reader(file)?;

    tracing::info!(
        path = %path.display(),
        products = catalog.len(),
        top = catalog.role_count(Role::Top),
        bottom = catalog.role_count(Role::Bottom),
        footwear = catalog.role_count(Role::Footwear),
        accessory = catalog.role_count(Role::Accessory),
        other = catalog.role_count(Role::Other),
        "Catalog loaded"
    );

    Ok(catalog)
}

/// Reads catalog rows from any CSV source with a header row
pub fn load_catalog_from_reader<R: Read>(reader: R) -> AppResult<Catalog> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut products = Vec::new();
    for row in csv_reader.deserialize::<RawProduct>() {
        products.push(normalize_product(row?));
    }

    Ok(Catalog::from_products(products))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
sku_id,title,brand_name,category,sub_category,product_type,gender,lowest_price,tags,featured_image
T1,Black Graphic Tee,Acme,Apparel,Tops,T-Shirt,men,799,\"['streetwear', 'summer']\",https://img/t1.jpg
B1,Relaxed Cargo Pants,Acme,Apparel,Bottoms,Pants,men,1499,\"['cargo']\",
F1,Court Sneakers,Stride,Footwear,,,,2999,,
";

    #[test]
    fn test_load_from_reader() {
        let catalog = load_catalog_from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(catalog.len(), 3);

        let tee = catalog.get("T1").unwrap();
        assert_eq!(tee.role, Role::Top);
        assert_eq!(tee.image.as_deref(), Some("https://img/t1.jpg"));
        assert_eq!(tee.seasons, vec!["summer"]);

        assert_eq!(catalog.get("B1").unwrap().role, Role::Bottom);
        assert_eq!(catalog.get("F1").unwrap().role, Role::Footwear);
        assert_eq!(catalog.get("F1").unwrap().gender, "");
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = load_catalog("/definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
