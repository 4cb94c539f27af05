use crate::models::{Product, Role};

use super::role::infer_role;

const COLORS: &[&str] = &[
    "black", "white", "grey", "gray", "cream", "beige", "tan", "brown", "red", "maroon",
    "burgundy", "blue", "navy", "green", "olive", "yellow", "gold", "silver", "pink", "purple",
    "orange",
];

const SEASONS: &[&str] = &["winter", "summer", "spring", "autumn", "fall", "monsoon"];

const OCCASIONS: &[&str] = &[
    "casual",
    "formal",
    "party",
    "wedding",
    "office",
    "work",
    "gym",
    "sports",
    "streetwear",
];

const STYLES: &[&str] = &[
    "streetwear",
    "minimal",
    "classic",
    "athleisure",
    "oversized",
    "vintage",
    "preppy",
];

/// One catalog row as it appears in the source sheet
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawProduct {
    pub sku_id: String,
    pub title: String,
    pub brand_name: String,
    pub category: String,
    pub sub_category: String,
    pub product_type: String,
    pub gender: String,
    pub lowest_price: String,
    pub tags: String,
    pub featured_image: String,
}

/// Lowercases, replaces anything outside `[a-z0-9-]` with spaces and splits on whitespace
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect::<String>()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Parses a tags cell such as `['Crew Length', 'socks']`
pub fn parse_tags_cell(cell: &str) -> Vec<String> {
    let cleaned: String = cell
        .chars()
        .map(|c| if matches!(c, '[' | ']' | '\'' | '"') { ' ' } else { c })
        .collect();
    tokenize(&cleaned)
}

fn pick(tokens: &[String], vocabulary: &[&str]) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for token in tokens {
        if vocabulary.contains(&token.as_str()) && !found.contains(token) {
            found.push(token.clone());
        }
    }
    found
}

/// Normalizes a raw row into a catalog product, inferring its role
pub fn normalize_product(raw: RawProduct) -> Product {
    let tags = parse_tags_cell(&raw.tags);
    let text = format!(
        "{} {} {} {} {} {}",
        raw.title,
        raw.brand_name,
        raw.category,
        raw.sub_category,
        raw.product_type,
        tags.join(" ")
    );
    let tokens = tokenize(&text);

    let price = raw
        .lowest_price
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite() && *p >= 0.0)
        .unwrap_or(0.0);

    let image = Some(raw.featured_image.trim().to_string()).filter(|s| !s.is_empty());

    let mut product = Product {
        sku: raw.sku_id.trim().to_string(),
        title: raw.title.trim().to_string(),
        brand: raw.brand_name.trim().to_string(),
        category: raw.category.trim().to_string(),
        sub_category: raw.sub_category.trim().to_string(),
        product_type: raw.product_type.trim().to_string(),
        gender: raw.gender.trim().to_lowercase(),
        price,
        role: Role::Other,
        colors: pick(&tokens, COLORS),
        seasons: pick(&tokens, SEASONS),
        occasions: pick(&tokens, OCCASIONS),
        styles: pick(&tokens, STYLES),
        tags,
        image,
    };
    product.role = infer_role(&product, &tokens);
    product
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_strips_punctuation() {
        assert_eq!(
            tokenize("Oversized T-Shirt (Black), 100% Cotton!"),
            vec!["oversized", "t-shirt", "black", "100", "cotton"]
        );
    }

    #[test]
    fn test_parse_tags_cell() {
        assert_eq!(
            parse_tags_cell("['Crew Length', 'socks']"),
            vec!["crew", "length", "socks"]
        );
        assert!(parse_tags_cell("").is_empty());
    }

    #[test]
    fn test_normalize_product_extracts_attributes() {
        let raw = RawProduct {
            sku_id: " SKU-1 ".to_string(),
            title: "Black Oversized Tee".to_string(),
            brand_name: "Acme".to_string(),
            category: "Apparel".to_string(),
            gender: "Men".to_string(),
            lowest_price: "1299".to_string(),
            tags: "['streetwear', 'summer', 'black']".to_string(),
            ..Default::default()
        };

        let product = normalize_product(raw);
        assert_eq!(product.sku, "SKU-1");
        assert_eq!(product.gender, "men");
        assert_eq!(product.price, 1299.0);
        assert_eq!(product.role, Role::Top);
        assert_eq!(product.colors, vec!["black"]);
        assert_eq!(product.seasons, vec!["summer"]);
        assert_eq!(product.occasions, vec!["streetwear"]);
        assert_eq!(product.styles, vec!["oversized", "streetwear"]);
        assert_eq!(product.image, None);
    }

    #[test]
    fn test_unparseable_price_defaults_to_zero() {
        let raw = RawProduct {
            sku_id: "X".to_string(),
            lowest_price: "n/a".to_string(),
            ..Default::default()
        };
        assert_eq!(normalize_product(raw).price, 0.0);
    }
}
