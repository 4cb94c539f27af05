use std::collections::HashSet;

use crate::models::{Product, Role};

const TOP: &[&str] = &[
    "tshirt", "t-shirt", "tee", "shirt", "hoodie", "sweatshirt", "jacket", "coat", "sweater",
    "top", "polo",
];
const BOTTOM: &[&str] = &[
    "jeans", "pants", "pant", "trouser", "trousers", "cargo", "cargos", "shorts",
];
const FOOTWEAR: &[&str] = &[
    "sneaker", "sneakers", "shoe", "shoes", "slide", "slides", "boot", "boots",
];
const ACCESSORY: &[&str] = &[
    "bag", "wallet", "cap", "hat", "sunglasses", "watch", "ring", "bracelet", "necklace",
    "keychain", "belt", "socks",
];
const OUTERWEAR: &[&str] = &[
    "vest",
    "jacket",
    "coat",
    "blazer",
    "cardigan",
    "parka",
    "windbreaker",
    "bomber",
];

fn has_any(words: &HashSet<&str>, list: &[&str]) -> bool {
    list.iter().any(|w| words.contains(w))
}

fn contains_any(text: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| text.contains(n))
}

/// Infers the outfit slot of a product from its tokens, falling back to category text.
///
/// Outerwear is checked first so "cargo jacket" lands in `Other` rather than `Bottom`.
pub fn infer_role(product: &Product, tokens: &[String]) -> Role {
    let words: HashSet<&str> = tokens
        .iter()
        .chain(product.tags.iter())
        .map(String::as_str)
        .collect();

    if has_any(&words, OUTERWEAR) {
        return Role::Other;
    }
    if has_any(&words, FOOTWEAR) {
        return Role::Footwear;
    }
    if has_any(&words, BOTTOM) && !has_any(&words, &["vest", "jacket", "coat"]) {
        return Role::Bottom;
    }
    if has_any(&words, TOP) {
        return Role::Top;
    }
    if has_any(&words, ACCESSORY) {
        return Role::Accessory;
    }

    let category = format!(
        "{} {} {}",
        product.category, product.sub_category, product.product_type
    )
    .to_lowercase();
    let title = product.title.to_lowercase();

    if contains_any(&category, &["shoe", "sneaker", "slide", "boot", "footwear"]) {
        return Role::Footwear;
    }

    let outerwear = ["vest", "jacket", "coat", "blazer", "outerwear"];
    if contains_any(&title, &outerwear) || contains_any(&category, &outerwear) {
        return Role::Other;
    }

    if contains_any(&category, &["jean", "pant", "trouser", "cargo", "short"])
        && !contains_any(&title, &["vest", "jacket", "coat"])
    {
        return Role::Bottom;
    }
    if contains_any(
        &category,
        &["tee", "shirt", "hoodie", "sweatshirt", "jacket", "sweater", "polo"],
    ) {
        return Role::Top;
    }
    if contains_any(
        &category,
        &["bag", "wallet", "cap", "watch", "sunglass", "accessor", "sock", "belt"],
    ) {
        return Role::Accessory;
    }
    Role::Other
}
