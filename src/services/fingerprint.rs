use sha2::{Digest, Sha256};

/// Stable identity of an outfit: the base SKU, the garment slots and the
/// accessory SKUs in sorted order, hashed with SHA-256.
///
/// Accessory order does not affect the result.
pub fn outfit_fingerprint(
    base_sku: &str,
    top_sku: &str,
    bottom_sku: &str,
    footwear_sku: &str,
    accessory_skus: &[&str],
) -> String {
    let mut accessories = accessory_skus.to_vec();
    accessories.sort_unstable();

    let material = format!(
        "{}|{}|{}|{}|{}",
        base_sku,
        top_sku,
        bottom_sku,
        footwear_sku,
        accessories.join(",")
    );

    let mut hasher = Sha256::new();
    hasher.update(material.as_bytes());
    format!("{:x}", hasher.finalize())
}
