use rand::{seq::SliceRandom, Rng};
use std::collections::HashSet;

use crate::models::{Constraints, Product};

/// Working-set size for tops, bottoms and footwear
pub const GARMENT_SAMPLE_SIZE: usize = 20;
/// Working-set size for accessory and "other" items
pub const ACCESSORY_SAMPLE_SIZE: usize = 30;

/// Share of a sample taken deterministically by similarity; the rest is random
const SIMILARITY_SHARE: f64 = 0.6;
/// A single item may use at most this share of the budget
const ITEM_BUDGET_SHARE: f64 = 0.5;

/// Jaccard similarity of two tag lists, with an explicit value for empty-vs-empty
pub fn jaccard(a: &[String], b: &[String], both_empty: f64) -> f64 {
    let a: HashSet<&str> = a.iter().map(String::as_str).collect();
    let b: HashSet<&str> = b.iter().map(String::as_str).collect();

    if a.is_empty() && b.is_empty() {
        return both_empty;
    }

    let intersection = a.intersection(&b).count();
    let union = a.len() + b.len() - intersection;
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

/// Hard filters applied to every candidate before sampling
///
/// Season and occasion only exclude products that declare tags of that kind;
/// untagged products pass.
pub fn is_eligible(product: &Product, base: &Product, constraints: &Constraints) -> bool {
    if product.sku.is_empty() || product.sku == base.sku {
        return false;
    }
    if !product.gender_compatible(base) {
        return false;
    }
    if let Some(budget) = constraints.budget {
        if product.price > budget * ITEM_BUDGET_SHARE {
            return false;
        }
    }
    if let Some(season) = &constraints.season {
        if !product.seasons.is_empty() && !product.has_season(season) {
            return false;
        }
    }
    if let Some(occasion) = &constraints.occasion {
        if !product.occasions.is_empty() && !product.has_occasion(occasion) {
            return false;
        }
    }
    true
}

/// Applies the hard filters, preserving input order
pub fn filter_candidates<'a>(
    products: impl IntoIterator<Item = &'a Product>,
    base: &Product,
    constraints: &Constraints,
) -> Vec<&'a Product> {
    products
        .into_iter()
        .filter(|p| is_eligible(p, base, constraints))
        .collect()
}

/// Narrows candidates to `size` items biased toward the base's tags
///
/// The most similar 60% are taken in similarity order (ties keep input order);
/// the remaining slots are drawn uniformly from the rest.
pub fn sample<'a, R: Rng + ?Sized>(
    candidates: Vec<&'a Product>,
    size: usize,
    base_tags: &[String],
    rng: &mut R,
) -> Vec<&'a Product> {
    if candidates.len() <= size {
        return candidates;
    }

    let mut scored: Vec<(f64, &'a Product)> = candidates
        .into_iter()
        .map(|p| (jaccard(base_tags, &p.tags, 0.5), p))
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));

    let similar_count = (size as f64 * SIMILARITY_SHARE).floor() as usize;
    let random_count = size - similar_count;

    let rest: Vec<&'a Product> = scored
        .split_off(similar_count)
        .into_iter()
        .map(|(_, p)| p)
        .collect();
    let mut selected: Vec<&'a Product> = scored.into_iter().map(|(_, p)| p).collect();
    selected.extend(rest.choose_multiple(rng, random_count).copied());
    selected
}
