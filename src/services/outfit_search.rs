use rand::Rng;
use std::collections::HashSet;

use crate::{
    catalog::Catalog,
    models::{Constraints, Outfit, Product, Role, MAX_OUTFIT_COUNT},
};

use super::{
    fingerprint::outfit_fingerprint,
    sampler::{filter_candidates, sample, ACCESSORY_SAMPLE_SIZE, GARMENT_SAMPLE_SIZE},
    scorer::{score_outfit, OutfitScore},
    selector::BestOf,
};

/// Hard cap on top × bottom × footwear combinations examined per search
pub const MAX_COMBINATIONS: usize = 5000;

/// Garments alone may use at most this share of the budget
const GARMENT_BUDGET_SHARE: f64 = 0.8;
const MIN_MATCH_SCORE: f64 = 0.3;
const MIN_ACCESSORIES: usize = 2;
const MIN_DIFFERING_ITEMS: usize = 3;
/// Stop once the retained set is plentiful and its worst score exceeds this
const EARLY_EXIT_SCORE: f64 = 0.7;

/// Counters describing how a search ended
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub combinations: usize,
    pub iterations: usize,
    pub capped: bool,
    pub early_exit: bool,
}

/// Outfit under construction, borrowing its products from the catalog
struct Candidate<'a> {
    reco_id: String,
    top: &'a Product,
    bottom: &'a Product,
    footwear: &'a Product,
    accessories: Vec<&'a Product>,
    score: OutfitScore,
}

impl<'a> Candidate<'a> {
    fn skus(&self) -> impl Iterator<Item = &str> + '_ {
        [self.top, self.bottom, self.footwear]
            .into_iter()
            .chain(self.accessories.iter().copied())
            .map(|p| p.sku.as_str())
    }

    fn into_outfit(self) -> Outfit {
        Outfit {
            reco_id: self.reco_id,
            top: self.top.clone(),
            bottom: self.bottom.clone(),
            footwear: self.footwear.clone(),
            accessories: self.accessories.into_iter().cloned().collect(),
            match_score: self.score.score,
            total_price: self.score.total_price,
            reasoning_fast: self.score.reasons,
        }
    }
}

/// A candidate must differ from `existing` in at least three item slots
fn differs_enough(existing: &Candidate<'_>, candidate: &Candidate<'_>) -> bool {
    let existing_skus: HashSet<&str> = existing.skus().collect();
    let skus: Vec<&str> = candidate.skus().collect();
    let shared = skus.iter().filter(|sku| existing_skus.contains(*sku)).count();
    shared <= skus.len().saturating_sub(MIN_DIFFERING_ITEMS)
}

/// First unused accessory, then first unused "other" item
fn pick_accessories<'a>(
    used: &[&Product],
    accessories: &[&'a Product],
    others: &[&'a Product],
) -> Vec<&'a Product> {
    let mut taken: HashSet<&str> = used.iter().map(|p| p.sku.as_str()).collect();
    let mut picked = Vec::with_capacity(2);

    for pool in [accessories, others] {
        if let Some(item) = pool.iter().find(|p| !taken.contains(p.sku.as_str())) {
            taken.insert(item.sku.as_str());
            picked.push(*item);
        }
    }

    picked
}

/// Combinatorial outfit search over a catalog
///
/// Synchronous and CPU-bound; the combination cap bounds the worst case
/// regardless of catalog size.
pub struct OutfitSearch<'a> {
    catalog: &'a Catalog,
}

impl<'a> OutfitSearch<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Generates up to `count` outfits around `base`, best first
    ///
    /// An empty result is a valid "no recommendations" answer.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        base: &Product,
        count: usize,
        constraints: &Constraints,
        rng: &mut R,
    ) -> Vec<Outfit> {
        self.generate_with_stats(base, count, constraints, rng).0
    }

    /// Same as [`generate`](Self::generate), also returning [`SearchStats`]
    ///
    /// Working sets are sampled per role from `rng`, then every
    /// top × bottom × footwear combination is evaluated until the combination
    /// cap is reached or early exit triggers. A candidate is kept only if it
    /// fits the budget, clears the minimum score and differs from every
    /// outfit already kept. The stats report how far the enumeration got and
    /// why it stopped.
    pub fn generate_with_stats<R: Rng + ?Sized>(
        &self,
        base: &Product,
        count: usize,
        constraints: &Constraints,
        rng: &mut R,
    ) -> (Vec<Outfit>, SearchStats) {
        let count = count.clamp(1, MAX_OUTFIT_COUNT);
        let mut stats = SearchStats::default();

        let tops = self.garments(Role::Top, base, constraints, rng);
        let bottoms = self.garments(Role::Bottom, base, constraints, rng);
        let footwear = self.garments(Role::Footwear, base, constraints, rng);
        let accessories = self.working_set(Role::Accessory, ACCESSORY_SAMPLE_SIZE, base, constraints, rng);
        let others = self.working_set(Role::Other, ACCESSORY_SAMPLE_SIZE, base, constraints, rng);

        stats.combinations = tops.len() * bottoms.len() * footwear.len();

        tracing::debug!(
            base_sku = %base.sku,
            tops = tops.len(),
            bottoms = bottoms.len(),
            footwear = footwear.len(),
            accessories = accessories.len(),
            others = others.len(),
            "Candidate pools prepared"
        );

        if stats.combinations == 0 {
            return (Vec::new(), stats);
        }

        let mut best: BestOf<Candidate<'_>> = BestOf::new(count * 3);
        let mut seen: HashSet<String> = HashSet::new();

        'search: for &top in &tops {
            for &bottom in &bottoms {
                for &shoes in &footwear {
                    if stats.iterations >= MAX_COMBINATIONS {
                        stats.capped = true;
                        break 'search;
                    }
                    stats.iterations += 1;

                    if best.len() >= count * 2
                        && best.min_score().is_some_and(|s| s > EARLY_EXIT_SCORE)
                    {
                        stats.early_exit = true;
                        break 'search;
                    }

                    let garment_total = top.price + bottom.price + shoes.price;
                    if let Some(budget) = constraints.budget {
                        if garment_total > budget * GARMENT_BUDGET_SHARE {
                            continue;
                        }
                    }

                    let picked =
                        pick_accessories(&[top, bottom, shoes, base], &accessories, &others);
                    if picked.len() < MIN_ACCESSORIES {
                        continue;
                    }

                    let total = garment_total + picked.iter().map(|p| p.price).sum::<f64>();
                    if constraints.budget.is_some_and(|budget| total > budget) {
                        continue;
                    }

                    let score = score_outfit(base, top, bottom, shoes, &picked, constraints);
                    if score.score < MIN_MATCH_SCORE {
                        continue;
                    }

                    let accessory_skus: Vec<&str> = picked.iter().map(|p| p.sku.as_str()).collect();
                    let reco_id = outfit_fingerprint(
                        &base.sku,
                        &top.sku,
                        &bottom.sku,
                        &shoes.sku,
                        &accessory_skus,
                    );
                    if seen.contains(&reco_id) {
                        continue;
                    }

                    let candidate = Candidate {
                        reco_id,
                        top,
                        bottom,
                        footwear: shoes,
                        accessories: picked,
                        score,
                    };

                    // against every retained outfit, so any returned pair stays diverse
                    let too_similar = best
                        .iter()
                        .any(|existing| !differs_enough(existing, &candidate));
                    if too_similar {
                        continue;
                    }

                    seen.insert(candidate.reco_id.clone());
                    best.push(candidate.score.score, candidate);
                }
            }
        }

        if stats.capped {
            tracing::info!(
                base_sku = %base.sku,
                combinations = stats.combinations,
                retained = best.len(),
                "Combination cap reached, returning best outfits found so far"
            );
        }

        let outfits: Vec<Outfit> = best
            .into_sorted_vec()
            .into_iter()
            .take(count)
            .map(Candidate::into_outfit)
            .collect();

        tracing::debug!(
            base_sku = %base.sku,
            iterations = stats.iterations,
            early_exit = stats.early_exit,
            returned = outfits.len(),
            "Outfit search finished"
        );

        (outfits, stats)
    }

    /// Garment list for one slot; collapses to the base when it occupies that slot
    fn garments<'p, R: Rng + ?Sized>(
        &'p self,
        role: Role,
        base: &'p Product,
        constraints: &Constraints,
        rng: &mut R,
    ) -> Vec<&'p Product> {
        if base.role == role {
            return vec![base];
        }
        self.working_set(role, GARMENT_SAMPLE_SIZE, base, constraints, rng)
    }

    fn working_set<R: Rng + ?Sized>(
        &self,
        role: Role,
        size: usize,
        base: &Product,
        constraints: &Constraints,
        rng: &mut R,
    ) -> Vec<&'a Product> {
        let eligible = filter_candidates(self.catalog.by_role(role), base, constraints);
        sample(eligible, size, &base.tags, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::product::fixtures::product;
    use rand::{rngs::StdRng, SeedableRng};

    fn rng() -> StdRng {
        StdRng::seed_from_u64(11)
    }

    fn shared_slots(a: &Outfit, b: &Outfit) -> usize {
        let a_skus: HashSet<&str> = a.skus().into_iter().collect();
        b.skus().into_iter().filter(|s| a_skus.contains(s)).count()
    }

    fn casual_catalog(base: Product) -> Catalog {
        Catalog::from_products(vec![
            base,
            product("B1", Role::Bottom, 300.0, &["casual"]),
            product("F1", Role::Footwear, 400.0, &["casual"]),
            product("A1", Role::Accessory, 100.0, &["casual"]),
            product("O1", Role::Other, 100.0, &["casual"]),
        ])
    }

    #[test]
    fn test_base_top_with_budget() {
        let base = product("T1", Role::Top, 500.0, &["casual"]);
        let catalog = casual_catalog(base.clone());
        let constraints = Constraints::new(Some(2000.0), None, None);

        let outfits = OutfitSearch::new(&catalog).generate(&base, 5, &constraints, &mut rng());

        assert_eq!(outfits.len(), 1);
        let outfit = &outfits[0];
        assert!(outfit.match_score >= 0.3);
        assert!(outfit.total_price <= 2000.0);
        assert_eq!(outfit.top.sku, "T1");
        assert_eq!(outfit.skus(), vec!["T1", "B1", "F1", "A1", "O1"]);
        assert_eq!(outfit.total_price, 1400.0);
        assert_eq!(outfit.reasoning_fast.len(), 5);
    }

    #[test]
    fn test_no_footwear_returns_empty() {
        let base = product("T1", Role::Top, 500.0, &["casual"]);
        let catalog = Catalog::from_products(vec![
            base.clone(),
            product("B1", Role::Bottom, 300.0, &["casual"]),
            product("A1", Role::Accessory, 100.0, &["casual"]),
            product("O1", Role::Other, 100.0, &["casual"]),
        ]);

        let (outfits, stats) = OutfitSearch::new(&catalog).generate_with_stats(
            &base,
            5,
            &Constraints::default(),
            &mut rng(),
        );
        assert!(outfits.is_empty());
        assert_eq!(stats.combinations, 0);
    }

    #[test]
    fn test_footwear_filtered_out_by_budget_returns_empty() {
        let base = product("T1", Role::Top, 100.0, &["casual"]);
        let mut catalog_products = vec![base.clone()];
        catalog_products.push(product("B1", Role::Bottom, 100.0, &["casual"]));
        catalog_products.push(product("F1", Role::Footwear, 900.0, &["casual"]));
        catalog_products.push(product("A1", Role::Accessory, 10.0, &["casual"]));
        catalog_products.push(product("O1", Role::Other, 10.0, &["casual"]));
        let catalog = Catalog::from_products(catalog_products);

        let constraints = Constraints::new(Some(1000.0), None, None);
        let outfits = OutfitSearch::new(&catalog).generate(&base, 5, &constraints, &mut rng());
        assert!(outfits.is_empty());
    }

    #[test]
    fn test_requires_two_accessories() {
        let base = product("T1", Role::Top, 500.0, &["casual"]);
        let catalog = Catalog::from_products(vec![
            base.clone(),
            product("B1", Role::Bottom, 300.0, &["casual"]),
            product("F1", Role::Footwear, 400.0, &["casual"]),
            product("A1", Role::Accessory, 100.0, &["casual"]),
        ]);

        let outfits =
            OutfitSearch::new(&catalog).generate(&base, 5, &Constraints::default(), &mut rng());
        assert!(outfits.is_empty());
    }

    #[test]
    fn test_base_is_never_substituted_or_reused() {
        let base = product("B0", Role::Bottom, 200.0, &["casual"]);
        let catalog = Catalog::from_products(vec![
            base.clone(),
            product("B1", Role::Bottom, 300.0, &["casual"]),
            product("T1", Role::Top, 300.0, &["casual"]),
            product("T2", Role::Top, 300.0, &["casual"]),
            product("F1", Role::Footwear, 400.0, &["casual"]),
            product("F2", Role::Footwear, 400.0, &["casual"]),
            product("A1", Role::Accessory, 100.0, &["casual"]),
            product("A2", Role::Accessory, 100.0, &["casual"]),
            product("O1", Role::Other, 100.0, &["casual"]),
        ]);

        let outfits =
            OutfitSearch::new(&catalog).generate(&base, 5, &Constraints::default(), &mut rng());
        assert!(!outfits.is_empty());
        for outfit in &outfits {
            assert_eq!(outfit.bottom.sku, "B0");
            assert_ne!(outfit.top.sku, "B0");
            assert_ne!(outfit.footwear.sku, "B0");
            assert!(outfit.accessories.iter().all(|a| a.sku != "B0"));
        }
    }

    #[test]
    fn test_outfits_are_diverse_sorted_and_priced() {
        let base = product("W1", Role::Accessory, 150.0, &["casual"]);
        let mut products = vec![base.clone()];
        for i in 0..3 {
            let tag = if i == 0 { "casual" } else { "denim" };
            products.push(product(&format!("T{}", i), Role::Top, 300.0 + i as f64, &["casual"]));
            products.push(product(&format!("B{}", i), Role::Bottom, 400.0, &[tag]));
            products.push(product(&format!("F{}", i), Role::Footwear, 500.0, &["casual"]));
        }
        products.push(product("A1", Role::Accessory, 50.0, &["casual"]));
        products.push(product("O1", Role::Other, 60.0, &["casual"]));
        let catalog = Catalog::from_products(products);

        let outfits =
            OutfitSearch::new(&catalog).generate(&base, 5, &Constraints::default(), &mut rng());

        assert_eq!(outfits.len(), 3);
        for pair in outfits.windows(2) {
            assert!(pair[0].match_score >= pair[1].match_score);
        }
        for (i, a) in outfits.iter().enumerate() {
            let sum: f64 = a.items().map(|p| p.price).sum();
            assert_eq!(a.total_price, sum);
            for b in outfits.iter().skip(i + 1) {
                assert!(shared_slots(a, b) <= a.skus().len() - 3);
            }
        }
    }

    #[test]
    fn test_count_limits_results() {
        let base = product("W1", Role::Accessory, 150.0, &["casual"]);
        let mut products = vec![base.clone()];
        for i in 0..6 {
            products.push(product(&format!("T{}", i), Role::Top, 100.0, &["casual"]));
            products.push(product(&format!("B{}", i), Role::Bottom, 100.0, &["casual"]));
            products.push(product(&format!("F{}", i), Role::Footwear, 100.0, &["casual"]));
        }
        products.push(product("A1", Role::Accessory, 50.0, &["casual"]));
        products.push(product("O1", Role::Other, 60.0, &["casual"]));
        let catalog = Catalog::from_products(products);

        let outfits =
            OutfitSearch::new(&catalog).generate(&base, 2, &Constraints::default(), &mut rng());
        assert_eq!(outfits.len(), 2);
    }

    #[test]
    fn test_combination_cap_bounds_iterations() {
        let base = product("W1", Role::Accessory, 10.0, &[]);
        let mut products = vec![base.clone()];
        for i in 0..20 {
            products.push(product(&format!("T{}", i), Role::Top, 10.0, &[]));
            products.push(product(&format!("B{}", i), Role::Bottom, 10.0, &[]));
            products.push(product(&format!("F{}", i), Role::Footwear, 10.0, &[]));
        }
        products.push(product("A1", Role::Accessory, 10.0, &[]));
        products.push(product("O1", Role::Other, 10.0, &[]));
        let catalog = Catalog::from_products(products);

        let (outfits, stats) = OutfitSearch::new(&catalog).generate_with_stats(
            &base,
            10,
            &Constraints::default(),
            &mut rng(),
        );

        assert_eq!(stats.combinations, 8000);
        assert!(stats.iterations <= MAX_COMBINATIONS);
        assert!(stats.capped);
        assert!(outfits.len() <= 10);
    }

    #[test]
    fn test_every_returned_pair_is_diverse_at_full_count() {
        let base = product("W1", Role::Accessory, 10.0, &["casual"]);
        let mut products = vec![base.clone()];
        for i in 0..6 {
            let tag = if i == 5 { "x" } else { "casual" };
            products.push(product(&format!("T{}", i), Role::Top, 10.0, &[tag]));
        }
        for i in 0..10 {
            products.push(product(&format!("B{}", i), Role::Bottom, 10.0, &["casual"]));
            products.push(product(&format!("F{}", i), Role::Footwear, 10.0, &["casual"]));
        }
        products.push(product("A1", Role::Accessory, 10.0, &["casual"]));
        products.push(product("O1", Role::Other, 10.0, &["casual"]));
        let catalog = Catalog::from_products(products);

        let outfits =
            OutfitSearch::new(&catalog).generate(&base, 10, &Constraints::default(), &mut rng());

        // accessories are always A1 and O1, so six tops allow at most six outfits
        assert!(outfits.len() >= 2);
        assert!(outfits.len() <= 6);
        for (i, a) in outfits.iter().enumerate() {
            for b in outfits.iter().skip(i + 1) {
                assert!(
                    shared_slots(a, b) <= a.skus().len() - 3,
                    "{:?} and {:?} are too similar",
                    a.skus(),
                    b.skus()
                );
            }
        }
    }

    #[test]
    fn test_early_exit_once_plentiful_and_strong() {
        let base = product("W1", Role::Accessory, 10.0, &["casual"]);
        let mut products = vec![base.clone()];
        for i in 0..20 {
            products.push(product(&format!("T{}", i), Role::Top, 10.0, &["casual"]));
            products.push(product(&format!("B{}", i), Role::Bottom, 10.0, &["casual"]));
            products.push(product(&format!("F{}", i), Role::Footwear, 10.0, &["casual"]));
        }
        products.push(product("A1", Role::Accessory, 10.0, &["casual"]));
        products.push(product("O1", Role::Other, 10.0, &["casual"]));
        let catalog = Catalog::from_products(products);

        let (outfits, stats) = OutfitSearch::new(&catalog).generate_with_stats(
            &base,
            2,
            &Constraints::default(),
            &mut rng(),
        );

        // identical tags score 0.74 with no constraints
        assert!(stats.early_exit);
        assert!(!stats.capped);
        assert!(stats.iterations < stats.combinations);
        assert_eq!(outfits.len(), 2);
        assert!(outfits.iter().all(|o| o.match_score > EARLY_EXIT_SCORE));
    }
}
