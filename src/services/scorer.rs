use std::collections::HashSet;

use crate::models::{Constraints, Product};

use super::sampler::jaccard;

const STYLE_WEIGHT: f64 = 0.35;
const COLOR_WEIGHT: f64 = 0.25;
const OCCASION_WEIGHT: f64 = 0.20;
const SEASON_WEIGHT: f64 = 0.10;
const BUDGET_WEIGHT: f64 = 0.10;

/// Sub-score used whenever the request leaves a dimension unconstrained
const NEUTRAL: f64 = 0.6;

const NEUTRAL_COLORS: &[&str] = &[
    "black", "white", "grey", "gray", "cream", "beige", "tan", "brown",
];

/// Weighted match score of one candidate outfit
#[derive(Debug, Clone, PartialEq)]
pub struct OutfitScore {
    /// Always within `[0, 1]`
    pub score: f64,
    pub total_price: f64,
    /// One line per sub-score: style, color, occasion, season, budget
    pub reasons: Vec<String>,
}

/// Mean tag similarity between the base and each outfit item
fn style_match(base: &Product, items: &[&Product]) -> f64 {
    if items.is_empty() {
        return 0.0;
    }
    let total: f64 = items.iter().map(|p| jaccard(&base.tags, &p.tags, 0.0)).sum();
    total / items.len() as f64
}

fn color_harmony(items: &[&Product]) -> f64 {
    let colors: HashSet<&str> = items
        .iter()
        .flat_map(|p| p.colors.iter().map(String::as_str))
        .collect();

    match colors.len() {
        0 => 0.6,
        1 => 0.9,
        _ => match colors.iter().filter(|c| !NEUTRAL_COLORS.contains(c)).count() {
            0 | 1 => 0.85,
            2 => 0.65,
            _ => 0.45,
        },
    }
}

/// Share of items declaring the wanted tag, lifted into `[0.4, 1.0]`
fn fit_by_tag(items: &[&Product], want: Option<&str>, tags: fn(&Product) -> &[String]) -> f64 {
    let Some(want) = want else {
        return NEUTRAL;
    };
    let hits = items
        .iter()
        .filter(|p| tags(p).iter().any(|t| t == want))
        .count();
    (0.4 + hits as f64 / items.len().max(1) as f64).min(1.0)
}

fn occasions_of(product: &Product) -> &[String] {
    &product.occasions
}

fn seasons_of(product: &Product) -> &[String] {
    &product.seasons
}

fn budget_alignment(total: f64, budget: Option<f64>) -> f64 {
    match budget {
        None => NEUTRAL,
        Some(budget) if total > budget => 0.0,
        Some(budget) => 0.5 + 0.5 * (total / budget),
    }
}

/// Scores one outfit. Pure and deterministic.
pub fn score_outfit(
    base: &Product,
    top: &Product,
    bottom: &Product,
    footwear: &Product,
    accessories: &[&Product],
    constraints: &Constraints,
) -> OutfitScore {
    let items: Vec<&Product> = [top, bottom, footwear]
        .into_iter()
        .chain(accessories.iter().copied())
        .collect();
    let total_price: f64 = items.iter().map(|p| p.price).sum();

    let season = constraints.season.as_deref();
    let occasion = constraints.occasion.as_deref();

    let style = style_match(base, &items);
    let color = color_harmony(&items);
    let occasion_fit = fit_by_tag(&items, occasion, occasions_of);
    let season_fit = fit_by_tag(&items, season, seasons_of);
    let budget_fit = budget_alignment(total_price, constraints.budget);

    let score = STYLE_WEIGHT * style
        + COLOR_WEIGHT * color
        + OCCASION_WEIGHT * occasion_fit
        + SEASON_WEIGHT * season_fit
        + BUDGET_WEIGHT * budget_fit;

    let budget_note = match constraints.budget {
        Some(budget) => format!("total {} / {}", total_price, budget),
        None => format!("total {}", total_price),
    };

    let reasons = vec![
        format!("Style match {:.2} (tag overlap)", style),
        format!("Color harmony {:.2} (neutral/loud rule)", color),
        format!(
            "Occasion fit {:.2} ({})",
            occasion_fit,
            occasion.unwrap_or("not specified")
        ),
        format!(
            "Season fit {:.2} ({})",
            season_fit,
            season.unwrap_or("not specified")
        ),
        format!("Budget alignment {:.2} ({})", budget_fit, budget_note),
    ];

    OutfitScore {
        score: score.clamp(0.0, 1.0),
        total_price,
        reasons,
    }
}
