use super::queue::{EnrichmentJob, ProductFacts};

const NOT_SPECIFIED: &str = "not specified";

fn brand_or<'a>(item: &'a ProductFacts, fallback: &'a str) -> &'a str {
    if item.brand.is_empty() {
        fallback
    } else {
        &item.brand
    }
}

fn item_line(slot: &str, item: &ProductFacts) -> String {
    format!("- {}: {} ({})", slot, item.title, brand_or(item, "n/a"))
}

/// Builds the stylist prompt for one outfit
pub fn build_prompt(job: &EnrichmentJob) -> String {
    let EnrichmentJob {
        base,
        items,
        constraints,
        ..
    } = job;

    let accessories = items
        .accessories
        .iter()
        .map(|a| a.title.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    let budget = constraints
        .budget
        .map(|b| b.to_string())
        .unwrap_or_else(|| NOT_SPECIFIED.to_string());

    let lines = [
        "You are a fashion stylist.".to_string(),
        String::new(),
        "Base item:".to_string(),
        format!(
            "- {} ({}) tags: {}",
            base.title,
            brand_or(base, "brand n/a"),
            base.tags.join(", ")
        ),
        String::new(),
        "Outfit:".to_string(),
        item_line("Top", &items.top),
        item_line("Bottom", &items.bottom),
        item_line("Footwear", &items.footwear),
        format!("- Accessories: {}", accessories),
        String::new(),
        "Constraints:".to_string(),
        format!("- Budget: {}", budget),
        format!(
            "- Occasion: {}",
            constraints.occasion.as_deref().unwrap_or(NOT_SPECIFIED)
        ),
        format!(
            "- Season: {}",
            constraints.season.as_deref().unwrap_or(NOT_SPECIFIED)
        ),
        String::new(),
        "Write:".to_string(),
        "1) One short paragraph (<= 70 words) explaining why this outfit works.".to_string(),
        "2) 3 bullets labeled Style, Color, Occasion/Season.".to_string(),
        "Return JSON with keys: paragraph, bullets (array of strings).".to_string(),
    ];

    lines.join("\n")
}
