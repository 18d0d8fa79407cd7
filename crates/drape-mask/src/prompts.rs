// crates/drape-mask/src/prompts.rs
//
// Category-specific edit prompts. Each prompt changes only the clothing or
// the eyewear and asks the model to keep identity, pose, and scene fixed.

use drape_core::Category;

const APPAREL_PROMPTS: [&str; 6] = [
    "Change the clothing to business casual (blazer and trousers). Keep the same person, face, hair, pose, background, and lighting. Only change the clothing.",
    "Change the clothing to minimalist casual (plain t-shirt and straight-leg pants). Keep everything else identical; only change the clothing.",
    "Change the clothing to sporty athleisure (hoodie and joggers). Keep the same identity/background/lighting; only change the outfit.",
    "Change the clothing to 90s retro streetwear (oversized denim jacket). Keep everything else the same; only change the clothing.",
    "Change the clothing to bohemian chic (flowy patterned dress). Keep the same person and scene; only change the clothing.",
    "Change the clothing to formal evening wear (tailored suit or elegant dress). Keep everything else identical; only change the clothing.",
];

const EYEWEAR_PROMPTS: [&str; 5] = [
    "Change the eyewear to bold oversized square eyeglasses frames in matte black. Keep the same person, face, hair, pose, background, and lighting. Only change the eyewear.",
    "Change the eyewear to classic round panto eyeglasses frames in polished gold. Keep everything else identical; only change the eyewear.",
    "Change the eyewear to modern cat-eye eyeglasses frames in deep navy blue. Keep the same identity and scene; only change the eyewear.",
    "Change the eyewear to minimalist titanium wire eyeglasses frames in brushed silver. Keep everything else the same; only change the eyewear.",
    "Change the eyewear to elegant acetate eyeglasses frames in crystal clear. Keep the same person and background; only change the eyewear.",
];

/// The prompt set for a category.
pub fn variant_prompts(category: Category) -> &'static [&'static str] {
    match category {
        Category::Apparel => &APPAREL_PROMPTS,
        Category::Eyewear => &EYEWEAR_PROMPTS,
    }
}

/// Prompt for variant `index`, cycling through the category's set.
pub fn prompt_for(category: Category, index: usize) -> &'static str {
    let prompts = variant_prompts(category);
    prompts[index % prompts.len()]
}
