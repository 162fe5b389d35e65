use super::dto::AnalysisRequest;

const SUCCESS_SHAPE: &str = r#"{
  "food_name": "Specific name of the food (include brand if applicable)",
  "calories": total calories for the portion as integer,
  "protein": protein in grams as number,
  "carbs": carbohydrates in grams as number,
  "fat": fat in grams as number,
  "serving_size": "the serving size these values are for, reflecting any stated portion",
  "confidence": "high/medium/low",
  "source": "where you found this nutritional data (e.g., 'Official Pringles nutrition label', 'USDA database', etc.)",
  "notes": "any additional relevant info (fiber, sugar, sodium if notable)"
}"#;

fn failure_shape(subject: &str) -> String {
    format!(
        r#"{{
  "error": "Could not identify food in {subject}",
  "food_name": null,
  "calories": 0,
  "protein": 0,
  "carbs": 0,
  "fat": 0
}}"#
    )
}

const PORTION_RULE: &str = "If the user's context describes a non-standard portion \
(for example \"half\", \"a few bites\" or \"two servings\"), scale every value to that portion \
and say so in serving_size.";

/// Instruction text sent upstream for the given branch.
pub fn build(request: &AnalysisRequest) -> String {
    match request {
        AnalysisRequest::Image { context, .. } => image_prompt(context.as_deref()),
        AnalysisRequest::TextOnly { description } => text_prompt(description),
    }
}

fn image_prompt(context: Option<&str>) -> String {
    let mut out = String::from(
        "You are a nutrition expert assistant with access to Google Search. \
Analyze this food image and provide accurate nutritional information.\n\n\
IMPORTANT: Use Google Search to look up the EXACT nutritional facts for this specific food \
product or dish. If you can identify a brand name, product packaging, or specific \
restaurant/chain food, search for the official nutritional information.\n\n",
    );

    if let Some(ctx) = context {
        out.push_str("USER CONTEXT (weigh this when identifying the food and its portion):\n\"\"\"\n");
        out.push_str(ctx);
        out.push_str("\n\"\"\"\n\n");
    }

    out.push_str(
        "Steps:\n\
1. First identify what food/product is in the image (brand, name, type)\n\
2. Search Google for the official nutritional facts for this specific item\n\
3. If it's a branded product (like Pringles, Oreos, McDonald's, etc.), find the exact nutrition label data\n\
4. If it's a homemade dish, search for standard nutritional estimates\n",
    );
    out.push_str("5. ");
    out.push_str(PORTION_RULE);
    out.push_str("\n\n");
    out.push_str(&output_contract("image"));
    out
}

fn text_prompt(description: &str) -> String {
    let mut out = String::from(
        "You are a nutrition expert assistant with access to Google Search. \
The user described what they ate. Provide accurate nutritional information for it.\n\n\
FOOD DESCRIPTION:\n\"\"\"\n",
    );
    out.push_str(description);
    out.push_str(
        "\n\"\"\"\n\n\
Steps:\n\
1. Identify the food/product being described (brand, name, type)\n\
2. Search Google for the official nutritional facts for this specific item\n\
3. If it's a branded product or chain restaurant item, use the exact nutrition label data\n\
4. If it's a generic or homemade dish, use a standard reference database such as USDA\n",
    );
    out.push_str("5. ");
    out.push_str(PORTION_RULE);
    out.push_str("\n\n");
    out.push_str(&output_contract("description"));
    out
}

fn output_contract(subject: &str) -> String {
    format!(
        "Return ONLY a valid JSON object with this exact structure \
(no markdown, no code blocks, just raw JSON):\n{SUCCESS_SHAPE}\n\n\
If you cannot identify food in the {subject}, return:\n{}\n\n\
Prioritize accuracy from official sources over estimates.",
        failure_shape(subject)
    )
}
