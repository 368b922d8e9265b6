//! Vocabulary tables for grocery-store queries.
//!
//! Keys are in surface form (lowercase, underscores for spaces). Values may
//! contain spaces; lookups compare them in surface form.

use super::normalize::surface_form;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Canonical term -> synonyms.
const SYNONYMS: &[(&str, &[&str])] = &[
    // Beverages
    ("soda", &["pop", "soft_drink", "cola", "carbonated_drink", "fizzy_drink"]),
    ("pop", &["soda", "soft_drink", "cola", "carbonated_drink"]),
    ("juice", &["fruit_juice", "beverage", "drink"]),
    ("water", &["bottled_water", "drinking_water", "mineral_water", "spring_water"]),
    ("coffee", &["java", "espresso", "brew", "caffeine"]),
    ("tea", &["chai", "herbal_tea", "green_tea", "black_tea"]),
    // Grains & pasta
    ("pasta", &["spaghetti", "noodles", "macaroni", "linguine", "penne"]),
    ("noodles", &["pasta", "ramen", "udon", "egg_noodles"]),
    ("cereal", &["breakfast_cereal", "granola", "oats", "muesli", "flakes"]),
    ("oatmeal", &["oats", "porridge", "hot_cereal"]),
    ("rice", &["grain", "basmati", "jasmine", "brown_rice", "white_rice"]),
    ("bread", &["loaf", "baguette", "rolls", "buns", "toast"]),
    // Snacks
    ("chips", &["crisps", "potato_chips", "snacks", "crackers"]),
    ("crisps", &["chips", "potato_chips", "snacks"]),
    ("crackers", &["biscuits", "wafers", "snack_crackers"]),
    ("cookies", &["biscuits", "treats", "sweets", "dessert"]),
    ("candy", &["sweets", "confectionery", "chocolate", "treats"]),
    // Produce
    ("vegetables", &["veggies", "produce", "greens"]),
    ("fruits", &["produce", "fresh_fruit"]),
    ("oranges", &["orange", "citrus"]),
    ("potatoes", &["potato", "spuds", "taters"]),
    // Dairy & proteins
    ("milk", &["dairy", "whole_milk", "skim_milk", "2%_milk", "low_fat_milk"]),
    ("cheese", &["dairy", "cheddar", "swiss", "mozzarella", "parmesan"]),
    ("yogurt", &["yoghurt", "dairy", "greek_yogurt"]),
    ("butter", &["margarine", "spread", "dairy"]),
    ("chicken", &["poultry", "fowl", "bird"]),
    ("beef", &["meat", "steak", "ground_beef", "hamburger"]),
    ("pork", &["ham", "bacon", "sausage", "meat"]),
    ("fish", &["seafood", "salmon", "tuna", "cod"]),
    // Frozen & canned
    ("frozen", &["freezer", "ice", "frozen_food"]),
    ("canned", &["tin", "jar", "preserved", "jarred"]),
    ("soup", &["broth", "stew", "bisque", "chowder"]),
    // Household
    ("shampoo", &["hair_care", "cleanser"]),
    ("soap", &["body_wash", "cleanser", "bar_soap"]),
    ("detergent", &["laundry_soap", "washing_powder", "fabric_softener"]),
    ("toilet_paper", &["tissue", "bathroom_tissue", "tp"]),
    ("paper_towels", &["kitchen_towels", "napkins"]),
    // Condiments & spices
    ("ketchup", &["tomato_sauce", "condiment"]),
    ("mustard", &["condiment", "yellow_mustard"]),
    ("mayonnaise", &["mayo", "condiment", "spread"]),
    ("salt", &["seasoning", "table_salt", "sea_salt"]),
    ("pepper", &["black_pepper", "seasoning", "spice"]),
    ("oil", &["cooking_oil", "olive_oil", "vegetable_oil"]),
    ("vinegar", &["balsamic", "white_vinegar", "apple_cider_vinegar"]),
];

/// English term -> French term.
const TRANSLATIONS: &[(&str, &str)] = &[
    ("milk", "lait"), ("cheese", "fromage"), ("butter", "beurre"), ("yogurt", "yaourt"),
    ("eggs", "œufs"), ("cream", "crème"), ("chicken", "poulet"), ("beef", "bœuf"),
    ("pork", "porc"), ("fish", "poisson"), ("salmon", "saumon"), ("tuna", "thon"),
    ("apple", "pomme"), ("banana", "banane"), ("orange", "orange"), ("grapes", "raisins"),
    ("strawberry", "fraise"), ("blueberry", "myrtille"), ("pear", "poire"),
    ("carrot", "carotte"), ("potato", "pomme de terre"), ("tomato", "tomate"),
    ("onion", "oignon"), ("lettuce", "laitue"), ("spinach", "épinard"),
    ("broccoli", "brocoli"), ("cucumber", "concombre"), ("pepper", "poivron"),
    ("garlic", "ail"),
    ("bread", "pain"), ("rice", "riz"), ("pasta", "pâtes"), ("cereal", "céréales"),
    ("flour", "farine"), ("oats", "avoine"), ("bagel", "bagel"), ("croissant", "croissant"),
    ("muffin", "muffin"), ("cake", "gâteau"), ("cookie", "biscuit"),
    ("water", "eau"), ("juice", "jus"), ("coffee", "café"), ("tea", "thé"),
    ("soda", "soda"), ("beer", "bière"), ("wine", "vin"),
    ("sugar", "sucre"), ("salt", "sel"), ("oil", "huile"), ("vinegar", "vinaigre"),
    ("honey", "miel"), ("jam", "confiture"), ("ketchup", "ketchup"), ("mustard", "moutarde"),
    ("mayonnaise", "mayonnaise"), ("sauce", "sauce"), ("soup", "soupe"),
    ("chips", "chips"), ("crackers", "crackers"), ("nuts", "noix"), ("candy", "bonbons"),
    ("chocolate", "chocolat"), ("ice_cream", "crème glacée"), ("popcorn", "pop-corn"),
    ("frozen", "surgelé"), ("canned", "en conserve"), ("pickles", "cornichons"),
    ("soap", "savon"), ("shampoo", "shampooing"), ("toothpaste", "dentifrice"),
    ("toilet_paper", "papier toilette"), ("detergent", "détergent"), ("tissue", "mouchoir"),
    ("organic", "biologique"), ("gluten_free", "sans gluten"), ("vegan", "végétalien"),
    ("kosher", "casher"), ("low_fat", "faible en gras"), ("sugar_free", "sans sucre"),
];

/// Dietary filter -> phrasings.
const DIETARY: &[(&str, &[&str])] = &[
    ("gluten_free", &["gluten free", "gf", "celiac", "wheat free", "gluten-free", "sans gluten"]),
    ("vegan", &["vegan", "plant based", "dairy free", "plant-based", "végétalien", "végane"]),
    ("vegetarian", &["vegetarian", "veggie", "meat free", "végétarien"]),
    ("kosher", &["kosher", "k", "pareve", "kashrut", "casher"]),
    ("halal", &["halal", "islamic", "permissible"]),
    ("organic", &["organic", "usda organic", "bio", "biologique", "natural", "naturel"]),
    ("non_gmo", &["non gmo", "gmo free", "non-gmo", "sans ogm", "natural"]),
    ("sugar_free", &["sugar free", "no sugar", "sugarless", "sans sucre", "diabetic"]),
    ("low_sodium", &["low sodium", "reduced sodium", "low salt", "faible sodium"]),
    ("low_fat", &["low fat", "reduced fat", "fat free", "faible en gras", "light"]),
    ("lactose_free", &["lactose free", "dairy free", "sans lactose", "plant milk"]),
    ("keto", &["keto", "ketogenic", "low carb", "high fat"]),
    ("paleo", &["paleo", "paleolithic", "caveman diet", "primal"]),
    ("raw", &["raw", "uncooked", "living food", "cru"]),
];

/// Product category -> brand names.
const BRANDS: &[(&str, &[&str])] = &[
    ("dairy", &["kraft", "dairyland", "philadelphia", "kirkland", "chapmans", "lactantia", "cracker barrel"]),
    ("juice", &["tropicana", "simply", "sun-rype", "naked", "motts", "minute maid", "ocean spray"]),
    ("soda", &["coca cola", "coke", "pepsi", "dr pepper", "7up", "canada dry", "fanta", "sprite", "schweppes", "mountain dew"]),
    ("water", &["dasani", "nestle pure life", "evian", "aquafina", "perrier"]),
    ("sports_drink", &["gatorade", "powerade", "vitamin water"]),
    ("coffee", &["starbucks", "tim hortons", "folgers", "maxwell house"]),
    ("tea", &["lipton", "tetley", "twinings"]),
    ("cereal", &["cheerios", "general mills", "kelloggs", "post", "quaker", "natures path", "cascadian farm",
                 "frosted flakes", "corn flakes", "lucky charms", "captain crunch"]),
    ("chips", &["lays", "doritos", "pringles", "ruffles", "tostitos", "sun chips"]),
    ("crackers", &["ritz", "cheez-it", "triscuit", "wheat thins", "pepperidge farm"]),
    ("candy", &["hersheys", "mars", "nestle", "skittles", "mms", "twix", "snickers", "kit kat", "reeses"]),
    ("chocolate", &["ghirardelli", "cadbury"]),
    ("cookies", &["oreo"]),
    ("ice_cream", &["ben jerrys", "haagen-dazs", "breyers"]),
    ("frozen_meals", &["stouffers", "lean cuisine", "healthy choice", "hot pockets"]),
    ("frozen_breakfast", &["eggo"]),
    ("frozen_fish", &["gortons"]),
    ("frozen_dinners", &["banquet"]),
    ("frozen_vegetables", &["birds eye"]),
    ("soup", &["campbells", "progresso"]),
    ("canned_goods", &["del monte"]),
    ("canned_vegetables", &["green giant"]),
    ("beans", &["bushs"]),
    ("canned_pasta", &["chef boyardee"]),
    ("canned_meat", &["hormel"]),
    ("canned_fruit", &["dole"]),
    ("canned_fish", &["starkist", "bumble bee"]),
    ("ketchup", &["heinz"]),
    ("mayonnaise", &["hellmans"]),
    ("mustard", &["grey poupon", "frenchs"]),
    ("soy_sauce", &["kikkoman"]),
    ("jam", &["smuckers"]),
    ("spread", &["nutella"]),
    ("peanut_butter", &["jif", "skippy"]),
    ("dressing", &["hidden valley"]),
    ("bread", &["wonder", "arnold", "pepperidge farm", "sara lee"]),
    ("bakery", &["entenmanns"]),
    ("english_muffins", &["thomas"]),
    ("bagels", &["bagel bites"]),
    ("chicken", &["tyson", "perdue"]),
    ("deli_meat", &["oscar mayer", "schneiders", "maple leaf", "boars head"]),
    ("hot_dogs", &["ball park"]),
    ("sausage", &["hillshire farm"]),
    ("produce", &["dole", "del monte"]),
    ("organic", &["organic valley", "annies", "natures path", "whole foods"]),
    ("organic_produce", &["earthbound farm"]),
    ("berries", &["driscoll"]),
    ("baby_food", &["gerber"]),
    ("diapers", &["pampers", "huggies"]),
    ("baby_care", &["johnsons", "aveeno baby"]),
    ("baby_formula", &["similac", "enfamil"]),
    ("pet_food", &["pedigree", "purina", "iams", "blue buffalo", "hills", "beneful"]),
    ("cat_food", &["fancy feast", "friskies"]),
    ("cleaning", &["clorox", "lysol", "mr clean"]),
    ("dish_soap", &["dawn", "palmolive"]),
    ("laundry_detergent", &["tide", "gain"]),
    ("glass_cleaner", &["windex"]),
    ("toothpaste", &["colgate", "crest"]),
    ("toothbrush", &["oral-b"]),
    ("soap", &["dove"]),
    ("skincare", &["neutrogena"]),
    ("medication", &["tylenol", "advil"]),
    ("first_aid", &["band-aid"]),
    ("shampoo", &["head shoulders"]),
    ("toilet_paper", &["charmin"]),
    ("paper_towels", &["bounty"]),
    ("tissues", &["kleenex"]),
    ("paper_products", &["scott"]),
    ("storage_bags", &["glad", "ziploc"]),
    ("aluminum_foil", &["reynolds"]),
    ("pasta", &["barilla"]),
    ("hispanic_foods", &["goya"]),
    ("hot_sauce", &["sriracha"]),
    ("asian_sauce", &["lee kum kee"]),
    ("indian_sauce", &["pataks"]),
    ("mexican_food", &["old el paso", "ortega"]),
];

/// Irregular plural or foreign plural -> singular.
const PLURALS: &[(&str, &str)] = &[
    ("chips", "chip"), ("candies", "candy"), ("cereals", "cereal"), ("yogurts", "yogurt"),
    ("œufs", "egg"), ("pommes", "apple"), ("bananes", "banana"), ("tomates", "tomato"),
    ("pâtes", "pasta"), ("céréales", "cereal"),
];

// =============================================================================
// INDEXED LEXICON
// =============================================================================

/// Lookup tables built once from the constant vocabularies.
pub(crate) struct Lexicon {
    synonyms: BTreeMap<&'static str, &'static [&'static str]>,
    synonym_heads: BTreeMap<String, &'static str>,
    translations: BTreeMap<&'static str, &'static str>,
    reverse_translations: BTreeMap<String, &'static str>,
    dietary: BTreeMap<&'static str, &'static [&'static str]>,
    dietary_heads: BTreeMap<String, &'static str>,
    brand_categories: BTreeMap<String, &'static str>,
    plurals: BTreeMap<&'static str, &'static str>,
}

impl Lexicon {
    fn build() -> Self {
        let synonyms: BTreeMap<_, _> = SYNONYMS.iter().copied().collect();
        let mut synonym_heads = BTreeMap::new();
        for (head, members) in SYNONYMS {
            for member in *members {
                // First listed head wins.
                synonym_heads.entry(surface_form(member)).or_insert(*head);
            }
        }

        // Later entries overwrite earlier ones in both directions.
        let translations: BTreeMap<_, _> = TRANSLATIONS.iter().copied().collect();
        let reverse_translations = TRANSLATIONS
            .iter()
            .map(|(en, fr)| (surface_form(fr), *en))
            .collect();

        let dietary: BTreeMap<_, _> = DIETARY.iter().copied().collect();
        let mut dietary_heads = BTreeMap::new();
        for (head, phrasings) in DIETARY {
            for phrasing in *phrasings {
                dietary_heads.entry(surface_form(phrasing)).or_insert(*head);
            }
        }

        let brand_categories = BRANDS
            .iter()
            .flat_map(|(category, brands)| brands.iter().map(move |b| (surface_form(b), *category)))
            .collect();

        Self {
            synonyms,
            synonym_heads,
            translations,
            reverse_translations,
            dietary,
            dietary_heads,
            brand_categories,
            plurals: PLURALS.iter().copied().collect(),
        }
    }

    /// English term for a French surface form.
    pub(crate) fn english(&self, term: &str) -> Option<&'static str> {
        self.reverse_translations.get(term).copied()
    }

    /// Canonical head for a synonym. Heads map to nothing (they are canonical).
    pub(crate) fn synonym_head(&self, term: &str) -> Option<&'static str> {
        if self.synonyms.contains_key(term) {
            return None;
        }
        self.synonym_heads.get(term).copied()
    }

    pub(crate) fn dietary_head(&self, term: &str) -> Option<&'static str> {
        self.dietary_heads.get(term).copied()
    }

    pub(crate) fn singular(&self, term: &str) -> Option<&'static str> {
        self.plurals.get(term).copied()
    }

    pub(crate) fn synonyms_of(&self, term: &str) -> &'static [&'static str] {
        self.synonyms.get(term).copied().unwrap_or(&[])
    }

    pub(crate) fn french(&self, term: &str) -> Option<&'static str> {
        self.translations.get(term).copied()
    }

    pub(crate) fn dietary_of(&self, term: &str) -> &'static [&'static str] {
        self.dietary.get(term).copied().unwrap_or(&[])
    }

    pub(crate) fn brand_category(&self, term: &str) -> Option<&'static str> {
        self.brand_categories.get(term).copied()
    }

    /// Every string that appears anywhere in the tables.
    #[cfg(test)]
    pub(crate) fn all_terms() -> Vec<&'static str> {
        let mut out = Vec::new();
        for (k, vs) in SYNONYMS.iter().chain(DIETARY).chain(BRANDS) {
            out.push(*k);
            out.extend(vs.iter().copied());
        }
        for (a, b) in TRANSLATIONS.iter().chain(PLURALS) {
            out.push(*a);
            out.push(*b);
        }
        out
    }
}

pub(crate) static LEXICON: LazyLock<Lexicon> = LazyLock::new(Lexicon::build);
