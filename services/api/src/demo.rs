use crate::infra::{InMemoryProductStore, InMemoryProfileStore, InMemoryRuleStore};
use chrono::Utc;
use clap::Args;
use std::sync::Arc;

use labelwise::error::AppError;
use labelwise::pipeline::domain::{CatalogId, ProductRecord, UserProfile};
use labelwise::pipeline::enhancer::EnhancerDisabled;
use labelwise::pipeline::{ScanOutcome, ScanService};

const DEMO_BARCODE: &str = "737628064502";
const DEMO_USER: &str = "demo-user";

#[derive(Args, Debug, Default)]
pub(crate) struct ScanDemoArgs {
    /// Barcode to scan (defaults to the seeded demo product)
    #[arg(long)]
    pub(crate) barcode: Option<String>,
    /// Profile to evaluate against (defaults to the seeded demo profile)
    #[arg(long)]
    pub(crate) user_id: Option<String>,
    /// Evaluate a raw comma-separated ingredient list instead of a barcode
    #[arg(long)]
    pub(crate) ingredients: Option<String>,
}

type DemoService = ScanService<InMemoryProductStore, InMemoryRuleStore, InMemoryProfileStore>;

pub(crate) async fn run_scan_demo(args: ScanDemoArgs) -> Result<(), AppError> {
    let ScanDemoArgs {
        barcode,
        user_id,
        ingredients,
    } = args;

    let service = seeded_service();
    let user_id = user_id.unwrap_or_else(|| DEMO_USER.to_string());

    println!("Ingredient safety demo (offline, deterministic rules only)");
    println!("Profile: {user_id}");

    if let Some(raw) = ingredients {
        let tokens: Vec<String> = raw.split(',').map(|token| token.trim().to_string()).collect();
        let analysis = service
            .evaluate_ingredients(&tokens, "Manual ingredient list", Some(&user_id))
            .await?;
        render_analysis(&analysis);
        return Ok(());
    }

    let barcode = barcode.unwrap_or_else(|| DEMO_BARCODE.to_string());
    println!("Barcode: {barcode}");

    match service.scan(&barcode, Some(&user_id)).await? {
        Some(ScanOutcome { product, analysis }) => {
            println!(
                "\nResolved: {} ({})",
                product.name.as_deref().unwrap_or("<unnamed>"),
                product.source.label()
            );
            if let Some(brand) = &product.brand {
                println!("Brand: {brand}");
            }
            if let Some(raw) = &product.ingredients_raw {
                println!("Ingredients: {raw}");
            }
            render_analysis(&analysis);
        }
        None => println!("\nNo product found for {barcode}. Seeded demo barcode: {DEMO_BARCODE}"),
    }

    Ok(())
}

fn render_analysis(analysis: &labelwise::pipeline::domain::ProductAnalysis) {
    println!(
        "\nScore: {}/100 ({:?})",
        analysis.score, analysis.safety_level
    );
    println!("Summary: {}", analysis.summary);

    if analysis.concerns.is_empty() {
        println!("Concerns: none");
    } else {
        println!("Concerns:");
        for concern in &analysis.concerns {
            println!(
                "  - [{:?}] {}: {}",
                concern.severity, concern.ingredient, concern.reason
            );
        }
    }

    if let Some(categories) = &analysis.risk_categories {
        if !categories.is_empty() {
            println!("Risk categories:");
            for (category, hits) in categories {
                println!("  - {category}: {hits}");
            }
        }
    }
}

/// Everything in memory: seeded product, curated rules, one stored profile.
/// No catalog or enhancer traffic leaves the process.
fn seeded_service() -> DemoService {
    let store = Arc::new(InMemoryProductStore::default());
    store.seed(ProductRecord {
        barcode: DEMO_BARCODE.to_string(),
        source: CatalogId::Beauty,
        name: Some("Daily Glow Face Cream".to_string()),
        brand: Some("Dermalux".to_string()),
        category: Some("skincare".to_string()),
        ingredients_raw: Some(
            "Water (Aqua), Glycerin, Fragrance, Methylparaben, Tocopherol".to_string(),
        ),
        nutrition: None,
        image_url: Some("https://img.example/daily-glow.jpg".to_string()),
        last_fetched_at: Utc::now(),
    });

    let profiles = Arc::new(InMemoryProfileStore::default());
    let mut profile = UserProfile::general(DEMO_USER);
    profile.conditions.insert("Endometriosis".to_string());
    profile.symptoms.insert("Headaches".to_string());
    profile.sensitivities.insert("fragrance".to_string());
    profiles.seed(profile);

    ScanService::new(
        store,
        Arc::new(InMemoryRuleStore::seeded()),
        profiles,
        Vec::new(),
        Arc::new(EnhancerDisabled),
        Arc::new(EnhancerDisabled),
        false,
    )
}
