use log::error;
use std::env;

use recipe_ranking_search::{RecipeSearch, SearchConfig, SearchOutcome};

const USAGE: &str = "Usage: recipe-ranking-search [--category ID] [--limit N] [KEYWORD...]";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = SearchConfig::load()?;
    let session = RecipeSearch::builder().config(config).build()?;

    let mut request = session.request();
    let mut keywords = Vec::new();
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--category" => request.category_id = Some(args.next().ok_or(USAGE)?),
            "--limit" => {
                let limit = args.next().ok_or(USAGE)?.parse()?;
                request = request.result_limit(limit);
            }
            "--help" | "-h" => {
                println!("{}", USAGE);
                return Ok(());
            }
            _ => keywords.push(arg),
        }
    }
    if !keywords.is_empty() {
        request.keyword = Some(keywords.join(" "));
    }

    if request.category_id.is_none() {
        let hierarchy = session.load_categories().await?;
        for category in hierarchy.large() {
            println!("# {} {}", category.ranking_id, category.name);
        }
    }

    match session.search(request).await {
        SearchOutcome::Settled(Ok(result)) => {
            if let Some(updated) = &result.last_updated {
                println!("Last updated: {}", updated);
            }
            for item in &result.items {
                println!(
                    "{:>3}. {} ({})",
                    item.rank.as_deref().unwrap_or("-"),
                    item.title,
                    item.url
                );
            }
        }
        SearchOutcome::Settled(Err(e)) => {
            error!("Search failed: {}", e);
            eprintln!("{}", e.user_message());
        }
        SearchOutcome::Superseded => {}
    }

    Ok(())
}
