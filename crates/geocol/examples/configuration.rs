//! Search configuration and caching
//!
//! Compares presets and custom score weights on the same query, then puts a
//! read-through cache in front of the searcher.

use std::time::Duration;

use geocol::{
    EntityKind, GeoSearcher, MokaStore, SearchConfig, SearchConfigBuilder,
    data_processing::TestDataConfig,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let searcher = GeoSearcher::from_test_data(&TestDataConfig::sample())?;
    let query = "san";

    println!("Comparing configurations for '{query}':\n");
    let configs = [
        ("Default", SearchConfig::default()),
        ("Strict", SearchConfigBuilder::strict().build()?),
        ("Lenient", SearchConfigBuilder::lenient().build()?),
        (
            "Similarity only",
            SearchConfigBuilder::new()
                .limit(5)
                .scoring()
                .similarity_only()
                .done()
                .build()?,
        ),
    ];
    for (label, config) in &configs {
        let results = searcher.search_with_config(EntityKind::Municipality, query, config)?;
        let names: Vec<&str> = results.iter().map(|e| e.name()).collect();
        println!("  {label:<16} {} results: {names:?}", results.len());
    }

    // Cached searches share one store; repeated queries skip the index
    let config = SearchConfigBuilder::new()
        .cache_ttl(Duration::from_secs(60 * 60))
        .build()?;
    let store = MokaStore::new(1_000);
    let cached = searcher.with_config(config).with_cache(store.clone());
    for term in ["Bogotá", "bogota", "BOGOTA"] {
        cached.search(EntityKind::Department, term)?;
    }
    println!("\nCached entries after three spellings: {}", store.entry_count());

    Ok(())
}
