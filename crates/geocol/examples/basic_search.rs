//! Basic name search
//!
//! This example demonstrates the fundamental operations:
//! - Creating a searcher over the generated sample tables
//! - Searching each kind of subdivision
//! - Inspecting scores and walking the hierarchy

use geocol::{EntityKind, GeoSearcher, ScoredCandidate, data_processing::TestDataConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Sample tables keep the example self-contained; use
    // `GeoSearcher::initialize()` to read `$GEOCOL_DATA_DIR` instead.
    let searcher = GeoSearcher::from_test_data(&TestDataConfig::sample())?;
    println!("{}", searcher.info().summary());

    println!("\nMunicipalities matching 'cali':");
    let results = searcher.search_scored(EntityKind::Municipality, "cali")?;
    print_search_results(&results, 5);

    println!("\nMisspelled, without accents: 'medelin':");
    let results = searcher.search_scored(EntityKind::Municipality, "medelin")?;
    print_search_results(&results, 3);

    println!("\nNeighborhoods matching 'la candelaria':");
    for barrio in searcher.search(EntityKind::Neighborhood, "la candelaria")? {
        println!("  {barrio} (municipio {:?})", barrio.parents.municipality_id);
    }

    println!("\nVeredas of corregimiento Santa Elena:");
    let (_, veredas) =
        searcher.children_by_name(EntityKind::Corregimiento, "santa elena", EntityKind::Village)?;
    for vereda in veredas {
        println!("  {vereda}");
    }

    Ok(())
}

fn print_search_results(results: &[ScoredCandidate<'_>], limit: usize) {
    for (i, result) in results.iter().take(limit).enumerate() {
        println!(
            "  {}. {} [{}] - Score: {:.1} ({:?}, similarity {:.2}, rank {:.3})",
            i + 1,
            result.name(),
            result.id(),
            result.score,
            result.tier,
            result.similarity,
            result.rank
        );
    }

    if results.len() > limit {
        println!("  ... and {} more results", results.len() - limit);
    }
}
